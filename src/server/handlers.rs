// HTTP request handlers: root, tokens and users

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Form, Json, Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use super::schemas::{LoginForm, TokenResponse, UserOut};
use super::{admin, interactions, CurrentUser, ServerError, SharedState};
use crate::auth::{AuthError, NewUser};
use crate::store::UserStore;

/// Create the application router (`/api` and `/admin`)
pub fn create_router(state: SharedState) -> Router {
    let api = Router::new()
        .route("/", get(root))
        .route("/token", post(login_for_access_token))
        .route("/user", post(create_user))
        .route("/user/me", get(read_current_user))
        .route("/user/:id", get(read_user))
        .route(
            "/interactions",
            get(interactions::list_interactions).post(interactions::create_interaction),
        )
        .route(
            "/interactions/:id",
            get(interactions::get_interaction)
                .put(interactions::update_interaction)
                .delete(interactions::delete_interaction),
        )
        .route(
            "/interactions/:id/messages",
            get(interactions::list_messages).post(interactions::create_message),
        );

    let admin = Router::new()
        .route("/login", post(admin::login))
        .route("/logout", post(admin::logout))
        .route("/interactions", get(admin::list_interactions))
        .route("/users", get(admin::list_users));

    Router::new()
        .nest("/api", api)
        .nest("/admin", admin)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /api
async fn root() -> Json<&'static str> {
    Json("Hello from Ai3D!")
}

/// POST /api/token - OAuth2 password flow
async fn login_for_access_token(
    State(state): State<SharedState>,
    Form(form): Form<LoginForm>,
) -> Result<Json<TokenResponse>, ServerError> {
    let user = state
        .auth
        .authenticate_user(&state.store, &form.username, &form.password)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    let token = state
        .auth
        .create_access_token(&user.username, Some(state.auth.access_token_ttl()))?;
    tracing::info!(username = %user.username, "issued access token");

    Ok(Json(TokenResponse::bearer(token)))
}

/// POST /api/user
async fn create_user(
    State(state): State<SharedState>,
    Json(new_user): Json<NewUser>,
) -> Result<Json<UserOut>, ServerError> {
    if new_user.username.trim().is_empty() || new_user.password.is_empty() {
        return Err(ServerError::BadRequest(
            "Username and password are required".to_string(),
        ));
    }

    let user = state.auth.register_user(&state.store, new_user).await?;
    tracing::info!(username = %user.username, user_id = %user.id, "user created");
    Ok(Json(user.into()))
}

/// GET /api/user/me
async fn read_current_user(CurrentUser(user): CurrentUser) -> Json<UserOut> {
    Json(user.into())
}

/// GET /api/user/:id
async fn read_user(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserOut>, ServerError> {
    let user = state
        .store
        .get_user_by_id(id)
        .await?
        .ok_or_else(|| ServerError::NotFound("User not found".to_string()))?;
    Ok(Json(user.into()))
}
