// Admin console endpoints (cookie session)

use axum::{
    extract::{Query, State},
    http::header::SET_COOKIE,
    response::IntoResponse,
    Form, Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use super::schemas::{LoginForm, Pagination};
use super::{AdminSession, ServerError, SharedState};
use crate::store::{InteractionStore, UserRecord, UserRole, UserStore};

#[derive(Debug, Serialize)]
pub struct AdminUserRow {
    pub id: Uuid,
    pub role: UserRole,
    pub email: Option<String>,
    pub username: String,
}

impl From<UserRecord> for AdminUserRow {
    fn from(user: UserRecord) -> Self {
        Self {
            id: user.id,
            role: user.role,
            email: user.email,
            username: user.username,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AdminInteractionRow {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// POST /admin/login
pub async fn login(
    State(state): State<SharedState>,
    Form(form): Form<LoginForm>,
) -> Result<impl IntoResponse, ServerError> {
    let token = state
        .admin
        .login(&state.store, &form.username, &form.password)
        .await?;

    Ok((
        [(SET_COOKIE, state.admin.session_cookie(&token))],
        Json(json!({ "detail": "Logged in" })),
    ))
}

/// POST /admin/logout
pub async fn logout(State(state): State<SharedState>) -> impl IntoResponse {
    (
        [(SET_COOKIE, state.admin.clear_cookie())],
        Json(json!({ "detail": "Logged out" })),
    )
}

/// GET /admin/interactions
pub async fn list_interactions(
    State(state): State<SharedState>,
    AdminSession(_admin): AdminSession,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<AdminInteractionRow>>, ServerError> {
    let rows = state
        .store
        .list_interactions(page.page, page.per_page)
        .await?
        .into_iter()
        .map(|i| AdminInteractionRow {
            id: i.id,
            created_at: i.created_at,
        })
        .collect();
    Ok(Json(rows))
}

/// GET /admin/users
pub async fn list_users(
    State(state): State<SharedState>,
    AdminSession(_admin): AdminSession,
) -> Result<Json<Vec<AdminUserRow>>, ServerError> {
    let users = state.store.list_users().await?;
    Ok(Json(users.into_iter().map(AdminUserRow::from).collect()))
}
