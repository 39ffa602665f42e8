// Interaction and message handlers

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use super::schemas::{ChatModelQuery, Instruction, MessageCreate, MessageOut, Pagination};
use super::{CurrentUser, ServerError, SharedState};
use crate::conversation::{Interaction, NewMessage, Role, Settings, SYSTEM_ROLE};
use crate::providers::ModelRegistry;
use crate::store::{InteractionStore, MessageStore};

fn interaction_not_found() -> ServerError {
    ServerError::NotFound("Interaction not found".to_string())
}

fn validate_settings(registry: &ModelRegistry, settings: &Settings) -> Result<(), ServerError> {
    if !registry.is_known(&settings.model) {
        return Err(ServerError::BadRequest(format!(
            "Unknown model '{}'. Supported models: {}",
            settings.model,
            registry.known_models().join(", ")
        )));
    }
    if settings.role != SYSTEM_ROLE {
        return Err(ServerError::BadRequest("Role must be system".to_string()));
    }
    Ok(())
}

/// An absent or blank body means the default instruction. Anything else
/// must be a valid `Instruction` document.
fn parse_instruction(body: &[u8]) -> Result<Instruction, ServerError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Instruction::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| ServerError::BadRequest(format!("Invalid instruction body: {}", e)))
}

/// GET /api/interactions
pub async fn list_interactions(
    State(state): State<SharedState>,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<Interaction>>, ServerError> {
    let interactions = state
        .store
        .list_interactions(page.page, page.per_page)
        .await?;
    Ok(Json(interactions))
}

/// POST /api/interactions?model=
pub async fn create_interaction(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<ChatModelQuery>,
    body: Bytes,
) -> Result<Json<Interaction>, ServerError> {
    let instruction = parse_instruction(&body)?;
    let registry = state.dispatcher.registry();
    let model = query
        .model
        .unwrap_or_else(|| registry.default_model().to_string());

    let settings = Settings {
        model,
        role: instruction.role,
        prompt: instruction.prompt,
    };
    validate_settings(registry, &settings)?;

    let interaction = state.store.create_interaction(settings).await?;
    tracing::info!(
        interaction_id = %interaction.id,
        model = %interaction.settings.model,
        username = %user.username,
        "interaction created"
    );
    Ok(Json(interaction))
}

/// GET /api/interactions/:id
pub async fn get_interaction(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Interaction>, ServerError> {
    let interaction = state
        .store
        .get_interaction(id)
        .await?
        .ok_or_else(interaction_not_found)?;
    Ok(Json(interaction))
}

/// PUT /api/interactions/:id - replace settings
pub async fn update_interaction(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(settings): Json<Settings>,
) -> Result<Json<Interaction>, ServerError> {
    validate_settings(state.dispatcher.registry(), &settings)?;

    let interaction = state
        .store
        .update_settings(id, settings)
        .await?
        .ok_or_else(interaction_not_found)?;
    tracing::info!(
        interaction_id = %id,
        model = %interaction.settings.model,
        "interaction updated"
    );
    Ok(Json(interaction))
}

/// DELETE /api/interactions/:id
pub async fn delete_interaction(Path(_id): Path<Uuid>) -> ServerError {
    ServerError::NotImplemented
}

/// GET /api/interactions/:id/messages
pub async fn list_messages(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<MessageOut>>, ServerError> {
    state
        .store
        .get_interaction(id)
        .await?
        .ok_or_else(interaction_not_found)?;

    let messages = state
        .store
        .list_messages(id, page.page, page.per_page)
        .await?;
    Ok(Json(messages.into_iter().map(MessageOut::plain).collect()))
}

/// POST /api/interactions/:id/messages
///
/// Dispatches the user turn with recent history, then stores the user and
/// assistant messages together. Returns the assistant message.
pub async fn create_message(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(message): Json<MessageCreate>,
) -> Result<Json<MessageOut>, ServerError> {
    let interaction = state
        .store
        .get_interaction(id)
        .await?
        .ok_or_else(interaction_not_found)?;

    if message.role != Role::User.as_str() {
        return Err(ServerError::BadRequest("Role must be user".to_string()));
    }

    let reply = state
        .dispatcher
        .generate_with_history(&state.store, &interaction, &message.content)
        .await?;

    let mut stored = state
        .store
        .append_messages(
            id,
            vec![NewMessage::user(message.content), NewMessage::assistant(reply)],
        )
        .await?;

    let assistant = stored
        .pop()
        .ok_or_else(|| ServerError::Internal("append returned no messages".to_string()))?;
    tracing::info!(interaction_id = %id, message_id = %assistant.id, "assistant message stored");

    Ok(Json(MessageOut::jsonified(assistant)))
}
