// Conversation assembly for provider calls
//
// Output order is `[system, ...history oldest->newest, user]`. No token-count
// truncation and no deduplication.
//
// Two concurrent posts on one interaction both read the recent window before
// either appends, so neither sees the other's turn. Nothing here serialises
// those requests.

use crate::conversation::{Interaction, Message};
use crate::store::{MessageStore, StoreError};

use super::types::ChatMessage;

/// How many stored messages are sent as context
pub const HISTORY_WINDOW: u32 = 5;

/// Pure assembly from already-fetched history.
pub fn build_messages(
    system_prompt: &str,
    history: &[Message],
    content: &str,
) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::system(system_prompt));
    messages.extend(
        history
            .iter()
            .map(|m| ChatMessage::new(m.role, m.content.clone())),
    );
    messages.push(ChatMessage::user(content));
    messages
}

/// Fetch the recent window from the store and assemble.
pub async fn assemble<S: MessageStore>(
    store: &S,
    interaction: &Interaction,
    content: &str,
) -> Result<Vec<ChatMessage>, StoreError> {
    let history = store.list_recent(interaction.id, HISTORY_WINDOW).await?;
    tracing::debug!(
        interaction_id = %interaction.id,
        history = history.len(),
        "assembled conversation"
    );
    Ok(build_messages(&interaction.settings.prompt, &history, content))
}
