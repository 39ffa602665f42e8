//! Persistence layer.
//!
//! The traits below are the contract the rest of the crate relies on; the
//! only implementation is [`sqlite::SqliteStore`]. Trait methods return
//! `impl Future` so no `async-trait` boxing is needed at this seam.

pub mod sqlite;

use std::future::Future;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::conversation::{Interaction, Message, NewMessage, Settings};

pub use sqlite::SqliteStore;

/// Errors raised by any store operation
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("failed to encode or decode stored JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A unique constraint rejected the write (e.g. duplicate username)
    #[error("already exists: {0}")]
    Conflict(String),

    /// A stored row could not be mapped back to a domain value
    #[error("corrupt row: {0}")]
    Corrupt(String),
}

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Admin => "admin",
        }
    }

    fn parse(raw: &str) -> Result<Self, StoreError> {
        match raw {
            "user" => Ok(UserRole::User),
            "admin" => Ok(UserRole::Admin),
            other => Err(StoreError::Corrupt(format!("unknown user role '{}'", other))),
        }
    }
}

/// A row in the `users` table. `password` is always a hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: Uuid,
    pub username: String,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub password: String,
    pub disabled: bool,
    pub role: UserRole,
}

/// Interactions and their settings
pub trait InteractionStore: Send + Sync + 'static {
    fn create_interaction(
        &self,
        settings: Settings,
    ) -> impl Future<Output = Result<Interaction, StoreError>> + Send;

    /// Oldest first. Pagination applies only when both `page` (1-based) and
    /// `per_page` are given. Returned interactions carry no messages.
    fn list_interactions(
        &self,
        page: Option<u32>,
        per_page: Option<u32>,
    ) -> impl Future<Output = Result<Vec<Interaction>, StoreError>> + Send;

    /// Full interaction including every message, in insertion order.
    fn get_interaction(
        &self,
        id: Uuid,
    ) -> impl Future<Output = Result<Option<Interaction>, StoreError>> + Send;

    /// Replace the settings; `None` if the interaction does not exist.
    fn update_settings(
        &self,
        id: Uuid,
        settings: Settings,
    ) -> impl Future<Output = Result<Option<Interaction>, StoreError>> + Send;
}

/// Messages belonging to an interaction
pub trait MessageStore: Send + Sync + 'static {
    fn list_messages(
        &self,
        interaction_id: Uuid,
        page: Option<u32>,
        per_page: Option<u32>,
    ) -> impl Future<Output = Result<Vec<Message>, StoreError>> + Send;

    /// The `limit` most recent messages, returned oldest to newest.
    fn list_recent(
        &self,
        interaction_id: Uuid,
        limit: u32,
    ) -> impl Future<Output = Result<Vec<Message>, StoreError>> + Send;

    /// Append in order within one transaction.
    fn append_messages(
        &self,
        interaction_id: Uuid,
        messages: Vec<NewMessage>,
    ) -> impl Future<Output = Result<Vec<Message>, StoreError>> + Send;
}

/// User accounts
pub trait UserStore: Send + Sync + 'static {
    fn insert_user(
        &self,
        user: UserRecord,
    ) -> impl Future<Output = Result<UserRecord, StoreError>> + Send;

    fn get_user_by_username(
        &self,
        username: &str,
    ) -> impl Future<Output = Result<Option<UserRecord>, StoreError>> + Send;

    fn get_user_by_id(
        &self,
        id: Uuid,
    ) -> impl Future<Output = Result<Option<UserRecord>, StoreError>> + Send;

    fn list_users(&self) -> impl Future<Output = Result<Vec<UserRecord>, StoreError>> + Send;
}

/// Translate optional 1-based pagination into SQLite `LIMIT`/`OFFSET`.
///
/// `LIMIT -1` means unbounded in SQLite. Offsets past `i64::MAX` saturate,
/// which yields an empty page.
pub(crate) fn limit_offset(page: Option<u32>, per_page: Option<u32>) -> (i64, i64) {
    match (page, per_page) {
        (Some(page), Some(per_page)) => {
            let page = i64::from(page.max(1));
            let per_page = i64::from(per_page);
            (per_page, (page - 1).saturating_mul(per_page))
        }
        _ => (-1, 0),
    }
}
