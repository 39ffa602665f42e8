//! SQLite implementation of the store traits.
//!
//! Migrations under `./migrations` are embedded at compile time and run on
//! [`SqliteStore::connect`]. Queries use the runtime-checked `sqlx::query`
//! form so no `DATABASE_URL` is needed to build.

use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use uuid::Uuid;

use super::{
    limit_offset, InteractionStore, MessageStore, StoreError, UserRecord, UserRole, UserStore,
};
use crate::conversation::{Interaction, Message, NewMessage, Settings};

type UserRow = (String, String, Option<String>, Option<String>, String, i64, String);
type InteractionRow = (String, String, String, String);
type MessageRow = (String, String, String, String);

/// SQLite-backed conversation and user store
#[derive(Clone, Debug)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) the database at `url` and run pending migrations.
    ///
    /// `"sqlite::memory:"` is accepted for tests; the pool is then pinned to
    /// a single never-recycled connection so the database outlives queries.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = if url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(5)
                .connect_with(options)
                .await?
        };

        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::debug!(database_url = %url, "sqlite store ready");
        Ok(Self { pool })
    }

    /// Close the underlying pool; used on graceful shutdown.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn parse_uuid(raw: &str) -> Result<Uuid, StoreError> {
    Uuid::parse_str(raw).map_err(|e| StoreError::Corrupt(format!("bad id '{}': {}", raw, e)))
}

fn parse_timestamp(raw: &str, field: &str) -> Result<DateTime<Utc>, StoreError> {
    raw.parse().map_err(|e: chrono::ParseError| {
        StoreError::Corrupt(format!("bad {} '{}': {}", field, raw, e))
    })
}

fn user_from_row(row: UserRow) -> Result<UserRecord, StoreError> {
    let (id, username, full_name, email, password, disabled, role) = row;
    Ok(UserRecord {
        id: parse_uuid(&id)?,
        username,
        full_name,
        email,
        password,
        disabled: disabled != 0,
        role: UserRole::parse(&role)?,
    })
}

fn interaction_from_row(row: InteractionRow) -> Result<Interaction, StoreError> {
    let (id, created_at, updated_at, settings) = row;
    Ok(Interaction {
        id: parse_uuid(&id)?,
        created_at: parse_timestamp(&created_at, "created_at")?,
        updated_at: parse_timestamp(&updated_at, "updated_at")?,
        settings: serde_json::from_str(&settings)?,
        messages: Vec::new(),
    })
}

fn message_from_row(row: MessageRow) -> Result<Message, StoreError> {
    let (id, role, content, created_at) = row;
    Ok(Message {
        id: parse_uuid(&id)?,
        role: role.parse().map_err(StoreError::Corrupt)?,
        content,
        created_at: parse_timestamp(&created_at, "created_at")?,
    })
}

fn map_unique_violation(err: sqlx::Error, what: &str) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::Conflict(what.to_string())
        }
        _ => StoreError::Database(err),
    }
}

// ── InteractionStore ─────────────────────────────────────────────────────────

impl InteractionStore for SqliteStore {
    async fn create_interaction(&self, settings: Settings) -> Result<Interaction, StoreError> {
        let now = Utc::now();
        let interaction = Interaction {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            settings,
            messages: Vec::new(),
        };

        sqlx::query(
            "INSERT INTO interactions (id, created_at, updated_at, settings) \
             VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(interaction.id.to_string())
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .bind(serde_json::to_string(&interaction.settings)?)
        .execute(&self.pool)
        .await?;

        tracing::info!(
            interaction_id = %interaction.id,
            model = %interaction.settings.model,
            "created interaction"
        );
        Ok(interaction)
    }

    async fn list_interactions(
        &self,
        page: Option<u32>,
        per_page: Option<u32>,
    ) -> Result<Vec<Interaction>, StoreError> {
        let (limit, offset) = limit_offset(page, per_page);
        let rows: Vec<InteractionRow> = sqlx::query_as(
            "SELECT id, created_at, updated_at, settings FROM interactions \
             ORDER BY rowid ASC LIMIT ?1 OFFSET ?2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(interaction_from_row).collect()
    }

    async fn get_interaction(&self, id: Uuid) -> Result<Option<Interaction>, StoreError> {
        let row: Option<InteractionRow> = sqlx::query_as(
            "SELECT id, created_at, updated_at, settings FROM interactions WHERE id = ?1",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut interaction = interaction_from_row(row)?;
        interaction.messages = self.list_messages(id, None, None).await?;
        Ok(Some(interaction))
    }

    async fn update_settings(
        &self,
        id: Uuid,
        settings: Settings,
    ) -> Result<Option<Interaction>, StoreError> {
        let result = sqlx::query(
            "UPDATE interactions SET settings = ?1, updated_at = ?2 WHERE id = ?3",
        )
        .bind(serde_json::to_string(&settings)?)
        .bind(Utc::now().to_rfc3339())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_interaction(id).await
    }
}

// ── MessageStore ─────────────────────────────────────────────────────────────

impl MessageStore for SqliteStore {
    async fn list_messages(
        &self,
        interaction_id: Uuid,
        page: Option<u32>,
        per_page: Option<u32>,
    ) -> Result<Vec<Message>, StoreError> {
        let (limit, offset) = limit_offset(page, per_page);
        let rows: Vec<MessageRow> = sqlx::query_as(
            "SELECT id, role, content, created_at FROM messages \
             WHERE interaction_id = ?1 ORDER BY seq ASC LIMIT ?2 OFFSET ?3",
        )
        .bind(interaction_id.to_string())
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(message_from_row).collect()
    }

    async fn list_recent(
        &self,
        interaction_id: Uuid,
        limit: u32,
    ) -> Result<Vec<Message>, StoreError> {
        let rows: Vec<MessageRow> = sqlx::query_as(
            "SELECT id, role, content, created_at FROM messages \
             WHERE interaction_id = ?1 ORDER BY seq DESC LIMIT ?2",
        )
        .bind(interaction_id.to_string())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        let mut messages = rows
            .into_iter()
            .map(message_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        messages.reverse();
        Ok(messages)
    }

    async fn append_messages(
        &self,
        interaction_id: Uuid,
        messages: Vec<NewMessage>,
    ) -> Result<Vec<Message>, StoreError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        let mut stored = Vec::with_capacity(messages.len());

        for message in messages {
            let record = Message {
                id: Uuid::new_v4(),
                role: message.role,
                content: message.content,
                created_at: now,
            };
            sqlx::query(
                "INSERT INTO messages (id, interaction_id, role, content, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .bind(record.id.to_string())
            .bind(interaction_id.to_string())
            .bind(record.role.as_str())
            .bind(&record.content)
            .bind(now.to_rfc3339())
            .execute(&mut *tx)
            .await?;
            stored.push(record);
        }

        sqlx::query("UPDATE interactions SET updated_at = ?1 WHERE id = ?2")
            .bind(now.to_rfc3339())
            .bind(interaction_id.to_string())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::debug!(
            interaction_id = %interaction_id,
            count = stored.len(),
            "appended messages"
        );
        Ok(stored)
    }
}

// ── UserStore ────────────────────────────────────────────────────────────────

impl UserStore for SqliteStore {
    async fn insert_user(&self, user: UserRecord) -> Result<UserRecord, StoreError> {
        sqlx::query(
            "INSERT INTO users (id, username, full_name, email, password, disabled, role) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(user.id.to_string())
        .bind(&user.username)
        .bind(&user.full_name)
        .bind(&user.email)
        .bind(&user.password)
        .bind(i64::from(user.disabled))
        .bind(user.role.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "Username or email already registered"))?;

        tracing::info!(
            user_id = %user.id,
            username = %user.username,
            role = user.role.as_str(),
            "created user"
        );
        Ok(user)
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<UserRecord>, StoreError> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, username, full_name, email, password, disabled, role \
             FROM users WHERE username = ?1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        row.map(user_from_row).transpose()
    }

    async fn get_user_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, StoreError> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, username, full_name, email, password, disabled, role \
             FROM users WHERE id = ?1",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(user_from_row).transpose()
    }

    async fn list_users(&self) -> Result<Vec<UserRecord>, StoreError> {
        let rows: Vec<UserRow> = sqlx::query_as(
            "SELECT id, username, full_name, email, password, disabled, role \
             FROM users ORDER BY rowid ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(user_from_row).collect()
    }
}
