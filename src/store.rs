//! SQLite-backed store for event records and per-user conversation state.
//!
//! One [`EventStore`] instance is constructed in `main` and handed to every
//! handler through the router — no ambient global. The pool is capped at a
//! single connection, so each statement is an atomic read-modify-write;
//! no multi-record transactions are needed.

use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::trace;

use crate::types::{
    ConversationState, EditField, EventRecord, EventStatus, InvalidEnumValue, PhotoRef, Step,
};

/// Errors from the record store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// SQLite operation failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored enum column holds an unrecognized value.
    #[error(transparent)]
    InvalidEnum(#[from] InvalidEnumValue),
}

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS events (
    id                 INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id            INTEGER NOT NULL,
    username           TEXT,
    theme              TEXT,
    place              TEXT,
    contact            TEXT,
    event_time         TEXT,
    photo_file_id      TEXT,
    description        TEXT,
    status             TEXT NOT NULL DEFAULT 'creating',
    admin_message_id   INTEGER,
    channel_message_id INTEGER,
    created_at         TEXT NOT NULL,
    updated_at         TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_events_user ON events(user_id);

CREATE TABLE IF NOT EXISTS user_states (
    user_id    INTEGER PRIMARY KEY,
    step       TEXT NOT NULL,
    event_id   INTEGER,
    edit_field TEXT,
    FOREIGN KEY (event_id) REFERENCES events (id)
);
"#;

/// Row type returned by SQLite queries for events.
type EventRow = (
    i64,
    i64,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    String,
    Option<i64>,
    Option<i64>,
    String,
    String,
);

const EVENT_COLUMNS: &str = "id, user_id, username, theme, place, contact, event_time, \
     photo_file_id, description, status, admin_message_id, channel_message_id, \
     created_at, updated_at";

/// Partial update applied to an event record.
///
/// `None` leaves a column untouched. The double-`Option` fields distinguish
/// "leave as is" from "clear to NULL" for the two clearable fields.
#[derive(Debug, Clone, Default)]
pub struct EventPatch {
    /// New theme.
    pub theme: Option<String>,
    /// New place.
    pub place: Option<String>,
    /// New contact.
    pub contact: Option<String>,
    /// New event time.
    pub event_time: Option<String>,
    /// New photo handle, or `Some(None)` to clear it.
    pub photo_file_id: Option<Option<PhotoRef>>,
    /// New description, or `Some(None)` to clear it.
    pub description: Option<Option<String>>,
    /// New lifecycle status.
    pub status: Option<EventStatus>,
    /// Moderation-chat message id.
    pub admin_message_id: Option<i64>,
    /// Published channel message id.
    pub channel_message_id: Option<i64>,
}

impl EventPatch {
    /// True when the patch would change nothing.
    fn is_empty(&self) -> bool {
        self.theme.is_none()
            && self.place.is_none()
            && self.contact.is_none()
            && self.event_time.is_none()
            && self.photo_file_id.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.admin_message_id.is_none()
            && self.channel_message_id.is_none()
    }
}

/// Parse an RFC 3339 timestamp or return now.
fn parse_rfc3339_or_now(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn event_from_row(row: EventRow) -> Result<EventRecord, StoreError> {
    Ok(EventRecord {
        id: row.0,
        user_id: row.1,
        username: row.2,
        theme: row.3,
        place: row.4,
        contact: row.5,
        event_time: row.6,
        photo_file_id: row.7.map(PhotoRef),
        description: row.8,
        status: EventStatus::parse(&row.9)?,
        admin_message_id: row.10,
        channel_message_id: row.11,
        created_at: parse_rfc3339_or_now(&row.12),
        updated_at: parse_rfc3339_or_now(&row.13),
    })
}

/// Durable storage for event records and conversation state.
#[derive(Debug, Clone)]
pub struct EventStore {
    pool: SqlitePool,
}

impl EventStore {
    /// Open (creating if missing) a store backed by a file.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the file cannot be opened or the
    /// schema cannot be applied.
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        Self::with_options(options).await
    }

    /// Open an in-memory store for testing.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the schema cannot be applied.
    pub async fn open_in_memory() -> Result<Self, StoreError> {
        let options =
            SqliteConnectOptions::from_str("sqlite::memory:").map_err(sqlx::Error::from)?;
        Self::with_options(options).await
    }

    async fn with_options(options: SqliteConnectOptions) -> Result<Self, StoreError> {
        // One connection: every statement is an atomic read-modify-write.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        sqlx::raw_sql(SCHEMA).execute(&pool).await?;
        Ok(Self { pool })
    }

    /// Create a new record in `creating` status and return its id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on SQLite failure.
    pub async fn create_event(
        &self,
        user_id: i64,
        username: Option<&str>,
    ) -> Result<i64, StoreError> {
        let now = Utc::now().to_rfc3339();
        let result = sqlx::query(
            "INSERT INTO events (user_id, username, status, created_at, updated_at) \
             VALUES (?, ?, 'creating', ?, ?)",
        )
        .bind(user_id)
        .bind(username)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        trace!(event_id = id, user_id, "event created");
        Ok(id)
    }

    /// Load a record by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on SQLite failure or
    /// [`StoreError::InvalidEnum`] if the stored status is unreadable.
    pub async fn get_event(&self, event_id: i64) -> Result<Option<EventRecord>, StoreError> {
        let row: Option<EventRow> =
            sqlx::query_as(&format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = ?"))
                .bind(event_id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(event_from_row).transpose()
    }

    /// Apply a partial update, refreshing `updated_at`.
    ///
    /// An empty patch is a no-op and does not touch the timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on SQLite failure.
    pub async fn update_event(&self, event_id: i64, patch: &EventPatch) -> Result<(), StoreError> {
        if patch.is_empty() {
            return Ok(());
        }

        let mut sets: Vec<&'static str> = Vec::new();
        if patch.theme.is_some() {
            sets.push("theme = ?");
        }
        if patch.place.is_some() {
            sets.push("place = ?");
        }
        if patch.contact.is_some() {
            sets.push("contact = ?");
        }
        if patch.event_time.is_some() {
            sets.push("event_time = ?");
        }
        if patch.photo_file_id.is_some() {
            sets.push("photo_file_id = ?");
        }
        if patch.description.is_some() {
            sets.push("description = ?");
        }
        if patch.status.is_some() {
            sets.push("status = ?");
        }
        if patch.admin_message_id.is_some() {
            sets.push("admin_message_id = ?");
        }
        if patch.channel_message_id.is_some() {
            sets.push("channel_message_id = ?");
        }
        sets.push("updated_at = ?");

        let sql = format!("UPDATE events SET {} WHERE id = ?", sets.join(", "));
        let mut query = sqlx::query(&sql);

        // Bind order must mirror the SET clause order above.
        if let Some(ref v) = patch.theme {
            query = query.bind(v);
        }
        if let Some(ref v) = patch.place {
            query = query.bind(v);
        }
        if let Some(ref v) = patch.contact {
            query = query.bind(v);
        }
        if let Some(ref v) = patch.event_time {
            query = query.bind(v);
        }
        if let Some(ref v) = patch.photo_file_id {
            query = query.bind(v.as_ref().map(|p| p.0.clone()));
        }
        if let Some(ref v) = patch.description {
            query = query.bind(v.clone());
        }
        if let Some(v) = patch.status {
            query = query.bind(v.as_str());
        }
        if let Some(v) = patch.admin_message_id {
            query = query.bind(v);
        }
        if let Some(v) = patch.channel_message_id {
            query = query.bind(v);
        }
        query = query.bind(Utc::now().to_rfc3339()).bind(event_id);

        query.execute(&self.pool).await?;
        trace!(event_id, "event updated");
        Ok(())
    }

    /// List a user's non-draft records, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on SQLite failure or
    /// [`StoreError::InvalidEnum`] on an unreadable status column.
    pub async fn events_by_author(&self, user_id: i64) -> Result<Vec<EventRecord>, StoreError> {
        let rows: Vec<EventRow> = sqlx::query_as(&format!(
            "SELECT {EVENT_COLUMNS} FROM events \
             WHERE user_id = ? AND status != 'creating' ORDER BY id DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(event_from_row).collect()
    }

    /// Load a user's conversation state.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on SQLite failure or
    /// [`StoreError::InvalidEnum`] on an unreadable step or field column.
    pub async fn get_state(&self, user_id: i64) -> Result<Option<ConversationState>, StoreError> {
        let row: Option<(String, Option<i64>, Option<String>)> =
            sqlx::query_as("SELECT step, event_id, edit_field FROM user_states WHERE user_id = ?")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;

        let Some((step, event_id, edit_field)) = row else {
            return Ok(None);
        };

        Ok(Some(ConversationState {
            step: Step::parse(&step)?,
            event_id,
            edit_field: edit_field.as_deref().map(EditField::parse).transpose()?,
        }))
    }

    /// Overwrite a user's conversation state.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on SQLite failure.
    pub async fn set_state(
        &self,
        user_id: i64,
        state: &ConversationState,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT OR REPLACE INTO user_states (user_id, step, event_id, edit_field) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(state.step.as_str())
        .bind(state.event_id)
        .bind(state.edit_field.map(|f| f.as_str()))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Delete a user's conversation state. A no-op when none exists.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on SQLite failure.
    pub async fn clear_state(&self, user_id: i64) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM user_states WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
