use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::model::ParsedRecipe;

const ID_LEN: usize = 10;
const INSERT_ATTEMPTS: usize = 3;

#[derive(Debug, Error)]
pub enum ShareError {
    #[error("Invalid recipe data: a title and at least one ingredient or instruction are required")]
    InvalidRecipe,

    #[error("Share storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Corrupt share payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("Share store directory unavailable: {0}")]
    Io(#[from] std::io::Error),
}

/// A recipe retrieved by share id.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedRecipe {
    pub recipe: ParsedRecipe,
    pub source_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Short-lived recipe snapshots keyed by a random id. Rows past their expiry
/// are invisible to `get` until `purge_expired` removes them.
pub struct ShareStore {
    conn: Connection,
    ttl_ms: i64,
}

impl ShareStore {
    pub fn open(path: impl AsRef<Path>, ttl: Duration) -> Result<Self, ShareError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Self::with_connection(conn, ttl)
    }

    pub fn open_in_memory(ttl: Duration) -> Result<Self, ShareError> {
        Self::with_connection(Connection::open_in_memory()?, ttl)
    }

    fn with_connection(conn: Connection, ttl: Duration) -> Result<Self, ShareError> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS shares (
                id         TEXT PRIMARY KEY,
                payload    TEXT NOT NULL,
                source_url TEXT,
                created_at INTEGER NOT NULL,
                expires_at INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_shares_expires ON shares(expires_at);
            ",
        )?;
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        Ok(ShareStore { conn, ttl_ms })
    }

    /// Store `recipe` and return its share id.
    pub fn share(&self, recipe: &ParsedRecipe, source_url: Option<&str>) -> Result<String, ShareError> {
        self.share_at(recipe, source_url, now_ms())
    }

    pub fn get(&self, id: &str) -> Result<Option<SharedRecipe>, ShareError> {
        self.get_at(id, now_ms())
    }

    /// Delete expired rows. Returns how many were removed.
    pub fn purge_expired(&self) -> Result<usize, ShareError> {
        self.purge_at(now_ms())
    }

    fn share_at(&self, recipe: &ParsedRecipe, source_url: Option<&str>, now: i64) -> Result<String, ShareError> {
        if recipe.title.trim().is_empty()
            || (recipe.ingredients.is_empty() && recipe.instructions.is_empty())
        {
            return Err(ShareError::InvalidRecipe);
        }

        let payload = serde_json::to_string(recipe)?;
        let expires_at = now.saturating_add(self.ttl_ms);

        let mut attempt = 0;
        loop {
            attempt += 1;
            let id = new_id();
            let inserted = self.conn.execute(
                "INSERT INTO shares (id, payload, source_url, created_at, expires_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![id, payload, source_url, now, expires_at],
            );
            match inserted {
                Ok(_) => {
                    info!("Shared \"{}\" as {}", recipe.title, id);
                    return Ok(id);
                }
                Err(rusqlite::Error::SqliteFailure(e, _))
                    if e.code == ErrorCode::ConstraintViolation && attempt < INSERT_ATTEMPTS =>
                {
                    debug!("Share id {} already taken, retrying", id);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn get_at(&self, id: &str, now: i64) -> Result<Option<SharedRecipe>, ShareError> {
        let row = self
            .conn
            .query_row(
                "SELECT payload, source_url, created_at FROM shares
                 WHERE id = ?1 AND expires_at > ?2",
                params![id, now],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, Option<String>>(1)?,
                        row.get::<_, i64>(2)?,
                    ))
                },
            )
            .optional()?;

        let Some((payload, source_url, created_ms)) = row else {
            return Ok(None);
        };
        Ok(Some(SharedRecipe {
            recipe: serde_json::from_str(&payload)?,
            source_url,
            created_at: DateTime::from_timestamp_millis(created_ms).unwrap_or_default(),
        }))
    }

    fn purge_at(&self, now: i64) -> Result<usize, ShareError> {
        let removed = self
            .conn
            .execute("DELETE FROM shares WHERE expires_at <= ?1", params![now])?;
        if removed > 0 {
            info!("Purged {} expired share(s)", removed);
        }
        Ok(removed)
    }
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

fn new_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(ID_LEN);
    id
}

// ── Tests ──
