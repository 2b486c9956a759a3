//! Per-user conversation log and document uploads.

use anyhow::Result;
use sqlx::{Row, SqlitePool};

use crate::models::{ConversationTurn, Role, Upload};

#[derive(Clone)]
pub struct ConversationStore {
    pool: SqlitePool,
}

impl ConversationStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn append(&self, user_id: i64, role: Role, text: &str) -> Result<()> {
        let now = chrono::Utc::now().to_rfc3339();
        sqlx::query("INSERT INTO messages (user_id, role, text, created_at) VALUES (?, ?, ?, ?)")
            .bind(user_id)
            .bind(role.as_str())
            .bind(text)
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Store the normalized text of an upload and return its row id.
    pub async fn save_upload(&self, user_id: i64, filename: &str, content: &str) -> Result<i64> {
        let now = chrono::Utc::now().to_rfc3339();
        let result = sqlx::query(
            "INSERT INTO uploads (user_id, filename, content, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(filename)
        .bind(content)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn latest_upload(&self, user_id: i64) -> Result<Option<Upload>> {
        let row = sqlx::query(
            "SELECT id, user_id, filename, content, created_at FROM uploads \
             WHERE user_id = ? ORDER BY id DESC LIMIT 1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| Upload {
            id: row.get("id"),
            user_id: row.get("user_id"),
            filename: row.get("filename"),
            content: row.get("content"),
            created_at: row.get("created_at"),
        }))
    }

    /// The most recent `limit` turns, oldest first.
    pub async fn history(&self, user_id: i64, limit: u32) -> Result<Vec<ConversationTurn>> {
        let rows = sqlx::query(
            "SELECT role, text, created_at FROM (\
                 SELECT id, role, text, created_at FROM messages \
                 WHERE user_id = ? ORDER BY id DESC LIMIT ?\
             ) ORDER BY id ASC",
        )
        .bind(user_id)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let role: String = row.get("role");
                Ok(ConversationTurn {
                    role: role.parse()?,
                    text: row.get("text"),
                    created_at: row.get("created_at"),
                })
            })
            .collect()
    }
}
