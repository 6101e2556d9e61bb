//! Bot-flag repository.
//!
//! A flag row marks a (channel, user) pair as automated. Rows are
//! upserted with the marking time and never deleted; a flag stops
//! mattering once `marked` falls out of the unbot window, which is a
//! read-side rule so staleness can't accumulate.

use crate::db::{DbError, SqlDialect};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

/// Repository for bot classification flags.
pub struct BotFlagRepository<'a> {
    pool: &'a SqlitePool,
    dialect: SqlDialect,
}

impl<'a> BotFlagRepository<'a> {
    /// Create a new bot-flag repository.
    pub fn new(pool: &'a SqlitePool, dialect: SqlDialect) -> Self {
        Self { pool, dialect }
    }

    /// Whether the user currently counts as flagged: a row exists and
    /// was marked at or after `threshold` (now minus the unbot window).
    pub async fn is_flagged(
        &self,
        channel: &str,
        user: &str,
        threshold: DateTime<Utc>,
    ) -> Result<bool, DbError> {
        let row: Option<i64> = sqlx::query_scalar(
            "SELECT 1 FROM slot_bots WHERE broadcaster = ? AND bot = ? AND marked >= ?",
        )
        .bind(channel)
        .bind(user)
        .bind(threshold.timestamp_millis())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.is_some())
    }

    /// Upsert the flag with a fresh mark time.
    ///
    /// Re-marking an expired row re-arms it; the dialect only changes
    /// the upsert spelling, not the result.
    pub async fn mark(
        &self,
        channel: &str,
        user: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, DbError> {
        let marked = now.timestamp_millis();
        let result = match self.dialect {
            SqlDialect::Sqlite => {
                sqlx::query("REPLACE INTO slot_bots (broadcaster, bot, marked) VALUES (?, ?, ?)")
                    .bind(channel)
                    .bind(user)
                    .bind(marked)
                    .execute(self.pool)
                    .await?
            }
            SqlDialect::Postgres => {
                sqlx::query(
                    r#"
                    INSERT INTO slot_bots (broadcaster, bot, marked) VALUES (?, ?, ?)
                        ON CONFLICT (broadcaster, bot)
                        DO UPDATE SET marked = excluded.marked
                    "#,
                )
                .bind(channel)
                .bind(user)
                .bind(marked)
                .execute(self.pool)
                .await?
            }
        };

        Ok(result.rows_affected() != 0)
    }
}
