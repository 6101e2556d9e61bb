//! Attempt and winner repository.
//!
//! All timing queries the cooldown evaluator and the bot classifier
//! depend on live here, plus the transactional recorder that writes an
//! attempt row and, on a full match, the winner row in one commit.

use crate::db::DbError;
use crate::outcome::{Draw, Outcome};
use crate::variant::Variant;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

/// One persisted attempt row (as read back).
#[derive(Debug, Clone)]
pub struct RecordedAttempt {
    pub user: String,
    pub attempt_time: DateTime<Utc>,
    pub num_matching: i64,
    pub is_win: bool,
    pub emotes: [String; 3],
    pub emote_ids: [String; 3],
}

/// One persisted winner row.
#[derive(Debug, Clone)]
pub struct WinnerRecord {
    pub broadcaster: String,
    pub winning_time: DateTime<Utc>,
    pub winner: String,
    pub winning_emote: String,
    pub winning_emote_id: String,
}

/// Repository for attempt history and winner records.
pub struct AttemptRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> AttemptRepository<'a> {
    /// Create a new attempt repository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Most recent attempt time in the channel across all three
    /// variants. This is the shared channel-cooldown clock.
    pub async fn last_channel_attempt(
        &self,
        channel: &str,
    ) -> Result<Option<DateTime<Utc>>, DbError> {
        let row: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT MAX(attempt_time) FROM (
                SELECT MAX(attempt_time) AS attempt_time
                    FROM slot_attempts
                    WHERE broadcaster = ?
                UNION ALL
                SELECT MAX(attempt_time) FROM ffz_slot_attempts WHERE broadcaster = ?
                UNION ALL
                SELECT MAX(attempt_time) FROM bttv_slot_attempts WHERE broadcaster = ?
            )
            "#,
        )
        .bind(channel)
        .bind(channel)
        .bind(channel)
        .fetch_one(self.pool)
        .await?;

        Ok(row.and_then(DateTime::from_timestamp_millis))
    }

    /// Most recent attempt time for one user in one variant.
    pub async fn last_user_attempt(
        &self,
        variant: Variant,
        channel: &str,
        user: &str,
    ) -> Result<Option<DateTime<Utc>>, DbError> {
        let sql = format!(
            "SELECT MAX(attempt_time) FROM {} WHERE broadcaster = ? AND twitch_user = ?",
            variant.attempts_table()
        );
        let row: Option<i64> = sqlx::query_scalar(&sql)
            .bind(channel)
            .bind(user)
            .fetch_one(self.pool)
            .await?;

        Ok(row.and_then(DateTime::from_timestamp_millis))
    }

    /// Ascending attempt times for one user in one variant since
    /// `since` (the classifier's trailing window).
    pub async fn attempts_since(
        &self,
        variant: Variant,
        channel: &str,
        user: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<DateTime<Utc>>, DbError> {
        let sql = format!(
            r#"
            SELECT attempt_time FROM {}
                WHERE broadcaster = ? AND twitch_user = ? AND attempt_time >= ?
                ORDER BY attempt_time ASC
            "#,
            variant.attempts_table()
        );
        let rows: Vec<i64> = sqlx::query_scalar(&sql)
            .bind(channel)
            .bind(user)
            .bind(since.timestamp_millis())
            .fetch_all(self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(DateTime::from_timestamp_millis)
            .collect())
    }

    /// Persist one evaluated attempt, and on a full match the winner
    /// row, in a single transaction. Either both rows commit or
    /// neither does.
    pub async fn record(
        &self,
        variant: Variant,
        channel: &str,
        user: &str,
        now: DateTime<Utc>,
        draw: &Draw,
        outcome: &Outcome,
    ) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await?;
        let time = now.timestamp_millis();

        if variant.has_categories() {
            let categories = outcome.categories.unwrap_or_default();
            let sql = format!(
                r#"
                INSERT INTO {}
                        (broadcaster, attempt_time, twitch_user, num_matching, is_win,
                        emote_1, emote_2, emote_3, emote_id_1, emote_id_2, emote_id_3,
                        is_basic_match, is_kappa_match, is_cat_match, is_dog_match,
                        is_subscriber_match)
                    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
                variant.attempts_table()
            );
            sqlx::query(&sql)
                .bind(channel)
                .bind(time)
                .bind(user)
                .bind(outcome.num_matching as i64)
                .bind(outcome.all_matching)
                .bind(&draw.names[0])
                .bind(&draw.names[1])
                .bind(&draw.names[2])
                .bind(&draw.ids[0])
                .bind(&draw.ids[1])
                .bind(&draw.ids[2])
                .bind(categories.basic)
                .bind(categories.kappa)
                .bind(categories.cat)
                .bind(categories.dog)
                .bind(categories.subscriber)
                .execute(&mut *tx)
                .await?;
        } else {
            let sql = format!(
                r#"
                INSERT INTO {}
                        (broadcaster, attempt_time, twitch_user, num_matching, is_win,
                        emote_1, emote_2, emote_3, emote_id_1, emote_id_2, emote_id_3)
                    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
                variant.attempts_table()
            );
            sqlx::query(&sql)
                .bind(channel)
                .bind(time)
                .bind(user)
                .bind(outcome.num_matching as i64)
                .bind(outcome.all_matching)
                .bind(&draw.names[0])
                .bind(&draw.names[1])
                .bind(&draw.names[2])
                .bind(&draw.ids[0])
                .bind(&draw.ids[1])
                .bind(&draw.ids[2])
                .execute(&mut *tx)
                .await?;
        }

        if outcome.all_matching {
            let sql = format!(
                r#"
                INSERT INTO {}
                        (broadcaster, winning_time, winner, winning_emote, winning_emote_id)
                    VALUES (?, ?, ?, ?, ?)
                "#,
                variant.winners_table()
            );
            sqlx::query(&sql)
                .bind(channel)
                .bind(time)
                .bind(user)
                .bind(&draw.names[0])
                .bind(&draw.ids[0])
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Attempt rows for one channel/variant, most recent first.
    pub async fn attempts_for_channel(
        &self,
        variant: Variant,
        channel: &str,
    ) -> Result<Vec<RecordedAttempt>, DbError> {
        let sql = format!(
            r#"
            SELECT twitch_user, attempt_time, num_matching, is_win,
                   emote_1, emote_2, emote_3, emote_id_1, emote_id_2, emote_id_3
                FROM {}
                WHERE broadcaster = ?
                ORDER BY attempt_time DESC
            "#,
            variant.attempts_table()
        );
        let rows: Vec<(
            String,
            i64,
            i64,
            bool,
            String,
            String,
            String,
            String,
            String,
            String,
        )> = sqlx::query_as(&sql).bind(channel).fetch_all(self.pool).await?;

        rows.into_iter()
            .map(|(user, time, num_matching, is_win, e1, e2, e3, i1, i2, i3)| {
                let attempt_time = DateTime::from_timestamp_millis(time)
                    .ok_or_else(|| DbError::Internal(format!("bad attempt_time {}", time)))?;
                Ok(RecordedAttempt {
                    user,
                    attempt_time,
                    num_matching,
                    is_win,
                    emotes: [e1, e2, e3],
                    emote_ids: [i1, i2, i3],
                })
            })
            .collect()
    }

    /// Most recent winners for one channel/variant.
    pub async fn recent_winners(
        &self,
        variant: Variant,
        channel: &str,
        limit: i64,
    ) -> Result<Vec<WinnerRecord>, DbError> {
        let sql = format!(
            r#"
            SELECT broadcaster, winning_time, winner, winning_emote, winning_emote_id
                FROM {}
                WHERE broadcaster = ?
                ORDER BY winning_time DESC
                LIMIT ?
            "#,
            variant.winners_table()
        );
        let rows: Vec<(String, i64, String, String, String)> = sqlx::query_as(&sql)
            .bind(channel)
            .bind(limit)
            .fetch_all(self.pool)
            .await?;

        rows.into_iter()
            .map(|(broadcaster, time, winner, winning_emote, winning_emote_id)| {
                let winning_time = DateTime::from_timestamp_millis(time)
                    .ok_or_else(|| DbError::Internal(format!("bad winning_time {}", time)))?;
                Ok(WinnerRecord {
                    broadcaster,
                    winning_time,
                    winner,
                    winning_emote,
                    winning_emote_id,
                })
            })
            .collect()
    }
}
