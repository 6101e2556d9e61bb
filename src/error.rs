//! Unified error handling for slotmill.
//!
//! Every rejection or failure an attempt can produce is a variant here,
//! with a static code for metrics/log labeling. Rejections (`GateBusy`,
//! `CooldownActive`, `PoolUnavailable`) are non-fatal: they short-circuit
//! the attempt before anything is persisted.

use crate::db::DbError;
use thiserror::Error;

/// Errors that can occur while processing one slots attempt.
#[derive(Debug, Error)]
pub enum SlotsError {
    /// Another attempt currently holds this channel's gate.
    ///
    /// The caller has already been whispered a channel-cooldown notice;
    /// nothing was drawn or persisted.
    #[error("channel gate busy")]
    GateBusy,

    /// The channel-wide or per-user cooldown window has not elapsed.
    #[error("cooldown active")]
    CooldownActive,

    /// An emote catalog could not be loaded or yielded too few entries.
    ///
    /// The attempt aborts silently before any state mutation.
    #[error("emote pool unavailable")]
    PoolUnavailable,

    /// Durable store failure; the attempt transaction did not commit.
    #[error("database error: {0}")]
    Db(#[from] DbError),

    /// The external moderation log rejected a timeout record.
    ///
    /// Raised only after the attempt has committed; callers log it and
    /// must not treat the attempt itself as failed.
    #[error("moderation log failure: {0}")]
    ModerationLog(String),
}

impl SlotsError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::GateBusy => "gate_busy",
            Self::CooldownActive => "cooldown_active",
            Self::PoolUnavailable => "pool_unavailable",
            Self::Db(_) => "db_error",
            Self::ModerationLog(_) => "moderation_log_failure",
        }
    }

    /// Whether this is a routine rejection rather than a failure.
    ///
    /// Rejections are part of normal operation (contention, cooldowns,
    /// catalog outages) and are logged at debug, not error.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::GateBusy | Self::CooldownActive | Self::PoolUnavailable
        )
    }
}

/// Result type for attempt processing.
pub type SlotsResult<T> = Result<T, SlotsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(SlotsError::GateBusy.error_code(), "gate_busy");
        assert_eq!(SlotsError::CooldownActive.error_code(), "cooldown_active");
        assert_eq!(
            SlotsError::ModerationLog("oops".into()).error_code(),
            "moderation_log_failure"
        );
    }

    #[test]
    fn test_rejections_vs_failures() {
        assert!(SlotsError::GateBusy.is_rejection());
        assert!(SlotsError::CooldownActive.is_rejection());
        assert!(SlotsError::PoolUnavailable.is_rejection());
        assert!(!SlotsError::ModerationLog("x".into()).is_rejection());
    }
}
