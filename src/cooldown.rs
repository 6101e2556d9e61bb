//! Cooldown evaluation.
//!
//! Two windows gate every attempt, checked in order while the channel
//! gate is held:
//!
//! 1. A channel-wide window shared by all three variants (the channel's
//!    most recent attempt in *any* variant starts the clock).
//! 2. A per-user window for the requested variant: 2 minutes normally,
//!    20 minutes once the user is flagged as a bot. Flagged users are
//!    throttled silently so the longer window cannot be probed for.
//!
//! All decisions are made against persisted timestamps; missing history
//! means the user or channel has never played and is always ready.

use crate::config::CooldownConfig;
use chrono::{DateTime, Duration, Utc};

/// Outcome of a cooldown check.
#[derive(Debug, Clone, PartialEq)]
pub enum CooldownVerdict {
    /// No window applies; proceed with the attempt.
    Ready,
    /// Channel-wide window active; always whisper the remaining time.
    ChannelActive { remaining_seconds: f64 },
    /// Per-user window active. `notify` is false for flagged users.
    UserActive {
        remaining_seconds: f64,
        notify: bool,
    },
}

/// Evaluate both cooldown windows for an attempt at `now`.
pub fn evaluate(
    config: &CooldownConfig,
    now: DateTime<Utc>,
    channel_last: Option<DateTime<Utc>>,
    user_last: Option<DateTime<Utc>>,
    flagged_bot: bool,
) -> CooldownVerdict {
    if let Some(last) = channel_last {
        let since = now - last;
        if since < config.channel() {
            return CooldownVerdict::ChannelActive {
                remaining_seconds: remaining(config.channel(), since),
            };
        }
    }

    let window = if flagged_bot {
        config.bot()
    } else {
        config.attempt()
    };
    if let Some(last) = user_last {
        let since = now - last;
        if since < window {
            return CooldownVerdict::UserActive {
                remaining_seconds: remaining(window, since),
                notify: !flagged_bot,
            };
        }
    }

    CooldownVerdict::Ready
}

/// Whisper text for an active channel window.
pub fn channel_notice(remaining_seconds: f64) -> String {
    format!("Channel cooldown ({:.1} seconds)", remaining_seconds)
}

/// Whisper text for an active per-user window.
pub fn user_notice(remaining_seconds: f64) -> String {
    format!("Slots Cooldown ({:.1} seconds)", remaining_seconds)
}

/// Minute figure for the flag-transition notices. Whole-minute windows
/// print without a fraction; a tuned 90s window prints as 1.5.
pub fn window_minutes(seconds: u64) -> f64 {
    seconds as f64 / 60.0
}

fn remaining(window: Duration, since: Duration) -> f64 {
    (window - since).num_milliseconds() as f64 / 1000.0
}
