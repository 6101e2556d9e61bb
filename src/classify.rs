//! Bot classification heuristic.
//!
//! Scripted rapid-fire play shows up as unnaturally regular spacing
//! between attempts. The classifier looks at the whole-second gaps
//! between a user's attempts over a trailing window and flags the user
//! when the gap variance is implausibly low for the sample size. The
//! variance tolerance widens as samples accumulate: small samples need
//! near-zero jitter to flag, large samples flag on broader regularity,
//! which keeps false positives down on both ends.
//!
//! A flag is never explicitly cleared by good variance; it lapses after
//! an hour of inactivity (the "unbot" window), at which point the next
//! attempt reports the user as unflagged again.

use crate::config::ClassifierConfig;
use chrono::{DateTime, Utc};

/// Result of re-classifying a user on an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Newly classified as a bot; the flag must be persisted and the
    /// user told their cooldown grew.
    Flagged,
    /// The flag lapsed via inactivity; the user must be told their
    /// cooldown is back to normal.
    Unflagged,
    /// No observable change; no message, no write.
    NoChange,
}

/// Re-classify a user given their attempt history.
///
/// `attempts` is the ascending list of the user's attempt times within
/// the trailing log window for this variant; `last_attempt` is their
/// most recent attempt (`None` if they have never played, which counts
/// as unbounded inactivity).
pub fn evaluate(
    config: &ClassifierConfig,
    now: DateTime<Utc>,
    last_attempt: Option<DateTime<Utc>>,
    currently_flagged: bool,
    attempts: &[DateTime<Utc>],
) -> Transition {
    let inactive = match last_attempt {
        Some(last) => now - last >= config.unbot(),
        None => true,
    };
    if inactive {
        return if currently_flagged {
            Transition::Unflagged
        } else {
            Transition::NoChange
        };
    }

    let gaps = gap_seconds(attempts);
    if regular_enough(config, &gaps) && !currently_flagged {
        Transition::Flagged
    } else {
        Transition::NoChange
    }
}

/// Whole-second gaps between consecutive attempts.
fn gap_seconds(attempts: &[DateTime<Utc>]) -> Vec<i64> {
    attempts
        .windows(2)
        .map(|pair| (pair[1] - pair[0]).num_seconds())
        .collect()
}

/// Whether any variance tier fires on the gap sequence.
fn regular_enough(config: &ClassifierConfig, gaps: &[i64]) -> bool {
    for tier in &config.tiers {
        if gaps.len() >= tier.min_gaps && population_stdev(gaps) < tier.max_stdev {
            return true;
        }
    }
    // Tail rule: a steady burst at the end of an otherwise noisy
    // history is still a bot.
    if gaps.len() >= config.recent_window {
        let tail = &gaps[gaps.len() - config.recent_window..];
        if population_stdev(tail) < config.recent_max_stdev {
            return true;
        }
    }
    false
}

/// Population standard deviation (n divisor) of a gap sequence.
fn population_stdev(values: &[i64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().map(|&v| v as f64).sum::<f64>() / n;
    let variance = values
        .iter()
        .map(|&v| {
            let d = v as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / n;
    variance.sqrt()
}
