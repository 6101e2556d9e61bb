//! Per-channel attempt serialization.
//!
//! Concurrent messages can arrive faster than a database round trip, so
//! each channel owns a non-blocking mutual-exclusion gate: exactly one
//! attempt may be in flight per channel, and a contender is rejected
//! immediately rather than queued. Every cooldown decision downstream
//! reads persisted state, so serializing here eliminates read-modify-
//! write races on the per-channel timeline.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Guard for one channel's in-flight attempt.
///
/// Dropping the guard releases the gate; holding it across awaits keeps
/// the channel exclusive for the whole protected region, including
/// error exits.
pub type GateGuard = OwnedMutexGuard<()>;

/// Registry of per-channel gates, created lazily on first attempt.
///
/// Entries are never removed: a channel's gate lives as long as the
/// engine, mirroring the owning chat session.
#[derive(Debug, Default)]
pub struct ChannelGates {
    gates: DashMap<String, Arc<Mutex<()>>>,
}

impl ChannelGates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to acquire the gate for `channel` without waiting.
    ///
    /// Returns `None` when another attempt holds the gate; callers must
    /// bail out immediately (no draw, no persistence).
    pub fn try_acquire(&self, channel: &str) -> Option<GateGuard> {
        let gate = self
            .gates
            .entry(channel.to_string())
            .or_default()
            .clone();
        gate.try_lock_owned().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_is_rejected() {
        let gates = ChannelGates::new();
        let guard = gates.try_acquire("#town");
        assert!(guard.is_some());
        assert!(gates.try_acquire("#town").is_none());
    }

    #[test]
    fn test_release_on_drop() {
        let gates = ChannelGates::new();
        {
            let _guard = gates.try_acquire("#town").unwrap();
            assert!(gates.try_acquire("#town").is_none());
        }
        assert!(gates.try_acquire("#town").is_some());
    }

    #[test]
    fn test_channels_are_independent() {
        let gates = ChannelGates::new();
        let _a = gates.try_acquire("#town").unwrap();
        assert!(gates.try_acquire("#square").is_some());
    }
}
