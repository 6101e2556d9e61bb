//! Per-attempt emote pool generation.
//!
//! A pool is an ephemeral emote-id → display-name mapping built fresh
//! for every attempt, never persisted. Each variant sources it
//! differently:
//!
//! - Twitch: the bot's own emote catalog, floor of 8 entries, capped at
//!   16 with the jackpot emote guaranteed a slot when the catalog has
//!   it.
//! - FFZ / BTTV: a global catalog merged with the channel's catalog
//!   (fetched concurrently), capped at 16 with no pinned entry.
//!
//! A missing source, or a merge that yields no emotes at all, aborts
//! the attempt with `PoolUnavailable` before any state is touched.

use crate::config::PoolConfig;
use crate::error::SlotsError;
use crate::variant::Variant;
use async_trait::async_trait;
use rand::Rng;
use rand::seq::IteratorRandom;
use std::collections::HashMap;

/// Emote-id → display-name mapping for one attempt.
pub type EmotePool = HashMap<String, String>;

/// Catalog fetchers supplied by the hosting bot.
///
/// Each method returns `None` when the upstream source is unavailable;
/// the engine never retries, it just aborts the attempt.
#[async_trait]
pub trait EmoteCatalog: Send + Sync {
    /// Emotes usable by the bot account (Twitch variant source).
    async fn bot_emotes(&self) -> Option<EmotePool>;

    /// Twitch emote-id → emote-set-id mapping, used for the
    /// subscriber-match category. `None` falls back to an identity
    /// mapping.
    async fn emote_sets(&self) -> Option<HashMap<String, i64>>;

    /// Platform-global catalog for FFZ/BTTV.
    async fn global_emotes(&self, variant: Variant) -> Option<EmotePool>;

    /// Channel-specific catalog for FFZ/BTTV.
    async fn channel_emotes(&self, variant: Variant, channel: &str) -> Option<EmotePool>;
}

/// Build the draw pool for one attempt.
pub async fn build(
    catalog: &dyn EmoteCatalog,
    config: &PoolConfig,
    variant: Variant,
    channel: &str,
) -> Result<EmotePool, SlotsError> {
    match variant {
        Variant::Twitch => {
            let raw = catalog
                .bot_emotes()
                .await
                .ok_or(SlotsError::PoolUnavailable)?;
            if raw.len() < config.min_size {
                return Err(SlotsError::PoolUnavailable);
            }
            Ok(bound_pinned(raw, config, &mut rand::thread_rng()))
        }
        Variant::Ffz | Variant::Bttv => {
            let (global, channel_emotes) = tokio::join!(
                catalog.global_emotes(variant),
                catalog.channel_emotes(variant, channel),
            );
            let (global, channel_emotes) = match (global, channel_emotes) {
                (Some(g), Some(c)) => (g, c),
                _ => return Err(SlotsError::PoolUnavailable),
            };
            let mut merged = global;
            // Channel entries win on id collision.
            merged.extend(channel_emotes);
            // Both sources can be up yet empty; an empty draw space is
            // the same outage as a missing one.
            if merged.is_empty() {
                return Err(SlotsError::PoolUnavailable);
            }
            Ok(bound(merged, config.max_size, &mut rand::thread_rng()))
        }
    }
}

/// Cap a merged pool at `max` entries by uniform downsampling.
fn bound<R: Rng>(pool: EmotePool, max: usize, rng: &mut R) -> EmotePool {
    if pool.len() <= max {
        return pool;
    }
    pool.into_iter().choose_multiple(rng, max).into_iter().collect()
}

/// Cap the Twitch pool, keeping the jackpot emote in the draw space.
///
/// Sampling k−1 from the remainder and re-appending the pinned entry is
/// O(pool size); no rejection sampling.
fn bound_pinned<R: Rng>(mut pool: EmotePool, config: &PoolConfig, rng: &mut R) -> EmotePool {
    if pool.len() <= config.max_size {
        return pool;
    }
    match pool.remove(&config.jackpot_emote_id) {
        Some(name) => {
            let mut sampled = bound(pool, config.max_size - 1, rng);
            sampled.insert(config.jackpot_emote_id.clone(), name);
            sampled
        }
        None => bound(pool, config.max_size, rng),
    }
}
