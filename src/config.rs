//! Engine configuration.
//!
//! All the empirically chosen constants live here so operators can tune
//! them from TOML without touching the engine: cooldown windows, the
//! bot-classifier variance tiers, pool size bounds and the pinned
//! jackpot emote.

use chrono::Duration;
use serde::Deserialize;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SlotsConfig {
    /// Cooldown windows.
    #[serde(default)]
    pub cooldowns: CooldownConfig,
    /// Bot classification heuristic.
    #[serde(default)]
    pub classifier: ClassifierConfig,
    /// Pool size bounds and the pinned jackpot entry.
    #[serde(default)]
    pub pool: PoolConfig,
    /// Base URL of the winners listing site.
    #[serde(default = "default_winners_url_base")]
    pub winners_url_base: String,
}

impl Default for SlotsConfig {
    fn default() -> Self {
        Self {
            cooldowns: CooldownConfig::default(),
            classifier: ClassifierConfig::default(),
            pool: PoolConfig::default(),
            winners_url_base: default_winners_url_base(),
        }
    }
}

fn default_winners_url_base() -> String {
    "http://megotsthis.com/botgotsthis/t".to_string()
}

impl SlotsConfig {
    /// Load configuration from a TOML file, then validate it.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pool.min_size == 0 || self.pool.max_size < self.pool.min_size {
            return Err(ConfigError::Invalid(format!(
                "pool bounds must satisfy 0 < min ({}) <= max ({})",
                self.pool.min_size, self.pool.max_size
            )));
        }
        if self.classifier.recent_window < 2 {
            return Err(ConfigError::Invalid(
                "classifier.recent_window needs at least 2 gaps".into(),
            ));
        }
        for tier in &self.classifier.tiers {
            if tier.min_gaps < 2 {
                return Err(ConfigError::Invalid(
                    "classifier tiers need at least 2 gaps".into(),
                ));
            }
        }
        if self.cooldowns.bot_seconds < self.cooldowns.attempt_seconds {
            return Err(ConfigError::Invalid(
                "bot cooldown must not be shorter than the normal cooldown".into(),
            ));
        }
        Ok(())
    }
}

/// Cooldown windows, all in seconds.
#[derive(Debug, Clone, Deserialize)]
pub struct CooldownConfig {
    /// Channel-wide spacing across all three variants (default: 3).
    #[serde(default = "default_channel_seconds")]
    pub channel_seconds: u64,
    /// Per-user spacing for unflagged users (default: 120).
    #[serde(default = "default_attempt_seconds")]
    pub attempt_seconds: u64,
    /// Per-user spacing once flagged as a bot (default: 1200).
    #[serde(default = "default_bot_seconds")]
    pub bot_seconds: u64,
}

impl Default for CooldownConfig {
    fn default() -> Self {
        Self {
            channel_seconds: default_channel_seconds(),
            attempt_seconds: default_attempt_seconds(),
            bot_seconds: default_bot_seconds(),
        }
    }
}

impl CooldownConfig {
    pub fn channel(&self) -> Duration {
        Duration::seconds(self.channel_seconds as i64)
    }

    pub fn attempt(&self) -> Duration {
        Duration::seconds(self.attempt_seconds as i64)
    }

    pub fn bot(&self) -> Duration {
        Duration::seconds(self.bot_seconds as i64)
    }
}

fn default_channel_seconds() -> u64 {
    3
}

fn default_attempt_seconds() -> u64 {
    120
}

fn default_bot_seconds() -> u64 {
    1200
}

/// One variance tier of the bot classifier: with at least `min_gaps`
/// inter-attempt gaps, a standard deviation below `max_stdev` seconds
/// flags the user.
#[derive(Debug, Clone, Deserialize)]
pub struct VarianceTier {
    pub min_gaps: usize,
    pub max_stdev: f64,
}

/// Bot classification heuristic settings.
///
/// The tier thresholds are empirically chosen in production; they widen
/// with sample count so a human's accumulated jitter does not trip them.
#[derive(Debug, Clone, Deserialize)]
pub struct ClassifierConfig {
    /// Trailing window of attempts examined (default: 2 hours).
    #[serde(default = "default_log_window_seconds")]
    pub log_window_seconds: u64,
    /// Inactivity period after which a flag lapses (default: 1 hour).
    #[serde(default = "default_unbot_seconds")]
    pub unbot_seconds: u64,
    /// Variance tiers over the full gap sequence.
    #[serde(default = "default_tiers")]
    pub tiers: Vec<VarianceTier>,
    /// Number of most-recent gaps checked by the tail rule (default: 5).
    #[serde(default = "default_recent_window")]
    pub recent_window: usize,
    /// Stdev cap for the tail rule, in seconds (default: 1.0).
    #[serde(default = "default_recent_max_stdev")]
    pub recent_max_stdev: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            log_window_seconds: default_log_window_seconds(),
            unbot_seconds: default_unbot_seconds(),
            tiers: default_tiers(),
            recent_window: default_recent_window(),
            recent_max_stdev: default_recent_max_stdev(),
        }
    }
}

impl ClassifierConfig {
    pub fn log_window(&self) -> Duration {
        Duration::seconds(self.log_window_seconds as i64)
    }

    pub fn unbot(&self) -> Duration {
        Duration::seconds(self.unbot_seconds as i64)
    }
}

fn default_log_window_seconds() -> u64 {
    7200
}

fn default_unbot_seconds() -> u64 {
    3600
}

fn default_tiers() -> Vec<VarianceTier> {
    vec![
        VarianceTier {
            min_gaps: 5,
            max_stdev: 1.0,
        },
        VarianceTier {
            min_gaps: 10,
            max_stdev: 3.5,
        },
        VarianceTier {
            min_gaps: 15,
            max_stdev: 10.0,
        },
    ]
}

fn default_recent_window() -> usize {
    5
}

fn default_recent_max_stdev() -> f64 {
    1.0
}

/// Pool size bounds and the pinned jackpot entry.
#[derive(Debug, Clone, Deserialize)]
pub struct PoolConfig {
    /// Minimum Twitch catalog size; below this the draw space is
    /// degenerate and the attempt aborts (default: 8).
    #[serde(default = "default_min_size")]
    pub min_size: usize,
    /// Maximum pool size for every variant (default: 16).
    #[serde(default = "default_max_size")]
    pub max_size: usize,
    /// Emote id guaranteed a slot in the Twitch pool when the catalog
    /// carries it (default: "25", Kappa).
    #[serde(default = "default_jackpot_emote_id")]
    pub jackpot_emote_id: String,
    /// Timeout length issued on a moderated jackpot win, in seconds
    /// (default: 1).
    #[serde(default = "default_jackpot_timeout_seconds")]
    pub jackpot_timeout_seconds: u32,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            min_size: default_min_size(),
            max_size: default_max_size(),
            jackpot_emote_id: default_jackpot_emote_id(),
            jackpot_timeout_seconds: default_jackpot_timeout_seconds(),
        }
    }
}

fn default_min_size() -> usize {
    8
}

fn default_max_size() -> usize {
    16
}

fn default_jackpot_emote_id() -> String {
    "25".to_string()
}

fn default_jackpot_timeout_seconds() -> u32 {
    1
}
