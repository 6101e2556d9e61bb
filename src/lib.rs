//! slotmill - per-channel emote slots mini-game engine.
//!
//! Users trigger attempts from chat; the engine serializes them per
//! channel, enforces cooldowns, classifies automated play from attempt
//! timing, draws three emotes from a per-attempt pool and durably
//! records the attempt and any win. Message delivery, catalog fetching
//! and the moderation side-channel are supplied by the hosting bot
//! through the traits in [`chat`] and [`pool`].

pub mod chat;
pub mod classify;
pub mod config;
pub mod cooldown;
pub mod db;
pub mod engine;
pub mod error;
pub mod gate;
pub mod outcome;
pub mod pool;
pub mod variant;

pub use chat::{ChatSink, ModerationLog, Privileges};
pub use classify::Transition;
pub use config::{ConfigError, SlotsConfig};
pub use db::{Database, DbError, SqlDialect};
pub use engine::{Attempt, PlayResult, SlotsEngine};
pub use error::{SlotsError, SlotsResult};
pub use gate::ChannelGates;
pub use outcome::{Categories, Draw, Outcome};
pub use pool::{EmoteCatalog, EmotePool};
pub use variant::Variant;
