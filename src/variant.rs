//! Game variants: the three emote sources sharing one engine.

use std::fmt;

/// One of the three emote-source game modes.
///
/// All variants share the engine, the channel gate and the channel-wide
/// cooldown clock; each has its own attempt/winner tables and catalog
/// sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    /// Native Twitch emotes from the bot's emote sets (`!slots`).
    Twitch,
    /// FrankerFaceZ global + channel emotes (`!ffzslots`).
    Ffz,
    /// BetterTTV global + channel emotes (`!bttvslots`).
    Bttv,
}

impl Variant {
    /// All variants, in engine order.
    pub const ALL: [Variant; 3] = [Variant::Twitch, Variant::Ffz, Variant::Bttv];

    /// Attempts table for this variant.
    pub fn attempts_table(self) -> &'static str {
        match self {
            Self::Twitch => "slot_attempts",
            Self::Ffz => "ffz_slot_attempts",
            Self::Bttv => "bttv_slot_attempts",
        }
    }

    /// Winners table for this variant.
    pub fn winners_table(self) -> &'static str {
        match self {
            Self::Twitch => "slot_winners",
            Self::Ffz => "ffz_slot_winners",
            Self::Bttv => "bttv_slot_winners",
        }
    }

    /// The chat command this variant answers to.
    pub fn command(self) -> &'static str {
        match self {
            Self::Twitch => "!slots",
            Self::Ffz => "!ffzslots",
            Self::Bttv => "!bttvslots",
        }
    }

    /// Path segment used in the winners-listing URL.
    pub fn winners_slug(self) -> &'static str {
        match self {
            Self::Twitch => "twitch-slots",
            Self::Ffz => "ffz-slots",
            Self::Bttv => "bttv-slots",
        }
    }

    /// Whether this variant records the extra Twitch category flags.
    pub fn has_categories(self) -> bool {
        matches!(self, Self::Twitch)
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Twitch => "twitch",
            Self::Ffz => "ffz",
            Self::Bttv => "bttv",
        };
        write!(f, "{}", name)
    }
}
