//! Consumed chat capabilities.
//!
//! The engine never owns a transport; the hosting bot supplies delivery
//! and the moderation side-channel through these traits. Whispers and
//! announcements are fire-and-forget: a full queue or closed connection
//! is the host's problem, not grounds to fail an attempt.

use async_trait::async_trait;

/// Message delivery into chat.
///
/// `announce` calls from one attempt must reach the channel in call
/// order; `whisper` is private delivery to a single user.
pub trait ChatSink: Send + Sync {
    /// Private, fire-and-forget notice to one user.
    fn whisper(&self, user: &str, message: &str);

    /// Public, fire-and-forget message to a channel.
    fn announce(&self, channel: &str, message: &str);
}

/// Append-only external record of punitive timeout actions.
#[async_trait]
pub trait ModerationLog: Send + Sync {
    /// Record one timeout action.
    ///
    /// `source_message` is the chat message that triggered the attempt
    /// and `result_message` the public result line it produced.
    #[allow(clippy::too_many_arguments)]
    async fn record_timeout(
        &self,
        channel: &str,
        user: &str,
        reason: Option<&str>,
        module: &str,
        duration_seconds: u32,
        source_message: &str,
        result_message: &str,
    ) -> Result<(), String>;
}

/// Moderator-equivalent privilege of the invoking identity.
///
/// Carried on the attempt context; the engine only consults it for the
/// jackpot timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Privileges {
    pub chat_moderator: bool,
}
