//! The attempt-processing engine.
//!
//! One `play` call is one user-initiated attempt: acquire the channel
//! gate, check cooldowns against persisted history, build the pool,
//! re-classify the user, draw, announce, persist, and fire the jackpot
//! side effect. The gate guard lives for the whole call, so every exit
//! path, including errors, releases the channel.
//!
//! Pool generation runs before the classifier's flag upsert: a catalog
//! outage must leave no trace, and the cooldown checks before it are
//! read-only.

use crate::chat::{ChatSink, ModerationLog, Privileges};
use crate::classify::{self, Transition};
use crate::config::SlotsConfig;
use crate::cooldown::{self, CooldownVerdict};
use crate::db::Database;
use crate::error::SlotsError;
use crate::gate::ChannelGates;
use crate::outcome::{self, Draw, Outcome};
use crate::pool::EmoteCatalog;
use crate::variant::Variant;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Reason string written to the moderation log for jackpot timeouts.
const TIMEOUT_MODULE: &str = "slots";

/// One incoming attempt, as supplied by the command dispatcher.
#[derive(Debug, Clone)]
pub struct Attempt<'a> {
    pub channel: &'a str,
    pub user: &'a str,
    pub now: DateTime<Utc>,
    pub privileges: Privileges,
    /// The raw chat message that triggered the attempt (kept for the
    /// moderation log).
    pub message: &'a str,
}

/// Everything a completed attempt produced.
#[derive(Debug, Clone)]
pub struct PlayResult {
    pub draw: Draw,
    pub outcome: Outcome,
    pub transition: Transition,
}

/// The slots engine: shared gates plus the collaborators every attempt
/// needs. One instance serves all channels and all three variants.
pub struct SlotsEngine {
    db: Database,
    catalog: Arc<dyn EmoteCatalog>,
    chat: Arc<dyn ChatSink>,
    moderation: Arc<dyn ModerationLog>,
    gates: ChannelGates,
    config: SlotsConfig,
}

impl SlotsEngine {
    pub fn new(
        db: Database,
        catalog: Arc<dyn EmoteCatalog>,
        chat: Arc<dyn ChatSink>,
        moderation: Arc<dyn ModerationLog>,
        config: SlotsConfig,
    ) -> Self {
        Self {
            db,
            catalog,
            chat,
            moderation,
            gates: ChannelGates::new(),
            config,
        }
    }

    pub fn config(&self) -> &SlotsConfig {
        &self.config
    }

    /// Winners-listing URL for a channel/variant (used by the
    /// `!slotwinners` family of commands).
    pub fn winners_url(&self, variant: Variant, channel: &str) -> String {
        format!(
            "{}/{}/{}",
            self.config.winners_url_base.trim_end_matches('/'),
            channel,
            variant.winners_slug()
        )
    }

    /// Process one attempt end to end.
    ///
    /// Rejections (`GateBusy`, `CooldownActive`, `PoolUnavailable`)
    /// leave no persisted trace; any whisper owed to the user has
    /// already been sent when the error returns. Rejections are logged
    /// at debug at their decision site, real failures at warn here.
    pub async fn play(
        &self,
        variant: Variant,
        attempt: &Attempt<'_>,
    ) -> Result<PlayResult, SlotsError> {
        let result = self.play_attempt(variant, attempt).await;
        if let Err(e) = &result
            && !e.is_rejection()
        {
            warn!(
                channel = %attempt.channel,
                user = %attempt.user,
                %variant,
                code = e.error_code(),
                error = %e,
                "attempt failed"
            );
        }
        result
    }

    async fn play_attempt(
        &self,
        variant: Variant,
        attempt: &Attempt<'_>,
    ) -> Result<PlayResult, SlotsError> {
        let channel = attempt.channel;
        let user = attempt.user;
        let now = attempt.now;

        let Some(_guard) = self.gates.try_acquire(channel) else {
            debug!(channel = %channel, user = %user, %variant, "gate busy");
            self.chat.whisper(
                user,
                &cooldown::channel_notice(self.config.cooldowns.channel_seconds as f64),
            );
            return Err(SlotsError::GateBusy);
        };

        let attempts = self.db.attempts();
        let bots = self.db.bots();

        let flagged = bots
            .is_flagged(channel, user, now - self.config.classifier.unbot())
            .await?;
        let user_last = attempts.last_user_attempt(variant, channel, user).await?;
        let channel_last = attempts.last_channel_attempt(channel).await?;

        match cooldown::evaluate(&self.config.cooldowns, now, channel_last, user_last, flagged) {
            CooldownVerdict::Ready => {}
            CooldownVerdict::ChannelActive { remaining_seconds } => {
                debug!(channel = %channel, user = %user, remaining_seconds, "channel cooldown");
                self.chat
                    .whisper(user, &cooldown::channel_notice(remaining_seconds));
                return Err(SlotsError::CooldownActive);
            }
            CooldownVerdict::UserActive {
                remaining_seconds,
                notify,
            } => {
                debug!(channel = %channel, user = %user, remaining_seconds, notify, "user cooldown");
                if notify {
                    self.chat
                        .whisper(user, &cooldown::user_notice(remaining_seconds));
                }
                return Err(SlotsError::CooldownActive);
            }
        }

        let pool = crate::pool::build(self.catalog.as_ref(), &self.config.pool, variant, channel)
            .await
            .inspect_err(|_| {
                debug!(channel = %channel, user = %user, %variant, "emote pool unavailable");
            })?;

        let history = attempts
            .attempts_since(variant, channel, user, now - self.config.classifier.log_window())
            .await?;
        let transition = classify::evaluate(
            &self.config.classifier,
            now,
            user_last,
            flagged,
            &history,
        );
        if transition == Transition::Flagged {
            info!(channel = %channel, user = %user, %variant, "user flagged as bot");
            bots.mark(channel, user, now).await?;
        }

        // `build` never returns an empty pool, so sampling cannot fail;
        // the fallback keeps the error path total.
        let draw = {
            let mut rng = rand::thread_rng();
            Draw::sample(&pool, &mut rng)
        }
        .ok_or(SlotsError::PoolUnavailable)?;

        let emote_sets = match variant {
            Variant::Twitch => self.catalog.emote_sets().await,
            Variant::Ffz | Variant::Bttv => None,
        };
        let outcome = outcome::evaluate(variant, &draw, emote_sets.as_ref());

        let result_line = outcome::result_line(user, &draw);
        self.chat.announce(channel, &result_line);
        if outcome.all_matching {
            info!(
                channel = %channel,
                user = %user,
                %variant,
                emote = %draw.names[0],
                "slots won"
            );
            self.chat
                .announce(channel, &outcome::win_line(user, variant));
        }

        attempts
            .record(variant, channel, user, now, &draw, &outcome)
            .await?;

        if self.is_jackpot(variant, &draw, &outcome) && attempt.privileges.chat_moderator {
            self.punish_jackpot(attempt, &result_line).await;
        }

        self.announce_transition(channel, user, transition);

        Ok(PlayResult {
            draw,
            outcome,
            transition,
        })
    }

    fn is_jackpot(&self, variant: Variant, draw: &Draw, outcome: &Outcome) -> bool {
        variant == Variant::Twitch
            && outcome.all_matching
            && draw.ids[0] == self.config.pool.jackpot_emote_id
    }

    /// The pinned-emote jackpot: a short public timeout, a thank-you,
    /// and an append to the external moderation log. Runs strictly
    /// after the attempt has committed; a log failure is reported but
    /// never unwinds the attempt.
    async fn punish_jackpot(&self, attempt: &Attempt<'_>, result_line: &str) {
        let duration = self.config.pool.jackpot_timeout_seconds;
        self.chat.announce(
            attempt.channel,
            &format!(".timeout {} {}", attempt.user, duration),
        );
        self.chat
            .announce(attempt.channel, "Thanks for winning the Kappa!");

        if let Err(e) = self
            .moderation
            .record_timeout(
                attempt.channel,
                attempt.user,
                None,
                TIMEOUT_MODULE,
                duration,
                attempt.message,
                result_line,
            )
            .await
        {
            let err = SlotsError::ModerationLog(e);
            warn!(
                channel = %attempt.channel,
                user = %attempt.user,
                code = err.error_code(),
                error = %err,
                "moderation log append failed"
            );
        }
    }

    fn announce_transition(&self, channel: &str, user: &str, transition: Transition) {
        match transition {
            Transition::Flagged => {
                self.chat.announce(
                    channel,
                    &format!(
                        "{} is now considered as a bot. His cooldown is increased to {} minutes.",
                        user,
                        cooldown::window_minutes(self.config.cooldowns.bot_seconds)
                    ),
                );
            }
            Transition::Unflagged => {
                self.chat.announce(
                    channel,
                    &format!(
                        "{} is now considered not as a bot. His cooldown is back to {} minutes.",
                        user,
                        cooldown::window_minutes(self.config.cooldowns.attempt_seconds)
                    ),
                );
            }
            Transition::NoChange => {}
        }
    }
}
