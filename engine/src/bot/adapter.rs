//! Bot adapter
//!
//! Runs the bot for one turn and catches anything that escapes it. A
//! failed turn is logged, a trace is sent to developer tooling (emulator
//! channel only), and the user gets a generic notice. The failure never
//! outlives the turn.

use super::{ConversationBot, TurnContext};
use crate::secrets::scrub;
use async_trait::async_trait;
use sdk::activity::ERROR_TRACE_VALUE_TYPE;
use sdk::{Activity, EngineError};
use std::sync::Arc;
use tracing::{error, warn};

/// First notice sent after an unhandled turn error
pub const TURN_ERROR_TEXT: &str = "The bot encountered an error or bug.";

/// Second notice sent after an unhandled turn error
pub const TURN_ERROR_HINT_TEXT: &str = "To continue to run this bot, please fix the bot source code.";

/// Channel id used by the Bot Framework Emulator
pub const EMULATOR_CHANNEL: &str = "emulator";

/// Runs turns against a shared bot
#[derive(Debug, Clone)]
pub struct BotAdapter {
    bot: Arc<ConversationBot>,
}

impl BotAdapter {
    pub fn new(bot: Arc<ConversationBot>) -> Self {
        Self { bot }
    }

    pub fn bot(&self) -> &Arc<ConversationBot> {
        &self.bot
    }

    /// Process one inbound activity. Errors are handled here.
    pub async fn process(&self, ctx: &mut dyn TurnContext) {
        if let Err(err) = self.bot.run(ctx).await {
            self.on_turn_error(ctx, &err).await;
        }
    }

    async fn on_turn_error(&self, ctx: &mut dyn TurnContext, err: &EngineError) {
        let message = scrub(&err.to_string());
        error!("[on_turn_error] unhandled error: {}", message);

        if ctx.activity().channel_id.as_deref() == Some(EMULATOR_CHANNEL) {
            let trace = Activity::trace(
                "OnTurnError Trace",
                serde_json::Value::String(message.clone()),
                ERROR_TRACE_VALUE_TYPE,
                "TurnError",
            );
            if let Err(e) = ctx.send_activity(trace).await {
                warn!("Failed to send turn error trace: {}", e);
            }
        }

        for notice in [TURN_ERROR_TEXT, TURN_ERROR_HINT_TEXT] {
            if let Err(e) = ctx.send_activity(Activity::text(notice)).await {
                warn!("Failed to send turn error notice: {}", e);
            }
        }
    }
}

/// Turn context that keeps replies in memory
///
/// Used for `expectReplies` delivery, for callers without a connector
/// endpoint, and in tests.
#[derive(Debug, Clone)]
pub struct BufferedTurnContext {
    activity: Activity,
    replies: Vec<Activity>,
}

impl BufferedTurnContext {
    pub fn new(activity: Activity) -> Self {
        Self {
            activity,
            replies: Vec::new(),
        }
    }

    /// Replies sent during the turn, addressed back to the sender
    pub fn into_replies(self) -> Vec<Activity> {
        self.replies
    }
}

#[async_trait]
impl TurnContext for BufferedTurnContext {
    fn activity(&self) -> &Activity {
        &self.activity
    }

    async fn send_activity(&mut self, activity: Activity) -> Result<(), EngineError> {
        self.replies.push(activity.reply_to(&self.activity));
        Ok(())
    }
}
