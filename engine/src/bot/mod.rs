//! Relay bot
//!
//! `ConversationBot` is the per-activity handler that ties the conversation
//! store to the completion gateway. Channel adapters wrap each inbound
//! activity in a [`TurnContext`] and hand it to [`adapter::BotAdapter`],
//! which runs the bot and deals with any error that escapes it.
//!
//! Message activities go through the relay:
//!
//! 1. look up or create the sender's conversation
//! 2. append the user turn and trim to the history cap
//! 3. write the trimmed conversation back to the store
//! 4. ask the provider for a reply (apology on failure)
//! 5. append the assistant turn and save
//! 6. send the reply
//!
//! The user turn is stored before the provider call, so a failed call
//! leaves it in the history with no matching assistant turn.
//!
//! Conversation update activities produce a welcome for every added member
//! other than the bot itself. Everything else is ignored.

pub mod adapter;

use crate::config::Config;
use crate::conversation::{ConversationStore, DEFAULT_MAX_TURNS};
use crate::llm::CompletionProvider;
use crate::secrets::scrub;
use async_trait::async_trait;
use sdk::{Activity, ActivityType, EngineError};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Welcome sent to every member joining a conversation
pub const DEFAULT_WELCOME_TEXT: &str =
    "Hello BooksTimer! I am BookWorm, an Intelligent Conversational Chatbot.\nHow can I help you today?";

/// Reply sent when the completion call fails
pub const DEFAULT_APOLOGY_TEXT: &str = "Sorry, I couldn't process your request at the moment.";

/// Per-activity handle through which the bot replies
#[async_trait]
pub trait TurnContext: Send {
    /// The inbound activity being processed
    fn activity(&self) -> &Activity;

    /// Deliver an outgoing activity to the channel
    async fn send_activity(&mut self, activity: Activity) -> Result<(), EngineError>;
}

/// Relay between chat users and the completion provider
pub struct ConversationBot {
    store: Arc<ConversationStore>,
    provider: Arc<dyn CompletionProvider>,
    max_turns: usize,
    welcome_text: String,
    apology_text: String,
}

impl std::fmt::Debug for ConversationBot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationBot")
            .field("provider", &self.provider.name())
            .field("model", &self.provider.model())
            .field("max_turns", &self.max_turns)
            .finish()
    }
}

impl ConversationBot {
    /// Create a bot with the default history cap and texts
    pub fn new(store: Arc<ConversationStore>, provider: Arc<dyn CompletionProvider>) -> Self {
        Self {
            store,
            provider,
            max_turns: DEFAULT_MAX_TURNS,
            welcome_text: DEFAULT_WELCOME_TEXT.to_string(),
            apology_text: DEFAULT_APOLOGY_TEXT.to_string(),
        }
    }

    /// Create a bot using the conversation and bot sections of `config`
    pub fn from_config(
        config: &Config,
        store: Arc<ConversationStore>,
        provider: Arc<dyn CompletionProvider>,
    ) -> Self {
        Self::new(store, provider)
            .with_max_turns(config.conversation.max_turns)
            .with_welcome_text(config.bot.welcome_text.as_str())
            .with_apology_text(config.bot.apology_text.as_str())
    }

    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = max_turns;
        self
    }

    pub fn with_welcome_text(mut self, text: impl Into<String>) -> Self {
        self.welcome_text = text.into();
        self
    }

    pub fn with_apology_text(mut self, text: impl Into<String>) -> Self {
        self.apology_text = text.into();
        self
    }

    /// Conversation store shared with the caller
    pub fn store(&self) -> &Arc<ConversationStore> {
        &self.store
    }

    pub fn max_turns(&self) -> usize {
        self.max_turns
    }

    pub fn welcome_text(&self) -> &str {
        &self.welcome_text
    }

    /// Dispatch one inbound activity
    pub async fn run(&self, ctx: &mut dyn TurnContext) -> Result<(), EngineError> {
        match ctx.activity().activity_type {
            ActivityType::Message => self.on_message(ctx).await,
            ActivityType::ConversationUpdate => self.on_members_added(ctx).await,
            other => {
                debug!("Ignoring activity of type {:?}", other);
                Ok(())
            }
        }
    }

    async fn on_message(&self, ctx: &mut dyn TurnContext) -> Result<(), EngineError> {
        let activity = ctx.activity();
        let user_id = activity
            .from
            .as_ref()
            .map(|from| from.id.clone())
            .ok_or_else(|| {
                EngineError::InvalidActivity("message activity has no sender".to_string())
            })?;
        let text = activity.text_or_empty().to_string();

        let mut conversation = self.store.get_or_create(&user_id).await;
        conversation.append_user(text);
        conversation.trim(self.max_turns);
        self.store.save(&user_id, conversation.clone()).await;

        debug!(
            user_id = %user_id,
            turns = conversation.len(),
            "Requesting completion"
        );

        let reply_text = match self.provider.complete(conversation.messages()).await {
            Ok(reply_text) => {
                conversation.append_assistant(reply_text.as_str());
                self.store.save(&user_id, conversation).await;
                info!(user_id = %user_id, "Relayed completion");
                reply_text
            }
            Err(e) => {
                error!(
                    user_id = %user_id,
                    "Error while getting response from {}: {}",
                    self.provider.name(),
                    scrub(&e.to_string())
                );
                return self.send_apology(ctx).await;
            }
        };

        let reply = Activity::text_with_speak(reply_text.as_str(), reply_text.as_str());
        if let Err(e) = ctx.send_activity(reply).await {
            warn!(user_id = %user_id, "Failed to deliver reply: {}", e);
            return self.send_apology(ctx).await;
        }

        Ok(())
    }

    async fn send_apology(&self, ctx: &mut dyn TurnContext) -> Result<(), EngineError> {
        ctx.send_activity(Activity::text(self.apology_text.as_str()))
            .await
    }

    async fn on_members_added(&self, ctx: &mut dyn TurnContext) -> Result<(), EngineError> {
        let activity = ctx.activity();
        let bot_id = activity.recipient.as_ref().map(|r| r.id.clone());
        let newcomers: Vec<String> = activity
            .members_added
            .iter()
            .filter(|member| Some(&member.id) != bot_id.as_ref())
            .map(|member| member.id.clone())
            .collect();

        for member_id in newcomers {
            debug!(member_id = %member_id, "Welcoming new member");
            let welcome =
                Activity::text_with_speak(self.welcome_text.as_str(), self.welcome_text.as_str());
            ctx.send_activity(welcome).await?;
        }

        Ok(())
    }
}
