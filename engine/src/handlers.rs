//! Command handlers for CLI operations
//!
//! - serve: run the HTTP endpoint
//! - chat: talk to the bot on the console
//! - doctor: validate configuration and credentials

use anyhow::{Context, Result};
use async_trait::async_trait;
use sdk::{Activity, ActivityType, BookwormErrorExt, ChannelAccount, EngineError};
use serde_json::json;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use uuid::Uuid;

use crate::bot::adapter::BotAdapter;
use crate::bot::{ConversationBot, TurnContext};
use crate::config::Config;
use crate::conversation::ConversationStore;
use crate::llm::openai::OpenAIProvider;
use crate::llm::CompletionProvider;
use crate::secrets::{self, OPENAI_API_KEY_VAR};
use crate::server;

/// Id the bot uses for itself outside of channel adapters
pub const CONSOLE_BOT_ID: &str = "bookworm";

/// Channel id stamped on console activities
pub const CONSOLE_CHANNEL: &str = "console";

/// Output format for command results
#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for machine consumption
    Json,
}

/// Build the OpenAI provider with the key from the environment
pub fn build_provider(config: &Config) -> Arc<dyn CompletionProvider> {
    let api_key = secrets::from_env(OPENAI_API_KEY_VAR);
    if api_key.is_none() {
        tracing::warn!(
            "{} is not set; every message will be answered with the apology",
            OPENAI_API_KEY_VAR
        );
    }
    Arc::new(OpenAIProvider::new(config.llm.openai.clone(), api_key))
}

/// Wire a fresh store and `provider` into a bot adapter
pub fn build_adapter(config: &Config, provider: Arc<dyn CompletionProvider>) -> BotAdapter {
    let store = Arc::new(ConversationStore::new(
        config.conversation.persona.as_str(),
    ));
    let bot = ConversationBot::from_config(config, store, provider);
    BotAdapter::new(Arc::new(bot))
}

/// Run the HTTP messaging endpoint until shutdown
pub async fn handle_serve(config: &Config, port: Option<u16>) -> Result<()> {
    let mut server_config = config.server.clone();
    if let Some(port) = port {
        server_config.port = port;
    }
    let addr = server_config.socket_addr()?;

    let adapter = build_adapter(config, build_provider(config));

    server::serve(addr, adapter.clone())
        .await
        .context("HTTP server failed")?;

    tracing::info!(
        "Served {} conversation(s) this run",
        adapter.bot().store().user_count().await
    );
    Ok(())
}

/// Chat with the bot on stdin/stdout
///
/// The session opens with the welcome, as if `user_id` had just joined.
/// Type `exit` or `quit` (or close stdin) to leave.
pub async fn handle_chat(config: &Config, user_id: &str) -> Result<()> {
    let adapter = build_adapter(config, build_provider(config));

    let joined = Activity::members_added(CONSOLE_BOT_ID, vec![ChannelAccount::new(user_id)])
        .with_conversation(user_id)
        .with_channel(CONSOLE_CHANNEL);
    run_console_turn(&adapter, joined).await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "exit" || line == "quit" {
            break;
        }

        let activity = Activity::incoming_message(user_id, CONSOLE_BOT_ID, line)
            .with_conversation(user_id)
            .with_channel(CONSOLE_CHANNEL);
        run_console_turn(&adapter, activity).await;
    }

    Ok(())
}

async fn run_console_turn(adapter: &BotAdapter, mut activity: Activity) {
    activity.id = Some(Uuid::new_v4().to_string());
    let mut ctx = ConsoleTurnContext::new(activity, std::io::stdout());
    adapter.process(&mut ctx).await;
}

/// Turn context that prints message replies to a writer
pub struct ConsoleTurnContext<W> {
    activity: Activity,
    out: W,
}

impl<W: Write + Send> ConsoleTurnContext<W> {
    pub fn new(activity: Activity, out: W) -> Self {
        Self { activity, out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

#[async_trait]
impl<W: Write + Send> TurnContext for ConsoleTurnContext<W> {
    fn activity(&self) -> &Activity {
        &self.activity
    }

    async fn send_activity(&mut self, activity: Activity) -> Result<(), EngineError> {
        if activity.activity_type != ActivityType::Message {
            return Ok(());
        }
        writeln!(self.out, "BookWorm: {}", activity.text_or_empty())?;
        self.out.flush()?;
        Ok(())
    }
}

/// Message printed when the process cannot start
///
/// Errors that are not recoverable need a config fix before the next start.
pub fn startup_hint(err: &EngineError) -> String {
    if err.is_recoverable() {
        err.user_hint().to_string()
    } else {
        format!("{}, then restart bookworm", err.user_hint())
    }
}

/// Run diagnostics
///
/// Checks configuration, credentials and adapter settings without contacting
/// any remote service.
pub async fn handle_doctor(
    config: &Config,
    config_path: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    let mut issues = Vec::new();
    let mut checks: Vec<(&str, String)> = Vec::new();

    let path = match config_path {
        Some(path) => path.display().to_string(),
        None => Config::default_config_path()?.display().to_string(),
    };
    checks.push((
        "Build",
        format!("{} ({})", env!("CARGO_PKG_VERSION"), env!("GIT_COMMIT_HASH")),
    ));
    checks.push(("Config file", path));

    match config.validate() {
        Ok(()) => checks.push(("Configuration", "Valid".to_string())),
        Err(e) => {
            checks.push(("Configuration", "Invalid".to_string()));
            issues.push(e.to_string());
        }
    }

    match config.server.socket_addr() {
        Ok(addr) => checks.push(("Listen address", addr.to_string())),
        Err(e) => {
            checks.push(("Listen address", "Invalid".to_string()));
            issues.push(e.to_string());
        }
    }

    checks.push(("Model", config.llm.openai.model.clone()));
    checks.push(("Base URL", config.llm.openai.base_url.clone()));
    checks.push(("Max turns", config.conversation.max_turns.to_string()));

    let provider = OpenAIProvider::new(
        config.llm.openai.clone(),
        secrets::from_env(OPENAI_API_KEY_VAR),
    );
    if provider.check_health().await {
        checks.push(("OpenAI API key", "Configured".to_string()));
    } else {
        checks.push(("OpenAI API key", "Not configured".to_string()));
        issues.push(format!(
            "{} is not set. Every message will get the apology.",
            OPENAI_API_KEY_VAR
        ));
    }

    match format {
        OutputFormat::Text => {
            println!("BookWorm Diagnostics");
            println!("====================");
            println!();

            for (check, status) in &checks {
                println!("  {:<25} {}", format!("{}:", check), status);
            }

            println!();

            if issues.is_empty() {
                println!("✓ All checks passed!");
            } else {
                println!("⚠ Issues found:");
                println!();
                for (i, issue) in issues.iter().enumerate() {
                    println!("  {}. {}", i + 1, issue);
                }
            }
        }
        OutputFormat::Json => {
            let output = json!({
                "checks": checks.iter().map(|(name, status)| {
                    json!({
                        "name": name,
                        "status": status
                    })
                }).collect::<Vec<_>>(),
                "issues": issues,
                "healthy": issues.is_empty()
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_console_context_prints_messages_only() {
        let activity = Activity::incoming_message("u", CONSOLE_BOT_ID, "Hello");
        let mut ctx = ConsoleTurnContext::new(activity, Vec::new());

        ctx.send_activity(Activity::text("Hi there!")).await.unwrap();
        ctx.send_activity(Activity::trace(
            "OnTurnError Trace",
            serde_json::Value::Null,
            "type",
            "TurnError",
        ))
        .await
        .unwrap();

        let output = String::from_utf8(ctx.into_inner()).unwrap();
        assert_eq!(output, "BookWorm: Hi there!\n");
    }

    #[test]
    fn test_startup_hint_asks_for_restart_on_config_errors() {
        let err = EngineError::Config("max_turns must be at least 1".to_string());
        assert_eq!(
            startup_hint(&err),
            "Check your config.toml file for errors, then restart bookworm"
        );

        let io = EngineError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ));
        assert_eq!(startup_hint(&io), "File system operation failed");
    }

    #[test]
    fn test_build_adapter_uses_config() {
        struct Never;

        #[async_trait]
        impl CompletionProvider for Never {
            fn name(&self) -> &str {
                "never"
            }
            fn model(&self) -> &str {
                "none"
            }
            async fn complete(&self, _: &[crate::llm::Message]) -> crate::llm::Result<String> {
                Err(crate::llm::CompletionError::ProviderUnavailable(
                    "never".to_string(),
                ))
            }
        }

        let mut config = Config::default();
        config.conversation.max_turns = 4;
        config.bot.welcome_text = "hi".to_string();

        let adapter = build_adapter(&config, Arc::new(Never));
        assert_eq!(adapter.bot().max_turns(), 4);
        assert_eq!(adapter.bot().welcome_text(), "hi");
    }
}
