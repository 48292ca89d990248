//! CLI interface for BookWorm
//!
//! This module provides the command-line interface using clap's derive API.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// BookWorm conversational relay
///
/// Relays chat messages to an LLM completion API, keeping a short
/// per-user conversation history.
#[derive(Parser, Debug)]
#[command(name = "bookworm")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log: Option<String>,

    /// Specify alternate configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP messaging endpoint
    Serve {
        /// Port to listen on, overriding config and PORT
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Chat with the bot on the console
    Chat {
        /// User id the conversation is stored under
        #[arg(short, long, default_value = "console-user")]
        user: String,
    },

    /// Run configuration diagnostics
    Doctor,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from(["bookworm", "doctor"]);
        assert!(matches!(cli.command, Command::Doctor));
        assert!(!cli.json);
        assert!(cli.log.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::parse_from([
            "bookworm",
            "--json",
            "--log",
            "debug",
            "--config",
            "/tmp/bookworm.toml",
            "doctor",
        ]);
        assert!(cli.json);
        assert_eq!(cli.log, Some("debug".to_string()));
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/bookworm.toml")));
    }

    #[test]
    fn test_serve_command() {
        let cli = Cli::parse_from(["bookworm", "serve"]);
        assert!(matches!(cli.command, Command::Serve { port: None }));

        let cli = Cli::parse_from(["bookworm", "serve", "--port", "8080"]);
        if let Command::Serve { port } = cli.command {
            assert_eq!(port, Some(8080));
        } else {
            panic!("Expected Serve command");
        }
    }

    #[test]
    fn test_chat_command() {
        let cli = Cli::parse_from(["bookworm", "chat"]);
        if let Command::Chat { user } = cli.command {
            assert_eq!(user, "console-user");
        } else {
            panic!("Expected Chat command");
        }

        let cli = Cli::parse_from(["bookworm", "chat", "--user", "alice"]);
        if let Command::Chat { user } = cli.command {
            assert_eq!(user, "alice");
        } else {
            panic!("Expected Chat command");
        }
    }

    #[test]
    fn test_global_flag_after_subcommand() {
        let cli = Cli::parse_from(["bookworm", "serve", "--log", "trace"]);
        assert_eq!(cli.log, Some("trace".to_string()));
    }
}
