// BookWorm conversational relay
// Main entry point for the bookworm binary

use bookworm_engine::cli::{Cli, Command};
use bookworm_engine::config::Config;
use bookworm_engine::handlers::{
    handle_chat, handle_doctor, handle_serve, startup_hint, OutputFormat,
};
use bookworm_engine::telemetry::init_telemetry_with_level;
use clap::Parser;
use sdk::EngineError;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration (or use custom path if provided)
    let config_path = match &cli.config {
        Some(config_path) => config_path.clone(),
        None => Config::default_config_path().map_err(report)?,
    };
    let loaded = match &cli.config {
        Some(_) => Config::load_from_path(&config_path).map(|config| (config, false)),
        None => Config::load_or_create_at(&config_path),
    };
    let (config, created) = loaded.map_err(report)?;

    // --log beats config, RUST_LOG beats both
    let log_level = cli.log.as_deref().unwrap_or(config.core.log_level.as_str());
    init_telemetry_with_level(log_level);

    if created {
        tracing::info!("Created default configuration at {}", config_path.display());
    }

    let version = env!("CARGO_PKG_VERSION");
    let commit = env!("GIT_COMMIT_HASH");
    let timestamp = env!("BUILD_TIMESTAMP");

    tracing::info!("BookWorm v{} ({} - {})", version, commit, timestamp);

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    match cli.command {
        Command::Serve { port } => {
            tracing::info!("Starting HTTP endpoint...");
            handle_serve(&config, port).await
        }

        Command::Chat { user } => {
            tracing::info!("Starting console chat as {}", user);
            handle_chat(&config, &user).await
        }

        Command::Doctor => {
            tracing::info!("Running diagnostics...");
            handle_doctor(&config, cli.config.as_deref(), format).await
        }
    }
}

/// Print the user-facing hint for a startup error and convert it
fn report(err: EngineError) -> anyhow::Error {
    eprintln!("{}", startup_hint(&err));
    err.into()
}
