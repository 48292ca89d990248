//! Telemetry and Observability
//!
//! Handles setting up `tracing-subscriber` for structured logging.
//! The level comes from config unless `RUST_LOG` is set, and the format is
//! pretty in debug builds and JSON in release builds. Events go to stderr so
//! they never interleave with replies printed by `bookworm chat`.

use tracing::Subscriber;
use tracing_subscriber::{
    fmt::{self, MakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Build the default filter directive for `log_level`.
///
/// Our own crate gets the same level as everything else; the HTTP stack is
/// capped at `info` so request spans stay readable at `debug`.
pub fn default_filter(log_level: &str) -> String {
    format!(
        "{lvl},bookworm_engine={lvl},hyper=info,reqwest=info",
        lvl = log_level
    )
}

/// Assemble the subscriber, writing formatted events to `writer`
pub fn build_subscriber<W>(log_level: &str, writer: W) -> impl Subscriber + Send + Sync + 'static
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(log_level)));

    #[cfg(debug_assertions)]
    let layer = fmt::layer().pretty().with_target(false).with_writer(writer);

    #[cfg(not(debug_assertions))]
    let layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_writer(writer);

    tracing_subscriber::registry().with(env_filter).with(layer)
}

/// Initialize the tracing subscriber with the given log level from config.
///
/// Priority: `RUST_LOG` env var > `log_level` parameter > default "info"
///
/// Only the first call installs a subscriber; later calls are no-ops.
pub fn init_telemetry_with_level(log_level: &str) {
    build_subscriber(log_level, std::io::stderr).try_init().ok();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_default_filter_parses() {
        for level in ["error", "warn", "info", "debug", "trace"] {
            let directive = default_filter(level);
            assert!(directive.starts_with(level));
            assert!(EnvFilter::try_new(&directive).is_ok());
        }
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_events_go_to_the_given_writer() {
        let captured = Captured::default();
        let sink = captured.clone();
        let subscriber = build_subscriber("info", move || sink.clone());

        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!("Relayed completion");
        });

        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("Relayed completion"));
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init_telemetry_with_level("debug");
        init_telemetry_with_level("info");
    }
}
