//! Process-wide `tracing` integration
//!
//! [`init_tracing`] installs the global subscriber used for diagnostics, and
//! [`TracingSink`] lets a [`Logger`](crate::Logger) forward its records into
//! that subscriber instead of writing lines itself.

use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::sink::{write_text_fields, Record, Sink};

/// Target attached to events forwarded by [`TracingSink`].
pub const TARGET: &str = "sentinel";

/// Initialize the global `tracing` subscriber.
///
/// `RUST_LOG` wins over `level` when set. Output goes to stderr, as JSON when
/// `json` is true. Calling this more than once is a no-op.
pub fn init_tracing(level: &str, json: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    let json_layer = json.then(|| {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_ansi(false)
    });
    let console_layer = (!json).then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_ansi(true)
    });

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(console_layer)
        .try_init();
}

/// Sink that re-emits records as `tracing` events.
///
/// Field keys are dynamic, so they travel as a single `fields` value in
/// `key=value` form.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl Sink for TracingSink {
    fn enabled(&self, level: Level) -> bool {
        match level {
            Level::ERROR => tracing::enabled!(target: TARGET, Level::ERROR),
            Level::WARN => tracing::enabled!(target: TARGET, Level::WARN),
            Level::INFO => tracing::enabled!(target: TARGET, Level::INFO),
            Level::DEBUG => tracing::enabled!(target: TARGET, Level::DEBUG),
            _ => tracing::enabled!(target: TARGET, Level::TRACE),
        }
    }

    fn emit(&self, record: &Record<'_>) {
        let mut fields = String::new();
        write_text_fields(&mut fields, record.fields);
        let message = record.message;
        match record.level {
            Level::ERROR => tracing::error!(target: TARGET, fields = %fields, "{message}"),
            Level::WARN => tracing::warn!(target: TARGET, fields = %fields, "{message}"),
            Level::INFO => tracing::info!(target: TARGET, fields = %fields, "{message}"),
            Level::DEBUG => tracing::debug!(target: TARGET, fields = %fields, "{message}"),
            _ => tracing::trace!(target: TARGET, fields = %fields, "{message}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tracing_subscriber::Layer;

    use super::*;
    use crate::kv;
    use crate::sink::tests::Capture;
    use crate::Logger;

    fn with_capture<F: FnOnce()>(capture: &Capture, level: Level, f: F) {
        let subscriber = tracing_subscriber::registry().with(
            fmt::layer()
                .with_writer(capture.clone())
                .with_ansi(false)
                .without_time()
                .with_filter(tracing_subscriber::filter::LevelFilter::from_level(level)),
        );
        tracing::subscriber::with_default(subscriber, f);
    }

    #[test]
    fn forwards_records_to_dispatcher() {
        let out = Capture::default();
        with_capture(&out, Level::INFO, || {
            let log = Logger::from_sink(Arc::new(TracingSink), "svc");
            log.with(&kv!["env", "prod"]).info("hello", &kv!["n", 1]);
            log.debug("hidden", &[]);
        });
        let lines = out.lines();
        assert_eq!(lines.len(), 1, "{lines:?}");
        assert!(lines[0].contains("hello"));
        assert!(lines[0].contains("env=prod n=1 service=svc"));
    }

    #[test]
    fn reports_enabled_levels_from_subscriber() {
        let out = Capture::default();
        with_capture(&out, Level::WARN, || {
            assert!(TracingSink.enabled(Level::ERROR));
            assert!(TracingSink.enabled(Level::WARN));
            assert!(!TracingSink.enabled(Level::INFO));
        });
    }

    #[test]
    fn init_twice_is_harmless() {
        init_tracing("warn", false);
        init_tracing("debug", true);
    }
}
