//! Fallback sink for diagnostics raised while loading a configuration.
//!
//! It never depends on the configuration being loaded: events go through a
//! dedicated `tracing::Dispatch` writing `asctime - LEVEL - message` lines.

use tracing::Dispatch;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::MakeWriter;

use crate::format::PatternFormatter;

/// Filter used when `RUST_LOG` is unset or empty.
pub const DEFAULT_BOOTSTRAP_LEVEL: &str = "warn";

/// Minimal always-available emitter.
#[derive(Clone)]
pub struct Bootstrap {
    dispatch: Dispatch,
}

impl Bootstrap {
    /// Write to stderr, filtered by `RUST_LOG` or [`DEFAULT_BOOTSTRAP_LEVEL`].
    pub fn new() -> Self {
        let env_filter = EnvFilter::try_new(effective_log_spec())
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_BOOTSTRAP_LEVEL));
        let subscriber = tracing_subscriber::fmt()
            .event_format(PatternFormatter::bootstrap())
            .with_writer(std::io::stderr)
            .with_env_filter(env_filter)
            .finish();
        Self {
            dispatch: Dispatch::new(subscriber),
        }
    }

    /// Write to `make_writer`, keeping events at `level` or above.
    pub fn with_writer<W>(make_writer: W, level: LevelFilter) -> Self
    where
        W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
    {
        let subscriber = tracing_subscriber::fmt()
            .event_format(PatternFormatter::bootstrap())
            .with_writer(make_writer)
            .with_max_level(level)
            .finish();
        Self {
            dispatch: Dispatch::new(subscriber),
        }
    }

    /// Run `f` with this emitter as the current dispatcher.
    pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        tracing::dispatcher::with_default(&self.dispatch, f)
    }
}

impl Default for Bootstrap {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Bootstrap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bootstrap").finish_non_exhaustive()
    }
}

/// `RUST_LOG` takes precedence over the built-in level.
fn effective_log_spec() -> String {
    if let Ok(rust_log) = std::env::var("RUST_LOG")
        && !rust_log.is_empty()
    {
        return rust_log;
    }
    DEFAULT_BOOTSTRAP_LEVEL.to_string()
}
