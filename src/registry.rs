//! Process-wide registry of named loggers.
//!
//! Applying a [`LogConfiguration`] compiles every handler once (opening files,
//! compiling formatters) and then wires each [`LoggerHandle`] to its own
//! `tracing::Dispatch`: a registry subscriber carrying one filtered fmt layer
//! per bound handler, behind the logger's effective level.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use once_cell::sync::Lazy;
use tracing::level_filters::LevelFilter;
use tracing::{Dispatch, Level};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{Layer, Registry};

use crate::config::{HandlerKind, LogConfiguration, LoggerConfig, is_notset, parse_level};
use crate::format::PatternFormatter;
use crate::writer::HandlerWriter;
use crate::{Error, Result};

/// Name under which the root logger is registered.
pub const ROOT_LOGGER: &str = "root";

static GLOBAL: Lazy<LoggerRegistry> = Lazy::new(LoggerRegistry::new);

/// A named emitter owned by a [`LoggerRegistry`].
///
/// Clones share the same underlying logger.
#[derive(Clone)]
pub struct LoggerHandle {
    inner: Arc<HandleInner>,
}

struct HandleInner {
    name: String,
    // `None` until a configuration has wired this logger.
    dispatch: RwLock<Option<Dispatch>>,
}

impl LoggerHandle {
    fn new(name: &str, dispatch: Option<Dispatch>) -> Self {
        Self {
            inner: Arc::new(HandleInner {
                name: name.to_string(),
                dispatch: RwLock::new(dispatch),
            }),
        }
    }

    /// Logical logger name.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Whether both handles refer to the same registry entry.
    pub fn ptr_eq(&self, other: &LoggerHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Emit one record at `level`.
    pub fn log(&self, level: Level, message: &str) {
        let dispatch = match self.current_dispatch() {
            Some(dispatch) => dispatch,
            None => return,
        };
        let logger = self.name();
        tracing::dispatcher::with_default(&dispatch, || match level {
            Level::TRACE => tracing::trace!(logger, "{}", message),
            Level::DEBUG => tracing::debug!(logger, "{}", message),
            Level::INFO => tracing::info!(logger, "{}", message),
            Level::WARN => tracing::warn!(logger, "{}", message),
            Level::ERROR => tracing::error!(logger, "{}", message),
        });
    }

    pub fn trace(&self, message: &str) {
        self.log(Level::TRACE, message);
    }

    pub fn debug(&self, message: &str) {
        self.log(Level::DEBUG, message);
    }

    pub fn info(&self, message: &str) {
        self.log(Level::INFO, message);
    }

    pub fn warn(&self, message: &str) {
        self.log(Level::WARN, message);
    }

    pub fn error(&self, message: &str) {
        self.log(Level::ERROR, message);
    }

    fn current_dispatch(&self) -> Option<Dispatch> {
        self.inner
            .dispatch
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_dispatch(&self, dispatch: Dispatch) {
        *self
            .inner
            .dispatch
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(dispatch);
    }

    fn is_wired(&self) -> bool {
        self.inner
            .dispatch
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

impl fmt::Debug for LoggerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggerHandle")
            .field("name", &self.inner.name)
            .field("wired", &self.is_wired())
            .finish()
    }
}

#[derive(Debug, Clone)]
struct CompiledHandler {
    level: LevelFilter,
    formatter: PatternFormatter,
    writer: HandlerWriter,
}

impl CompiledHandler {
    fn layer(&self) -> Box<dyn Layer<Registry> + Send + Sync> {
        tracing_subscriber::fmt::layer()
            .event_format(self.formatter.clone())
            .with_writer(self.writer.clone())
            .with_filter(self.level)
            .boxed()
    }
}

/// A configuration with all handlers opened and formatters compiled.
#[derive(Debug)]
struct CompiledConfiguration {
    config: LogConfiguration,
    handlers: HashMap<String, CompiledHandler>,
}

impl CompiledConfiguration {
    fn compile(config: &LogConfiguration) -> Result<Self> {
        let mut handlers = HashMap::new();
        for (name, handler) in &config.handlers {
            let invalid = |message: String| {
                Error::ConfigInvalid(format!("Unable to configure handler '{}': {}", name, message))
            };

            let kind = handler.kind().map_err(invalid)?;
            let level = match &handler.level {
                Some(level) => parse_level(level).map_err(invalid)?,
                None => LevelFilter::TRACE,
            };
            let formatter = match &handler.formatter {
                Some(formatter) => {
                    let entry = config.formatters.get(formatter).ok_or_else(|| {
                        invalid(format!("unknown formatter '{}'", formatter))
                    })?;
                    PatternFormatter::compile(&entry.format, entry.datefmt.as_deref())
                        .map_err(|e| invalid(format!("formatter '{}': {}", formatter, e)))?
                }
                None => PatternFormatter::compile(&crate::config::default_format(), None)
                    .map_err(invalid)?,
            };
            let writer = HandlerWriter::open(&kind).map_err(|e| match &kind {
                HandlerKind::File { path, .. } => {
                    invalid(format!("cannot open '{}': {}", path.display(), e))
                }
                _ => invalid(e.to_string()),
            })?;

            handlers.insert(
                name.clone(),
                CompiledHandler {
                    level,
                    formatter,
                    writer,
                },
            );
        }

        Ok(Self {
            config: config.clone(),
            handlers,
        })
    }

    /// Named in the document, or a descendant of a named logger.
    fn is_configured(&self, name: &str) -> bool {
        is_root(name)
            || self.config.loggers.contains_key(name)
            || ancestors(name).any(|parent| self.config.loggers.contains_key(parent))
    }

    /// The logger's own binding followed by its configured ancestors'.
    fn chain<'a>(&'a self, name: &str) -> Vec<&'a LoggerConfig> {
        if is_root(name) {
            return Vec::new();
        }
        std::iter::once(name)
            .chain(ancestors(name))
            .filter_map(|logger| self.config.loggers.get(logger))
            .collect()
    }

    /// Nearest explicit level up the chain; `NOTSET` loggers defer to their
    /// ancestors, while a `NOTSET` root lets everything through.
    fn effective_level(&self, name: &str) -> LevelFilter {
        self.chain(name)
            .into_iter()
            .filter_map(|logger| logger.level.as_deref())
            .find(|level| !is_notset(level))
            .or_else(|| self.config.root.as_ref().and_then(|root| root.level.as_deref()))
            .and_then(|level| parse_level(level).ok())
            .unwrap_or(LevelFilter::WARN)
    }

    /// Handlers a record from `name` reaches, de-duplicated by name.
    fn handler_names(&self, name: &str) -> Vec<&str> {
        let mut bindings = Vec::new();
        let mut reaches_root = true;
        for logger in self.chain(name) {
            bindings.push(logger);
            if !logger.propagate {
                reaches_root = false;
                break;
            }
        }
        if reaches_root {
            bindings.extend(self.config.root.iter());
        }

        let mut names: Vec<&str> = Vec::new();
        for handler in bindings.into_iter().flat_map(|logger| logger.handlers.iter()) {
            if self.handlers.contains_key(handler) && !names.contains(&handler.as_str()) {
                names.push(handler.as_str());
            }
        }
        names
    }

    fn dispatch_for(&self, name: &str) -> Dispatch {
        let layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = self
            .handler_names(name)
            .into_iter()
            .filter_map(|handler| self.handlers.get(handler))
            .filter(|handler| !matches!(handler.writer, HandlerWriter::Null))
            .map(CompiledHandler::layer)
            .collect();

        let subscriber = tracing_subscriber::registry()
            .with(layers)
            .with(self.effective_level(name));
        Dispatch::new(subscriber)
    }
}

fn is_root(name: &str) -> bool {
    name.is_empty() || name == ROOT_LOGGER
}

/// Dotted parents of a logger name, nearest first: `a.b.c` yields `a.b`, `a`.
fn ancestors(name: &str) -> impl Iterator<Item = &str> {
    std::iter::successors(name.rsplit_once('.').map(|(parent, _)| parent), |parent| {
        parent.rsplit_once('.').map(|(grandparent, _)| grandparent)
    })
    .filter(|parent| !parent.is_empty())
}

#[derive(Default)]
struct RegistryState {
    handles: HashMap<String, LoggerHandle>,
    active: Option<Arc<CompiledConfiguration>>,
}

/// Registry of named loggers and the configuration they are wired to.
///
/// Configuration changes are serialized; emission through already wired
/// handles does not take the registry lock.
#[derive(Default)]
pub struct LoggerRegistry {
    state: Mutex<RegistryState>,
}

impl LoggerRegistry {
    /// Create an empty, unconfigured registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry shared by the whole process.
    pub fn global() -> &'static LoggerRegistry {
        &GLOBAL
    }

    /// Return the handle registered under `name`, creating it if needed.
    ///
    /// Handles created before any configuration is applied stay silent until
    /// one is.
    pub fn get_or_create(&self, name: &str) -> LoggerHandle {
        let mut state = self.lock();
        if let Some(handle) = state.handles.get(name) {
            return handle.clone();
        }
        let dispatch = state.active.as_ref().map(|active| active.dispatch_for(name));
        let handle = LoggerHandle::new(name, dispatch);
        state.handles.insert(name.to_string(), handle.clone());
        handle
    }

    /// Validate and install a configuration.
    ///
    /// On error the previously applied configuration stays in effect.
    pub fn apply_configuration(&self, config: &LogConfiguration) -> Result<()> {
        config.validate()?;

        let mut state = self.lock();
        let compiled = Arc::new(CompiledConfiguration::compile(config)?);

        for (name, handle) in &state.handles {
            if compiled.is_configured(name) || !handle.is_wired() {
                handle.set_dispatch(compiled.dispatch_for(name));
            } else if config.disable_existing_loggers {
                handle.set_dispatch(Dispatch::none());
            }
        }

        state.active = Some(compiled);
        Ok(())
    }

    /// Whether a configuration has been applied.
    pub fn is_configured(&self) -> bool {
        self.lock().active.is_some()
    }

    /// Names of all registered loggers, sorted.
    pub fn logger_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lock().handles.keys().cloned().collect();
        names.sort();
        names
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for LoggerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggerRegistry")
            .field("loggers", &self.logger_names())
            .field("configured", &self.is_configured())
            .finish()
    }
}
