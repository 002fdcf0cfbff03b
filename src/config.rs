use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::level_filters::LevelFilter;

use crate::{Error, Result};

/// Declarative logging configuration in the `dictConfig` layout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogConfiguration {
    /// Schema version, only `1` is supported
    pub version: u32,
    /// Disable already-created loggers that this document does not mention
    #[serde(default = "default_disable_existing_loggers")]
    pub disable_existing_loggers: bool,
    /// Named formatters
    #[serde(default)]
    pub formatters: BTreeMap<String, FormatterConfig>,
    /// Named output sinks
    #[serde(default)]
    pub handlers: BTreeMap<String, HandlerConfig>,
    /// Logger bindings keyed by dotted logger name
    #[serde(default)]
    pub loggers: BTreeMap<String, LoggerConfig>,
    /// Root logger binding
    #[serde(default)]
    pub root: Option<LoggerConfig>,
}

impl LogConfiguration {
    /// Deserialize and validate a parsed document tree.
    pub fn from_value(value: Value) -> Result<Self> {
        let config: LogConfiguration =
            serde_json::from_value(value).map_err(|e| Error::ConfigInvalid(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross references, levels and handler classes.
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(Error::ConfigInvalid(format!(
                "unsupported version: {}",
                self.version
            )));
        }

        for (name, handler) in &self.handlers {
            handler
                .kind()
                .map_err(|e| {
                    Error::ConfigInvalid(format!("Unable to configure handler '{}': {}", name, e))
                })?;
            if let Some(level) = &handler.level {
                parse_level(level)
                    .map_err(|e| Error::ConfigInvalid(format!("handler '{}': {}", name, e)))?;
            }
            if let Some(formatter) = &handler.formatter
                && !self.formatters.contains_key(formatter)
            {
                return Err(Error::ConfigInvalid(format!(
                    "handler '{}' references unknown formatter '{}'",
                    name, formatter
                )));
            }
        }

        let bindings = self
            .loggers
            .iter()
            .map(|(name, logger)| (name.as_str(), logger))
            .chain(self.root.iter().map(|root| ("root", root)));
        for (name, logger) in bindings {
            if let Some(level) = &logger.level {
                parse_level(level)
                    .map_err(|e| Error::ConfigInvalid(format!("logger '{}': {}", name, e)))?;
            }
            for handler in &logger.handlers {
                if !self.handlers.contains_key(handler) {
                    return Err(Error::ConfigInvalid(format!(
                        "logger '{}' references unknown handler '{}'",
                        name, handler
                    )));
                }
            }
        }

        Ok(())
    }
}

fn default_disable_existing_loggers() -> bool {
    true
}

/// Message layout for one or more handlers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FormatterConfig {
    /// Pattern with `%(key)s` placeholders
    #[serde(default = "default_format")]
    pub format: String,
    /// strftime pattern for `%(asctime)s`
    #[serde(default)]
    pub datefmt: Option<String>,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
            datefmt: None,
        }
    }
}

pub(crate) fn default_format() -> String {
    "%(message)s".to_string()
}

/// One output sink.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HandlerConfig {
    /// Handler type, e.g. `logging.FileHandler`
    pub class: String,
    /// Minimum level this handler accepts
    #[serde(default)]
    pub level: Option<String>,
    /// Name of a formatter in the same document
    #[serde(default)]
    pub formatter: Option<String>,
    /// Output file, for file handlers
    #[serde(default)]
    pub filename: Option<PathBuf>,
    /// `a` to append, `w` to truncate
    #[serde(default = "default_mode")]
    pub mode: String,
    /// `ext://sys.stdout` or `ext://sys.stderr`, for stream handlers
    #[serde(default)]
    pub stream: Option<String>,
}

fn default_mode() -> String {
    "a".to_string()
}

/// Stream a console handler writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamTarget {
    Stdout,
    Stderr,
}

/// Resolved handler class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerKind {
    Stream(StreamTarget),
    File { path: PathBuf, truncate: bool },
    Null,
}

impl HandlerConfig {
    /// Resolve the handler class and its class-specific fields.
    ///
    /// `filename` is rejected on any class that does not write to a file.
    pub fn kind(&self) -> std::result::Result<HandlerKind, String> {
        let kind = self.resolve_kind()?;
        if self.filename.is_some() && !matches!(kind, HandlerKind::File { .. }) {
            return Err(format!(
                "'filename' is not supported by handler class '{}'",
                self.class
            ));
        }
        Ok(kind)
    }

    fn resolve_kind(&self) -> std::result::Result<HandlerKind, String> {
        match self.class.as_str() {
            "logging.StreamHandler" | "stream" | "console" => {
                let target = match self.stream.as_deref() {
                    None | Some("ext://sys.stderr") | Some("stderr") => StreamTarget::Stderr,
                    Some("ext://sys.stdout") | Some("stdout") => StreamTarget::Stdout,
                    Some(other) => return Err(format!("unknown stream '{}'", other)),
                };
                Ok(HandlerKind::Stream(target))
            }
            "logging.FileHandler" | "file" => {
                let path = self
                    .filename
                    .clone()
                    .ok_or_else(|| "file handler requires 'filename'".to_string())?;
                let truncate = match self.mode.as_str() {
                    "a" => false,
                    "w" => true,
                    other => return Err(format!("unsupported file mode '{}'", other)),
                };
                Ok(HandlerKind::File { path, truncate })
            }
            "logging.NullHandler" | "null" => Ok(HandlerKind::Null),
            other => Err(format!("unknown handler class '{}'", other)),
        }
    }
}

/// Level and handler bindings of one logger.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LoggerConfig {
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub handlers: Vec<String>,
    /// Also pass records to ancestor loggers' handlers
    #[serde(default = "default_propagate")]
    pub propagate: bool,
}

fn default_propagate() -> bool {
    true
}

/// Whether `level` is `NOTSET`, meaning a logger inherits its level.
pub fn is_notset(level: &str) -> bool {
    level.trim().eq_ignore_ascii_case("NOTSET")
}

/// Parse a level name.
///
/// `CRITICAL` collapses onto `ERROR`. `NOTSET` disables filtering; on a
/// non-root logger it defers to the ancestors instead (see [`is_notset`]).
pub fn parse_level(level: &str) -> std::result::Result<LevelFilter, String> {
    match level.trim().to_ascii_uppercase().as_str() {
        "NOTSET" | "TRACE" => Ok(LevelFilter::TRACE),
        "DEBUG" => Ok(LevelFilter::DEBUG),
        "INFO" => Ok(LevelFilter::INFO),
        "WARN" | "WARNING" => Ok(LevelFilter::WARN),
        "ERROR" | "CRITICAL" | "FATAL" => Ok(LevelFilter::ERROR),
        "OFF" => Ok(LevelFilter::OFF),
        _ => Err(format!("unknown level '{}'", level)),
    }
}

/// Serialization used by a configuration document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    #[cfg(feature = "toml")]
    Toml,
    #[cfg(feature = "yaml")]
    Yaml,
}

impl DocumentFormat {
    /// Pick the format from the file extension, defaulting to JSON.
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            #[cfg(feature = "toml")]
            Some("toml") => DocumentFormat::Toml,
            #[cfg(feature = "yaml")]
            Some("yaml") | Some("yml") => DocumentFormat::Yaml,
            _ => DocumentFormat::Json,
        }
    }

    /// Parse text into a document tree.
    pub fn parse(self, text: &str) -> std::result::Result<Value, String> {
        match self {
            DocumentFormat::Json => serde_json::from_str(text).map_err(|e| e.to_string()),
            #[cfg(feature = "toml")]
            DocumentFormat::Toml => toml::from_str(text).map_err(|e| e.to_string()),
            #[cfg(feature = "yaml")]
            DocumentFormat::Yaml => serde_yaml::from_str(text).map_err(|e| e.to_string()),
        }
    }
}
