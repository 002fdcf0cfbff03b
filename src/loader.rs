//! Load a configuration document, patch it and install it.
//!
//! # Example
//!
//! ```rust,no_run
//! use logtoolkit::{ConfigLoader, LayoutSpec, LoadOptions, LoggerRegistry};
//!
//! let registry = LoggerRegistry::new();
//! let loader = ConfigLoader::new(&registry);
//! let logger = loader.load(
//!     &LoadOptions::new("config/general_logging.json", "general_logger")
//!         .with_handler("general")
//!         .with_output_path("logs/general.log"),
//! )?;
//!
//! logger.log_title("Startup", &LayoutSpec::title());
//! # Ok::<(), logtoolkit::Error>(())
//! ```

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::bootstrap::Bootstrap;
use crate::config::{DocumentFormat, LogConfiguration};
use crate::logger::FormattingLogger;
use crate::registry::LoggerRegistry;
use crate::{Error, Result};

/// Handler patched when none is named explicitly.
pub const DEFAULT_HANDLER: &str = "general";

/// Field of a handler entry that holds its output file.
pub const OUTPUT_FIELD: &str = "filename";

/// Arguments of a single [`ConfigLoader::load`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    /// Path of the configuration document
    pub config_path: PathBuf,
    /// Logger to return once the configuration is applied
    pub logger_name: String,
    /// Handler whose output file `output_path` replaces
    pub handler_name: String,
    /// Output file override
    pub output_path: Option<PathBuf>,
}

impl LoadOptions {
    pub fn new(config_path: impl Into<PathBuf>, logger_name: impl Into<String>) -> Self {
        Self {
            config_path: config_path.into(),
            logger_name: logger_name.into(),
            handler_name: DEFAULT_HANDLER.to_string(),
            output_path: None,
        }
    }

    /// Name the handler to patch.
    pub fn with_handler(mut self, handler_name: impl Into<String>) -> Self {
        self.handler_name = handler_name.into();
        self
    }

    /// Redirect the handler's output to `output_path`.
    pub fn with_output_path(mut self, output_path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(output_path.into());
        self
    }
}

/// Applies configuration documents to a [`LoggerRegistry`].
#[derive(Debug)]
pub struct ConfigLoader<'r> {
    registry: &'r LoggerRegistry,
    bootstrap: Bootstrap,
}

impl<'r> ConfigLoader<'r> {
    /// Loader reporting through the default stderr [`Bootstrap`].
    pub fn new(registry: &'r LoggerRegistry) -> Self {
        Self {
            registry,
            bootstrap: Bootstrap::new(),
        }
    }

    /// Replace the emitter used for loader diagnostics.
    pub fn with_bootstrap(mut self, bootstrap: Bootstrap) -> Self {
        self.bootstrap = bootstrap;
        self
    }

    /// Read, patch and apply the document, then return the requested logger.
    ///
    /// Failures are reported through the bootstrap emitter before being
    /// returned.
    ///
    /// # Errors
    ///
    /// - [`Error::ConfigNotFound`], [`Error::ConfigUnreadable`] or
    ///   [`Error::ConfigMalformed`] when the document cannot be read or parsed
    /// - [`Error::HandlerNotFound`] when an output override names an unknown handler
    /// - [`Error::Io`] when the output directory cannot be created
    /// - [`Error::ConfigInvalid`] when the document is rejected on apply
    pub fn load(&self, options: &LoadOptions) -> Result<FormattingLogger> {
        self.try_load(options).inspect_err(|err| self.report(err, options))
    }

    fn try_load(&self, options: &LoadOptions) -> Result<FormattingLogger> {
        let mut document = read_document(&options.config_path)?;

        if let Some(output_path) = &options.output_path {
            override_output(&mut document, &options.handler_name, output_path)?;
            self.bootstrap.in_scope(|| {
                tracing::debug!(
                    "Handler '{}' filename dynamically set to: {}",
                    options.handler_name,
                    output_path.display()
                )
            });
        }

        // validated before any directory is created
        let config = LogConfiguration::from_value(document)?;
        if let Some(output_path) = &options.output_path
            && let Some(created) = ensure_parent_dir(output_path)?
        {
            self.bootstrap.in_scope(|| {
                tracing::debug!("Created directory for log file: {}", created.display())
            });
        }
        self.registry.apply_configuration(&config)?;
        self.bootstrap.in_scope(|| {
            tracing::debug!(
                "Applied logging configuration from {}",
                options.config_path.display()
            )
        });

        Ok(FormattingLogger::new(
            self.registry.get_or_create(&options.logger_name),
        ))
    }

    fn report(&self, err: &Error, options: &LoadOptions) {
        let config_path = options.config_path.display();
        self.bootstrap.in_scope(|| match err {
            Error::ConfigNotFound { .. }
            | Error::ConfigUnreadable { .. }
            | Error::ConfigMalformed { .. } => tracing::error!(
                "File operation error: {}. Please check the following:\n\
                 - Does the configuration file exist? Path: {}\n\
                 - Does the file have the correct read permissions?\n\
                 - Is the configuration file a valid JSON format?",
                err,
                config_path
            ),
            Error::Io(_) => tracing::error!(
                "File operation error: {}. Please check that the log directory can be created: {}",
                err,
                options
                    .output_path
                    .as_deref()
                    .and_then(Path::parent)
                    .unwrap_or(Path::new(""))
                    .display()
            ),
            Error::HandlerNotFound(_) | Error::ConfigInvalid(_) => tracing::error!(
                "Configuration error: {}. Please check your configuration file for:\n\
                 - Missing required fields (e.g., handlers, loggers).\n\
                 - Incorrect field values.",
                err
            ),
            Error::Unexpected(_) => tracing::error!(
                "An unexpected error occurred: {}.\n\
                 Please verify the configuration file, input parameters, and execution environment for potential issues.",
                err
            ),
        });
    }
}

/// Read and parse the document at `path`.
fn read_document(path: &Path) -> Result<Value> {
    let text = std::fs::read_to_string(path).map_err(|source| match source.kind() {
        ErrorKind::NotFound => Error::ConfigNotFound {
            path: path.to_path_buf(),
        },
        ErrorKind::InvalidData => Error::ConfigMalformed {
            path: path.to_path_buf(),
            message: source.to_string(),
        },
        _ => Error::ConfigUnreadable {
            path: path.to_path_buf(),
            source,
        },
    })?;

    DocumentFormat::from_path(path)
        .parse(&text)
        .map_err(|message| Error::ConfigMalformed {
            path: path.to_path_buf(),
            message,
        })
}

/// Point `handlers.<handler>.filename` at `output_path`.
fn override_output(document: &mut Value, handler: &str, output_path: &Path) -> Result<()> {
    let entry = document
        .get_mut("handlers")
        .and_then(|handlers| handlers.get_mut(handler))
        .ok_or_else(|| Error::HandlerNotFound(handler.to_string()))?;
    let fields = entry.as_object_mut().ok_or_else(|| {
        Error::Unexpected(format!(
            "handler '{}' is not a mapping, cannot set '{}'",
            handler, OUTPUT_FIELD
        ))
    })?;
    fields.insert(
        OUTPUT_FIELD.to_string(),
        Value::String(output_path.to_string_lossy().into_owned()),
    );
    Ok(())
}

/// Create the parent directory chain of `path`, returning it if it was created.
///
/// A directory that already exists, including one created concurrently by
/// someone else, is not an error.
fn ensure_parent_dir(path: &Path) -> Result<Option<PathBuf>> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => return Ok(None),
    };
    if parent.is_dir() {
        return Ok(None);
    }

    created_dir(std::fs::create_dir_all(parent), parent)
}

/// Interpret the outcome of creating `dir`.
fn created_dir(outcome: std::io::Result<()>, dir: &Path) -> Result<Option<PathBuf>> {
    match outcome {
        Ok(()) => Ok(Some(dir.to_path_buf())),
        Err(e) if e.kind() == ErrorKind::AlreadyExists && dir.is_dir() => Ok(None),
        Err(e) => Err(Error::Io(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::SharedBuffer;
    use serde_json::json;
    use tracing::level_filters::LevelFilter;

    #[test]
    fn test_load_options_builder() {
        let options = LoadOptions::new("logging.json", "app");
        assert_eq!(options.handler_name, DEFAULT_HANDLER);
        assert!(options.output_path.is_none());

        let options = options
            .with_handler("error")
            .with_output_path("logs/error.log");
        assert_eq!(options.handler_name, "error");
        assert_eq!(options.output_path, Some(PathBuf::from("logs/error.log")));
    }

    #[test]
    fn test_override_output_sets_filename() {
        let mut doc = json!({
            "version": 1,
            "handlers": { "general": { "class": "logging.FileHandler", "filename": "old.log" } }
        });
        override_output(&mut doc, "general", Path::new("logs/new.log")).unwrap();
        assert_eq!(doc["handlers"]["general"]["filename"], json!("logs/new.log"));
        assert_eq!(doc["handlers"]["general"]["class"], json!("logging.FileHandler"));
    }

    #[test]
    fn test_override_output_missing_handler() {
        let mut doc = json!({ "version": 1, "handlers": { "general": {} } });
        let err = override_output(&mut doc, "error", Path::new("x.log")).unwrap_err();
        assert!(matches!(err, Error::HandlerNotFound(name) if name == "error"));

        let mut doc = json!({ "version": 1 });
        let err = override_output(&mut doc, "general", Path::new("x.log")).unwrap_err();
        assert!(matches!(err, Error::HandlerNotFound(_)));
    }

    #[test]
    fn test_override_output_non_mapping_handler() {
        let mut doc = json!({ "version": 1, "handlers": { "general": "file" } });
        let err = override_output(&mut doc, "general", Path::new("x.log")).unwrap_err();
        assert!(matches!(err, Error::Unexpected(_)));
    }

    #[test]
    fn test_ensure_parent_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let target = dir.path().join("a").join("b").join("app.log");

        let created = ensure_parent_dir(&target).unwrap();
        assert_eq!(created, Some(dir.path().join("a").join("b")));
        assert!(dir.path().join("a").join("b").is_dir());

        // second call is a no-op
        assert_eq!(ensure_parent_dir(&target).unwrap(), None);
        assert_eq!(ensure_parent_dir(Path::new("bare.log")).unwrap(), None);
    }

    #[test]
    fn test_ensure_parent_dir_blocked_by_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();

        let err = ensure_parent_dir(&blocker.join("app.log")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_created_dir_outcomes() {
        let dir = tempfile::tempdir().expect("tempdir");

        // created concurrently by someone else
        let raced = std::io::Error::from(ErrorKind::AlreadyExists);
        assert_eq!(created_dir(Err(raced), dir.path()).unwrap(), None);

        let missing = dir.path().join("never-created");
        let raced = std::io::Error::from(ErrorKind::AlreadyExists);
        assert!(matches!(created_dir(Err(raced), &missing), Err(Error::Io(_))));

        let denied = std::io::Error::from(ErrorKind::PermissionDenied);
        assert!(matches!(created_dir(Err(denied), &missing), Err(Error::Io(_))));

        assert_eq!(
            created_dir(Ok(()), dir.path()).unwrap(),
            Some(dir.path().to_path_buf())
        );
    }

    fn capturing_loader(registry: &LoggerRegistry) -> (ConfigLoader<'_>, SharedBuffer) {
        let buffer = SharedBuffer::default();
        let sink = buffer.clone();
        let loader = ConfigLoader::new(registry)
            .with_bootstrap(Bootstrap::with_writer(move || sink.clone(), LevelFilter::WARN));
        (loader, buffer)
    }

    #[test]
    fn test_load_reports_directory_failure() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config_path = dir.path().join("logging.json");
        std::fs::write(
            &config_path,
            json!({
                "version": 1,
                "handlers": { "general": { "class": "logging.FileHandler", "filename": "x.log" } }
            })
            .to_string(),
        )
        .unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();

        let registry = LoggerRegistry::new();
        let (loader, buffer) = capturing_loader(&registry);
        let err = loader
            .load(
                &LoadOptions::new(&config_path, "app")
                    .with_output_path(blocker.join("logs").join("app.log")),
            )
            .unwrap_err();

        assert!(matches!(err, Error::Io(_)));
        assert!(buffer.contents().contains("log directory can be created"));
        assert!(!registry.is_configured());
    }

    #[test]
    fn test_load_rejects_output_override_on_stream_handler() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config_path = dir.path().join("logging.json");
        std::fs::write(
            &config_path,
            json!({
                "version": 1,
                "handlers": {
                    "console": { "class": "logging.StreamHandler", "stream": "ext://sys.stdout" }
                },
                "loggers": { "app": { "level": "INFO", "handlers": ["console"] } }
            })
            .to_string(),
        )
        .unwrap();

        let registry = LoggerRegistry::new();
        let (loader, buffer) = capturing_loader(&registry);
        let output = dir.path().join("logs").join("app.log");
        let err = loader
            .load(
                &LoadOptions::new(&config_path, "app")
                    .with_handler("console")
                    .with_output_path(&output),
            )
            .unwrap_err();

        assert!(matches!(&err, Error::ConfigInvalid(msg) if msg.contains("'console'")));
        assert!(buffer.contents().contains("Configuration error:"));
        assert!(!dir.path().join("logs").exists());
        assert!(!registry.is_configured());
    }

    #[test]
    fn test_read_document_errors() {
        let dir = tempfile::tempdir().expect("tempdir");

        let missing = dir.path().join("missing.json");
        assert!(matches!(
            read_document(&missing),
            Err(Error::ConfigNotFound { path }) if path == missing
        ));

        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "{ \"version\": 1,").unwrap();
        assert!(matches!(
            read_document(&broken),
            Err(Error::ConfigMalformed { .. })
        ));

        let binary = dir.path().join("binary.json");
        std::fs::write(&binary, [0xff, 0xfe, 0x00]).unwrap();
        assert!(matches!(
            read_document(&binary),
            Err(Error::ConfigMalformed { .. })
        ));

        // a directory cannot be read as a document
        assert!(matches!(
            read_document(dir.path()),
            Err(Error::ConfigUnreadable { .. })
        ));
    }
}
