//! # Logtoolkit
//!
//! Load a declarative logging configuration, wire it into a registry of named
//! loggers backed by `tracing`, and lay messages out as dividers, bordered
//! blocks, spacers and title banners.
//!
//! ## Features
//!
//! - `dictConfig`-style documents (JSON; TOML and YAML behind features)
//! - Runtime override of a handler's output file, creating its directory
//! - Console, file and null handlers with `%(key)s` formatters
//! - Layout helpers on [`FormattingLogger`]
//!
//! ## Example
//!
//! ```rust,no_run
//! use logtoolkit::{LayoutSpec, LoadOptions};
//! use tracing::Level;
//!
//! let logger = logtoolkit::load(
//!     &LoadOptions::new("config/general_logging.json", "general_logger")
//!         .with_output_path("logs/general.log"),
//! )?;
//!
//! logger.log_title("Data Collect", &LayoutSpec::title());
//! logger.log_with_borders("Hello", &LayoutSpec::bordered(Level::INFO).with_length(10));
//! logger.add_divider(&LayoutSpec::divider());
//! logger.add_spacer(1);
//! # Ok::<(), logtoolkit::Error>(())
//! ```

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod format;
pub mod layout;
pub mod loader;
pub mod logger;
pub mod registry;
pub mod writer;

#[cfg(test)]
mod testing;

pub use bootstrap::Bootstrap;
pub use config::{FormatterConfig, HandlerConfig, LogConfiguration, LoggerConfig};
pub use error::{Error, Result};
pub use format::PatternFormatter;
pub use loader::{ConfigLoader, LoadOptions};
pub use logger::{FormattingLogger, LayoutSpec};
pub use registry::{LoggerHandle, LoggerRegistry};

/// Load `options` into the process-wide registry.
///
/// # Errors
///
/// See [`ConfigLoader::load`].
pub fn load(options: &LoadOptions) -> Result<FormattingLogger> {
    ConfigLoader::new(LoggerRegistry::global()).load(options)
}
