use std::path::PathBuf;

use thiserror::Error as ThisError;

/// Errors raised while loading or applying a logging configuration.
#[derive(ThisError, Debug)]
pub enum Error {
    /// The configuration document does not exist.
    #[error("configuration file not found: {}", path.display())]
    ConfigNotFound { path: PathBuf },
    /// The configuration document exists but could not be read.
    #[error("configuration file {} could not be read: {source}", path.display())]
    ConfigUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The configuration document is not valid structured data.
    #[error("configuration file {} is malformed: {message}", path.display())]
    ConfigMalformed { path: PathBuf, message: String },
    /// An output path override named a handler the document does not define.
    #[error("Handler '{0}' not found in configuration.")]
    HandlerNotFound(String),
    /// The document was parsed but rejected while applying it.
    #[error("invalid logging configuration: {0}")]
    ConfigInvalid(String),
    /// Anything else that went wrong while loading.
    #[error("unexpected error: {0}")]
    Unexpected(String),
    /// I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the error originates from accessing or parsing the document itself.
    pub fn is_file_error(&self) -> bool {
        matches!(
            self,
            Error::ConfigNotFound { .. }
                | Error::ConfigUnreadable { .. }
                | Error::ConfigMalformed { .. }
                | Error::Io(_)
        )
    }

    /// Whether the error comes from the document's content.
    pub fn is_config_error(&self) -> bool {
        matches!(self, Error::HandlerNotFound(_) | Error::ConfigInvalid(_))
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handler_not_found_names_handler() {
        let err = Error::HandlerNotFound("general".to_string());
        assert_eq!(
            err.to_string(),
            "Handler 'general' not found in configuration."
        );
        assert!(err.is_config_error());
        assert!(!err.is_file_error());
    }

    #[test]
    fn test_error_classification() {
        let not_found = Error::ConfigNotFound {
            path: PathBuf::from("missing.json"),
        };
        assert!(not_found.is_file_error());
        assert!(not_found.to_string().contains("missing.json"));

        let unexpected = Error::Unexpected("boom".to_string());
        assert!(!unexpected.is_file_error());
        assert!(!unexpected.is_config_error());
    }
}
