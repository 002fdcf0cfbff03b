use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use serde_json::json;
use tempfile::TempDir;

use crate::config::LogConfiguration;
use crate::logger::FormattingLogger;
use crate::registry::LoggerRegistry;

/// A logger writing bare messages to a temporary file.
pub(crate) struct Capture {
    _dir: TempDir,
    path: PathBuf,
    pub logger: FormattingLogger,
}

impl Capture {
    pub fn new(name: &str, level: &str) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("capture.log");
        let config = LogConfiguration::from_value(json!({
            "version": 1,
            "handlers": {
                "capture": { "class": "logging.FileHandler", "filename": path }
            },
            "loggers": {
                name: { "level": level, "handlers": ["capture"], "propagate": false }
            }
        }))
        .expect("capture configuration");

        let registry = LoggerRegistry::new();
        registry.apply_configuration(&config).expect("apply");
        let logger = FormattingLogger::new(registry.get_or_create(name));
        Self {
            _dir: dir,
            path,
            logger,
        }
    }

    pub fn lines(&self) -> Vec<String> {
        std::fs::read_to_string(&self.path)
            .unwrap_or_default()
            .lines()
            .map(String::from)
            .collect()
    }
}

/// In-memory `MakeWriter` target.
#[derive(Clone, Default)]
pub(crate) struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
