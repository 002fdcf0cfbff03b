//! Loading two configurations into one registry and reporting a bad load.
//!
//! Run with:
//! ```bash
//! RUST_LOG=debug cargo run --example config_json
//! ```

use logtoolkit::{ConfigLoader, LayoutSpec, LoadOptions, LoggerRegistry};
use tracing::Level;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let registry = LoggerRegistry::new();
    let loader = ConfigLoader::new(&registry);

    let general = loader.load(
        &LoadOptions::new("demos/general_logging.json", "general_logger")
            .with_output_path("logs/demo/general.log"),
    )?;
    let error = loader.load(
        &LoadOptions::new("demos/error_logging.json", "error_logger")
            .with_handler("error")
            .with_output_path("logs/demo/error.log"),
    )?;

    general.info("This is an INFO message.");
    general.warn("This is a WARNING message.");
    error.info("This INFO message is filtered by the error handler.");
    error.log_with_borders(
        "This message is way too long for the specified length!",
        &LayoutSpec::bordered(Level::ERROR).with_length(30).with_border("#"),
    );

    // the failure is reported on stderr by the bootstrap emitter
    let missing = loader.load(
        &LoadOptions::new("demos/general_logging.json", "general_logger")
            .with_handler("does_not_exist")
            .with_output_path("logs/demo/other.log"),
    );
    if let Err(err) = missing {
        general.warn(&format!("expected failure: {}", err));
    }

    Ok(())
}
