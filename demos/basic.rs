//! Layout helpers on a logger loaded from `demos/general_logging.json`.
//!
//! Run with:
//! ```bash
//! cargo run --example basic
//! ```

use logtoolkit::{LayoutSpec, LoadOptions};
use tracing::Level;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let logger = logtoolkit::load(
        &LoadOptions::new("demos/general_logging.json", "general_logger")
            .with_handler("general")
            .with_output_path("logs/demo/general.log"),
    )?;

    logger.log_title("AMP - Data Collect", &LayoutSpec::title());
    logger.add_divider(&LayoutSpec::divider().with_length(20).with_border("*").with_fill("-"));

    logger.info("Step 1: Data Preprocessing");
    logger.add_spacer(1);
    logger.log_with_borders(
        "This is a long test message that should wrap correctly.",
        &LayoutSpec::bordered(Level::INFO).with_length(22).with_border("#"),
    );
    logger.add_spacer(2);
    logger.log_with_borders("Line 1\nLine 2\nLine 3", &LayoutSpec::bordered(Level::INFO).with_length(15));
    logger.add_divider(&LayoutSpec::divider());

    Ok(())
}
