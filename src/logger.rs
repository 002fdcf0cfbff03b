use std::ops::Deref;

use tracing::Level;

use crate::layout;
use crate::registry::LoggerHandle;

/// Parameters of a single layout call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutSpec {
    /// Level the produced lines are emitted at
    pub level: Level,
    /// Target width in characters
    pub length: usize,
    /// Border string framing the line
    pub border: String,
    /// Fill string, used by dividers
    pub fill: String,
}

impl LayoutSpec {
    /// Divider defaults: `+========+` at INFO.
    pub fn divider() -> Self {
        Self {
            level: Level::INFO,
            length: 10,
            border: "+".to_string(),
            fill: "=".to_string(),
        }
    }

    /// Bordered block defaults: 50 characters framed by `|`.
    pub fn bordered(level: Level) -> Self {
        Self {
            level,
            length: 50,
            border: "|".to_string(),
            fill: " ".to_string(),
        }
    }

    /// Title banner defaults: 40 `#` on each side.
    pub fn title() -> Self {
        Self {
            level: Level::INFO,
            length: 40,
            border: "#".to_string(),
            fill: " ".to_string(),
        }
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn with_length(mut self, length: usize) -> Self {
        self.length = length;
        self
    }

    pub fn with_border(mut self, border: impl Into<String>) -> Self {
        self.border = border.into();
        self
    }

    pub fn with_fill(mut self, fill: impl Into<String>) -> Self {
        self.fill = fill.into();
        self
    }
}

/// A [`LoggerHandle`] with layout helpers.
///
/// Dereferences to the wrapped handle, so plain `info`/`warn`/... calls work
/// directly on it.
#[derive(Debug, Clone)]
pub struct FormattingLogger {
    handle: LoggerHandle,
}

impl FormattingLogger {
    pub fn new(handle: LoggerHandle) -> Self {
        Self { handle }
    }

    /// The wrapped handle.
    pub fn handle(&self) -> &LoggerHandle {
        &self.handle
    }

    /// Emit a divider line such as `+========+`.
    pub fn add_divider(&self, spec: &LayoutSpec) {
        let line = layout::divider(spec.length, &spec.border, &spec.fill);
        self.handle.log(spec.level, &line);
    }

    /// Emit `message` as a bordered, word-wrapped block, one record per line.
    pub fn log_with_borders(&self, message: &str, spec: &LayoutSpec) {
        for line in layout::bordered_lines(message, &spec.border, spec.length) {
            self.handle.log(spec.level, &line);
        }
    }

    /// Emit `lines` empty records at INFO; at least one is always emitted.
    pub fn add_spacer(&self, lines: usize) {
        for _ in 0..layout::spacer_count(lines) {
            self.handle.log(Level::INFO, "");
        }
    }

    /// Emit a banner `### 'title' ###` at INFO.
    ///
    /// Only `length` and `border` of `spec` are used.
    pub fn log_title(&self, title: &str, spec: &LayoutSpec) {
        let banner = layout::title_banner(title, spec.length, &spec.border);
        self.handle.log(Level::INFO, &banner);
    }
}

impl Deref for FormattingLogger {
    type Target = LoggerHandle;

    fn deref(&self) -> &Self::Target {
        &self.handle
    }
}

impl From<LoggerHandle> for FormattingLogger {
    fn from(handle: LoggerHandle) -> Self {
        Self::new(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Capture;

    #[test]
    fn test_layout_spec_defaults() {
        let divider = LayoutSpec::divider();
        assert_eq!(divider.level, Level::INFO);
        assert_eq!(divider.length, 10);
        assert_eq!(divider.border, "+");
        assert_eq!(divider.fill, "=");

        let bordered = LayoutSpec::bordered(Level::ERROR);
        assert_eq!(bordered.level, Level::ERROR);
        assert_eq!(bordered.length, 50);
        assert_eq!(bordered.border, "|");

        let title = LayoutSpec::title();
        assert_eq!(title.length, 40);
        assert_eq!(title.border, "#");
    }

    #[test]
    fn test_layout_spec_builders() {
        let spec = LayoutSpec::divider()
            .with_level(Level::DEBUG)
            .with_length(15)
            .with_border("~")
            .with_fill("=");
        assert_eq!(spec.level, Level::DEBUG);
        assert_eq!(spec.length, 15);
        assert_eq!(spec.border, "~");
        assert_eq!(spec.fill, "=");
    }

    #[test]
    fn test_add_divider_emits_one_line() {
        let capture = Capture::new("divider", "DEBUG");
        capture.logger.add_divider(&LayoutSpec::divider());
        capture
            .logger
            .add_divider(&LayoutSpec::divider().with_length(20).with_border("*").with_fill("-"));
        capture.logger.add_divider(
            &LayoutSpec::divider()
                .with_level(Level::DEBUG)
                .with_length(1)
                .with_border("~"),
        );

        assert_eq!(
            capture.lines(),
            vec![
                "+========+".to_string(),
                format!("*{}*", "-".repeat(18)),
                "~=~".to_string(),
            ]
        );
    }

    #[test]
    fn test_divider_respects_logger_level() {
        let capture = Capture::new("divider-level", "INFO");
        capture
            .logger
            .add_divider(&LayoutSpec::divider().with_level(Level::DEBUG));
        capture.logger.add_divider(&LayoutSpec::divider());
        assert_eq!(capture.lines(), vec!["+========+"]);
    }

    #[test]
    fn test_log_with_borders_one_record_per_line() {
        let capture = Capture::new("borders", "DEBUG");
        capture
            .logger
            .log_with_borders("Hello\n\nWorld", &LayoutSpec::bordered(Level::INFO).with_length(10));
        capture
            .logger
            .log_with_borders("", &LayoutSpec::bordered(Level::DEBUG).with_border("*").with_length(10));

        assert_eq!(
            capture.lines(),
            vec!["| Hello  |", "|        |", "| World  |", "*        *"]
        );
    }

    #[test]
    fn test_add_spacer_counts() {
        let capture = Capture::new("spacer", "INFO");
        capture.logger.info("Step 1");
        capture.logger.add_spacer(0);
        capture.logger.info("Step 2");
        capture.logger.add_spacer(2);
        capture.logger.info("Step 3");

        assert_eq!(
            capture.lines(),
            vec!["Step 1", "", "Step 2", "", "", "Step 3"]
        );
    }

    #[test]
    fn test_spacer_is_info_level() {
        let capture = Capture::new("spacer-level", "WARNING");
        capture.logger.add_spacer(3);
        assert!(capture.lines().is_empty());
    }

    #[test]
    fn test_log_title() {
        let capture = Capture::new("title", "INFO");
        capture.logger.log_title("AMP - Data Collect", &LayoutSpec::title());
        capture
            .logger
            .log_title("Processing Data", &LayoutSpec::title().with_length(30).with_border("*"));

        assert_eq!(
            capture.lines(),
            vec![
                format!("{} 'AMP - Data Collect' {}", "#".repeat(40), "#".repeat(40)),
                format!("{} 'Processing Data' {}", "*".repeat(30), "*".repeat(30)),
            ]
        );
    }

    #[test]
    fn test_deref_to_handle() {
        let capture = Capture::new("deref", "INFO");
        assert_eq!(capture.logger.name(), "deref");
        capture.logger.warn("plain warning");
        assert_eq!(capture.lines(), vec!["plain warning"]);
    }
}
