//! `%(key)s` style record formatting.
//!
//! Handlers render every event through a [`PatternFormatter`] compiled from the
//! `format`/`datefmt` pair of a formatter entry in the configuration document.

use std::fmt::{self, Write as _};

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

/// Event field carrying the logical logger name.
pub(crate) const LOGGER_FIELD: &str = "logger";

/// Timestamp layout used when a formatter does not set `datefmt`.
pub const DEFAULT_DATEFMT: &str = "%Y-%m-%d %H:%M:%S,%3f";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Key {
    AscTime,
    LevelName,
    LevelNo,
    Name,
    Message,
    Process,
    ThreadName,
}

impl Key {
    fn parse(key: &str) -> Option<Self> {
        match key {
            "asctime" => Some(Key::AscTime),
            "levelname" => Some(Key::LevelName),
            "levelno" => Some(Key::LevelNo),
            "name" => Some(Key::Name),
            "message" => Some(Key::Message),
            "process" => Some(Key::Process),
            "threadName" => Some(Key::ThreadName),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field {
        key: Key,
        width: usize,
        left: bool,
        precision: Option<usize>,
    },
}

/// A single record as seen by the formatter.
#[derive(Debug, Clone)]
pub struct Record<'a> {
    pub level: Level,
    pub logger: &'a str,
    pub message: &'a str,
    pub timestamp: DateTime<Local>,
}

/// Compiled `format` + `datefmt` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternFormatter {
    segments: Vec<Segment>,
    datefmt: String,
}

impl PatternFormatter {
    /// Compile a pattern such as `%(asctime)s - %(levelname)-8s - %(message)s`.
    pub fn compile(format: &str, datefmt: Option<&str>) -> Result<Self, String> {
        let datefmt = datefmt.unwrap_or(DEFAULT_DATEFMT);
        if StrftimeItems::new(datefmt).any(|item| matches!(item, Item::Error)) {
            return Err(format!("invalid datefmt '{}'", datefmt));
        }

        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = format.chars().peekable();

        while let Some(c) = chars.next() {
            if c != '%' {
                literal.push(c);
                continue;
            }
            match chars.next() {
                Some('%') => literal.push('%'),
                Some('(') => {
                    let mut name = String::new();
                    loop {
                        match chars.next() {
                            Some(')') => break,
                            Some(c) => name.push(c),
                            None => return Err(format!("unterminated placeholder in '{}'", format)),
                        }
                    }
                    let key = Key::parse(&name)
                        .ok_or_else(|| format!("unknown format field '{}'", name))?;

                    let left = chars.next_if_eq(&'-').is_some();
                    let width = take_number(&mut chars).unwrap_or(0);
                    let precision = if chars.next_if_eq(&'.').is_some() {
                        Some(take_number(&mut chars).unwrap_or(0))
                    } else {
                        None
                    };
                    match chars.next() {
                        Some('s') | Some('d') => {}
                        Some(other) => {
                            return Err(format!(
                                "unsupported conversion '{}' for field '{}'",
                                other, name
                            ));
                        }
                        None => return Err(format!("missing conversion for field '{}'", name)),
                    }

                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Field {
                        key,
                        width,
                        left,
                        precision,
                    });
                }
                Some(other) => return Err(format!("unsupported format sequence '%{}'", other)),
                None => return Err("dangling '%' at end of format".to_string()),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            segments,
            datefmt: datefmt.to_string(),
        })
    }

    /// Formatter used by the bootstrap emitter.
    pub(crate) fn bootstrap() -> Self {
        let field = |key, width, left| Segment::Field {
            key,
            width,
            left,
            precision: None,
        };
        Self {
            segments: vec![
                field(Key::AscTime, 0, false),
                Segment::Literal(" - ".to_string()),
                field(Key::LevelName, 8, true),
                Segment::Literal(" - ".to_string()),
                field(Key::Message, 0, false),
            ],
            datefmt: "%Y-%m-%d %H:%M:%S".to_string(),
        }
    }

    /// Render one record, without the trailing newline.
    pub fn render(&self, record: &Record<'_>) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field {
                    key,
                    width,
                    left,
                    precision,
                } => {
                    let value = self.value(*key, record);
                    let value = match precision {
                        Some(p) => value.chars().take(*p).collect(),
                        None => value,
                    };
                    let _ = if *left {
                        write!(out, "{:<width$}", value, width = *width)
                    } else {
                        write!(out, "{:>width$}", value, width = *width)
                    };
                }
            }
        }
        out
    }

    fn value(&self, key: Key, record: &Record<'_>) -> String {
        match key {
            Key::AscTime => {
                let mut stamp = String::new();
                let _ = write!(stamp, "{}", record.timestamp.format(&self.datefmt));
                stamp
            }
            Key::LevelName => level_name(record.level).to_string(),
            Key::LevelNo => level_number(record.level).to_string(),
            Key::Name => record.logger.to_string(),
            Key::Message => record.message.to_string(),
            Key::Process => std::process::id().to_string(),
            Key::ThreadName => std::thread::current()
                .name()
                .unwrap_or("<unnamed>")
                .to_string(),
        }
    }
}

fn take_number(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Option<usize> {
    let mut digits = String::new();
    while let Some(d) = chars.next_if(|c| c.is_ascii_digit()) {
        digits.push(d);
    }
    digits.parse().ok()
}

/// Level name in the configuration vocabulary.
pub fn level_name(level: Level) -> &'static str {
    match level {
        Level::TRACE => "TRACE",
        Level::DEBUG => "DEBUG",
        Level::INFO => "INFO",
        Level::WARN => "WARNING",
        Level::ERROR => "ERROR",
    }
}

fn level_number(level: Level) -> u8 {
    match level {
        Level::TRACE => 5,
        Level::DEBUG => 10,
        Level::INFO => 20,
        Level::WARN => 30,
        Level::ERROR => 40,
    }
}

#[derive(Default)]
struct RecordVisitor {
    message: String,
    logger: Option<String>,
}

impl Visit for RecordVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "message" => self.message = value.to_string(),
            LOGGER_FIELD => self.logger = Some(value.to_string()),
            _ => {}
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        match field.name() {
            "message" => self.message = format!("{:?}", value),
            LOGGER_FIELD => self.logger = Some(format!("{:?}", value)),
            _ => {}
        }
    }
}

impl<S, N> FormatEvent<S, N> for PatternFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let mut visitor = RecordVisitor::default();
        event.record(&mut visitor);

        let metadata = event.metadata();
        let record = Record {
            level: *metadata.level(),
            logger: visitor.logger.as_deref().unwrap_or(metadata.target()),
            message: &visitor.message,
            timestamp: Local::now(),
        };
        writeln!(writer, "{}", self.render(&record))
    }
}
