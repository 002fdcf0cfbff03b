use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::sync::Arc;

use tracing_subscriber::fmt::MakeWriter;

use crate::config::{HandlerKind, StreamTarget};

/// Output sink of one configured handler.
///
/// A file handler shares a single append-mode file across every logger bound
/// to it; each formatted record reaches the file in one `write_all`.
#[derive(Debug, Clone)]
pub enum HandlerWriter {
    Stdout,
    Stderr,
    File(Arc<File>),
    Null,
}

impl HandlerWriter {
    /// Open the sink described by a handler class.
    pub fn open(kind: &HandlerKind) -> io::Result<Self> {
        match kind {
            HandlerKind::Stream(StreamTarget::Stdout) => Ok(HandlerWriter::Stdout),
            HandlerKind::Stream(StreamTarget::Stderr) => Ok(HandlerWriter::Stderr),
            HandlerKind::File { path, truncate } => {
                let mut options = OpenOptions::new();
                options.create(true);
                if *truncate {
                    options.write(true).truncate(true);
                } else {
                    options.append(true);
                }
                let file = options.open(path)?;
                Ok(HandlerWriter::File(Arc::new(file)))
            }
            HandlerKind::Null => Ok(HandlerWriter::Null),
        }
    }
}

/// Writer handed out per record by [`HandlerWriter`].
pub enum SinkWriter<'a> {
    Stdout(io::Stdout),
    Stderr(io::Stderr),
    File(&'a File),
    Null,
}

impl Write for SinkWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            SinkWriter::Stdout(out) => out.write(buf),
            SinkWriter::Stderr(err) => err.write(buf),
            SinkWriter::File(file) => file.write(buf),
            SinkWriter::Null => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            SinkWriter::Stdout(out) => out.flush(),
            SinkWriter::Stderr(err) => err.flush(),
            SinkWriter::File(file) => file.flush(),
            SinkWriter::Null => Ok(()),
        }
    }
}

impl<'a> MakeWriter<'a> for HandlerWriter {
    type Writer = SinkWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        match self {
            HandlerWriter::Stdout => SinkWriter::Stdout(io::stdout()),
            HandlerWriter::Stderr => SinkWriter::Stderr(io::stderr()),
            HandlerWriter::File(file) => SinkWriter::File(file.as_ref()),
            HandlerWriter::Null => SinkWriter::Null,
        }
    }
}
