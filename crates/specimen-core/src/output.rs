//! Streaming JSON / JSON Lines output for batch classification.

use serde::Serialize;
use std::io::{self, Write};
use std::str::FromStr;

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// One JSON array, written when the batch finishes
    #[default]
    Json,
    /// One JSON object per line, written as each record arrives
    JsonLines,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "jsonl" | "jsonlines" | "ndjson" => Ok(Self::JsonLines),
            other => Err(format!("unknown output format '{other}' (expected json or jsonl)")),
        }
    }
}

/// Writes records as they are produced.
///
/// JSON Lines output is flushed per record so long batch runs can be
/// followed live; JSON output is buffered into a single array and emitted by
/// [`finish`](Self::finish).
pub struct RecordWriter<W: Write, T: Serialize> {
    writer: W,
    format: OutputFormat,
    pretty: bool,
    pending: Vec<T>,
    written: usize,
}

impl<W: Write, T: Serialize> RecordWriter<W, T> {
    pub fn new(writer: W, format: OutputFormat, pretty: bool) -> Self {
        Self {
            writer,
            format,
            pretty,
            pending: Vec::new(),
            written: 0,
        }
    }

    pub fn push(&mut self, record: T) -> io::Result<()> {
        match self.format {
            OutputFormat::Json => self.pending.push(record),
            OutputFormat::JsonLines => {
                serde_json::to_writer(&mut self.writer, &record).map_err(io::Error::other)?;
                writeln!(self.writer)?;
                self.writer.flush()?;
            }
        }
        self.written += 1;
        Ok(())
    }

    /// Number of records accepted so far.
    pub fn count(&self) -> usize {
        self.written
    }

    /// Emit any buffered output and return the underlying writer.
    pub fn finish(mut self) -> io::Result<W> {
        if self.format == OutputFormat::Json {
            let result = if self.pretty {
                serde_json::to_writer_pretty(&mut self.writer, &self.pending)
            } else {
                serde_json::to_writer(&mut self.writer, &self.pending)
            };
            result.map_err(io::Error::other)?;
            writeln!(self.writer)?;
        }
        self.writer.flush()?;
        Ok(self.writer)
    }
}
