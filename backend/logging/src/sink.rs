//! Record sinks
//!
//! A [`Sink`] decides whether a level is enabled and turns a finished
//! [`Record`] into output. [`StreamSink`] writes one line per record, either
//! as a JSON object or as `key=value` text, to any tracing-subscriber
//! [`MakeWriter`].

use std::fmt::{self, Write as _};
use std::io::{self, Write as _};

use chrono::{DateTime, Local};
use serde_json::Value;
use tracing::level_filters::LevelFilter;
use tracing::Level;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::fmt::MakeWriter;

use crate::config::Config;
use crate::error::Result;
use crate::field::Field;
use crate::output::open_output;

pub const TIME_KEY: &str = "time";
pub const LEVEL_KEY: &str = "level";
pub const MESSAGE_KEY: &str = "msg";

/// One log event, fully assembled.
#[derive(Debug, Clone)]
pub struct Record<'a> {
    pub time: DateTime<Local>,
    pub level: Level,
    pub message: &'a str,
    pub fields: &'a [Field],
}

/// Destination for records.
///
/// Implementations must tolerate concurrent `emit` calls and must not
/// report write failures back to the caller.
pub trait Sink: Send + Sync {
    fn enabled(&self, level: Level) -> bool;
    fn emit(&self, record: &Record<'_>);
}

/// Line encoding chosen at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct SinkOptions {
    pub level: Level,
    pub encoding: Encoding,
    pub time_format: String,
}

impl From<&Config> for SinkOptions {
    fn from(config: &Config) -> Self {
        Self {
            level: config.level,
            encoding: if config.json_output {
                Encoding::Json
            } else {
                Encoding::Text
            },
            time_format: config.time_format.clone(),
        }
    }
}

/// Line-oriented sink over a writer factory.
pub struct StreamSink {
    writer: BoxMakeWriter,
    filter: LevelFilter,
    encoding: Encoding,
    time_format: String,
}

impl fmt::Debug for StreamSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamSink")
            .field("filter", &self.filter)
            .field("encoding", &self.encoding)
            .field("time_format", &self.time_format)
            .finish_non_exhaustive()
    }
}

impl StreamSink {
    pub fn new<W>(writer: W, options: SinkOptions) -> Self
    where
        W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
    {
        Self {
            writer: BoxMakeWriter::new(writer),
            filter: LevelFilter::from_level(options.level),
            encoding: options.encoding,
            time_format: options.time_format,
        }
    }

    /// Validate `config` and open its output.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        let writer = open_output(&config.output_path)?;
        Ok(Self::new(writer, SinkOptions::from(config)))
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Render the timestamp with the configured pattern.
    fn format_time(&self, time: &DateTime<Local>) -> String {
        let mut out = String::new();
        if write!(out, "{}", time.format(&self.time_format)).is_err() {
            out.clear();
            out.push_str(&time.to_rfc3339());
        }
        out
    }

    fn encode(&self, record: &Record<'_>) -> io::Result<Vec<u8>> {
        let time = self.format_time(&record.time);
        match self.encoding {
            Encoding::Json => encode_json(&time, record),
            Encoding::Text => Ok(encode_text(&time, record).into_bytes()),
        }
    }
}

impl Sink for StreamSink {
    fn enabled(&self, level: Level) -> bool {
        level <= self.filter
    }

    fn emit(&self, record: &Record<'_>) {
        if !self.enabled(record.level) {
            return;
        }
        let Ok(line) = self.encode(record) else { return };
        let mut writer = self.writer.make_writer();
        let _ = writer.write_all(&line);
    }
}

fn encode_json(time: &str, record: &Record<'_>) -> io::Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(128);
    buf.push(b'{');
    write_json_pair(&mut buf, TIME_KEY, &Value::from(time))?;
    buf.push(b',');
    write_json_pair(&mut buf, LEVEL_KEY, &Value::from(record.level.as_str()))?;
    buf.push(b',');
    write_json_pair(&mut buf, MESSAGE_KEY, &Value::from(record.message))?;
    // Written pair by pair so repeated keys survive.
    for field in record.fields {
        buf.push(b',');
        write_json_pair(&mut buf, &field.key, &field.value)?;
    }
    buf.extend_from_slice(b"}\n");
    Ok(buf)
}

fn write_json_pair(buf: &mut Vec<u8>, key: &str, value: &Value) -> io::Result<()> {
    serde_json::to_writer(&mut *buf, key)?;
    buf.push(b':');
    serde_json::to_writer(&mut *buf, value)?;
    Ok(())
}

fn encode_text(time: &str, record: &Record<'_>) -> String {
    let mut line = String::with_capacity(128);
    write_text_value(&mut line, TIME_KEY, time);
    line.push(' ');
    write_text_value(&mut line, LEVEL_KEY, record.level.as_str());
    line.push(' ');
    write_text_value(&mut line, MESSAGE_KEY, record.message);
    if !record.fields.is_empty() {
        line.push(' ');
        write_text_fields(&mut line, record.fields);
    }
    line.push('\n');
    line
}

/// Append `key=value` pairs separated by spaces.
pub(crate) fn write_text_fields(line: &mut String, fields: &[Field]) {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            line.push(' ');
        }
        match &field.value {
            Value::String(s) => write_text_value(line, &field.key, s),
            other => write_text_value(line, &field.key, &other.to_string()),
        }
    }
}

fn write_text_value(line: &mut String, key: &str, value: &str) {
    push_text_atom(line, key);
    line.push('=');
    push_text_atom(line, value);
}

fn push_text_atom(line: &mut String, atom: &str) {
    if needs_quoting(atom) {
        let _ = write!(line, "{atom:?}");
    } else {
        line.push_str(atom);
    }
}

fn needs_quoting(s: &str) -> bool {
    s.is_empty()
        || s
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || c == '=' || c == '"')
}
