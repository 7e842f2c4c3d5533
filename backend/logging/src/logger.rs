//! Logger facade
//!
//! A [`Logger`] owns a [`Handle`] to a sink plus its service default fields.
//! Derivation (`with`, `with_error`, `with_context`) returns a new value and
//! never touches the receiver. Fields reach a record in this order: fields
//! bound on the handle, the caller's arguments, then the default fields.

use std::fmt;
use std::sync::Arc;

use chrono::Local;
use serde_json::Value;
use tracing::Level;

use crate::config::Config;
use crate::context::{TraceContext, TRACE_ID_KEY};
use crate::error::Result;
use crate::field::{fields_from_args, Field};
use crate::sink::{Record, Sink, StreamSink};

/// Key of the default field carrying the service name.
pub const SERVICE_KEY: &str = "service";

/// Key used by [`Logger::with_error`].
pub const ERROR_KEY: &str = "error";

/// A sink together with the fields bound to it by derivation.
#[derive(Clone)]
pub struct Handle {
    sink: Arc<dyn Sink>,
    bound: Arc<[Field]>,
}

impl Handle {
    pub fn new(sink: Arc<dyn Sink>) -> Self {
        Self {
            sink,
            bound: Arc::from(Vec::<Field>::new()),
        }
    }

    /// New handle carrying this handle's fields followed by `fields`.
    pub fn with(&self, fields: Vec<Field>) -> Self {
        if fields.is_empty() {
            return self.clone();
        }
        let mut bound = Vec::with_capacity(self.bound.len() + fields.len());
        bound.extend_from_slice(&self.bound);
        bound.extend(fields);
        Self {
            sink: Arc::clone(&self.sink),
            bound: bound.into(),
        }
    }

    pub fn bound(&self) -> &[Field] {
        &self.bound
    }

    pub fn enabled(&self, level: Level) -> bool {
        self.sink.enabled(level)
    }

    /// Emit a record with the bound fields placed before `fields`.
    pub fn emit(&self, level: Level, message: &str, fields: &[Field]) {
        if !self.enabled(level) {
            return;
        }
        let mut all = Vec::with_capacity(self.bound.len() + fields.len());
        all.extend_from_slice(&self.bound);
        all.extend_from_slice(fields);
        self.sink.emit(&Record {
            time: Local::now(),
            level,
            message,
            fields: &all,
        });
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("bound", &self.bound)
            .finish_non_exhaustive()
    }
}

/// Structured logger with service-wide default fields.
#[derive(Debug, Clone)]
pub struct Logger {
    handle: Handle,
    default_fields: Arc<[Field]>,
}

impl Logger {
    /// Build a root logger from `config`.
    ///
    /// Fails if the config is invalid or the output file cannot be opened.
    pub fn new(config: Config) -> Result<Self> {
        let sink = StreamSink::from_config(&config)?;
        tracing::debug!(
            output = %config.output_path,
            level = %config.level,
            json = config.json_output,
            service = %config.service_name,
            "Logger initialized"
        );
        Ok(Self::from_sink(Arc::new(sink), config.service_name))
    }

    /// Root logger over an existing sink.
    pub fn from_sink(sink: Arc<dyn Sink>, service_name: impl Into<String>) -> Self {
        let service_name: String = service_name.into();
        Self {
            handle: Handle::new(sink),
            default_fields: Arc::from(vec![Field::new(SERVICE_KEY, service_name)]),
        }
    }

    /// Derive a logger with `fields` (flat key/value list) bound to its handle.
    ///
    /// The default fields are shared with the receiver unchanged.
    pub fn with(&self, fields: &[Value]) -> Logger {
        Logger {
            handle: self.handle.with(fields_from_args(fields)),
            default_fields: Arc::clone(&self.default_fields),
        }
    }

    /// Derive a logger carrying `error=<err>`, or return the receiver for `None`.
    pub fn with_error(&self, err: Option<&dyn std::error::Error>) -> Logger {
        match err {
            Some(err) => self.with(&[Value::from(ERROR_KEY), Value::from(err.to_string())]),
            None => self.clone(),
        }
    }

    /// Derive a logger carrying the context's `trace_id`, if it has one.
    pub fn with_context<C: TraceContext + ?Sized>(&self, ctx: &C) -> Logger {
        match ctx.trace_id() {
            Some(trace_id) => self.with(&[Value::from(TRACE_ID_KEY), Value::from(trace_id)]),
            None => self.clone(),
        }
    }

    pub fn enabled(&self, level: Level) -> bool {
        self.handle.enabled(level)
    }

    pub fn default_fields(&self) -> &[Field] {
        &self.default_fields
    }

    pub fn bound_fields(&self) -> &[Field] {
        self.handle.bound()
    }

    pub fn debug(&self, msg: &str, args: &[Value]) {
        self.log(Level::DEBUG, msg, args);
    }

    pub fn info(&self, msg: &str, args: &[Value]) {
        self.log(Level::INFO, msg, args);
    }

    pub fn warn(&self, msg: &str, args: &[Value]) {
        self.log(Level::WARN, msg, args);
    }

    pub fn error(&self, msg: &str, args: &[Value]) {
        self.log(Level::ERROR, msg, args);
    }

    /// Emit at `level`; caller args first, then the default fields.
    pub fn log(&self, level: Level, msg: &str, args: &[Value]) {
        if !self.handle.enabled(level) {
            return;
        }
        let mut fields = fields_from_args(args);
        fields.extend_from_slice(&self.default_fields);
        self.handle.emit(level, msg, &fields);
    }
}
