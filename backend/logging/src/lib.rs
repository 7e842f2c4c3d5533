//! Structured logging facade for Sentinel services.
//!
//! Resolves a [`Config`] into a line-oriented sink (text or JSON, stdout,
//! stderr or an append-only file) and wraps it in a [`Logger`] that carries
//! service default fields and derives child loggers with extra context.
//!
//! ```no_run
//! use sentinel::{kv, Config, Logger, RequestContext};
//!
//! let log = Logger::new(Config::default())?;
//! log.with(&kv!["env", "prod"]).info("Server starting", &kv!["port", 8080]);
//!
//! let ctx = RequestContext::new().with_trace_id("abc-123");
//! log.with_context(&ctx).info("Processing request", &[]);
//! # Ok::<(), sentinel::Error>(())
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod field;
pub mod logger;
pub mod output;
pub mod sink;
pub mod subscriber;

pub use config::{Config, RFC3339};
pub use context::{RequestContext, TraceContext};
pub use error::{Error, Result};
pub use field::{Field, BAD_KEY};
pub use logger::{Handle, Logger};
pub use output::OutputPath;
pub use serde_json::Value;
pub use sink::{Encoding, Record, Sink, SinkOptions, StreamSink};
pub use subscriber::{init_tracing, TracingSink};
pub use tracing::Level;
