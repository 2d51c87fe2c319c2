//! # Gateway Telemetry
//!
//! Observability for the AI Gateway.
//!
//! This crate provides:
//! - Structured logging (pretty or JSON)
//! - Distributed tracing with OpenTelemetry, optionally exported over OTLP
//! - Execution reporters that turn route step outcomes into events and spans

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod logging;
pub mod reporter;
pub mod tracing_setup;

// Re-export main types
pub use logging::{init_logging, LogFormat, LoggingConfig};
pub use reporter::{
    ExecutionReporter, NoopReporter, RecordingReporter, ReportedEvent, StepContext,
    TracingReporter,
};
pub use tracing_setup::{init_tracing, shutdown_tracing, TracingConfig, TracingError};
