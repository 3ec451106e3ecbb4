//! # HIMAFI Telemetry
//!
//! Client-side telemetry pipeline for the HIMAFI career portal: an
//! analytics event collector plus a batching error/log reporter.
//!
//! ## Behavior
//!
//! - **Never in the way**: every reporting call is infallible,
//!   non-blocking, and silent about delivery failures. Losing telemetry is
//!   acceptable; breaking the host application is not.
//! - **Batched errors**: `Logger::error` appends to a FIFO queue that a
//!   background worker flushes in bounded batches. A failed flush keeps
//!   the batch at the head of the queue in order and retries with
//!   exponential backoff, dead-lettering after a bounded number of
//!   attempts.
//! - **Immediate logs and events**: `info`/`warn` lines and analytics
//!   events are sent one request each, no batching, no retry.
//! - **Run modes**: development prints records to the console instead of
//!   using the network; debug prints payloads for inspection.
//! - **Explicit lifecycle**: construct the services, `start()` the flush
//!   worker, `stop()` to drain and tear down.
//!
//! ## Opt-out
//!
//! ```bash
//! # Via environment variable
//! export HIMAFI_TELEMETRY_DISABLED=1
//!
//! # Universal opt-out
//! export DO_NOT_TRACK=1
//!
//! # Via config file (~/.himafi/config.toml)
//! [telemetry]
//! enabled = false
//! ```
//!
//! ## Usage
//!
//! ```no_run
//! use himafi_telemetry::{Analytics, ClientEnvironment, Logger, TelemetryConfig};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let config = TelemetryConfig::default();
//! let analytics = Analytics::new(config.clone(), ClientEnvironment::default());
//! let logger = Logger::new(config, analytics.clone());
//! logger.start();
//!
//! analytics.init(Some("user-42".into()));
//! logger.error("profile fetch failed", None);
//!
//! logger.stop().await;
//! # }
//! ```

pub mod analytics;
pub mod capture;
pub mod config;
pub mod events;
pub mod logger;
pub mod records;
pub mod transport;

pub use analytics::Analytics;
pub use capture::{install_panic_capture, with_error_logging, with_error_logging_async};
pub use config::{load_telemetry_config, RunMode, TelemetryConfig};
pub use events::{AuthMethod, ClientEnvironment, ContentKind, EventPayload, PageLoadTiming, PageView};
pub use logger::{Logger, TelemetryStats};
pub use records::{ErrorContext, ErrorDetail, ErrorRecord, LogLevel, LogOptions, LogRecord};
pub use transport::{HttpTransport, Transport, TransportError};

/// Re-export common result type
pub type Result<T> = anyhow::Result<T>;
