//! Error batching and structured logging
//!
//! `Logger` decouples error production from network delivery. `error()`
//! appends to an in-process queue that a background worker flushes in FIFO
//! batches of at most `batch_size`; a failed flush puts the batch back at
//! the head of the queue in its original order and retries with exponential
//! backoff, dead-lettering the batch after `max_retries` attempts so a
//! permanently failing payload cannot starve newer records.
//!
//! `info()` and `warn()` are not queued: in development they print to the
//! console, otherwise each call issues one independent network request.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use serde_json::{Map, Value};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep_until, Duration, Instant, MissedTickBehavior};

use crate::analytics::Analytics;
use crate::config::TelemetryConfig;
use crate::records::{ErrorContext, ErrorDetail, ErrorRecord, LogLevel, LogOptions, LogRecord};
use crate::transport::{HttpTransport, Transport, TransportError};

/// Counters describing what the pipeline has done so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TelemetryStats {
    /// Error records accepted into the queue
    pub enqueued: u64,
    /// Error records confirmed delivered
    pub delivered: u64,
    /// Failed flush attempts that were rescheduled
    pub retried: u64,
    /// Error records dropped after exhausting retries or at shutdown
    pub dropped: u64,
}

#[derive(Default)]
struct StatCounters {
    enqueued: AtomicU64,
    delivered: AtomicU64,
    retried: AtomicU64,
    dropped: AtomicU64,
}

/// State shared between the handle and the flush worker.
struct Shared {
    config: TelemetryConfig,
    transport: Arc<dyn Transport>,
    stats: StatCounters,
}

/// Batching logger for the career portal front end.
///
/// Explicitly constructed and cloned into call sites. `start` spawns the
/// flush worker; `stop` tears it down after a final drain, so the service
/// can be shut down cleanly in server and test environments. All reporting
/// methods are infallible and non-blocking.
#[derive(Clone)]
pub struct Logger {
    inner: Arc<LoggerInner>,
}

struct LoggerInner {
    shared: Arc<Shared>,
    analytics: Analytics,
    tx: mpsc::UnboundedSender<ErrorRecord>,
    // Taken by the first start() call.
    rx: Mutex<Option<mpsc::UnboundedReceiver<ErrorRecord>>>,
    shutdown: watch::Sender<bool>,
    worker: Mutex<Option<JoinHandle<()>>>,
    timers: Mutex<HashMap<String, std::time::Instant>>,
}

impl Logger {
    /// Logger delivering over HTTP per the config's endpoints.
    pub fn new(config: TelemetryConfig, analytics: Analytics) -> Self {
        let transport = Arc::new(HttpTransport::new(&config));
        Self::with_transport(config, analytics, transport)
    }

    /// Construct with an injected transport (tests, alternative sinks).
    pub fn with_transport(
        config: TelemetryConfig,
        analytics: Analytics,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let (shutdown, _) = watch::channel(false);

        Self {
            inner: Arc::new(LoggerInner {
                shared: Arc::new(Shared {
                    config,
                    transport,
                    stats: StatCounters::default(),
                }),
                analytics,
                tx,
                rx: Mutex::new(Some(rx)),
                shutdown,
                worker: Mutex::new(None),
                timers: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Spawn the background flush worker. Must be called from within a
    /// tokio runtime; repeated calls are no-ops.
    pub fn start(&self) {
        let mut worker = self.inner.worker.lock().unwrap();
        if worker.is_some() {
            return;
        }
        let Some(rx) = self.inner.rx.lock().unwrap().take() else {
            return;
        };
        let shared = Arc::clone(&self.inner.shared);
        let shutdown = self.inner.shutdown.subscribe();
        *worker = Some(tokio::spawn(run_worker(shared, rx, shutdown)));
    }

    /// Signal shutdown, wait for the worker to drain the queue with a final
    /// best-effort flush pass, and join it. Records reported after this
    /// call are dropped silently.
    pub async fn stop(&self) {
        let _ = self.inner.shutdown.send(true);
        let handle = self.inner.worker.lock().unwrap().take();
        if let Some(handle) = handle {
            if handle.await.is_err() {
                tracing::warn!("telemetry flush worker panicked during shutdown");
            }
        }
    }

    /// Report an error: enqueue it for a batched flush and forward it to
    /// the analytics collector for metrics. Never blocks, never fails.
    pub fn error(&self, error: impl Into<ErrorDetail>, context: Option<ErrorContext>) {
        if !self.inner.shared.config.enabled {
            return;
        }

        let detail = error.into();
        let mut context = context.unwrap_or_default();
        context.timestamp = Some(Utc::now());

        let record = ErrorRecord {
            error: detail.clone(),
            context: Some(context.clone()),
        };
        if self.inner.tx.send(record).is_ok() {
            self.inner.shared.stats.enqueued.fetch_add(1, Ordering::Relaxed);
        }

        self.inner.analytics.track_error(&detail, Some(&context));

        // Log immediately in development
        if self.inner.shared.config.is_development() {
            eprintln!("Error: {}", detail.message);
            if let Some(stack) = &detail.stack {
                eprintln!("{stack}");
            }
            if let Ok(context) = serde_json::to_string(&context) {
                eprintln!("Context: {context}");
            }
        }
    }

    pub fn info(&self, message: impl Into<String>, options: LogOptions) {
        self.log(LogLevel::Info, message, options);
    }

    pub fn warn(&self, message: impl Into<String>, options: LogOptions) {
        self.log(LogLevel::Warn, message, options);
    }

    /// Format-and-log immediately; log lines are never queued.
    fn log(&self, level: LogLevel, message: impl Into<String>, options: LogOptions) {
        let config = &self.inner.shared.config;
        if !config.enabled {
            return;
        }

        let record = LogRecord::new(level, message, options);

        if config.is_development() || config.debug {
            let mut line = format!(
                "[{}] {}: {}",
                record.timestamp.to_rfc3339(),
                record.level.as_str().to_uppercase(),
                record.message
            );
            if let Some(context) = &record.context {
                line.push_str(&format!("\nContext: {}", Value::Object(context.clone())));
            }
            if let Some(tags) = &record.tags {
                line.push_str(&format!("\nTags: {}", tags.join(", ")));
            }
            eprintln!("{line}");
            return;
        }

        // One fire-and-forget request per line; failure only surfaces as a
        // diagnostic.
        let shared = Arc::clone(&self.inner.shared);
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                if let Err(err) = shared.transport.send_log(&record).await {
                    tracing::warn!(error = %err, "failed to send log line");
                }
            });
        } else {
            tracing::debug!("no async runtime; log line dropped");
        }
    }

    /// Start a named wall-clock timer.
    pub fn start_timer(&self, label: &str) {
        self.inner
            .timers
            .lock()
            .unwrap()
            .insert(label.to_string(), std::time::Instant::now());
    }

    /// Finish a named timer and log its duration with a `performance` tag.
    /// A label without a matching `start_timer` is ignored.
    pub fn end_timer(&self, label: &str) {
        let started = self.inner.timers.lock().unwrap().remove(label);
        let Some(started) = started else {
            return;
        };
        let duration_ms = started.elapsed().as_millis() as u64;

        let mut context = Map::new();
        context.insert("durationMs".to_string(), Value::from(duration_ms));
        self.info(
            format!("Performance: {label} took {duration_ms}ms"),
            LogOptions::default()
                .with_context(context)
                .with_tags(["performance"]),
        );
    }

    /// Log current system memory figures with a `memory` tag.
    pub fn log_memory_usage(&self) {
        let mut system = sysinfo::System::new();
        system.refresh_memory();

        let mut context = Map::new();
        context.insert(
            "totalMemoryBytes".to_string(),
            Value::from(system.total_memory()),
        );
        context.insert(
            "usedMemoryBytes".to_string(),
            Value::from(system.used_memory()),
        );
        context.insert(
            "availableMemoryBytes".to_string(),
            Value::from(system.available_memory()),
        );
        self.info(
            "Memory usage",
            LogOptions::default()
                .with_context(context)
                .with_tags(["memory"]),
        );
    }

    /// Snapshot of the pipeline counters.
    pub fn stats(&self) -> TelemetryStats {
        let stats = &self.inner.shared.stats;
        TelemetryStats {
            enqueued: stats.enqueued.load(Ordering::Relaxed),
            delivered: stats.delivered.load(Ordering::Relaxed),
            retried: stats.retried.load(Ordering::Relaxed),
            dropped: stats.dropped.load(Ordering::Relaxed),
        }
    }
}

/// The flush worker. Owns the queue outright: at most one flush is ever in
/// flight because delivery is awaited inline, and appends that race with an
/// in-flight flush sit in the channel until the next loop turn.
async fn run_worker(
    shared: Arc<Shared>,
    mut rx: mpsc::UnboundedReceiver<ErrorRecord>,
    mut shutdown: watch::Receiver<bool>,
) {
    let batch_size = shared.config.batch_size.max(1);
    let mut queue: VecDeque<ErrorRecord> = VecDeque::new();

    // First tick a full period out; an immediate tick would flush a
    // partial batch right at startup.
    let period = Duration::from_millis(shared.config.batch_timeout_ms.max(1));
    let mut tick = interval_at(Instant::now() + period, period);
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    // Retry pacing for the batch currently at the head of the queue.
    let mut failures: u32 = 0;
    let mut backoff_until: Option<Instant> = None;

    loop {
        let in_backoff = backoff_until.is_some();
        tokio::select! {
            maybe = rx.recv() => match maybe {
                Some(record) => {
                    queue.push_back(record);
                    if queue.len() >= batch_size && !in_backoff {
                        flush_pending(&shared, batch_size, &mut queue, &mut failures, &mut backoff_until).await;
                    }
                }
                // All senders gone: nothing more can arrive.
                None => break,
            },
            _ = tick.tick() => {
                if !queue.is_empty() && !in_backoff {
                    flush_pending(&shared, batch_size, &mut queue, &mut failures, &mut backoff_until).await;
                }
            }
            _ = sleep_until(backoff_until.unwrap_or_else(Instant::now)), if in_backoff => {
                backoff_until = None;
                if !queue.is_empty() {
                    flush_pending(&shared, batch_size, &mut queue, &mut failures, &mut backoff_until).await;
                }
            }
            _ = shutdown.changed() => break,
        }
    }

    drain(&shared, batch_size, &mut rx, &mut queue).await;
}

/// Flush the head batch, then keep going while a full batch remains and the
/// last attempt succeeded.
async fn flush_pending(
    shared: &Shared,
    batch_size: usize,
    queue: &mut VecDeque<ErrorRecord>,
    failures: &mut u32,
    backoff_until: &mut Option<Instant>,
) {
    loop {
        flush_once(shared, batch_size, queue, failures, backoff_until).await;
        if backoff_until.is_some() || queue.len() < batch_size {
            break;
        }
    }
}

async fn flush_once(
    shared: &Shared,
    batch_size: usize,
    queue: &mut VecDeque<ErrorRecord>,
    failures: &mut u32,
    backoff_until: &mut Option<Instant>,
) {
    let take = queue.len().min(batch_size);
    let batch: Vec<ErrorRecord> = queue.drain(..take).collect();

    match deliver(shared, &batch).await {
        Ok(()) => {
            *failures = 0;
            shared
                .stats
                .delivered
                .fetch_add(batch.len() as u64, Ordering::Relaxed);
        }
        Err(err) => {
            *failures += 1;
            if *failures >= shared.config.max_retries.max(1) {
                shared
                    .stats
                    .dropped
                    .fetch_add(batch.len() as u64, Ordering::Relaxed);
                tracing::warn!(
                    error = %err,
                    count = batch.len(),
                    attempts = *failures,
                    "dropping error batch after repeated delivery failures"
                );
                *failures = 0;
            } else {
                // Put the failed items back at the front, order preserved.
                for record in batch.into_iter().rev() {
                    queue.push_front(record);
                }
                let exponent = (*failures - 1).min(16);
                let delay_ms = shared
                    .config
                    .retry_base_delay_ms
                    .saturating_mul(1 << exponent)
                    .min(60_000);
                *backoff_until = Some(Instant::now() + Duration::from_millis(delay_ms));
                shared.stats.retried.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    error = %err,
                    attempt = *failures,
                    retry_in_ms = delay_ms,
                    "error batch delivery failed; will retry"
                );
            }
        }
    }
}

async fn deliver(shared: &Shared, batch: &[ErrorRecord]) -> Result<(), TransportError> {
    if shared.config.is_development() || shared.config.debug {
        // Print instead of sending; counts as delivered.
        eprintln!("Error batch ({} records):", batch.len());
        for record in batch {
            eprintln!("  {}", serde_json::to_string(record).unwrap_or_default());
        }
        return Ok(());
    }
    shared.transport.send_error_batch(batch).await
}

/// Final shutdown pass: pick up records already sitting in the channel and
/// flush the remainder one attempt per batch, dropping whatever fails.
async fn drain(
    shared: &Shared,
    batch_size: usize,
    rx: &mut mpsc::UnboundedReceiver<ErrorRecord>,
    queue: &mut VecDeque<ErrorRecord>,
) {
    while let Ok(record) = rx.try_recv() {
        queue.push_back(record);
    }

    while !queue.is_empty() {
        let take = queue.len().min(batch_size);
        let batch: Vec<ErrorRecord> = queue.drain(..take).collect();
        match deliver(shared, &batch).await {
            Ok(()) => {
                shared
                    .stats
                    .delivered
                    .fetch_add(batch.len() as u64, Ordering::Relaxed);
            }
            Err(err) => {
                let lost = batch.len() + queue.len();
                shared.stats.dropped.fetch_add(lost as u64, Ordering::Relaxed);
                tracing::warn!(
                    error = %err,
                    count = lost,
                    "dropping undelivered error records at shutdown"
                );
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::ClientEnvironment;

    fn quiet_config() -> TelemetryConfig {
        TelemetryConfig {
            debug: true,
            ..TelemetryConfig::default()
        }
    }

    fn logger() -> Logger {
        let config = quiet_config();
        let analytics = Analytics::new(config.clone(), ClientEnvironment::default());
        Logger::new(config, analytics)
    }

    #[tokio::test]
    async fn stats_start_at_zero() {
        let logger = logger();
        assert_eq!(logger.stats(), TelemetryStats::default());
    }

    #[tokio::test]
    async fn error_counts_enqueued() {
        let logger = logger();
        logger.error("boom", None);
        logger.error(anyhow::anyhow!("bang"), Some(ErrorContext::for_action("test")));
        assert_eq!(logger.stats().enqueued, 2);
    }

    #[tokio::test]
    async fn disabled_logger_accepts_nothing() {
        let config = TelemetryConfig {
            enabled: false,
            ..TelemetryConfig::default()
        };
        let analytics = Analytics::new(config.clone(), ClientEnvironment::default());
        let logger = Logger::new(config, analytics);
        logger.error("boom", None);
        logger.info("hello", LogOptions::default());
        assert_eq!(logger.stats().enqueued, 0);
    }

    #[tokio::test]
    async fn end_timer_without_start_is_ignored() {
        let logger = logger();
        logger.end_timer("never-started");
    }

    #[tokio::test]
    async fn timer_round_trip() {
        let logger = logger();
        logger.start_timer("load");
        logger.end_timer("load");
        // A second end on the same label must be a no-op.
        logger.end_timer("load");
    }

    #[tokio::test]
    async fn start_twice_is_idempotent() {
        let logger = logger();
        logger.start();
        logger.start();
        logger.stop().await;
        // After stop, a fresh start has no receiver left and must not spawn.
        logger.start();
        logger.error("late", None);
    }
}
