//! Shared test support: an in-memory transport with controllable failures

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::time::Duration;

use himafi_telemetry::{
    Analytics, ClientEnvironment, ErrorRecord, EventPayload, LogRecord, Logger, TelemetryConfig,
    Transport, TransportError,
};

#[derive(Default)]
pub struct MockTransport {
    /// Successfully delivered error batches
    pub batches: Mutex<Vec<Vec<ErrorRecord>>>,
    /// Every delivery attempt, successful or not, as record messages
    pub attempts: Mutex<Vec<Vec<String>>>,
    pub logs: Mutex<Vec<LogRecord>>,
    pub events: Mutex<Vec<EventPayload>>,
    /// Fail this many upcoming batch sends
    pub fail_next: AtomicUsize,
    pub always_fail: AtomicBool,
    /// Artificial delivery latency in milliseconds
    pub delay_ms: AtomicUsize,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl MockTransport {
    pub fn delivered_messages(&self) -> Vec<Vec<String>> {
        self.batches
            .lock()
            .unwrap()
            .iter()
            .map(|batch| messages(batch))
            .collect()
    }
}

pub fn messages(batch: &[ErrorRecord]) -> Vec<String> {
    batch.iter().map(|r| r.error.message.clone()).collect()
}

#[async_trait]
impl Transport for MockTransport {
    async fn send_error_batch(&self, errors: &[ErrorRecord]) -> Result<(), TransportError> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        self.attempts.lock().unwrap().push(messages(errors));

        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay as u64)).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.always_fail.load(Ordering::SeqCst) {
            return Err(TransportError::Status(500));
        }
        let remaining = self.fail_next.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_next.store(remaining - 1, Ordering::SeqCst);
            return Err(TransportError::Status(500));
        }

        self.batches.lock().unwrap().push(errors.to_vec());
        Ok(())
    }

    async fn send_log(&self, record: &LogRecord) -> Result<(), TransportError> {
        self.logs.lock().unwrap().push(record.clone());
        Ok(())
    }

    async fn send_event(&self, event: &EventPayload) -> Result<(), TransportError> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

/// Logger + collector wired to one shared mock transport, production mode.
pub fn telemetry_with_mock(config: TelemetryConfig) -> (Logger, Analytics, Arc<MockTransport>) {
    let mock = Arc::new(MockTransport::default());
    let analytics = Analytics::with_transport(
        config.clone(),
        ClientEnvironment::default(),
        mock.clone(),
    );
    let logger = Logger::with_transport(config, analytics.clone(), mock.clone());
    (logger, analytics, mock)
}
