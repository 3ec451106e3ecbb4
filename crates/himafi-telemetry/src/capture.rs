//! Global capture: panics and error-returning call sites
//!
//! The hosted UI funnels every uncaught failure through the logger. The
//! process-wide analog is a panic hook; for recoverable failures the
//! wrappers below record an `Err` before handing it back to the caller.

use std::future::Future;
use std::panic;

use serde_json::{Map, Value};

use crate::logger::Logger;
use crate::records::{ErrorContext, ErrorDetail};

/// Route panics through [`Logger::error`], chaining the previously
/// installed hook. Call once, after the logger is started.
pub fn install_panic_capture(logger: &Logger) {
    let logger = logger.clone();
    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        let message = if let Some(s) = info.payload().downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "panic with non-string payload".to_string()
        };

        let mut metadata = Map::new();
        if let Some(location) = info.location() {
            metadata.insert("file".to_string(), Value::from(location.file()));
            metadata.insert("line".to_string(), Value::from(location.line()));
            metadata.insert("column".to_string(), Value::from(location.column()));
        }

        logger.error(
            ErrorDetail::new(message),
            Some(ErrorContext::for_action("uncaught_panic").with_metadata(metadata)),
        );

        previous(info);
    }));
}

/// Run a closure, reporting an `Err` to the logger before returning it.
pub fn with_error_logging<T, E, F>(logger: &Logger, action: &str, f: F) -> Result<T, E>
where
    E: std::fmt::Display,
    F: FnOnce() -> Result<T, E>,
{
    let result = f();
    if let Err(err) = &result {
        logger.error(
            ErrorDetail::new(err.to_string()),
            Some(ErrorContext::for_action(action)),
        );
    }
    result
}

/// Await a future, reporting an `Err` to the logger before returning it.
pub async fn with_error_logging_async<T, E, Fut>(
    logger: &Logger,
    action: &str,
    fut: Fut,
) -> Result<T, E>
where
    E: std::fmt::Display,
    Fut: Future<Output = Result<T, E>>,
{
    let result = fut.await;
    if let Err(err) = &result {
        logger.error(
            ErrorDetail::new(err.to_string()),
            Some(ErrorContext::for_action(action)),
        );
    }
    result
}
