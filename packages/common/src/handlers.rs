//! Common handler functions for result processing
//!
//! These functions provide the `on_result` and `on_error` symbols that all crates use

/// Default result handler that logs completion and passes the result through
pub fn on_result<T>(result: T) -> T {
    tracing::debug!("Operation completed successfully");
    result
}

/// Default error handler that logs errors before passing them through
pub fn on_error<T: std::fmt::Debug>(error: T) -> T {
    tracing::warn!("Error occurred: {error:?}");
    error
}
