//! Structured logging infrastructure
//!
//! Provides `env_logger`-based logging with secure handling of sensitive data
//! and proper integration with the standard log crate.

use log::{debug, error, info, warn};
use sha2::{Digest, Sha256};
use std::sync::Once;
use std::time::Duration;

static INIT_LOGGER: Once = Once::new();

/// Logging setup and secret-safe log helpers
pub struct LoggingTransformer;

impl LoggingTransformer {
    /// Initialize logging system (should be called once at application startup)
    ///
    /// Configure logging levels via `RUST_LOG` environment variable:
    /// - `RUST_LOG=debug` - Enable all debug logs, including parameter rejections
    /// - `RUST_LOG=info` - Derivation start/finish timings
    /// - `RUST_LOG=kdfbridge_scrypt=debug,kdfbridge_native=warn` - Module-specific levels
    pub fn init() {
        INIT_LOGGER.call_once(|| {
            // A host may already have installed a logger
            let _ = env_logger::Builder::from_default_env()
                .format_timestamp_micros()
                .try_init();

            info!("Structured logging initialized");
        });
    }

    /// Initialize logging for test environments
    pub fn init_test() {
        let _ = env_logger::Builder::from_default_env()
            .is_test(true)
            .try_init();
    }

    /// Secure logging of cryptographic errors
    ///
    /// Logs error types without exposing sensitive data
    pub fn log_crypto_error(operation: &str, error: &dyn std::error::Error) {
        error!(
            "Cryptographic operation failed: {} (error_type: {})",
            operation,
            std::any::type_name_of_val(error)
        );
    }

    /// Log performance metrics and timing information
    pub fn log_performance_metric(operation: &str, elapsed: Duration, success: bool) {
        let elapsed_ms = elapsed.as_millis();
        if success {
            debug!("Performance: {operation} completed in {elapsed_ms}ms");
        } else {
            warn!("Performance: {operation} failed after {elapsed_ms}ms");
        }
    }

    /// Log a derivation request without its secret inputs
    ///
    /// Only lengths and a short fingerprint of the salt are logged.
    pub fn log_derivation_request(operation: &str, salt: &[u8], password_len: usize) {
        debug!(
            "Derivation requested: {operation} (salt: {}, password_len: {password_len})",
            Self::fingerprint(salt)
        );
    }

    /// Short SHA-256 fingerprint for correlating log lines
    ///
    /// Returns `#` followed by the first 12 hex characters of the digest.
    pub fn fingerprint(data: &[u8]) -> String {
        let hash = Sha256::digest(data);
        let hex_hash = format!("{hash:x}");
        format!("#{}", &hex_hash[..12])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint() {
        LoggingTransformer::init_test();

        let hash1 = LoggingTransformer::fingerprint(b"NaCl");
        let hash2 = LoggingTransformer::fingerprint(b"SodiumChloride");

        assert_ne!(hash1, hash2);
        assert_eq!(hash1, LoggingTransformer::fingerprint(b"NaCl"));

        // '#' plus 12 hex chars
        assert!(hash1.starts_with('#'));
        assert_eq!(hash1.len(), 13);
    }

    #[test]
    fn test_logging_operations() {
        LoggingTransformer::init_test();

        LoggingTransformer::log_derivation_request("scrypt", b"salt", 8);
        LoggingTransformer::log_performance_metric("scrypt", Duration::from_millis(150), true);
        LoggingTransformer::log_crypto_error(
            "scrypt",
            &std::io::Error::other("allocation refused"),
        );
    }
}
