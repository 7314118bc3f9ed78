//! Common infrastructure shared by the kdfbridge crates
//!
//! This crate provides:
//! - `env_logger` setup and secret-safe logging helpers
//! - Default `on_result` / `on_error` pass-through handlers
//! - The [`NotResult`] marker used by async result handlers

#![forbid(unsafe_code)]

pub mod handlers;
pub mod logging;
pub mod traits;

pub use handlers::{on_error, on_result};
pub use logging::LoggingTransformer;
pub use traits::NotResult;
