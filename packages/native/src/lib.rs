//! # Host runtime boundary for scrypt
//!
//! The surface a foreign runtime binds to:
//!
//! - [`scrypt`]: the typed call. Returns exactly `dk_len` fresh bytes or a
//!   [`NativeError`]; invalid input and panics never cross the boundary
//! - [`NativeModule`]: method-name dispatch over JSON arguments with base64
//!   binary data, for hosts that marshal calls as strings
//!
//! ```rust
//! use kdfbridge_native::{NativeErrorKind, scrypt};
//!
//! let key = scrypt(b"password", b"NaCl", 1024, 8, 1, 32).expect("valid parameters");
//! assert_eq!(key.len(), 32);
//!
//! let err = scrypt(b"password", b"NaCl", 1000, 8, 1, 32).unwrap_err();
//! assert_eq!(err.kind, NativeErrorKind::InvalidParameter);
//! ```

#![forbid(unsafe_code)]

pub mod bridge;
pub mod call;
pub mod error;

pub use bridge::{scrypt, scrypt_with};
pub use call::{MAX_RANDOM_BYTES, NativeMethod, NativeModule, NativeResponse, ScryptArgs};
pub use error::{NativeError, NativeErrorKind, Result};
