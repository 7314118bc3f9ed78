//! The typed boundary call
//!
//! Everything a host passes in is untrusted: lengths come from the caller and
//! the cost parameters may be hostile. [`scrypt`] validates through
//! [`ScryptKdf`], never lets a panic unwind into the host and never returns a
//! partial buffer. Failure is always the `Err` arm, so an all-zero key can
//! not be mistaken for an error.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use kdfbridge_common::LoggingTransformer;
use kdfbridge_scrypt::{DerivationRequest, DerivedKey, ScryptError, ScryptErrorKind, ScryptKdf};
use log::Level;

use crate::{NativeError, NativeErrorKind, Result};

/// `scrypt(password, salt, N, r, p, dkLen)` with default limits
///
/// Returns a fresh buffer of exactly `dk_len` bytes.
///
/// # Errors
///
/// - [`NativeErrorKind::InvalidParameter`] for invalid `N`, `r`, `p` or
///   `dk_len`, before any working memory is requested
/// - [`NativeErrorKind::AllocationFailure`] if working memory is refused
/// - [`NativeErrorKind::InternalFailure`] for anything else, including a
///   panic inside the primitive
pub fn scrypt(
    password: &[u8],
    salt: &[u8],
    n: u32,
    r: u32,
    p: u32,
    dk_len: u32,
) -> Result<Vec<u8>> {
    scrypt_with(&ScryptKdf::new(), password, salt, n, r, p, dk_len)
}

/// [`scrypt`] through a caller-configured `kdf`
///
/// # Errors
///
/// See [`scrypt`].
pub fn scrypt_with(
    kdf: &ScryptKdf,
    password: &[u8],
    salt: &[u8],
    n: u32,
    r: u32,
    p: u32,
    dk_len: u32,
) -> Result<Vec<u8>> {
    let output_len = usize::try_from(dk_len).map_err(|_| {
        NativeError::new(
            NativeErrorKind::InvalidParameter,
            format!("output length {dk_len} exceeds the address space"),
        )
    })?;
    let request = DerivationRequest::new(password, salt, u64::from(n), r, p, output_len);

    let derived = panic::catch_unwind(AssertUnwindSafe(|| kdf.derive(&request)))
        .map_err(|payload| {
            let message = panic_message(payload.as_ref());
            log::error!("scrypt panicked: {message}");
            NativeError::internal_failure(format!("scrypt panicked: {message}"))
        })?;

    derived.map(DerivedKey::into_vec).map_err(|e| {
        match failure_level(&e) {
            Level::Error => LoggingTransformer::log_crypto_error("scrypt", &e),
            level => log::log!(level, "scrypt rejected: {e}"),
        }
        NativeError::from(e)
    })
}

/// Rejected input is the caller's problem and must not flood error logs
fn failure_level(error: &ScryptError) -> Level {
    match error.kind() {
        ScryptErrorKind::InvalidParameter => Level::Debug,
        ScryptErrorKind::AllocationFailure | ScryptErrorKind::Internal => Level::Error,
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}
