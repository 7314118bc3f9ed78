//! # scrypt key derivation with bounded working memory
//!
//! A standalone scrypt (RFC 7914) implementation for embedding behind a host
//! language binding. The emphasis is on the contract around the primitive:
//!
//! - **Validate first**: `N`, `r`, `p`, the output length and input sizes
//!   are checked against [`ScryptLimits`] before any buffer is sized from them
//! - **Owned buffers**: all working memory is heap-allocated through a
//!   [`BufferSource`](buffer::BufferSource), zeroized and released on every
//!   exit path
//! - **Typed failures**: [`ScryptError`] separates invalid parameters,
//!   allocation failures and internal failures; no partial key is ever returned
//!
//! ## Quick Start
//!
//! ```rust
//! use kdfbridge_scrypt::{DerivationRequest, ScryptKdf};
//!
//! let kdf = ScryptKdf::new();
//! let key = kdf
//!     .derive(&DerivationRequest::new(b"password", b"NaCl", 1024, 8, 1, 32))
//!     .expect("valid parameters");
//! assert_eq!(key.len(), 32);
//! ```
//!
//! Async callers go through the fluent API, which runs derivations on the
//! blocking pool one at a time:
//!
//! ```rust,ignore
//! use kdfbridge_scrypt::Kdf;
//!
//! let key = Kdf::scrypt()
//!     .with_salt(b"NaCl".to_vec())
//!     .with_cost(1024, 8, 16)
//!     .with_output_len(64)
//!     .derive(b"password".to_vec())
//!     .await?;
//! ```

#![forbid(unsafe_code)]

pub mod api;
pub mod buffer;
pub mod error;
pub mod kdf;
pub mod kdf_result;
pub mod key;
pub mod limits;
pub mod params;
pub mod request;
mod romix;
pub mod runner;
pub mod snrp;

pub use error::{Result, ScryptError, ScryptErrorKind};
pub use kdf::{ScryptKdf, derive, scrypt};
pub use kdf_result::{AsyncKdfResult, AsyncKdfResultWithHandler};
pub use key::DerivedKey;
pub use limits::ScryptLimits;
pub use params::ScryptParams;
pub use request::DerivationRequest;
pub use runner::{RunnerConfig, ScryptJob, ScryptRunner, TimedKey};
pub use snrp::{Snrp, calc_snrp_for_target};

pub use api::{Kdf, ScryptBuilder, ScryptBuilderWithHandler};

pub use kdfbridge_common::{on_error, on_result};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        DerivationRequest, DerivedKey, Kdf, Result, ScryptError, ScryptKdf, ScryptLimits,
        ScryptParams, Snrp,
    };
}
