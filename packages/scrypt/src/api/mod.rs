//! Fluent derivation API
//!
//! Actions take the secret as their argument:
//! `Kdf::scrypt().with_salt(salt).with_cost(n, r, p).on_result(handler).derive(password).await`

pub mod kdf_entry;
pub mod scrypt_builder;

pub use kdf_entry::Kdf;
pub use scrypt_builder::{ScryptBuilder, ScryptBuilderWithHandler};
