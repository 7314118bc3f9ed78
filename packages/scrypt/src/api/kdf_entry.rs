//! Entry point for the fluent API

use super::ScryptBuilder;

/// Entry point for key derivations
pub struct Kdf;

impl Kdf {
    /// Start an scrypt derivation
    #[must_use]
    pub fn scrypt() -> ScryptBuilder {
        ScryptBuilder::new()
    }
}
