//! Derivation request

use kdfbridge_common::LoggingTransformer;

/// Inputs for one scrypt derivation
///
/// Borrowed for the duration of the call only; nothing here is retained.
/// Cost parameters are kept raw so that validation happens in one place,
/// inside [`ScryptKdf::derive`](crate::ScryptKdf::derive), before any buffer
/// is sized from them.
#[derive(Clone, Copy)]
pub struct DerivationRequest<'a> {
    /// Secret input, opaque bytes of any length up to the configured ceiling
    pub password: &'a [u8],
    /// Salt, opaque bytes of any length up to the configured ceiling
    pub salt: &'a [u8],
    /// CPU/memory cost `N`
    pub n: u64,
    /// Block size `r`
    pub r: u32,
    /// Parallelization `p`
    pub p: u32,
    /// Length of the derived key in bytes
    pub output_len: usize,
}

impl<'a> DerivationRequest<'a> {
    /// Request deriving `output_len` bytes from `password` and `salt`
    #[must_use]
    pub fn new(
        password: &'a [u8],
        salt: &'a [u8],
        n: u64,
        r: u32,
        p: u32,
        output_len: usize,
    ) -> Self {
        Self {
            password,
            salt,
            n,
            r,
            p,
            output_len,
        }
    }

    /// Same request with the cost taken from validated parameters
    #[must_use]
    pub fn with_params(mut self, params: &crate::ScryptParams) -> Self {
        self.n = params.n();
        self.r = params.r();
        self.p = params.p();
        self
    }
}

impl std::fmt::Debug for DerivationRequest<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivationRequest")
            .field("password_len", &self.password.len())
            .field("salt", &LoggingTransformer::fingerprint(self.salt))
            .field("n", &self.n)
            .field("r", &self.r)
            .field("p", &self.p)
            .field("output_len", &self.output_len)
            .finish()
    }
}
