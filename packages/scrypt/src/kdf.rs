//! The scrypt key derivation entry points

use std::sync::Arc;

use kdfbridge_common::LoggingTransformer;
use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;

use crate::buffer::{BufferSource, SystemBuffers, WorkBuffer};
use crate::{DerivationRequest, DerivedKey, Result, ScryptError, ScryptLimits, ScryptParams, romix};

/// Buffer sizes for one derivation, computed from validated inputs only
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MixLayout {
    pub(crate) params: ScryptParams,
    /// `128 * r` bytes
    pub(crate) block_bytes: usize,
    /// `p * 128 * r` bytes, the PBKDF2-expanded `B`
    pub(crate) expanded_bytes: usize,
    /// `N * 32 * r` words, the ROMix table `V`
    pub(crate) table_words: usize,
    /// `64 * r` words, `X` and `Y`
    pub(crate) scratch_words: usize,
    pub(crate) output_len: usize,
}

impl MixLayout {
    /// Validate `request` against `limits` and size every buffer
    ///
    /// Runs before anything is allocated. All arithmetic is checked, so an
    /// oversized request fails here instead of wrapping into a small
    /// allocation.
    pub(crate) fn plan(request: &DerivationRequest<'_>, limits: &ScryptLimits) -> Result<Self> {
        let params = ScryptParams::new(request.n, request.r, request.p)?;

        if request.output_len == 0 {
            return Err(ScryptError::invalid_parameter(
                "output length must be greater than 0",
            ));
        }
        if request.output_len as u64 > limits.output_bound() {
            return Err(ScryptError::invalid_parameter(format!(
                "output length {} exceeds the maximum of {}",
                request.output_len,
                limits.output_bound()
            )));
        }
        for (name, input) in [("password", request.password), ("salt", request.salt)] {
            if input.len() as u64 > limits.max_input_len {
                return Err(ScryptError::invalid_parameter(format!(
                    "{name} length {} exceeds the maximum of {}",
                    input.len(),
                    limits.max_input_len
                )));
            }
        }

        let rp = u64::from(params.r()) * u64::from(params.p());
        if rp >= limits.rp_bound() {
            return Err(ScryptError::invalid_parameter(format!(
                "r * p = {rp} exceeds the configured bound of {}",
                limits.rp_bound()
            )));
        }

        // The output buffer comes from the same source as the mixing state
        let working_set = params
            .working_set_bytes()
            .and_then(|bytes| bytes.checked_add(request.output_len as u64))
            .ok_or_else(|| ScryptError::invalid_parameter("working set size overflows 64 bits"))?;
        if working_set > limits.max_memory_bytes {
            return Err(ScryptError::invalid_parameter(format!(
                "working set of {working_set} bytes exceeds the maximum of {}",
                limits.max_memory_bytes
            )));
        }

        let too_large =
            || ScryptError::invalid_parameter("working set exceeds the address space");
        let r = usize::try_from(params.r()).map_err(|_| too_large())?;
        let p = usize::try_from(params.p()).map_err(|_| too_large())?;
        let n = usize::try_from(params.n()).map_err(|_| too_large())?;

        let block_bytes = r.checked_mul(128).ok_or_else(too_large)?;
        let block_words = block_bytes / 4;
        let expanded_bytes = block_bytes.checked_mul(p).ok_or_else(too_large)?;
        let table_words = block_words.checked_mul(n).ok_or_else(too_large)?;
        // The table must also be addressable in bytes
        table_words.checked_mul(4).ok_or_else(too_large)?;
        let scratch_words = block_words.checked_mul(2).ok_or_else(too_large)?;

        Ok(Self {
            params,
            block_bytes,
            expanded_bytes,
            table_words,
            scratch_words,
            output_len: request.output_len,
        })
    }
}

/// scrypt key derivation with bounded, owned working memory
///
/// Each call validates its request against the configured [`ScryptLimits`],
/// then acquires exactly the buffers the algorithm needs from the configured
/// [`BufferSource`]:
///
/// | buffer | size |
/// |--------|------|
/// | `B`    | `p * 128 * r` bytes |
/// | `V`    | `N * 128 * r` bytes |
/// | `X, Y` | `256 * r` bytes |
/// | output | `output_len` bytes |
///
/// All of them are zeroized and released on every exit path. The call is
/// synchronous and CPU/memory bound; run it off latency-sensitive threads
/// (see [`ScryptRunner`](crate::ScryptRunner)).
#[derive(Clone)]
pub struct ScryptKdf {
    limits: ScryptLimits,
    source: Arc<dyn BufferSource>,
}

impl ScryptKdf {
    /// Derivation with [`ScryptLimits::DEFAULT`] and no memory accounting
    #[must_use]
    pub fn new() -> Self {
        Self {
            limits: ScryptLimits::DEFAULT,
            source: Arc::new(SystemBuffers),
        }
    }

    /// Replace the resource ceilings
    #[must_use]
    pub fn with_limits(mut self, limits: ScryptLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Draw working memory through `source`
    #[must_use]
    pub fn with_buffer_source(mut self, source: Arc<dyn BufferSource>) -> Self {
        self.source = source;
        self
    }

    /// Configured ceilings
    #[must_use]
    pub fn limits(&self) -> &ScryptLimits {
        &self.limits
    }

    /// Derive a key
    ///
    /// Deterministic: identical requests produce identical keys.
    ///
    /// # Errors
    ///
    /// - [`ScryptError::InvalidParameter`] if `N`, `r`, `p`, the output
    ///   length or an input length is invalid or over a configured ceiling;
    ///   no buffer has been requested at that point
    /// - [`ScryptError::AllocationFailure`] if working memory is refused
    /// - [`ScryptError::Internal`] if the derivation produced an inconsistent
    ///   result
    pub fn derive(&self, request: &DerivationRequest<'_>) -> Result<DerivedKey> {
        let layout = MixLayout::plan(request, &self.limits).inspect_err(|e| {
            log::debug!("Rejected scrypt request {request:?}: {e}");
        })?;
        LoggingTransformer::log_derivation_request("scrypt", request.salt, request.password.len());

        let source: &dyn BufferSource = self.source.as_ref();
        let mut expanded = WorkBuffer::<u8>::acquire(source, layout.expanded_bytes)?;
        let mut table = WorkBuffer::<u32>::acquire(source, layout.table_words)?;
        let mut scratch = WorkBuffer::<u32>::acquire(source, layout.scratch_words)?;
        let mut output = WorkBuffer::<u8>::acquire(source, layout.output_len)?;

        pbkdf2_hmac::<Sha256>(request.password, request.salt, 1, &mut expanded);
        for block in expanded.chunks_exact_mut(layout.block_bytes) {
            romix::ro_mix(block, &mut table, &mut scratch, layout.params.n());
        }
        pbkdf2_hmac::<Sha256>(request.password, &expanded, 1, &mut output);

        let key = output.into_vec();
        if key.len() != request.output_len {
            return Err(ScryptError::internal(format!(
                "derived {} bytes but {} were requested",
                key.len(),
                request.output_len
            )));
        }
        Ok(DerivedKey::new(key))
    }
}

impl Default for ScryptKdf {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ScryptKdf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScryptKdf")
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}

/// Derive a key with default limits
///
/// # Errors
///
/// See [`ScryptKdf::derive`].
pub fn derive(request: &DerivationRequest<'_>) -> Result<DerivedKey> {
    ScryptKdf::new().derive(request)
}

/// `scrypt(password, salt, N, r, p, dkLen)` with default limits
///
/// # Errors
///
/// See [`ScryptKdf::derive`].
pub fn scrypt(
    password: &[u8],
    salt: &[u8],
    n: u64,
    r: u32,
    p: u32,
    output_len: usize,
) -> Result<DerivedKey> {
    derive(&DerivationRequest::new(password, salt, n, r, p, output_len))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(n: u64, r: u32, p: u32, output_len: usize) -> DerivationRequest<'static> {
        DerivationRequest::new(b"password", b"NaCl", n, r, p, output_len)
    }

    #[test]
    fn layout_sizes_match_the_algorithm() {
        let layout =
            MixLayout::plan(&request(1024, 8, 16, 64), &ScryptLimits::DEFAULT).expect("valid");
        assert_eq!(layout.block_bytes, 1024);
        assert_eq!(layout.expanded_bytes, 16 * 1024);
        assert_eq!(layout.table_words * 4, 1024 * 1024);
        assert_eq!(layout.scratch_words * 4, 2 * 1024);
        assert_eq!(layout.output_len, 64);
    }

    #[test]
    fn zero_output_is_rejected() {
        let err = MixLayout::plan(&request(16, 1, 1, 0), &ScryptLimits::DEFAULT).unwrap_err();
        assert!(matches!(err, ScryptError::InvalidParameter(_)));
    }

    #[test]
    fn memory_ceiling_is_enforced() {
        let limits = ScryptLimits::DEFAULT.with_max_memory(1 << 20);
        assert!(MixLayout::plan(&request(1024, 8, 1, 32), &limits).is_err());
        assert!(MixLayout::plan(&request(512, 8, 1, 32), &limits).is_ok());
    }

    #[test]
    fn output_buffer_counts_against_memory_ceiling() {
        let limits = ScryptLimits::DEFAULT.with_max_memory(1 << 20);
        let err = MixLayout::plan(&request(16, 1, 1, 64 << 20), &limits).unwrap_err();
        assert!(matches!(err, ScryptError::InvalidParameter(_)));

        // 128 * (16 + 1 + 2) bytes of mixing state leaves the rest for output
        let room = (1 << 20) - 128 * 19;
        assert!(MixLayout::plan(&request(16, 1, 1, room), &limits).is_ok());
        assert!(MixLayout::plan(&request(16, 1, 1, room + 1), &limits).is_err());
    }

    #[test]
    fn maximum_output_exceeds_default_memory_ceiling() {
        let err = MixLayout::plan(&request(16, 1, 1, u32::MAX as usize), &ScryptLimits::DEFAULT)
            .unwrap_err();
        assert!(err.to_string().contains("working set"));
    }

    #[test]
    fn output_ceiling_is_enforced() {
        let limits = ScryptLimits::DEFAULT.with_max_output_len(32);
        assert!(MixLayout::plan(&request(16, 1, 1, 33), &limits).is_err());
        assert!(MixLayout::plan(&request(16, 1, 1, 32), &limits).is_ok());
    }

    #[test]
    fn input_ceiling_is_enforced() {
        let limits = ScryptLimits {
            max_input_len: 4,
            ..ScryptLimits::DEFAULT
        };
        let err = MixLayout::plan(&request(16, 1, 1, 32), &limits).unwrap_err();
        assert!(err.to_string().contains("password"));
    }

    #[test]
    fn rfc_7914_first_vector() {
        let key = scrypt(b"", b"", 16, 1, 1, 64).expect("valid parameters");
        assert_eq!(
            key.to_hex(),
            "77d6576238657b203b19ca42c18a0497f16b4844e3074ae8dfdffa3fede21442\
             fcd0069ded0948f8326a753a0fc81f17e8d3e0fb2e0d3628cf35e20c38d18906"
        );
    }
}
