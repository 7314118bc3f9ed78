//! Resource ceilings applied before any working memory is requested

use serde::{Deserialize, Serialize};

/// Exclusive upper bound on `r * p` from RFC 7914
pub const MAX_RP: u64 = 1 << 30;

/// Largest derived key a single call may request
pub const MAX_OUTPUT_LEN: u64 = u32::MAX as u64;

const MIB: u64 = 1 << 20;

/// Ceilings for a single derivation
///
/// The working set of one derivation is `128 * r * (N + p + 2)` bytes plus
/// the derived key: the `N`-entry ROMix table, the `p` PBKDF2 blocks, two
/// scratch blocks and the output buffer. `max_memory_bytes` bounds all of it,
/// so a large output length alone can exceed the ceiling.
/// Hosts that run several derivations at once should size `max_memory_bytes`
/// with the concurrency in mind, or share a
/// [`MemoryBudget`](crate::buffer::MemoryBudget) between calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScryptLimits {
    /// Largest working set in bytes
    pub max_memory_bytes: u64,
    /// Exclusive bound on `r * p`, never above [`MAX_RP`]
    pub max_rp: u64,
    /// Largest derived key length in bytes, never above [`MAX_OUTPUT_LEN`]
    pub max_output_len: u64,
    /// Largest password or salt in bytes
    pub max_input_len: u64,
}

impl ScryptLimits {
    /// 1 GiB working set, RFC 7914 bounds on everything else
    pub const DEFAULT: Self = Self {
        max_memory_bytes: 1024 * MIB,
        max_rp: MAX_RP,
        max_output_len: MAX_OUTPUT_LEN,
        max_input_len: 16 * MIB,
    };

    /// 256 MiB working set and 1 KiB keys, for mobile-class hosts
    ///
    /// Still admits the heaviest parameters the tuner produces
    /// (`N = 2^17, r = 8, p = 64`, about 128 MiB).
    pub const CONSTRAINED: Self = Self {
        max_memory_bytes: 256 * MIB,
        max_rp: MAX_RP,
        max_output_len: 1024,
        max_input_len: MIB,
    };

    /// Only the address space bounds the working set
    pub const UNBOUNDED: Self = Self {
        max_memory_bytes: u64::MAX,
        max_rp: MAX_RP,
        max_output_len: MAX_OUTPUT_LEN,
        max_input_len: u64::MAX,
    };

    /// Set the working set ceiling
    #[must_use]
    pub fn with_max_memory(mut self, bytes: u64) -> Self {
        self.max_memory_bytes = bytes;
        self
    }

    /// Set the derived key length ceiling, clamped to [`MAX_OUTPUT_LEN`]
    #[must_use]
    pub fn with_max_output_len(mut self, len: u64) -> Self {
        self.max_output_len = len.min(MAX_OUTPUT_LEN);
        self
    }

    /// Effective `r * p` bound after clamping to [`MAX_RP`]
    pub(crate) fn rp_bound(&self) -> u64 {
        self.max_rp.min(MAX_RP)
    }

    /// Effective output bound after clamping to [`MAX_OUTPUT_LEN`]
    pub(crate) fn output_bound(&self) -> u64 {
        self.max_output_len.min(MAX_OUTPUT_LEN)
    }
}

impl Default for ScryptLimits {
    fn default() -> Self {
        Self::DEFAULT
    }
}
