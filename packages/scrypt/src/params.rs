//! Scrypt cost parameters

use serde::{Deserialize, Serialize};

use crate::limits::MAX_RP;
use crate::{Result, ScryptError};

/// Validated scrypt cost parameters `(N, r, p)`
///
/// Construction enforces the structural rules of RFC 7914:
/// - `N` is a power of two greater than 1
/// - `r` and `p` are positive and `r * p < 2^30`
/// - `N < 2^(16 * r)`
///
/// Resource ceilings (memory, output size) are configuration and are checked
/// separately against [`ScryptLimits`](crate::ScryptLimits).
///
/// Serialized form is `{"n": 16384, "r": 8, "p": 1}`; deserializing runs the
/// same validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawParams", into = "RawParams")]
pub struct ScryptParams {
    log_n: u8,
    r: u32,
    p: u32,
}

#[derive(Serialize, Deserialize)]
struct RawParams {
    n: u64,
    r: u32,
    p: u32,
}

impl ScryptParams {
    /// Validate `N`, `r` and `p`
    ///
    /// # Errors
    ///
    /// Returns [`ScryptError::InvalidParameter`] if any rule listed on the
    /// type is violated.
    pub fn new(n: u64, r: u32, p: u32) -> Result<Self> {
        if n <= 1 {
            return Err(ScryptError::invalid_parameter(format!(
                "N must be greater than 1, got {n}"
            )));
        }
        if !n.is_power_of_two() {
            return Err(ScryptError::invalid_parameter(format!(
                "N must be a power of two, got {n}"
            )));
        }
        // n is a power of two, so ilog2 is exact and < 64
        let log_n = n.ilog2() as u8;
        Self::from_log_n(log_n, r, p)
    }

    /// Validate parameters given as `log2(N)`
    ///
    /// # Errors
    ///
    /// Returns [`ScryptError::InvalidParameter`] if `log_n` is 0 or above 63,
    /// or if `r`/`p` violate the rules listed on the type.
    pub fn from_log_n(log_n: u8, r: u32, p: u32) -> Result<Self> {
        if log_n == 0 || log_n >= 64 {
            return Err(ScryptError::invalid_parameter(format!(
                "log2(N) must be between 1 and 63, got {log_n}"
            )));
        }
        if r == 0 {
            return Err(ScryptError::invalid_parameter("r must be positive"));
        }
        if p == 0 {
            return Err(ScryptError::invalid_parameter("p must be positive"));
        }
        let rp = u64::from(r) * u64::from(p);
        if rp >= MAX_RP {
            return Err(ScryptError::invalid_parameter(format!(
                "r * p must be below 2^30, got {rp}"
            )));
        }
        if u64::from(log_n) >= 16 * u64::from(r) {
            return Err(ScryptError::invalid_parameter(format!(
                "N must be below 2^(16 * r), got N = 2^{log_n} with r = {r}"
            )));
        }
        Ok(Self { log_n, r, p })
    }

    /// CPU/memory cost `N`
    #[must_use]
    pub fn n(&self) -> u64 {
        1u64 << self.log_n
    }

    /// `log2(N)`
    #[must_use]
    pub fn log_n(&self) -> u8 {
        self.log_n
    }

    /// Block size parameter
    #[must_use]
    pub fn r(&self) -> u32 {
        self.r
    }

    /// Parallelization parameter
    #[must_use]
    pub fn p(&self) -> u32 {
        self.p
    }

    /// Bytes of working memory one derivation needs: `128 * r * (N + p + 2)`
    ///
    /// `None` if the figure does not fit in 64 bits.
    #[must_use]
    pub fn working_set_bytes(&self) -> Option<u64> {
        let blocks = self
            .n()
            .checked_add(u64::from(self.p))?
            .checked_add(2)?;
        (128 * u64::from(self.r)).checked_mul(blocks)
    }
}

impl TryFrom<RawParams> for ScryptParams {
    type Error = ScryptError;

    fn try_from(raw: RawParams) -> Result<Self> {
        Self::new(raw.n, raw.r, raw.p)
    }
}

impl From<ScryptParams> for RawParams {
    fn from(params: ScryptParams) -> Self {
        Self {
            n: params.n(),
            r: params.r,
            p: params.p,
        }
    }
}
