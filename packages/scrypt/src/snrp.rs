//! SNRP parameter sets: a salt plus the `N`, `r`, `p` costs
//!
//! This is the JSON shape stored next to anything derived with scrypt:
//!
//! ```json
//! {"salt_hex": "b5865ffb...", "n": 16384, "r": 1, "p": 1}
//! ```

use serde::{Deserialize, Serialize};

use crate::{DerivationRequest, DerivedKey, Result, ScryptError, ScryptKdf, ScryptParams};

/// Salt of the fixed user-id parameter set
pub const USER_ID_SALT_HEX: &str =
    "b5865ffb9fa7b3bfe4b2384d47ce831ee22a4a9d5c34c7ef7d21467cc758f81b";

/// Derived key length used when none is given
pub const DEFAULT_OUTPUT_LEN: usize = 32;

/// Smallest `log2(N)` the tuner will produce (`N = 16384`)
const MIN_LOG_N: u32 = 14;
/// At most `2^3` times the minimum `N`
const MAX_ADD_LOG_N: f64 = 3.0;
const STARTING_R: u32 = 8;
const MAX_R: u32 = 8;
const MAX_P: f64 = 64.0;

/// A salt and cost parameters, as stored alongside derived secrets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snrp {
    /// Hex-encoded salt
    pub salt_hex: String,
    /// CPU/memory cost `N`
    pub n: u64,
    /// Block size `r`
    pub r: u32,
    /// Parallelization `p`
    pub p: u32,
}

impl Snrp {
    /// Parameters with `salt` and validated costs
    #[must_use]
    pub fn new(salt: &[u8], params: &ScryptParams) -> Self {
        Self {
            salt_hex: hex::encode(salt),
            n: params.n(),
            r: params.r(),
            p: params.p(),
        }
    }

    /// The fixed parameter set used to derive user ids: `N = 16384, r = 1, p = 1`
    #[must_use]
    pub fn user_id() -> Self {
        Self {
            salt_hex: USER_ID_SALT_HEX.to_string(),
            n: 16384,
            r: 1,
            p: 1,
        }
    }

    /// Decode the salt
    ///
    /// # Errors
    ///
    /// Returns [`ScryptError::InvalidParameter`] if `salt_hex` is not valid hex.
    pub fn salt(&self) -> Result<Vec<u8>> {
        hex::decode(&self.salt_hex)
            .map_err(|e| ScryptError::invalid_parameter(format!("salt_hex is not valid hex: {e}")))
    }

    /// Validate the costs
    ///
    /// # Errors
    ///
    /// Returns [`ScryptError::InvalidParameter`] if the costs are invalid.
    pub fn params(&self) -> Result<ScryptParams> {
        ScryptParams::new(self.n, self.r, self.p)
    }

    /// Derive `output_len` bytes from `data` with these parameters
    ///
    /// # Errors
    ///
    /// See [`ScryptKdf::derive`]; a malformed salt is an
    /// [`ScryptError::InvalidParameter`].
    pub fn derive(&self, kdf: &ScryptKdf, data: &[u8], output_len: usize) -> Result<DerivedKey> {
        let salt = self.salt()?;
        kdf.derive(&DerivationRequest::new(
            data, &salt, self.n, self.r, self.p, output_len,
        ))
    }

    /// Parse from JSON
    ///
    /// # Errors
    ///
    /// Returns [`ScryptError::InvalidParameter`] if the JSON does not have the
    /// expected shape.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| ScryptError::invalid_parameter(format!("malformed snrp: {e}")))
    }

    /// Serialize to JSON
    ///
    /// # Errors
    ///
    /// Returns [`ScryptError::Internal`] if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| ScryptError::internal(e.to_string()))
    }
}

/// Pick parameters that take about `target_ms` on this device
///
/// `bench_ms` is the measured time of one derivation at `N = 16384, r = 8,
/// p = 1`. Cost is added in two steps, each assuming time scales linearly:
/// first `N` is doubled up to three times, then `p` is raised to fill the
/// remaining budget, capped at 64. `r` stays at 8.
///
/// A benchmark of zero (or anything not a positive number) means no
/// measurement is available and yields the heaviest set:
/// `N = 131072, r = 8, p = 64`.
#[must_use]
pub fn calc_snrp_for_target(salt: &[u8], bench_ms: f64, target_ms: f64) -> Snrp {
    let salt_hex = hex::encode(salt);

    if !(bench_ms > 0.0 && bench_ms.is_finite()) {
        return Snrp {
            salt_hex,
            n: 1 << (MIN_LOG_N + 3),
            r: STARTING_R,
            p: 64,
        };
    }

    let mut time_used = bench_ms;

    // Each step of r costs about bench/STARTING_R
    let per_r = bench_ms / f64::from(STARTING_R);
    let add_r = ((target_ms - time_used) / per_r)
        .clamp(0.0, f64::from(MAX_R - STARTING_R))
        .floor();
    time_used += add_r * per_r;
    let r = STARTING_R + add_r as u32;

    // Each doubling of N doubles the time
    let add_n = ((target_ms - time_used) / time_used)
        .clamp(0.0, MAX_ADD_LOG_N)
        .floor();
    time_used += add_n * time_used;
    let n = 1u64 << (MIN_LOG_N + add_n as u32);

    let add_p = ((target_ms - time_used) / time_used)
        .clamp(0.0, MAX_P)
        .floor();
    let p = (add_p as u32).max(1);

    Snrp { salt_hex, n, r, p }
}
