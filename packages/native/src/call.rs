//! Method dispatch for host runtimes
//!
//! A host's native module receives a method name and a JSON array of
//! arguments, with binary data as base64 strings. [`NativeModule`] decodes
//! those, runs the method and encodes the result the same way:
//!
//! | method | arguments | result |
//! |--------|-----------|--------|
//! | `scrypt` | `[data, salt, n, r, p, dklen]` | base64 key |
//! | `randomBytes` | `[count]` | base64 bytes |

use std::str::FromStr;

use base64::Engine;
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD};
use base64::engine::DecodePaddingMode;
use kdfbridge_common::{on_error, on_result};
use kdfbridge_scrypt::{ScryptJob, ScryptRunner};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use zeroize::Zeroizing;

use crate::{NativeError, Result, bridge};

/// Largest `randomBytes` request served
pub const MAX_RANDOM_BYTES: u32 = 1 << 20;

/// Hosts send standard base64, padded or not
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Methods a host may call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeMethod {
    /// Derive a key with scrypt
    Scrypt,
    /// Fill a buffer from the system RNG
    RandomBytes,
}

impl NativeMethod {
    /// Name the host uses for this method
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Scrypt => "scrypt",
            Self::RandomBytes => "randomBytes",
        }
    }
}

impl FromStr for NativeMethod {
    type Err = NativeError;

    fn from_str(name: &str) -> Result<Self> {
        match name {
            "scrypt" => Ok(Self::Scrypt),
            "randomBytes" => Ok(Self::RandomBytes),
            _ => Err(NativeError::unknown_method(name)),
        }
    }
}

/// Decoded arguments of a `scrypt` call
pub struct ScryptArgs {
    /// Password bytes, wiped on drop
    pub data: Zeroizing<Vec<u8>>,
    /// Salt bytes
    pub salt: Vec<u8>,
    /// CPU/memory cost
    pub n: u32,
    /// Block size
    pub r: u32,
    /// Parallelization
    pub p: u32,
    /// Derived key length
    pub dk_len: u32,
}

impl ScryptArgs {
    /// Decode `[data, salt, n, r, p, dklen]`
    ///
    /// # Errors
    ///
    /// Returns an `InvalidArgument` error if `args` is not a six-element
    /// array of two base64 strings followed by four unsigned 32-bit integers.
    pub fn from_json(args: &Value) -> Result<Self> {
        let args = arg_list(args, 6)?;
        Ok(Self {
            data: Zeroizing::new(base64_arg(args, 0, "data")?),
            salt: base64_arg(args, 1, "salt")?,
            n: u32_arg(args, 2, "n")?,
            r: u32_arg(args, 3, "r")?,
            p: u32_arg(args, 4, "p")?,
            dk_len: u32_arg(args, 5, "dklen")?,
        })
    }
}

impl std::fmt::Debug for ScryptArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScryptArgs")
            .field("data_len", &self.data.len())
            .field("salt_len", &self.salt.len())
            .field("n", &self.n)
            .field("r", &self.r)
            .field("p", &self.p)
            .field("dk_len", &self.dk_len)
            .finish()
    }
}

fn arg_list(args: &Value, expected: usize) -> Result<&[Value]> {
    let list = args
        .as_array()
        .ok_or_else(|| NativeError::invalid_argument("arguments must be a JSON array"))?;
    if list.len() < expected {
        return Err(NativeError::invalid_argument(format!(
            "expected {expected} arguments, got {}",
            list.len()
        )));
    }
    Ok(list)
}

fn base64_arg(args: &[Value], index: usize, name: &str) -> Result<Vec<u8>> {
    let encoded = args[index]
        .as_str()
        .ok_or_else(|| NativeError::invalid_argument(format!("{name} must be a base64 string")))?;
    let compact: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    LENIENT
        .decode(compact)
        .map_err(|e| NativeError::invalid_argument(format!("{name} is not valid base64: {e}")))
}

/// Integers may arrive as JSON numbers or numeric strings
fn u32_arg(args: &[Value], index: usize, name: &str) -> Result<u32> {
    let value = match &args[index] {
        Value::Number(number) => number.as_u64(),
        Value::String(text) => text.trim().parse::<u64>().ok(),
        _ => None,
    };
    value
        .and_then(|v| u32::try_from(v).ok())
        .ok_or_else(|| {
            NativeError::invalid_argument(format!("{name} must be an unsigned 32-bit integer"))
        })
}

/// Serialized reply for hosts that take a single JSON value
///
/// Serializes as `{"ok": <value>}` or `{"error": {"kind": .., "message": ..}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NativeResponse {
    /// The method's result
    Ok(Value),
    /// Why the method failed
    Error(NativeError),
}

impl NativeResponse {
    /// Back into a `Result`
    ///
    /// # Errors
    ///
    /// Returns the carried error for [`NativeResponse::Error`].
    pub fn into_result(self) -> Result<Value> {
        match self {
            Self::Ok(value) => Ok(value),
            Self::Error(error) => Err(error),
        }
    }
}

impl From<Result<Value>> for NativeResponse {
    fn from(result: Result<Value>) -> Self {
        match result {
            Ok(value) => Self::Ok(value),
            Err(error) => Self::Error(error),
        }
    }
}

/// Native module dispatching host calls by method name
///
/// Derivations go through a [`ScryptRunner`], so they run one at a time on
/// the blocking pool unless the runner is configured otherwise.
#[derive(Debug, Clone, Default)]
pub struct NativeModule {
    runner: ScryptRunner,
}

impl NativeModule {
    /// Module over a default runner
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Module over `runner`
    #[must_use]
    pub fn with_runner(runner: ScryptRunner) -> Self {
        Self { runner }
    }

    /// Run `method` on the calling thread
    ///
    /// Blocks for the full derivation on `scrypt`; call from a worker thread.
    ///
    /// # Errors
    ///
    /// `UnknownMethod` for an unrecognized name, `InvalidArgument` for
    /// malformed arguments, otherwise the method's own error.
    pub fn handle_call(&self, method: &str, args: &Value) -> Result<Value> {
        log::debug!("native call {method}");
        let result = match method.parse::<NativeMethod>()? {
            NativeMethod::Scrypt => {
                let args = ScryptArgs::from_json(args)?;
                bridge::scrypt_with(
                    self.runner.kdf(),
                    &args.data,
                    &args.salt,
                    args.n,
                    args.r,
                    args.p,
                    args.dk_len,
                )
                .map(|key| Value::String(STANDARD.encode(key)))
            }
            NativeMethod::RandomBytes => random_bytes(args),
        };
        result.inspect_err(|e| log::debug!("native call {method} failed: {e}"))
    }

    /// Run `method`, moving derivations onto the runner
    ///
    /// # Errors
    ///
    /// See [`handle_call`](Self::handle_call).
    pub async fn handle_call_async(&self, method: &str, args: &Value) -> Result<Value> {
        log::debug!("native call {method}");
        let result = match method.parse::<NativeMethod>()? {
            NativeMethod::Scrypt => self.scrypt_async(args).await,
            NativeMethod::RandomBytes => random_bytes(args),
        };
        result.inspect_err(|e| log::debug!("native call {method} failed: {e}"))
    }

    /// Parse `args_json` and run `method`, folding every failure into the reply
    pub async fn call(&self, method: &str, args_json: &str) -> NativeResponse {
        let args = match serde_json::from_str::<Value>(args_json) {
            Ok(args) => args,
            Err(e) => {
                return NativeResponse::Error(NativeError::invalid_argument(format!(
                    "arguments are not valid JSON: {e}"
                )));
            }
        };
        self.handle_call_async(method, &args)
            .await
            .map(on_result)
            .map_err(on_error)
            .into()
    }

    async fn scrypt_async(&self, args: &Value) -> Result<Value> {
        let mut args = ScryptArgs::from_json(args)?;
        let output_len = usize::try_from(args.dk_len)
            .map_err(|_| NativeError::invalid_argument("dklen exceeds the address space"))?;
        // Moved, not copied: the job wipes it from here on
        let job = ScryptJob::new(
            std::mem::take(&mut *args.data),
            args.salt,
            u64::from(args.n),
            args.r,
            args.p,
            output_len,
        );
        let key = self.runner.derive(job).await?;
        Ok(Value::String(key.to_base64()))
    }
}

fn random_bytes(args: &Value) -> Result<Value> {
    let args = arg_list(args, 1)?;
    let count = u32_arg(args, 0, "count")?;
    if count > MAX_RANDOM_BYTES {
        return Err(NativeError::invalid_argument(format!(
            "count {count} exceeds the maximum of {MAX_RANDOM_BYTES}"
        )));
    }

    let mut entropy = vec![0u8; count as usize];
    rand::rng().fill_bytes(&mut entropy);
    Ok(Value::String(STANDARD.encode(entropy)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn method_names_round_trip() {
        for method in [NativeMethod::Scrypt, NativeMethod::RandomBytes] {
            assert_eq!(method.name().parse::<NativeMethod>().expect("known"), method);
        }
        let err = "diskletGetText".parse::<NativeMethod>().unwrap_err();
        assert_eq!(err.message, "No method diskletGetText");
    }

    #[test]
    fn scrypt_args_accept_numeric_strings_and_unpadded_base64() {
        let args = ScryptArgs::from_json(&json!(["cGFzc3dvcmQ", "TmFDbA==", "1024", 8, 16, 64]))
            .expect("well-formed");
        assert_eq!(args.data.as_slice(), b"password");
        assert_eq!(args.salt, b"NaCl");
        assert_eq!((args.n, args.r, args.p, args.dk_len), (1024, 8, 16, 64));
    }

    #[test]
    fn scrypt_args_reject_bad_shapes() {
        for args in [
            json!({"data": "cGFzc3dvcmQ="}),
            json!(["cGFzc3dvcmQ=", "TmFDbA=="]),
            json!(["not base64!", "TmFDbA==", 1024, 8, 16, 64]),
            json!(["cGFzc3dvcmQ=", "TmFDbA==", -1, 8, 16, 64]),
            json!(["cGFzc3dvcmQ=", "TmFDbA==", 1024, 8, 16, 4_294_967_296_u64]),
            json!(["cGFzc3dvcmQ=", "TmFDbA==", 1024.5, 8, 16, 64]),
        ] {
            let err = ScryptArgs::from_json(&args).unwrap_err();
            assert_eq!(err.kind, crate::NativeErrorKind::InvalidArgument, "{args}");
        }
    }

    #[test]
    fn debug_hides_inputs() {
        let args = ScryptArgs::from_json(&json!(["cGFzc3dvcmQ=", "TmFDbA==", 16, 1, 1, 8]))
            .expect("well-formed");
        let debug = format!("{args:?}");
        assert!(debug.contains("data_len: 8"));
        assert!(!debug.contains("112"));
    }

    #[test]
    fn random_bytes_has_requested_length() {
        let value = random_bytes(&json!([48])).expect("within limit");
        let decoded = STANDARD
            .decode(value.as_str().expect("base64 string"))
            .expect("valid base64");
        assert_eq!(decoded.len(), 48);

        assert!(random_bytes(&json!([MAX_RANDOM_BYTES + 1])).is_err());
    }

    #[test]
    fn response_envelope_shape() {
        let ok = serde_json::to_value(NativeResponse::Ok(json!("AAAA"))).expect("serializes");
        assert_eq!(ok, json!({"ok": "AAAA"}));

        let error = NativeResponse::from(Err(NativeError::unknown_method("fetch")));
        assert_eq!(
            serde_json::to_value(&error).expect("serializes"),
            json!({"error": {"kind": "UnknownMethod", "message": "No method fetch"}})
        );
        assert!(error.into_result().is_err());
    }
}
