//! Running derivations off the async executor
//!
//! scrypt is CPU and memory bound and can take seconds. [`ScryptRunner`]
//! moves each derivation onto tokio's blocking pool and admits at most
//! `max_concurrent` of them at a time, one by default, so concurrent callers
//! queue instead of multiplying memory pressure.

use std::sync::Arc;
use std::time::{Duration, Instant};

use kdfbridge_common::LoggingTransformer;
use once_cell::sync::Lazy;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use tokio::sync::{OnceCell, Semaphore};
use zeroize::Zeroizing;

use crate::snrp::{DEFAULT_OUTPUT_LEN, calc_snrp_for_target};
use crate::{
    DerivationRequest, DerivedKey, Result, ScryptError, ScryptKdf, ScryptLimits, Snrp,
};

/// Password used to time this device
const BENCHMARK_DATA: &[u8] = b"1reallyJunkiePasswordToCheck";
const SNRP_SALT_LEN: usize = 32;

/// Runner configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Derivations allowed to run at once
    pub max_concurrent: usize,
    /// Target duration for [`ScryptRunner::make_snrp_default`]
    pub default_target_ms: u64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 1,
            default_target_ms: 2000,
        }
    }
}

/// Owned inputs for a derivation that outlives the caller's borrow
pub struct ScryptJob {
    password: Zeroizing<Vec<u8>>,
    salt: Vec<u8>,
    n: u64,
    r: u32,
    p: u32,
    output_len: usize,
    limits: Option<ScryptLimits>,
}

impl ScryptJob {
    /// Job deriving `output_len` bytes from `password` and `salt`
    #[must_use]
    pub fn new(
        password: impl Into<Vec<u8>>,
        salt: impl Into<Vec<u8>>,
        n: u64,
        r: u32,
        p: u32,
        output_len: usize,
    ) -> Self {
        Self {
            password: Zeroizing::new(password.into()),
            salt: salt.into(),
            n,
            r,
            p,
            output_len,
            limits: None,
        }
    }

    /// Job using the salt and costs of `snrp`
    ///
    /// # Errors
    ///
    /// Returns [`ScryptError::InvalidParameter`] if the salt is not valid hex.
    pub fn from_snrp(
        password: impl Into<Vec<u8>>,
        snrp: &Snrp,
        output_len: usize,
    ) -> Result<Self> {
        Ok(Self::new(password, snrp.salt()?, snrp.n, snrp.r, snrp.p, output_len))
    }

    /// Override the runner's limits for this job only
    #[must_use]
    pub fn with_limits(mut self, limits: ScryptLimits) -> Self {
        self.limits = Some(limits);
        self
    }

    fn request(&self) -> DerivationRequest<'_> {
        DerivationRequest::new(
            &self.password,
            &self.salt,
            self.n,
            self.r,
            self.p,
            self.output_len,
        )
    }
}

/// A derived key and how long it took
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimedKey {
    /// The derived key
    pub key: DerivedKey,
    /// Wall-clock time of the derivation itself, excluding queueing
    pub elapsed: Duration,
}

struct RunnerInner {
    kdf: ScryptKdf,
    permits: Arc<Semaphore>,
    config: RunnerConfig,
    benchmark: OnceCell<Duration>,
}

/// Queue for blocking scrypt derivations
///
/// Cheap to clone; clones share the queue and the cached benchmark.
///
/// Dropping a pending derivation future does not stop the computation: it
/// runs to completion on the blocking pool, still holding its slot, and the
/// key is discarded.
#[derive(Clone)]
pub struct ScryptRunner {
    inner: Arc<RunnerInner>,
}

static GLOBAL_RUNNER: Lazy<ScryptRunner> = Lazy::new(ScryptRunner::default);

impl ScryptRunner {
    /// Runner over a default [`ScryptKdf`]
    #[must_use]
    pub fn new(config: RunnerConfig) -> Self {
        Self::with_kdf(ScryptKdf::new(), config)
    }

    /// Runner over `kdf`
    #[must_use]
    pub fn with_kdf(kdf: ScryptKdf, config: RunnerConfig) -> Self {
        Self {
            inner: Arc::new(RunnerInner {
                kdf,
                permits: Arc::new(Semaphore::new(config.max_concurrent.max(1))),
                config,
                benchmark: OnceCell::new(),
            }),
        }
    }

    /// Process-wide runner with default configuration
    #[must_use]
    pub fn global() -> &'static ScryptRunner {
        &GLOBAL_RUNNER
    }

    /// The configuration this runner was built with
    #[must_use]
    pub fn config(&self) -> &RunnerConfig {
        &self.inner.config
    }

    /// The underlying synchronous derivation
    #[must_use]
    pub fn kdf(&self) -> &ScryptKdf {
        &self.inner.kdf
    }

    /// Run `job` and report its duration
    ///
    /// # Errors
    ///
    /// Errors from [`ScryptKdf::derive`], or [`ScryptError::Internal`] if the
    /// blocking task panicked.
    pub async fn run(&self, job: ScryptJob) -> Result<TimedKey> {
        let permit = Arc::clone(&self.inner.permits)
            .acquire_owned()
            .await
            .map_err(|_| ScryptError::internal("scrypt runner is closed"))?;

        let kdf = match job.limits {
            Some(limits) => self.inner.kdf.clone().with_limits(limits),
            None => self.inner.kdf.clone(),
        };

        let (result, elapsed) = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let started = Instant::now();
            let result = kdf.derive(&job.request());
            (result, started.elapsed())
        })
        .await
        .map_err(|e| ScryptError::internal(format!("scrypt task failed: {e}")))?;

        LoggingTransformer::log_performance_metric("scrypt", elapsed, result.is_ok());
        Ok(TimedKey {
            key: result?,
            elapsed,
        })
    }

    /// Run `job`
    ///
    /// # Errors
    ///
    /// See [`run`](Self::run).
    pub async fn derive(&self, job: ScryptJob) -> Result<DerivedKey> {
        self.run(job).await.map(|timed| timed.key)
    }

    /// Derive from `data` with `snrp`, logging the parameters and duration
    ///
    /// # Errors
    ///
    /// See [`run`](Self::run); a malformed salt is an
    /// [`ScryptError::InvalidParameter`].
    pub async fn time_scrypt(
        &self,
        data: &[u8],
        snrp: &Snrp,
        output_len: usize,
    ) -> Result<TimedKey> {
        let job = ScryptJob::from_snrp(data, snrp, output_len)?;
        log::info!("starting scrypt n={} r={} p={}", snrp.n, snrp.r, snrp.p);
        let timed = self.run(job).await?;
        log::info!(
            "finished scrypt n={} r={} p={} in {}ms",
            snrp.n,
            snrp.r,
            snrp.p,
            timed.elapsed.as_millis()
        );
        Ok(timed)
    }

    /// Time one derivation at `N = 16384, r = 8, p = 1`
    ///
    /// Measured once per runner; later calls return the cached figure.
    ///
    /// # Errors
    ///
    /// See [`run`](Self::run). A failed benchmark is not cached.
    pub async fn benchmark(&self) -> Result<Duration> {
        self.inner
            .benchmark
            .get_or_try_init(|| async {
                let snrp = Snrp {
                    r: 8,
                    ..Snrp::user_id()
                };
                let timed = self
                    .time_scrypt(BENCHMARK_DATA, &snrp, DEFAULT_OUTPUT_LEN)
                    .await?;
                Ok::<Duration, ScryptError>(timed.elapsed)
            })
            .await
            .copied()
    }

    /// Fresh parameters with a random salt, tuned to take about `target_ms`
    ///
    /// # Errors
    ///
    /// Returns the benchmark's error if it could not be run.
    pub async fn make_snrp(&self, target_ms: u64) -> Result<Snrp> {
        let bench = self.benchmark().await?;
        let bench_ms = bench.as_secs_f64() * 1000.0;

        let mut salt = [0u8; SNRP_SALT_LEN];
        rand::rng().fill_bytes(&mut salt);

        let snrp = calc_snrp_for_target(&salt, bench_ms, target_ms as f64);
        log::info!(
            "snrp for {target_ms}ms target: {} {} {} based on {}ms benchmark",
            snrp.n,
            snrp.r,
            snrp.p,
            bench.as_millis()
        );
        Ok(snrp)
    }

    /// [`make_snrp`](Self::make_snrp) with the configured default target
    ///
    /// # Errors
    ///
    /// See [`make_snrp`](Self::make_snrp).
    pub async fn make_snrp_default(&self) -> Result<Snrp> {
        self.make_snrp(self.inner.config.default_target_ms).await
    }
}

impl Default for ScryptRunner {
    fn default() -> Self {
        Self::new(RunnerConfig::default())
    }
}

impl std::fmt::Debug for ScryptRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScryptRunner")
            .field("config", &self.inner.config)
            .field("available", &self.inner.permits.available_permits())
            .finish_non_exhaustive()
    }
}
