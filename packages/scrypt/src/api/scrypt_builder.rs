//! scrypt builder following the `on_result` pattern

use tokio::sync::oneshot;

use crate::runner::{ScryptJob, ScryptRunner};
use crate::snrp::DEFAULT_OUTPUT_LEN;
use crate::{
    AsyncKdfResult, AsyncKdfResultWithHandler, DerivedKey, Result, ScryptError, ScryptLimits,
    Snrp,
};
use kdfbridge_common::NotResult;

/// scrypt derivation builder
///
/// Defaults: empty salt, `N = 16384, r = 8, p = 1`, 32-byte key, the
/// process-wide [`ScryptRunner`] and its limits. Set a salt for anything
/// other than deterministic test derivations.
#[derive(Debug, Clone)]
pub struct ScryptBuilder {
    salt: Vec<u8>,
    n: u64,
    r: u32,
    p: u32,
    output_len: usize,
    limits: Option<ScryptLimits>,
    runner: Option<ScryptRunner>,
    pending_error: Option<ScryptError>,
}

/// scrypt derivation builder with a result handler
pub struct ScryptBuilderWithHandler<F, T> {
    builder: ScryptBuilder,
    result_handler: F,
    _phantom: std::marker::PhantomData<T>,
}

impl Default for ScryptBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ScryptBuilder {
    /// Create new scrypt builder
    #[must_use]
    pub fn new() -> Self {
        Self {
            salt: Vec::new(),
            n: 16384,
            r: 8,
            p: 1,
            output_len: DEFAULT_OUTPUT_LEN,
            limits: None,
            runner: None,
            pending_error: None,
        }
    }

    /// Use `salt`
    #[must_use]
    pub fn with_salt<S: Into<Vec<u8>>>(mut self, salt: S) -> Self {
        self.salt = salt.into();
        self
    }

    /// Use cost `N`, block size `r` and parallelization `p`
    ///
    /// Validated when the derivation runs.
    #[must_use]
    pub fn with_cost(mut self, n: u64, r: u32, p: u32) -> Self {
        self.n = n;
        self.r = r;
        self.p = p;
        self
    }

    /// Use the salt and costs of `snrp`
    ///
    /// A malformed salt surfaces as an error from [`derive`](Self::derive).
    #[must_use]
    pub fn with_snrp(mut self, snrp: &Snrp) -> Self {
        match snrp.salt() {
            Ok(salt) => self.salt = salt,
            Err(e) => self.pending_error = Some(e),
        }
        self.with_cost(snrp.n, snrp.r, snrp.p)
    }

    /// Derive `len` bytes
    #[must_use]
    pub fn with_output_len(mut self, len: usize) -> Self {
        self.output_len = len;
        self
    }

    /// Override the runner's limits for this derivation
    #[must_use]
    pub fn with_limits(mut self, limits: ScryptLimits) -> Self {
        self.limits = Some(limits);
        self
    }

    /// Queue on `runner` instead of the process-wide one
    #[must_use]
    pub fn with_runner(mut self, runner: ScryptRunner) -> Self {
        self.runner = Some(runner);
        self
    }

    /// Add `on_result` handler
    #[must_use]
    pub fn on_result<F, T>(self, handler: F) -> ScryptBuilderWithHandler<F, T>
    where
        F: FnOnce(Result<DerivedKey>) -> T + Send + 'static,
        T: NotResult + Send + 'static,
    {
        ScryptBuilderWithHandler {
            builder: self,
            result_handler: handler,
            _phantom: std::marker::PhantomData,
        }
    }

    /// Derive a key from `password`
    ///
    /// Must be called within a tokio runtime.
    #[must_use]
    pub fn derive<P: Into<Vec<u8>>>(self, password: P) -> AsyncKdfResult {
        let (runner, job) = match self.into_job(password) {
            Ok(parts) => parts,
            Err(e) => return AsyncKdfResult::error(e),
        };

        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            let result = runner.derive(job).await;
            let _ = tx.send(result);
        });

        AsyncKdfResult::new(rx)
    }

    fn into_job<P: Into<Vec<u8>>>(self, password: P) -> Result<(ScryptRunner, ScryptJob)> {
        if let Some(e) = self.pending_error {
            return Err(e);
        }
        let mut job = ScryptJob::new(password, self.salt, self.n, self.r, self.p, self.output_len);
        if let Some(limits) = self.limits {
            job = job.with_limits(limits);
        }
        let runner = self
            .runner
            .unwrap_or_else(|| ScryptRunner::global().clone());
        Ok((runner, job))
    }
}

impl<F, T> ScryptBuilderWithHandler<F, T>
where
    F: FnOnce(Result<DerivedKey>) -> T + Send + 'static,
    T: NotResult + Send + 'static,
{
    /// Derive a key from `password` and hand the result to the handler
    ///
    /// Must be called within a tokio runtime.
    pub fn derive<P: Into<Vec<u8>>>(self, password: P) -> AsyncKdfResultWithHandler<F> {
        self.builder.derive(password).on_result(self.result_handler)
    }
}
