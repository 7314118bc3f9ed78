//! Async derivations through the runner and the fluent builder

use std::sync::Arc;

use futures::future::join_all;
use kdfbridge_scrypt::buffer::MemoryBudget;
use kdfbridge_scrypt::{
    Kdf, RunnerConfig, ScryptError, ScryptJob, ScryptKdf, ScryptRunner, Snrp, scrypt,
};

/// Bytes one `N = 1024, r = 1, p = 1` derivation of 32 bytes holds at its peak
const ONE_DERIVATION: usize = 128 + 128 * 1024 + 256 + 32;

fn budgeted_runner(budget: &Arc<MemoryBudget>, max_concurrent: usize) -> ScryptRunner {
    let kdf = ScryptKdf::new().with_buffer_source(budget.clone());
    ScryptRunner::with_kdf(
        kdf,
        RunnerConfig {
            max_concurrent,
            ..RunnerConfig::default()
        },
    )
}

#[tokio::test]
async fn builder_matches_synchronous_derivation() {
    let key = Kdf::scrypt()
        .with_salt(b"NaCl".to_vec())
        .with_cost(1024, 8, 16)
        .with_output_len(64)
        .derive(b"password".to_vec())
        .await
        .expect("valid parameters");

    let expected = scrypt(b"password", b"NaCl", 1024, 8, 16, 64).expect("valid parameters");
    assert_eq!(key, expected);
}

#[tokio::test]
async fn builder_reports_invalid_parameters() {
    let err = Kdf::scrypt()
        .with_salt(b"salt".to_vec())
        .with_cost(1000, 8, 1)
        .derive(b"password".to_vec())
        .await
        .unwrap_err();
    assert!(matches!(err, ScryptError::InvalidParameter(_)));
}

#[tokio::test]
async fn builder_handler_receives_the_result() {
    let len = Kdf::scrypt()
        .with_salt(b"salt".to_vec())
        .with_cost(16, 1, 1)
        .with_output_len(48)
        .on_result(|result| match result {
            Ok(key) => key.len(),
            Err(_) => 0,
        })
        .derive(b"password".to_vec())
        .await;
    assert_eq!(len, 48);
}

#[tokio::test]
async fn builder_handler_receives_validation_errors() {
    let rejected = Kdf::scrypt()
        .with_salt(b"salt".to_vec())
        .with_cost(3, 8, 1)
        .on_result(|result| result.is_err())
        .derive(b"password".to_vec())
        .await;
    assert!(rejected);

    let hex = Kdf::scrypt()
        .with_salt(b"NaCl".to_vec())
        .with_cost(16, 1, 1)
        .with_output_len(64)
        .on_result(|result| result.map(|key| key.to_hex()).unwrap_or_default())
        .derive(b"".to_vec())
        .await;
    assert_eq!(
        hex,
        scrypt(b"", b"NaCl", 16, 1, 1, 64)
            .expect("valid parameters")
            .to_hex()
    );
}

#[tokio::test]
async fn builder_handler_can_keep_the_key() {
    let key = Kdf::scrypt()
        .with_salt(b"NaCl".to_vec())
        .with_cost(16, 1, 1)
        .on_result(|result| result.ok())
        .derive(b"password".to_vec())
        .await
        .expect("valid parameters");
    assert_eq!(key, scrypt(b"password", b"NaCl", 16, 1, 1, 32).expect("valid parameters"));
}

#[tokio::test]
async fn malformed_snrp_salt_fails_the_derivation() {
    let snrp = Snrp {
        salt_hex: "not hex".to_string(),
        ..Snrp::user_id()
    };
    let err = Kdf::scrypt()
        .with_snrp(&snrp)
        .derive(b"password".to_vec())
        .await
        .unwrap_err();
    assert!(matches!(err, ScryptError::InvalidParameter(_)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn runner_serializes_derivations() {
    // Room for exactly one derivation at a time
    let budget = Arc::new(MemoryBudget::new(ONE_DERIVATION));
    let runner = budgeted_runner(&budget, 1);

    let jobs = (0..4u8).map(|i| {
        let runner = runner.clone();
        async move {
            runner
                .derive(ScryptJob::new(vec![i; 8], b"salt".to_vec(), 1024, 1, 1, 32))
                .await
        }
    });
    let keys = join_all(jobs).await;

    for key in &keys {
        assert_eq!(key.as_ref().expect("queued, not refused").len(), 32);
    }
    assert_eq!(budget.peak(), ONE_DERIVATION);
    assert_eq!(budget.in_use(), 0);
}

#[tokio::test]
async fn job_limits_override_runner_limits() {
    let runner = ScryptRunner::default();
    let job = ScryptJob::new(b"password".to_vec(), b"salt".to_vec(), 1024, 8, 1, 32)
        .with_limits(kdfbridge_scrypt::ScryptLimits::DEFAULT.with_max_memory(1 << 20));

    let err = runner.derive(job).await.unwrap_err();
    assert!(matches!(err, ScryptError::InvalidParameter(_)));
}

#[tokio::test]
async fn time_scrypt_reports_elapsed_time() {
    let runner = ScryptRunner::default();
    let snrp = Snrp {
        n: 1024,
        ..Snrp::user_id()
    };

    let timed = runner
        .time_scrypt(b"password", &snrp, 32)
        .await
        .expect("valid parameters");

    let expected = snrp
        .derive(&ScryptKdf::new(), b"password", 32)
        .expect("valid parameters");
    assert_eq!(timed.key, expected);
    assert!(timed.elapsed.as_nanos() > 0);
}

#[tokio::test]
async fn benchmark_is_measured_once() {
    let runner = ScryptRunner::default();
    let first = runner.benchmark().await.expect("benchmark runs");
    let second = runner.benchmark().await.expect("benchmark is cached");
    assert_eq!(first, second);
}

#[tokio::test]
async fn make_snrp_produces_usable_parameters() {
    let runner = ScryptRunner::default();
    let snrp = runner.make_snrp(2000).await.expect("benchmark runs");

    assert_eq!(snrp.salt().expect("hex salt").len(), 32);
    assert_eq!(snrp.r, 8);
    assert!(snrp.n >= 16384 && snrp.n <= 131_072);
    assert!((1..=64).contains(&snrp.p));
    snrp.params().expect("tuned parameters validate");

    let again = runner.make_snrp(2000).await.expect("benchmark is cached");
    assert_ne!(snrp.salt_hex, again.salt_hex);
}
