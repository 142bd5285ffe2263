use std::time::Duration;

use chrono::TimeDelta;
use rand::RngCore;

use fakelog_core::{Outcome, Priority, Record};
use fakelog_generate::model::default_window_start;
use fakelog_generate::{
    BatchGenerator, GenerationError, RecordFactory, RecordSource, RetryPolicy, seeded_rng,
};

fn factory() -> RecordFactory {
    RecordFactory::new(
        default_window_start(),
        TimeDelta::days(30),
        &Outcome::ALL,
        &Priority::ALL,
        None,
    )
    .expect("factory")
}

/// Fails on the first record of the first `failures` attempts.
struct FlakySource {
    inner: RecordFactory,
    failures: u32,
    calls: u32,
}

impl RecordSource for FlakySource {
    fn next_record(&mut self, rng: &mut dyn RngCore) -> Result<Record, GenerationError> {
        self.calls += 1;
        if self.failures > 0 {
            self.failures -= 1;
            return Err(GenerationError::Transient("simulated failure".to_string()));
        }
        self.inner.next_record(rng)
    }
}

struct FailingSource {
    calls: u32,
    error: fn() -> GenerationError,
}

impl RecordSource for FailingSource {
    fn next_record(&mut self, _rng: &mut dyn RngCore) -> Result<Record, GenerationError> {
        self.calls += 1;
        Err((self.error)())
    }
}

fn policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        retry_delay: Duration::from_secs(2),
    }
}

#[test]
fn recovers_when_failures_are_below_the_limit() {
    let mut sleeps = Vec::new();
    let mut source = FlakySource {
        inner: factory(),
        failures: 2,
        calls: 0,
    };

    let batch = BatchGenerator::with_sleep(policy(3), 10_000, |delay| sleeps.push(delay))
        .generate(&mut source, 25, &mut seeded_rng(Some(1)))
        .expect("third attempt succeeds");

    assert_eq!(batch.len(), 25);
    assert_eq!(source.calls, 2 + 25);
    assert_eq!(sleeps, vec![Duration::from_secs(2); 2]);
}

#[test]
fn exhausting_attempts_is_terminal() {
    let mut sleeps = 0;
    let mut source = FailingSource {
        calls: 0,
        error: || GenerationError::Transient("always".to_string()),
    };

    let err = BatchGenerator::with_sleep(policy(3), 10_000, |_| sleeps += 1)
        .generate(&mut source, 10, &mut seeded_rng(Some(1)))
        .expect_err("always fails");

    assert!(err.is_terminal());
    match err {
        GenerationError::Terminal { attempts, source } => {
            assert_eq!(attempts, 3);
            assert!(matches!(*source, GenerationError::Transient(_)));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(source.calls, 3);
    assert_eq!(sleeps, 2);
}

#[test]
fn configuration_errors_are_not_retried() {
    let mut sleeps = 0;
    let mut source = FailingSource {
        calls: 0,
        error: || GenerationError::InvalidConfiguration("bad".to_string()),
    };

    let err = BatchGenerator::with_sleep(policy(3), 10_000, |_| sleeps += 1)
        .generate(&mut source, 10, &mut seeded_rng(Some(1)))
        .expect_err("invalid configuration");

    assert!(matches!(err, GenerationError::InvalidConfiguration(_)));
    assert_eq!(source.calls, 1);
    assert_eq!(sleeps, 0);
}

#[test]
fn zero_attempts_is_rejected() {
    let mut source = factory();
    let err = BatchGenerator::with_sleep(policy(0), 10_000, |_| {})
        .generate(&mut source, 10, &mut seeded_rng(Some(1)))
        .expect_err("zero attempts");
    assert!(matches!(err, GenerationError::InvalidConfiguration(_)));
}

#[test]
fn single_attempt_policy_fails_without_sleeping() {
    let mut sleeps = 0;
    let mut source = FlakySource {
        inner: factory(),
        failures: 1,
        calls: 0,
    };
    let err = BatchGenerator::with_sleep(policy(1), 10_000, |_| sleeps += 1)
        .generate(&mut source, 5, &mut seeded_rng(Some(1)))
        .expect_err("one attempt only");
    assert!(err.is_terminal());
    assert_eq!(sleeps, 0);
}
