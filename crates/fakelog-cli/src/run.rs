use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::{error, info, warn};
use uuid::Uuid;

use fakelog_core::Batch;
use fakelog_eval::{compare, log_observations};
use fakelog_generate::output::jsonl::{count_lines, write_batch_jsonl};
use fakelog_generate::{GenerationEngine, GenerationError, RecordSource, seeded_rng};

use crate::CliError;
use crate::registry::{METRICS_FILE_NAME, RunMetrics};
use crate::settings::GeneratorSettings;

/// Loop controls for the run orchestrator.
#[derive(Debug, Clone)]
pub struct RunControl {
    /// Stop after this many cycles; `None` loops until the operator stops.
    pub max_cycles: Option<u64>,
    /// Ask the operator every N cycles; 0 disables the prompt.
    pub prompt_every: u64,
    pub cycle_delay: Duration,
    /// Diff each new batch against the previous cycle's batch.
    pub compare: bool,
}

/// Totals reported when the loop ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub cycles: u64,
    pub succeeded: u64,
    pub failed: u64,
}

/// Operator-facing hooks, injected so the loop can run unattended in tests.
pub struct Operator<'a> {
    /// Returns `Ok(true)` when the operator wants to stop after `cycle`.
    pub confirm_stop: &'a mut dyn FnMut(u64) -> Result<bool, String>,
    pub sleep: &'a mut dyn FnMut(Duration),
}

/// Generate one batch from `source`, persist it and export metrics.
///
/// Only a batch that exhausts its retries counts as a failed run. Other
/// errors are returned without touching the counters.
pub fn run_cycle(
    engine: &GenerationEngine,
    source: &mut dyn RecordSource,
    settings: &GeneratorSettings,
    seed: Option<u64>,
    metrics: &RunMetrics,
    sleep: &mut dyn FnMut(Duration),
) -> Result<(Batch, PathBuf), CliError> {
    let metrics_path = settings.out_dir.join(METRICS_FILE_NAME);
    let mut rng = seeded_rng(seed);
    let batch = match engine.run_source(source, &mut rng, |delay| sleep(delay)) {
        Ok(batch) => batch,
        Err(err @ GenerationError::Terminal { .. }) => {
            metrics.record_failure();
            metrics.write_textfile(&metrics_path)?;
            return Err(err.into());
        }
        Err(err) => return Err(err.into()),
    };
    let path = write_batch_jsonl(&settings.out_dir, &settings.file_name, &batch)?;
    metrics.record_success(count_lines(&path)?);
    metrics.write_textfile(&metrics_path)?;
    Ok((batch, path))
}

/// Drive generation cycles until the cycle limit or the operator stops.
///
/// A cycle that exhausts its retries is counted as failed and writes no
/// file; the loop carries on. Invalid configuration stops the loop.
pub fn run_loop(
    settings: &GeneratorSettings,
    control: &RunControl,
    metrics: &RunMetrics,
    operator: Operator<'_>,
) -> Result<RunSummary, CliError> {
    let engine = GenerationEngine::new(settings.to_options()?);
    let mut factory = engine.factory()?;
    run_loop_with_source(&engine, &mut factory, settings, control, metrics, operator)
}

/// [`run_loop`] over an explicit record source.
pub fn run_loop_with_source(
    engine: &GenerationEngine,
    source: &mut dyn RecordSource,
    settings: &GeneratorSettings,
    control: &RunControl,
    metrics: &RunMetrics,
    operator: Operator<'_>,
) -> Result<RunSummary, CliError> {
    let run_id = Uuid::new_v4().to_string();
    let Operator {
        confirm_stop,
        sleep,
    } = operator;

    info!(
        event = "run_started",
        run_id = %run_id,
        rows = engine.options().count,
        seed = settings.seed
    );

    let mut summary = RunSummary {
        cycles: 0,
        succeeded: 0,
        failed: 0,
    };
    let mut previous: Option<Batch> = None;

    loop {
        summary.cycles += 1;
        let cycle = summary.cycles;
        let started = Instant::now();
        let seed = settings.seed.map(|seed| seed.wrapping_add(cycle - 1));

        match run_cycle(engine, &mut *source, settings, seed, metrics, &mut *sleep) {
            Ok((batch, path)) => {
                summary.succeeded += 1;
                info!(
                    event = "batch_written",
                    cycle,
                    rows = batch.len(),
                    path = %path.display(),
                    duration_ms = started.elapsed().as_millis() as u64,
                    "Synthetic data saved to {}",
                    path.display()
                );
                if control.compare {
                    if let Some(previous) = &previous {
                        log_observations(&compare(previous, &batch));
                    }
                }
                previous = Some(batch);
            }
            Err(CliError::Generation(err @ GenerationError::Terminal { .. })) => {
                summary.failed += 1;
                error!(
                    event = "cycle_failed",
                    severity = "critical",
                    cycle,
                    error = %err,
                    "cycle produced no output"
                );
            }
            Err(err) => return Err(err),
        }

        info!(event = "run_count", cycle, "Run count: {cycle}");

        if control.max_cycles.is_some_and(|max| cycle >= max) {
            break;
        }

        if control.prompt_every > 0 && cycle % control.prompt_every == 0 {
            match confirm_stop(cycle) {
                Ok(true) => {
                    info!(event = "operator_stop", cycle, "User chose to stop the loop.");
                    break;
                }
                Ok(false) => {}
                Err(err) => {
                    warn!(
                        event = "prompt_failed",
                        error = %err,
                        "Invalid input. Continuing the loop."
                    );
                }
            }
        }

        sleep(control.cycle_delay);
    }

    info!(
        event = "run_finished",
        run_id = %run_id,
        cycles = summary.cycles,
        succeeded = summary.succeeded,
        failed = summary.failed
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fakelog_core::Record;
    use fakelog_generate::RecordFactory;
    use rand::RngCore;

    fn settings(label: &str) -> GeneratorSettings {
        let mut out_dir = std::env::temp_dir();
        out_dir.push(format!("fakelog_run_{label}_{}", Uuid::new_v4()));
        GeneratorSettings {
            count: 40,
            seed: Some(7),
            out_dir,
            ..GeneratorSettings::default()
        }
    }

    fn engine(settings: &GeneratorSettings) -> GenerationEngine {
        GenerationEngine::new(settings.to_options().expect("options"))
    }

    /// Fails the next `failures` records with `error`, then delegates.
    struct FlakySource {
        inner: RecordFactory,
        failures: u32,
        error: fn() -> GenerationError,
    }

    impl RecordSource for FlakySource {
        fn next_record(&mut self, rng: &mut dyn RngCore) -> Result<Record, GenerationError> {
            if self.failures > 0 {
                self.failures -= 1;
                return Err((self.error)());
            }
            self.inner.next_record(rng)
        }
    }

    fn control(max_cycles: Option<u64>, prompt_every: u64) -> RunControl {
        RunControl {
            max_cycles,
            prompt_every,
            cycle_delay: Duration::from_secs(2),
            compare: true,
        }
    }

    #[test]
    fn runs_bounded_cycles_and_exports_metrics() {
        let settings = settings("bounded");
        let metrics = RunMetrics::new().expect("metrics");
        let mut sleeps = Vec::new();
        let mut confirm = |_: u64| -> Result<bool, String> { panic!("prompt disabled") };
        let mut sleep = |delay: Duration| sleeps.push(delay);

        let summary = run_loop(
            &settings,
            &control(Some(3), 0),
            &metrics,
            Operator {
                confirm_stop: &mut confirm,
                sleep: &mut sleep,
            },
        )
        .expect("run loop");

        assert_eq!(
            summary,
            RunSummary {
                cycles: 3,
                succeeded: 3,
                failed: 0
            }
        );
        assert_eq!(metrics.runs_total(), 3);
        assert_eq!(metrics.log_lines(), 40);
        assert_eq!(sleeps, vec![Duration::from_secs(2); 2]);
        assert!(settings.output_path().exists());
        let exported =
            std::fs::read_to_string(settings.out_dir.join(METRICS_FILE_NAME)).expect("metrics");
        assert!(exported.contains("fakelog_runs_total 3"));
    }

    #[test]
    fn operator_can_stop_at_prompt() {
        let settings = settings("prompt");
        let metrics = RunMetrics::new().expect("metrics");
        let mut prompts = Vec::new();
        let mut confirm = |cycle: u64| -> Result<bool, String> {
            prompts.push(cycle);
            Ok(cycle >= 4)
        };
        let mut sleep = |_: Duration| {};

        let summary = run_loop(
            &settings,
            &control(None, 2),
            &metrics,
            Operator {
                confirm_stop: &mut confirm,
                sleep: &mut sleep,
            },
        )
        .expect("run loop");

        assert_eq!(summary.cycles, 4);
        assert_eq!(prompts, vec![2, 4]);
    }

    #[test]
    fn prompt_errors_do_not_stop_the_loop() {
        let settings = settings("prompt_error");
        let metrics = RunMetrics::new().expect("metrics");
        let mut confirm = |_: u64| -> Result<bool, String> { Err("not a terminal".to_string()) };
        let mut sleep = |_: Duration| {};

        let summary = run_loop(
            &settings,
            &control(Some(3), 1),
            &metrics,
            Operator {
                confirm_stop: &mut confirm,
                sleep: &mut sleep,
            },
        )
        .expect("run loop");

        assert_eq!(summary.cycles, 3);
    }

    #[test]
    fn invalid_configuration_stops_the_run() {
        let mut settings = settings("invalid");
        settings.outcomes.clear();
        let metrics = RunMetrics::new().expect("metrics");
        let mut confirm = |_: u64| -> Result<bool, String> { Ok(false) };
        let mut sleep = |_: Duration| {};

        let err = run_loop(
            &settings,
            &control(Some(2), 0),
            &metrics,
            Operator {
                confirm_stop: &mut confirm,
                sleep: &mut sleep,
            },
        )
        .expect_err("invalid configuration");

        assert!(matches!(
            err,
            CliError::Generation(GenerationError::InvalidConfiguration(_))
        ));
        assert!(!settings.output_path().exists());
    }

    #[test]
    fn seeded_cycles_are_reproducible() {
        let settings = settings("seeded");
        let engine = engine(&settings);
        let mut factory = engine.factory().expect("factory");
        let metrics = RunMetrics::new().expect("metrics");
        let mut sleep = |_: Duration| {};
        let mut cycle =
            || run_cycle(&engine, &mut factory, &settings, Some(1), &metrics, &mut sleep);
        let (first, _) = cycle().expect("cycle a");
        let (second, _) = cycle().expect("cycle b");
        assert_eq!(first, second);
        assert_eq!(metrics.runs_total(), 2);
    }

    #[test]
    fn terminal_cycle_is_counted_and_loop_continues() {
        let settings = settings("terminal");
        let engine = engine(&settings);
        let metrics = RunMetrics::new().expect("metrics");
        // Every attempt of the first cycle fails; later cycles succeed.
        let mut source = FlakySource {
            inner: engine.factory().expect("factory"),
            failures: settings.max_attempts,
            error: || GenerationError::Transient("disk hiccup".to_string()),
        };
        let output_path = settings.output_path();
        let mut written_after = Vec::new();
        let mut confirm = |cycle: u64| -> Result<bool, String> {
            written_after.push((cycle, output_path.exists()));
            Ok(false)
        };
        let mut sleeps = Vec::new();
        let mut sleep = |delay: Duration| sleeps.push(delay);

        let summary = run_loop_with_source(
            &engine,
            &mut source,
            &settings,
            &control(Some(3), 1),
            &metrics,
            Operator {
                confirm_stop: &mut confirm,
                sleep: &mut sleep,
            },
        )
        .expect("run loop");

        assert_eq!(
            summary,
            RunSummary {
                cycles: 3,
                succeeded: 2,
                failed: 1
            }
        );
        assert_eq!(metrics.failed_runs_total(), 1);
        assert_eq!(metrics.runs_total(), 2);
        assert_eq!(metrics.log_lines(), 40);
        assert_eq!(written_after, vec![(1, false), (2, true)]);
        // Two retry pauses in the failed cycle, then two pauses between cycles.
        assert_eq!(sleeps.len(), 4);
        let exported =
            std::fs::read_to_string(settings.out_dir.join(METRICS_FILE_NAME)).expect("metrics");
        assert!(exported.contains("fakelog_failed_runs_total 1"));
    }

    #[test]
    fn terminal_cycle_exports_failure_metrics() {
        let settings = settings("terminal_once");
        let engine = engine(&settings);
        let metrics = RunMetrics::new().expect("metrics");
        let mut source = FlakySource {
            inner: engine.factory().expect("factory"),
            failures: u32::MAX,
            error: || GenerationError::Transient("disk hiccup".to_string()),
        };
        let mut sleep = |_: Duration| {};

        let err = run_cycle(&engine, &mut source, &settings, Some(1), &metrics, &mut sleep)
            .expect_err("terminal failure");

        assert!(matches!(
            err,
            CliError::Generation(GenerationError::Terminal { attempts: 3, .. })
        ));
        assert_eq!(metrics.failed_runs_total(), 1);
        assert_eq!(metrics.runs_total(), 0);
        assert!(!settings.output_path().exists());
        assert!(settings.out_dir.join(METRICS_FILE_NAME).exists());
    }

    #[test]
    fn non_terminal_errors_are_not_failed_runs() {
        let settings = settings("not_terminal");
        let engine = engine(&settings);
        let metrics = RunMetrics::new().expect("metrics");
        let mut source = FlakySource {
            inner: engine.factory().expect("factory"),
            failures: u32::MAX,
            error: || GenerationError::InvalidConfiguration("bad vocabulary".to_string()),
        };
        let mut sleeps = Vec::new();
        let mut sleep = |delay: Duration| sleeps.push(delay);

        let err = run_cycle(&engine, &mut source, &settings, Some(1), &metrics, &mut sleep)
            .expect_err("invalid configuration");

        assert!(matches!(
            err,
            CliError::Generation(GenerationError::InvalidConfiguration(_))
        ));
        assert!(sleeps.is_empty());
        assert_eq!(metrics.failed_runs_total(), 0);
        assert_eq!(metrics.runs_total(), 0);
        assert!(!settings.out_dir.join(METRICS_FILE_NAME).exists());
    }
}
