mod registry;
mod run;
mod settings;

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use dialoguer::Confirm;
use thiserror::Error;

use fakelog_core::{CoreError, DEFAULT_MAX_ROWS, Outcome, Priority};
use fakelog_eval::{CompareOptions, ComparisonEngine, EvalError};
use fakelog_generate::{GenerationEngine, GenerationError};
use registry::{LOG_FILE_NAME, RegistryError, RunMetrics, init_logging, write_bytes_atomic};
use run::{Operator, RunControl, run_cycle, run_loop};
use settings::{DEFAULT_SETTINGS_FILE, GeneratorSettings, encode_settings, load_settings};

#[derive(Debug, Error)]
enum CliError {
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),
    #[error("core error: {0}")]
    Core(#[from] CoreError),
    #[error("generation error: {0}")]
    Generation(#[from] GenerationError),
    #[error("evaluation error: {0}")]
    Eval(#[from] EvalError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("toml decode error: {0}")]
    TomlDecode(#[from] toml::de::Error),
    #[error("toml encode error: {0}")]
    TomlEncode(#[from] toml::ser::Error),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

#[derive(Parser, Debug)]
#[command(name = "fakelog", version, about = "Synthetic event-log generator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate and persist a single batch.
    Generate(GenerationArgs),
    /// Generate batches in a loop, comparing each against the previous one.
    Run(RunArgs),
    /// Compare two persisted batches and write a report.
    Compare(CompareArgs),
    /// Manage the settings file.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Write the default settings file.
    Init {
        #[arg(long, default_value = DEFAULT_SETTINGS_FILE)]
        path: PathBuf,
        /// Print to stdout instead of writing a file.
        #[arg(long, default_value_t = false)]
        stdout: bool,
        /// Overwrite an existing file.
        #[arg(long, default_value_t = false)]
        force: bool,
    },
}

#[derive(Args, Debug)]
struct GenerationArgs {
    /// Settings file (TOML). Defaults to ./fakelog.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Records per batch.
    #[arg(long)]
    count: Option<usize>,
    /// Hard cap on batch length.
    #[arg(long)]
    max_rows: Option<usize>,
    /// Window start, `YYYY-MM-DD HH:MM:SS`.
    #[arg(long)]
    start: Option<String>,
    #[arg(long)]
    window_days: Option<i64>,
    /// Comma-separated outcome vocabulary.
    #[arg(long, value_delimiter = ',')]
    outcomes: Vec<String>,
    /// Comma-separated priority vocabulary.
    #[arg(long, value_delimiter = ',')]
    priorities: Vec<String>,
    /// Probability mass for `success` (0.0-1.0).
    #[arg(long)]
    success_weight: Option<f64>,
    #[arg(long)]
    max_attempts: Option<u32>,
    /// Seconds between retry attempts.
    #[arg(long)]
    retry_delay: Option<u64>,
    /// Seed for reproducible batches.
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    out_dir: Option<PathBuf>,
    #[arg(long)]
    file_name: Option<String>,
}

#[derive(Args, Debug)]
struct RunArgs {
    #[command(flatten)]
    generation: GenerationArgs,
    /// Stop after this many cycles.
    #[arg(long)]
    cycles: Option<u64>,
    /// Never ask the operator whether to stop.
    #[arg(long, default_value_t = false)]
    no_prompt: bool,
    /// Ask the operator every N cycles.
    #[arg(long)]
    prompt_every: Option<u64>,
    /// Seconds to wait between cycles.
    #[arg(long)]
    cycle_delay: Option<u64>,
    /// Skip comparing consecutive batches.
    #[arg(long, default_value_t = false)]
    no_compare: bool,
}

#[derive(Args, Debug)]
struct CompareArgs {
    /// Baseline batch (JSON lines).
    old: PathBuf,
    /// Batch to compare against the baseline.
    new: PathBuf,
    /// Output directory for comparison.json and report.md.
    #[arg(long)]
    out: Option<PathBuf>,
    /// Rows kept from each file after sorting by timestamp.
    #[arg(long, default_value_t = DEFAULT_MAX_ROWS)]
    max_rows: usize,
}

impl GenerationArgs {
    fn resolve(self) -> Result<GeneratorSettings, CliError> {
        let mut settings = load_settings(self.config.as_deref())?;
        if let Some(count) = self.count {
            settings.count = count;
        }
        if let Some(max_rows) = self.max_rows {
            settings.max_rows = max_rows;
        }
        if let Some(start) = self.start {
            settings.window_start = start;
        }
        if let Some(window_days) = self.window_days {
            settings.window_days = window_days;
        }
        if !self.outcomes.is_empty() {
            settings.outcomes = self
                .outcomes
                .iter()
                .map(|value| value.parse::<Outcome>())
                .collect::<Result<_, _>>()?;
        }
        if !self.priorities.is_empty() {
            settings.priorities = self
                .priorities
                .iter()
                .map(|value| value.parse::<Priority>())
                .collect::<Result<_, _>>()?;
        }
        if let Some(success_weight) = self.success_weight {
            settings.success_weight = Some(success_weight);
        }
        if let Some(max_attempts) = self.max_attempts {
            settings.max_attempts = max_attempts;
        }
        if let Some(retry_delay) = self.retry_delay {
            settings.retry_delay_secs = retry_delay;
        }
        if let Some(seed) = self.seed {
            settings.seed = Some(seed);
        }
        if let Some(out_dir) = self.out_dir {
            settings.out_dir = out_dir;
        }
        if let Some(file_name) = self.file_name {
            settings.file_name = file_name;
        }
        Ok(settings)
    }
}

fn main() -> Result<(), CliError> {
    let cli = Cli::parse();

    match cli.command {
        Command::Generate(args) => run_generate(args),
        Command::Run(args) => run_forever(args),
        Command::Compare(args) => run_compare(args),
        Command::Config { action } => match action {
            ConfigAction::Init {
                path,
                stdout,
                force,
            } => run_config_init(path, stdout, force),
        },
    }
}

fn run_generate(args: GenerationArgs) -> Result<(), CliError> {
    let settings = args.resolve()?;
    init_logging(Some(&settings.out_dir.join(LOG_FILE_NAME)))?;
    let engine = GenerationEngine::new(settings.to_options()?);
    let mut factory = engine.factory()?;
    let metrics = RunMetrics::new()?;

    let mut sleep = std::thread::sleep;
    let (batch, path) = run_cycle(
        &engine,
        &mut factory,
        &settings,
        settings.seed,
        &metrics,
        &mut sleep,
    )?;

    tracing::info!(event = "batch_written", rows = batch.len(), path = %path.display());
    println!("{}", path.display());
    Ok(())
}

fn run_forever(args: RunArgs) -> Result<(), CliError> {
    let RunArgs {
        generation,
        cycles,
        no_prompt,
        prompt_every,
        cycle_delay,
        no_compare,
    } = args;

    let settings = generation.resolve()?;
    init_logging(Some(&settings.out_dir.join(LOG_FILE_NAME)))?;

    let control = RunControl {
        max_cycles: cycles,
        prompt_every: if no_prompt {
            0
        } else {
            prompt_every.unwrap_or(settings.prompt_every)
        },
        cycle_delay: Duration::from_secs(cycle_delay.unwrap_or(settings.cycle_delay_secs)),
        compare: !no_compare,
    };
    let metrics = RunMetrics::new()?;

    let mut confirm_stop = |cycle: u64| {
        Confirm::new()
            .with_prompt(format!("Cycle {cycle} is a multiple of {}. Stop?", control.prompt_every))
            .default(false)
            .interact()
            .map_err(|err| err.to_string())
    };
    let mut sleep = std::thread::sleep;

    let summary = run_loop(
        &settings,
        &control,
        &metrics,
        Operator {
            confirm_stop: &mut confirm_stop,
            sleep: &mut sleep,
        },
    )?;

    println!(
        "cycles: {}, succeeded: {}, failed: {}",
        summary.cycles, summary.succeeded, summary.failed
    );
    Ok(())
}

fn run_compare(args: CompareArgs) -> Result<(), CliError> {
    init_logging(None)?;
    let engine = ComparisonEngine::new(CompareOptions {
        out_dir: args.out,
        max_rows: args.max_rows,
    });
    let result = engine.run(&args.old, &args.new)?;
    println!("{}", result.markdown);
    println!();
    println!("report: {}", result.report_path.display());
    Ok(())
}

fn run_config_init(path: PathBuf, stdout: bool, force: bool) -> Result<(), CliError> {
    let encoded = encode_settings(&GeneratorSettings::default())?;
    if stdout {
        print!("{encoded}");
        return Ok(());
    }
    if path.exists() && !force {
        return Err(CliError::InvalidConfig(format!(
            "{} already exists; pass --force to overwrite",
            path.display()
        )));
    }
    write_bytes_atomic(&path, encoded.as_bytes())?;
    println!("{}", path.display());
    Ok(())
}
