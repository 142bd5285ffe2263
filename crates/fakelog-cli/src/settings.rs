use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use fakelog_core::{DEFAULT_MAX_ROWS, Outcome, Priority, TIMESTAMP_FORMAT, parse_timestamp};
use fakelog_generate::model::{DEFAULT_WINDOW_DAYS, default_window_start};
use fakelog_generate::{GenerateOptions, RetryPolicy};

use crate::CliError;

/// Settings file picked up from the working directory when `--config` is absent.
pub const DEFAULT_SETTINGS_FILE: &str = "fakelog.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorSettings {
    pub count: usize,
    pub max_rows: usize,
    /// `YYYY-MM-DD HH:MM:SS`.
    pub window_start: String,
    pub window_days: i64,
    pub outcomes: Vec<Outcome>,
    pub priorities: Vec<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success_weight: Option<f64>,
    /// Outcome name to weight.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome_weights: Option<BTreeMap<String, f64>>,
    pub max_attempts: u32,
    pub retry_delay_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub out_dir: PathBuf,
    pub file_name: String,
    /// Ask the operator whether to stop every N cycles; 0 disables.
    pub prompt_every: u64,
    pub cycle_delay_secs: u64,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            count: DEFAULT_MAX_ROWS,
            max_rows: DEFAULT_MAX_ROWS,
            window_start: default_window_start().format(TIMESTAMP_FORMAT).to_string(),
            window_days: DEFAULT_WINDOW_DAYS,
            outcomes: Outcome::ALL.to_vec(),
            priorities: Priority::ALL.to_vec(),
            success_weight: None,
            outcome_weights: None,
            max_attempts: 3,
            retry_delay_secs: 2,
            seed: None,
            out_dir: PathBuf::from("data"),
            file_name: "synthetic_data.json".to_string(),
            prompt_every: 5,
            cycle_delay_secs: 2,
        }
    }
}

impl GeneratorSettings {
    /// Translate settings into engine options.
    pub fn to_options(&self) -> Result<GenerateOptions, CliError> {
        let window_start = parse_timestamp(&self.window_start)?;
        if self.window_days < 0 {
            return Err(CliError::InvalidConfig(format!(
                "window_days must not be negative, got {}",
                self.window_days
            )));
        }
        let window_length = TimeDelta::try_days(self.window_days).ok_or_else(|| {
            CliError::InvalidConfig(format!("window_days {} is too large", self.window_days))
        })?;

        let outcome_weights = match &self.outcome_weights {
            Some(weights) => Some(
                weights
                    .iter()
                    .map(|(name, weight)| Ok((name.parse::<Outcome>()?, *weight)))
                    .collect::<Result<BTreeMap<_, _>, CliError>>()?,
            ),
            None => None,
        };

        Ok(GenerateOptions {
            count: self.count,
            max_rows: self.max_rows,
            window_start,
            window_length,
            outcomes: self.outcomes.clone(),
            priorities: self.priorities.clone(),
            success_weight: self.success_weight,
            outcome_weights,
            retry: RetryPolicy {
                max_attempts: self.max_attempts,
                retry_delay: Duration::from_secs(self.retry_delay_secs),
            },
        })
    }

    #[cfg(test)]
    pub fn output_path(&self) -> PathBuf {
        self.out_dir.join(&self.file_name)
    }
}

/// Load settings from `path`, or from [`DEFAULT_SETTINGS_FILE`] when it
/// exists, or fall back to defaults.
pub fn load_settings(path: Option<&Path>) -> Result<GeneratorSettings, CliError> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => {
            let default_path = PathBuf::from(DEFAULT_SETTINGS_FILE);
            if !default_path.exists() {
                return Ok(GeneratorSettings::default());
            }
            default_path
        }
    };
    let content = std::fs::read_to_string(&path)?;
    let settings: GeneratorSettings = toml::from_str(&content)?;
    Ok(settings)
}

pub fn encode_settings(settings: &GeneratorSettings) -> Result<String, CliError> {
    Ok(toml::to_string_pretty(settings)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_round_trip_through_toml() {
        let settings = GeneratorSettings::default();
        let encoded = encode_settings(&settings).expect("encode");
        let decoded: GeneratorSettings = toml::from_str(&encoded).expect("decode");
        assert_eq!(decoded, settings);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let settings: GeneratorSettings = toml::from_str(
            r#"
count = 50
success_weight = 0.8
outcomes = ["success", "failure"]
"#,
        )
        .expect("decode");
        assert_eq!(settings.count, 50);
        assert_eq!(settings.success_weight, Some(0.8));
        assert_eq!(settings.outcomes, vec![Outcome::Success, Outcome::Failure]);
        assert_eq!(settings.max_attempts, 3);
        assert_eq!(settings.file_name, "synthetic_data.json");
    }

    #[test]
    fn converts_to_generate_options() {
        let mut settings = GeneratorSettings::default();
        settings.window_start = "2025-02-01 00:00:00".to_string();
        settings.window_days = 7;
        settings.outcome_weights = Some(
            [("success".to_string(), 2.0), ("timeout".to_string(), 1.0)]
                .into_iter()
                .collect(),
        );

        let options = settings.to_options().expect("options");
        assert_eq!(options.window_length, TimeDelta::days(7));
        assert_eq!(
            options.window_start,
            parse_timestamp("2025-02-01 00:00:00").expect("timestamp")
        );
        let weights = options.outcome_weights.expect("weights");
        assert_eq!(weights.get(&Outcome::Success), Some(&2.0));
        assert_eq!(options.retry.retry_delay, Duration::from_secs(2));
    }

    #[test]
    fn rejects_unknown_weight_category() {
        let mut settings = GeneratorSettings::default();
        settings.outcome_weights = Some([("maybe".to_string(), 1.0)].into_iter().collect());
        assert!(settings.to_options().is_err());
    }

    #[test]
    fn rejects_bad_timestamp() {
        let mut settings = GeneratorSettings::default();
        settings.window_start = "yesterday".to_string();
        assert!(settings.to_options().is_err());
    }
}
