use std::path::{Path, PathBuf};

use tracing::info;

use fakelog_core::DEFAULT_MAX_ROWS;
use fakelog_generate::output::jsonl::read_batch_jsonl;

use crate::compare::{compare, log_observations};
use crate::errors::EvalError;
use crate::model::DistributionReport;
use crate::report::render_report;

/// Options for comparing two persisted batches.
#[derive(Debug, Clone)]
pub struct CompareOptions {
    /// Output directory; defaults to the directory of the new batch.
    pub out_dir: Option<PathBuf>,
    /// Rows kept from each file after sorting.
    pub max_rows: usize,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            out_dir: None,
            max_rows: DEFAULT_MAX_ROWS,
        }
    }
}

/// Result of a file comparison.
#[derive(Debug, Clone)]
pub struct ComparisonResult {
    pub report_path: PathBuf,
    pub comparison_path: PathBuf,
    pub report: DistributionReport,
    pub markdown: String,
}

/// Compare JSON-lines batch files and write report artifacts.
#[derive(Debug, Clone)]
pub struct ComparisonEngine {
    options: CompareOptions,
}

impl ComparisonEngine {
    pub fn new(options: CompareOptions) -> Self {
        Self { options }
    }

    pub fn run(&self, old_path: &Path, new_path: &Path) -> Result<ComparisonResult, EvalError> {
        let old = read_batch_jsonl(old_path, self.options.max_rows)?;
        let new = read_batch_jsonl(new_path, self.options.max_rows)?;
        info!(
            old = %old_path.display(),
            new = %new_path.display(),
            old_rows = old.len(),
            new_rows = new.len(),
            "comparison started"
        );

        let report = compare(&old, &new);
        log_observations(&report);
        let markdown = render_report(&report);

        let out_dir = match &self.options.out_dir {
            Some(dir) => dir.clone(),
            None => new_path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(".")),
        };
        std::fs::create_dir_all(&out_dir)?;

        let comparison_path = out_dir.join("comparison.json");
        std::fs::write(&comparison_path, serde_json::to_vec_pretty(&report)?)?;

        let report_path = out_dir.join("report.md");
        std::fs::write(&report_path, markdown.as_bytes())?;

        info!(path = %report_path.display(), "comparison report written");

        Ok(ComparisonResult {
            report_path,
            comparison_path,
            report,
            markdown,
        })
    }
}
