use crate::frame::concat_diagonal;
use crate::input::Inputs;
use crate::summary::summarize_runs;
use anyhow::Context;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use wandb_run_model::Run;

pub const REPORT_FILE_NAME: &str = "wandb_report.csv";
pub const CANDIDATE_CATEGORY: &str = "candidate";
pub const BASELINE_CATEGORY: &str = "baseline";

/// Build the comparison table, candidate rows first.
pub fn build_report(
    candidates: &[&Run],
    baselines: &[&Run],
    inputs: &Inputs,
) -> anyhow::Result<DataFrame> {
    let candidate_frame = summarize_runs(
        candidates,
        CANDIDATE_CATEGORY,
        inputs.debug,
        &inputs.metrics,
        &inputs.config_vars,
    )
    .context("Summarize candidate runs")?;
    let baseline_frame = summarize_runs(
        baselines,
        BASELINE_CATEGORY,
        inputs.debug,
        &inputs.metrics,
        &inputs.config_vars,
    )
    .context("Summarize baseline runs")?;

    concat_diagonal(&[candidate_frame, baseline_frame])
}

/// Write the table as CSV with a header row to [REPORT_FILE_NAME] in `output_dir`.
pub fn write_report(frame: &mut DataFrame, output_dir: &Path) -> anyhow::Result<PathBuf> {
    let path = output_dir.join(REPORT_FILE_NAME);
    log::debug!("Writing report to {}", path.display());

    let mut file = std::fs::File::create(&path)
        .with_context(|| format!("Failed to create report file {}", path.display()))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(frame)
        .with_context(|| format!("Failed to write report to {}", path.display()))?;

    Ok(path)
}
