use crate::classify::ClassifiedRuns;
use crate::input::Inputs;
use crate::outputs::PipelineOutputs;
use crate::query::build_query_plan;
use crate::store::RunStore;
use anyhow::Context;
use std::path::{Path, PathBuf};

pub mod classify;
pub mod cli;
pub mod error;
pub mod filter;
mod frame;
pub mod input;
pub mod outputs;
pub mod query;
pub mod report;
pub mod store;
pub mod summary;
pub mod wandb;

/// What a report run produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportOutcome {
    pub outputs: PipelineOutputs,
    /// Set when at least one candidate run had finished
    pub report: Option<WrittenReport>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenReport {
    pub path: PathBuf,
    pub rows: usize,
}

/// Query candidate and baseline runs, emit the workflow outputs and write the comparison report.
pub async fn execute_report<S>(
    store: &S,
    inputs: &Inputs,
    github_output: Option<&Path>,
) -> anyhow::Result<ReportOutcome>
where
    S: RunStore + ?Sized,
{
    let plan = build_query_plan(&inputs.selection, &inputs.baseline_tags);
    log::debug!("Candidate filter: {}", plan.candidates.to_json());
    log::debug!("Baseline filter: {}", plan.baselines.to_json());

    let runs = store
        .runs(&inputs.project, &plan.candidates)
        .await
        .context("Query candidate runs")?;
    let baseline_runs = store
        .runs(&inputs.project, &plan.baselines)
        .await
        .context("Query baseline runs")?;
    log::info!(
        "Found {} candidate runs and {} baseline runs in {}",
        runs.len(),
        baseline_runs.len(),
        inputs.project
    );

    let classified = ClassifiedRuns::classify(&runs);
    let outputs = PipelineOutputs::new(&classified, baseline_runs.len());
    outputs.emit(github_output)?;

    if classified.finished.is_empty() {
        log::info!("No finished runs, not writing a report");
        return Ok(ReportOutcome {
            outputs,
            report: None,
        });
    }

    let baselines = baseline_runs.iter().collect::<Vec<_>>();
    let mut frame = report::build_report(&classified.finished, &baselines, inputs)?;
    let path = report::write_report(&mut frame, &inputs.output_dir)?;
    println!("{} runs written to {}", frame.height(), path.display());

    Ok(ReportOutcome {
        outputs,
        report: Some(WrittenReport {
            path,
            rows: frame.height(),
        }),
    })
}
