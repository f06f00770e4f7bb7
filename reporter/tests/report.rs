use std::path::Path;
use wandb_reporter::execute_report;
use wandb_reporter::input::{Inputs, Selection};
use wandb_reporter::outputs::PipelineOutputs;
use wandb_reporter::report::REPORT_FILE_NAME;
use wandb_reporter::store::MemoryRunStore;

fn fixture_store() -> anyhow::Result<MemoryRunStore> {
    env_logger::try_init().ok();

    MemoryRunStore::from_file(
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("test_data")
            .join("runs.jsonl"),
    )
}

fn inputs(selection: Selection, output_dir: &Path) -> Inputs {
    Inputs {
        project: "team/proj".to_string(),
        selection,
        baseline_tags: vec!["baseline".to_string()],
        metrics: vec!["loss".to_string(), "acc".to_string()],
        config_vars: vec!["lr".to_string()],
        debug: true,
        output_dir: output_dir.to_path_buf(),
    }
}

fn sha(github_sha: &str, secondary_sha: Option<&str>) -> Selection {
    Selection::Sha {
        github_sha: github_sha.to_string(),
        secondary_sha: secondary_sha.map(str::to_string),
    }
}

fn run_id(run_id: &str) -> Selection {
    Selection::RunId {
        run_id: run_id.to_string(),
        ignored_sha: None,
    }
}

/// `(run id, __eval.category)` for each data row of the written report
///
/// Tag lists contain commas, so the id is taken from the run URL in the first column and the
/// category from the last.
fn report_rows(path: &Path) -> anyhow::Result<Vec<(String, String)>> {
    let content = std::fs::read_to_string(path)?;

    Ok(content
        .lines()
        .skip(1)
        .map(|line| {
            let url = line.split(',').next().unwrap_or_default();
            let category = line.rsplit(',').next().unwrap_or_default();
            (
                url.rsplit('/').next().unwrap_or_default().to_string(),
                category.to_string(),
            )
        })
        .collect())
}

fn row(id: &str, category: &str) -> (String, String) {
    (id.to_string(), category.to_string())
}

#[tokio::test]
async fn sha_selects_commit_runs() -> anyhow::Result<()> {
    let store = fixture_store()?;
    let dir = tempfile::tempdir()?;
    let github_output = dir.path().join("github_output");

    let outcome = execute_report(
        &store,
        &inputs(sha("abc123", None), dir.path()),
        Some(github_output.as_path()),
    )
    .await?;

    pretty_assertions::assert_eq!(
        outcome.outputs,
        PipelineOutputs {
            complete: false,
            single_run: false,
            num_finished: 2,
            num_running: 1,
            num_crashed: 1,
            num_aborted: 0,
            num_baselines: 2,
        }
    );

    let report = outcome.report.expect("finished runs should produce a report");
    assert_eq!(report.rows, 4);
    assert_eq!(report.path, dir.path().join(REPORT_FILE_NAME));
    pretty_assertions::assert_eq!(
        report_rows(&report.path)?,
        vec![
            row("c1", "candidate"),
            row("b3", "candidate"),
            row("b1", "baseline"),
            row("b2", "baseline"),
        ]
    );

    let written = std::fs::read_to_string(github_output)?;
    assert!(written.contains("BOOL_COMPLETE=False\n"));
    assert!(written.contains("NUM_BASELINES=2\n"));
    Ok(())
}

#[tokio::test]
async fn secondary_sha_narrows_candidates() -> anyhow::Result<()> {
    let store = fixture_store()?;
    let dir = tempfile::tempdir()?;

    let outcome = execute_report(
        &store,
        &inputs(sha("abc123", Some("def456")), dir.path()),
        None,
    )
    .await?;

    pretty_assertions::assert_eq!(
        outcome.outputs,
        PipelineOutputs {
            complete: false,
            single_run: false,
            num_finished: 1,
            num_running: 1,
            num_crashed: 0,
            num_aborted: 0,
            num_baselines: 3,
        }
    );

    // b3 shares the commit but not the secondary SHA, so it stays a baseline
    let report = outcome.report.expect("report");
    pretty_assertions::assert_eq!(
        report_rows(&report.path)?,
        vec![
            row("c1", "candidate"),
            row("b1", "baseline"),
            row("b2", "baseline"),
            row("b3", "baseline"),
        ]
    );
    Ok(())
}

#[tokio::test]
async fn run_id_selects_single_run() -> anyhow::Result<()> {
    let store = fixture_store()?;
    let dir = tempfile::tempdir()?;

    let outcome = execute_report(&store, &inputs(run_id("run42"), dir.path()), None).await?;

    pretty_assertions::assert_eq!(
        outcome.outputs,
        PipelineOutputs {
            complete: true,
            single_run: true,
            num_finished: 1,
            num_running: 0,
            num_crashed: 0,
            num_aborted: 0,
            num_baselines: 3,
        }
    );

    let report = outcome.report.expect("report");
    let content = std::fs::read_to_string(&report.path)?;
    assert!(content.starts_with(
        "run.url,run.name,run.tags,run.id,run.entity,run.project,github_sha,loss,acc,_lr,__eval.category\n"
    ));
    assert!(content.contains(
        "https://wandb.ai/team/proj/runs/run42,display-run42,[],run42,team,proj,0ddba11,0.15,0.93,,candidate\n"
    ));
    pretty_assertions::assert_eq!(
        report_rows(&report.path)?,
        vec![
            row("run42", "candidate"),
            row("b1", "baseline"),
            row("b2", "baseline"),
            row("b3", "baseline"),
        ]
    );
    Ok(())
}

#[tokio::test]
async fn no_finished_runs_writes_no_report() -> anyhow::Result<()> {
    let store = fixture_store()?;
    let dir = tempfile::tempdir()?;

    let outcome = execute_report(&store, &inputs(run_id("missing"), dir.path()), None).await?;

    pretty_assertions::assert_eq!(
        outcome.outputs,
        PipelineOutputs {
            complete: false,
            single_run: false,
            num_finished: 0,
            num_running: 0,
            num_crashed: 0,
            num_aborted: 0,
            num_baselines: 3,
        }
    );
    assert!(outcome.report.is_none());
    assert!(!dir.path().join(REPORT_FILE_NAME).exists());
    Ok(())
}

#[tokio::test]
async fn only_running_runs_writes_no_report() -> anyhow::Result<()> {
    let store = fixture_store()?;
    let dir = tempfile::tempdir()?;

    let outcome = execute_report(&store, &inputs(run_id("c2"), dir.path()), None).await?;

    assert_eq!(outcome.outputs.num_running, 1);
    assert!(outcome.outputs.single_run);
    assert!(!outcome.outputs.complete);
    assert!(outcome.report.is_none());
    assert!(!dir.path().join(REPORT_FILE_NAME).exists());
    Ok(())
}
