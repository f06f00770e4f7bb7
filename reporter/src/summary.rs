use crate::frame::series_from_values;
use itertools::Itertools;
use polars::prelude::*;
use serde_json::Value;
use std::collections::HashSet;
use wandb_run_model::Run;

/// Column holding the label passed to [summarize_runs]
pub const CATEGORY_COLUMN: &str = "__eval.category";

/// Summarize runs into a table with one row per run.
///
/// Each row holds the run's identity, its `github_sha` config value, one column per requested
/// metric and one column per requested config variable. Config variable columns are prefixed
/// with `_` so they don't collide with metrics of the same name. Anything a run doesn't have is
/// null.
///
/// Every column name appears once. A requested metric whose name matches an identity column
/// (`run.id`, `github_sha`, ...) or an earlier metric is skipped with a warning, so the identity
/// column always keeps the run's own value.
pub fn summarize_runs(
    runs: &[&Run],
    category: &str,
    debug: bool,
    metrics: &[String],
    config_vars: &[String],
) -> anyhow::Result<DataFrame> {
    let mut columns = SummaryColumns::default();

    columns.push(text_series("run.url", runs, |r| r.url.clone()));
    columns.push(text_series("run.name", runs, |r| r.name.clone()));
    columns.push(text_series("run.tags", runs, |r| list_literal(&r.tags)));
    columns.push(text_series("run.id", runs, |r| r.id.clone()));
    columns.push(text_series("run.entity", runs, |r| r.entity.clone()));
    columns.push(text_series("run.project", runs, |r| r.project.clone()));
    columns.push(value_series("github_sha", runs, |r| {
        r.config_value("github_sha")
    }));

    for metric in metrics {
        columns.push(value_series(metric, runs, |r| r.summary_metric(metric)));
    }
    for var in config_vars {
        columns.push(value_series(&format!("_{var}"), runs, |r| {
            r.config_value(var)
        }));
    }

    let mut frame = DataFrame::new(columns.into_inner())?;

    if debug {
        log_debug_info(&frame, category)?;
    }

    frame.with_column(Series::new(
        CATEGORY_COLUMN.into(),
        vec![category.to_string(); runs.len()],
    ))?;

    Ok(frame)
}

#[derive(Default)]
struct SummaryColumns {
    names: HashSet<String>,
    columns: Vec<Column>,
}

impl SummaryColumns {
    fn push(&mut self, series: Series) {
        if !self.names.insert(series.name().to_string()) {
            log::warn!("Column {} requested more than once", series.name());
            return;
        }
        self.columns.push(Column::from(series));
    }

    fn into_inner(self) -> Vec<Column> {
        self.columns
    }
}

fn text_series(name: &str, runs: &[&Run], field: impl Fn(&Run) -> String) -> Series {
    Series::new(
        name.into(),
        runs.iter().map(|&run| field(run)).collect::<Vec<_>>(),
    )
}

fn value_series<'r>(
    name: &str,
    runs: &[&'r Run],
    field: impl Fn(&'r Run) -> Option<&'r Value>,
) -> Series {
    let values = runs.iter().map(|&run| field(run)).collect::<Vec<_>>();
    series_from_values(name, &values)
}

/// Render tags the way list literals are written in workflow files, e.g. `['a', 'b']`
fn list_literal(items: &[String]) -> String {
    format!(
        "[{}]",
        items
            .iter()
            .map(|item| format!("'{}'", item.replace('\\', "\\\\").replace('\'', "\\'")))
            .join(", ")
    )
}

fn log_debug_info(frame: &DataFrame, category: &str) -> anyhow::Result<()> {
    log::debug!("=== Debugging information for: {category} runs ===");
    log::debug!("Missing value summary:");
    for column in frame.get_columns() {
        log::debug!("  {:<30} {}", column.name(), column.null_count());
    }

    log::debug!("Preview of Data:");
    if frame.height() == 0 {
        log::debug!("  (no rows)");
        return Ok(());
    }
    for column in frame.get_columns() {
        log::debug!("  {:<30} {}", column.name(), column.get(0)?);
    }

    Ok(())
}
