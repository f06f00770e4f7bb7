use crate::classify::ClassifiedRuns;
use anyhow::Context;
use std::fmt;
use std::io::Write;
use std::path::Path;

/// Scalar results handed back to the workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOutputs {
    pub complete: bool,
    pub single_run: bool,
    pub num_finished: usize,
    pub num_running: usize,
    pub num_crashed: usize,
    pub num_aborted: usize,
    pub num_baselines: usize,
}

impl PipelineOutputs {
    pub fn new(classified: &ClassifiedRuns<'_>, num_baselines: usize) -> Self {
        Self {
            complete: classified.is_complete(),
            single_run: classified.is_single_run(),
            num_finished: classified.finished.len(),
            num_running: classified.running.len(),
            num_crashed: classified.crashed.len(),
            num_aborted: classified.aborted.len(),
            num_baselines,
        }
    }

    /// Output name and value pairs, in the order they are emitted
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("BOOL_COMPLETE", bool_value(self.complete).to_string()),
            ("BOOL_SINGLE_RUN", bool_value(self.single_run).to_string()),
            ("NUM_FINISHED", self.num_finished.to_string()),
            ("NUM_RUNNING", self.num_running.to_string()),
            ("NUM_CRASHED", self.num_crashed.to_string()),
            ("NUM_ABORTED", self.num_aborted.to_string()),
            ("NUM_BASELINES", self.num_baselines.to_string()),
        ]
    }

    /// Print the outputs and, if the workflow gave us an output file, append them there too.
    pub fn emit(&self, github_output: Option<&Path>) -> anyhow::Result<()> {
        print!("{self}");

        if let Some(path) = github_output {
            let mut file = std::fs::OpenOptions::new()
                .append(true)
                .create(true)
                .open(path)
                .with_context(|| format!("Failed to open output file {}", path.display()))?;
            write!(file, "{self}")
                .with_context(|| format!("Failed to write outputs to {}", path.display()))?;
        }

        Ok(())
    }
}

impl fmt::Display for PipelineOutputs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in self.pairs() {
            writeln!(f, "{name}={value}")?;
        }
        Ok(())
    }
}

// Workflows compare against the capitalised form.
fn bool_value(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}
