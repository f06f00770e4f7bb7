use wandb_run_model::{Run, RunState};

/// Candidate runs grouped by state.
#[derive(Debug, Default)]
pub struct ClassifiedRuns<'a> {
    pub finished: Vec<&'a Run>,
    pub running: Vec<&'a Run>,
    pub crashed: Vec<&'a Run>,
    pub aborted: Vec<&'a Run>,
    /// Number of candidate runs, including any in states that no bucket covers
    pub total: usize,
}

impl<'a> ClassifiedRuns<'a> {
    /// Sort runs into the four state buckets.
    ///
    /// Runs in any other state are left out of every bucket.
    pub fn classify(runs: &'a [Run]) -> Self {
        let mut classified = Self {
            total: runs.len(),
            ..Default::default()
        };

        for run in runs {
            match &run.state {
                RunState::Finished => classified.finished.push(run),
                RunState::Running => classified.running.push(run),
                RunState::Crashed => classified.crashed.push(run),
                RunState::Aborted => classified.aborted.push(run),
                RunState::Other(state) => {
                    log::warn!("Run {} has state {state:?}, not counted", run.id);
                }
            }
        }

        classified
    }

    /// At least one run finished and none are still running
    pub fn is_complete(&self) -> bool {
        !self.finished.is_empty() && self.running.is_empty()
    }

    pub fn is_single_run(&self) -> bool {
        self.total == 1
    }
}
