use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::io::BufRead;
use std::path::PathBuf;

/// Lifecycle state of a run as reported by the run store.
///
/// Only the four states that the reporter classifies get their own variant. Anything else the
/// service reports (`failed`, `killed`, `preempted`, ...) is kept verbatim in [RunState::Other].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RunState {
    Finished,
    Running,
    Crashed,
    Aborted,
    Other(String),
}

impl RunState {
    pub fn as_str(&self) -> &str {
        match self {
            RunState::Finished => "finished",
            RunState::Running => "running",
            RunState::Crashed => "crashed",
            RunState::Aborted => "aborted",
            RunState::Other(state) => state.as_str(),
        }
    }
}

impl From<String> for RunState {
    fn from(value: String) -> Self {
        match value.as_str() {
            "finished" => RunState::Finished,
            "running" => RunState::Running,
            "crashed" => RunState::Crashed,
            "aborted" => RunState::Aborted,
            _ => RunState::Other(value),
        }
    }
}

impl From<&str> for RunState {
    fn from(value: &str) -> Self {
        RunState::from(value.to_string())
    }
}

impl From<RunState> for String {
    fn from(value: RunState) -> Self {
        match value {
            RunState::Other(state) => state,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single recorded run
///
/// Owned by the remote service, this crate never modifies one after it has been loaded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Run {
    /// The unique run id
    ///
    /// This is the value that the run store's `name` filter field compares against.
    pub id: String,
    /// The human readable display name of the run
    pub name: String,
    /// Link to the run in the web UI
    pub url: String,
    /// The user or team that owns the project
    pub entity: String,
    /// The project the run was logged to
    pub project: String,
    pub state: RunState,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Run configuration with any `{"value": ...}` wrappers already removed
    #[serde(default)]
    pub config: BTreeMap<String, Value>,
    /// The final value of each metric logged by the run
    #[serde(default)]
    pub summary_metrics: BTreeMap<String, Value>,
}

impl Run {
    /// Look up a configuration value, `None` if the run was not configured with `key`
    pub fn config_value(&self, key: &str) -> Option<&Value> {
        self.config.get(key)
    }

    /// Look up a summary metric, `None` if the run never logged `key`
    pub fn summary_metric(&self, key: &str) -> Option<&Value> {
        self.summary_metrics.get(key)
    }
}

/// Load runs from a file
///
/// The file should contain one JSON object per line, blank lines are skipped. The recommended file
/// extension is `.jsonl`.
pub fn load_runs(path: PathBuf) -> anyhow::Result<Vec<Run>> {
    let file = std::fs::File::open(path)?;
    let reader = std::io::BufReader::new(file);
    let mut runs = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let run: Run = serde_json::from_str(&line)?;
        runs.push(run);
    }
    Ok(runs)
}
