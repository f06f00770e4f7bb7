use crate::filter::Filter;
use anyhow::Context;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::path::PathBuf;
use wandb_run_model::{load_runs, Run};

/// Anything that can answer a filtered run query for a project.
pub trait RunStore {
    fn runs<'a>(
        &'a self,
        project: &'a str,
        filter: &'a Filter,
    ) -> BoxFuture<'a, anyhow::Result<Vec<Run>>>;
}

/// A project reference, either `project` or `entity/project`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPath {
    pub entity: Option<String>,
    pub project: String,
}

impl ProjectPath {
    pub fn parse(path: &str) -> Self {
        match path.trim().split_once('/') {
            Some((entity, project)) if !entity.is_empty() => Self {
                entity: Some(entity.to_string()),
                project: project.to_string(),
            },
            Some((_, project)) => Self {
                entity: None,
                project: project.to_string(),
            },
            None => Self {
                entity: None,
                project: path.trim().to_string(),
            },
        }
    }
}

/// Run store backed by records held in memory.
///
/// Used for offline reports from a JSON Lines export and by the tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryRunStore {
    runs: Vec<Run>,
}

impl MemoryRunStore {
    pub fn new(runs: Vec<Run>) -> Self {
        Self { runs }
    }

    pub fn from_file(path: PathBuf) -> anyhow::Result<Self> {
        let runs = load_runs(path.clone())
            .with_context(|| format!("Failed to load runs from {}", path.display()))?;
        log::debug!("Loaded {} runs from {}", runs.len(), path.display());
        Ok(Self::new(runs))
    }
}

impl RunStore for MemoryRunStore {
    fn runs<'a>(
        &'a self,
        project: &'a str,
        filter: &'a Filter,
    ) -> BoxFuture<'a, anyhow::Result<Vec<Run>>> {
        let path = ProjectPath::parse(project);
        let matched = self
            .runs
            .iter()
            .filter(|run| run.project == path.project)
            .filter(|run| path.entity.as_ref().is_none_or(|e| *e == run.entity))
            .filter(|run| filter.matches(run))
            .cloned()
            .collect::<Vec<_>>();

        async move { Ok(matched) }.boxed()
    }
}
