use crate::error::InputError;
use crate::input::{non_empty, parse_string_list, select_runs, Inputs};
use crate::wandb::DEFAULT_BASE_URL;
use clap::Parser;
use std::path::PathBuf;

/// Compare W&B runs for a commit or run id against tagged baseline runs.
///
/// Every option can also be given through the environment variable a GitHub Action passes its
/// inputs in. Empty values count as not set.
#[derive(Parser, Debug)]
#[command(about, long_about = None)]
pub struct Args {
    /// The W&B project, as `project` or `entity/project`
    #[arg(long, env = "INPUT_PROJECT_NAME")]
    pub project_name: Option<String>,

    /// Id of a single run to evaluate. Takes precedence over the SHA filters.
    #[arg(long, env = "INPUT_RUN_ID")]
    pub run_id: Option<String>,

    /// Select runs whose `github_sha` config value is this commit
    #[arg(long, env = "INPUT_FILTER_GITHUB_SHA")]
    pub filter_github_sha: Option<String>,

    /// Further narrow the SHA filter by the `secondary_sha` config value
    #[arg(long, env = "INPUT_FILTER_SECONDARY_SHA")]
    pub filter_secondary_sha: Option<String>,

    /// Tags that mark baseline runs, as a list such as `["baseline"]`
    #[arg(long, env = "INPUT_BASELINE_TAGS")]
    pub baseline_tags: Option<String>,

    /// Summary metrics to include in the report, as a list
    #[arg(long, env = "INPUT_DISPLAY_METRICS")]
    pub display_metrics: Option<String>,

    /// Config variables to include in the report, as a list
    #[arg(long, env = "INPUT_DISPLAY_CONFIG_VARS")]
    pub display_config_vars: Option<String>,

    /// Log debugging information. Any non-empty value turns it on.
    #[arg(long, env = "INPUT_DEBUG", num_args = 0..=1, default_missing_value = "true")]
    pub debug: Option<String>,

    /// Directory to write `wandb_report.csv` to
    #[arg(long, env = "GITHUB_WORKSPACE")]
    pub output_dir: Option<PathBuf>,

    /// File to append the workflow outputs to
    #[arg(long, env = "GITHUB_OUTPUT")]
    pub github_output: Option<PathBuf>,

    /// W&B API key
    #[arg(long, env = "WANDB_API_KEY", hide_env_values = true)]
    pub wandb_api_key: Option<String>,

    /// W&B API endpoint
    #[arg(long, env = "WANDB_BASE_URL")]
    pub wandb_base_url: Option<String>,

    /// Entity used when the project name does not include one
    #[arg(long, env = "WANDB_ENTITY")]
    pub wandb_entity: Option<String>,

    /// Read runs from a JSON Lines file instead of querying W&B
    #[arg(long, env = "INPUT_RUNS_FILE")]
    pub runs_file: Option<PathBuf>,
}

impl Args {
    pub fn debug_enabled(&self) -> bool {
        non_empty(self.debug.clone()).is_some()
    }

    /// Validate the report inputs.
    pub fn inputs(&self) -> Result<Inputs, InputError> {
        let baseline_tags = parse_list("BASELINE_TAGS", &self.baseline_tags)?;
        let metrics = parse_list("METRICS", &self.display_metrics)?;
        let config_vars = parse_list("CONFIG_VARS", &self.display_config_vars)?;

        let run_id = non_empty(self.run_id.clone());
        let github_sha = non_empty(self.filter_github_sha.clone());
        let secondary_sha = non_empty(self.filter_secondary_sha.clone());
        let selection = select_runs(
            run_id.as_deref(),
            github_sha.as_deref(),
            secondary_sha.as_deref(),
        )?;

        Ok(Inputs {
            project: non_empty(self.project_name.clone())
                .ok_or(InputError::MissingProject)?
                .trim()
                .to_string(),
            selection,
            baseline_tags,
            metrics,
            config_vars,
            debug: self.debug_enabled(),
            output_dir: self
                .output_dir
                .clone()
                .filter(|dir| !dir.as_os_str().is_empty())
                .unwrap_or_else(|| PathBuf::from(".")),
        })
    }

    pub fn api_key(&self) -> Option<String> {
        non_empty(self.wandb_api_key.clone())
    }

    pub fn base_url(&self) -> String {
        non_empty(self.wandb_base_url.clone()).unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
    }

    pub fn entity(&self) -> Option<String> {
        non_empty(self.wandb_entity.clone())
    }

    pub fn github_output(&self) -> Option<PathBuf> {
        self.github_output
            .clone()
            .filter(|path| !path.as_os_str().is_empty())
    }

    pub fn runs_file(&self) -> Option<PathBuf> {
        self.runs_file
            .clone()
            .filter(|path| !path.as_os_str().is_empty())
    }
}

fn parse_list(name: &str, raw: &Option<String>) -> Result<Vec<String>, InputError> {
    parse_string_list(name, raw.as_deref().unwrap_or_default())
}
