use anyhow::Context;
use clap::Parser;
use wandb_reporter::cli::Args;
use wandb_reporter::store::{MemoryRunStore, RunStore};
use wandb_reporter::wandb::WandbClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let debug = args.debug_enabled();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if debug { "debug" } else { "info" }),
    )
    .init();

    log::info!("Debug Mode On: {debug}");
    log::debug!("RUN_ID: {:?}", args.run_id);
    log::debug!("BASELINE_TAGS: {:?}", args.baseline_tags);
    log::debug!("FILTER_GITHUB_SHA: {:?}", args.filter_github_sha);
    log::debug!("FILTER_SECONDARY_SHA: {:?}", args.filter_secondary_sha);
    log::debug!("DISPLAY_CONFIG_VARS: {:?}", args.display_config_vars);
    log::debug!("DISPLAY_METRICS: {:?}", args.display_metrics);

    let inputs = args.inputs()?;

    let store: Box<dyn RunStore> = match args.runs_file() {
        Some(path) => {
            log::info!("Reading runs from {}", path.display());
            Box::new(MemoryRunStore::from_file(path)?)
        }
        None => Box::new(
            WandbClient::new(
                args.base_url(),
                args.api_key()
                    .context("Cannot query runs without environment variable `WANDB_API_KEY`")?,
            )
            .with_default_entity(args.entity()),
        ),
    };

    wandb_reporter::execute_report(store.as_ref(), &inputs, args.github_output().as_deref())
        .await?;

    Ok(())
}
