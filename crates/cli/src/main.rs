mod cli;
mod report;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use sumo_import_client::SumoClient;
use sumo_import_core::{config::load_dotenv, FileConfig, Settings};
use sumo_import_engine::run_import;

use crate::cli::CliArgs;

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    load_dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(args.log_filter())),
        )
        .with_target(false)
        .init();

    let file = FileConfig::load(args.config.as_deref()).context("failed to load configuration")?;
    let settings = Settings::resolve(&args.overrides(), file.as_ref())
        .context("failed to resolve settings")?;
    settings.log_summary();

    info!("Step 1/5: authenticating");
    let client = SumoClient::connect(settings.credentials.clone(), &settings.endpoint)
        .await
        .context("failed to connect to the Sumo Logic API")?;
    info!(endpoint = %client.endpoint(), "Connected");

    let report = run_import(&client, &settings, &args.source, &args.destination)
        .await
        .with_context(|| format!("import of {} failed", args.source.display()))?;

    report::print_report(&report)?;
    Ok(())
}
