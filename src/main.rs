// Entrypoint for the CLI application.
// - Checks credentials before anything else so a missing key never costs a
//   network call.
// - Returns `anyhow::Result` and lets errors end the process.

use anyhow::Context;
use clap::Parser;
use customvision_cli::{
    api::{PredictionClient, TrainingClient},
    cli::Cli,
    config::{self, Credentials},
    regions::RegionTable,
    ui::{self, ConsoleProgress},
    Workflow,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let credentials = Credentials::from_env()?;

    let mut settings = config::load_workflow_config(cli.config.as_deref())?;
    cli.apply(&mut settings);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| settings.log_level.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let regions = match &settings.regions_file {
        Some(path) => RegionTable::from_path(path)?,
        None => RegionTable::builtin()?,
    };

    if !cli.yes && !ui::confirm_project_creation(&settings.project_name, &credentials.endpoint)? {
        println!("Nothing created.");
        return Ok(());
    }

    let training = TrainingClient::new(&credentials).context("Failed to build training client")?;
    let prediction =
        PredictionClient::new(&credentials).context("Failed to build prediction client")?;

    let progress = ConsoleProgress::new();
    let report = Workflow::new(&training, &prediction, &settings, &regions)
        .with_progress(&progress)
        .run()
        .await?;

    ui::print_summary(&report);
    ui::print_results(&report.prediction);
    Ok(())
}
