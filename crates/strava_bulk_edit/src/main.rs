mod cli;
mod prompt;

use clap::Parser;
use strava_bulk_client::{Config, run_bulk_edit};

use crate::cli::Cli;

fn init_tracing() {
    // `STRAVA_BULK_EDIT_LOG_LEVEL` wins over `RUST_LOG`; default `info`.
    let log_env = std::env::var("STRAVA_BULK_EDIT_LOG_LEVEL")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "info".to_string());
    let combined_filter = format!("{},reqwest=warn,hyper_util=warn", log_env);
    let env_filter = tracing_subscriber::EnvFilter::try_new(combined_filter)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,reqwest=warn,hyper_util=warn"));
    tracing_subscriber::fmt()
        .compact()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .with_env_filter(env_filter)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    // Everything the user typed is checked before any credentials are asked for.
    let range = cli.date_range()?;
    let payload = cli.command.payload();
    let config = Config::from_env()?;
    let credentials = prompt::credentials(&config)?;

    let updated = run_bulk_edit(&config, &credentials, range, &payload).await?;
    tracing::info!("strava-bulk-edit: updated {} activities", updated);
    Ok(())
}
