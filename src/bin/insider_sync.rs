use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use insider_sync::{
    DailySchedule, ImportMode, ImportPolicy, InsiderClient, InsiderError, PipelineConfig,
    RefreshController, RefreshSummary, SqliteStore,
};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Skip staged rows that fail to parse instead of aborting the load.
    #[arg(long, global = true)]
    skip_invalid: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Wipe the store and reload it from `start_year` through yesterday.
    Force {
        #[arg(long)]
        start_year: i32,
    },
    /// Append today's filings.
    Daily,
    /// Load the existing staging file without scraping.
    ImportStaged {
        /// Append instead of replacing the store.
        #[arg(long)]
        append: bool,
    },
    /// Run the daily sync at `DAILY_SYNC_HOUR` until interrupted.
    Schedule,
}

#[tokio::main]
async fn main() -> Result<(), InsiderError> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init();

    let cli = Cli::parse();
    let config = PipelineConfig::from_env()?;
    let client = InsiderClient::from_config(&config)?;
    let store = Arc::new(SqliteStore::connect(&config.database_url).await?);

    let policy = if cli.skip_invalid {
        ImportPolicy::SkipInvalid
    } else {
        ImportPolicy::Strict
    };
    let controller = RefreshController::new(client, config.clone(), store).import_policy(policy);

    let summary = match cli.command {
        Command::Force { start_year } => controller.force_refresh(start_year).await?,
        Command::Daily => controller.daily_sync().await?,
        Command::ImportStaged { append } => {
            let mode = if append {
                ImportMode::Append
            } else {
                ImportMode::Replace
            };
            controller.import_staged(mode).await?
        }
        Command::Schedule => {
            let schedule = DailySchedule::from_config(&config)?;
            let shutdown = async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::error!(error = %e, "cannot listen for ctrl-c");
                    std::future::pending::<()>().await;
                }
            };
            return schedule.run(controller, shutdown).await;
        }
    };

    print_summary(&summary)
}

fn print_summary(summary: &RefreshSummary) -> Result<(), InsiderError> {
    let json = serde_json::to_string_pretty(summary)
        .map_err(|e| InsiderError::Data(format!("cannot encode summary: {e}")))?;
    println!("{json}");
    Ok(())
}
