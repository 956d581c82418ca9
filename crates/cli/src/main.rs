use crate::{
    commands::{Commands, ExportArgs},
    conn::{ConnectionPinger, PostgresConnectionPinger},
    env::EnvManager,
    error::CliError,
};
use clap::Parser;
use engine_config::settings::ExportSettings;
use engine_runtime::execution::executor;
use std::{path::PathBuf, process::ExitCode};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod commands;
mod conn;
mod env;
mod error;

#[derive(Parser)]
#[command(
    name = "orders-export",
    version,
    about = "Exports one day of orders to a CSV archive"
)]
struct Cli {
    /// Load KEY=VALUE lines from this file; set variables take precedence
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let mut env = EnvManager::new();
    if let Some(path) = &cli.env_file {
        env.load_from_file(path)?;
    }

    match cli.command {
        Commands::Export(args) => export(&args, &env).await,
        Commands::TestConn { conn } => {
            let params = conn.to_params(&env)?;
            PostgresConnectionPinger { params }.ping().await
        }
    }
}

async fn export(args: &ExportArgs, env: &EnvManager) -> Result<(), CliError> {
    let settings = ExportSettings::from_builder(args.to_builder(env)?)?;
    let report = executor::run(&settings).await?;

    info!(
        day = %report.window.day(),
        rows = report.rows,
        archive_bytes = report.archive_bytes,
        elapsed_ms = report.elapsed.as_millis() as u64,
        "Done: {}",
        report.archive_path.display()
    );
    if report.csv_kept {
        info!("CSV kept at {}", report.csv_path.display());
    }
    Ok(())
}
