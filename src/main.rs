//! kvitas - Entry point for the receipt ledger daemon

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use kvitas::app::App;
use kvitas::config::Settings;
use kvitas::providers::google::GoogleCredentials;
use kvitas::storage::KeychainAccess;

#[derive(Parser)]
#[command(
    name = "kvitas",
    version,
    about = "Tracks shop receipts from Gmail in a weekly Google Sheets ledger",
    long_about = "kvitas polls a Gmail inbox for Maxima receipts, writes each day's \
                  purchases into a monthly Google Sheets ledger and mails a daily \
                  summary with the remaining weekly balance."
)]
struct Cli {
    /// Settings file (defaults to $KVITAS_CONFIG or the user config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run cycles daily at the configured start time (default)
    Run,

    /// Run a single cycle now and print its report
    Once {
        /// Treat this date as today (YYYY-MM-DD)
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },

    /// Store Google OAuth credentials from a JSON file in the keychain
    StoreCredentials {
        /// JSON file with refresh_token, client_id and client_secret
        file: PathBuf,
    },
}

fn load_settings(path: Option<&PathBuf>) -> Result<Settings> {
    let settings = match path {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load()?,
    };
    Ok(settings)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    let settings = load_settings(cli.config.as_ref())?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::StoreCredentials { file } => {
            let credentials = GoogleCredentials::from_file(&file)?;
            let account = &settings.google.keychain_account;
            KeychainAccess::new()
                .store_google_credentials(account, &credentials)
                .await
                .context("storing credentials in the keychain")?;
            println!("Stored Google credentials for `{}`", account);
        }
        Commands::Once { date } => {
            settings.validate()?;
            let app = App::connect(settings).await?;
            let report = match date {
                Some(date) => app.cycle().run_cycle_on(date).await?,
                None => app.cycle().run_cycle().await?,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Run => {
            settings.validate()?;
            tracing::info!("Starting kvitas");
            let app = App::connect(settings).await?;
            app.scheduler()
                .run(async {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        tracing::error!(error = %e, "Failed to listen for ctrl-c");
                        std::future::pending::<()>().await;
                    }
                })
                .await;
        }
    }

    Ok(())
}
