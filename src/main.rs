use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use pagetally::archive_repo::ArchiveRepo;
use pagetally::collector::{self, CollectOptions};
use pagetally::config::{AppConfig, DEFAULT_CONFIG_PATH};
use pagetally::reader::SnmpCounterReader;
use pagetally::render::{CollectionTable, DatesTable, ReportTable};
use pagetally::{report, version};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[derive(Parser)]
#[command(name = version::NAME, version = version::VERSION, about = version::DESCRIPTION)]
struct Cli {
    /// Configuration file (TOML, or legacy JSON when it ends in .json)
    #[arg(long = "conf", global = true, env = "PAGETALLY_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    conf: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read every device's page counter and archive it under today's date
    Collect {
        /// Overwrite a snapshot already taken today
        #[arg(short, long)]
        refresh: bool,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Pages printed between two archived dates, per device and per group
    Report {
        /// Start date (YYYY-MM-DD)
        start: NaiveDate,

        /// End date (YYYY-MM-DD), defaults to today
        end: Option<NaiveDate>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete every archived snapshot
    Clear,

    /// List archived dates
    Dates,
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    tracing::debug!("{}", version::banner());

    let app_config = AppConfig::load(&cli.conf)
        .with_context(|| format!("loading configuration from {}", cli.conf.display()))?;
    let repo = ArchiveRepo::open(&app_config.database.path)
        .await
        .with_context(|| format!("opening archive {}", app_config.database.path))?;

    match cli.command {
        Commands::Collect { refresh, json } => {
            let devices = app_config.device_descriptors();
            let reader = SnmpCounterReader::new(app_config.snmp.client_options());
            let results = collector::run(
                &reader,
                &repo,
                &devices,
                today(),
                CollectOptions {
                    refresh,
                    concurrency: app_config.snmp.concurrency,
                },
            )
            .await;
            if json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else {
                print!("{}", CollectionTable(&results));
            }
        }
        Commands::Report { start, end, json } => {
            let devices = app_config.device_descriptors();
            let end = end.unwrap_or_else(today);
            let report = report::build(&repo, &devices, start, end).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", ReportTable(&report));
            }
        }
        Commands::Clear => {
            let removed = repo.clear().await?;
            repo.vacuum().await?;
            tracing::info!(removed, "archive cleared");
            println!("Cleared {removed} snapshot(s)");
        }
        Commands::Dates => {
            let dates = repo.list_dates().await?;
            print!("{}", DatesTable(&dates));
        }
    }

    Ok(())
}

/// Local calendar date, taken at the moment of the call.
fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}
