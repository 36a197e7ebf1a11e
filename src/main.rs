use clap::{Parser, ValueEnum};
use miette::{IntoDiagnostic, Result};
use oddjobs::application::marketplace::Marketplace;
use oddjobs::config::MarketplaceConfig;
use oddjobs::domain::job::JobFilter;
use oddjobs::domain::payment::PaymentFilter;
use oddjobs::domain::ports::Stores;
use oddjobs::domain::user::Role;
use oddjobs::interfaces::csv::command_reader::CommandReader;
use oddjobs::interfaces::csv::report_writer::{ReportWriter, UserSummary};
use rust_decimal::Decimal;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Report {
    Jobs,
    Payments,
    Users,
    Platform,
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input commands CSV file
    input: PathBuf,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Report printed to stdout after the commands are replayed
    #[arg(long, value_enum, default_value_t = Report::Jobs)]
    report: Report,

    /// JSON marketplace configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Overrides the configured platform fee rate
    #[arg(long)]
    fee_rate: Option<Decimal>,

    /// Overrides the configured currency
    #[arg(long)]
    currency: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => MarketplaceConfig::from_file(path).into_diagnostic()?,
        None => MarketplaceConfig::default(),
    };
    if let Some(rate) = cli.fee_rate {
        config.platform_fee_rate = rate;
    }
    if let Some(currency) = cli.currency {
        config.currency = currency;
    }

    let stores = open_stores(cli.db_path)?;
    let market = Marketplace::with_config(stores, &config).into_diagnostic()?;

    let file = File::open(&cli.input).into_diagnostic()?;
    let reader = CommandReader::new(file);
    let mut applied = 0usize;
    for (line, record) in reader.commands().enumerate() {
        match record {
            Ok(command) => {
                let kind = command.r#type;
                match command.execute(&market).await {
                    Ok(()) => applied += 1,
                    Err(e) => {
                        warn!(line = line + 2, command = ?kind, error = %e, "rejected command")
                    }
                }
            }
            Err(e) => warn!(line = line + 2, error = %e, "Error reading command"),
        }
    }
    info!(applied, "commands replayed");

    let stdout = io::stdout();
    let mut writer = ReportWriter::new(stdout.lock());
    match cli.report {
        Report::Jobs => {
            let jobs = market.jobs(&JobFilter::default()).await.into_diagnostic()?;
            writer.write_jobs(&jobs).into_diagnostic()?;
        }
        Report::Payments => {
            let payments = market.payments(&PaymentFilter::default()).await.into_diagnostic()?;
            writer.write_payments(&payments).into_diagnostic()?;
        }
        Report::Users => {
            let mut rows = Vec::new();
            for user in market.users().await.into_diagnostic()? {
                let summary = match user.role {
                    Role::Employer => {
                        let summary = market.employer_summary(user.id).await.into_diagnostic()?;
                        UserSummary::Employer(summary)
                    }
                    Role::Worker => {
                        let summary = market.worker_summary(user.id).await.into_diagnostic()?;
                        UserSummary::Worker(summary)
                    }
                    Role::Admin => UserSummary::Admin,
                };
                rows.push((user, summary));
            }
            writer.write_users(&rows).into_diagnostic()?;
        }
        Report::Platform => {
            let summary = market.platform_summary().await.into_diagnostic()?;
            writer.write_platform(&summary).into_diagnostic()?;
        }
    }

    Ok(())
}

#[cfg(feature = "storage-rocksdb")]
fn open_stores(db_path: Option<PathBuf>) -> Result<Stores> {
    use oddjobs::infrastructure::rocksdb::RocksDBStore;

    match db_path {
        Some(path) => {
            info!(path = %path.display(), "opening RocksDB store");
            Ok(RocksDBStore::open(path).into_diagnostic()?.stores())
        }
        None => Ok(Stores::in_memory()),
    }
}

#[cfg(not(feature = "storage-rocksdb"))]
fn open_stores(db_path: Option<PathBuf>) -> Result<Stores> {
    if db_path.is_some() {
        warn!(
            "Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not \
             enabled. Falling back to in-memory storage."
        );
    }
    Ok(Stores::in_memory())
}
