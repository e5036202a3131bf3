//! Command Line Interface for the backtest analyser.
use anyhow::{Context, Result, bail};
use btlens_api::{ApiServer, AppState, AuthConfig, AuthState, ServerConfig};
use btlens_data::config::database_url_from_env;
use btlens_data::{CsvIngestor, Database, IngestConfig, IngestPreset};
use btlens_domain::entities::EquitySeries;
use btlens_domain::metrics::MetricsReport;
use btlens_domain::metrics::monthly::monthly_returns;
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use dotenv::dotenv;
use prettytable::{Table, row};
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "btlens")]
#[command(about = "Backtest equity-curve analytics", long_about = None)]
struct Cli {
    /// Ingest preset (mt5, mt5-utf8, capital, normalized); overrides the environment
    #[arg(long, global = true)]
    preset: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the metrics of a backtest export and record them
    Report {
        /// CSV file to analyse
        file: PathBuf,

        /// First day to include (YYYY-MM-DD)
        #[arg(long)]
        start: Option<NaiveDate>,

        /// Last day to include (YYYY-MM-DD)
        #[arg(long)]
        end: Option<NaiveDate>,

        /// Also print the monthly returns
        #[arg(long)]
        monthly: bool,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// Write the normalised DATE,BALANCE,EQUITY series to stdout
    Series {
        /// CSV file to convert
        file: PathBuf,
    },
    /// Save a backtest for a user
    Store {
        /// CSV file to store
        file: PathBuf,

        /// Backtest name
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        password: String,
    },
    /// List saved backtests
    List {
        /// Only this user's backtests
        #[arg(short, long)]
        username: Option<String>,

        /// Print the most recent metrics rows instead
        #[arg(long)]
        metrics: bool,

        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
    /// Create the database schema
    InitDb,
    /// Run the HTTP server
    Serve,
}

fn ingest_config(preset: Option<&str>) -> Result<IngestConfig> {
    match preset {
        Some(name) => Ok(IngestConfig::preset(name.parse::<IngestPreset>()?)),
        None => Ok(IngestConfig::from_env()?),
    }
}

fn load_series(path: &Path, config: IngestConfig) -> Result<EquitySeries> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let series = CsvIngestor::new(config)
        .ingest_bytes(&bytes)
        .with_context(|| format!("Failed to ingest {}", path.display()))?;
    info!(rows = series.len(), file = %path.display(), "Series loaded");
    Ok(series)
}

async fn open_database() -> Result<Database> {
    let url = database_url_from_env();
    let db = Database::connect(&url)
        .await
        .with_context(|| format!("Failed to open {url}"))?;
    db.migrate().await?;
    Ok(db)
}

fn print_report(report: &MetricsReport) {
    let mut table = Table::new();
    table.add_row(row!["Metric", "Value"]);
    for (name, value) in report.entries() {
        table.add_row(row![name, value]);
    }
    table.printstd();
}

fn print_monthly(series: &EquitySeries) -> Result<()> {
    let mut table = Table::new();
    table.add_row(row!["Month", "Close", "Return %"]);
    for month in monthly_returns(series)? {
        table.add_row(row![
            format!("{}-{:02}", month.year, month.month),
            month.close,
            (month.return_pct * Decimal::ONE_HUNDRED).round_dp(2)
        ]);
    }
    table.printstd();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let preset = cli.preset.as_deref();

    match cli.command {
        Commands::Report {
            file,
            start,
            end,
            monthly,
            format,
        } => {
            let series = load_series(&file, ingest_config(preset)?)?;
            let range = series.day_range(start, end)?;
            let selected = series.filter(&range);
            let report = MetricsReport::compute(&selected)?;

            let source_name = file
                .file_name()
                .map_or_else(|| file.display().to_string(), |n| n.to_string_lossy().into_owned());
            let saved = open_database()
                .await?
                .metrics()
                .insert(&source_name, &report)
                .await?;
            info!(id = saved.id, source = %source_name, "Metrics recorded");

            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&report)?);
                }
                OutputFormat::Table => {
                    println!(
                        "{}: {} rows, {} to {}",
                        file.display(),
                        selected.len(),
                        range.start.date(),
                        range.end.date()
                    );
                    print_report(&report);
                    if monthly {
                        print_monthly(&selected)?;
                    }
                }
            }
        }
        Commands::Series { file } => {
            let series = load_series(&file, ingest_config(preset)?)?;
            print!("{}", CsvIngestor::to_csv(&series)?);
        }
        Commands::Store {
            file,
            name,
            username,
            password,
        } => {
            let auth = AuthState::new(AuthConfig::from_env()?);
            if !auth.verify_credentials(&username, &password) {
                bail!("Invalid username or password");
            }
            let name = name.trim();
            if name.is_empty() {
                bail!("Backtest name must not be empty");
            }

            let series = load_series(&file, ingest_config(preset)?)?;
            let report = MetricsReport::compute(&series)?;
            let db = open_database().await?;
            let (record, _) = db
                .store_backtest(&username, name, &CsvIngestor::to_csv(&series)?, &report)
                .await?;
            println!("Stored backtest {} as #{}", record.backtest_name, record.id);
        }
        Commands::List {
            username,
            metrics,
            limit,
        } => {
            let db = open_database().await?;
            let mut table = Table::new();
            if metrics {
                table.add_row(row!["Source", "Deposit", "Gross profit", "Max DD", "CAGR", "Created"]);
                for record in db.metrics().find_recent(limit).await? {
                    table.add_row(row![
                        record.source_name,
                        record.deposit,
                        record.gross_profit,
                        record.max_drawdown,
                        record.cagr.map_or_else(|| "n/a".to_string(), |c| c.to_string()),
                        record.created_at
                    ]);
                }
            } else {
                let records = match username {
                    Some(user) => db.backtests().find_by_username(&user).await?,
                    None => db.backtests().find_all().await?,
                };
                table.add_row(row!["ID", "User", "Name", "Rows"]);
                for record in records {
                    table.add_row(row![
                        record.id,
                        record.username,
                        record.backtest_name,
                        record.data.lines().count().saturating_sub(1)
                    ]);
                }
            }
            table.printstd();
        }
        Commands::InitDb => {
            open_database().await?;
            println!("Schema ready at {}", database_url_from_env());
        }
        Commands::Serve => {
            let auth = AuthState::new(AuthConfig::from_env()?);
            let server_config = ServerConfig::from_env().map_err(anyhow::Error::msg)?;
            let state = AppState::new(open_database().await?, auth, ingest_config(preset)?);
            ApiServer::new(server_config, state).run().await?;
        }
    }

    Ok(())
}
