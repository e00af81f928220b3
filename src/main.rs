use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{Local, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{error, info};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

use mess_feedback_analytics::config::{AppConfig, EngineConfig};
use mess_feedback_analytics::db::{self, PgFeedbackStore};
use mess_feedback_analytics::report::build_report;
use mess_feedback_analytics::{parse_day, AnalysisResult, DailyAnalyzer, DailyReport, ErrorReport};

#[derive(Parser)]
#[command(name = "mess-feedback")]
#[command(about = "Daily food feedback analytics for the hostel mess", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load demo students and feedback for a day (defaults to today)
    Seed {
        #[arg(long)]
        date: Option<String>,
    },
    /// Import meal feedback rows from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Analyze one day and print the result as JSON
    Analyze {
        /// Day to analyze, YYYY-MM-DD
        #[arg(long)]
        date: String,
        #[arg(long, default_value_t = false)]
        pretty: bool,
    },
    /// Write a markdown report for one day
    Report {
        /// Day to analyze, YYYY-MM-DD
        #[arg(long)]
        date: String,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Check database connectivity
    Health,
}

#[derive(Serialize)]
struct HealthStatus {
    status: &'static str,
    database: &'static str,
    timestamp: chrono::DateTime<Utc>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // stdout carries JSON results, so human logs go to stderr and a JSON rolling file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/mess_feedback.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("mess_feedback.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(
            EnvFilter::try_from_env("RUST_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        );

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(
            EnvFilter::try_from_env("RUST_LOG_JSON").unwrap_or_else(|_| EnvFilter::new("debug")),
        );

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::InitDb => {
            let store = connect().await?;
            db::init_db(store.pool()).await?;
            info!("Schema ready");
        }
        Commands::Seed { date } => {
            let date = match date {
                Some(raw) => parse_day(&raw)?,
                None => today(),
            };
            let store = connect().await?;
            let written = db::seed(store.pool(), date).await?;
            info!(written, %date, "Seed data inserted");
        }
        Commands::Import { csv } => {
            let store = connect().await?;
            let imported = db::import_csv(store.pool(), &csv).await?;
            info!(imported, path = %csv.display(), "Import finished");
        }
        Commands::Analyze { date, pretty } => match run_analysis(&date).await {
            Ok(report) => print_json(&report, pretty)?,
            Err(err) => {
                error!(code = %err.code(), error = %err, "daily analysis failed");
                print_json(&ErrorReport::from(&err), pretty)?;
                drop(file_guard);
                std::process::exit(1);
            }
        },
        Commands::Report { date, out } => {
            let report = run_analysis(&date).await?;
            std::fs::write(&out, build_report(&report))
                .with_context(|| format!("failed to write {}", out.display()))?;
            info!(path = %out.display(), "Report written");
        }
        Commands::Health => {
            let database = match connect_store().await {
                Ok(store) => match store.ping().await {
                    Ok(()) => "connected",
                    Err(err) => {
                        error!(error = %err, "database ping failed");
                        "disconnected"
                    }
                },
                Err(err) => {
                    error!(error = %err, "database connection failed");
                    "disconnected"
                }
            };
            let status = HealthStatus {
                status: if database == "connected" {
                    "healthy"
                } else {
                    "unhealthy"
                },
                database,
                timestamp: Utc::now(),
            };
            print_json(&status, true)?;
        }
    }

    Ok(())
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

async fn connect_store() -> AnalysisResult<PgFeedbackStore> {
    let config = AppConfig::from_env()?;
    PgFeedbackStore::connect(&config).await
}

async fn connect() -> anyhow::Result<PgFeedbackStore> {
    connect_store()
        .await
        .context("failed to connect to Postgres")
}

async fn run_analysis(raw_date: &str) -> AnalysisResult<DailyReport> {
    let date = parse_day(raw_date)?;
    let analyzer = DailyAnalyzer::new(EngineConfig::from_env()?);
    let store = connect_store().await?;

    info!(%date, "Starting daily analysis");
    let report = analyzer.analyze_day(&store, date, today()).await?;
    Ok(report)
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> anyhow::Result<()> {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{rendered}");
    Ok(())
}
