//! COVID-19 ETL command line
//!
//! Usage:
//!   covid-etl fetch_data --country India --start_date 2024-01-01 --end_date 2024-01-31
//!   covid-etl load_csv data/vaccination_data.csv
//!   covid-etl query_data total_cases India
//!   covid-etl query_data top_n_countries_by_metric 5 total_vaccinations
//!   covid-etl query_data daily_trends India new_cases
//!   covid-etl list_tables
//!   covid-etl drop_tables
//!
//! Settings come from the environment or a `.env` file: DB_URL, API_BASE_URL,
//! API_KEY, HTTP_TIMEOUT_SECS.

use anyhow::Result;
use chrono::NaiveDate;
use clap::{CommandFactory, Parser, Subcommand};
use covid_etl::config::Config;
use covid_etl::db::Store;
use covid_etl::fetch::CovidApi;
use covid_etl::filter::parse_bound;
use covid_etl::normalize::CsvDedup;
use covid_etl::pipeline::{ingest_cases, ingest_vaccinations, CaseRequest, IngestOutcome};
use covid_etl::query::{max_metric, resolve_metric, top_n_by_metric, trend, ReportQuery, TOP_N_CANDIDATES};
use covid_etl::report::{render_max, render_top_n, render_trend};
use covid_etl::store::{drop_schema, initialize_schema, list_tables};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "covid-etl", about = "Healthcare ETL CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch data and load into DB
    #[command(name = "fetch_data")]
    FetchData {
        /// Country name (e.g., India)
        #[arg(long)]
        country: String,

        /// Start date (YYYY-MM-DD)
        #[arg(long = "start_date", value_parser = parse_bound)]
        start_date: Option<NaiveDate>,

        /// End date (YYYY-MM-DD)
        #[arg(long = "end_date", value_parser = parse_bound)]
        end_date: Option<NaiveDate>,

        /// Specific date (YYYY-MM-DD), passed to the API
        #[arg(long)]
        date: Option<String>,
    },

    /// Load vaccination data from CSV
    #[command(name = "load_csv")]
    LoadCsv {
        /// Path to CSV file (e.g., data/vaccination_data.csv)
        file_path: PathBuf,

        /// Keep one row per country and date instead of only the latest per country
        #[arg(long = "keep_history", default_value = "false")]
        keep_history: bool,
    },

    /// Query data from database
    #[command(name = "query_data")]
    QueryData {
        /// Metric name or query type (e.g., total_cases or top_n_countries_by_metric)
        column: String,

        /// Country name or number for top_n query
        country: String,

        /// Optional: trend column or metric
        extra_column: Option<String>,
    },

    /// List all tables
    #[command(name = "list_tables")]
    ListTables,

    /// Drop daily_cases and vaccination_data tables
    #[command(name = "drop_tables")]
    DropTables,
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(command: Command, config: &Config, store: &Store) -> covid_etl::Result<()> {
    match command {
        Command::FetchData {
            country,
            start_date,
            end_date,
            date,
        } => {
            let api = CovidApi::new(&config.api_base_url, config.api_key.clone(), config.http_timeout)?;

            println!(
                "\nFetching data for {} from {} to {}...",
                country,
                start_date.map_or_else(|| "beginning".to_string(), |d| d.to_string()),
                end_date.map_or_else(|| "latest".to_string(), |d| d.to_string()),
            );

            let request = CaseRequest {
                country,
                date,
                start_date,
                end_date,
            };

            match ingest_cases(&api, store, &request).await? {
                IngestOutcome::NoData => warn!("No data returned from API."),
                IngestOutcome::NoRecords => warn!("No cleaned records to insert."),
                IngestOutcome::NoStore { candidates } => {
                    warn!(candidates, "Records not loaded: no database connection.")
                }
                IngestOutcome::Loaded { candidates, inserted } => println!(
                    "Loaded {} new of {} records into 'daily_cases' table.\n",
                    inserted, candidates
                ),
            }
        }

        Command::LoadCsv {
            file_path,
            keep_history,
        } => {
            let mode = if keep_history {
                CsvDedup::PerCountryDate
            } else {
                CsvDedup::LatestPerCountry
            };

            match ingest_vaccinations(store, &file_path, mode).await? {
                IngestOutcome::NoData | IngestOutcome::NoRecords => println!("No valid records found to load."),
                IngestOutcome::NoStore { candidates } => {
                    warn!(candidates, "Vaccination records not loaded: no database connection.")
                }
                IngestOutcome::Loaded { candidates, inserted } => {
                    println!("\nLoaded {} new of {} vaccination records.\n", inserted, candidates)
                }
            }
        }

        Command::QueryData {
            column,
            country,
            extra_column,
        } => {
            let query = ReportQuery::parse(&column, &country, extra_column.as_deref())?;
            let Some(pool) = store.pool() else {
                return Ok(());
            };

            match query {
                ReportQuery::TopN { n, metric } => {
                    let top = top_n_by_metric(pool, n, &metric, &TOP_N_CANDIDATES).await?;
                    println!("{}", render_top_n(n, &metric, &top));
                }
                ReportQuery::Trend { country, metric } => {
                    let table = resolve_metric(&metric)?;
                    let rows = trend(pool, table, &country, &metric).await?;
                    if rows.is_empty() {
                        println!("No data found.");
                    } else {
                        print!("{}", render_trend(&metric, &rows));
                    }
                }
                ReportQuery::Max { column, country } => {
                    let table = resolve_metric(&column)?;
                    match max_metric(pool, table, &column, &country).await? {
                        Some(value) => println!("{}", render_max(&column, &country, value)),
                        None => println!("No result found."),
                    }
                }
            }
        }

        Command::ListTables => {
            let Some(pool) = store.pool() else {
                return Ok(());
            };
            initialize_schema(pool).await?;
            for name in list_tables(pool).await? {
                println!("  - {}", name);
            }
        }

        Command::DropTables => {
            let Some(pool) = store.pool() else {
                return Ok(());
            };
            let dropped: Vec<String> = drop_schema(pool)
                .await
                .iter()
                .map(|t| format!("'{}'", t))
                .collect();
            if dropped.is_empty() {
                println!("No tables dropped.");
            } else {
                println!("Tables {} dropped successfully.", dropped.join(" and "));
            }
        }
    }

    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(ExitCode::SUCCESS);
    };

    let config = Config::from_env();
    let store = Store::connect(&config.db_url).await;

    let outcome = run(command, &config, &store).await;

    // Released on every path, including failures
    store.disconnect().await;

    match outcome {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            println!("[ERROR] {}", e);
            Ok(ExitCode::FAILURE)
        }
    }
}
