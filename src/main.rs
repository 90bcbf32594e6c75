use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use wqmon_service::analysis::aggregate;
use wqmon_service::config::{self, AppConfig};
use wqmon_service::ingest::csv_source::{self, LoadedTable};
use wqmon_service::logging::{self, DataSource};
use wqmon_service::model::Metric;
use wqmon_service::report;
use wqmon_service::stations;

#[derive(Parser, Debug)]
#[command(author, version, about = "River water-quality (BOD/COD) monitor", long_about = None)]
struct Cli {
    /// Path to the TOML config file
    #[arg(long, default_value = config::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// CSV path or http(s) URL, overriding the configured source
    #[arg(long)]
    source: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the rivers available for selection
    Rivers,
    /// Show the trend chart, station map, and current grades for a river
    Show {
        river: String,
        /// Print the report as JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Grade a single BOD or COD value
    Classify {
        metric: String,
        #[arg(allow_negative_numbers = true)]
        value: f64,
    },
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let mut config = config::load_config(&cli.config)
        .with_context(|| format!("loading config {}", cli.config.display()))?;
    config.apply_env_overrides(|key| std::env::var(key).ok())?;
    if let Some(source) = cli.source {
        config.source.location = source;
    }
    config.validate()?;

    logging::init_logger(
        config.logging.level,
        config.logging.file.as_deref(),
        config.logging.timestamps,
    )
    .context("opening log file")?;
    logging::info(
        DataSource::Config,
        Some(&cli.config.display().to_string()),
        "configuration loaded",
    );

    match cli.command {
        Command::Rivers => {
            let loaded = load(&config)?;
            let mapped = stations::mapped_rivers();
            for river in aggregate::rivers(&loaded.table) {
                if mapped.contains(&river.as_str()) {
                    println!("{}", river);
                } else {
                    println!("{}  (no location data)", river);
                }
            }
            Ok(())
        }
        Command::Show { river, json } => {
            let loaded = load(&config)?;
            let summary = aggregate::summarize_river(
                &loaded.table,
                &river,
                config.split_strategy()?,
                config.display.latest_value,
            );
            if !summary.has_data() {
                logging::log_empty_selection(&river);
            }

            let report = report::build_report(&summary, chrono::Utc::now());
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                report::print_report(&report);
            }
            Ok(())
        }
        Command::Classify { metric, value } => {
            if Metric::from_label(&metric).is_none() {
                logging::warn(
                    DataSource::System,
                    Some(&metric),
                    "unrecognized metric, expected BOD or COD",
                );
            }
            println!("{}", report::classification_line(&metric, value));
            Ok(())
        }
    }
}

/// Load the table or stop the run; no report is built from a failed load.
fn load(config: &AppConfig) -> Result<LoadedTable> {
    let source = config.csv_source();
    logging::info(
        source.data_source(),
        Some(&source.to_string()),
        "loading observation table",
    );
    let loaded = csv_source::load_table(&source, &config.loader_options())
        .with_context(|| format!("loading water-quality data from {}", source))?;
    if loaded.table.is_empty() {
        logging::warn(DataSource::System, None, "observation table has no rows");
    }
    Ok(loaded)
}
