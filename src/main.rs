use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

use yelp_loader::config::{DEFAULT_BATCH_SIZE, DEFAULT_INSERT_CHUNK_SIZE};
use yelp_loader::{run_load, ConnectionParams, Dataset, LoadError, LoadMode, LoadOptions, LoadReport};

#[derive(Parser)]
#[command(name = "yelp-loader")]
#[command(about = "Load the raw Yelp academic dataset into PostgreSQL")]
struct Args {
    #[command(flatten)]
    db: DbArgs,

    /// Rows read from the source file per batch
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,

    /// Rows per INSERT statement within a batch
    #[arg(long, default_value_t = DEFAULT_INSERT_CHUNK_SIZE)]
    insert_chunk_size: usize,

    /// replace: supersede the table on the first batch; append: keep existing rows
    #[arg(long, value_enum, default_value_t = LoadMode::Replace)]
    mode: LoadMode,

    #[command(subcommand)]
    command: Command,
}

/// Connection overrides (default: YELP_DB_* environment variables)
#[derive(clap::Args)]
struct DbArgs {
    #[arg(long)]
    host: Option<String>,
    #[arg(long)]
    port: Option<String>,
    #[arg(long)]
    user: Option<String>,
    #[arg(long)]
    password: Option<String>,
    #[arg(long)]
    database: Option<String>,
    #[arg(long)]
    schema: Option<String>,
    /// postgresql or sqlite
    #[arg(long)]
    driver: Option<String>,
}

impl DbArgs {
    fn apply(self, mut params: ConnectionParams) -> ConnectionParams {
        let overrides = [
            (self.host, &mut params.host),
            (self.port, &mut params.port),
            (self.user, &mut params.user),
            (self.password, &mut params.password),
            (self.database, &mut params.database),
            (self.schema, &mut params.schema),
            (self.driver, &mut params.driver),
        ];
        for (value, slot) in overrides {
            if value.is_some() {
                *slot = value;
            }
        }
        params
    }
}

#[derive(Subcommand)]
enum Command {
    /// Load yelp_academic_dataset_business.json into raw_yelp_business
    Business {
        #[arg(long)]
        source: Option<PathBuf>,
    },
    /// Load yelp_academic_dataset_review.json into raw_yelp_review
    Review {
        #[arg(long)]
        source: Option<PathBuf>,
    },
    /// Load business, then review, from one data directory
    All {
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(anyhow::Error::msg)?;

    let args = Args::parse();
    let params = args.db.apply(ConnectionParams::from_env());
    let options = LoadOptions {
        batch_size: args.batch_size,
        insert_chunk_size: args.insert_chunk_size,
        mode: args.mode,
    };

    let jobs = match args.command {
        Command::Business { source } => {
            vec![(Dataset::Business, source.unwrap_or_else(|| Dataset::Business.default_source()))]
        }
        Command::Review { source } => {
            vec![(Dataset::Review, source.unwrap_or_else(|| Dataset::Review.default_source()))]
        }
        Command::All { data_dir } => vec![
            (Dataset::Business, data_dir.join(Dataset::Business.file_name())),
            (Dataset::Review, data_dir.join(Dataset::Review.file_name())),
        ],
    };

    for (dataset, source) in jobs {
        if let Err(e) = load_dataset(&params, dataset, source, options.clone()).await {
            eprintln!("❌ {}", failure_message(&e));
            return Ok(ExitCode::FAILURE);
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// One console line per failed run
fn failure_message(error: &LoadError) -> String {
    match error {
        LoadError::Configuration(msg) => format!("Failed to create database connection: {}", msg),
        LoadError::Connection(msg) => format!("Connection failed: {}", msg),
        other => other.to_string(),
    }
}

async fn load_dataset(
    params: &ConnectionParams,
    dataset: Dataset,
    source: PathBuf,
    options: LoadOptions,
) -> std::result::Result<LoadReport, LoadError> {
    println!("📡 Connecting to: {}", params.display_url());
    println!("📂 Loading raw {} data from: {}", dataset, source.display());
    info!(dataset = %dataset, "Load requested");

    let result = run_load(params, dataset, &source, options, |p| {
        println!("   ✓ Loaded chunk {} ({} rows, {}) successfully.", p.batch, p.rows, p.mode);
    })
    .await;

    if let Ok(report) = &result {
        println!(
            "✅ Raw {} data loaded successfully: {} rows in {} batches ({:.1}s)",
            dataset,
            report.rows,
            report.batches,
            report.elapsed.as_secs_f64()
        );
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_is_validated_by_clap() {
        let args = Args::try_parse_from(["yelp-loader", "--mode", "append", "business"]).unwrap();
        assert_eq!(args.mode, LoadMode::Append);

        let args = Args::try_parse_from(["yelp-loader", "review"]).unwrap();
        assert_eq!(args.mode, LoadMode::Replace);

        assert!(Args::try_parse_from(["yelp-loader", "--mode", "merge", "business"]).is_err());
    }

    #[test]
    fn test_failure_message() {
        let msg = failure_message(&LoadError::Configuration("missing connection parameters: host".to_string()));
        assert_eq!(msg, "Failed to create database connection: missing connection parameters: host");
        let msg = failure_message(&LoadError::UnsupportedDriver("oracle".to_string()));
        assert_eq!(msg, "Invalid driver specified: oracle");
    }
}
