use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use sparkify_etl::{EtlConfig, SparkifySessionBuilder};

/// Load the Sparkify song catalog and event logs into a partitioned Parquet star schema
#[derive(Parser, Debug)]
#[command(name = "etl", version)]
struct Args {
    /// TOML config file with locations, AWS credentials and engine options
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Input root holding `song_data/` and `log_data/`, overrides the config file
    #[arg(short, long, value_name = "LOCATION")]
    input: Option<String>,

    /// Output root for the artifact sets, overrides the config file
    #[arg(short, long, value_name = "LOCATION")]
    output: Option<String>,

    /// Enable verbose output (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,sparkify_etl={level},etl={level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose >= 1)
        .init();
}

// Reads the song catalog and event logs from the input root, then writes
// songs, artists, users, time and songplays below the output root,
// replacing whatever a previous run left there
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging(args.verbose);

    let mut config = match &args.config {
        Some(path) => EtlConfig::from_file(path)?,
        None => EtlConfig::new(),
    };

    if let Some(input) = &args.input {
        config = config.input(input);
    }

    if let Some(output) = &args.output {
        config = config.output(output);
    }

    let session = SparkifySessionBuilder::from_config(&config)
        .app_name("sparkify-etl")
        .build()?;

    let summary = match sparkify_etl::run(&session, &config).await {
        Ok(summary) => summary,
        Err(e) => {
            error!(run_id = %session.run_id(), "{e}");
            return Err(e.into());
        }
    };

    for table in &summary.tables {
        info!(table = %table.table, rows = table.rows, location = %table.location);
    }

    info!(
        run_id = %summary.run_id,
        elapsed = ?summary.elapsed,
        "done"
    );

    Ok(())
}
