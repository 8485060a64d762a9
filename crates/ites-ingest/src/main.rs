//! ITES Ingest - test-data provisioning for the integration harness

use anyhow::Result;
use clap::{Parser, Subcommand};
use ites_common::logging::{init_logging, LogConfig, LogLevel};
use ites_ingest::{run, LoaderConfig, OperatingMode, StagedCluster};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "ites-ingest")]
#[command(author, version, about = "Load reference datasets into a search cluster")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Search cluster URL
    #[arg(long, global = true, env = "ITES_URL")]
    url: Option<String>,

    /// Read datasets from this directory instead of the network
    #[arg(long, global = true, env = "ITES_OFFLINE_DIR")]
    offline_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch datasets and reconcile the cluster's collections
    Load {
        /// Operating mode
        #[arg(long, value_enum, conflicts_with_all = ["skip_indexing", "reindex"])]
        mode: Option<OperatingMode>,

        /// Fetch and fingerprint only (same as --mode no-index)
        #[arg(short = 'i', long, conflicts_with = "reindex")]
        skip_indexing: bool,

        /// Drop and recreate every collection (same as --mode reindex)
        #[arg(short = 'x', long)]
        reindex: bool,
    },

    /// Print the fingerprint of every dataset as JSON
    Fingerprints,

    /// Print the extracted protocol test cases as JSON
    ProtoTests,
}

impl Command {
    fn mode(&self) -> OperatingMode {
        match self {
            Command::Load {
                skip_indexing: true,
                ..
            } => OperatingMode::NoIndex,
            Command::Load { reindex: true, .. } => OperatingMode::Reindex,
            Command::Load { mode, .. } => mode.unwrap_or(OperatingMode::Index),
            Command::Fingerprints => OperatingMode::NoIndex,
            Command::ProtoTests => OperatingMode::NoData,
        }
    }
}

#[tokio::main]
async fn main() {
    // A missing .env is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };
    let log_config = LogConfig::builder()
        .level(log_level)
        .log_file_prefix("ites-ingest")
        .filter_directives("hyper=warn,reqwest=warn")
        .build();

    // Environment variables take precedence
    let log_config = log_config.clone().merge_env().unwrap_or(log_config);

    let _guard = match init_logging(&log_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        },
    };

    if let Err(e) = execute(cli).await {
        error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn execute(cli: Cli) -> Result<()> {
    let mut config = LoaderConfig::from_env()?;
    if let Some(url) = cli.url {
        config.cluster_url = url;
    }
    if let Some(dir) = cli.offline_dir {
        config.offline_dir = Some(dir);
    }
    config.validate()?;

    let mode = cli.command.mode();
    let cluster = StagedCluster::new(&config)?;

    info!(mode = %mode, cluster = %config.cluster_url, "Starting");
    let data = run(&cluster, None, &config, mode, false).await?;

    match cli.command {
        Command::Load { .. } => {
            for (dataset, outcome) in data.outcomes() {
                info!(dataset = %dataset, outcome = ?outcome, "Done");
            }
        },
        Command::Fingerprints => {
            println!("{}", serde_json::to_string_pretty(data.fingerprints())?);
        },
        Command::ProtoTests => {
            println!("{}", serde_json::to_string_pretty(data.proto_tests())?);
        },
    }

    info!("Provisioning complete");
    Ok(())
}
