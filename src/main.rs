use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use da_adapter::config::Config;
use da_adapter::storage::{load_batches, save_batches, save_commitment, CommitmentRecord};
use da_adapter::utils::{blob_digest, parse_hex, to_hex_prefixed};
use da_adapter::{batch, DaAdapter, DataAvailability};

#[derive(Debug, Parser)]
#[command(name = "da-adapter", about = "Post rollup batches to a DA network and read them back")]
struct Cli {
    /// Path to the TOML configuration
    #[arg(long, short, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Post each file as one batch, in order, and print the commitment
    Post {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Directory the commitment record is written to
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,
    },
    /// Fetch the batches behind a hex-encoded commitment
    Get {
        commitment: String,
        /// Directory the batches are written to
        #[arg(long, default_value = "data/batches")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;
    info!(
        "Loaded config: transport={:?}, rpc={}",
        config.da.transport, config.da.rpc
    );

    let adapter = DaAdapter::from_config(&config.da).context("Failed to build DA transport")?;
    adapter.init().await?;

    // Ctrl-C aborts whatever is in flight
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling");
            on_signal.cancel();
        }
    });

    match cli.command {
        Command::Post { files, data_dir } => {
            let batches = load_batches(&files)?;
            let commitment = adapter.post_sequence(&batches, &cancel).await?;

            let record = CommitmentRecord {
                commitment: to_hex_prefixed(&commitment),
                batches: batches.len(),
                aggregate_digest: blob_digest(&batch::serialize(&batches)),
                posted_at: SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs(),
            };
            let path = save_commitment(&data_dir, &record)?;
            info!("💾 Commitment record saved to {}", path.display());
            println!("{}", record.commitment);
        }
        Command::Get { commitment, out } => {
            let commitment = parse_hex(&commitment)?;
            let batches = adapter.get_sequence(&[], &commitment, &cancel).await?;
            let paths = save_batches(&out, &batches)?;
            info!("💾 Wrote {} batches to {}", paths.len(), out.display());
            for path in paths {
                println!("{}", path.display());
            }
        }
    }

    Ok(())
}
