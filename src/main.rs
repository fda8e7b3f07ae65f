use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

mod coerce;
mod detail;
mod fetch;
mod games;
mod listing;
mod snapshot;
mod sync;
mod table;
mod types;
mod utils;
mod winners;

pub const SITE_ROOT: &str = "https://www.texaslottery.com";
pub const SOURCE_BASE: &str = "https://www.texaslottery.com/export/sites/lottery/Games/Scratch_Offs/";
pub const PRIZE_FEED_URL: &str = "https://www.texaslottery.com/export/sites/lottery/Games/Scratch_Offs/scratchoff.csv";
pub const INDEX_PAGE_URL: &str = "https://www.texaslottery.com/export/sites/lottery/Games/Scratch_Offs/all.html";

pub const USER_AGENT: &str = "Mozilla/5.0 (compatible; DataSync/1.0)";
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(30);
pub const FETCH_ATTEMPTS: u32 = 3;
/// Attempt n waits n times this long before attempt n + 1
pub const FETCH_BACKOFF: Duration = Duration::from_secs(2);
pub const FETCH_THROTTLE: Duration = Duration::from_millis(500);

pub const DEFAULT_OUTPUT_DIR: &str = "data";

#[derive(Parser)]
#[command(name = "scratchoff-sync")]
#[command(about = "Scratch ticket prize, detail and winner feed snapshotter")]
struct Cli {
    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,
    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
    /// Defaults to `sync` with default options
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch all feeds and overwrite the JSON snapshots
    Sync {
        /// Directory for feed.json, wdata.json and raw.csv
        #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
        output_dir: PathBuf,
        /// Replay/store raw responses under this directory
        #[arg(long)]
        cache_dir: Option<PathBuf>,
        /// Pause between per-game fetches, in milliseconds
        #[arg(long, default_value_t = FETCH_THROTTLE.as_millis() as u64)]
        delay_ms: u64,
        /// Do not fetch per-game detail pages
        #[arg(long)]
        skip_details: bool,
    },
    /// Remove generated snapshots
    Clean {
        #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
        output_dir: PathBuf,
    },
}

fn run_clean(output_dir: &Path) -> Result<()> {
    println!("Cleaning generated files...");

    if output_dir.exists() {
        fs::remove_dir_all(output_dir)
            .with_context(|| format!("Failed to remove {}", output_dir.display()))?;
        println!("  Removed {}/", output_dir.display());
    }

    println!("Clean complete!");
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    match cli.command {
        None => sync::run_sync(&sync::SyncConfig::default()),
        Some(Commands::Sync {
            output_dir,
            cache_dir,
            delay_ms,
            skip_details,
        }) => sync::run_sync(&sync::SyncConfig {
            output_dir,
            delay: Duration::from_millis(delay_ms),
            cache_dir,
            fetch_details: !skip_details,
        }),
        Some(Commands::Clean { output_dir }) => run_clean(&output_dir),
    }
}
