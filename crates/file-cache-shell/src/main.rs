//! File cache shell - interactive line shell over a file-backed cache
//!
//! Reads one command per line from stdin and prints one result line per
//! command to stdout. Plain-text logs go to stderr.

mod error;
mod shell;

use crate::error::Result;
use crate::shell::{execute, parse_command, Command};
use clap::Parser;
use file_cache::{CacheConfig, FileCache};
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{prelude::*, EnvFilter};

#[derive(Debug, Parser)]
#[command(name = "file-cache-shell", about = "Interactive shell over a file-backed cache")]
struct Args {
    /// Cache directory (overrides CACHE_DIR)
    #[arg(long)]
    dir: Option<PathBuf>,

    /// Seconds between expired-entry sweeps, 0 disables (overrides SWEEP_INTERVAL_SECS)
    #[arg(long)]
    sweep_interval_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let env_filter = EnvFilter::from_default_env()
        .add_directive("file_cache_shell=info".parse()?)
        .add_directive("file_cache=info".parse()?);

    // Use JSON format for GCP Cloud Logging when LOG_FORMAT=json
    if std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false)
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_stackdriver::layer())
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    };

    let config = load_config(Args::parse());
    info!("Cache dir: {:?}", config.cache_dir);
    match config.sweep_interval {
        Some(interval) => info!("Sweep interval: {} seconds", interval.as_secs()),
        None => info!("Sweeper disabled"),
    }

    let cache = FileCache::<Value>::from_config(&config).await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                println!("ERR {}", e);
                continue;
            }
        };
        if command == Command::Quit {
            break;
        }

        match execute(&cache, command).await {
            Ok(output) => println!("{}", output),
            Err(e) => {
                warn!(error = %e, "Command failed");
                println!("ERR {}", e);
            }
        }
    }

    cache.stop_sweeper();
    info!("Shell exiting with {} entries indexed", cache.item_count().await);
    Ok(())
}

/// Environment first, command-line flags override it
fn load_config(args: Args) -> CacheConfig {
    let mut config = CacheConfig::from_env();

    if let Some(dir) = args.dir {
        config.cache_dir = dir;
    }

    if let Some(secs) = args.sweep_interval_secs {
        config.sweep_interval = (secs > 0).then(|| Duration::from_secs(secs));
    }

    config
}
