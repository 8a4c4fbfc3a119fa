//! twitch-stats - records per-broadcast viewer statistics for a Twitch channel.
//!
//! Polls the channel on a fixed interval, detects when a broadcast starts and
//! ends, and stores one summary row per broadcast.

use std::path::PathBuf;

use clap::Parser;
use tracing::info;

mod cli;
mod config;
mod error;
mod logging;
mod storage;
mod twitch;
mod watcher;

pub use config::Config;
pub use error::Error;

#[derive(Parser)]
#[command(name = "twitch-stats")]
#[command(about = "Record viewer statistics for a Twitch channel's broadcasts")]
#[command(version)]
struct Cli {
    /// Config file to read
    #[arg(short, long, default_value = config::DEFAULT_CONFIG_FILE)]
    config: PathBuf,
}

fn main() -> Result<(), Error> {
    let cli = Cli::parse();

    let config = Config::load_or_default(&cli.config);
    let _log_guard = logging::init_logging(&config.log_dir);

    info!(
        "Starting monitoring for '{}' with an interval of '{}' seconds.",
        config.stream_channel, config.monitor_interval
    );

    let store = storage::SessionStore::open(&config.dsn)?;

    if config.test_mode {
        cli::check::run(&config, &store)
    } else {
        cli::monitor::run(&config, store)
    }
}
