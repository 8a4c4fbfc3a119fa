//! One-shot test mode: query every endpoint once and print the results.

use std::fmt::Display;

use tracing::info;

use crate::config::Config;
use crate::error::Error;
use crate::storage::SessionStore;
use crate::twitch::{fetch_report, TwitchClient};

/// Run the test pass.
pub fn run(config: &Config, store: &SessionStore) -> Result<(), Error> {
    if let Err(e) = config.validate() {
        println!("Warning: {}", e);
    }

    let client = TwitchClient::new(config);
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let report = rt.block_on(fetch_report(&client));

    print_result("Subscribers", &report.subscribers);
    print_result("Followers", &report.followers);
    match &report.stream {
        Ok(snapshot) if snapshot.is_live() => {
            println!("Stream: live");
            println!("  Id: {}", snapshot.stream_id);
            println!("  Title: {}", snapshot.title);
            if let Some(game) = &snapshot.game {
                println!("  Game: {}", game);
            }
            println!("  Viewers: {}", snapshot.viewers);
            println!("  Followers: {}", snapshot.followers);
        }
        Ok(_) => println!("Stream: offline"),
        Err(e) => println!("Stream: error ({})", e),
    }

    println!("Stored sessions: {}", store.count()?);
    if let Some(last) = store.recent(1)?.into_iter().next() {
        println!(
            "Last session: '{}' ({} to {}), average viewers {} (max {})",
            last.title,
            last.start_time.to_rfc3339(),
            last.end_time.to_rfc3339(),
            last.average_viewers,
            last.max_viewers
        );
    }

    info!(channel = %config.stream_channel, "Test pass finished");
    Ok(())
}

fn print_result<T: Display, E: Display>(label: &str, result: &Result<T, E>) {
    match result {
        Ok(value) => println!("{}: {}", label, value),
        Err(e) => println!("{}: error ({})", label, e),
    }
}
