//! Long-running monitor mode.

use tracing::info;

use crate::config::Config;
use crate::error::Error;
use crate::storage::SessionStore;
use crate::twitch::TwitchClient;
use crate::watcher::Poller;

/// Poll the configured channel until the process is killed.
///
/// A session still open at shutdown is not stored.
pub fn run(config: &Config, store: SessionStore) -> Result<(), Error> {
    config.validate()?;

    let client = TwitchClient::new(config);
    let poller = Poller::new(client, store, config);

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    info!(channel = %config.stream_channel, "Monitoring channel");
    rt.block_on(poller.run());

    Ok(())
}
