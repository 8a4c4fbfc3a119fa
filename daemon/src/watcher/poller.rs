//! Fixed-interval poll loop: fetch, step, store.

use std::time::Duration;

use chrono::Utc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info};

use super::session_tracker::{step, SessionRecord, SessionState};
use crate::config::Config;
use crate::storage::SessionSink;
use crate::twitch::ChannelApi;

/// Owns the tracker state and runs one tick at a time.
pub struct Poller<A, S> {
    api: A,
    sink: S,
    state: SessionState,
    channel: String,
    interval: Duration,
}

impl<A: ChannelApi, S: SessionSink> Poller<A, S> {
    pub fn new(api: A, sink: S, config: &Config) -> Self {
        Self {
            api,
            sink,
            state: SessionState::idle(),
            channel: config.stream_channel.clone(),
            interval: config.poll_interval(),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Poll once and advance the tracker. Returns the session closed by this
    /// tick, if any.
    ///
    /// A failed write is logged and otherwise ignored; the tracker has
    /// already moved on to idle.
    pub async fn tick(&mut self) -> Option<SessionRecord> {
        let observation = self.api.stream().await;
        let state = std::mem::take(&mut self.state);

        let transition = step(state, observation, &self.api, Utc::now()).await;
        self.state = transition.state;

        let record = transition.record?;
        match self.sink.save(&record) {
            Ok(()) => debug!(stream_id = record.stream_id, "Session stored"),
            Err(e) => error!(
                channel = %self.channel,
                stream_id = record.stream_id,
                error = %e,
                "Failed to store session"
            ),
        }
        Some(record)
    }

    /// Tick every interval until the process exits.
    ///
    /// Ticks never overlap; if one runs past the interval the missed ticks
    /// are skipped rather than queued.
    pub async fn run(mut self) {
        info!(
            channel = %self.channel,
            interval_secs = self.interval.as_secs(),
            "Monitor loop started"
        );

        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            self.tick().await;

            let state = self.state();
            debug!(
                live = state.is_live(),
                misses = state.consecutive_misses,
                samples = state.viewer_samples.len(),
                "Tick complete"
            );
        }
    }
}
