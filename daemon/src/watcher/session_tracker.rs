//! Broadcast session detection.
//!
//! Turns a sequence of independent polls into discrete sessions. `step` is a
//! transition function over an owned `SessionState`: it takes the previous
//! state and one poll result and returns the next state, plus a finished
//! `SessionRecord` when a broadcast ends.
//!
//! A session opens on the first live poll and closes when either:
//! - more than `MISS_TOLERANCE` consecutive polls report the channel offline, or
//! - a live poll carries a different title than the open session.
//!
//! A failed poll is not evidence of anything and leaves the state untouched.

use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use crate::error::FetchError;
use crate::twitch::{ChannelApi, Snapshot};

/// Consecutive offline polls tolerated before a session is closed.
pub const MISS_TOLERANCE: u32 = 2;

/// Viewer count observed on one poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewerSample {
    pub at: DateTime<Utc>,
    pub viewers: i64,
}

/// Tracker state. `SessionState::default()` is idle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub active: bool,
    pub stream_id: i64,
    pub title: String,
    pub start_time: Option<DateTime<Utc>>,
    pub initial_followers: i64,
    pub initial_subscribers: i64,
    pub viewer_samples: Vec<ViewerSample>,
    /// Offline polls since the last poll that still showed the session live.
    pub consecutive_misses: u32,
}

impl SessionState {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn is_live(&self) -> bool {
        self.active
    }
}

/// Summary of a finished broadcast, written once when it closes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub stream_id: i64,
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub initial_followers: i64,
    pub initial_subscribers: i64,
    pub final_followers: i64,
    pub final_subscribers: i64,
    pub average_viewers: i64,
    pub max_viewers: i64,
    pub created_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn follower_delta(&self) -> i64 {
        self.final_followers - self.initial_followers
    }

    pub fn subscriber_delta(&self) -> i64 {
        self.final_subscribers - self.initial_subscribers
    }

    pub fn duration(&self) -> Duration {
        self.end_time - self.start_time
    }
}

/// Result of one `step`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: SessionState,
    pub record: Option<SessionRecord>,
}

impl Transition {
    fn stay(state: SessionState) -> Self {
        Self {
            state,
            record: None,
        }
    }
}

/// Advance the tracker by one poll.
///
/// `api` is only used for the subscriber and follower totals captured when a
/// session opens or closes. If one of those lookups fails the whole tick is
/// abandoned and the input state comes back unchanged.
pub async fn step(
    mut state: SessionState,
    observation: Result<Snapshot, FetchError>,
    api: &dyn ChannelApi,
    now: DateTime<Utc>,
) -> Transition {
    let snapshot = match observation {
        Ok(snapshot) => snapshot,
        Err(e) => {
            warn!(error = %e, "Poll failed, skipping tick");
            return Transition::stay(state);
        }
    };

    if !state.is_live() {
        if !snapshot.is_live() {
            return Transition::stay(state);
        }
        return open(state, &snapshot, api, now).await;
    }

    if !snapshot.is_live() {
        if state.consecutive_misses < MISS_TOLERANCE {
            state.consecutive_misses += 1;
            info!(
                title = %state.title,
                misses = state.consecutive_misses,
                "Channel reported offline, keeping session open"
            );
            return Transition::stay(state);
        }
        return close(state, api, now).await;
    }

    if snapshot.title == state.title {
        state.consecutive_misses = 0;
        state.viewer_samples.push(ViewerSample {
            at: now,
            viewers: snapshot.viewers,
        });
        return Transition::stay(state);
    }

    // Back-to-back broadcast. The new title is picked up as a fresh session
    // on the next tick.
    info!(
        old_title = %state.title,
        new_title = %snapshot.title,
        "Stream title changed, closing session"
    );
    close(state, api, now).await
}

async fn open(
    state: SessionState,
    snapshot: &Snapshot,
    api: &dyn ChannelApi,
    now: DateTime<Utc>,
) -> Transition {
    let subscribers = match api.subscribers().await {
        Ok(n) => n,
        Err(e) => {
            warn!(error = %e, title = %snapshot.title, "Could not open session");
            return Transition::stay(state);
        }
    };

    info!(
        stream_id = snapshot.stream_id,
        title = %snapshot.title,
        viewers = snapshot.viewers,
        "New stream detected"
    );

    Transition::stay(SessionState {
        active: true,
        stream_id: snapshot.stream_id,
        title: snapshot.title.clone(),
        start_time: Some(now),
        initial_followers: snapshot.followers,
        initial_subscribers: subscribers,
        viewer_samples: vec![ViewerSample {
            at: now,
            viewers: snapshot.viewers,
        }],
        consecutive_misses: 0,
    })
}

async fn close(state: SessionState, api: &dyn ChannelApi, now: DateTime<Utc>) -> Transition {
    let final_subscribers = match api.subscribers().await {
        Ok(n) => n,
        Err(e) => {
            warn!(error = %e, title = %state.title, "Could not close session");
            return Transition::stay(state);
        }
    };
    let final_followers = match api.followers().await {
        Ok(n) => n,
        Err(e) => {
            warn!(error = %e, title = %state.title, "Could not close session");
            return Transition::stay(state);
        }
    };

    let (average_viewers, max_viewers) = viewer_stats(&state.viewer_samples);
    let record = SessionRecord {
        stream_id: state.stream_id,
        start_time: state.start_time.unwrap_or(now),
        end_time: now,
        initial_followers: state.initial_followers,
        initial_subscribers: state.initial_subscribers,
        final_followers,
        final_subscribers,
        average_viewers,
        max_viewers,
        created_at: now,
        title: state.title,
    };

    info!(
        title = %record.title,
        started = %record.start_time.to_rfc3339(),
        ended = %record.end_time.to_rfc3339(),
        average_viewers = record.average_viewers,
        max_viewers = record.max_viewers,
        follower_delta = record.follower_delta(),
        subscriber_delta = record.subscriber_delta(),
        duration_mins = record.duration().num_minutes(),
        "Detected stream end"
    );

    Transition {
        state: SessionState::idle(),
        record: Some(record),
    }
}

/// Floor of the mean and the maximum of the sampled viewer counts; `(0, 0)`
/// without samples.
pub fn viewer_stats(samples: &[ViewerSample]) -> (i64, i64) {
    if samples.is_empty() {
        return (0, 0);
    }

    let total: i64 = samples.iter().map(|s| s.viewers).sum();
    let max = samples.iter().map(|s| s.viewers).max().unwrap_or(0);
    (total.div_euclid(samples.len() as i64), max)
}
