//! Scripted `ChannelApi` for tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{ChannelApi, Snapshot};
use crate::error::FetchError;

/// Returns queued stream snapshots in order (offline once the queue runs dry)
/// and fixed subscriber/follower totals that tests can change between calls.
pub struct FakeChannel {
    streams: Mutex<VecDeque<Result<Snapshot, FetchError>>>,
    subscribers: Mutex<Result<i64, FetchError>>,
    followers: Mutex<Result<i64, FetchError>>,
    count_calls: AtomicUsize,
}

impl FakeChannel {
    pub fn new(subscribers: i64, followers: i64) -> Self {
        Self {
            streams: Mutex::new(VecDeque::new()),
            subscribers: Mutex::new(Ok(subscribers)),
            followers: Mutex::new(Ok(followers)),
            count_calls: AtomicUsize::new(0),
        }
    }

    pub fn push_stream(&self, stream: Result<Snapshot, FetchError>) {
        self.streams.lock().unwrap().push_back(stream);
    }

    pub fn set_subscribers(&self, value: Result<i64, FetchError>) {
        *self.subscribers.lock().unwrap() = value;
    }

    pub fn set_followers(&self, value: Result<i64, FetchError>) {
        *self.followers.lock().unwrap() = value;
    }

    pub fn count_calls(&self) -> usize {
        self.count_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChannelApi for FakeChannel {
    async fn stream(&self) -> Result<Snapshot, FetchError> {
        self.streams
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Snapshot::offline()))
    }

    async fn subscribers(&self) -> Result<i64, FetchError> {
        self.count_calls.fetch_add(1, Ordering::SeqCst);
        self.subscribers.lock().unwrap().clone()
    }

    async fn followers(&self) -> Result<i64, FetchError> {
        self.count_calls.fetch_add(1, Ordering::SeqCst);
        self.followers.lock().unwrap().clone()
    }
}
