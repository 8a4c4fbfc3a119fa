//! Upstream channel API.

pub mod client;
pub mod models;
#[cfg(test)]
pub mod testing;

use async_trait::async_trait;

pub use client::TwitchClient;
pub use models::Snapshot;

use crate::error::FetchError;

/// Read access to one channel's live status and audience totals.
#[async_trait]
pub trait ChannelApi: Send + Sync {
    /// Current stream status, viewers and followers.
    async fn stream(&self) -> Result<Snapshot, FetchError>;

    /// Current subscriber total.
    async fn subscribers(&self) -> Result<i64, FetchError>;

    /// Current follower total.
    async fn followers(&self) -> Result<i64, FetchError>;
}

/// Results of querying every endpoint once.
#[derive(Debug)]
pub struct ChannelReport {
    pub subscribers: Result<i64, FetchError>,
    pub followers: Result<i64, FetchError>,
    pub stream: Result<Snapshot, FetchError>,
}

/// Query all three endpoints. Each call fails independently.
pub async fn fetch_report(api: &dyn ChannelApi) -> ChannelReport {
    ChannelReport {
        subscribers: api.subscribers().await,
        followers: api.followers().await,
        stream: api.stream().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Endpoint;
    use crate::twitch::testing::FakeChannel;

    #[tokio::test]
    async fn test_report_keeps_each_result() {
        let api = FakeChannel::new(0, 812);
        api.set_subscribers(Err(FetchError::status(Endpoint::Subscriptions, 401)));
        api.push_stream(Ok(Snapshot::live(9, "Late show", 33, 812)));

        let report = fetch_report(&api).await;

        assert_eq!(
            report.subscribers.unwrap_err(),
            FetchError::status(Endpoint::Subscriptions, 401)
        );
        assert_eq!(report.followers.unwrap(), 812);
        assert_eq!(
            report.stream.unwrap(),
            Snapshot::live(9, "Late show", 33, 812)
        );
    }

    #[tokio::test]
    async fn test_report_with_every_call_failing() {
        let api = FakeChannel::new(0, 0);
        api.set_subscribers(Err(FetchError::status(Endpoint::Subscriptions, 500)));
        api.set_followers(Err(FetchError::network(Endpoint::Follows, "reset")));
        api.push_stream(Err(FetchError::decode(Endpoint::Stream, "eof")));

        let report = fetch_report(&api).await;

        assert_eq!(report.subscribers.unwrap_err().endpoint, Endpoint::Subscriptions);
        assert_eq!(report.followers.unwrap_err().endpoint, Endpoint::Follows);
        assert_eq!(report.stream.unwrap_err().endpoint, Endpoint::Stream);
    }
}
