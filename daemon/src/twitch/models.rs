//! Upstream payloads and the snapshot handed to the tracker.

use serde::Deserialize;

/// One poll of the channel's stream status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    /// Broadcast title. Empty when the channel is offline.
    pub title: String,
    pub game: Option<String>,
    pub stream_id: i64,
    pub viewers: i64,
    pub followers: i64,
}

impl Snapshot {
    pub fn offline() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn live(stream_id: i64, title: impl Into<String>, viewers: i64, followers: i64) -> Self {
        Self {
            title: title.into(),
            game: None,
            stream_id,
            viewers,
            followers,
        }
    }

    /// A channel counts as live when the stream carries a non-empty title.
    pub fn is_live(&self) -> bool {
        !self.title.is_empty()
    }
}

/// `GET /streams/{channel}`. `stream` is null or absent while offline.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct StreamResponse {
    #[serde(default)]
    pub stream: Option<StreamPayload>,
}

/// Every field may be absent or null; missing numbers read as 0.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct StreamPayload {
    #[serde(default)]
    pub game: Option<String>,
    #[serde(default)]
    pub channel: Option<ChannelPayload>,
    #[serde(default, rename = "_id")]
    pub id: Option<i64>,
    #[serde(default)]
    pub stream_id: Option<i64>,
    #[serde(default)]
    pub viewers: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ChannelPayload {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub followers: Option<i64>,
}

/// `{"_total": n}`, returned by the subscriptions and follows endpoints.
#[derive(Debug, Deserialize)]
pub(crate) struct TotalResponse {
    #[serde(rename = "_total")]
    pub total: i64,
}

impl From<StreamResponse> for Snapshot {
    fn from(resp: StreamResponse) -> Self {
        let Some(stream) = resp.stream else {
            return Snapshot::offline();
        };

        let channel = stream.channel.unwrap_or_default();
        Snapshot {
            title: channel.status.unwrap_or_default(),
            game: stream.game.filter(|g| !g.is_empty()),
            // `_id` wins when both keys are present.
            stream_id: stream.id.or(stream.stream_id).unwrap_or(0),
            viewers: stream.viewers.unwrap_or(0),
            followers: channel.followers.unwrap_or(0),
        }
    }
}
