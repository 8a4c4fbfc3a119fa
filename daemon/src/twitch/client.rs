//! HTTP client for the channel status, subscriber and follower endpoints.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::models::{Snapshot, StreamResponse, TotalResponse};
use super::ChannelApi;
use crate::config::Config;
use crate::error::{Endpoint, FetchError};

const ACCEPT_V3: &str = "application/vnd.twitchtv.v3+json";

/// Read-only client for a single channel. No retries.
pub struct TwitchClient {
    http: reqwest::Client,
    api_base: String,
    channel: String,
    auth_token: String,
}

impl TwitchClient {
    pub fn new(config: &Config) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    pub fn with_client(http: reqwest::Client, config: &Config) -> Self {
        Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            channel: config.stream_channel.clone(),
            auth_token: config.auth_token.clone(),
        }
    }

    fn url(&self, endpoint: Endpoint) -> String {
        match endpoint {
            Endpoint::Stream => format!("{}/streams/{}", self.api_base, self.channel),
            Endpoint::Subscriptions => {
                format!("{}/channels/{}/subscriptions", self.api_base, self.channel)
            }
            Endpoint::Follows => format!("{}/channels/{}/follows", self.api_base, self.channel),
        }
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: Endpoint) -> Result<T, FetchError> {
        let url = self.url(endpoint);
        debug!(%endpoint, %url, "Querying API");

        let mut req = self.http.get(&url).header(ACCEPT, ACCEPT_V3);
        if endpoint == Endpoint::Subscriptions {
            req = req.header(AUTHORIZATION, format!("OAuth {}", self.auth_token));
        }

        let res = req
            .send()
            .await
            .map_err(|e| FetchError::network(endpoint, e))?;

        let status = res.status();
        if !status.is_success() {
            return Err(FetchError::status(endpoint, status.as_u16()));
        }

        let body = res
            .bytes()
            .await
            .map_err(|e| FetchError::network(endpoint, e))?;

        serde_json::from_slice(&body).map_err(|e| FetchError::decode(endpoint, e))
    }
}

#[async_trait]
impl ChannelApi for TwitchClient {
    async fn stream(&self) -> Result<Snapshot, FetchError> {
        let resp: StreamResponse = self.get(Endpoint::Stream).await?;
        Ok(resp.into())
    }

    async fn subscribers(&self) -> Result<i64, FetchError> {
        let resp: TotalResponse = self.get(Endpoint::Subscriptions).await?;
        Ok(resp.total)
    }

    async fn followers(&self) -> Result<i64, FetchError> {
        let resp: TotalResponse = self.get(Endpoint::Follows).await?;
        Ok(resp.total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchErrorKind;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> TwitchClient {
        let config = Config {
            stream_channel: "chan".to_string(),
            auth_token: "secret".to_string(),
            api_base: format!("{}/", server.uri()),
            ..Config::default()
        };
        TwitchClient::new(&config)
    }

    #[tokio::test]
    async fn test_stream_live() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/streams/chan"))
            .and(header("Accept", ACCEPT_V3))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "stream": {
                    "game": "Chess",
                    "_id": 1001,
                    "viewers": 55,
                    "channel": {"status": "Openings", "followers": 300}
                }
            })))
            .mount(&server)
            .await;

        let snap = client_for(&server).stream().await.unwrap();
        assert_eq!(
            snap,
            Snapshot {
                title: "Openings".to_string(),
                game: Some("Chess".to_string()),
                stream_id: 1001,
                viewers: 55,
                followers: 300,
            }
        );
    }

    #[tokio::test]
    async fn test_stream_offline() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/streams/chan"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"stream": null})))
            .mount(&server)
            .await;

        let snap = client_for(&server).stream().await.unwrap();
        assert!(!snap.is_live());
    }

    #[tokio::test]
    async fn test_subscribers_sends_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/channels/chan/subscriptions"))
            .and(header("Authorization", "OAuth secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"_total": 12})))
            .mount(&server)
            .await;

        assert_eq!(client_for(&server).subscribers().await.unwrap(), 12);
    }

    #[tokio::test]
    async fn test_followers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/channels/chan/follows"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"_total": 4096})))
            .mount(&server)
            .await;

        assert_eq!(client_for(&server).followers().await.unwrap(), 4096);
    }

    #[tokio::test]
    async fn test_non_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/channels/chan/subscriptions"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = client_for(&server).subscribers().await.unwrap_err();
        assert_eq!(err, FetchError::status(Endpoint::Subscriptions, 401));
        assert_eq!(
            err.to_string(),
            "subscriptions query failed: non-200 response: 401"
        );
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/streams/chan"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let err = client_for(&server).stream().await.unwrap_err();
        assert_eq!(err.endpoint, Endpoint::Stream);
        assert!(matches!(err.kind, FetchErrorKind::Decode(_)));
    }

    #[tokio::test]
    async fn test_network_failure() {
        let config = Config {
            stream_channel: "chan".to_string(),
            api_base: "http://127.0.0.1:1".to_string(),
            ..Config::default()
        };

        let err = TwitchClient::new(&config).followers().await.unwrap_err();
        assert_eq!(err.endpoint, Endpoint::Follows);
        assert!(matches!(err.kind, FetchErrorKind::Network(_)));
    }
}
