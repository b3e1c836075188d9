use log::{debug, trace};
use reqwest::StatusCode;

use crate::error_handling::types::ApiError;

use super::types::{AccessToken, StreamRecord, StreamsResponse};

/// Live status lookups against `GET /helix/streams`.
pub struct StreamsClient {
    http: reqwest::Client,
    streams_url: String,
    client_id: String,
}

impl StreamsClient {
    pub fn new(
        http: reqwest::Client,
        streams_url: impl Into<String>,
        client_id: impl Into<String>,
    ) -> Self {
        Self {
            http,
            streams_url: streams_url.into(),
            client_id: client_id.into(),
        }
    }

    /// Returns the current stream of `username`, or `None` when offline.
    ///
    /// A 401 means the token expired or was revoked and comes back as
    /// [`ApiError::Auth`] so the caller can refresh it and retry.
    pub async fn get_stream_info(
        &self,
        username: &str,
        token: &AccessToken,
    ) -> Result<Option<StreamRecord>, ApiError> {
        let response = self
            .http
            .get(&self.streams_url)
            .query(&[("user_login", username)])
            .header("Client-ID", &self.client_id)
            .bearer_auth(&token.value)
            .send()
            .await?;

        match response.status() {
            StatusCode::UNAUTHORIZED => {
                return Err(ApiError::Auth(format!(
                    "streams endpoint rejected token for {}",
                    username
                )))
            }
            StatusCode::BAD_REQUEST => {
                let body = response.text().await.unwrap_or_default();
                return Err(ApiError::BadRequest(body));
            }
            status if !status.is_success() => {
                return Err(ApiError::Network(format!(
                    "streams endpoint returned {}",
                    status
                )))
            }
            _ => {}
        }

        let body: StreamsResponse = response.json().await?;
        trace!("Streams response for {}: {} entries", username, body.data.len());
        let stream = body.data.into_iter().next();
        match &stream {
            Some(s) => debug!("{} is live: '{}' ({})", username, s.title, s.game_name),
            None => debug!("{} is offline", username),
        }
        Ok(stream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::twitch_api::test_server::{MockResponse, TestServer};
    use chrono::Utc;

    const LIVE: &str = r#"{"data":[{"id":"1","user_login":"somebody","user_name":"Somebody","game_name":"Chess","title":"blitz","started_at":"2024-03-01T18:00:00Z"}],"pagination":{"cursor":"abc"}}"#;

    fn token() -> AccessToken {
        AccessToken::new("tok", 3600, Utc::now())
    }

    #[tokio::test]
    async fn live_stream_is_returned() {
        let server = TestServer::start(vec![MockResponse::json(200, LIVE)]).await;
        let client = StreamsClient::new(reqwest::Client::new(), server.url("/helix/streams"), "cid");

        let stream = client.get_stream_info("somebody", &token()).await.unwrap();
        let stream = stream.expect("stream should be live");
        assert_eq!(stream.game_name, "Chess");
        assert_eq!(stream.user_login, "somebody");

        let requests = server.finish().await;
        let head = requests[0].to_lowercase();
        assert!(head.starts_with("get /helix/streams?user_login=somebody"));
        assert!(head.contains("client-id: cid"));
        assert!(head.contains("authorization: bearer tok"));
    }

    #[tokio::test]
    async fn empty_data_means_offline() {
        let server =
            TestServer::start(vec![MockResponse::json(200, r#"{"data":[],"pagination":{}}"#)]).await;
        let client = StreamsClient::new(reqwest::Client::new(), server.url("/helix/streams"), "cid");

        assert_eq!(client.get_stream_info("somebody", &token()).await.unwrap(), None);
        server.finish().await;
    }

    #[tokio::test]
    async fn status_codes_map_to_error_kinds() {
        let server = TestServer::start(vec![
            MockResponse::json(401, r#"{"error":"Unauthorized"}"#),
            MockResponse::json(400, r#"{"error":"Bad Request"}"#),
            MockResponse::json(500, r#"{"error":"Internal"}"#),
        ])
        .await;
        let client = StreamsClient::new(reqwest::Client::new(), server.url("/helix/streams"), "cid");

        assert!(matches!(
            client.get_stream_info("a", &token()).await,
            Err(ApiError::Auth(_))
        ));
        assert!(matches!(
            client.get_stream_info("a", &token()).await,
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            client.get_stream_info("a", &token()).await,
            Err(ApiError::Network(_))
        ));
        server.finish().await;
    }

    #[tokio::test]
    async fn garbage_body_is_decode_error() {
        let server = TestServer::start(vec![MockResponse::json(200, "not json")]).await;
        let client = StreamsClient::new(reqwest::Client::new(), server.url("/helix/streams"), "cid");

        assert!(matches!(
            client.get_stream_info("a", &token()).await,
            Err(ApiError::Decode(_))
        ));
        server.finish().await;
    }
}
