use std::time::Duration;

use async_trait::async_trait;
use log::info;

use crate::configuration::Config;
use crate::error_handling::types::{ApiError, ConfigError};

use super::api_trait::StreamApi;
use super::auth::AuthClient;
use super::streams::StreamsClient;
use super::types::{AccessToken, StreamRecord};

/// Helix client bundling the token and streams endpoints behind one
/// [`reqwest::Client`].
pub struct TwitchClient {
    auth: AuthClient,
    streams: StreamsClient,
    client_id: String,
    client_secret: String,
}

impl TwitchClient {
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.api.timeout_secs))
            .build()
            .map_err(|e| ConfigError::InvalidValue(format!("unable to build HTTP client: {}", e)))?;

        info!(
            "Using token endpoint {} and streams endpoint {}",
            config.api.oauth_url, config.api.streams_url
        );
        Ok(Self {
            auth: AuthClient::new(http.clone(), config.api.oauth_url.clone()),
            streams: StreamsClient::new(http, config.api.streams_url.clone(), config.client_id.clone()),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
        })
    }
}

#[async_trait]
impl StreamApi for TwitchClient {
    async fn get_token(&self) -> Result<AccessToken, ApiError> {
        self.auth.get_token(&self.client_id, &self.client_secret).await
    }

    async fn get_stream_info(
        &self,
        username: &str,
        token: &AccessToken,
    ) -> Result<Option<StreamRecord>, ApiError> {
        self.streams.get_stream_info(username, token).await
    }
}
