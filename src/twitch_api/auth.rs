use chrono::Utc;
use log::{debug, warn};

use crate::error_handling::types::ApiError;

use super::types::{AccessToken, TokenResponse};

/// Client-credentials grant against the OAuth token endpoint.
pub struct AuthClient {
    http: reqwest::Client,
    oauth_url: String,
}

impl AuthClient {
    pub fn new(http: reqwest::Client, oauth_url: impl Into<String>) -> Self {
        Self {
            http,
            oauth_url: oauth_url.into(),
        }
    }

    /// Exchanges the application credentials for an app access token.
    ///
    /// Any non-2xx answer means the credentials were rejected and is reported
    /// as [`ApiError::Auth`]; retrying is up to the caller.
    pub async fn get_token(
        &self,
        client_id: &str,
        client_secret: &str,
    ) -> Result<AccessToken, ApiError> {
        debug!("Requesting app access token from {}", self.oauth_url);
        let response = self
            .http
            .post(&self.oauth_url)
            .query(&[
                ("client_id", client_id),
                ("client_secret", client_secret),
                ("grant_type", "client_credentials"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Token endpoint rejected credentials: {} {}", status, body);
            return Err(ApiError::Auth(format!("token endpoint returned {}", status)));
        }

        let token: TokenResponse = response.json().await?;
        debug!(
            "Received {} token valid for {} seconds",
            if token.token_type.is_empty() { "app" } else { token.token_type.as_str() },
            token.expires_in
        );
        Ok(AccessToken::new(token.access_token, token.expires_in, Utc::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::twitch_api::test_server::{MockResponse, TestServer};

    #[tokio::test]
    async fn returns_token_on_success() {
        let server = TestServer::start(vec![MockResponse::json(
            200,
            r#"{"access_token":"tok123","expires_in":5000,"token_type":"bearer"}"#,
        )])
        .await;
        let client = AuthClient::new(reqwest::Client::new(), server.url("/oauth2/token"));

        let token = client.get_token("my-id", "my-secret").await.unwrap();
        assert_eq!(token.value, "tok123");
        assert!(!token.is_expired(Utc::now()));

        let requests = server.finish().await;
        assert_eq!(requests.len(), 1);
        assert!(requests[0].starts_with("POST /oauth2/token?"));
        assert!(requests[0].contains("client_id=my-id"));
        assert!(requests[0].contains("client_secret=my-secret"));
        assert!(requests[0].contains("grant_type=client_credentials"));
    }

    #[tokio::test]
    async fn rejected_credentials_are_auth_errors() {
        let server = TestServer::start(vec![MockResponse::json(
            403,
            r#"{"status":403,"message":"invalid client secret"}"#,
        )])
        .await;
        let client = AuthClient::new(reqwest::Client::new(), server.url("/oauth2/token"));

        let err = client.get_token("id", "bad").await.unwrap_err();
        assert!(matches!(err, ApiError::Auth(_)));
        server.finish().await;
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_network_error() {
        let client = AuthClient::new(
            reqwest::Client::new(),
            format!("http://{}/oauth2/token", TestServer::closed_addr().await),
        );
        let err = client.get_token("id", "secret").await.unwrap_err();
        assert!(matches!(err, ApiError::Network(_)));
    }
}
