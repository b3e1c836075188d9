//! Types decoded from, or derived from, Helix responses.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Tokens closer than this to their expiry are refreshed before use.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Short-lived app access token.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessToken {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    pub fn new(value: impl Into<String>, expires_in_secs: i64, now: DateTime<Utc>) -> Self {
        Self {
            value: value.into(),
            expires_at: now + Duration::seconds(expires_in_secs.max(0)),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(EXPIRY_MARGIN_SECS) >= self.expires_at
    }
}

/// Body of a successful client-credentials grant.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: i64,
    #[serde(default)]
    pub token_type: String,
}

/// One live stream as reported by `GET /helix/streams`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub user_login: String,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub game_name: String,
    pub started_at: DateTime<Utc>,
}

impl StreamRecord {
    /// Channel URL as understood by streamlink.
    pub fn stream_url(&self) -> String {
        stream_url_for(&self.user_login)
    }
}

pub fn stream_url_for(username: &str) -> String {
    format!("twitch.tv/{}", username)
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub cursor: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StreamsResponse {
    #[serde(default)]
    pub data: Vec<StreamRecord>,
    #[serde(default)]
    pub pagination: Pagination,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn token_expiry_uses_margin() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let token = AccessToken::new("abc", 3600, now);
        assert!(!token.is_expired(now));
        assert!(!token.is_expired(now + Duration::seconds(3539)));
        assert!(token.is_expired(now + Duration::seconds(3540)));

        let no_lifetime = AccessToken::new("abc", 0, now);
        assert!(no_lifetime.is_expired(now));
    }

    #[test]
    fn decodes_helix_stream_payload() {
        let body = r#"{
            "data": [{
                "id": "40302405061",
                "user_id": "123",
                "user_login": "batatvideogames",
                "user_name": "BatatVideoGames",
                "game_id": "509658",
                "game_name": "Just Chatting",
                "type": "live",
                "title": "Merry Christmas!",
                "viewer_count": 78,
                "started_at": "2023-12-23T23:42:00Z",
                "language": "en",
                "tags": ["English"]
            }],
            "pagination": {}
        }"#;
        let response: StreamsResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.data.len(), 1);
        let stream = &response.data[0];
        assert_eq!(stream.id, "40302405061");
        assert_eq!(stream.game_name, "Just Chatting");
        assert_eq!(
            stream.started_at,
            Utc.with_ymd_and_hms(2023, 12, 23, 23, 42, 0).unwrap()
        );
        assert_eq!(stream.stream_url(), "twitch.tv/batatvideogames");
        assert!(response.pagination.cursor.is_none());
    }

    #[test]
    fn decodes_offline_payload() {
        let response: StreamsResponse =
            serde_json::from_str(r#"{"data": [], "pagination": {}}"#).unwrap();
        assert!(response.data.is_empty());
    }
}
