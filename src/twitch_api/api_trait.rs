//! StreamApi Trait
//!
//! The controller only talks to the platform through this trait, which keeps
//! the poll loop testable without network access.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error_handling::types::ApiError;

use super::types::{AccessToken, StreamRecord};

#[async_trait]
pub trait StreamApi: Send + Sync {
    /// Requests a fresh access token with the configured credentials.
    async fn get_token(&self) -> Result<AccessToken, ApiError>;

    /// Looks up the live stream of `username`; `None` when offline.
    async fn get_stream_info(
        &self,
        username: &str,
        token: &AccessToken,
    ) -> Result<Option<StreamRecord>, ApiError>;
}

#[async_trait]
impl<T: StreamApi + ?Sized> StreamApi for Arc<T> {
    async fn get_token(&self) -> Result<AccessToken, ApiError> {
        (**self).get_token().await
    }

    async fn get_stream_info(
        &self,
        username: &str,
        token: &AccessToken,
    ) -> Result<Option<StreamRecord>, ApiError> {
        (**self).get_stream_info(username, token).await
    }
}
