//! Twitch Helix API access.
//!
//! - `auth`: app access token retrieval from the OAuth endpoint.
//! - `streams`: live status and stream metadata lookup.
//! - `client`: [`TwitchClient`], the combined client implementing [`StreamApi`].
//! - `api_trait`: the [`StreamApi`] seam the controller is written against.
//! - `types`: response and domain types.

pub mod api_trait;
pub mod auth;
pub mod client;
pub mod streams;
pub mod types;
#[cfg(test)]
pub(crate) mod test_server;

pub use api_trait::StreamApi;
pub use client::TwitchClient;
pub use types::{AccessToken, StreamRecord};
