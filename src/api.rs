//! REST client for the board persistence service.
//!
//! Two endpoints are consumed: `GET board/{id}` to fetch a board's
//! serialized scene and metadata, and `PATCH board/{id}` for partial
//! updates. Every request carries the bearer credential supplied by the
//! authentication collaborator.
//!
//! ERROR HANDLING
//! ==============
//! Failures surface as typed [`ApiError`]s; the session logs them and shows
//! nothing stronger than a stalled save indicator.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use serde::{Deserialize, Serialize};

/// Errors from the persistence service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("board request rejected with status {0}")]
    Status(u16),
}

/// Owner metadata as embedded in a board record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BoardOwner {
    pub username: String,
}

/// A board as persisted by the service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Serialized scene document. Empty for a freshly created board.
    #[serde(default)]
    pub canvas_data: String,
    /// Data-URL raster preview, if one has been generated.
    #[serde(default)]
    pub thumbnail: String,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub owner: BoardOwner,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Partial update body for `PATCH board/{id}`. Only present fields are
/// applied by the service.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canvas_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,
}

/// HTTP client for the board service.
#[derive(Debug, Clone)]
pub struct BoardApi {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl BoardApi {
    /// Create a client for `base_url` (no trailing slash) authenticating
    /// with `token` as a bearer credential.
    #[must_use]
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            token: token.into(),
        }
    }

    /// Fetch a board by id.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on network failure, a non-success status, or a
    /// malformed response body.
    pub async fn fetch_board(&self, id: &str) -> Result<BoardRecord, ApiError> {
        let url = format!("{}/board/{id}", self.base_url);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ApiError::Status(response.status().as_u16()));
        }
        Ok(response.json::<BoardRecord>().await?)
    }

    /// Apply a partial update to a board.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on network failure, a non-success status, or a
    /// malformed response body.
    pub async fn update_board(&self, id: &str, patch: &BoardPatch) -> Result<BoardRecord, ApiError> {
        let url = format!("{}/board/{id}", self.base_url);
        let response = self
            .client
            .patch(&url)
            .bearer_auth(&self.token)
            .json(patch)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ApiError::Status(response.status().as_u16()));
        }
        Ok(response.json::<BoardRecord>().await?)
    }
}
