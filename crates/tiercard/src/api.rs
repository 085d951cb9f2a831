//! V-ARCHIVE ranking client.
//!
//! One read per card: `GET {base}/{nickname}/tier/{button}`. Error bodies carry
//! `errorCode` and `message`; the message is surfaced as-is.

use crate::result::{ExportError, ExportResult};
use crate::tier::{ButtonMode, TierErrorResponse, TierResponse};
use reqwest::Url;
use std::time::Duration;

/// Public archive endpoint
pub const DEFAULT_BASE_URL: &str = "https://v-archive.net/api/archive";

const DEFAULT_FAILURE: &str = "데이터를 불러오는데 실패했습니다.";

/// Client for the tier endpoint
#[derive(Debug, Clone)]
pub struct ArchiveClient {
    base_url: String,
    client: reqwest::Client,
}

impl Default for ArchiveClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchiveClient {
    /// Create a client for the public archive
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_default();
        Self::with_client(DEFAULT_BASE_URL, client)
    }

    /// Create a client with a custom reqwest client
    pub fn with_client(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Point the client at another base URL
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Returns the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the tier URL. The nickname is percent-encoded as one path segment.
    pub fn tier_url(&self, nickname: &str, button: ButtonMode) -> ExportResult<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ExportError::config(format!("invalid base URL {}: {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|()| ExportError::config(format!("base URL cannot have a path: {}", self.base_url)))?
            .pop_if_empty()
            .push(nickname)
            .push("tier")
            .push(&button.to_string());
        Ok(url)
    }

    /// Fetch a player's tier data
    pub async fn fetch_tier(&self, nickname: &str, button: ButtonMode) -> ExportResult<TierResponse> {
        let url = self.tier_url(nickname, button)?;
        tracing::debug!(%url, "fetching tier data");

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ExportError::upstream(e.status().map(|s| s.as_u16()), e.to_string()))?;
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| ExportError::upstream(None, format!("{status}: {e}")))?;

        if !status.is_success() {
            return Err(error_from_body(status.as_u16(), &body));
        }
        let data = TierResponse::from_json(&body)?;
        tracing::info!(
            nickname,
            button = button.count(),
            tier = %data.tier.code,
            records = data.top_list.len(),
            "tier data fetched"
        );
        Ok(data)
    }
}

/// Map a non-2xx response to an error carrying the upstream message
fn error_from_body(status: u16, body: &str) -> ExportError {
    let message = serde_json::from_str::<TierErrorResponse>(body)
        .ok()
        .map(|e| e.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| DEFAULT_FAILURE.to_string());
    ExportError::upstream(Some(status), message)
}
