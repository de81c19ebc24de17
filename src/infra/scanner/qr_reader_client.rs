use crate::core::moderation::{ScanError, ScanOracle};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// Public goQR.me read endpoint. Fetches the image itself from `fileurl`.
pub const DEFAULT_READ_ENDPOINT: &str = "https://api.qrserver.com/v1/read-qr-code/";

/// Scan oracle backed by a remote QR-reading HTTP API.
pub struct HttpScanOracle {
    client: Client,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct ReadResult {
    #[serde(default)]
    symbol: Vec<Symbol>,
}

#[derive(Debug, Deserialize)]
struct Symbol {
    data: Option<String>,
}

impl HttpScanOracle {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ScanError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ScanError::Http(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

/// A response is flagged if any decoded symbol carries data.
fn contains_qr(body: &str) -> Result<bool, ScanError> {
    let results: Vec<ReadResult> =
        serde_json::from_str(body).map_err(|e| ScanError::Decode(e.to_string()))?;

    Ok(results
        .iter()
        .flat_map(|r| r.symbol.iter())
        .any(|s| s.data.as_deref().is_some_and(|d| !d.is_empty())))
}

#[async_trait]
impl ScanOracle for HttpScanOracle {
    async fn scan(&self, url: &str) -> Result<bool, ScanError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("fileurl", url)])
            .send()
            .await
            .map_err(|e| ScanError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ScanError::Status(response.status().as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ScanError::Http(e.to_string()))?;

        contains_qr(&body)
    }
}
