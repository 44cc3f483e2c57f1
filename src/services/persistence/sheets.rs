//! Google Sheets Row Sink
//!
//! Appends rows through the Sheets REST `values:append` endpoint with
//! `valueInputOption=RAW`. Authentication is an OAuth bearer token.

use async_trait::async_trait;

use esg_survey_core::{CoreError, CoreResult, PersistenceSink, ProxyConfig, RowValue};
use esg_survey_llm::build_http_client;

use crate::models::settings::SheetsConfig;

/// Default Sheets API root
const SHEETS_API_URL: &str = "https://sheets.googleapis.com";

/// Request timeout for row appends
const SHEETS_TIMEOUT_SECS: u64 = 30;

/// Appends rows with a pre-minted OAuth bearer token.
///
/// The token is not refreshed; appends fail once it expires.
pub struct SheetsRowSink {
    client: reqwest::Client,
    base_url: String,
    spreadsheet_id: String,
    range: String,
    token: String,
}

impl SheetsRowSink {
    pub fn new(
        config: &SheetsConfig,
        token: impl Into<String>,
        proxy: Option<&ProxyConfig>,
    ) -> CoreResult<Self> {
        let client = build_http_client(proxy, SHEETS_TIMEOUT_SECS)
            .map_err(|e| CoreError::config(e.to_string()))?;
        Ok(Self {
            client,
            base_url: SHEETS_API_URL.to_string(),
            spreadsheet_id: config.spreadsheet_id.clone(),
            range: config.range.clone(),
            token: token.into(),
        })
    }

    /// Point at a different API root (local test server)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn append_url(&self) -> String {
        format!(
            "{}/v4/spreadsheets/{}/values/{}:append?valueInputOption=RAW&insertDataOption=INSERT_ROWS",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(&self.spreadsheet_id),
            urlencoding::encode(&self.range),
        )
    }

    fn request_body(values: &[RowValue]) -> serde_json::Value {
        serde_json::json!({
            "majorDimension": "ROWS",
            "values": [values],
        })
    }
}

#[async_trait]
impl PersistenceSink for SheetsRowSink {
    fn name(&self) -> &str {
        "sheets"
    }

    async fn append_row(&self, values: &[RowValue]) -> CoreResult<()> {
        let response = self
            .client
            .post(self.append_url())
            .bearer_auth(&self.token)
            .json(&Self::request_body(values))
            .send()
            .await
            .map_err(|e| CoreError::persistence(format!("Sheets request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(CoreError::persistence(format!(
                "Sheets returned HTTP {}: {}",
                status, body
            )));
        }

        Ok(())
    }
}
