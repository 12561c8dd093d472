use crate::error::ApiError;
use crate::responses::{GoogleErrorResponse, LatestRatesResponse, ValueRangeResponse};
use async_trait::async_trait;
use reqwest::Url;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use std::time::Duration;

pub mod cache;
pub mod error;
pub mod rates;
pub mod responses;

// --- Public API ---
pub use cache::TimedCache;
pub use rates::{ExchangeRateService, RateQuote, RateSource};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// The abstract interface to the spreadsheet holding the daily metrics.
/// The sync job depends on this trait so it can be driven by a fake in tests.
#[async_trait]
pub trait SheetSource: Send + Sync {
    /// Fetches the cells of an A1 `range`, row by row, as text.
    async fn fetch_rows(&self, range: &str) -> Result<Vec<Vec<String>>, ApiError>;
}

fn build_client() -> Result<reqwest::Client, ApiError> {
    Ok(reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?)
}

fn parse_base_url(base_url: &str) -> Result<Url, ApiError> {
    Url::parse(base_url)
        .map_err(|e| ApiError::InvalidData(format!("bad base url '{}': {}", base_url, e)))
}

/// Appends path segments to `base`, percent-encoding each one.
fn join_segments(mut base: Url, segments: &[&str]) -> Result<Url, ApiError> {
    let shown = base.to_string();
    base.path_segments_mut()
        .map_err(|_| ApiError::InvalidData(format!("'{}' cannot be a base url", shown)))?
        .pop_if_empty()
        .extend(segments);
    Ok(base)
}

/// Reads a response body, decoding it as `T` on success and as an error
/// message otherwise.
async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let status = response.status();
    let text = response.text().await?;

    if status.is_success() {
        serde_json::from_str::<T>(&text).map_err(|e| ApiError::Deserialization(e.to_string()))
    } else {
        let message = serde_json::from_str::<GoogleErrorResponse>(&text)
            .map(|e| e.error.message)
            .unwrap_or(text);
        Err(ApiError::Status(status.as_u16(), message))
    }
}

/// Google Sheets v4 client authenticated with an API key.
#[derive(Clone)]
pub struct SheetsClient {
    client: reqwest::Client,
    base_url: Url,
    api_key: String,
    sheet_id: String,
}

impl SheetsClient {
    pub fn new(base_url: &str, api_key: &str, sheet_id: &str) -> Result<Self, ApiError> {
        Ok(Self {
            client: build_client()?,
            base_url: parse_base_url(base_url)?,
            api_key: api_key.to_string(),
            sheet_id: sheet_id.to_string(),
        })
    }

    fn values_url(&self, range: &str) -> Result<Url, ApiError> {
        join_segments(
            self.base_url.clone(),
            &["v4", "spreadsheets", &self.sheet_id, "values", range],
        )
    }
}

#[async_trait]
impl SheetSource for SheetsClient {
    async fn fetch_rows(&self, range: &str) -> Result<Vec<Vec<String>>, ApiError> {
        let url = self.values_url(range)?;
        let response = self
            .client
            .get(url)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await?;
        let body: ValueRangeResponse = read_json(response).await?;
        Ok(body.into_rows())
    }
}

/// exchangerate-api.com v6 client.
#[derive(Clone)]
pub struct ExchangeRateClient {
    client: reqwest::Client,
    base_url: Url,
    api_key: String,
}

impl ExchangeRateClient {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, ApiError> {
        Ok(Self {
            client: build_client()?,
            base_url: parse_base_url(base_url)?,
            api_key: api_key.to_string(),
        })
    }
}

#[async_trait]
impl RateSource for ExchangeRateClient {
    async fn fetch_usd_thb(&self) -> Result<Decimal, ApiError> {
        let url = join_segments(self.base_url.clone(), &["v6", &self.api_key, "latest", "USD"])?;
        let response = self.client.get(url).send().await?;
        let body: LatestRatesResponse = read_json(response).await?;
        body.rate("THB").ok_or_else(|| {
            ApiError::InvalidData(format!(
                "no THB rate in response (result '{}', error {:?})",
                body.result, body.error_type
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_url_encodes_the_range() {
        let client =
            SheetsClient::new("https://sheets.googleapis.com", "k", "sheet-123").unwrap();
        let url = client.values_url("Daily Data!A2:AC").unwrap();
        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/sheet-123/values/Daily%20Data!A2:AC"
        );
    }

    #[test]
    fn base_url_with_trailing_slash_is_joined_cleanly() {
        let base = parse_base_url("https://v6.exchangerate-api.com/").unwrap();
        let url = join_segments(base, &["v6", "key", "latest", "USD"]).unwrap();
        assert_eq!(url.as_str(), "https://v6.exchangerate-api.com/v6/key/latest/USD");
    }

    #[test]
    fn opaque_base_url_cannot_take_segments() {
        let base = parse_base_url("mailto:rates@example.com").unwrap();
        match join_segments(base, &["v6"]) {
            Err(ApiError::InvalidData(message)) => {
                assert!(message.contains("mailto:rates@example.com"), "{message}");
            }
            other => panic!("expected InvalidData, got {:?}", other),
        }
    }

    #[test]
    fn rejects_a_malformed_base_url() {
        assert!(matches!(
            SheetsClient::new("not a url", "k", "s"),
            Err(ApiError::InvalidData(_))
        ));
    }
}
