use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

/// The response from `GET /v4/spreadsheets/{id}/values/{range}`.
///
/// `values` is omitted entirely when the range is empty.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueRangeResponse {
    #[serde(default)]
    pub range: String,
    #[serde(default)]
    pub values: Vec<Vec<Value>>,
}

impl ValueRangeResponse {
    /// Every cell as text. Formatted values already arrive as strings; numbers
    /// and booleans from other render options are stringified, nulls become "".
    pub fn into_rows(self) -> Vec<Vec<String>> {
        self.values
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect()
    }
}

fn cell_text(cell: Value) -> String {
    match cell {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Google API error envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleErrorResponse {
    pub error: GoogleErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GoogleErrorBody {
    pub code: u16,
    pub message: String,
}

/// The response from exchangerate-api's `GET /v6/{key}/latest/USD`.
#[derive(Debug, Clone, Deserialize)]
pub struct LatestRatesResponse {
    pub result: String,
    #[serde(default)]
    pub conversion_rates: HashMap<String, Decimal>,
    #[serde(rename = "error-type")]
    pub error_type: Option<String>,
}

impl LatestRatesResponse {
    /// The rate for `currency`, only when the call reports success.
    pub fn rate(&self, currency: &str) -> Option<Decimal> {
        if self.result != "success" {
            return None;
        }
        self.conversion_rates.get(currency).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn value_range_cells_become_text() {
        let json = serde_json::json!({
            "range": "Data!A2:AC1000",
            "majorDimension": "ROWS",
            "values": [["2024-03-01", "Alpha", "1,250.50", 12, null]]
        });
        let response: ValueRangeResponse = serde_json::from_value(json).unwrap();
        let rows = response.into_rows();
        assert_eq!(rows, vec![vec!["2024-03-01", "Alpha", "1,250.50", "12", ""]]);
    }

    #[test]
    fn empty_range_has_no_rows() {
        let json = serde_json::json!({ "range": "Data!A2:AC", "majorDimension": "ROWS" });
        let response: ValueRangeResponse = serde_json::from_value(json).unwrap();
        assert!(response.into_rows().is_empty());
    }

    #[test]
    fn thb_rate_requires_success() {
        let ok: LatestRatesResponse = serde_json::from_value(serde_json::json!({
            "result": "success",
            "base_code": "USD",
            "conversion_rates": { "USD": 1, "THB": 36.25 }
        }))
        .unwrap();
        assert_eq!(ok.rate("THB"), Some(dec!(36.25)));
        assert_eq!(ok.rate("EUR"), None);

        let failed: LatestRatesResponse = serde_json::from_value(serde_json::json!({
            "result": "error",
            "error-type": "invalid-key"
        }))
        .unwrap();
        assert_eq!(failed.rate("THB"), None);
        assert_eq!(failed.error_type.as_deref(), Some("invalid-key"));
    }
}
