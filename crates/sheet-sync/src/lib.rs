//! # Adboard Sheet Sync
//!
//! Mirrors the daily metrics spreadsheet into the `daily_metrics` table.
//!
//! ## Architectural Principles
//!
//! - **All or nothing:** every fetched row is parsed before anything is
//!   written, and the batch is upserted in a single transaction. A single bad
//!   row aborts the run with its sheet row number.
//! - **Spreadsheet wins:** rows are keyed by `(record_date, team_name)` and a
//!   sync overwrites whatever the table held for that key.
//!
//! ## Public API
//!
//! - `run_sync`: Fetch, parse and upsert one batch from any `SheetSource`.
//! - `sync_from_config`: Builds the Google Sheets client from config and runs it.
//! - `SyncReport`, `SyncError`.

// Declare the modules that constitute this crate.
pub mod error;
pub mod parse;

// Re-export the key components to create a clean, public-facing API.
pub use error::SyncError;
pub use parse::{parse_row, parse_rows};

use api_client::{SheetSource, SheetsClient};
use configuration::{Secrets, SyncConfig};
use database::DbRepository;
use serde::Serialize;

/// Outcome of one sync run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub message: String,
    pub rows_fetched: usize,
    pub rows_upserted: usize,
}

impl SyncReport {
    fn empty() -> Self {
        Self {
            message: "No new data found.".to_string(),
            rows_fetched: 0,
            rows_upserted: 0,
        }
    }
}

/// Fetches `range` from `source`, parses every row and upserts the batch.
pub async fn run_sync(
    source: &dyn SheetSource,
    repo: &DbRepository,
    range: &str,
) -> Result<SyncReport, SyncError> {
    tracing::info!(range, "Starting data sync from the spreadsheet.");

    let rows = source.fetch_rows(range).await?;
    if rows.is_empty() {
        tracing::info!("Spreadsheet range is empty; nothing to sync.");
        return Ok(SyncReport::empty());
    }
    tracing::info!(rows = rows.len(), "Fetched rows to sync.");

    let parsed = parse::parse_rows(parse::first_row_of(range), &rows)?;
    if parsed.is_empty() {
        return Ok(SyncReport {
            rows_fetched: rows.len(),
            ..SyncReport::empty()
        });
    }

    repo.upsert_daily_metrics(&parsed).await?;

    let report = SyncReport {
        message: format!("Successfully synced {} rows.", parsed.len()),
        rows_fetched: rows.len(),
        rows_upserted: parsed.len(),
    };
    tracing::info!(
        fetched = report.rows_fetched,
        upserted = report.rows_upserted,
        "Data sync complete."
    );
    Ok(report)
}

/// Runs a sync against the Google Sheet named in `secrets`.
pub async fn sync_from_config(
    config: &SyncConfig,
    secrets: &Secrets,
    repo: &DbRepository,
) -> Result<SyncReport, SyncError> {
    let (api_key, sheet_id) = secrets.require_google()?;
    let client = SheetsClient::new(&config.sheets_base_url, api_key, sheet_id)?;
    run_sync(&client, repo, &config.range).await
}
