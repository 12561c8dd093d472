use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Spreadsheet request failed: {0}")]
    Api(#[from] api_client::error::ApiError),

    #[error("Database write failed: {0}")]
    Database(#[from] database::DbError),

    #[error("Sync is not configured: {0}")]
    Config(#[from] configuration::error::ConfigError),

    #[error("Sheet row {row}: {message}")]
    Row { row: usize, message: String },
}
