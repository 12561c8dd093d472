//! # Adboard Core Types
//!
//! The shared vocabulary of the workspace: metric points, per-team series, the
//! chart frame handed to the presentation layer, and the row shapes read from
//! the metrics table.
//!
//! This is a Layer 0 crate. It has no knowledge of HTTP, the spreadsheet or the
//! aggregation rules; it only describes data.

pub mod enums;
pub mod error;
pub mod period;
pub mod structs;
pub mod user_settings;

// Re-export the core types to provide a clean public API.
pub use enums::{DailySeriesKey, GraphView, MonthlyAggregation, MonthlyMethod, TrackedChart};
pub use error::CoreError;
pub use period::{GraphPeriod, month_start};
pub use structs::{
    ChartEntry, ChartFrame, DailyMetricRow, DailyPoint, RatioSeries, TeamMetric, TeamMetricSeries,
};
pub use user_settings::{ColorTheme, FilterRange, FontSize, Theme, UserSettings, UserSettingsUpdate};
