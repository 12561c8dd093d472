//! # Adboard Analytics
//!
//! The metrics aggregation layer. It turns per-team daily metric arrays into the
//! chart frames the dashboards plot, in either a daily or a monthly view.
//!
//! ## Architectural Principles
//!
//! - **Layer 1 Logic:** This is a pure logic crate. It has no knowledge of the
//!   database, HTTP or the spreadsheet. It depends only on `core-types` (Layer 0).
//! - **Stateless Calculation:** Every function is a pure transformation of its
//!   inputs. Callers re-run it wholesale whenever the fetched rows or the selected
//!   view change; there is no incremental state to invalidate.
//! - **Explicit "today":** Functions that drop future-dated entries take the
//!   current date as an argument so results are reproducible.
//!
//! ## Public API
//!
//! - `transform_data`: aligns per-team series onto one date-keyed `ChartFrame`.
//! - `aggregate_monthly`: collapses a daily series into one point per month.
//! - `calculate_monthly_ratio`: recomputes a ratio per month as Σ numerator ÷ Σ denominator.
//! - `build_chart_set`: the daily/monthly dispatch for the four tracked charts.
//! - `build_team_metrics`: shapes raw metric rows into the per-team source contract.
//! - `GroupSummary`, `progress`: headline totals and target progress for a team group.
//! - `FieldColorSettings`: threshold-based colour rules for table cells.

// Declare the modules that constitute this crate.
pub mod calendar;
pub mod colors;
pub mod monthly;
pub mod ratio;
pub mod source;
pub mod summary;
pub mod view;

// Re-export the key components to create a clean, public-facing API.
pub use calendar::transform_data;
pub use colors::{FieldColorSettings, ThresholdOperator, ThresholdRule, resolve_color};
pub use monthly::aggregate_monthly;
pub use ratio::calculate_monthly_ratio;
pub use source::build_team_metrics;
pub use summary::{
    GroupSummary, Progress, ProgressStatus, Target, is_within_budget, percentage, progress,
    select_group,
};
pub use view::{ChartSet, build_chart, build_chart_set};
