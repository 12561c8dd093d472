use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// The granularity the charts are rendered at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphView {
    #[default]
    Daily,
    Monthly,
}

impl FromStr for GraphView {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "daily" => Ok(GraphView::Daily),
            "monthly" => Ok(GraphView::Monthly),
            other => Err(CoreError::InvalidInput(
                "view".to_string(),
                format!("expected 'daily' or 'monthly', got '{}'", other),
            )),
        }
    }
}

impl fmt::Display for GraphView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphView::Daily => write!(f, "daily"),
            GraphView::Monthly => write!(f, "monthly"),
        }
    }
}

/// How a month's daily values collapse into a single monthly value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonthlyAggregation {
    /// Accumulate every value in the month (counts, spend).
    Sum,
    /// Keep the chronologically last value in the month (point-in-time figures).
    Last,
}

/// The named daily arrays the metric source provides for each team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DailySeriesKey {
    CpmCostPerInquiry,
    CostPerDeposit,
    DepositsCount,
    OneDollarPerCover,
    ActualSpend,
    TotalInquiries,
    NewPlayerValueThb,
}

impl DailySeriesKey {
    pub const ALL: [DailySeriesKey; 7] = [
        DailySeriesKey::CpmCostPerInquiry,
        DailySeriesKey::CostPerDeposit,
        DailySeriesKey::DepositsCount,
        DailySeriesKey::OneDollarPerCover,
        DailySeriesKey::ActualSpend,
        DailySeriesKey::TotalInquiries,
        DailySeriesKey::NewPlayerValueThb,
    ];
}

/// The monthly-view strategy for a chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonthlyMethod {
    Bucket(MonthlyAggregation),
    /// Recompute the ratio from the raw series: Σ numerator ÷ Σ denominator per month.
    Ratio {
        numerator: DailySeriesKey,
        denominator: DailySeriesKey,
    },
}

/// The four derived charts shown on the dashboards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TrackedChart {
    Cpm,
    CostPerDeposit,
    Deposits,
    Cover,
}

impl TrackedChart {
    pub const ALL: [TrackedChart; 4] = [
        TrackedChart::Cpm,
        TrackedChart::CostPerDeposit,
        TrackedChart::Deposits,
        TrackedChart::Cover,
    ];

    /// The daily array plotted as-is in the daily view.
    pub fn daily_source(self) -> DailySeriesKey {
        match self {
            TrackedChart::Cpm => DailySeriesKey::CpmCostPerInquiry,
            TrackedChart::CostPerDeposit => DailySeriesKey::CostPerDeposit,
            TrackedChart::Deposits => DailySeriesKey::DepositsCount,
            TrackedChart::Cover => DailySeriesKey::OneDollarPerCover,
        }
    }

    /// How the chart is built in the monthly view.
    ///
    /// Ratio charts are never bucketed from their pre-divided daily values:
    /// averaging daily cost ratios overweights low-volume days.
    pub fn monthly_method(self) -> MonthlyMethod {
        match self {
            TrackedChart::Cpm => MonthlyMethod::Ratio {
                numerator: DailySeriesKey::ActualSpend,
                denominator: DailySeriesKey::TotalInquiries,
            },
            TrackedChart::CostPerDeposit => MonthlyMethod::Ratio {
                numerator: DailySeriesKey::ActualSpend,
                denominator: DailySeriesKey::DepositsCount,
            },
            TrackedChart::Deposits => MonthlyMethod::Bucket(MonthlyAggregation::Sum),
            TrackedChart::Cover => MonthlyMethod::Bucket(MonthlyAggregation::Last),
        }
    }
}
