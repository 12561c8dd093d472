use crate::enums::DailySeriesKey;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One metric's value for one team on one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub value: Decimal,
}

impl DailyPoint {
    pub fn new(date: NaiveDate, value: Decimal) -> Self {
        Self { date, value }
    }
}

/// A named metric's points for a single team, ordered by date at the source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamMetricSeries {
    pub team_name: String,
    pub metric: DailySeriesKey,
    pub points: Vec<DailyPoint>,
}

/// The raw numerator and denominator series behind a team's ratio metric.
#[derive(Debug, Clone, PartialEq)]
pub struct RatioSeries {
    pub team_name: String,
    pub numerator: Vec<DailyPoint>,
    pub denominator: Vec<DailyPoint>,
}

/// A single row of a chart frame: a date and the value of every team that
/// reported on it. Serializes flat, e.g. `{"date":"2024-03-01","Alpha":8}`, so
/// `values` must never hold a `date` key; the frame builders drop one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartEntry {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub values: BTreeMap<String, Decimal>,
}

/// The date-keyed, team-valued structure consumed by chart rendering.
///
/// Entries are ascending by date. It is sparse: a team without data for a date
/// has no key in that entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChartFrame(pub Vec<ChartEntry>);

impl ChartFrame {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn entries(&self) -> &[ChartEntry] {
        &self.0
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.0.iter().map(|e| e.date).collect()
    }

    /// The value plotted for `team` on `date`, if that team reported on that date.
    pub fn value(&self, date: NaiveDate, team: &str) -> Option<Decimal> {
        self.0
            .iter()
            .find(|e| e.date == date)
            .and_then(|e| e.values.get(team).copied())
    }
}

/// Per-team metrics for a period: scalar totals plus the daily trend arrays.
///
/// This is the contract of the metric source endpoint. Absent trend data is an
/// empty array, never null.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamMetric {
    pub team_name: String,
    pub total_inquiries: Decimal,
    pub planned_inquiries: Decimal,
    pub actual_spend: Decimal,
    pub planned_daily_spend: Decimal,
    pub net_inquiries: Decimal,
    pub wasted_inquiries: Decimal,
    pub deposits_count: Decimal,
    pub cpm_cost_per_inquiry: Decimal,
    pub cost_per_deposit: Decimal,
    pub new_player_value_thb: Decimal,
    pub one_dollar_per_cover: Decimal,
    pub silent_inquiries: Decimal,
    pub repeat_inquiries: Decimal,
    pub existing_user_inquiries: Decimal,
    pub spam_inquiries: Decimal,
    pub blocked_inquiries: Decimal,
    pub under_18_inquiries: Decimal,
    pub over_50_inquiries: Decimal,
    pub foreigner_inquiries: Decimal,

    #[serde(default)]
    pub cpm_cost_per_inquiry_daily: Vec<DailyPoint>,
    #[serde(default)]
    pub cost_per_deposit_daily: Vec<DailyPoint>,
    #[serde(default)]
    pub deposits_count_daily: Vec<DailyPoint>,
    #[serde(default)]
    pub one_dollar_per_cover_daily: Vec<DailyPoint>,
    #[serde(default)]
    pub actual_spend_daily: Vec<DailyPoint>,
    #[serde(default)]
    pub total_inquiries_daily: Vec<DailyPoint>,
    #[serde(default)]
    pub new_player_value_thb_daily: Vec<DailyPoint>,
}

impl TeamMetric {
    pub fn new(team_name: impl Into<String>) -> Self {
        Self {
            team_name: team_name.into(),
            ..Self::default()
        }
    }

    pub fn daily(&self, key: DailySeriesKey) -> &[DailyPoint] {
        match key {
            DailySeriesKey::CpmCostPerInquiry => &self.cpm_cost_per_inquiry_daily,
            DailySeriesKey::CostPerDeposit => &self.cost_per_deposit_daily,
            DailySeriesKey::DepositsCount => &self.deposits_count_daily,
            DailySeriesKey::OneDollarPerCover => &self.one_dollar_per_cover_daily,
            DailySeriesKey::ActualSpend => &self.actual_spend_daily,
            DailySeriesKey::TotalInquiries => &self.total_inquiries_daily,
            DailySeriesKey::NewPlayerValueThb => &self.new_player_value_thb_daily,
        }
    }

    pub fn daily_mut(&mut self, key: DailySeriesKey) -> &mut Vec<DailyPoint> {
        match key {
            DailySeriesKey::CpmCostPerInquiry => &mut self.cpm_cost_per_inquiry_daily,
            DailySeriesKey::CostPerDeposit => &mut self.cost_per_deposit_daily,
            DailySeriesKey::DepositsCount => &mut self.deposits_count_daily,
            DailySeriesKey::OneDollarPerCover => &mut self.one_dollar_per_cover_daily,
            DailySeriesKey::ActualSpend => &mut self.actual_spend_daily,
            DailySeriesKey::TotalInquiries => &mut self.total_inquiries_daily,
            DailySeriesKey::NewPlayerValueThb => &mut self.new_player_value_thb_daily,
        }
    }

    /// Copies one of the team's daily arrays into a standalone series.
    pub fn series(&self, key: DailySeriesKey) -> TeamMetricSeries {
        TeamMetricSeries {
            team_name: self.team_name.clone(),
            metric: key,
            points: self.daily(key).to_vec(),
        }
    }
}

/// One row of the `daily_metrics` table, keyed by `(record_date, team_name)`.
///
/// Every metric column is nullable: the spreadsheet it is synced from leaves
/// cells blank for days that have not been filled in yet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct DailyMetricRow {
    pub record_date: NaiveDate,
    pub team_name: String,
    pub kpi_budget_used_pct: Option<Decimal>,
    pub planned_inquiries: Option<Decimal>,
    pub total_inquiries: Option<Decimal>,
    pub meta_inquiries: Option<Decimal>,
    pub wasted_inquiries: Option<Decimal>,
    pub net_inquiries: Option<Decimal>,
    pub planned_daily_spend: Option<Decimal>,
    pub actual_spend: Option<Decimal>,
    pub cpm_cost_per_inquiry: Option<Decimal>,
    pub facebook_cost_per_inquiry: Option<Decimal>,
    pub deposits_count: Option<Decimal>,
    pub inquiries_per_deposit: Option<Decimal>,
    pub quality_inquiries_per_deposit: Option<Decimal>,
    pub cost_per_deposit: Option<Decimal>,
    pub new_player_value_thb: Option<Decimal>,
    pub one_dollar_per_cover: Option<Decimal>,
    pub page_blocks_7d: Option<Decimal>,
    pub page_blocks_30d: Option<Decimal>,
    pub silent_inquiries: Option<Decimal>,
    pub repeat_inquiries: Option<Decimal>,
    pub existing_user_inquiries: Option<Decimal>,
    pub spam_inquiries: Option<Decimal>,
    pub blocked_inquiries: Option<Decimal>,
    pub under_18_inquiries: Option<Decimal>,
    pub over_50_inquiries: Option<Decimal>,
    pub foreigner_inquiries: Option<Decimal>,
}

impl DailyMetricRow {
    /// The metric columns in spreadsheet order (columns C onward).
    pub const METRIC_COLUMNS: [&'static str; 26] = [
        "kpi_budget_used_pct",
        "planned_inquiries",
        "total_inquiries",
        "meta_inquiries",
        "wasted_inquiries",
        "net_inquiries",
        "planned_daily_spend",
        "actual_spend",
        "cpm_cost_per_inquiry",
        "facebook_cost_per_inquiry",
        "deposits_count",
        "inquiries_per_deposit",
        "quality_inquiries_per_deposit",
        "cost_per_deposit",
        "new_player_value_thb",
        "one_dollar_per_cover",
        "page_blocks_7d",
        "page_blocks_30d",
        "silent_inquiries",
        "repeat_inquiries",
        "existing_user_inquiries",
        "spam_inquiries",
        "blocked_inquiries",
        "under_18_inquiries",
        "over_50_inquiries",
        "foreigner_inquiries",
    ];

    /// Builds a row from metric values given in `METRIC_COLUMNS` order.
    pub fn from_metric_values(
        record_date: NaiveDate,
        team_name: String,
        v: [Option<Decimal>; 26],
    ) -> Self {
        Self {
            record_date,
            team_name,
            kpi_budget_used_pct: v[0],
            planned_inquiries: v[1],
            total_inquiries: v[2],
            meta_inquiries: v[3],
            wasted_inquiries: v[4],
            net_inquiries: v[5],
            planned_daily_spend: v[6],
            actual_spend: v[7],
            cpm_cost_per_inquiry: v[8],
            facebook_cost_per_inquiry: v[9],
            deposits_count: v[10],
            inquiries_per_deposit: v[11],
            quality_inquiries_per_deposit: v[12],
            cost_per_deposit: v[13],
            new_player_value_thb: v[14],
            one_dollar_per_cover: v[15],
            page_blocks_7d: v[16],
            page_blocks_30d: v[17],
            silent_inquiries: v[18],
            repeat_inquiries: v[19],
            existing_user_inquiries: v[20],
            spam_inquiries: v[21],
            blocked_inquiries: v[22],
            under_18_inquiries: v[23],
            over_50_inquiries: v[24],
            foreigner_inquiries: v[25],
        }
    }

    /// The metric values in `METRIC_COLUMNS` order.
    pub fn metric_values(&self) -> [Option<Decimal>; 26] {
        [
            self.kpi_budget_used_pct,
            self.planned_inquiries,
            self.total_inquiries,
            self.meta_inquiries,
            self.wasted_inquiries,
            self.net_inquiries,
            self.planned_daily_spend,
            self.actual_spend,
            self.cpm_cost_per_inquiry,
            self.facebook_cost_per_inquiry,
            self.deposits_count,
            self.inquiries_per_deposit,
            self.quality_inquiries_per_deposit,
            self.cost_per_deposit,
            self.new_player_value_thb,
            self.one_dollar_per_cover,
            self.page_blocks_7d,
            self.page_blocks_30d,
            self.silent_inquiries,
            self.repeat_inquiries,
            self.existing_user_inquiries,
            self.spam_inquiries,
            self.blocked_inquiries,
            self.under_18_inquiries,
            self.over_50_inquiries,
            self.foreigner_inquiries,
        ]
    }

    /// The value this row contributes to one of the tracked daily arrays.
    pub fn daily_value(&self, key: DailySeriesKey) -> Option<Decimal> {
        match key {
            DailySeriesKey::CpmCostPerInquiry => self.cpm_cost_per_inquiry,
            DailySeriesKey::CostPerDeposit => self.cost_per_deposit,
            DailySeriesKey::DepositsCount => self.deposits_count,
            DailySeriesKey::OneDollarPerCover => self.one_dollar_per_cover,
            DailySeriesKey::ActualSpend => self.actual_spend,
            DailySeriesKey::TotalInquiries => self.total_inquiries,
            DailySeriesKey::NewPlayerValueThb => self.new_player_value_thb,
        }
    }
}
