use crate::calendar::transform_data;
use crate::monthly::aggregate_monthly;
use crate::ratio::calculate_monthly_ratio;
use chrono::NaiveDate;
use core_types::{
    ChartFrame, GraphView, MonthlyMethod, RatioSeries, TeamMetric, TeamMetricSeries, TrackedChart,
};
use serde::{Deserialize, Serialize};

/// One frame per tracked chart, as rendered by the overview and analytics pages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSet {
    pub cpm: ChartFrame,
    pub cost_per_deposit: ChartFrame,
    pub deposits: ChartFrame,
    pub cover: ChartFrame,
}

/// Builds all four tracked charts for the selected view.
pub fn build_chart_set(teams: &[TeamMetric], view: GraphView, today: NaiveDate) -> ChartSet {
    tracing::debug!(teams = teams.len(), %view, %today, "Building chart set.");
    ChartSet {
        cpm: build_chart(teams, TrackedChart::Cpm, view, today),
        cost_per_deposit: build_chart(teams, TrackedChart::CostPerDeposit, view, today),
        deposits: build_chart(teams, TrackedChart::Deposits, view, today),
        cover: build_chart(teams, TrackedChart::Cover, view, today),
    }
}

/// Builds a single chart.
///
/// The daily view plots the chart's daily array as-is. The monthly view either
/// buckets that array (sum or last value) or, for ratio charts, recomputes the
/// ratio from the raw spend and count series.
pub fn build_chart(
    teams: &[TeamMetric],
    chart: TrackedChart,
    view: GraphView,
    today: NaiveDate,
) -> ChartFrame {
    match view {
        GraphView::Daily => {
            let series: Vec<TeamMetricSeries> =
                teams.iter().map(|t| t.series(chart.daily_source())).collect();
            transform_data(&series, today)
        }
        GraphView::Monthly => match chart.monthly_method() {
            MonthlyMethod::Bucket(mode) => {
                let series: Vec<TeamMetricSeries> = teams
                    .iter()
                    .map(|t| {
                        let mut s = t.series(chart.daily_source());
                        s.points = aggregate_monthly(&s.points, mode);
                        s
                    })
                    .collect();
                transform_data(&series, today)
            }
            MonthlyMethod::Ratio {
                numerator,
                denominator,
            } => {
                let series: Vec<RatioSeries> = teams
                    .iter()
                    .map(|t| RatioSeries {
                        team_name: t.team_name.clone(),
                        numerator: t.daily(numerator).to_vec(),
                        denominator: t.daily(denominator).to_vec(),
                    })
                    .collect();
                calculate_monthly_ratio(&series, today)
            }
        },
    }
}
