use crate::{AppState, auth::AuthUser, auth::constant_time_eq, error::AppError};
use analytics::{
    ChartSet, GroupSummary, Progress, Target, build_chart_set, build_team_metrics,
    is_within_budget, progress, select_group,
};
use api_client::RateQuote;
use axum::{
    Json,
    extract::{Query, State},
};
use chrono::{Datelike, NaiveDate, Utc};
use core_types::{DailyMetricRow, GraphPeriod, GraphView, TeamMetric, month_start};
use database::{AdMetricsRow, MonitorFilter};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sheet_sync::SyncReport;
use std::sync::Arc;

/// The server's calendar day, used as "today" for chart cut-offs and default windows.
pub(crate) fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRangeQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub group: Option<String>,
}

impl DateRangeQuery {
    /// The requested window, defaulting to the current month so far.
    fn window(&self, today: NaiveDate) -> Result<(NaiveDate, NaiveDate), AppError> {
        let start = self.start_date.unwrap_or_else(|| month_start(today));
        let end = self.end_date.unwrap_or(today);
        if start > end {
            return Err(AppError::BadRequest(format!(
                "startDate {} is after endDate {}",
                start, end
            )));
        }
        Ok((start, end))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartQuery {
    pub view: Option<String>,
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub group: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorQuery {
    pub team: Option<String>,
    pub adser: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl MonitorQuery {
    /// Missing or `all` filters match everything; the window defaults to today.
    fn into_filter(self, today: NaiveDate) -> MonitorFilter {
        let specific = |v: Option<String>| v.filter(|s| !s.is_empty() && s != "all");
        MonitorFilter {
            team: specific(self.team),
            adser: specific(self.adser),
            start: self.start_date.unwrap_or(today),
            end: self.end_date.unwrap_or(today),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SyncQuery {
    pub api_key: Option<String>,
}

/// Keeps only the configured group's teams, when a group is requested.
fn scope_to_group(
    state: &AppState,
    teams: Vec<TeamMetric>,
    group: Option<&str>,
) -> Result<Vec<TeamMetric>, AppError> {
    match group {
        None | Some("") | Some("all") => Ok(teams),
        Some(name) => {
            let members = state
                .config
                .team_groups
                .get(name)
                .ok_or_else(|| AppError::NotFound(format!("Unknown team group '{}'", name)))?;
            Ok(select_group(&teams, members))
        }
    }
}

async fn load_team_metrics(
    state: &AppState,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<TeamMetric>, AppError> {
    let rows = state.db_repo.get_daily_metrics_between(start, end).await?;
    Ok(build_team_metrics(&rows))
}

/// # GET /api/health
pub async fn health(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    state.db_repo.ping().await?;
    Ok(Json(json!({ "status": "ok" })))
}

/// # GET /api/dashboard
/// Every synced row, oldest day first.
pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
) -> Result<Json<Vec<DailyMetricRow>>, AppError> {
    let rows = state.db_repo.get_all_daily_metrics().await?;
    Ok(Json(rows))
}

/// # GET /api/analytics/teams
pub async fn get_team_metrics(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Query(query): Query<DateRangeQuery>,
) -> Result<Json<Vec<TeamMetric>>, AppError> {
    let (start, end) = query.window(today())?;
    let teams = load_team_metrics(&state, start, end).await?;
    let teams = scope_to_group(&state, teams, query.group.as_deref())?;
    Ok(Json(teams))
}

/// # GET /api/analytics/charts
/// The four tracked charts for a daily (one month) or monthly (one year) view.
pub async fn get_charts(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Query(query): Query<ChartQuery>,
) -> Result<Json<ChartSet>, AppError> {
    let today = today();
    let view: GraphView = match query.view.as_deref() {
        Some(v) => v.parse()?,
        None => GraphView::Daily,
    };
    let year = query.year.unwrap_or_else(|| today.year());
    let month = query.month.or(Some(today.month()));
    let period = GraphPeriod::window(view, year, month)?;

    let teams = load_team_metrics(&state, period.start, period.end).await?;
    let teams = scope_to_group(&state, teams, query.group.as_deref())?;
    Ok(Json(build_chart_set(&teams, view, today)))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamProgress {
    pub team_name: String,
    pub within_budget: bool,
    pub inquiries: Progress,
    pub spend: Progress,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub summary: GroupSummary,
    pub teams: Vec<TeamProgress>,
}

/// # GET /api/analytics/summary
/// Group totals plus each team's progress against plan.
pub async fn get_summary(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Query(query): Query<DateRangeQuery>,
) -> Result<Json<SummaryResponse>, AppError> {
    let (start, end) = query.window(today())?;
    let teams = load_team_metrics(&state, start, end).await?;
    let teams = scope_to_group(&state, teams, query.group.as_deref())?;

    let progress_rows = teams
        .iter()
        .map(|t| TeamProgress {
            team_name: t.team_name.clone(),
            within_budget: is_within_budget(t),
            inquiries: progress(t.total_inquiries, t.planned_inquiries, Target::Reach),
            spend: progress(t.actual_spend, t.planned_daily_spend, Target::StayUnder),
        })
        .collect();

    Ok(Json(SummaryResponse {
        summary: GroupSummary::from_teams(&teams),
        teams: progress_rows,
    }))
}

/// # GET /api/monitor
pub async fn get_monitor(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Query(query): Query<MonitorQuery>,
) -> Result<Json<Vec<AdMetricsRow>>, AppError> {
    let filter = query.into_filter(today());
    if filter.start > filter.end {
        return Err(AppError::BadRequest("startDate is after endDate".to_string()));
    }
    let rows = state.db_repo.get_ad_metrics(&filter).await?;
    Ok(Json(rows))
}

/// # GET /api/exchange-rate
/// USD→THB, cached for the configured TTL.
pub async fn get_exchange_rate(State(state): State<Arc<AppState>>) -> Json<RateQuote> {
    Json(state.exchange_rates.current(Utc::now()).await)
}

/// # GET /api/sync?api_key=...
/// Pulls the spreadsheet into `daily_metrics`. Guarded by `SYNC_API_KEY`.
pub async fn trigger_sync(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SyncQuery>,
) -> Result<Json<SyncReport>, AppError> {
    let authorized = match (&state.secrets.sync_api_key, &query.api_key) {
        (Some(expected), Some(given)) => constant_time_eq(expected, given),
        _ => false,
    };
    if !authorized {
        tracing::warn!("Rejected sync request with a missing or wrong api_key.");
        return Err(AppError::Unauthorized("Unauthorized".to_string()));
    }

    let report =
        sheet_sync::sync_from_config(&state.config.sync, &state.secrets, &state.db_repo).await?;
    Ok(Json(report))
}
