use chrono::NaiveDate;
use core_types::{DailyMetricRow, DailyPoint, DailySeriesKey, TeamMetric};
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Shapes raw `daily_metrics` rows into the per-team metric-source contract.
///
/// Teams appear in the order they are first seen. Counters are summed over the
/// rows; CPM and cost-per-deposit for the period are recomputed as ratios of the
/// summed spend and counts, and cover is the most recent day's figure. Each row
/// contributes one point to every daily array for which it has a value.
pub fn build_team_metrics(rows: &[DailyMetricRow]) -> Vec<TeamMetric> {
    let mut teams: Vec<TeamMetric> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut latest_cover: HashMap<usize, NaiveDate> = HashMap::new();

    for row in rows {
        let idx = *index.entry(row.team_name.as_str()).or_insert_with(|| {
            teams.push(TeamMetric::new(row.team_name.clone()));
            teams.len() - 1
        });
        let team = &mut teams[idx];

        accumulate(team, row);

        if let Some(cover) = row.one_dollar_per_cover {
            let newer = latest_cover
                .get(&idx)
                .is_none_or(|seen| row.record_date >= *seen);
            if newer {
                team.one_dollar_per_cover = cover;
                latest_cover.insert(idx, row.record_date);
            }
        }

        for key in DailySeriesKey::ALL {
            if let Some(value) = row.daily_value(key) {
                team.daily_mut(key).push(DailyPoint::new(row.record_date, value));
            }
        }
    }

    for team in &mut teams {
        team.cpm_cost_per_inquiry = ratio(team.actual_spend, team.total_inquiries);
        team.cost_per_deposit = ratio(team.actual_spend, team.deposits_count);
        for key in DailySeriesKey::ALL {
            team.daily_mut(key).sort_by_key(|p| p.date);
        }
    }

    teams
}

fn accumulate(team: &mut TeamMetric, row: &DailyMetricRow) {
    let add = |total: &mut Decimal, value: Option<Decimal>| *total += value.unwrap_or_default();

    add(&mut team.total_inquiries, row.total_inquiries);
    add(&mut team.planned_inquiries, row.planned_inquiries);
    add(&mut team.actual_spend, row.actual_spend);
    add(&mut team.planned_daily_spend, row.planned_daily_spend);
    add(&mut team.net_inquiries, row.net_inquiries);
    add(&mut team.wasted_inquiries, row.wasted_inquiries);
    add(&mut team.deposits_count, row.deposits_count);
    add(&mut team.new_player_value_thb, row.new_player_value_thb);
    add(&mut team.silent_inquiries, row.silent_inquiries);
    add(&mut team.repeat_inquiries, row.repeat_inquiries);
    add(&mut team.existing_user_inquiries, row.existing_user_inquiries);
    add(&mut team.spam_inquiries, row.spam_inquiries);
    add(&mut team.blocked_inquiries, row.blocked_inquiries);
    add(&mut team.under_18_inquiries, row.under_18_inquiries);
    add(&mut team.over_50_inquiries, row.over_50_inquiries);
    add(&mut team.foreigner_inquiries, row.foreigner_inquiries);
}

fn ratio(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator > Decimal::ZERO {
        numerator.checked_div(denominator).unwrap_or(Decimal::ZERO)
    } else {
        Decimal::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn row(date: &str, team: &str) -> DailyMetricRow {
        DailyMetricRow {
            record_date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            team_name: team.to_string(),
            ..DailyMetricRow::default()
        }
    }

    #[test]
    fn groups_by_team_in_first_seen_order() {
        let rows = vec![
            row("2024-03-01", "Beta"),
            row("2024-03-01", "Alpha"),
            row("2024-03-02", "Beta"),
        ];
        let teams = build_team_metrics(&rows);
        let names: Vec<_> = teams.iter().map(|t| t.team_name.as_str()).collect();
        assert_eq!(names, vec!["Beta", "Alpha"]);
    }

    #[test]
    fn period_ratios_are_recomputed_from_sums() {
        let mut a = row("2024-03-01", "Alpha");
        a.actual_spend = Some(dec!(100));
        a.total_inquiries = Some(dec!(10));
        a.deposits_count = Some(dec!(1));
        a.cpm_cost_per_inquiry = Some(dec!(10));
        let mut b = row("2024-03-02", "Alpha");
        b.actual_spend = Some(dec!(50));
        b.total_inquiries = Some(dec!(5));
        b.deposits_count = Some(dec!(0));
        b.cpm_cost_per_inquiry = Some(dec!(10));

        let teams = build_team_metrics(&[a, b]);
        let alpha = &teams[0];
        assert_eq!(alpha.actual_spend, dec!(150));
        assert_eq!(alpha.cpm_cost_per_inquiry, dec!(10));
        assert_eq!(alpha.cost_per_deposit, dec!(150));
        assert_eq!(alpha.cpm_cost_per_inquiry_daily.len(), 2);
    }

    #[test]
    fn zero_counts_give_zero_ratios() {
        let mut a = row("2024-03-01", "Alpha");
        a.actual_spend = Some(dec!(75));
        let teams = build_team_metrics(&[a]);
        assert_eq!(teams[0].cpm_cost_per_inquiry, Decimal::ZERO);
        assert_eq!(teams[0].cost_per_deposit, Decimal::ZERO);
    }

    #[test]
    fn cover_takes_latest_reported_day() {
        let mut late = row("2024-03-09", "Alpha");
        late.one_dollar_per_cover = Some(dec!(7));
        let mut early = row("2024-03-02", "Alpha");
        early.one_dollar_per_cover = Some(dec!(3));
        let blank = row("2024-03-10", "Alpha");

        let teams = build_team_metrics(&[late, early, blank]);
        assert_eq!(teams[0].one_dollar_per_cover, dec!(7));
        let dates: Vec<_> = teams[0]
            .one_dollar_per_cover_daily
            .iter()
            .map(|p| p.date.to_string())
            .collect();
        assert_eq!(dates, vec!["2024-03-02", "2024-03-09"]);
    }

    #[test]
    fn null_columns_are_skipped_in_daily_arrays() {
        let mut a = row("2024-03-01", "Alpha");
        a.deposits_count = Some(dec!(4));
        let teams = build_team_metrics(&[a]);
        assert_eq!(teams[0].deposits_count_daily.len(), 1);
        assert!(teams[0].actual_spend_daily.is_empty());
    }
}
