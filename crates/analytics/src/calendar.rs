use chrono::NaiveDate;
use core_types::{ChartEntry, ChartFrame, TeamMetricSeries};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Date → (team → value), the working shape of a chart frame before it is
/// filtered and flattened.
pub(crate) type DateTeamMap = BTreeMap<NaiveDate, BTreeMap<String, Decimal>>;

/// Entries serialize flat next to their `date` field, so no team may use this name.
const RESERVED_TEAM_NAME: &str = "date";

/// Aligns per-team series onto a single calendar for a multi-series line chart.
///
/// Every date that appears in any series gets an entry; each team's point is
/// written under its name. When a team reports the same date twice, the later
/// point in iteration order wins. Entries dated after `today` are dropped.
///
/// The series are expected to be bucketed already (daily or monthly) by the caller.
pub fn transform_data(series: &[TeamMetricSeries], today: NaiveDate) -> ChartFrame {
    let mut by_date = DateTeamMap::new();

    for team in series {
        for point in &team.points {
            by_date
                .entry(point.date)
                .or_default()
                .insert(team.team_name.clone(), point.value);
        }
    }

    into_frame(by_date, today)
}

/// Flattens the map into an ascending frame, excluding dates after `today`.
pub(crate) fn into_frame(by_date: DateTeamMap, today: NaiveDate) -> ChartFrame {
    ChartFrame(
        by_date
            .into_iter()
            .take_while(|(date, _)| *date <= today)
            .map(|(date, mut values)| {
                if values.remove(RESERVED_TEAM_NAME).is_some() {
                    tracing::warn!(%date, "Skipped a team named 'date' in a chart entry.");
                }
                ChartEntry { date, values }
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::{DailyPoint, DailySeriesKey};
    use rust_decimal_macros::dec;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn series(team: &str, points: &[(&str, Decimal)]) -> TeamMetricSeries {
        TeamMetricSeries {
            team_name: team.to_string(),
            metric: DailySeriesKey::DepositsCount,
            points: points.iter().map(|(d, v)| DailyPoint::new(day(d), *v)).collect(),
        }
    }

    #[test]
    fn empty_input_yields_empty_frame() {
        assert!(transform_data(&[], day("2024-06-01")).is_empty());
    }

    #[test]
    fn merges_teams_onto_one_sorted_calendar() {
        let input = vec![
            series("Alpha", &[("2024-03-02", dec!(4)), ("2024-03-01", dec!(3))]),
            series("Beta", &[("2024-03-03", dec!(7)), ("2024-03-01", dec!(1))]),
        ];
        let frame = transform_data(&input, day("2024-12-31"));

        assert_eq!(
            frame.dates(),
            vec![day("2024-03-01"), day("2024-03-02"), day("2024-03-03")]
        );
        assert_eq!(frame.value(day("2024-03-01"), "Alpha"), Some(dec!(3)));
        assert_eq!(frame.value(day("2024-03-01"), "Beta"), Some(dec!(1)));
        // Sparse: Beta has nothing on the 2nd.
        assert_eq!(frame.value(day("2024-03-02"), "Beta"), None);
        assert_eq!(frame.value(day("2024-03-03"), "Beta"), Some(dec!(7)));
    }

    #[test]
    fn drops_dates_after_today_but_keeps_today() {
        let input = vec![series(
            "Alpha",
            &[
                ("2024-03-14", dec!(1)),
                ("2024-03-15", dec!(2)),
                ("2024-03-16", dec!(3)),
            ],
        )];
        let frame = transform_data(&input, day("2024-03-15"));

        assert_eq!(frame.dates(), vec![day("2024-03-14"), day("2024-03-15")]);
        assert!(frame.dates().iter().all(|d| *d <= day("2024-03-15")));
    }

    #[test]
    fn duplicate_dates_are_last_write_wins() {
        let input = vec![series(
            "Alpha",
            &[("2024-03-01", dec!(1)), ("2024-03-01", dec!(9))],
        )];
        let frame = transform_data(&input, day("2024-12-31"));

        assert_eq!(frame.len(), 1);
        assert_eq!(frame.value(day("2024-03-01"), "Alpha"), Some(dec!(9)));
    }

    #[test]
    fn team_named_date_cannot_shadow_the_entry_date() {
        let input = vec![
            series("date", &[("2024-03-01", dec!(5))]),
            series("Alpha", &[("2024-03-01", dec!(2))]),
        ];
        let frame = transform_data(&input, day("2024-12-31"));

        assert_eq!(frame.value(day("2024-03-01"), "date"), None);
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json, serde_json::json!([{ "date": "2024-03-01", "Alpha": 2.0 }]));
    }

    #[test]
    fn rerunning_is_idempotent() {
        let input = vec![
            series("Alpha", &[("2024-03-02", dec!(4)), ("2024-03-01", dec!(3))]),
            series("Beta", &[("2024-03-01", dec!(1))]),
        ];
        let today = day("2024-12-31");
        assert_eq!(transform_data(&input, today), transform_data(&input, today));
    }
}
