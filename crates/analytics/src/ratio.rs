use crate::calendar::{DateTeamMap, into_frame};
use crate::monthly::MonthBucket;
use chrono::NaiveDate;
use core_types::{ChartFrame, RatioSeries, month_start};
use std::collections::BTreeMap;

/// Computes a ratio metric per team per month from its raw daily series.
///
/// Numerator and denominator are bucketed independently, so their date sets do
/// not need to match. Every month present in either side produces a value of
/// Σ numerator ÷ Σ denominator, or zero when the denominator sum is zero. The
/// result is an ascending frame keyed by month start, with future months dropped.
pub fn calculate_monthly_ratio(series: &[RatioSeries], today: NaiveDate) -> ChartFrame {
    let mut by_month = DateTeamMap::new();

    for team in series {
        let mut totals: BTreeMap<NaiveDate, MonthBucket> = BTreeMap::new();

        for point in &team.numerator {
            totals.entry(month_start(point.date)).or_default().numerator_sum += point.value;
        }
        for point in &team.denominator {
            totals.entry(month_start(point.date)).or_default().denominator_sum += point.value;
        }

        for (month, bucket) in totals {
            by_month
                .entry(month)
                .or_default()
                .insert(team.team_name.clone(), bucket.ratio());
        }
    }

    into_frame(by_month, today)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::DailyPoint;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn points(items: &[(&str, Decimal)]) -> Vec<DailyPoint> {
        items.iter().map(|(d, v)| DailyPoint::new(day(d), *v)).collect()
    }

    fn ratio(team: &str, num: &[(&str, Decimal)], den: &[(&str, Decimal)]) -> RatioSeries {
        RatioSeries {
            team_name: team.to_string(),
            numerator: points(num),
            denominator: points(den),
        }
    }

    #[test]
    fn ratio_of_sums_not_average_of_ratios() {
        let input = vec![ratio(
            "Alpha",
            &[("2024-03-01", dec!(100)), ("2024-03-02", dec!(50))],
            &[("2024-03-01", dec!(10)), ("2024-03-02", dec!(5))],
        )];
        let frame = calculate_monthly_ratio(&input, day("2024-12-31"));
        assert_eq!(frame.value(day("2024-03-01"), "Alpha"), Some(dec!(10)));
    }

    #[test]
    fn low_volume_days_do_not_skew_the_month() {
        // Daily ratios are 1 and 100; their mean would be 50.5.
        let input = vec![ratio(
            "Alpha",
            &[("2024-05-01", dec!(99)), ("2024-05-02", dec!(100))],
            &[("2024-05-01", dec!(99)), ("2024-05-02", dec!(1))],
        )];
        let frame = calculate_monthly_ratio(&input, day("2024-12-31"));
        assert_eq!(frame.value(day("2024-05-01"), "Alpha"), Some(dec!(1.99)));
    }

    #[test]
    fn zero_denominator_yields_zero() {
        let input = vec![ratio(
            "Alpha",
            &[("2024-03-01", dec!(100))],
            &[("2024-03-01", dec!(0)), ("2024-03-09", dec!(0))],
        )];
        let frame = calculate_monthly_ratio(&input, day("2024-12-31"));
        assert_eq!(frame.value(day("2024-03-01"), "Alpha"), Some(Decimal::ZERO));
    }

    #[test]
    fn month_with_only_numerator_yields_zero() {
        let input = vec![ratio(
            "Alpha",
            &[("2024-03-01", dec!(40)), ("2024-04-03", dec!(30))],
            &[("2024-04-03", dec!(3))],
        )];
        let frame = calculate_monthly_ratio(&input, day("2024-12-31"));
        assert_eq!(frame.value(day("2024-03-01"), "Alpha"), Some(Decimal::ZERO));
        assert_eq!(frame.value(day("2024-04-01"), "Alpha"), Some(dec!(10)));
    }

    #[test]
    fn month_with_only_denominator_yields_zero() {
        let input = vec![ratio("Alpha", &[], &[("2024-03-04", dec!(12))])];
        let frame = calculate_monthly_ratio(&input, day("2024-12-31"));
        assert_eq!(frame.value(day("2024-03-01"), "Alpha"), Some(Decimal::ZERO));
    }

    #[test]
    fn merges_teams_and_excludes_future_months() {
        let input = vec![
            ratio(
                "Alpha",
                &[("2024-02-10", dec!(20)), ("2024-04-10", dec!(20))],
                &[("2024-02-10", dec!(4)), ("2024-04-10", dec!(4))],
            ),
            ratio("Beta", &[("2024-03-10", dec!(9))], &[("2024-03-10", dec!(3))]),
        ];
        let frame = calculate_monthly_ratio(&input, day("2024-03-31"));

        assert_eq!(frame.dates(), vec![day("2024-02-01"), day("2024-03-01")]);
        assert_eq!(frame.value(day("2024-02-01"), "Alpha"), Some(dec!(5)));
        assert_eq!(frame.value(day("2024-02-01"), "Beta"), None);
        assert_eq!(frame.value(day("2024-03-01"), "Beta"), Some(dec!(3)));
    }

    #[test]
    fn current_month_is_kept_mid_month() {
        let input = vec![ratio("Alpha", &[("2024-03-02", dec!(8))], &[("2024-03-02", dec!(2))])];
        let frame = calculate_monthly_ratio(&input, day("2024-03-15"));
        assert_eq!(frame.dates(), vec![day("2024-03-01")]);
    }
}
