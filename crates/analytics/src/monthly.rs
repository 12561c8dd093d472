use chrono::NaiveDate;
use core_types::{DailyPoint, MonthlyAggregation, month_start};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Running totals for one calendar month.
///
/// Only lives for the duration of a monthly computation.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct MonthBucket {
    pub sum: Decimal,
    pub last_value: Decimal,
    pub numerator_sum: Decimal,
    pub denominator_sum: Decimal,
}

impl MonthBucket {
    pub fn record(&mut self, value: Decimal) {
        self.sum += value;
        self.last_value = value;
    }

    /// Σ numerator ÷ Σ denominator, or zero when nothing was recorded against.
    pub fn ratio(&self) -> Decimal {
        if self.denominator_sum > Decimal::ZERO {
            self.numerator_sum
                .checked_div(self.denominator_sum)
                .unwrap_or(Decimal::ZERO)
        } else {
            Decimal::ZERO
        }
    }

    pub fn value(&self, mode: MonthlyAggregation) -> Decimal {
        match mode {
            MonthlyAggregation::Sum => self.sum,
            MonthlyAggregation::Last => self.last_value,
        }
    }
}

/// Collapses a daily series into one point per calendar month.
///
/// The input does not need to be sorted. Points are stably sorted by date before
/// folding, so in `Last` mode the latest date wins and, for equal dates, the one
/// later in the input wins. Each output point is dated to the first of its month
/// and the output is ascending.
pub fn aggregate_monthly(points: &[DailyPoint], mode: MonthlyAggregation) -> Vec<DailyPoint> {
    let mut sorted = points.to_vec();
    sorted.sort_by_key(|p| p.date);

    let mut buckets: BTreeMap<NaiveDate, MonthBucket> = BTreeMap::new();
    for point in &sorted {
        buckets
            .entry(month_start(point.date))
            .or_default()
            .record(point.value);
    }

    buckets
        .into_iter()
        .map(|(month, bucket)| DailyPoint::new(month, bucket.value(mode)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn p(date: &str, value: Decimal) -> DailyPoint {
        DailyPoint::new(NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(), value)
    }

    #[test]
    fn sums_deposits_per_month() {
        let input = vec![
            p("2024-03-01", dec!(5)),
            p("2024-03-15", dec!(3)),
            p("2024-04-02", dec!(2)),
        ];
        let out = aggregate_monthly(&input, MonthlyAggregation::Sum);
        assert_eq!(out, vec![p("2024-03-01", dec!(8)), p("2024-04-01", dec!(2))]);
    }

    #[test]
    fn last_mode_takes_latest_date_regardless_of_input_order() {
        let input = vec![
            p("2024-03-20", dec!(7.5)),
            p("2024-03-02", dec!(1.0)),
            p("2024-04-30", dec!(4.0)),
            p("2024-03-11", dec!(2.0)),
            p("2024-04-01", dec!(9.0)),
        ];
        let out = aggregate_monthly(&input, MonthlyAggregation::Last);
        assert_eq!(out, vec![p("2024-03-01", dec!(7.5)), p("2024-04-01", dec!(4.0))]);
    }

    #[test]
    fn last_mode_breaks_same_date_ties_by_input_order() {
        let input = vec![p("2024-03-05", dec!(1)), p("2024-03-05", dec!(2))];
        let out = aggregate_monthly(&input, MonthlyAggregation::Last);
        assert_eq!(out, vec![p("2024-03-01", dec!(2))]);
    }

    #[test]
    fn one_point_per_distinct_month() {
        let input = vec![
            p("2023-12-31", dec!(1)),
            p("2024-01-01", dec!(1)),
            p("2024-01-31", dec!(1)),
            p("2024-02-29", dec!(1)),
            p("2024-02-01", dec!(1)),
        ];
        let out = aggregate_monthly(&input, MonthlyAggregation::Sum);
        let months: Vec<_> = out.iter().map(|pt| pt.date.to_string()).collect();
        assert_eq!(months, vec!["2023-12-01", "2024-01-01", "2024-02-01"]);
        assert_eq!(out[1].value, dec!(2));
    }

    #[test]
    fn order_of_input_does_not_change_output() {
        let a = vec![
            p("2024-03-01", dec!(5)),
            p("2024-03-15", dec!(3)),
            p("2024-04-02", dec!(2)),
        ];
        let mut b = a.clone();
        b.reverse();
        for mode in [MonthlyAggregation::Sum, MonthlyAggregation::Last] {
            assert_eq!(aggregate_monthly(&a, mode), aggregate_monthly(&b, mode));
        }
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(aggregate_monthly(&[], MonthlyAggregation::Sum).is_empty());
    }

    #[test]
    fn bucket_ratio_guards_zero_denominator() {
        let bucket = MonthBucket {
            numerator_sum: dec!(100),
            ..MonthBucket::default()
        };
        assert_eq!(bucket.ratio(), Decimal::ZERO);
    }
}
