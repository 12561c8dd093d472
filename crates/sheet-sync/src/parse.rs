use crate::error::SyncError;
use chrono::NaiveDate;
use core_types::DailyMetricRow;
use rust_decimal::Decimal;
use std::str::FromStr;

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%d/%m/%Y"];

/// Row number of the first data row in an A1 range such as `Data!A2:AC`.
/// Falls back to 1 when the range has no explicit start row.
pub fn first_row_of(range: &str) -> usize {
    let cells = range.rsplit('!').next().unwrap_or(range);
    let start = cells.split(':').next().unwrap_or(cells);
    start
        .trim_start_matches(|c: char| c.is_ascii_alphabetic())
        .parse()
        .unwrap_or(1)
}

/// Parses a record date written either as `2024-03-01` or `01/03/2024`.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

/// Parses a numeric cell. Empty cells are `None`; thousands separators and a
/// trailing percent sign are ignored.
pub fn parse_number(raw: &str) -> Result<Option<Decimal>, String> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    let cleaned = cleaned.strip_suffix('%').unwrap_or(&cleaned).trim();
    if cleaned.is_empty() {
        return Ok(None);
    }
    Decimal::from_str(cleaned)
        .or_else(|_| Decimal::from_scientific(cleaned))
        .map(Some)
        .map_err(|_| format!("'{}' is not a number", raw))
}

fn is_blank(cells: &[String]) -> bool {
    cells.iter().all(|c| c.trim().is_empty())
}

/// Parses one sheet row. `row` is the sheet row number, used in errors.
pub fn parse_row(row: usize, cells: &[String]) -> Result<DailyMetricRow, SyncError> {
    let fail = |message: String| SyncError::Row { row, message };
    let cell = |i: usize| cells.get(i).map(String::as_str).unwrap_or("");

    let record_date =
        parse_date(cell(0)).ok_or_else(|| fail(format!("invalid record date '{}'", cell(0))))?;
    let team_name = cell(1).trim();
    if team_name.is_empty() {
        return Err(fail("missing team name".to_string()));
    }

    let mut values = [None; DailyMetricRow::METRIC_COLUMNS.len()];
    for (i, value) in values.iter_mut().enumerate() {
        *value = parse_number(cell(i + 2)).map_err(|e| {
            fail(format!("{}: {}", DailyMetricRow::METRIC_COLUMNS[i], e))
        })?;
    }

    Ok(DailyMetricRow::from_metric_values(record_date, team_name.to_string(), values))
}

/// Parses a whole batch. Fully blank rows are skipped; any other row that
/// fails to parse rejects the batch.
pub fn parse_rows(
    first_row: usize,
    rows: &[Vec<String>],
) -> Result<Vec<DailyMetricRow>, SyncError> {
    rows.iter()
        .enumerate()
        .filter(|(_, cells)| !is_blank(cells))
        .map(|(i, cells)| parse_row(first_row + i, cells))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn cells(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn range_start_row() {
        assert_eq!(first_row_of("Data!A2:AC"), 2);
        assert_eq!(first_row_of("'Ad Data'!B10:AC200"), 10);
        assert_eq!(first_row_of("Data!A:AC"), 1);
    }

    #[test]
    fn both_date_formats_are_accepted() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 1);
        assert_eq!(parse_date("2024-03-01"), expected);
        assert_eq!(parse_date("01/03/2024"), expected);
        assert_eq!(parse_date("03-01-2024"), None);
    }

    #[test]
    fn numbers_tolerate_separators_and_blanks() {
        assert_eq!(parse_number("1,250.50"), Ok(Some(dec!(1250.50))));
        assert_eq!(parse_number(" 85% "), Ok(Some(dec!(85))));
        assert_eq!(parse_number(""), Ok(None));
        assert!(parse_number("n/a").is_err());
    }

    #[test]
    fn short_row_leaves_missing_metrics_null() {
        let row = parse_row(2, &cells(&["2024-03-01", "Alpha", "90", "100", "1,200"])).unwrap();
        assert_eq!(row.team_name, "Alpha");
        assert_eq!(row.kpi_budget_used_pct, Some(dec!(90)));
        assert_eq!(row.total_inquiries, Some(dec!(1200)));
        assert_eq!(row.foreigner_inquiries, None);
    }

    #[test]
    fn full_row_maps_every_column_in_order() {
        let mut raw = vec!["15/03/2024".to_string(), "Beta".to_string()];
        raw.extend((1..=26).map(|n| n.to_string()));
        raw.push("ignored extra column".to_string());
        let row = parse_row(5, &raw).unwrap();
        assert_eq!(row.kpi_budget_used_pct, Some(dec!(1)));
        assert_eq!(row.actual_spend, Some(dec!(8)));
        assert_eq!(row.one_dollar_per_cover, Some(dec!(16)));
        assert_eq!(row.foreigner_inquiries, Some(dec!(26)));
    }

    #[test]
    fn bad_cell_names_row_and_column() {
        let err = parse_row(7, &cells(&["2024-03-01", "Alpha", "", "abc"])).unwrap_err();
        match err {
            SyncError::Row { row, message } => {
                assert_eq!(row, 7);
                assert!(message.contains("planned_inquiries"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn one_bad_row_rejects_the_batch() {
        let rows = vec![
            cells(&["2024-03-01", "Alpha", "1"]),
            cells(&["not a date", "Beta", "1"]),
        ];
        assert!(matches!(parse_rows(2, &rows), Err(SyncError::Row { row: 3, .. })));
    }

    #[test]
    fn blank_rows_are_skipped() {
        let rows = vec![
            cells(&["2024-03-01", "Alpha", "1"]),
            cells(&[]),
            cells(&["", "  "]),
            cells(&["2024-03-02", "Alpha", "2"]),
        ];
        let parsed = parse_rows(2, &rows).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[1].kpi_budget_used_pct, Some(dec!(2)));
    }

    #[test]
    fn missing_team_is_an_error() {
        assert!(parse_row(2, &cells(&["2024-03-01", ""])).is_err());
    }
}
