use crate::enums::GraphView;
use crate::error::CoreError;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// An inclusive date window used to scope a metric-source query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl GraphPeriod {
    /// The query window for a chart view.
    ///
    /// The daily view covers one calendar month of `year`; the monthly view
    /// covers the whole year and ignores `month`.
    pub fn window(view: GraphView, year: i32, month: Option<u32>) -> Result<Self, CoreError> {
        match view {
            GraphView::Daily => {
                let month = month.ok_or_else(|| {
                    CoreError::InvalidInput(
                        "month".to_string(),
                        "the daily view needs a month".to_string(),
                    )
                })?;
                let start = first_of_month(year, month)?;
                Ok(Self {
                    start,
                    end: last_of_month(start),
                })
            }
            GraphView::Monthly => {
                let start = first_of_month(year, 1)?;
                let end = NaiveDate::from_ymd_opt(year, 12, 31).ok_or_else(|| invalid_year(year))?;
                Ok(Self { start, end })
            }
        }
    }
}

/// The month key for a date: the first day of its month.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

fn first_of_month(year: i32, month: u32) -> Result<NaiveDate, CoreError> {
    if !(1..=12).contains(&month) {
        return Err(CoreError::InvalidInput(
            "month".to_string(),
            format!("{} is not between 1 and 12", month),
        ));
    }
    NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| invalid_year(year))
}

fn last_of_month(first: NaiveDate) -> NaiveDate {
    first
        .checked_add_months(chrono::Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(first)
}

fn invalid_year(year: i32) -> CoreError {
    CoreError::InvalidInput("year".to_string(), format!("{} is out of range", year))
}
