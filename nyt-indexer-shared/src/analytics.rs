//! Filter parameters of the pre-built news aggregations.

use std::fmt;
use std::str::FromStr;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Relative publication window ending today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeScale {
    Yesterday,
    WeekAgo,
    MonthAgo,
}

impl TimeScale {
    /// Parse a `time_scale` query parameter.
    ///
    /// Unrecognized values give `None`, meaning no date filter.
    pub fn from_param(value: &str) -> Option<Self> {
        match value.trim() {
            "yesterday" => Some(TimeScale::Yesterday),
            "week_ago" => Some(TimeScale::WeekAgo),
            "month_ago" => Some(TimeScale::MonthAgo),
            _ => None,
        }
    }

    pub fn days(&self) -> u64 {
        match self {
            TimeScale::Yesterday => 1,
            TimeScale::WeekAgo => 7,
            TimeScale::MonthAgo => 30,
        }
    }

    /// Inclusive `[today - days, today]` range.
    pub fn date_range(&self, today: NaiveDate) -> DateRange {
        let start = today
            .checked_sub_days(Days::new(self.days()))
            .unwrap_or(NaiveDate::MIN);
        DateRange { start, end: today }
    }
}

/// Inclusive date range on `first_published_date`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Bucket width of the articles-over-time histogram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalendarStep {
    Day,
    Month,
    Quarter,
    Year,
}

impl CalendarStep {
    /// Value of the `calendar_interval` aggregation parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            CalendarStep::Day => "day",
            CalendarStep::Month => "month",
            CalendarStep::Quarter => "quarter",
            CalendarStep::Year => "year",
        }
    }
}

impl fmt::Display for CalendarStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid step '{0}', expected one of day, month, quarter, year")]
pub struct InvalidCalendarStep(pub String);

impl FromStr for CalendarStep {
    type Err = InvalidCalendarStep;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "day" => Ok(CalendarStep::Day),
            "month" => Ok(CalendarStep::Month),
            "quarter" => Ok(CalendarStep::Quarter),
            "year" => Ok(CalendarStep::Year),
            other => Err(InvalidCalendarStep(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_week_ago_range() {
        let range = TimeScale::WeekAgo.date_range(date(2024, 3, 10));
        assert_eq!(range.start, date(2024, 3, 3));
        assert_eq!(range.end, date(2024, 3, 10));
    }

    #[test]
    fn test_yesterday_and_month_ranges_cross_boundaries() {
        let range = TimeScale::Yesterday.date_range(date(2024, 1, 1));
        assert_eq!(range.start, date(2023, 12, 31));

        let range = TimeScale::MonthAgo.date_range(date(2024, 3, 10));
        assert_eq!(range.start, date(2024, 2, 9));
    }

    #[test]
    fn test_unrecognized_time_scale_has_no_filter() {
        assert_eq!(TimeScale::from_param("week_ago"), Some(TimeScale::WeekAgo));
        assert_eq!(TimeScale::from_param("decade_ago"), None);
        assert_eq!(TimeScale::from_param(""), None);
    }

    #[test]
    fn test_parse_calendar_step() {
        assert_eq!("quarter".parse::<CalendarStep>(), Ok(CalendarStep::Quarter));
        assert_eq!(CalendarStep::Day.as_str(), "day");
        assert!("week".parse::<CalendarStep>().is_err());
    }
}
