//! Month keys for budgeting periods.
//!
//! Allowances and reimbursements are grouped by calendar month. A month is
//! stored and transmitted as a `"YYYY-MM"` string.

use std::{fmt::Display, str::FromStr};

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime, UtcOffset};

use crate::Error;

/// Income received on or after this day of the month funds the next month's budget.
pub const ALLOCATION_CUTOFF_DAY: u8 = 22;

/// The years a month key can hold: four digits.
const YEAR_RANGE: std::ops::RangeInclusive<i32> = 0..=9999;

/// A calendar month, e.g. `2025-03`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Month {
    year: i32,
    month: time::Month,
}

impl Month {
    /// Create a month from a year and a month of that year.
    pub fn new(year: i32, month: time::Month) -> Self {
        Self { year, month }
    }

    /// The month containing `date`.
    pub fn from_date(date: Date) -> Self {
        Self::new(date.year(), date.month())
    }

    /// The calendar year.
    pub fn year(&self) -> i32 {
        self.year
    }

    /// The month of the year.
    pub fn month(&self) -> time::Month {
        self.month
    }

    /// The month immediately before this one.
    pub fn previous(&self) -> Self {
        match self.month {
            time::Month::January => Self::new(self.year - 1, time::Month::December),
            month => Self::new(self.year, month.previous()),
        }
    }

    /// The month immediately after this one.
    pub fn next(&self) -> Self {
        match self.month {
            time::Month::December => Self::new(self.year + 1, time::Month::January),
            month => Self::new(self.year, month.next()),
        }
    }
}

impl Display for Month {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month as u8)
    }
}

impl FromStr for Month {
    type Err = Error;

    /// Parse a `"YYYY-MM"` string.
    ///
    /// # Errors
    /// Returns an [Error::Validation] if `s` is not a four digit year and a
    /// two digit month between 01 and 12 separated by a hyphen.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::Validation(format!("\"{s}\" is not a month in the format YYYY-MM"));

        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;

        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }

        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u8 = month.parse().map_err(|_| invalid())?;
        let month = time::Month::try_from(month).map_err(|_| invalid())?;

        Ok(Self::new(year, month))
    }
}

impl TryFrom<String> for Month {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Month> for String {
    fn from(value: Month) -> Self {
        value.to_string()
    }
}

impl ToSql for Month {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_string()))
    }
}

impl FromSql for Month {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: Error| FromSqlError::Other(Box::new(error)))
    }
}

/// The month of the wall-clock date at the UTC offset `local_offset`.
pub fn current_month(local_offset: UtcOffset) -> Month {
    Month::from_date(OffsetDateTime::now_utc().to_offset(local_offset).date())
}

/// The month whose budget is funded by income received on `date`.
///
/// Income received late in the month (on or after [ALLOCATION_CUTOFF_DAY])
/// funds the next month. An explicit `override_month` always takes precedence.
///
/// # Errors
/// Returns an [Error::Validation] if the resulting month falls outside the
/// years 0000 to 9999.
pub fn allocation_month_for_income_date(
    date: Date,
    override_month: Option<Month>,
) -> Result<Month, Error> {
    if let Some(month) = override_month {
        return Ok(month);
    }

    let month = Month::from_date(date);
    let month = if date.day() >= ALLOCATION_CUTOFF_DAY {
        month.next()
    } else {
        month
    };

    if !YEAR_RANGE.contains(&month.year()) {
        return Err(Error::Validation(format!(
            "income dated {date} falls in {}, outside the years 0000 to 9999",
            month.year()
        )));
    }

    Ok(month)
}

#[cfg(test)]
mod month_tests {
    use time::macros::date;

    use crate::Error;

    use super::Month;

    #[test]
    fn displays_as_year_and_zero_padded_month() {
        let month = Month::new(2025, time::Month::March);

        assert_eq!(month.to_string(), "2025-03");
    }

    #[test]
    fn parses_valid_month() {
        let month: Month = "2024-11".parse().unwrap();

        assert_eq!(month, Month::new(2024, time::Month::November));
    }

    #[test]
    fn rejects_month_out_of_range() {
        for input in ["2024-00", "2024-13", "2024-1", "24-01", "2024/01", "", "abcd-ef"] {
            let result = input.parse::<Month>();

            assert!(
                matches!(result, Err(Error::Validation(_))),
                "want validation error for {input:?}, got {result:?}"
            );
        }
    }

    #[test]
    fn previous_rolls_over_year() {
        let month = Month::new(2025, time::Month::January);

        assert_eq!(month.previous(), Month::new(2024, time::Month::December));
    }

    #[test]
    fn next_rolls_over_year() {
        let month = Month::new(2024, time::Month::December);

        assert_eq!(month.next(), Month::new(2025, time::Month::January));
    }

    #[test]
    fn next_and_previous_within_year() {
        let month = Month::new(2025, time::Month::June);

        assert_eq!(month.next(), Month::new(2025, time::Month::July));
        assert_eq!(month.previous(), Month::new(2025, time::Month::May));
    }

    #[test]
    fn from_date_drops_day() {
        assert_eq!(
            Month::from_date(date!(2025 - 02 - 28)),
            Month::new(2025, time::Month::February)
        );
    }

    #[test]
    fn serializes_as_string() {
        let month = Month::new(2025, time::Month::March);

        let json = serde_json::to_string(&month).unwrap();
        let parsed: Month = serde_json::from_str("\"2025-03\"").unwrap();

        assert_eq!(json, "\"2025-03\"");
        assert_eq!(parsed, month);
    }

    #[test]
    fn round_trips_through_sqlite() {
        let connection = rusqlite::Connection::open_in_memory().unwrap();
        let month = Month::new(1999, time::Month::October);

        let got: Month = connection
            .query_row("SELECT ?1", [month], |row| row.get(0))
            .unwrap();

        assert_eq!(got, month);
    }
}
