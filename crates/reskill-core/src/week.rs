//! Week ids: `YYYY-MM-w<n>`, where `n` is the 7-day bucket of the month.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Local, NaiveDate};
use thiserror::Error;

/// Key of one weekly plan, e.g. `2025-03-w2`.
///
/// Buckets are calendar-month based: days 1-7 are `w1`, 8-14 `w2`, and days
/// 29-31 form a short `w5`. The local clock decides the current week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WeekId {
    year: i32,
    month: u32,
    week: u32,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid week id {input:?}: expected YYYY-MM-w<n>")]
pub struct WeekIdParseError {
    input: String,
}

impl WeekId {
    pub fn for_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
            week: date.day().div_ceil(7),
        }
    }

    /// The week containing today's local date.
    pub fn current() -> Self {
        Self::for_date(Local::now().date_naive())
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// Bucket number, 1..=5.
    pub fn week(&self) -> u32 {
        self.week
    }
}

impl fmt::Display for WeekId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-w{}", self.year, self.month, self.week)
    }
}

impl FromStr for WeekId {
    type Err = WeekIdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || WeekIdParseError {
            input: s.to_string(),
        };
        let mut parts = s.splitn(3, '-');
        let (Some(year), Some(month), Some(week)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(err());
        };
        let week = week.strip_prefix('w').ok_or_else(err)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(err());
        }
        let digits = |t: &str| !t.is_empty() && t.bytes().all(|b| b.is_ascii_digit());
        if !digits(year) || !digits(month) || !digits(week) {
            return Err(err());
        }

        let year: i32 = year.parse().map_err(|_| err())?;
        let month: u32 = month.parse().map_err(|_| err())?;
        let week: u32 = week.parse().map_err(|_| err())?;
        if !(1..=12).contains(&month) || !(1..=5).contains(&week) {
            return Err(err());
        }
        Ok(Self { year, month, week })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn week_of(day: u32) -> String {
        WeekId::for_date(NaiveDate::from_ymd_opt(2025, 3, day).unwrap()).to_string()
    }

    #[test]
    fn bucket_boundaries() {
        assert_eq!(week_of(1), "2025-03-w1");
        assert_eq!(week_of(7), "2025-03-w1");
        assert_eq!(week_of(8), "2025-03-w2");
        assert_eq!(week_of(28), "2025-03-w4");
        assert_eq!(week_of(29), "2025-03-w5");
        assert_eq!(week_of(31), "2025-03-w5");
    }

    #[test]
    fn month_is_zero_padded() {
        let id = WeekId::for_date(NaiveDate::from_ymd_opt(2024, 11, 15).unwrap());
        assert_eq!(id.to_string(), "2024-11-w3");
        let id = WeekId::for_date(NaiveDate::from_ymd_opt(2025, 1, 2).unwrap());
        assert_eq!(id.to_string(), "2025-01-w1");
    }

    #[test]
    fn parse_round_trips() {
        let id: WeekId = "2025-03-w2".parse().unwrap();
        assert_eq!((id.year(), id.month(), id.week()), (2025, 3, 2));
        assert_eq!(id.to_string(), "2025-03-w2");
    }

    #[test]
    fn parse_rejects_malformed() {
        for bad in ["", "2025-03", "2025-3-w1", "2025-03-2", "2025-13-w1", "2025-03-w6", "2025-03-w0", "25-03-w1", "2025-03-w+1"] {
            assert!(bad.parse::<WeekId>().is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn current_is_well_formed() {
        let now = WeekId::current();
        assert_eq!(now.to_string().parse::<WeekId>().unwrap(), now);
    }
}
