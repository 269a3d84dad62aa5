//! 360-day model calendar
//!
//! Climate models such as the UM run on an idealised calendar of twelve
//! 30-day months. This module converts between such dates and day offsets
//! from an epoch, which is how CF time coordinates store them.

use crate::errors::{EmissError, Result};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use std::fmt;

/// CF name of the calendar
pub const CALENDAR_NAME: &str = "360_day";

/// Days in every month
pub const DAYS_PER_MONTH: i64 = 30;

/// Days in every year
pub const DAYS_PER_YEAR: i64 = 360;

/// Day of the month used for mid-month time stamps
pub const MID_MONTH_DAY: u32 = 16;

/// A date on the 360-day calendar
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Date360 {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl Date360 {
    /// Create a date, rejecting months outside 1..=12 and days outside 1..=30
    pub fn new(year: i32, month: u32, day: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(EmissError::InvalidConfig {
                message: format!("month {} is outside 1..=12", month),
            });
        }
        if !(1..=DAYS_PER_MONTH as u32).contains(&day) {
            return Err(EmissError::InvalidConfig {
                message: format!("day {} is outside 1..=30 on a 360-day calendar", day),
            });
        }
        Ok(Self { year, month, day })
    }

    /// The mid-month stamp (day 16) of the given month
    pub fn mid_month(year: i32, month: u32) -> Result<Self> {
        Self::new(year, month, MID_MONTH_DAY)
    }

    /// Same day of the following month
    #[must_use]
    pub fn next_month(self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
                day: self.day,
            }
        } else {
            Self {
                month: self.month + 1,
                ..self
            }
        }
    }

    fn ordinal(self) -> i64 {
        i64::from(self.year) * DAYS_PER_YEAR
            + i64::from(self.month - 1) * DAYS_PER_MONTH
            + i64::from(self.day - 1)
    }
}

impl fmt::Display for Date360 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

/// Day arithmetic relative to a fixed epoch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calendar360 {
    epoch: Date360,
}

impl Calendar360 {
    pub fn new(epoch: Date360) -> Self {
        Self { epoch }
    }

    /// Parse an epoch written as `YYYY-MM-DD` or `YYYY-MM-DD HH:MM:SS`.
    ///
    /// Only midnight epochs are supported since points are whole days.
    pub fn from_epoch_str(epoch: &str) -> Result<Self> {
        let trimmed = epoch.trim();
        let date = match NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S") {
            Ok(datetime) => {
                if datetime.time() != chrono::NaiveTime::MIN {
                    return Err(EmissError::InvalidConfig {
                        message: format!("epoch '{}' must fall at midnight", epoch),
                    });
                }
                datetime.date()
            }
            Err(_) => NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").map_err(|e| {
                EmissError::InvalidConfig {
                    message: format!("cannot parse epoch '{}': {}", epoch, e),
                }
            })?,
        };

        let epoch = Date360::new(date.year(), date.month(), date.day())?;
        Ok(Self::new(epoch))
    }

    /// Whole days from the epoch to `date`
    pub fn days_since_epoch(&self, date: Date360) -> i64 {
        date.ordinal() - self.epoch.ordinal()
    }

    /// Date lying `days` after the epoch
    pub fn date_from_days(&self, days: i64) -> Date360 {
        let ordinal = self.epoch.ordinal() + days;
        let year = ordinal.div_euclid(DAYS_PER_YEAR);
        let day_of_year = ordinal.rem_euclid(DAYS_PER_YEAR);
        Date360 {
            year: year as i32,
            month: (day_of_year / DAYS_PER_MONTH) as u32 + 1,
            day: (day_of_year % DAYS_PER_MONTH) as u32 + 1,
        }
    }

    /// CF units string, e.g. `days since 1960-01-01 00:00:00`
    pub fn units(&self) -> String {
        format!("days since {} 00:00:00", self.epoch)
    }

    /// Mid-month day offsets for `count` consecutive months starting at `first`
    pub fn mid_month_series(&self, first_year: i32, first_month: u32, count: usize) -> Result<Vec<i64>> {
        let mut date = Date360::mid_month(first_year, first_month)?;
        let mut points = Vec::with_capacity(count);
        for _ in 0..count {
            points.push(self.days_since_epoch(date));
            date = date.next_month();
        }
        Ok(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mid_month_points_match_the_ukca_table() {
        let cal = Calendar360::from_epoch_str("1960-01-01 00:00:00").unwrap();
        let points = cal.mid_month_series(1974, 12, 181).unwrap();
        assert_eq!(points.len(), 181);
        assert_eq!(points[0], 5385);
        assert_eq!(points[1], 5415);
        assert_eq!(points[180], 10785);
        assert!(points.windows(2).all(|w| w[1] - w[0] == DAYS_PER_MONTH));
    }

    #[test]
    fn days_round_trip_through_dates() {
        let cal = Calendar360::from_epoch_str("1960-01-01").unwrap();
        assert_eq!(cal.date_from_days(5385), Date360::new(1974, 12, 16).unwrap());
        assert_eq!(cal.date_from_days(-1), Date360::new(1959, 12, 30).unwrap());
        assert_eq!(cal.days_since_epoch(Date360::new(1990, 1, 16).unwrap()), 10815);
    }

    #[test]
    fn units_string_is_cf_style() {
        let cal = Calendar360::from_epoch_str("1960-01-01").unwrap();
        assert_eq!(cal.units(), "days since 1960-01-01 00:00:00");
    }

    #[test]
    fn rejects_bad_epochs() {
        assert!(Calendar360::from_epoch_str("1960-13-01").is_err());
        assert!(Calendar360::from_epoch_str("1960-01-31").is_err());
        assert!(Calendar360::from_epoch_str("1960-01-01 12:00:00").is_err());
        assert!(Date360::mid_month(2000, 0).is_err());
    }
}
