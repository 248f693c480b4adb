//! Epoch-second timestamps and the day arithmetic used to seed and label rates.

use std::ops::Deref;

use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

use crate::error::{ForexError, Result};

pub const SECS_IN_DAY: i64 = 86_400;

///[DateTime] is a wrapper around the epoch time as i64. Rates are seeded from this value so two
///equal [DateTime] always produce the same rate for a pair.
//The internal representation with the time package should remain hidden from clients, callers
//only ever see epoch seconds or formatted strings.
#[derive(Clone, Debug, Hash, Eq, PartialEq, PartialOrd, Copy, Ord)]
pub struct DateTime(i64);

impl DateTime {
    pub fn now() -> Self {
        OffsetDateTime::now_utc().into()
    }

    /// Truncates to 00:00 UTC of the same day.
    pub fn start_of_day(&self) -> Self {
        Self(self.0 - self.0.rem_euclid(SECS_IN_DAY))
    }

    pub fn minus_days(&self, days: i64) -> Self {
        Self(self.0 - days * SECS_IN_DAY)
    }

    pub fn date(&self) -> Date {
        let date: OffsetDateTime = (*self).into();
        date.date()
    }

    /// `YYYY-MM-DD`
    pub fn to_date_string(&self) -> String {
        self.date().to_string()
    }

    pub fn to_iso_string(&self) -> String {
        let date: OffsetDateTime = (*self).into();
        date.format(&Rfc3339).unwrap_or_else(|_| self.0.to_string())
    }

    /// Parses `YYYY-MM-DD` into 00:00 UTC of that day.
    pub fn from_date_string(val: &str) -> Result<Self> {
        let format = format_description!("[year]-[month]-[day]");
        Date::parse(val, format)
            .map(Self::from)
            .map_err(|_| ForexError::InvalidDate {
                value: val.to_string(),
            })
    }

    /// `days` day-starts ending on the day of `end`, oldest first.
    pub fn trailing_days(end: DateTime, days: u32) -> Vec<DateTime> {
        let last = end.start_of_day();
        (0..i64::from(days))
            .rev()
            .map(|offset| last.minus_days(offset))
            .collect()
    }
}

impl Deref for DateTime {
    type Target = i64;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<OffsetDateTime> for DateTime {
    fn from(value: OffsetDateTime) -> Self {
        value.unix_timestamp().into()
    }
}

impl From<Date> for DateTime {
    fn from(value: Date) -> Self {
        value.midnight().assume_utc().into()
    }
}

impl From<DateTime> for OffsetDateTime {
    fn from(v: DateTime) -> Self {
        if let Ok(date) = OffsetDateTime::from_unix_timestamp(i64::from(v)) {
            date
        } else {
            panic!("Tried to convert non-date value");
        }
    }
}

impl From<DateTime> for i64 {
    fn from(v: DateTime) -> Self {
        v.0
    }
}

impl From<i64> for DateTime {
    fn from(v: i64) -> Self {
        DateTime(v)
    }
}

#[cfg(test)]
mod tests {
    use super::{DateTime, SECS_IN_DAY};

    #[test]
    fn test_that_date_string_parses_to_midnight_utc() {
        let date = DateTime::from_date_string("2021-03-31").unwrap();
        assert_eq!(*date, 1_617_148_800);
        assert_eq!(date.to_date_string(), "2021-03-31");
        assert_eq!(date.to_iso_string(), "2021-03-31T00:00:00Z");
    }

    #[test]
    fn test_that_malformed_date_string_is_rejected() {
        assert!(DateTime::from_date_string("31/03/2021").is_err());
        assert!(DateTime::from_date_string("2021-02-30").is_err());
    }

    #[test]
    fn test_that_start_of_day_truncates_time() {
        let date = DateTime::from(1_617_148_800 + 3_661);
        assert_eq!(*date.start_of_day(), 1_617_148_800);
        assert_eq!(date.start_of_day(), date.start_of_day().start_of_day());
    }

    #[test]
    fn test_that_trailing_days_are_ordered_and_end_on_last_day() {
        let end = DateTime::from(1_617_148_800 + 5_000);
        let days = DateTime::trailing_days(end, 5);

        assert_eq!(days.len(), 5);
        assert_eq!(days.last().unwrap(), &end.start_of_day());
        assert_eq!(days.first().unwrap().to_date_string(), "2021-03-27");
        for pair in days.windows(2) {
            assert_eq!(*pair[1] - *pair[0], SECS_IN_DAY);
        }
    }

    #[test]
    fn test_that_zero_trailing_days_is_empty() {
        assert!(DateTime::trailing_days(DateTime::now(), 0).is_empty());
    }
}
