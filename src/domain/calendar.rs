//! Academic calendar: ISO weeks and upper/lower week parity.
//!
//! Weeks run Monday to Sunday. Week 0 is the week containing the academic
//! year's start date; even weeks are "upper", odd weeks "lower". Everything
//! here is computed locally, so switching the viewed week never touches the
//! network or the cache.

use crate::error::{Error, Result};
use chrono::{Datelike, NaiveDate, TimeDelta};
use serde::{Deserialize, Serialize};

/// Month the academic year starts in.
pub const ACADEMIC_YEAR_START_MONTH: u32 = 9;

/// Alternating week type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekParity {
    Upper,
    Lower,
}

impl WeekParity {
    pub fn flip(self) -> Self {
        match self {
            WeekParity::Upper => WeekParity::Lower,
            WeekParity::Lower => WeekParity::Upper,
        }
    }
}

impl std::fmt::Display for WeekParity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WeekParity::Upper => write!(f, "upper"),
            WeekParity::Lower => write!(f, "lower"),
        }
    }
}

/// One row of the calendar-week map.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CalendarWeek {
    /// Weeks since the academic year's first week
    pub index: i64,
    /// Monday of the week
    pub start: NaiveDate,
    pub parity: WeekParity,
}

/// Calendar anchored at an academic year start date.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AcademicCalendar {
    year_start: NaiveDate,
}

impl AcademicCalendar {
    pub fn new(year_start: NaiveDate) -> Self {
        AcademicCalendar { year_start }
    }

    /// Calendar for the academic year starting on September 1st of `year`.
    ///
    /// # Errors
    /// Returns `Error::ConfigError` if the year is out of chrono's range
    pub fn for_academic_year(year: i32) -> Result<Self> {
        NaiveDate::from_ymd_opt(year, ACADEMIC_YEAR_START_MONTH, 1)
            .map(Self::new)
            .ok_or_else(|| Error::ConfigError(format!("invalid academic year {}", year)))
    }

    /// Calendar for the academic year `date` falls in.
    ///
    /// # Errors
    /// Returns `Error::ConfigError` if the year is out of chrono's range
    pub fn containing(date: NaiveDate) -> Result<Self> {
        let year = if date.month() >= ACADEMIC_YEAR_START_MONTH {
            date.year()
        } else {
            date.year() - 1
        };
        Self::for_academic_year(year)
    }

    pub fn year_start(&self) -> NaiveDate {
        self.year_start
    }

    /// Monday of the week containing `date`.
    pub fn week_start(date: NaiveDate) -> NaiveDate {
        date - TimeDelta::days(i64::from(date.weekday().num_days_from_monday()))
    }

    /// Monday through Sunday of the week containing `date`.
    pub fn week_days(date: NaiveDate) -> [NaiveDate; 7] {
        let monday = Self::week_start(date);
        std::array::from_fn(|i| monday + TimeDelta::days(i as i64))
    }

    /// Weeks between the first academic week and the week of `date`.
    /// Negative before the year starts.
    pub fn week_index(&self, date: NaiveDate) -> i64 {
        (Self::week_start(date) - Self::week_start(self.year_start)).num_days() / 7
    }

    pub fn week_parity(&self, date: NaiveDate) -> WeekParity {
        if self.week_index(date).rem_euclid(2) == 0 {
            WeekParity::Upper
        } else {
            WeekParity::Lower
        }
    }

    /// `count` consecutive weeks starting with the week of `from`.
    pub fn week_map(&self, from: NaiveDate, count: usize) -> Vec<CalendarWeek> {
        let first = Self::week_start(from);
        (0..count)
            .map(|offset| {
                let start = first + TimeDelta::weeks(offset as i64);
                CalendarWeek {
                    index: self.week_index(start),
                    start,
                    parity: self.week_parity(start),
                }
            })
            .collect()
    }
}
