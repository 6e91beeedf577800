//! Date-range utilities
//!
//! Every period resolves to a half-open `[from, to)` window of calendar dates.
//! All arithmetic is done on `NaiveDate`, so there is no timezone or DST drift.

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Canonical storage format for expense dates
pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

/// Half-open date interval `[from, to)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(rename = "from_iso", with = "iso_date")]
    pub from: NaiveDate,
    #[serde(rename = "to_iso", with = "iso_date")]
    pub to: NaiveDate,
}

impl DateRange {
    pub fn from_iso(&self) -> String {
        self.from.format(ISO_DATE_FORMAT).to_string()
    }

    pub fn to_iso(&self) -> String {
        self.to.format(ISO_DATE_FORMAT).to_string()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date < self.to
    }

    /// Number of calendar days covered
    pub fn num_days(&self) -> i64 {
        (self.to - self.from).num_days()
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.from_iso(), self.to_iso())
    }
}

fn next_day(date: NaiveDate) -> NaiveDate {
    date.checked_add_days(Days::new(1)).unwrap_or(NaiveDate::MAX)
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// `[date, date + 1)`
pub fn day_range(date: NaiveDate) -> DateRange {
    DateRange {
        from: date,
        to: next_day(date),
    }
}

/// Seven days starting on the Monday of `date`'s week
pub fn week_range(date: NaiveDate) -> DateRange {
    // Sunday belongs to the week that started six days earlier
    let back = u64::from(date.weekday().num_days_from_monday());
    let monday = date.checked_sub_days(Days::new(back)).unwrap_or(date);
    DateRange {
        from: monday,
        to: monday.checked_add_days(Days::new(7)).unwrap_or(NaiveDate::MAX),
    }
}

/// `[first of month, first of next month)`
pub fn month_range(date: NaiveDate) -> DateRange {
    let from = first_of_month(date);
    DateRange {
        from,
        to: from.checked_add_months(Months::new(1)).unwrap_or(NaiveDate::MAX),
    }
}

/// Inclusive `start..=end` turned into a half-open window. Reversed inputs are swapped.
pub fn custom_range(start: NaiveDate, end: NaiveDate) -> DateRange {
    let (lo, hi) = if end < start { (end, start) } else { (start, end) };
    DateRange {
        from: lo,
        to: next_day(hi),
    }
}

/// Aggregation unit selected on a summary screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Day,
    Week,
    Month,
    Range,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Range => "range",
        }
    }
}

impl std::str::FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "day" | "daily" => Ok(Self::Day),
            "week" | "weekly" => Ok(Self::Week),
            "month" | "monthly" => Ok(Self::Month),
            "range" | "custom" => Ok(Self::Range),
            _ => Err(format!("Unknown period: {}", s)),
        }
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A period together with its reference date(s)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "period", rename_all = "lowercase")]
pub enum PeriodSelection {
    Day { date: NaiveDate },
    Week { date: NaiveDate },
    Month { date: NaiveDate },
    Range { start: NaiveDate, end: NaiveDate },
}

impl PeriodSelection {
    pub fn period(&self) -> Period {
        match self {
            Self::Day { .. } => Period::Day,
            Self::Week { .. } => Period::Week,
            Self::Month { .. } => Period::Month,
            Self::Range { .. } => Period::Range,
        }
    }

    pub fn range(&self) -> DateRange {
        match *self {
            Self::Day { date } => day_range(date),
            Self::Week { date } => week_range(date),
            Self::Month { date } => month_range(date),
            Self::Range { start, end } => custom_range(start, end),
        }
    }

    /// Move forward (positive) or backward (negative) by whole periods.
    ///
    /// Custom ranges move by their own length.
    pub fn shifted(&self, steps: i32) -> Self {
        match *self {
            Self::Day { date } => Self::Day {
                date: shift_days(date, i64::from(steps)),
            },
            Self::Week { date } => Self::Week {
                date: shift_days(date, i64::from(steps) * 7),
            },
            Self::Month { date } => Self::Month {
                date: shift_months(date, steps),
            },
            Self::Range { start, end } => {
                let range = custom_range(start, end);
                let offset = range.num_days() * i64::from(steps);
                Self::Range {
                    start: shift_days(range.from, offset),
                    end: shift_days(range.to, offset - 1),
                }
            }
        }
    }
}

fn shift_days(date: NaiveDate, days: i64) -> NaiveDate {
    let magnitude = Days::new(days.unsigned_abs());
    let shifted = if days >= 0 {
        date.checked_add_days(magnitude)
    } else {
        date.checked_sub_days(magnitude)
    };
    shifted.unwrap_or(date)
}

fn shift_months(date: NaiveDate, months: i32) -> NaiveDate {
    // chrono clamps to the last valid day (Jan 31 + 1 month = Feb 28/29)
    let magnitude = Months::new(months.unsigned_abs());
    let shifted = if months >= 0 {
        date.checked_add_months(magnitude)
    } else {
        date.checked_sub_months(magnitude)
    };
    shifted.unwrap_or(date)
}

/// Strictly parse a canonical `YYYY-MM-DD` date
pub fn parse_iso_date(s: &str) -> Result<NaiveDate> {
    let s = s.trim();
    if s.len() != 10 {
        return Err(Error::Validation(format!("Invalid date: {}", s)));
    }
    NaiveDate::parse_from_str(s, ISO_DATE_FORMAT)
        .map_err(|_| Error::Validation(format!("Invalid date: {}", s)))
}

/// `YYYY-MM` marker for the month containing `date`
pub fn month_key(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

/// Parse a `YYYY-MM` marker into the first day of that month
pub fn parse_month_key(s: &str) -> Option<NaiveDate> {
    let (year, month) = s.trim().split_once('-')?;
    if year.len() != 4 || month.len() != 2 {
        return None;
    }
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, 1)
}

mod iso_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::ISO_DATE_FORMAT;

    pub fn serialize<S: Serializer>(date: &NaiveDate, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&date.format(ISO_DATE_FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveDate::parse_from_str(&raw, ISO_DATE_FORMAT).map_err(serde::de::Error::custom)
    }
}
