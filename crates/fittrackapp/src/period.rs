//! # Reporting Periods
//!
//! A [`Period`] is a lookback window measured back from "now":
//!
//! | Period | Window |
//! |--------|--------|
//! | `Week` | 7 days |
//! | `Month` | 30 days |
//! | `Season` | 90 days |
//! | `All time` | no filter |
//!
//! An activity is in the period when `date >= now - window`. Unrecognized
//! period names fall back to [`Period::AllTime`] so the caller sees every record
//! rather than an error.

use chrono::{Duration, Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Period {
    Week,
    Month,
    Season,
    #[default]
    #[serde(rename = "All time")]
    AllTime,
}

impl Period {
    pub const ALL: [Period; 4] = [Period::Week, Period::Month, Period::Season, Period::AllTime];

    /// Lenient parse: unknown names mean [`Period::AllTime`].
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "week" => Period::Week,
            "month" => Period::Month,
            "season" => Period::Season,
            _ => Period::AllTime,
        }
    }

    pub fn lookback_days(&self) -> Option<i64> {
        match self {
            Period::Week => Some(7),
            Period::Month => Some(30),
            Period::Season => Some(90),
            Period::AllTime => None,
        }
    }

    /// Earliest date included in the period, or `None` when unfiltered.
    pub fn cutoff(&self, now: NaiveDateTime) -> Option<NaiveDateTime> {
        self.lookback_days().and_then(|days| days_before(now, days))
    }

    pub fn contains(&self, date: NaiveDateTime, now: NaiveDateTime) -> bool {
        self.cutoff(now).map_or(true, |cutoff| date >= cutoff)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Period::Week => "Week",
            Period::Month => "Month",
            Period::Season => "Season",
            Period::AllTime => "All time",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// `now` minus `days` whole days, or `None` when the window reaches past the
/// earliest representable date (the window is then unbounded). Negative
/// windows count as zero.
pub fn days_before(now: NaiveDateTime, days: i64) -> Option<NaiveDateTime> {
    Duration::try_days(days.max(0)).and_then(|window| now.checked_sub_signed(window))
}

/// Current local wall time, the reference point for period filtering.
pub fn now() -> NaiveDateTime {
    Local::now().naive_local()
}
