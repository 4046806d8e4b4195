//! Half-open time windows
//!
//! Every query the engine makes is scoped to `[start, end)` ending at the
//! request's `now`, so repeated calls recompute from source timestamps.

use crate::error::AnalyticsError;
use crate::types::Timestamp;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A half-open interval `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Create a window, rejecting `start > end`
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, AnalyticsError> {
        if start > end {
            return Err(AnalyticsError::InvalidWindow(format!(
                "start {} is after end {}",
                start.to_rfc3339(),
                end.to_rfc3339()
            )));
        }
        Ok(Self { start, end })
    }

    /// Window of the given length ending at `now`
    pub fn ending_at(now: DateTime<Utc>, length: Duration) -> Result<Self, AnalyticsError> {
        let start = now.checked_sub_signed(length).ok_or_else(|| {
            AnalyticsError::InvalidWindow(format!(
                "{length} before {} is out of range",
                now.to_rfc3339()
            ))
        })?;
        Self::new(start, now)
    }

    /// `[now - days, now)`
    pub fn last_days(now: DateTime<Utc>, days: i64) -> Result<Self, AnalyticsError> {
        let length = Duration::try_days(days).ok_or_else(|| {
            AnalyticsError::InvalidWindow(format!("{days} days is out of range"))
        })?;
        Self::ending_at(now, length)
    }

    /// `[now - hours, now)`
    pub fn last_hours(now: DateTime<Utc>, hours: i64) -> Result<Self, AnalyticsError> {
        let length = Duration::try_hours(hours).ok_or_else(|| {
            AnalyticsError::InvalidWindow(format!("{hours} hours is out of range"))
        })?;
        Self::ending_at(now, length)
    }

    /// Whether an offset-carrying timestamp falls inside the window
    pub fn contains(&self, at: &Timestamp) -> bool {
        let at = at.with_timezone(&Utc);
        self.start <= at && at < self.end
    }

    /// Whether `other` lies entirely within this window
    pub fn covers(&self, other: &TimeWindow) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// UTC calendar date of the window start
    pub fn start_date(&self) -> NaiveDate {
        self.start.date_naive()
    }

    /// UTC calendar date of the window end
    pub fn end_date(&self) -> NaiveDate {
        self.end.date_naive()
    }
}

/// Round to one decimal place, halves to the even digit (2.25 -> 2.2)
pub(crate) fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round_ties_even() / 10.0
}
