//! Timezone Service for gym-desk
//!
//! The gym runs on local wall-clock time: opening hours, "today" for duplicate check-ins
//! and the date filters of the statistics dashboards are all local. Storage is UTC.

use chrono::{DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use regex::Regex;
use std::sync::OnceLock;

/// Errors that can occur during timezone operations
#[derive(Debug, thiserror::Error)]
pub enum TimezoneError {
    #[error("Invalid timezone identifier: {timezone}")]
    InvalidTimezone { timezone: String },

    #[error("Invalid date '{value}' (expected YYYY-MM-DD)")]
    InvalidDate { value: String },

    #[error("Date range starts after it ends")]
    InvertedRange,
}

/// Result type for timezone operations
pub type TimezoneResult<T> = Result<T, TimezoneError>;

fn timezone_format() -> Option<&'static Regex> {
    static FORMAT: OnceLock<Option<Regex>> = OnceLock::new();
    FORMAT
        .get_or_init(|| Regex::new(r"^[A-Za-z_]+(/[A-Za-z0-9_+\-]+)*$").ok())
        .as_ref()
}

/// Parse an IANA timezone identifier such as `America/Mexico_City`
pub fn parse_timezone(timezone: &str) -> TimezoneResult<Tz> {
    let trimmed = timezone.trim();
    if timezone_format().is_some_and(|format| !format.is_match(trimmed)) {
        return Err(TimezoneError::InvalidTimezone {
            timezone: timezone.to_string(),
        });
    }

    trimmed.parse::<Tz>().map_err(|_| TimezoneError::InvalidTimezone {
        timezone: timezone.to_string(),
    })
}

/// Parse a `YYYY-MM-DD` calendar date
pub fn parse_local_date(value: &str) -> TimezoneResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| TimezoneError::InvalidDate {
        value: value.to_string(),
    })
}

/// Opening hours and calendar arithmetic in the gym's timezone
#[derive(Debug, Clone)]
pub struct GymSchedule {
    timezone: Tz,
    opening: NaiveTime,
    closing: NaiveTime,
}

impl GymSchedule {
    pub fn new(timezone: Tz, opening: NaiveTime, closing: NaiveTime) -> Self {
        Self {
            timezone,
            opening,
            closing,
        }
    }

    pub fn opening(&self) -> NaiveTime {
        self.opening
    }

    pub fn closing(&self) -> NaiveTime {
        self.closing
    }

    /// Whether check-in is allowed at `now`. Both ends of the window are inclusive.
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        let local = now.with_timezone(&self.timezone).time();
        local >= self.opening && local <= self.closing
    }

    /// UTC instant of the most recent local midnight at or before `now`
    pub fn local_day_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let date = now.with_timezone(&self.timezone).date_naive();
        self.start_of_local_date(date)
    }

    /// UTC instant at which the given local date begins.
    ///
    /// A date whose midnight falls in a DST gap starts at the first valid instant after it.
    pub fn start_of_local_date(&self, date: NaiveDate) -> DateTime<Utc> {
        let mut naive = date.and_time(NaiveTime::MIN);
        for _ in 0..4 {
            match self.timezone.from_local_datetime(&naive) {
                LocalResult::Single(dt) => return dt.with_timezone(&Utc),
                LocalResult::Ambiguous(earliest, _) => return earliest.with_timezone(&Utc),
                LocalResult::None => naive += Duration::hours(1),
            }
        }
        Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
    }

    /// Local calendar date of an instant
    pub fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.timezone).date_naive()
    }

    /// Half-open UTC range `[from 00:00, day after to 00:00)` for inclusive local dates.
    /// Missing bounds stay open.
    pub fn date_range(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> TimezoneResult<(Option<DateTime<Utc>>, Option<DateTime<Utc>>)> {
        if let (Some(from), Some(to)) = (from, to) {
            if from > to {
                return Err(TimezoneError::InvertedRange);
            }
        }

        let start = from.map(|date| self.start_of_local_date(date));
        let end = to
            .and_then(|date| date.succ_opt())
            .map(|date| self.start_of_local_date(date));
        Ok((start, end))
    }

    /// First day of the local month containing `date`
    pub fn month_start(date: NaiveDate) -> NaiveDate {
        date.with_day(1).unwrap_or(date)
    }

    /// First day of the following local month
    pub fn next_month(date: NaiveDate) -> Option<NaiveDate> {
        Self::month_start(date).checked_add_months(chrono::Months::new(1))
    }
}
