//! Day arithmetic and calendar quarters.
//!
//! Day counts are whole elapsed 24-hour periods truncated toward zero, not
//! calendar-day boundaries. All functions take `now` explicitly.

use std::fmt;

use chrono::{DateTime, Datelike, Duration, NaiveTime, TimeZone, Utc};

use crate::validate::ValidationError;

/// Due-date window used by the dashboard.
pub const DEFAULT_DUE_SOON_DAYS: i64 = 7;
/// Idle time after which a task counts as stale.
pub const DEFAULT_STALE_DAYS: i64 = 7;

/// Whole days from `earlier` to `later`; negative when `later` precedes.
#[must_use]
pub fn days_between(later: DateTime<Utc>, earlier: DateTime<Utc>) -> i64 {
    (later - earlier).num_days()
}

#[must_use]
pub fn days_ago(date: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    days_between(now, date)
}

/// Positive for future dates, negative once `date` has passed.
#[must_use]
pub fn days_until(date: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    days_between(date, now)
}

/// Age measured from the start date, or from creation when never started.
#[must_use]
pub fn days_open(
    start_date: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> i64 {
    days_ago(start_date.unwrap_or(created_at), now)
}

#[must_use]
pub fn days_blocked(blocked_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Option<i64> {
    blocked_at.map(|at| days_ago(at, now))
}

#[must_use]
pub fn is_overdue(due_date: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    due_date.is_some_and(|due| days_until(due, now) < 0)
}

#[must_use]
pub fn is_due_soon(due_date: Option<DateTime<Utc>>, now: DateTime<Utc>, threshold: i64) -> bool {
    due_date.is_some_and(|due| (0..=threshold).contains(&days_until(due, now)))
}

#[must_use]
pub fn is_stale(last_updated_at: DateTime<Utc>, now: DateTime<Utc>, threshold: i64) -> bool {
    days_ago(last_updated_at, now) >= threshold
}

/// Midnight of the Sunday starting the week that contains `now`.
#[must_use]
pub fn start_of_week(now: DateTime<Utc>) -> DateTime<Utc> {
    let offset = i64::from(now.weekday().num_days_from_sunday());
    let day = now.date_naive() - Duration::days(offset);
    day.and_time(NaiveTime::MIN).and_utc()
}

/// Midnight of the first day of the month that contains `now`.
#[must_use]
pub fn start_of_month(now: DateTime<Utc>) -> DateTime<Utc> {
    first_instant(now.year(), now.month()).unwrap_or(now)
}

fn first_instant(year: i32, month: u32) -> Option<DateTime<Utc>> {
    Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0).single()
}

/// A calendar quarter: Q1 = Jan–Mar, Q2 = Apr–Jun, and so on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Quarter {
    year: i32,
    quarter: u32,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl Quarter {
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidQuarter`] unless `quarter` is in
    /// `1..=4` and the year is representable.
    pub fn new(year: i32, quarter: u32) -> Result<Self, ValidationError> {
        if !(1..=4).contains(&quarter) {
            return Err(ValidationError::InvalidQuarter { year, quarter });
        }
        let start = first_instant(year, (quarter - 1) * 3 + 1)
            .ok_or(ValidationError::InvalidQuarter { year, quarter })?;
        let next_start = if quarter == 4 {
            first_instant(year + 1, 1)
        } else {
            first_instant(year, quarter * 3 + 1)
        };
        let end = next_start.map_or(DateTime::<Utc>::MAX_UTC, |next| {
            next - Duration::nanoseconds(1)
        });

        Ok(Self {
            year,
            quarter,
            start,
            end,
        })
    }

    /// The quarter that contains `date`.
    #[must_use]
    pub fn containing(date: DateTime<Utc>) -> Self {
        let quarter = date.month0() / 3 + 1;
        Self::new(date.year(), quarter).unwrap_or(Self {
            year: date.year(),
            quarter,
            start: date,
            end: date,
        })
    }

    #[must_use]
    pub fn previous(&self) -> Self {
        if self.quarter == 1 {
            Self::new(self.year - 1, 4).unwrap_or(*self)
        } else {
            Self::new(self.year, self.quarter - 1).unwrap_or(*self)
        }
    }

    /// The `count` most recent quarters, newest (the current one) first.
    #[must_use]
    pub fn recent(now: DateTime<Utc>, count: usize) -> Vec<Self> {
        let mut out = Vec::with_capacity(count);
        let mut current = Self::containing(now);
        for _ in 0..count {
            out.push(current);
            current = current.previous();
        }
        out
    }

    #[must_use]
    pub const fn year(&self) -> i32 {
        self.year
    }

    #[must_use]
    pub const fn quarter(&self) -> u32 {
        self.quarter
    }

    /// First instant of the first month.
    #[must_use]
    pub const fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// Last instant of the last month.
    #[must_use]
    pub const fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// `(start, end)`, both inclusive.
    #[must_use]
    pub const fn range(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        (self.start, self.end)
    }

    /// Inclusive on both ends.
    #[must_use]
    pub fn contains(&self, date: DateTime<Utc>) -> bool {
        self.start <= date && date <= self.end
    }

    #[must_use]
    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Q{} {}", self.quarter, self.year)
    }
}
