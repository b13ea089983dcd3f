//! # Date Arithmetic
//!
//! Partial-precision calendar dates and interval arithmetic over them.
//!
//! Genealogical sources rarely give full dates: `1850`, `JAN 1850` and
//! `10 JAN 1850` are all common. [`GenDate`] keeps whatever precision
//! the source had, and [`DateRange`] expresses uncertainty without
//! forcing a single inferred date.
//!
//! All operations are pure and total: degenerate input yields `None` or
//! an empty range, never a panic.

use crate::primitives::{MAX_YEAR, MIN_YEAR};
use crate::types::LinealError;
use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

const MONTH_ABBR: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];

// =============================================================================
// GENDATE
// =============================================================================

/// A calendar date with possibly-unknown month and day.
///
/// The derived ordering compares year, then month, then day, with an
/// absent component ordering before any present one. A year-only date
/// therefore sorts as the earliest instant of that year, which keeps
/// `max`/`min` in interval intersection deterministic.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct GenDate {
    /// Calendar year (proleptic Gregorian).
    pub year: i32,
    /// Month 1-12, if known.
    pub month: Option<u32>,
    /// Day of month, if known. Never present without a month.
    pub day: Option<u32>,
}

impl GenDate {
    /// Create a year-only date.
    pub fn from_year(year: i32) -> Result<Self, LinealError> {
        if (MIN_YEAR..=MAX_YEAR).contains(&year) {
            Ok(Self {
                year,
                month: None,
                day: None,
            })
        } else {
            Err(LinealError::InvalidConfig(format!(
                "year {year} outside supported range {MIN_YEAR}..={MAX_YEAR}"
            )))
        }
    }

    /// Create a year-month date.
    pub fn from_ym(year: i32, month: u32) -> Result<Self, LinealError> {
        let base = Self::from_year(year)?;
        if (1..=12).contains(&month) {
            Ok(Self {
                month: Some(month),
                ..base
            })
        } else {
            Err(LinealError::InvalidConfig(format!("invalid month {month}")))
        }
    }

    /// Create a full-precision date, validated against the calendar.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Result<Self, LinealError> {
        let base = Self::from_ym(year, month)?;
        if NaiveDate::from_ymd_opt(year, month, day).is_some() {
            Ok(Self {
                day: Some(day),
                ..base
            })
        } else {
            Err(LinealError::InvalidConfig(format!(
                "invalid calendar date {year}-{month}-{day}"
            )))
        }
    }

    /// True when year, month and day are all known.
    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.month.is_some() && self.day.is_some()
    }

    /// Re-check the constructor invariants.
    ///
    /// Deserialized dates do not pass through the constructors, so the
    /// record layer calls this on everything it accepts.
    pub fn validate(&self) -> Result<(), LinealError> {
        match (self.month, self.day) {
            (None, None) => Self::from_year(self.year).map(|_| ()),
            (Some(m), None) => Self::from_ym(self.year, m).map(|_| ()),
            (Some(m), Some(d)) => Self::from_ymd(self.year, m, d).map(|_| ()),
            (None, Some(_)) => Err(LinealError::InvalidConfig(format!(
                "date {}-?-? has a day but no month",
                self.year
            ))),
        }
    }

    /// Convert to a `chrono` date. Requires full precision.
    #[must_use]
    pub fn to_naive(&self) -> Option<NaiveDate> {
        match (self.month, self.day) {
            (Some(m), Some(d)) => NaiveDate::from_ymd_opt(self.year, m, d),
            _ => None,
        }
    }

    /// Build from a `chrono` date.
    #[must_use]
    pub fn from_naive(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: Some(date.month()),
            day: Some(date.day()),
        }
    }

    /// Subtract whole days.
    ///
    /// Day-level arithmetic is only meaningful at full precision; a
    /// year-only or year-month date yields `None`.
    #[must_use]
    pub fn sub_days(&self, days: u32) -> Option<Self> {
        let naive = self.to_naive()?;
        let shifted = naive.checked_sub_days(Days::new(u64::from(days)))?;
        Some(Self::from_naive(shifted))
    }

    /// Add whole years, preserving the original precision.
    ///
    /// Feb 29 clamps to Feb 28 when the target year is not a leap year.
    /// Returns `None` when the resulting year leaves the supported range.
    #[must_use]
    pub fn add_years(&self, years: i32) -> Option<Self> {
        let year = self.year.checked_add(years)?;
        if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return None;
        }
        let day = match (self.month, self.day) {
            (Some(m), Some(d)) if NaiveDate::from_ymd_opt(year, m, d).is_none() => {
                Some(d.min(28))
            }
            (_, d) => d,
        };
        Some(Self {
            year,
            month: self.month,
            day,
        })
    }

    /// Subtract whole years. See [`GenDate::add_years`].
    #[must_use]
    pub fn sub_years(&self, years: i32) -> Option<Self> {
        self.add_years(years.checked_neg()?)
    }
}

impl fmt::Display for GenDate {
    /// GEDCOM-style rendering: `10 JAN 1950`, `JAN 1950` or `1950`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.month, self.day) {
            (Some(m), Some(d)) if (1..=12).contains(&m) => {
                write!(f, "{} {} {}", d, MONTH_ABBR[(m - 1) as usize], self.year)
            }
            (Some(m), None) if (1..=12).contains(&m) => {
                write!(f, "{} {}", MONTH_ABBR[(m - 1) as usize], self.year)
            }
            _ => write!(f, "{}", self.year),
        }
    }
}

// =============================================================================
// DATERANGE
// =============================================================================

/// A tri-state interval over possibly-unknown dates.
///
/// An absent bound means "unbounded in that direction". The range is
/// immutable; every operation returns a new instance. Callers must
/// check [`DateRange::is_empty`] before trusting a range as evidence.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct DateRange {
    /// Inclusive lower bound, or unbounded.
    pub earliest: Option<GenDate>,
    /// Inclusive upper bound, or unbounded.
    pub latest: Option<GenDate>,
}

impl DateRange {
    /// Create a range from explicit bounds.
    #[must_use]
    pub const fn new(earliest: Option<GenDate>, latest: Option<GenDate>) -> Self {
        Self { earliest, latest }
    }

    /// The fully unbounded range.
    #[must_use]
    pub const fn unbounded() -> Self {
        Self {
            earliest: None,
            latest: None,
        }
    }

    /// A degenerate range containing exactly one date.
    #[must_use]
    pub const fn exact(date: GenDate) -> Self {
        Self {
            earliest: Some(date),
            latest: Some(date),
        }
    }

    /// Window ending at `anchor`, starting at most `max_days_before`
    /// earlier.
    ///
    /// Used by date-from-event rules (burial -> death). When the anchor
    /// lacks day precision the lower bound is left open rather than
    /// guessed.
    #[must_use]
    pub fn ending_at(anchor: GenDate, max_days_before: u32) -> Self {
        Self {
            earliest: anchor.sub_days(max_days_before),
            latest: Some(anchor),
        }
    }

    /// Window `[anchor + min_years, anchor + max_years]`.
    ///
    /// Bounds that would leave the supported year range are left open.
    #[must_use]
    pub fn spanning_years(anchor: GenDate, min_years: i32, max_years: i32) -> Self {
        Self {
            earliest: anchor.add_years(min_years),
            latest: anchor.add_years(max_years),
        }
    }

    /// True iff both bounds are present and inverted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!((self.earliest, self.latest), (Some(e), Some(l)) if e > l)
    }

    /// True iff neither bound is present.
    #[must_use]
    pub const fn is_unbounded(&self) -> bool {
        self.earliest.is_none() && self.latest.is_none()
    }

    /// Interval intersection.
    ///
    /// Absent bounds act as -infinity / +infinity. The result may be
    /// empty; it is still returned (not an error) so callers can report
    /// the conflict.
    #[must_use]
    pub fn intersect(&self, other: &Self) -> Self {
        let earliest = match (self.earliest, other.earliest) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
        let latest = match (self.latest, other.latest) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        Self { earliest, latest }
    }

    /// True iff `date` respects both present bounds.
    ///
    /// An empty range contains nothing.
    #[must_use]
    pub fn contains(&self, date: GenDate) -> bool {
        if self.is_empty() {
            return false;
        }
        if let Some(e) = self.earliest
            && date < e
        {
            return false;
        }
        if let Some(l) = self.latest
            && date > l
        {
            return false;
        }
        true
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.earliest, self.latest) {
            (Some(e), Some(l)) if e == l => write!(f, "{e}"),
            (Some(e), Some(l)) => write!(f, "BET {e} AND {l}"),
            (Some(e), None) => write!(f, "AFT {e}"),
            (None, Some(l)) => write!(f, "BEF {l}"),
            (None, None) => f.write_str("unknown"),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
