//! # Schedule Resolver
//!
//! Turns business and employee schedules into opening hours for a date and
//! the 30-minute slot grid inside them.
//!
//! ## Resolution Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Schedule Resolution                               │
//! │                                                                         │
//! │  business schedule ─┐                                                   │
//! │                     ├─► effective_schedule()                            │
//! │  employee schedule ─┘     days/hours/breaks: employee wins entirely     │
//! │                           disabled dates:    union of both              │
//! │                                 │                                       │
//! │                                 ▼                                       │
//! │                     hours_on(date) ─► Closed                            │
//! │                                 │      (not a working day, or disabled) │
//! │                                 ▼                                       │
//! │                     Open { 09:00, 12:00 } ─► slots()                    │
//! │                                              09:00 09:30 10:00 ...      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//! ```rust
//! use chrono::NaiveDate;
//! use trim_core::schedule::{OpeningHours, ScheduleSpec, TimeOfDay, Weekday};
//!
//! let mut spec = ScheduleSpec::default();
//! spec.working_days.push(Weekday::Monday);
//! spec.working_hours.insert(
//!     Weekday::Monday,
//!     OpeningHours::new(TimeOfDay::hm(9, 0), TimeOfDay::hm(10, 0)),
//! );
//!
//! let monday = NaiveDate::from_ymd_opt(2024, 5, 6).unwrap();
//! let slots: Vec<String> = spec.hours_on(monday).slots().map(|t| t.to_string()).collect();
//! assert_eq!(slots, vec!["09:00", "09:30"]);
//! ```

use chrono::{Datelike, NaiveDate};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::iter::FusedIterator;
use std::str::FromStr;

use crate::error::ValidationError;

/// Length of one bookable slot.
pub const SLOT_MINUTES: u16 = 30;

/// Opening time used when a working day has no explicit hours.
pub const DEFAULT_OPENS_AT: TimeOfDay = TimeOfDay::hm(9, 0);

/// Closing time used when a working day has no explicit hours.
pub const DEFAULT_CLOSES_AT: TimeOfDay = TimeOfDay::hm(17, 0);

const MINUTES_PER_DAY: u16 = 24 * 60;

// =============================================================================
// Weekday
// =============================================================================

/// Day of the week, serialized by its English name ("Monday").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    /// Resolves the weekday of a calendar date.
    pub fn of(date: NaiveDate) -> Self {
        match date.weekday() {
            chrono::Weekday::Mon => Weekday::Monday,
            chrono::Weekday::Tue => Weekday::Tuesday,
            chrono::Weekday::Wed => Weekday::Wednesday,
            chrono::Weekday::Thu => Weekday::Thursday,
            chrono::Weekday::Fri => Weekday::Friday,
            chrono::Weekday::Sat => Weekday::Saturday,
            chrono::Weekday::Sun => Weekday::Sunday,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
            Weekday::Friday => "Friday",
            Weekday::Saturday => "Saturday",
            Weekday::Sunday => "Sunday",
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Weekday {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Weekday::ALL
            .into_iter()
            .find(|day| day.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ValidationError::invalid("weekday", format!("unknown day '{s}'")))
    }
}

// =============================================================================
// Time of Day
// =============================================================================

/// Minutes since local midnight, written as "HH:MM".
///
/// "24:00" is accepted so that a day can close at midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimeOfDay(u16);

impl TimeOfDay {
    /// Builds a time from hours and minutes. Out-of-range input saturates
    /// at 24:00.
    pub const fn hm(hours: u16, minutes: u16) -> Self {
        let total = hours * 60 + minutes;
        if total > MINUTES_PER_DAY {
            TimeOfDay(MINUTES_PER_DAY)
        } else {
            TimeOfDay(total)
        }
    }

    #[inline]
    pub const fn minutes(&self) -> u16 {
        self.0
    }

    #[inline]
    pub const fn hours_part(&self) -> u16 {
        self.0 / 60
    }

    #[inline]
    pub const fn minutes_part(&self) -> u16 {
        self.0 % 60
    }

    /// Adds minutes, returning `None` past 24:00.
    pub fn checked_add(&self, minutes: u16) -> Option<TimeOfDay> {
        let next = self.0.checked_add(minutes)?;
        (next <= MINUTES_PER_DAY).then_some(TimeOfDay(next))
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hours_part(), self.minutes_part())
    }
}

impl FromStr for TimeOfDay {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || ValidationError::invalid("time", format!("expected HH:MM, got '{s}'"));

        let (h, m) = s.trim().split_once(':').ok_or_else(bad)?;
        if h.is_empty() || h.len() > 2 || m.len() != 2 {
            return Err(bad());
        }
        let hours: u16 = h.parse().map_err(|_| bad())?;
        let minutes: u16 = m.parse().map_err(|_| bad())?;

        if minutes > 59 || hours > 24 || (hours == 24 && minutes != 0) {
            return Err(bad());
        }
        Ok(TimeOfDay(hours * 60 + minutes))
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

/// Treats a missing, null or blank string as "not set".
fn blank_time_as_none<'de, D>(deserializer: D) -> Result<Option<TimeOfDay>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(de::Error::custom),
    }
}

// =============================================================================
// Opening Hours & Breaks
// =============================================================================

/// Configured hours for one weekday. Either half may be missing, in which
/// case the default for that half applies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpeningHours {
    #[serde(default, deserialize_with = "blank_time_as_none")]
    pub opens_at: Option<TimeOfDay>,
    #[serde(default, deserialize_with = "blank_time_as_none")]
    pub closes_at: Option<TimeOfDay>,
}

impl OpeningHours {
    pub fn new(opens_at: TimeOfDay, closes_at: TimeOfDay) -> Self {
        OpeningHours {
            opens_at: Some(opens_at),
            closes_at: Some(closes_at),
        }
    }
}

/// A sub-interval of the working day during which nothing is bookable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakInterval {
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

impl BreakInterval {
    pub fn new(start: TimeOfDay, end: TimeOfDay) -> Self {
        BreakInterval { start, end }
    }

    /// Half-open membership: `start <= t < end`.
    #[inline]
    pub fn contains(&self, t: TimeOfDay) -> bool {
        t >= self.start && t < self.end
    }
}

// =============================================================================
// Schedule Spec
// =============================================================================

/// Working days, hours, breaks and disabled dates for a business or an
/// employee.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScheduleSpec {
    pub working_days: Vec<Weekday>,
    pub working_hours: BTreeMap<Weekday, OpeningHours>,
    pub breaks: BTreeMap<Weekday, Vec<BreakInterval>>,
    #[serde(deserialize_with = "deserialize_dates")]
    pub disabled_dates: BTreeSet<NaiveDate>,
}

impl ScheduleSpec {
    /// Whether this record defines its own working week.
    pub fn has_own_schedule(&self) -> bool {
        !self.working_days.is_empty()
    }

    pub fn is_working_day(&self, day: Weekday) -> bool {
        self.working_days.contains(&day)
    }

    pub fn is_disabled(&self, date: NaiveDate) -> bool {
        self.disabled_dates.contains(&date)
    }

    /// Breaks configured for a weekday (empty when none).
    pub fn breaks_on(&self, day: Weekday) -> &[BreakInterval] {
        self.breaks.get(&day).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Opening hours for a calendar date.
    ///
    /// Closed when the weekday is not a working day or the date is disabled.
    /// A working day without explicit hours falls back to 09:00-17:00, one
    /// half at a time.
    pub fn hours_on(&self, date: NaiveDate) -> DayHours {
        let day = Weekday::of(date);
        if !self.is_working_day(day) || self.is_disabled(date) {
            return DayHours::Closed;
        }

        let configured = self.working_hours.get(&day).copied().unwrap_or_default();
        DayHours::Open {
            opens_at: configured.opens_at.unwrap_or(DEFAULT_OPENS_AT),
            closes_at: configured.closes_at.unwrap_or(DEFAULT_CLOSES_AT),
        }
    }

    /// Drops empty entries: hours for non-working days and inverted breaks.
    pub fn sanitized(mut self) -> Self {
        let mut seen = BTreeSet::new();
        self.working_days.retain(|day| seen.insert(*day));

        let days = self.working_days.clone();
        self.working_hours.retain(|day, _| days.contains(day));
        for intervals in self.breaks.values_mut() {
            intervals.retain(|b| b.start < b.end);
        }
        self.breaks.retain(|_, intervals| !intervals.is_empty());
        self
    }
}

/// Accepts "YYYY-MM-DD" as well as full ISO instants, keeping the date part.
fn deserialize_dates<'de, D>(deserializer: D) -> Result<BTreeSet<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Vec<String> = Vec::deserialize(deserializer)?;
    raw.iter()
        .filter(|s| !s.trim().is_empty())
        .map(|s| parse_calendar_date(s).map_err(de::Error::custom))
        .collect()
}

/// Parses a calendar date, ignoring any time part after the first 10 chars.
pub fn parse_calendar_date(raw: &str) -> Result<NaiveDate, ValidationError> {
    let trimmed = raw.trim();
    let date_part = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .map_err(|_| ValidationError::invalid("date", format!("expected YYYY-MM-DD, got '{raw}'")))
}

/// Merges a business schedule with an employee override.
///
/// The employee's working days, hours and breaks replace the business ones
/// entirely when the employee has a working week of its own. Disabled dates
/// are always the union of both.
pub fn effective_schedule(
    business: Option<&ScheduleSpec>,
    employee: Option<&ScheduleSpec>,
) -> ScheduleSpec {
    let own = employee.filter(|e| e.has_own_schedule());
    let mut effective = own.or(business).cloned().unwrap_or_default();

    for source in [business, employee].into_iter().flatten() {
        effective
            .disabled_dates
            .extend(source.disabled_dates.iter().copied());
    }
    effective
}

// =============================================================================
// Day Hours & Slots
// =============================================================================

/// Resolved hours for one date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayHours {
    Closed,
    Open {
        opens_at: TimeOfDay,
        closes_at: TimeOfDay,
    },
}

impl DayHours {
    /// Slot grid for the day (empty when closed).
    pub fn slots(&self) -> Slots {
        match *self {
            DayHours::Closed => Slots::empty(),
            DayHours::Open {
                opens_at,
                closes_at,
            } => slots(opens_at, closes_at),
        }
    }
}

/// 30-minute slots from `opens_at` while `slot < closes_at`.
///
/// Empty when `opens_at >= closes_at`.
pub fn slots(opens_at: TimeOfDay, closes_at: TimeOfDay) -> Slots {
    Slots {
        next: opens_at.minutes(),
        end: closes_at.minutes(),
    }
}

/// Lazy, finite slot sequence. Clone it to iterate again.
#[derive(Debug, Clone)]
pub struct Slots {
    next: u16,
    end: u16,
}

impl Slots {
    fn empty() -> Self {
        Slots { next: 0, end: 0 }
    }
}

impl Iterator for Slots {
    type Item = TimeOfDay;

    fn next(&mut self) -> Option<TimeOfDay> {
        if self.next >= self.end {
            return None;
        }
        let current = TimeOfDay(self.next);
        self.next = self.next.saturating_add(SLOT_MINUTES);
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = if self.next >= self.end {
            0
        } else {
            usize::from(self.end - self.next).div_ceil(usize::from(SLOT_MINUTES))
        };
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Slots {}
impl FusedIterator for Slots {}

// =============================================================================
// Unit Tests
// =============================================================================
