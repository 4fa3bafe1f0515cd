//! # Conflict Filter
//!
//! Removes already-booked and break slots from a day's slot grid.
//!
//! ```text
//! slots:   09:00 09:30 10:00 10:30 11:00 11:30
//! booked:                          11:00
//! break:              [10:00,10:30)
//! ─────────────────────────────────────────────
//! result:  09:00 09:30       10:30       11:30
//! ```
//!
//! Booked instants are compared as local time-of-day in the business
//! timezone. A filtered slot is simply omitted.

use chrono::{DateTime, NaiveDate, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use std::collections::BTreeSet;

use crate::schedule::{BreakInterval, ScheduleSpec, TimeOfDay, Weekday};

/// Keeps slots that are neither booked nor inside a break.
pub fn filter_conflicts<I>(
    slots: I,
    booked: &BTreeSet<TimeOfDay>,
    breaks: &[BreakInterval],
) -> Vec<TimeOfDay>
where
    I: IntoIterator<Item = TimeOfDay>,
{
    slots
        .into_iter()
        .filter(|t| !booked.contains(t))
        .filter(|t| !breaks.iter().any(|b| b.contains(*t)))
        .collect()
}

/// Available slots for a date under an already-resolved schedule.
pub fn available_slots(
    schedule: &ScheduleSpec,
    date: NaiveDate,
    booked: &BTreeSet<TimeOfDay>,
) -> Vec<TimeOfDay> {
    let hours = schedule.hours_on(date);
    filter_conflicts(hours.slots(), booked, schedule.breaks_on(Weekday::of(date)))
}

/// Local times of day of the bookings that fall on `date` in `tz`.
pub fn booked_times<'a, I>(instants: I, date: NaiveDate, tz: Tz) -> BTreeSet<TimeOfDay>
where
    I: IntoIterator<Item = &'a DateTime<Utc>>,
{
    instants
        .into_iter()
        .map(|instant| instant.with_timezone(&tz))
        .filter(|local| local.date_naive() == date)
        .map(|local| TimeOfDay::hm(local.hour() as u16, local.minute() as u16))
        .collect()
}

/// UTC bounds `[start, end)` of a local calendar day in `tz`.
pub fn local_day_bounds(date: NaiveDate, tz: Tz) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = local_midnight(date, tz);
    let end = date
        .succ_opt()
        .map(|next| local_midnight(next, tz))
        .unwrap_or_else(|| start + chrono::Duration::days(1));
    (start, end)
}

fn local_midnight(date: NaiveDate, tz: Tz) -> DateTime<Utc> {
    let naive = date.and_time(chrono::NaiveTime::MIN);
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&naive))
}

// =============================================================================
// Unit Tests
// =============================================================================
