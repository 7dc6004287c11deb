//! Meter-reading-need estimation for supplier switches.
//!
//! A manually read meter needs a fresh reading when its last reading is older than
//! 20 working days before the take-over date, which lies 15 calendar days ahead.

use crate::errors::AppError;
use crate::holidays::HolidayCalendar;
use crate::models::ReadingType;
use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Weekday};
use chrono_tz::Tz;
use std::collections::{HashMap, HashSet};

pub const TAKE_OVER_OFFSET_DAYS: i64 = 15;
pub const REQUIRED_WORKING_DAYS: u32 = 20;

/// Civil date of `now` in the operator timezone.
pub fn civil_today<T: TimeZone>(now: DateTime<T>, timezone: Tz) -> NaiveDate {
    now.with_timezone(&timezone).date_naive()
}

/// The date 20 working days before the take-over date, not counting the take-over
/// date itself. Holiday sets are fetched once per year the walk crosses.
pub fn effective_cutoff(
    today: NaiveDate,
    calendar: &dyn HolidayCalendar,
) -> Result<NaiveDate, AppError> {
    let take_over = today + Duration::days(TAKE_OVER_OFFSET_DAYS);
    let mut holidays: HashMap<i32, HashSet<NaiveDate>> = HashMap::new();
    let mut day = take_over;
    let mut counted = 0;

    while counted < REQUIRED_WORKING_DAYS {
        day = day
            .pred_opt()
            .ok_or_else(|| AppError::Calendar("date underflow while counting".to_string()))?;

        if matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
            continue;
        }
        let year_holidays = match holidays.entry(day.year()) {
            std::collections::hash_map::Entry::Occupied(e) => e.into_mut(),
            std::collections::hash_map::Entry::Vacant(e) => {
                e.insert(calendar.holidays_for_year(day.year())?)
            }
        };
        if !year_holidays.contains(&day) {
            counted += 1;
        }
    }

    Ok(day)
}

/// Whether a physical meter reading is required before a supplier switch.
///
/// Only manually read meters with a known last reading can need one.
pub fn needs_reading(
    last_reading_date: Option<NaiveDate>,
    reading_type: ReadingType,
    today: NaiveDate,
    calendar: &dyn HolidayCalendar,
) -> Result<bool, AppError> {
    let last = match (reading_type, last_reading_date) {
        (ReadingType::Manual, Some(last)) => last,
        _ => return Ok(false),
    };

    let cutoff = effective_cutoff(today, calendar)?;
    tracing::debug!(
        "Reading-need cutoff {} vs last reading {} (today {})",
        cutoff,
        last,
        today
    );
    Ok(cutoff > last)
}
