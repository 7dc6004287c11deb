use crate::errors::AppError;
use chrono::{Datelike, Duration, NaiveDate};
use std::collections::{HashMap, HashSet};

/// Supplies public-holiday dates per civil year.
pub trait HolidayCalendar: Send + Sync {
    fn holidays_for_year(&self, year: i32) -> Result<HashSet<NaiveDate>, AppError>;
}

/// Norwegian public holidays: fixed dates plus the Easter-relative ones.
#[derive(Debug, Clone, Copy, Default)]
pub struct NorwegianHolidayCalendar;

/// Easter Sunday in the Gregorian calendar (anonymous Gregorian algorithm).
pub fn easter_sunday(year: i32) -> Option<NaiveDate> {
    let a = year % 19;
    let b = year / 100;
    let c = year % 100;
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15) % 30;
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k) % 7;
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = (h + l - 7 * m + 114) % 31 + 1;
    NaiveDate::from_ymd_opt(year, month as u32, day as u32)
}

impl HolidayCalendar for NorwegianHolidayCalendar {
    fn holidays_for_year(&self, year: i32) -> Result<HashSet<NaiveDate>, AppError> {
        let easter = easter_sunday(year)
            .ok_or_else(|| AppError::Calendar(format!("no Easter date for year {}", year)))?;

        let fixed = [(1, 1), (5, 1), (5, 17), (12, 25), (12, 26)]
            .into_iter()
            .map(|(month, day)| {
                NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
                    AppError::Calendar(format!("invalid date {}-{}-{}", year, month, day))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        // Maundy Thursday, Good Friday, Easter Sunday and Monday, Ascension, Whitsun
        let movable = [-3, -2, 0, 1, 39, 49, 50]
            .into_iter()
            .map(|offset| easter + Duration::days(offset));

        Ok(fixed.into_iter().chain(movable).collect())
    }
}

/// Holidays given explicitly, keyed by year. Years without an entry have none.
#[derive(Debug, Clone, Default)]
pub struct FixedHolidayCalendar {
    by_year: HashMap<i32, HashSet<NaiveDate>>,
}

impl FixedHolidayCalendar {
    pub fn new(dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        let mut by_year: HashMap<i32, HashSet<NaiveDate>> = HashMap::new();
        for date in dates {
            by_year.entry(date.year()).or_default().insert(date);
        }
        Self { by_year }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

impl HolidayCalendar for FixedHolidayCalendar {
    fn holidays_for_year(&self, year: i32) -> Result<HashSet<NaiveDate>, AppError> {
        Ok(self.by_year.get(&year).cloned().unwrap_or_default())
    }
}
