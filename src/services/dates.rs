//! Timezone-safe date helpers.
//!
//! Backend dates are calendar dates (`YYYY-MM-DD`, sometimes with a trailing
//! time component). They are always handled as [`NaiveDate`]s built from their
//! year/month/day components, never by interpreting the string as an instant,
//! so the displayed day cannot shift with the local UTC offset.

use chrono::{Datelike, Local, NaiveDate, NaiveTime};

use crate::error::{AppError, AppResult};
use crate::i18n;

/// The portion of `value` before any time component (`2025-01-22T03:00Z` -> `2025-01-22`).
pub fn date_part(value: &str) -> &str {
    value.split('T').next().unwrap_or(value).trim()
}

/// Parse the date portion of `value` from its year/month/day components.
pub fn parse_local_date(value: &str) -> AppResult<NaiveDate> {
    let part = date_part(value);
    let mut pieces = part.splitn(3, '-');

    let (Some(y), Some(m), Some(d)) = (pieces.next(), pieces.next(), pieces.next()) else {
        return Err(AppError::InvalidDate(value.to_string()));
    };

    let year: i32 = y.parse().map_err(|_| AppError::InvalidDate(value.to_string()))?;
    let month: u32 = m.parse().map_err(|_| AppError::InvalidDate(value.to_string()))?;
    let day: u32 = d.parse().map_err(|_| AppError::InvalidDate(value.to_string()))?;

    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| AppError::InvalidDate(value.to_string()))
}

/// Parse a time-of-day in `HH:MM` (or `HH:MM:SS`) form.
pub fn parse_time(value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .ok()
}

pub fn to_iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Today's calendar date in the local timezone.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Whole days from `reference` to `date`; positive means `date` is in the future.
pub fn days_between(date: NaiveDate, reference: NaiveDate) -> i64 {
    (date - reference).num_days()
}

/// Days from `today` until the date in `value` (negative once it has passed).
pub fn days_until(value: &str, today: NaiveDate) -> AppResult<i64> {
    Ok(days_between(parse_local_date(value)?, today))
}

/// Days elapsed since the date in `value` (negative while it is still ahead).
pub fn days_since(value: &str, today: NaiveDate) -> AppResult<i64> {
    Ok(days_between(today, parse_local_date(value)?))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateStyle {
    /// `22 ene 2025`
    #[default]
    Short,
    /// `22 de enero de 2025`
    Long,
    /// `miércoles, 22 de enero de 2025`
    Full,
    /// `mié`
    WeekdayShort,
}

pub fn format_date(value: &str, style: DateStyle) -> AppResult<String> {
    Ok(format_naive(parse_local_date(value)?, style))
}

pub fn format_naive(date: NaiveDate, style: DateStyle) -> String {
    let weekday = date.weekday().num_days_from_sunday();
    match style {
        DateStyle::Short => format!(
            "{:02} {} {}",
            date.day(),
            i18n::t(&format!("month_short.{}", date.month())),
            date.year()
        ),
        DateStyle::Long => i18n::t_with(
            "date.long",
            &[
                ("day", &date.day().to_string()),
                ("month", &month_name(date.month())),
                ("year", &date.year().to_string()),
            ],
        ),
        DateStyle::Full => i18n::t_with(
            "date.full",
            &[
                ("weekday", &i18n::t(&format!("weekday.{}", weekday))),
                ("day", &date.day().to_string()),
                ("month", &month_name(date.month())),
                ("year", &date.year().to_string()),
            ],
        ),
        DateStyle::WeekdayShort => i18n::t(&format!("weekday_short.{}", weekday)),
    }
}

/// "Hoy", "Mañana", "Ayer", "En N días", "Hace N días".
pub fn relative_day_label(days_until: i64) -> String {
    match days_until {
        0 => i18n::t("relative.today"),
        1 => i18n::t("relative.tomorrow"),
        -1 => i18n::t("relative.yesterday"),
        n if n > 1 => i18n::t_with("relative.in_days", &[("days", &n.to_string())]),
        n => i18n::t_with("relative.days_ago", &[("days", &n.abs().to_string())]),
    }
}

/// Number of days in `month` (1-12), or `None` for an invalid month.
pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let (next_year, next_month) = next_month(year, month);
    let next_first = NaiveDate::from_ymd_opt(next_year, next_month, 1)?;
    Some((next_first - first).num_days() as u32)
}

/// Weekday of the 1st of the month, 0 = Sunday.
pub fn first_weekday_of_month(year: i32, month: u32) -> Option<u32> {
    NaiveDate::from_ymd_opt(year, month, 1).map(|d| d.weekday().num_days_from_sunday())
}

pub fn previous_month(year: i32, month: u32) -> (i32, u32) {
    if month <= 1 {
        (year - 1, 12)
    } else {
        (year, month - 1)
    }
}

pub fn next_month(year: i32, month: u32) -> (i32, u32) {
    if month >= 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}

pub fn month_name(month: u32) -> String {
    i18n::t(&format!("month.{}", month))
}
