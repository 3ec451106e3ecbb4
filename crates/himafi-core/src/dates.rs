//! Date display and deadline helpers

use chrono::{DateTime, Datelike, Months, NaiveDate, NaiveTime, Utc};

pub const DISPLAY_DATE_FORMAT: &str = "%B %-d, %Y";
pub const DISPLAY_TIME_FORMAT: &str = "%-I:%M %p";
pub const DISPLAY_DATETIME_FORMAT: &str = "%B %-d, %Y at %-I:%M %p";
pub const DISPLAY_DEADLINE_FORMAT: &str = "%b %-d, %Y";

pub fn format_date(date: NaiveDate) -> String {
    date.format(DISPLAY_DATE_FORMAT).to_string()
}

pub fn format_time(time: NaiveTime) -> String {
    time.format(DISPLAY_TIME_FORMAT).to_string()
}

pub fn format_datetime(datetime: DateTime<Utc>) -> String {
    datetime.format(DISPLAY_DATETIME_FORMAT).to_string()
}

pub fn format_deadline(date: NaiveDate) -> String {
    date.format(DISPLAY_DEADLINE_FORMAT).to_string()
}

/// Coarse "time ago" wording. Months are 30 days and years 12 months,
/// matching the site's display conventions rather than the calendar.
pub fn relative_time(from: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - from).num_seconds().max(0);
    let minutes = seconds / 60;
    let hours = minutes / 60;
    let days = hours / 24;
    let months = days / 30;
    let years = months / 12;

    if years > 0 {
        plural(years, "year")
    } else if months > 0 {
        plural(months, "month")
    } else if days > 0 {
        plural(days, "day")
    } else if hours > 0 {
        plural(hours, "hour")
    } else if minutes > 0 {
        plural(minutes, "minute")
    } else {
        "just now".to_string()
    }
}

fn plural(count: i64, unit: &str) -> String {
    if count == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{count} {unit}s ago")
    }
}

pub fn add_days(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    date.checked_add_signed(chrono::Duration::days(days))
}

pub fn add_months(date: NaiveDate, months: u32) -> Option<NaiveDate> {
    date.checked_add_months(Months::new(months))
}

pub fn add_years(date: NaiveDate, years: u32) -> Option<NaiveDate> {
    date.checked_add_months(Months::new(years * 12))
}

pub fn is_same_day(a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
    a.date_naive() == b.date_naive()
}

pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = first.checked_add_months(Months::new(1))?;
    Some(next.pred_opt()?.day())
}

/// ISO 8601 week number.
pub fn week_number(date: NaiveDate) -> u32 {
    date.iso_week().week()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadlineStatus {
    Passed,
    Approaching,
    Open,
}

pub const DEADLINE_WARNING_DAYS: i64 = 7;

pub fn is_deadline_passed(deadline: NaiveDate, today: NaiveDate) -> bool {
    deadline < today
}

pub fn is_deadline_approaching(deadline: NaiveDate, today: NaiveDate, warning_days: i64) -> bool {
    let days_left = (deadline - today).num_days();
    (0..=warning_days).contains(&days_left)
}

pub fn deadline_status(deadline: NaiveDate, today: NaiveDate, warning_days: i64) -> DeadlineStatus {
    if is_deadline_passed(deadline, today) {
        DeadlineStatus::Passed
    } else if is_deadline_approaching(deadline, today, warning_days) {
        DeadlineStatus::Approaching
    } else {
        DeadlineStatus::Open
    }
}
