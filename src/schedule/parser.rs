use crate::schedule::{Audience, Meeting};
use crate::sheets::RawRow;
use chrono::{DateTime, Datelike, Duration, NaiveTime, Timelike, Utc};
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

/// Fewest cells that still give the day/time, description, link, password and open marker
/// distinct positions.
pub const MIN_CELLS: usize = 5;

/// Full, three-letter and two-letter weekday names, Sunday first.
const WEEKDAYS: [(&str, &str, &str); 7] = [
    ("sunday", "sun", "su"),
    ("monday", "mon", "mo"),
    ("tuesday", "tue", "tu"),
    ("wednesday", "wed", "we"),
    ("thursday", "thu", "th"),
    ("friday", "fri", "fr"),
    ("saturday", "sat", "sa"),
];

#[derive(Error, Debug, PartialEq)]
pub enum RowError {
    #[error("Row has {0} cells, at least {min} are needed", min = MIN_CELLS)]
    MissingCells(usize),

    #[error("No day and time in '{0}'")]
    UnrecognizedTime(String),

    #[error("Time '{0}' is out of range")]
    OutOfRange(String),
}

fn time_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"([A-Za-z0-9_]+) ([0-9]+):([0-9]+) ([A-Za-z0-9_]+)").expect("Hardcode regex pattern"))
}

/// Parses one sheet row into a meeting resolved against `now`.
pub fn parse_row(row: &RawRow, now: DateTime<Utc>) -> Result<Meeting, RowError> {
    if row.len() < MIN_CELLS {
        return Err(RowError::MissingCells(row.len()));
    }
    let cell = |offset: usize| row.tail(offset).unwrap_or_default();
    let when = row.head(0).unwrap_or_default();
    let description = row.head(1).unwrap_or_default().to_lowercase();
    let open_column = cell(1).to_lowercase();

    let audience = detect_audience(&open_column, &description);
    let is_open = open_column.contains("yes") && audience.is_none();
    let password = cell(2).to_owned();
    let url = cell(3).trim().to_owned();

    let captures = time_pattern()
        .captures(when)
        .ok_or_else(|| RowError::UnrecognizedTime(when.to_owned()))?;
    let day_of_week = captures[1].to_owned();
    let meridiem = captures[4].to_owned();
    let out_of_range = || RowError::OutOfRange(when.to_owned());
    let hour: u32 = captures[2].parse().map_err(|_| out_of_range())?;
    let minute: u32 = captures[3].parse().map_err(|_| out_of_range())?;

    let hour_to_set = to_24_hour(hour, &meridiem).ok_or_else(out_of_range)?;
    let datetime = resolve_in_week(now, &day_of_week, hour_to_set, minute).ok_or_else(out_of_range)?;
    let minutes_until_meeting = (datetime - now).num_minutes();
    let minutes_since_meeting = (now - datetime).num_minutes();

    Ok(Meeting {
        audience,
        url,
        password,
        is_open,
        hour_to_set,
        datetime,
        day_of_week,
        hour,
        minute,
        meridiem,
        minutes_until_meeting,
        minutes_since_meeting,
    })
}

/// Substring test on both lower-cased texts, "men" before "women". Anything that mentions
/// "women" also contains "men", so it is reported as [`Audience::Men`].
pub fn detect_audience(open_column: &str, description: &str) -> Option<Audience> {
    let mentions = |needle: &str| open_column.contains(needle) || description.contains(needle);
    if mentions("men") {
        Some(Audience::Men)
    } else if mentions("women") {
        Some(Audience::Women)
    } else {
        None
    }
}

/// "PM" adds twelve, including to 12 which becomes 24 and rolls into the next day.
/// Any other marker maps 12 to 0 and keeps the rest.
pub fn to_24_hour(hour: u32, meridiem: &str) -> Option<u32> {
    if meridiem == "PM" {
        hour.checked_add(12)
    } else if hour == 12 {
        Some(0)
    } else {
        Some(hour)
    }
}

/// Day offset from Sunday named by `text`: a number, or a case-insensitive prefix match on a
/// full, three-letter or two-letter weekday name.
pub fn weekday_offset(text: &str) -> Option<i64> {
    if !text.is_empty() && text.bytes().all(|byte| byte.is_ascii_digit()) {
        return text.parse().ok();
    }
    let text = text.to_ascii_lowercase();
    WEEKDAYS
        .iter()
        .position(|(full, short, min)| {
            text.starts_with(full) || text.starts_with(short) || text.starts_with(min)
        })
        .map(|offset| offset as i64)
}

/// Moves `now` to the named weekday of its Sunday-based week, which may lie before `now`, and
/// sets hour and minute. Seconds and below are kept. An unknown day name counts as Sunday.
pub fn resolve_in_week(now: DateTime<Utc>, day: &str, hour: u32, minute: u32) -> Option<DateTime<Utc>> {
    let today = now.date_naive();
    let offset = weekday_offset(day).unwrap_or(0);
    let current = i64::from(today.weekday().num_days_from_sunday());
    let date = today.checked_add_signed(Duration::try_days(offset - current)?)?;
    let naive = date
        .and_time(NaiveTime::MIN)
        .checked_add_signed(Duration::try_hours(i64::from(hour))?)?
        .checked_add_signed(Duration::try_minutes(i64::from(minute))?)?
        .checked_add_signed(Duration::try_seconds(i64::from(now.second()))?)?
        .checked_add_signed(Duration::nanoseconds(i64::from(now.timestamp_subsec_nanos())))?;
    Some(naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    /// Monday 19 October 2026, 14:25 UTC.
    fn monday_afternoon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 14, 25, 0).unwrap()
    }

    fn row(when: &str, description: &str, url: &str, open: &str) -> RawRow {
        RawRow::new([when, description, "", "", "", "", url, "pw1", open])
    }

    #[test]
    fn parse_upcoming_open_meeting() {
        let meeting = parse_row(
            &row("Monday 2:30 PM", "open zoom call", " https://zoom.us/j/123 ", "yes"),
            monday_afternoon(),
        )
        .unwrap();

        assert_eq!(meeting.audience, None);
        assert!(meeting.is_open);
        assert_eq!(meeting.url, "https://zoom.us/j/123");
        assert_eq!(meeting.password, "pw1");
        assert_eq!(meeting.day_of_week, "Monday");
        assert_eq!((meeting.hour, meeting.minute, meeting.hour_to_set), (2, 30, 14));
        assert_eq!(meeting.meridiem, "PM");
        assert_eq!(meeting.datetime, Utc.with_ymd_and_hms(2026, 10, 19, 14, 30, 0).unwrap());
        assert_eq!(meeting.minutes_until_meeting, 5);
        assert_eq!(meeting.minutes_since_meeting, -5);
    }

    #[test]
    fn parse_rejects_unmatched_time() {
        let error = parse_row(&row("Mondays at noon", "open", "https://zoom.us/j/1", "yes"), monday_afternoon())
            .unwrap_err();

        assert_eq!(error, RowError::UnrecognizedTime("Mondays at noon".to_owned()));
    }

    #[test]
    fn parse_rejects_short_row() {
        let short = RawRow::new(["Monday 2:30 PM", "open", "https://zoom.us/j/1", "yes"]);

        assert_eq!(parse_row(&short, monday_afternoon()).unwrap_err(), RowError::MissingCells(4));
    }

    #[test]
    fn parse_finds_time_inside_text() {
        let meeting = parse_row(
            &row("Every Tuesday 7:05 AM (EST)", "open", "https://zoom.us/j/1", "yes"),
            monday_afternoon(),
        )
        .unwrap();

        assert_eq!(meeting.day_of_week, "Tuesday");
        assert_eq!(meeting.datetime, Utc.with_ymd_and_hms(2026, 10, 20, 7, 5, 0).unwrap());
    }

    #[test]
    fn audience_women_text_reads_as_men() {
        // Current behavior: "women" contains "men", which is checked first.
        let meeting = parse_row(
            &row("Monday 2:30 PM", "Women only", "https://zoom.us/j/1", "yes"),
            monday_afternoon(),
        )
        .unwrap();

        assert_eq!(meeting.audience, Some(Audience::Men));
        assert!(!meeting.is_open);
        assert_eq!(detect_audience("women", ""), Some(Audience::Men));
        assert_eq!(detect_audience("", "amen corner"), Some(Audience::Men));
        assert_eq!(detect_audience("yes", "big book study"), None);
    }

    #[test]
    fn open_requires_yes_marker() {
        let meeting = parse_row(&row("Monday 2:30 PM", "open", "https://zoom.us/j/1", "No"), monday_afternoon())
            .unwrap();

        assert!(!meeting.is_open);
        assert_eq!(meeting.audience, None);
    }

    #[test]
    fn noon_overflows_to_hour_24() {
        // Current behavior: 12 PM becomes 24, i.e. midnight at the start of the next day.
        assert_eq!(to_24_hour(12, "PM"), Some(24));
        let meeting = parse_row(&row("Monday 12:00 PM", "open", "https://zoom.us/j/1", "yes"), monday_afternoon())
            .unwrap();

        assert_eq!(meeting.hour_to_set, 24);
        assert_eq!(meeting.datetime, Utc.with_ymd_and_hms(2026, 10, 20, 0, 0, 0).unwrap());
    }

    #[test]
    fn twelve_hour_conversion() {
        assert_eq!(to_24_hour(12, "AM"), Some(0));
        assert_eq!(to_24_hour(9, "AM"), Some(9));
        assert_eq!(to_24_hour(1, "PM"), Some(13));
        assert_eq!(to_24_hour(7, "pm"), Some(7));
        assert_eq!(to_24_hour(12, "pm"), Some(0));
    }

    #[test]
    fn weekday_names_and_numbers() {
        assert_eq!(weekday_offset("Sunday"), Some(0));
        assert_eq!(weekday_offset("MON"), Some(1));
        assert_eq!(weekday_offset("Thurs"), Some(4));
        assert_eq!(weekday_offset("Sa"), Some(6));
        assert_eq!(weekday_offset("Saturdays"), Some(6));
        assert_eq!(weekday_offset("3"), Some(3));
        assert_eq!(weekday_offset("Daily"), None);
        assert_eq!(weekday_offset("T"), None);
    }

    #[test]
    fn resolve_stays_in_current_week() {
        let now = monday_afternoon();

        // Sunday lies before Monday in a Sunday-based week.
        assert_eq!(
            resolve_in_week(now, "Sunday", 9, 0),
            Some(Utc.with_ymd_and_hms(2026, 10, 18, 9, 0, 0).unwrap())
        );
        assert_eq!(
            resolve_in_week(now, "Saturday", 20, 15),
            Some(Utc.with_ymd_and_hms(2026, 10, 24, 20, 15, 0).unwrap())
        );
        // Unknown day names fall on Sunday.
        assert_eq!(
            resolve_in_week(now, "Daily", 18, 0),
            Some(Utc.with_ymd_and_hms(2026, 10, 18, 18, 0, 0).unwrap())
        );
    }

    #[test]
    fn unknown_day_is_not_today() {
        let meeting = parse_row(&row("Daily 2:30 PM", "open", "https://zoom.us/j/1", "yes"), monday_afternoon())
            .unwrap();

        assert_eq!(meeting.datetime, Utc.with_ymd_and_hms(2026, 10, 18, 14, 30, 0).unwrap());
        assert_eq!(meeting.minutes_since_meeting, 1435);
        assert_eq!(meeting.minutes_until_meeting, -1435);
    }

    #[test]
    fn short_row_message_names_the_minimum() {
        assert_eq!(RowError::MissingCells(3).to_string(), "Row has 3 cells, at least 5 are needed");
    }

    #[test]
    fn resolve_keeps_seconds_and_rolls_minutes() {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 14, 25, 42).unwrap();

        assert_eq!(
            resolve_in_week(now, "Monday", 14, 75),
            Some(Utc.with_ymd_and_hms(2026, 10, 19, 15, 15, 42).unwrap())
        );
    }

    #[test]
    fn offsets_truncate_toward_zero() {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 14, 25, 0).unwrap();
        let meeting = parse_row(&row("Monday 1:00 PM", "open", "https://zoom.us/j/1", "yes"), now).unwrap();

        assert_eq!(meeting.minutes_since_meeting, 85);
        assert_eq!(meeting.minutes_until_meeting, -85);
    }

    #[test]
    fn huge_hour_is_out_of_range() {
        let error = parse_row(
            &row("Monday 99999999999:00 AM", "open", "https://zoom.us/j/1", "yes"),
            monday_afternoon(),
        )
        .unwrap_err();

        assert!(matches!(error, RowError::OutOfRange(_)));
    }
}
