//! # Schedule Module
//!
//! Turns raw sheet rows into the meetings that are starting or in progress at a given
//! instant. Three stages run strictly in order:
//!
//! 1. [`parser`]: one row to one [`Meeting`], or a [`RowError`] that drops the row
//! 2. [`filter`]: audience, join-link and time-window predicates
//! 3. [`ranker`]: weighted ordering and truncation
use crate::config::Selection;
use crate::sheets::RawRow;
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

pub mod filter;
pub mod parser;
pub mod ranker;

pub use parser::{parse_row, RowError};

#[derive(Error, Debug)]
#[error("Unknown audience '{0}', expected 'men', 'women' or nothing")]
pub struct AudienceError(String);

/// Audience a meeting is restricted to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Audience {
    Men,
    Women,
}

impl Audience {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Audience::Men => "men",
            Audience::Women => "women",
        }
    }

    /// Parses a caller-supplied restriction where the empty string means "open meetings only".
    pub fn parse_filter(value: &str) -> Result<Option<Audience>, AudienceError> {
        match value.trim() {
            "" => Ok(None),
            other => other.parse().map(Some),
        }
    }
}

impl FromStr for Audience {
    type Err = AudienceError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "men" => Ok(Audience::Men),
            "women" => Ok(Audience::Women),
            _ => Err(AudienceError(value.to_owned())),
        }
    }
}

impl Display for Audience {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A weekly meeting resolved against one instant.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Meeting {
    #[serde(rename = "genderSpecific", serialize_with = "serialize_audience")]
    pub audience: Option<Audience>,
    pub url: String,
    pub password: String,
    pub is_open: bool,
    pub hour_to_set: u32,
    pub datetime: DateTime<Utc>,
    pub day_of_week: String,
    pub hour: u32,
    pub minute: u32,
    pub meridiem: String,
    pub minutes_until_meeting: i64,
    pub minutes_since_meeting: i64,
}

fn serialize_audience<S: Serializer>(audience: &Option<Audience>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(audience.map(|audience| audience.as_str()).unwrap_or(""))
}

/// Runs the whole pipeline over already-fetched rows.
pub fn select_meetings(
    rows: &[RawRow],
    only_gender: Option<Audience>,
    now: DateTime<Utc>,
    selection: &Selection,
) -> Vec<Meeting> {
    let eligible = rows
        .iter()
        .enumerate()
        .filter_map(|(index, row)| match parse_row(row, now) {
            Ok(meeting) => Some(meeting),
            Err(error) => {
                debug!(row = index, %error, "Dropped row");
                None
            }
        })
        .filter(|meeting| filter::is_eligible(meeting, only_gender, selection))
        .collect();
    ranker::rank(eligible, selection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn audience_filter_values() {
        assert_eq!(Audience::parse_filter("").unwrap(), None);
        assert_eq!(Audience::parse_filter("men").unwrap(), Some(Audience::Men));
        assert_eq!(Audience::parse_filter(" Women ").unwrap(), Some(Audience::Women));
        assert!(Audience::parse_filter("everyone").is_err());
    }

    #[test]
    fn meeting_json_fields() {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 14, 25, 0).unwrap();
        let row = RawRow::new([
            "Monday 2:30 PM",
            "Open zoom call",
            "",
            "",
            "",
            "",
            "https://zoom.us/j/123",
            "pw1",
            "Yes",
        ]);
        let meeting = parse_row(&row, now).unwrap();
        let json = serde_json::to_value(&meeting).unwrap();

        assert_eq!(json["genderSpecific"], "");
        assert_eq!(json["url"], "https://zoom.us/j/123");
        assert_eq!(json["password"], "pw1");
        assert_eq!(json["isOpen"], true);
        assert_eq!(json["hourToSet"], 14);
        assert_eq!(json["datetime"], "2026-10-19T14:30:00Z");
        assert_eq!(json["dayOfWeek"], "Monday");
        assert_eq!(json["hour"], 2);
        assert_eq!(json["minute"], 30);
        assert_eq!(json["meridiem"], "PM");
        assert_eq!(json["minutesUntilMeeting"], 5);
        assert_eq!(json["minutesSinceMeeting"], -5);
    }

    #[test]
    fn restricted_audience_serializes_as_text() {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 14, 25, 0).unwrap();
        let row = RawRow::new(["Monday 2:30 PM", "Men's stag", "https://zoom.us/j/1", "", "no"]);
        let json = serde_json::to_value(parse_row(&row, now).unwrap()).unwrap();

        assert_eq!(json["genderSpecific"], "men");
        assert_eq!(json["isOpen"], false);
    }

    #[test]
    fn select_meetings_skips_unparseable_rows() {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 14, 25, 0).unwrap();
        let rows = vec![
            RawRow::new(["TBD", "open", "https://zoom.us/j/1", "", "yes"]),
            RawRow::new(["Monday 2:30 PM"]),
            RawRow::new(["Monday 2:30 PM", "open", "https://zoom.us/j/2", "", "yes"]),
        ];
        let meetings = select_meetings(&rows, None, now, &Selection::default());

        assert_eq!(meetings.len(), 1);
        assert_eq!(meetings[0].url, "https://zoom.us/j/2");
    }

    #[test]
    fn select_meetings_empty() {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 14, 25, 0).unwrap();

        assert!(select_meetings(&[], Some(Audience::Women), now, &Selection::default()).is_empty());
    }
}
