use crate::config::Selection;
use crate::schedule::Meeting;

/// Sort key, smaller first: `-weight * until` for upcoming meetings, `-since` otherwise.
pub fn rank_key(meeting: &Meeting, selection: &Selection) -> i64 {
    if meeting.minutes_until_meeting > 0 {
        -selection.upcoming_weight * meeting.minutes_until_meeting
    } else {
        -meeting.minutes_since_meeting
    }
}

/// Stable sort by [`rank_key`], then keep the first `selection.limit` meetings.
pub fn rank(mut meetings: Vec<Meeting>, selection: &Selection) -> Vec<Meeting> {
    meetings.sort_by_key(|meeting| rank_key(meeting, selection));
    meetings.truncate(selection.limit);
    meetings
}
