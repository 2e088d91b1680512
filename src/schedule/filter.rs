use crate::config::Selection;
use crate::schedule::{Audience, Meeting};
use url::Url;

/// All predicates at once; a meeting must pass each of them.
pub fn is_eligible(meeting: &Meeting, only_gender: Option<Audience>, selection: &Selection) -> bool {
    matches_audience(meeting, only_gender) && has_zoom_link(&meeting.url) && in_window(meeting, selection)
}

/// With a requested audience, meetings for that audience or for everyone pass.
/// Without one, only open meetings pass.
pub fn matches_audience(meeting: &Meeting, only_gender: Option<Audience>) -> bool {
    match only_gender {
        Some(audience) => meeting.audience.is_none() || meeting.audience == Some(audience),
        None => meeting.is_open,
    }
}

/// Absolute http(s) url with a host whose text contains "zoom".
pub fn has_zoom_link(url: &str) -> bool {
    let valid = Url::parse(url)
        .map(|parsed| matches!(parsed.scheme(), "http" | "https") && parsed.has_host())
        .unwrap_or(false);
    valid && url.contains("zoom")
}

/// Started less than the started window ago, or starting in less than the upcoming window.
/// Both bounds are exclusive, so a meeting starting exactly now is out.
pub fn in_window(meeting: &Meeting, selection: &Selection) -> bool {
    let since = meeting.minutes_since_meeting;
    let until = meeting.minutes_until_meeting;
    (since > 0 && since < selection.started_window_minutes)
        || (until > 0 && until < selection.upcoming_window_minutes)
}
