//! # Meeting Sheet
//!
//! Answers "which meetings are starting or in progress right now" from a shared spreadsheet
//! of recurring video-conference meetings.
//!
//! ## Pipeline
//!
//! - **Row parsing**: the loosely written day and time ("Monday 7:30 PM"), audience hints in
//!   free text, join link, password and open marker become a [`Meeting`]
//! - **Eligibility**: audience, zoom link and time-window predicates
//! - **Ranking**: weighted ordering, at most four results by default
//!
//! ## Collaborators
//!
//! - [`auth`]: OAuth 2.0 installed-app flow with `credentials.json` and `token.json`
//! - [`sheets`]: Google Sheets values client behind the [`RowSource`] trait
//! - [`cache`]: optional time-boxed reuse of fetched rows
//!
//! ```ignore
//! let settings = Settings::load(None)?;
//! let sheet = MeetingSheet::connect(&settings, &StdinPrompt).await?;
//! let meetings = sheet.get_meetings(Audience::parse_filter("women")?).await?;
//! println!("{}", serde_json::to_string_pretty(&meetings)?);
//! ```
pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod schedule;
pub mod sheets;

#[cfg(test)]
mod test_server;

pub use crate::auth::{authorize, AuthorizedClient, CodePrompt, StdinPrompt};
pub use crate::config::{Selection, Settings};
pub use crate::error::{MeetingSheetError, Result};
pub use crate::schedule::{select_meetings, Audience, Meeting};
pub use crate::sheets::{RawRow, RowSource, SheetsClient};

use crate::cache::CachedSource;
use chrono::{DateTime, Utc};
use tracing::info;

/// Fetches the rows and returns the meetings happening now.
///
/// `only_gender` of `None` keeps open meetings only; `Some(audience)` keeps meetings for that
/// audience and unrestricted ones.
///
/// # Errors
///
/// Fetch and authorization failures are returned as they are. Rows that cannot be parsed
/// are skipped, not reported.
pub async fn get_meetings<S>(source: &S, only_gender: Option<Audience>, selection: &Selection) -> Result<Vec<Meeting>>
where
    S: RowSource + ?Sized,
{
    get_meetings_at(source, only_gender, selection, Utc::now()).await
}

/// [`get_meetings`] evaluated at a fixed instant.
pub async fn get_meetings_at<S>(
    source: &S,
    only_gender: Option<Audience>,
    selection: &Selection,
    now: DateTime<Utc>,
) -> Result<Vec<Meeting>>
where
    S: RowSource + ?Sized,
{
    let rows = source.fetch_rows().await?;
    let meetings = select_meetings(&rows, only_gender, now, selection);
    info!(
        rows = rows.len(),
        meetings = meetings.len(),
        only_gender = only_gender.map(|audience| audience.as_str()).unwrap_or(""),
        "Selected meetings"
    );
    Ok(meetings)
}

/// Authorized sheet client plus the selection settings it was configured with.
pub struct MeetingSheet {
    source: Box<dyn RowSource + Send + Sync>,
    selection: Selection,
}

impl MeetingSheet {
    /// Authorizes with the configured credential and token files and builds the client,
    /// wrapped in a row cache when a cache TTL is configured.
    pub async fn connect(settings: &Settings, prompt: &dyn CodePrompt) -> Result<MeetingSheet> {
        let auth = authorize(&settings.credentials_path, &settings.token_path, prompt).await?;
        let client = SheetsClient::new(
            auth,
            &settings.sheets_base_url,
            &settings.spreadsheet_id,
            settings.parsed_range()?,
        )?;
        let source: Box<dyn RowSource + Send + Sync> = match settings.cache_ttl() {
            Some(ttl) => Box::new(CachedSource::new(client, ttl)),
            None => Box::new(client),
        };
        Ok(MeetingSheet::from_source(source, settings.selection.clone()))
    }

    pub fn from_source(source: Box<dyn RowSource + Send + Sync>, selection: Selection) -> MeetingSheet {
        MeetingSheet { source, selection }
    }

    pub async fn get_meetings(&self, only_gender: Option<Audience>) -> Result<Vec<Meeting>> {
        get_meetings(self.source.as_ref(), only_gender, &self.selection).await
    }
}
