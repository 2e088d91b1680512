//! # Spreadsheet Access Module
//!
//! Reads the raw cell text of a named range from the Google Sheets values API.
//! Rows are handed over untouched; turning them into meetings is the job of
//! [`crate::schedule`].
use crate::auth::AuthorizedClient;
use crate::error::Result;
use crate::sheets::range::Range;
use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

pub mod range;

/// Errors raised while talking to the spreadsheet API.
#[derive(Error, Debug)]
pub enum SheetsError {
    #[error("Spreadsheet request failed with status {status}: {message}")]
    RequestFailed { status: u16, message: String },

    #[error("Base url '{0}' cannot carry path segments")]
    InvalidBaseUrl(String),
}

/// One row of cell text. The API omits trailing empty cells; [`SheetsClient`] pads them back
/// to the range width, other sources may hand over rows of any length.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawRow {
    pub cells: Vec<String>,
}

impl RawRow {
    pub fn new<I, S>(cells: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        RawRow {
            cells: cells.into_iter().map(Into::into).collect(),
        }
    }

    /// Cell at a fixed offset from the start.
    pub fn head(&self, index: usize) -> Option<&str> {
        self.cells.get(index).map(String::as_str)
    }

    /// Cell at a fixed offset from the end, `tail(1)` being the last cell.
    pub fn tail(&self, offset: usize) -> Option<&str> {
        let index = self.cells.len().checked_sub(offset)?;
        self.head(index)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Anything that can hand over the rows of the meeting sheet.
#[async_trait]
pub trait RowSource {
    async fn fetch_rows(&self) -> Result<Vec<RawRow>>;
}

/// Response body of `spreadsheets.values.get`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueRange {
    pub range: String,
    #[serde(default)]
    pub major_dimension: Option<String>,
    /// Absent when the range holds no data.
    #[serde(default)]
    pub values: Vec<Vec<String>>,
}

/// Client for a single spreadsheet range, holding the authorized handle it was built with.
pub struct SheetsClient {
    auth: AuthorizedClient,
    base_url: Url,
    spreadsheet_id: String,
    range: Range,
}

impl SheetsClient {
    pub fn new(auth: AuthorizedClient, base_url: &str, spreadsheet_id: &str, range: Range) -> Result<Self> {
        Ok(SheetsClient {
            auth,
            base_url: Url::parse(base_url)?,
            spreadsheet_id: spreadsheet_id.to_owned(),
            range,
        })
    }

    /// Builds `{base}/v4/spreadsheets/{id}/values/{range}` with each part encoded as a path segment.
    pub fn request_url(&self) -> Result<Url> {
        values_url(&self.base_url, &self.spreadsheet_id, &self.range)
    }

    pub async fn get_values(&self) -> Result<ValueRange> {
        let url = self.request_url()?;
        let response = self
            .auth
            .http()
            .get(url)
            .bearer_auth(self.auth.access_token())
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SheetsError::RequestFailed {
                status: status.as_u16(),
                message,
            }
            .into());
        }
        Ok(response.json::<ValueRange>().await?)
    }
}

pub(crate) fn values_url(base_url: &Url, spreadsheet_id: &str, range: &Range) -> Result<Url> {
    let mut url = base_url.clone();
    let range = range.to_string();
    url.path_segments_mut()
        .map_err(|_| SheetsError::InvalidBaseUrl(base_url.to_string()))?
        .pop_if_empty()
        .extend(["v4", "spreadsheets", spreadsheet_id, "values", range.as_str()]);
    Ok(url)
}

#[async_trait]
impl RowSource for SheetsClient {
    async fn fetch_rows(&self) -> Result<Vec<RawRow>> {
        let values = self.get_values().await?;
        info!(range = %values.range, rows = values.values.len(), "Fetched meeting sheet");

        let width = self.range.width();
        Ok(values
            .values
            .into_iter()
            .map(|mut cells| {
                match width {
                    Some(width) if cells.len() > width => {
                        warn!(cells = cells.len(), width, "Row is wider than the requested range");
                    }
                    Some(width) => cells.resize(width, String::new()),
                    None => {}
                }
                RawRow { cells }
            })
            .collect())
    }
}
