use crate::error::{MeetingSheetError, Result, ResultMessage};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Tokens closer than this to their expiry are treated as expired.
const EXPIRY_MARGIN_SECONDS: i64 = 60;

/// Access and refresh token pair as stored in `token.json`.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Token {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Expiry as milliseconds since the Unix epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<i64>,
}

fn default_token_type() -> String {
    "Bearer".to_owned()
}

/// Body of a successful answer from the token endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub(crate) access_token: String,
    #[serde(default)]
    pub(crate) refresh_token: Option<String>,
    #[serde(default)]
    pub(crate) scope: Option<String>,
    #[serde(default)]
    pub(crate) token_type: Option<String>,
    #[serde(default)]
    pub(crate) expires_in: Option<i64>,
}

impl TokenResponse {
    /// Converts the relative lifetime into an absolute expiry. A refresh answer carries no
    /// refresh token, so the previous one is kept.
    pub(crate) fn into_token(self, now: DateTime<Utc>, previous_refresh_token: Option<String>) -> Token {
        Token {
            access_token: self.access_token,
            refresh_token: self.refresh_token.or(previous_refresh_token),
            scope: self.scope,
            token_type: self.token_type.unwrap_or_else(default_token_type),
            expiry_date: self
                .expires_in
                .map(|seconds| (now + Duration::seconds(seconds)).timestamp_millis()),
        }
    }
}

impl Token {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiry_date
            .map(|expiry| expiry - EXPIRY_MARGIN_SECONDS * 1000 <= now.timestamp_millis())
            .unwrap_or(false)
    }

    /// Reads a stored token; a missing file yields None.
    pub fn load(path: &Path) -> Result<Option<Token>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path)
            .map_err(MeetingSheetError::from)
            .with_prefix(&format!("Read token file '{}' failed", path.display()))?;
        let token: Token = serde_json::from_str(&content)
            .map_err(MeetingSheetError::from)
            .with_prefix(&format!("Parse token file '{}' failed", path.display()))?;
        Ok(Some(token))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string(self)?;
        fs::write(path, content)
            .map_err(MeetingSheetError::from)
            .with_prefix(&format!("Write token file '{}' failed", path.display()))
    }
}
