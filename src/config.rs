//! Runtime settings: built-in defaults, then an optional TOML file, then `MEETINGS_*`
//! environment variables (a `.env` file is honoured).
use crate::error::{MeetingSheetError, Result, ResultMessage};
use crate::sheets::range::Range;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Rows 3 to 1000 of the nine meeting columns.
pub const DEFAULT_RANGE: &str = "(unsorted)!D3:L1000";
pub const DEFAULT_SPREADSHEET_ID: &str = "13sb_3p0pX-WLMnQP9kOszR1WE5LeeeamycD_carKn0g";
pub const DEFAULT_SHEETS_BASE_URL: &str = "https://sheets.googleapis.com/";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value '{value}' for {name}")]
    InvalidValue { name: &'static str, value: String },
}

/// Which meetings count as happening now and how many are returned.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Selection {
    /// A started meeting qualifies while fewer minutes than this have passed.
    pub started_window_minutes: i64,
    /// An upcoming meeting qualifies while fewer minutes than this remain.
    pub upcoming_window_minutes: i64,
    /// Multiplier applied to minutes-until when ranking upcoming meetings.
    pub upcoming_weight: i64,
    pub limit: usize,
}

impl Default for Selection {
    fn default() -> Self {
        Selection {
            started_window_minutes: 45,
            upcoming_window_minutes: 15,
            upcoming_weight: 4,
            limit: 4,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub spreadsheet_id: String,
    pub range: String,
    pub credentials_path: PathBuf,
    pub token_path: PathBuf,
    pub sheets_base_url: String,
    /// Keep fetched rows this many seconds; unset disables caching.
    pub cache_ttl_seconds: Option<u64>,
    pub selection: Selection,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            spreadsheet_id: DEFAULT_SPREADSHEET_ID.to_owned(),
            range: DEFAULT_RANGE.to_owned(),
            credentials_path: PathBuf::from("credentials.json"),
            token_path: PathBuf::from("token.json"),
            sheets_base_url: DEFAULT_SHEETS_BASE_URL.to_owned(),
            cache_ttl_seconds: None,
            selection: Selection::default(),
        }
    }
}

impl Settings {
    /// Defaults, overlaid by the TOML file when given, overlaid by the environment.
    pub fn load(path: Option<&Path>) -> Result<Settings> {
        dotenvy::dotenv().ok();
        let settings = match path {
            Some(path) => Self::from_toml_file(path)?,
            None => Settings::default(),
        };
        settings.with_overrides(|name| std::env::var(name).ok())
    }

    pub fn from_toml_file(path: &Path) -> Result<Settings> {
        let content = fs::read_to_string(path)
            .map_err(MeetingSheetError::from)
            .with_prefix(&format!("Read settings file '{}' failed", path.display()))?;
        Self::from_toml_str(&content).with_prefix(&format!("Parse settings file '{}' failed", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Settings> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Applies `MEETINGS_*` variables looked up through `lookup`.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Settings>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("MEETINGS_SPREADSHEET_ID") {
            self.spreadsheet_id = value;
        }
        if let Some(value) = lookup("MEETINGS_RANGE") {
            self.range = value;
        }
        if let Some(value) = lookup("MEETINGS_CREDENTIALS") {
            self.credentials_path = PathBuf::from(value);
        }
        if let Some(value) = lookup("MEETINGS_TOKEN") {
            self.token_path = PathBuf::from(value);
        }
        if let Some(value) = lookup("MEETINGS_SHEETS_BASE_URL") {
            self.sheets_base_url = value;
        }
        if let Some(value) = lookup("MEETINGS_CACHE_TTL_SECONDS") {
            let seconds: u64 = value.parse().map_err(|_| ConfigError::InvalidValue {
                name: "MEETINGS_CACHE_TTL_SECONDS",
                value: value.clone(),
            })?;
            self.cache_ttl_seconds = Some(seconds);
        }
        self.validate()?;
        Ok(self)
    }

    pub fn parsed_range(&self) -> Result<Range> {
        Range::try_from(self.range.as_str())
    }

    pub fn cache_ttl(&self) -> Option<Duration> {
        self.cache_ttl_seconds.map(Duration::from_secs)
    }

    fn validate(&self) -> Result<()> {
        self.parsed_range()?;
        if self.spreadsheet_id.trim().is_empty() {
            Err(ConfigError::InvalidValue {
                name: "spreadsheet_id",
                value: self.spreadsheet_id.clone(),
            })?;
        }
        if self.selection.limit == 0 {
            Err(ConfigError::InvalidValue {
                name: "selection.limit",
                value: "0".to_owned(),
            })?;
        }
        Ok(())
    }
}
