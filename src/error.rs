use thiserror::Error;

/// Main error type for the meeting sheet crate.
/// Aggregates errors from the standard library, dependencies, and internal modules.
#[derive(Error, Debug)]
pub enum MeetingSheetError {
    #[error("{0}")]
    WithContextError(String),

    // Standard library errors
    #[error("{0}")]
    IoError(#[from] std::io::Error),

    // Third-party library errors
    #[error("{0}")]
    JsonError(#[from] serde_json::Error),

    #[error("{0}")]
    HttpError(#[from] reqwest::Error),

    #[error("{0}")]
    UrlError(#[from] url::ParseError),

    #[error("{0}")]
    TomlError(#[from] toml::de::Error),

    // Module errors
    #[error("{0}")]
    ConfigError(#[from] crate::config::ConfigError),

    #[error("{0}")]
    RangeError(#[from] crate::sheets::range::RangeError),

    #[error("{0}")]
    AuthError(#[from] crate::auth::AuthError),

    #[error("{0}")]
    SheetsError(#[from] crate::sheets::SheetsError),

    #[error("{0}")]
    AudienceError(#[from] crate::schedule::AudienceError),
}

pub type Result<T, E = MeetingSheetError> = std::result::Result<T, E>;

pub trait ResultMessage {
    fn with_prefix(self, message: &str) -> Self;
}

impl<T> ResultMessage for Result<T, MeetingSheetError> {
    fn with_prefix(self, message: &str) -> Self {
        self.map_err(|e| MeetingSheetError::WithContextError(format!("{}: {}", message, e)))
    }
}
