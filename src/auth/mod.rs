//! # Authorization Module
//!
//! OAuth 2.0 installed-application flow for read-only spreadsheet access.
//!
//! [`authorize`] reads the client secrets from `credentials.json` and reuses the token stored
//! in `token.json`. On first run it prints the consent page, asks for the code through a
//! [`CodePrompt`], exchanges it and stores the token for later runs. The result is an
//! [`AuthorizedClient`] that the caller passes on to [`crate::sheets::SheetsClient`].
use crate::error::{MeetingSheetError, Result, ResultMessage};
use chrono::Utc;
use serde::Deserialize;
use std::fs;
use std::io::{BufRead, Write};
use std::path::Path;
use thiserror::Error;
use tracing::info;
use url::Url;

pub mod token;

pub use token::Token;
use token::TokenResponse;

pub const SCOPES: &[&str] = &["https://www.googleapis.com/auth/spreadsheets.readonly"];

const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Credentials file has no redirect uri")]
    MissingRedirectUri,

    #[error("No authorization code was entered")]
    EmptyAuthorizationCode,

    #[error("Token endpoint rejected the request with status {status}: {message}")]
    TokenRequestFailed { status: u16, message: String },

    #[error("Token has expired and no refresh token is stored")]
    MissingRefreshToken,
}

/// Client secrets of an installed (or web) OAuth application.
#[derive(Clone, Debug, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
    #[serde(default)]
    pub auth_uri: Option<String>,
    #[serde(default)]
    pub token_uri: Option<String>,
}

/// Layout of `credentials.json` as downloaded from the Google Cloud console.
#[derive(Clone, Debug, Deserialize)]
pub struct Credentials {
    #[serde(alias = "web")]
    pub installed: ClientSecrets,
}

impl Credentials {
    pub fn load(path: &Path) -> Result<Credentials> {
        let content = fs::read_to_string(path)
            .map_err(MeetingSheetError::from)
            .with_prefix(&format!("Error loading client secret file '{}'", path.display()))?;
        let credentials: Credentials = serde_json::from_str(&content)
            .map_err(MeetingSheetError::from)
            .with_prefix(&format!("Error parsing client secret file '{}'", path.display()))?;
        Ok(credentials)
    }

    fn redirect_uri(&self) -> Result<&str> {
        let uri = self.installed.redirect_uris.first().ok_or(AuthError::MissingRedirectUri)?;
        Ok(uri.as_str())
    }

    fn token_uri(&self) -> &str {
        self.installed.token_uri.as_deref().unwrap_or(DEFAULT_TOKEN_URI)
    }

    /// Consent page asking for offline access to the given scopes.
    pub fn authorization_url(&self, scopes: &[&str]) -> Result<Url> {
        let base = self.installed.auth_uri.as_deref().unwrap_or(DEFAULT_AUTH_URI);
        let url = Url::parse_with_params(
            base,
            &[
                ("access_type", "offline"),
                ("scope", scopes.join(" ").as_str()),
                ("response_type", "code"),
                ("client_id", self.installed.client_id.as_str()),
                ("redirect_uri", self.redirect_uri()?),
            ],
        )?;
        Ok(url)
    }
}

/// Source of the authorization code the user copies from the consent page.
pub trait CodePrompt {
    fn ask(&self, authorization_url: &Url) -> Result<String>;
}

/// Prints the consent url and reads the code from standard input.
pub struct StdinPrompt;

impl CodePrompt for StdinPrompt {
    fn ask(&self, authorization_url: &Url) -> Result<String> {
        println!("Authorize this app by visiting this url: {authorization_url}");
        print!("Enter the code from that page here: ");
        std::io::stdout().flush()?;
        let mut code = String::new();
        std::io::stdin().lock().read_line(&mut code)?;
        Ok(code)
    }
}

/// HTTP client plus a currently valid token. Produced by [`authorize`], never mutated behind
/// the caller's back.
#[derive(Clone, Debug)]
pub struct AuthorizedClient {
    http: reqwest::Client,
    token: Token,
}

impl AuthorizedClient {
    pub fn new(http: reqwest::Client, token: Token) -> Self {
        AuthorizedClient { http, token }
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub fn access_token(&self) -> &str {
        &self.token.access_token
    }
}

/// Loads the client secrets and a stored token, running the consent flow when no token is
/// stored yet and refreshing an expired one.
pub async fn authorize(
    credentials_path: &Path,
    token_path: &Path,
    prompt: &dyn CodePrompt,
) -> Result<AuthorizedClient> {
    let credentials = Credentials::load(credentials_path)?;
    let http = reqwest::Client::new();

    let token = match Token::load(token_path)? {
        Some(token) if token.is_expired(Utc::now()) => {
            let token = refresh_token(&http, &credentials, &token).await?;
            token.save(token_path)?;
            info!(path = %token_path.display(), "Refreshed stored token");
            token
        }
        Some(token) => token,
        None => {
            let token = new_token(&http, &credentials, prompt).await?;
            token.save(token_path)?;
            info!(path = %token_path.display(), "Token stored");
            token
        }
    };
    Ok(AuthorizedClient::new(http, token))
}

async fn new_token(http: &reqwest::Client, credentials: &Credentials, prompt: &dyn CodePrompt) -> Result<Token> {
    let authorization_url = credentials.authorization_url(SCOPES)?;
    let code = prompt.ask(&authorization_url)?;
    let code = code.trim();
    if code.is_empty() {
        Err(AuthError::EmptyAuthorizationCode)?;
    }

    let response = request_token(
        http,
        credentials.token_uri(),
        &[
            ("code", code),
            ("client_id", credentials.installed.client_id.as_str()),
            ("client_secret", credentials.installed.client_secret.as_str()),
            ("redirect_uri", credentials.redirect_uri()?),
            ("grant_type", "authorization_code"),
        ],
    )
    .await
    .with_prefix("Error while trying to retrieve access token")?;
    Ok(response.into_token(Utc::now(), None))
}

async fn refresh_token(http: &reqwest::Client, credentials: &Credentials, token: &Token) -> Result<Token> {
    let refresh_token = token.refresh_token.as_deref().ok_or(AuthError::MissingRefreshToken)?;
    let response = request_token(
        http,
        credentials.token_uri(),
        &[
            ("refresh_token", refresh_token),
            ("client_id", credentials.installed.client_id.as_str()),
            ("client_secret", credentials.installed.client_secret.as_str()),
            ("grant_type", "refresh_token"),
        ],
    )
    .await
    .with_prefix("Error while trying to refresh access token")?;
    Ok(response.into_token(Utc::now(), token.refresh_token.clone()))
}

async fn request_token(http: &reqwest::Client, token_uri: &str, form: &[(&str, &str)]) -> Result<TokenResponse> {
    let response = http.post(token_uri).form(form).send().await?;
    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(AuthError::TokenRequestFailed {
            status: status.as_u16(),
            message,
        }
        .into());
    }
    Ok(response.json::<TokenResponse>().await?)
}
