//! Credentials and token session for the DNS management API

use crate::error::{Error, Result};
use serde::Deserialize;

/// Path of the OAuth-style token endpoint
pub(crate) const TOKEN_PATH: &str = "/v2/authorization/token";

/// How the operator authenticates
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Exchange a username and password for tokens
    Password {
        /// Account user name
        username: String,
        /// Account password
        password: String,
    },
    /// Use an already issued bearer token
    Token {
        /// Bearer token sent with every request
        access_token: String,
        /// Optional refresh token used when the bearer token expires
        refresh_token: Option<String>,
    },
}

// Secrets stay out of logs
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::Password { username, .. } => f
                .debug_struct("Password")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
            Credentials::Token { refresh_token, .. } => f
                .debug_struct("Token")
                .field("access_token", &"<redacted>")
                .field("has_refresh_token", &refresh_token.is_some())
                .finish(),
        }
    }
}

impl Credentials {
    /// Build credentials from the individual command-line flags
    ///
    /// A token excludes a username/password pair, a username needs a password
    /// (and the other way round), and something has to be supplied. A refresh
    /// token is only meaningful next to a token.
    pub fn from_flags(
        username: Option<String>,
        password: Option<String>,
        token: Option<String>,
        refresh_token: Option<String>,
    ) -> Result<Self> {
        match (username, password, token) {
            (None, None, Some(access_token)) => Ok(Credentials::Token {
                access_token,
                refresh_token,
            }),
            (_, _, Some(_)) => Err(Error::Auth(
                "a token cannot be combined with a username or password".into(),
            )),
            (Some(_), Some(_), None) if refresh_token.is_some() => Err(Error::Auth(
                "a refresh token can only be used together with a token".into(),
            )),
            (Some(username), Some(password), None) => {
                Ok(Credentials::Password { username, password })
            }
            (Some(_), None, None) | (None, Some(_), None) => Err(Error::Auth(
                "both a username and a password are required".into(),
            )),
            (None, None, None) => Err(Error::Auth(
                "provide either a token, or both a username and a password".into(),
            )),
        }
    }
}

/// Tokens currently in use by a client
///
/// Owned by the API client and replaced in place when a refresh succeeds.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    /// Bearer token
    pub access_token: String,
    /// Refresh token, if the API issued one
    pub refresh_token: Option<String>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"<redacted>")
            .field("has_refresh_token", &self.refresh_token.is_some())
            .finish()
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// Open a session for the given credentials
///
/// Token credentials are used as-is; password credentials are exchanged at
/// the token endpoint.
pub async fn open_session(
    http: &reqwest::Client,
    base_url: &str,
    credentials: &Credentials,
) -> Result<Session> {
    match credentials {
        Credentials::Token {
            access_token,
            refresh_token,
        } => Ok(Session {
            access_token: access_token.clone(),
            refresh_token: refresh_token.clone(),
        }),
        Credentials::Password { username, password } => {
            tracing::debug!(username = %username, "requesting access token");
            request_token(
                http,
                base_url,
                &[
                    ("grant_type", "password"),
                    ("username", username.as_str()),
                    ("password", password.as_str()),
                ],
            )
            .await
        }
    }
}

/// Trade a refresh token for a new session
pub async fn refresh_session(
    http: &reqwest::Client,
    base_url: &str,
    refresh_token: &str,
) -> Result<Session> {
    tracing::debug!("refreshing access token");
    let session = request_token(
        http,
        base_url,
        &[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ],
    )
    .await?;

    // Some deployments do not rotate refresh tokens
    Ok(Session {
        refresh_token: session
            .refresh_token
            .or_else(|| Some(refresh_token.to_string())),
        ..session
    })
}

async fn request_token(
    http: &reqwest::Client,
    base_url: &str,
    form: &[(&str, &str)],
) -> Result<Session> {
    let url = format!("{}{}", base_url.trim_end_matches('/'), TOKEN_PATH);
    let response = http.post(&url).form(form).send().await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(Error::Auth(format!(
            "token request rejected with HTTP {}: {}",
            status.as_u16(),
            body
        )));
    }

    let token: TokenResponse = response
        .json()
        .await
        .map_err(|e| Error::Auth(format!("malformed token response: {}", e)))?;

    Ok(Session {
        access_token: token.access_token,
        refresh_token: token.refresh_token,
    })
}
