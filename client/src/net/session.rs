//! Session acquisition and refresh rules for the platform's auth API.
//!
//! After the OAuth consent screen the platform redirects to
//! `/auth/callback#access_token=...&refresh_token=...&expires_in=...`
//! (or `#error=...&error_description=...`). The grant is parsed here, joined
//! with the user record, and persisted as a `Session`.

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;

use serde::Deserialize;

use super::error::PlatformError;
use super::types::{Session, SessionUser};

/// Browser storage key for the persisted session.
pub const STORAGE_KEY: &str = "markbook.session";

/// Refresh when the access token has less than this many seconds left.
pub const REFRESH_MARGIN_SECS: i64 = 60;

const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

/// Tokens carried back by the OAuth redirect.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenGrant {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: i64,
}

impl TokenGrant {
    #[must_use]
    pub fn into_session(self, user: SessionUser) -> Session {
        Session { access_token: self.access_token, refresh_token: self.refresh_token, expires_at: self.expires_at, user }
    }
}

/// Parse the redirect fragment (or query) into a token grant.
///
/// # Errors
///
/// Returns `PlatformError::OAuth` when the provider reported an error or the
/// tokens are missing.
pub fn parse_callback_fragment(fragment: &str, now_secs: i64) -> Result<TokenGrant, PlatformError> {
    let trimmed = fragment.trim_start_matches(['#', '?']);
    let mut access_token = None;
    let mut refresh_token = None;
    let mut expires_at = None;
    let mut expires_in = None;
    let mut error = None;
    let mut error_description = None;

    for (key, value) in url::form_urlencoded::parse(trimmed.as_bytes()) {
        match key.as_ref() {
            "access_token" => access_token = Some(value.into_owned()),
            "refresh_token" => refresh_token = Some(value.into_owned()),
            "expires_at" => expires_at = value.parse::<i64>().ok(),
            "expires_in" => expires_in = value.parse::<i64>().ok(),
            "error" => error = Some(value.into_owned()),
            "error_description" => error_description = Some(value.into_owned()),
            _ => {}
        }
    }

    if let Some(error) = error {
        return Err(PlatformError::OAuth(error_description.unwrap_or(error)));
    }
    let (Some(access_token), Some(refresh_token)) = (access_token, refresh_token) else {
        return Err(PlatformError::OAuth("redirect carried no session tokens".to_owned()));
    };
    let expires_at = expires_at.unwrap_or_else(|| expiry_from(now_secs, expires_in));
    Ok(TokenGrant { access_token, refresh_token, expires_at })
}

/// User record returned by `GET /auth/v1/user` and embedded in token responses.
#[derive(Clone, Debug, Deserialize)]
pub struct UserRecord {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl From<UserRecord> for SessionUser {
    fn from(record: UserRecord) -> Self {
        Self { id: record.id, email: record.email }
    }
}

/// Body of a successful `POST /auth/v1/token` call.
#[derive(Clone, Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: UserRecord,
}

impl TokenResponse {
    #[must_use]
    pub fn into_session(self, now_secs: i64) -> Session {
        let expires_at = self.expires_at.unwrap_or_else(|| expiry_from(now_secs, self.expires_in));
        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            user: self.user.into(),
        }
    }
}

/// Absolute expiry for a grant lasting `expires_in` seconds from `now_secs`.
/// Both values come from outside, so the sum saturates.
fn expiry_from(now_secs: i64, expires_in: Option<i64>) -> i64 {
    now_secs.saturating_add(expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS))
}

/// Whether `session` should be refreshed before use.
#[must_use]
pub fn needs_refresh(session: &Session, now_secs: i64) -> bool {
    session.expires_at.saturating_sub(now_secs) <= REFRESH_MARGIN_SECS
}

/// Decode a stored session; corrupt entries read as signed out.
#[must_use]
pub fn decode_stored(raw: &str) -> Option<Session> {
    serde_json::from_str(raw).ok()
}
