//! Wire and storage types shared by the platform client and the UI.
//!
//! DESIGN
//! ======
//! Rows mirror the `bookmarks` table as the REST endpoint returns it. The
//! server reuses `PublicConfig` so both sides agree on the config schema.

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;

use serde::{Deserialize, Deserializer, Serialize};

// =============================================================================
// BOOKMARKS
// =============================================================================

/// A bookmark row as stored by the platform.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    /// Backend-assigned identifier (uuid or serial, kept opaque).
    #[serde(deserialize_with = "opaque_id")]
    pub id: String,
    pub title: String,
    pub url: String,
    /// Owner reference, assigned from the session at insert time.
    #[serde(default)]
    pub user_id: Option<String>,
    /// Backend-assigned creation timestamp; the list sort key.
    #[serde(default)]
    pub created_at: String,
}

/// Insert payload for a new bookmark.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NewBookmark {
    pub title: String,
    pub url: String,
    pub user_id: String,
}

/// Accept string or numeric primary keys and keep them as strings.
fn opaque_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!("unsupported id value: {other}"))),
    }
}

// =============================================================================
// SESSION
// =============================================================================

/// Read-only projection of the signed-in user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Platform-issued session persisted in browser storage.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    /// Unix seconds at which `access_token` stops being accepted.
    pub expires_at: i64,
    pub user: SessionUser,
}

// =============================================================================
// CONFIG
// =============================================================================

/// Public platform settings handed from the server to the browser.
///
/// Only the anonymous key travels here; row access is still enforced by the
/// platform per session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub oauth_provider: String,
    pub bookmarks_table: String,
}
