//! Server configuration parsed from environment variables.
//!
//! Required:
//! - `SUPABASE_URL`: project URL, http(s)
//! - `SUPABASE_ANON_KEY`: public anon key handed to the browser
//!
//! Optional:
//! - `OAUTH_PROVIDER`: default `google`
//! - `BOOKMARKS_TABLE`: default `bookmarks`
//! - `PORT`: default 3000
//! - `PLATFORM_PROBE`: `true` (default) or `false`

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

use markbook_client::net::types::PublicConfig;

pub const DEFAULT_OAUTH_PROVIDER: &str = "google";
pub const DEFAULT_BOOKMARKS_TABLE: &str = "bookmarks";
pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} required")]
    Missing { var: &'static str },
    #[error("{var} must be an http(s) URL, got {value:?}")]
    InvalidUrl { var: &'static str, value: String },
    #[error("{var} must be a port number, got {value:?}")]
    InvalidPort { var: &'static str, value: String },
    #[error("{var} must be a boolean, got {value:?}")]
    InvalidFlag { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Settings served to the browser at `/api/config`.
    pub public: PublicConfig,
    pub port: u16,
    /// Check platform reachability at startup.
    pub probe_platform: bool,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from any key lookup; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());

        let supabase_url = get("SUPABASE_URL").ok_or(ConfigError::Missing { var: "SUPABASE_URL" })?;
        if !(supabase_url.starts_with("https://") || supabase_url.starts_with("http://")) {
            return Err(ConfigError::InvalidUrl { var: "SUPABASE_URL", value: supabase_url });
        }
        let supabase_anon_key = get("SUPABASE_ANON_KEY").ok_or(ConfigError::Missing { var: "SUPABASE_ANON_KEY" })?;

        let port = match get("PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|_| ConfigError::InvalidPort { var: "PORT", value: raw })?,
            None => DEFAULT_PORT,
        };
        let probe_platform = match get("PLATFORM_PROBE") {
            Some(raw) => parse_bool(&raw).ok_or(ConfigError::InvalidFlag { var: "PLATFORM_PROBE", value: raw })?,
            None => true,
        };

        Ok(Self {
            public: PublicConfig {
                supabase_url: supabase_url.trim_end_matches('/').to_owned(),
                supabase_anon_key,
                oauth_provider: get("OAUTH_PROVIDER").unwrap_or_else(|| DEFAULT_OAUTH_PROVIDER.to_owned()),
                bookmarks_table: get("BOOKMARKS_TABLE").unwrap_or_else(|| DEFAULT_BOOKMARKS_TABLE.to_owned()),
            },
            port,
            probe_platform,
        })
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
