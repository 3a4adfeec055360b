//! URL helpers for navigation targets and rendered links.

#[cfg(test)]
#[path = "links_test.rs"]
mod tests;

/// Route the OAuth provider returns to.
pub const CALLBACK_PATH: &str = "/auth/callback";
pub const LOGIN_PATH: &str = "/";
pub const DASHBOARD_PATH: &str = "/dashboard";

/// Absolute callback URL on `origin`.
#[must_use]
pub fn callback_url(origin: &str) -> String {
    format!("{}{CALLBACK_PATH}", origin.trim_end_matches('/'))
}

/// `href` for a stored bookmark. Only web schemes become live links; anything
/// else (`javascript:`, `data:`) renders as text.
#[must_use]
pub fn safe_href(raw: &str) -> Option<String> {
    let parsed = url::Url::parse(raw).ok()?;
    matches!(parsed.scheme(), "http" | "https").then(|| raw.to_owned())
}

/// Current page origin in the browser.
#[must_use]
pub fn current_origin() -> Option<String> {
    #[cfg(feature = "hydrate")]
    {
        web_sys::window().and_then(|w| w.location().origin().ok())
    }
    #[cfg(not(feature = "hydrate"))]
    {
        None
    }
}
