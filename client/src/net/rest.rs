//! Request shapes for the platform's REST surfaces (auth and table API).
//!
//! SYSTEM CONTEXT
//! ==============
//! Builders here are pure so URL, header and body formats are unit tested
//! natively. `supabase.rs` turns a `RestRequest` into a `gloo-net` call.

#[cfg(test)]
#[path = "rest_test.rs"]
mod tests;

use serde_json::Value;

/// HTTP verbs used against the platform.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Delete,
}

/// A fully-resolved platform request.
#[derive(Clone, Debug, PartialEq)]
pub struct RestRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(&'static str, String)>,
    pub body: Option<Value>,
}

impl RestRequest {
    /// Look up a header value by name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter().find(|(k, _)| k.eq_ignore_ascii_case(name)).map(|(_, v)| v.as_str())
    }
}

/// Endpoint builder bound to one project URL and anon key.
#[derive(Clone, Debug)]
pub struct Endpoints {
    base: String,
    anon_key: String,
}

impl Endpoints {
    #[must_use]
    pub fn new(base_url: &str, anon_key: &str) -> Self {
        Self { base: base_url.trim_end_matches('/').to_owned(), anon_key: anon_key.to_owned() }
    }

    /// Browser navigation target that starts the OAuth consent flow.
    #[must_use]
    pub fn authorize_url(&self, provider: &str, redirect_to: &str) -> String {
        format!(
            "{}/auth/v1/authorize?provider={}&redirect_to={}",
            self.base,
            urlencoding::encode(provider),
            urlencoding::encode(redirect_to)
        )
    }

    /// `GET /auth/v1/user` for the holder of `access_token`.
    #[must_use]
    pub fn user(&self, access_token: &str) -> RestRequest {
        self.request(Method::Get, format!("{}/auth/v1/user", self.base), Some(access_token), None)
    }

    /// Exchange a refresh token for a new session.
    #[must_use]
    pub fn refresh_session(&self, refresh_token: &str) -> RestRequest {
        self.request(
            Method::Post,
            format!("{}/auth/v1/token?grant_type=refresh_token", self.base),
            None,
            Some(serde_json::json!({ "refresh_token": refresh_token })),
        )
    }

    /// Revoke the session that owns `access_token`.
    #[must_use]
    pub fn logout(&self, access_token: &str) -> RestRequest {
        self.request(Method::Post, format!("{}/auth/v1/logout", self.base), Some(access_token), None)
    }

    /// Select every column, ordered by `order_column` descending.
    #[must_use]
    pub fn select_desc(&self, table: &str, order_column: &str, access_token: &str) -> RestRequest {
        let url = format!(
            "{}/rest/v1/{}?select=*&order={}.desc",
            self.base,
            urlencoding::encode(table),
            urlencoding::encode(order_column)
        );
        self.request(Method::Get, url, Some(access_token), None)
    }

    /// Insert one row without asking for it back.
    #[must_use]
    pub fn insert(&self, table: &str, row: Value, access_token: &str) -> RestRequest {
        let url = format!("{}/rest/v1/{}", self.base, urlencoding::encode(table));
        let mut req = self.request(Method::Post, url, Some(access_token), Some(row));
        req.headers.push(("Prefer", "return=minimal".to_owned()));
        req
    }

    /// Delete rows where `column` equals `value`.
    #[must_use]
    pub fn delete_eq(&self, table: &str, column: &str, value: &str, access_token: &str) -> RestRequest {
        let url = format!(
            "{}/rest/v1/{}?{}=eq.{}",
            self.base,
            urlencoding::encode(table),
            urlencoding::encode(column),
            urlencoding::encode(value)
        );
        self.request(Method::Delete, url, Some(access_token), None)
    }

    fn request(&self, method: Method, url: String, access_token: Option<&str>, body: Option<Value>) -> RestRequest {
        let bearer = access_token.unwrap_or(&self.anon_key);
        let mut headers = vec![("apikey", self.anon_key.clone()), ("Authorization", format!("Bearer {bearer}"))];
        if body.is_some() {
            headers.push(("Content-Type", "application/json".to_owned()));
        }
        RestRequest { method, url, headers, body }
    }
}

/// Error text for a non-success platform response.
#[must_use]
pub fn status_failed_message(status: u16, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() { format!("status {status}") } else { format!("status {status}: {body}") }
}
