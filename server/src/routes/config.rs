//! Public platform settings for the browser.

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

use axum::Json;
use axum::extract::State;
use markbook_client::net::types::PublicConfig;

use crate::state::AppState;

/// `GET /api/config`: project URL, anon key, OAuth provider and table name.
pub async fn public_config(State(state): State<AppState>) -> Json<PublicConfig> {
    Json(state.public.as_ref().clone())
}
