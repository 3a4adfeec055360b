//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. The
//! server holds no user data; it only knows the public platform settings.

use std::sync::Arc;

use markbook_client::net::types::PublicConfig;

#[derive(Clone)]
pub struct AppState {
    pub public: Arc<PublicConfig>,
}

impl AppState {
    #[must_use]
    pub fn new(public: PublicConfig) -> Self {
        Self { public: Arc::new(public) }
    }
}
