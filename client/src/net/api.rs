//! Calls to this app's own server.
//!
//! Client-side (hydrate): `GET /api/config` via `gloo-net`. The `App` root
//! provides a `PlatformSource` through context; pages pull the client from it
//! and the first caller triggers the config fetch.
//! Server-side (SSR): stubs returning an error since the config is only
//! fetched by the browser.

#![allow(clippy::unused_async)]

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;

use std::cell::RefCell;
use std::rc::Rc;

use futures::future::{self, FutureExt, LocalBoxFuture};
use leptos::prelude::{GetValue, LocalStorage, StoredValue, provide_context, use_context};

use super::error::PlatformError;
use super::supabase::SupabaseClient;
use super::types::PublicConfig;

pub const CONFIG_ENDPOINT: &str = "/api/config";

#[cfg(any(test, feature = "hydrate"))]
fn config_request_failed_message(status: u16) -> String {
    format!("config request failed: {status}")
}

/// Reject configs the client cannot work with.
#[cfg(any(test, feature = "hydrate"))]
fn check_config(config: PublicConfig) -> Result<PublicConfig, PlatformError> {
    if !(config.supabase_url.starts_with("https://") || config.supabase_url.starts_with("http://")) {
        return Err(PlatformError::Config(format!("bad supabase_url: {:?}", config.supabase_url)));
    }
    if config.supabase_anon_key.trim().is_empty() {
        return Err(PlatformError::Config("empty supabase_anon_key".to_owned()));
    }
    if config.bookmarks_table.trim().is_empty() {
        return Err(PlatformError::Config("empty bookmarks_table".to_owned()));
    }
    Ok(config)
}

/// Fetch the public platform settings from the server.
///
/// # Errors
///
/// Returns an error if the request fails or the config is unusable.
pub async fn fetch_public_config() -> Result<PublicConfig, PlatformError> {
    #[cfg(feature = "hydrate")]
    {
        let resp = gloo_net::http::Request::get(CONFIG_ENDPOINT)
            .send()
            .await
            .map_err(|e| PlatformError::Transport(e.to_string()))?;
        if !resp.ok() {
            return Err(PlatformError::Config(config_request_failed_message(resp.status())));
        }
        let config = resp.json::<PublicConfig>().await.map_err(|e| PlatformError::Decode(e.to_string()))?;
        check_config(config)
    }
    #[cfg(not(feature = "hydrate"))]
    {
        Err(PlatformError::Config("not available on server".to_owned()))
    }
}

// =============================================================================
// PLATFORM CONTEXT
// =============================================================================

type Build<P> = Rc<dyn Fn() -> LocalBoxFuture<'static, Result<Rc<P>, PlatformError>>>;

/// Platform client built on first use and shared with the pages through
/// Leptos context. A failed build is not cached; the next `get` retries.
pub struct PlatformSource<P> {
    client: Rc<RefCell<Option<Rc<P>>>>,
    build: Build<P>,
}

impl<P> Clone for PlatformSource<P> {
    fn clone(&self) -> Self {
        Self { client: self.client.clone(), build: self.build.clone() }
    }
}

impl<P: 'static> PlatformSource<P> {
    pub fn new<F, Fut>(build: F) -> Self
    where
        F: Fn() -> Fut + 'static,
        Fut: Future<Output = Result<P, PlatformError>> + 'static,
    {
        Self {
            client: Rc::new(RefCell::new(None)),
            build: Rc::new(move || build().map(|built| built.map(Rc::new)).boxed_local()),
        }
    }

    /// Source that always hands out `client`.
    #[must_use]
    pub fn ready(client: Rc<P>) -> Self {
        Self {
            client: Rc::new(RefCell::new(Some(client))),
            build: Rc::new(|| future::ready(Err(PlatformError::Config("no platform builder".to_owned()))).boxed_local()),
        }
    }

    /// The shared client, building it if this is the first call.
    ///
    /// # Errors
    ///
    /// Returns the build error.
    pub async fn get(&self) -> Result<Rc<P>, PlatformError> {
        let cached = self.client.borrow().clone();
        if let Some(client) = cached {
            return Ok(client);
        }
        let built = (self.build)().await?;
        Ok(self.client.borrow_mut().get_or_insert(built).clone())
    }
}

/// Source for the hosted platform, configured from `/api/config`.
#[must_use]
pub fn supabase_source() -> PlatformSource<SupabaseClient> {
    PlatformSource::new(|| async { Ok::<_, PlatformError>(SupabaseClient::new(fetch_public_config().await?)) })
}

/// Make `source` available to every view below the current owner.
pub fn provide_platform<P: 'static>(source: PlatformSource<P>) {
    provide_context(StoredValue::new_local(source));
}

/// The platform source provided by an ancestor view.
///
/// # Errors
///
/// Returns `PlatformError::Config` when no ancestor provided one.
pub fn use_platform<P: 'static>() -> Result<PlatformSource<P>, PlatformError> {
    use_context::<StoredValue<PlatformSource<P>, LocalStorage>>()
        .and_then(|stored| stored.try_get_value())
        .ok_or_else(|| PlatformError::Config("platform client not provided".to_owned()))
}
