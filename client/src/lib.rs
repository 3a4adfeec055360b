//! # markbook-client
//!
//! Leptos + WASM frontend for the bookmark manager.
//!
//! This crate contains pages, components, view state, the dashboard
//! synchronizer, and the platform layer: the contract traits plus the
//! Supabase client that implements them in the browser. The server crate
//! depends on it with the `ssr` feature to render the same `App`.

pub mod app;
pub mod components;
pub mod net;
pub mod pages;
pub mod state;
pub mod sync;
pub mod util;

/// WASM entry point: install the console logger and hydrate the SSR markup.
#[cfg(feature = "hydrate")]
#[wasm_bindgen::prelude::wasm_bindgen]
pub fn hydrate() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Debug);
    leptos::mount::hydrate_body(app::App);
}
