//! Platform access: contract traits, Supabase wire formats, and the client.
//!
//! SYSTEM CONTEXT
//! ==============
//! `platform` defines the contract views depend on. `rest`, `realtime` and
//! `session` are pure wire builders and parsers; `supabase` executes them in
//! the browser. `api` talks to this app's own server for the public config.

pub mod api;
pub mod error;
#[cfg(test)]
pub mod fake;
pub mod platform;
pub mod realtime;
pub mod rest;
pub mod session;
pub mod supabase;
pub mod types;
