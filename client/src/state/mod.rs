//! Shared client-side state modules.
//!
//! DESIGN
//! ======
//! State types are plain data so the synchronizer can be driven natively in
//! tests; `store` bridges them to Leptos signals.

pub mod bookmarks;
pub mod dashboard;
pub mod store;
