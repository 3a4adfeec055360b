//! Startup services that run outside the request path.

pub mod platform_probe;
