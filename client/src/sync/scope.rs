//! Lifetime guard for one mounted dashboard.
//!
//! The scope is `Send + Sync` so Leptos `on_cleanup` can close it. Async work
//! checks `is_active` after every suspension point and drops its result once
//! the scope is closed.

#[cfg(test)]
#[path = "scope_test.rs"]
mod tests;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::net::platform::Subscription;

#[derive(Debug, Default)]
struct ScopeInner {
    closed: AtomicBool,
    subscription: Mutex<Option<Subscription>>,
}

/// Clonable handle to a view's lifetime and its live subscription.
#[derive(Clone, Debug, Default)]
pub struct ViewScope {
    inner: Arc<ScopeInner>,
}

impl ViewScope {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.inner.closed.load(Ordering::Acquire)
    }

    /// Keep `subscription` open until the scope closes. A scope that already
    /// closed releases it immediately; a previously held one is replaced.
    pub fn hold(&self, subscription: Subscription) {
        let mut slot = self.inner.subscription.lock().unwrap_or_else(PoisonError::into_inner);
        if !self.is_active() {
            drop(slot);
            subscription.close();
            return;
        }
        if let Some(previous) = slot.replace(subscription) {
            previous.close();
        }
    }

    #[must_use]
    pub fn holds_subscription(&self) -> bool {
        self.inner
            .subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(Subscription::is_open)
    }

    /// Mark the view gone and close its subscription. Idempotent.
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::Release);
        let held = self.inner.subscription.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(subscription) = held {
            subscription.close();
        }
    }
}
