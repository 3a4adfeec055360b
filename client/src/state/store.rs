//! Write access to view state from async tasks.
//!
//! SYSTEM CONTEXT
//! ==============
//! The synchronizer mutates view state after suspension points. In the app
//! that state is a Leptos `RwSignal`; in tests it is a plain
//! `Rc<RefCell<_>>`. Both return `None` once the state is gone, which callers
//! treat as "view torn down".

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;

use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::{RwSignal, Update, WithUntracked};

/// Shared, mutable view state.
pub trait Store<T>: Clone + 'static {
    /// Read without subscribing.
    fn inspect<R>(&self, f: impl FnOnce(&T) -> R) -> Option<R>;

    /// Mutate and notify.
    fn modify<R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R>;
}

impl<T: Send + Sync + 'static> Store<T> for RwSignal<T> {
    fn inspect<R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        self.try_with_untracked(f)
    }

    fn modify<R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        self.try_update(f)
    }
}

impl<T: 'static> Store<T> for Rc<RefCell<T>> {
    fn inspect<R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        Some(f(&self.borrow()))
    }

    fn modify<R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        Some(f(&mut self.borrow_mut()))
    }
}
