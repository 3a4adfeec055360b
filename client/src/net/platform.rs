//! Contract with the backend-as-a-service platform.
//!
//! ARCHITECTURE
//! ============
//! Views never reach the platform through a global. They receive an `Rc<P>`
//! where `P` implements the three traits below: `SupabaseClient` in the
//! browser, `FakePlatform` in tests.
//!
//! All futures are `?Send`: the browser runs a single-threaded event loop and
//! `gloo-net` futures hold JS values.
//!
//! LIFECYCLE
//! =========
//! `ChangeFeed::subscribe` hands back an owned `Subscription`. Closing or
//! dropping it flips a shared flag and wakes the delivery task through a
//! oneshot, so no callback runs once the owner has let go. The delivery side
//! can also mark the feed lost, which the handle then reports as closed.

#[cfg(test)]
#[path = "platform_test.rs"]
mod tests;

use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use futures::FutureExt;
use futures::channel::oneshot;

use super::error::PlatformError;
use super::types::{Bookmark, NewBookmark, Session};

// =============================================================================
// TRAITS
// =============================================================================

/// Session lookup and OAuth sign-in/sign-out.
#[async_trait(?Send)]
pub trait AuthApi {
    /// Current session, or `None` when signed out.
    async fn get_session(&self) -> Result<Option<Session>, PlatformError>;

    /// Start the OAuth redirect for `provider`, returning to `redirect_to`.
    async fn sign_in_with_oauth(&self, provider: &str, redirect_to: &str) -> Result<(), PlatformError>;

    /// End the session. Succeeds when no session exists.
    async fn sign_out(&self) -> Result<(), PlatformError>;
}

/// Queries against the bookmark collection, scoped by the session.
#[async_trait(?Send)]
pub trait BookmarkTable {
    /// Name of the collection, used to scope change channels.
    fn table(&self) -> &str;

    /// All visible rows, newest `created_at` first.
    async fn select_bookmarks(&self) -> Result<Vec<Bookmark>, PlatformError>;

    async fn insert_bookmark(&self, row: &NewBookmark) -> Result<(), PlatformError>;

    /// Delete where `id` equals `id`. Missing rows are not an error.
    async fn delete_bookmark(&self, id: &str) -> Result<(), PlatformError>;
}

/// Live change notifications for one collection.
pub trait ChangeFeed {
    /// Open a channel and call `on_change` for every matching event until the
    /// returned handle is closed.
    ///
    /// # Errors
    ///
    /// Returns an error if the channel cannot be opened.
    fn subscribe(&self, spec: &ChannelSpec, on_change: ChangeCallback) -> Result<Subscription, PlatformError>;
}

/// Everything the dashboard needs from the platform.
pub trait Platform: AuthApi + BookmarkTable + ChangeFeed {}

impl<T: AuthApi + BookmarkTable + ChangeFeed> Platform for T {}

// =============================================================================
// CHANGE EVENTS
// =============================================================================

/// Kind of row change reported by the platform, plus the two signals the
/// feed itself raises about its connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
    Other,
    /// The channel re-joined after a drop; events may have been missed.
    Resync,
    /// The channel is gone for good and no further events will arrive.
    FeedLost,
}

impl ChangeKind {
    /// Map the platform's `type` field (`INSERT`, `UPDATE`, `DELETE`).
    #[must_use]
    pub fn from_wire(raw: &str) -> Self {
        match raw.to_ascii_uppercase().as_str() {
            "INSERT" => Self::Insert,
            "UPDATE" => Self::Update,
            "DELETE" => Self::Delete,
            _ => Self::Other,
        }
    }
}

/// A change notification. Consumers refetch rather than patch, so only the
/// kind and table are kept.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub table: String,
}

/// Callback invoked for each delivered change event.
pub type ChangeCallback = Rc<dyn Fn(ChangeEvent)>;

/// Which channel to open and which table changes to listen for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChannelSpec {
    pub name: String,
    pub schema: String,
    pub table: String,
    /// Event filter; `*` listens to inserts, updates and deletes.
    pub event: String,
}

impl ChannelSpec {
    /// Listen to every event type on `public.<table>`.
    #[must_use]
    pub fn all_events(name: &str, table: &str) -> Self {
        Self { name: name.to_owned(), schema: "public".to_owned(), table: table.to_owned(), event: "*".to_owned() }
    }

    /// Realtime topic for this channel.
    #[must_use]
    pub fn topic(&self) -> String {
        format!("realtime:{}", self.name)
    }
}

// =============================================================================
// SUBSCRIPTION HANDLE
// =============================================================================

/// Owned handle to an open change channel.
#[derive(Debug)]
pub struct Subscription {
    topic: String,
    open: Arc<AtomicBool>,
    closed_tx: Option<oneshot::Sender<()>>,
}

/// Delivery-side view of a `Subscription`, held by whatever pumps events.
#[derive(Debug)]
pub struct SubscriptionGate {
    open: Arc<AtomicBool>,
    closed_rx: oneshot::Receiver<()>,
}

impl Subscription {
    /// Create a handle and its matching delivery gate.
    #[must_use]
    pub fn open(topic: impl Into<String>) -> (Self, SubscriptionGate) {
        let open = Arc::new(AtomicBool::new(true));
        let (closed_tx, closed_rx) = oneshot::channel();
        let handle = Self { topic: topic.into(), open: open.clone(), closed_tx: Some(closed_tx) };
        (handle, SubscriptionGate { open, closed_rx })
    }

    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    /// Stop delivery. Equivalent to dropping the handle.
    pub fn close(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.open.store(false, Ordering::Release);
        if let Some(tx) = self.closed_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl SubscriptionGate {
    /// Whether events may still be delivered.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    /// The feed gave up; the handle now reports closed.
    pub fn mark_lost(&self) {
        self.open.store(false, Ordering::Release);
    }

    /// Resolves once the handle is closed or dropped.
    pub fn closed(&mut self) -> impl Future<Output = ()> + Unpin + '_ {
        (&mut self.closed_rx).map(|_| ())
    }
}
