//! Dashboard synchronizer: session guard, list refresh, mutations, logout.
//!
//! SYSTEM CONTEXT
//! ==============
//! The dashboard page owns one `DashboardSync` per mount. The page feeds it
//! user intents over a channel and renders whatever it writes into the
//! `Store`. The platform is injected, so tests run the same code against
//! `FakePlatform` on a `LocalPool`.
//!
//! DESIGN
//! ======
//! - The local list is never patched. Every trigger (mount, change event)
//!   issues a full refetch; mutations rely on the change feed to refresh.
//! - A re-joined feed reports `Resync`, which refetches like any change. A
//!   feed that gave up reports `FeedLost`, which only sets a notice.
//! - Each refetch takes a ticket; `BookmarksState::apply` drops any result
//!   older than the last one applied.
//! - Every write after an `.await` checks the `ViewScope` first. Once the
//!   view is torn down, results are discarded and events are ignored.

#[cfg(test)]
#[path = "sync_test.rs"]
mod tests;

pub mod scope;

use std::rc::Rc;

use futures::StreamExt;
use futures::future::LocalFutureObj;
use futures::stream::Stream;
use futures::task::{LocalSpawn, LocalSpawnExt, SpawnError};

use crate::net::error::PlatformError;
use crate::net::platform::{ChangeCallback, ChangeEvent, ChangeKind, ChannelSpec, Platform};
use crate::net::types::NewBookmark;
use crate::state::dashboard::DashboardState;
use crate::state::store::Store;
use crate::util::validate::{ValidationError, validate_bookmark_input};
pub use scope::ViewScope;

/// Realtime channel name the dashboard listens on.
pub const BOOKMARKS_CHANNEL: &str = "bookmarks-channel";

/// Shown once the change feed has stopped for good.
pub const FEED_LOST_NOTICE: &str = "Live updates stopped. Reload the page to see changes made elsewhere.";

/// Result of the session guard.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Activation {
    /// Session found; list loaded and change feed open.
    Ready,
    /// No session; the page must navigate to login.
    Redirect,
    /// The view went away while the session check was pending.
    Cancelled,
}

/// Result of a create request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CreateOutcome {
    Submitted,
    /// Refused locally; nothing was sent.
    Rejected(ValidationError),
    /// Another create is still in flight.
    Busy,
    Failed(PlatformError),
    Cancelled,
}

/// User actions sent from the dashboard view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DashboardIntent {
    Create { title: String, url: String },
    Delete { id: String },
    Logout,
}

/// Why `run_intents` returned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopExit {
    LoggedOut,
    /// The intent stream ended or the scope closed.
    Closed,
}

/// Spawns onto the browser event loop through Leptos.
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserSpawner;

impl LocalSpawn for BrowserSpawner {
    fn spawn_local_obj(&self, future: LocalFutureObj<'static, ()>) -> Result<(), SpawnError> {
        leptos::task::spawn_local(future);
        Ok(())
    }
}

// =============================================================================
// SYNCHRONIZER
// =============================================================================

pub struct DashboardSync<P, S> {
    platform: Rc<P>,
    store: S,
    scope: ViewScope,
    spawner: Rc<dyn LocalSpawn>,
}

impl<P, S: Clone> Clone for DashboardSync<P, S> {
    fn clone(&self) -> Self {
        Self {
            platform: self.platform.clone(),
            store: self.store.clone(),
            scope: self.scope.clone(),
            spawner: self.spawner.clone(),
        }
    }
}

impl<P, S> DashboardSync<P, S>
where
    P: Platform + 'static,
    S: Store<DashboardState>,
{
    pub fn new(platform: Rc<P>, store: S, scope: ViewScope, spawner: Rc<dyn LocalSpawn>) -> Self {
        Self { platform, store, scope, spawner }
    }

    #[must_use]
    pub fn scope(&self) -> &ViewScope {
        &self.scope
    }

    /// Session guard. With a session: publish the viewer, open the change
    /// feed, load the list, then clear `loading`. Without one: report
    /// `Redirect` and touch nothing else.
    pub async fn activate(&self) -> Activation {
        let session = match self.platform.get_session().await {
            Ok(session) => session,
            Err(e) => {
                log::warn!("session lookup failed: {e}");
                None
            }
        };
        if !self.scope.is_active() {
            return Activation::Cancelled;
        }
        let Some(session) = session else {
            log::info!("no active session; redirecting to login");
            return Activation::Redirect;
        };

        if self.store.modify(|s| s.viewer = Some(session.user)).is_none() {
            return Activation::Cancelled;
        }

        self.open_change_feed();
        self.refresh().await;
        if !self.scope.is_active() {
            return Activation::Cancelled;
        }
        self.store.modify(|s| s.loading = false);
        Activation::Ready
    }

    fn open_change_feed(&self) {
        let spec = ChannelSpec::all_events(BOOKMARKS_CHANNEL, self.platform.table());
        match self.platform.subscribe(&spec, self.change_callback()) {
            Ok(subscription) => self.scope.hold(subscription),
            Err(e) => log::warn!("change feed unavailable for {}: {e}", spec.topic()),
        }
    }

    /// Callback for the change feed: any event schedules one full refetch.
    /// A lost feed only raises a notice; nothing is left to refetch for.
    #[must_use]
    pub fn change_callback(&self) -> ChangeCallback {
        let sync = self.clone();
        Rc::new(move |event: ChangeEvent| {
            if !sync.scope.is_active() {
                return;
            }
            if event.kind == ChangeKind::FeedLost {
                log::warn!("change feed for {} stopped; list no longer updates live", event.table);
                sync.store.modify(|s| s.notice = Some(FEED_LOST_NOTICE.to_owned()));
                return;
            }
            log::debug!("change event {:?} on {}", event.kind, event.table);
            let task = sync.clone();
            sync.spawn(async move {
                task.refresh().await;
            });
        })
    }

    /// Fetch the full list and replace the local copy if this result is the
    /// newest one seen. Returns whether the result was applied.
    pub async fn refresh(&self) -> bool {
        if !self.scope.is_active() {
            return false;
        }
        let Some(ticket) = self.store.modify(|s| s.bookmarks.begin_fetch()) else {
            return false;
        };
        let result = self.platform.select_bookmarks().await;
        if !self.scope.is_active() {
            log::debug!("discarding fetch {ticket:?}: view closed");
            return false;
        }
        match result {
            Ok(rows) => {
                let applied = self.store.modify(|s| s.bookmarks.apply(ticket, rows)).unwrap_or(false);
                if !applied {
                    log::debug!("discarding stale fetch {ticket:?}");
                }
                applied
            }
            Err(e) => {
                log::warn!("bookmark fetch failed: {e}");
                false
            }
        }
    }

    /// Validate and insert a bookmark owned by the current viewer.
    pub async fn create(&self, title: &str, url: &str) -> CreateOutcome {
        if !self.scope.is_active() {
            return CreateOutcome::Cancelled;
        }
        let valid = match validate_bookmark_input(title, url) {
            Ok(valid) => valid,
            Err(e) => return CreateOutcome::Rejected(e),
        };
        let claimed = self.store.modify(|s: &mut DashboardState| -> Result<String, CreateOutcome> {
            if s.adding {
                return Err(CreateOutcome::Busy);
            }
            let owner = s
                .viewer_id()
                .map(str::to_owned)
                .ok_or(CreateOutcome::Failed(PlatformError::Unauthenticated))?;
            s.adding = true;
            if s.notice.as_deref() != Some(FEED_LOST_NOTICE) {
                s.notice = None;
            }
            Ok(owner)
        });
        let user_id = match claimed {
            Some(Ok(owner)) => owner,
            Some(Err(outcome)) => return outcome,
            None => return CreateOutcome::Cancelled,
        };

        let row = NewBookmark { title: valid.title, url: valid.url, user_id };
        let result = self.platform.insert_bookmark(&row).await;
        if !self.scope.is_active() {
            return CreateOutcome::Cancelled;
        }
        if let Err(e) = &result {
            log::warn!("bookmark insert failed: {e}");
        }
        self.store.modify(|s| {
            s.adding = false;
            s.draft.clear();
            if let Err(e) = &result {
                s.notice = Some(format!("Could not add bookmark: {e}"));
            }
        });
        match result {
            Ok(()) => CreateOutcome::Submitted,
            Err(e) => CreateOutcome::Failed(e),
        }
    }

    /// Delete by id. The list refreshes through the change feed.
    ///
    /// # Errors
    ///
    /// Returns the platform error after recording it as a notice.
    pub async fn delete(&self, id: &str) -> Result<(), PlatformError> {
        if !self.scope.is_active() {
            return Ok(());
        }
        let result = self.platform.delete_bookmark(id).await;
        if let Err(e) = &result {
            log::warn!("bookmark delete failed for {id}: {e}");
            if self.scope.is_active() {
                self.store.modify(|s| s.notice = Some(format!("Could not delete bookmark: {e}")));
            }
        }
        result
    }

    /// Sign out and tear down the view scope. The local session is gone
    /// even when the platform call fails.
    pub async fn logout(&self) {
        if let Err(e) = self.platform.sign_out().await {
            log::warn!("sign-out failed: {e}");
        }
        self.scope.close();
    }

    /// Process intents until logout, stream end, or teardown. Creates and
    /// deletes run as separate tasks so the loop stays responsive.
    pub async fn run_intents<St>(&self, mut intents: St, on_rejected: Rc<dyn Fn(ValidationError)>) -> LoopExit
    where
        St: Stream<Item = DashboardIntent> + Unpin,
    {
        while let Some(intent) = intents.next().await {
            if !self.scope.is_active() {
                return LoopExit::Closed;
            }
            match intent {
                DashboardIntent::Create { title, url } => {
                    let sync = self.clone();
                    let on_rejected = on_rejected.clone();
                    self.spawn(async move {
                        if let CreateOutcome::Rejected(reason) = sync.create(&title, &url).await {
                            on_rejected(reason);
                        }
                    });
                }
                DashboardIntent::Delete { id } => {
                    let sync = self.clone();
                    self.spawn(async move {
                        let _ = sync.delete(&id).await;
                    });
                }
                DashboardIntent::Logout => {
                    self.logout().await;
                    return LoopExit::LoggedOut;
                }
            }
        }
        LoopExit::Closed
    }

    fn spawn(&self, task: impl Future<Output = ()> + 'static) {
        if let Err(e) = self.spawner.spawn_local(task) {
            log::warn!("failed to spawn dashboard task: {e}");
        }
    }
}
