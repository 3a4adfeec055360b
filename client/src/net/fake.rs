//! In-memory platform used by the synchronizer tests.
//!
//! Mirrors the hosted platform closely enough to exercise ordering: inserts
//! and deletes emit change events to every open channel, selects snapshot the
//! rows newest first, and selects can be held back to force out-of-order
//! completion.

use std::cell::RefCell;
use std::rc::Rc;

use async_trait::async_trait;
use futures::channel::oneshot;

use super::error::PlatformError;
use super::platform::{
    AuthApi, BookmarkTable, ChangeCallback, ChangeEvent, ChangeFeed, ChangeKind, ChannelSpec, Subscription,
    SubscriptionGate,
};
use super::types::{Bookmark, NewBookmark, Session, SessionUser};

pub const FAKE_TABLE: &str = "bookmarks";

/// Number of calls made against each operation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CallLog {
    pub get_session: usize,
    pub sign_in: usize,
    pub sign_out: usize,
    pub select: usize,
    pub insert: usize,
    pub delete: usize,
    pub subscribe: usize,
    /// Order of table operations, e.g. `["select", "insert", "select"]`.
    pub sequence: Vec<&'static str>,
}

impl CallLog {
    /// Remote calls that touch the bookmark table.
    #[must_use]
    pub fn table_calls(&self) -> usize {
        self.select + self.insert + self.delete
    }
}

struct Listener {
    gate: SubscriptionGate,
    callback: ChangeCallback,
}

#[derive(Default)]
struct FakeState {
    session: Option<Session>,
    rows: Vec<Bookmark>,
    next_id: u64,
    calls: CallLog,
    listeners: Vec<Listener>,
    fail_insert: Option<PlatformError>,
    fail_delete: Option<PlatformError>,
    fail_select: Option<PlatformError>,
    hold_selects: bool,
    held: Vec<Option<oneshot::Sender<()>>>,
    last_oauth: Option<(String, String)>,
}

/// Test double for `AuthApi + BookmarkTable + ChangeFeed`.
#[derive(Default)]
pub struct FakePlatform {
    state: RefCell<FakeState>,
}

impl FakePlatform {
    #[must_use]
    pub fn signed_out() -> Rc<Self> {
        Rc::new(Self::default())
    }

    #[must_use]
    pub fn signed_in(user_id: &str, email: &str) -> Rc<Self> {
        let fake = Self::default();
        fake.state.borrow_mut().session = Some(Session {
            access_token: format!("token-{user_id}"),
            refresh_token: format!("refresh-{user_id}"),
            expires_at: i64::MAX,
            user: SessionUser { id: user_id.to_owned(), email: Some(email.to_owned()) },
        });
        Rc::new(fake)
    }

    /// Insert a row directly, as another tab or device would.
    pub fn seed(&self, title: &str, url: &str) -> String {
        Self::push_row(&mut self.state.borrow_mut(), title, url, None)
    }

    #[must_use]
    pub fn rows(&self) -> Vec<Bookmark> {
        self.state.borrow().rows.clone()
    }

    #[must_use]
    pub fn calls(&self) -> CallLog {
        self.state.borrow().calls.clone()
    }

    #[must_use]
    pub fn last_oauth(&self) -> Option<(String, String)> {
        self.state.borrow().last_oauth.clone()
    }

    pub fn fail_next_insert(&self, error: PlatformError) {
        self.state.borrow_mut().fail_insert = Some(error);
    }

    pub fn fail_next_delete(&self, error: PlatformError) {
        self.state.borrow_mut().fail_delete = Some(error);
    }

    pub fn fail_next_select(&self, error: PlatformError) {
        self.state.borrow_mut().fail_select = Some(error);
    }

    /// Park every subsequent select until `release_select` is called for it.
    pub fn hold_selects(&self, hold: bool) {
        self.state.borrow_mut().hold_selects = hold;
    }

    /// Let the `index`-th held select (0-based, in issue order) complete.
    pub fn release_select(&self, index: usize) {
        let tx = self.state.borrow_mut().held.get_mut(index).and_then(Option::take);
        if let Some(tx) = tx {
            let _ = tx.send(());
        }
    }

    /// Channels whose subscription handle is still open.
    #[must_use]
    pub fn open_channels(&self) -> usize {
        self.state.borrow().listeners.iter().filter(|l| l.gate.is_open()).count()
    }

    /// Deliver a change event to every open channel. Returns how many
    /// callbacks ran.
    pub fn emit(&self, kind: ChangeKind) -> usize {
        let callbacks: Vec<ChangeCallback> = self
            .state
            .borrow()
            .listeners
            .iter()
            .filter(|l| l.gate.is_open())
            .map(|l| l.callback.clone())
            .collect();
        let event = ChangeEvent { kind, table: FAKE_TABLE.to_owned() };
        for callback in &callbacks {
            callback(event.clone());
        }
        callbacks.len()
    }

    /// Give up on every open channel the way a feed out of reconnect attempts
    /// does: deliver `FeedLost`, then mark the gate lost. Returns how many
    /// channels were dropped.
    pub fn lose_feed(&self) -> usize {
        let lost: Vec<ChangeCallback> = {
            let state = self.state.borrow();
            let open: Vec<&Listener> = state.listeners.iter().filter(|l| l.gate.is_open()).collect();
            for listener in &open {
                listener.gate.mark_lost();
            }
            open.iter().map(|l| l.callback.clone()).collect()
        };
        let event = ChangeEvent { kind: ChangeKind::FeedLost, table: FAKE_TABLE.to_owned() };
        for callback in &lost {
            callback(event.clone());
        }
        lost.len()
    }

    fn push_row(state: &mut FakeState, title: &str, url: &str, user_id: Option<String>) -> String {
        state.next_id += 1;
        let id = format!("bm-{}", state.next_id);
        state.rows.push(Bookmark {
            id: id.clone(),
            title: title.to_owned(),
            url: url.to_owned(),
            user_id,
            created_at: format!("2026-01-01T00:00:{:02}Z", state.next_id),
        });
        id
    }

    fn require_session(&self) -> Result<(), PlatformError> {
        if self.state.borrow().session.is_some() { Ok(()) } else { Err(PlatformError::Unauthenticated) }
    }
}

#[async_trait(?Send)]
impl AuthApi for FakePlatform {
    async fn get_session(&self) -> Result<Option<Session>, PlatformError> {
        let mut state = self.state.borrow_mut();
        state.calls.get_session += 1;
        Ok(state.session.clone())
    }

    async fn sign_in_with_oauth(&self, provider: &str, redirect_to: &str) -> Result<(), PlatformError> {
        let mut state = self.state.borrow_mut();
        state.calls.sign_in += 1;
        state.last_oauth = Some((provider.to_owned(), redirect_to.to_owned()));
        Ok(())
    }

    async fn sign_out(&self) -> Result<(), PlatformError> {
        let mut state = self.state.borrow_mut();
        state.calls.sign_out += 1;
        state.session = None;
        Ok(())
    }
}

#[async_trait(?Send)]
impl BookmarkTable for FakePlatform {
    fn table(&self) -> &str {
        FAKE_TABLE
    }

    async fn select_bookmarks(&self) -> Result<Vec<Bookmark>, PlatformError> {
        let held = {
            let mut state = self.state.borrow_mut();
            state.calls.select += 1;
            state.calls.sequence.push("select");
            if state.hold_selects {
                let (tx, rx) = oneshot::channel();
                state.held.push(Some(tx));
                Some(rx)
            } else {
                None
            }
        };
        if let Some(rx) = held {
            let _ = rx.await;
        }
        self.require_session()?;
        let mut state = self.state.borrow_mut();
        if let Some(error) = state.fail_select.take() {
            return Err(error);
        }
        let mut rows = state.rows.clone();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn insert_bookmark(&self, row: &NewBookmark) -> Result<(), PlatformError> {
        {
            let mut state = self.state.borrow_mut();
            state.calls.insert += 1;
            state.calls.sequence.push("insert");
            if let Some(error) = state.fail_insert.take() {
                return Err(error);
            }
        }
        self.require_session()?;
        {
            let mut state = self.state.borrow_mut();
            Self::push_row(&mut state, &row.title, &row.url, Some(row.user_id.clone()));
        }
        self.emit(ChangeKind::Insert);
        Ok(())
    }

    async fn delete_bookmark(&self, id: &str) -> Result<(), PlatformError> {
        let removed = {
            let mut state = self.state.borrow_mut();
            state.calls.delete += 1;
            state.calls.sequence.push("delete");
            if let Some(error) = state.fail_delete.take() {
                return Err(error);
            }
            drop(state);
            self.require_session()?;
            let mut state = self.state.borrow_mut();
            let before = state.rows.len();
            state.rows.retain(|b| b.id != id);
            before != state.rows.len()
        };
        if removed {
            self.emit(ChangeKind::Delete);
        }
        Ok(())
    }
}

impl ChangeFeed for FakePlatform {
    fn subscribe(&self, spec: &ChannelSpec, on_change: ChangeCallback) -> Result<Subscription, PlatformError> {
        let (handle, gate) = Subscription::open(spec.topic());
        let mut state = self.state.borrow_mut();
        state.calls.subscribe += 1;
        state.listeners.push(Listener { gate, callback: on_change });
        Ok(handle)
    }
}
