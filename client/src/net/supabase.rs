//! Supabase implementation of the platform contract.
//!
//! Client-side (hydrate): REST calls through `gloo-net`, the session in
//! `localStorage`, and one Phoenix websocket per change-feed subscription,
//! re-joined with backoff when it drops.
//! Server-side (SSR) and native tests: the transport layer reports that it
//! needs a browser, so every remote call fails cleanly instead of panicking.
//!
//! SESSION FLOW
//! ============
//! `complete_oauth_redirect` turns the callback fragment into a stored
//! session. `get_session` reads it back and refreshes it when the access token
//! is about to expire; a refresh the platform rejects signs the browser out.

#![allow(clippy::unused_async)]

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use super::error::PlatformError;
use super::platform::{AuthApi, BookmarkTable, ChangeCallback, ChangeFeed, ChannelSpec, Subscription};
use super::rest::{Endpoints, RestRequest};
use super::session::{TokenResponse, UserRecord, needs_refresh, parse_callback_fragment};
use super::types::{Bookmark, NewBookmark, PublicConfig, Session};

const ORDER_COLUMN: &str = "created_at";
const ID_COLUMN: &str = "id";

/// Platform client bound to one project.
#[derive(Clone, Debug)]
pub struct SupabaseClient {
    config: PublicConfig,
    endpoints: Endpoints,
}

impl SupabaseClient {
    #[must_use]
    pub fn new(config: PublicConfig) -> Self {
        let endpoints = Endpoints::new(&config.supabase_url, &config.supabase_anon_key);
        Self { config, endpoints }
    }

    #[must_use]
    pub fn config(&self) -> &PublicConfig {
        &self.config
    }

    /// OAuth provider configured for the login button.
    #[must_use]
    pub fn provider(&self) -> &str {
        &self.config.oauth_provider
    }

    /// Finish the OAuth redirect: parse the token grant from `fragment`, load
    /// the user it belongs to, and persist the session.
    ///
    /// # Errors
    ///
    /// Returns `OAuth` when the provider reported an error, or the transport,
    /// status or storage error that stopped the session from being stored.
    pub async fn complete_oauth_redirect(&self, fragment: &str) -> Result<Session, PlatformError> {
        let grant = parse_callback_fragment(fragment, now_secs())?;
        let user: UserRecord = send_json(&self.endpoints.user(&grant.access_token)).await?;
        let session = grant.into_session(user.into());
        store_session(&session)?;
        log::info!("signed in as {}", session.user.id);
        Ok(session)
    }

    async fn require_session(&self) -> Result<Session, PlatformError> {
        self.get_session().await?.ok_or(PlatformError::Unauthenticated)
    }

    /// JWT for realtime joins: the live session's (refreshed if due), else
    /// the anon key.
    #[cfg(feature = "hydrate")]
    async fn channel_token(&self) -> String {
        match self.get_session().await {
            Ok(Some(session)) => session.access_token,
            Ok(None) => self.config.supabase_anon_key.clone(),
            Err(e) => {
                log::debug!("session refresh for realtime failed: {e}");
                load_session().map_or_else(|| self.config.supabase_anon_key.clone(), |s| s.access_token)
            }
        }
    }
}

#[async_trait(?Send)]
impl AuthApi for SupabaseClient {
    async fn get_session(&self) -> Result<Option<Session>, PlatformError> {
        let Some(session) = load_session() else {
            return Ok(None);
        };
        let now = now_secs();
        if !needs_refresh(&session, now) {
            return Ok(Some(session));
        }
        match send_json::<TokenResponse>(&self.endpoints.refresh_session(&session.refresh_token)).await {
            Ok(response) => {
                let refreshed = response.into_session(now);
                store_session(&refreshed)?;
                Ok(Some(refreshed))
            }
            Err(PlatformError::Status { status: 400 | 401 | 403, .. }) => {
                log::info!("stored session was rejected on refresh; signing out locally");
                clear_session();
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn sign_in_with_oauth(&self, provider: &str, redirect_to: &str) -> Result<(), PlatformError> {
        let url = self.endpoints.authorize_url(provider, redirect_to);
        #[cfg(feature = "hydrate")]
        {
            let window = web_sys::window().ok_or_else(|| PlatformError::Config("no browser window".to_owned()))?;
            window.location().set_href(&url).map_err(|e| PlatformError::Transport(format!("{e:?}")))
        }
        #[cfg(not(feature = "hydrate"))]
        {
            Err(browser_only(&url))
        }
    }

    async fn sign_out(&self) -> Result<(), PlatformError> {
        let Some(session) = load_session() else {
            return Ok(());
        };
        clear_session();
        match send_empty(&self.endpoints.logout(&session.access_token)).await {
            Ok(()) | Err(PlatformError::Status { status: 401 | 403 | 404, .. }) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

#[async_trait(?Send)]
impl BookmarkTable for SupabaseClient {
    fn table(&self) -> &str {
        &self.config.bookmarks_table
    }

    async fn select_bookmarks(&self) -> Result<Vec<Bookmark>, PlatformError> {
        let session = self.require_session().await?;
        send_json(&self.endpoints.select_desc(self.table(), ORDER_COLUMN, &session.access_token)).await
    }

    async fn insert_bookmark(&self, row: &NewBookmark) -> Result<(), PlatformError> {
        let session = self.require_session().await?;
        let body = serde_json::to_value(row).map_err(|e| PlatformError::Decode(e.to_string()))?;
        send_empty(&self.endpoints.insert(self.table(), body, &session.access_token)).await
    }

    async fn delete_bookmark(&self, id: &str) -> Result<(), PlatformError> {
        let session = self.require_session().await?;
        send_empty(&self.endpoints.delete_eq(self.table(), ID_COLUMN, id, &session.access_token)).await
    }
}

impl ChangeFeed for SupabaseClient {
    fn subscribe(&self, spec: &ChannelSpec, on_change: ChangeCallback) -> Result<Subscription, PlatformError> {
        let url = super::realtime::socket_url(&self.config.supabase_url, &self.config.supabase_anon_key)?;
        #[cfg(feature = "hydrate")]
        {
            let (handle, gate) = Subscription::open(spec.topic());
            leptos::task::spawn_local(channel::pump(self.clone(), url, spec.clone(), gate, on_change));
            Ok(handle)
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = (spec, on_change);
            Err(browser_only(&url))
        }
    }
}

// =============================================================================
// TRANSPORT
// =============================================================================

#[cfg(not(feature = "hydrate"))]
fn browser_only(target: &str) -> PlatformError {
    PlatformError::Transport(format!("{target} is only reachable from the browser"))
}

async fn send_json<T: DeserializeOwned>(request: &RestRequest) -> Result<T, PlatformError> {
    #[cfg(feature = "hydrate")]
    {
        let response = browser::send(request).await?;
        response.json::<T>().await.map_err(|e| PlatformError::Decode(e.to_string()))
    }
    #[cfg(not(feature = "hydrate"))]
    {
        Err(browser_only(&request.url))
    }
}

async fn send_empty(request: &RestRequest) -> Result<(), PlatformError> {
    #[cfg(feature = "hydrate")]
    {
        browser::send(request).await.map(|_| ())
    }
    #[cfg(not(feature = "hydrate"))]
    {
        Err(browser_only(&request.url))
    }
}

#[allow(clippy::cast_possible_truncation)]
fn now_secs() -> i64 {
    #[cfg(feature = "hydrate")]
    {
        (js_sys::Date::now() / 1000.0) as i64
    }
    #[cfg(not(feature = "hydrate"))]
    {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_or(0, |d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
    }
}

fn load_session() -> Option<Session> {
    #[cfg(feature = "hydrate")]
    {
        browser::load_session()
    }
    #[cfg(not(feature = "hydrate"))]
    {
        None
    }
}

fn store_session(session: &Session) -> Result<(), PlatformError> {
    #[cfg(feature = "hydrate")]
    {
        browser::store_session(session)
    }
    #[cfg(not(feature = "hydrate"))]
    {
        let _ = session;
        Err(PlatformError::Storage("no browser storage".to_owned()))
    }
}

fn clear_session() {
    #[cfg(feature = "hydrate")]
    browser::clear_session();
}

#[cfg(feature = "hydrate")]
mod browser {
    use gloo_net::http::{Request, Response};

    use super::super::error::PlatformError;
    use super::super::rest::{Method, RestRequest, status_failed_message};
    use super::super::session::{STORAGE_KEY, decode_stored};
    use super::super::types::Session;

    pub(super) async fn send(request: &RestRequest) -> Result<Response, PlatformError> {
        let mut builder = match request.method {
            Method::Get => Request::get(&request.url),
            Method::Post => Request::post(&request.url),
            Method::Delete => Request::delete(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        let prepared = match &request.body {
            Some(body) => builder.json(body),
            None => builder.build(),
        }
        .map_err(|e| PlatformError::Transport(e.to_string()))?;

        let response = prepared.send().await.map_err(|e| PlatformError::Transport(e.to_string()))?;
        if response.ok() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        log::debug!("platform call failed: {}", status_failed_message(status, &body));
        Err(PlatformError::Status { status, body })
    }

    fn storage() -> Result<web_sys::Storage, PlatformError> {
        web_sys::window()
            .ok_or_else(|| PlatformError::Storage("no browser window".to_owned()))?
            .local_storage()
            .map_err(|e| PlatformError::Storage(format!("{e:?}")))?
            .ok_or_else(|| PlatformError::Storage("localStorage disabled".to_owned()))
    }

    pub(super) fn load_session() -> Option<Session> {
        let raw = storage().ok()?.get_item(STORAGE_KEY).ok()??;
        decode_stored(&raw)
    }

    pub(super) fn store_session(session: &Session) -> Result<(), PlatformError> {
        let raw = serde_json::to_string(session).map_err(|e| PlatformError::Storage(e.to_string()))?;
        storage()?
            .set_item(STORAGE_KEY, &raw)
            .map_err(|e| PlatformError::Storage(format!("{e:?}")))
    }

    pub(super) fn clear_session() {
        if let Ok(storage) = storage() {
            let _ = storage.remove_item(STORAGE_KEY);
        }
    }
}

#[cfg(feature = "hydrate")]
mod channel {
    use futures::future::{Either, select};
    use futures::{Sink, SinkExt, StreamExt};
    use gloo_net::websocket::futures::WebSocket;
    use gloo_net::websocket::{Message, WebSocketError};
    use gloo_timers::future::{IntervalStream, TimeoutFuture};

    use super::super::error::PlatformError;
    use super::super::platform::{ChangeCallback, ChangeEvent, ChangeKind, ChannelSpec, SubscriptionGate};
    use super::super::realtime::{
        Backoff, HEARTBEAT_INTERVAL_MS, Inbound, PhoenixMessage, RefCounter, access_token_message, decode, encode,
        heartbeat_message, join_message, join_outcome, leave_message,
    };
    use super::SupabaseClient;

    enum Wake {
        Closed,
        Heartbeat,
        Frame(Option<Result<Message, WebSocketError>>),
    }

    /// How one socket connection ended.
    enum Exit {
        /// The subscription handle was closed or dropped.
        Closed,
        /// The socket or channel went away; worth another attempt.
        Lost(String),
    }

    /// Per-connection context shared with `connection`.
    struct Feed<'a> {
        client: &'a SupabaseClient,
        spec: &'a ChannelSpec,
        gate: &'a mut SubscriptionGate,
        on_change: &'a ChangeCallback,
        backoff: &'a mut Backoff,
    }

    impl Feed<'_> {
        fn deliver(&self, kind: ChangeKind) {
            if self.gate.is_open() {
                (self.on_change)(ChangeEvent { kind, table: self.spec.table.clone() });
            }
        }
    }

    /// Keep `spec`'s channel joined until the gate closes. Lost connections are
    /// re-joined after a backoff with a fresh token, followed by one `Resync`
    /// so the consumer catches up on missed events. When the backoff runs out
    /// the gate is marked lost and `FeedLost` is delivered.
    pub(super) async fn pump(
        client: SupabaseClient,
        url: String,
        spec: ChannelSpec,
        mut gate: SubscriptionGate,
        on_change: ChangeCallback,
    ) {
        let topic = spec.topic();
        let mut backoff = Backoff::default();
        let mut rejoin = false;

        loop {
            let token = client.channel_token().await;
            if !gate.is_open() {
                return;
            }
            let mut feed =
                Feed { client: &client, spec: &spec, gate: &mut gate, on_change: &on_change, backoff: &mut backoff };
            let exit = match WebSocket::open(&url) {
                Ok(socket) => connection(&mut feed, socket, token, rejoin).await,
                Err(e) => Exit::Lost(format!("socket open failed: {e}")),
            };
            let reason = match exit {
                Exit::Closed => return,
                Exit::Lost(reason) => reason,
            };

            let Some(delay) = backoff.next_delay() else {
                log::warn!("realtime channel {topic} gave up after {} attempts: {reason}", backoff.attempts());
                if gate.is_open() {
                    on_change(ChangeEvent { kind: ChangeKind::FeedLost, table: spec.table.clone() });
                }
                gate.mark_lost();
                return;
            };
            log::warn!("realtime channel {topic} lost ({reason}); retrying in {delay}ms");
            if let Either::Left(_) = select(gate.closed(), TimeoutFuture::new(delay)).await {
                return;
            }
            rejoin = true;
        }
    }

    async fn connection(feed: &mut Feed<'_>, socket: WebSocket, mut token: String, rejoin: bool) -> Exit {
        let topic = feed.spec.topic();
        let mut refs = RefCounter::default();
        let (mut write, mut read) = socket.split();

        let join_ref = refs.next_ref();
        if let Err(e) = send(&mut write, &join_message(feed.spec, &token, join_ref.clone())).await {
            return Exit::Lost(format!("join failed: {e}"));
        }
        let mut heartbeat = IntervalStream::new(HEARTBEAT_INTERVAL_MS);

        loop {
            let wake = match select(feed.gate.closed(), select(heartbeat.next(), read.next())).await {
                Either::Left(_) => Wake::Closed,
                Either::Right((Either::Left(_), _)) => Wake::Heartbeat,
                Either::Right((Either::Right((frame, _)), _)) => Wake::Frame(frame),
            };
            match wake {
                Wake::Closed => break,
                Wake::Heartbeat => {
                    if let Err(e) = send(&mut write, &heartbeat_message(refs.next_ref())).await {
                        return Exit::Lost(format!("heartbeat failed: {e}"));
                    }
                    let fresh = feed.client.channel_token().await;
                    if fresh != token {
                        let push = access_token_message(feed.spec, &fresh, refs.next_ref());
                        if let Err(e) = send(&mut write, &push).await {
                            return Exit::Lost(format!("token push failed: {e}"));
                        }
                        log::debug!("pushed refreshed token to {topic}");
                        token = fresh;
                    }
                }
                Wake::Frame(None) => return Exit::Lost("socket closed".to_owned()),
                Wake::Frame(Some(Err(e))) => return Exit::Lost(format!("socket error: {e}")),
                Wake::Frame(Some(Ok(Message::Text(text)))) => match decode(&text) {
                    Ok(inbound) => match join_outcome(&inbound, &topic, &join_ref) {
                        Some(true) => {
                            feed.backoff.reset();
                            if rejoin {
                                log::info!("realtime channel {topic} re-joined");
                                feed.deliver(ChangeKind::Resync);
                            }
                        }
                        Some(false) => return Exit::Lost("join refused".to_owned()),
                        None => match inbound {
                            Inbound::Change { topic: from, event } if from == topic => {
                                if feed.gate.is_open() {
                                    (feed.on_change)(event);
                                }
                            }
                            Inbound::Reply { ok: false, detail, .. } => {
                                log::warn!("realtime push rejected on {topic}: {detail}");
                            }
                            Inbound::ChannelDown { topic: from, reason } if from == topic => {
                                return Exit::Lost(format!("channel down: {reason}"));
                            }
                            _ => {}
                        },
                    },
                    Err(e) => log::debug!("skipping realtime frame: {e}"),
                },
                Wake::Frame(Some(Ok(Message::Bytes(_)))) => {}
            }
        }

        let _ = send(&mut write, &leave_message(feed.spec, refs.next_ref())).await;
        let _ = write.close().await;
        log::debug!("realtime channel {topic} closed");
        Exit::Closed
    }

    async fn send<S>(sink: &mut S, message: &PhoenixMessage) -> Result<(), PlatformError>
    where
        S: Sink<Message, Error = WebSocketError> + Unpin,
    {
        let text = encode(message)?;
        sink.send(Message::Text(text)).await.map_err(|e| PlatformError::Transport(e.to_string()))
    }
}
