//! Realtime channel codec (Phoenix JSON serializer, protocol `vsn=1.0.0`).
//!
//! SYSTEM CONTEXT
//! ==============
//! The platform pushes row changes over a websocket multiplexing Phoenix
//! channels. This module only builds and parses frames; the socket pump
//! lives in `supabase.rs`.
//!
//! Frames look like `{"topic", "event", "payload", "ref"}`. A channel is
//! joined with `phx_join`, kept alive with `heartbeat` on topic `phoenix`,
//! and left with `phx_leave`. A refreshed JWT is pushed to a joined channel
//! with an `access_token` frame.
//!
//! RECONNECT
//! =========
//! A dropped socket or a channel the server closes is re-joined after an
//! exponential `Backoff`. A join acknowledgement resets the backoff; running
//! out of attempts ends the feed.

#[cfg(test)]
#[path = "realtime_test.rs"]
mod tests;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::PlatformError;
use super::platform::{ChangeEvent, ChangeKind, ChannelSpec};

pub const HEARTBEAT_INTERVAL_MS: u32 = 25_000;
pub const RECONNECT_BASE_MS: u32 = 1_000;
pub const RECONNECT_MAX_MS: u32 = 30_000;
pub const RECONNECT_MAX_ATTEMPTS: u32 = 10;
const PROTOCOL_VSN: &str = "1.0.0";
const PHOENIX_TOPIC: &str = "phoenix";

/// One Phoenix frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PhoenixMessage {
    pub topic: String,
    pub event: String,
    #[serde(default)]
    pub payload: Value,
    #[serde(rename = "ref", default)]
    pub reference: Option<String>,
}

/// Decoded inbound frame, reduced to what the channel pump acts on.
#[derive(Clone, Debug, PartialEq)]
pub enum Inbound {
    /// A row change on a joined channel.
    Change { topic: String, event: ChangeEvent },
    /// Reply to one of our pushes, matched by `reference`.
    Reply { topic: String, reference: Option<String>, ok: bool, detail: Value },
    /// The server reported a channel error or closed the channel.
    ChannelDown { topic: String, reason: String },
    /// Anything else (presence, system notices).
    Ignored,
}

/// Monotonic `ref` generator for outbound pushes.
#[derive(Debug, Default)]
pub struct RefCounter(u64);

impl RefCounter {
    pub fn next_ref(&mut self) -> String {
        self.0 += 1;
        self.0.to_string()
    }
}

/// Exponential delay between re-join attempts, capped at `max_ms`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Backoff {
    base_ms: u32,
    max_ms: u32,
    max_attempts: u32,
    attempts: u32,
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(RECONNECT_BASE_MS, RECONNECT_MAX_MS, RECONNECT_MAX_ATTEMPTS)
    }
}

impl Backoff {
    #[must_use]
    pub fn new(base_ms: u32, max_ms: u32, max_attempts: u32) -> Self {
        Self { base_ms, max_ms, max_attempts, attempts: 0 }
    }

    /// Delay before the next attempt, or `None` once attempts are used up.
    pub fn next_delay(&mut self) -> Option<u32> {
        if self.attempts >= self.max_attempts {
            return None;
        }
        let factor = 1_u32.checked_shl(self.attempts).unwrap_or(u32::MAX);
        self.attempts += 1;
        Some(self.base_ms.saturating_mul(factor).min(self.max_ms))
    }

    /// Forget past failures after a successful join.
    pub fn reset(&mut self) {
        self.attempts = 0;
    }

    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}

/// Websocket endpoint for the project at `base_url`.
///
/// # Errors
///
/// Returns `PlatformError::Config` when `base_url` is not an http(s) URL.
pub fn socket_url(base_url: &str, anon_key: &str) -> Result<String, PlatformError> {
    let base = base_url.trim_end_matches('/');
    let host = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        return Err(PlatformError::Config(format!("unsupported platform url: {base_url}")));
    };
    Ok(format!(
        "{host}/realtime/v1/websocket?apikey={}&vsn={PROTOCOL_VSN}",
        urlencoding::encode(anon_key)
    ))
}

/// `phx_join` for a `postgres_changes` listener described by `spec`.
#[must_use]
pub fn join_message(spec: &ChannelSpec, access_token: &str, reference: String) -> PhoenixMessage {
    PhoenixMessage {
        topic: spec.topic(),
        event: "phx_join".to_owned(),
        payload: serde_json::json!({
            "config": {
                "broadcast": { "ack": false, "self": false },
                "presence": { "key": "" },
                "postgres_changes": [{
                    "event": spec.event,
                    "schema": spec.schema,
                    "table": spec.table,
                }],
                "private": false,
            },
            "access_token": access_token,
        }),
        reference: Some(reference),
    }
}

#[must_use]
pub fn heartbeat_message(reference: String) -> PhoenixMessage {
    PhoenixMessage {
        topic: PHOENIX_TOPIC.to_owned(),
        event: "heartbeat".to_owned(),
        payload: serde_json::json!({}),
        reference: Some(reference),
    }
}

#[must_use]
pub fn leave_message(spec: &ChannelSpec, reference: String) -> PhoenixMessage {
    PhoenixMessage {
        topic: spec.topic(),
        event: "phx_leave".to_owned(),
        payload: serde_json::json!({}),
        reference: Some(reference),
    }
}

/// Hand a refreshed JWT to an already joined channel.
#[must_use]
pub fn access_token_message(spec: &ChannelSpec, access_token: &str, reference: String) -> PhoenixMessage {
    PhoenixMessage {
        topic: spec.topic(),
        event: "access_token".to_owned(),
        payload: serde_json::json!({ "access_token": access_token }),
        reference: Some(reference),
    }
}

/// Whether `inbound` answers the join pushed with `join_ref` on `topic`:
/// `Some(true)` joined, `Some(false)` refused, `None` unrelated.
#[must_use]
pub fn join_outcome(inbound: &Inbound, topic: &str, join_ref: &str) -> Option<bool> {
    match inbound {
        Inbound::Reply { topic: from, reference: Some(reference), ok, .. } if from == topic && reference == join_ref => {
            Some(*ok)
        }
        _ => None,
    }
}

/// Serialize a frame for the socket.
///
/// # Errors
///
/// Returns `PlatformError::Decode` if serialization fails.
pub fn encode(message: &PhoenixMessage) -> Result<String, PlatformError> {
    serde_json::to_string(message).map_err(|e| PlatformError::Decode(e.to_string()))
}

/// Parse a text frame from the socket.
///
/// # Errors
///
/// Returns `PlatformError::Decode` if the frame is not a Phoenix message.
pub fn decode(raw: &str) -> Result<Inbound, PlatformError> {
    let message: PhoenixMessage = serde_json::from_str(raw).map_err(|e| PlatformError::Decode(e.to_string()))?;
    Ok(classify(message))
}

fn classify(message: PhoenixMessage) -> Inbound {
    match message.event.as_str() {
        "postgres_changes" => {
            let data = message.payload.get("data").unwrap_or(&message.payload);
            let kind = data
                .get("type")
                .or_else(|| data.get("eventType"))
                .and_then(Value::as_str)
                .map_or(ChangeKind::Other, ChangeKind::from_wire);
            let table = data.get("table").and_then(Value::as_str).unwrap_or_default().to_owned();
            Inbound::Change { topic: message.topic, event: ChangeEvent { kind, table } }
        }
        "phx_reply" => {
            let ok = message.payload.get("status").and_then(Value::as_str) == Some("ok");
            let detail = message.payload.get("response").cloned().unwrap_or(Value::Null);
            Inbound::Reply { topic: message.topic, reference: message.reference, ok, detail }
        }
        "phx_error" | "phx_close" => {
            let reason = message
                .payload
                .get("reason")
                .and_then(Value::as_str)
                .unwrap_or(message.event.as_str())
                .to_owned();
            Inbound::ChannelDown { topic: message.topic, reason }
        }
        _ => Inbound::Ignored,
    }
}
