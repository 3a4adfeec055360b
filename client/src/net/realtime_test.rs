use super::*;

fn spec() -> ChannelSpec {
    ChannelSpec::all_events("bookmarks-channel", "bookmarks")
}

// =============================================================
// socket_url
// =============================================================

#[test]
fn socket_url_upgrades_https_to_wss() {
    assert_eq!(
        socket_url("https://proj.supabase.co/", "k").unwrap(),
        "wss://proj.supabase.co/realtime/v1/websocket?apikey=k&vsn=1.0.0"
    );
}

#[test]
fn socket_url_upgrades_http_to_ws() {
    assert_eq!(
        socket_url("http://127.0.0.1:54321", "k").unwrap(),
        "ws://127.0.0.1:54321/realtime/v1/websocket?apikey=k&vsn=1.0.0"
    );
}

#[test]
fn socket_url_rejects_other_schemes() {
    assert!(matches!(socket_url("ftp://x", "k"), Err(PlatformError::Config(_))));
}

// =============================================================
// outbound frames
// =============================================================

#[test]
fn join_message_listens_to_table_changes() {
    let msg = join_message(&spec(), "tok", "1".to_owned());
    assert_eq!(msg.topic, "realtime:bookmarks-channel");
    assert_eq!(msg.event, "phx_join");
    assert_eq!(msg.reference.as_deref(), Some("1"));
    assert_eq!(msg.payload["access_token"], "tok");
    assert_eq!(
        msg.payload["config"]["postgres_changes"],
        serde_json::json!([{ "event": "*", "schema": "public", "table": "bookmarks" }])
    );
}

#[test]
fn heartbeat_targets_phoenix_topic() {
    let raw = encode(&heartbeat_message("7".to_owned())).unwrap();
    let value: Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value, serde_json::json!({ "topic": "phoenix", "event": "heartbeat", "payload": {}, "ref": "7" }));
}

#[test]
fn leave_message_uses_channel_topic() {
    let msg = leave_message(&spec(), "9".to_owned());
    assert_eq!(msg.topic, "realtime:bookmarks-channel");
    assert_eq!(msg.event, "phx_leave");
}

#[test]
fn ref_counter_is_monotonic() {
    let mut refs = RefCounter::default();
    assert_eq!(refs.next_ref(), "1");
    assert_eq!(refs.next_ref(), "2");
}

// =============================================================
// inbound frames
// =============================================================

#[test]
fn decode_postgres_change() {
    let raw = r#"{"topic":"realtime:bookmarks-channel","event":"postgres_changes","payload":{"ids":[1],"data":{"type":"INSERT","schema":"public","table":"bookmarks","record":{"id":"b1"}}},"ref":null}"#;
    assert_eq!(
        decode(raw).unwrap(),
        Inbound::Change {
            topic: "realtime:bookmarks-channel".to_owned(),
            event: ChangeEvent { kind: ChangeKind::Insert, table: "bookmarks".to_owned() },
        }
    );
}

#[test]
fn decode_change_without_type_is_other() {
    let raw = r#"{"topic":"realtime:c","event":"postgres_changes","payload":{"data":{}},"ref":null}"#;
    let Inbound::Change { event, .. } = decode(raw).unwrap() else {
        panic!("expected change");
    };
    assert_eq!(event.kind, ChangeKind::Other);
    assert_eq!(event.table, "");
}

#[test]
fn decode_join_reply_ok() {
    let raw = r#"{"topic":"realtime:c","event":"phx_reply","payload":{"status":"ok","response":{"postgres_changes":[]}},"ref":"1"}"#;
    let Inbound::Reply { ok, reference, .. } = decode(raw).unwrap() else {
        panic!("expected reply");
    };
    assert!(ok);
    assert_eq!(reference.as_deref(), Some("1"));
}

#[test]
fn decode_join_reply_error() {
    let raw = r#"{"topic":"realtime:c","event":"phx_reply","payload":{"status":"error","response":{"reason":"unauthorized"}},"ref":"1"}"#;
    let Inbound::Reply { ok, detail, .. } = decode(raw).unwrap() else {
        panic!("expected reply");
    };
    assert!(!ok);
    assert_eq!(detail["reason"], "unauthorized");
}

#[test]
fn decode_channel_error() {
    let raw = r#"{"topic":"realtime:c","event":"phx_error","payload":{},"ref":null}"#;
    assert_eq!(
        decode(raw).unwrap(),
        Inbound::ChannelDown { topic: "realtime:c".to_owned(), reason: "phx_error".to_owned() }
    );
}

#[test]
fn decode_presence_is_ignored() {
    let raw = r#"{"topic":"realtime:c","event":"presence_state","payload":{},"ref":null}"#;
    assert_eq!(decode(raw).unwrap(), Inbound::Ignored);
}

#[test]
fn decode_garbage_fails() {
    assert!(matches!(decode("not json"), Err(PlatformError::Decode(_))));
}

// =============================================================
// token push and join acknowledgement
// =============================================================

#[test]
fn access_token_message_targets_channel() {
    let msg = access_token_message(&spec(), "fresh-jwt", "7".to_owned());
    assert_eq!(msg.topic, "realtime:bookmarks-channel");
    assert_eq!(msg.event, "access_token");
    assert_eq!(msg.payload["access_token"], "fresh-jwt");
    assert_eq!(msg.reference.as_deref(), Some("7"));
}

#[test]
fn join_outcome_matches_reference_and_topic() {
    let ok = decode(r#"{"topic":"realtime:c","event":"phx_reply","payload":{"status":"ok"},"ref":"3"}"#).unwrap();
    let refused =
        decode(r#"{"topic":"realtime:c","event":"phx_reply","payload":{"status":"error"},"ref":"3"}"#).unwrap();

    assert_eq!(join_outcome(&ok, "realtime:c", "3"), Some(true));
    assert_eq!(join_outcome(&refused, "realtime:c", "3"), Some(false));
    assert_eq!(join_outcome(&ok, "realtime:c", "4"), None);
    assert_eq!(join_outcome(&ok, "realtime:other", "3"), None);
    assert_eq!(join_outcome(&Inbound::Ignored, "realtime:c", "3"), None);
}

// =============================================================
// Backoff
// =============================================================

#[test]
fn backoff_doubles_up_to_cap() {
    let mut backoff = Backoff::new(1_000, 5_000, 6);
    let delays: Vec<u32> = std::iter::from_fn(|| backoff.next_delay()).collect();
    assert_eq!(delays, vec![1_000, 2_000, 4_000, 5_000, 5_000, 5_000]);
}

#[test]
fn backoff_gives_up_after_max_attempts() {
    let mut backoff = Backoff::new(10, 100, 2);
    assert_eq!(backoff.next_delay(), Some(10));
    assert_eq!(backoff.next_delay(), Some(20));
    assert_eq!(backoff.next_delay(), None);
    assert_eq!(backoff.attempts(), 2);
}

#[test]
fn backoff_reset_starts_over() {
    let mut backoff = Backoff::new(10, 100, 3);
    backoff.next_delay();
    backoff.next_delay();
    backoff.reset();
    assert_eq!(backoff.attempts(), 0);
    assert_eq!(backoff.next_delay(), Some(10));
}

#[test]
fn backoff_survives_large_attempt_counts() {
    let mut backoff = Backoff::new(RECONNECT_BASE_MS, RECONNECT_MAX_MS, 64);
    let last = std::iter::from_fn(|| backoff.next_delay()).last();
    assert_eq!(last, Some(RECONNECT_MAX_MS));
}

#[test]
fn default_backoff_is_bounded() {
    let mut backoff = Backoff::default();
    let delays: Vec<u32> = std::iter::from_fn(|| backoff.next_delay()).collect();
    assert_eq!(delays.len(), RECONNECT_MAX_ATTEMPTS as usize);
    assert!(delays.iter().all(|d| *d <= RECONNECT_MAX_MS));
}
