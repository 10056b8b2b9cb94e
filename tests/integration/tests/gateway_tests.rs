//! Gateway client scenarios
//!
//! The client runs against the in-memory socket and HTTP fakes; time is driven
//! explicitly through `tick(now)`.
//!
//! Run with: cargo test -p integration-tests --test gateway_tests

use integration_tests::*;
use serde_json::json;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use wakebot_core::{HttpMethod, InteractionResponseType, MessageResponse, Snowflake, SocketEvent};
use wakebot_gateway::{ConnectionState, RateLimiter, RestError};

fn http() -> FakeHttp {
    FakeHttp::new()
        .route(HttpMethod::Get, "/gateway", 200, &gateway_body())
        .route(HttpMethod::Post, "/callback", 204, "")
}

fn endpoint(base: &str) -> String {
    format!("{base}{GATEWAY_QUERY}")
}

// ============================================================================
// Handshake
// ============================================================================

#[tokio::test]
async fn test_fresh_login_identifies() {
    let socket = FakeSocket::new();
    let http = http();
    let mut client = test_client(&socket, &http, true);

    connect_ready(&mut client, &socket, 1_000).await;

    assert_eq!(socket.opened(), vec![endpoint(GATEWAY_URL)]);
    assert_eq!(client.state(), ConnectionState::Connected);
    assert!(client.is_online());

    let identify = &socket.sent_with_op(2)[0];
    assert_eq!(identify["d"]["token"], TOKEN);
    assert_eq!(identify["d"]["intents"], 1);
    assert!(identify["d"]["properties"]["os"].is_string());

    assert_eq!(client.session().session_id(), Some(SESSION_ID));
    assert_eq!(client.session().resume_url(), Some(RESUME_URL));
    assert_eq!(client.application_id(), Some(Snowflake::new(APPLICATION_ID)));
    assert_eq!(client.handler().readies, vec![SESSION_ID]);
}

#[tokio::test]
async fn test_dropped_socket_resumes_on_next_login() {
    let socket = FakeSocket::new();
    let http = http();
    let mut client = test_client(&socket, &http, true);
    connect_ready(&mut client, &socket, 1_000).await;
    socket.push(&dispatch("TYPING_START", 5, json!({})));
    client.tick(1_100).await;

    socket.drop_connection();
    client.tick(1_200).await;

    assert!(!client.is_online());
    assert_eq!(client.state(), ConnectionState::Disconnected);
    assert!(client.session().gateway_url().is_none());
    assert!(client.session().resume_url().is_none());
    assert_eq!(client.session().session_id(), Some(SESSION_ID));

    let lookups = http.count("/gateway");
    assert!(client.login(1).await);
    assert_eq!(http.count("/gateway"), lookups + 1);
    socket.push(&hello(HEARTBEAT_INTERVAL));
    socket.push(&resumed(6));
    client.tick(1_300).await;

    assert_eq!(socket.opened()[1], endpoint(GATEWAY_URL));
    let resume = &socket.sent_with_op(6)[0];
    assert_eq!(resume["d"]["session_id"], SESSION_ID);
    assert_eq!(resume["d"]["seq"], 5);
    assert_eq!(resume["d"]["token"], TOKEN);
    assert_eq!(client.state(), ConnectionState::Connected);
    assert_eq!(client.handler().resumed, 1);
}

#[tokio::test]
async fn test_login_is_refused_while_attempt_in_flight() {
    let socket = FakeSocket::new();
    let http = http();
    let mut client = test_client(&socket, &http, true);

    assert!(client.login(1).await);
    client.tick(0).await;
    assert_eq!(client.state(), ConnectionState::AwaitingHello);

    assert!(!client.login(1).await);
    assert_eq!(socket.opened().len(), 1);
}

// ============================================================================
// Invalid session and reconnect
// ============================================================================

#[tokio::test]
async fn test_invalid_session_not_resumable_identifies_again() {
    let socket = FakeSocket::new();
    let http = http();
    let mut client = test_client(&socket, &http, true);
    connect_ready(&mut client, &socket, 1_000).await;
    let resolved = http.count("/gateway");

    socket.push(&invalid_session(false));
    client.tick(1_100).await;

    assert!(client.session().session_id().is_none());
    assert!(client.session().last_sequence().is_none());
    assert!(http.count("/gateway") > resolved);
    assert_eq!(socket.opened(), vec![endpoint(GATEWAY_URL), endpoint(GATEWAY_URL)]);

    socket.push(&hello(HEARTBEAT_INTERVAL));
    client.tick(1_200).await;

    assert_eq!(client.state(), ConnectionState::Identifying);
    assert_eq!(socket.sent_with_op(2).len(), 2);
    assert!(socket.sent_with_op(6).is_empty());
}

#[tokio::test]
async fn test_invalid_session_resumable_resumes() {
    let socket = FakeSocket::new();
    let http = http();
    let mut client = test_client(&socket, &http, true);
    connect_ready(&mut client, &socket, 1_000).await;

    socket.push(&invalid_session(true));
    client.tick(1_100).await;

    assert_eq!(client.session().session_id(), Some(SESSION_ID));
    assert_eq!(socket.opened()[1], endpoint(RESUME_URL));

    socket.push(&hello(HEARTBEAT_INTERVAL));
    client.tick(1_200).await;

    assert_eq!(client.state(), ConnectionState::Resuming);
    let resume = &socket.sent_with_op(6)[0];
    assert_eq!(resume["d"]["session_id"], SESSION_ID);
    assert_eq!(resume["d"]["seq"], 1);
}

#[tokio::test]
async fn test_reconnect_logs_out_and_logs_in() {
    let socket = FakeSocket::new();
    let http = http();
    let mut client = test_client(&socket, &http, true);
    connect_ready(&mut client, &socket, 1_000).await;

    socket.push(&reconnect());
    client.tick(1_100).await;

    assert_eq!(socket.closes(), 1);
    assert_eq!(socket.opened().len(), 2);
    assert!(client.session().session_id().is_none());
    assert_eq!(client.state(), ConnectionState::AwaitingHello);
}

#[tokio::test]
async fn test_session_timeout_close_code_forces_identify() {
    let socket = FakeSocket::new();
    let http = http();
    let mut client = test_client(&socket, &http, true);
    connect_ready(&mut client, &socket, 1_000).await;

    socket.drop_connection();
    socket.push_event(SocketEvent::Closed {
        code: Some(4009),
        reason: "Session timed out".to_string(),
    });
    client.tick(1_100).await;

    assert_eq!(client.state(), ConnectionState::Disconnected);
    assert!(client.session().session_id().is_none());

    client.login(1).await;
    assert_eq!(socket.opened()[1], endpoint(GATEWAY_URL));
}

// ============================================================================
// Heartbeat
// ============================================================================

#[tokio::test]
async fn test_first_heartbeat_is_jittered_within_interval() {
    let socket = FakeSocket::new();
    let http = http();
    let mut client = test_client(&socket, &http, true);

    client.login(1).await;
    socket.push(&hello(HEARTBEAT_INTERVAL));
    socket.push(&dispatch("GUILD_CREATE", 3, json!({"id": "1"})));
    client.tick(1_000).await;

    let due = client.heartbeat().next_due_at().unwrap();
    let fired_at_hello = !socket.sent_with_op(1).is_empty();
    assert!((1_000..1_000 + HEARTBEAT_INTERVAL).contains(&due) || fired_at_hello);

    if !fired_at_hello {
        client.tick(due - 1).await;
        assert!(socket.sent_with_op(1).is_empty());

        client.tick(due).await;
    }

    let beats = socket.sent_with_op(1);
    assert_eq!(beats.len(), 1);
    assert_eq!(beats[0]["d"], 3);
    assert!(http.count("/gateway") >= 2, "keepalive accompanies the heartbeat");
}

#[tokio::test]
async fn test_heartbeat_carries_null_before_any_dispatch() {
    let socket = FakeSocket::new();
    let http = http();
    let mut client = test_client(&socket, &http, true);

    client.login(1).await;
    socket.push(&hello(HEARTBEAT_INTERVAL));
    socket.push(&heartbeat_request());
    client.tick(1_000).await;

    let beats = socket.sent_with_op(1);
    assert_eq!(beats[0]["d"], serde_json::Value::Null);
}

#[tokio::test]
async fn test_unacknowledged_heartbeat_goes_offline() {
    let socket = FakeSocket::new();
    let http = http();
    let mut client = test_client(&socket, &http, true);
    connect_ready(&mut client, &socket, 1_000).await;

    socket.push(&heartbeat_ack());
    socket.push(&heartbeat_request());
    client.tick(2_000).await;
    assert_eq!(client.heartbeat().unacked_since(), Some(2_000));

    client.tick(2_000 + HEARTBEAT_INTERVAL).await;
    assert!(client.is_online());

    client.tick(2_001 + HEARTBEAT_INTERVAL).await;
    assert!(!client.is_online());
    assert_eq!(client.state(), ConnectionState::Disconnected);
    assert!(client.session().session_id().is_none());
    assert_eq!(socket.closes(), 1);
}

#[tokio::test]
async fn test_acknowledged_heartbeats_stay_online() {
    let socket = FakeSocket::new();
    let http = http();
    let mut client = test_client(&socket, &http, true);
    connect_ready(&mut client, &socket, 1_000).await;

    socket.push(&heartbeat_ack());
    socket.push(&heartbeat_request());
    client.tick(2_000).await;

    socket.push(&heartbeat_ack());
    client.tick(2_500).await;
    client.tick(2_001 + HEARTBEAT_INTERVAL).await;

    assert!(client.is_online());
    assert_eq!(client.state(), ConnectionState::Connected);
}

// ============================================================================
// Rate limiting
// ============================================================================

#[tokio::test]
async fn test_outbound_frames_are_capped_per_window() {
    let socket = FakeSocket::new();
    let http = http();
    let mut client = test_client(&socket, &http, true);

    client.login(1).await;
    socket.push(&hello(HEARTBEAT_INTERVAL));
    for _ in 0..125 {
        socket.push(&heartbeat_request());
    }
    client.tick(1_000).await;

    assert_eq!(socket.sent().len(), RateLimiter::CAPACITY as usize);
    assert_eq!(client.rate_limiter().sent_count(), RateLimiter::CAPACITY);

    // Still inside the window
    socket.push(&heartbeat_ack());
    socket.push(&heartbeat_request());
    client.tick(1_000 + RateLimiter::WINDOW_MS).await;
    assert_eq!(socket.sent().len(), RateLimiter::CAPACITY as usize);

    socket.push(&heartbeat_request());
    client.tick(1_001 + RateLimiter::WINDOW_MS).await;
    assert_eq!(socket.sent().len(), RateLimiter::CAPACITY as usize + 1);
    assert_eq!(client.rate_limiter().sent_count(), 1);
    assert_eq!(client.rate_limiter().window_start_at(), 1_001 + RateLimiter::WINDOW_MS);
}

#[tokio::test]
async fn test_disabled_rate_limit_sends_everything() {
    let socket = FakeSocket::new();
    let http = http();
    let mut client = test_client(&socket, &http, false);

    client.login(1).await;
    socket.push(&hello(HEARTBEAT_INTERVAL));
    for _ in 0..125 {
        socket.push(&heartbeat_request());
    }
    client.tick(1_000).await;

    assert_eq!(socket.sent().len(), 126);
}

// ============================================================================
// Events
// ============================================================================

#[tokio::test]
async fn test_own_messages_never_reach_the_handler() {
    let socket = FakeSocket::new();
    let http = http();
    let mut client = test_client(&socket, &http, true);
    connect_ready(&mut client, &socket, 1_000).await;

    socket.push(&message_create(2, APPLICATION_ID, "echo"));
    socket.push(&message_create(3, 77, "hello bot"));
    client.tick(1_100).await;

    let handler = client.handler();
    assert_eq!(handler.messages.len(), 1);
    assert_eq!(handler.messages[0]["content"], "hello bot");
    assert!(handler.dispatched.is_empty());
    assert_eq!(client.session().last_sequence(), Some(3));
}

#[tokio::test]
async fn test_other_dispatches_are_forwarded_once() {
    let socket = FakeSocket::new();
    let http = http();
    let mut client = test_client(&socket, &http, true);
    connect_ready(&mut client, &socket, 1_000).await;

    socket.push(&dispatch("GUILD_CREATE", 2, json!({"id": "1"})));
    socket.push(&dispatch("SOMETHING_NEW", 3, json!({})));
    socket.push_text(r#"{"op": 0, "t": "BROKEN""#);
    client.tick(1_100).await;

    assert_eq!(client.handler().dispatched, vec!["GUILD_CREATE", "SOMETHING_NEW"]);
    assert_eq!(client.state(), ConnectionState::Connected);
}

// ============================================================================
// Interactions
// ============================================================================

#[tokio::test]
async fn test_reply_targets_latest_interaction() {
    let socket = FakeSocket::new();
    let http = http();
    let mut client = test_client(&socket, &http, true);
    connect_ready(&mut client, &socket, 1_000).await;

    socket.push(&interaction_create(2, 100, "tok-a", "ping"));
    socket.push(&interaction_create(3, 200, "tok-b", "ping"));
    client.tick(1_100).await;

    assert_eq!(
        client.handler().interactions,
        vec![Snowflake::new(100), Snowflake::new(200)]
    );
    assert_eq!(client.responder().pending().unwrap().id, Snowflake::new(200));

    let (tx, rx) = oneshot::channel();
    client
        .responder_mut()
        .respond_with(
            InteractionResponseType::ChannelMessageWithSource,
            MessageResponse::text("pong"),
            move |result| {
                let _ = tx.send(result);
            },
        )
        .unwrap();
    assert_eq!(rx.await.unwrap(), Ok(None));

    let callbacks: Vec<_> = http
        .requests()
        .into_iter()
        .filter(|r| r.url.contains("/callback"))
        .collect();
    assert_eq!(callbacks.len(), 1);
    assert_eq!(
        callbacks[0].url,
        format!("{API_BASE}/interactions/200/tok-b/callback")
    );
    assert_eq!(callbacks[0].header("Authorization"), Some("Bot test-token"));
    let body: serde_json::Value = serde_json::from_str(callbacks[0].body.as_deref().unwrap()).unwrap();
    assert_eq!(body, json!({"type": 4, "data": {"content": "pong"}}));
}

#[tokio::test]
async fn test_handler_can_reply_from_the_interaction_callback() {
    let socket = FakeSocket::new();
    let http = http();
    let mut client = test_client(&socket, &http, true);
    client.handler_mut().auto_reply = Some("pong".to_string());
    connect_ready(&mut client, &socket, 1_000).await;

    socket.push(&interaction_create(2, 300, "tok-c", "ping"));
    client.tick(1_100).await;

    tokio::time::timeout(Duration::from_secs(2), async {
        while http.count("/interactions/300/tok-c/callback") == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();
}

// ============================================================================
// REST channel
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_replies_and_keepalive_never_overlap_on_the_transport() {
    let socket = FakeSocket::new();
    let http = http().with_delay(Duration::from_millis(20));
    let mut client = test_client(&socket, &http, true);
    connect_ready(&mut client, &socket, 1_000).await;

    socket.push(&interaction_create(2, 400, "tok-d", "ping"));
    client.tick(1_100).await;

    let (tx, mut rx) = mpsc::unbounded_channel();
    for i in 0..3 {
        let tx = tx.clone();
        client
            .responder_mut()
            .respond_with(
                InteractionResponseType::ChannelMessageWithSource,
                MessageResponse::text(format!("reply {i}")),
                move |result| {
                    let _ = tx.send(result);
                },
            )
            .unwrap();
    }
    drop(tx);

    socket.push(&heartbeat_ack());
    socket.push(&heartbeat_request());
    socket.push(&heartbeat_request());
    client.tick(1_200).await;

    let mut completed = 0;
    while let Some(result) = rx.recv().await {
        assert!(result.is_ok());
        completed += 1;
    }

    assert_eq!(completed, 3);
    assert_eq!(http.count("/callback"), 3);
    assert_eq!(http.overlaps(), 0);
}

#[tokio::test]
async fn test_unauthorized_gateway_lookup_is_not_retried() {
    let socket = FakeSocket::new();
    let http = FakeHttp::new().route(HttpMethod::Get, "/gateway", 401, r#"{"message":"401: Unauthorized"}"#);
    let mut client = test_client(&socket, &http, true);

    assert!(!client.login(1).await);
    assert_eq!(http.requests().len(), 1);
    assert_eq!(client.state(), ConnectionState::Disconnected);
    assert!(socket.opened().is_empty());

    client.tick(100).await;
    assert_eq!(http.requests().len(), 1);
}

#[tokio::test]
async fn test_unauthorized_reply_fails_without_retry() {
    let socket = FakeSocket::new();
    let http = FakeHttp::new()
        .route(HttpMethod::Get, "/gateway", 200, &gateway_body())
        .route(HttpMethod::Post, "/callback", 401, r#"{"message":"401: Unauthorized"}"#);
    let mut client = test_client(&socket, &http, true);
    connect_ready(&mut client, &socket, 1_000).await;

    socket.push(&interaction_create(2, 500, "tok-e", "ping"));
    client.tick(1_100).await;

    let (tx, rx) = oneshot::channel();
    client
        .responder_mut()
        .respond_with(
            InteractionResponseType::ChannelMessageWithSource,
            MessageResponse::text("pong"),
            move |result| {
                let _ = tx.send(result);
            },
        )
        .unwrap();

    assert_eq!(rx.await.unwrap(), Err(RestError::Unauthorized));
    assert_eq!(http.count("/callback"), 1);

    tokio::time::sleep(Duration::from_millis(50)).await;
    client.tick(1_200).await;
    assert_eq!(http.count("/callback"), 1);
}
