//! End-to-end HTTP tests against a server bound to an ephemeral port.

use curator_engine::CurationEngine;
use curator_gateway::{Gateway, GatewaySettings};
use curator_nullables::{NullClock, NullLedger, NullStore, NullVenue};
use curator_rpc::{serve, RpcState, TrackedCounter};
use curator_store::{CredentialStore, NewVote, VoteStore};
use curator_types::{
    ChatId, ContentRef, Credential, CurationParams, Timestamp, UserId, VoteState,
};
use prometheus::{IntCounter, Registry};
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tokio::sync::watch;

struct Running {
    base: String,
    state: Arc<RpcState>,
    store: Arc<NullStore>,
    _cancel: watch::Sender<bool>,
}

async fn start(with_metrics: bool) -> Running {
    let (cancel, cancel_rx) = watch::channel(false);
    let store = Arc::new(NullStore::new());
    let engine = Arc::new(CurationEngine::new(
        store.clone(),
        Arc::new(NullLedger::new()),
        Arc::new(NullVenue::new()),
        None,
        CurationParams {
            required_votes: 1,
            ..CurationParams::default()
        },
        cancel_rx,
    ));
    let gateway = Gateway::new(
        engine,
        GatewaySettings {
            bot_name: "curator_bot".into(),
            frontend_domains: vec!["golos.io".into()],
            developer: "@maintainer".into(),
        },
        Arc::new(NullClock::new(0)),
    )
    .unwrap();

    let registry = Registry::new();
    let events_received = IntCounter::new("curator_events_received_total", "events").unwrap();
    let events_failed = IntCounter::new("curator_events_failed_total", "failures").unwrap();
    registry.register(Box::new(events_received.clone())).unwrap();
    let state = Arc::new(RpcState {
        gateway: Arc::new(gateway),
        metrics_registry: with_metrics.then_some(registry),
        events_received,
        events_failed,
        approvals_dispatched: TrackedCounter::new(
            IntCounter::new("curator_approvals_dispatched_total", "approvals").unwrap(),
        ),
        started_at: Instant::now(),
    });

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(serve(listener, Arc::clone(&state)));
    Running {
        base,
        state,
        store,
        _cancel: cancel,
    }
}

#[tokio::test]
async fn event_returns_gateway_reply() {
    let server = start(true).await;
    let body = serde_json::json!({
        "chat_id": 1,
        "user_id": 1,
        "payload": {"type": "text", "text": "🐬 Delegate"}
    });

    let reply: serde_json::Value = reqwest::Client::new()
        .post(format!("{}/events", server.base))
        .json(&body)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let messages = reply["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["chat_id"], 1);
    assert!(messages[0]["text"].as_str().unwrap().contains("golosovalochka"));
    assert_eq!(server.state.events_received.get(), 1);
}

#[tokio::test]
async fn malformed_event_is_rejected() {
    let server = start(true).await;
    let response = reqwest::Client::new()
        .post(format!("{}/events", server.base))
        .header("content-type", "application/json")
        .body("{\"chat_id\": 1}")
        .send()
        .await
        .unwrap();
    assert!(response.status().is_client_error());
    assert_eq!(server.state.events_received.get(), 0);
}

#[tokio::test]
async fn health_and_metrics() {
    let server = start(true).await;
    let health: serde_json::Value = reqwest::get(format!("{}/health", server.base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "ok");

    let metrics = reqwest::get(format!("{}/metrics", server.base))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(metrics.contains("curator_events_received_total"));
}

#[tokio::test]
async fn metrics_disabled_is_not_found() {
    let server = start(false).await;
    let response = reqwest::get(format!("{}/metrics", server.base)).await.unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn accepted_verdict_counts_dispatched_approvals() {
    let server = start(true).await;
    let mut curator = Credential::activated(UserId::new(1), ChatId::new(1), "alice");
    curator.curator = true;
    server.store.put_credential(&curator).unwrap();
    server
        .store
        .put_credential(&Credential::activated(UserId::new(9), ChatId::new(9), "bob"))
        .unwrap();
    let vote = server
        .store
        .insert_vote(&NewVote {
            content: ContentRef::new("bob", "post").unwrap(),
            submitter: UserId::new(9),
            submitted_at: Timestamp::new(0),
            percent: 100,
        })
        .unwrap();
    let body = serde_json::json!({
        "chat_id": 1,
        "user_id": 1,
        "payload": {"type": "callback", "id": "cb1", "data": format!("{}_good", vote.id)}
    });

    let response = reqwest::Client::new()
        .post(format!("{}/events", server.base))
        .json(&body)
        .send()
        .await
        .unwrap();

    assert!(response.status().is_success());
    assert_eq!(server.store.get_vote(vote.id).unwrap().state, VoteState::Completed);
    // Both active credentials approved the post.
    assert_eq!(server.state.approvals_dispatched.get(), 2);
}
