//! End-to-end client flow against an in-process mock backend.
//!
//! The mock implements the three endpoints with one-time consumption: a
//! fetched or deleted secret is gone, and a second access answers 410.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::json;
use tokio_util::sync::CancellationToken;

use common::StashError;
use stash_client::crypto::envelope;
use stash_client::{payload, token, RetryPolicy, StashApi};

#[derive(Clone, Default)]
struct MockState {
    stashes: Arc<Mutex<HashMap<String, String>>>,
    consumed: Arc<Mutex<HashSet<String>>>,
}

async fn enstash(State(state): State<MockState>, body: String) -> (StatusCode, Json<serde_json::Value>) {
    let id = uuid::Uuid::new_v4().to_string();
    state.stashes.lock().unwrap().insert(id.clone(), body);
    (StatusCode::OK, Json(json!({ "id": id })))
}

async fn destash(
    State(state): State<MockState>,
    Path(id): Path<String>,
) -> (StatusCode, String) {
    let stored = state.stashes.lock().unwrap().remove(&id);
    match stored {
        Some(wire) => {
            state.consumed.lock().unwrap().insert(id);
            (StatusCode::OK, wire)
        }
        None if state.consumed.lock().unwrap().contains(&id) => (
            StatusCode::GONE,
            json!({ "error": "Expired" }).to_string(),
        ),
        None => (
            StatusCode::NOT_FOUND,
            json!({ "error": "Not Found" }).to_string(),
        ),
    }
}

async fn unstash(
    State(state): State<MockState>,
    Path(id): Path<String>,
) -> (StatusCode, String) {
    let stored = state.stashes.lock().unwrap().remove(&id);
    match stored {
        Some(_) => {
            state.consumed.lock().unwrap().insert(id.clone());
            (StatusCode::OK, json!({ "id": id }).to_string())
        }
        None if state.consumed.lock().unwrap().contains(&id) => (
            StatusCode::GONE,
            json!({ "error": "Expired" }).to_string(),
        ),
        None => (
            StatusCode::NOT_FOUND,
            json!({ "error": "Not Found" }).to_string(),
        ),
    }
}

async fn serve_mock() -> (String, MockState) {
    let state = MockState::default();
    let router = Router::new()
        .route("/enstash", post(enstash))
        .route("/destash/:id", get(destash))
        .route("/unstash/:id", delete(unstash))
        .with_state(state.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    (format!("http://{addr}"), state)
}

fn api(base_url: &str) -> StashApi {
    StashApi::new(
        base_url,
        RetryPolicy {
            max_retries: 1,
            base_delay: std::time::Duration::from_millis(1),
        },
    )
    .unwrap()
}

#[tokio::test]
async fn store_fetch_decrypt_round_trip() {
    let (url, _state) = serve_mock().await;
    let api = api(&url);
    let cancel = CancellationToken::new();

    // Sender side: encrypt and store, keep only the token.
    let env = envelope::encrypt(b"hello world").unwrap();
    let wire = payload::from_envelope(&env);
    let id = api.enstash(&wire, &cancel).await.unwrap();
    let shared = token::format(&id, &env.key);

    // Receiver side: everything flows from the token alone.
    let parsed = token::parse(&shared).unwrap();
    let fetched = api.destash(&parsed.id, &cancel).await.unwrap();
    let plaintext = envelope::decrypt(&fetched, parsed.key.as_bytes()).unwrap();
    assert_eq!(&plaintext[..], b"hello world");
}

#[tokio::test]
async fn second_fetch_reports_expired() {
    let (url, _state) = serve_mock().await;
    let api = api(&url);
    let cancel = CancellationToken::new();

    let env = envelope::encrypt(b"once only").unwrap();
    let id = api
        .enstash(&payload::from_envelope(&env), &cancel)
        .await
        .unwrap();

    api.destash(&id, &cancel).await.unwrap();
    let err = api.destash(&id, &cancel).await.unwrap_err();
    assert!(matches!(err, StashError::Expired(_)), "got: {err}");
}

#[tokio::test]
async fn unknown_id_reports_not_found() {
    let (url, _state) = serve_mock().await;
    let api = api(&url);
    let cancel = CancellationToken::new();

    let err = api
        .destash("7f6c3a52-9f0e-4b8a-9cb1-2f1e5a6d7b8c", &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, StashError::NotFound), "got: {err}");
}

#[tokio::test]
async fn unstash_deletes_without_revealing() {
    let (url, state) = serve_mock().await;
    let api = api(&url);
    let cancel = CancellationToken::new();

    let env = envelope::encrypt(b"delete me").unwrap();
    let id = api
        .enstash(&payload::from_envelope(&env), &cancel)
        .await
        .unwrap();

    let echoed = api.unstash(&id, &cancel).await.unwrap();
    assert_eq!(echoed, id);
    assert!(state.stashes.lock().unwrap().is_empty());

    // A second delete finds the slot consumed.
    let err = api.unstash(&id, &cancel).await.unwrap_err();
    assert!(matches!(err, StashError::Expired(_)), "got: {err}");
}

#[tokio::test]
async fn wrong_key_fails_closed_after_fetch() {
    let (url, _state) = serve_mock().await;
    let api = api(&url);
    let cancel = CancellationToken::new();

    let env = envelope::encrypt(b"sealed").unwrap();
    let id = api
        .enstash(&payload::from_envelope(&env), &cancel)
        .await
        .unwrap();

    let fetched = api.destash(&id, &cancel).await.unwrap();
    let other = envelope::SecretKey::generate().unwrap();
    let err = envelope::decrypt(&fetched, other.as_bytes()).unwrap_err();
    assert_eq!(err, envelope::CipherError::AuthenticationFailed);
}

#[tokio::test]
async fn malformed_store_response_is_a_validation_error() {
    let router = Router::new().route(
        "/enstash",
        post(|| async { (StatusCode::OK, Json(json!({ "id": "not-a-uuid" }))) }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    let api = api(&format!("http://{addr}"));
    let cancel = CancellationToken::new();
    let env = envelope::encrypt(b"x").unwrap();
    let err = api
        .enstash(&payload::from_envelope(&env), &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, StashError::Validation(_)), "got: {err}");
}
