//! HTTP API tests over an in-process test server.

mod common;

use axum_test::TestServer;
use common::mocks::{FailingStore, FakeEmbedder, MockLLMClient};
use grail::api::routes::create_router;
use grail::pipeline::Pipeline;
use grail::vectorstore::memory::InMemoryVectorStore;
use grail::vectorstore::VectorStore;
use grail::AppState;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

const KEYWORDS: &[&str] = &["raft", "consensus"];

fn test_server_with_shutdown(
    store: Arc<dyn VectorStore>,
    llm_response: &str,
    shutdown: CancellationToken,
) -> TestServer {
    let pipeline = Pipeline::new(
        common::test_config(),
        Arc::new(FakeEmbedder::new(KEYWORDS)),
        store,
        Arc::new(MockLLMClient::new(llm_response)),
        None,
    );
    let state = AppState {
        pipeline: Arc::new(pipeline),
        shutdown,
    };

    let app = create_router().with_state(state);
    TestServer::new(app).expect("Failed to create test server")
}

fn test_server(store: Arc<dyn VectorStore>, llm_response: &str) -> TestServer {
    test_server_with_shutdown(store, llm_response, CancellationToken::new())
}

#[tokio::test]
async fn test_health_reports_store_and_count() {
    let server = test_server(Arc::new(InMemoryVectorStore::new()), "unused");

    let response = server.get("/health").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["store"], "in-memory");
    assert_eq!(body["indexed_chunks"], 0);
}

#[tokio::test]
async fn test_ingest_then_ask_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("raft.txt"),
        "Raft is a consensus algorithm with leader election.",
    )
    .unwrap();

    let server = test_server(
        Arc::new(InMemoryVectorStore::new()),
        "Raft reaches consensus by electing a leader [1].",
    );

    let response = server
        .post("/ingest")
        .json(&json!({ "path": dir.path() }))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["succeeded"].as_array().unwrap().len(), 1);
    assert_eq!(body["failed"].as_array().unwrap().len(), 0);

    let response = server
        .post("/ask")
        .json(&json!({ "query": "How does raft work?" }))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert!(body["text"].as_str().unwrap().contains("[1]"));
    let citations = body["citations"].as_array().unwrap();
    assert_eq!(citations.len(), 1);
    assert_eq!(citations[0]["marker"], 1);
    assert_eq!(citations[0]["source"], "raft.txt");
}

#[tokio::test]
async fn test_search_returns_retrieved_and_ranked() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("raft.txt"),
        "Raft is a consensus algorithm with leader election.",
    )
    .unwrap();
    std::fs::write(dir.path().join("other.txt"), "Unrelated notes about nothing.").unwrap();

    let server = test_server(Arc::new(InMemoryVectorStore::new()), "unused");
    server
        .post("/ingest")
        .json(&json!({ "path": dir.path() }))
        .await
        .assert_status_ok();

    let response = server
        .post("/search")
        .json(&json!({ "query": "raft consensus", "top_n": 1 }))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    let retrieved = body["retrieved"].as_array().unwrap();
    let ranked = body["ranked"].as_array().unwrap();

    // Raw candidates are the full top-k, the ranked list is cut to top-n.
    assert_eq!(retrieved.len(), 2);
    assert_eq!(ranked.len(), 1);
    assert!(retrieved[0]["score"].as_f64().unwrap() >= retrieved[1]["score"].as_f64().unwrap());
    assert_eq!(ranked[0]["metadata"]["document_id"], "raft.txt");
}

#[tokio::test]
async fn test_search_empty_index_returns_empty_lists() {
    let server = test_server(Arc::new(InMemoryVectorStore::new()), "unused");

    let response = server
        .post("/search")
        .json(&json!({ "query": "anything" }))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["retrieved"].as_array().unwrap().len(), 0);
    assert_eq!(body["ranked"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_ask_debug_echoes_candidate_lists() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("raft.txt"),
        "Raft is a consensus algorithm with leader election.",
    )
    .unwrap();

    let server = test_server(
        Arc::new(InMemoryVectorStore::new()),
        "Raft elects a leader [1].",
    );
    server
        .post("/ingest")
        .json(&json!({ "path": dir.path() }))
        .await
        .assert_status_ok();

    let response = server
        .post("/ask")
        .json(&json!({ "query": "raft", "debug": true }))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert!(body["text"].as_str().unwrap().contains("[1]"));
    assert_eq!(body["debug"]["retrieved"].as_array().unwrap().len(), 1);
    assert_eq!(body["debug"]["ranked"].as_array().unwrap().len(), 1);

    // Without the flag, the candidate lists are omitted entirely.
    let response = server.post("/ask").json(&json!({ "query": "raft" })).await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert!(body.get("debug").is_none());
}

#[tokio::test]
async fn test_shutdown_token_cancels_requests() {
    let shutdown = CancellationToken::new();
    shutdown.cancel();
    let server = test_server_with_shutdown(
        Arc::new(InMemoryVectorStore::new()),
        "unused",
        shutdown,
    );

    let response = server.post("/ask").json(&json!({ "query": "raft" })).await;
    assert_eq!(response.status_code(), 500);

    let body: Value = response.json();
    assert_eq!(body["stage"], "cancelled");
}

#[tokio::test]
async fn test_ask_empty_query_is_400() {
    let server = test_server(Arc::new(InMemoryVectorStore::new()), "unused");

    let response = server.post("/ask").json(&json!({ "query": "" })).await;
    response.assert_status_bad_request();

    let body: Value = response.json();
    assert_eq!(body["stage"], "validation");
}

#[tokio::test]
async fn test_ask_unreachable_index_is_502_with_stage() {
    let server = test_server(Arc::new(FailingStore), "unused");

    let response = server
        .post("/ask")
        .json(&json!({ "query": "anything" }))
        .await;
    assert_eq!(response.status_code(), 502);

    let body: Value = response.json();
    assert_eq!(body["stage"], "retrieval");
    assert!(body["error"].as_str().unwrap().contains("unreachable"));
}

#[tokio::test]
async fn test_ingest_missing_directory_is_400() {
    let server = test_server(Arc::new(InMemoryVectorStore::new()), "unused");

    let response = server
        .post("/ingest")
        .json(&json!({ "path": "/does/not/exist" }))
        .await;
    response.assert_status_bad_request();

    let body: Value = response.json();
    assert_eq!(body["stage"], "validation");
}
