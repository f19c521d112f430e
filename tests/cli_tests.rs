//! CLI integration tests.
//!
//! Drives the compiled binary end to end and asserts on exit codes and
//! stderr: 0 for success, 2 when some documents failed but others were
//! indexed, 1 for total failure, with the failing stage named.

use serde_json::json;
use std::path::Path;
use std::process::{Command, Output};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

/// Responds to an OpenAI-style `/embeddings` call with one fixed
/// two-dimensional vector per input.
struct EchoEmbeddings;

impl Respond for EchoEmbeddings {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap_or_default();
        let inputs = body["input"].as_array().map(|a| a.len()).unwrap_or(0);
        let data: Vec<_> = (0..inputs)
            .map(|i| json!({ "index": i, "embedding": [1.0, 0.5] }))
            .collect();
        ResponseTemplate::new(200).set_body_json(json!({ "data": data }))
    }
}

async fn embedding_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(EchoEmbeddings)
        .mount(&server)
        .await;
    server
}

/// Run the grail binary with a clean, explicit environment.
fn run_grail(args: &[&str], dir: &Path, envs: &[(&str, &str)]) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_grail"));
    cmd.args(args)
        .arg("--no-color")
        .current_dir(dir)
        .env_remove("VECTOR_INDEX_URL")
        .env_remove("RERANK_ENDPOINT")
        .env("EMBEDDING_DIMENSIONS", "2");

    for (key, value) in envs {
        cmd.env(key, value);
    }

    cmd.output().expect("Failed to execute grail binary")
}

#[tokio::test(flavor = "multi_thread")]
async fn test_ingest_success_exits_zero() {
    let server = embedding_server().await;
    let endpoint = format!("{}/embeddings", server.uri());

    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.txt"), "first document text").unwrap();
    std::fs::write(dir.path().join("b.txt"), "second document text").unwrap();

    let output = run_grail(
        &["ingest", dir.path().to_str().unwrap()],
        dir.path(),
        &[("EMBEDDING_ENDPOINT", endpoint.as_str())],
    );

    assert_eq!(output.status.code(), Some(0), "output: {:?}", output);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_ingest_partial_failure_exits_two() {
    let server = embedding_server().await;
    let endpoint = format!("{}/embeddings", server.uri());

    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("good.txt"), "readable document text").unwrap();
    std::fs::write(dir.path().join("bad.bin"), b"\x00\x01\x02").unwrap();

    let output = run_grail(
        &["ingest", dir.path().to_str().unwrap()],
        dir.path(),
        &[("EMBEDDING_ENDPOINT", endpoint.as_str())],
    );

    // Partial failure is distinct from total failure.
    assert_eq!(output.status.code(), Some(2), "output: {:?}", output);

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("stage: validation"),
        "stderr should name the failing stage: {}",
        stderr
    );
    assert!(stderr.contains("bad.bin"));
}

#[test]
fn test_ingest_total_failure_exits_one() {
    // Every document is unsupported; nothing reaches the embedder, so no
    // mock service is needed.
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.bin"), b"\x00").unwrap();
    std::fs::write(dir.path().join("b.bin"), b"\x00").unwrap();

    let output = run_grail(&["ingest", dir.path().to_str().unwrap()], dir.path(), &[]);

    assert_eq!(output.status.code(), Some(1), "output: {:?}", output);

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("stage: validation"), "stderr: {}", stderr);
}

#[test]
fn test_missing_directory_exits_one_naming_stage() {
    let dir = tempfile::tempdir().unwrap();

    let output = run_grail(&["ingest", "/does/not/exist"], dir.path(), &[]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("stage: io"), "stderr: {}", stderr);
}

#[test]
fn test_invalid_config_exits_one_naming_stage() {
    let dir = tempfile::tempdir().unwrap();

    let output = run_grail(
        &["ask", "anything"],
        dir.path(),
        &[("CHUNK_SIZE", "100"), ("CHUNK_OVERLAP", "200")],
    );

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("stage: config"), "stderr: {}", stderr);
}

#[test]
fn test_help_lists_subcommands() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_grail(&["--help"], dir.path(), &[]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("ingest"));
    assert!(stdout.contains("ask"));
    assert!(stdout.contains("serve"));
}
