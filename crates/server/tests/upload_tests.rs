//! Integration tests for archive uploads.

mod common;

use axum::http::StatusCode;
use common::TestServer;
use common::fixtures::{build_archive, build_deflated_archive, corrupt_entry, token_for};
use critic_core::MAX_ARCHIVE_SIZE;
use critic_metadata::repos::FileRepo;

#[tokio::test]
async fn test_upload_skips_unreadable_entry() {
    let server = TestServer::new().await;
    let token = token_for(1, "ada");
    let project_id = server.create_project(&token, "demo").await;

    let mut archive = build_archive(&[
        ("project/", ""),
        ("project/main.c", "int main(void) { return 0; }\n"),
        ("./project/App.java", "class App {}\n"),
        ("project\\lib\\util.py", "import os\n"),
        ("project/broken.js", "THIS-ENTRY-IS-CORRUPT"),
    ]);
    corrupt_entry(&mut archive, "THIS-ENTRY-IS-CORRUPT");

    let (status, report) = server
        .raw(
            "POST",
            &format!("/api/projects/{project_id}/upload"),
            archive,
            Some(&token),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED, "{report}");
    let ingested: Vec<_> = report["ingested"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect();
    assert_eq!(
        ingested,
        vec!["project/main.c", "project/App.java", "project/lib/util.py"]
    );
    assert_eq!(report["skipped"][0]["name"], "project/broken.js");

    let files = server
        .metadata()
        .list_files_by_project(project_id)
        .await
        .unwrap();
    assert_eq!(files.len(), 3);
}

#[tokio::test]
async fn test_upload_replaces_existing_paths() {
    let server = TestServer::new().await;
    let token = token_for(1, "ada");
    let project_id = server.create_project(&token, "demo").await;
    let file_id = server.create_file(&token, project_id, "a.py", "old").await;

    let (status, _) = server
        .raw(
            "POST",
            &format!("/api/projects/{project_id}/upload"),
            build_archive(&[("./a.py", "new")]),
            Some(&token),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let file = server.metadata().get_file(file_id).await.unwrap().unwrap();
    assert_eq!(file.content, "new");
}

#[tokio::test]
async fn test_oversize_upload_is_rejected_before_decoding() {
    let server = TestServer::new().await;
    let token = token_for(1, "ada");
    let project_id = server.create_project(&token, "demo").await;

    // Not a zip at all; size alone decides.
    let (status, body) = server
        .raw(
            "POST",
            &format!("/api/projects/{project_id}/upload"),
            vec![b'x'; MAX_ARCHIVE_SIZE + 1],
            Some(&token),
        )
        .await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["code"], "payload_too_large");
    assert_eq!(
        server
            .metadata()
            .count_files_by_project(project_id)
            .await
            .unwrap(),
        0
    );
}

#[tokio::test]
async fn test_configured_limit_applies() {
    let server = TestServer::with_config(|config| config.server.max_archive_bytes = 64).await;
    let token = token_for(1, "ada");
    let project_id = server.create_project(&token, "demo").await;

    let content = "x".repeat(200);
    let archive = build_archive(&[("a.py", content.as_str())]);
    let (status, _) = server
        .raw(
            "POST",
            &format!("/api/projects/{project_id}/upload"),
            archive,
            Some(&token),
        )
        .await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_invalid_archive_is_bad_request() {
    let server = TestServer::new().await;
    let token = token_for(1, "ada");
    let project_id = server.create_project(&token, "demo").await;

    let (status, body) = server
        .raw(
            "POST",
            &format!("/api/projects/{project_id}/upload"),
            b"PK but not really".to_vec(),
            Some(&token),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("invalid archive"));
}

#[tokio::test]
async fn test_empty_archive_succeeds() {
    let server = TestServer::new().await;
    let token = token_for(1, "ada");
    let project_id = server.create_project(&token, "demo").await;

    let (status, report) = server
        .raw(
            "POST",
            &format!("/api/projects/{project_id}/upload"),
            build_archive(&[("only-a-dir/", "")]),
            Some(&token),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(report["ingested"].as_array().unwrap().is_empty());
    assert!(report["skipped"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_highly_compressed_entry_is_capped() {
    let server =
        TestServer::with_config(|config| config.server.max_entry_bytes = 1024 * 1024).await;
    let token = token_for(1, "ada");
    let project_id = server.create_project(&token, "demo").await;

    let expanded = "a".repeat(8 * 1024 * 1024);
    let archive = build_deflated_archive(&[
        ("huge.txt", expanded.as_str()),
        ("main.py", "print('hi')\n"),
    ]);
    assert!(archive.len() < 64 * 1024);

    let (status, report) = server
        .raw(
            "POST",
            &format!("/api/projects/{project_id}/upload"),
            archive,
            Some(&token),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED, "{report}");
    assert_eq!(report["ingested"], serde_json::json!(["main.py"]));
    assert_eq!(report["skipped"][0]["name"], "huge.txt");
    assert_eq!(report["skipped"][0]["reason"], "entry too large");
    assert_eq!(
        server
            .metadata()
            .count_files_by_project(project_id)
            .await
            .unwrap(),
        1
    );
}

#[tokio::test]
async fn test_extraction_budget_spans_the_archive() {
    let server = TestServer::with_config(|config| {
        config.server.max_entry_bytes = 1024;
        config.server.max_extracted_bytes = 1536;
    })
    .await;
    let token = token_for(1, "ada");
    let project_id = server.create_project(&token, "demo").await;

    let block = "x".repeat(1000);
    let archive = build_deflated_archive(&[
        ("a.txt", block.as_str()),
        ("b.txt", block.as_str()),
        ("c.txt", "tiny"),
    ]);

    let (status, report) = server
        .raw(
            "POST",
            &format!("/api/projects/{project_id}/upload"),
            archive,
            Some(&token),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(report["ingested"], serde_json::json!(["a.txt"]));
    let skipped: Vec<_> = report["skipped"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(skipped, vec!["b.txt", "c.txt"]);
}
