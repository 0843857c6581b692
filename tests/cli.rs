use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tempfile::TempDir;

fn ncl_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("ncl");
    path
}

/// An environment whose remote is unroutable, so every sync attempt
/// degrades deterministically.
fn setup_test_env() -> (TempDir, PathBuf) {
    setup_env_with_remote("http://127.0.0.1:1/api")
}

fn setup_env_with_remote(base_url: &str) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_path = root.join("ncl.toml");
    fs::write(&config_path, config_content(&root, base_url)).unwrap();

    (tmp, config_path)
}

fn config_content(root: &Path, base_url: &str) -> String {
    format!(
        r#"[db]
path = "{}/data/ncl.sqlite"

[remote]
base_url = "{}"
timeout_secs = 2

[sync]
purge_cache_on_signout = false
"#,
        root.display(),
        base_url
    )
}

fn run_ncl(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = ncl_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run ncl binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

fn sign_in(config_path: &Path, user_id: &str) {
    let (stdout, stderr, success) =
        run_ncl(config_path, &["session", "sign-in", "--user-id", user_id]);
    assert!(
        success,
        "sign-in failed: stdout={}, stderr={}",
        stdout, stderr
    );
}

#[test]
fn test_init_creates_database() {
    let (tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_ncl(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("initialized"));
    assert!(tmp.path().join("data/ncl.sqlite").exists());
}

#[test]
fn test_init_idempotent() {
    let (_tmp, config_path) = setup_test_env();

    let (_, _, success1) = run_ncl(&config_path, &["init"]);
    assert!(success1, "First init failed");

    let (_, _, success2) = run_ncl(&config_path, &["init"]);
    assert!(success2, "Second init failed (not idempotent)");
}

#[test]
fn test_status_before_sign_in() {
    let (_tmp, config_path) = setup_test_env();

    run_ncl(&config_path, &["init"]);
    let (stdout, _, success) = run_ncl(&config_path, &["status"]);
    assert!(success, "status failed");
    assert!(stdout.contains("signed out"));
    assert!(stdout.contains("uninitialized"));
}

#[test]
fn test_sign_in_with_unreachable_service_still_signs_in() {
    let (_tmp, config_path) = setup_test_env();

    run_ncl(&config_path, &["init"]);
    let (stdout, _, success) = run_ncl(
        &config_path,
        &["session", "sign-in", "--user-id", "u1", "--username", "casey"],
    );
    assert!(success, "degraded sign-in must still succeed: {}", stdout);
    assert!(stdout.contains("Signed in as u1"));
    assert!(stdout.contains("Sync failed"));

    let (stdout, _, _) = run_ncl(&config_path, &["status"]);
    assert!(stdout.contains("u1 (casey)"));
    assert!(stdout.contains("degraded"));
}

#[test]
fn test_sign_in_rejects_whitespace_user_id() {
    let (_tmp, config_path) = setup_test_env();

    run_ncl(&config_path, &["init"]);
    let (_, stderr, success) = run_ncl(&config_path, &["session", "sign-in", "--user-id", "a b"]);
    assert!(!success, "whitespace in a user id must be rejected");
    assert!(stderr.contains("Invalid user id"));
}

#[test]
fn test_bookmarks_list_requires_sign_in() {
    let (_tmp, config_path) = setup_test_env();

    run_ncl(&config_path, &["init"]);
    let (_, stderr, success) = run_ncl(&config_path, &["bookmarks", "list"]);
    assert!(!success);
    assert!(stderr.contains("Not signed in"));
}

#[test]
fn test_toggle_requires_sign_in() {
    let (_tmp, config_path) = setup_test_env();

    run_ncl(&config_path, &["init"]);
    let (_, stderr, success) = run_ncl(
        &config_path,
        &["bookmarks", "toggle", "https://n.example/a"],
    );
    assert!(!success);
    assert!(stderr.contains("Sign in to manage bookmarks"));
}

#[test]
fn test_offline_list_reports_missing_snapshot() {
    let (_tmp, config_path) = setup_test_env();

    run_ncl(&config_path, &["init"]);
    sign_in(&config_path, "u1");

    let (stdout, _, success) = run_ncl(&config_path, &["bookmarks", "list", "--offline"]);
    assert!(success, "offline list must not fail on a missing snapshot");
    assert!(stdout.contains("No cached bookmarks for u1"));
}

#[test]
fn test_degraded_list_with_empty_cache() {
    let (_tmp, config_path) = setup_test_env();

    run_ncl(&config_path, &["init"]);
    sign_in(&config_path, "u1");

    let (stdout, _, success) = run_ncl(&config_path, &["bookmarks", "list"]);
    assert!(success, "degraded list must not fail");
    assert!(stdout.contains("No bookmarks available"));
}

#[test]
fn test_sign_out_clears_the_session() {
    let (_tmp, config_path) = setup_test_env();

    run_ncl(&config_path, &["init"]);
    sign_in(&config_path, "u1");

    let (stdout, _, success) = run_ncl(&config_path, &["session", "sign-out"]);
    assert!(success, "sign-out failed");
    assert!(stdout.contains("Signed out u1"));

    let (stdout, _, _) = run_ncl(&config_path, &["status"]);
    assert!(stdout.contains("signed out"));

    // A second sign-out is a polite no-op.
    let (stdout, _, success) = run_ncl(&config_path, &["session", "sign-out"]);
    assert!(success);
    assert!(stdout.contains("Not signed in"));
}

#[test]
fn test_analyze_without_session_or_category_fails() {
    let (_tmp, config_path) = setup_test_env();

    run_ncl(&config_path, &["init"]);
    let (_, stderr, success) = run_ncl(&config_path, &["analyze"]);
    assert!(!success);
    assert!(stderr.contains("Not signed in"));
}

#[test]
fn test_analyze_degraded_with_empty_cache() {
    let (_tmp, config_path) = setup_test_env();

    run_ncl(&config_path, &["init"]);
    sign_in(&config_path, "u1");

    let (stdout, _, success) = run_ncl(&config_path, &["analyze"]);
    assert!(success, "analyze over an empty degraded set must not fail");
    assert!(stdout.contains("Nothing to analyze"));
}

#[test]
fn test_headlines_rejects_unknown_category() {
    let (_tmp, config_path) = setup_test_env();

    run_ncl(&config_path, &["init"]);
    let (_, stderr, success) = run_ncl(&config_path, &["headlines", "--category", "cooking"]);
    assert!(!success);
    assert!(stderr.contains("Unknown category"));
}

#[test]
fn test_toggle_new_bookmark_requires_title() {
    let (_tmp, config_path) = setup_test_env();

    run_ncl(&config_path, &["init"]);
    sign_in(&config_path, "u1");

    let (_, stderr, success) = run_ncl(
        &config_path,
        &["bookmarks", "toggle", "https://n.example/a"],
    );
    assert!(!success);
    assert!(stderr.contains("requires --title"));
}

/// Full online round trip against a local mock of the news API.
#[test]
fn test_online_sign_in_list_and_markers() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let base_url = rt.block_on(start_mock());
    let (_tmp, config_path) = setup_env_with_remote(&base_url);

    run_ncl(&config_path, &["init"]);

    let (stdout, stderr, success) = run_ncl(
        &config_path,
        &[
            "session",
            "sign-in",
            "--user-id",
            "u1",
            "--token",
            "opaque-token",
        ],
    );
    assert!(
        success,
        "online sign-in failed: stdout={}, stderr={}",
        stdout, stderr
    );
    assert!(stdout.contains("1 bookmarks synced"));

    let (stdout, _, success) = run_ncl(&config_path, &["bookmarks", "list"]);
    assert!(success);
    assert!(stdout.contains("Bookmarks (1):"));
    assert!(stdout.contains("Alpha rates rally"));

    // The bookmarked url shows up marked in the headline list.
    let (stdout, _, success) = run_ncl(&config_path, &["headlines", "--category", "technology"]);
    assert!(success);
    assert!(stdout.contains("Alpha rates rally [saved]"));
    assert!(stdout.contains("Fresh chips story"));

    let (stdout, _, _) = run_ncl(&config_path, &["status"]);
    assert!(stdout.contains("synced"));
    assert!(stdout.contains("Snapshot:     saved"));

    let (stdout, _, success) = run_ncl(&config_path, &["analyze"]);
    assert!(success);
    assert!(stdout.contains("Analytics for 1 bookmarks"));
    assert!(stdout.contains("Example Wire"));
}

/// Once a sync has written a snapshot, losing the service degrades the
/// list instead of emptying it.
#[test]
fn test_degraded_list_prints_cached_set_with_notice() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let base_url = rt.block_on(start_mock());
    let (tmp, config_path) = setup_env_with_remote(&base_url);

    run_ncl(&config_path, &["init"]);
    sign_in(&config_path, "u1");

    // Same state database, unroutable service.
    fs::write(
        &config_path,
        config_content(tmp.path(), "http://127.0.0.1:1/api"),
    )
    .unwrap();

    let (stdout, _, success) = run_ncl(&config_path, &["bookmarks", "list"]);
    assert!(success, "degraded list with a snapshot must succeed");
    assert!(stdout.contains("Alpha rates rally"));
    assert!(stdout.contains("showing cached bookmarks"));

    let (stdout, _, success) = run_ncl(&config_path, &["bookmarks", "list", "--offline"]);
    assert!(success);
    assert!(stdout.contains("Alpha rates rally"));

    let (stdout, _, _) = run_ncl(&config_path, &["status"]);
    assert!(stdout.contains("degraded"));
}

/// Bind an ephemeral port and serve a static mock of the news API.
async fn start_mock() -> String {
    let app = Router::new()
        .route(
            "/api/bookmarks",
            get(|| async {
                Json(json!({
                    "bookmarks": [
                        {"article": {
                            "title": "Alpha rates rally",
                            "description": "Rates rally on alpha news.",
                            "url": "https://n.example/a",
                            "source": {"name": "Example Wire"},
                            "publishedAt": "2024-05-01T12:30:00Z"
                        }}
                    ]
                }))
            })
            .post(|| async { Json(json!({"message": "Bookmark added"})) }),
        )
        .route(
            "/api/news",
            get(|| async {
                Json(json!({
                    "articles": [
                        {"title": "Alpha rates rally", "description": "Rates rally on alpha news.",
                         "url": "https://n.example/a", "source": {"name": "Example Wire"},
                         "publishedAt": "2024-05-01T12:30:00Z"},
                        {"title": "Fresh chips story", "description": "Semiconductors up.",
                         "url": "https://n.example/chips", "source": {"name": "Example Wire"},
                         "publishedAt": "2024-05-01T13:30:00Z"}
                    ]
                }))
            }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/api")
}
