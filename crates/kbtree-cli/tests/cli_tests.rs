//! CLI integration tests for kbtree-cli
//!
//! Tests command parsing, output formatting, config handling, and calls
//! against a fixture server.

use serde_json::{json, Value};
use std::path::Path;
use std::process::Command;
use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Helper to run the CLI with arguments, extra environment and an isolated home directory
fn run_kbtree_env(home: &Path, envs: &[(&str, &str)], args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_kbtree"))
        .args(args)
        .env("HOME", home)
        .env_remove("KB_AUTH_TOKEN")
        .env_remove("KB_USER")
        .env_remove("KB_PASSWORD")
        .env_remove("RUST_LOG")
        .envs(envs.iter().copied())
        .output()
        .expect("Failed to execute command")
}

fn run_kbtree_in(home: &Path, args: &[&str]) -> std::process::Output {
    run_kbtree_env(home, &[], args)
}

fn run_kbtree(args: &[&str]) -> std::process::Output {
    let home = tempfile::tempdir().unwrap();
    run_kbtree_in(home.path(), args)
}

/// Run the binary off the async runtime so the fixture server keeps serving
async fn run_kbtree_async(args: Vec<String>) -> std::process::Output {
    tokio::task::spawn_blocking(move || {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        run_kbtree(&args)
    })
    .await
    .unwrap()
}

async fn mount_result(server: &MockServer, rpc_method: &str, result: Value) {
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "method": rpc_method })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "version": "1.1",
            "result": [result]
        })))
        .mount(server)
        .await;
}

// ==================== Help & Version Tests ====================

#[test]
fn test_cli_help() {
    let output = run_kbtree(&["--help"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("kbtree"));
    assert!(stdout.contains("tree"));
    assert!(stdout.contains("query"));
    assert!(stdout.contains("abundance"));
    assert!(stdout.contains("config"));
}

#[test]
fn test_cli_version() {
    let output = run_kbtree(&["--version"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("kbtree"));
}

#[test]
fn test_cli_tree_help() {
    let output = run_kbtree(&["tree", "--help"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("replace-names"));
    assert!(stdout.contains("remove-names"));
    assert!(stdout.contains("merge-zero"));
    assert!(stdout.contains("leaf-count"));
    assert!(stdout.contains("draw-html"));
}

#[test]
fn test_cli_query_help() {
    let output = run_kbtree(&["query", "--help"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("get-tree"));
    assert!(stdout.contains("tree-data"));
    assert!(stdout.contains("trees-by-pattern"));
    assert!(stdout.contains("leaf-to-feature"));
}

#[test]
fn test_cli_abundance_help() {
    let output = run_kbtree(&["abundance", "--help"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("compute"));
    assert!(stdout.contains("filter"));
}

// ==================== Argument Validation ====================

#[test]
fn test_invalid_label_rejected() {
    let output = run_kbtree(&["query", "get-tree", "kb|tree.1", "--label", "bogus"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("bogus"));
}

#[test]
fn test_replace_names_requires_map() {
    let output = run_kbtree(&["tree", "replace-names", "(A,B);"]);
    assert!(!output.status.success());
}

#[test]
fn test_filter_rejects_unknown_normalization() {
    let output = run_kbtree(&["abundance", "filter", "profiles.json", "--type", "unit_variance"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unit_variance"));

    let output = run_kbtree(&["abundance", "filter", "profiles.json", "--post-process", "log"]);
    assert!(!output.status.success());
}

#[test]
fn test_invalid_url() {
    let output = run_kbtree(&["--url", "ftp://example.org", "tree", "leaf-count", "(A,B);"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Invalid URL"));
}

#[test]
fn test_user_without_password() {
    let output = run_kbtree(&["--user", "alice", "tree", "leaf-count", "(A,B);"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("KB_PASSWORD"));
}

#[test]
fn test_token_over_http_refused() {
    let output = run_kbtree(&[
        "--url",
        "http://127.0.0.1:9",
        "--token",
        "secret-token",
        "tree",
        "leaf-count",
        "(A,B);",
    ]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Security error"));
    assert!(!stderr.contains("secret-token"));
}

// ==================== Config Tests ====================

#[test]
fn test_config_show_defaults() {
    let output = run_kbtree(&["config", "--show"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("https://kbase.us/services/trees"));
}

#[test]
fn test_config_set_and_show_json() {
    let home = tempfile::tempdir().unwrap();

    let output = run_kbtree_in(
        home.path(),
        &["config", "--set-url", "http://localhost:7047", "--set-timeout-ms", "2500"],
    );
    assert!(output.status.success());
    assert!(home.path().join(".kbtree/config.toml").exists());

    let output = run_kbtree_in(home.path(), &["--json", "config", "--show"]);
    assert!(output.status.success());
    let shown: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(shown["url"], "http://localhost:7047");
    assert_eq!(shown["read_timeout_ms"], 2500);
    assert_eq!(shown["auth_allowed_for_http"], false);
}

#[test]
fn test_config_malformed_file() {
    let home = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(home.path().join(".kbtree")).unwrap();
    std::fs::write(home.path().join(".kbtree/config.toml"), "url = [").unwrap();

    let output = run_kbtree_in(home.path(), &["config", "--show"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Config error"));
}

#[test]
fn test_config_set_repairs_malformed_file() {
    let home = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(home.path().join(".kbtree")).unwrap();
    std::fs::write(home.path().join(".kbtree/config.toml"), "url = [").unwrap();

    let output = run_kbtree_in(home.path(), &["config", "--set-url", "http://localhost:7047"]);
    assert!(output.status.success());

    let output = run_kbtree_in(home.path(), &["--json", "config", "--show"]);
    assert!(output.status.success());
    let shown: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(shown["url"], "http://localhost:7047");
}

// ==================== Service Calls ====================

#[tokio::test(flavor = "multi_thread")]
async fn test_leaf_count_against_server() {
    let server = MockServer::start().await;
    mount_result(&server, "Tree.get_leaf_count", json!(3)).await;

    let output = run_kbtree_async(vec![
        "--url".into(),
        server.uri(),
        "tree".into(),
        "leaf-count".into(),
        "((A,B),C);".into(),
    ])
    .await;
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "3");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_leaf_names_json() {
    let server = MockServer::start().await;
    mount_result(&server, "Tree.extract_leaf_node_names", json!(["A", "B", "C"])).await;

    let output = run_kbtree_async(vec![
        "--json".into(),
        "--url".into(),
        server.uri(),
        "tree".into(),
        "leaf-names".into(),
        "((A,B),C);".into(),
    ])
    .await;
    assert!(output.status.success());
    let shown: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(shown["names"], json!(["A", "B", "C"]));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_get_tree_sends_options() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "method": "Tree.get_tree",
            "params": ["kb|tree.7", {"newick_label": "feature_id", "newick_distance": "none"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": ["(f1,f2);"]})))
        .expect(1)
        .mount(&server)
        .await;

    let output = run_kbtree_async(vec![
        "--url".into(),
        server.uri(),
        "query".into(),
        "get-tree".into(),
        "kb|tree.7".into(),
        "--label".into(),
        "feature_id".into(),
        "--distance".into(),
        "none".into(),
    ])
    .await;
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "(f1,f2);");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_remote_error_exits_nonzero() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "version": "1.1",
            "error": {
                "name": "JSONRPCError",
                "code": -32600,
                "message": "Invalid params"
            }
        })))
        .mount(&server)
        .await;

    let output = run_kbtree_async(vec![
        "--url".into(),
        server.uri(),
        "tree".into(),
        "node-count".into(),
        "not a tree".into(),
    ])
    .await;
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Remote error: -32600 - Invalid params"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_remote_error_json_output() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": {"name": "JSONRPCError", "code": -32601, "message": "Method not found"}
        })))
        .mount(&server)
        .await;

    let output = run_kbtree_async(vec![
        "--json".into(),
        "--url".into(),
        server.uri(),
        "query".into(),
        "leaf-to-protein".into(),
        "kb|tree.1".into(),
    ])
    .await;
    assert_eq!(output.status.code(), Some(1));
    let shown: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(shown["success"], false);
    assert!(shown["error"].as_str().unwrap().contains("-32601"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_filter_sends_normalization_options() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "method": "Tree.filter_abundance_profile",
            "params": [
                {"profile": {"f1": 4.0}},
                {"normalization_type": "max", "normalization_post_process": "log2"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": [{"profile": {"f1": 0.0}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let data = tempfile::tempdir().unwrap();
    let path = data.path().join("profiles.json");
    std::fs::write(&path, r#"{"profile": {"f1": 4.0}}"#).unwrap();

    let output = run_kbtree_async(vec![
        "--json".into(),
        "--url".into(),
        server.uri(),
        "abundance".into(),
        "filter".into(),
        path.display().to_string(),
        "--type".into(),
        "max".into(),
        "--post-process".into(),
        "log2".into(),
    ])
    .await;
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let shown: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(shown["profiles"]["profile"]["f1"], 0.0);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_login_with_password_from_env() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .and(body_string_contains("password=s3cret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user_id": "alice",
            "token": "issued-token"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/"))
        .and(header("authorization", "issued-token"))
        .and(body_partial_json(json!({"method": "Tree.get_node_count"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": [5]})))
        .expect(1)
        .mount(&server)
        .await;

    let home = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(home.path().join(".kbtree")).unwrap();
    std::fs::write(
        home.path().join(".kbtree/config.toml"),
        format!(
            "url = \"{uri}\"\nauth_url = \"{uri}/login\"\nauth_allowed_for_http = true\n",
            uri = server.uri()
        ),
    )
    .unwrap();

    let home_path = home.path().to_path_buf();
    let output = tokio::task::spawn_blocking(move || {
        run_kbtree_env(
            &home_path,
            &[("KB_PASSWORD", "s3cret")],
            &["--user", "alice", "tree", "node-count", "(A,B);"],
        )
    })
    .await
    .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "5");
}
