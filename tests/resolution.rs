//! Route resolution through a mounted router.

use std::time::Duration;

use axum::http::StatusCode;
use axum::routing::get as get_route;
use axum::Router;
use serde_json::json;

use api_mocker::{mount, MockServer, MockServerConfig, Mount, MountConfig};

mod common;
use common::{get, request, send, MockTree};

fn router(tree: &MockTree) -> Router {
    mount("/api", tree.path()).apply(Router::new())
}

const ECHO: &str = "[[chain]]\nstep = \"echo\"\n";
const CREATE_JOB: &str = "[[chain]]\nstep = \"created\"\n\n[[chain]]\nstep = \"end\"\n";

#[tokio::test]
async fn test_exact_folder_beats_capture() {
    let tree = MockTree::new();
    tree.file("users/me/GET.json", r#""me""#)
        .file("users/__id__/GET.json", r#""by id""#);
    let app = router(&tree);

    assert_eq!(send(&app, get("/api/users/me")).await.body, r#""me""#);
    assert_eq!(send(&app, get("/api/users/7")).await.body, r#""by id""#);
}

#[tokio::test]
async fn test_dead_exact_branch_falls_back_to_capture() {
    let tree = MockTree::new();
    tree.file("users/me/GET.json", "{}")
        .file("users/__id__/profile/GET.toml", ECHO);
    let app = router(&tree);

    let reply = send(&app, get("/api/users/me/profile")).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.json()["params"], json!({"id": "me"}));
}

#[tokio::test]
async fn test_params_follow_path_order() {
    let tree = MockTree::new();
    tree.file("users/__id__/roles/__role__/GET.toml", ECHO);
    let app = router(&tree);

    let reply = send(&app, get("/api/users/42/roles/admin")).await;
    assert_eq!(reply.json()["params"], json!({"id": "42", "role": "admin"}));
}

#[tokio::test]
async fn test_not_found_page() {
    let tree = MockTree::new();
    tree.file("users/GET.json", "[]");
    let app = router(&tree);

    let reply = send(&app, get("/api/users/42/?page=2")).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(reply.content_type(), "text/html");
    assert_eq!(reply.body, "Endpoint not found on mock files: users/42");
}

#[tokio::test]
async fn test_missing_target_dir_is_not_found() {
    let tree = MockTree::new();
    let app = mount("/api", tree.path().join("absent")).apply(Router::new());

    let reply = send(&app, get("/api/anything")).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(reply.body, "Endpoint not found on mock files: anything");
}

#[tokio::test]
async fn test_method_file_precedence() {
    let tree = MockTree::new();
    tree.file("items/ANY.json", r#""any""#)
        .file("items/POST.json", r#""post""#)
        .file("items/GET.json", r#""data""#)
        .file("items/GET.toml", "[[chain]]\nstep = \"text\"\nbody = \"script\"\n");
    let app = router(&tree);

    assert_eq!(send(&app, request("POST", "/api/items")).await.body, r#""post""#);
    assert_eq!(send(&app, request("DELETE", "/api/items")).await.body, r#""any""#);
    assert_eq!(send(&app, get("/api/items")).await.body, "script");
}

#[tokio::test]
async fn test_response_type_xml() {
    let tree = MockTree::new();
    tree.file("feed/GET.xml", "<feed/>").file("feed/GET.json", "{}");
    let app = Mount::at("/api", MountConfig::new(tree.path()).response_type("xml")).apply(Router::new());

    let reply = send(&app, get("/api/feed")).await;
    assert_eq!(reply.content_type(), "application/xml");
    assert_eq!(reply.body, "<feed/>");
}

#[tokio::test]
async fn test_auto_negotiates_from_accept() {
    let tree = MockTree::new();
    tree.file("report/GET.json", r#"{"ok":true}"#)
        .file("report/GET.xml", "<ok/>")
        .file("only-json/GET.json", "{}");
    let app = Mount::at("/api", MountConfig::new(tree.path()).response_type("auto")).apply(Router::new());

    let xml = axum::http::Request::builder()
        .uri("/api/report")
        .header("accept", "application/xml")
        .body(axum::body::Body::empty())
        .unwrap();
    let reply = send(&app, xml).await;
    assert_eq!(reply.content_type(), "application/xml");
    assert_eq!(reply.body, "<ok/>");

    // No Accept header: json is preferred
    let reply = send(&app, get("/api/report")).await;
    assert_eq!(reply.content_type(), "application/json");

    let xml_only = axum::http::Request::builder()
        .uri("/api/only-json")
        .header("accept", "application/xml")
        .body(axum::body::Body::empty())
        .unwrap();
    assert_eq!(send(&app, xml_only).await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_base_url_prefix_is_literal() {
    let tree = MockTree::new();
    tree.file("x/GET.json", r#""x""#);
    let app = router(&tree);

    assert_eq!(send(&app, get("/apix")).await.body, r#""x""#);
    // Outside the prefix the request falls through to the empty router
    let reply = send(&app, get("/other/x")).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert!(reply.body.is_empty());
}

#[tokio::test]
async fn test_new_files_visible_without_restart() {
    let tree = MockTree::new();
    let app = router(&tree);

    assert_eq!(send(&app, get("/api/late")).await.status, StatusCode::NOT_FOUND);

    tree.file("late/GET.json", "{}");
    assert_eq!(send(&app, get("/api/late")).await.status, StatusCode::OK);

    tree.remove("late/GET.json");
    assert_eq!(send(&app, get("/api/late")).await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_index_ttl_keeps_snapshot() {
    let tree = MockTree::new();
    let config = MountConfig::new(tree.path()).index_ttl_ms(60_000);
    let app = Mount::at("/api", config).apply(Router::new());

    assert_eq!(send(&app, get("/api/later")).await.status, StatusCode::NOT_FOUND);

    // The cached index predates the file
    tree.file("later/GET.json", "{}");
    assert_eq!(send(&app, get("/api/later")).await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_repeated_capture_name_binds_deepest_segment() {
    let tree = MockTree::new();
    tree.file("__id__/__id__/GET.toml", ECHO);
    let app = router(&tree);

    let reply = send(&app, get("/api/a/b")).await;
    assert_eq!(reply.json()["params"], json!({"id": "b"}));
}

#[cfg(unix)]
#[tokio::test]
async fn test_symlinked_fixture_dir_resolves() {
    let tree = MockTree::new();
    tree.file("shared/users/GET.json", r#"["ada"]"#);
    std::fs::create_dir_all(tree.path().join("v1")).unwrap();
    std::os::unix::fs::symlink(tree.path().join("shared/users"), tree.path().join("v1/users")).unwrap();

    // Default per-request reads and a cached full scan both follow the link
    let reply = send(&router(&tree), get("/api/v1/users")).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body, r#"["ada"]"#);

    let cached = Mount::at("/api", MountConfig::new(tree.path()).index_ttl_ms(60_000)).apply(Router::new());
    assert_eq!(send(&cached, get("/api/v1/users")).await.body, r#"["ada"]"#);
}

#[tokio::test]
async fn test_vanished_files_with_cached_index() {
    let tree = MockTree::new();
    tree.file("users/GET.json", "[]")
        .file("jobs/POST.toml", CREATE_JOB);
    let config = MountConfig::new(tree.path()).index_ttl_ms(60_000);
    let app = Mount::at("/api", config).apply(Router::new());

    assert_eq!(send(&app, get("/api/users")).await.status, StatusCode::OK);
    assert_eq!(send(&app, request("POST", "/api/jobs")).await.status, StatusCode::CREATED);

    // The cached index still lists both files
    tree.remove("users/GET.json");
    tree.remove("jobs/POST.toml");

    let reply = send(&app, get("/api/users")).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(reply.body, "Endpoint not found on mock files: users");

    let reply = send(&app, request("POST", "/api/jobs")).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(reply.body, "Endpoint not found on mock files: jobs");
}

#[tokio::test]
async fn test_vanished_files_delegate_when_configured() {
    let tree = MockTree::new();
    tree.file("users/GET.json", "[]")
        .file("jobs/POST.toml", CREATE_JOB);
    let config = MountConfig::new(tree.path())
        .index_ttl_ms(60_000)
        .next_on_not_found(true);
    let inner = Router::new()
        .route("/api/users", get_route(|| async { "live users" }))
        .route("/api/jobs", axum::routing::post(|| async { "live jobs" }));
    let app = Mount::at("/api", config).apply(inner);

    assert_eq!(send(&app, get("/api/users")).await.body, "[]");
    assert_eq!(send(&app, request("POST", "/api/jobs")).await.status, StatusCode::CREATED);

    tree.remove("users/GET.json");
    tree.remove("jobs/POST.toml");

    assert_eq!(send(&app, get("/api/users")).await.body, "live users");
    assert_eq!(send(&app, request("POST", "/api/jobs")).await.body, "live jobs");
}

/// Request `uri` until it answers 200 or two seconds pass.
async fn eventually_ok(app: &Router, uri: &str) -> StatusCode {
    let mut status = StatusCode::NOT_FOUND;
    for _ in 0..40 {
        status = send(app, get(uri)).await.status;
        if status == StatusCode::OK {
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    status
}

#[tokio::test]
async fn test_watched_mount_sees_new_files() {
    let tree = MockTree::new();
    tree.file("late/POST.json", "{}");
    let app = Mount::at("/api", MountConfig::new(tree.path()).watch(true)).apply(Router::new());

    assert_eq!(send(&app, get("/api/late")).await.status, StatusCode::NOT_FOUND);

    tree.file("late/GET.json", "{}");
    assert_eq!(eventually_ok(&app, "/api/late").await, StatusCode::OK);
}

#[tokio::test]
async fn test_unwatchable_target_falls_back_to_rescans() {
    let tree = MockTree::new();
    let mut config = MockServerConfig::default();
    config
        .mounts
        .push(MountConfig::new(tree.path().join("mocks")).base_url("/api").watch(true));
    let app = MockServer::new(config).router();

    // The target does not exist yet, so no watcher could start
    assert_eq!(send(&app, get("/api/ping")).await.status, StatusCode::NOT_FOUND);

    tree.file("mocks/ping/GET.json", r#""pong""#);
    let reply = send(&app, get("/api/ping")).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body, r#""pong""#);
}
