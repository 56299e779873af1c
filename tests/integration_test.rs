//! REST API統合テスト（インメモリリポジトリ使用）
//!
//! tower::ServiceExt + oneshot でルーターを直接呼び出す。

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use tower::ServiceExt;

use k1s0_completion_import_server::adapter::handler;
use k1s0_completion_import_server::adapter::repository::InMemoryCompletionStore;
use k1s0_completion_import_server::domain::entity::course::CourseLookupField;
use k1s0_completion_import_server::domain::repository::CompletionRepository;
use k1s0_completion_import_server::infrastructure::config::{Config, ImportConfig};
use k1s0_completion_import_server::infrastructure::file_storage::InMemoryFileStorage;
use k1s0_completion_import_server::test_support::{
    make_default_app_state, make_test_app_state, seeded_store,
};

const SCENARIO_CSV: &str = "useridnumber,courseidnumber,timestamp\n1,10,1700000000\n2,99,abc\n";

async fn make_app() -> (axum::Router, Arc<InMemoryCompletionStore>) {
    let (state, store) = make_default_app_state().await;
    (handler::router(state), store)
}

async fn make_app_with_config(import_config: ImportConfig) -> axum::Router {
    let state = make_test_app_state(
        seeded_store().await,
        Arc::new(InMemoryFileStorage::new()),
        import_config,
    );
    handler::router(state)
}

fn import_request(query: &str, csv: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(format!("/api/v1/completion-imports{query}"))
        .header("content-type", "text/csv")
        .body(csv.into())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}

// ---------------------------------------------------------------------------
// Health / Readiness
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_healthz_returns_ok() {
    let (app, _) = make_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/healthz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_readyz_returns_ok() {
    let (app, _) = make_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/readyz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

// ---------------------------------------------------------------------------
// Headers
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_list_required_headers() {
    let (app, _) = make_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/completion-imports/headers")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(
        json["required_headers"],
        serde_json::json!(["useridnumber", "courseidnumber", "timestamp"])
    );
}

// ---------------------------------------------------------------------------
// Import run
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_import_updates_completion_and_serves_revert_csv() {
    let (app, store) = make_app().await;

    let response = app
        .clone()
        .oneshot(import_request("?output=plain", SCENARIO_CSV))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(
        json["summary"],
        serde_json::json!({"total": 2, "modified": 1, "skipped": 0, "errors": 1})
    );
    assert_eq!(
        json["found_headers"],
        serde_json::json!(["useridnumber", "courseidnumber", "timestamp"])
    );
    assert_eq!(
        json["revert_download_url"],
        "/api/v1/completion-imports/revert?downloadcsv=1"
    );
    let output = json["output"].as_str().unwrap();
    assert!(output.starts_with("line\tresult\tuser\tid\tfullname\n"));
    assert!(output.contains("1\tOK\t1\talice\t10\talgebra"));
    assert!(output.contains("Invalid Import Record"));
    assert!(output.contains("Completions modified: 1"));

    let primary = store.find_course_completion(1, 10).await.unwrap().unwrap();
    assert_eq!(primary.time_completed, Some(1_700_000_000));
    let criterion = store.find_criteria_completion(1, 10).await.unwrap().unwrap();
    assert_eq!(criterion.time_completed, Some(1_700_000_000));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/completion-imports/revert?downloadcsv=1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let disposition = response
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.contains("modify-completions-undo.csv"));
    assert_eq!(body_text(response).await, "1,10,1600000000\n");
}

#[tokio::test]
async fn test_import_with_semicolon_and_html_output() {
    let (app, _) = make_app().await;
    let csv = "useridnumber;courseidnumber;timestamp\n1;10;1700000000\n2;10;1700000000\n";

    let response = app
        .oneshot(import_request("?delimiter=semicolon&output=html", csv))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    // bob はコース10の修了記録を持たない
    assert_eq!(
        json["summary"],
        serde_json::json!({"total": 2, "modified": 1, "skipped": 1, "errors": 0})
    );
    let output = json["output"].as_str().unwrap();
    assert!(output.starts_with("<table"));
    assert!(output.contains("Course completion skipped"));
    assert!(output.contains("<a href=\""));
    assert!(output.contains("revert?downloadcsv=1\">Download undo CSV</a>"));
}

#[tokio::test]
async fn test_import_with_utf16_body() {
    let (app, _) = make_app().await;
    let mut bytes = vec![0xFF, 0xFE];
    for unit in SCENARIO_CSV.encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }

    let response = app
        .oneshot(import_request("?encoding=UTF-16LE", bytes))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["summary"]["modified"], 1);
    // 既定の出力形式は silent
    assert_eq!(json["output"], "");
}

#[tokio::test]
async fn test_import_by_idnumber_lookup() {
    let app = make_app_with_config(ImportConfig {
        course_lookup_field: CourseLookupField::IdNumber,
        ..ImportConfig::default()
    })
    .await;
    let csv = "useridnumber,courseidnumber,timestamp\n1,10,1700000000\n";

    let response = app.oneshot(import_request("", csv)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // コースは idnumber（ALG-101）で照合するため "10" は見つからない
    let json = body_json(response).await;
    assert_eq!(json["summary"]["skipped"], 1);
    assert_eq!(json["summary"]["errors"], 0);
    assert_eq!(json["summary"]["modified"], 0);
}

#[tokio::test]
async fn test_import_unmatched_rows_are_skipped_and_zero_ids_are_invalid() {
    let (app, store) = make_app().await;
    let csv = "useridnumber,courseidnumber,timestamp\n1,99,1700000000\n0,10,1700000000\n";

    let response = app
        .oneshot(import_request("?output=plain", csv))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(
        json["summary"],
        serde_json::json!({"total": 2, "modified": 0, "skipped": 1, "errors": 1})
    );
    let output = json["output"].as_str().unwrap();
    assert!(output.contains("1\tOK"));
    assert!(output.contains("2\tNOK"));

    let primary = store.find_course_completion(1, 10).await.unwrap().unwrap();
    assert_eq!(primary.time_completed, Some(1_600_000_000));
}

// ---------------------------------------------------------------------------
// Setup errors
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_import_column_count_mismatch() {
    let (app, _) = make_app().await;

    let response = app
        .oneshot(import_request("", "useridnumber,courseidnumber\n1,10\n"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "SYS_CIMPORT_COLUMN_COUNT_MISMATCH");
    assert!(json["error"]["request_id"].as_str().is_some());
}

#[tokio::test]
async fn test_import_empty_body() {
    let (app, _) = make_app().await;

    let response = app.oneshot(import_request("", "")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "SYS_CIMPORT_CANNOT_READ_FILE");
}

#[tokio::test]
async fn test_import_invalid_delimiter() {
    let (app, _) = make_app().await;

    let response = app
        .oneshot(import_request("?delimiter=pipe", SCENARIO_CSV))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "SYS_CIMPORT_INVALID_PARAMETER");
}

#[tokio::test]
async fn test_import_too_many_rows() {
    let app = make_app_with_config(ImportConfig {
        max_rows_per_import: 1,
        ..ImportConfig::default()
    })
    .await;

    let response = app
        .oneshot(import_request("", SCENARIO_CSV))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "SYS_CIMPORT_TOO_MANY_ROWS");
}

#[tokio::test]
async fn test_revert_download_not_found_before_any_run() {
    let (app, _) = make_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/completion-imports/revert?downloadcsv=1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "SYS_CIMPORT_REVERT_NOT_FOUND");
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[test]
fn test_bundled_config_loads() {
    let config = Config::load("config/config.yaml").unwrap();
    assert_eq!(config.app.name, "k1s0-completion-import-server");
    assert!(config.database.is_none());
    assert_eq!(config.import.limits().max_rows, 100_000);
}
