pub mod error;
pub mod import_handler;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::infrastructure::config::ImportConfig;
use crate::infrastructure::file_storage::FileStorage;
use crate::usecase::UpdateCompletionDateUseCase;

// 上限超過をアプリケーション側のエラーとして返すため、本文の上限に余裕を持たせる
const BODY_LIMIT_HEADROOM: usize = 1024 * 1024;

/// AppState はアプリケーション全体の共有状態を表す。
#[derive(Clone)]
pub struct AppState {
    pub update_completion_uc: Arc<UpdateCompletionDateUseCase>,
    pub file_storage: Arc<dyn FileStorage>,
    pub import_config: Arc<ImportConfig>,
}

/// REST API ルーターを構築する。
pub fn router(state: AppState) -> Router {
    let body_limit = state
        .import_config
        .limits()
        .max_file_size_bytes
        .saturating_add(BODY_LIMIT_HEADROOM);

    Router::new()
        // Health / Readiness
        .route("/healthz", get(import_handler::healthz))
        .route("/readyz", get(import_handler::readyz))
        // Completion import endpoints
        .route(
            "/api/v1/completion-imports",
            post(import_handler::run_import),
        )
        .route(
            "/api/v1/completion-imports/headers",
            get(import_handler::list_required_headers),
        )
        .route(
            "/api/v1/completion-imports/revert",
            get(import_handler::download_revert),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// ErrorResponse は統一エラーレスポンス。
#[derive(Debug, serde::Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, serde::Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    pub request_id: String,
    pub details: Vec<String>,
}

impl ErrorResponse {
    pub fn new(code: &str, message: &str) -> Self {
        Self {
            error: ErrorBody {
                code: code.to_string(),
                message: message.to_string(),
                request_id: uuid::Uuid::new_v4().to_string(),
                details: vec![],
            },
        }
    }
}
