use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use super::error::ImportError;
use super::AppState;
use crate::domain::entity::run_summary::RunSummary;
use crate::infrastructure::csv_reader::{CsvEncoding, CsvImportReader, CsvReadOptions, Delimiter};
use crate::infrastructure::progress_tracker::{
    revert_file_record, OutputMode, ProgressTracker, RevertPublisher, REVERT_FILE_NAME,
};
use crate::usecase::ImportProcessor;

// --- Request / Response DTOs ---

#[derive(Debug, Default, Deserialize)]
pub struct RunImportQuery {
    pub delimiter: Option<String>,
    pub encoding: Option<String>,
    pub output: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RunImportResponse {
    pub summary: RunSummary,
    pub found_headers: Vec<String>,
    pub revert_download_url: String,
    pub output: String,
}

#[derive(Debug, Serialize)]
pub struct RequiredHeadersResponse {
    pub required_headers: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DownloadRevertQuery {
    #[serde(default)]
    pub downloadcsv: Option<u8>,
}

// --- Handlers ---

pub async fn healthz() -> &'static str {
    "ok"
}

pub async fn readyz() -> &'static str {
    "ok"
}

pub async fn list_required_headers() -> Json<RequiredHeadersResponse> {
    Json(RequiredHeadersResponse {
        required_headers: ImportProcessor::<CsvImportReader>::list_required_headers(),
    })
}

/// 本文の CSV を読み込み、インポートを1回実行する。
pub async fn run_import(
    State(state): State<AppState>,
    Query(query): Query<RunImportQuery>,
    body: Bytes,
) -> Result<Json<RunImportResponse>, ImportError> {
    let options = read_options(&state, &query)?;
    let mode = match query.output.as_deref() {
        Some(s) => {
            OutputMode::from_str_value(s).map_err(|e| ImportError::InvalidParameter(e.to_string()))?
        }
        None => OutputMode::default(),
    };

    let reader = CsvImportReader::load(&body, &options)?;
    tracing::info!(
        size_bytes = body.len(),
        rows = reader.row_count(),
        encoding = %options.encoding,
        "completion import requested"
    );

    let publisher = RevertPublisher::new(
        state.file_storage.clone(),
        state.import_config.download_endpoint.clone(),
    );
    let mut processor =
        ImportProcessor::new(reader, state.update_completion_uc.clone(), publisher)?;
    let found_headers = processor.list_found_headers().to_vec();

    let mut tracker =
        ProgressTracker::new(mode).map_err(|e| ImportError::Internal(e.to_string()))?;
    let report = processor.execute(Some(&mut tracker)).await?;

    Ok(Json(RunImportResponse {
        summary: report.summary,
        found_headers,
        revert_download_url: report.revert_download_url,
        output: tracker.get_buffer().to_string(),
    }))
}

/// 直近の実行で保存した取り消し CSV を返す。
pub async fn download_revert(
    State(state): State<AppState>,
    Query(query): Query<DownloadRevertQuery>,
) -> Result<Response, ImportError> {
    let content = state
        .file_storage
        .get_file_content(&revert_file_record())
        .await
        .map_err(|e| ImportError::Internal(e.to_string()))?
        .ok_or(ImportError::RevertNotFound)?;

    if query.downloadcsv == Some(1) {
        let disposition = format!("attachment; filename=\"{REVERT_FILE_NAME}\"");
        Ok((
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                (header::CONTENT_DISPOSITION, disposition),
            ],
            content,
        )
            .into_response())
    } else {
        Ok(([(header::CONTENT_TYPE, "text/csv; charset=utf-8")], content).into_response())
    }
}

fn read_options(state: &AppState, query: &RunImportQuery) -> Result<CsvReadOptions, ImportError> {
    let delimiter = match query.delimiter.as_deref() {
        Some(s) => {
            Delimiter::from_str_value(s).map_err(|e| ImportError::InvalidParameter(e.to_string()))?
        }
        None => Delimiter::default(),
    };
    let encoding = match query.encoding.as_deref() {
        Some(s) => {
            CsvEncoding::from_str_value(s).map_err(|e| ImportError::InvalidParameter(e.to_string()))?
        }
        None => CsvEncoding::default(),
    };

    Ok(CsvReadOptions {
        delimiter: delimiter.as_byte(state.import_config.default_delimiter_byte()),
        encoding,
        limits: state.import_config.limits(),
    })
}
