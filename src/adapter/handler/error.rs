use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use super::ErrorResponse;
use crate::infrastructure::csv_reader::CsvReadError;
use crate::usecase::ImportProcessorError;

/// ImportError はインポート API のエラー型。
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("cannot read file: {0}")]
    CannotReadFile(String),

    #[error("column count mismatch")]
    ColumnCountMismatch,

    #[error("{0}")]
    InvalidFile(String),

    #[error("{0}")]
    FileTooLarge(String),

    #[error("{0}")]
    TooManyRows(String),

    #[error("process already started")]
    AlreadyStarted,

    #[error("revert file not found")]
    RevertNotFound,

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<CsvReadError> for ImportError {
    fn from(e: CsvReadError) -> Self {
        match &e {
            CsvReadError::Empty => ImportError::CannotReadFile(e.to_string()),
            CsvReadError::FileTooLarge { .. } => ImportError::FileTooLarge(e.to_string()),
            CsvReadError::TooManyRows { .. } => ImportError::TooManyRows(e.to_string()),
            CsvReadError::Decode(_) | CsvReadError::Parse { .. } => {
                ImportError::InvalidFile(e.to_string())
            }
        }
    }
}

impl From<ImportProcessorError> for ImportError {
    fn from(e: ImportProcessorError) -> Self {
        match e {
            ImportProcessorError::CannotReadFile => {
                ImportError::CannotReadFile("no header row".to_string())
            }
            ImportProcessorError::ColumnCountMismatch => ImportError::ColumnCountMismatch,
            ImportProcessorError::AlreadyStarted => ImportError::AlreadyStarted,
            ImportProcessorError::Internal(e) => ImportError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for ImportError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ImportError::InvalidParameter(_) => {
                (StatusCode::BAD_REQUEST, "SYS_CIMPORT_INVALID_PARAMETER")
            }
            ImportError::CannotReadFile(_) => {
                (StatusCode::BAD_REQUEST, "SYS_CIMPORT_CANNOT_READ_FILE")
            }
            ImportError::ColumnCountMismatch => {
                (StatusCode::BAD_REQUEST, "SYS_CIMPORT_COLUMN_COUNT_MISMATCH")
            }
            ImportError::InvalidFile(_) => (StatusCode::BAD_REQUEST, "SYS_CIMPORT_INVALID_FILE"),
            ImportError::FileTooLarge(_) => {
                (StatusCode::PAYLOAD_TOO_LARGE, "SYS_CIMPORT_FILE_TOO_LARGE")
            }
            ImportError::TooManyRows(_) => (StatusCode::BAD_REQUEST, "SYS_CIMPORT_TOO_MANY_ROWS"),
            ImportError::AlreadyStarted => (StatusCode::CONFLICT, "SYS_CIMPORT_ALREADY_STARTED"),
            ImportError::RevertNotFound => {
                (StatusCode::NOT_FOUND, "SYS_CIMPORT_REVERT_NOT_FOUND")
            }
            ImportError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "SYS_CIMPORT_INTERNAL_ERROR",
            ),
        };

        let body = ErrorResponse::new(code, &self.to_string());
        (status, Json(body)).into_response()
    }
}
