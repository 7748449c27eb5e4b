use crate::models::MessageResponse;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::path::PathBuf;
use thiserror::Error;

/// Failures of the file-backed tally store. Reads never fail (they fall back
/// to the zero record), so only the write path shows up here.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to serialize tally: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Неверный вариант ответа")]
    InvalidAnswer,

    #[error("Ошибка сервера при сохранении ответа")]
    SubmitFailed(#[source] StoreError),

    #[error("Ошибка сервера при сбросе результатов")]
    ResetFailed(#[source] StoreError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidAnswer => StatusCode::BAD_REQUEST,
            AppError::SubmitFailed(_) | AppError::ResetFailed(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(MessageResponse::new(self.to_string()))).into_response()
    }
}
