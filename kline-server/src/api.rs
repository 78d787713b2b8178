use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kline_core::{Bar, StoreError};
use log::{error, warn};
use serde::Serialize;
use thiserror::Error;

/// `GET /api/stocks`
#[derive(Debug, Serialize)]
pub(crate) struct StockListResponse {
    pub(crate) success: bool,
    pub(crate) data: Vec<String>,
}

/// `GET /api/stock/{code}`: бары объектами, не позиционными массивами
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StockResponse {
    pub(crate) success: bool,
    pub(crate) data: Vec<Bar>,
    pub(crate) stock_name: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct ErrorBody {
    pub(crate) success: bool,
    pub(crate) error: String,
}

#[derive(Debug, Error)]
pub(crate) enum ApiError {
    #[error("Stock code is required")]
    MissingCode,

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error(transparent)]
    Store(#[from] StoreError),

    /// Блокирующая задача чтения упала или отменена
    #[error("store task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl ApiError {
    pub(crate) fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingCode => StatusCode::BAD_REQUEST,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Store(StoreError::NotFound(_) | StoreError::ListMissing) => {
                StatusCode::NOT_FOUND
            }
            ApiError::Store(_) | ApiError::Join(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("request failed: {self}");
        } else {
            warn!("{status}: {self}");
        }

        let body = ErrorBody {
            success: false,
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
