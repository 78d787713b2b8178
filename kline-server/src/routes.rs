use axum::extract::{Path, Query, State};
use axum::http::{Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use kline_core::InstrumentStore;
use log::debug;
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};

use crate::api::{ApiError, StockListResponse, StockResponse};
use crate::config::SharedStore;

pub(crate) fn router(store: SharedStore) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/api/stocks", get(list_stocks).fallback(method_fallback))
        .route("/api/stock", get(stock_by_query).fallback(method_fallback))
        .route("/api/stock/", get(stock_by_query).fallback(method_fallback))
        .route("/api/stock/:code", get(stock_by_path).fallback(method_fallback))
        .fallback(not_found)
        .with_state(store)
        .layer(cors)
}

#[derive(Debug, Deserialize)]
struct CodeQuery {
    code: Option<String>,
}

/// Чтение хранилища (файлы `JsonDirStore`) уводим с рабочих потоков tokio
async fn with_store<T, F>(store: SharedStore, f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&dyn InstrumentStore) -> Result<T, ApiError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || f(store.as_ref())).await?
}

async fn list_stocks(State(store): State<SharedStore>) -> Result<Json<StockListResponse>, ApiError> {
    let codes = with_store(store, |s| Ok(s.codes()?)).await?;
    debug!("list: {} codes", codes.len());
    Ok(Json(StockListResponse {
        success: true,
        data: codes,
    }))
}

async fn stock_by_query(
    State(store): State<SharedStore>,
    Query(q): Query<CodeQuery>,
) -> Result<Json<StockResponse>, ApiError> {
    let code = q.code.as_deref().map(str::trim).unwrap_or_default().to_string();
    with_store(store, move |s| fetch_stock(s, &code)).await
}

async fn stock_by_path(
    State(store): State<SharedStore>,
    Path(code): Path<String>,
) -> Result<Json<StockResponse>, ApiError> {
    with_store(store, move |s| fetch_stock(s, code.trim())).await
}

fn fetch_stock(store: &dyn InstrumentStore, code: &str) -> Result<Json<StockResponse>, ApiError> {
    if code.is_empty() {
        return Err(ApiError::MissingCode);
    }

    let rec = store.get(code)?;
    debug!("stock {code}: {} bars", rec.series.len());

    Ok(Json(StockResponse {
        success: true,
        stock_name: format!("{code} {}", rec.name),
        data: rec.series,
    }))
}

// OPTIONS без CORS-заголовков сюда тоже попадает: отвечаем пустым 200
async fn method_fallback(method: Method) -> Response {
    if method == Method::OPTIONS {
        return StatusCode::OK.into_response();
    }
    ApiError::MethodNotAllowed.into_response()
}

async fn not_found(method: Method) -> Response {
    if method == Method::OPTIONS {
        return StatusCode::OK.into_response();
    }
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "error": "Not found" })),
    )
        .into_response()
}
