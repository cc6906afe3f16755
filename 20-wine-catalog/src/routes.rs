//! HTTP routes.
//!
//! Handlers translate requests into catalog commands and wrap the manager's
//! JSON replies in responses. Request accounting happens in one middleware
//! layer so that every response, including 404 and 405, counts as exactly
//! one request and exactly one success or error.

use axum::{
    Router,
    body::Bytes,
    extract::{
        Path, Query, Request, State,
        rejection::{BytesRejection, PathRejection, QueryRejection},
    },
    http::{StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::{command::CatalogHandle, error::CatalogError, record::NewWine};

/// Builds the service router around a running manager.
pub fn app(catalog: CatalogHandle) -> Router {
    Router::new()
        .route("/status", get(status).fallback(not_allowed))
        .route("/wine", get(list_wines).put(put_wine).fallback(not_allowed))
        .route("/wine/", get(missing_id).fallback(not_allowed))
        .route("/wine/:id", get(wine_by_id).fallback(not_allowed))
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(
            catalog.clone(),
            track_outcome,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(catalog)
}

async fn status(State(catalog): State<CatalogHandle>) -> Result<Response, CatalogError> {
    let body = catalog.status().await?;
    Ok(json_response(StatusCode::OK, body))
}

async fn list_wines(
    State(catalog): State<CatalogHandle>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Response, CatalogError> {
    let Query(pairs) = query.map_err(|_| CatalogError::InvalidWindow)?;
    // A repeated key keeps its first value.
    let first = |key: &str| {
        pairs
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.clone())
    };
    let body = catalog.wines(first("start"), first("count")).await?;
    Ok(json_response(StatusCode::OK, body))
}

async fn put_wine(
    State(catalog): State<CatalogHandle>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Response, CatalogError> {
    let body = body.map_err(|rejection| {
        warn!(error = %rejection, "failed to read wine body");
        CatalogError::InvalidBody
    })?;
    let wine: NewWine = serde_json::from_slice(&body).map_err(|_| CatalogError::InvalidBody)?;
    if wine.title.is_empty() {
        return Err(CatalogError::MissingTitle);
    }

    let body = catalog.put_wine(wine).await?;
    Ok(json_response(StatusCode::ACCEPTED, body))
}

async fn wine_by_id(
    State(catalog): State<CatalogHandle>,
    id: Result<Path<String>, PathRejection>,
) -> Result<Response, CatalogError> {
    let Path(id) = id.map_err(|_| CatalogError::InvalidId)?;
    let id: i64 = id.parse().map_err(|_| CatalogError::InvalidId)?;
    let body = catalog.wine(id).await?;
    Ok(json_response(StatusCode::OK, body))
}

async fn missing_id() -> CatalogError {
    CatalogError::InvalidId
}

async fn not_allowed() -> CatalogError {
    CatalogError::NotAllowed
}

async fn not_found() -> CatalogError {
    CatalogError::NotFound
}

async fn track_outcome(
    State(catalog): State<CatalogHandle>,
    request: Request,
    next: Next,
) -> Response {
    if let Err(err) = catalog.record_request() {
        warn!(error = %err, "failed to count request");
    }

    let response = next.run(request).await;

    let recorded = if response.status().is_success() {
        catalog.record_success()
    } else {
        catalog.record_error()
    };
    if let Err(err) = recorded {
        warn!(error = %err, "failed to count request outcome");
    }

    response
}

fn json_response(status: StatusCode, body: Vec<u8>) -> Response {
    (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
}
