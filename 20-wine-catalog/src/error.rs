use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Every failure a client can observe.
///
/// The `Display` text is sent verbatim as the `message` field of the JSON
/// error body, so keep it short and stable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("invalid start/count param")]
    InvalidWindow,
    #[error("index out of range")]
    StartOutOfRange,
    #[error("index + count out of range")]
    WindowOutOfRange,
    #[error("id not available")]
    IdNotAvailable,
    #[error("couldn't parse id from path")]
    InvalidId,
    #[error("couldn't decode json")]
    InvalidBody,
    #[error("no valid title in wine json")]
    MissingTitle,
    #[error("failed to encode response")]
    Encoding,
    #[error("not allowed")]
    NotAllowed,
    #[error("not found")]
    NotFound,
    #[error("catalog manager unavailable")]
    ManagerUnavailable,
    #[error("catalog manager timed out")]
    Timeout,
}

impl CatalogError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::ManagerUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::Timeout => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(_: serde_json::Error) -> Self {
        Self::Encoding
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for CatalogError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            message: self.to_string(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}
