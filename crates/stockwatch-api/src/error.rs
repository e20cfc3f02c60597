//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  extract::rejection::{JsonRejection, QueryRejection},
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde_json::json;
use stockwatch_core::Error as CoreError;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("unauthorized")]
  Unauthorized,

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error(transparent)]
  Core(#[from] CoreError),
}

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self { ApiError::BadRequest(rejection.body_text()) }
}

impl From<QueryRejection> for ApiError {
  fn from(rejection: QueryRejection) -> Self { ApiError::BadRequest(rejection.body_text()) }
}

impl ApiError {
  fn status(&self) -> StatusCode {
    match self {
      ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::Core(CoreError::Busy) => StatusCode::CONFLICT,
      ApiError::Core(CoreError::AreaNotFound(_) | CoreError::StoreNotFound(_)) => {
        StatusCode::NOT_FOUND
      }
      ApiError::Core(CoreError::StoreUnavailable(_) | CoreError::Source(_)) => {
        StatusCode::INTERNAL_SERVER_ERROR
      }
    }
  }

  fn category(&self) -> &'static str {
    match self {
      ApiError::Unauthorized => "unauthorized",
      ApiError::BadRequest(_) => "bad_request",
      ApiError::Core(e) => e.category(),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      tracing::error!(error = %self, "request failed");
    }

    let body = Json(json!({ "error": self.to_string(), "category": self.category() }));
    let mut res = (status, body).into_response();
    if matches!(self, ApiError::Unauthorized) {
      res.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static("Basic realm=\"stockwatch\""),
      );
    }
    res
  }
}
