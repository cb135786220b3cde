//! Error handling for the HTTP API.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use hifdh_core::store::StoreFailure;
use serde_json::json;

use crate::auth::AuthError;

/// Error type for API handlers.
///
/// Converts into an HTTP response with a JSON body `{ "error": "<message>" }`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
  /// Missing or unverifiable credentials.
  #[error("authentication required")]
  Unauthorized,
  /// The caller is signed in but may not touch this record.
  #[error("you do not have access to this record")]
  Forbidden,
  /// The requested record does not exist.
  #[error("not found: {0}")]
  NotFound(String),
  /// The request was malformed.
  #[error("bad request: {0}")]
  BadRequest(String),
  /// The request is valid but clashes with current state, e.g. writing a
  /// log under a day that is not today.
  #[error("conflict: {0}")]
  Conflict(String),
  /// A sign-up or login failure, already worded for the end user.
  #[error("{0}")]
  Auth(#[from] AuthError),
  /// The store is briefly unavailable; the same request should work on a
  /// retry.
  #[error("temporarily unavailable, please try again")]
  Unavailable,
  /// The store refused access to its own files. Retrying will not help.
  #[error("storage is not writable; contact the operator")]
  StorePermission,
  /// Any other store failure.
  #[error("store error: {0}")]
  Store(Box<dyn std::error::Error + Send + Sync + 'static>),
}

impl ApiError {
  /// Sort a backend failure into the response class it deserves, using the
  /// store's own classification of itself.
  pub(crate) fn store<E>(err: E) -> Self
  where
    E: StoreFailure + Send + Sync + 'static,
  {
    if err.is_transient() {
      ApiError::Unavailable
    } else if err.is_permission() {
      ApiError::StorePermission
    } else if err.is_missing() {
      ApiError::NotFound(err.to_string())
    } else if err.is_conflict() {
      ApiError::Conflict(err.to_string())
    } else {
      ApiError::Store(Box::new(err))
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    if let ApiError::Store(err) = &self {
      tracing::error!(error = %err, "request failed against the store");
    }

    let status = match &self {
      ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
      ApiError::Forbidden => StatusCode::FORBIDDEN,
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::Conflict(_) => StatusCode::CONFLICT,
      ApiError::Auth(err) => err.status(),
      ApiError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
      ApiError::StorePermission | ApiError::Store(_) => {
        StatusCode::INTERNAL_SERVER_ERROR
      }
    };

    let body = Json(json!({ "error": self.to_string() }));
    let mut response = (status, body).into_response();

    // Basic-auth clients expect a challenge alongside the 401.
    if matches!(self, ApiError::Unauthorized) {
      response.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static("Basic realm=\"hifdh\""),
      );
    }

    response
  }
}
