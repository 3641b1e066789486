//! Boundary translation from [`AuthError`] to HTTP responses.
//!
//! This is the single place failure kinds become status codes and JSON
//! bodies; components never shape responses themselves.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use gatehouse_core::AuthError;
use serde::Serialize;

/// An [`AuthError`] leaving the pipeline through HTTP.
#[derive(Debug)]
pub struct ApiError(pub AuthError);

impl From<AuthError> for ApiError {
  fn from(err: AuthError) -> Self { Self(err) }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
  message: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  details: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  domain:  Option<String>,
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, body) = match self.0 {
      AuthError::Unauthorized(details) => (
        StatusCode::UNAUTHORIZED,
        ErrorBody {
          message: "unauthorized".to_string(),
          details: Some(details),
          domain:  None,
        },
      ),
      AuthError::BadRequest(message) => (
        StatusCode::BAD_REQUEST,
        ErrorBody { message, details: None, domain: None },
      ),
      AuthError::UnknownDomain { domain } => (
        StatusCode::FORBIDDEN,
        ErrorBody {
          message: format!("no company is registered for {domain}"),
          details: Some(
            "ask an administrator to register this email domain before signing in"
              .to_string(),
          ),
          domain:  Some(domain),
        },
      ),
      AuthError::Internal(details) => {
        tracing::error!(details = %details, "internal authentication fault");
        (
          StatusCode::INTERNAL_SERVER_ERROR,
          ErrorBody {
            message: "internal server error".to_string(),
            details: None,
            domain:  None,
          },
        )
      }
      AuthError::Directory(source) => {
        // The gate normally downgrades these before they reach the
        // boundary; anything left still fails closed.
        tracing::error!(error = %source, "directory failure reached the response boundary");
        (
          StatusCode::UNAUTHORIZED,
          ErrorBody {
            message: "unauthorized".to_string(),
            details: None,
            domain:  None,
          },
        )
      }
    };
    (status, Json(body)).into_response()
  }
}
