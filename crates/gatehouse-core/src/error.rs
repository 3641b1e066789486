//! The authentication failure taxonomy shared by every pipeline stage.
//!
//! Components raise these; they never write HTTP responses. The single
//! boundary translator in `gatehouse-http` maps each kind to a status code
//! and body.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
  /// Missing, invalid, or expired credentials. Maps to 401.
  #[error("unauthorized: {0}")]
  Unauthorized(String),

  /// The presented identity is malformed (e.g. an email with no domain).
  /// Maps to 400.
  #[error("bad request: {0}")]
  BadRequest(String),

  /// No company is registered for the requester's email domain. Maps to 403.
  #[error("no company registered for domain {domain:?}")]
  UnknownDomain { domain: String },

  /// Deployment misconfiguration or infrastructure fault — never the
  /// caller's fault. Maps to 500.
  #[error("internal error: {0}")]
  Internal(String),

  /// An unclassified directory failure. The gate logs these and fails
  /// closed with a 401.
  #[error("directory error: {0}")]
  Directory(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl AuthError {
  /// Wrap a backend error without losing its source chain.
  pub fn directory<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    AuthError::Directory(Box::new(err))
  }
}

pub type Result<T, E = AuthError> = std::result::Result<T, E>;
