//! The request-scoped context attached by the authentication gate.

use axum::{extract::FromRequestParts, http::request::Parts};
use gatehouse_core::{AuthError, identity::Identity, session::SessionHandle};

use crate::error::ApiError;

/// Set exactly once per request by the gate. Downstream handlers read this
/// instead of re-validating anything.
///
/// Both fields stay `None` only on the cookie path with pass-through
/// enabled; the fields are never reassigned after the gate runs.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
  pub identity: Option<Identity>,
  pub session:  Option<SessionHandle>,
}

/// Extractor for handlers that require an authenticated session.
pub struct CurrentSession(pub SessionHandle);

impl<S> FromRequestParts<S> for CurrentSession
where
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    _state: &S,
  ) -> Result<Self, Self::Rejection> {
    parts
      .extensions
      .get::<RequestContext>()
      .and_then(|ctx| ctx.session)
      .map(CurrentSession)
      .ok_or_else(|| {
        ApiError(AuthError::Unauthorized("no session on this request".to_string()))
      })
  }
}
