//! The authentication gate — middleware sequencing the pipeline.
//!
//! One gate runs per inbound request: resolve an identity, resolve a user,
//! resolve a session, attach the context. The gate propagates typed
//! failures unmodified except for directory faults, which are logged here
//! and failed closed as 401s.

use axum::{
  extract::{Request, State},
  http::HeaderMap,
  middleware::Next,
  response::Response,
};
use gatehouse_core::{
  AuthError,
  directory::Directory,
  session::{ClientMeta, SESSION_COOKIE, SessionHandle},
};
use gatehouse_iap::ASSERTION_HEADER;
use tower_cookies::Cookies;
use uuid::Uuid;

use crate::{AppState, context::RequestContext, cookie::session_cookie, error::ApiError};

// ─── Mode registry ───────────────────────────────────────────────────────────

/// Known gate modes. Configuration selects one by key at startup; an
/// unknown key fails boot, not the first request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateMode {
  /// Perimeter-assertion pipeline: validate, provision, session.
  Iap,
  /// Cookie-carried sessions from clients that already logged in.
  SessionCookie,
}

/// Registry of configuration keys to gate modes.
pub const GATE_MODES: &[(&str, GateMode)] = &[
  ("iap", GateMode::Iap),
  ("session-cookie", GateMode::SessionCookie),
];

#[derive(Debug, thiserror::Error)]
#[error("unknown auth mode {0:?} (known modes: iap, session-cookie)")]
pub struct UnknownGateMode(pub String);

impl GateMode {
  pub fn from_key(key: &str) -> Result<Self, UnknownGateMode> {
    GATE_MODES
      .iter()
      .find(|(k, _)| *k == key)
      .map(|(_, mode)| *mode)
      .ok_or_else(|| UnknownGateMode(key.to_string()))
  }
}

// ─── Middleware ──────────────────────────────────────────────────────────────

/// Authenticate one request and attach its [`RequestContext`].
pub async fn authenticate<D>(
  State(state): State<AppState<D>>,
  cookies: Cookies,
  mut req: Request,
  next: Next,
) -> Result<Response, ApiError>
where
  D: Directory + Clone + Send + Sync + 'static,
{
  let context = match state.mode {
    GateMode::Iap => iap_context(&state, &cookies, req.headers()).await,
    GateMode::SessionCookie => cookie_context(&state, &cookies).await,
  }
  .map_err(fail_closed)?;

  req.extensions_mut().insert(context);
  Ok(next.run(req).await)
}

/// The assertion pipeline: validate, provision, find-or-create session.
async fn iap_context<D>(
  state: &AppState<D>,
  cookies: &Cookies,
  headers: &HeaderMap,
) -> Result<RequestContext, AuthError>
where
  D: Directory,
{
  let assertion = headers
    .get(ASSERTION_HEADER)
    .and_then(|value| value.to_str().ok());

  let identity = state.validator.validate(assertion).await?;
  let user = state.provisioning.provision(&identity).await?;
  let session = state
    .sessions
    .find_or_create(user.user_id, &client_meta(headers))
    .await?;

  cookies.add(session_cookie(&session, state.config.session.secure_cookies));

  Ok(RequestContext {
    identity: Some(identity),
    session:  Some(SessionHandle::from(&session)),
  })
}

/// The cookie path for clients that already carry a resolved session.
async fn cookie_context<D>(
  state: &AppState<D>,
  cookies: &Cookies,
) -> Result<RequestContext, AuthError>
where
  D: Directory + Clone + Send + Sync + 'static,
{
  let Some(cookie) = cookies.get(SESSION_COOKIE) else {
    if state.config.auth.pass_thru_without_session {
      return Ok(RequestContext::default());
    }
    return Err(AuthError::Unauthorized("no session cookie".to_string()));
  };

  let session_id = Uuid::parse_str(cookie.value())
    .map_err(|_| AuthError::Unauthorized("malformed session cookie".to_string()))?;

  let handle = state.sessions.validate_cookie(session_id).await?;

  // Touch last-accessed off the request path; a failed touch is logged,
  // never surfaced.
  let directory = state.directory.clone();
  tokio::spawn(async move {
    if let Err(e) = directory.touch_session(session_id, chrono::Utc::now()).await {
      tracing::warn!(session_id = %session_id, error = %e, "failed to touch session");
    }
  });

  Ok(RequestContext { identity: None, session: Some(handle) })
}

/// Directory failures fail closed: logged here, surfaced as 401.
fn fail_closed(err: AuthError) -> ApiError {
  match err {
    AuthError::Directory(source) => {
      tracing::error!(error = %source, "directory failure during authentication");
      ApiError(AuthError::Unauthorized("authentication unavailable".to_string()))
    }
    other => ApiError(other),
  }
}

fn client_meta(headers: &HeaderMap) -> ClientMeta {
  let ip = headers
    .get("x-forwarded-for")
    .and_then(|value| value.to_str().ok())
    .and_then(|value| value.split(',').next())
    .map(|value| value.trim().to_string());
  let user_agent = headers
    .get(axum::http::header::USER_AGENT)
    .and_then(|value| value.to_str().ok())
    .map(str::to_string);
  ClientMeta { ip, user_agent }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn every_registered_key_resolves() {
    for (key, mode) in GATE_MODES {
      assert_eq!(GateMode::from_key(key).unwrap(), *mode);
    }
  }

  #[test]
  fn unknown_key_is_rejected() {
    let err = GateMode::from_key("basic-auth").unwrap_err();
    assert_eq!(err.0, "basic-auth");
  }

  #[test]
  fn forwarded_for_takes_the_first_hop() {
    let mut headers = HeaderMap::new();
    headers.insert(
      "x-forwarded-for",
      "203.0.113.7, 10.0.0.1".parse().unwrap(),
    );
    headers.insert(axum::http::header::USER_AGENT, "curl/8".parse().unwrap());

    let meta = client_meta(&headers);
    assert_eq!(meta.ip.as_deref(), Some("203.0.113.7"));
    assert_eq!(meta.user_agent.as_deref(), Some("curl/8"));
  }

  #[test]
  fn absent_client_metadata_is_none() {
    let meta = client_meta(&HeaderMap::new());
    assert_eq!(meta.ip, None);
    assert_eq!(meta.user_agent, None);
  }
}
