//! Handlers for the minimal authenticated surface.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/me` | The session's user, resolved fresh from the directory |
//! | `GET`  | `/healthz` | Liveness, unauthenticated |

use axum::{Json, extract::State};
use gatehouse_core::{AuthError, directory::Directory};
use serde::Serialize;
use uuid::Uuid;

use crate::{AppState, context::CurrentSession, error::ApiError};

#[derive(Debug, Serialize)]
pub struct MeResponse {
  pub user_id:      Uuid,
  pub email:        String,
  pub first_name:   String,
  pub last_name:    String,
  pub display_name: Option<String>,
  pub avatar_url:   Option<String>,
  pub company_id:   Uuid,
  pub session_id:   Uuid,
}

/// `GET /me`
pub async fn me<D>(
  State(state): State<AppState<D>>,
  CurrentSession(session): CurrentSession,
) -> Result<Json<MeResponse>, ApiError>
where
  D: Directory + Clone + Send + Sync + 'static,
{
  let user = state
    .directory
    .user_by_id(session.user_id)
    .await
    .map_err(AuthError::directory)?
    .ok_or_else(|| {
      AuthError::Unauthorized(format!("session user {} not found", session.user_id))
    })?;

  Ok(Json(MeResponse {
    user_id:      user.user_id,
    email:        user.email,
    first_name:   user.first_name,
    last_name:    user.last_name,
    display_name: user.display_name,
    avatar_url:   user.avatar_url,
    company_id:   user.company_id,
    session_id:   session.session_id,
  }))
}

/// `GET /healthz`
pub async fn healthz() -> &'static str { "ok" }
