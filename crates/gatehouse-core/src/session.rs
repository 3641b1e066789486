//! Session — the durable login record and its lifecycle policy.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  AuthError, Result,
  directory::Directory,
};

/// Name of the client-side cookie mirroring the session id.
pub const SESSION_COOKIE: &str = "session";

/// Default validity window for a freshly created session.
pub const DEFAULT_VALIDITY_DAYS: i64 = 30;

/// A durable login record. The id is opaque and generated at creation — it
/// is never derived from any token claim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
  pub session_id:       Uuid,
  pub user_id:          Uuid,
  pub expires_at:       DateTime<Utc>,
  pub client_ip:        Option<String>,
  pub user_agent:       Option<String>,
  pub created_at:       DateTime<Utc>,
  pub last_accessed_at: DateTime<Utc>,
}

impl Session {
  pub fn is_expired(&self, now: DateTime<Utc>) -> bool { self.expires_at <= now }
}

/// Input for [`Directory::create_session`]. The store assigns the opaque id
/// and the timestamps.
#[derive(Debug, Clone)]
pub struct NewSession {
  pub user_id:    Uuid,
  pub expires_at: DateTime<Utc>,
  pub client_ip:  Option<String>,
  pub user_agent: Option<String>,
}

/// The minimal per-request view of a resolved session.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SessionHandle {
  pub session_id: Uuid,
  pub user_id:    Uuid,
}

impl From<&Session> for SessionHandle {
  fn from(s: &Session) -> Self {
    Self { session_id: s.session_id, user_id: s.user_id }
  }
}

/// Client metadata recorded when a session is created.
#[derive(Debug, Clone, Default)]
pub struct ClientMeta {
  pub ip:         Option<String>,
  pub user_agent: Option<String>,
}

// ─── Policy ──────────────────────────────────────────────────────────────────

/// Session lifecycle policy, fixed at startup.
#[derive(Debug, Clone)]
pub struct SessionPolicy {
  /// Validity window applied to newly created sessions.
  pub validity:      Duration,
  /// Legacy behavior: hand back the most recent session even when it has
  /// already expired. Off by default — expired sessions are replaced.
  pub reuse_expired: bool,
}

impl Default for SessionPolicy {
  fn default() -> Self {
    Self {
      validity:      Duration::days(DEFAULT_VALIDITY_DAYS),
      reuse_expired: false,
    }
  }
}

// ─── Manager ─────────────────────────────────────────────────────────────────

/// Finds or creates durable sessions on top of any [`Directory`].
pub struct SessionManager<D> {
  directory: Arc<D>,
  policy:    SessionPolicy,
}

impl<D> SessionManager<D>
where
  D: Directory,
{
  pub fn new(directory: Arc<D>, policy: SessionPolicy) -> Self {
    Self { directory, policy }
  }

  /// Return the user's current session, creating one when none is usable.
  ///
  /// The most recently created session wins. An unexpired session is
  /// returned as-is — stored expiry, no renewal. An expired one is replaced
  /// unless the legacy `reuse_expired` policy is on.
  pub async fn find_or_create(
    &self,
    user_id: Uuid,
    meta: &ClientMeta,
  ) -> Result<Session> {
    let mut sessions = self
      .directory
      .sessions_for_user(user_id)
      .await
      .map_err(AuthError::directory)?;
    sessions.sort_by_key(|s| s.created_at);

    if let Some(current) = sessions.pop() {
      if self.policy.reuse_expired || !current.is_expired(Utc::now()) {
        return Ok(current);
      }
      tracing::debug!(
        user_id = %user_id,
        session_id = %current.session_id,
        "most recent session expired, replacing"
      );
    }

    let session = self
      .directory
      .create_session(NewSession {
        user_id,
        expires_at: Utc::now() + self.policy.validity,
        client_ip: meta.ip.clone(),
        user_agent: meta.user_agent.clone(),
      })
      .await
      .map_err(AuthError::directory)?;

    tracing::info!(user_id = %user_id, session_id = %session.session_id, "session created");
    Ok(session)
  }

  /// Resolve a cookie-carried session id to its minimal view.
  ///
  /// Lookup and last-accessed touch are deliberately separate so the caller
  /// can run the touch off the request path.
  pub async fn validate_cookie(&self, session_id: Uuid) -> Result<SessionHandle> {
    let session = self
      .directory
      .session_by_id(session_id)
      .await
      .map_err(AuthError::directory)?
      .ok_or_else(|| AuthError::Unauthorized(format!("unknown session {session_id}")))?;
    Ok(SessionHandle::from(&session))
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;
  use crate::testing::MemoryDirectory;

  fn manager(directory: Arc<MemoryDirectory>) -> SessionManager<MemoryDirectory> {
    SessionManager::new(directory, SessionPolicy::default())
  }

  #[tokio::test]
  async fn creates_session_when_none_exists() {
    let dir = Arc::new(MemoryDirectory::new());
    let mgr = manager(dir.clone());
    let user_id = Uuid::new_v4();

    let session = mgr.find_or_create(user_id, &ClientMeta::default()).await.unwrap();
    assert_eq!(session.user_id, user_id);
    assert!(session.expires_at > Utc::now() + Duration::days(29));
  }

  #[tokio::test]
  async fn second_call_reuses_the_same_session() {
    let dir = Arc::new(MemoryDirectory::new());
    let mgr = manager(dir.clone());
    let user_id = Uuid::new_v4();

    let first = mgr.find_or_create(user_id, &ClientMeta::default()).await.unwrap();
    let second = mgr.find_or_create(user_id, &ClientMeta::default()).await.unwrap();

    assert_eq!(first.session_id, second.session_id);
    // Reuse, not renewal: the stored expiry is unchanged.
    assert_eq!(first.expires_at, second.expires_at);
  }

  #[tokio::test]
  async fn expired_session_is_replaced_by_default() {
    let dir = Arc::new(MemoryDirectory::new());
    let mgr = manager(dir.clone());
    let user_id = Uuid::new_v4();

    let stale = dir
      .insert_session(user_id, Utc::now() - Duration::hours(1))
      .await;

    let fresh = mgr.find_or_create(user_id, &ClientMeta::default()).await.unwrap();
    assert_ne!(fresh.session_id, stale.session_id);
    assert!(!fresh.is_expired(Utc::now()));
  }

  #[tokio::test]
  async fn expired_session_is_reused_under_legacy_policy() {
    let dir = Arc::new(MemoryDirectory::new());
    let mgr = SessionManager::new(
      dir.clone(),
      SessionPolicy { reuse_expired: true, ..SessionPolicy::default() },
    );
    let user_id = Uuid::new_v4();

    let stale = dir
      .insert_session(user_id, Utc::now() - Duration::hours(1))
      .await;

    let got = mgr.find_or_create(user_id, &ClientMeta::default()).await.unwrap();
    assert_eq!(got.session_id, stale.session_id);
  }

  #[tokio::test]
  async fn most_recently_created_session_wins() {
    let dir = Arc::new(MemoryDirectory::new());
    let mgr = manager(dir.clone());
    let user_id = Uuid::new_v4();

    let _older = dir.insert_session(user_id, Utc::now() + Duration::days(10)).await;
    let newer = dir.insert_session(user_id, Utc::now() + Duration::days(5)).await;

    let got = mgr.find_or_create(user_id, &ClientMeta::default()).await.unwrap();
    assert_eq!(got.session_id, newer.session_id);
  }

  #[tokio::test]
  async fn validate_cookie_unknown_session_is_unauthorized() {
    let dir = Arc::new(MemoryDirectory::new());
    let mgr = manager(dir);

    let err = mgr.validate_cookie(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, AuthError::Unauthorized(_)));
  }

  #[tokio::test]
  async fn validate_cookie_returns_minimal_view() {
    let dir = Arc::new(MemoryDirectory::new());
    let mgr = manager(dir.clone());
    let user_id = Uuid::new_v4();

    let session = dir.insert_session(user_id, Utc::now() + Duration::days(1)).await;
    let handle = mgr.validate_cookie(session.session_id).await.unwrap();

    assert_eq!(handle.session_id, session.session_id);
    assert_eq!(handle.user_id, user_id);
  }
}
