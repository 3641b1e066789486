//! Session cookie shaping.

use gatehouse_core::session::{SESSION_COOKIE, Session};
use tower_cookies::{
  Cookie,
  cookie::{SameSite, time::OffsetDateTime},
};

/// Build the client-side cookie mirroring a session.
///
/// A reissued cookie carries the session's stored expiry, not a refreshed
/// one. `secure` should be on everywhere outside local development.
pub fn session_cookie(session: &Session, secure: bool) -> Cookie<'static> {
  let expires = OffsetDateTime::from_unix_timestamp(session.expires_at.timestamp())
    .unwrap_or(OffsetDateTime::UNIX_EPOCH);

  Cookie::build((SESSION_COOKIE, session.session_id.to_string()))
    .path("/")
    .http_only(true)
    .secure(secure)
    .same_site(SameSite::Lax)
    .expires(expires)
    .build()
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::{Duration, Utc};
  use uuid::Uuid;

  fn session() -> Session {
    let now = Utc::now();
    Session {
      session_id:       Uuid::new_v4(),
      user_id:          Uuid::new_v4(),
      expires_at:       now + Duration::days(30),
      client_ip:        None,
      user_agent:       None,
      created_at:       now,
      last_accessed_at: now,
    }
  }

  #[test]
  fn cookie_carries_the_session_id_and_flags() {
    let s = session();
    let cookie = session_cookie(&s, true);

    assert_eq!(cookie.name(), SESSION_COOKIE);
    assert_eq!(cookie.value(), s.session_id.to_string());
    assert_eq!(cookie.path(), Some("/"));
    assert_eq!(cookie.http_only(), Some(true));
    assert_eq!(cookie.secure(), Some(true));
    assert_eq!(cookie.same_site(), Some(SameSite::Lax));
  }

  #[test]
  fn expiry_matches_the_stored_session_expiry() {
    let s = session();
    let cookie = session_cookie(&s, false);
    let expires = cookie.expires_datetime().expect("expiry set");
    assert_eq!(expires.unix_timestamp(), s.expires_at.timestamp());
    assert_eq!(cookie.secure(), Some(false));
  }
}
