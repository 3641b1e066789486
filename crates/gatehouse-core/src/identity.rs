//! Identity — the request-scoped result of a verified assertion.
//!
//! An identity lives only as long as the request that produced it. The
//! durable counterpart is the [`User`](crate::user::User) row it resolves
//! to during provisioning.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A verified perimeter identity.
///
/// Invariant: `email` and `subject` are non-empty once validation succeeds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
  pub email:        String,
  /// Provider-namespaced opaque id, e.g. `accounts.google.com:1234`.
  pub subject:      String,
  pub display_name: Option<String>,
  pub avatar_url:   Option<String>,
  pub audience:     String,
  pub issuer:       String,
  pub issued_at:    DateTime<Utc>,
  pub expires_at:   DateTime<Utc>,
}

impl Identity {
  /// The text after `@`, lowercased. `None` when the email has no domain.
  pub fn email_domain(&self) -> Option<String> { email_domain(&self.email) }
}

/// Extract the domain part of an email address.
pub fn email_domain(email: &str) -> Option<String> {
  let (_, domain) = email.rsplit_once('@')?;
  if domain.is_empty() {
    return None;
  }
  Some(domain.to_ascii_lowercase())
}
