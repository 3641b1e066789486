//! Assertion claims and the perimeter provider's protocol constants.

use chrono::{DateTime, Utc};
use gatehouse_core::{AuthError, identity::Identity};
use serde::{Deserialize, Serialize};

/// Request header carrying the signed assertion in enforced mode.
pub const ASSERTION_HEADER: &str = "x-goog-iap-jwt-assertion";

/// Issuer every accepted assertion must carry.
pub const ISSUER: &str = "https://cloud.google.com/iap";

/// Well-known endpoint publishing the perimeter's current signing keys.
pub const PUBLIC_KEY_URL: &str = "https://www.gstatic.com/iap/verify/public_key-jwk";

/// Audience and issuer stamped on synthesized development identities.
pub const DEV_AUDIENCE: &str = "dev-local";

/// The claims consumed from a verified assertion.
///
/// `email` and `sub` are optional here so a token that passes signature,
/// issuer, and audience checks but lacks a principal can still be decoded
/// and then rejected with a precise error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssertionClaims {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub email:   Option<String>,
  /// Format `"<issuer-domain>:<opaque-id>"`, e.g. `accounts.google.com:1234`.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub sub:     Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub name:    Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub picture: Option<String>,
  pub aud:     String,
  pub iss:     String,
  /// Epoch seconds.
  pub iat:     i64,
  /// Epoch seconds.
  pub exp:     i64,
}

impl AssertionClaims {
  /// Convert verified claims into an [`Identity`], rejecting tokens that
  /// carry no usable principal.
  pub fn into_identity(self) -> Result<Identity, AuthError> {
    let email = self
      .email
      .filter(|e| !e.is_empty())
      .ok_or_else(|| AuthError::Unauthorized("assertion has no email claim".into()))?;
    let subject = self
      .sub
      .filter(|s| !s.is_empty())
      .ok_or_else(|| AuthError::Unauthorized("assertion has no sub claim".into()))?;

    Ok(Identity {
      email,
      subject,
      display_name: self.name,
      avatar_url: self.picture,
      audience: self.aud,
      issuer: self.iss,
      issued_at: epoch(self.iat, "iat")?,
      expires_at: epoch(self.exp, "exp")?,
    })
  }
}

fn epoch(seconds: i64, claim: &str) -> Result<DateTime<Utc>, AuthError> {
  DateTime::<Utc>::from_timestamp(seconds, 0)
    .ok_or_else(|| AuthError::Unauthorized(format!("assertion {claim} claim is out of range")))
}
