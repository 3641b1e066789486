//! Trusted key sources for assertion verification.

use std::time::Duration;

use async_trait::async_trait;
use gatehouse_core::AuthError;
use jsonwebtoken::jwk::JwkSet;

/// A source of the perimeter provider's current signing keys.
///
/// Keys are fetched per validation. A failing source is an infrastructure
/// fault and surfaces as `Internal`, never as `Unauthorized`.
#[async_trait]
pub trait KeySource: Send + Sync {
  async fn fetch(&self) -> Result<JwkSet, AuthError>;
}

/// Fetches the JWKS from the provider's well-known endpoint.
pub struct HttpKeySource {
  client: reqwest::Client,
  url:    String,
}

impl HttpKeySource {
  /// `timeout` bounds the whole fetch, connect included.
  pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, AuthError> {
    let client = reqwest::Client::builder()
      .timeout(timeout)
      .build()
      .map_err(|e| AuthError::Internal(format!("key-source client: {e}")))?;
    Ok(Self { client, url: url.into() })
  }
}

#[async_trait]
impl KeySource for HttpKeySource {
  async fn fetch(&self) -> Result<JwkSet, AuthError> {
    tracing::debug!(url = %self.url, "fetching perimeter signing keys");
    let response = self
      .client
      .get(&self.url)
      .send()
      .await
      .and_then(|r| r.error_for_status())
      .map_err(|e| AuthError::Internal(format!("key fetch from {} failed: {e}", self.url)))?;

    response
      .json::<JwkSet>()
      .await
      .map_err(|e| AuthError::Internal(format!("key set from {} undecodable: {e}", self.url)))
  }
}

/// A fixed, in-memory key set.
#[derive(Clone)]
pub struct StaticKeySource(pub JwkSet);

#[async_trait]
impl KeySource for StaticKeySource {
  async fn fetch(&self) -> Result<JwkSet, AuthError> { Ok(self.0.clone()) }
}
