//! Perimeter assertion handling for Gatehouse.
//!
//! Verifies the signed identity assertion forwarded by the trusted proxy
//! (Google Cloud IAP or equivalent) and turns it into an
//! [`Identity`](gatehouse_core::identity::Identity). The validator mode is
//! selected once at startup and fixed for the process lifetime.

pub mod audience;
pub mod claims;
pub mod keys;
pub mod validator;

pub use audience::{AudienceConfig, resolve_audience};
pub use claims::{ASSERTION_HEADER, DEV_AUDIENCE, ISSUER, PUBLIC_KEY_URL};
pub use keys::{HttpKeySource, KeySource, StaticKeySource};
pub use validator::{AssertionVerifier, DevIdentity, IapConfig, IdentityValidator};
