//! The `Directory` trait and backend error contract.
//!
//! The trait is implemented by storage backends (e.g.
//! `gatehouse-store-sqlite`). The pipeline depends on this abstraction, not
//! on any concrete backend.
//!
//! Uniqueness of user email, user external subject, and company domain is
//! part of the contract: concurrent first-login provisioning relies on the
//! backend refusing duplicate rows and reporting the refusal distinctly
//! (see [`DirectoryError::is_unique_violation`]).

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  company::{Company, NewCompany},
  session::{NewSession, Session},
  user::{NewUser, ProfilePatch, User},
};

/// Backend error contract.
///
/// `is_unique_violation` distinguishes "someone else created this row
/// first" — a recoverable signal during provisioning — from real failures.
pub trait DirectoryError: std::error::Error + Send + Sync + 'static {
  fn is_unique_violation(&self) -> bool;
}

/// Abstraction over the persistent store of users, companies, and sessions.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait Directory: Send + Sync {
  type Error: DirectoryError;

  // ── Users ─────────────────────────────────────────────────────────────

  fn user_by_id(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  fn user_by_subject<'a>(
    &'a self,
    subject: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  fn user_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  /// Create and persist a user. The store assigns the id and creation
  /// timestamp. Fails with a unique violation if the email or external
  /// subject is already taken.
  fn create_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  /// Backfill profile fields. `None` fields are left untouched.
  fn update_user_profile(
    &self,
    user_id: Uuid,
    patch: ProfilePatch,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Companies ─────────────────────────────────────────────────────────

  fn company_by_domain<'a>(
    &'a self,
    domain: &'a str,
  ) -> impl Future<Output = Result<Option<Company>, Self::Error>> + Send + 'a;

  /// Create a company together with its domain claims. Fails with a unique
  /// violation if any domain is already claimed; no partial company is
  /// left behind.
  fn create_company(
    &self,
    input: NewCompany,
  ) -> impl Future<Output = Result<Company, Self::Error>> + Send + '_;

  // ── Sessions ──────────────────────────────────────────────────────────

  fn sessions_for_user(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Session>, Self::Error>> + Send + '_;

  /// Create and persist a session. The store assigns the opaque id and the
  /// created/last-accessed timestamps.
  fn create_session(
    &self,
    input: NewSession,
  ) -> impl Future<Output = Result<Session, Self::Error>> + Send + '_;

  fn session_by_id(
    &self,
    session_id: Uuid,
  ) -> impl Future<Output = Result<Option<Session>, Self::Error>> + Send + '_;

  /// Update a session's last-accessed timestamp. Best-effort from the
  /// caller's point of view; failures are logged, not surfaced.
  fn touch_session(
    &self,
    session_id: Uuid,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
