//! Error types for `gatehouse-store-sqlite`.

use gatehouse_core::directory::DirectoryError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A UNIQUE constraint rejected a write. Provisioning treats this as a
  /// lost race, not a failure.
  #[error("unique constraint violated")]
  UniqueViolation,

  #[error("sqlite error: {0}")]
  Sqlite(tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("timestamp parse error: {0}")]
  DateParse(String),

  #[error("unknown creator tag: {0:?}")]
  UnknownCreator(String),
}

impl From<tokio_rusqlite::Error> for Error {
  fn from(e: tokio_rusqlite::Error) -> Self {
    if let tokio_rusqlite::Error::Rusqlite(inner) = &e
      && is_unique_violation(inner)
    {
      return Error::UniqueViolation;
    }
    Error::Sqlite(e)
  }
}

fn is_unique_violation(e: &rusqlite::Error) -> bool {
  matches!(
    e,
    rusqlite::Error::SqliteFailure(f, _)
      if f.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
        || f.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
  )
}

impl DirectoryError for Error {
  fn is_unique_violation(&self) -> bool {
    matches!(self, Error::UniqueViolation)
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
