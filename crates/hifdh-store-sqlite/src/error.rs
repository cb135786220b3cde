//! Error type for `hifdh-store-sqlite`.

use hifdh_core::store::StoreFailure;
use rusqlite::ErrorCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] hifdh_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored discriminant (role, reading quality) no release ever wrote.
  #[error("cannot decode stored value: {0}")]
  Decode(String),

  #[error("email already registered: {0}")]
  EmailTaken(String),

  #[error("profile not found: {0}")]
  ProfileNotFound(uuid::Uuid),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The underlying SQLite error code, if this error carries one.
fn sqlite_code(err: &tokio_rusqlite::Error) -> Option<ErrorCode> {
  match err {
    tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(e, _)) => {
      Some(e.code)
    }
    _ => None,
  }
}

/// Another writer holds the file right now; the same call can succeed a
/// moment later.
pub(crate) fn is_busy(err: &tokio_rusqlite::Error) -> bool {
  matches!(
    sqlite_code(err),
    Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked)
  )
}

impl StoreFailure for Error {
  fn is_transient(&self) -> bool {
    matches!(self, Self::Database(e) if is_busy(e))
  }

  fn is_permission(&self) -> bool {
    matches!(
      self,
      Self::Database(e) if matches!(
        sqlite_code(e),
        Some(
          ErrorCode::PermissionDenied
            | ErrorCode::ReadOnly
            | ErrorCode::CannotOpen
        )
      )
    )
  }

  fn is_conflict(&self) -> bool { matches!(self, Self::EmailTaken(_)) }

  fn is_missing(&self) -> bool { matches!(self, Self::ProfileNotFound(_)) }
}
