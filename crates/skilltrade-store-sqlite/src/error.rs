//! Error type for `skilltrade-store-sqlite`.
//!
//! Callers of the service traits never see this type directly: it is boxed
//! into the `Backend` variant of the matching core error at the trait
//! boundary.

use skilltrade_core::{AuthError, ProfileError, StorageError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("unknown {column} value {value:?}")]
  UnknownVariant { column: &'static str, value: String },

  #[error("password hashing failed: {0}")]
  Hash(String),

  #[error("blocking task failed: {0}")]
  Task(#[from] tokio::task::JoinError),

  #[error("i/o error: {0}")]
  Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl From<argon2::password_hash::Error> for Error {
  fn from(e: argon2::password_hash::Error) -> Self { Self::Hash(e.to_string()) }
}

impl From<Error> for AuthError {
  fn from(e: Error) -> Self { Self::Backend(Box::new(e)) }
}

impl From<Error> for ProfileError {
  fn from(e: Error) -> Self { Self::Backend(Box::new(e)) }
}

impl From<Error> for StorageError {
  fn from(e: Error) -> Self {
    match e {
      Error::Io(io) => Self::Io(io),
      other => Self::Backend(Box::new(other)),
    }
  }
}
