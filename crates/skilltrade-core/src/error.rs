//! Error types for `skilltrade-core`.
//!
//! Each service boundary has its own error enum. Backends keep their internal
//! error types and hand them across the boundary boxed in a `Backend` variant.

use thiserror::Error;
use uuid::Uuid;

/// A backend failure carried across a service boundary.
pub type BackendError = Box<dyn std::error::Error + Send + Sync>;

/// Client-side form validation failure. No remote call has been made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
  #[error("please fill in all required fields ({0} is missing)")]
  MissingField(&'static str),

  #[error("{0:?} is not a valid email address")]
  InvalidEmail(String),

  #[error("password must be at least {min} characters")]
  PasswordTooShort { min: usize },
}

/// Rejection from the identity service.
#[derive(Debug, Error)]
pub enum AuthError {
  #[error("email and password are required")]
  MissingCredentials,

  #[error("an account already exists for {0}")]
  AccountExists(String),

  #[error("invalid email or password")]
  InvalidCredentials,

  #[error("password must be at least {min} characters")]
  WeakPassword { min: usize },

  #[error("identity service error: {0}")]
  Backend(#[source] BackendError),
}

/// Media upload failure. Never fatal to the surrounding workflow.
#[derive(Debug, Error)]
pub enum StorageError {
  #[error("unsupported media type {0:?}; expected an image")]
  UnsupportedType(String),

  #[error("refusing to store an empty file")]
  Empty,

  #[error("media i/o error: {0}")]
  Io(#[from] std::io::Error),

  #[error("media service error: {0}")]
  Backend(#[source] BackendError),
}

/// Rejection from the profile store or the persistence service.
#[derive(Debug, Error)]
pub enum ProfileError {
  #[error("user not authenticated")]
  NotAuthenticated,

  #[error("no profile exists for the signed-in user")]
  NoProfile,

  #[error("profile is owned by {found}, not by the signed-in user {expected}")]
  OwnerMismatch { expected: Uuid, found: Uuid },

  #[error("a profile already exists for user {0}")]
  AlreadyExists(Uuid),

  #[error("profile not found: {0}")]
  NotFound(Uuid),

  #[error("failed to upload image: {0}")]
  Storage(#[from] StorageError),

  #[error("persistence service error: {0}")]
  Backend(#[source] BackendError),
}
