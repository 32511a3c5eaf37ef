//! Identity — the minimal session record of an authenticated principal.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An authenticated principal. Owned by the session store; read-only
/// everywhere else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
  pub id:                 Uuid,
  pub email:              String,
  /// Set once the identity service has seen the address confirmed.
  pub email_confirmed_at: Option<DateTime<Utc>>,
}

impl Identity {
  pub fn is_confirmed(&self) -> bool { self.email_confirmed_at.is_some() }
}

/// A plaintext password on its way to the identity service.
///
/// Not `Serialize`, and `Debug` is redacted, so it cannot leak into a
/// profile, a cache entry, or a log line by accident.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Password(String);

impl Password {
  pub fn new(raw: impl Into<String>) -> Self { Self(raw.into()) }

  pub fn expose(&self) -> &str { &self.0 }

  /// Length in characters, as the minimum-length policy counts it.
  pub fn len(&self) -> usize { self.0.chars().count() }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }
}

impl fmt::Debug for Password {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("Password(***)")
  }
}

impl From<&str> for Password {
  fn from(raw: &str) -> Self { Self::new(raw) }
}

impl From<String> for Password {
  fn from(raw: String) -> Self { Self(raw) }
}

/// Email/password pair handed to registration or login.
#[derive(Debug, Clone)]
pub struct Credentials {
  pub email:    String,
  pub password: Password,
}
