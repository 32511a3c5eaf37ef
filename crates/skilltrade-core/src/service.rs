//! Service contracts the stores consume.
//!
//! Backends (e.g. `skilltrade-store-sqlite`) implement these traits. The
//! stores and the creation workflow depend on the abstractions only, so every
//! layer above can be exercised against substitutable fakes.

use std::future::Future;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  error::{AuthError, ProfileError, StorageError},
  identity::Identity,
  media::MediaMetadata,
  profile::{Profile, ProfilePatch},
};

/// The remote identity service: accounts and sessions.
///
/// All methods return `Send` futures so implementations can be driven from
/// spawned tasks on a multi-threaded runtime.
pub trait IdentityService: Send + Sync {
  /// Create an account and open a session for it.
  fn create_account<'a>(
    &'a self,
    email: &'a str,
    password: &'a str,
  ) -> impl Future<Output = Result<Identity, AuthError>> + Send + 'a;

  /// Authenticate against an existing account and open a session for it.
  fn authenticate<'a>(
    &'a self,
    email: &'a str,
    password: &'a str,
  ) -> impl Future<Output = Result<Identity, AuthError>> + Send + 'a;

  /// Return the identity of a session that survived from an earlier run, if
  /// any.
  fn restore_session(
    &self,
  ) -> impl Future<Output = Result<Option<Identity>, AuthError>> + Send + '_;

  /// Invalidate the current session. Ending a session that does not exist is
  /// not an error.
  fn end_session(&self) -> impl Future<Output = Result<(), AuthError>> + Send + '_;
}

/// The remote persistence service for profiles.
pub trait ProfileRepository: Send + Sync {
  /// The profile owned by `user_id`. `None` is "no profile yet", not an
  /// error.
  fn fetch_profile(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<Profile>, ProfileError>> + Send + '_;

  /// Persist a complete profile and return the stored form.
  fn save_profile(
    &self,
    profile: Profile,
  ) -> impl Future<Output = Result<Profile, ProfileError>> + Send + '_;

  /// Merge `patch` onto the stored profile `id`, stamping `updated_at`, and
  /// return the merged result.
  fn merge_profile<'a>(
    &'a self,
    id: Uuid,
    patch: &'a ProfilePatch,
    updated_at: DateTime<Utc>,
  ) -> impl Future<Output = Result<Profile, ProfileError>> + Send + 'a;
}

/// The remote media storage service.
pub trait MediaStorage: Send + Sync {
  /// Store `bytes` and return a stable URL referencing them.
  fn store(
    &self,
    bytes: Bytes,
    metadata: MediaMetadata,
  ) -> impl Future<Output = Result<String, StorageError>> + Send + '_;
}
