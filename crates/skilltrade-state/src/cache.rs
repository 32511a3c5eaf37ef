//! Local cache of session artifacts.
//!
//! Views may keep small snapshots (an "is authenticated" flag, the last seen
//! profile, the user's posts) between runs. None of it may survive a session
//! boundary: [`SessionStore::logout`](crate::session::SessionStore::logout)
//! purges every [`CacheKey`].

use std::{
  collections::HashMap,
  io,
  sync::{Mutex, PoisonError},
};

use serde_json::Value;

/// The artifacts a client may cache for the signed-in user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
  IsAuthenticated,
  UserProfile,
  UserPosts,
}

impl CacheKey {
  pub const ALL: [CacheKey; 3] =
    [CacheKey::IsAuthenticated, CacheKey::UserProfile, CacheKey::UserPosts];

  /// Stable name, usable as a file name or storage key.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::IsAuthenticated => "is_authenticated",
      Self::UserProfile => "user_profile",
      Self::UserPosts => "user_posts",
    }
  }
}

/// A synchronous key/value cache local to this client.
pub trait LocalCache: Send + Sync {
  fn get(&self, key: CacheKey) -> Option<Value>;

  fn put(&self, key: CacheKey, value: Value) -> io::Result<()>;

  /// Removing a key that is not present is not an error.
  fn remove(&self, key: CacheKey) -> io::Result<()>;

  /// Drop every session artifact. Keeps going after a failed removal and
  /// reports the first error.
  fn purge_session(&self) -> io::Result<()> {
    let mut first_err = None;
    for key in CacheKey::ALL {
      if let Err(e) = self.remove(key) {
        first_err.get_or_insert(e);
      }
    }
    first_err.map_or(Ok(()), Err)
  }
}

/// In-process cache; the default when nothing needs to outlive the process.
#[derive(Debug, Default)]
pub struct MemoryCache {
  entries: Mutex<HashMap<CacheKey, Value>>,
}

impl MemoryCache {
  pub fn new() -> Self { Self::default() }

  pub fn len(&self) -> usize {
    self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
  }

  pub fn is_empty(&self) -> bool { self.len() == 0 }
}

impl LocalCache for MemoryCache {
  fn get(&self, key: CacheKey) -> Option<Value> {
    self
      .entries
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .get(&key)
      .cloned()
  }

  fn put(&self, key: CacheKey, value: Value) -> io::Result<()> {
    self
      .entries
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .insert(key, value);
    Ok(())
  }

  fn remove(&self, key: CacheKey) -> io::Result<()> {
    self
      .entries
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .remove(&key);
    Ok(())
  }
}
