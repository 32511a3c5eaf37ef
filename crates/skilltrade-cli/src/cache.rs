//! [`FileCache`]: session artifacts as JSON files in a directory.

use std::{
  fs, io,
  path::{Path, PathBuf},
};

use serde_json::Value;
use skilltrade_state::{CacheKey, LocalCache};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct FileCache {
  dir: PathBuf,
}

impl FileCache {
  pub fn new(dir: impl Into<PathBuf>) -> Self { Self { dir: dir.into() } }

  pub fn dir(&self) -> &Path { &self.dir }

  fn path(&self, key: CacheKey) -> PathBuf { self.dir.join(format!("{}.json", key.as_str())) }
}

impl LocalCache for FileCache {
  /// Unreadable or corrupt entries read as absent.
  fn get(&self, key: CacheKey) -> Option<Value> {
    let raw = fs::read(self.path(key)).ok()?;
    serde_json::from_slice(&raw)
      .inspect_err(|e| debug!(key = key.as_str(), error = %e, "ignoring corrupt cache entry"))
      .ok()
  }

  fn put(&self, key: CacheKey, value: Value) -> io::Result<()> {
    fs::create_dir_all(&self.dir)?;
    fs::write(self.path(key), serde_json::to_vec(&value)?)
  }

  fn remove(&self, key: CacheKey) -> io::Result<()> {
    match fs::remove_file(self.path(key)) {
      Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
      other => other,
    }
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn put_get_remove() {
    let dir = tempfile::tempdir().unwrap();
    let cache = FileCache::new(dir.path().join("nested"));

    assert_eq!(cache.get(CacheKey::UserProfile), None);
    cache.put(CacheKey::UserProfile, json!({ "name": "A" })).unwrap();
    assert_eq!(cache.get(CacheKey::UserProfile), Some(json!({ "name": "A" })));
    assert!(cache.dir().join("user_profile.json").exists());

    cache.remove(CacheKey::UserProfile).unwrap();
    cache.remove(CacheKey::UserProfile).unwrap();
    assert_eq!(cache.get(CacheKey::UserProfile), None);
  }

  #[test]
  fn purge_clears_every_key() {
    let dir = tempfile::tempdir().unwrap();
    let cache = FileCache::new(dir.path());
    for key in CacheKey::ALL {
      cache.put(key, json!(true)).unwrap();
    }

    cache.purge_session().unwrap();
    assert!(CacheKey::ALL.iter().all(|k| cache.get(*k).is_none()));
  }

  #[test]
  fn corrupt_entries_read_as_absent() {
    let dir = tempfile::tempdir().unwrap();
    let cache = FileCache::new(dir.path());
    fs::write(dir.path().join("is_authenticated.json"), b"{not json").unwrap();
    assert_eq!(cache.get(CacheKey::IsAuthenticated), None);
  }
}
