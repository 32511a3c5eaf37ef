//! In-memory service fakes for tests, sharing one ordered call log.

use std::{
  collections::HashMap,
  sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
  },
};

use bytes::Bytes;
use chrono::{DateTime, Utc};
use skilltrade_core::{
  AuthError, Identity, ProfileError, StorageError,
  media::MediaMetadata,
  profile::{Profile, ProfilePatch},
  service::{IdentityService, MediaStorage, ProfileRepository},
};
use tokio::sync::Notify;
use uuid::Uuid;

use crate::{cache::MemoryCache, profile::ProfileStore, session::SessionStore};

// ─── Call log ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<&'static str>>>);

impl CallLog {
  pub fn record(&self, call: &'static str) { self.0.lock().unwrap().push(call); }

  pub fn entries(&self) -> Vec<&'static str> { self.0.lock().unwrap().clone() }

  pub fn len(&self) -> usize { self.0.lock().unwrap().len() }

  pub fn count(&self, call: &str) -> usize {
    self.0.lock().unwrap().iter().filter(|c| **c == call).count()
  }

  /// Calls whose name starts with `prefix`, e.g. `"media."`.
  pub fn count_prefix(&self, prefix: &str) -> usize {
    self
      .0
      .lock()
      .unwrap()
      .iter()
      .filter(|c| c.starts_with(prefix))
      .count()
  }
}

// ─── Identity ────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct FakeIdentity {
  log:   CallLog,
  inner: Arc<IdentityInner>,
}

#[derive(Default)]
struct IdentityInner {
  accounts:     Mutex<HashMap<String, (Identity, String)>>,
  session:      Mutex<Option<Identity>>,
  offline:      AtomicBool,
  fail_restore: AtomicBool,
  restore_gate: Mutex<Option<(Arc<Notify>, Arc<Notify>)>>,
}

impl FakeIdentity {
  pub fn new(log: CallLog) -> Self {
    Self { log, inner: Arc::default() }
  }

  pub fn log(&self) -> &CallLog { &self.log }

  pub fn seed_account(&self, email: &str, password: &str) -> Identity {
    let identity = Identity {
      id:                 Uuid::new_v4(),
      email:              email.to_owned(),
      email_confirmed_at: None,
    };
    self
      .inner
      .accounts
      .lock()
      .unwrap()
      .insert(email.to_owned(), (identity.clone(), password.to_owned()));
    identity
  }

  /// Pretend a session for `email` survived from an earlier run.
  pub fn seed_session(&self, email: &str) -> Identity {
    let identity = self.seed_account(email, "secret1");
    *self.inner.session.lock().unwrap() = Some(identity.clone());
    identity
  }

  /// Make account creation and authentication fail as if the network were
  /// down.
  pub fn set_offline(&self, offline: bool) {
    self.inner.offline.store(offline, Ordering::SeqCst);
  }

  pub fn fail_restore(&self, fail: bool) {
    self.inner.fail_restore.store(fail, Ordering::SeqCst);
  }

  /// Hold `restore_session` until `gate` is notified. The returned handle is
  /// notified once the restoration has started.
  pub fn gate_restore(&self, gate: Arc<Notify>) -> Arc<Notify> {
    let entered = Arc::new(Notify::new());
    *self.inner.restore_gate.lock().unwrap() = Some((gate, entered.clone()));
    entered
  }

  fn offline_error() -> AuthError { AuthError::Backend("network unreachable".into()) }
}

impl IdentityService for FakeIdentity {
  async fn create_account(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
    self.log.record("identity.create_account");
    if self.inner.offline.load(Ordering::SeqCst) {
      return Err(Self::offline_error());
    }
    if self.inner.accounts.lock().unwrap().contains_key(email) {
      return Err(AuthError::AccountExists(email.to_owned()));
    }
    let identity = self.seed_account(email, password);
    *self.inner.session.lock().unwrap() = Some(identity.clone());
    Ok(identity)
  }

  async fn authenticate(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
    self.log.record("identity.authenticate");
    if self.inner.offline.load(Ordering::SeqCst) {
      return Err(Self::offline_error());
    }
    let identity = match self.inner.accounts.lock().unwrap().get(email) {
      Some((identity, stored)) if stored == password => identity.clone(),
      _ => return Err(AuthError::InvalidCredentials),
    };
    *self.inner.session.lock().unwrap() = Some(identity.clone());
    Ok(identity)
  }

  async fn restore_session(&self) -> Result<Option<Identity>, AuthError> {
    self.log.record("identity.restore_session");
    let found = self.inner.session.lock().unwrap().clone();
    let gate = self.inner.restore_gate.lock().unwrap().clone();
    if let Some((gate, entered)) = gate {
      entered.notify_one();
      gate.notified().await;
    }
    if self.inner.fail_restore.load(Ordering::SeqCst) {
      return Err(AuthError::Backend("session endpoint unavailable".into()));
    }
    Ok(found)
  }

  async fn end_session(&self) -> Result<(), AuthError> {
    self.log.record("identity.end_session");
    *self.inner.session.lock().unwrap() = None;
    Ok(())
  }
}

// ─── Profiles ────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct FakeProfiles {
  log:   CallLog,
  inner: Arc<ProfilesInner>,
}

#[derive(Default)]
struct ProfilesInner {
  by_user:    Mutex<HashMap<Uuid, Profile>>,
  fail_save:  AtomicBool,
  fail_fetch: AtomicBool,
  fetch_gate: Mutex<Option<Arc<Notify>>>,
  save_gate:  Mutex<Option<(Arc<Notify>, Arc<Notify>)>>,
}

impl FakeProfiles {
  pub fn new(log: CallLog) -> Self {
    Self { log, inner: Arc::default() }
  }

  pub fn seed(&self, profile: Profile) {
    self
      .inner
      .by_user
      .lock()
      .unwrap()
      .insert(profile.user_id, profile);
  }

  pub fn stored(&self, user_id: Uuid) -> Option<Profile> {
    self.inner.by_user.lock().unwrap().get(&user_id).cloned()
  }

  pub fn fail_save(&self, fail: bool) {
    self.inner.fail_save.store(fail, Ordering::SeqCst);
  }

  pub fn fail_fetch(&self, fail: bool) {
    self.inner.fail_fetch.store(fail, Ordering::SeqCst);
  }

  /// Hold every `fetch_profile` until `gate` is notified.
  pub fn gate_fetch(&self, gate: Arc<Notify>) {
    *self.inner.fetch_gate.lock().unwrap() = Some(gate);
  }

  /// Hold every `save_profile` until `gate` is notified. The returned handle
  /// is notified once a save has started.
  pub fn gate_save(&self, gate: Arc<Notify>) -> Arc<Notify> {
    let entered = Arc::new(Notify::new());
    *self.inner.save_gate.lock().unwrap() = Some((gate, entered.clone()));
    entered
  }
}

impl ProfileRepository for FakeProfiles {
  async fn fetch_profile(&self, user_id: Uuid) -> Result<Option<Profile>, ProfileError> {
    self.log.record("profiles.fetch");
    let gate = self.inner.fetch_gate.lock().unwrap().clone();
    if let Some(gate) = gate {
      gate.notified().await;
    }
    if self.inner.fail_fetch.load(Ordering::SeqCst) {
      return Err(ProfileError::Backend("database unavailable".into()));
    }
    Ok(self.stored(user_id))
  }

  async fn save_profile(&self, profile: Profile) -> Result<Profile, ProfileError> {
    self.log.record("profiles.save");
    let gate = self.inner.save_gate.lock().unwrap().clone();
    if let Some((gate, entered)) = gate {
      entered.notify_one();
      gate.notified().await;
    }
    if self.inner.fail_save.load(Ordering::SeqCst) {
      return Err(ProfileError::Backend("database unavailable".into()));
    }
    self.seed(profile.clone());
    Ok(profile)
  }

  async fn merge_profile(
    &self,
    id: Uuid,
    patch: &ProfilePatch,
    updated_at: DateTime<Utc>,
  ) -> Result<Profile, ProfileError> {
    self.log.record("profiles.merge");
    if self.inner.fail_save.load(Ordering::SeqCst) {
      return Err(ProfileError::Backend("database unavailable".into()));
    }
    let mut by_user = self.inner.by_user.lock().unwrap();
    let profile = by_user
      .values_mut()
      .find(|p| p.id == Some(id))
      .ok_or(ProfileError::NotFound(id))?;
    profile.apply(patch, updated_at);
    Ok(profile.clone())
  }
}

// ─── Media ───────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct FakeMedia {
  log:  CallLog,
  fail: Arc<AtomicBool>,
}

impl FakeMedia {
  pub fn new(log: CallLog) -> Self {
    Self { log, fail: Arc::default() }
  }

  pub fn set_failing(&self, fail: bool) { self.fail.store(fail, Ordering::SeqCst); }
}

impl MediaStorage for FakeMedia {
  async fn store(&self, _bytes: Bytes, metadata: MediaMetadata) -> Result<String, StorageError> {
    self.log.record("media.store");
    if self.fail.load(Ordering::SeqCst) {
      return Err(StorageError::Backend("bucket unavailable".into()));
    }
    Ok(format!("https://media.test/{}/{}", metadata.owner, metadata.file_name))
  }
}

// ─── Harness ─────────────────────────────────────────────────────────────────

/// Both stores wired to fresh fakes, with the session already settled
/// anonymous.
pub struct Harness {
  pub log:      CallLog,
  pub identity: FakeIdentity,
  pub repo:     FakeProfiles,
  pub media:    FakeMedia,
  pub cache:    Arc<MemoryCache>,
  pub session:  SessionStore<FakeIdentity>,
  pub profiles: ProfileStore<FakeProfiles, FakeMedia>,
}

impl Harness {
  pub async fn new() -> Self {
    let harness = Self::unsettled();
    harness.session.restore().await;
    harness
  }

  /// Like [`Harness::new`] but with the session still loading.
  pub fn unsettled() -> Self {
    let log = CallLog::default();
    let identity = FakeIdentity::new(log.clone());
    let repo = FakeProfiles::new(log.clone());
    let media = FakeMedia::new(log.clone());
    let cache = Arc::new(MemoryCache::new());
    let session = SessionStore::new(identity.clone(), cache.clone());
    let profiles = ProfileStore::attach(&session, repo.clone(), media.clone());
    Self { log, identity, repo, media, cache, session, profiles }
  }

  /// Forget the calls made while setting up.
  pub fn clear_log(&self) { self.log.0.lock().unwrap().clear(); }
}
