//! [`ProfileStore`] — owns the signed-in user's [`Profile`].
//!
//! The store follows the session: when the identity goes away the profile is
//! cleared inside the same notification; when an identity appears the store
//! fetches that identity's profile in the background. Results that arrive
//! after a newer identity change or a local write are dropped, never applied.

use std::sync::{
  Arc, Weak,
  atomic::{AtomicU64, Ordering},
};

use chrono::Utc;
use skilltrade_core::{
  Identity, ProfileError, StorageError,
  media::{ImageFile, UploadedPicture},
  profile::{NewProfile, Profile, ProfilePatch},
  service::{IdentityService, MediaStorage, ProfileRepository},
};
use tokio::{runtime::Handle, sync::watch};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::session::{IdentityObserver, SessionState, SessionStore};

// ─── State ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileState {
  pub profile: Option<Profile>,
  /// `true` while the profile for a fresh identity is being fetched.
  pub loading: bool,
}

impl ProfileState {
  pub fn has_profile(&self) -> bool { self.profile.is_some() }
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// Profile state plus the persistence and media services behind it.
///
/// Cloning is cheap; clones share the same state.
pub struct ProfileStore<P, M> {
  inner: Arc<Inner<P, M>>,
}

struct Inner<P, M> {
  repo:    P,
  media:   M,
  /// Read-only view of the session; identity is never written from here.
  session: watch::Receiver<SessionState>,
  state:   watch::Sender<ProfileState>,
  /// Bumped on every identity change and local write. A fetch only applies
  /// if the epoch it started under is still current.
  epoch:   AtomicU64,
}

impl<P, M> Clone for ProfileStore<P, M> {
  fn clone(&self) -> Self { Self { inner: Arc::clone(&self.inner) } }
}

impl<P, M> ProfileStore<P, M>
where
  P: ProfileRepository + 'static,
  M: MediaStorage + 'static,
{
  /// Build a store that follows `session`.
  pub fn attach<I: IdentityService>(session: &SessionStore<I>, repo: P, media: M) -> Self {
    let (state, _) = watch::channel(ProfileState { profile: None, loading: true });
    let inner = Arc::new(Inner {
      repo,
      media,
      session: session.subscribe(),
      state,
      epoch: AtomicU64::new(0),
    });
    session.add_observer(Arc::new(SessionLink { inner: Arc::downgrade(&inner) }));
    Self { inner }
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  pub fn state(&self) -> ProfileState { self.inner.state.borrow().clone() }

  pub fn profile(&self) -> Option<Profile> {
    self.inner.state.borrow().profile.clone()
  }

  pub fn has_profile(&self) -> bool { self.inner.state.borrow().has_profile() }

  pub fn subscribe(&self) -> watch::Receiver<ProfileState> {
    self.inner.state.subscribe()
  }

  /// Resolve once no fetch is outstanding.
  pub async fn settled(&self) -> ProfileState {
    let mut rx = self.subscribe();
    match rx.wait_for(|s| !s.loading).await {
      Ok(state) => state.clone(),
      Err(_) => self.state(),
    }
  }

  // ── Operations ────────────────────────────────────────────────────────────

  /// Create and persist the signed-in user's profile.
  ///
  /// The store assigns the identifier, the owner, and both timestamps.
  pub async fn create_profile(&self, fields: NewProfile) -> Result<Profile, ProfileError> {
    let identity = self.inner.identity().ok_or(ProfileError::NotAuthenticated)?;

    let profile = Profile::create(identity.id, fields, Utc::now());
    let saved = self
      .inner
      .repo
      .save_profile(profile)
      .await
      .inspect_err(|e| warn!(user_id = %identity.id, error = %e, "failed to create profile"))?;
    ensure_owner(&identity, &saved)?;

    info!(user_id = %identity.id, profile_id = ?saved.id, "profile created");
    self.commit(&identity, saved.clone());
    Ok(saved)
  }

  /// Merge `patch` onto the current profile and persist the result.
  ///
  /// Fields the patch does not name are left unchanged; `updated_at` is always
  /// refreshed.
  pub async fn update_profile(&self, patch: ProfilePatch) -> Result<Profile, ProfileError> {
    let identity = self.inner.identity().ok_or(ProfileError::NotAuthenticated)?;
    let current = self
      .profile()
      .filter(|p| p.user_id == identity.id)
      .ok_or(ProfileError::NoProfile)?;

    let now = Utc::now();
    let merged = match current.id {
      Some(id) => self.inner.repo.merge_profile(id, &patch, now).await,
      None => {
        let mut merged = current;
        merged.apply(&patch, now);
        self.inner.repo.save_profile(merged).await
      }
    }
    .inspect_err(|e| warn!(user_id = %identity.id, error = %e, "failed to update profile"))?;
    ensure_owner(&identity, &merged)?;

    debug!(user_id = %identity.id, "profile updated");
    self.commit(&identity, merged.clone());
    Ok(merged)
  }

  /// Hand a picture to the media service and return its URL.
  ///
  /// The profile itself is not touched; callers decide what to do with the
  /// URL, or whether to go on without one.
  pub async fn upload_profile_picture(
    &self,
    file: &ImageFile,
  ) -> Result<UploadedPicture, ProfileError> {
    let identity = self.inner.identity().ok_or(ProfileError::NotAuthenticated)?;
    if !file.is_image() {
      return Err(StorageError::UnsupportedType(file.content_type.clone()).into());
    }
    if file.is_empty() {
      return Err(StorageError::Empty.into());
    }

    let url = self
      .inner
      .media
      .store(file.bytes.clone(), file.metadata(identity.id))
      .await?;
    debug!(user_id = %identity.id, %url, size = file.len(), "profile picture stored");
    Ok(UploadedPicture { url })
  }

  /// Replace the current profile, unless the owner signed out meanwhile.
  ///
  /// The owner is checked under the state lock, so a sign-out clearing the
  /// profile either lands after this write or makes it a no-op.
  fn commit(&self, owner: &Identity, profile: Profile) {
    let applied = self.inner.state.send_if_modified(|state| {
      let still_signed_in = self
        .inner
        .identity()
        .is_some_and(|current| current.id == owner.id);
      if !still_signed_in {
        return false;
      }
      self.inner.epoch.fetch_add(1, Ordering::SeqCst);
      *state = ProfileState { profile: Some(profile), loading: false };
      true
    });
    if !applied {
      debug!(user_id = %owner.id, "identity changed during write; not applying");
    }
  }
}

fn ensure_owner(identity: &Identity, profile: &Profile) -> Result<(), ProfileError> {
  if profile.user_id == identity.id {
    Ok(())
  } else {
    Err(ProfileError::OwnerMismatch {
      expected: identity.id,
      found:    profile.user_id,
    })
  }
}

// ─── Session link ────────────────────────────────────────────────────────────

impl<P, M> Inner<P, M>
where
  P: ProfileRepository + 'static,
  M: MediaStorage + 'static,
{
  fn identity(&self) -> Option<Identity> { self.session.borrow().identity.clone() }

  fn identity_changed(self: &Arc<Self>, identity: Option<&Identity>) {
    let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;

    let Some(identity) = identity else {
      self.state.send_replace(ProfileState { profile: None, loading: false });
      return;
    };

    let user_id = identity.id;
    self.state.send_modify(|state| {
      state.loading = true;
      if state.profile.as_ref().is_some_and(|p| p.user_id != user_id) {
        state.profile = None;
      }
    });

    match Handle::try_current() {
      Ok(handle) => {
        let inner = Arc::clone(self);
        handle.spawn(async move { inner.load(user_id, epoch).await });
      }
      Err(_) => {
        warn!(%user_id, "no async runtime; profile not fetched");
        self.state.send_modify(|state| state.loading = false);
      }
    }
  }

  async fn load(&self, user_id: Uuid, epoch: u64) {
    let fetched = match self.repo.fetch_profile(user_id).await {
      Ok(Some(profile)) if profile.user_id != user_id => {
        warn!(%user_id, owner = %profile.user_id, "fetched profile has a different owner; ignoring");
        None
      }
      Ok(found) => found,
      Err(e) => {
        warn!(%user_id, error = %e, "failed to load profile");
        None
      }
    };

    let found = fetched.is_some();
    let applied = self.state.send_if_modified(|state| {
      if self.epoch.load(Ordering::SeqCst) != epoch {
        return false;
      }
      *state = ProfileState { profile: fetched, loading: false };
      true
    });

    if applied {
      debug!(%user_id, found, "profile loaded");
    } else {
      debug!(%user_id, "discarding superseded profile fetch");
    }
  }
}

/// The observer registered with the session. Holds the store weakly so a
/// dropped store simply stops listening.
struct SessionLink<P, M> {
  inner: Weak<Inner<P, M>>,
}

impl<P, M> IdentityObserver for SessionLink<P, M>
where
  P: ProfileRepository + 'static,
  M: MediaStorage + 'static,
{
  fn identity_changed(&self, identity: Option<&Identity>) {
    if let Some(inner) = self.inner.upgrade() {
      inner.identity_changed(identity);
    }
  }

  fn is_closed(&self) -> bool { self.inner.strong_count() == 0 }
}
