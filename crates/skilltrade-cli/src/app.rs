//! The stores wired to the local backend, and the operations the commands
//! run against them.

use std::{path::Path, sync::Arc};

use anyhow::{Context as _, Result, anyhow, bail};
use serde_json::json;
use skilltrade_core::{
  Password,
  media::ImageFile,
  profile::{Profile, ProfilePatch},
};
use skilltrade_state::{
  CacheKey, Completed, LocalCache, NavigationSnapshot, PasswordPolicy, ProfileCreation,
  ProfileDraft, ProfileStore, SessionStore, require_auth,
};
use skilltrade_store_sqlite::{DiskMedia, SqliteBackend};
use tracing::{info, warn};

use crate::{cache::FileCache, settings::Settings};

// ─── App ──────────────────────────────────────────────────────────────────────

pub struct App {
  session:  SessionStore<SqliteBackend>,
  profiles: ProfileStore<SqliteBackend, DiskMedia>,
  cache:    Arc<FileCache>,
  policy:   PasswordPolicy,
}

impl App {
  /// Open the backend, restore any surviving session, and wait for its
  /// profile to load.
  pub async fn open(settings: &Settings) -> Result<Self> {
    if let Some(dir) = settings.database_path.parent() {
      std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create {}", dir.display()))?;
    }
    let backend = SqliteBackend::open(&settings.database_path)
      .await
      .with_context(|| format!("failed to open database at {:?}", settings.database_path))?
      .with_min_password_len(settings.password_policy.min_length);
    let media = DiskMedia::new(settings.media_dir.clone(), settings.media_base_url.clone());
    let cache = Arc::new(FileCache::new(settings.cache_dir.clone()));

    let session = SessionStore::init(backend.clone(), cache.clone()).await;
    let profiles = ProfileStore::attach(&session, backend, media);
    profiles.settled().await;

    Ok(Self { session, profiles, cache, policy: settings.password_policy })
  }

  pub fn snapshot(&self) -> NavigationSnapshot {
    NavigationSnapshot::capture(&self.session.state(), &self.profiles.state())
  }

  pub fn profile(&self) -> Option<Profile> { self.profiles.profile() }

  // ── Commands ──────────────────────────────────────────────────────────────

  /// Run the profile creation workflow for `draft`.
  pub async fn signup(&self, draft: ProfileDraft) -> Result<Completed> {
    let mut workflow =
      ProfileCreation::new(self.session.clone(), self.profiles.clone(), self.policy);
    let done = workflow
      .submit(draft)
      .await
      .context("profile creation failed")?;
    self.remember(&done.profile);
    Ok(done)
  }

  pub async fn login(&self, email: &str, password: &Password) -> Result<()> {
    let identity = self
      .session
      .login(email, password)
      .await
      .context("login failed")?;
    let state = self.profiles.settled().await;
    match &state.profile {
      Some(profile) => self.remember(profile),
      None => info!(user_id = %identity.id, "signed in without a profile"),
    }
    Ok(())
  }

  pub async fn logout(&self) { self.session.logout().await; }

  /// Apply `patch` to the signed-in user's profile, uploading `picture`
  /// first when given.
  pub async fn update(&self, mut patch: ProfilePatch, picture: Option<ImageFile>) -> Result<Profile> {
    self.require_session()?;
    if let Some(file) = picture {
      let uploaded = self
        .profiles
        .upload_profile_picture(&file)
        .await
        .context("picture upload failed")?;
      patch.profile_picture = Some(Some(uploaded.url));
    }
    let profile = self
      .profiles
      .update_profile(patch)
      .await
      .context("profile update failed")?;
    self.remember(&profile);
    Ok(profile)
  }

  /// Upload `file` and make it the profile picture. Returns its URL.
  pub async fn upload_picture(&self, file: ImageFile) -> Result<String> {
    let profile = self.update(ProfilePatch::default(), Some(file)).await?;
    Ok(profile.picture_url().to_owned())
  }

  fn require_session(&self) -> Result<()> {
    match require_auth(&self.session.state()) {
      Some(to) => bail!("not signed in; run `skilltrade signup` or `skilltrade login` ({to})"),
      None => Ok(()),
    }
  }

  /// Cache the session artifacts views read between runs.
  fn remember(&self, profile: &Profile) {
    let result = serde_json::to_value(profile)
      .map_err(Into::into)
      .and_then(|value| self.cache.put(CacheKey::UserProfile, value))
      .and_then(|()| self.cache.put(CacheKey::IsAuthenticated, json!(true)));
    if let Err(e) = result {
      warn!(error = %e, "failed to cache session artifacts");
    }
  }
}

/// Load a picture from disk.
pub async fn read_picture(path: &Path) -> Result<ImageFile> {
  let bytes = tokio::fs::read(path)
    .await
    .with_context(|| format!("failed to read {}", path.display()))?;
  let file_name = path
    .file_name()
    .map(|n| n.to_string_lossy().into_owned())
    .ok_or_else(|| anyhow!("{} is not a file", path.display()))?;
  Ok(ImageFile::from_bytes(file_name, bytes))
}
