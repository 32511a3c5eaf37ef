//! Integration tests for `SqliteBackend` against an in-memory database.

use chrono::{Duration, Utc};
use skilltrade_core::{
  AuthError, ProfileError,
  profile::{ExperienceLevel, NewProfile, Profile, ProfilePatch, WorkMode},
  service::{IdentityService, ProfileRepository},
};
use uuid::Uuid;

use crate::SqliteBackend;

async fn backend() -> SqliteBackend {
  SqliteBackend::open_in_memory()
    .await
    .expect("in-memory backend")
}

// ─── Accounts ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_account_opens_a_session() {
  let b = backend().await;

  let identity = b.create_account("a@b.com", "secret1").await.unwrap();
  assert_eq!(identity.email, "a@b.com");
  assert!(!identity.is_confirmed());

  let restored = b.restore_session().await.unwrap();
  assert_eq!(restored, Some(identity));
}

#[tokio::test]
async fn duplicate_email_is_rejected_case_insensitively() {
  let b = backend().await;
  b.create_account("a@b.com", "secret1").await.unwrap();

  let err = b.create_account("  A@B.com ", "another1").await.unwrap_err();
  assert!(matches!(err, AuthError::AccountExists(email) if email == "a@b.com"));
}

#[tokio::test]
async fn short_password_is_weak() {
  let b = backend().await;
  let err = b.create_account("a@b.com", "abc").await.unwrap_err();
  assert!(matches!(err, AuthError::WeakPassword { min: 6 }));

  let lenient = backend().await.with_min_password_len(3);
  lenient.create_account("a@b.com", "abc").await.unwrap();
}

#[tokio::test]
async fn empty_credentials_are_missing() {
  let b = backend().await;
  let err = b.create_account(" ", "secret1").await.unwrap_err();
  assert!(matches!(err, AuthError::MissingCredentials));
}

#[tokio::test]
async fn authenticate_checks_the_password() {
  let b = backend().await;
  let created = b.create_account("a@b.com", "secret1").await.unwrap();
  b.end_session().await.unwrap();

  let err = b.authenticate("a@b.com", "wrong-one").await.unwrap_err();
  assert!(matches!(err, AuthError::InvalidCredentials));
  assert_eq!(b.restore_session().await.unwrap(), None);

  let err = b.authenticate("nobody@b.com", "secret1").await.unwrap_err();
  assert!(matches!(err, AuthError::InvalidCredentials));

  let signed_in = b.authenticate("A@b.com", "secret1").await.unwrap();
  assert_eq!(signed_in.id, created.id);
  assert_eq!(b.restore_session().await.unwrap().map(|i| i.id), Some(created.id));
}

#[tokio::test]
async fn end_session_is_idempotent() {
  let b = backend().await;
  b.create_account("a@b.com", "secret1").await.unwrap();

  b.end_session().await.unwrap();
  b.end_session().await.unwrap();
  assert_eq!(b.restore_session().await.unwrap(), None);
}

#[tokio::test]
async fn session_survives_reopening_the_file() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("skilltrade.db");

  let id = {
    let b = SqliteBackend::open(&path).await.unwrap();
    b.create_account("a@b.com", "secret1").await.unwrap().id
  };

  let reopened = SqliteBackend::open(&path).await.unwrap();
  let restored = reopened.restore_session().await.unwrap();
  assert_eq!(restored.map(|i| i.id), Some(id));
}

// ─── Profiles ────────────────────────────────────────────────────────────────

async fn account(b: &SqliteBackend, email: &str) -> Uuid {
  b.create_account(email, "secret1").await.unwrap().id
}

fn profile_for(user_id: Uuid) -> Profile {
  let mut fields = NewProfile::new("A", "a@b.com");
  fields.bio = Some("hi".into());
  fields.skills_i_have = vec!["Go".into(), "SQL".into()];
  fields.experience_level = Some(ExperienceLevel::Intermediate);
  Profile::create(user_id, fields, Utc::now())
}

#[tokio::test]
async fn fetch_without_profile_is_none() {
  let b = backend().await;
  let user = account(&b, "a@b.com").await;
  assert_eq!(b.fetch_profile(user).await.unwrap(), None);
}

#[tokio::test]
async fn save_then_fetch() {
  let b = backend().await;
  let user = account(&b, "a@b.com").await;
  let profile = profile_for(user);

  let saved = b.save_profile(profile.clone()).await.unwrap();
  assert_eq!(saved, profile);

  let fetched = b.fetch_profile(user).await.unwrap().unwrap();
  assert_eq!(fetched, profile);
  assert_eq!(fetched.skills_i_want, Vec::<String>::new());
}

#[tokio::test]
async fn save_assigns_an_id_when_missing() {
  let b = backend().await;
  let user = account(&b, "a@b.com").await;
  let mut profile = profile_for(user);
  profile.id = None;

  let saved = b.save_profile(profile).await.unwrap();
  assert!(saved.id.is_some());
  assert_eq!(b.fetch_profile(user).await.unwrap().unwrap().id, saved.id);
}

#[tokio::test]
async fn second_profile_for_the_same_user_is_rejected() {
  let b = backend().await;
  let user = account(&b, "a@b.com").await;
  b.save_profile(profile_for(user)).await.unwrap();

  let err = b.save_profile(profile_for(user)).await.unwrap_err();
  assert!(matches!(err, ProfileError::AlreadyExists(u) if u == user));
}

#[tokio::test]
async fn saving_for_an_unknown_account_fails() {
  let b = backend().await;
  let err = b.save_profile(profile_for(Uuid::new_v4())).await.unwrap_err();
  assert!(matches!(err, ProfileError::Backend(_)));
}

#[tokio::test]
async fn merge_changes_only_patched_fields() {
  let b = backend().await;
  let user = account(&b, "a@b.com").await;
  let before = b.save_profile(profile_for(user)).await.unwrap();
  let id = before.id.unwrap();
  let later = before.updated_at + Duration::seconds(5);

  let patch = ProfilePatch {
    bio: Some(Some("x".into())),
    preferred_work: Some(Some(WorkMode::Online)),
    ..ProfilePatch::default()
  };
  let merged = b.merge_profile(id, &patch, later).await.unwrap();

  let mut expected = before.clone();
  expected.bio = Some("x".into());
  expected.preferred_work = Some(WorkMode::Online);
  expected.updated_at = later;
  assert_eq!(merged, expected);
  assert_eq!(b.fetch_profile(user).await.unwrap(), Some(expected));
}

#[tokio::test]
async fn merge_can_clear_nullable_fields() {
  let b = backend().await;
  let user = account(&b, "a@b.com").await;
  let id = b.save_profile(profile_for(user)).await.unwrap().id.unwrap();

  let patch = ProfilePatch { bio: Some(None), ..ProfilePatch::default() };
  let merged = b.merge_profile(id, &patch, Utc::now()).await.unwrap();
  assert_eq!(merged.bio, None);
  assert_eq!(merged.name, "A");
}

#[tokio::test]
async fn merge_unknown_profile_is_not_found() {
  let b = backend().await;
  let id = Uuid::new_v4();
  let err = b
    .merge_profile(id, &ProfilePatch::default(), Utc::now())
    .await
    .unwrap_err();
  assert!(matches!(err, ProfileError::NotFound(missing) if missing == id));
}
