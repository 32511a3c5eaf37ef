//! [`SqliteBackend`]: the local identity service and profile repository.

use std::path::Path;

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use chrono::{DateTime, Utc};
use rand_core::OsRng;
use rusqlite::OptionalExtension as _;
use skilltrade_core::{
  AuthError, Identity, ProfileError,
  profile::{Profile, ProfilePatch},
  service::{IdentityService, ProfileRepository},
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
  Result,
  encode::{PROFILE_COLUMNS, RawAccount, RawProfile, encode_dt, encode_uuid, normalize_email},
  schema::SCHEMA,
};

/// Shortest password [`SqliteBackend`] accepts unless configured otherwise.
pub const DEFAULT_MIN_PASSWORD_LEN: usize = 6;

// ─── Backend ─────────────────────────────────────────────────────────────────

/// Accounts, the current session, and profiles in a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteBackend {
  conn:             tokio_rusqlite::Connection,
  min_password_len: usize,
}

/// What [`SqliteBackend::insert_profile`] found when writing.
enum SaveOutcome {
  Saved,
  OwnerTaken,
}

impl SqliteBackend {
  /// Open (or create) a backend at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::init(conn).await
  }

  /// Open an in-memory backend, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::init(conn).await
  }

  async fn init(conn: tokio_rusqlite::Connection) -> Result<Self> {
    conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(Self { conn, min_password_len: DEFAULT_MIN_PASSWORD_LEN })
  }

  /// Reject passwords shorter than `len` characters at account creation.
  pub fn with_min_password_len(mut self, len: usize) -> Self {
    self.min_password_len = len;
    self
  }

  // ── Accounts ──────────────────────────────────────────────────────────────

  /// Insert an account unless the email is taken. Returns `None` when it is.
  async fn insert_account(&self, email: &str, password: &str) -> Result<Option<Identity>> {
    let hash = hash_password(password.to_owned()).await?;
    let identity = Identity {
      id:                 Uuid::new_v4(),
      email:              email.to_owned(),
      email_confirmed_at: None,
    };

    let id_str = encode_uuid(identity.id);
    let email_str = identity.email.clone();
    let at_str = encode_dt(Utc::now());

    let inserted = self
      .conn
      .call(move |conn| {
        let taken = conn
          .query_row(
            "SELECT 1 FROM accounts WHERE email = ?1",
            rusqlite::params![email_str],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if taken {
          return Ok(false);
        }
        conn.execute(
          "INSERT INTO accounts (account_id, email, password_hash, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, email_str, hash, at_str],
        )?;
        Ok(true)
      })
      .await?;

    Ok(inserted.then_some(identity))
  }

  /// The account for `email` with its password hash.
  async fn find_account(&self, email: &str) -> Result<Option<(Identity, String)>> {
    let email = email.to_owned();
    let row: Option<(RawAccount, String)> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT account_id, email, email_confirmed_at, password_hash
               FROM accounts WHERE email = ?1",
              rusqlite::params![email],
              |row| {
                Ok((
                  RawAccount {
                    account_id:         row.get(0)?,
                    email:              row.get(1)?,
                    email_confirmed_at: row.get(2)?,
                  },
                  row.get(3)?,
                ))
              },
            )
            .optional()?,
        )
      })
      .await?;

    row
      .map(|(raw, hash)| Ok((raw.into_identity()?, hash)))
      .transpose()
  }

  // ── Sessions ──────────────────────────────────────────────────────────────

  async fn start_session(&self, account_id: Uuid) -> Result<()> {
    let id_str = encode_uuid(account_id);
    let at_str = encode_dt(Utc::now());
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO sessions (slot, account_id, started_at) VALUES (1, ?1, ?2)
           ON CONFLICT(slot) DO UPDATE SET
             account_id = excluded.account_id,
             started_at = excluded.started_at",
          rusqlite::params![id_str, at_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn current_session(&self) -> Result<Option<Identity>> {
    let raw: Option<RawAccount> = self
      .conn
      .call(|conn| {
        Ok(
          conn
            .query_row(
              "SELECT a.account_id, a.email, a.email_confirmed_at
               FROM sessions s
               JOIN accounts a ON a.account_id = s.account_id
               WHERE s.slot = 1",
              [],
              |row| {
                Ok(RawAccount {
                  account_id:         row.get(0)?,
                  email:              row.get(1)?,
                  email_confirmed_at: row.get(2)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawAccount::into_identity).transpose()
  }

  async fn clear_session(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute("DELETE FROM sessions", [])?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Profiles ──────────────────────────────────────────────────────────────

  async fn select_profile(&self, column: &'static str, key: Uuid) -> Result<Option<Profile>> {
    let key_str = encode_uuid(key);
    let raw: Option<RawProfile> = self
      .conn
      .call(move |conn| {
        let sql = format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE {column} = ?1");
        Ok(
          conn
            .query_row(&sql, rusqlite::params![key_str], RawProfile::from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawProfile::into_profile).transpose()
  }

  /// Insert or replace the row for `raw.profile_id`, unless another profile
  /// already belongs to the same user.
  async fn upsert_profile(&self, raw: RawProfile) -> Result<SaveOutcome> {
    self
      .conn
      .call(move |conn| {
        let owner_taken = conn
          .query_row(
            "SELECT 1 FROM profiles WHERE user_id = ?1 AND profile_id != ?2",
            rusqlite::params![raw.user_id, raw.profile_id],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if owner_taken {
          return Ok(SaveOutcome::OwnerTaken);
        }

        conn.execute(
          &format!(
            "INSERT INTO profiles ({PROFILE_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
             ON CONFLICT(profile_id) DO UPDATE SET
               name             = excluded.name,
               email            = excluded.email,
               bio              = excluded.bio,
               location         = excluded.location,
               profile_picture  = excluded.profile_picture,
               skills_i_have    = excluded.skills_i_have,
               skills_i_want    = excluded.skills_i_want,
               top_skills       = excluded.top_skills,
               experience_level = excluded.experience_level,
               availability     = excluded.availability,
               preferred_work   = excluded.preferred_work,
               updated_at       = excluded.updated_at"
          ),
          rusqlite::params![
            raw.profile_id,
            raw.user_id,
            raw.name,
            raw.email,
            raw.bio,
            raw.location,
            raw.profile_picture,
            raw.skills_i_have,
            raw.skills_i_want,
            raw.top_skills,
            raw.experience_level,
            raw.availability,
            raw.preferred_work,
            raw.created_at,
            raw.updated_at,
          ],
        )?;
        Ok(SaveOutcome::Saved)
      })
      .await
      .map_err(Into::into)
  }
}

// ─── Password hashing ────────────────────────────────────────────────────────

async fn hash_password(password: String) -> Result<String> {
  tokio::task::spawn_blocking(move || {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
  })
  .await?
}

async fn verify_password(password: String, hash: String) -> Result<bool> {
  tokio::task::spawn_blocking(move || {
    let parsed = PasswordHash::new(&hash)?;
    Ok(
      Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok(),
    )
  })
  .await?
}

// ─── IdentityService impl ────────────────────────────────────────────────────

impl IdentityService for SqliteBackend {
  async fn create_account(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
    let email = normalize_email(email);
    if email.is_empty() || password.is_empty() {
      return Err(AuthError::MissingCredentials);
    }
    if password.chars().count() < self.min_password_len {
      return Err(AuthError::WeakPassword { min: self.min_password_len });
    }

    let identity = self
      .insert_account(&email, password)
      .await?
      .ok_or_else(|| AuthError::AccountExists(email.clone()))?;
    self.start_session(identity.id).await?;

    info!(user_id = %identity.id, "account created");
    Ok(identity)
  }

  async fn authenticate(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
    let email = normalize_email(email);
    let Some((identity, hash)) = self.find_account(&email).await? else {
      debug!("no account for the given email");
      return Err(AuthError::InvalidCredentials);
    };
    if !verify_password(password.to_owned(), hash).await? {
      return Err(AuthError::InvalidCredentials);
    }
    self.start_session(identity.id).await?;
    Ok(identity)
  }

  async fn restore_session(&self) -> Result<Option<Identity>, AuthError> {
    Ok(self.current_session().await?)
  }

  async fn end_session(&self) -> Result<(), AuthError> {
    Ok(self.clear_session().await?)
  }
}

// ─── ProfileRepository impl ──────────────────────────────────────────────────

impl ProfileRepository for SqliteBackend {
  async fn fetch_profile(&self, user_id: Uuid) -> Result<Option<Profile>, ProfileError> {
    Ok(self.select_profile("user_id", user_id).await?)
  }

  async fn save_profile(&self, mut profile: Profile) -> Result<Profile, ProfileError> {
    let id = *profile.id.get_or_insert_with(Uuid::new_v4);
    let raw = RawProfile::from_profile(id, &profile)?;
    match self.upsert_profile(raw).await? {
      SaveOutcome::Saved => {
        debug!(profile_id = %id, user_id = %profile.user_id, "profile saved");
        Ok(profile)
      }
      SaveOutcome::OwnerTaken => Err(ProfileError::AlreadyExists(profile.user_id)),
    }
  }

  async fn merge_profile(
    &self,
    id: Uuid,
    patch: &ProfilePatch,
    updated_at: DateTime<Utc>,
  ) -> Result<Profile, ProfileError> {
    let mut profile = self
      .select_profile("profile_id", id)
      .await?
      .ok_or(ProfileError::NotFound(id))?;
    profile.apply(patch, updated_at);

    let raw = RawProfile::from_profile(id, &profile)?;
    match self.upsert_profile(raw).await? {
      SaveOutcome::Saved => Ok(profile),
      SaveOutcome::OwnerTaken => Err(ProfileError::AlreadyExists(profile.user_id)),
    }
  }
}
