//! Profile types — a user's trading identity on the platform.
//!
//! A [`Profile`] is always owned by exactly one [`Identity`](crate::Identity).
//! Callers never build one directly: they hand a [`NewProfile`] to the profile
//! store, which assigns the identifier, owner, and timestamps, and they change
//! it afterwards through a [`ProfilePatch`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString, VariantNames};
use uuid::Uuid;

// ─── Enumerations ────────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
  VariantNames,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ExperienceLevel {
  Beginner,
  Intermediate,
  Advanced,
  Expert,
}

/// How much time the user can put into trades.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
  VariantNames,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Availability {
  FullTime,
  PartTime,
  ProjectBased,
}

/// Where the user is willing to work.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
  VariantNames,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WorkMode {
  Online,
  Offline,
  Both,
}

impl ExperienceLevel {
  pub fn label(self) -> &'static str {
    match self {
      Self::Beginner => "Beginner",
      Self::Intermediate => "Intermediate",
      Self::Advanced => "Advanced",
      Self::Expert => "Expert",
    }
  }
}

impl Availability {
  pub fn label(self) -> &'static str {
    match self {
      Self::FullTime => "Full Time",
      Self::PartTime => "Part Time",
      Self::ProjectBased => "Project Based",
    }
  }
}

impl WorkMode {
  pub fn label(self) -> &'static str {
    match self {
      Self::Online => "Online",
      Self::Offline => "Offline",
      Self::Both => "Both",
    }
  }
}

// ─── Profile ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
  /// Absent only for a profile that has never been persisted.
  pub id:               Option<Uuid>,
  /// The owning identity.
  pub user_id:          Uuid,
  pub name:             String,
  /// Denormalised copy of the identity's email address.
  pub email:            String,
  pub bio:              Option<String>,
  pub location:         Option<String>,
  /// URL of the uploaded picture. Absent means "no picture".
  pub profile_picture:  Option<String>,
  /// Skills offered. Order is significant and duplicates are kept.
  pub skills_i_have:    Vec<String>,
  /// Skills wanted. Same shape as `skills_i_have`.
  pub skills_i_want:    Vec<String>,
  /// Skills the user wants featured first.
  #[serde(default)]
  pub top_skills:       Vec<String>,
  pub experience_level: Option<ExperienceLevel>,
  pub availability:     Option<Availability>,
  pub preferred_work:   Option<WorkMode>,
  pub created_at:       DateTime<Utc>,
  pub updated_at:       DateTime<Utc>,
}

impl Profile {
  /// Build a fresh profile for `user_id` with a new identifier and both
  /// timestamps set to `at`.
  pub fn create(user_id: Uuid, fields: NewProfile, at: DateTime<Utc>) -> Self {
    Self {
      id: Some(Uuid::new_v4()),
      user_id,
      name: fields.name,
      email: fields.email,
      bio: fields.bio,
      location: fields.location,
      profile_picture: fields.profile_picture,
      skills_i_have: fields.skills_i_have,
      skills_i_want: fields.skills_i_want,
      top_skills: fields.top_skills,
      experience_level: fields.experience_level,
      availability: fields.availability,
      preferred_work: fields.preferred_work,
      created_at: at,
      updated_at: at,
    }
  }

  /// The picture URL, or `""` when there is none.
  pub fn picture_url(&self) -> &str {
    self.profile_picture.as_deref().unwrap_or_default()
  }

  /// Merge `patch` onto this profile field by field and stamp `updated_at`.
  ///
  /// Fields the patch leaves as `None` keep their current value.
  pub fn apply(&mut self, patch: &ProfilePatch, at: DateTime<Utc>) {
    fn set<T: Clone>(slot: &mut T, value: &Option<T>) {
      if let Some(v) = value {
        *slot = v.clone();
      }
    }

    set(&mut self.name, &patch.name);
    set(&mut self.email, &patch.email);
    set(&mut self.bio, &patch.bio);
    set(&mut self.location, &patch.location);
    set(&mut self.profile_picture, &patch.profile_picture);
    set(&mut self.skills_i_have, &patch.skills_i_have);
    set(&mut self.skills_i_want, &patch.skills_i_want);
    set(&mut self.top_skills, &patch.top_skills);
    set(&mut self.experience_level, &patch.experience_level);
    set(&mut self.availability, &patch.availability);
    set(&mut self.preferred_work, &patch.preferred_work);
    self.updated_at = at;
  }
}

// ─── NewProfile ──────────────────────────────────────────────────────────────

/// Input to profile creation. Identifier, owner, and timestamps are assigned
/// by the store and are not accepted from callers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProfile {
  pub name:             String,
  pub email:            String,
  pub bio:              Option<String>,
  pub location:         Option<String>,
  pub profile_picture:  Option<String>,
  pub skills_i_have:    Vec<String>,
  pub skills_i_want:    Vec<String>,
  pub top_skills:       Vec<String>,
  pub experience_level: Option<ExperienceLevel>,
  pub availability:     Option<Availability>,
  pub preferred_work:   Option<WorkMode>,
}

impl NewProfile {
  /// Convenience constructor with every optional field empty.
  pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      email: email.into(),
      ..Self::default()
    }
  }
}

// ─── ProfilePatch ────────────────────────────────────────────────────────────

/// A partial update.
///
/// For required fields `None` means "unchanged". For nullable fields
/// `Some(Some(v))` sets, `Some(None)` clears, and `None` leaves the field
/// alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfilePatch {
  pub name:             Option<String>,
  pub email:            Option<String>,
  pub bio:              Option<Option<String>>,
  pub location:         Option<Option<String>>,
  pub profile_picture:  Option<Option<String>>,
  pub skills_i_have:    Option<Vec<String>>,
  pub skills_i_want:    Option<Vec<String>>,
  pub top_skills:       Option<Vec<String>>,
  pub experience_level: Option<Option<ExperienceLevel>>,
  pub availability:     Option<Option<Availability>>,
  pub preferred_work:   Option<Option<WorkMode>>,
}
