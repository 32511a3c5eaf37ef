//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, UUIDs hyphenated lowercase strings, skill
//! lists compact JSON arrays, and profile enumerations their snake_case
//! variant names.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use skilltrade_core::{Identity, profile::Profile};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Email ───────────────────────────────────────────────────────────────────

/// Accounts are keyed by the trimmed, lower-cased address.
pub fn normalize_email(email: &str) -> String { email.trim().to_lowercase() }

// ─── Skill lists ─────────────────────────────────────────────────────────────

pub fn encode_list(items: &[String]) -> Result<String> { Ok(serde_json::to_string(items)?) }

pub fn decode_list(s: &str) -> Result<Vec<String>> { Ok(serde_json::from_str(s)?) }

// ─── Enumerations ────────────────────────────────────────────────────────────

pub fn encode_variant<T: AsRef<str>>(value: Option<T>) -> Option<String> {
  value.map(|v| v.as_ref().to_owned())
}

pub fn decode_variant<T: FromStr>(column: &'static str, value: Option<String>) -> Result<Option<T>> {
  value
    .map(|v| v.parse().map_err(|_| Error::UnknownVariant { column, value: v }))
    .transpose()
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from an `accounts` row.
pub struct RawAccount {
  pub account_id:         String,
  pub email:              String,
  pub email_confirmed_at: Option<String>,
}

impl RawAccount {
  pub fn into_identity(self) -> Result<Identity> {
    Ok(Identity {
      id:                 decode_uuid(&self.account_id)?,
      email:              self.email,
      email_confirmed_at: self.email_confirmed_at.as_deref().map(decode_dt).transpose()?,
    })
  }
}

/// Raw strings read directly from a `profiles` row.
#[derive(Debug, Clone)]
pub struct RawProfile {
  pub profile_id:       String,
  pub user_id:          String,
  pub name:             String,
  pub email:            String,
  pub bio:              Option<String>,
  pub location:         Option<String>,
  pub profile_picture:  Option<String>,
  pub skills_i_have:    String,
  pub skills_i_want:    String,
  pub top_skills:       String,
  pub experience_level: Option<String>,
  pub availability:     Option<String>,
  pub preferred_work:   Option<String>,
  pub created_at:       String,
  pub updated_at:       String,
}

/// Column list matching the field order of [`RawProfile`].
pub const PROFILE_COLUMNS: &str = "profile_id, user_id, name, email, bio, location, \
   profile_picture, skills_i_have, skills_i_want, top_skills, experience_level, \
   availability, preferred_work, created_at, updated_at";

impl RawProfile {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      profile_id:       row.get(0)?,
      user_id:          row.get(1)?,
      name:             row.get(2)?,
      email:            row.get(3)?,
      bio:              row.get(4)?,
      location:         row.get(5)?,
      profile_picture:  row.get(6)?,
      skills_i_have:    row.get(7)?,
      skills_i_want:    row.get(8)?,
      top_skills:       row.get(9)?,
      experience_level: row.get(10)?,
      availability:     row.get(11)?,
      preferred_work:   row.get(12)?,
      created_at:       row.get(13)?,
      updated_at:       row.get(14)?,
    })
  }

  /// Encode a profile that already has an identifier.
  pub fn from_profile(id: Uuid, p: &Profile) -> Result<Self> {
    Ok(Self {
      profile_id:       encode_uuid(id),
      user_id:          encode_uuid(p.user_id),
      name:             p.name.clone(),
      email:            p.email.clone(),
      bio:              p.bio.clone(),
      location:         p.location.clone(),
      profile_picture:  p.profile_picture.clone(),
      skills_i_have:    encode_list(&p.skills_i_have)?,
      skills_i_want:    encode_list(&p.skills_i_want)?,
      top_skills:       encode_list(&p.top_skills)?,
      experience_level: encode_variant(p.experience_level),
      availability:     encode_variant(p.availability),
      preferred_work:   encode_variant(p.preferred_work),
      created_at:       encode_dt(p.created_at),
      updated_at:       encode_dt(p.updated_at),
    })
  }

  pub fn into_profile(self) -> Result<Profile> {
    Ok(Profile {
      id:               Some(decode_uuid(&self.profile_id)?),
      user_id:          decode_uuid(&self.user_id)?,
      name:             self.name,
      email:            self.email,
      bio:              self.bio,
      location:         self.location,
      profile_picture:  self.profile_picture,
      skills_i_have:    decode_list(&self.skills_i_have)?,
      skills_i_want:    decode_list(&self.skills_i_want)?,
      top_skills:       decode_list(&self.top_skills)?,
      experience_level: decode_variant("experience_level", self.experience_level)?,
      availability:     decode_variant("availability", self.availability)?,
      preferred_work:   decode_variant("preferred_work", self.preferred_work)?,
      created_at:       decode_dt(&self.created_at)?,
      updated_at:       decode_dt(&self.updated_at)?,
    })
  }
}
