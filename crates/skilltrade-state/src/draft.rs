//! Draft form state for a profile that does not exist yet.
//!
//! The draft is never persisted. It holds the password only until it is split
//! into [`Credentials`] and a [`NewProfile`]; the profile half has no field
//! that could carry it.

use serde::Deserialize;
use skilltrade_core::{
  Credentials, Password, StorageError, ValidationError,
  media::ImageFile,
  profile::{Availability, ExperienceLevel, NewProfile, WorkMode},
};

/// Minimum password length enforced before anything is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PasswordPolicy {
  #[serde(default = "PasswordPolicy::default_min_length")]
  pub min_length: usize,
}

impl PasswordPolicy {
  fn default_min_length() -> usize { 6 }
}

impl Default for PasswordPolicy {
  fn default() -> Self { Self { min_length: Self::default_min_length() } }
}

/// Which of the two skill lists an edit applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkillList {
  /// Skills the user can offer.
  Have,
  /// Skills the user wants to learn.
  Want,
}

/// In-progress values of the profile creation form.
#[derive(Debug, Clone, Default)]
pub struct ProfileDraft {
  pub name:             String,
  pub email:            String,
  pub password:         Password,
  pub bio:              String,
  pub location:         String,
  pub skills_i_have:    Vec<String>,
  pub skills_i_want:    Vec<String>,
  pub top_skills:       Vec<String>,
  pub experience_level: Option<ExperienceLevel>,
  pub availability:     Option<Availability>,
  pub preferred_work:   Option<WorkMode>,
  /// Selected locally, uploaded only on submission.
  pub picture:          Option<ImageFile>,
  /// Pending text of the "skill I have" input.
  pub skill_input:      String,
  /// Pending text of the "skill I want" input.
  pub wanted_skill_input: String,
}

impl ProfileDraft {
  pub fn skills(&self, list: SkillList) -> &[String] {
    match list {
      SkillList::Have => &self.skills_i_have,
      SkillList::Want => &self.skills_i_want,
    }
  }

  /// The pending input field that feeds `list`.
  pub fn input_mut(&mut self, list: SkillList) -> &mut String {
    match list {
      SkillList::Have => &mut self.skill_input,
      SkillList::Want => &mut self.wanted_skill_input,
    }
  }

  /// Append the trimmed pending input to `list` and clear the input.
  ///
  /// Blank input is ignored and left in place. Duplicates are kept.
  pub fn add_skill(&mut self, list: SkillList) -> bool {
    let skill = self.input_mut(list).trim().to_owned();
    if skill.is_empty() {
      return false;
    }
    self.input_mut(list).clear();
    self.skills_mut(list).push(skill);
    true
  }

  /// Remove every entry equal to `skill` from `list`. Returns how many were
  /// removed; the order of the rest is preserved.
  pub fn remove_skill(&mut self, list: SkillList, skill: &str) -> usize {
    let skills = self.skills_mut(list);
    let before = skills.len();
    skills.retain(|s| s != skill);
    before - skills.len()
  }

  /// Select a picture for upload. Only images are accepted.
  pub fn select_picture(&mut self, file: ImageFile) -> Result<(), StorageError> {
    if !file.is_image() {
      return Err(StorageError::UnsupportedType(file.content_type));
    }
    self.picture = Some(file);
    Ok(())
  }

  /// Check the required fields and the password policy.
  pub fn validate(&self, policy: &PasswordPolicy) -> Result<(), ValidationError> {
    if self.name.trim().is_empty() {
      return Err(ValidationError::MissingField("name"));
    }
    let email = self.email.trim();
    if email.is_empty() {
      return Err(ValidationError::MissingField("email"));
    }
    if self.password.is_empty() {
      return Err(ValidationError::MissingField("password"));
    }
    if !is_plausible_email(email) {
      return Err(ValidationError::InvalidEmail(email.to_owned()));
    }
    if self.password.len() < policy.min_length {
      return Err(ValidationError::PasswordTooShort { min: policy.min_length });
    }
    Ok(())
  }

  /// Split into what goes to registration, what goes to profile creation, and
  /// the picture waiting for upload.
  pub fn into_parts(self) -> (Credentials, NewProfile, Option<ImageFile>) {
    let email = self.email.trim().to_owned();
    let credentials = Credentials {
      email:    email.clone(),
      password: self.password,
    };
    let fields = NewProfile {
      name: self.name.trim().to_owned(),
      email,
      bio: non_blank(self.bio),
      location: non_blank(self.location),
      profile_picture: None,
      skills_i_have: self.skills_i_have,
      skills_i_want: self.skills_i_want,
      top_skills: self.top_skills,
      experience_level: self.experience_level,
      availability: self.availability,
      preferred_work: self.preferred_work,
    };
    (credentials, fields, self.picture)
  }

  fn skills_mut(&mut self, list: SkillList) -> &mut Vec<String> {
    match list {
      SkillList::Have => &mut self.skills_i_have,
      SkillList::Want => &mut self.skills_i_want,
    }
  }
}

fn non_blank(value: String) -> Option<String> {
  let trimmed = value.trim();
  (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

/// `local@domain` with both halves non-empty.
fn is_plausible_email(email: &str) -> bool {
  email
    .split_once('@')
    .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty())
}
