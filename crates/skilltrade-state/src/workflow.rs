//! The profile creation workflow.
//!
//! ```text
//! Idle -> Validating -> RegisteringAccount -> [UploadingPicture] -> PersistingProfile -> Done
//!            |                 |                      |                     |
//!     Failed(Validation)  Failed(Auth)       continue, no picture    Failed(Profile)
//! ```
//!
//! Steps run strictly one after another. Validation, registration, and
//! profile persistence halt the workflow; a failed picture upload is reported
//! and the workflow carries on without a picture. Nothing already done is
//! rolled back.

use skilltrade_core::{
  AuthError, ProfileError, ValidationError,
  profile::Profile,
  service::{IdentityService, MediaStorage, ProfileRepository},
};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::{
  draft::{PasswordPolicy, ProfileDraft},
  profile::ProfileStore,
  session::SessionStore,
  shell::Destination,
};

// ─── Phases ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
  Idle,
  Validating,
  RegisteringAccount,
  UploadingPicture,
  PersistingProfile,
  Done,
  Failed(Halt),
}

impl Phase {
  /// Whether a submission is in flight.
  pub fn is_busy(self) -> bool {
    matches!(
      self,
      Self::Validating
        | Self::RegisteringAccount
        | Self::UploadingPicture
        | Self::PersistingProfile
    )
  }
}

/// Which kind of error halted the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Halt {
  Validation,
  Auth,
  Profile,
}

/// A halting error. Its `Display` is the message shown to the user.
#[derive(Debug, Error)]
pub enum WorkflowError {
  #[error(transparent)]
  Validation(#[from] ValidationError),

  #[error(transparent)]
  Auth(#[from] AuthError),

  #[error(transparent)]
  Profile(#[from] ProfileError),
}

impl WorkflowError {
  pub fn halt(&self) -> Halt {
    match self {
      Self::Validation(_) => Halt::Validation,
      Self::Auth(_) => Halt::Auth,
      Self::Profile(_) => Halt::Profile,
    }
  }
}

/// A finished workflow.
#[derive(Debug)]
pub struct Completed {
  pub profile:       Profile,
  /// The picture upload failure, if one happened along the way.
  pub picture_error: Option<ProfileError>,
  /// Where to send the user next.
  pub redirect:      Destination,
}

// ─── Workflow ────────────────────────────────────────────────────────────────

/// Provisions a new user end to end from a [`ProfileDraft`].
pub struct ProfileCreation<I, P, M> {
  session:  SessionStore<I>,
  profiles: ProfileStore<P, M>,
  policy:   PasswordPolicy,
  phase:    watch::Sender<Phase>,
  error:    Option<String>,
}

impl<I, P, M> ProfileCreation<I, P, M>
where
  I: IdentityService,
  P: ProfileRepository + 'static,
  M: MediaStorage + 'static,
{
  pub fn new(
    session: SessionStore<I>,
    profiles: ProfileStore<P, M>,
    policy: PasswordPolicy,
  ) -> Self {
    let (phase, _) = watch::channel(Phase::Idle);
    Self { session, profiles, policy, phase, error: None }
  }

  pub fn phase(&self) -> Phase { *self.phase.borrow() }

  pub fn subscribe(&self) -> watch::Receiver<Phase> { self.phase.subscribe() }

  /// The message of the error that halted the last submission.
  pub fn error_message(&self) -> Option<&str> { self.error.as_deref() }

  /// Back to `Idle`, forgetting the last error.
  pub fn reset(&mut self) {
    self.error = None;
    self.enter(Phase::Idle);
  }

  /// Run the whole workflow for `draft`.
  ///
  /// Holding `&mut self` for the duration keeps a second submission from
  /// starting while one is in flight. Dropping the future mid-flight puts the
  /// phase back to `Idle`; steps already completed stay done.
  pub async fn submit(&mut self, draft: ProfileDraft) -> Result<Completed, WorkflowError> {
    self.error = None;
    let result = {
      let mut in_flight = InFlight { phase: &self.phase, finished: false };
      let result = self.run(draft).await;
      in_flight.finished = true;
      result
    };
    match &result {
      Ok(done) => {
        info!(user_id = %done.profile.user_id, "profile creation complete");
        self.enter(Phase::Done);
      }
      Err(e) => {
        warn!(error = %e, halt = ?e.halt(), "profile creation halted");
        self.error = Some(e.to_string());
        self.enter(Phase::Failed(e.halt()));
      }
    }
    result
  }

  async fn run(&self, draft: ProfileDraft) -> Result<Completed, WorkflowError> {
    self.enter(Phase::Validating);
    draft.validate(&self.policy)?;
    let (credentials, mut fields, picture) = draft.into_parts();

    self.enter(Phase::RegisteringAccount);
    self
      .session
      .register(&credentials.email, &credentials.password)
      .await?;
    drop(credentials);

    let mut picture_error = None;
    if let Some(file) = picture {
      self.enter(Phase::UploadingPicture);
      match self.profiles.upload_profile_picture(&file).await {
        Ok(uploaded) => fields.profile_picture = Some(uploaded.url),
        Err(e) => {
          warn!(error = %e, "profile picture upload failed; continuing without a picture");
          picture_error = Some(e);
        }
      }
    }

    self.enter(Phase::PersistingProfile);
    let profile = self.profiles.create_profile(fields).await?;

    Ok(Completed {
      profile,
      picture_error,
      redirect: Destination::Home,
    })
  }

  fn enter(&self, phase: Phase) {
    debug!(?phase, "profile creation phase");
    self.phase.send_replace(phase);
  }
}

/// Resets a busy phase to `Idle` when a submission is dropped before it
/// finishes.
struct InFlight<'a> {
  phase:    &'a watch::Sender<Phase>,
  finished: bool,
}

impl Drop for InFlight<'_> {
  fn drop(&mut self) {
    if self.finished {
      return;
    }
    let abandoned = self.phase.send_if_modified(|phase| {
      if !phase.is_busy() {
        return false;
      }
      *phase = Phase::Idle;
      true
    });
    if abandoned {
      debug!("profile creation dropped mid-flight");
    }
  }
}
