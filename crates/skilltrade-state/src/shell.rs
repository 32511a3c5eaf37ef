//! Read-only view of both stores for the navigation shell.

use std::fmt;

use crate::{
  profile::ProfileState,
  session::{AuthStatus, SessionState},
};

/// The routes the shell links to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Destination {
  Home,
  CreateProfile,
  Profile,
  Settings,
}

impl Destination {
  pub fn path(self) -> &'static str {
    match self {
      Self::Home => "/",
      Self::CreateProfile => "/create-profile",
      Self::Profile => "/profile",
      Self::Settings => "/settings",
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      Self::Home => "Home",
      Self::CreateProfile => "Create Profile",
      Self::Profile => "Profile",
      Self::Settings => "Settings",
    }
  }
}

impl fmt::Display for Destination {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.path()) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuEntry {
  Navigate(Destination),
  /// Calls `SessionStore::logout`; the only mutation the shell performs.
  Logout,
}

impl MenuEntry {
  pub fn label(self) -> &'static str {
    match self {
      Self::Navigate(to) => to.label(),
      Self::Logout => "Logout",
    }
  }
}

/// What the header shows about the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileSummary {
  pub display_name: String,
  pub email:        String,
  pub initial:      char,
  /// Empty when there is no picture.
  pub picture_url:  String,
}

impl ProfileSummary {
  const FALLBACK_NAME: &'static str = "User";
  const FALLBACK_INITIAL: char = 'U';

  fn from_states(session: &SessionState, profile: &ProfileState) -> Self {
    let profile = profile.profile.as_ref();
    let name = profile.map(|p| p.name.trim()).filter(|n| !n.is_empty());

    let display_name = name.unwrap_or(Self::FALLBACK_NAME).to_owned();
    let initial = name
      .and_then(|n| n.chars().next())
      .and_then(|c| c.to_uppercase().next())
      .unwrap_or(Self::FALLBACK_INITIAL);
    let email = profile
      .map(|p| p.email.clone())
      .or_else(|| session.identity.as_ref().map(|i| i.email.clone()))
      .unwrap_or_default();
    let picture_url = profile.map(|p| p.picture_url().to_owned()).unwrap_or_default();

    Self { display_name, email, initial, picture_url }
  }
}

/// A point-in-time copy of what the shell renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationSnapshot {
  pub status:  AuthStatus,
  pub summary: Option<ProfileSummary>,
  has_profile: bool,
}

impl NavigationSnapshot {
  pub fn capture(session: &SessionState, profile: &ProfileState) -> Self {
    let status = session.status();
    let summary = (status == AuthStatus::Authenticated)
      .then(|| ProfileSummary::from_states(session, profile));
    Self { status, summary, has_profile: profile.has_profile() }
  }

  pub fn menu(&self) -> Vec<MenuEntry> {
    match self.status {
      AuthStatus::Undetermined => Vec::new(),
      AuthStatus::Authenticated if self.has_profile => vec![
        MenuEntry::Navigate(Destination::Profile),
        MenuEntry::Navigate(Destination::Settings),
        MenuEntry::Logout,
      ],
      AuthStatus::Authenticated | AuthStatus::Anonymous => {
        vec![MenuEntry::Navigate(Destination::CreateProfile)]
      }
    }
  }
}

/// Where a guarded view should redirect, if anywhere.
///
/// Nothing happens while the session is still being restored; a settled
/// anonymous session is sent to profile creation.
pub fn require_auth(session: &SessionState) -> Option<Destination> {
  match session.status() {
    AuthStatus::Anonymous => Some(Destination::CreateProfile),
    AuthStatus::Undetermined | AuthStatus::Authenticated => None,
  }
}
