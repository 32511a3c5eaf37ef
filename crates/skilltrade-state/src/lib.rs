//! Session and profile state for SkillTrade clients.
//!
//! Two state containers hold everything a client knows about the signed-in
//! user:
//!
//! - [`SessionStore`] owns the identity and talks to the identity service.
//! - [`ProfileStore`] owns that identity's profile, follows the session, and
//!   talks to persistence and media storage.
//!
//! Both publish their state through `tokio::sync::watch` channels. The
//! [`ProfileCreation`] workflow drives the two stores to onboard a new user,
//! and [`shell`] derives what a navigation bar shows from their snapshots.

pub mod cache;
pub mod draft;
pub mod profile;
pub mod session;
pub mod shell;
pub mod workflow;

#[cfg(test)]
mod fakes;

pub use cache::{CacheKey, LocalCache, MemoryCache};
pub use draft::{PasswordPolicy, ProfileDraft, SkillList};
pub use profile::{ProfileState, ProfileStore};
pub use session::{AuthStatus, IdentityObserver, SessionState, SessionStore};
pub use shell::{Destination, MenuEntry, NavigationSnapshot, ProfileSummary, require_auth};
pub use workflow::{Completed, Halt, Phase, ProfileCreation, WorkflowError};
