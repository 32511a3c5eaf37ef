//! Local backend for SkillTrade.
//!
//! [`SqliteBackend`] implements both the identity service and the profile
//! repository on top of [`tokio_rusqlite`], so all database access runs on a
//! dedicated thread without blocking the async runtime. [`DiskMedia`] stores
//! pictures on the local filesystem.

mod encode;
mod media;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use media::DiskMedia;
pub use store::{DEFAULT_MIN_PASSWORD_LEN, SqliteBackend};

#[cfg(test)]
mod tests;
