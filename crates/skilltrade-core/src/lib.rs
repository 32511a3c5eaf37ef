//! Core types and service contracts for the SkillTrade identity and profile
//! layer.
//!
//! This crate is deliberately free of runtime, storage, and transport
//! dependencies. Every other crate depends on it.

// Native `async fn` in traits; the contracts spell out `Send` bounds on the
// returned futures explicitly.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod identity;
pub mod media;
pub mod profile;
pub mod service;

pub use error::{AuthError, BackendError, ProfileError, StorageError, ValidationError};
pub use identity::{Credentials, Identity, Password};
