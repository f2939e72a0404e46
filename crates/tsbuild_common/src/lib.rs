//! Shared foundational types used across the tsbuild workspace.
//!
//! This crate provides the identifiers every other crate keys on: the build
//! [`Target`], the requested [`ModuleFormat`], the [`TaskKey`] pairing them,
//! and the [`ContentHash`] used to fingerprint build inputs.

#![warn(missing_docs)]

pub mod hash;
pub mod key;

pub use hash::{ContentHash, ContentHasher};
pub use key::{ModuleFormat, ParseKeyError, Target, TaskKey};
