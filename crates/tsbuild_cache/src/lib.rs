//! Result caching for compile tasks.
//!
//! Two layers live here. [`TaskCache`] is the in-process, settle-once memo:
//! the first request for a key starts the work and every later request, early
//! or late, observes the same outcome without re-running anything.
//! [`StampStore`] persists a fingerprint of each successful task's inputs so a
//! new process can skip a task whose inputs have not changed.

#![warn(missing_docs)]

pub mod error;
pub mod hasher;
pub mod memo;
pub mod stamp;

pub use error::CacheError;
pub use hasher::Fingerprinter;
pub use memo::{memoize, SettledFuture, TaskCache};
pub use stamp::{BuildStamp, StampStore};
