#![allow(missing_docs)]

//! Internals of libpy which are accessed by code expanded from its macros.
//!
//! Usage of any of these APIs in downstream code is implicitly acknowledging that these
//! APIs may change at any time without breaking semver guarantees.

pub mod exceptions;
pub mod panic;
pub mod trampoline;

pub use crate::instance::DerefToPyAny;
