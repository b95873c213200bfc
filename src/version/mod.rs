//! Version comparison and upgrade messaging.
//!
//! [`compare`] orders two loosely formatted version strings component by
//! component. [`resolve`] turns the verdict into a user-facing message
//! under caller-chosen policies.

mod compare;
mod message;

pub use compare::{Verdict, compare, compare_versions, strip_prefix};
pub use message::{
    DEFAULT_EQUAL, DEFAULT_NEWER, DEFAULT_OLDER, PolicyViolation, Resolution, VersionMessages,
    VersionOptions, check, resolve,
};
