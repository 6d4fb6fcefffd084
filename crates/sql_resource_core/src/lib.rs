//! Shared SQL custom-resource domain primitives.
//!
//! This crate owns the lifecycle event and response contracts, parameter
//! validation, credential decoding, connection descriptors and resource
//! identity derivation. It intentionally excludes AWS SDK, Lambda runtime and
//! database driver concerns.

pub mod contract;
pub mod credentials;
pub mod error;
pub mod identity;
