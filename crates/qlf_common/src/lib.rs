//! Shared foundational types used across the QLF FASM tools.
//!
//! This crate provides content hashing for database integrity checks and the
//! log-level type plus `tracing` subscriber setup shared by every binary.

#![warn(missing_docs)]

pub mod hash;
pub mod logging;

pub use hash::ContentHash;
pub use logging::{LogLevel, ParseLogLevelError};
