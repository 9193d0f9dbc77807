//! Foundation types for hearth.
//!
//! This crate contains the platform-agnostic types shared by all hearth
//! crates: input events and the normalized action vocabulary, runtime
//! configuration, and the error type.

pub mod config;
pub mod error;
pub mod input;
