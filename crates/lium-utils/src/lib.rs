//! # Lium Utils
//!
//! Infrastructure utilities for the Lium project.
//! This crate wraps the external programs Lium drives (`ssh`, `scp`,
//! `rsync`, `docker`) and holds the formatting helpers shared by the CLI.

pub mod docker;
pub mod errors;
pub mod formatters;
pub mod parsers;
pub mod pod;
pub mod ssh;

// Re-export common types for convenience
pub use errors::*;
pub use formatters::*;
pub use parsers::*;
pub use pod::*;
pub use ssh::*;
