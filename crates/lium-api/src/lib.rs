//! # Lium API
//!
//! HTTP client and SDK for the Lium GPU pod platform.
//! This crate provides the raw REST client, the `Lium` facade that
//! combines it with SSH plumbing, and the `Machine` job runner.

pub mod client;
pub mod errors;
pub mod machine;
pub mod sdk;

// Re-export common types for convenience
pub use client::*;
pub use errors::*;
pub use machine::*;
pub use sdk::*;

// Re-export core types that API consumers will need
pub use lium_core::{
    BackupConfig, BackupLog, ExecResult, ExecutorInfo, PodExecOutcome, PodInfo,
    Result as CoreResult, Template, VolumeInfo,
};
