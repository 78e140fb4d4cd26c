//! # Lium Core
//!
//! Core domain logic for Lium GPU pod management.
//!
//! This crate contains pure business logic with no I/O dependencies:
//! - Domain models and the conversions from raw API records
//! - Error definitions
//! - Human-readable IDs and GPU type extraction
//! - Pareto optimisation over executors
//! - Filtering, sorting, target and schedule parsing

pub mod errors;
pub mod gpu;
pub mod huid;
pub mod models;
pub mod optimization;
pub mod schedule;
pub mod utils;

// Re-export commonly used types
pub use errors::{LiumError, Result};
pub use gpu::{extract_gpu_type, DefaultGpuModelExtractor, GpuModelExtractor};
pub use huid::{generate_human_id, generate_uuid, is_valid_uuid, DefaultIdGenerator, IdGenerator};
pub use models::{
    ApiBackupConfigResponse, ApiBackupLogResponse, ApiExecutorResponse, ApiPodResponse,
    ApiTemplateResponse, ApiVolumeResponse, BackupConfig, BackupLog, ExecResult, ExecutorInfo,
    PodExecOutcome, PodInfo, Template, VolumeInfo,
};
pub use optimization::{
    calculate_pareto_frontier, dominates, extract_executor_metrics, DefaultParetoOptimizer,
    ExecutorMetricsExtractor, MetricsExtractor, ParetoOptimizer,
};
pub use schedule::{parse_duration, parse_time_spec, termination_time};
pub use utils::SortKey;
