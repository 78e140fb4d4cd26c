use crate::errors::{ParseError, Result, UtilsError};
use crate::parsers::{Parser, SshCommandParser, SshTarget};
use lium_core::PodInfo;

/// Utility functions for working with pods
pub struct PodUtils;

impl PodUtils {
    /// Pods that are running and have SSH details
    pub fn filter_ready_pods(pods: &[PodInfo]) -> Vec<&PodInfo> {
        pods.iter().filter(|pod| pod.is_ready()).collect()
    }

    /// Executor ID of a pod, needed by the backup endpoints
    pub fn executor_id(pod: &PodInfo) -> Result<String> {
        pod.executor
            .as_ref()
            .map(|e| e.id.clone())
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                UtilsError::Parse(ParseError::MissingField(format!(
                    "No executor information for pod '{}'",
                    pod.huid
                )))
            })
    }

    pub fn ssh_target(pod: &PodInfo) -> Result<SshTarget> {
        Self::ssh_target_as(pod, "root")
    }

    /// Like `ssh_target`, logging in as `default_user` when the pod's
    /// command names no user
    pub fn ssh_target_as(pod: &PodInfo, default_user: &str) -> Result<SshTarget> {
        let ssh_cmd = pod
            .ssh_cmd
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| {
                UtilsError::Parse(ParseError::MissingField(format!(
                    "No SSH for pod {}",
                    if pod.name.is_empty() { &pod.huid } else { &pod.name }
                )))
            })?;
        SshCommandParser::with_default_user(default_user).parse(ssh_cmd)
    }

    /// Hourly price of a pod's executor, 0 when unknown
    pub fn price_per_hour(pod: &PodInfo) -> f64 {
        pod.executor.as_ref().map(|e| e.price_per_hour).unwrap_or(0.0)
    }

    /// Seconds since the pod was created
    pub fn uptime_seconds(pod: &PodInfo, now: chrono::DateTime<chrono::Utc>) -> Option<u64> {
        pod.created_at
            .map(|created| (now - created).num_seconds().max(0) as u64)
    }
}

pub fn filter_ready_pods(pods: &[PodInfo]) -> Vec<&PodInfo> {
    PodUtils::filter_ready_pods(pods)
}

pub fn executor_id(pod: &PodInfo) -> Result<String> {
    PodUtils::executor_id(pod)
}

pub fn ssh_target(pod: &PodInfo) -> Result<SshTarget> {
    PodUtils::ssh_target(pod)
}
