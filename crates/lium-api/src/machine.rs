//! Run a Python function on a freshly rented GPU pod.
//!
//! A [`Machine`] picks the cheapest Pareto-optimal executor for its GPU
//! type, rents a pod, ships the job source plus JSON arguments to it,
//! runs `main(...)` and reads the result back from a marker line on
//! stdout. The pod is removed afterwards unless `keep` is set.

use crate::client::ExecutorFilter;
use crate::errors::{ApiError, Result};
use crate::sdk::{Lium, UpRequest};
use lium_core::{calculate_pareto_frontier, generate_uuid, ExecResult, ExecutorInfo, PodInfo};
use lium_utils::shell_quote;
use log::{debug, info, warn};
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

pub const RESULT_MARKER: &str = "__LIUM_RESULT__";

/// Result of a remote job
#[derive(Debug, Clone, PartialEq)]
pub struct JobOutput {
    /// Whatever `main` returned, as JSON
    pub value: Value,
    /// Job stdout without the result line
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug, Clone)]
pub struct Machine {
    gpu: String,
    count: Option<u32>,
    requirements: Vec<String>,
    template_id: Option<String>,
    name_prefix: String,
    keep: bool,
    timeout: Duration,
}

impl Machine {
    pub fn new(gpu: impl Into<String>) -> Self {
        Self {
            gpu: gpu.into(),
            count: None,
            requirements: Vec::new(),
            template_id: None,
            name_prefix: "lium-job".to_string(),
            keep: false,
            timeout: Duration::from_secs(300),
        }
    }

    pub fn requirements<I, S>(mut self, requirements: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.requirements = requirements.into_iter().map(Into::into).collect();
        self
    }

    pub fn count(mut self, count: u32) -> Self {
        self.count = Some(count);
        self
    }

    pub fn template(mut self, template_id: impl Into<String>) -> Self {
        self.template_id = Some(template_id.into());
        self
    }

    pub fn name(mut self, prefix: impl Into<String>) -> Self {
        self.name_prefix = prefix.into();
        self
    }

    pub fn keep(mut self, keep: bool) -> Self {
        self.keep = keep;
        self
    }

    /// How long to wait for the pod to become ready
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Execute `source` (which must define `main`) with `args` on a new pod.
    ///
    /// An object is passed as keyword arguments, an array as positional ones.
    pub async fn run_python(&self, lium: &Lium, source: &str, args: &Value) -> Result<JobOutput> {
        let executor = self.pick_executor(lium).await?;
        let job_id = generate_uuid();
        let name = format!("{}-{}", self.name_prefix, &job_id[..8]);

        info!(
            "Renting {} ({} x {}) for job {}",
            executor.huid, executor.gpu_count, executor.gpu_type, name
        );
        let mut request = UpRequest::new(executor.id.clone());
        request.name = name;
        request.template_id = self.template_id.clone();
        let handle = lium.up(request).await?;

        let result = self.run_on_pod(lium, &handle.id, &job_id, source, args).await;

        if self.keep {
            info!("Keeping pod {} ({})", handle.huid, handle.id);
        } else if let Err(e) = lium.client().delete_pod(&handle.id).await {
            warn!("Failed to remove pod {}: {}", handle.id, e);
        }
        result
    }

    async fn pick_executor(&self, lium: &Lium) -> Result<ExecutorInfo> {
        let filter = ExecutorFilter {
            gpu_type: Some(self.gpu.clone()),
            gpu_count: self.count,
            ..ExecutorFilter::default()
        };
        let executors = lium.ls(&filter).await?;

        calculate_pareto_frontier(executors)
            .into_iter()
            .filter(|(_, optimal)| *optimal)
            .map(|(executor, _)| executor)
            .min_by(|a, b| a.price_per_hour.total_cmp(&b.price_per_hour))
            .ok_or_else(|| {
                ApiError::Operation(format!("No executors available for {}", self.gpu))
            })
    }

    async fn run_on_pod(
        &self,
        lium: &Lium,
        pod_id: &str,
        job_id: &str,
        source: &str,
        args: &Value,
    ) -> Result<JobOutput> {
        let pod = lium
            .wait_ready(pod_id, self.timeout)
            .await?
            .ok_or_else(|| {
                ApiError::Timeout(format!(
                    "Pod {} not ready after {}s",
                    pod_id,
                    self.timeout.as_secs()
                ))
            })?;

        let remote_script = format!("/tmp/lium_job_{}.py", job_id);
        let remote_args = format!("/tmp/lium_job_{}.json", job_id);
        self.upload_job(lium, &pod, job_id, source, args).await?;

        let env = HashMap::new();
        if !self.requirements.is_empty() {
            let packages: Vec<String> = self.requirements.iter().map(|r| shell_quote(r)).collect();
            let install = lium
                .exec(&pod, &format!("pip install -q {}", packages.join(" ")), &env)
                .await?;
            if !install.success {
                return Err(ApiError::Operation(format!(
                    "Installing requirements failed: {}",
                    install.stderr.trim()
                )));
            }
        }

        debug!("Running {} on {}", remote_script, pod.huid);
        let run = lium
            .exec(&pod, &format!("python3 {}", shell_quote(&remote_script)), &env)
            .await?;
        let cleanup = format!("rm -f {} {}", shell_quote(&remote_script), shell_quote(&remote_args));
        let cleaned = lium.exec(&pod, &cleanup, &env).await;
        if let Some(message) = cleanup_warning(&pod.huid, &cleaned) {
            warn!("{}", message);
        }

        let (value, stdout) = parse_job_output(&run.stdout)?;
        match value {
            Some(value) => Ok(JobOutput {
                value,
                stdout,
                stderr: run.stderr,
            }),
            None if !run.success => Err(ApiError::Operation(format!(
                "Remote job failed with exit code {}: {}",
                run.exit_code,
                run.stderr.trim()
            ))),
            None => Ok(JobOutput {
                value: Value::Null,
                stdout,
                stderr: run.stderr,
            }),
        }
    }

    async fn upload_job(
        &self,
        lium: &Lium,
        pod: &PodInfo,
        job_id: &str,
        source: &str,
        args: &Value,
    ) -> Result<()> {
        let local_dir = std::env::temp_dir();
        let files: [(PathBuf, String); 2] = [
            (
                local_dir.join(format!("lium_job_{}.py", job_id)),
                job_script(source, job_id),
            ),
            (
                local_dir.join(format!("lium_job_{}.json", job_id)),
                serde_json::to_string(args)?,
            ),
        ];

        let mut outcome = Ok(());
        for (path, contents) in &files {
            if let Err(e) = std::fs::write(path, contents) {
                outcome = Err(ApiError::Operation(format!(
                    "Cannot write {}: {}",
                    path.display(),
                    e
                )));
                break;
            }
            let remote = format!(
                "/tmp/{}",
                path.file_name().and_then(|n| n.to_str()).unwrap_or_default()
            );
            if let Err(e) = lium.upload(pod, path, &remote).await {
                outcome = Err(e);
                break;
            }
        }

        for (path, _) in &files {
            let _ = std::fs::remove_file(path);
        }
        outcome
    }
}

/// Python source that loads the job arguments, calls `main` and prints the result line.
pub fn job_script(source: &str, job_id: &str) -> String {
    format!(
        r#"import json

{source}


def __lium_run():
    with open("/tmp/lium_job_{job_id}.json") as handle:
        args = json.load(handle)
    if isinstance(args, dict):
        result = main(**args)
    elif isinstance(args, list):
        result = main(*args)
    elif args is None:
        result = main()
    else:
        result = main(args)
    print("{marker}" + json.dumps(result, default=str), flush=True)


if __name__ == "__main__":
    __lium_run()
"#,
        source = source,
        job_id = job_id,
        marker = RESULT_MARKER,
    )
}

/// Warning for a job-file cleanup that did not succeed
fn cleanup_warning(huid: &str, outcome: &Result<ExecResult>) -> Option<String> {
    match outcome {
        Ok(result) if result.success => None,
        Ok(result) => Some(format!(
            "Removing job files on {} exited with {}: {}",
            huid,
            result.exit_code,
            result.stderr.trim()
        )),
        Err(e) => Some(format!("Removing job files on {} failed: {}", huid, e)),
    }
}

/// Split job stdout into the decoded result (from the last marker line) and
/// the remaining output.
pub fn parse_job_output(stdout: &str) -> Result<(Option<Value>, String)> {
    let mut value = None;
    let mut rest = Vec::new();

    for line in stdout.lines() {
        match line.strip_prefix(RESULT_MARKER) {
            Some(payload) => value = Some(serde_json::from_str(payload.trim())?),
            None => rest.push(line),
        }
    }

    let mut remaining = rest.join("\n");
    if !remaining.is_empty() && stdout.ends_with('\n') {
        remaining.push('\n');
    }
    Ok((value, remaining))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cleanup_warning() {
        let ok = Ok(ExecResult::new(String::new(), String::new(), 0));
        assert!(cleanup_warning("brave-cat-1234", &ok).is_none());

        let denied = Ok(ExecResult::new(String::new(), "permission denied\n".into(), 1));
        let message = cleanup_warning("brave-cat-1234", &denied).unwrap();
        assert!(message.contains("exited with 1: permission denied"));

        let lost = Err(ApiError::Operation("connection reset".into()));
        let message = cleanup_warning("brave-cat-1234", &lost).unwrap();
        assert!(message.contains("brave-cat-1234 failed: connection reset"));
    }

    #[test]
    fn test_parse_job_output_extracts_result() {
        let stdout = "loading model\nstep 1\n__LIUM_RESULT__{\"answer\": 42}\n";
        let (value, rest) = parse_job_output(stdout).unwrap();
        assert_eq!(value, Some(json!({"answer": 42})));
        assert_eq!(rest, "loading model\nstep 1\n");
    }

    #[test]
    fn test_parse_job_output_last_marker_wins() {
        let stdout = "__LIUM_RESULT__1\n__LIUM_RESULT__\"two\"";
        let (value, rest) = parse_job_output(stdout).unwrap();
        assert_eq!(value, Some(json!("two")));
        assert!(rest.is_empty());
    }

    #[test]
    fn test_parse_job_output_without_marker() {
        let (value, rest) = parse_job_output("Traceback...\n").unwrap();
        assert!(value.is_none());
        assert_eq!(rest, "Traceback...\n");
    }

    #[test]
    fn test_parse_job_output_bad_json() {
        assert!(parse_job_output("__LIUM_RESULT__{not json").is_err());
    }

    #[test]
    fn test_job_script_references_args_file() {
        let script = job_script("def main(x):\n    return x * 2", "abc123");
        assert!(script.contains("/tmp/lium_job_abc123.json"));
        assert!(script.contains("def main(x):"));
        assert!(script.contains("main(**args)"));
        assert!(script.contains(RESULT_MARKER));
    }

    #[test]
    fn test_machine_builder() {
        let machine = Machine::new("A100")
            .requirements(["torch", "transformers"])
            .count(2)
            .name("infer")
            .keep(true)
            .timeout(Duration::from_secs(60));

        assert_eq!(machine.gpu, "A100");
        assert_eq!(machine.count, Some(2));
        assert_eq!(machine.requirements, vec!["torch", "transformers"]);
        assert_eq!(machine.name_prefix, "infer");
        assert!(machine.keep);
        assert_eq!(machine.timeout, Duration::from_secs(60));
    }
}
