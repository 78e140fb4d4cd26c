use crate::gpu::extract_gpu_type;
use crate::huid::generate_human_id;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Parse an API timestamp. Accepts RFC 3339 and naive ISO-8601 (treated as UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc())
}

fn parse_opt_timestamp(raw: &Option<String>) -> Option<DateTime<Utc>> {
    raw.as_deref().and_then(parse_timestamp)
}

fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ExecutorInfo {
    pub id: String,
    pub huid: String,
    pub machine_name: String,
    pub gpu_type: String,
    pub gpu_count: u32,
    pub price_per_hour: f64,
    pub price_per_gpu_hour: f64,
    pub location: HashMap<String, String>,
    pub specs: Value,
    pub status: String,
    pub ip: String,
    pub docker_in_docker: bool,
    pub available_port_count: Option<u32>,
}

impl ExecutorInfo {
    fn first_gpu_detail(&self) -> Option<&Value> {
        self.specs.pointer("/gpu/details/0")
    }

    fn detail_number(&self, key: &str) -> Option<f64> {
        self.first_gpu_detail()
            .and_then(|d| d.get(key))
            .and_then(value_as_f64)
    }

    /// Full GPU model name as reported by the executor, e.g. "NVIDIA H100 80GB HBM3".
    pub fn gpu_model(&self) -> Option<String> {
        self.first_gpu_detail()
            .and_then(|d| d.get("name"))
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    pub fn driver_version(&self) -> Option<String> {
        match self.specs.pointer("/gpu/driver") {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Country name, else upper-cased country code, else "—".
    pub fn country(&self) -> String {
        if let Some(country) = self.location.get("country").map(|c| c.trim()) {
            if !country.is_empty() {
                return country.to_string();
            }
        }
        self.location
            .get("country_code")
            .or_else(|| self.location.get("iso_code"))
            .map(|c| c.trim().to_uppercase())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| "—".to_string())
    }

    /// VRAM per GPU in GiB (capacity is reported in MiB).
    pub fn vram_gb(&self) -> Option<f64> {
        self.detail_number("capacity").map(|mib| (mib / 1024.0).round())
    }

    pub fn ram_gb(&self) -> Option<f64> {
        self.specs
            .pointer("/ram/total")
            .and_then(value_as_f64)
            .map(kib_to_gib)
    }

    pub fn disk_gb(&self) -> Option<f64> {
        self.specs
            .pointer("/hard_disk/total")
            .and_then(value_as_f64)
            .map(kib_to_gib)
    }

    pub fn pcie_speed(&self) -> Option<f64> {
        self.detail_number("pcie_speed")
    }

    pub fn memory_speed(&self) -> Option<f64> {
        self.detail_number("memory_speed")
    }

    pub fn tflops(&self) -> Option<f64> {
        self.detail_number("graphics_speed")
    }

    pub fn net_up(&self) -> Option<f64> {
        self.specs
            .pointer("/network/upload_speed")
            .and_then(value_as_f64)
    }

    pub fn net_down(&self) -> Option<f64> {
        self.specs
            .pointer("/network/download_speed")
            .and_then(value_as_f64)
    }
}

// Totals below 8192 are already GiB; larger ones are KiB.
fn kib_to_gib(total: f64) -> f64 {
    if total < 8192.0 {
        total.trunc()
    } else {
        (total / (1024.0 * 1024.0)).round()
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PodInfo {
    pub id: String,
    pub name: String,
    pub status: String,
    pub huid: String,
    pub ssh_cmd: Option<String>,
    pub ports: HashMap<String, i64>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub executor: Option<ExecutorInfo>,
    pub template: Value,
    pub removal_scheduled_at: Option<DateTime<Utc>>,
    pub jupyter_installation_status: Option<String>,
    pub jupyter_url: Option<String>,
}

impl PodInfo {
    pub fn is_running(&self) -> bool {
        self.status.eq_ignore_ascii_case("running")
    }

    /// Running and reachable over SSH.
    pub fn is_ready(&self) -> bool {
        self.is_running() && self.ssh_cmd.as_deref().is_some_and(|c| !c.is_empty())
    }

    pub fn template_id(&self) -> Option<&str> {
        self.template.get("id").and_then(Value::as_str)
    }

    pub fn template_name(&self) -> Option<&str> {
        self.template.get("name").and_then(Value::as_str)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Template {
    pub id: String,
    pub huid: String,
    pub name: String,
    pub docker_image: String,
    pub docker_image_tag: String,
    pub category: String,
    pub status: String,
    pub user_id: Option<String>,
}

impl Template {
    pub fn image_ref(&self) -> String {
        format!("{}:{}", self.docker_image, self.docker_image_tag)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct VolumeInfo {
    pub id: String,
    pub huid: String,
    pub name: String,
    pub description: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub current_size_bytes: u64,
    pub current_file_count: u64,
    pub current_size_gb: f64,
    pub current_size_mb: f64,
    pub last_metrics_update: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BackupConfig {
    pub id: String,
    pub huid: String,
    pub pod_executor_id: String,
    pub backup_frequency_hours: u32,
    pub retention_days: u32,
    pub backup_path: String,
    pub is_active: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BackupLog {
    pub id: String,
    pub huid: String,
    pub backup_config_id: String,
    pub status: String,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
    pub progress: Option<f64>,
    pub backup_volume_id: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Result of a command run on a pod over SSH.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct ExecResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub success: bool,
}

impl ExecResult {
    pub fn new(stdout: String, stderr: String, exit_code: i32) -> Self {
        Self {
            stdout,
            stderr,
            exit_code,
            success: exit_code == 0,
        }
    }
}

/// Per-pod outcome of a fan-out execution. One pod failing never hides the others.
#[derive(Debug, Clone, Serialize)]
pub struct PodExecOutcome {
    pub pod_id: String,
    pub huid: String,
    pub outcome: std::result::Result<ExecResult, String>,
}

// Raw API response structures for parsing

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct ApiExecutorResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub machine_name: String,
    #[serde(default)]
    pub price_per_hour: Option<f64>,
    #[serde(default)]
    pub location: Option<HashMap<String, Value>>,
    #[serde(default)]
    pub specs: Value,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub executor_ip_address: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct ApiPodResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub pod_name: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub ssh_connect_cmd: Option<String>,
    #[serde(default)]
    pub ports_mapping: Option<HashMap<String, Value>>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub executor: Value,
    #[serde(default)]
    pub template: Value,
    #[serde(default)]
    pub removal_scheduled_at: Option<String>,
    #[serde(default)]
    pub jupyter_installation_status: Option<String>,
    #[serde(default)]
    pub jupyter_url: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct ApiTemplateResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub docker_image: Option<String>,
    #[serde(default)]
    pub docker_image_tag: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct ApiVolumeResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub current_size_bytes: Option<u64>,
    #[serde(default)]
    pub current_file_count: Option<u64>,
    #[serde(default)]
    pub current_size_gb: Option<f64>,
    #[serde(default)]
    pub current_size_mb: Option<f64>,
    #[serde(default)]
    pub last_metrics_update: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct ApiBackupConfigResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub pod_executor_id: Option<String>,
    #[serde(default)]
    pub backup_frequency_hours: Option<u32>,
    #[serde(default)]
    pub retention_days: Option<u32>,
    #[serde(default)]
    pub backup_path: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct ApiBackupLogResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub backup_config_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(default)]
    pub backup_volume_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

impl From<ApiExecutorResponse> for ExecutorInfo {
    fn from(api_response: ApiExecutorResponse) -> Self {
        let specs = api_response.specs;
        let gpu_count = specs
            .pointer("/gpu/count")
            .and_then(value_as_f64)
            .map(|c| c.max(0.0) as u32)
            .unwrap_or(1);

        // A bare last-word fallback means the machine name was not recognised.
        let machine_name = api_response.machine_name;
        let mut gpu_type = extract_gpu_type(&machine_name);
        if machine_name.split_whitespace().last() == Some(gpu_type.as_str()) {
            if let Some(name) = specs
                .pointer("/gpu/details/0/name")
                .and_then(Value::as_str)
                .filter(|n| !n.is_empty())
            {
                gpu_type = extract_gpu_type(name);
            }
        }

        let price_per_hour = api_response.price_per_hour.unwrap_or(0.0);
        let price_per_gpu_hour = price_per_hour / gpu_count.max(1) as f64;

        // Location values can be numbers (coordinates) as well as strings
        let location: HashMap<String, String> = api_response
            .location
            .unwrap_or_default()
            .into_iter()
            .filter_map(|(k, v)| {
                let value_str = match v {
                    Value::String(s) => s,
                    Value::Number(n) => n.to_string(),
                    Value::Bool(b) => b.to_string(),
                    Value::Null => return None,
                    other => other.to_string(),
                };
                Some((k, value_str))
            })
            .collect();

        let docker_in_docker = specs
            .get("sysbox_runtime")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let available_port_count = specs
            .get("available_port_count")
            .and_then(Value::as_u64)
            .map(|n| n as u32);

        ExecutorInfo {
            huid: generate_human_id(&api_response.id),
            id: api_response.id,
            machine_name,
            gpu_type,
            gpu_count,
            price_per_hour,
            price_per_gpu_hour,
            location,
            status: api_response.status.unwrap_or_else(|| "unknown".to_string()),
            ip: api_response.executor_ip_address.unwrap_or_default(),
            docker_in_docker,
            available_port_count,
            specs,
        }
    }
}

impl From<ApiPodResponse> for PodInfo {
    fn from(api_response: ApiPodResponse) -> Self {
        let executor = match api_response.executor {
            Value::Object(ref map) if !map.is_empty() => {
                serde_json::from_value::<ApiExecutorResponse>(api_response.executor.clone())
                    .ok()
                    .map(ExecutorInfo::from)
            }
            _ => None,
        };

        let ports = api_response
            .ports_mapping
            .unwrap_or_default()
            .into_iter()
            .filter_map(|(k, v)| value_as_f64(&v).map(|p| (k, p as i64)))
            .collect();

        PodInfo {
            huid: generate_human_id(&api_response.id),
            id: api_response.id,
            name: api_response.pod_name,
            status: api_response.status.unwrap_or_else(|| "unknown".to_string()),
            ssh_cmd: api_response.ssh_connect_cmd,
            ports,
            created_at: parse_opt_timestamp(&api_response.created_at),
            updated_at: parse_opt_timestamp(&api_response.updated_at),
            executor,
            template: api_response.template,
            removal_scheduled_at: parse_opt_timestamp(&api_response.removal_scheduled_at),
            jupyter_installation_status: api_response.jupyter_installation_status,
            jupyter_url: api_response.jupyter_url,
        }
    }
}

impl From<ApiTemplateResponse> for Template {
    fn from(api_response: ApiTemplateResponse) -> Self {
        Template {
            huid: generate_human_id(&api_response.id),
            id: api_response.id,
            name: api_response.name.unwrap_or_default(),
            docker_image: api_response.docker_image.unwrap_or_default(),
            docker_image_tag: api_response
                .docker_image_tag
                .unwrap_or_else(|| "latest".to_string()),
            category: api_response
                .category
                .unwrap_or_else(|| "general".to_string()),
            status: api_response.status.unwrap_or_else(|| "unknown".to_string()),
            user_id: api_response.user_id,
        }
    }
}

impl From<ApiVolumeResponse> for VolumeInfo {
    fn from(api_response: ApiVolumeResponse) -> Self {
        VolumeInfo {
            huid: generate_human_id(&api_response.id),
            id: api_response.id,
            name: api_response.name.unwrap_or_default(),
            description: api_response.description.unwrap_or_default(),
            created_at: parse_opt_timestamp(&api_response.created_at),
            updated_at: parse_opt_timestamp(&api_response.updated_at),
            current_size_bytes: api_response.current_size_bytes.unwrap_or(0),
            current_file_count: api_response.current_file_count.unwrap_or(0),
            current_size_gb: api_response.current_size_gb.unwrap_or(0.0),
            current_size_mb: api_response.current_size_mb.unwrap_or(0.0),
            last_metrics_update: parse_opt_timestamp(&api_response.last_metrics_update),
        }
    }
}

impl From<ApiBackupConfigResponse> for BackupConfig {
    fn from(api_response: ApiBackupConfigResponse) -> Self {
        BackupConfig {
            huid: generate_human_id(&api_response.id),
            id: api_response.id,
            pod_executor_id: api_response.pod_executor_id.unwrap_or_default(),
            backup_frequency_hours: api_response.backup_frequency_hours.unwrap_or(0),
            retention_days: api_response.retention_days.unwrap_or(0),
            backup_path: api_response.backup_path.unwrap_or_default(),
            is_active: api_response.is_active.unwrap_or(true),
            created_at: parse_opt_timestamp(&api_response.created_at),
            updated_at: parse_opt_timestamp(&api_response.updated_at),
        }
    }
}

impl From<ApiBackupLogResponse> for BackupLog {
    fn from(api_response: ApiBackupLogResponse) -> Self {
        BackupLog {
            huid: generate_human_id(&api_response.id),
            id: api_response.id,
            backup_config_id: api_response.backup_config_id.unwrap_or_default(),
            status: api_response
                .status
                .unwrap_or_else(|| "unknown".to_string()),
            started_at: parse_opt_timestamp(&api_response.started_at),
            completed_at: parse_opt_timestamp(&api_response.completed_at),
            error_message: api_response.error_message,
            progress: api_response.progress,
            backup_volume_id: api_response.backup_volume_id,
            created_at: parse_opt_timestamp(&api_response.created_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_executor() -> ExecutorInfo {
        let raw: ApiExecutorResponse = serde_json::from_value(json!({
            "id": "0f1e2d3c-aaaa-bbbb-cccc-123456789abc",
            "machine_name": "NVIDIA H100 80GB HBM3",
            "price_per_hour": 16.0,
            "executor_ip_address": "10.0.0.7",
            "location": {"country_code": "us", "lat": 37.5},
            "specs": {
                "gpu": {
                    "count": 8,
                    "driver": "550.54.15",
                    "details": [{
                        "name": "NVIDIA H100 80GB HBM3",
                        "capacity": 81559,
                        "pcie_speed": 16,
                        "memory_speed": 2619,
                        "graphics_speed": 1980
                    }]
                },
                "ram": {"total": 2113646592u64},
                "hard_disk": {"total": 512},
                "network": {"upload_speed": 900, "download_speed": 1200.5},
                "sysbox_runtime": true,
                "available_port_count": 12
            },
            "unexpected": "kept"
        }))
        .unwrap();
        ExecutorInfo::from(raw)
    }

    #[test]
    fn test_executor_conversion() {
        let executor = sample_executor();

        assert_eq!(executor.gpu_count, 8);
        assert_eq!(executor.gpu_type, "H100");
        assert_eq!(executor.price_per_gpu_hour, 2.0);
        assert_eq!(executor.ip, "10.0.0.7");
        assert_eq!(executor.status, "unknown");
        assert!(executor.docker_in_docker);
        assert_eq!(executor.available_port_count, Some(12));
        assert!(executor.huid.ends_with("-9abc"));
        assert_eq!(executor.location.get("lat").map(String::as_str), Some("37.5"));
    }

    #[test]
    fn test_executor_spec_accessors() {
        let executor = sample_executor();

        assert_eq!(executor.country(), "US");
        assert_eq!(executor.vram_gb(), Some(80.0));
        assert_eq!(executor.ram_gb(), Some(2016.0));
        assert_eq!(executor.disk_gb(), Some(512.0));
        assert_eq!(executor.tflops(), Some(1980.0));
        assert_eq!(executor.net_down(), Some(1200.5));
        assert_eq!(executor.driver_version().as_deref(), Some("550.54.15"));
        assert_eq!(executor.gpu_model().as_deref(), Some("NVIDIA H100 80GB HBM3"));
    }

    #[test]
    fn test_executor_gpu_type_falls_back_to_specs() {
        let raw: ApiExecutorResponse = serde_json::from_value(json!({
            "id": "abc",
            "machine_name": "custom box",
            "price_per_hour": 3.0,
            "specs": {"gpu": {"details": [{"name": "NVIDIA GeForce RTX 4090"}]}}
        }))
        .unwrap();
        let executor = ExecutorInfo::from(raw);

        assert_eq!(executor.gpu_type, "RTX4090");
        assert_eq!(executor.gpu_count, 1);
        assert_eq!(executor.price_per_gpu_hour, 3.0);
        assert_eq!(executor.country(), "—");
    }

    #[test]
    fn test_pod_conversion() {
        let raw: ApiPodResponse = serde_json::from_value(json!({
            "id": "pod-1234",
            "pod_name": "trainer",
            "status": "RUNNING",
            "ssh_connect_cmd": "ssh root@1.2.3.4 -p 40022",
            "ports_mapping": {"22": 40022},
            "created_at": "2024-05-01T10:00:00Z",
            "updated_at": "2024-05-01T10:05:00.123456",
            "executor": {"id": "exec-1", "machine_name": "NVIDIA A100", "price_per_hour": 1.2},
            "template": {"id": "tpl-1", "name": "pytorch"},
            "removal_scheduled_at": null
        }))
        .unwrap();
        let pod = PodInfo::from(raw);

        assert_eq!(pod.name, "trainer");
        assert!(pod.is_ready());
        assert_eq!(pod.ports.get("22"), Some(&40022));
        assert!(pod.created_at.is_some());
        assert!(pod.updated_at.is_some());
        assert_eq!(pod.executor.as_ref().map(|e| e.gpu_type.as_str()), Some("A100"));
        assert_eq!(pod.template_id(), Some("tpl-1"));
        assert!(pod.removal_scheduled_at.is_none());
    }

    #[test]
    fn test_pod_without_ssh_is_not_ready() {
        let raw: ApiPodResponse =
            serde_json::from_value(json!({"id": "p", "status": "running"})).unwrap();
        let pod = PodInfo::from(raw);

        assert!(pod.is_running());
        assert!(!pod.is_ready());
        assert!(pod.executor.is_none());
    }

    #[test]
    fn test_template_defaults() {
        let raw: ApiTemplateResponse =
            serde_json::from_value(json!({"id": "t1", "name": "base", "docker_image": "img"}))
                .unwrap();
        let template = Template::from(raw);

        assert_eq!(template.docker_image_tag, "latest");
        assert_eq!(template.category, "general");
        assert_eq!(template.status, "unknown");
        assert_eq!(template.image_ref(), "img:latest");
    }

    #[test]
    fn test_backup_config_defaults_to_active() {
        let raw: ApiBackupConfigResponse = serde_json::from_value(json!({
            "id": "cfg-1",
            "pod_executor_id": "pe-1",
            "backup_frequency_hours": 6,
            "retention_days": 7,
            "backup_path": "/root"
        }))
        .unwrap();
        let config = BackupConfig::from(raw);

        assert!(config.is_active);
        assert_eq!(config.backup_frequency_hours, 6);
    }

    #[test]
    fn test_volume_and_backup_records_keep_unknown_fields() {
        let volume: ApiVolumeResponse = serde_json::from_value(json!({
            "id": "vol-1",
            "name": "data",
            "region": "us-east"
        }))
        .unwrap();
        assert_eq!(volume.extra.get("region"), Some(&json!("us-east")));
        assert!(!volume.extra.contains_key("name"));

        let config: ApiBackupConfigResponse = serde_json::from_value(json!({
            "id": "cfg-1",
            "compression": "zstd"
        }))
        .unwrap();
        assert_eq!(config.extra.get("compression"), Some(&json!("zstd")));

        let log: ApiBackupLogResponse = serde_json::from_value(json!({
            "id": "log-1",
            "status": "COMPLETED",
            "size_bytes": 1024
        }))
        .unwrap();
        assert_eq!(log.extra.get("size_bytes"), Some(&json!(1024)));
        assert_eq!(BackupLog::from(log).status, "COMPLETED");
    }

    #[test]
    fn test_exec_result_success_flag() {
        assert!(ExecResult::new("ok".into(), String::new(), 0).success);
        assert!(!ExecResult::new(String::new(), "boom".into(), 2).success);
    }
}
