use crate::client::{
    ApiConfig, ExecutorFilter, LiumApiClient, RentRequest, TemplateSpec, WalletVerification,
};
use crate::errors::{ApiError, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use futures::stream::{self, StreamExt};
use lium_core::{
    generate_human_id, ApiPodResponse, ApiTemplateResponse, BackupConfig, BackupLog, ExecResult,
    ExecutorInfo, PodExecOutcome, PodInfo, Template, VolumeInfo,
};
use lium_utils::{
    interactive_session, require_private_key, rsync, run_remote_command, scp_download,
    scp_upload, ssh_command_with_key, stream_remote_command, OutputChunk, PodUtils, RsyncOptions,
    SshTarget,
};
use log::{debug, info, warn};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);
const CREATE_POLL_INTERVAL: Duration = Duration::from_secs(3);
const WALLET_POLL_INTERVAL: Duration = Duration::from_secs(2);
pub const DEFAULT_MAX_WORKERS: usize = 10;

/// SSH material used for new pods and for connecting to them
#[derive(Debug, Clone, Default)]
pub struct SshSettings {
    pub private_key: Option<PathBuf>,
    pub public_keys: Vec<String>,
    pub user: String,
}

impl SshSettings {
    /// Read a public key file; the private key is the same path without `.pub`.
    pub fn from_public_key_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            ApiError::Config(format!(
                "Cannot read SSH public key {}: {}",
                path.display(),
                e
            ))
        })?;
        let public_keys = contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();

        let raw = path.to_string_lossy();
        let private_key = raw.strip_suffix(".pub").map(PathBuf::from);

        Ok(Self {
            private_key,
            public_keys,
            user: "root".to_string(),
        })
    }
}

/// Parameters for [`Lium::up`]
#[derive(Debug, Clone)]
pub struct UpRequest {
    pub executor_id: String,
    pub name: String,
    pub template_id: Option<String>,
    pub volume_id: Option<String>,
    pub ports: Option<u32>,
    pub ssh_keys: Option<Vec<String>>,
}

impl UpRequest {
    pub fn new(executor_id: impl Into<String>) -> Self {
        Self {
            executor_id: executor_id.into(),
            name: "Your Pod".to_string(),
            template_id: None,
            volume_id: None,
            ports: None,
            ssh_keys: None,
        }
    }
}

/// What the platform tells us about a freshly rented pod
#[derive(Debug, Clone, PartialEq)]
pub struct PodHandle {
    pub id: String,
    pub name: String,
    pub status: String,
    pub huid: String,
    pub ssh_cmd: Option<String>,
    pub executor_id: String,
}

impl PodHandle {
    fn from_rent_response(response: &Value, fallback_name: &str, executor_id: &str) -> Option<Self> {
        let id = response.get("id").and_then(Value::as_str)?.to_string();
        let text = |key: &str| response.get(key).and_then(Value::as_str).map(str::to_string);

        Some(Self {
            huid: generate_human_id(&id),
            name: text("pod_name")
                .or_else(|| text("name"))
                .unwrap_or_else(|| fallback_name.to_string()),
            status: text("status").unwrap_or_else(|| "PENDING".to_string()),
            ssh_cmd: text("ssh_connect_cmd").or_else(|| text("ssh_cmd")),
            executor_id: executor_id.to_string(),
            id,
        })
    }

    fn from_pod(pod: &PodInfo, executor_id: &str) -> Self {
        Self {
            id: pod.id.clone(),
            name: pod.name.clone(),
            status: pod.status.clone(),
            huid: pod.huid.clone(),
            ssh_cmd: pod.ssh_cmd.clone(),
            executor_id: executor_id.to_string(),
        }
    }
}

/// Main SDK struct for Lium
#[derive(Debug, Clone)]
pub struct Lium {
    api_client: LiumApiClient,
    ssh: SshSettings,
    poll_interval: Duration,
}

impl Lium {
    pub fn new(api_client: LiumApiClient, ssh: SshSettings) -> Self {
        Self {
            api_client,
            ssh,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Create from environment variables (`LIUM_API_KEY`, optional `LIUM_SSH_KEY_PATH`)
    pub fn from_env() -> Result<Self> {
        let api_client = LiumApiClient::from_env()?;
        let ssh = match std::env::var("LIUM_SSH_KEY_PATH") {
            Ok(path) => SshSettings::from_public_key_path(Path::new(&path))?,
            Err(_) => SshSettings {
                user: "root".to_string(),
                ..SshSettings::default()
            },
        };
        Ok(Self::new(api_client, ssh))
    }

    pub fn from_config<C>(config: &C) -> std::result::Result<Self, C::Error>
    where
        C: ApiConfig,
    {
        let api_client = LiumApiClient::from_config(config)?;
        let ssh = SshSettings {
            private_key: config.ssh_private_key_path(),
            public_keys: config.ssh_public_keys(),
            user: config.ssh_user(),
        };
        Ok(Self::new(api_client, ssh))
    }

    /// Interval between status polls. Shorter waits (pod lookup after
    /// rent, wallet polling) never exceed it.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn client(&self) -> &LiumApiClient {
        &self.api_client
    }

    pub fn ssh_settings(&self) -> &SshSettings {
        &self.ssh
    }

    fn short_poll(&self, wanted: Duration) -> Duration {
        wanted.min(self.poll_interval)
    }

    // ---- executors and pods ----

    pub async fn ls(&self, filter: &ExecutorFilter) -> Result<Vec<ExecutorInfo>> {
        self.api_client.get_executors(filter).await
    }

    /// Look up an executor by id or huid
    pub async fn get_executor(&self, executor_id: &str) -> Result<Option<ExecutorInfo>> {
        let executors = self.ls(&ExecutorFilter::default()).await?;
        Ok(executors
            .into_iter()
            .find(|e| e.id == executor_id || e.huid == executor_id))
    }

    pub async fn gpu_types(&self) -> Result<Vec<String>> {
        Ok(self.api_client.gpu_types().await?.into_iter().collect())
    }

    pub async fn ps(&self) -> Result<Vec<PodInfo>> {
        self.api_client.get_pods().await
    }

    /// Raw pod record
    pub async fn pod(&self, pod_id: &str) -> Result<Value> {
        self.api_client.get_pod(pod_id).await
    }

    /// Find a pod by id, huid or name
    pub async fn find_pod(&self, target: &str) -> Result<Option<PodInfo>> {
        let pods = self.ps().await?;
        Ok(pods
            .into_iter()
            .find(|p| p.id == target || p.huid == target || p.name == target))
    }

    /// Rent a pod on an executor
    pub async fn up(&self, request: UpRequest) -> Result<PodHandle> {
        let executor = self
            .get_executor(&request.executor_id)
            .await?
            .ok_or_else(|| {
                ApiError::InvalidInput(format!(
                    "Executor with ID '{}' not found",
                    request.executor_id
                ))
            })?;

        let template_id = match request.template_id {
            Some(id) => id,
            None => self.default_docker_template(&executor.id).await?.id,
        };

        let ssh_keys = request
            .ssh_keys
            .filter(|keys| !keys.is_empty())
            .unwrap_or_else(|| self.ssh.public_keys.clone());
        if ssh_keys.is_empty() {
            return Err(ApiError::Config("No SSH keys found".to_string()));
        }

        let rent = RentRequest {
            pod_name: request.name.clone(),
            template_id,
            volume_id: request.volume_id,
            user_public_key: ssh_keys,
            initial_port_count: request.ports,
        };
        let response = self.api_client.rent_pod(&executor.id, &rent).await?;
        if let Some(handle) = PodHandle::from_rent_response(&response, &request.name, &executor.id)
        {
            return Ok(handle);
        }

        // The rent call does not always echo the pod; look it up by name.
        debug!("Rent response had no pod id, looking up '{}'", request.name);
        for _ in 0..2 {
            tokio::time::sleep(self.short_poll(CREATE_POLL_INTERVAL)).await;
            if let Some(pod) = self
                .ps()
                .await?
                .into_iter()
                .find(|p| p.name == request.name)
            {
                return Ok(PodHandle::from_pod(&pod, &executor.id));
            }
        }

        Err(ApiError::Operation(format!(
            "Failed to create pod {}",
            request.name
        )))
    }

    pub async fn down(&self, pod: &PodInfo) -> Result<Value> {
        info!("Removing pod {} ({})", pod.huid, pod.id);
        self.api_client.delete_pod(&pod.id).await
    }

    pub async fn rm(&self, pod: &PodInfo) -> Result<Value> {
        self.down(pod).await
    }

    pub async fn reboot(&self, pod: &PodInfo, volume_id: Option<&str>) -> Result<Value> {
        self.api_client.reboot_pod(&pod.id, volume_id).await
    }

    /// Merge `fields` into the pod's template and save it
    pub async fn edit(&self, pod_id: &str, fields: Map<String, Value>) -> Result<Value> {
        let pod = self.pod(pod_id).await?;
        let mut template = match pod.get("template") {
            Some(Value::Object(template)) => template.clone(),
            _ => {
                return Err(ApiError::Operation(format!(
                    "Pod {} has no template",
                    pod_id
                )))
            }
        };
        let template_id = template
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ApiError::Operation(format!("Pod {} template has no id", pod_id)))?;

        template.extend(fields);
        self.api_client
            .put_template(&template_id, Value::Object(template))
            .await
    }

    pub async fn switch_template(&self, pod: &PodInfo, template_id: &str) -> Result<PodInfo> {
        let response = self
            .api_client
            .switch_template(&pod.id, template_id)
            .await?;
        let raw: ApiPodResponse = match response {
            Value::Null => ApiPodResponse::default(),
            body => serde_json::from_value(body)?,
        };
        let mut updated = PodInfo::from(raw);

        updated.id = pod.id.clone();
        updated.huid = pod.huid.clone();
        if updated.name.is_empty() {
            updated.name = pod.name.clone();
        }
        if updated.executor.is_none() {
            updated.executor = pod.executor.clone();
        }
        Ok(updated)
    }

    /// Poll until the pod is running with SSH, or `None` after `timeout`
    pub async fn wait_ready(&self, pod_id: &str, timeout: Duration) -> Result<Option<PodInfo>> {
        let start = Instant::now();
        loop {
            if let Some(pod) = self
                .ps()
                .await?
                .into_iter()
                .find(|p| p.id == pod_id || p.huid == pod_id || p.name == pod_id)
            {
                if pod.is_ready() {
                    return Ok(Some(pod));
                }
                debug!("Pod {} is {}", pod.huid, pod.status);
            }

            let elapsed = start.elapsed();
            if elapsed >= timeout {
                return Ok(None);
            }
            tokio::time::sleep(self.poll_interval.min(timeout - elapsed)).await;
        }
    }

    // ---- templates ----

    /// Best template for an executor: its default images first (PyTorch
    /// preferred), then the newest PyTorch template, then any template.
    pub async fn default_docker_template(&self, executor_id: &str) -> Result<Template> {
        let executor = self.get_executor(executor_id).await?.ok_or_else(|| {
            ApiError::InvalidInput(format!("No executor found with id {}", executor_id))
        })?;

        let mut images = self
            .api_client
            .get_default_images(
                executor.gpu_model().as_deref(),
                executor.driver_version().as_deref(),
            )
            .await?;
        if let Some(pos) = images.iter().position(|img| {
            img.get("docker_image")
                .and_then(Value::as_str)
                .is_some_and(|name| name.to_lowercase().contains("pytorch"))
        }) {
            let pytorch = images.remove(pos);
            images.insert(0, pytorch);
        }

        let templates = self.api_client.get_templates().await?;
        for image in &images {
            let name = image.get("docker_image").and_then(Value::as_str);
            let tag = image.get("docker_image_tag").and_then(Value::as_str);
            if let Some(template) = templates.iter().find(|t| {
                Some(t.docker_image.as_str()) == name && Some(t.docker_image_tag.as_str()) == tag
            }) {
                return Ok(template.clone());
            }
        }

        select_fallback_template(&templates)
            .cloned()
            .ok_or_else(|| {
                ApiError::Operation("No templates available to use for executor".to_string())
            })
    }

    /// Templates whose image or name contains `filter` (case-insensitive)
    pub async fn templates(&self, filter: Option<&str>, only_my: bool) -> Result<Vec<Template>> {
        let mut templates = self.api_client.get_templates().await?;

        if let Some(filter) = filter.map(str::to_lowercase).filter(|f| !f.is_empty()) {
            templates.retain(|t| {
                t.docker_image.to_lowercase().contains(&filter)
                    || t.name.to_lowercase().contains(&filter)
            });
        }

        if only_my {
            let me = self.api_client.get_my_user_id().await?;
            templates.retain(|t| t.user_id.as_deref() == Some(me.as_str()));
        }
        Ok(templates)
    }

    pub async fn get_template(&self, template_id: &str) -> Result<Option<Template>> {
        self.api_client.get_template(template_id).await
    }

    pub async fn get_template_by_image_name(
        &self,
        image: &str,
        tag: &str,
    ) -> Result<Option<Template>> {
        Ok(self
            .api_client
            .get_templates()
            .await?
            .into_iter()
            .find(|t| t.docker_image == image && t.docker_image_tag == tag))
    }

    pub async fn create_template(&self, spec: &TemplateSpec) -> Result<Template> {
        let template = self.api_client.create_template(spec).await?;
        info!("Created template {} ({})", template.name, template.id);
        Ok(template)
    }

    /// Overwrite a template owned by the caller with `spec`
    pub async fn update_template(&self, template_id: &str, spec: &TemplateSpec) -> Result<Template> {
        let current = self
            .api_client
            .get_templates_raw()
            .await?
            .into_iter()
            .find(|t| t.get("id").and_then(Value::as_str) == Some(template_id))
            .ok_or_else(|| {
                ApiError::InvalidInput(format!("Template with ID {} not found", template_id))
            })?;

        let me = self.api_client.get_my_user_id().await?;
        if current.get("user_id").and_then(Value::as_str) != Some(me.as_str()) {
            return Err(ApiError::InvalidInput(format!(
                "Cannot update template {}: not owned by current user",
                template_id
            )));
        }

        let mut payload = match current {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        if let Value::Object(fields) = serde_json::to_value(spec)? {
            payload.extend(fields);
        }

        let response = self
            .api_client
            .put_template(template_id, Value::Object(payload.clone()))
            .await?;

        let mut raw: ApiTemplateResponse = serde_json::from_value(Value::Object(payload))?;
        raw.id = template_id.to_string();
        raw.status = response
            .get("status")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| Some("unknown".to_string()));
        Ok(raw.into())
    }

    /// Update the caller's template for the same image and tag, or create one
    pub async fn upsert_template(&self, spec: &TemplateSpec) -> Result<Template> {
        let existing = self
            .templates(None, true)
            .await?
            .into_iter()
            .find(|t| {
                t.docker_image == spec.docker_image && t.docker_image_tag == spec.docker_image_tag
            });

        match existing {
            Some(template) => {
                debug!("Updating existing template {}", template.id);
                self.update_template(&template.id, spec).await
            }
            None => self.create_template(spec).await,
        }
    }

    /// Wait for verification; `None` on timeout
    pub async fn wait_template_ready(
        &self,
        template_id: &str,
        timeout: Duration,
    ) -> Result<Option<Template>> {
        let start = Instant::now();
        loop {
            let current = self
                .templates(None, true)
                .await?
                .into_iter()
                .find(|t| t.id == template_id);

            if let Some(template) = current {
                match template.status.to_uppercase().as_str() {
                    "VERIFY_SUCCESS" => return Ok(Some(template)),
                    "VERIFY_FAILED" => {
                        return Err(ApiError::Operation(format!(
                            "Template verification failed: {}",
                            template.name
                        )))
                    }
                    status => debug!("Template {} is {}", template_id, status),
                }
            }

            let elapsed = start.elapsed();
            if elapsed >= timeout {
                return Ok(None);
            }
            tokio::time::sleep(self.poll_interval.min(timeout - elapsed)).await;
        }
    }

    // ---- remote execution ----

    /// Where to reach `pod`; the configured SSH user applies when the
    /// pod's connect command names none
    pub fn ssh_target(&self, pod: &PodInfo) -> Result<SshTarget> {
        let user = match self.ssh.user.trim() {
            "" => "root",
            user => user,
        };
        Ok(PodUtils::ssh_target_as(pod, user)?)
    }

    fn connection(&self, pod: &PodInfo) -> Result<(SshTarget, &Path)> {
        let target = self.ssh_target(pod)?;
        let key = require_private_key(self.ssh.private_key.as_deref())?;
        Ok((target, key))
    }

    pub async fn exec(
        &self,
        pod: &PodInfo,
        command: &str,
        env: &HashMap<String, String>,
    ) -> Result<ExecResult> {
        let (target, key) = self.connection(pod)?;
        Ok(run_remote_command(&target, key, command, env).await?)
    }

    /// Run a command and hand every output line to `on_chunk`; returns the exit code
    pub async fn stream_exec<F>(
        &self,
        pod: &PodInfo,
        command: &str,
        env: &HashMap<String, String>,
        on_chunk: F,
    ) -> Result<i32>
    where
        F: FnMut(OutputChunk),
    {
        let (target, key) = self.connection(pod)?;
        Ok(stream_remote_command(&target, key, command, env, on_chunk).await?)
    }

    /// Run a command on many pods at once. Results follow the order of `pods`.
    pub async fn exec_all(
        &self,
        pods: &[PodInfo],
        command: &str,
        env: &HashMap<String, String>,
        max_workers: usize,
    ) -> Vec<PodExecOutcome> {
        let workers = max_workers.max(1).min(pods.len().max(1));

        let mut outcomes: Vec<(usize, PodExecOutcome)> = stream::iter(pods.iter().enumerate())
            .map(|(index, pod)| async move {
                let outcome = self
                    .exec(pod, command, env)
                    .await
                    .map_err(|e| e.to_string());
                if let Err(e) = &outcome {
                    warn!("exec on {} failed: {}", pod.huid, e);
                }
                (
                    index,
                    PodExecOutcome {
                        pod_id: pod.id.clone(),
                        huid: pod.huid.clone(),
                        outcome,
                    },
                )
            })
            .buffer_unordered(workers)
            .collect()
            .await;

        outcomes.sort_by_key(|(index, _)| *index);
        outcomes.into_iter().map(|(_, outcome)| outcome).collect()
    }

    pub async fn upload(&self, pod: &PodInfo, local: &Path, remote: &str) -> Result<()> {
        let (target, key) = self.connection(pod)?;
        Ok(scp_upload(&target, key, local, remote, local.is_dir()).await?)
    }

    pub async fn scp(&self, pod: &PodInfo, local: &Path, remote: &str) -> Result<()> {
        self.upload(pod, local, remote).await
    }

    pub async fn download(
        &self,
        pod: &PodInfo,
        remote: &str,
        local: &Path,
        recursive: bool,
    ) -> Result<()> {
        let (target, key) = self.connection(pod)?;
        Ok(scp_download(&target, key, remote, local, recursive).await?)
    }

    /// The pod's ssh command with `-i <key>` inserted
    pub fn ssh(&self, pod: &PodInfo) -> Result<String> {
        let ssh_cmd = pod
            .ssh_cmd
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| ApiError::InvalidInput(format!("No SSH for pod {}", pod.name)))?;
        let key = require_private_key(self.ssh.private_key.as_deref())?;
        Ok(ssh_command_with_key(ssh_cmd, key))
    }

    /// Open an interactive shell on the pod; returns the ssh exit code
    pub async fn shell(&self, pod: &PodInfo) -> Result<i32> {
        let (target, key) = self.connection(pod)?;
        Ok(interactive_session(&target, key).await?)
    }

    pub async fn rsync(
        &self,
        pod: &PodInfo,
        local: &str,
        remote: &str,
        options: &RsyncOptions,
    ) -> Result<()> {
        let (target, key) = self.connection(pod)?;
        Ok(rsync(&target, key, local, remote, options).await?)
    }

    // ---- backups ----

    pub async fn backup_create(
        &self,
        pod: &PodInfo,
        path: &str,
        frequency_hours: u32,
        retention_days: u32,
    ) -> Result<BackupConfig> {
        self.api_client
            .create_backup_config(&pod.id, path, frequency_hours, retention_days)
            .await
    }

    pub async fn backup_now(&self, pod: &PodInfo, name: &str, description: &str) -> Result<Value> {
        self.api_client.backup_now(&pod.id, name, description).await
    }

    pub async fn backup_config(&self, pod: &PodInfo) -> Result<Option<BackupConfig>> {
        let executor_id = PodUtils::executor_id(pod)?;
        self.api_client.get_backup_config(&executor_id).await
    }

    pub async fn backup_list(&self) -> Result<Vec<BackupConfig>> {
        self.api_client.list_backup_configs().await
    }

    pub async fn backup_logs(&self, pod: &PodInfo) -> Result<Vec<BackupLog>> {
        let executor_id = PodUtils::executor_id(pod)?;
        self.api_client.get_backup_logs(&executor_id).await
    }

    pub async fn backup_delete(&self, config_id: &str) -> Result<Value> {
        self.api_client.delete_backup_config(config_id).await
    }

    pub async fn restore(&self, pod: &PodInfo, backup_id: &str, path: &str) -> Result<Value> {
        self.api_client.restore_backup(&pod.id, backup_id, path).await
    }

    // ---- volumes ----

    pub async fn volumes(&self) -> Result<Vec<VolumeInfo>> {
        self.api_client.list_volumes().await
    }

    pub async fn volume(&self, volume_id: &str) -> Result<VolumeInfo> {
        self.api_client.get_volume(volume_id).await
    }

    pub async fn volume_create(&self, name: &str, description: &str) -> Result<VolumeInfo> {
        self.api_client.create_volume(name, description).await
    }

    pub async fn volume_update(
        &self,
        volume_id: &str,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<VolumeInfo> {
        self.api_client
            .update_volume(volume_id, name, description)
            .await
    }

    pub async fn volume_delete(&self, volume_id: &str) -> Result<Value> {
        self.api_client.delete_volume(volume_id).await
    }

    // ---- scheduling and jupyter ----

    pub async fn schedule_termination(&self, pod: &PodInfo, at: DateTime<Utc>) -> Result<Value> {
        let iso = at.to_rfc3339_opts(SecondsFormat::Secs, true);
        info!("Scheduling removal of {} at {}", pod.huid, iso);
        self.api_client.schedule_removal(&pod.id, &iso).await
    }

    pub async fn cancel_scheduled_termination(&self, pod: &PodInfo) -> Result<Value> {
        self.api_client.cancel_scheduled_removal(&pod.id).await
    }

    pub async fn install_jupyter(&self, pod: &PodInfo, port: u16) -> Result<Value> {
        self.api_client.install_jupyter(&pod.id, port).await
    }

    // ---- payments ----

    pub async fn balance(&self) -> Result<f64> {
        self.api_client.balance().await
    }

    pub async fn wallets(&self) -> Result<Vec<Value>> {
        self.api_client.wallets().await
    }

    /// Start a TAO transfer; the returned URL is completed in a browser.
    pub async fn pay(&self, amount: f64) -> Result<String> {
        if amount <= 0.0 {
            return Err(ApiError::InvalidInput(
                "Amount must be greater than zero".to_string(),
            ));
        }
        self.api_client.create_transfer(amount).await
    }

    /// Link a coldkey to the account. `signer` receives the access key and
    /// returns its hex signature made with the coldkey.
    pub async fn link_wallet<F>(&self, coldkey_address: &str, signer: F) -> Result<()>
    where
        F: FnOnce(&str) -> Result<String>,
    {
        let access_key = self.api_client.generate_access_key().await?;
        let signature = signer(&access_key)?;

        let redirect = self.api_client.create_transfer(10.0).await?;
        let url = url::Url::parse(&redirect)
            .map_err(|e| ApiError::Operation(format!("Invalid transfer URL: {}", e)))?;
        let param = |name: &str| {
            url.query_pairs()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.into_owned())
                .ok_or_else(|| ApiError::Operation(format!("Transfer URL missing {}", name)))
        };

        let verification = WalletVerification {
            coldkey_address: coldkey_address.to_string(),
            access_key,
            signature,
            stripe_customer_id: param("customer_id")?,
            application_id: param("app_id")?,
        };
        let response = self.api_client.verify_wallet(&verification).await?;
        let status = response
            .get("status")
            .and_then(Value::as_str)
            .unwrap_or_default();
        if !status.eq_ignore_ascii_case("ok") {
            return Err(ApiError::Operation(format!(
                "Failed to add wallet: {}",
                response
            )));
        }

        for attempt in 1..=5 {
            let linked = self.wallets().await?.iter().any(|w| {
                w.get("wallet_hash").and_then(Value::as_str) == Some(coldkey_address)
            });
            if linked {
                info!("Wallet {} linked", coldkey_address);
                return Ok(());
            }
            debug!("Wallet not visible yet (attempt {})", attempt);
            tokio::time::sleep(self.short_poll(WALLET_POLL_INTERVAL)).await;
        }

        Err(ApiError::Operation(
            "Failed to add wallet. Wallet not found after 5 attempts.".to_string(),
        ))
    }
}

/// Newest PyTorch template by the numeric prefix of its tag, else the first template
pub fn select_fallback_template(templates: &[Template]) -> Option<&Template> {
    fn is_pytorch(t: &Template) -> bool {
        t.category.to_uppercase().contains("PYTORCH") || t.docker_image.to_lowercase().contains("pytorch")
    }

    fn version_key(t: &Template) -> Vec<u64> {
        let version = t.docker_image_tag.split('-').next().unwrap_or_default();
        version
            .split('.')
            .map_while(|piece| piece.parse::<u64>().ok())
            .collect()
    }

    // First template wins a tie
    templates
        .iter()
        .filter(|t| is_pytorch(t))
        .fold(None, |best: Option<&Template>, t| match best {
            Some(b) if version_key(b) >= version_key(t) => Some(b),
            _ => Some(t),
        })
        .or_else(|| templates.first())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn template(id: &str, image: &str, tag: &str, category: &str) -> Template {
        ApiTemplateResponse {
            id: id.to_string(),
            docker_image: Some(image.to_string()),
            docker_image_tag: Some(tag.to_string()),
            category: Some(category.to_string()),
            ..Default::default()
        }
        .into()
    }

    #[test]
    fn test_fallback_prefers_newest_pytorch() {
        let templates = vec![
            template("a", "ubuntu", "22.04", "UBUNTU"),
            template("b", "daturaai/pytorch", "2.1.0-py3.10", "PYTORCH"),
            template("c", "daturaai/pytorch", "2.4.1-py3.11", "PYTORCH"),
            template("d", "custom/pytorch-dev", "latest", "OTHER"),
        ];
        assert_eq!(select_fallback_template(&templates).unwrap().id, "c");

        let plain = vec![template("x", "ubuntu", "22.04", "UBUNTU")];
        assert_eq!(select_fallback_template(&plain).unwrap().id, "x");
        assert!(select_fallback_template(&[]).is_none());
    }

    #[test]
    fn test_fallback_tie_keeps_first_listed() {
        let templates = vec![
            template("a", "daturaai/pytorch", "latest", "PYTORCH"),
            template("b", "daturaai/pytorch", "dev", "PYTORCH"),
        ];
        assert_eq!(select_fallback_template(&templates).unwrap().id, "a");

        let same_version = vec![
            template("u", "ubuntu", "22.04", "UBUNTU"),
            template("p1", "daturaai/pytorch", "2.4.1-py3.10", "PYTORCH"),
            template("p2", "daturaai/pytorch", "2.4.1-py3.11", "PYTORCH"),
        ];
        assert_eq!(select_fallback_template(&same_version).unwrap().id, "p1");
    }

    #[test]
    fn test_pod_handle_from_rent_response() {
        let response = json!({
            "id": "3f2a8c1e-0000-4000-8000-000000000000",
            "pod_name": "trainer",
            "status": "PENDING",
            "ssh_connect_cmd": "ssh root@1.2.3.4 -p 22"
        });
        let handle = PodHandle::from_rent_response(&response, "fallback", "exec-1").unwrap();
        assert_eq!(handle.name, "trainer");
        assert_eq!(handle.executor_id, "exec-1");
        assert_eq!(handle.huid, generate_human_id(&handle.id));
        assert_eq!(handle.ssh_cmd.as_deref(), Some("ssh root@1.2.3.4 -p 22"));

        assert!(PodHandle::from_rent_response(&json!({"ok": true}), "n", "e").is_none());
        assert!(PodHandle::from_rent_response(&Value::Null, "n", "e").is_none());
    }

    #[test]
    fn test_ssh_settings_from_public_key_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("id_ed25519.pub");
        std::fs::write(&path, "ssh-ed25519 AAAA user@host\n\n").unwrap();

        let settings = SshSettings::from_public_key_path(&path).unwrap();
        assert_eq!(settings.public_keys, vec!["ssh-ed25519 AAAA user@host"]);
        assert_eq!(settings.private_key, Some(dir.path().join("id_ed25519")));
        assert_eq!(settings.user, "root");
    }

    #[test]
    fn test_up_request_defaults() {
        let request = UpRequest::new("exec-1");
        assert_eq!(request.name, "Your Pod");
        assert!(request.template_id.is_none());
        assert!(request.ssh_keys.is_none());
    }
}
