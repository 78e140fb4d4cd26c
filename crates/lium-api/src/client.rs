use crate::errors::{ApiError, HttpError, Result};
use lium_core::{
    extract_gpu_type, ApiBackupConfigResponse, ApiBackupLogResponse, ApiExecutorResponse,
    ApiPodResponse, ApiTemplateResponse, ApiVolumeResponse, BackupConfig, BackupLog, ExecutorInfo,
    PodInfo, Template, VolumeInfo,
};
use log::{debug, error, info, trace, warn};
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://lium.io/api";
pub const DEFAULT_PAY_URL: &str = "https://pay-api.lium.io";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_ATTEMPTS: u32 = 3;

/// Trait for providing configuration to the API client
/// This allows the main application to implement config without circular dependencies
pub trait ApiConfig {
    type Error;

    /// Get the API key for authentication
    fn get_api_key(&self) -> std::result::Result<String, Self::Error>;

    /// Get the base URL for the API (optional, defaults to official API)
    fn get_base_url(&self) -> std::result::Result<Option<String>, Self::Error> {
        Ok(None)
    }

    fn get_pay_url(&self) -> Option<String> {
        None
    }

    fn get_pay_api_key(&self) -> Option<String> {
        None
    }

    /// Private key handed to ssh/scp/rsync
    fn ssh_private_key_path(&self) -> Option<PathBuf> {
        None
    }

    /// Public keys authorised on new pods
    fn ssh_public_keys(&self) -> Vec<String> {
        Vec::new()
    }

    fn ssh_user(&self) -> String {
        "root".to_string()
    }
}

/// Mask an API key for logs: first and last four characters only.
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Query filters for `GET /executors`
#[derive(Debug, Clone, Default)]
pub struct ExecutorFilter {
    pub gpu_type: Option<String>,
    pub gpu_count: Option<u32>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub max_distance_miles: Option<f64>,
}

/// Body of `POST /executors/{id}/rent`
#[derive(Debug, Clone, Serialize)]
pub struct RentRequest {
    pub pod_name: String,
    pub template_id: String,
    pub volume_id: Option<String>,
    pub user_public_key: Vec<String>,
    pub initial_port_count: Option<u32>,
}

/// Template fields sent on create and update
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TemplateSpec {
    pub name: String,
    pub docker_image: String,
    pub docker_image_digest: String,
    pub docker_image_tag: String,
    pub internal_ports: Vec<u16>,
    pub startup_commands: String,
    pub category: String,
    pub container_start_immediately: bool,
    pub description: String,
    pub entrypoint: String,
    pub environment: HashMap<String, String>,
    pub is_private: bool,
    pub readme: String,
    pub volumes: Vec<String>,
}

impl TemplateSpec {
    pub fn new(name: impl Into<String>, docker_image: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            docker_image: docker_image.into(),
            docker_image_digest: String::new(),
            docker_image_tag: "latest".to_string(),
            internal_ports: vec![22, 8000],
            startup_commands: String::new(),
            category: "UBUNTU".to_string(),
            container_start_immediately: true,
            description: name.clone(),
            entrypoint: String::new(),
            environment: HashMap::new(),
            is_private: true,
            readme: name.clone(),
            volumes: vec!["/workspace".to_string()],
            name,
        }
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.docker_image_tag = tag.into();
        self
    }

    pub fn digest(mut self, digest: impl Into<String>) -> Self {
        self.docker_image_digest = digest.into();
        self
    }

    pub fn ports(mut self, ports: Vec<u16>) -> Self {
        self.internal_ports = ports;
        self
    }

    pub fn start_command(mut self, command: impl Into<String>) -> Self {
        self.startup_commands = command.into();
        self
    }

    pub fn public(mut self, public: bool) -> Self {
        self.is_private = !public;
        self
    }
}

/// Body of `POST {pay}/token/verify`
#[derive(Debug, Clone, Serialize)]
pub struct WalletVerification {
    pub coldkey_address: String,
    pub access_key: String,
    pub signature: String,
    pub stripe_customer_id: String,
    pub application_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Service {
    Main,
    Pay,
}

/// HTTP client for the Lium REST API and its pay API
#[derive(Debug, Clone)]
pub struct LiumApiClient {
    client: Client,
    api_key: String,
    base_url: String,
    pay_url: String,
    pay_api_key: Option<String>,
    retry_delay: Duration,
}

impl LiumApiClient {
    pub fn new(api_key: String, base_url: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                warn!("Falling back to default HTTP client: {}", e);
                Client::new()
            });
        let base_url = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        debug!("Creating LiumApiClient");
        debug!("  API Key: {}", mask_key(&api_key));
        debug!("  Base URL: {}", base_url);

        Self {
            client,
            api_key,
            base_url,
            pay_url: DEFAULT_PAY_URL.to_string(),
            pay_api_key: None,
            retry_delay: Duration::from_secs(1),
        }
    }

    pub fn from_env() -> Result<Self> {
        debug!("Creating LiumApiClient from environment variable");
        let api_key = std::env::var("LIUM_API_KEY").map_err(|_| {
            error!("LIUM_API_KEY environment variable not set");
            ApiError::Config("LIUM_API_KEY environment variable not set".to_string())
        })?;

        let base_url = std::env::var("LIUM_BASE_URL").ok();
        let client = Self::new(api_key, base_url);
        Ok(match std::env::var("LIUM_PAY_API_KEY") {
            Ok(key) => client.with_pay_api_key(key),
            Err(_) => client,
        })
    }

    /// Create API client from any configuration implementing ApiConfig trait
    pub fn from_config<C>(config: &C) -> std::result::Result<Self, C::Error>
    where
        C: ApiConfig,
    {
        debug!("Creating LiumApiClient from config");
        let api_key = config.get_api_key()?;
        let base_url = config.get_base_url()?;

        let mut client = Self::new(api_key, base_url);
        if let Some(pay_url) = config.get_pay_url() {
            client = client.with_pay_url(pay_url);
        }
        if let Some(key) = config.get_pay_api_key() {
            client = client.with_pay_api_key(key);
        }
        Ok(client)
    }

    pub fn with_pay_url(mut self, pay_url: impl Into<String>) -> Self {
        self.pay_url = pay_url.into();
        self
    }

    pub fn with_pay_api_key(mut self, key: impl Into<String>) -> Self {
        self.pay_api_key = Some(key.into());
        self
    }

    /// Initial backoff between retries; doubles on every attempt.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, service: Service, endpoint: &str) -> String {
        let base = match service {
            Service::Main => &self.base_url,
            Service::Pay => &self.pay_url,
        };
        format!(
            "{}/{}",
            base.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }

    fn key_for(&self, service: Service) -> Result<&str> {
        match service {
            Service::Main => Ok(&self.api_key),
            Service::Pay => self.pay_api_key.as_deref().ok_or_else(|| {
                ApiError::Config(
                    "Pay API key not configured. Set LIUM_PAY_API_KEY or 'api.pay_api_key'"
                        .to_string(),
                )
            }),
        }
    }

    /// Send a request with retries and return the decoded JSON body
    /// (`Value::Null` for empty bodies).
    async fn send(
        &self,
        service: Service,
        method: Method,
        endpoint: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<Value> {
        let url = self.url_for(service, endpoint);
        let key = self.key_for(service)?;
        let mut delay = self.retry_delay;

        for attempt in 1..=MAX_ATTEMPTS {
            debug!("HTTP {} {} (attempt {})", method, url, attempt);
            trace!("  X-API-KEY: {}", mask_key(key));
            if let Some(body) = body {
                trace!("Request body: {}", body);
            }

            let mut request = self
                .client
                .request(method.clone(), &url)
                .header("X-API-KEY", key);
            if !query.is_empty() {
                request = request.query(query);
            }
            if let Some(body) = body {
                request = request.json(body);
            }

            let result = match request.send().await {
                Ok(response) => Self::handle_response(response).await,
                Err(e) => Err(HttpError::Request(e)),
            };

            match result {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < MAX_ATTEMPTS => {
                    warn!(
                        "{} {} failed ({}), retrying in {:?}",
                        method, url, e, delay
                    );
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
                Err(e) => {
                    error!("{} {} failed: {}", method, url, e);
                    return Err(e.into());
                }
            }
        }

        Err(ApiError::Operation(format!(
            "{} {} failed after {} attempts",
            method, url, MAX_ATTEMPTS
        )))
    }

    /// Map non-success statuses to errors and decode the body.
    async fn handle_response(response: Response) -> std::result::Result<Value, HttpError> {
        let status = response.status();
        let text = response.text().await?;
        debug!("Response status: {}", status);

        if status.is_success() {
            if text.trim().is_empty() {
                return Ok(Value::Null);
            }
            // Some endpoints answer with plain text
            return Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)));
        }

        debug!("Error response body: {}", text);
        Err(match status {
            StatusCode::UNAUTHORIZED => HttpError::AuthenticationFailed,
            StatusCode::FORBIDDEN => HttpError::Forbidden(text),
            StatusCode::NOT_FOUND => HttpError::NotFound(text),
            StatusCode::REQUEST_TIMEOUT => HttpError::Timeout,
            StatusCode::TOO_MANY_REQUESTS => HttpError::RateLimited,
            s if s.is_server_error() => HttpError::ServerError(s.as_u16()),
            s => HttpError::Status {
                status: s.as_u16(),
                message: text,
            },
        })
    }

    async fn get(&self, endpoint: &str) -> Result<Value> {
        self.send(Service::Main, Method::GET, endpoint, &[], None)
            .await
    }

    async fn get_with_query(&self, endpoint: &str, query: &[(&str, String)]) -> Result<Value> {
        self.send(Service::Main, Method::GET, endpoint, query, None)
            .await
    }

    async fn post(&self, endpoint: &str, body: Value) -> Result<Value> {
        self.send(Service::Main, Method::POST, endpoint, &[], Some(&body))
            .await
    }

    async fn put(&self, endpoint: &str, body: Value) -> Result<Value> {
        self.send(Service::Main, Method::PUT, endpoint, &[], Some(&body))
            .await
    }

    async fn delete(&self, endpoint: &str) -> Result<Value> {
        self.send(Service::Main, Method::DELETE, endpoint, &[], None)
            .await
    }

    fn decode<T: DeserializeOwned>(value: Value) -> Result<T> {
        Ok(serde_json::from_value(value)?)
    }

    fn decode_list<R, T>(value: Value) -> Result<Vec<T>>
    where
        R: DeserializeOwned,
        T: From<R>,
    {
        let items = match value {
            Value::Null => Vec::new(),
            // Paginated responses wrap the list in {"items": [...]}
            Value::Object(mut map) if map.contains_key("items") => {
                Self::decode::<Vec<R>>(map.remove("items").unwrap_or(Value::Null))?
            }
            other => Self::decode::<Vec<R>>(other)?,
        };
        Ok(items.into_iter().map(T::from).collect())
    }

    // ---- executors ----

    /// Machine names known to the platform (`GET /machines`)
    pub async fn get_machines(&self) -> Result<Vec<String>> {
        let machines = self.get("machines").await?;
        Ok(machines
            .as_array()
            .map(|list| {
                list.iter()
                    .filter_map(|m| m.get("name").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default())
    }

    /// Set of machine names advertised by the platform
    pub async fn gpu_types(&self) -> Result<BTreeSet<String>> {
        Ok(self.get_machines().await?.into_iter().collect())
    }

    /// Map a short GPU name like "H100" to every matching machine name, comma-joined.
    async fn resolve_machine_names(&self, gpu_short: &str) -> Option<String> {
        let machines = match self.get_machines().await {
            Ok(machines) => machines,
            Err(e) => {
                debug!("Could not resolve machine names: {}", e);
                return None;
            }
        };
        let wanted = gpu_short.to_uppercase();
        let matching: Vec<String> = machines
            .into_iter()
            .filter(|name| extract_gpu_type(name).to_uppercase() == wanted)
            .collect();
        (!matching.is_empty()).then(|| matching.join(","))
    }

    pub async fn get_executors(&self, filter: &ExecutorFilter) -> Result<Vec<ExecutorInfo>> {
        debug!("Fetching executors with {:?}", filter);
        let mut query: Vec<(&str, String)> = vec![("size", "1000".to_string())];

        if let Some(gpu) = filter.gpu_type.as_deref().filter(|g| !g.is_empty()) {
            let names = self
                .resolve_machine_names(gpu)
                .await
                .unwrap_or_else(|| gpu.to_string());
            query.push(("machine_names", names));
        }
        if let Some(count) = filter.gpu_count {
            query.push(("gpu_count_gte", count.to_string()));
            query.push(("gpu_count_lte", count.to_string()));
        }
        if let (Some(lat), Some(lon)) = (filter.lat, filter.lon) {
            query.push(("lat", lat.to_string()));
            query.push(("lon", lon.to_string()));
        }
        if let Some(radius) = filter.max_distance_miles {
            query.push(("max_distance_mile", radius.to_string()));
        }

        let value = self.get_with_query("executors", &query).await?;
        let executors: Vec<ExecutorInfo> =
            Self::decode_list::<ApiExecutorResponse, ExecutorInfo>(value)?;
        info!("Fetched {} executors", executors.len());
        Ok(executors)
    }

    // ---- pods ----

    pub async fn get_pods(&self) -> Result<Vec<PodInfo>> {
        debug!("Fetching pods");
        let pods: Vec<PodInfo> =
            Self::decode_list::<ApiPodResponse, PodInfo>(self.get("pods").await?)?;
        info!("Fetched {} pods", pods.len());
        Ok(pods)
    }

    /// Raw pod record, including its full template
    pub async fn get_pod(&self, pod_id: &str) -> Result<Value> {
        self.get(&format!("pods/{}", pod_id)).await
    }

    pub async fn rent_pod(&self, executor_id: &str, request: &RentRequest) -> Result<Value> {
        debug!(
            "Renting executor {} as '{}' with template {} ({} ssh keys)",
            executor_id,
            request.pod_name,
            request.template_id,
            request.user_public_key.len()
        );
        let body = serde_json::to_value(request)?;
        let result = self
            .post(&format!("executors/{}/rent", executor_id), body)
            .await?;
        info!("Rented executor {} as '{}'", executor_id, request.pod_name);
        Ok(result)
    }

    pub async fn delete_pod(&self, pod_id: &str) -> Result<Value> {
        debug!("Deleting pod {}", pod_id);
        self.delete(&format!("pods/{}", pod_id)).await
    }

    pub async fn reboot_pod(&self, pod_id: &str, volume_id: Option<&str>) -> Result<Value> {
        let body = match volume_id {
            Some(volume_id) => json!({ "volume_id": volume_id }),
            None => json!({}),
        };
        self.post(&format!("pods/{}/reboot", pod_id), body).await
    }

    pub async fn switch_template(&self, pod_id: &str, template_id: &str) -> Result<Value> {
        self.put(
            &format!("pods/{}/switch-template", pod_id),
            json!({ "template_id": template_id }),
        )
        .await
    }

    /// `removal_at` is an ISO-8601 UTC timestamp
    pub async fn schedule_removal(&self, pod_id: &str, removal_at: &str) -> Result<Value> {
        self.post(
            &format!("pods/{}/schedule-removal", pod_id),
            json!({ "removal_scheduled_at": removal_at }),
        )
        .await
    }

    pub async fn cancel_scheduled_removal(&self, pod_id: &str) -> Result<Value> {
        self.delete(&format!("pods/{}/schedule-removal", pod_id))
            .await
    }

    pub async fn install_jupyter(&self, pod_id: &str, internal_port: u16) -> Result<Value> {
        self.post(
            &format!("pods/{}/install-jupyter", pod_id),
            json!({ "jupyter_internal_port": internal_port }),
        )
        .await
    }

    // ---- templates ----

    pub async fn get_templates_raw(&self) -> Result<Vec<Value>> {
        match self.get("templates").await? {
            Value::Array(items) => Ok(items),
            Value::Null => Ok(Vec::new()),
            other => Err(ApiError::Operation(format!(
                "Unexpected templates response: {}",
                other
            ))),
        }
    }

    pub async fn get_templates(&self) -> Result<Vec<Template>> {
        let raw = Value::Array(self.get_templates_raw().await?);
        Self::decode_list::<ApiTemplateResponse, Template>(raw)
    }

    /// `None` when the template does not exist
    pub async fn get_template(&self, template_id: &str) -> Result<Option<Template>> {
        match self.get(&format!("templates/{}", template_id)).await {
            Ok(value) => Ok(Some(Self::decode::<ApiTemplateResponse>(value)?.into())),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn create_template(&self, spec: &TemplateSpec) -> Result<Template> {
        debug!("Creating template {} ({})", spec.name, spec.docker_image);
        let value = self.post("templates", serde_json::to_value(spec)?).await?;
        Ok(Self::decode::<ApiTemplateResponse>(value)?.into())
    }

    pub async fn put_template(&self, template_id: &str, body: Value) -> Result<Value> {
        self.put(&format!("templates/{}", template_id), body).await
    }

    /// Default images for a GPU model and driver (`GET /executors/default-docker-image`)
    pub async fn get_default_images(
        &self,
        gpu_model: Option<&str>,
        driver_version: Option<&str>,
    ) -> Result<Vec<Value>> {
        let mut query = Vec::new();
        if let Some(model) = gpu_model {
            query.push(("gpu_model", model.to_string()));
        }
        if let Some(driver) = driver_version {
            query.push(("driver_version", driver.to_string()));
        }
        match self
            .get_with_query("executors/default-docker-image", &query)
            .await?
        {
            Value::Array(images) => Ok(images),
            Value::Object(image) => Ok(vec![Value::Object(image)]),
            _ => Ok(Vec::new()),
        }
    }

    // ---- account ----

    pub async fn get_users_me(&self) -> Result<Value> {
        debug!("Fetching user information");
        self.get("users/me").await
    }

    pub async fn get_my_user_id(&self) -> Result<String> {
        let user = self.get_users_me().await?;
        match user.get("id") {
            Some(Value::String(id)) => Ok(id.clone()),
            Some(Value::Number(n)) => Ok(n.to_string()),
            _ => Err(ApiError::Operation(
                "User id missing from /users/me".to_string(),
            )),
        }
    }

    pub async fn balance(&self) -> Result<f64> {
        let user = self.get_users_me().await?;
        Ok(match user.get("balance") {
            Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
            Some(Value::String(s)) => s.parse().unwrap_or(0.0),
            _ => 0.0,
        })
    }

    /// `true` if `/users/me` answers within `timeout`
    pub async fn test_connection(&self, timeout: Duration) -> Result<bool> {
        match tokio::time::timeout(timeout, self.get_users_me()).await {
            Ok(Ok(_)) => Ok(true),
            Ok(Err(e @ ApiError::Http(HttpError::AuthenticationFailed))) => Err(e),
            Ok(Err(e)) => {
                warn!("API connection test failed: {}", e);
                Ok(false)
            }
            Err(_) => Ok(false),
        }
    }

    // ---- payments ----

    pub async fn wallets(&self) -> Result<Vec<Value>> {
        let user = self.get_users_me().await?;
        let customer_id = user
            .get("stripe_customer_id")
            .and_then(Value::as_str)
            .ok_or_else(|| ApiError::Operation("No billing account on this user".to_string()))?;

        let endpoint = format!("wallet/available-wallets/{}", customer_id);
        match self
            .send(Service::Pay, Method::GET, &endpoint, &[], None)
            .await?
        {
            Value::Array(wallets) => Ok(wallets),
            _ => Ok(Vec::new()),
        }
    }

    pub async fn generate_access_key(&self) -> Result<String> {
        let value = self
            .send(Service::Pay, Method::GET, "token/generate", &[], None)
            .await?;
        value
            .get("access_key")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ApiError::Operation("access_key missing from response".to_string()))
    }

    /// Create a TAO transfer and return the checkout URL
    pub async fn create_transfer(&self, amount: f64) -> Result<String> {
        let value = self
            .post("tao/create-transfer", json!({ "amount": amount }))
            .await?;
        value
            .get("url")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ApiError::Operation("Transfer URL missing from response".to_string()))
    }

    pub async fn verify_wallet(&self, verification: &WalletVerification) -> Result<Value> {
        let body = serde_json::to_value(verification)?;
        self.send(Service::Pay, Method::POST, "token/verify", &[], Some(&body))
            .await
    }

    // ---- backups ----

    pub async fn create_backup_config(
        &self,
        pod_id: &str,
        backup_path: &str,
        frequency_hours: u32,
        retention_days: u32,
    ) -> Result<BackupConfig> {
        let value = self
            .post(
                "backup-configs",
                json!({
                    "pod_id": pod_id,
                    "backup_frequency_hours": frequency_hours,
                    "retention_days": retention_days,
                    "backup_path": backup_path,
                }),
            )
            .await?;
        Ok(Self::decode::<ApiBackupConfigResponse>(value)?.into())
    }

    pub async fn backup_now(&self, pod_id: &str, name: &str, description: &str) -> Result<Value> {
        self.post(
            &format!("pods/{}/backup", pod_id),
            json!({ "name": name, "description": description }),
        )
        .await
    }

    /// `None` when the executor has no backup configuration
    pub async fn get_backup_config(&self, executor_id: &str) -> Result<Option<BackupConfig>> {
        match self
            .get(&format!("backup-configs/pod/{}", executor_id))
            .await
        {
            Ok(Value::Null) => Ok(None),
            Ok(value) => Ok(Some(
                Self::decode::<ApiBackupConfigResponse>(value)?.into(),
            )),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn list_backup_configs(&self) -> Result<Vec<BackupConfig>> {
        Self::decode_list::<ApiBackupConfigResponse, BackupConfig>(
            self.get("backup-configs").await?,
        )
    }

    /// Empty when the executor has no logs
    pub async fn get_backup_logs(&self, executor_id: &str) -> Result<Vec<BackupLog>> {
        match self.get(&format!("backup-logs/pod/{}", executor_id)).await {
            Ok(value) => Self::decode_list::<ApiBackupLogResponse, BackupLog>(value),
            Err(e) if e.is_not_found() => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    pub async fn delete_backup_config(&self, config_id: &str) -> Result<Value> {
        self.delete(&format!("backup-configs/{}", config_id)).await
    }

    pub async fn restore_backup(
        &self,
        pod_id: &str,
        backup_id: &str,
        restore_path: &str,
    ) -> Result<Value> {
        self.post(
            &format!("pods/{}/restore", pod_id),
            json!({ "backup_id": backup_id, "restore_path": restore_path }),
        )
        .await
    }

    // ---- volumes ----

    pub async fn list_volumes(&self) -> Result<Vec<VolumeInfo>> {
        Self::decode_list::<ApiVolumeResponse, VolumeInfo>(self.get("volumes").await?)
    }

    pub async fn get_volume(&self, volume_id: &str) -> Result<VolumeInfo> {
        let value = self.get(&format!("volumes/{}", volume_id)).await?;
        Ok(Self::decode::<ApiVolumeResponse>(value)?.into())
    }

    pub async fn create_volume(&self, name: &str, description: &str) -> Result<VolumeInfo> {
        let value = self
            .post(
                "volumes",
                json!({ "name": name, "description": description }),
            )
            .await?;
        Ok(Self::decode::<ApiVolumeResponse>(value)?.into())
    }

    pub async fn update_volume(
        &self,
        volume_id: &str,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<VolumeInfo> {
        let mut body = serde_json::Map::new();
        if let Some(name) = name {
            body.insert("name".to_string(), json!(name));
        }
        if let Some(description) = description {
            body.insert("description".to_string(), json!(description));
        }
        if body.is_empty() {
            return Err(ApiError::InvalidInput(
                "At least one of name or description must be provided".to_string(),
            ));
        }

        let value = self
            .put(&format!("volumes/{}", volume_id), Value::Object(body))
            .await?;
        Ok(Self::decode::<ApiVolumeResponse>(value)?.into())
    }

    pub async fn delete_volume(&self, volume_id: &str) -> Result<Value> {
        self.delete(&format!("volumes/{}", volume_id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_key() {
        assert_eq!(mask_key("abcd1234efgh5678"), "abcd...5678");
        assert_eq!(mask_key("short"), "****");
    }

    #[test]
    fn test_template_spec_defaults() {
        let spec = TemplateSpec::new("my-app", "alice/my-app");
        let body = serde_json::to_value(&spec).unwrap();

        assert_eq!(body["internal_ports"], json!([22, 8000]));
        assert_eq!(body["category"], "UBUNTU");
        assert_eq!(body["is_private"], true);
        assert_eq!(body["volumes"], json!(["/workspace"]));
        assert_eq!(body["description"], "my-app");
        assert_eq!(body["readme"], "my-app");
        assert_eq!(body["docker_image_tag"], "latest");
        assert_eq!(body["container_start_immediately"], true);

        let public = spec.public(true).digest("sha256:1").ports(vec![22]);
        assert!(!public.is_private);
        assert_eq!(public.docker_image_digest, "sha256:1");
    }

    #[test]
    fn test_url_joining() {
        let client = LiumApiClient::new("k".into(), Some("http://host/api/".into()))
            .with_pay_url("http://pay/");
        assert_eq!(client.url_for(Service::Main, "/pods"), "http://host/api/pods");
        assert_eq!(
            client.url_for(Service::Pay, "token/generate"),
            "http://pay/token/generate"
        );
        assert!(client.key_for(Service::Pay).is_err());
    }
}
