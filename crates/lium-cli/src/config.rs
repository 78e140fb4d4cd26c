use crate::{CliError, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Dotted keys accepted by `lium config get/set/unset`
pub const KNOWN_KEYS: &[&str] = &[
    "api.api_key",
    "api.base_url",
    "api.pay_url",
    "api.pay_api_key",
    "ssh.key_path",
    "ssh.user",
    "template.default_id",
    "docker.username",
    "docker.token",
    "ui.theme",
];

const SECRET_KEYS: &[&str] = &["api_key", "pay_api_key", "token"];

/// Configuration-specific errors that can occur during config operations
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(String),

    #[error("Invalid config format: {0}")]
    InvalidFormat(String),

    #[error("{0}")]
    MissingField(String),

    #[error("Unknown config key '{0}'. Known keys: {keys}", keys = KNOWN_KEYS.join(", "))]
    UnknownKey(String),

    #[error("Config directory creation failed: {0}")]
    DirectoryCreationFailed(String),

    #[error("TOML parsing error: {0}")]
    TomlError(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ApiSection {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub pay_url: Option<String>,
    pub pay_api_key: Option<String>,
}

/// `key_path` points at the public key; the private key sits next to it.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct SshSection {
    pub key_path: Option<String>,
    pub user: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct TemplateSection {
    pub default_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct DockerSection {
    pub username: Option<String>,
    pub token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct UiSection {
    pub theme: Option<String>,
}

/// Everything stored in `config.toml`
///
/// # Fields
/// * `api` - API key and endpoints
/// * `ssh` - SSH key and user
/// * `template` - Default template for new pods
/// * `docker` - Registry credentials used by `lium image`
/// * `ui` - Display preferences
/// * `selections` - Last listings, used to resolve numeric indices
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ConfigData {
    pub api: Option<ApiSection>,
    pub ssh: Option<SshSection>,
    pub template: Option<TemplateSection>,
    pub docker: Option<DockerSection>,
    pub ui: Option<UiSection>,
    pub selections: Option<HashMap<String, HashMap<String, String>>>,
}

/// Configuration manager for Lium that handles loading, saving, and accessing configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub config_path: PathBuf,
    pub data: ConfigData,
}

impl lium_api::ApiConfig for Config {
    type Error = CliError;

    fn get_api_key(&self) -> std::result::Result<String, Self::Error> {
        self.api_key().ok_or_else(|| {
            CliError::Config(ConfigError::MissingField(
                "No API key configured. Run 'lium init' or set LIUM_API_KEY".to_string(),
            ))
        })
    }

    fn get_base_url(&self) -> std::result::Result<Option<String>, Self::Error> {
        Ok(self.data.api.as_ref().and_then(|api| api.base_url.clone()))
    }

    fn get_pay_url(&self) -> Option<String> {
        self.data.api.as_ref().and_then(|api| api.pay_url.clone())
    }

    fn get_pay_api_key(&self) -> Option<String> {
        std::env::var("LIUM_PAY_API_KEY")
            .ok()
            .filter(|k| !k.is_empty())
            .or_else(|| self.data.api.as_ref().and_then(|api| api.pay_api_key.clone()))
    }

    fn ssh_private_key_path(&self) -> Option<PathBuf> {
        self.private_key_path()
    }

    fn ssh_public_keys(&self) -> Vec<String> {
        match self.public_keys() {
            Ok(keys) => keys,
            Err(e) => {
                debug!("No SSH public keys available: {}", e);
                Vec::new()
            }
        }
    }

    fn ssh_user(&self) -> String {
        self.ssh_user()
    }
}

impl Config {
    /// Load from `$LIUM_CONFIG_DIR` or `~/.lium`
    pub fn load() -> Result<Self> {
        Self::load_from(&config_dir()?)
    }

    /// Load `config.toml` from `dir`, migrating a legacy `config.json` once.
    pub fn load_from(dir: &Path) -> Result<Self> {
        let config_path = dir.join("config.toml");

        if !dir.exists() {
            fs::create_dir_all(dir)
                .map_err(|e| ConfigError::DirectoryCreationFailed(e.to_string()))?;
        }

        let json_path = dir.join("config.json");
        if !config_path.exists() && json_path.exists() {
            migrate_from_json(&json_path, &config_path)?;
        }

        let data = if config_path.exists() {
            let content = fs::read_to_string(&config_path)?;
            toml::from_str(&content).map_err(|e| ConfigError::TomlError(e.to_string()))?
        } else {
            ConfigData::default()
        };

        Ok(Config { config_path, data })
    }

    /// Write to a temporary file, then rename it over the config.
    pub fn save(&self) -> Result<()> {
        let content = toml::to_string_pretty(&self.data)
            .map_err(|e| ConfigError::TomlError(e.to_string()))?;

        if let Some(parent) = self.config_path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)
                    .map_err(|e| ConfigError::DirectoryCreationFailed(e.to_string()))?;
            }
        }

        let temp_path = self.config_path.with_extension("toml.tmp");
        fs::write(&temp_path, &content)?;
        fs::rename(&temp_path, &self.config_path)?;
        Ok(())
    }

    /// `LIUM_API_KEY` first, then `api.api_key`
    pub fn api_key(&self) -> Option<String> {
        std::env::var("LIUM_API_KEY")
            .ok()
            .filter(|k| !k.is_empty())
            .or_else(|| self.data.api.as_ref().and_then(|api| api.api_key.clone()))
    }

    pub fn ssh_user(&self) -> String {
        self.data
            .ssh
            .as_ref()
            .and_then(|ssh| ssh.user.clone())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| "root".to_string())
    }

    pub fn public_key_path(&self) -> Option<PathBuf> {
        self.data
            .ssh
            .as_ref()
            .and_then(|ssh| ssh.key_path.as_deref())
            .map(expand_path)
    }

    /// Public key path with `.pub` stripped
    pub fn private_key_path(&self) -> Option<PathBuf> {
        let public = self.public_key_path()?;
        Some(if public.extension().is_some_and(|ext| ext == "pub") {
            public.with_extension("")
        } else {
            public
        })
    }

    /// Keys listed in the configured public key file
    pub fn public_keys(&self) -> Result<Vec<String>> {
        let path = self.public_key_path().ok_or_else(|| {
            ConfigError::MissingField(
                "No SSH key configured. Run 'lium init' or set ssh.key_path".to_string(),
            )
        })?;
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()).into());
        }

        let keys: Vec<String> = fs::read_to_string(&path)?
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_string)
            .collect();

        if keys.is_empty() {
            return Err(ConfigError::InvalidFormat(format!(
                "No SSH keys found in {}",
                path.display()
            ))
            .into());
        }
        Ok(keys)
    }

    pub fn default_template_id(&self) -> Option<String> {
        self.data
            .template
            .as_ref()
            .and_then(|t| t.default_id.clone())
    }

    pub fn docker_credentials(&self) -> Option<(String, String)> {
        let docker = self.data.docker.as_ref()?;
        match (&docker.username, &docker.token) {
            (Some(u), Some(t)) => Some((u.clone(), t.clone())),
            _ => None,
        }
    }

    pub fn theme(&self) -> String {
        self.data
            .ui
            .as_ref()
            .and_then(|ui| ui.theme.clone())
            .unwrap_or_else(|| "default".to_string())
    }

    /// Read a dotted key such as `ssh.user`
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let (section, field) = split_key(key)?;
        let table = self.as_table()?;
        Ok(table
            .get(section)
            .and_then(|s| s.get(field))
            .and_then(|v| v.as_str())
            .map(str::to_string))
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let (section, field) = split_key(key)?;
        let mut table = self.as_table()?;

        let entry = table
            .entry(section.to_string())
            .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
        match entry {
            toml::Value::Table(fields) => {
                fields.insert(field.to_string(), toml::Value::String(value.to_string()));
            }
            _ => {
                return Err(ConfigError::InvalidFormat(format!("[{}] is not a table", section)).into())
            }
        }

        self.data = toml::Value::Table(table)
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::TomlError(e.to_string()))?;
        Ok(())
    }

    /// Remove a key; returns whether it was set
    pub fn unset(&mut self, key: &str) -> Result<bool> {
        let (section, field) = split_key(key)?;
        let mut table = self.as_table()?;

        let removed = match table.get_mut(section) {
            Some(toml::Value::Table(fields)) => fields.remove(field).is_some(),
            _ => false,
        };
        if removed {
            self.data = toml::Value::Table(table)
                .try_into()
                .map_err(|e: toml::de::Error| ConfigError::TomlError(e.to_string()))?;
        }
        Ok(removed)
    }

    /// Drop every setting, stored selections included
    pub fn reset(&mut self) {
        self.data = ConfigData::default();
    }

    /// TOML rendering with secrets masked and selections left out
    pub fn show(&self) -> String {
        let mut data = self.data.clone();
        data.selections = None;
        if let Some(api) = data.api.as_mut() {
            api.api_key = api.api_key.as_deref().map(lium_api::mask_key);
            api.pay_api_key = api.pay_api_key.as_deref().map(lium_api::mask_key);
        }
        if let Some(docker) = data.docker.as_mut() {
            docker.token = docker.token.as_deref().map(lium_api::mask_key);
        }
        toml::to_string_pretty(&data).unwrap_or_else(|e| format!("# unable to render: {}", e))
    }

    /// Store a raw value under `[selections.<section>]`
    pub fn set_value(&mut self, section: &str, key: &str, value: &str) {
        self.data
            .selections
            .get_or_insert_with(HashMap::new)
            .entry(section.to_string())
            .or_default()
            .insert(key.to_string(), value.to_string());
    }

    pub fn get_value(&self, section: &str, key: &str) -> Option<String> {
        self.data
            .selections
            .as_ref()
            .and_then(|sections| sections.get(section))
            .and_then(|keys| keys.get(key))
            .cloned()
    }

    fn as_table(&self) -> Result<toml::map::Map<String, toml::Value>> {
        match toml::Value::try_from(&self.data) {
            Ok(toml::Value::Table(table)) => Ok(table),
            Ok(_) => Ok(toml::map::Map::new()),
            Err(e) => Err(ConfigError::TomlError(e.to_string()).into()),
        }
    }
}

/// Whether a dotted key holds a secret that should be masked on output
pub fn is_secret_key(key: &str) -> bool {
    key.rsplit('.')
        .next()
        .is_some_and(|field| SECRET_KEYS.contains(&field))
}

fn split_key(key: &str) -> Result<(&str, &str)> {
    if !KNOWN_KEYS.contains(&key) {
        return Err(ConfigError::UnknownKey(key.to_string()).into());
    }
    key.split_once('.')
        .ok_or_else(|| ConfigError::UnknownKey(key.to_string()).into())
}

/// `$LIUM_CONFIG_DIR`, else `~/.lium`
pub fn config_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("LIUM_CONFIG_DIR") {
        if !dir.is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    let home_dir = home::home_dir().ok_or_else(|| {
        ConfigError::DirectoryCreationFailed("Could not find home directory".to_string())
    })?;
    Ok(home_dir.join(".lium"))
}

/// Expand a leading `~` to the home directory
pub fn expand_path(path: &str) -> PathBuf {
    match (path.strip_prefix('~'), home::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest.trim_start_matches('/')),
        _ => PathBuf::from(path),
    }
}

/// Convert the legacy JSON config to TOML and keep the old file as `config.json.backup`.
fn migrate_from_json(json_path: &Path, toml_path: &Path) -> Result<()> {
    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(json_path)?)?;
    let text = |v: &serde_json::Value, key: &str| {
        v.get(key).and_then(|s| s.as_str()).map(str::to_string)
    };

    let mut data = ConfigData::default();

    // Older files kept the key at the top level
    let api_key = json
        .get("api")
        .and_then(|api| text(api, "api_key"))
        .or_else(|| text(&json, "api_key"));
    if api_key.is_some() {
        data.api = Some(ApiSection {
            api_key,
            ..ApiSection::default()
        });
    }

    if let Some(ssh) = json.get("ssh") {
        let section = SshSection {
            key_path: text(ssh, "key_path").or_else(|| text(ssh, "public_key_path")),
            user: text(ssh, "user"),
        };
        if section != SshSection::default() {
            data.ssh = Some(section);
        }
    }

    if let Some(default_id) = json.get("template").and_then(|t| text(t, "default_id")) {
        data.template = Some(TemplateSection {
            default_id: Some(default_id),
        });
    }

    if let Some(docker) = json.get("docker") {
        let section = DockerSection {
            username: text(docker, "username"),
            token: text(docker, "token"),
        };
        if section != DockerSection::default() {
            data.docker = Some(section);
        }
    }

    let content =
        toml::to_string_pretty(&data).map_err(|e| ConfigError::TomlError(e.to_string()))?;
    fs::write(toml_path, content)?;
    fs::rename(json_path, json_path.with_extension("json.backup"))?;
    warn!(
        "Migrated {} to {}",
        json_path.display(),
        toml_path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lium_api::ApiConfig;
    use serial_test::serial;
    use tempfile::TempDir;

    fn temp_config() -> (TempDir, Config) {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(dir.path()).unwrap();
        (dir, config)
    }

    #[test]
    fn test_set_get_unset_roundtrip_through_disk() {
        let (dir, mut config) = temp_config();
        config.set("ssh.user", "ubuntu").unwrap();
        config.set("api.base_url", "http://localhost:8080").unwrap();
        config.save().unwrap();

        let mut reloaded = Config::load_from(dir.path()).unwrap();
        assert_eq!(reloaded.get("ssh.user").unwrap().as_deref(), Some("ubuntu"));
        assert_eq!(reloaded.ssh_user(), "ubuntu");
        assert!(reloaded.unset("ssh.user").unwrap());
        assert!(!reloaded.unset("ssh.user").unwrap());
        assert_eq!(reloaded.ssh_user(), "root");
        assert!(!dir.path().join("config.toml.tmp").exists());
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let (_dir, mut config) = temp_config();
        assert!(config.set("api.nope", "x").is_err());
        assert!(config.get("selections.pods").is_err());
        assert!(config.set("theme", "mono").is_err());
    }

    #[test]
    fn test_private_key_path_strips_pub() {
        let (_dir, mut config) = temp_config();
        config.set("ssh.key_path", "/keys/id_ed25519.pub").unwrap();
        assert_eq!(
            config.private_key_path(),
            Some(PathBuf::from("/keys/id_ed25519"))
        );

        config.set("ssh.key_path", "/keys/id_rsa").unwrap();
        assert_eq!(config.private_key_path(), Some(PathBuf::from("/keys/id_rsa")));
    }

    #[test]
    fn test_public_keys_skip_comments() {
        let (dir, mut config) = temp_config();
        let key = dir.path().join("id_ed25519.pub");
        fs::write(&key, "# laptop\nssh-ed25519 AAAA me@host\n\n").unwrap();
        config
            .set("ssh.key_path", key.to_str().unwrap())
            .unwrap();

        assert_eq!(config.public_keys().unwrap(), vec!["ssh-ed25519 AAAA me@host"]);
        assert_eq!(config.ssh_public_keys().len(), 1);
    }

    #[test]
    fn test_show_masks_secrets() {
        let (_dir, mut config) = temp_config();
        config.set("api.api_key", "abcd1234efgh5678").unwrap();
        config.set_value("pods", "data", "[]");

        let shown = config.show();
        assert!(shown.contains("abcd...5678"));
        assert!(!shown.contains("abcd1234efgh5678"));
        assert!(!shown.contains("selections"));
    }

    #[test]
    fn test_migrates_legacy_json() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("config.json"),
            r#"{"api_key": "legacy-key", "ssh": {"public_key_path": "~/.ssh/id_rsa.pub", "user": "admin"}}"#,
        )
        .unwrap();

        let config = Config::load_from(dir.path()).unwrap();
        let api = config.data.api.as_ref().unwrap();
        assert_eq!(api.api_key.as_deref(), Some("legacy-key"));
        assert_eq!(config.ssh_user(), "admin");
        assert!(dir.path().join("config.toml").exists());
        assert!(dir.path().join("config.json.backup").exists());
        assert!(!dir.path().join("config.json").exists());
    }

    #[test]
    #[serial]
    fn test_env_api_key_takes_precedence() {
        let (_dir, mut config) = temp_config();
        config.set("api.api_key", "from-file").unwrap();

        std::env::set_var("LIUM_API_KEY", "from-env");
        assert_eq!(config.api_key().as_deref(), Some("from-env"));
        std::env::remove_var("LIUM_API_KEY");
        assert_eq!(config.get_api_key().unwrap(), "from-file");
    }

    #[test]
    #[serial]
    fn test_missing_api_key_error() {
        std::env::remove_var("LIUM_API_KEY");
        let (_dir, config) = temp_config();
        let err = config.get_api_key().unwrap_err();
        assert!(err.to_string().contains("lium init"));
    }

    #[test]
    fn test_secret_keys() {
        assert!(is_secret_key("api.api_key"));
        assert!(is_secret_key("docker.token"));
        assert!(!is_secret_key("ssh.user"));
    }
}
