use crate::{
    config::{expand_path, Config},
    display::{print_info, print_success, print_warning, prompt_confirm, prompt_input, prompt_secret},
    CliError, Result,
};
use lium_api::{mask_key, LiumApiClient};
use log::debug;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default key files, most preferred first
const KEY_CANDIDATES: &[&str] = &["id_ed25519.pub", "id_rsa.pub", "id_ecdsa.pub"];

const CONNECTION_TIMEOUT: Duration = Duration::from_secs(10);

/// Interactive setup wizard.
///
/// Asks for the API key (masked), picks an SSH public key (offering the
/// first of `~/.ssh/id_ed25519.pub`, `id_rsa.pub`, `id_ecdsa.pub` that
/// exists), asks for the SSH user, saves, then checks the key against
/// `/users/me`. A failed check only warns.
pub async fn handle(config: &mut Config) -> Result<()> {
    println!("Lium setup\n");

    let api_key = match config.api_key() {
        Some(existing)
            if prompt_confirm(
                &format!("API key {} already configured. Keep it?", mask_key(&existing)),
                true,
            )? =>
        {
            existing
        }
        _ => read_api_key()?,
    };
    config.set("api.api_key", &api_key)?;

    let detected = home::home_dir().and_then(|home| detect_public_key(&home.join(".ssh")));
    let default_key = config
        .public_key_path()
        .filter(|p| p.exists())
        .or(detected)
        .map(|p| p.display().to_string());
    if default_key.is_none() {
        print_warning("No SSH public key found in ~/.ssh. Create one with: ssh-keygen -t ed25519");
    }

    let key_path = prompt_input("SSH public key path", default_key.as_deref())?;
    if !expand_path(&key_path).exists() {
        print_warning(&format!("{} does not exist yet", key_path));
    }
    config.set("ssh.key_path", &key_path)?;

    let user = prompt_input("SSH user", Some(&config.ssh_user()))?;
    config.set("ssh.user", &user)?;

    config.save()?;
    print_success(&format!(
        "Configuration saved to {}",
        config.config_path.display()
    ));

    print_info("Testing API connection...");
    let client = LiumApiClient::from_config(config)?;
    match client.test_connection(CONNECTION_TIMEOUT).await {
        Ok(true) => print_success("API connection successful"),
        Ok(false) => print_warning("API did not answer. Check api.base_url or your network."),
        Err(e) => {
            debug!("connection test failed: {}", e);
            print_warning(&format!("API connection failed: {}", e));
        }
    }

    println!("\nRun 'lium ls' to see available executors.");
    Ok(())
}

fn read_api_key() -> Result<String> {
    println!("Get your API key from https://lium.io/api-keys");
    let key = prompt_secret("API key")?;
    let key = key.trim();
    if key.is_empty() {
        return Err(CliError::InvalidInput("API key cannot be empty".to_string()));
    }
    Ok(key.to_string())
}

/// First existing default public key in `ssh_dir`
pub fn detect_public_key(ssh_dir: &Path) -> Option<PathBuf> {
    KEY_CANDIDATES
        .iter()
        .map(|name| ssh_dir.join(name))
        .find(|path| path.is_file())
}
