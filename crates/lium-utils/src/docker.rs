use crate::errors::{DockerError, Result, UtilsError};
use log::{debug, info};
use std::path::Path;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

const DOCKER_HUB_REGISTRIES: &[&str] = &["https://index.docker.io/v1/", "index.docker.io", "docker.io"];

fn docker_spawn_error(e: std::io::Error) -> UtilsError {
    UtilsError::Docker(DockerError::NotAvailable(format!(
        "Failed to run docker: {}",
        e
    )))
}

/// Check that the docker CLI is installed and the daemon answers.
pub async fn check_docker_available() -> Result<String> {
    let output = Command::new("docker")
        .arg("version")
        .arg("--format")
        .arg("{{.Server.Version}}")
        .output()
        .await
        .map_err(docker_spawn_error)?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(UtilsError::Docker(DockerError::NotAvailable(format!(
            "Docker not running: {}",
            stderr.trim()
        ))));
    }

    let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
    debug!("docker server version {}", version);
    Ok(version)
}

/// Log in to Docker Hub, feeding the token through stdin.
pub async fn login(username: &str, token: &str) -> Result<()> {
    let mut child = Command::new("docker")
        .arg("login")
        .arg("-u")
        .arg(username)
        .arg("--password-stdin")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(docker_spawn_error)?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(token.as_bytes()).await?;
    }

    let output = child.wait_with_output().await?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(UtilsError::Docker(DockerError::LoginFailed(
            stderr.trim().to_string(),
        )));
    }

    info!("Logged in to Docker Hub as {}", username);
    Ok(())
}

/// Pick the Docker Hub username out of a credential-helper `list` response.
pub fn username_from_credential_list(raw: &str) -> Option<String> {
    let creds: serde_json::Value = serde_json::from_str(raw).ok()?;
    DOCKER_HUB_REGISTRIES.iter().find_map(|registry| {
        creds
            .get(*registry)
            .and_then(|v| v.as_str())
            .filter(|u| !u.is_empty())
            .map(str::to_string)
    })
}

/// Docker Hub username from `~/.docker/config.json` and its credential helper.
pub async fn docker_username() -> Result<String> {
    let config_path = home::home_dir()
        .map(|h| h.join(".docker").join("config.json"))
        .ok_or_else(|| {
            DockerError::CredentialsNotFound("Could not determine home directory".to_string())
        })?;

    if !config_path.exists() {
        return Err(UtilsError::Docker(DockerError::CredentialsNotFound(
            "Docker not configured. Please run: docker login".to_string(),
        )));
    }

    let config: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&config_path)?)
        .map_err(|e| DockerError::CredentialsNotFound(format!("Invalid docker config: {}", e)))?;

    let creds_store = config
        .get("credsStore")
        .and_then(|v| v.as_str())
        .ok_or_else(|| {
            DockerError::CredentialsNotFound(
                "No credential store configured. Please run: docker login".to_string(),
            )
        })?;

    let output = Command::new(format!("docker-credential-{}", creds_store))
        .arg("list")
        .output()
        .await
        .map_err(|e| {
            DockerError::CredentialsNotFound(format!(
                "Failed to run docker-credential-{}: {}",
                creds_store, e
            ))
        })?;

    if output.status.success() {
        if let Some(username) = username_from_credential_list(&String::from_utf8_lossy(&output.stdout)) {
            debug!("Using Docker login for {}", username);
            return Ok(username);
        }
    }

    Err(UtilsError::Docker(DockerError::CredentialsNotFound(
        "Docker authentication failed. Please run: docker login".to_string(),
    )))
}

/// Extract `sha256:...` from the output of `docker push`.
pub fn parse_push_digest(output: &str) -> Option<String> {
    output.lines().find_map(|line| {
        line.split_once("digest: ")
            .and_then(|(_, rest)| rest.split_whitespace().next())
            .map(str::to_string)
    })
}

/// Build `image_tag` for linux/amd64 from `context` and push it.
/// Returns the pushed image digest.
pub async fn build_and_push(image_tag: &str, context: &Path) -> Result<String> {
    validate_image_name(image_tag)?;

    info!("Building {}", image_tag);
    let status = Command::new("docker")
        .arg("buildx")
        .arg("build")
        .arg("--platform")
        .arg("linux/amd64")
        .arg("--tag")
        .arg(image_tag)
        .arg("--load")
        .arg(context)
        .status()
        .await
        .map_err(docker_spawn_error)?;

    if !status.success() {
        return Err(UtilsError::Docker(DockerError::BuildFailed(format!(
            "docker buildx exited with {}",
            status.code().unwrap_or(-1)
        ))));
    }

    info!("Pushing {}", image_tag);
    let output = Command::new("docker")
        .arg("push")
        .arg(image_tag)
        .output()
        .await
        .map_err(docker_spawn_error)?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(UtilsError::Docker(DockerError::PushFailed(
            stderr.trim().to_string(),
        )));
    }

    parse_push_digest(&String::from_utf8_lossy(&output.stdout)).ok_or_else(|| {
        UtilsError::Docker(DockerError::PushFailed(
            "Could not extract image digest".to_string(),
        ))
    })
}

/// Validate a Docker Hub image reference of the form `user/name[:tag]`.
pub fn validate_image_name(image_name: &str) -> Result<()> {
    lium_core::utils::validate_docker_image(image_name)
        .map_err(|e| DockerError::InvalidImageName(e.to_string()))?;

    if !image_name.contains('/') {
        return Err(UtilsError::Docker(DockerError::InvalidImageName(
            "Image name should include username (e.g., username/image-name)".to_string(),
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_push_digest() {
        let output = "The push refers to repository [docker.io/me/app]\n\
                      5f70bf18a086: Pushed\n\
                      latest: digest: sha256:abc123 size: 1573\n";
        assert_eq!(parse_push_digest(output).as_deref(), Some("sha256:abc123"));
        assert_eq!(parse_push_digest("nothing here"), None);
    }

    #[test]
    fn test_username_from_credential_list() {
        let raw = r#"{"https://index.docker.io/v1/": "alice", "ghcr.io": "bob"}"#;
        assert_eq!(username_from_credential_list(raw).as_deref(), Some("alice"));
        assert_eq!(username_from_credential_list(r#"{"ghcr.io": "bob"}"#), None);
        assert_eq!(username_from_credential_list("not json"), None);
    }

    #[test]
    fn test_validate_image_name() {
        assert!(validate_image_name("alice/app:latest").is_ok());
        assert!(validate_image_name("app").is_err());
        assert!(validate_image_name("Alice/App").is_err());
    }
}
