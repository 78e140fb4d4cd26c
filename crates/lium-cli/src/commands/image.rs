use super::sdk;
use crate::{
    config::Config,
    display::{print_info, print_success, print_warning},
    CliError, Result,
};
use clap::Args;
use lium_api::TemplateSpec;
use lium_core::utils::parse_ports;
use lium_utils::docker;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Arguments for `lium image`.
///
/// # Examples
/// ```bash
/// lium image my-app .
/// lium image my-model ./models --ports 22,8080 --start-command "/start.sh"
/// ```
#[derive(Args, Debug)]
pub struct ImageArgs {
    /// Image name; pushed as <docker user>/<name>:latest
    pub name: String,

    /// Directory containing the Dockerfile
    pub path: PathBuf,

    /// Internal ports exposed by the template
    #[arg(long, default_value = "22,8000")]
    pub ports: String,

    /// Container start command
    #[arg(long, default_value = "")]
    pub start_command: String,

    /// Seconds to wait for template verification
    #[arg(long, default_value_t = 600)]
    pub timeout: u64,
}

/// Build the image for linux/amd64, push it to Docker Hub, upsert a public
/// template for it and wait until the platform has verified it.
pub async fn handle(args: ImageArgs, config: &Config) -> Result<()> {
    check_dockerfile(&args.path)?;
    let ports = parse_ports(&args.ports)?;
    if ports.is_empty() {
        return Err(CliError::InvalidInput("At least one port is required".to_string()));
    }

    docker::check_docker_available().await?;
    let username = match config.docker_credentials() {
        Some((username, token)) => {
            docker::login(&username, &token).await?;
            username
        }
        None => docker::docker_username().await?,
    };
    print_info(&format!("Using Docker Hub account {}", username));

    let repository = format!("{}/{}", username, args.name);
    let image_tag = format!("{}:latest", repository);
    print_info(&format!("Building and pushing {}...", image_tag));
    let digest = docker::build_and_push(&image_tag, &args.path).await?;
    print_success(&format!("Pushed {}", digest));

    let spec = TemplateSpec::new(args.name.clone(), repository)
        .tag("latest")
        .digest(digest)
        .ports(ports)
        .start_command(args.start_command.clone())
        .public(true);

    let lium = sdk(config)?;
    let template = lium.upsert_template(&spec).await?;
    print_info(&format!("Waiting for verification of template {}...", template.id));

    match lium
        .wait_template_ready(&template.id, Duration::from_secs(args.timeout))
        .await?
    {
        Some(verified) => {
            print_success(&format!("Template {} verified", verified.id));
            println!("Use: lium up --template {}", verified.id);
        }
        None => {
            print_warning(&format!(
                "Template not verified after {}s. Check later with 'lium templates --mine'.",
                args.timeout
            ));
            println!("Template ID: {}", template.id);
        }
    }
    Ok(())
}

fn check_dockerfile(path: &Path) -> Result<()> {
    if path.join("Dockerfile").is_file() {
        Ok(())
    } else {
        Err(CliError::NotFound(format!(
            "Dockerfile not found in {}",
            path.display()
        )))
    }
}
