use super::{resolve_target, sdk};
use crate::{config::Config, display::print_success, CliError, Result};
use clap::Args;
use lium_core::utils::{parse_env_vars, parse_ports, validate_docker_image};
use serde_json::{Map, Value};

#[derive(Args, Debug, Default)]
pub struct EditArgs {
    /// Pod index, huid, name or id
    pub target: String,

    /// New Docker image
    #[arg(long)]
    pub image: Option<String>,

    /// New image tag
    #[arg(long)]
    pub tag: Option<String>,

    /// Command run when the container starts
    #[arg(long)]
    pub start_command: Option<String>,

    /// Environment variable, KEY=VALUE (repeatable)
    #[arg(short, long, value_name = "KEY=VALUE")]
    pub env: Vec<String>,

    /// Internal ports, e.g. 22,8000
    #[arg(long)]
    pub ports: Option<String>,
}

/// Merge the given fields into the pod's template
pub async fn handle(args: EditArgs, config: &Config) -> Result<()> {
    let fields = template_fields(&args)?;

    let lium = sdk(config)?;
    let pod = resolve_target(&lium, config, &args.target).await?;
    let changed: Vec<String> = fields.keys().cloned().collect();
    lium.edit(&pod.id, fields).await?;

    print_success(&format!(
        "Updated {} of {}. Reboot the pod to apply.",
        changed.join(", "),
        pod.huid
    ));
    Ok(())
}

/// Template fields set by the flags; at least one is required
pub fn template_fields(args: &EditArgs) -> Result<Map<String, Value>> {
    let mut fields = Map::new();

    if let Some(image) = &args.image {
        validate_docker_image(image)?;
        fields.insert("docker_image".into(), image.clone().into());
    }
    if let Some(tag) = &args.tag {
        fields.insert("docker_image_tag".into(), tag.clone().into());
    }
    if let Some(command) = &args.start_command {
        fields.insert("startup_commands".into(), command.clone().into());
    }
    if !args.env.is_empty() {
        let env = parse_env_vars(&args.env)?;
        fields.insert("environment".into(), serde_json::to_value(env)?);
    }
    if let Some(ports) = &args.ports {
        fields.insert("internal_ports".into(), serde_json::to_value(parse_ports(ports)?)?);
    }

    if fields.is_empty() {
        return Err(CliError::InvalidInput(
            "Nothing to change. Use --image, --tag, --start-command, --env or --ports".to_string(),
        ));
    }
    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_template_fields() {
        let args = EditArgs {
            target: "1".into(),
            image: Some("pytorch/pytorch".into()),
            tag: Some("2.3.0".into()),
            env: vec!["HF_TOKEN=abc=def".into()],
            ports: Some("22,8000".into()),
            ..Default::default()
        };
        let fields = template_fields(&args).unwrap();
        assert_eq!(fields["docker_image"], json!("pytorch/pytorch"));
        assert_eq!(fields["docker_image_tag"], json!("2.3.0"));
        assert_eq!(fields["environment"], json!({"HF_TOKEN": "abc=def"}));
        assert_eq!(fields["internal_ports"], json!([22, 8000]));
        assert!(!fields.contains_key("startup_commands"));
    }

    #[test]
    fn test_nothing_to_change() {
        let args = EditArgs {
            target: "1".into(),
            ..Default::default()
        };
        assert!(template_fields(&args).is_err());
    }
}
