use super::{confirmed, resolve_target, sdk};
use crate::{
    config::Config,
    display::{print_info, print_success},
    CliError, Result,
};
use clap::Args;

#[derive(Args, Debug)]
pub struct SwitchArgs {
    /// Pod index, huid, name or id
    pub target: String,

    /// Template id to switch to
    pub template: String,

    /// Skip confirmation
    #[arg(short, long)]
    pub yes: bool,
}

/// Redeploy a pod with another template. The container is recreated.
pub async fn handle(args: SwitchArgs, config: &Config) -> Result<()> {
    let lium = sdk(config)?;
    let pod = resolve_target(&lium, config, &args.target).await?;

    let template = lium
        .get_template(&args.template)
        .await?
        .ok_or_else(|| CliError::NotFound(format!("Template '{}' not found", args.template)))?;

    let prompt = format!(
        "Switch {} to {} ({})? The container will be recreated.",
        pod.huid,
        template.name,
        template.image_ref()
    );
    if !confirmed(args.yes, &prompt)? {
        print_info("Cancelled");
        return Ok(());
    }

    let updated = lium.switch_template(&pod, &template.id).await?;
    print_success(&format!(
        "{} switched to {} (status {})",
        updated.huid, template.name, updated.status
    ));
    Ok(())
}
