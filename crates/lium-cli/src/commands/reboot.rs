use super::{confirmed, pod_list, resolve_targets, sdk};
use crate::{
    config::Config,
    display::{print_error, print_info, print_success},
    CliError, Result,
};
use clap::Args;

#[derive(Args, Debug)]
pub struct RebootArgs {
    /// Pods: index, range, "all", huid, name or id
    #[arg(value_name = "TARGETS")]
    pub targets: String,

    /// Volume id to attach after the reboot
    #[arg(long)]
    pub volume: Option<String>,

    /// Skip confirmation
    #[arg(short, long)]
    pub yes: bool,
}

pub async fn handle(args: RebootArgs, config: &Config) -> Result<()> {
    let lium = sdk(config)?;
    let pods = resolve_targets(&lium, config, &args.targets).await?;

    if !confirmed(args.yes, &format!("Reboot {}?", pod_list(&pods)))? {
        print_info("Cancelled");
        return Ok(());
    }

    let mut failures = 0;
    for pod in &pods {
        match lium.reboot(pod, args.volume.as_deref()).await {
            Ok(_) => print_success(&format!("Rebooting {}", pod.huid)),
            Err(e) => {
                failures += 1;
                print_error(&format!("{}: {}", pod.huid, e));
            }
        }
    }

    if failures > 0 {
        return Err(CliError::OperationFailed(format!(
            "Reboot failed on {} of {} pods",
            failures,
            pods.len()
        )));
    }
    Ok(())
}
