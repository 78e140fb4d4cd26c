use super::{resolve_targets, sdk};
use crate::{
    config::Config,
    display::{print_error, print_info, print_success},
    CliError, Result,
};
use clap::Args;
use lium_utils::RsyncOptions;

#[derive(Args, Debug)]
pub struct RsyncArgs {
    /// Pods: index, range, "all", huid, name or id
    #[arg(value_name = "TARGETS")]
    pub targets: String,

    /// Local path
    pub local: String,

    /// Remote path
    pub remote: String,

    /// Sync from the pod to LOCAL
    #[arg(short, long)]
    pub download: bool,

    /// Delete files missing on the sending side
    #[arg(long)]
    pub delete: bool,

    /// Show what would be transferred
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Exclude pattern (repeatable)
    #[arg(short, long, value_name = "PATTERN")]
    pub exclude: Vec<String>,
}

impl RsyncArgs {
    pub fn options(&self) -> RsyncOptions {
        RsyncOptions {
            download: self.download,
            delete: self.delete,
            dry_run: self.dry_run,
            excludes: self.exclude.clone(),
        }
    }
}

pub async fn handle(args: RsyncArgs, config: &Config) -> Result<()> {
    let lium = sdk(config)?;
    let pods = resolve_targets(&lium, config, &args.targets).await?;
    let options = args.options();
    if args.dry_run {
        print_info("Dry run, nothing will be changed");
    }

    let mut failures = 0;
    for pod in &pods {
        match lium.rsync(pod, &args.local, &args.remote, &options).await {
            Ok(()) => print_success(&format!("Synced {}", pod.huid)),
            Err(e) => {
                failures += 1;
                print_error(&format!("{}: {}", pod.huid, e));
            }
        }
    }

    if failures > 0 {
        return Err(CliError::OperationFailed(format!(
            "rsync failed on {} of {} pods",
            failures,
            pods.len()
        )));
    }
    Ok(())
}
