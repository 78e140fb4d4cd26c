use super::{resolve_targets, sdk};
use crate::{
    config::Config,
    display::{print_error, print_success},
    CliError, Result,
};
use clap::Args;
use std::path::{Path, PathBuf};

/// Copy files between this machine and pods.
///
/// Uploads go to every targeted pod. Downloads from several pods land in
/// per-pod subdirectories named after the pod huid.
#[derive(Args, Debug)]
pub struct ScpArgs {
    /// Pods: index, range, "all", huid, name or id
    #[arg(value_name = "TARGETS")]
    pub targets: String,

    /// Local path (source for uploads, destination for downloads)
    #[arg(value_name = "LOCAL")]
    pub local: String,

    /// Remote path, defaults to /root/<basename of LOCAL>
    #[arg(value_name = "REMOTE")]
    pub remote: Option<String>,

    /// Copy from the pod to LOCAL
    #[arg(short, long)]
    pub download: bool,

    /// Copy directories recursively (implied for local directories on upload)
    #[arg(short, long)]
    pub recursive: bool,
}

pub async fn handle(args: ScpArgs, config: &Config) -> Result<()> {
    let local = PathBuf::from(&args.local);
    let remote = remote_path(&local, args.remote.as_deref())?;

    if !args.download && !local.exists() {
        return Err(CliError::NotFound(format!(
            "Local path {} does not exist",
            local.display()
        )));
    }

    let lium = sdk(config)?;
    let pods = resolve_targets(&lium, config, &args.targets).await?;
    let many = pods.len() > 1;

    let mut failures = 0;
    for pod in &pods {
        let result = if args.download {
            let dest = if many { local.join(&pod.huid) } else { local.clone() };
            if many {
                std::fs::create_dir_all(&dest)?;
            }
            lium.download(pod, &remote, &dest, args.recursive)
                .await
                .map(|_| format!("{}:{} → {}", pod.huid, remote, dest.display()))
        } else {
            lium.upload(pod, &local, &remote)
                .await
                .map(|_| format!("{} → {}:{}", local.display(), pod.huid, remote))
        };

        match result {
            Ok(message) => print_success(&message),
            Err(e) => {
                failures += 1;
                print_error(&format!("{}: {}", pod.huid, e));
            }
        }
    }

    if failures > 0 {
        return Err(CliError::OperationFailed(format!(
            "Copy failed on {} of {} pods",
            failures,
            pods.len()
        )));
    }
    Ok(())
}

/// Explicit remote path, else `/root/<basename>`
pub fn remote_path(local: &Path, remote: Option<&str>) -> Result<String> {
    if let Some(remote) = remote {
        return Ok(remote.to_string());
    }
    let name = local
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            CliError::InvalidInput(format!(
                "Cannot derive a remote path from {}; give REMOTE",
                local.display()
            ))
        })?;
    Ok(format!("/root/{}", name))
}
