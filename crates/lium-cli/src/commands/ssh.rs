use super::{resolve_target, sdk};
use crate::{config::Config, CliError, Result};
use clap::Args;
use log::debug;

#[derive(Args, Debug)]
pub struct SshArgs {
    /// Pod index, huid, name or id
    pub target: String,

    /// Print the ssh command instead of connecting
    #[arg(long)]
    pub print: bool,
}

/// Open an interactive SSH session on one pod
pub async fn handle(args: SshArgs, config: &Config) -> Result<()> {
    let lium = sdk(config)?;
    let pod = resolve_target(&lium, config, &args.target).await?;

    if args.print {
        println!("{}", lium.ssh(&pod)?);
        return Ok(());
    }

    let code = lium.shell(&pod).await?;
    debug!("ssh session to {} exited with {}", pod.huid, code);
    // 255 is ssh's own failure code; anything else came from the remote shell
    if code == 255 {
        return Err(CliError::OperationFailed(format!(
            "SSH connection to {} failed",
            pod.huid
        )));
    }
    Ok(())
}
