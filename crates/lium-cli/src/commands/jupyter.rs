use super::{resolve_target, sdk};
use crate::{
    config::Config,
    display::{print_info, print_success},
    CliError, Result,
};
use clap::Args;

#[derive(Args, Debug)]
pub struct JupyterArgs {
    /// Pod index, huid, name or id
    pub target: String,

    /// Internal port Jupyter listens on
    #[arg(long, default_value_t = 8888)]
    pub port: u16,
}

pub async fn handle(args: JupyterArgs, config: &Config) -> Result<()> {
    let lium = sdk(config)?;
    let pod = resolve_target(&lium, config, &args.target).await?;

    if let Some(url) = &pod.jupyter_url {
        print_info(&format!("Jupyter already available at {}", url));
        return Ok(());
    }
    if !pod.ports.contains_key(&args.port.to_string()) {
        return Err(CliError::InvalidInput(format!(
            "Port {} is not mapped on {}. Mapped ports: {}",
            args.port,
            pod.huid,
            mapped_ports(&pod.ports)
        )));
    }

    lium.install_jupyter(&pod, args.port).await?;
    print_success(&format!(
        "Installing Jupyter on {}. Run 'lium ps {}' for the URL.",
        pod.huid, pod.huid
    ));
    Ok(())
}

fn mapped_ports(ports: &std::collections::HashMap<String, i64>) -> String {
    let mut keys: Vec<&str> = ports.keys().map(String::as_str).collect();
    keys.sort();
    if keys.is_empty() {
        "none".to_string()
    } else {
        keys.join(", ")
    }
}
