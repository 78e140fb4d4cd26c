use super::{sdk, OutputFormat};
use crate::{
    config::Config,
    display::{display_pod_details, display_pods_table},
    resolvers::{resolve_listed_pods, visible_pods},
    storage::{last_selection, store_selection, SelectionKind},
    Result,
};
use clap::Args;

#[derive(Args, Debug, Default)]
pub struct PsArgs {
    /// Pods to show in detail: index, range, huid, name or id
    #[arg(value_name = "TARGETS")]
    pub targets: Option<String>,

    /// Include stopped and failed pods
    #[arg(short, long)]
    pub all: bool,

    /// table or json (detailed is the same as giving targets)
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

/// List pods, or show details for the targeted ones
pub async fn handle(args: PsArgs, config: &mut Config) -> Result<()> {
    let lium = sdk(config)?;
    let pods = lium.ps().await?;
    let now = chrono::Utc::now();

    if let Some(spec) = &args.targets {
        let listing = last_selection(config, SelectionKind::Pods)?;
        let selected = resolve_listed_pods(&pods, listing.as_deref(), spec)?;
        if args.format == OutputFormat::Json {
            println!("{}", serde_json::to_string_pretty(&selected)?);
        } else {
            for pod in &selected {
                display_pod_details(pod, now);
            }
        }
        return Ok(());
    }

    let pods = visible_pods(pods, args.all);
    store_selection(config, SelectionKind::Pods, &pods)?;

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&pods)?),
        OutputFormat::Detailed => {
            for pod in &pods {
                display_pod_details(pod, now);
            }
        }
        OutputFormat::Table => display_pods_table(&pods, now),
    }
    Ok(())
}
