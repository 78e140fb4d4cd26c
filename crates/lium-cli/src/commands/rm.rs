use super::{confirmed, pod_list, sdk};
use crate::{
    config::Config,
    display::{print_error, print_info, print_success, print_warning},
    resolvers::resolve_listed_pods,
    storage::{last_selection, SelectionKind},
    CliError, Result,
};
use chrono::Local;
use clap::Args;
use lium_core::termination_time;

/// Arguments for `lium rm` (alias `down`).
///
/// With `--in`/`--at` the pods are scheduled for removal rather than
/// removed immediately.
#[derive(Args, Debug, Default)]
pub struct RmArgs {
    /// Pods: index, range, "all", huid, name or id
    #[arg(value_name = "TARGETS", required_unless_present = "all")]
    pub targets: Option<String>,

    /// Remove every pod
    #[arg(short, long)]
    pub all: bool,

    /// Skip confirmation
    #[arg(short, long)]
    pub yes: bool,

    /// Schedule removal after a duration, e.g. 45m, 6h, 2d
    #[arg(long = "in", value_name = "DURATION", conflicts_with = "at")]
    pub in_: Option<String>,

    /// Schedule removal at a local time, e.g. "today 23:00"
    #[arg(long, value_name = "TIME")]
    pub at: Option<String>,
}

pub async fn handle(args: RmArgs, config: &Config) -> Result<()> {
    let removal_at = termination_time(args.in_.as_deref(), args.at.as_deref(), &Local::now())?;

    let lium = sdk(config)?;
    let pods = lium.ps().await?;
    if pods.is_empty() {
        print_warning("No active pods");
        return Ok(());
    }

    let selected = match args.targets.as_deref() {
        Some(spec) if !args.all => {
            let listing = last_selection(config, SelectionKind::Pods)?;
            resolve_listed_pods(&pods, listing.as_deref(), spec)?
        }
        _ => pods,
    };

    if let Some(at) = removal_at {
        let when = at.with_timezone(&Local).format("%Y-%m-%d %H:%M %Z");
        for pod in &selected {
            lium.schedule_termination(pod, at).await?;
            print_success(&format!("{} will be removed at {}", pod.huid, when));
        }
        return Ok(());
    }

    let prompt = format!("Remove {} pod(s): {}?", selected.len(), pod_list(&selected));
    if !confirmed(args.yes, &prompt)? {
        print_info("Cancelled");
        return Ok(());
    }

    let mut failures = 0;
    for pod in &selected {
        match lium.rm(pod).await {
            Ok(_) => print_success(&format!("Removed {}", pod.huid)),
            Err(e) => {
                failures += 1;
                print_error(&format!("{}: {}", pod.huid, e));
            }
        }
    }

    if failures > 0 {
        return Err(CliError::OperationFailed(format!(
            "Failed to remove {} of {} pods",
            failures,
            selected.len()
        )));
    }
    Ok(())
}
