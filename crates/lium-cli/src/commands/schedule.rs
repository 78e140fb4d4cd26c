use super::{resolve_targets, sdk};
use crate::{
    config::Config,
    display::{display_pods_table, print_error, print_success, print_warning},
    CliError, Result,
};
use chrono::Local;
use clap::Subcommand;
use lium_core::{termination_time, PodInfo};

#[derive(Subcommand, Debug)]
pub enum ScheduleCommands {
    /// Schedule removal of pods
    Set {
        /// Pods: index, range, "all", huid, name or id
        targets: String,
        /// After a duration, e.g. 45m, 6h, 2d
        #[arg(long = "in", value_name = "DURATION", conflicts_with = "at")]
        in_: Option<String>,
        /// At a local time, e.g. "tomorrow 01:00" or "2025-10-20 15:30"
        #[arg(long, value_name = "TIME")]
        at: Option<String>,
    },
    /// Cancel scheduled removal
    Cancel { targets: String },
    /// Pods with a scheduled removal
    Ls,
}

pub async fn handle(action: ScheduleCommands, config: &Config) -> Result<()> {
    let lium = sdk(config)?;

    match action {
        ScheduleCommands::Set { targets, in_, at } => {
            let when = termination_time(in_.as_deref(), at.as_deref(), &Local::now())?
                .ok_or_else(|| CliError::InvalidInput("Give --in or --at".to_string()))?;
            let local = when.with_timezone(&Local).format("%Y-%m-%d %H:%M %Z");

            for pod in resolve_targets(&lium, config, &targets).await? {
                lium.schedule_termination(&pod, when).await?;
                print_success(&format!("{} will be removed at {}", pod.huid, local));
            }
        }
        ScheduleCommands::Cancel { targets } => {
            let mut failures = 0;
            for pod in resolve_targets(&lium, config, &targets).await? {
                if pod.removal_scheduled_at.is_none() {
                    print_warning(&format!("{} has no scheduled removal", pod.huid));
                    continue;
                }
                match lium.cancel_scheduled_termination(&pod).await {
                    Ok(_) => print_success(&format!("Cancelled removal of {}", pod.huid)),
                    Err(e) => {
                        failures += 1;
                        print_error(&format!("{}: {}", pod.huid, e));
                    }
                }
            }
            if failures > 0 {
                return Err(CliError::OperationFailed(format!(
                    "Could not cancel {} schedule(s)",
                    failures
                )));
            }
        }
        ScheduleCommands::Ls => {
            let scheduled = scheduled_pods(lium.ps().await?);
            if scheduled.is_empty() {
                print_warning("No pods are scheduled for removal");
            } else {
                display_pods_table(&scheduled, chrono::Utc::now());
            }
        }
    }
    Ok(())
}

/// Pods with a removal time, soonest first
pub fn scheduled_pods(pods: Vec<PodInfo>) -> Vec<PodInfo> {
    let mut scheduled: Vec<PodInfo> = pods
        .into_iter()
        .filter(|p| p.removal_scheduled_at.is_some())
        .collect();
    scheduled.sort_by_key(|p| p.removal_scheduled_at);
    scheduled
}
