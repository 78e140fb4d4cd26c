use super::{confirmed, resolve_target, sdk};
use crate::{
    config::Config,
    display::{
        display_backup_configs_table, display_backup_logs_table, print_info, print_success,
        print_warning,
    },
    resolvers::resolve_from_selection,
    storage::{last_selection, store_selection, SelectionKind},
    CliError, Result,
};
use chrono::Local;
use clap::Subcommand;
use lium_core::{BackupConfig, PodInfo};
use lium_utils::{format_frequency, format_retention, PodUtils};

#[derive(Subcommand, Debug)]
pub enum BackupCommands {
    /// Enable scheduled backups for a pod
    Up {
        /// Pod index, huid, name or id
        target: String,
        /// Directory to back up
        #[arg(long, default_value = "/root")]
        path: String,
        /// Hours between backups
        #[arg(long, default_value_t = 6)]
        frequency: u32,
        /// Days to keep backups
        #[arg(long, default_value_t = 7)]
        retention: u32,
    },
    /// List backup configurations
    Ls {
        /// Only configurations for this pod
        #[arg(long)]
        pod: Option<String>,
    },
    /// Back up a pod right away
    Now {
        target: String,
        /// Backup name (default manual-<timestamp>)
        #[arg(long)]
        name: Option<String>,
        #[arg(long, default_value = "Manual backup triggered from CLI")]
        description: String,
    },
    /// Show backup history of a pod
    Logs { target: String },
    /// Restore a backup onto a pod
    Restore {
        target: String,
        /// Backup id from 'lium backup logs'
        #[arg(long)]
        id: String,
        /// Directory to restore into
        #[arg(long, default_value = "/root")]
        path: String,
        #[arg(short, long)]
        yes: bool,
    },
    /// Delete a backup configuration
    Rm {
        /// Index from the last 'lium backup ls', huid or id
        config: String,
        #[arg(short, long)]
        yes: bool,
    },
}

pub async fn handle(action: BackupCommands, config: &mut Config) -> Result<()> {
    let lium = sdk(config)?;

    match action {
        BackupCommands::Up {
            target,
            path,
            frequency,
            retention,
        } => {
            validate_schedule(frequency, retention)?;
            let pod = resolve_target(&lium, config, &target).await?;
            let created = lium.backup_create(&pod, &path, frequency, retention).await?;
            print_success(&format!(
                "Backups enabled for {}: {} {}, kept {}",
                pod.huid,
                created.backup_path,
                format_frequency(created.backup_frequency_hours),
                format_retention(created.retention_days)
            ));
        }
        BackupCommands::Ls { pod } => {
            let pods = lium.ps().await?;
            let mut configs = lium.backup_list().await?;
            if let Some(target) = pod {
                let pod = resolve_target(&lium, config, &target).await?;
                let executor_id = PodUtils::executor_id(&pod)?;
                configs.retain(|c| c.pod_executor_id == executor_id);
            }

            store_selection(config, SelectionKind::BackupConfigs, &configs)?;
            display_backup_configs_table(
                &configs,
                |executor_id| pod_label(&pods, executor_id),
                chrono::Utc::now(),
            );
        }
        BackupCommands::Now {
            target,
            name,
            description,
        } => {
            let pod = resolve_target(&lium, config, &target).await?;
            let name = name.unwrap_or_else(default_backup_name);
            lium.backup_now(&pod, &name, &description).await?;
            print_success(&format!("Backup '{}' of {} started", name, pod.huid));
        }
        BackupCommands::Logs { target } => {
            let pod = resolve_target(&lium, config, &target).await?;
            if lium.backup_config(&pod).await?.is_none() {
                print_warning(&format!("{} has no backup configuration", pod.huid));
            }
            let logs = lium.backup_logs(&pod).await?;
            display_backup_logs_table(&logs, chrono::Utc::now());
        }
        BackupCommands::Restore {
            target,
            id,
            path,
            yes,
        } => {
            let pod = resolve_target(&lium, config, &target).await?;
            let prompt = format!(
                "Restore backup {} into {}:{}? Files there may be overwritten.",
                id, pod.huid, path
            );
            if !confirmed(yes, &prompt)? {
                print_info("Cancelled");
                return Ok(());
            }
            lium.restore(&pod, &id, &path).await?;
            print_success(&format!("Restore of {} started on {}", id, pod.huid));
        }
        BackupCommands::Rm { config: target, yes } => {
            let selection = last_selection(config, SelectionKind::BackupConfigs)?;
            let id = resolve_from_selection(
                selection.as_deref(),
                SelectionKind::BackupConfigs,
                &target,
            )?;
            let configs = lium.backup_list().await?;
            let found: Option<&BackupConfig> = configs.iter().find(|c| c.id == id);
            let label = found
                .map(|c| format!("{} ({})", c.huid, c.backup_path))
                .unwrap_or_else(|| id.clone());

            if !confirmed(yes, &format!("Delete backup configuration {}?", label))? {
                print_info("Cancelled");
                return Ok(());
            }
            lium.backup_delete(&id).await?;
            print_success(&format!("Deleted backup configuration {}", label));
        }
    }
    Ok(())
}

pub fn validate_schedule(frequency_hours: u32, retention_days: u32) -> Result<()> {
    if frequency_hours == 0 {
        return Err(CliError::InvalidInput(
            "Backup frequency must be at least 1 hour".to_string(),
        ));
    }
    if retention_days == 0 {
        return Err(CliError::InvalidInput(
            "Backup retention must be at least 1 day".to_string(),
        ));
    }
    Ok(())
}

fn default_backup_name() -> String {
    format!("manual-{}", Local::now().format("%Y%m%d-%H%M%S"))
}

/// Pod name and huid for the pod running on `executor_id`
fn pod_label(pods: &[PodInfo], executor_id: &str) -> Option<String> {
    pods.iter()
        .find(|p| p.executor.as_ref().is_some_and(|e| e.id == executor_id))
        .map(|p| format!("{} ({})", p.name, p.huid))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_schedule() {
        assert!(validate_schedule(6, 7).is_ok());
        assert!(validate_schedule(0, 7).is_err());
        assert!(validate_schedule(6, 0).is_err());
    }

    #[test]
    fn test_default_name_format() {
        let name = default_backup_name();
        assert!(name.starts_with("manual-"));
        assert_eq!(name.len(), "manual-20250101-120000".len());
    }
}
