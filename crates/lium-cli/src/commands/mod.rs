pub mod backup;
pub mod config;
pub mod edit;
pub mod exec;
pub mod fund;
pub mod image;
pub mod init;
pub mod jupyter;
pub mod ls;
pub mod ps;
pub mod reboot;
pub mod rm;
pub mod rsync;
pub mod run;
pub mod schedule;
pub mod scp;
pub mod ssh;
pub mod switch;
pub mod templates;
pub mod theme;
pub mod up;
pub mod volumes;

use crate::config::Config;
use crate::display::prompt_confirm;
use crate::resolvers::PodTargetResolver;
use crate::storage::{last_selection, SelectionKind};
use crate::Result;
use clap::ValueEnum;
use lium_api::Lium;
use lium_core::PodInfo;

/// How listings are rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Detailed,
    Json,
}

/// SDK facade built from the user's configuration
pub fn sdk(config: &Config) -> Result<Lium> {
    Lium::from_config(config)
}

fn pod_resolver<'a>(lium: &'a Lium, config: &Config) -> Result<PodTargetResolver<'a>> {
    Ok(PodTargetResolver::new(lium).with_listing(last_selection(config, SelectionKind::Pods)?))
}

/// Resolve a pod target spec against the live pod list
pub async fn resolve_targets(lium: &Lium, config: &Config, spec: &str) -> Result<Vec<PodInfo>> {
    pod_resolver(lium, config)?.resolve(spec).await
}

pub async fn resolve_target(lium: &Lium, config: &Config, target: &str) -> Result<PodInfo> {
    pod_resolver(lium, config)?.resolve_one(target).await
}

/// Ask unless `--yes` was given
pub fn confirmed(yes: bool, message: &str) -> Result<bool> {
    if yes {
        return Ok(true);
    }
    prompt_confirm(message, false)
}

/// "brave-cat-1234, smart-dog-5678"
pub fn pod_list(pods: &[PodInfo]) -> String {
    pods.iter()
        .map(|p| p.huid.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
