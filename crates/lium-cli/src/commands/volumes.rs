use super::{confirmed, sdk};
use crate::{
    config::Config,
    display::{display_volumes_table, print_info, print_success},
    resolvers::resolve_from_selection,
    storage::{last_selection, store_selection, SelectionKind},
    Result,
};
use clap::Subcommand;

#[derive(Subcommand, Debug)]
pub enum VolumeCommands {
    /// List volumes (default)
    Ls,
    /// Create a volume
    New {
        name: String,
        #[arg(short, long, default_value = "")]
        description: String,
    },
    /// Rename or describe a volume
    Set {
        /// Index from the last listing, huid or id
        volume: String,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Delete a volume
    Rm {
        /// Index from the last listing, huid or id
        volume: String,
        #[arg(short, long)]
        yes: bool,
    },
}

pub async fn handle(action: Option<VolumeCommands>, config: &mut Config) -> Result<()> {
    let lium = sdk(config)?;

    match action.unwrap_or(VolumeCommands::Ls) {
        VolumeCommands::Ls => {
            let volumes = lium.volumes().await?;
            store_selection(config, SelectionKind::Volumes, &volumes)?;
            display_volumes_table(&volumes, chrono::Utc::now());
        }
        VolumeCommands::New { name, description } => {
            let volume = lium.volume_create(&name, &description).await?;
            print_success(&format!("Created volume {} ({})", volume.name, volume.huid));
        }
        VolumeCommands::Set {
            volume,
            name,
            description,
        } => {
            let id = resolve_volume(config, &volume)?;
            let updated = lium
                .volume_update(&id, name.as_deref(), description.as_deref())
                .await?;
            print_success(&format!("Updated volume {} ({})", updated.name, updated.huid));
        }
        VolumeCommands::Rm { volume, yes } => {
            let id = resolve_volume(config, &volume)?;
            let info = lium.volume(&id).await?;
            if !confirmed(yes, &format!("Delete volume {} ({})?", info.name, info.huid))? {
                print_info("Cancelled");
                return Ok(());
            }
            lium.volume_delete(&id).await?;
            print_success(&format!("Deleted volume {}", info.huid));
        }
    }
    Ok(())
}

fn resolve_volume(config: &Config, target: &str) -> Result<String> {
    let selection = last_selection(config, SelectionKind::Volumes)?;
    resolve_from_selection(selection.as_deref(), SelectionKind::Volumes, target)
}
