use crate::config::Config;
use crate::{CliError, Result};
use lium_core::{BackupConfig, ExecutorInfo, PodInfo, VolumeInfo};
use serde::{Deserialize, Serialize};

/// Listings remembered between invocations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionKind {
    Executors,
    Pods,
    Volumes,
    BackupConfigs,
}

impl SelectionKind {
    fn section(self) -> &'static str {
        match self {
            SelectionKind::Executors => "last_selection",
            SelectionKind::Pods => "last_pod_selection",
            SelectionKind::Volumes => "last_volume_selection",
            SelectionKind::BackupConfigs => "last_backup_selection",
        }
    }

    /// Command that produces this listing
    pub fn source_command(self) -> &'static str {
        match self {
            SelectionKind::Executors => "lium ls",
            SelectionKind::Pods => "lium ps",
            SelectionKind::Volumes => "lium volumes",
            SelectionKind::BackupConfigs => "lium backup ls",
        }
    }
}

/// One remembered row
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SelectionEntry {
    pub id: String,
    pub huid: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredSelection {
    timestamp: String,
    items: Vec<SelectionEntry>,
}

/// Types that can be listed and referenced later by index
pub trait Selectable {
    fn selection_entry(&self) -> SelectionEntry;
}

impl Selectable for ExecutorInfo {
    fn selection_entry(&self) -> SelectionEntry {
        SelectionEntry {
            id: self.id.clone(),
            huid: self.huid.clone(),
            name: self.machine_name.clone(),
        }
    }
}

impl Selectable for PodInfo {
    fn selection_entry(&self) -> SelectionEntry {
        SelectionEntry {
            id: self.id.clone(),
            huid: self.huid.clone(),
            name: self.name.clone(),
        }
    }
}

impl Selectable for VolumeInfo {
    fn selection_entry(&self) -> SelectionEntry {
        SelectionEntry {
            id: self.id.clone(),
            huid: self.huid.clone(),
            name: self.name.clone(),
        }
    }
}

impl Selectable for BackupConfig {
    fn selection_entry(&self) -> SelectionEntry {
        SelectionEntry {
            id: self.id.clone(),
            huid: self.huid.clone(),
            name: self.backup_path.clone(),
        }
    }
}

/// Remember `items` in order for later index-based reference
pub fn store_selection<T: Selectable>(
    config: &mut Config,
    kind: SelectionKind,
    items: &[T],
) -> Result<()> {
    let stored = StoredSelection {
        timestamp: chrono::Utc::now().to_rfc3339(),
        items: items.iter().map(Selectable::selection_entry).collect(),
    };
    config.set_value(kind.section(), "data", &serde_json::to_string(&stored)?);
    config.save()
}

pub fn last_selection(config: &Config, kind: SelectionKind) -> Result<Option<Vec<SelectionEntry>>> {
    match config.get_value(kind.section(), "data") {
        Some(raw) => {
            let stored: StoredSelection = serde_json::from_str(&raw).map_err(|e| {
                CliError::InvalidInput(format!("Invalid selection data: {}", e))
            })?;
            Ok(Some(stored.items))
        }
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lium_core::ApiVolumeResponse;

    #[test]
    fn test_store_and_load_selection() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::load_from(dir.path()).unwrap();

        let volumes: Vec<VolumeInfo> = ["vol-a", "vol-b"]
            .iter()
            .map(|id| {
                VolumeInfo::from(ApiVolumeResponse {
                    id: id.to_string(),
                    name: Some(format!("{}-name", id)),
                    ..Default::default()
                })
            })
            .collect();

        store_selection(&mut config, SelectionKind::Volumes, &volumes).unwrap();

        let reloaded = Config::load_from(dir.path()).unwrap();
        let items = last_selection(&reloaded, SelectionKind::Volumes)
            .unwrap()
            .unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].id, "vol-b");
        assert_eq!(items[1].name, "vol-b-name");
        assert!(last_selection(&reloaded, SelectionKind::Pods)
            .unwrap()
            .is_none());
    }
}
