use crate::storage::{SelectionEntry, SelectionKind};
use crate::{CliError, Result};
use lium_api::Lium;
use lium_core::utils::{looks_like_index_spec, parse_targets};
use lium_core::PodInfo;

/// Statuses `lium ps` hides unless `--all` is given
const FINISHED_STATUSES: &[&str] = &["STOPPED", "DELETED", "TERMINATED", "FAILED"];

/// Pods as `lium ps` shows them
pub fn visible_pods(pods: Vec<PodInfo>, all: bool) -> Vec<PodInfo> {
    if all {
        return pods;
    }
    pods.into_iter()
        .filter(|p| !FINISHED_STATUSES.contains(&p.status.to_uppercase().as_str()))
        .collect()
}

/// Resolves pod targets against the live pod list
pub struct PodTargetResolver<'a> {
    lium: &'a Lium,
    listing: Option<Vec<SelectionEntry>>,
}

impl<'a> PodTargetResolver<'a> {
    pub fn new(lium: &'a Lium) -> Self {
        Self {
            lium,
            listing: None,
        }
    }

    /// Rows of the last `lium ps`, used for index targets
    pub fn with_listing(mut self, listing: Option<Vec<SelectionEntry>>) -> Self {
        self.listing = listing;
        self
    }

    /// Fetch pods and resolve `spec`
    pub async fn resolve(&self, spec: &str) -> Result<Vec<PodInfo>> {
        let pods = self.lium.ps().await?;
        resolve_listed_pods(&pods, self.listing.as_deref(), spec)
    }

    /// Resolve exactly one pod
    pub async fn resolve_one(&self, target: &str) -> Result<PodInfo> {
        let mut pods = self.resolve(target).await?;
        match pods.len() {
            1 => Ok(pods.remove(0)),
            n => Err(CliError::InvalidInput(format!(
                "'{}' matches {} pods; give a single pod",
                target, n
            ))),
        }
    }
}

/// Resolve targets the way the user saw them numbered.
///
/// Indices, ranges and `all` refer to rows of the last `lium ps` listing,
/// or of the default `lium ps` view when nothing was stored. Huids, names
/// and ids match any live pod.
pub fn resolve_listed_pods(
    pods: &[PodInfo],
    listing: Option<&[SelectionEntry]>,
    spec: &str,
) -> Result<Vec<PodInfo>> {
    if !looks_like_index_spec(spec.trim()) {
        return resolve_pods(pods, spec);
    }

    let Some(entries) = listing else {
        return resolve_pods(&visible_pods(pods.to_vec(), false), spec);
    };
    if entries.is_empty() {
        return Err(CliError::NotFound(
            "The last 'lium ps' listing was empty".to_string(),
        ));
    }

    parse_targets(spec.trim(), entries.len())?
        .into_iter()
        .map(|i| {
            let entry = &entries[i];
            pods.iter().find(|p| p.id == entry.id).cloned().ok_or_else(|| {
                CliError::NotFound(format!(
                    "Pod {} (row {} of the last 'lium ps') no longer exists",
                    entry.huid,
                    i + 1
                ))
            })
        })
        .collect()
}

/// Resolve "1,3", "2-4", "all", or comma-separated huids/names/ids.
///
/// Indices are 1-based positions in `pods`.
pub fn resolve_pods(pods: &[PodInfo], spec: &str) -> Result<Vec<PodInfo>> {
    let spec = spec.trim();
    if spec.is_empty() {
        return Err(CliError::InvalidInput("No pod targets specified".to_string()));
    }
    if pods.is_empty() {
        return Err(CliError::NotFound("No active pods".to_string()));
    }

    if looks_like_index_spec(spec) {
        let indices = parse_targets(spec, pods.len())?;
        return Ok(indices.into_iter().map(|i| pods[i].clone()).collect());
    }

    let mut resolved: Vec<PodInfo> = Vec::new();
    for target in spec.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let pod = pods
            .iter()
            .find(|p| p.huid == target || p.name == target || p.id == target)
            .ok_or_else(|| CliError::NotFound(format!("Pod not found: {}", target)))?;
        if !resolved.iter().any(|p| p.id == pod.id) {
            resolved.push(pod.clone());
        }
    }
    Ok(resolved)
}

/// Map an index, huid, name or id to an id using a stored listing.
///
/// Non-index targets missing from the listing are returned unchanged so
/// the API can decide.
pub fn resolve_from_selection(
    selection: Option<&[SelectionEntry]>,
    kind: SelectionKind,
    target: &str,
) -> Result<String> {
    let target = target.trim();

    if let Ok(index) = target.parse::<usize>() {
        let items = selection.ok_or_else(|| {
            CliError::InvalidInput(format!(
                "No previous listing found. Run '{}' first.",
                kind.source_command()
            ))
        })?;
        if index == 0 || index > items.len() {
            return Err(CliError::InvalidInput(format!(
                "Invalid index: {}. Valid range: 1-{}",
                index,
                items.len()
            )));
        }
        return Ok(items[index - 1].id.clone());
    }

    Ok(selection
        .and_then(|items| {
            items
                .iter()
                .find(|e| e.huid == target || e.id == target || (!e.name.is_empty() && e.name == target))
        })
        .map(|e| e.id.clone())
        .unwrap_or_else(|| target.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lium_core::ApiPodResponse;
    use serde_json::json;

    fn pod(id: &str, status: &str) -> PodInfo {
        let raw: ApiPodResponse = serde_json::from_value(json!({
            "id": format!("pod-{}", id),
            "pod_name": format!("name-{}", id),
            "status": status
        }))
        .unwrap();
        PodInfo::from(raw)
    }

    fn pods() -> Vec<PodInfo> {
        ["a", "b", "c", "d"].iter().map(|id| pod(id, "RUNNING")).collect()
    }

    fn entry(pod: &PodInfo) -> SelectionEntry {
        SelectionEntry {
            id: pod.id.clone(),
            huid: pod.huid.clone(),
            name: pod.name.clone(),
        }
    }

    fn ids(pods: &[PodInfo]) -> Vec<&str> {
        pods.iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn test_resolve_indices_and_ranges() {
        let pods = pods();
        assert_eq!(ids(&resolve_pods(&pods, "1").unwrap()), vec!["pod-a"]);
        assert_eq!(
            ids(&resolve_pods(&pods, "2-3,1").unwrap()),
            vec!["pod-b", "pod-c", "pod-a"]
        );
        assert_eq!(resolve_pods(&pods, "all").unwrap().len(), 4);
        assert!(resolve_pods(&pods, "5").is_err());
        assert!(resolve_pods(&pods, "0").is_err());
    }

    #[test]
    fn test_resolve_names_huids_ids() {
        let pods = pods();
        let huid = pods[2].huid.clone();
        let spec = format!("name-a,{},pod-d,name-a", huid);
        assert_eq!(
            ids(&resolve_pods(&pods, &spec).unwrap()),
            vec!["pod-a", "pod-c", "pod-d"]
        );
        assert!(resolve_pods(&pods, "missing").is_err());
        assert!(resolve_pods(&[], "1").is_err());
    }

    #[test]
    fn test_finished_pods_hidden_by_default() {
        let pods = vec![pod("a", "RUNNING"), pod("b", "stopped"), pod("c", "PENDING")];
        let shown = visible_pods(pods.clone(), false);
        assert_eq!(ids(&shown), vec!["pod-a", "pod-c"]);
        assert_eq!(visible_pods(pods, true).len(), 3);
    }

    #[test]
    fn test_index_skips_hidden_pods_without_listing() {
        let pods = vec![pod("old", "STOPPED"), pod("live", "RUNNING")];

        assert_eq!(ids(&resolve_listed_pods(&pods, None, "1").unwrap()), vec!["pod-live"]);
        assert_eq!(ids(&resolve_listed_pods(&pods, None, "all").unwrap()), vec!["pod-live"]);
        assert!(resolve_listed_pods(&pods, None, "2").is_err());
        // Names still reach hidden pods
        assert_eq!(ids(&resolve_listed_pods(&pods, None, "name-old").unwrap()), vec!["pod-old"]);
    }

    #[test]
    fn test_index_follows_last_listing() {
        let pods = vec![pod("old", "STOPPED"), pod("live", "RUNNING"), pod("new", "RUNNING")];

        // `lium ps --all` showed every pod
        let all: Vec<SelectionEntry> = pods.iter().map(entry).collect();
        assert_eq!(ids(&resolve_listed_pods(&pods, Some(all.as_slice()), "1").unwrap()), vec!["pod-old"]);

        // `lium ps` showed only the running ones, newest first
        let shown = vec![entry(&pods[2]), entry(&pods[1])];
        assert_eq!(
            ids(&resolve_listed_pods(&pods, Some(shown.as_slice()), "1-2").unwrap()),
            vec!["pod-new", "pod-live"]
        );

        let gone = vec![entry(&pod("gone", "RUNNING"))];
        let err = resolve_listed_pods(&pods, Some(gone.as_slice()), "1").unwrap_err();
        assert!(err.to_string().contains("no longer exists"));
        assert!(resolve_listed_pods(&pods, Some(&[][..]), "1").is_err());
    }

    #[test]
    fn test_resolve_from_selection() {
        let entries = vec![
            SelectionEntry {
                id: "exec-1".into(),
                huid: "brave-cat-1234".into(),
                name: "NVIDIA H100".into(),
            },
            SelectionEntry {
                id: "exec-2".into(),
                huid: "smart-dog-5678".into(),
                name: String::new(),
            },
        ];
        let kind = SelectionKind::Executors;

        assert_eq!(resolve_from_selection(Some(entries.as_slice()), kind, "2").unwrap(), "exec-2");
        assert_eq!(
            resolve_from_selection(Some(entries.as_slice()), kind, "brave-cat-1234").unwrap(),
            "exec-1"
        );
        assert_eq!(resolve_from_selection(Some(entries.as_slice()), kind, "raw-id").unwrap(), "raw-id");
        assert!(resolve_from_selection(Some(entries.as_slice()), kind, "3").is_err());

        let err = resolve_from_selection(None, kind, "1").unwrap_err();
        assert!(err.to_string().contains("lium ls"));
    }
}
