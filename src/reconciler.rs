//! Diffing the root directory's subfolders against the registered zones
//!
//! Every trigger re-lists the root in full; there is no incremental tracking.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Result, ZoneError};
use crate::registry::ZoneRegistry;
use crate::types::ZoneId;

/// What one reconciliation pass has to do
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ReconcilePlan {
    /// Folders without a zone, in name order
    pub to_create: Vec<PathBuf>,
    /// Zones whose folder is gone from disk
    pub to_remove: Vec<ZoneId>,
}

impl ReconcilePlan {
    pub fn is_empty(&self) -> bool {
        self.to_create.is_empty() && self.to_remove.is_empty()
    }
}

/// Immediate, non-hidden subdirectories of `root`, sorted by name
pub fn list_subfolders(root: &Path) -> Result<Vec<PathBuf>> {
    let unavailable = |source| ZoneError::RootUnavailable {
        path: root.to_path_buf(),
        source,
    };

    let mut folders = Vec::new();
    for entry in fs::read_dir(root).map_err(unavailable)? {
        let entry = entry.map_err(unavailable)?;
        let name = entry.file_name();
        if name.to_string_lossy().starts_with('.') {
            continue;
        }
        // follows symlinks, so a link to a directory counts as a folder
        if entry.path().is_dir() {
            folders.push(root.join(name));
        }
    }
    folders.sort();
    Ok(folders)
}

/// Compute the plan from a folder listing (None when the root could not be listed)
pub fn plan(folders: Option<&[PathBuf]>, registry: &ZoneRegistry) -> ReconcilePlan {
    let to_create: Vec<PathBuf> = folders
        .unwrap_or_default()
        .iter()
        .filter(|folder| registry.find_by_path(folder).is_none())
        .cloned()
        .collect();

    let to_remove: Vec<ZoneId> = registry
        .zones()
        .filter(|zone| !zone.folder.is_dir())
        .map(|zone| zone.id)
        .collect();

    debug!(create = to_create.len(), remove = to_remove.len(), "Reconcile plan");
    ReconcilePlan { to_create, to_remove }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Geometry, ViewMode};
    use tempfile::TempDir;

    fn register(registry: &mut ZoneRegistry, folder: PathBuf) -> ZoneId {
        let name = folder.file_name().unwrap().to_string_lossy().into_owned();
        registry
            .create_zone(folder, name, Geometry::default(), ViewMode::List)
            .unwrap()
    }

    #[test]
    fn test_list_subfolders_skips_files_and_hidden() {
        let root = TempDir::new().unwrap();
        fs::create_dir(root.path().join("B")).unwrap();
        fs::create_dir(root.path().join("A")).unwrap();
        fs::create_dir(root.path().join(".cache")).unwrap();
        fs::write(root.path().join("notes.txt"), "hi").unwrap();
        fs::write(root.path().join(".layout.json"), "{}").unwrap();

        let folders = list_subfolders(root.path()).unwrap();
        assert_eq!(folders, vec![root.path().join("A"), root.path().join("B")]);
    }

    #[test]
    fn test_list_missing_root_is_root_unavailable() {
        let root = TempDir::new().unwrap();
        let missing = root.path().join("gone");
        assert!(matches!(list_subfolders(&missing), Err(ZoneError::RootUnavailable { .. })));
    }

    #[test]
    fn test_plan_creates_missing_and_removes_vanished() {
        let root = TempDir::new().unwrap();
        fs::create_dir(root.path().join("A")).unwrap();
        fs::create_dir(root.path().join("B")).unwrap();

        let mut registry = ZoneRegistry::new();
        register(&mut registry, root.path().join("A"));
        let stale = register(&mut registry, root.path().join("Z"));

        let folders = list_subfolders(root.path()).unwrap();
        let plan = plan(Some(&folders), &registry);

        assert_eq!(plan.to_create, vec![root.path().join("B")]);
        assert_eq!(plan.to_remove, vec![stale]);
    }

    #[test]
    fn test_plan_without_listing_removes_everything_missing() {
        let root = TempDir::new().unwrap();
        let mut registry = ZoneRegistry::new();
        let gone = register(&mut registry, root.path().join("gone"));

        let plan = plan(None, &registry);
        assert!(plan.to_create.is_empty());
        assert_eq!(plan.to_remove, vec![gone]);
    }

    #[test]
    fn test_plan_empty_when_in_sync() {
        let root = TempDir::new().unwrap();
        fs::create_dir(root.path().join("A")).unwrap();
        let mut registry = ZoneRegistry::new();
        register(&mut registry, root.path().join("A"));

        let folders = list_subfolders(root.path()).unwrap();
        assert!(plan(Some(&folders), &registry).is_empty());
    }
}
