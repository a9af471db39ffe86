//! In-memory set of active zones, each bound to exactly one folder

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Result, ZoneError};
use crate::persistence::LayoutRecord;
use crate::types::{Geometry, ViewMode, ZoneId};

#[derive(Debug, Clone, PartialEq)]
pub struct Zone {
    pub id: ZoneId,
    /// Title shown on the zone, normally the folder's basename
    pub name: String,
    pub folder: PathBuf,
    pub geometry: Geometry,
    pub view_mode: ViewMode,
    pub visible: bool,
}

impl Zone {
    /// Current state in layout-file form
    pub fn layout_record(&self) -> LayoutRecord {
        LayoutRecord::new(self.geometry, self.view_mode)
    }
}

/// Display name for a folder (its last path component)
pub fn folder_display_name(folder: &Path) -> String {
    folder
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| folder.to_string_lossy().into_owned())
}

/// Zones indexed by handle, with a path → handle index so duplicate checks are O(1)
#[derive(Debug, Default)]
pub struct ZoneRegistry {
    zones: HashMap<ZoneId, Zone>,
    by_path: HashMap<PathBuf, ZoneId>,
    /// Handles in creation order
    order: Vec<ZoneId>,
    next_id: u64,
}

impl ZoneRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    pub fn create_zone(
        &mut self,
        folder: PathBuf,
        name: String,
        geometry: Geometry,
        view_mode: ViewMode,
    ) -> Result<ZoneId> {
        if self.by_path.contains_key(&folder) {
            return Err(ZoneError::DuplicatePath(folder));
        }

        self.next_id += 1;
        let id = ZoneId(self.next_id);
        debug!(zone = %id, folder = %folder.display(), "Registering zone");

        self.by_path.insert(folder.clone(), id);
        self.order.push(id);
        self.zones.insert(
            id,
            Zone {
                id,
                name,
                folder,
                geometry,
                view_mode,
                visible: true,
            },
        );
        Ok(id)
    }

    pub fn remove_zone(&mut self, id: ZoneId) -> Option<Zone> {
        let zone = self.zones.remove(&id)?;
        self.by_path.remove(&zone.folder);
        self.order.retain(|other| *other != id);
        debug!(zone = %id, folder = %zone.folder.display(), "Unregistered zone");
        Some(zone)
    }

    pub fn find_by_path(&self, folder: &Path) -> Option<ZoneId> {
        self.by_path.get(folder).copied()
    }

    pub fn get(&self, id: ZoneId) -> Option<&Zone> {
        self.zones.get(&id)
    }

    pub fn get_mut(&mut self, id: ZoneId) -> Option<&mut Zone> {
        self.zones.get_mut(&id)
    }

    /// Point an existing zone at a new folder and title
    pub fn rebind(&mut self, id: ZoneId, folder: PathBuf, name: String) -> Result<()> {
        if let Some(owner) = self.find_by_path(&folder)
            && owner != id
        {
            return Err(ZoneError::DuplicatePath(folder));
        }

        let zone = self.zones.get_mut(&id).ok_or(ZoneError::UnknownZone(id))?;
        self.by_path.remove(&zone.folder);
        self.by_path.insert(folder.clone(), id);
        debug!(zone = %id, from = %zone.folder.display(), to = %folder.display(), "Rebinding zone");
        zone.folder = folder;
        zone.name = name;
        Ok(())
    }

    /// Handles in creation order
    pub fn all_zones(&self) -> Vec<ZoneId> {
        self.order.clone()
    }

    pub fn zones(&self) -> impl Iterator<Item = &Zone> {
        self.order.iter().filter_map(|id| self.zones.get(id))
    }

    pub fn folders(&self) -> impl Iterator<Item = &Path> {
        self.zones().map(|zone| zone.folder.as_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry() -> Geometry {
        Geometry::new(0, 0, 200, 350)
    }

    #[test]
    fn test_create_and_find() {
        let mut registry = ZoneRegistry::new();
        let id = registry
            .create_zone(PathBuf::from("/boox/A"), "A".into(), geometry(), ViewMode::List)
            .unwrap();

        assert_eq!(registry.find_by_path(Path::new("/boox/A")), Some(id));
        assert_eq!(registry.get(id).unwrap().name, "A");
        assert!(registry.get(id).unwrap().visible);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_duplicate_path_rejected() {
        let mut registry = ZoneRegistry::new();
        registry
            .create_zone(PathBuf::from("/boox/A"), "A".into(), geometry(), ViewMode::List)
            .unwrap();

        let err = registry
            .create_zone(PathBuf::from("/boox/A"), "other".into(), geometry(), ViewMode::Grid)
            .unwrap_err();
        assert!(matches!(err, ZoneError::DuplicatePath(path) if path == Path::new("/boox/A")));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_remove_frees_path() {
        let mut registry = ZoneRegistry::new();
        let id = registry
            .create_zone(PathBuf::from("/boox/A"), "A".into(), geometry(), ViewMode::List)
            .unwrap();

        let removed = registry.remove_zone(id).unwrap();
        assert_eq!(removed.folder, PathBuf::from("/boox/A"));
        assert!(registry.is_empty());
        assert_eq!(registry.find_by_path(Path::new("/boox/A")), None);
        assert!(registry.remove_zone(id).is_none());

        let again = registry
            .create_zone(PathBuf::from("/boox/A"), "A".into(), geometry(), ViewMode::List)
            .unwrap();
        assert_ne!(again, id);
    }

    #[test]
    fn test_rebind_updates_index() {
        let mut registry = ZoneRegistry::new();
        let id = registry
            .create_zone(PathBuf::from("/boox/C"), "C".into(), geometry(), ViewMode::Grid)
            .unwrap();

        registry.rebind(id, PathBuf::from("/boox/D"), "D".into()).unwrap();

        assert_eq!(registry.find_by_path(Path::new("/boox/C")), None);
        assert_eq!(registry.find_by_path(Path::new("/boox/D")), Some(id));
        let zone = registry.get(id).unwrap();
        assert_eq!(zone.name, "D");
        assert_eq!(zone.view_mode, ViewMode::Grid);
    }

    #[test]
    fn test_rebind_onto_other_zone_fails() {
        let mut registry = ZoneRegistry::new();
        let a = registry
            .create_zone(PathBuf::from("/boox/A"), "A".into(), geometry(), ViewMode::List)
            .unwrap();
        registry
            .create_zone(PathBuf::from("/boox/B"), "B".into(), geometry(), ViewMode::List)
            .unwrap();

        assert!(matches!(
            registry.rebind(a, PathBuf::from("/boox/B"), "B".into()),
            Err(ZoneError::DuplicatePath(_))
        ));
        assert_eq!(registry.get(a).unwrap().folder, PathBuf::from("/boox/A"));
    }

    #[test]
    fn test_all_zones_in_creation_order() {
        let mut registry = ZoneRegistry::new();
        let b = registry
            .create_zone(PathBuf::from("/boox/B"), "B".into(), geometry(), ViewMode::List)
            .unwrap();
        let a = registry
            .create_zone(PathBuf::from("/boox/A"), "A".into(), geometry(), ViewMode::List)
            .unwrap();

        assert_eq!(registry.all_zones(), vec![b, a]);
        let folders: Vec<_> = registry.folders().collect();
        assert_eq!(folders, vec![Path::new("/boox/B"), Path::new("/boox/A")]);
    }

    #[test]
    fn test_folder_display_name() {
        assert_eq!(folder_display_name(Path::new("/boox/Projects")), "Projects");
    }
}
