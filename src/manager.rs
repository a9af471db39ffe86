//! Zone manager: keeps the on-screen zones in step with the folders on disk
//!
//! Owns the registry, the layout store and the UI surface. All calls run on the
//! control thread, one at a time, so layout read-modify-write cycles never interleave.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::constants;
use crate::error::{Result, ZoneError};
use crate::fileops::{self, MoveReport};
use crate::persistence::LayoutStore;
use crate::reconciler;
use crate::registry::{folder_display_name, Zone, ZoneRegistry};
use crate::rename;
use crate::snapping;
use crate::surface::ZoneSurface;
use crate::types::{Geometry, ViewMode, ZoneId};

/// Result of one reconciliation pass
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub created: Vec<ZoneId>,
    pub removed: Vec<ZoneId>,
    /// False when the root directory could not be listed
    pub root_available: bool,
}

impl ReconcileReport {
    #[cfg(test)]
    pub fn changed(&self) -> bool {
        !self.created.is_empty() || !self.removed.is_empty()
    }
}

pub struct ZoneManager<S: ZoneSurface> {
    config: Config,
    store: LayoutStore,
    registry: ZoneRegistry,
    surface: S,
    /// Next number tried for "Zone N" folders
    zone_counter: u32,
}

impl<S: ZoneSurface> ZoneManager<S> {
    pub fn new(config: Config, surface: S) -> Self {
        let store = LayoutStore::new(config.layout_path());
        Self {
            config,
            store,
            registry: ZoneRegistry::new(),
            surface,
            zone_counter: 1,
        }
    }

    pub fn root(&self) -> &Path {
        &self.config.root_dir
    }

    pub fn registry(&self) -> &ZoneRegistry {
        &self.registry
    }

    #[cfg(test)]
    pub fn store(&self) -> &LayoutStore {
        &self.store
    }

    #[cfg(test)]
    pub fn surface(&self) -> &S {
        &self.surface
    }

    #[cfg(test)]
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn zone(&self, id: ZoneId) -> Result<&Zone> {
        self.registry.get(id).ok_or(ZoneError::UnknownZone(id))
    }

    /// Create the root directory if needed. Returns true when it was created.
    pub fn initialize_root(&mut self) -> Result<bool> {
        let root = self.config.root_dir.clone();
        if root.is_dir() {
            return Ok(false);
        }

        fs::create_dir_all(&root).map_err(|source| ZoneError::RootUnavailable {
            path: root.clone(),
            source,
        })?;
        info!(root = %root.display(), "Created root directory");
        self.surface
            .notify("Boox", &format!("Created root directory {}", root.display()));
        Ok(true)
    }

    /// Converge the registry onto the root's current subfolders
    pub fn reconcile(&mut self) -> ReconcileReport {
        let listing = match reconciler::list_subfolders(&self.config.root_dir) {
            Ok(folders) => Some(folders),
            Err(e) => {
                warn!(error = %e, "Root directory listing failed, treating as empty");
                None
            }
        };
        let plan = reconciler::plan(listing.as_deref(), &self.registry);

        let mut report = ReconcileReport {
            root_available: listing.is_some(),
            ..ReconcileReport::default()
        };
        if plan.is_empty() {
            debug!(total = self.registry.len(), "Zones already in sync");
            return report;
        }

        for folder in plan.to_create {
            match self.create_zone_for_folder(&folder) {
                Ok(id) => report.created.push(id),
                // the folder may vanish between listing and creation
                Err(e) => warn!(folder = %folder.display(), error = %e, "Skipping folder"),
            }
        }

        for id in plan.to_remove {
            if let Some(zone) = self.registry.remove_zone(id) {
                info!(zone = %zone.name, folder = %zone.folder.display(), "Folder disappeared, removing zone");
                self.surface.close_zone_ui(&zone);
                report.removed.push(id);
            }
        }

        info!(created = report.created.len(), removed = report.removed.len(), total = self.registry.len(), "Reconciled zones");
        report
    }

    /// Register a zone for an existing folder, restoring its saved layout if any
    pub fn create_zone_for_folder(&mut self, folder: &Path) -> Result<ZoneId> {
        if self.registry.find_by_path(folder).is_some() {
            return Err(ZoneError::DuplicatePath(folder.to_path_buf()));
        }
        if !folder.is_dir() {
            return Err(ZoneError::Io {
                path: folder.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "folder does not exist"),
            });
        }

        let index = self.registry.len();
        let record = self.store.get_record(folder);
        let geometry = match record.and_then(|r| r.geometry) {
            Some(geometry) => {
                debug!(folder = %folder.display(), "Using saved layout");
                geometry
            }
            None => snapping::default_placement(index, self.config.screen(), &self.config.zone),
        };
        let view_mode = record.map(|r| r.view_mode).unwrap_or_default();

        let id = self.registry.create_zone(
            folder.to_path_buf(),
            folder_display_name(folder),
            geometry,
            view_mode,
        )?;
        let zone = self.registry.get(id).ok_or(ZoneError::UnknownZone(id))?;
        self.surface.create_zone_ui(zone);
        self.refresh_zone(id);
        Ok(id)
    }

    /// "New zone" action: create a fresh `Zone N` folder under the root, then its zone
    pub fn create_new_zone(&mut self) -> Result<ZoneId> {
        let folder = loop {
            let name = format!("{} {}", constants::zone::NEW_ZONE_PREFIX, self.zone_counter);
            self.zone_counter += 1;
            let candidate = self.config.root_dir.join(name);
            if !candidate.exists() {
                break candidate;
            }
        };

        fs::create_dir_all(&folder).map_err(|source| {
            error!(folder = %folder.display(), error = %source, "Failed to create zone folder");
            ZoneError::CreateFailed {
                path: folder.clone(),
                source,
            }
        })?;

        let id = self.create_zone_for_folder(&folder)?;
        let name = folder_display_name(&folder);
        self.surface.notify("New zone", &format!("Created zone {name}"));
        Ok(id)
    }

    /// User closed a zone: persist its layout, leave the folder alone
    pub fn close_zone(&mut self, id: ZoneId) -> Result<()> {
        let zone = self.registry.remove_zone(id).ok_or(ZoneError::UnknownZone(id))?;
        self.store.set_record(&zone.folder, &zone.layout_record());
        self.surface.close_zone_ui(&zone);
        info!(zone = %zone.name, "Zone closed by user");
        Ok(())
    }

    /// Rename the zone's folder and re-key its layout. None when nothing changed.
    pub fn rename_zone_folder(&mut self, id: ZoneId, new_name: &str) -> Result<Option<PathBuf>> {
        let renamed = rename::rename_folder(&mut self.registry, &self.store, id, new_name)?;
        if renamed.is_some() {
            let zone = self.registry.get(id).ok_or(ZoneError::UnknownZone(id))?;
            self.surface.update_zone_ui(zone);
            self.refresh_zone(id);
        }
        Ok(renamed)
    }

    /// Drag or resize finished: snap to the grid and persist
    pub fn update_geometry(&mut self, id: ZoneId, geometry: Geometry) -> Result<Geometry> {
        let snapped = snapping::snap_geometry(geometry, &self.config.zone);
        let zone = self.registry.get_mut(id).ok_or(ZoneError::UnknownZone(id))?;
        zone.geometry = snapped;
        self.store.set_record(&zone.folder, &zone.layout_record());
        self.surface.update_zone_ui(zone);
        Ok(snapped)
    }

    pub fn set_view_mode(&mut self, id: ZoneId, view_mode: ViewMode) -> Result<()> {
        let zone = self.registry.get_mut(id).ok_or(ZoneError::UnknownZone(id))?;
        zone.view_mode = view_mode;
        self.store.set_record(&zone.folder, &zone.layout_record());
        self.surface.update_zone_ui(zone);
        Ok(())
    }

    pub fn toggle_view_mode(&mut self, id: ZoneId) -> Result<ViewMode> {
        let view_mode = self.zone(id)?.view_mode.toggled();
        self.set_view_mode(id, view_mode)?;
        Ok(view_mode)
    }

    pub fn show_all(&mut self) {
        self.set_all_visible(true);
    }

    pub fn hide_all(&mut self) {
        self.set_all_visible(false);
    }

    fn set_all_visible(&mut self, visible: bool) {
        for id in self.registry.all_zones() {
            if let Some(zone) = self.registry.get_mut(id) {
                zone.visible = visible;
                self.surface.update_zone_ui(zone);
            }
        }
    }

    /// Re-list a zone folder after its contents changed
    pub fn refresh_zone_contents(&mut self, folder: &Path) {
        if let Some(id) = self.registry.find_by_path(folder) {
            self.refresh_zone(id);
        }
    }

    fn refresh_zone(&mut self, id: ZoneId) {
        let Some(zone) = self.registry.get(id) else {
            return;
        };
        match fileops::list_entries(&zone.folder) {
            Ok(entries) => self.surface.refresh_contents(zone, &entries),
            Err(e) => debug!(zone = %zone.name, error = %e, "Could not list zone folder"),
        }
    }

    /// Drop external files onto a zone, or onto one of its subfolders when `into` names one
    pub fn move_into_zone(&mut self, id: ZoneId, sources: &[PathBuf], into: Option<&str>) -> Result<MoveReport> {
        let folder = self.zone(id)?.folder.clone();
        let target = match into {
            Some(subfolder) => {
                rename::validate_leaf_name(subfolder)?;
                folder.join(subfolder)
            }
            None => folder,
        };
        let report = fileops::move_entries(sources, &target)?;
        if !report.failed.is_empty() {
            let failed: Vec<String> = report
                .failed
                .iter()
                .map(|(path, _)| folder_display_name(path))
                .collect();
            self.surface.notify(
                "Move finished",
                &format!("Moved {}, failed {}: {}", report.moved.len(), failed.len(), failed.join(", ")),
            );
        }
        if report.any_moved() {
            self.refresh_zone(id);
        }
        Ok(report)
    }

    /// Tear down every zone window. The layout file is left as it is.
    pub fn shutdown(&mut self) {
        for id in self.registry.all_zones() {
            if let Some(zone) = self.registry.remove_zone(id) {
                self.surface.close_zone_ui(&zone);
            }
        }
        info!("All zones closed");
    }
}
