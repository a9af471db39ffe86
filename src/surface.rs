//! Boundary to whatever draws the zones on screen

use tracing::{debug, info};

use crate::fileops::FolderEntry;
use crate::registry::Zone;

/// Calls the zone core makes into the UI layer
pub trait ZoneSurface {
    /// Materialize a window for a newly registered zone
    fn create_zone_ui(&mut self, zone: &Zone);

    /// Tear down a zone's window
    fn close_zone_ui(&mut self, zone: &Zone);

    /// Title, geometry, view mode or visibility changed
    fn update_zone_ui(&mut self, zone: &Zone);

    /// Folder contents changed and should be re-rendered
    fn refresh_contents(&mut self, zone: &Zone, entries: &[FolderEntry]);

    /// Transient user notification (tray balloon or similar)
    fn notify(&mut self, title: &str, message: &str);
}

/// Headless surface that reports every UI call through tracing
#[derive(Debug, Default)]
pub struct LogSurface;

impl ZoneSurface for LogSurface {
    fn create_zone_ui(&mut self, zone: &Zone) {
        let g = zone.geometry;
        info!(
            zone = %zone.name,
            folder = %zone.folder.display(),
            x = g.x, y = g.y, width = g.width, height = g.height,
            view_mode = %zone.view_mode,
            "Zone opened"
        );
    }

    fn close_zone_ui(&mut self, zone: &Zone) {
        info!(zone = %zone.name, folder = %zone.folder.display(), "Zone closed");
    }

    fn update_zone_ui(&mut self, zone: &Zone) {
        let g = zone.geometry;
        info!(
            zone = %zone.name,
            x = g.x, y = g.y, width = g.width, height = g.height,
            view_mode = %zone.view_mode,
            visible = zone.visible,
            "Zone updated"
        );
    }

    fn refresh_contents(&mut self, zone: &Zone, entries: &[FolderEntry]) {
        debug!(zone = %zone.name, entries = entries.len(), "Zone contents refreshed");
    }

    fn notify(&mut self, title: &str, message: &str) {
        info!(title, "{message}");
    }
}
