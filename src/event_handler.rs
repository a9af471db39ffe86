use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

use crate::manager::{ReconcileReport, ZoneManager};
use crate::surface::ZoneSurface;
use crate::watcher::{FolderWatcher, WatchEvent};

/// Paths touched by a burst of watcher events
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ChangeBatch {
    pub paths: BTreeSet<PathBuf>,
    pub errors: usize,
}

impl ChangeBatch {
    fn absorb(&mut self, event: WatchEvent) {
        match event {
            WatchEvent::Changed(paths) => self.paths.extend(paths),
            WatchEvent::Error(message) => {
                warn!(error = %message, "Filesystem watcher error");
                self.errors += 1;
            }
        }
    }
}

/// Merge `first` with whatever else arrives within `window`
pub fn coalesce(first: WatchEvent, rx: &Receiver<WatchEvent>, window: Duration) -> ChangeBatch {
    let mut batch = ChangeBatch::default();
    batch.absorb(first);

    let deadline = Instant::now() + window;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }
        match rx.recv_timeout(remaining) {
            Ok(event) => batch.absorb(event),
            Err(_) => break,
        }
    }
    debug!(paths = batch.paths.len(), errors = batch.errors, "Coalesced watcher events");
    batch
}

/// Handle one batch: run a full reconciliation, then refresh touched zone folders
pub fn handle_batch<S: ZoneSurface>(
    manager: &mut ZoneManager<S>,
    watcher: &mut FolderWatcher,
    batch: &ChangeBatch,
) -> ReconcileReport {
    let mut report = manager.reconcile();

    if !report.root_available {
        match manager.initialize_root() {
            Ok(_) => {
                watcher.watch_root();
                let retry = manager.reconcile();
                report.created.extend(retry.created);
                report.removed.extend(retry.removed);
                report.root_available = retry.root_available;
            }
            Err(e) => error!(error = %e, "Root directory unavailable, retrying on next event"),
        }
    } else if !watcher.root_watched() {
        watcher.watch_root();
    }

    for folder in touched_zone_folders(manager, &batch.paths) {
        manager.refresh_zone_contents(&folder);
    }

    watcher.sync_zones(manager.registry().folders());
    report
}

/// Zone folders that are, or directly contain, one of `paths`
fn touched_zone_folders<S: ZoneSurface>(manager: &ZoneManager<S>, paths: &BTreeSet<PathBuf>) -> BTreeSet<PathBuf> {
    let is_zone = |path: &Path| manager.registry().find_by_path(path).is_some();
    paths
        .iter()
        .filter_map(|path| {
            if is_zone(path) {
                Some(path.clone())
            } else {
                path.parent().filter(|parent| is_zone(parent)).map(Path::to_path_buf)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::surface::testing::{RecordingSurface, SurfaceCall};
    use std::fs;
    use std::sync::mpsc;
    use tempfile::TempDir;

    #[test]
    fn test_coalesce_merges_burst() {
        let (tx, rx) = mpsc::channel();
        tx.send(WatchEvent::Changed(vec![PathBuf::from("/r/b")])).unwrap();
        tx.send(WatchEvent::Error("overflow".into())).unwrap();
        tx.send(WatchEvent::Changed(vec![PathBuf::from("/r/a"), PathBuf::from("/r/b")])).unwrap();

        let batch = coalesce(
            WatchEvent::Changed(vec![PathBuf::from("/r/c")]),
            &rx,
            Duration::from_millis(20),
        );

        let expected: BTreeSet<PathBuf> = ["/r/a", "/r/b", "/r/c"].iter().map(PathBuf::from).collect();
        assert_eq!(batch.paths, expected);
        assert_eq!(batch.errors, 1);
    }

    #[test]
    fn test_handle_batch_reconciles_and_refreshes() {
        let root = TempDir::new().unwrap();
        fs::create_dir(root.path().join("A")).unwrap();
        let config = Config {
            root_dir: root.path().to_path_buf(),
            ..Config::default()
        };
        let mut manager = ZoneManager::new(config, RecordingSurface::default());
        manager.reconcile();
        let (tx, _rx) = mpsc::channel();
        let mut watcher = FolderWatcher::spawn(root.path(), tx).unwrap();

        fs::create_dir(root.path().join("B")).unwrap();
        fs::write(root.path().join("A").join("note.txt"), "").unwrap();
        manager.surface_mut().clear();

        let mut batch = ChangeBatch::default();
        batch.paths.insert(root.path().join("B"));
        batch.paths.insert(root.path().join("A").join("note.txt"));
        let report = handle_batch(&mut manager, &mut watcher, &batch);

        assert_eq!(report.created.len(), 1);
        assert_eq!(manager.registry().len(), 2);
        assert!(manager.surface().calls.contains(&SurfaceCall::Refresh(
            root.path().join("A"),
            vec!["note.txt".to_string()]
        )));
    }

    #[test]
    fn test_handle_batch_recreates_deleted_root() {
        let parent = TempDir::new().unwrap();
        let root = parent.path().join("boox");
        fs::create_dir_all(root.join("A")).unwrap();
        let config = Config {
            root_dir: root.clone(),
            ..Config::default()
        };
        let mut manager = ZoneManager::new(config, RecordingSurface::default());
        let zone = manager.reconcile().created[0];
        let (tx, _rx) = mpsc::channel();
        let mut watcher = FolderWatcher::spawn(&root, tx).unwrap();

        fs::remove_dir_all(&root).unwrap();
        let report = handle_batch(&mut manager, &mut watcher, &ChangeBatch::default());

        assert!(report.root_available);
        assert!(root.is_dir());
        assert_eq!(report.removed, vec![zone]);
        assert!(report.created.is_empty());
        assert!(manager.registry().is_empty());
    }
}
