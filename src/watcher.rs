use anyhow::{Context, Result};
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use tracing::{debug, error, info, warn};

/// Messages from the watcher callback thread to the control loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// Something changed under these paths; the receiver re-lists, it does not diff
    Changed(Vec<PathBuf>),
    Error(String),
}

/// Watches the root (for folders coming and going) and every zone folder (for contents)
pub struct FolderWatcher {
    watcher: RecommendedWatcher,
    root: PathBuf,
    root_watched: bool,
    zones: HashSet<PathBuf>,
}

impl FolderWatcher {
    /// Start the platform watcher; events are forwarded on `sender`
    pub fn spawn(root: &Path, sender: Sender<WatchEvent>) -> Result<Self> {
        let watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let message = match res {
                Ok(event) => {
                    debug!(kind = ?event.kind, paths = ?event.paths, "Filesystem event");
                    WatchEvent::Changed(event.paths)
                }
                Err(e) => WatchEvent::Error(e.to_string()),
            };
            // receiver gone means the daemon is shutting down
            let _ = sender.send(message);
        })
        .context("Failed to create filesystem watcher")?;

        let mut folder_watcher = Self {
            watcher,
            root: root.to_path_buf(),
            root_watched: false,
            zones: HashSet::new(),
        };
        folder_watcher.watch_root();
        Ok(folder_watcher)
    }

    /// (Re)attach to the root; needed again after the root was deleted and recreated
    pub fn watch_root(&mut self) {
        if self.root_watched {
            let _ = self.watcher.unwatch(&self.root);
        }
        match self.watcher.watch(&self.root, RecursiveMode::NonRecursive) {
            Ok(()) => {
                info!(root = %self.root.display(), "Watching root directory");
                self.root_watched = true;
            }
            Err(e) => {
                warn!(root = %self.root.display(), error = %e, "Cannot watch root directory");
                self.root_watched = false;
            }
        }
    }

    pub fn root_watched(&self) -> bool {
        self.root_watched
    }

    /// Watch exactly the given zone folders
    pub fn sync_zones<'a>(&mut self, folders: impl IntoIterator<Item = &'a Path>) {
        let wanted: HashSet<PathBuf> = folders.into_iter().map(Path::to_path_buf).collect();

        let stale: Vec<PathBuf> = self.zones.difference(&wanted).cloned().collect();
        for folder in stale {
            // fails harmlessly when the folder is already gone
            let _ = self.watcher.unwatch(&folder);
            self.zones.remove(&folder);
            debug!(folder = %folder.display(), "Stopped watching zone folder");
        }

        for folder in wanted {
            if self.zones.contains(&folder) {
                continue;
            }
            match self.watcher.watch(&folder, RecursiveMode::NonRecursive) {
                Ok(()) => {
                    debug!(folder = %folder.display(), "Watching zone folder");
                    self.zones.insert(folder);
                }
                Err(e) => error!(folder = %folder.display(), error = %e, "Cannot watch zone folder"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::mpsc;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_new_subfolder_raises_event() {
        let root = TempDir::new().unwrap();
        let (tx, rx) = mpsc::channel();
        let watcher = FolderWatcher::spawn(root.path(), tx).unwrap();
        assert!(watcher.root_watched());

        fs::create_dir(root.path().join("A")).unwrap();

        let event = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(matches!(event, WatchEvent::Changed(_)));
    }

    #[test]
    fn test_sync_zones_tracks_set() {
        let root = TempDir::new().unwrap();
        let a = root.path().join("A");
        let b = root.path().join("B");
        fs::create_dir(&a).unwrap();
        fs::create_dir(&b).unwrap();
        let (tx, _rx) = mpsc::channel();
        let mut watcher = FolderWatcher::spawn(root.path(), tx).unwrap();

        watcher.sync_zones([a.as_path(), b.as_path()]);
        assert_eq!(watcher.zones.len(), 2);

        watcher.sync_zones([b.as_path()]);
        assert_eq!(watcher.zones, HashSet::from([b.clone()]));
    }
}
