//! File operations on a zone's folder contents

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::{Result, ZoneError};
use crate::rename::validate_leaf_name;

/// One entry shown inside a zone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderEntry {
    pub name: String,
    pub path: PathBuf,
    pub is_dir: bool,
}

/// Outcome of dropping a batch of paths onto a zone
#[derive(Debug, Default, PartialEq, Eq)]
pub struct MoveReport {
    /// (source, destination) pairs
    pub moved: Vec<(PathBuf, PathBuf)>,
    /// Sources that no longer exist or already live in the target folder
    pub skipped: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
}

impl MoveReport {
    pub fn any_moved(&self) -> bool {
        !self.moved.is_empty()
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> ZoneError + '_ {
    move |source| ZoneError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Folder contents, directories first, then by name
pub fn list_entries(folder: &Path) -> Result<Vec<FolderEntry>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(folder).map_err(io_error(folder))? {
        let entry = entry.map_err(io_error(folder))?;
        let path = entry.path();
        entries.push(FolderEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            is_dir: path.is_dir(),
            path,
        });
    }
    entries.sort_by(|a, b| b.is_dir.cmp(&a.is_dir).then_with(|| a.name.cmp(&b.name)));
    Ok(entries)
}

/// First free destination for `source` inside `target`: `name`, then `stem_1.ext`, `stem_2.ext`, ...
pub fn unique_destination(target: &Path, source: &Path) -> PathBuf {
    let file_name = source.file_name().unwrap_or_default();
    let candidate = target.join(file_name);
    if !candidate.exists() {
        return candidate;
    }

    let is_dir = source.is_dir();
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = source.extension().map(|s| s.to_string_lossy().into_owned());

    (1..)
        .map(|counter| {
            let name = match (&extension, is_dir) {
                (Some(ext), false) => format!("{stem}_{counter}.{ext}"),
                _ if is_dir => format!("{}_{counter}", file_name.to_string_lossy()),
                _ => format!("{stem}_{counter}"),
            };
            target.join(name)
        })
        .find(|path| !path.exists())
        .unwrap_or(candidate)
}

/// Move dropped paths into `target`, renaming on conflicts
pub fn move_entries(sources: &[PathBuf], target: &Path) -> Result<MoveReport> {
    if !target.is_dir() {
        return Err(ZoneError::Io {
            path: target.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "target folder does not exist"),
        });
    }

    let mut report = MoveReport::default();
    for source in sources {
        if !source.exists() || is_directly_inside(source, target) {
            report.skipped.push(source.clone());
            continue;
        }

        let destination = unique_destination(target, source);
        match move_one(source, &destination) {
            Ok(()) => report.moved.push((source.clone(), destination)),
            Err(e) => {
                warn!(source = %source.display(), error = %e, "Failed to move into zone");
                report.failed.push((source.clone(), e.to_string()));
            }
        }
    }

    info!(
        target = %target.display(),
        moved = report.moved.len(),
        skipped = report.skipped.len(),
        failed = report.failed.len(),
        "Moved entries into zone"
    );
    Ok(report)
}

/// Whether `path` already sits directly in `folder`, however either is spelled
fn is_directly_inside(path: &Path, folder: &Path) -> bool {
    let Ok(absolute) = std::path::absolute(path) else {
        return false;
    };
    let parent = absolute.parent().and_then(|parent| parent.canonicalize().ok());
    parent.is_some() && parent == folder.canonicalize().ok()
}

fn move_one(source: &Path, destination: &Path) -> std::io::Result<()> {
    if fs::rename(source, destination).is_ok() {
        return Ok(());
    }
    if source.is_dir() {
        // directories are not copied across devices
        return fs::rename(source, destination);
    }

    fs::copy(source, destination)?;
    if let Err(e) = fs::remove_file(source) {
        let _ = fs::remove_file(destination);
        return Err(e);
    }
    Ok(())
}

/// Create an empty file inside `folder`
pub fn create_file(folder: &Path, name: &str) -> Result<PathBuf> {
    validate_leaf_name(name)?;
    let path = folder.join(name);
    if path.exists() {
        return Err(ZoneError::TargetExists(path));
    }
    fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .map_err(io_error(&path))?;
    Ok(path)
}

/// Create a subfolder inside `folder`
pub fn create_folder(folder: &Path, name: &str) -> Result<PathBuf> {
    validate_leaf_name(name)?;
    let path = folder.join(name);
    if path.exists() {
        return Err(ZoneError::TargetExists(path));
    }
    fs::create_dir(&path).map_err(io_error(&path))?;
    Ok(path)
}

/// Delete a file or a whole directory tree
pub fn delete_entry(path: &Path) -> Result<()> {
    let result = if path.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    result.map_err(io_error(path))
}
