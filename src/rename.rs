//! Renaming a zone's backing folder
//!
//! The filesystem rename happens first; registry and layout are only touched once
//! it has succeeded, so a failure never leaves either pointing at a missing path.

use std::fs;
use std::path::PathBuf;
use tracing::info;

use crate::error::{Result, ZoneError};
use crate::persistence::LayoutStore;
use crate::registry::{folder_display_name, ZoneRegistry};
use crate::types::ZoneId;

/// Rename the folder behind `id` to `new_name` (a sibling of the current folder).
///
/// Returns the new folder path, or `None` when the name is empty or unchanged.
pub fn rename_folder(
    registry: &mut ZoneRegistry,
    store: &LayoutStore,
    id: ZoneId,
    new_name: &str,
) -> Result<Option<PathBuf>> {
    let zone = registry.get(id).ok_or(ZoneError::UnknownZone(id))?;
    let new_name = new_name.trim();
    if new_name.is_empty() || new_name == zone.name {
        return Ok(None);
    }
    validate_leaf_name(new_name)?;

    let old_path = zone.folder.clone();
    let new_path = match old_path.parent() {
        Some(parent) => parent.join(new_name),
        None => PathBuf::from(new_name),
    };

    if new_path.exists() || registry.find_by_path(&new_path).is_some() {
        return Err(ZoneError::TargetExists(new_path));
    }

    fs::rename(&old_path, &new_path).map_err(|source| ZoneError::RenameFailed {
        from: old_path.clone(),
        to: new_path.clone(),
        source,
    })?;

    let record = zone.layout_record();
    store.rename_key(&old_path, &new_path, &record);
    registry.rebind(id, new_path.clone(), folder_display_name(&new_path))?;

    info!(from = %old_path.display(), to = %new_path.display(), "Renamed zone folder");
    Ok(Some(new_path))
}

/// Reject names that would escape the parent directory
pub fn validate_leaf_name(name: &str) -> Result<()> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0');
    if invalid {
        return Err(ZoneError::InvalidName(name.to_string()));
    }
    Ok(())
}
