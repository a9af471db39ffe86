//! Layout store: per-folder zone geometry persisted to a JSON sidecar file
//!
//! The file is a single JSON object keyed by absolute folder path. Every
//! single-key operation is one load → modify → save cycle, so records for
//! other folders (and any unknown data) survive a write untouched.
//! Persistence is best-effort: read failures look like an empty layout,
//! write failures are logged and swallowed.

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, warn};

use crate::error::ZoneError;
use crate::types::{Geometry, ViewMode};

const KEY_X: &str = "x";
const KEY_Y: &str = "y";
const KEY_WIDTH: &str = "width";
const KEY_HEIGHT: &str = "height";
const KEY_VIEW_MODE: &str = "viewMode";

/// Saved geometry and view mode for one folder
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LayoutRecord {
    /// None when any of x/y/width/height is missing (caller uses default placement)
    pub geometry: Option<Geometry>,
    pub view_mode: ViewMode,
}

impl LayoutRecord {
    pub fn new(geometry: Geometry, view_mode: ViewMode) -> Self {
        Self {
            geometry: Some(geometry),
            view_mode,
        }
    }

    /// Lenient parse: non-object values yield None, missing fields fall back
    fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let field = |key: &str| {
            object
                .get(key)
                .and_then(Value::as_i64)
                .and_then(|n| i32::try_from(n).ok())
        };

        let geometry = match (field(KEY_X), field(KEY_Y), field(KEY_WIDTH), field(KEY_HEIGHT)) {
            (Some(x), Some(y), Some(width), Some(height)) => Some(Geometry::new(x, y, width, height)),
            _ => None,
        };
        let view_mode = object
            .get(KEY_VIEW_MODE)
            .and_then(Value::as_str)
            .map(ViewMode::from_layout_str)
            .unwrap_or_default();

        Some(Self { geometry, view_mode })
    }

    /// Write known fields into `object`, leaving unrelated fields alone
    fn merge_into(&self, object: &mut Map<String, Value>) {
        match self.geometry {
            Some(g) => {
                object.insert(KEY_X.into(), g.x.into());
                object.insert(KEY_Y.into(), g.y.into());
                object.insert(KEY_WIDTH.into(), g.width.into());
                object.insert(KEY_HEIGHT.into(), g.height.into());
            }
            None => {
                for key in [KEY_X, KEY_Y, KEY_WIDTH, KEY_HEIGHT] {
                    object.remove(key);
                }
            }
        }
        object.insert(KEY_VIEW_MODE.into(), self.view_mode.as_str().into());
    }

    fn to_value(&self) -> Value {
        let mut object = Map::new();
        self.merge_into(&mut object);
        Value::Object(object)
    }
}

/// Layout key for a folder: its absolute path as a string
pub fn layout_key(folder: &Path) -> String {
    folder.to_string_lossy().into_owned()
}

/// Handle to the layout file. Owns no cached state; every call hits the file.
#[derive(Debug, Clone)]
pub struct LayoutStore {
    path: PathBuf,
}

impl LayoutStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[cfg(test)]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All parseable records. Never fails: absent/unreadable/invalid file → empty.
    pub fn load(&self) -> BTreeMap<String, LayoutRecord> {
        self.load_document()
            .iter()
            .filter_map(|(key, value)| LayoutRecord::from_value(value).map(|r| (key.clone(), r)))
            .collect()
    }

    /// Overwrite the file with exactly `records`
    pub fn save(&self, records: &BTreeMap<String, LayoutRecord>) {
        let document: Map<String, Value> = records
            .iter()
            .map(|(key, record)| (key.clone(), record.to_value()))
            .collect();
        self.save_document(&document);
    }

    pub fn get_record(&self, folder: &Path) -> Option<LayoutRecord> {
        self.load_document()
            .get(&layout_key(folder))
            .and_then(LayoutRecord::from_value)
    }

    #[cfg(test)]
    pub fn has_record(&self, folder: &Path) -> bool {
        self.get_record(folder).is_some()
    }

    pub fn set_record(&self, folder: &Path, record: &LayoutRecord) {
        let mut document = self.load_document();
        write_entry(&mut document, layout_key(folder), record);
        debug!(folder = %folder.display(), record = ?record, "Saving layout record");
        self.save_document(&document);
    }

    /// Returns whether a record was present. Skips the write when it wasn't.
    pub fn remove_record(&self, folder: &Path) -> bool {
        let mut document = self.load_document();
        if document.remove(&layout_key(folder)).is_none() {
            return false;
        }
        debug!(folder = %folder.display(), "Removed layout record");
        self.save_document(&document);
        true
    }

    /// Drop records whose key fails `keep`. Other top-level values and surviving
    /// records are written back untouched. Returns the number removed.
    pub fn retain_records(&self, mut keep: impl FnMut(&str) -> bool) -> usize {
        let mut document = self.load_document();
        let before = document.len();
        document.retain(|key, value| LayoutRecord::from_value(value).is_none() || keep(key));
        let removed = before - document.len();
        if removed > 0 {
            debug!(removed, "Pruned layout records");
            self.save_document(&document);
        }
        removed
    }

    /// Move a record to a new key in a single load/save cycle
    pub fn rename_key(&self, old_folder: &Path, new_folder: &Path, record: &LayoutRecord) {
        let mut document = self.load_document();
        let previous = document.remove(&layout_key(old_folder));

        // carry unknown fields of the old entry over to the new key
        let mut entry = match previous {
            Some(Value::Object(object)) => object,
            _ => Map::new(),
        };
        record.merge_into(&mut entry);
        document.insert(layout_key(new_folder), Value::Object(entry));

        debug!(from = %old_folder.display(), to = %new_folder.display(), "Re-keyed layout record");
        self.save_document(&document);
    }

    fn load_document(&self) -> Map<String, Value> {
        match self.try_load_document() {
            Ok(document) => document,
            Err(e) => {
                warn!(error = %e, "Ignoring layout file");
                Map::new()
            }
        }
    }

    fn try_load_document(&self) -> Result<Map<String, Value>, ZoneError> {
        if !self.path.exists() {
            return Ok(Map::new());
        }
        let contents = fs::read_to_string(&self.path).map_err(|e| self.unavailable(e.to_string()))?;
        match serde_json::from_str::<Value>(&contents) {
            Ok(Value::Object(document)) => Ok(document),
            Ok(_) => Err(self.unavailable("top-level value is not an object".into())),
            Err(e) => Err(self.unavailable(e.to_string())),
        }
    }

    fn save_document(&self, document: &Map<String, Value>) {
        if let Err(e) = self.try_save_document(document) {
            error!(error = %e, "Failed to save layout");
        }
    }

    fn try_save_document(&self, document: &Map<String, Value>) -> Result<(), ZoneError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.unavailable(e.to_string()))?;
        }
        let json = serde_json::to_string_pretty(document).map_err(|e| self.unavailable(e.to_string()))?;
        fs::write(&self.path, json).map_err(|e| self.unavailable(e.to_string()))
    }

    fn unavailable(&self, reason: String) -> ZoneError {
        ZoneError::PersistenceUnavailable {
            path: self.path.clone(),
            reason,
        }
    }
}

fn write_entry(document: &mut Map<String, Value>, key: String, record: &LayoutRecord) {
    match document.get_mut(&key) {
        Some(Value::Object(existing)) => record.merge_into(existing),
        _ => {
            document.insert(key, record.to_value());
        }
    }
}
