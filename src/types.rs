//! Value types shared across the zone core

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Top-left corner of a zone window in screen coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: i32,
    pub height: i32,
}

impl Dimensions {
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

/// Position + size of a zone window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Geometry {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Geometry {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    pub fn from_parts(position: Position, dimensions: Dimensions) -> Self {
        Self::new(position.x, position.y, dimensions.width, dimensions.height)
    }

    pub fn position(&self) -> Position {
        Position::new(self.x, self.y)
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width, self.height)
    }
}

/// How a zone renders its folder contents
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    /// Single column, small icons
    #[default]
    List,
    /// Wrapped icon tiles
    Grid,
}

impl ViewMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewMode::List => "list",
            ViewMode::Grid => "grid",
        }
    }

    /// Anything other than "grid" is list mode
    pub fn from_layout_str(value: &str) -> Self {
        if value == "grid" {
            ViewMode::Grid
        } else {
            ViewMode::List
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            ViewMode::List => ViewMode::Grid,
            ViewMode::Grid => ViewMode::List,
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque handle of a registered zone, never reused within a process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ZoneId(pub(crate) u64);

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "zone#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_mode_from_layout_str() {
        assert_eq!(ViewMode::from_layout_str("grid"), ViewMode::Grid);
        assert_eq!(ViewMode::from_layout_str("list"), ViewMode::List);
        assert_eq!(ViewMode::from_layout_str("tiles"), ViewMode::List);
    }

    #[test]
    fn test_view_mode_command_line_value_is_strict() {
        assert_eq!(ViewMode::from_str("grid", false), Ok(ViewMode::Grid));
        assert_eq!(ViewMode::from_str("list", false), Ok(ViewMode::List));
        assert!(ViewMode::from_str("Grid", false).is_err());
        assert!(ViewMode::from_str("tiles", false).is_err());
    }

    #[test]
    fn test_view_mode_serde_lowercase() {
        assert_eq!(serde_json::to_string(&ViewMode::Grid).unwrap(), "\"grid\"");
        let mode: ViewMode = serde_json::from_str("\"list\"").unwrap();
        assert_eq!(mode, ViewMode::List);
    }

    #[test]
    fn test_geometry_parts() {
        let geometry = Geometry::from_parts(Position::new(100, 50), Dimensions::new(200, 350));
        assert_eq!(geometry, Geometry::new(100, 50, 200, 350));
        assert_eq!(geometry.position(), Position::new(100, 50));
        assert_eq!(geometry.dimensions(), Dimensions::new(200, 350));
    }
}
