use crate::config::ZoneSettings;
use crate::types::{Dimensions, Geometry, Position};

/// Round to the nearest multiple of `grid`, halves rounding up
fn snap(value: i32, grid: i32) -> i32 {
    if grid <= 1 {
        return value;
    }
    let cells = (f64::from(value) / f64::from(grid) + 0.5).floor() as i32;
    cells * grid
}

/// Snap a dropped zone position to the grid
pub fn snap_to_grid(position: Position, grid: i32) -> Position {
    Position::new(snap(position.x, grid), snap(position.y, grid))
}

/// Snap a resized zone to the grid, never below the minimum size
pub fn snap_size_to_grid(size: Dimensions, settings: &ZoneSettings) -> Dimensions {
    Dimensions::new(
        snap(size.width, settings.grid_size).max(settings.min_width),
        snap(size.height, settings.grid_size).max(settings.min_height),
    )
}

/// Snap both halves of a geometry
pub fn snap_geometry(geometry: Geometry, settings: &ZoneSettings) -> Geometry {
    Geometry::from_parts(
        snap_to_grid(geometry.position(), settings.grid_size),
        snap_size_to_grid(geometry.dimensions(), settings),
    )
}

/// Default geometry for the `index`-th zone when no layout record exists
///
/// Zones tile right-to-left in columns, top-to-bottom inside a column. A column holds
/// as many zones as fit in the available height, with at least one per column.
pub fn default_placement(index: usize, screen: Dimensions, settings: &ZoneSettings) -> Geometry {
    let size = snap_size_to_grid(Dimensions::new(settings.width, settings.height), settings);
    let grid = settings.grid_size;
    let margin = settings.margin;

    let zones_per_column = ((screen.height - margin * 2) / (settings.height + grid)).max(1) as usize;
    let column = (index / zones_per_column) as i32;
    let row = (index % zones_per_column) as i32;

    let x = screen.width - (column + 1) * (size.width + margin);
    let y = margin + row * (settings.height + grid);

    Geometry::from_parts(snap_to_grid(Position::new(x, y), grid), size)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCREEN: Dimensions = Dimensions { width: 1920, height: 1040 };

    #[test]
    fn test_snap_rounds_to_nearest_cell() {
        assert_eq!(snap_to_grid(Position::new(124, 126), 50), Position::new(100, 150));
        assert_eq!(snap_to_grid(Position::new(75, 25), 50), Position::new(100, 50));
        assert_eq!(snap_to_grid(Position::new(-124, -26), 50), Position::new(-100, -50));
    }

    #[test]
    fn test_snap_size_respects_minimum() {
        let settings = ZoneSettings::default();
        assert_eq!(snap_size_to_grid(Dimensions::new(90, 60), &settings), Dimensions::new(200, 150));
        assert_eq!(snap_size_to_grid(Dimensions::new(320, 480), &settings), Dimensions::new(300, 500));
    }

    #[test]
    fn test_default_placement_first_column() {
        let settings = ZoneSettings::default();
        // (1040 - 100) / 400 = 2 zones per column
        assert_eq!(default_placement(0, SCREEN, &settings), Geometry::new(1650, 50, 200, 350));
        assert_eq!(default_placement(1, SCREEN, &settings), Geometry::new(1650, 450, 200, 350));
    }

    #[test]
    fn test_default_placement_wraps_to_next_column() {
        let settings = ZoneSettings::default();
        // 1920 - 2 * 250 = 1420 → 1400
        assert_eq!(default_placement(2, SCREEN, &settings), Geometry::new(1400, 50, 200, 350));
        assert_eq!(default_placement(5, SCREEN, &settings), Geometry::new(1150, 450, 200, 350));
    }

    #[test]
    fn test_default_placement_short_screen_keeps_one_per_column() {
        let settings = ZoneSettings::default();
        let screen = Dimensions::new(1000, 300);
        assert_eq!(default_placement(0, screen, &settings), Geometry::new(750, 50, 200, 350));
        assert_eq!(default_placement(1, screen, &settings), Geometry::new(500, 50, 200, 350));
    }
}
