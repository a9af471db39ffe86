//! Application-wide constants

/// Zone window geometry defaults (pixels)
pub mod zone {
    /// Snap unit for positions and sizes
    pub const GRID_SIZE: i32 = 50;

    /// Width of a freshly created zone
    pub const DEFAULT_WIDTH: i32 = 200;

    /// Height of a freshly created zone
    pub const DEFAULT_HEIGHT: i32 = 350;

    /// Distance kept from the screen edge when tiling new zones
    pub const MARGIN: i32 = 50;

    pub const MIN_WIDTH: i32 = 200;
    pub const MIN_HEIGHT: i32 = 150;

    /// Folder name prefix for zones created from the "new zone" action
    pub const NEW_ZONE_PREFIX: &str = "Zone";
}

/// Screen geometry assumed when none is configured
pub mod screen {
    pub const DEFAULT_WIDTH: i32 = 1920;

    /// Available height (screen minus a typical taskbar)
    pub const DEFAULT_HEIGHT: i32 = 1040;
}

/// Configuration and data file locations
pub mod config {
    /// Directory under the platform config dir
    pub const APP_DIR: &str = "boox";

    pub const FILENAME: &str = "config.json";

    /// Root directory name under the home dir
    pub const ROOT_DIR_NAME: &str = "boox";

    /// Layout file name, stored inside the root directory by default
    pub const LAYOUT_FILENAME: &str = ".layout.json";
}

/// Config validation bounds
pub mod validation {
    pub const MIN_GRID_SIZE: i32 = 1;
    pub const MAX_GRID_SIZE: i32 = 500;
    pub const MIN_DIMENSION: i32 = 50;
    pub const MAX_DIMENSION: i32 = 8192;
    pub const MAX_MARGIN: i32 = 1000;
    pub const MAX_DEBOUNCE_MS: u64 = 10_000;
}

/// Event loop timing
pub mod timing {
    /// Default window for coalescing watcher events into one reconciliation
    pub const DEFAULT_DEBOUNCE_MS: u64 = 200;

    /// How often the daemon loop wakes up to check for shutdown signals
    pub const SHUTDOWN_POLL_MS: u64 = 250;
}
