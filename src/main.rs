#![forbid(unsafe_code)]

mod config;
mod constants;
mod error;
mod event_handler;
mod fileops;
mod manager;
mod persistence;
mod reconciler;
mod registry;
mod rename;
mod snapping;
mod surface;
mod types;
mod watcher;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Duration;
use tracing::{error, info, warn, Level as TraceLevel};
use tracing_subscriber::FmtSubscriber;

use config::Config;
use constants::timing;
use event_handler::{coalesce, handle_batch};
use manager::ZoneManager;
use surface::LogSurface;
use types::{Geometry, ViewMode, ZoneId};
use watcher::FolderWatcher;

#[derive(Debug, Parser)]
#[command(name = "boox", version, about = "Desktop zones backed by folders")]
struct Cli {
    /// Config file (defaults to the platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Root directory override
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Layout file override
    #[arg(long, global = true)]
    layout: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Watch the root directory and keep zones in sync (default)
    Run,
    /// Reconcile once and list the resulting zones
    Scan,
    /// Create a new zone folder under the root
    New,
    /// Rename a zone's folder, carrying its layout over
    Rename { folder: PathBuf, name: String },
    /// Print the saved layout records
    Layout {
        /// Drop records whose folder no longer exists
        #[arg(long)]
        prune: bool,
    },
    /// Save a zone's geometry, snapped to the grid
    Geometry {
        folder: PathBuf,
        #[arg(allow_negative_numbers = true)]
        x: i32,
        #[arg(allow_negative_numbers = true)]
        y: i32,
        width: i32,
        height: i32,
    },
    /// Set a zone's view mode, or toggle it when no mode is given
    View {
        folder: PathBuf,
        #[arg(value_enum)]
        mode: Option<ViewMode>,
    },
    /// Close a zone, keeping its folder and layout
    Close { folder: PathBuf },
    /// Forget a folder's saved layout
    Forget { folder: PathBuf },
    /// Create an empty file in a zone
    Touch { folder: PathBuf, name: String },
    /// Create a subfolder in a zone
    Mkdir { folder: PathBuf, name: String },
    /// Delete a file or folder from a zone
    Rm { folder: PathBuf, name: String },
    /// Move files or folders into a zone
    Move {
        folder: PathBuf,
        /// Subfolder of the zone to move into
        #[arg(long)]
        into: Option<String>,
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// List a zone's contents
    Ls { folder: PathBuf },
}

fn init_logging() -> Result<()> {
    let log_level = match std::env::var("LOG_LEVEL")
        .unwrap_or_else(|_| "info".to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => TraceLevel::TRACE,
        "debug" => TraceLevel::DEBUG,
        "warn" => TraceLevel::WARN,
        "error" => TraceLevel::ERROR,
        _ => TraceLevel::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to install tracing subscriber")
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(root) = &cli.root {
        config.root_dir = root.clone();
    }
    if let Some(layout) = &cli.layout {
        config.layout_file = Some(layout.clone());
    }
    config.resolve_paths()?;
    Ok(config)
}

/// Manager with the root created and scanned
fn start_manager(config: Config) -> Result<ZoneManager<LogSurface>> {
    let mut manager = ZoneManager::new(config, LogSurface);
    if let Err(e) = manager.initialize_root() {
        warn!(error = %e, "Continuing without a root directory");
    }
    let report = manager.reconcile();
    if report.root_available && manager.registry().is_empty() {
        info!(root = %manager.root().display(), "Root directory is empty, create folders in it to add zones");
    }
    Ok(manager)
}

fn zone_folder(root: &Path, folder: &Path) -> PathBuf {
    if folder.is_absolute() {
        folder.to_path_buf()
    } else {
        root.join(folder)
    }
}

fn find_zone(manager: &ZoneManager<LogSurface>, folder: &Path) -> Result<ZoneId> {
    let folder = zone_folder(manager.root(), folder);
    manager
        .registry()
        .find_by_path(&folder)
        .with_context(|| format!("No zone for folder {}", folder.display()))
}

fn run_daemon(config: Config) -> Result<()> {
    let debounce = Duration::from_millis(config.debounce_ms);
    let mut manager = start_manager(config)?;

    let (tx, rx) = mpsc::channel();
    let mut watcher = FolderWatcher::spawn(manager.root(), tx)?;
    watcher.sync_zones(manager.registry().folders());

    let shutdown = Arc::new(AtomicBool::new(false));
    let toggle_visibility = Arc::new(AtomicBool::new(false));
    #[cfg(unix)]
    {
        use signal_hook::consts::{SIGINT, SIGTERM, SIGUSR1};
        for signal in [SIGINT, SIGTERM] {
            signal_hook::flag::register(signal, Arc::clone(&shutdown))
                .context("Failed to register signal handler")?;
        }
        signal_hook::flag::register(SIGUSR1, Arc::clone(&toggle_visibility))
            .context("Failed to register SIGUSR1 handler")?;
    }
    let mut visible = true;

    info!(zones = manager.registry().len(), "Boox running");
    while !shutdown.load(Ordering::Relaxed) {
        if toggle_visibility.swap(false, Ordering::Relaxed) {
            visible = !visible;
            if visible {
                manager.show_all();
            } else {
                manager.hide_all();
            }
            info!(visible, "Toggled zone visibility");
        }

        match rx.recv_timeout(Duration::from_millis(timing::SHUTDOWN_POLL_MS)) {
            Ok(event) => {
                let batch = coalesce(event, &rx, debounce);
                handle_batch(&mut manager, &mut watcher, &batch);
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                error!("Filesystem watcher stopped");
                break;
            }
        }
    }

    info!("Shutting down");
    manager.shutdown();
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging()?;
    let config = load_config(&cli)?;

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => run_daemon(config)?,
        Command::Scan => {
            let manager = start_manager(config)?;
            for zone in manager.registry().zones() {
                let g = zone.geometry;
                println!(
                    "{}\t{}\t{},{} {}x{}\t{}",
                    zone.name,
                    zone.folder.display(),
                    g.x, g.y, g.width, g.height,
                    zone.view_mode
                );
            }
        }
        Command::New => {
            let mut manager = start_manager(config)?;
            let id = manager.create_new_zone()?;
            println!("{}", manager.zone(id)?.folder.display());
        }
        Command::Rename { folder, name } => {
            let mut manager = start_manager(config)?;
            let id = find_zone(&manager, &folder)?;
            match manager.rename_zone_folder(id, &name)? {
                Some(path) => println!("{}", path.display()),
                None => info!("Name unchanged, nothing to do"),
            }
        }
        Command::Layout { prune } => {
            let store = persistence::LayoutStore::new(config.layout_path());
            if prune {
                let removed = store.retain_records(|key| Path::new(key).is_dir());
                info!(removed, "Pruned stale layout records");
            }
            for (key, record) in store.load() {
                match record.geometry {
                    Some(g) => println!("{key}\t{},{} {}x{}\t{}", g.x, g.y, g.width, g.height, record.view_mode),
                    None => println!("{key}\t-\t{}", record.view_mode),
                }
            }
        }
        Command::Move { folder, into, paths } => {
            let mut manager = start_manager(config)?;
            let id = find_zone(&manager, &folder)?;
            let report = manager.move_into_zone(id, &paths, into.as_deref())?;
            for (_, destination) in &report.moved {
                println!("{}", destination.display());
            }
            for (source, reason) in &report.failed {
                eprintln!("failed: {}: {reason}", source.display());
            }
            if !report.any_moved() && !report.failed.is_empty() {
                anyhow::bail!("No entries were moved");
            }
        }
        Command::Geometry { folder, x, y, width, height } => {
            let mut manager = start_manager(config)?;
            let id = find_zone(&manager, &folder)?;
            let g = manager.update_geometry(id, Geometry::new(x, y, width, height))?;
            println!("{},{} {}x{}", g.x, g.y, g.width, g.height);
        }
        Command::View { folder, mode } => {
            let mut manager = start_manager(config)?;
            let id = find_zone(&manager, &folder)?;
            let view_mode = match mode {
                Some(view_mode) => {
                    manager.set_view_mode(id, view_mode)?;
                    view_mode
                }
                None => manager.toggle_view_mode(id)?,
            };
            println!("{view_mode}");
        }
        Command::Close { folder } => {
            let mut manager = start_manager(config)?;
            let id = find_zone(&manager, &folder)?;
            manager.close_zone(id)?;
        }
        Command::Forget { folder } => {
            let store = persistence::LayoutStore::new(config.layout_path());
            let folder = zone_folder(&config.root_dir, &folder);
            if !store.remove_record(&folder) {
                info!(folder = %folder.display(), "No saved layout for folder");
            }
        }
        Command::Touch { folder, name } => {
            let mut manager = start_manager(config)?;
            let id = find_zone(&manager, &folder)?;
            let zone_folder = manager.zone(id)?.folder.clone();
            println!("{}", fileops::create_file(&zone_folder, &name)?.display());
            manager.refresh_zone_contents(&zone_folder);
        }
        Command::Mkdir { folder, name } => {
            let mut manager = start_manager(config)?;
            let id = find_zone(&manager, &folder)?;
            let zone_folder = manager.zone(id)?.folder.clone();
            println!("{}", fileops::create_folder(&zone_folder, &name)?.display());
            manager.refresh_zone_contents(&zone_folder);
        }
        Command::Rm { folder, name } => {
            let mut manager = start_manager(config)?;
            let id = find_zone(&manager, &folder)?;
            let zone_folder = manager.zone(id)?.folder.clone();
            rename::validate_leaf_name(&name)?;
            fileops::delete_entry(&zone_folder.join(&name))?;
            manager.refresh_zone_contents(&zone_folder);
        }
        Command::Ls { folder } => {
            let manager = start_manager(config)?;
            let id = find_zone(&manager, &folder)?;
            for entry in fileops::list_entries(&manager.zone(id)?.folder)? {
                let marker = if entry.is_dir { "/" } else { "" };
                println!("{}{marker}", entry.name);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_rejects_unknown_mode() {
        let cli = Cli::try_parse_from(["boox", "view", "A", "grid"]).unwrap();
        assert!(matches!(cli.command, Some(Command::View { mode: Some(ViewMode::Grid), .. })));

        assert!(Cli::try_parse_from(["boox", "view", "A", "Grid"]).is_err());
        assert!(Cli::try_parse_from(["boox", "view", "A", "tiles"]).is_err());
    }

    #[test]
    fn test_move_accepts_subfolder_target() {
        let cli = Cli::try_parse_from(["boox", "move", "A", "--into", "Receipts", "/tmp/x.pdf"]).unwrap();
        match cli.command {
            Some(Command::Move { folder, into, paths }) => {
                assert_eq!(folder, PathBuf::from("A"));
                assert_eq!(into.as_deref(), Some("Receipts"));
                assert_eq!(paths, vec![PathBuf::from("/tmp/x.pdf")]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
