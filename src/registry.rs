//! The set of configured destination rooms, with hot-reload capability.

use crate::config::Config;
use crate::core::Room;
use anyhow::Result;
use arc_swap::ArcSwap;
use notify::{event::EventKind, Config as WatcherConfig, Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("no such room: {0}")]
    RoomNotFound(String),
}

/// Configured rooms keyed by case-insensitive name.
///
/// Readers always observe a complete snapshot; `replace_all` swaps the whole
/// set atomically. Duplicate names are accepted and lookups return the first
/// match in insertion order.
pub struct RoomRegistry {
    rooms: ArcSwap<Vec<Room>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::init(Vec::new())
    }

    /// Creates a registry holding `rooms`.
    pub fn init(rooms: Vec<Room>) -> Self {
        Self {
            rooms: ArcSwap::from_pointee(rooms),
        }
    }

    /// Atomically replaces every room.
    pub fn replace_all(&self, rooms: Vec<Room>) {
        let old_count = self.rooms.load().len();
        let new_count = rooms.len();
        self.rooms.store(Arc::new(rooms));
        info!("Replaced room registry: {} rooms ({:+})", new_count, new_count as isize - old_count as isize);
    }

    /// Looks up a room by name, ignoring case.
    pub fn find_by_name(&self, name: &str) -> Result<Room, RegistryError> {
        self.rooms
            .load()
            .iter()
            .find(|room| room.is_named(name))
            .cloned()
            .ok_or_else(|| RegistryError::RoomNotFound(name.to_string()))
    }

    /// Returns an owned copy of the current rooms, in insertion order.
    pub fn all(&self) -> Vec<Room> {
        self.rooms.load().as_ref().clone()
    }

    /// Returns the current snapshot without copying it.
    pub fn snapshot(&self) -> Arc<Vec<Room>> {
        self.rooms.load_full()
    }

    pub fn len(&self) -> usize {
        self.rooms.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.load().is_empty()
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Reloads a registry whenever its configuration file changes.
pub struct RoomWatcher {
    registry: Arc<RoomRegistry>,
}

impl RoomWatcher {
    /// Starts watching `config_path` and returns once the watcher is running.
    ///
    /// The registry is not touched until the first change is observed.
    pub fn spawn(registry: Arc<RoomRegistry>, config_path: PathBuf) -> Result<Self> {
        Self::with_notifier(registry, config_path, None)
    }

    /// Like [`RoomWatcher::spawn`], signalling `reload_notifier` after every successful reload.
    pub fn with_notifier(
        registry: Arc<RoomRegistry>,
        config_path: PathBuf,
        reload_notifier: Option<mpsc::Sender<()>>,
    ) -> Result<Self> {
        let (tx, rx) = mpsc::channel(100);

        let mut watcher = RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| {
                if let Ok(event) = res {
                    if let Err(e) = tx.blocking_send(event) {
                        error!("Failed to send file event: {}", e);
                    }
                }
            },
            WatcherConfig::default(),
        )?;

        // Editors often replace the file, so watch the parent directory.
        let parent = config_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();
        watcher.watch(&parent, RecursiveMode::NonRecursive)?;
        info!("Watching for changes to room configuration: {:?}", config_path);

        tokio::spawn(Self::run(watcher, rx, registry.clone(), config_path, reload_notifier));

        Ok(Self { registry })
    }

    pub fn registry(&self) -> &Arc<RoomRegistry> {
        &self.registry
    }

    async fn run(
        // Owned here so the OS watch lives as long as the task.
        _watcher: RecommendedWatcher,
        mut rx: mpsc::Receiver<Event>,
        registry: Arc<RoomRegistry>,
        config_path: PathBuf,
        reload_notifier: Option<mpsc::Sender<()>>,
    ) {
        while let Some(event) = rx.recv().await {
            if !Self::should_reload(&event, &config_path) {
                continue;
            }

            info!("Room configuration change detected, reloading...");
            match Config::load_rooms(&config_path) {
                Ok(rooms) => {
                    if !Self::apply_reload(&registry, rooms) {
                        continue;
                    }
                    if let Some(ref notifier) = reload_notifier {
                        if notifier.send(()).await.is_err() {
                            warn!("Reload notifier channel closed");
                        }
                    }
                }
                Err(e) => {
                    error!("Failed to reload rooms, keeping previous set: {:#}", e);
                }
            }
        }
    }

    /// Installs a reloaded room set. An empty set never replaces a non-empty
    /// one: a file caught mid-write parses as `rooms = []`.
    fn apply_reload(registry: &RoomRegistry, rooms: Vec<Room>) -> bool {
        if rooms.is_empty() && !registry.is_empty() {
            warn!("Reloaded room configuration is empty, keeping {} rooms", registry.len());
            return false;
        }
        registry.replace_all(rooms);
        true
    }

    fn should_reload(event: &Event, config_path: &Path) -> bool {
        match event.kind {
            EventKind::Modify(_) | EventKind::Create(_) => event
                .paths
                .iter()
                .any(|p| p == config_path || p.file_name() == config_path.file_name()),
            _ => false,
        }
    }
}
