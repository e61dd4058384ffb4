//! YAML file source with optional change watching

use async_trait::async_trait;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tracing::{debug, error, info};

use super::ConfigSource;
use crate::error::{ConfigError, ConfigResult};
use crate::raw::{value_kind, RawMap};

/// Reads raw configuration from a YAML file
pub struct FileSource {
    path: PathBuf,
    location: String,
    watcher: Mutex<Option<RecommendedWatcher>>,
    changes: Arc<watch::Sender<u64>>,
}

impl FileSource {
    /// Create a source that reads `path` on every retrieval
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let (changes, _) = watch::channel(0);
        Self {
            location: path.display().to_string(),
            path,
            watcher: Mutex::new(None),
            changes: Arc::new(changes),
        }
    }

    /// Create a source that also watches `path` for changes
    pub fn watching(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let source = Self::new(path);

        let changes = source.changes.clone();
        let location = source.location.clone();
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if matches!(
                        event.kind,
                        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
                    ) {
                        debug!(target: "config_source", location = %location, "Config file changed");
                        changes.send_modify(|generation| *generation += 1);
                    }
                }
                Err(e) => error!(target: "config_source", location = %location, "Watch error: {}", e),
            },
            Config::default(),
        )
        .map_err(|e| ConfigError::source_error(&source.location, format!("failed to create watcher: {}", e)))?;

        watcher
            .watch(&source.path, RecursiveMode::NonRecursive)
            .map_err(|e| ConfigError::source_error(&source.location, format!("failed to watch: {}", e)))?;

        info!(target: "config_source", location = %source.location, "Watching config file");
        *source.lock_watcher() = Some(watcher);
        Ok(source)
    }

    /// Whether a watcher is currently held
    pub fn is_watching(&self) -> bool {
        self.lock_watcher().is_some()
    }

    fn lock_watcher(&self) -> std::sync::MutexGuard<'_, Option<RecommendedWatcher>> {
        // A poisoned lock only means a panic elsewhere; the watcher itself is intact.
        self.watcher.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl ConfigSource for FileSource {
    fn location(&self) -> &str {
        &self.location
    }

    async fn retrieve(&self) -> ConfigResult<RawMap> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| ConfigError::source_error(&self.location, e))?;

        let value: Value = serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::source_error(&self.location, e))?;

        match value {
            Value::Object(map) => Ok(map),
            Value::Null => Ok(RawMap::new()),
            other => Err(ConfigError::source_error(
                &self.location,
                format!("top level must be a map, got {}", value_kind(&other)),
            )),
        }
    }

    async fn close(&self) -> ConfigResult<()> {
        let watcher = self.lock_watcher().take();
        if let Some(mut watcher) = watcher {
            watcher.unwatch(&self.path).map_err(|e| {
                ConfigError::source_error(&self.location, format!("failed to stop watching: {}", e))
            })?;
            debug!(target: "config_source", location = %self.location, "Stopped watching config file");
        }
        Ok(())
    }

    fn watch(&self) -> Option<watch::Receiver<u64>> {
        if self.is_watching() {
            Some(self.changes.subscribe())
        } else {
            None
        }
    }
}
