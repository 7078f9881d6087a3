//! Single-file watching
//!
//! Watches the parent directory rather than the file itself: editors commonly
//! save by writing a temp file and renaming it over the original, which would
//! drop a watch placed on the old inode.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use notify::event::ModifyKind;
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::{EventKind, WatchEvent};

/// Reports changes to one file
pub struct FileWatcher {
    path: PathBuf,
    rx: mpsc::UnboundedReceiver<WatchEvent>,
    // Dropping the watcher stops event delivery
    _watcher: RecommendedWatcher,
}

impl FileWatcher {
    /// Start watching `path` (which must exist)
    pub fn new(path: &Path) -> Result<Self> {
        let path = path
            .canonicalize()
            .with_context(|| format!("Failed to resolve watched file: {}", path.display()))?;
        let dir = path
            .parent()
            .context("Watched file has no parent directory")?
            .to_path_buf();
        let file_name: OsString = path
            .file_name()
            .context("Watched path has no file name")?
            .to_os_string();

        let (tx, rx) = mpsc::unbounded_channel();
        let target = path.clone();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            let event = match res {
                Ok(event) => event,
                Err(e) => {
                    warn!("File watcher error: {}", e);
                    return;
                }
            };

            let Some(kind) = map_kind(&event.kind) else {
                return;
            };

            if event.paths.iter().any(|p| p.file_name() == Some(file_name.as_os_str())) {
                // Receiver gone means the watcher is being torn down
                let _ = tx.send(WatchEvent {
                    path: target.clone(),
                    kind,
                });
            }
        })
        .context("Failed to create file watcher")?;

        watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch directory: {}", dir.display()))?;

        debug!("Watching {}", path.display());

        Ok(Self {
            path,
            rx,
            _watcher: watcher,
        })
    }

    /// Canonical path of the watched file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Wait for the next change to the watched file
    pub async fn recv(&mut self) -> Option<WatchEvent> {
        self.rx.recv().await
    }
}

fn map_kind(kind: &notify::EventKind) -> Option<EventKind> {
    match kind {
        notify::EventKind::Create(_) => Some(EventKind::Create),
        notify::EventKind::Modify(ModifyKind::Name(_)) => Some(EventKind::Rename),
        notify::EventKind::Modify(_) => Some(EventKind::Modify),
        notify::EventKind::Remove(_) => Some(EventKind::Delete),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_map_kind() {
        use notify::event::{CreateKind, DataChange, RemoveKind, RenameMode};

        assert_eq!(map_kind(&notify::EventKind::Create(CreateKind::File)), Some(EventKind::Create));
        assert_eq!(
            map_kind(&notify::EventKind::Modify(ModifyKind::Data(DataChange::Content))),
            Some(EventKind::Modify)
        );
        assert_eq!(
            map_kind(&notify::EventKind::Modify(ModifyKind::Name(RenameMode::To))),
            Some(EventKind::Rename)
        );
        assert_eq!(map_kind(&notify::EventKind::Remove(RemoveKind::File)), Some(EventKind::Delete));
        assert_eq!(map_kind(&notify::EventKind::Any), None);
    }

    #[test]
    fn test_missing_file_rejected() {
        let temp_dir = TempDir::new().unwrap();
        assert!(FileWatcher::new(&temp_dir.path().join("missing.py")).is_err());
    }

    #[tokio::test]
    async fn test_reports_changes_to_watched_file_only() {
        let temp_dir = TempDir::new().unwrap();
        let watched = temp_dir.path().join("main.py");
        let other = temp_dir.path().join("other.py");
        fs::write(&watched, "x = 1\n").unwrap();

        let mut watcher = FileWatcher::new(&watched).unwrap();

        fs::write(&other, "ignored\n").unwrap();
        fs::write(&watched, "x = 2\n").unwrap();

        let event = tokio::time::timeout(Duration::from_secs(5), watcher.recv())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(event.path, watcher.path());
        assert!(event.path.ends_with("main.py"));
    }
}
