//! File watching for rebuilds.

use std::path::{Path, PathBuf};
use std::sync::mpsc;

use folio_static::BuildConfig;
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc as async_mpsc;

/// Path component that is never watched.
pub const IGNORED_COMPONENT: &str = "node_modules";

const TEMPLATE_EXTENSION: &str = "hbs";
const DATA_EXTENSION: &str = "json";

/// Events emitted by the file watcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// Subscriptions are in place
    Ready,

    /// A tracked template or data file changed
    Changed(PathBuf),
}

/// Which paths trigger a rebuild.
#[derive(Debug, Clone)]
pub struct WatchScope {
    /// Project root, used for relative log paths
    pub root: PathBuf,

    /// Templates directory, watched recursively
    pub templates_dir: PathBuf,

    /// Data directory, top-level files only
    pub data_dir: PathBuf,
}

impl WatchScope {
    /// Scope for a build config, with paths made absolute to match event paths.
    pub fn from_config(config: &BuildConfig) -> Self {
        let root = config
            .root
            .canonicalize()
            .unwrap_or_else(|_| config.root.clone());

        Self {
            templates_dir: root.join(&config.templates_dir),
            data_dir: root.join(&config.data_dir),
            root,
        }
    }

    /// Whether a change to `path` should trigger a rebuild.
    pub fn tracks(&self, path: &Path) -> bool {
        if path.components().any(|c| c.as_os_str() == IGNORED_COMPONENT) {
            return false;
        }

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        if ext == TEMPLATE_EXTENSION && path.starts_with(&self.templates_dir) {
            return true;
        }

        ext == DATA_EXTENSION && path.parent() == Some(self.data_dir.as_path())
    }

    /// Format `path` relative to the project root for display.
    pub fn relative(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .display()
            .to_string()
    }
}

/// File watcher for template and data changes.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
}

impl FileWatcher {
    /// Create a new file watcher for the given scope.
    ///
    /// Returns the watcher and a channel to receive events. The channel
    /// yields [`WatchEvent::Ready`] first, once every subscription is active.
    pub fn new(
        scope: &WatchScope,
    ) -> Result<(Self, async_mpsc::Receiver<WatchEvent>), notify::Error> {
        let (sync_tx, sync_rx) = mpsc::channel();
        let (async_tx, async_rx) = async_mpsc::channel(100);

        let mut watcher = notify::recommended_watcher(move |res: Result<notify::Event, _>| {
            if let Ok(event) = res {
                let _ = sync_tx.send(event);
            }
        })?;

        if scope.templates_dir.exists() {
            watcher.watch(&scope.templates_dir, RecursiveMode::Recursive)?;
        }
        if scope.data_dir.exists() {
            watcher.watch(&scope.data_dir, RecursiveMode::NonRecursive)?;
        }

        // Channel was just created, so this cannot be full
        let _ = async_tx.try_send(WatchEvent::Ready);

        // Forward matching events
        let forward_scope = scope.clone();
        std::thread::spawn(move || {
            while let Ok(event) = sync_rx.recv() {
                for path in event.paths {
                    if let Some(e) = classify_event(&forward_scope, &path, &event.kind) {
                        if async_tx.blocking_send(e).is_err() {
                            return;
                        }
                    }
                }
            }
        });

        Ok((Self { _watcher: watcher }, async_rx))
    }
}

/// Classify a notify event into a WatchEvent.
fn classify_event(scope: &WatchScope, path: &Path, kind: &EventKind) -> Option<WatchEvent> {
    match kind {
        EventKind::Create(_) | EventKind::Modify(_) if scope.tracks(path) => {
            Some(WatchEvent::Changed(path.to_path_buf()))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, DataChange, ModifyKind, RemoveKind};
    use std::fs;
    use std::time::Duration;
    use tempfile::tempdir;

    fn scope(root: &Path) -> WatchScope {
        WatchScope {
            root: root.to_path_buf(),
            templates_dir: root.join("templates"),
            data_dir: root.join("data"),
        }
    }

    #[test]
    fn tracks_templates_recursively() {
        let scope = scope(Path::new("/site"));
        assert!(scope.tracks(Path::new("/site/templates/layout.hbs")));
        assert!(scope.tracks(Path::new("/site/templates/partials/nav.hbs")));
        assert!(!scope.tracks(Path::new("/site/templates/notes.md")));
    }

    #[test]
    fn tracks_only_top_level_data() {
        let scope = scope(Path::new("/site"));
        assert!(scope.tracks(Path::new("/site/data/projects.json")));
        assert!(!scope.tracks(Path::new("/site/data/archive/old.json")));
        assert!(!scope.tracks(Path::new("/site/package.json")));
    }

    #[test]
    fn ignores_dependency_cache() {
        let scope = scope(Path::new("/site"));
        assert!(!scope.tracks(Path::new("/site/templates/node_modules/x/a.hbs")));
    }

    #[test]
    fn classifies_only_writes() {
        let scope = scope(Path::new("/site"));
        let path = Path::new("/site/data/site.json");

        let modify = EventKind::Modify(ModifyKind::Data(DataChange::Content));
        assert_eq!(
            classify_event(&scope, path, &modify),
            Some(WatchEvent::Changed(path.to_path_buf()))
        );
        assert!(classify_event(&scope, path, &EventKind::Create(CreateKind::File)).is_some());
        assert!(classify_event(&scope, path, &EventKind::Remove(RemoveKind::File)).is_none());
        assert!(classify_event(&scope, path, &EventKind::Access(AccessKind::Any)).is_none());
    }

    #[test]
    fn relative_paths_strip_root() {
        let scope = scope(Path::new("/site"));
        assert_eq!(
            scope.relative(Path::new("/site/templates/layout.hbs")),
            Path::new("templates").join("layout.hbs").display().to_string()
        );
    }

    #[tokio::test]
    async fn emits_ready_then_changes() {
        let temp = tempdir().unwrap();
        // Canonicalize so event paths match on platforms with symlinked temp dirs
        let root = temp.path().canonicalize().unwrap();
        fs::create_dir_all(root.join("templates")).unwrap();
        fs::create_dir_all(root.join("data")).unwrap();

        let (watcher, mut rx) = FileWatcher::new(&scope(&root)).unwrap();
        assert_eq!(rx.recv().await, Some(WatchEvent::Ready));

        // Give inotify time to set up
        tokio::time::sleep(Duration::from_millis(100)).await;

        fs::write(root.join("templates/layout.hbs"), "<html></html>").unwrap();

        let event = tokio::time::timeout(Duration::from_secs(3), rx.recv()).await;

        // Keep watcher alive until we're done
        drop(watcher);

        assert!(event.is_ok(), "timeout waiting for file watch event");
        assert!(matches!(event.unwrap(), Some(WatchEvent::Changed(_))));
    }
}
