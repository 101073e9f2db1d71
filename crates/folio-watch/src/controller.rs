//! Watch loop that turns file events into serialized rebuilds.

use std::future::Future;
use std::path::PathBuf;

use folio_static::SiteBuilder;
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::watcher::{FileWatcher, WatchEvent, WatchScope};

/// Errors that can occur while watching.
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("Already watching")]
    AlreadyWatching,

    #[error("File watch error: {0}")]
    Notify(#[from] notify::Error),

    #[error("Build worker stopped unexpectedly: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

/// Something that can run a full rebuild.
pub trait Rebuild: Send + 'static {
    fn rebuild(&mut self) -> impl Future<Output = ()> + Send;
}

impl Rebuild for SiteBuilder {
    /// Reload sources from disk, then run a build pass.
    ///
    /// Failures are logged by the builder and do not stop the watcher.
    fn rebuild(&mut self) -> impl Future<Output = ()> + Send {
        async move {
            if let Err(e) = self.reload() {
                tracing::error!("Build failed: {}", e);
                return;
            }
            let _ = self.build().await;
        }
    }
}

/// Lifecycle of a [`WatchController`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    /// No subscriptions yet
    Idle,

    /// Subscribed to file changes
    Watching,
}

/// Single pending-build slot.
///
/// A request made while a build is running waits in the slot. Requests made
/// while the slot is already full are folded into the pending one.
#[derive(Debug, Clone)]
pub struct BuildSlot {
    tx: mpsc::Sender<()>,
}

impl BuildSlot {
    pub fn channel() -> (Self, mpsc::Receiver<()>) {
        let (tx, rx) = mpsc::channel(1);
        (Self { tx }, rx)
    }

    /// Ask for a build. Returns `false` if it merged into a pending request.
    pub fn request(&self) -> bool {
        match self.tx.try_send(()) {
            Ok(()) => true,
            Err(TrySendError::Full(())) => false,
            Err(TrySendError::Closed(())) => {
                tracing::debug!("Build worker is gone; dropping request");
                false
            }
        }
    }
}

/// Rebuilds the site whenever tracked files change.
pub struct WatchController<R> {
    rebuilder: R,
    root: PathBuf,
    state: WatchState,
    watcher: Option<FileWatcher>,
}

impl<R: Rebuild> WatchController<R> {
    pub fn new(rebuilder: R, root: impl Into<PathBuf>) -> Self {
        Self {
            rebuilder,
            root: root.into(),
            state: WatchState::Idle,
            watcher: None,
        }
    }

    pub fn state(&self) -> WatchState {
        self.state
    }

    /// Subscribe to changes in `scope`.
    pub fn subscribe(
        &mut self,
        scope: &WatchScope,
    ) -> Result<mpsc::Receiver<WatchEvent>, WatchError> {
        if self.state == WatchState::Watching {
            return Err(WatchError::AlreadyWatching);
        }

        let (watcher, rx) = FileWatcher::new(scope)?;
        self.root = scope.root.clone();
        self.watcher = Some(watcher);
        self.state = WatchState::Watching;

        tracing::info!("Watching for changes...");
        Ok(rx)
    }

    /// Process events until the channel closes, then finish pending builds.
    ///
    /// Returns the rebuilder once the build worker has drained.
    pub async fn run(self, mut events: mpsc::Receiver<WatchEvent>) -> Result<R, WatchError> {
        let Self {
            mut rebuilder,
            root,
            watcher,
            ..
        } = self;

        let (slot, mut requests) = BuildSlot::channel();
        let worker = tokio::spawn(async move {
            while requests.recv().await.is_some() {
                rebuilder.rebuild().await;
            }
            rebuilder
        });

        while let Some(event) = events.recv().await {
            match event {
                WatchEvent::Ready => {
                    tracing::info!("Initial scan complete. Ready for changes.");
                }
                WatchEvent::Changed(path) => {
                    let shown = path.strip_prefix(&root).unwrap_or(&path);
                    tracing::info!("File changed: {}", shown.display());
                }
            }

            if !slot.request() {
                tracing::debug!("Build already pending");
            }
        }

        drop(slot);
        drop(watcher);
        Ok(worker.await?)
    }
}

/// Watch the builder's sources and rebuild on every change.
///
/// Runs until the process exits.
pub async fn watch(builder: SiteBuilder) -> Result<(), WatchError> {
    let scope = WatchScope::from_config(builder.config());
    let mut controller = WatchController::new(builder, &scope.root);
    let events = controller.subscribe(&scope)?;
    controller.run(events).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::tempdir;

    #[derive(Clone, Default)]
    struct CountingRebuild {
        builds: Arc<AtomicUsize>,
    }

    impl Rebuild for CountingRebuild {
        fn rebuild(&mut self) -> impl Future<Output = ()> + Send {
            let builds = Arc::clone(&self.builds);
            async move {
                builds.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    async fn wait_for(builds: &AtomicUsize, expected: usize) {
        tokio::time::timeout(Duration::from_secs(3), async {
            while builds.load(Ordering::SeqCst) < expected {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("timeout waiting for build");
    }

    #[test]
    fn slot_holds_one_pending_request() {
        let (slot, mut rx) = BuildSlot::channel();

        assert!(slot.request());
        assert!(!slot.request());
        assert!(!slot.request());

        // Worker takes the request and starts building
        assert!(rx.try_recv().is_ok());
        assert!(slot.request());
        assert!(!slot.request());
    }

    #[tokio::test]
    async fn ready_triggers_initial_build() {
        let rebuild = CountingRebuild::default();
        let builds = Arc::clone(&rebuild.builds);
        let controller = WatchController::new(rebuild, "/site");

        let (tx, rx) = mpsc::channel(8);
        tx.send(WatchEvent::Ready).await.unwrap();
        drop(tx);

        controller.run(rx).await.unwrap();
        assert_eq!(builds.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn change_after_ready_triggers_one_more_build() {
        let rebuild = CountingRebuild::default();
        let builds = Arc::clone(&rebuild.builds);
        let controller = WatchController::new(rebuild, "/site");

        let (tx, rx) = mpsc::channel(8);
        let run = tokio::spawn(controller.run(rx));

        tx.send(WatchEvent::Ready).await.unwrap();
        wait_for(&builds, 1).await;

        tx.send(WatchEvent::Changed(PathBuf::from("/site/templates/layout.hbs")))
            .await
            .unwrap();
        drop(tx);

        run.await.unwrap().unwrap();
        assert_eq!(builds.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn subscribe_moves_to_watching() {
        let temp = tempdir().unwrap();
        let root = temp.path().canonicalize().unwrap();
        std::fs::create_dir_all(root.join("templates")).unwrap();

        let scope = WatchScope {
            root: root.clone(),
            templates_dir: root.join("templates"),
            data_dir: root.join("data"),
        };

        let mut controller = WatchController::new(CountingRebuild::default(), &root);
        assert_eq!(controller.state(), WatchState::Idle);

        let mut events = controller.subscribe(&scope).unwrap();
        assert_eq!(controller.state(), WatchState::Watching);
        assert_eq!(events.recv().await, Some(WatchEvent::Ready));

        assert!(matches!(
            controller.subscribe(&scope),
            Err(WatchError::AlreadyWatching)
        ));
    }
}
