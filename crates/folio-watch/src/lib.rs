//! File watching and rebuild scheduling for folio.
//!
//! Watches template and data files and reruns the site build on change,
//! with at most one build running and one waiting at any time.

pub mod controller;
pub mod watcher;

pub use controller::{watch, BuildSlot, Rebuild, WatchController, WatchError, WatchState};
pub use watcher::{FileWatcher, WatchEvent, WatchScope};
