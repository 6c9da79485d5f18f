// src/watch/watcher.rs

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::engine::RuntimeEvent;
use crate::watch::hash::ChangeCache;
use crate::watch::patterns::SourceSet;

/// A watch binding's matching side: the index of the binding in the runtime
/// plus the patterns that select its input files.
#[derive(Debug, Clone)]
pub struct WatchProfile {
    pub binding: usize,
    pub sources: SourceSet,
}

/// Knobs for event coalescing.
#[derive(Debug, Clone)]
pub struct WatcherOptions {
    /// Quiet window before accumulated events are flushed as triggers.
    pub debounce: Duration,
    /// Suppress triggers whose files hash identically to the last observation.
    pub use_hash: bool,
}

/// Handle for the filesystem watcher.
///
/// This exists mainly so the underlying `RecommendedWatcher` is kept alive for
/// as long as needed. Dropping this handle will stop file watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// Spawn a filesystem watcher that observes the source root recursively and
/// sends `RuntimeEvent::BindingTriggered` for bindings whose patterns match
/// a changed path. The root may be absolute or outside the cwd; binding
/// patterns are matched against paths relative to it.
///
/// Events are accumulated until the debounce window has been quiet, then
/// flushed as at most one trigger per binding. With `use_hash`, a flush whose
/// files all hash identically to the last observed content is dropped.
pub fn spawn_watcher(
    root: impl Into<PathBuf>,
    profiles: Vec<WatchProfile>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    options: WatcherOptions,
) -> Result<WatcherHandle> {
    let root = root.into();
    let root = root.canonicalize().unwrap_or_else(|_| root.clone()); // best-effort

    // Channel from the blocking notify callback into the async world.
    let (event_tx, event_rx) = mpsc::unbounded_channel::<Event>();

    // Closure called synchronously by notify whenever an event arrives.
    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if let Err(err) = event_tx.send(event) {
                    warn!("failed to forward notify event: {err}");
                }
            }
            Err(err) => {
                error!("file watch error: {err}");
            }
        },
        Config::default(),
    )?;

    watcher.watch(&root, RecursiveMode::Recursive)?;

    info!("file watcher started on {:?}", root);

    tokio::spawn(watch_loop(root, profiles, event_rx, runtime_tx, options));

    Ok(WatcherHandle { _inner: watcher })
}

/// Async loop that consumes notify events, coalesces them, and forwards
/// binding triggers to the runtime.
async fn watch_loop(
    root: PathBuf,
    profiles: Vec<WatchProfile>,
    mut event_rx: mpsc::UnboundedReceiver<Event>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    options: WatcherOptions,
) {
    let mut cache = ChangeCache::new();

    // Accumulated absolute paths per binding index, flushed after a quiet gap.
    let mut pending: HashMap<usize, HashSet<PathBuf>> = HashMap::new();

    loop {
        tokio::select! {
            event = event_rx.recv() => {
                match event {
                    Some(event) => accumulate(&root, &profiles, &event, &mut pending),
                    None => break,
                }
            }
            _ = tokio::time::sleep(options.debounce), if !pending.is_empty() => {
                let batch = std::mem::take(&mut pending);
                for (binding, paths) in batch {
                    if options.use_hash && !any_content_changed(&mut cache, &paths) {
                        debug!(binding, "all matched files unchanged; dropping trigger");
                        continue;
                    }

                    if runtime_tx
                        .send(RuntimeEvent::BindingTriggered { binding })
                        .await
                        .is_err()
                    {
                        // Runtime gone; no point keeping the loop alive.
                        warn!("runtime channel closed; stopping file watcher loop");
                        return;
                    }
                }
            }
        }
    }

    debug!("file watcher loop ended");
}

/// Record which bindings are interested in the paths of one notify event.
fn accumulate(
    root: &Path,
    profiles: &[WatchProfile],
    event: &Event,
    pending: &mut HashMap<usize, HashSet<PathBuf>>,
) {
    if matches!(event.kind, EventKind::Access(_)) {
        return;
    }

    debug!("received notify event: {:?}", event);

    for path in &event.paths {
        for binding in matching_bindings(root, profiles, path) {
            debug!(binding, path = ?path, "watch match");
            pending.entry(binding).or_default().insert(path.clone());
        }
    }
}

/// Indices of the bindings whose patterns select the given event path,
/// matched relative to the watched root. A path outside the root matches
/// nothing.
pub fn matching_bindings(root: &Path, profiles: &[WatchProfile], path: &Path) -> Vec<usize> {
    let Ok(rel) = path.strip_prefix(root) else {
        return Vec::new();
    };

    profiles
        .iter()
        .filter(|profile| profile.sources.matches(rel))
        .map(|profile| profile.binding)
        .collect()
}

/// Run every path through the cache so each observation is recorded, and
/// report whether any content actually changed.
fn any_content_changed(cache: &mut ChangeCache, paths: &HashSet<PathBuf>) -> bool {
    let mut changed = false;
    for path in paths {
        changed |= cache.is_changed(path);
    }
    changed
}
