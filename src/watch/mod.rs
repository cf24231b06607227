//! File-system watching for the three source roots.
//!
//! Implements the "Watcher-First" pattern: the notify watcher is attached
//! before anything else runs, so no change made during start-up is lost.
//!
//! ```text
//! notify (sync callback) → std channel → bridge thread → tokio channel
//!     → EventMapper (add/change/unlink/addDir/unlinkDir)
//!     → Debouncer (dedup per path, first-seen order)
//!     → WatchEvent { root, kind, path }
//! ```

mod debouncer;
mod mapper;
mod types;


use std::sync::mpsc as std_mpsc;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::resolve::Layout;
use crate::watch::debouncer::Debouncer;
use crate::watch::mapper::EventMapper;
use crate::{debug, log};

pub use types::{EventKind, WatchEvent, WatchRoot};

/// Watches the scripts, styles and theme roots.
pub struct FileWatcher {
    /// Channel to receive notify events (sync -> async bridge)
    notify_rx: std_mpsc::Receiver<notify::Result<notify::Event>>,
    /// Watcher handle (must be kept alive)
    _watcher: RecommendedWatcher,
    mapper: EventMapper,
    debouncer: Debouncer,
}

impl FileWatcher {
    /// Attach the watcher to every root immediately.
    ///
    /// Events buffer in the channel until [`FileWatcher::run`] is polled.
    pub fn new(layout: Layout) -> notify::Result<Self> {
        let (notify_tx, notify_rx) = std_mpsc::channel();

        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = notify_tx.send(res);
        })?;

        for root in [WatchRoot::Scripts, WatchRoot::Styles, WatchRoot::Theme] {
            let path = layout.root_path(root);
            watcher.watch(path, RecursiveMode::Recursive)?;
            debug!("watch"; "watching {} root {}", root.label(), path.display());
        }

        Ok(Self {
            notify_rx,
            _watcher: watcher,
            mapper: EventMapper::new(layout),
            debouncer: Debouncer::new(),
        })
    }

    /// Forward debounced events to `tx` until the receiver is dropped.
    pub async fn run(self, tx: mpsc::Sender<WatchEvent>) {
        let Self {
            notify_rx,
            _watcher,
            mut mapper,
            mut debouncer,
        } = self;

        let (async_tx, mut async_rx) = mpsc::channel::<notify::Event>(256);

        std::thread::spawn(move || {
            while let Ok(result) = notify_rx.recv() {
                match result {
                    Ok(event) => {
                        if async_tx.blocking_send(event).is_err() {
                            break; // Receiver dropped
                        }
                    }
                    Err(e) => log!("watch"; "notify error: {}", e),
                }
            }
        });

        loop {
            tokio::select! {
                biased;
                event = async_rx.recv() => match event {
                    Some(event) => {
                        for (path, kind) in mapper.map(&event) {
                            debouncer.add(path, kind);
                        }
                    }
                    None => break,
                },
                _ = tokio::time::sleep(debouncer.sleep_duration()) => {
                    if let Some(batch) = debouncer.take_if_ready()
                        && !forward(&mapper, batch, &tx).await
                    {
                        return;
                    }
                }
            }
        }

        if let Some(batch) = debouncer.take_all() {
            forward(&mapper, batch, &tx).await;
        }
    }
}

/// Tag and send a batch. Returns `false` once the receiver is gone.
async fn forward(
    mapper: &EventMapper,
    batch: Vec<(std::path::PathBuf, EventKind)>,
    tx: &mpsc::Sender<WatchEvent>,
) -> bool {
    for (path, kind) in batch {
        let Some(root) = mapper.layout().root_of(&path) else {
            continue;
        };
        debug!("watch"; "{} {}", kind, path.display());
        if tx.send(WatchEvent::new(root, kind, path)).await.is_err() {
            return false;
        }
    }
    true
}
