//! Change Event Dispatcher.
//!
//! Turns debounced [`WatchEvent`]s into remote operations:
//!
//! ```text
//! WatchEvent ──plan──► Option<Action> ──execute──► transform → read → upload
//!                                                         │
//!                                           ReloadSignal ◄┘ (success or failure)
//! ```
//!
//! `plan` is synchronous and owns the only dispatcher state: the scripts
//! ignore window and the set of artifacts this process removed itself.
//! `execute` never fails outward; failures become an `upload failed` /
//! `delete failed` outcome.

mod action;

#[cfg(test)]
mod tests;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::config::{StylesConfig, SyncConfig};
use crate::logger::{status_error, status_success};
use crate::remote::{AssetStore, read_file_then_upload};
use crate::resolve::{Layout, PathResolver, Resolved};
use crate::task::{LogKind, Task, TaskError, UploadJob, run_sequence, task};
use crate::transform::{ScriptMinifier, bundle_group, compile_styles};
use crate::watch::{EventKind, WatchEvent, WatchRoot};
use crate::{debug, log};

pub use action::{Action, full_sync_actions};

/// How long an own artifact removal waits for its unlink echo. The echo can
/// be lost when the debouncer folds an add and unlink of the artifact.
const SELF_REMOVAL_TTL: Duration = Duration::from_secs(2);

/// Result of one finished sync chain, handed to the reload signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    pub log_kind: LogKind,
    pub key: String,
}

/// Notified after every completed upload or delete chain.
pub trait ReloadSignal: Send + Sync {
    fn reload(&self, outcome: &SyncOutcome);
}

/// Reload signal for runs without a browser attached.
pub struct NoReload;

impl ReloadSignal for NoReload {
    fn reload(&self, _outcome: &SyncOutcome) {}
}

pub struct Dispatcher {
    resolver: PathResolver,
    store: Arc<dyn AssetStore>,
    reload: Arc<dyn ReloadSignal>,
    minifier: ScriptMinifier,
    styles: StylesConfig,
    /// Transient minified snippets; outside every watched root.
    inline_dir: PathBuf,
    ignore_window: Duration,
    ignore_until: Mutex<Option<Instant>>,
    /// Generated files this dispatcher deleted; their unlink is not synced again.
    self_removed: Mutex<FxHashMap<PathBuf, Instant>>,
}

impl Dispatcher {
    pub fn new(
        config: &SyncConfig,
        store: Arc<dyn AssetStore>,
        reload: Arc<dyn ReloadSignal>,
    ) -> Self {
        Self {
            resolver: PathResolver::new(Layout::from_config(config), config.upload.clone()),
            store,
            reload,
            minifier: ScriptMinifier::new(&config.scripts),
            styles: config.styles.clone(),
            inline_dir: config.cache_dir().join("inline"),
            ignore_window: config.scripts.ignore_window(),
            ignore_until: Mutex::new(None),
            self_removed: Mutex::new(FxHashMap::default()),
        }
    }

    pub fn layout(&self) -> &Layout {
        self.resolver.layout()
    }

    /// Style entry file inside the styles root.
    pub fn style_entry(&self) -> PathBuf {
        self.layout().styles.join(&self.styles.entry)
    }

    /// Every upload a full push performs.
    pub fn full_sync_actions(&self) -> Vec<Action> {
        full_sync_actions(&self.resolver, &self.style_entry())
    }

    // ========================================================================
    // planning
    // ========================================================================

    /// Decide what `event` requires. `None` is a no-op.
    pub fn plan(&self, event: &WatchEvent) -> Option<Action> {
        if event.kind == EventKind::Unlink && self.take_self_removed(&event.path) {
            debug!("dispatch"; "own removal of {}", event.path.display());
            return None;
        }

        if event.root == WatchRoot::Scripts {
            let now = Instant::now();
            let mut ignore_until = self.ignore_until.lock();
            if event.kind.is_dir() {
                *ignore_until = Some(now + self.ignore_window);
            } else if ignore_until.is_some_and(|until| now < until) {
                debug!("dispatch"; "ignored {} {} (directory event window)", event.kind, event.path.display());
                return None;
            }
        }

        match self.resolver.resolve_in(event.root, &event.path, event.kind) {
            Resolved::Sync(resolution) => {
                if resolution.requires_transform() {
                    debug!("dispatch"; "{} {} → {:?}{}",
                        event.kind,
                        event.path.display(),
                        resolution.transform_kind(),
                        if resolution.is_group_operation() { " (group)" } else { "" });
                }
                action::action_for(self.layout(), resolution, &event.path, event.kind)
            }
            Resolved::Skip(reason) => {
                debug!("dispatch"; "skip {} {}: {}", event.kind, event.path.display(), reason);
                None
            }
        }
    }

    fn take_self_removed(&self, path: &Path) -> bool {
        let now = Instant::now();
        let mut removed = self.self_removed.lock();
        removed.retain(|_, at| now.duration_since(*at) < SELF_REMOVAL_TTL);
        removed.remove(path).is_some()
    }

    // ========================================================================
    // execution
    // ========================================================================

    /// Run `action`, log the outcome and signal reload. Never fails outward.
    pub async fn execute(&self, action: Action) -> SyncOutcome {
        let success = action.log_kind();
        let key = action.key().to_string();

        let log_kind = match self.perform(action).await {
            Ok(log_kind) => {
                status_success(&format!("{log_kind} {key}"));
                log_kind
            }
            Err(e) => {
                let failed = success.failed();
                status_error(&format!("{failed}: {key}"), &e.to_string());
                failed
            }
        };

        let outcome = SyncOutcome { log_kind, key };
        let reload = Arc::clone(&self.reload);
        let signalled = outcome.clone();
        if let Err(e) = tokio::task::spawn_blocking(move || reload.reload(&signalled)).await {
            debug!("dispatch"; "reload signal aborted: {}", e);
        }
        outcome
    }

    /// Run `action` without logging or signalling reload.
    pub async fn perform(&self, action: Action) -> Result<LogKind, TaskError> {
        match action {
            Action::UploadScript { source, key } => {
                let minifier = self.minifier.clone();
                let prepare = blocking_step(move || {
                    let text = read_text(&source)?;
                    minifier.minify(&text)
                });
                let artifact = self.layout().theme_path(&key);
                self.transform_then_upload(UploadJob::new(key, artifact, false), prepare)
                    .await
            }

            Action::PackageGroup { group, key } => {
                let group_dir = self.layout().group_dir(&group);
                if !group_dir.is_dir() {
                    let artifact = Some(self.layout().theme_path(&key));
                    return self.delete(&key, artifact).await;
                }
                let order_file = self.layout().order_file.clone();
                let minifier = self.minifier.clone();
                let prepare = blocking_step(move || {
                    let bundle = bundle_group(&group_dir, &order_file)?;
                    minifier.minify(&bundle)
                });
                let artifact = self.layout().theme_path(&key);
                self.transform_then_upload(UploadJob::new(key, artifact, false), prepare)
                    .await
            }

            Action::CompileStyles { key } => {
                let styles = self.styles.clone();
                let root = self.layout().styles.clone();
                let prepare = blocking_step(move || compile_styles(&styles, &root));
                let artifact = self.layout().theme_path(&key);
                self.transform_then_upload(UploadJob::new(key, artifact, false), prepare)
                    .await
            }

            Action::UploadThemeFile {
                source,
                key,
                is_binary,
            } => {
                let job = UploadJob::new(key, source, is_binary);
                let job = read_file_then_upload(Arc::clone(&self.store), job).await?;
                Ok(job.log_kind)
            }

            Action::UploadInlineScript { source, key } => {
                let Some(name) = source.file_name() else {
                    return Err(TaskError::failed(format!(
                        "no file name in {}",
                        source.display()
                    )));
                };
                let artifact = self.inline_dir.join(name);
                let minifier = self.minifier.clone();
                let prepare = blocking_step(move || {
                    let text = read_text(&source)?;
                    Ok(minifier.minify_inline(&text))
                });
                let result = self
                    .transform_then_upload(UploadJob::new(key, artifact.clone(), false), prepare)
                    .await;
                remove_artifact(&artifact).await;
                result
            }

            Action::Delete { key, artifact } => self.delete(&key, artifact).await,
        }
    }

    /// `prepare` writes the transformed output to `job.source`, which is
    /// then read and uploaded.
    async fn transform_then_upload(
        &self,
        job: UploadJob,
        prepare: Task<UploadJob>,
    ) -> Result<LogKind, TaskError> {
        let store = Arc::clone(&self.store);
        let upload = task(move |job: UploadJob| read_file_then_upload(store, job));
        let job = run_sequence(vec![prepare, upload], job).await?;
        Ok(job.log_kind)
    }

    async fn delete(&self, key: &str, artifact: Option<PathBuf>) -> Result<LogKind, TaskError> {
        let remote = self.store.delete_asset(key).await;

        if let Some(artifact) = artifact
            && artifact.exists()
        {
            self.self_removed.lock().insert(artifact.clone(), Instant::now());
            remove_artifact(&artifact).await;
        }

        remote?;
        Ok(LogKind::Deleted)
    }

    /// Consume watch events until the watcher stops, then wait for the
    /// actions still in flight.
    ///
    /// Each action runs on its own task so a slow upload never delays
    /// the next event. Actions for the same remote key run one after
    /// another, in event order.
    pub async fn run(self, mut events: mpsc::Receiver<WatchEvent>) {
        let this = Arc::new(self);
        let mut in_flight: FxHashMap<String, JoinHandle<()>> = FxHashMap::default();
        while let Some(event) = events.recv().await {
            let Some(action) = this.plan(&event) else {
                continue;
            };
            debug!("dispatch"; "{:?}", action);
            in_flight.retain(|_, handle| !handle.is_finished());

            let key = action.key().to_string();
            let previous = in_flight.remove(&key);
            let this = Arc::clone(&this);
            let handle = tokio::spawn(async move {
                if let Some(previous) = previous {
                    previous.await.ok();
                }
                this.execute(action).await;
            });
            in_flight.insert(key, handle);
        }
        for (_, handle) in in_flight {
            handle.await.ok();
        }
    }
}

/// A sequence step that runs a blocking transform and writes its output
/// to `job.source`.
fn blocking_step<F>(transform: F) -> Task<UploadJob>
where
    F: FnOnce() -> anyhow::Result<String> + Send + 'static,
{
    task(move |job: UploadJob| async move {
        let output = tokio::task::spawn_blocking(transform)
            .await
            .map_err(|e| TaskError::Aborted(e.to_string()))??;
        write_artifact(&job.source, output).await?;
        Ok(job)
    })
}

fn read_text(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

async fn write_artifact(path: &Path, content: String) -> Result<(), TaskError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| TaskError::io(format!("failed to create {}", parent.display()), e))?;
    }
    tokio::fs::write(path, content)
        .await
        .map_err(|e| TaskError::io(format!("failed to write {}", path.display()), e))
}

/// Non-critical cleanup: failures are logged only.
async fn remove_artifact(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await
        && e.kind() != std::io::ErrorKind::NotFound
    {
        log!("dispatch"; "failed to remove {}: {}", path.display(), e);
    }
}
