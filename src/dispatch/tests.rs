use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tempfile::TempDir;

use super::*;
use crate::remote::RemoteError;
use crate::transform::minify_js;

#[derive(Default)]
struct Recorder {
    writes: Mutex<Vec<(String, String, bool)>>,
    deletes: Mutex<Vec<String>>,
    fail_writes: bool,
    /// Delays the first write, so a later one would overtake it.
    slow_first_write: Option<Duration>,
    trace: Mutex<Vec<&'static str>>,
}

#[async_trait]
impl AssetStore for Recorder {
    async fn write_asset(
        &self,
        key: &str,
        content: &str,
        is_binary: bool,
    ) -> Result<(), RemoteError> {
        if self.fail_writes {
            return Err(RemoteError::WriteFailed {
                status: 422,
                body: "invalid liquid".into(),
            });
        }
        let first = {
            let mut trace = self.trace.lock();
            trace.push("start");
            trace.len() == 1
        };
        if first && let Some(delay) = self.slow_first_write {
            tokio::time::sleep(delay).await;
        }
        self.trace.lock().push("end");
        self.writes
            .lock()
            .push((key.to_string(), content.to_string(), is_binary));
        Ok(())
    }

    async fn delete_asset(&self, key: &str) -> Result<(), RemoteError> {
        self.deletes.lock().push(key.to_string());
        Ok(())
    }
}

#[derive(Default)]
struct Signals(Mutex<Vec<SyncOutcome>>);

impl ReloadSignal for Signals {
    fn reload(&self, outcome: &SyncOutcome) {
        self.0.lock().push(outcome.clone());
    }
}

struct Fixture {
    _dir: TempDir,
    root: PathBuf,
    store: Arc<Recorder>,
    signals: Arc<Signals>,
    dispatcher: Dispatcher,
}

impl Fixture {
    fn new() -> Self {
        Self::with_store(Recorder::default())
    }

    fn with_store(store: Recorder) -> Self {
        let dir = TempDir::new().unwrap();
        let root = dir.path().canonicalize().unwrap();
        for sub in ["scripts", "styles", "theme/assets", "theme/snippets"] {
            fs::create_dir_all(root.join(sub)).unwrap();
        }

        let mut config = SyncConfig {
            root: root.clone(),
            ..Default::default()
        };
        config.paths.scripts = root.join("scripts");
        config.paths.styles = root.join("styles");
        config.paths.theme = root.join("theme");
        config.styles.compiler = vec!["cat".into()];
        config.styles.minify = false;

        let store = Arc::new(store);
        let signals = Arc::new(Signals::default());
        let dispatcher = Dispatcher::new(
            &config,
            Arc::clone(&store) as Arc<dyn AssetStore>,
            Arc::clone(&signals) as Arc<dyn ReloadSignal>,
        );

        Self {
            _dir: dir,
            root,
            store,
            signals,
            dispatcher,
        }
    }

    fn write(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    fn event(&self, root: WatchRoot, kind: EventKind, rel: &str) -> WatchEvent {
        WatchEvent::new(root, kind, self.root.join(rel))
    }

    fn writes(&self) -> Vec<(String, String, bool)> {
        self.store.writes.lock().clone()
    }

    fn signals(&self) -> Vec<SyncOutcome> {
        self.signals.0.lock().clone()
    }
}

#[tokio::test]
async fn test_changed_script_is_minified_uploaded_and_reloaded() {
    let fx = Fixture::new();
    let source = "var total = 1 + 2;\nfunction checkout() { return total; }\n";
    fx.write("scripts/checkout.js", source);

    let event = fx.event(WatchRoot::Scripts, EventKind::Change, "scripts/checkout.js");
    let action = fx.dispatcher.plan(&event).unwrap();
    assert_eq!(
        action,
        Action::UploadScript {
            source: fx.root.join("scripts/checkout.js"),
            key: "assets/checkout.min.js".into(),
        }
    );

    let outcome = fx.dispatcher.execute(action).await;
    assert_eq!(outcome.log_kind, LogKind::Uploaded);

    let expected = minify_js(source).unwrap();
    assert_eq!(
        fx.writes(),
        vec![("assets/checkout.min.js".to_string(), expected.clone(), false)]
    );
    assert_eq!(
        fs::read_to_string(fx.root.join("theme/assets/checkout.min.js")).unwrap(),
        expected
    );
    assert_eq!(
        fx.signals(),
        vec![SyncOutcome {
            log_kind: LogKind::Uploaded,
            key: "assets/checkout.min.js".into(),
        }]
    );
}

#[tokio::test]
async fn test_group_follows_order_manifest() {
    let fx = Fixture::new();
    fx.write("scripts/widgets/a.js", "window.a = 1;");
    fx.write("scripts/widgets/b.js", "window.b = 2;");
    fx.write("scripts/widgets/_script-order.js", "b, a");

    let event = fx.event(WatchRoot::Scripts, EventKind::Change, "scripts/widgets/a.js");
    let action = fx.dispatcher.plan(&event).unwrap();
    assert_eq!(
        action,
        Action::PackageGroup {
            group: "widgets".into(),
            key: "assets/widgets.min.js".into(),
        }
    );

    fx.dispatcher.execute(action).await;
    let writes = fx.writes();
    assert_eq!(writes.len(), 1);
    let content = &writes[0].1;
    assert!(content.find("window.b").unwrap() < content.find("window.a").unwrap());
}

#[tokio::test(start_paused = true)]
async fn test_directory_event_opens_ignore_window() {
    let fx = Fixture::new();
    fx.write("scripts/widgets/a.js", "window.a = 1;");

    let dir_event = fx.event(WatchRoot::Scripts, EventKind::AddDir, "scripts/widgets");
    let file_event = fx.event(WatchRoot::Scripts, EventKind::Add, "scripts/widgets/a.js");

    assert!(matches!(
        fx.dispatcher.plan(&dir_event),
        Some(Action::PackageGroup { .. })
    ));
    assert_eq!(fx.dispatcher.plan(&file_event), None);

    tokio::time::advance(Duration::from_millis(1001)).await;
    assert!(fx.dispatcher.plan(&file_event).is_some());
}

#[tokio::test(start_paused = true)]
async fn test_ignore_window_only_applies_to_scripts() {
    let fx = Fixture::new();
    fx.write("scripts/widgets/a.js", "window.a = 1;");
    fx.write("theme/snippets/card.liquid", "{{ card }}");

    let dir_event = fx.event(WatchRoot::Scripts, EventKind::AddDir, "scripts/widgets");
    fx.dispatcher.plan(&dir_event);

    let theme = fx.event(WatchRoot::Theme, EventKind::Change, "theme/snippets/card.liquid");
    assert_eq!(
        fx.dispatcher.plan(&theme),
        Some(Action::UploadThemeFile {
            source: fx.root.join("theme/snippets/card.liquid"),
            key: "snippets/card.liquid".into(),
            is_binary: false,
        })
    );
}

#[tokio::test]
async fn test_deleted_script_removes_remote_key_and_artifact_once() {
    let fx = Fixture::new();
    let artifact = fx.write("theme/assets/checkout.min.js", "min");

    let event = fx.event(WatchRoot::Scripts, EventKind::Unlink, "scripts/checkout.js");
    let action = fx.dispatcher.plan(&event).unwrap();
    assert_eq!(
        action,
        Action::Delete {
            key: "assets/checkout.min.js".into(),
            artifact: Some(artifact.clone()),
        }
    );

    let outcome = fx.dispatcher.execute(action).await;
    assert_eq!(outcome.log_kind, LogKind::Deleted);
    assert_eq!(*fx.store.deletes.lock(), vec!["assets/checkout.min.js"]);
    assert!(!artifact.exists());

    // The theme watcher then reports the artifact removal.
    let echo = fx.event(WatchRoot::Theme, EventKind::Unlink, "theme/assets/checkout.min.js");
    assert_eq!(fx.dispatcher.plan(&echo), None);
    // A later manual removal of the same file is synced.
    assert!(matches!(
        fx.dispatcher.plan(&echo),
        Some(Action::Delete { artifact: None, .. })
    ));
}

#[tokio::test(start_paused = true)]
async fn test_own_removal_is_forgotten_after_echo_window() {
    let fx = Fixture::new();
    let artifact = fx.write("theme/assets/checkout.min.js", "min");
    let action = Action::Delete {
        key: "assets/checkout.min.js".into(),
        artifact: Some(artifact),
    };
    fx.dispatcher.execute(action).await;

    // The echo never arrives; a user removal long after must still sync.
    tokio::time::advance(SELF_REMOVAL_TTL + Duration::from_millis(1)).await;
    let unlink = fx.event(WatchRoot::Theme, EventKind::Unlink, "theme/assets/checkout.min.js");
    assert!(matches!(
        fx.dispatcher.plan(&unlink),
        Some(Action::Delete { artifact: None, .. })
    ));
}

#[tokio::test]
async fn test_changes_to_one_key_finish_in_order() {
    let fx = Fixture::with_store(Recorder {
        slow_first_write: Some(Duration::from_millis(200)),
        ..Default::default()
    });
    fx.write("theme/snippets/card.liquid", "{{ card }}");
    let change = fx.event(WatchRoot::Theme, EventKind::Change, "theme/snippets/card.liquid");

    let Fixture {
        _dir,
        store,
        dispatcher,
        ..
    } = fx;
    let (tx, rx) = mpsc::channel(4);
    tx.send(change.clone()).await.unwrap();
    tx.send(change).await.unwrap();
    drop(tx);
    dispatcher.run(rx).await;

    assert_eq!(*store.trace.lock(), vec!["start", "end", "start", "end"]);
    assert_eq!(store.writes.lock().len(), 2);
}

#[tokio::test]
async fn test_group_removal() {
    let fx = Fixture::new();

    // Group directory already gone: file unlinks wait for the unlinkDir.
    let file = fx.event(WatchRoot::Scripts, EventKind::Unlink, "scripts/widgets/a.js");
    assert_eq!(fx.dispatcher.plan(&file), None);

    let dir = fx.event(WatchRoot::Scripts, EventKind::UnlinkDir, "scripts/widgets");
    assert_eq!(
        fx.dispatcher.plan(&dir),
        Some(Action::Delete {
            key: "assets/widgets.min.js".into(),
            artifact: Some(fx.root.join("theme/assets/widgets.min.js")),
        })
    );
}

#[tokio::test]
async fn test_removed_sub_collection_repackages_group() {
    let fx = Fixture::new();
    fx.write("scripts/widgets/a.js", "window.a = 1;");

    let event = fx.event(WatchRoot::Scripts, EventKind::UnlinkDir, "scripts/widgets/vendor");
    assert!(matches!(
        fx.dispatcher.plan(&event),
        Some(Action::PackageGroup { .. })
    ));
}

#[tokio::test]
async fn test_package_missing_group_becomes_delete() {
    let fx = Fixture::new();
    let action = Action::PackageGroup {
        group: "gone".into(),
        key: "assets/gone.min.js".into(),
    };
    let outcome = fx.dispatcher.execute(action).await;
    assert_eq!(outcome.log_kind, LogKind::Deleted);
    assert_eq!(*fx.store.deletes.lock(), vec!["assets/gone.min.js"]);
}

#[tokio::test]
async fn test_failed_upload_still_signals_reload() {
    let fx = Fixture::with_store(Recorder {
        fail_writes: true,
        ..Default::default()
    });
    fx.write("theme/sections/promo/banner.liquid", "{% section %}");

    let event = fx.event(
        WatchRoot::Theme,
        EventKind::Add,
        "theme/sections/promo/banner.liquid",
    );
    let action = fx.dispatcher.plan(&event).unwrap();
    assert_eq!(action.key(), "sections/banner.liquid");

    let outcome = fx.dispatcher.execute(action).await;
    assert_eq!(outcome.log_kind, LogKind::UploadFailed);
    assert_eq!(fx.signals(), vec![outcome]);
}

#[tokio::test]
async fn test_missing_source_fails_without_upload() {
    let fx = Fixture::new();
    let action = Action::UploadScript {
        source: fx.root.join("scripts/ghost.js"),
        key: "assets/ghost.min.js".into(),
    };
    let outcome = fx.dispatcher.execute(action).await;
    assert_eq!(outcome.log_kind, LogKind::UploadFailed);
    assert!(fx.writes().is_empty());
}

#[tokio::test]
async fn test_binary_theme_file_uploads_attachment() {
    let fx = Fixture::new();
    let path = fx.root.join("theme/assets/logo.png");
    fs::write(&path, [0x89, b'P', b'N', b'G']).unwrap();

    let event = fx.event(WatchRoot::Theme, EventKind::Add, "theme/assets/logo.png");
    let action = fx.dispatcher.plan(&event).unwrap();
    fx.dispatcher.execute(action).await;

    assert_eq!(
        fx.writes(),
        vec![("assets/logo.png".to_string(), "iVBORw==".to_string(), true)]
    );
}

#[tokio::test]
async fn test_inline_script_snippet() {
    let fx = Fixture::new();
    fx.write(
        "theme/snippets/inline-scripts/tracking.liquid",
        "<div></div>\n<script>\n  var answer = 40 + 2;\n</script>\n",
    );

    let event = fx.event(
        WatchRoot::Theme,
        EventKind::Change,
        "theme/snippets/inline-scripts/tracking.liquid",
    );
    let action = fx.dispatcher.plan(&event).unwrap();
    assert!(matches!(action, Action::UploadInlineScript { .. }));

    fx.dispatcher.execute(action).await;
    let writes = fx.writes();
    assert_eq!(writes[0].0, "snippets/tracking.liquid");
    assert!(writes[0].1.starts_with("<div></div>\n<script>"));
    assert!(!writes[0].1.contains("  var answer"));
    assert!(!fx.root.join(".themesync/inline/tracking.liquid").exists());
}

#[cfg(unix)]
#[tokio::test]
async fn test_styles_compile_to_fixed_key() {
    let fx = Fixture::new();
    fx.write("styles/main.scss", "body{color:red}");
    fx.write("styles/partials/_base.scss", "");

    let event = fx.event(WatchRoot::Styles, EventKind::Change, "styles/partials/_base.scss");
    let action = fx.dispatcher.plan(&event).unwrap();
    assert_eq!(
        action,
        Action::CompileStyles {
            key: "assets/main.min.css".into()
        }
    );

    fx.dispatcher.execute(action).await;
    assert_eq!(
        fx.writes(),
        vec![("assets/main.min.css".to_string(), "body{color:red}".to_string(), false)]
    );
}

#[tokio::test]
async fn test_generated_theme_asset_is_not_uploaded() {
    let fx = Fixture::new();
    fx.write("theme/assets/checkout.min.js", "x");
    let event = fx.event(WatchRoot::Theme, EventKind::Change, "theme/assets/checkout.min.js");
    assert_eq!(fx.dispatcher.plan(&event), None);
}

#[test]
fn test_full_sync_actions() {
    let fx = Fixture::new();
    fx.write("scripts/cart.js", "");
    fx.write("scripts/readme.md", "");
    fx.write("scripts/widgets/a.js", "");
    fx.write("styles/main.scss", "");
    fx.write("theme/layout/theme.liquid", "");
    fx.write("theme/assets/cart.min.js", "");

    let keys: Vec<String> = fx
        .dispatcher
        .full_sync_actions()
        .iter()
        .map(|a| a.key().to_string())
        .collect();
    assert_eq!(
        keys,
        vec![
            "assets/cart.min.js",
            "assets/widgets.min.js",
            "assets/main.min.css",
            "layout/theme.liquid",
        ]
    );
}
