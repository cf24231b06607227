//! `themesync watch`: the long-running sync loop.
//!
//! Start-up order matters: the file watcher attaches first so edits made
//! while the servers bind are not lost; any start-up failure aborts
//! before a single event is handled.

use std::sync::Arc;

use anyhow::{Context, Result};
use crossbeam::channel;
use tokio::runtime::Handle;
use tokio::sync::mpsc;

use crate::config::SyncConfig;
use crate::dispatch::Dispatcher;
use crate::proxy::{ProxyContext, ProxyServer};
use crate::reload::LiveReload;
use crate::remote::{RemoteClient, StoreEndpoint};
use crate::resolve::Layout;
use crate::watch::{FileWatcher, WatchRoot};
use crate::{debug, log};

pub async fn run_watch(config: &SyncConfig) -> Result<()> {
    let layout = Layout::from_config(config);
    let watcher = FileWatcher::new(layout.clone()).context("failed to start file watcher")?;
    for root in [WatchRoot::Scripts, WatchRoot::Styles, WatchRoot::Theme] {
        log!("watch"; "{} {}", root.label(), layout.root_path(root).display());
    }

    let shutdown = shutdown_signal()?;

    let client = RemoteClient::new(StoreEndpoint::from_config(&config.store), config.throttle)
        .context("failed to create HTTP client")?;

    let live_reload = LiveReload::start(config.serve.ws_port)?;
    log!("reload"; "ws://127.0.0.1:{}", live_reload.port());

    let proxy = if config.serve.proxy {
        let server = ProxyServer::bind(config.serve.interface, config.serve.port)?;
        log!("serve"; "http://{} → {}", server.addr(), client.storefront());
        let handle = server.handle();
        server.spawn(ProxyContext {
            client: client.clone(),
            pages_dir: config.cache_dir().join("pages"),
            script_tag: Some(live_reload.script_tag()),
            runtime: Handle::current(),
        });
        Some(handle)
    } else {
        None
    };

    let dispatcher = Dispatcher::new(config, Arc::new(client), Arc::new(live_reload));
    let (tx, rx) = mpsc::channel(256);
    let watch_task = tokio::spawn(watcher.run(tx));
    let dispatch_task = tokio::spawn(dispatcher.run(rx));

    let _ = tokio::task::spawn_blocking(move || shutdown.recv())
        .await
        .context("shutdown listener failed")?;

    log!("watch"; "shutting down...");
    if let Some(proxy) = proxy {
        proxy.unblock();
    }
    watch_task.abort();
    dispatch_task.abort();
    debug!("watch"; "stopped");
    Ok(())
}

/// Ctrl+C as a channel.
fn shutdown_signal() -> Result<channel::Receiver<()>> {
    let (tx, rx) = channel::bounded(1);
    ctrlc::set_handler(move || {
        let _ = tx.try_send(());
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {}", e))?;
    Ok(rx)
}
