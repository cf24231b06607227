//! `themesync push`: upload everything once.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};

use crate::config::SyncConfig;
use crate::dispatch::{Dispatcher, NoReload};
use crate::logger::{ProgressLine, status_success};
use crate::remote::{RemoteClient, StoreEndpoint};
use crate::task::{Task, TaskError, run_parallel, task};
use crate::utils::plural::plural_count;
use crate::{debug, log};

/// Package scripts, compile styles and upload the theme tree in parallel.
///
/// The first failure (or the time limit) ends the run; uploads already in
/// flight are not awaited.
pub async fn run_push(config: &SyncConfig, timeout: Duration) -> Result<()> {
    let client = RemoteClient::new(StoreEndpoint::from_config(&config.store), config.throttle)
        .context("failed to create HTTP client")?;
    let client = Arc::new(client);
    let dispatcher = Arc::new(Dispatcher::new(config, client.clone(), Arc::new(NoReload)));

    let actions = dispatcher.full_sync_actions();
    if actions.is_empty() {
        log!("push"; "nothing to upload");
        return Ok(());
    }

    let total = actions.len();
    let count = |category: &str| actions.iter().filter(|a| a.category() == category).count();
    let progress = Arc::new(ProgressLine::new(
        "push",
        &[
            ("scripts", count("scripts")),
            ("styles", count("styles")),
            ("theme", count("theme")),
        ],
    ));

    let tasks: Vec<Task<()>> = actions
        .into_iter()
        .map(|action| {
            let dispatcher = Arc::clone(&dispatcher);
            let progress = Arc::clone(&progress);
            task(move |()| async move {
                let category = action.category();
                let key = action.key().to_string();
                dispatcher
                    .perform(action)
                    .await
                    .map_err(|e| TaskError::failed(format!("{key}: {e}")))?;
                progress.inc(category);
                Ok(())
            })
        })
        .collect();

    let started = Instant::now();
    let result = run_parallel(tasks, (), Some(timeout)).await;

    if let Ok(progress) = Arc::try_unwrap(progress) {
        progress.finish();
    }
    let limiter = client.limiter();
    debug!("push"; "throttle {}/{} in use, {} queued",
        limiter.request_count(), limiter.bucket_limit(), limiter.queued());
    result.context("push failed")?;

    status_success(&format!(
        "pushed {} in {:.1}s",
        plural_count(total, "file"),
        started.elapsed().as_secs_f64()
    ));
    Ok(())
}
