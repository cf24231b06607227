//! Task Parallelizer.

use std::time::Duration;

use tokio::task::JoinSet;

use super::{Task, TaskError};
use crate::debug;

/// Run `tasks` concurrently, each with its own clone of `initial`.
///
/// Resolves `Ok(())` once every task succeeded. The first failure is
/// returned immediately and later completions are ignored. When
/// `time_limit` elapses first, `Err(TimedOut)` is returned. In both cases
/// in-flight tasks are detached, not cancelled.
pub async fn run_parallel<C>(
    tasks: Vec<Task<C>>,
    initial: C,
    time_limit: Option<Duration>,
) -> Result<(), TaskError>
where
    C: Clone + Send + 'static,
{
    let total = tasks.len();
    let mut set = JoinSet::new();
    for task in tasks {
        set.spawn(task(initial.clone()));
    }

    let outcome = match time_limit {
        Some(limit) => tokio::time::timeout(limit, join_all(&mut set, total))
            .await
            .unwrap_or_else(|_| Err(TaskError::TimedOut(limit))),
        None => join_all(&mut set, total).await,
    };

    if !set.is_empty() {
        debug!("task"; "detaching {} in-flight task(s)", set.len());
    }
    set.detach_all();
    outcome
}

async fn join_all<C: 'static>(
    set: &mut JoinSet<Result<C, TaskError>>,
    total: usize,
) -> Result<(), TaskError> {
    let mut completed = 0;
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok(Ok(_)) => completed += 1,
            Ok(Err(err)) => return Err(err),
            Err(err) => return Err(TaskError::Aborted(err.to_string())),
        }
    }
    debug_assert_eq!(completed, total);
    Ok(())
}
