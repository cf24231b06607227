//! Task Sequencer.

use super::{Task, TaskError};

/// Run `tasks` in order, threading the context through each.
///
/// Step N+1 starts only after step N resolved. The first `Err` is returned
/// and no further step runs; the returned value is the single terminal result.
pub async fn run_sequence<C>(tasks: Vec<Task<C>>, initial: C) -> Result<C, TaskError> {
    let mut ctx = initial;
    for task in tasks {
        ctx = task(ctx).await?;
    }
    Ok(ctx)
}
