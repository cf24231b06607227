//! Asynchronous task composition.
//!
//! A [`Task`] takes ownership of a context, does some I/O, and hands the
//! (possibly updated) context back or fails with a [`TaskError`].
//!
//! | Function         | Semantics                                          |
//! |------------------|----------------------------------------------------|
//! | [`run_sequence`] | strict causal order, first failure stops the chain |
//! | [`run_parallel`] | fan-out/fan-in, first failure wins, optional limit |

mod error;
mod job;
mod parallel;
mod sequence;

use std::future::Future;
use std::pin::Pin;

pub use error::TaskError;
pub use job::{LogKind, UploadJob};
pub use parallel::run_parallel;
pub use sequence::run_sequence;

/// Boxed `Send` future used by tasks and trait seams.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// One step of a sequence or one member of a parallel batch.
pub type Task<C> = Box<dyn FnOnce(C) -> BoxFuture<Result<C, TaskError>> + Send>;

/// Build a [`Task`] from an async closure.
///
/// ```ignore
/// let step = task(|mut job: UploadJob| async move {
///     job.content = Some(read(&job.source).await?);
///     Ok(job)
/// });
/// ```
pub fn task<C, F, Fut>(f: F) -> Task<C>
where
    F: FnOnce(C) -> Fut + Send + 'static,
    Fut: Future<Output = Result<C, TaskError>> + Send + 'static,
{
    Box::new(move |ctx| Box::pin(f(ctx)))
}
