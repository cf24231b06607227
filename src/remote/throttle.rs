//! Leaky-bucket request throttle with an overflow queue.
//!
//! ```text
//! submit ──► overflow empty && count < limit ──► start now, count += 1
//!    │
//!    └────► otherwise ──► overflow (FIFO) ──► drain tick: pop one if count < limit
//!
//! leak tick: count -= 1 until 0
//! ```
//!
//! Both cycles tick every `1000 / leak_rate` ms, at most one of each runs at
//! a time, and each stops itself once idle.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::oneshot;

use crate::config::ThrottleConfig;
use crate::debug;

/// Deferred request start.
type Job = Box<dyn FnOnce() + Send>;

/// The submitted future never reported back (it panicked or the runtime shut down).
#[derive(Debug, Clone, Copy, Error)]
#[error("throttled request dropped")]
pub struct Dropped;

#[derive(Default)]
struct State {
    request_count: u32,
    overflow: VecDeque<Job>,
    leaking: bool,
    draining: bool,
}

struct Inner {
    limit: u32,
    period: Duration,
    state: Mutex<State>,
}

/// Shared request budget; clones refer to the same bucket.
#[derive(Clone)]
pub struct RateLimiter {
    inner: Arc<Inner>,
}

impl RateLimiter {
    pub fn new(config: ThrottleConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                limit: config.bucket_limit(),
                period: config.period(),
                state: Mutex::new(State::default()),
            }),
        }
    }

    /// Run `request` under the budget.
    ///
    /// The start decision is made synchronously at call time, so requests
    /// start in submission order. Must be called inside a tokio runtime.
    pub fn submit<F, T>(&self, request: F) -> impl Future<Output = Result<T, Dropped>> + use<F, T>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        self.dispatch(Box::new(move || {
            tokio::spawn(async move {
                let _ = tx.send(request.await);
            });
        }));
        async move { rx.await.map_err(|_| Dropped) }
    }

    fn dispatch(&self, job: Job) {
        let mut state = self.inner.state.lock();
        if state.overflow.is_empty() && state.request_count < self.inner.limit {
            self.start(&mut state, job);
        } else {
            state.overflow.push_back(job);
            debug!("throttle"; "budget exhausted, {} queued", state.overflow.len());
            if !state.draining {
                state.draining = true;
                self.spawn_drain();
            }
        }
    }

    /// Count a request against the budget and launch it.
    fn start(&self, state: &mut State, job: Job) {
        state.request_count += 1;
        if !state.leaking {
            state.leaking = true;
            self.spawn_leak();
        }
        job();
    }

    fn spawn_leak(&self) {
        let limiter = self.clone();
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(limiter.inner.period).await;
                let mut state = limiter.inner.state.lock();
                state.request_count = state.request_count.saturating_sub(1);
                if state.request_count == 0 {
                    state.leaking = false;
                    break;
                }
            }
        });
    }

    fn spawn_drain(&self) {
        let limiter = self.clone();
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(limiter.inner.period).await;
                let mut state = limiter.inner.state.lock();
                if state.request_count < limiter.inner.limit
                    && let Some(job) = state.overflow.pop_front()
                {
                    limiter.start(&mut state, job);
                }
                if state.overflow.is_empty() {
                    state.draining = false;
                    break;
                }
            }
        });
    }

    /// Budget currently in use.
    pub fn request_count(&self) -> u32 {
        self.inner.state.lock().request_count
    }

    /// Requests waiting in the overflow queue.
    pub fn queued(&self) -> usize {
        self.inner.state.lock().overflow.len()
    }

    pub fn bucket_limit(&self) -> u32 {
        self.inner.limit
    }
}
