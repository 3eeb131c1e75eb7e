//! Executor: orchestration of the worker pool
//!
//! The `Executor` trait is the runtime that executes a [`Scenario`]. Both built-in
//! executors share the same shape:
//!
//! 1. Record the start timestamp.
//! 2. Spawn exactly `workers` tokio tasks. Each task owns a private [`Aggregate`]
//!    and calls the scenario's `action` once per descriptor it takes from the
//!    [`crate::plan::WorkSource`].
//! 3. Join every task (fan-in barrier), merge the aggregates in worker-id order and
//!    record the end timestamp.
//!
//! They differ only in how a worker walks the work source and when it stops:
//!
//! - [`CountExecutor`]: every worker replays the **entire** work source once, front to
//!   back. A run therefore issues `workers × work.len()` requests.
//! - [`DurationExecutor`]: workers take slices of [`SLICE_LEN`] descriptors, wrapping to
//!   the front at the end, and check a shared [`StopSignal`] between slices. A timer
//!   task raises the signal once the configured duration has elapsed.
//!
//! # Notes about correctness & robustness
//! - There is no cancellation of an in-flight request. A slice that has started is
//!   finished item by item, so a duration run overshoots by at most one slice.
//! - A panicking worker is fatal for the run: the join returns
//!   [`crate::Error::WorkerPanicked`] instead of a partial result.
pub mod count;
pub mod duration;

pub use count::CountExecutor;
pub use duration::{DurationExecutor, SLICE_LEN, StopSignal};

use std::{future::Future, sync::Arc};

use futures::future::join_all;
use tokio::task::JoinHandle;

use crate::{
    aggregate::{Aggregate, ResultSet},
    plan::RequestDescriptor,
    scenario::Scenario,
};

/// The runtime hook that executes a `Scenario`.
///
/// This trait is generic over the aggregate, action, and future types so tests can
/// drive an executor with a plain closure instead of a real HTTP client.
pub trait Executor<A, F, Fut>
where
    Self: Send + Sync + Sized,
    A: Aggregate,
    F: Fn(Arc<RequestDescriptor>) -> Fut + Send + Sync + Clone + 'static,
    Fut: Future<Output = A::Metric> + Send + 'static,
{
    type Error;
    /// Execute the scenario and return the merged result of all workers.
    fn exec(
        &self,
        scenario: &Scenario<A, F, Fut>,
    ) -> impl Future<Output = Result<ResultSet<A>, Self::Error>> + Send;
}

/// Waits for every worker and merges their aggregates in spawn order.
pub(crate) async fn join_workers<A>(handles: Vec<JoinHandle<A>>) -> crate::Result<A>
where
    A: Aggregate + 'static,
{
    tracing::info!("Retrieving data from {} workers...", handles.len());
    let mut merged = A::new();
    for res in join_all(handles).await {
        let agg = res.inspect_err(|e| tracing::error!("Worker panicked with error: {e}"))?;
        merged.merge(agg);
    }
    Ok(merged)
}
