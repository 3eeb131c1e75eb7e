use std::{future::Future, sync::Arc};

use tokio::{task::JoinHandle, time::Instant};
use typed_builder::TypedBuilder;

use super::{Executor, join_workers};
use crate::{
    aggregate::{Aggregate, ResultSet},
    error::Error,
    plan::{RequestDescriptor, WorkSource},
    scenario::Scenario,
};

/// Count-bounded executor.
///
/// Each of the `workers` tasks walks the whole work source from start to end, so the
/// number of requests issued is `workers × work.len()`, not `work.len()`. Termination
/// is implicit: a worker exits once it has run out of descriptors.
#[derive(Debug, Clone, TypedBuilder)]
pub struct CountExecutor {
    /// The number of concurrent worker tasks to spawn.
    pub workers: usize,
}

impl<A, F, Fut> Executor<A, F, Fut> for CountExecutor
where
    Self: Send + Sync + Sized,
    A: Aggregate + 'static,
    F: Fn(Arc<RequestDescriptor>) -> Fut + Send + Sync + Clone + 'static,
    Fut: Future<Output = A::Metric> + Send + 'static,
{
    type Error = Error;

    async fn exec(&self, scenario: &Scenario<A, F, Fut>) -> Result<ResultSet<A>, Self::Error> {
        tracing::info!(
            "Spawning {} workers, each replaying {} requests...",
            self.workers,
            scenario.work.len()
        );
        let started_at = Instant::now();
        let handles = spawn_workers(self.workers, scenario.work.clone(), scenario.action.clone());

        tracing::info!("Running scenario: {}!", scenario.name);
        let aggregate = join_workers(handles).await?;
        let finished_at = Instant::now();

        tracing::info!("Done running scenario: {}!", scenario.name);
        Ok(ResultSet {
            started_at,
            finished_at,
            aggregate,
        })
    }
}

/// Spawns `workers` tasks that each run `action` over every descriptor in `work`.
pub fn spawn_workers<A, F, Fut>(workers: usize, work: WorkSource, action: F) -> Vec<JoinHandle<A>>
where
    A: Aggregate + 'static,
    F: Fn(Arc<RequestDescriptor>) -> Fut + Send + Sync + Clone + 'static,
    Fut: Future<Output = A::Metric> + Send + 'static,
{
    (0..workers)
        .map(|i| {
            let work = work.clone();
            let action = action.clone();
            tokio::spawn(async move {
                let mut agg = A::new();
                tracing::debug!("Worker {i} started.");
                for descriptor in work.iter() {
                    let metric = action(Arc::clone(descriptor)).await;
                    agg.consume(&metric);
                }
                tracing::debug!("Worker {i} shutting down.");
                agg
            })
        })
        .collect()
}
