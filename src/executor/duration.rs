//! Duration-bounded execution.
//!
//! A single timer task counts elapsed ticks (one per second by default) and raises
//! the shared [`StopSignal`] once the configured duration is reached. Workers read
//! the signal only between slices of [`SLICE_LEN`] descriptors, so a worker that has
//! started a slice finishes it before exiting.
//!
//! Every worker yields to the runtime after each slice, so the timer keeps running
//! even when requests complete without ever suspending.
//!
//! The signal is a relaxed `AtomicBool`: it has one writer, and workers only need
//! to see it eventually. The wall-clock length of a run is therefore at least the
//! configured duration and at most the duration plus one slice of requests, each
//! bounded by its timeout.
use std::{
    future::Future,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use tokio::{
    task::JoinHandle,
    time::{Instant, interval_at},
};
use typed_builder::TypedBuilder;

use super::{Executor, join_workers};
use crate::{
    aggregate::{Aggregate, ResultSet},
    error::Error,
    plan::{RequestDescriptor, WorkSource},
    scenario::Scenario,
};

/// Number of descriptors a worker runs between two checks of the stop signal.
pub const SLICE_LEN: usize = 10;

/// One-shot stop flag shared by the timer and every worker.
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_triggered(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Executor that keeps every worker busy until the timer expires.
#[derive(Debug, Clone, TypedBuilder)]
pub struct DurationExecutor {
    /// How long the run lasts, counted in whole ticks.
    pub duration: Duration,
    /// The number of concurrent worker tasks to spawn.
    pub workers: usize,
    /// Timer granularity. The first tick fires one `tick` after dispatch.
    #[builder(default = Duration::from_secs(1))]
    pub tick: Duration,
}

impl<A, F, Fut> Executor<A, F, Fut> for DurationExecutor
where
    Self: Send + Sync + Sized,
    A: Aggregate + 'static,
    F: Fn(Arc<RequestDescriptor>) -> Fut + Send + Sync + Clone + 'static,
    Fut: Future<Output = A::Metric> + Send + 'static,
{
    type Error = Error;

    async fn exec(&self, scenario: &Scenario<A, F, Fut>) -> Result<ResultSet<A>, Self::Error> {
        let stop = StopSignal::new();
        let started_at = Instant::now();

        tracing::info!("Spawning timer task for {:?}...", self.duration);
        let timer = tokio::spawn(timer_task(stop.clone(), self.duration, self.tick));

        tracing::info!("Spawning {} workers...", self.workers);
        let handles = spawn_workers(
            self.workers,
            scenario.work.clone(),
            scenario.action.clone(),
            stop.clone(),
        );

        tracing::info!("Running scenario: {}!", scenario.name);
        let joined = join_workers(handles).await;
        let finished_at = Instant::now();
        // Workers only leave early when there is nothing to run.
        timer.abort();
        let aggregate = joined?;

        tracing::info!("Done running scenario: {}!", scenario.name);
        Ok(ResultSet {
            started_at,
            finished_at,
            aggregate,
        })
    }
}

/// Counts ticks and triggers `stop` once `duration` worth of ticks have elapsed.
pub async fn timer_task(stop: StopSignal, duration: Duration, tick: Duration) {
    let tick = tick.max(Duration::from_millis(1));
    let mut ticker = interval_at(Instant::now() + tick, tick);
    let mut elapsed = Duration::ZERO;
    loop {
        ticker.tick().await;
        elapsed += tick;
        tracing::debug!("Timer at {elapsed:?} of {duration:?}");
        if elapsed >= duration {
            break;
        }
    }
    tracing::info!("Duration reached, signaling workers to stop...");
    stop.trigger();
}

/// Bounds of the next slice starting at `cursor`, wrapping to the front once the
/// end of a source of `len` descriptors has been reached.
pub fn next_slice(cursor: usize, len: usize) -> (usize, usize) {
    let start = if cursor >= len { 0 } else { cursor };
    (start, (start + SLICE_LEN).min(len))
}

/// Spawns `workers` tasks cycling over `work` slice by slice until `stop` is raised.
pub fn spawn_workers<A, F, Fut>(
    workers: usize,
    work: WorkSource,
    action: F,
    stop: StopSignal,
) -> Vec<JoinHandle<A>>
where
    A: Aggregate + 'static,
    F: Fn(Arc<RequestDescriptor>) -> Fut + Send + Sync + Clone + 'static,
    Fut: Future<Output = A::Metric> + Send + 'static,
{
    (0..workers)
        .map(|i| {
            let work = work.clone();
            let action = action.clone();
            let stop = stop.clone();
            tokio::spawn(async move {
                let mut agg = A::new();
                tracing::debug!("Worker {i} started.");
                if work.is_empty() {
                    tracing::warn!("Worker {i} has no work, exiting.");
                    return agg;
                }

                let mut cursor = 0;
                while !stop.is_triggered() {
                    let (start, end) = next_slice(cursor, work.len());
                    for descriptor in &work[start..end] {
                        let metric = action(Arc::clone(descriptor)).await;
                        agg.consume(&metric);
                    }
                    cursor = end;
                    // Actions that fail without awaiting would otherwise starve the timer.
                    tokio::task::yield_now().await;
                }
                tracing::debug!("Worker {i} shutting down.");
                agg
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{aggregate::Outcomes, config::Method, metric::RequestOutcome};

    fn work(len: usize) -> WorkSource {
        let descriptor = Arc::new(RequestDescriptor {
            url: "http://example/".into(),
            method: Method::Get,
            body: String::new(),
            timeout: Duration::from_secs(1),
        });
        WorkSource::new(vec![descriptor; len])
    }

    #[test]
    fn slices_wrap_at_the_end() {
        assert_eq!(next_slice(0, 25), (0, 10));
        assert_eq!(next_slice(10, 25), (10, 20));
        assert_eq!(next_slice(20, 25), (20, 25));
        assert_eq!(next_slice(25, 25), (0, 10));
        assert_eq!(next_slice(3, 3), (0, 3));
    }

    #[test]
    fn stop_signal_is_shared_between_clones() {
        let signal = StopSignal::new();
        let observer = signal.clone();
        assert!(!observer.is_triggered());
        signal.trigger();
        assert!(observer.is_triggered());
    }

    #[tokio::test(start_paused = true)]
    async fn timer_fires_after_duration() {
        let stop = StopSignal::new();
        let start = Instant::now();
        timer_task(stop.clone(), Duration::from_secs(3), Duration::from_secs(1)).await;

        let elapsed = start.elapsed();
        assert!(stop.is_triggered());
        assert!(elapsed >= Duration::from_secs(3), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(3_010), "{elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn zero_duration_stops_on_first_tick() {
        let stop = StopSignal::new();
        let start = Instant::now();
        timer_task(stop.clone(), Duration::ZERO, Duration::from_secs(1)).await;

        let elapsed = start.elapsed();
        assert!(stop.is_triggered());
        assert!(elapsed >= Duration::from_secs(1), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(1_010), "{elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn run_lasts_at_least_the_duration_and_at_most_one_slice_more() {
        let request_time = Duration::from_millis(10);
        let scenario = Scenario::<Outcomes, _, _>::builder()
            .name("duration")
            .work(work(25))
            .action(move |_: Arc<RequestDescriptor>| async move {
                tokio::time::sleep(request_time).await;
                RequestOutcome::new(request_time, 200, 1)
            })
            .build();

        let result = DurationExecutor::builder()
            .duration(Duration::from_secs(2))
            .workers(3)
            .build()
            .exec(&scenario)
            .await
            .unwrap();

        let elapsed = result.elapsed();
        assert!(elapsed >= Duration::from_secs(2), "{elapsed:?}");
        assert!(
            elapsed <= Duration::from_secs(2) + request_time * (SLICE_LEN as u32 + 1),
            "{elapsed:?}"
        );
        assert!(!result.aggregate.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn empty_work_returns_without_waiting_for_the_timer() {
        let scenario = Scenario::<Outcomes, _, _>::builder()
            .name("empty")
            .work(work(0))
            .action(|_: Arc<RequestDescriptor>| async move {
                RequestOutcome::new(Duration::ZERO, 200, 0)
            })
            .build();

        let result = DurationExecutor::builder()
            .duration(Duration::from_secs(60))
            .workers(2)
            .build()
            .exec(&scenario)
            .await
            .unwrap();

        assert!(result.aggregate.is_empty());
        assert!(result.elapsed() < Duration::from_secs(60));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn actions_that_never_suspend_still_stop_on_time() {
        let scenario = Scenario::<Outcomes, _, _>::builder()
            .name("instant failures")
            .work(work(25))
            .action(|_: Arc<RequestDescriptor>| async move {
                RequestOutcome::failed(Duration::ZERO)
            })
            .build();
        let executor = DurationExecutor::builder()
            .duration(Duration::from_millis(200))
            .tick(Duration::from_millis(50))
            .workers(4)
            .build();

        let result = tokio::time::timeout(Duration::from_secs(5), executor.exec(&scenario))
            .await
            .expect("run outlived its duration")
            .unwrap();

        let elapsed = result.elapsed();
        assert!(elapsed >= Duration::from_millis(200), "{elapsed:?}");
        assert!(elapsed < Duration::from_secs(2), "{elapsed:?}");
        assert!(!result.aggregate.is_empty());
    }
}
