use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::metric::{Metric, RequestOutcome};

/// The `Aggregate` trait defines how raw [`Metric`] values are collected inside a
/// worker and combined with the buffers of other workers.
///
/// **Important:** `Aggregate` implementations should **not** compute final statistics
/// such as averages or percentiles. Those derived values belong in a
/// [`crate::Report`], which is built once from the final [`ResultSet`].
///
/// # Role
///
/// - Collect the [`Metric`]s produced by one worker. Each worker owns its aggregate,
///   so `consume` never contends with another task.
/// - Be mergeable so the per-worker aggregates can be combined after the join.
///
/// # Implementor notes
/// - Executors merge worker aggregates in worker-id order. `merge` may rely on that
///   order but should not require any other.
/// - Do not perform final derivations in the aggregate.
///
/// # Example
/// ```rust
/// use volley::{Aggregate, metric::RequestOutcome};
///
/// #[derive(Clone, Default)]
/// struct Count(u64);
///
/// impl Aggregate for Count {
///     type Metric = RequestOutcome;
///
///     fn new() -> Self {
///         Self(0)
///     }
///
///     fn consume(&mut self, _: &Self::Metric) {
///         self.0 += 1;
///     }
///
///     fn merge(&mut self, other: Self) {
///         self.0 += other.0;
///     }
/// }
/// ```
pub trait Aggregate
where
    Self: Send + Sync + Clone,
{
    /// The metric type this aggregate collects.
    type Metric: Metric;

    /// Create a new, empty instance of the aggregate.
    fn new() -> Self;

    /// Aggregate multiple metrics into the current instance.
    ///
    /// This default implementation calls [`Aggregate::consume`] for each metric.
    fn aggregate(&mut self, metrics: &[Self::Metric]) {
        metrics.iter().for_each(|m| self.consume(m));
    }

    /// Incorporate a single metric into the aggregate.
    fn consume(&mut self, metric: &Self::Metric);

    /// Combine two different aggregates into one.
    fn merge(&mut self, other: Self);
}

/// Append-only buffer of every [`RequestOutcome`], in the order they were produced.
///
/// Percentiles need the full latency sample, so this keeps every outcome instead of
/// a compact summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Outcomes(pub Vec<RequestOutcome>);

impl Aggregate for Outcomes {
    type Metric = RequestOutcome;

    fn new() -> Self {
        Self::default()
    }

    fn consume(&mut self, metric: &Self::Metric) {
        self.0.push(*metric);
    }

    fn merge(&mut self, mut other: Self) {
        self.0.append(&mut other.0);
    }
}

impl Outcomes {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RequestOutcome> {
        self.0.iter()
    }
}

/// The merged aggregate of a finished run, bounded by its start and end timestamps.
///
/// Built only after every worker has been joined.
#[derive(Debug, Clone)]
pub struct ResultSet<A> {
    pub started_at: Instant,
    pub finished_at: Instant,
    pub aggregate: A,
}

impl<A> ResultSet<A> {
    /// Wall-clock time between dispatch and the join barrier.
    pub fn elapsed(&self) -> Duration {
        self.finished_at.saturating_duration_since(self.started_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(status: u16) -> RequestOutcome {
        RequestOutcome::new(Duration::from_millis(1), status, 0)
    }

    #[test]
    fn merge_appends_in_order() {
        let mut first = Outcomes::new();
        first.aggregate(&[outcome(200), outcome(201)]);
        let mut second = Outcomes::new();
        second.consume(&outcome(500));

        first.merge(second);

        let statuses: Vec<u16> = first.iter().map(|o| o.status).collect();
        assert_eq!(statuses, vec![200, 201, 500]);
    }

    #[test]
    fn elapsed_never_underflows() {
        let now = Instant::now();
        let set = ResultSet {
            started_at: now + Duration::from_secs(1),
            finished_at: now,
            aggregate: Outcomes::new(),
        };
        assert_eq!(set.elapsed(), Duration::ZERO);
    }
}
