use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Status recorded for a request that never got a response
/// (connection failure, timeout, broken body).
pub const SENTINEL_STATUS: u16 = 400;

/// Status counted as a success. Only this exact code; other 2xx codes are failures.
pub const SUCCESS_STATUS: u16 = 200;

/// A `Metric` is a single observed measurement produced by one unit of work.
///
/// Metrics are collected by a [`crate::Aggregate`] inside each worker and only
/// turned into statistics once every worker has finished, by a [`crate::Report`].
///
/// ## Design principles
/// - **Simple and composable:** a metric is a plain value, created once and never
///   mutated afterwards.
/// - **Comparable:** metrics must support [`PartialEq`] and [`PartialOrd`].
/// - **Thread-safe and clonable:** metrics must be `Send`, `Sync`, and `Clone`,
///   since they are produced on worker tasks and moved out at the join.
pub trait Metric
where
    Self: PartialOrd + PartialEq + Send + Sync + Clone,
{
}

/// Outcome of one HTTP request.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct RequestOutcome {
    /// Wall-clock time from just before sending to just after the call returned.
    pub latency: Duration,
    pub status: u16,
    /// Response body length. Always zero for the sentinel outcome.
    pub bytes: u64,
}

impl Metric for RequestOutcome {}

impl RequestOutcome {
    pub fn new(latency: Duration, status: u16, bytes: u64) -> Self {
        Self {
            latency,
            status,
            bytes,
        }
    }

    /// The outcome of a transport failure after `latency` has elapsed.
    pub fn failed(latency: Duration) -> Self {
        Self::new(latency, SENTINEL_STATUS, 0)
    }

    pub fn is_success(&self) -> bool {
        self.status == SUCCESS_STATUS
    }

    /// Latency truncated to whole milliseconds.
    pub fn latency_ms(&self) -> u64 {
        self.latency.as_millis() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_exact_200_is_success() {
        assert!(RequestOutcome::new(Duration::ZERO, 200, 0).is_success());
        assert!(!RequestOutcome::new(Duration::ZERO, 204, 0).is_success());
        assert!(!RequestOutcome::failed(Duration::ZERO).is_success());
    }

    #[test]
    fn failed_outcome_keeps_elapsed_time() {
        let outcome = RequestOutcome::failed(Duration::from_millis(250));
        assert_eq!(outcome.status, SENTINEL_STATUS);
        assert_eq!(outcome.bytes, 0);
        assert_eq!(outcome.latency, Duration::from_millis(250));
    }

    #[test]
    fn latency_ms_truncates() {
        let outcome = RequestOutcome::new(Duration::from_micros(1_999), 200, 0);
        assert_eq!(outcome.latency_ms(), 1);
    }
}
