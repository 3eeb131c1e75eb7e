use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::{collections::BTreeMap, fmt::Debug, fmt::Write as _, future::Future};

use crate::{
    Aggregate,
    aggregate::{Outcomes, ResultSet},
    error::Error,
};

/// Quantiles reported for every run.
pub const PERCENTILES: [f64; 5] = [0.5, 0.9, 0.95, 0.99, 0.9999];

/// A [`Report`] is the processed form of a finished run.
///
/// Reports turn the raw merged aggregate into counts, rates and percentiles. They
/// are *pure data structures*, free of side effects and I/O, computed exactly once
/// from the final [`ResultSet`] via [`From`].
///
/// See also: [`Reporter`].
pub trait Report<A>
where
    Self: Send + Sync + Debug + From<ResultSet<A>> + Serialize + DeserializeOwned,
    A: Aggregate,
{
}

/// A [`Reporter`] consumes a [`Report`] and performs side effects: printing it,
/// writing it somewhere, sending it to a service.
///
/// Reporters are the I/O boundary; everything before them stays pure.
pub trait Reporter<A: Aggregate, R: Report<A>> {
    fn report(&self, report: &R) -> impl Future<Output = Result<(), Error>>;
}

/// Nearest-rank percentile over an ascending `sorted` sample.
///
/// Picks `sorted[floor(len × p)]`, clamped to the last element so the top
/// quantiles of small samples stay in bounds. `None` for an empty sample.
pub fn percentile(sorted: &[u64], p: f64) -> Option<u64> {
    let last = sorted.len().checked_sub(1)?;
    let index = (sorted.len() as f64 * p).floor() as usize;
    sorted.get(index.min(last)).copied()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PercentileEntry {
    pub quantile: f64,
    /// `None` when the run produced no outcomes.
    pub latency_ms: Option<u64>,
}

/// Aggregate statistics of a finished run.
///
/// Only status `200` counts as a success. Latencies are truncated to whole
/// milliseconds and cover successes and failures alike.
///
/// Rates divide by the elapsed time and are `0.0` when no time elapsed.
/// `avg_success_latency_ms` is `None` when there were no successes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub success_count: u64,
    pub failure_count: u64,
    pub total_count: u64,
    pub status_histogram: BTreeMap<u16, u64>,
    /// Ascending. Left out of serialized output.
    #[serde(skip)]
    pub latencies_ms: Vec<u64>,
    pub percentiles: Vec<PercentileEntry>,
    pub success_bytes: u64,
    pub elapsed_secs: f64,
    pub qps: f64,
    pub throughput_kbps: f64,
    pub avg_success_latency_ms: Option<f64>,
}

impl Summary {
    /// Nearest-rank percentile of this run's latencies.
    pub fn percentile(&self, p: f64) -> Option<u64> {
        percentile(&self.latencies_ms, p)
    }
}

impl From<ResultSet<Outcomes>> for Summary {
    fn from(value: ResultSet<Outcomes>) -> Self {
        let elapsed_secs = value.elapsed().as_secs_f64();

        let mut success_count = 0u64;
        let mut success_bytes = 0u64;
        let mut success_latency_ms = 0u64;
        let mut status_histogram = BTreeMap::new();
        let mut latencies_ms = Vec::with_capacity(value.aggregate.len());

        for outcome in value.aggregate.iter() {
            let latency_ms = outcome.latency_ms();
            if outcome.is_success() {
                success_count += 1;
                success_bytes += outcome.bytes;
                success_latency_ms += latency_ms;
            }
            *status_histogram.entry(outcome.status).or_insert(0) += 1;
            latencies_ms.push(latency_ms);
        }
        latencies_ms.sort_unstable();

        let total_count = latencies_ms.len() as u64;
        let per_second = |amount: f64| {
            if elapsed_secs > 0.0 {
                amount / elapsed_secs
            } else {
                0.0
            }
        };
        let percentiles = PERCENTILES
            .iter()
            .map(|&quantile| PercentileEntry {
                quantile,
                latency_ms: percentile(&latencies_ms, quantile),
            })
            .collect();

        Self {
            success_count,
            failure_count: total_count - success_count,
            total_count,
            status_histogram,
            percentiles,
            success_bytes,
            elapsed_secs,
            qps: per_second(success_count as f64),
            throughput_kbps: per_second(success_bytes as f64 / 1024.0),
            avg_success_latency_ms: (success_count > 0)
                .then(|| success_latency_ms as f64 / success_count as f64),
            latencies_ms,
        }
    }
}

impl Report<Outcomes> for Summary {}

/// Prints a human-readable summary to stdout.
pub struct TextReporter;

impl TextReporter {
    pub fn render(summary: &Summary) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = Self::write_to(&mut out, summary);
        out
    }

    fn write_to(out: &mut String, s: &Summary) -> std::fmt::Result {
        writeln!(out, "Results:")?;
        writeln!(out, "    Successful requests:  {}", s.success_count)?;
        writeln!(out, "    Failed requests:      {}", s.failure_count)?;
        writeln!(out, "    Total requests:       {}", s.total_count)?;
        writeln!(out, "    Elapsed:              {:.6} s", s.elapsed_secs)?;
        writeln!(out, "    QPS:                  {:.6}", s.qps)?;
        writeln!(out, "    Throughput:           {:.6} KB/s", s.throughput_kbps)?;
        match s.avg_success_latency_ms {
            Some(avg) => writeln!(out, "    Avg success latency:  {avg:.6} ms")?,
            None => writeln!(out, "    Avg success latency:  n/a (no successful requests)")?,
        }

        writeln!(out)?;
        writeln!(out, "Status codes:")?;
        for (status, count) in &s.status_histogram {
            writeln!(out, "    {status}: {count}")?;
        }

        writeln!(out)?;
        writeln!(out, "Latency distribution (ms):")?;
        for entry in &s.percentiles {
            let label = format!("{:.2}%", entry.quantile * 100.0);
            match entry.latency_ms {
                Some(ms) => writeln!(out, "    {label:>7}: {ms}")?,
                None => writeln!(out, "    {label:>7}: -")?,
            }
        }
        Ok(())
    }
}

impl Reporter<Outcomes, Summary> for TextReporter {
    async fn report(&self, report: &Summary) -> Result<(), Error> {
        print!("{}", Self::render(report));
        Ok(())
    }
}

/// Prints the summary as a single JSON document on stdout.
pub struct JsonReporter;

impl Reporter<Outcomes, Summary> for JsonReporter {
    async fn report(&self, report: &Summary) -> Result<(), Error> {
        let value = serde_json::to_string_pretty(report)?;
        println!("{value}");
        Ok(())
    }
}
