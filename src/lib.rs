//! Volley, a concurrent HTTP load generator.
//!
//! Given a target url (optionally templated by a file of per-line values), a method,
//! a concurrency level and either a request count or a duration, volley issues many
//! concurrent requests, records the latency and outcome of each one, and reports
//! throughput and latency percentiles.
//!
//! # Architecture
//!
//! The main building blocks are:
//!
//! - [`config::Configuration`]: the run parameters, validated once before dispatch.
//! - [`plan`]: turns a configuration into an ordered [`plan::WorkSource`] of request
//!   descriptors.
//! - [`Scenario`]: the work source plus the action run for every descriptor.
//! - [`Executor`]: runs a scenario on a fixed pool of workers. [`executor::CountExecutor`]
//!   for count-bounded runs, [`executor::DurationExecutor`] for duration-bounded ones.
//! - [`Metric`]: the smallest unit produced by an action; here a
//!   [`metric::RequestOutcome`].
//! - [`Aggregate`]: the per-worker buffer metrics are collected into, merged once
//!   all workers have joined.
//! - [`Report`]: derives the final statistics ([`report::Summary`]) from the merged
//!   result.
//! - [`Reporter`]: prints a report (text or JSON).
//!
//! [`runner::run`] wires them together for the command-line tool.
//!
//! # Example
//!
//! ```rust,no_run
//! use volley::{
//!     Reporter,
//!     config::Configuration,
//!     report::{Summary, TextReporter},
//!     runner,
//! };
//!
//! #[tokio::main]
//! async fn main() -> volley::Result<()> {
//!     let config = Configuration::builder()
//!         .concurrency(8)
//!         .requests(1_000)
//!         .url("http://localhost:3000/")
//!         .build();
//!
//!     let results = runner::run(&config).await?;
//!     TextReporter.report(&Summary::from(results)).await
//! }
//! ```

/// Per-worker metric collectors
pub mod aggregate;
/// The HTTP request executor
pub mod client;
/// Run configuration and validation
pub mod config;
pub mod error;
/// Orchestrators that define how things will actually run
pub mod executor;
/// Single metrics
pub mod metric;
pub mod plan;
/// Reports and Reporters
pub mod report;
/// Top-level entry point tying planning, execution and HTTP together
pub mod runner;
/// Main module of the framework that glues everything together
pub mod scenario;

pub use aggregate::Aggregate;
pub use error::{ConfigError, Error, Result};
pub use executor::{CountExecutor, DurationExecutor, Executor};
pub use metric::Metric;
pub use report::{Report, Reporter};
pub use scenario::Scenario;
