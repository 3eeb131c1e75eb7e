//! Workload planning: turns a [`Configuration`] and the optional parameter lines
//! into the ordered [`WorkSource`] the executors consume.
//!
//! # Materialization
//!
//! - **Count-bounded runs** get a fully materialized list. With no parameter
//!   lines it is the same descriptor repeated `N` times; with lines it is one
//!   descriptor per line, extended round-robin up to `N` when shorter. A list
//!   that is already longer than `N` is kept whole, so a run can issue more
//!   than `N` requests per worker.
//! - **Duration-bounded runs** get a short base list (one descriptor per line,
//!   or [`DURATION_BASE_LEN`] copies of the single descriptor) which the
//!   workers wrap around until told to stop.
//!
//! # Substitution
//!
//! | method | no lines | with lines |
//! |---|---|---|
//! | GET  | `url` | `url` + line, no separator |
//! | POST | body = `data` | body = `data&line`, or just `line` when `data` is empty |
use std::{ops::Deref, path::Path, sync::Arc, time::Duration};

use serde::{Deserialize, Serialize};

use crate::config::{Configuration, Method, Termination};

/// Base list length for duration-bounded runs without parameter lines.
pub const DURATION_BASE_LEN: usize = 10;

/// One fully resolved request. Immutable once planned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestDescriptor {
    pub url: String,
    pub method: Method,
    pub body: String,
    pub timeout: Duration,
}

/// Ordered, shared sequence of descriptors.
///
/// Cloning is cheap: every worker holds the same backing list.
#[derive(Debug, Clone)]
pub struct WorkSource(Arc<[Arc<RequestDescriptor>]>);

impl WorkSource {
    pub fn new(items: Vec<Arc<RequestDescriptor>>) -> Self {
        Self(items.into())
    }
}

impl Deref for WorkSource {
    type Target = [Arc<RequestDescriptor>];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Reads newline-delimited substitution values.
///
/// A file that cannot be read yields no lines rather than an error; the run
/// then falls back to the plain url. Both `\n` and `\r\n` terminators are
/// stripped and invalid UTF-8 is replaced rather than rejected.
pub fn read_param_lines(path: &Path) -> Vec<String> {
    match std::fs::read(path) {
        Ok(bytes) => String::from_utf8_lossy(&bytes)
            .lines()
            .map(str::to_owned)
            .collect(),
        Err(e) => {
            tracing::warn!(
                "Could not read parameter file {}: {e}; continuing without parameters",
                path.display()
            );
            Vec::new()
        }
    }
}

/// Builds the work source for `config`, reading its parameter file if one is set.
pub fn plan(config: &Configuration, termination: Termination) -> WorkSource {
    let lines = config
        .param_file
        .as_deref()
        .map(read_param_lines)
        .unwrap_or_default();
    plan_with_lines(config, termination, &lines)
}

/// Same as [`plan`] with the parameter lines already loaded.
pub fn plan_with_lines(
    config: &Configuration,
    termination: Termination,
    lines: &[String],
) -> WorkSource {
    let mut items: Vec<Arc<RequestDescriptor>> = if lines.is_empty() {
        let copies = match termination {
            Termination::Count(n) => n as usize,
            Termination::Duration(_) => DURATION_BASE_LEN,
        };
        let single = Arc::new(descriptor(config, config.url.clone(), config.data.clone()));
        vec![single; copies]
    } else {
        lines
            .iter()
            .map(|line| Arc::new(substitute(config, line)))
            .collect()
    };
    tracing::debug!("Planned {} base descriptors", items.len());

    if let Termination::Count(n) = termination {
        extend_round_robin(&mut items, n as usize);
    }
    tracing::info!("Work source ready with {} requests", items.len());
    WorkSource::new(items)
}

fn descriptor(config: &Configuration, url: String, body: String) -> RequestDescriptor {
    RequestDescriptor {
        url,
        method: config.method,
        body,
        timeout: config.timeout,
    }
}

fn substitute(config: &Configuration, line: &str) -> RequestDescriptor {
    match config.method {
        Method::Get => descriptor(config, format!("{}{line}", config.url), String::new()),
        Method::Post => {
            let body = if config.data.is_empty() {
                line.to_owned()
            } else {
                format!("{}&{line}", config.data)
            };
            descriptor(config, config.url.clone(), body)
        }
    }
}

/// Appends `items[i % base_len]` until `items` holds `target` entries.
/// Never truncates, and leaves an empty list alone.
pub fn extend_round_robin<T: Clone>(items: &mut Vec<T>, target: usize) {
    let base_len = items.len();
    if base_len == 0 || base_len >= target {
        return;
    }
    items.reserve(target - base_len);
    for i in 0..target - base_len {
        let next = items[i % base_len].clone();
        items.push(next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn lines(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn urls(source: &WorkSource) -> Vec<&str> {
        source.iter().map(|d| d.url.as_str()).collect()
    }

    fn bodies(source: &WorkSource) -> Vec<&str> {
        source.iter().map(|d| d.body.as_str()).collect()
    }

    #[test]
    fn get_without_file_repeats_the_url_n_times() {
        let config = Configuration::builder()
            .concurrency(1)
            .requests(3)
            .url("http://example/")
            .build();
        let source = plan_with_lines(&config, Termination::Count(3), &[]);

        assert_eq!(urls(&source), vec!["http://example/"; 3]);
        assert!(source.iter().all(|d| d.method == Method::Get));
        assert!(source.iter().all(|d| d.timeout == Duration::from_secs(1)));
    }

    #[test]
    fn get_with_file_concatenates_lines_verbatim() {
        let config = Configuration::builder()
            .concurrency(1)
            .requests(2)
            .url("http://example/item?id=")
            .build();
        let source = plan_with_lines(&config, Termination::Count(2), &lines(&["1", "2"]));

        assert_eq!(
            urls(&source),
            vec!["http://example/item?id=1", "http://example/item?id=2"]
        );
    }

    #[test]
    fn post_with_file_cycles_bodies_up_to_n() {
        let config = Configuration::builder()
            .concurrency(1)
            .requests(4)
            .url("http://example/")
            .method(Method::Post)
            .data("x=1")
            .build();
        let source = plan_with_lines(&config, Termination::Count(4), &lines(&["a", "b"]));

        assert_eq!(bodies(&source), vec!["x=1&a", "x=1&b", "x=1&a", "x=1&b"]);
        assert!(Arc::ptr_eq(&source[0], &source[2]));
    }

    #[test]
    fn post_with_file_and_no_fragment_uses_the_line() {
        let config = Configuration::builder()
            .concurrency(1)
            .requests(1)
            .url("http://example/")
            .method(Method::Post)
            .build();
        let source = plan_with_lines(&config, Termination::Count(1), &lines(&["k=v"]));

        assert_eq!(bodies(&source), vec!["k=v"]);
    }

    #[test]
    fn post_without_file_sends_the_fragment_alone() {
        let config = Configuration::builder()
            .concurrency(1)
            .requests(2)
            .url("http://example/")
            .method(Method::Post)
            .data("x=1")
            .build();
        let source = plan_with_lines(&config, Termination::Count(2), &[]);

        assert_eq!(bodies(&source), vec!["x=1", "x=1"]);
    }

    #[test]
    fn longer_file_is_not_truncated() {
        let config = Configuration::builder()
            .concurrency(1)
            .requests(2)
            .url("http://example/")
            .build();
        let source =
            plan_with_lines(&config, Termination::Count(2), &lines(&["a", "b", "c", "d", "e"]));

        assert_eq!(source.len(), 5);
    }

    #[test]
    fn duration_mode_does_not_extend() {
        let config = Configuration::builder()
            .concurrency(1)
            .duration_secs(5)
            .url("http://example/")
            .build();
        let termination = Termination::Duration(Duration::from_secs(5));

        assert_eq!(plan_with_lines(&config, termination, &[]).len(), DURATION_BASE_LEN);
        assert_eq!(
            plan_with_lines(&config, termination, &lines(&["a", "b", "c"])).len(),
            3
        );
    }

    #[test]
    fn round_robin_extension_keeps_base_order() {
        let mut items = vec![1, 2, 3];
        extend_round_robin(&mut items, 8);
        assert_eq!(items, vec![1, 2, 3, 1, 2, 3, 1, 2]);

        let mut empty: Vec<u8> = Vec::new();
        extend_round_robin(&mut empty, 4);
        assert!(empty.is_empty());
    }

    #[test]
    fn missing_file_reads_as_no_lines() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_param_lines(&dir.path().join("absent.txt")).is_empty());
    }

    #[test]
    fn reads_lines_without_terminators() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "a\r\nb\n\nc").unwrap();

        assert_eq!(read_param_lines(file.path()), lines(&["a", "b", "", "c"]));
    }

    #[test]
    fn unreadable_file_falls_back_to_plain_url() {
        let config = Configuration::builder()
            .concurrency(1)
            .requests(2)
            .url("http://example/")
            .param_file("/definitely/not/here.txt")
            .build();
        let source = plan(&config, Termination::Count(2));

        assert_eq!(urls(&source), vec!["http://example/"; 2]);
    }
}
