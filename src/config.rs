use std::{fmt, path::PathBuf, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::error::ConfigError;

/// HTTP method used for every request of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    #[default]
    Get,
    /// Sends a url-encoded form body.
    Post,
}

impl FromStr for Method {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "get" => Ok(Method::Get),
            "post" => Ok(Method::Post),
            _ => Err(ConfigError::UnsupportedMethod(s.to_string())),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => f.write_str("GET"),
            Method::Post => f.write_str("POST"),
        }
    }
}

/// What ends a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Stop once the planned work source is exhausted.
    Count(u64),
    /// Stop once the timer has counted this many whole seconds.
    Duration(Duration),
}

/// Everything a run needs, fixed before dispatch and read-only afterwards.
///
/// ```rust
/// use volley::config::{Configuration, Method, Termination};
///
/// let config = Configuration::builder()
///     .concurrency(4)
///     .requests(100)
///     .url("http://localhost:3000/")
///     .method(Method::Get)
///     .build();
///
/// assert_eq!(config.validate(), Ok(Termination::Count(100)));
/// ```
#[derive(Debug, Clone, TypedBuilder, Serialize)]
pub struct Configuration {
    /// Number of concurrent workers.
    pub concurrency: usize,
    /// Target request count. Zero is the same as unset.
    #[builder(default, setter(strip_option))]
    pub requests: Option<u64>,
    /// Run length in seconds. Zero is the same as unset.
    #[builder(default, setter(strip_option))]
    pub duration_secs: Option<u64>,
    #[builder(default, setter(into))]
    pub url: String,
    #[builder(default)]
    pub method: Method,
    /// Static form fragment prepended to every POST body.
    #[builder(default, setter(into))]
    pub data: String,
    /// Per-request timeout.
    #[builder(default = Duration::from_secs(1))]
    pub timeout: Duration,
    /// Newline-delimited file of substitution values.
    #[builder(default, setter(strip_option, into))]
    pub param_file: Option<PathBuf>,
}

impl Configuration {
    /// Resolves the termination mode. A count wins over a duration when both are set.
    pub fn termination(&self) -> Option<Termination> {
        match (self.requests, self.duration_secs) {
            (Some(n), _) if n > 0 => Some(Termination::Count(n)),
            (_, Some(d)) if d > 0 => Some(Termination::Duration(Duration::from_secs(d))),
            _ => None,
        }
    }

    /// Checks the launcher-level rules and returns the termination mode on success.
    pub fn validate(&self) -> Result<Termination, ConfigError> {
        if self.concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        if self.url.is_empty() && self.param_file.is_none() {
            return Err(ConfigError::MissingTarget);
        }
        self.termination().ok_or(ConfigError::MissingTermination)
    }
}
