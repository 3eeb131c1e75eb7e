use thiserror::Error;

/// Reasons a [`crate::config::Configuration`] is rejected before any request is sent.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("concurrency must be greater than zero")]
    ZeroConcurrency,

    #[error("either a url or a parameter file must be given")]
    MissingTarget,

    #[error("either a request count or a duration must be given")]
    MissingTermination,

    #[error("unsupported http method `{0}`, expected get or post")]
    UnsupportedMethod(String),
}

/// Errors surfaced by the library.
///
/// Transport failures are not in here: they become sentinel
/// [`crate::metric::RequestOutcome`]s and are counted, never raised.
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// A worker task panicked. There is no supervision, so the run is lost.
    #[error("worker task failed: {0}")]
    WorkerPanicked(#[from] tokio::task::JoinError),

    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
