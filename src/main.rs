use std::{path::PathBuf, process::ExitCode, time::Duration};

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use volley::{
    ConfigError,
    Reporter,
    config::{Configuration, Method},
    report::{JsonReporter, Summary, TextReporter},
    runner,
};

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum Output {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "volley")]
#[command(about = "Concurrent HTTP load generator", long_about = None)]
#[command(version)]
struct Cli {
    /// Number of concurrent workers
    #[arg(short = 'c', long)]
    concurrency: Option<usize>,

    /// Requests per worker; takes precedence over --duration
    #[arg(short = 'n', long)]
    requests: Option<u64>,

    /// Run length in seconds
    #[arg(short = 'a', long)]
    duration: Option<u64>,

    /// Per-request timeout in seconds
    #[arg(short = 't', long, default_value_t = 1)]
    timeout: u64,

    /// Target url; with --file and GET, each line is appended to it
    #[arg(short = 'u', long)]
    url: Option<String>,

    /// File of newline-delimited parameter values
    #[arg(short = 'f', long)]
    file: Option<PathBuf>,

    /// HTTP method: get or post
    #[arg(short = 'm', long, default_value = "get")]
    method: Method,

    /// Static url-encoded POST body; file lines are appended after `&`
    #[arg(short = 'd', long)]
    data: Option<String>,

    /// Report format
    #[arg(short = 'o', long, value_enum, default_value_t = Output::Text)]
    output: Output,
}

impl Cli {
    fn into_config(self) -> Configuration {
        Configuration {
            concurrency: self.concurrency.unwrap_or(0),
            requests: self.requests,
            duration_secs: self.duration,
            url: self.url.unwrap_or_default(),
            method: self.method,
            data: self.data.unwrap_or_default(),
            timeout: Duration::from_secs(self.timeout),
            param_file: self.file,
        }
    }
}

/// The message printed to stderr when a configuration is rejected: the error,
/// then the usage text.
fn usage_error(error: &ConfigError) -> String {
    format!("error: {error}\n\n{}\n", Cli::command().render_help())
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "volley=info".into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let output = cli.output;
    let config = cli.into_config();

    if let Err(e) = config.validate() {
        eprint!("{}", usage_error(&e));
        return ExitCode::from(2);
    }

    match run(&config, output).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: &Configuration, output: Output) -> Result<()> {
    eprintln!("Load test started, please wait...");
    let results = runner::run(config).await.context("load test failed")?;
    let summary = Summary::from(results);

    let written = match output {
        Output::Text => TextReporter.report(&summary).await,
        Output::Json => JsonReporter.report(&summary).await,
    };
    written.context("failed to write report")
}
