use crate::{
    Executor,
    aggregate::{Outcomes, ResultSet},
    client::HttpClient,
    config::{Configuration, Termination},
    error::Result,
    executor::{CountExecutor, DurationExecutor},
    plan::plan,
    scenario::Scenario,
};

/// Runs a whole load test: validate, plan, dispatch over HTTP, join.
pub async fn run(config: &Configuration) -> Result<ResultSet<Outcomes>> {
    run_with_client(config, HttpClient::new()?).await
}

/// Same as [`run`] with a caller-supplied client.
pub async fn run_with_client(
    config: &Configuration,
    client: HttpClient,
) -> Result<ResultSet<Outcomes>> {
    let termination = config.validate()?;
    tracing::info!(
        "Starting {} load test against {} with {} workers ({termination:?})",
        config.method,
        config.url,
        config.concurrency
    );

    let scenario = Scenario::<Outcomes, _, _>::builder()
        .name(format!("{} {}", config.method, config.url))
        .work(plan(config, termination))
        .action(client.into_action())
        .build();

    match termination {
        Termination::Count(_) => {
            CountExecutor::builder()
                .workers(config.concurrency)
                .build()
                .exec(&scenario)
                .await
        }
        Termination::Duration(duration) => {
            DurationExecutor::builder()
                .duration(duration)
                .workers(config.concurrency)
                .build()
                .exec(&scenario)
                .await
        }
    }
}
