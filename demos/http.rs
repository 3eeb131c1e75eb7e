use std::{sync::Arc, time::Duration};

use volley::{
    Executor, Reporter, Scenario,
    aggregate::Outcomes,
    client::HttpClient,
    config::{Configuration, Termination},
    executor::DurationExecutor,
    plan::{RequestDescriptor, plan},
    report::{Summary, TextReporter},
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().init();

    let config = Configuration::builder()
        .concurrency(16)
        .duration_secs(5)
        .url("http://localhost:3000/")
        .build();
    let termination = Termination::Duration(Duration::from_secs(5));

    // NEVER build the client inside the action unless you want to kill performance
    let client = HttpClient::new().unwrap();

    let results = DurationExecutor::builder()
        .duration(Duration::from_secs(5))
        .workers(config.concurrency)
        .build()
        .exec(
            &Scenario::<Outcomes, _, _>::builder()
                .name("Http scenario")
                .work(plan(&config, termination))
                .action(move |descriptor: Arc<RequestDescriptor>| {
                    let client = client.clone();
                    async move { client.execute(&descriptor).await }
                })
                .build(),
        )
        .await
        .unwrap();

    TextReporter.report(&Summary::from(results)).await.unwrap();
}
