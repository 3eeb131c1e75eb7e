use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use reqwest::{Client, header::CONTENT_TYPE};
use tokio::time::Instant;

use crate::{config::Method, metric::RequestOutcome, plan::RequestDescriptor};

const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// Sends one request per [`RequestDescriptor`] and measures it.
///
/// Wraps a single `reqwest::Client`; clone this instead of building a new client
/// inside a worker.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new() -> crate::Result<Self> {
        Ok(Self::with_client(Client::builder().build()?))
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Issues the request and waits for the full body.
    ///
    /// Latency covers sending, the response head and the body. Any transport error
    /// (connect, timeout, body read) yields [`RequestOutcome::failed`] carrying the
    /// time that actually elapsed.
    pub async fn execute(&self, descriptor: &RequestDescriptor) -> RequestOutcome {
        let request = match descriptor.method {
            Method::Get => self.client.get(&descriptor.url),
            Method::Post => self
                .client
                .post(&descriptor.url)
                .header(CONTENT_TYPE, FORM_URLENCODED)
                .body(descriptor.body.clone()),
        }
        .timeout(descriptor.timeout);

        let start = Instant::now();
        let response = match request.send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::trace!("Request to {} failed: {e}", descriptor.url);
                return RequestOutcome::failed(start.elapsed());
            }
        };
        let status = response.status().as_u16();
        match response.bytes().await {
            Ok(body) => RequestOutcome::new(start.elapsed(), status, body.len() as u64),
            Err(e) => {
                tracing::trace!("Reading body from {} failed: {e}", descriptor.url);
                RequestOutcome::failed(start.elapsed())
            }
        }
    }

    /// Turns the client into an executor action.
    pub fn into_action(
        self,
    ) -> impl Fn(Arc<RequestDescriptor>) -> BoxFuture<'static, RequestOutcome>
    + Send
    + Sync
    + Clone
    + 'static {
        move |descriptor: Arc<RequestDescriptor>| {
            let client = self.clone();
            async move { client.execute(&descriptor).await }.boxed()
        }
    }
}
