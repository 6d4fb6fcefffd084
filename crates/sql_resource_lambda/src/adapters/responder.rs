//! Delivery of the response document to the provisioning engine.

use async_trait::async_trait;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use sql_resource_core::contract::ResponseDocument;
use sql_resource_core::error::DriverError;

use crate::deadline::DELIVERY_TIMEOUT;

#[async_trait]
pub trait ResponseSender: Send + Sync {
    async fn send(&self, response_url: &str, document: &ResponseDocument)
        -> Result<(), DriverError>;
}

/// Uploads the document to the event's presigned URL.
#[derive(Debug, Clone)]
pub struct HttpResponseSender {
    client: reqwest::Client,
}

impl HttpResponseSender {
    /// Builds a sender whose uploads give up after [`DELIVERY_TIMEOUT`].
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(DELIVERY_TIMEOUT)
            .build()?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ResponseSender for HttpResponseSender {
    async fn send(
        &self,
        response_url: &str,
        document: &ResponseDocument,
    ) -> Result<(), DriverError> {
        let body = serde_json::to_vec(document)?;
        // The presigned URL is signed for an empty content type.
        self.client
            .put(response_url)
            .header(CONTENT_TYPE, "")
            .header(CONTENT_LENGTH, body.len())
            .body(body)
            .send()
            .await
            .map_err(|error| format!("failed to deliver response: {error}"))?
            .error_for_status()
            .map_err(|error| format!("response upload rejected: {error}"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use sql_resource_core::contract::{
        LifecycleEvent, ProvisionResponse, RequestType, ResourceProperties,
    };
    use tokio::net::TcpListener;

    use super::*;

    fn document() -> ResponseDocument {
        let event = LifecycleEvent::new(RequestType::Delete, ResourceProperties::new())
            .with_physical_resource_id("existing");
        ResponseDocument::new(&event, &ProvisionResponse::success("existing"), "log-stream")
    }

    #[tokio::test]
    async fn silent_endpoint_times_out_within_delivery_budget() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let address = listener.local_addr().expect("local addr");
        let server = tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.expect("accept");
            tokio::time::sleep(Duration::from_secs(30)).await;
        });

        let sender = HttpResponseSender::new().expect("client should build");
        let started = Instant::now();
        let result = sender
            .send(&format!("http://{address}/response"), &document())
            .await;

        assert!(result.is_err(), "hung upload should fail");
        assert!(started.elapsed() < DELIVERY_TIMEOUT + Duration::from_millis(500));
        server.abort();
    }
}
