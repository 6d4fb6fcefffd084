use sql_resource_core::contract::{LifecycleEvent, ProvisionResponse, ResponseDocument};
use sql_resource_core::error::DriverError;
use tokio::time::Instant;

use crate::adapters::responder::ResponseSender;
use crate::handlers::custom_resource::CustomResourceHandler;

/// Handles one event and reports the outcome to the event's response URL.
///
/// Only a delivery failure is returned as an error: a failed Create is a
/// successful invocation that reports `FAILED` to the engine.
pub async fn process_invocation(
    handler: &CustomResourceHandler<'_>,
    responder: &dyn ResponseSender,
    event: &LifecycleEvent,
    deadline: Option<Instant>,
    log_stream_name: &str,
) -> Result<ProvisionResponse, DriverError> {
    let response = handler.handle(event, deadline).await;
    if response.physical_resource_id.is_empty() {
        tracing::info!(
            log_stream_name,
            "PhysicalResourceId must exist, copying log stream name"
        );
    }

    let document = ResponseDocument::new(event, &response, log_stream_name);
    tracing::info!(
        status = ?document.status,
        physical_resource_id = %document.physical_resource_id,
        "Sending response"
    );
    responder.send(&event.response_url, &document).await?;

    Ok(response)
}
