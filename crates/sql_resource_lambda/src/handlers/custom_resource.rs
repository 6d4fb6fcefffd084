//! Lifecycle event processing for the SQL custom resource.
//!
//! A Create request moves through validation, secret resolution, execution
//! and response. Any failure short-circuits to a response that carries the
//! error and the event's existing physical id. Update and Delete are accepted
//! as no-ops and echo the existing physical id.

use sql_resource_core::contract::{
    unusable_secret_id, validate_properties, LifecycleEvent, ProvisionResponse, RequestType,
};
use sql_resource_core::credentials::{decode_credentials, ConnectionDescriptor};
use sql_resource_core::error::ProvisionError;
use sql_resource_core::identity::ResourceIdentity;
use tokio::time::Instant;

use crate::adapters::connection::ConnectionFactory;
use crate::adapters::secret_store::{resolve_secret, SecretStore};
use crate::config::HandlerConfig;
use crate::handlers::transaction::execute_in_transaction;

pub struct CustomResourceHandler<'a> {
    secrets: &'a dyn SecretStore,
    connections: &'a dyn ConnectionFactory,
    config: &'a HandlerConfig,
}

impl<'a> CustomResourceHandler<'a> {
    pub fn new(
        secrets: &'a dyn SecretStore,
        connections: &'a dyn ConnectionFactory,
        config: &'a HandlerConfig,
    ) -> Self {
        Self {
            secrets,
            connections,
            config,
        }
    }

    pub async fn handle(
        &self,
        event: &LifecycleEvent,
        deadline: Option<Instant>,
    ) -> ProvisionResponse {
        log_event(event);

        match event.request_type {
            RequestType::Create => match self.create(event, deadline).await {
                Ok(identity) => {
                    tracing::info!(physical_resource_id = %identity, "Statement committed");
                    ProvisionResponse::success(identity)
                }
                Err(error) => {
                    tracing::error!(kind = error.kind(), error = %error, "Create failed");
                    ProvisionResponse::failure(event.physical_resource_id.clone(), &error)
                }
            },
            RequestType::Update | RequestType::Delete => {
                tracing::info!(request_type = event.request_type.as_str(), "Ignore");
                ProvisionResponse::success(event.physical_resource_id.clone())
            }
        }
    }

    async fn create(
        &self,
        event: &LifecycleEvent,
        deadline: Option<Instant>,
    ) -> Result<ResourceIdentity, ProvisionError> {
        let properties = validate_properties(
            &event.resource_properties,
            self.config.default_secret_id.as_deref(),
        )?;
        if let Some(found) = unusable_secret_id(&event.resource_properties) {
            tracing::warn!(
                found,
                secret_id = %properties.secret_id,
                "Ignoring unusable SecretId property, using configured secret"
            );
        }
        tracing::debug!(
            database = %properties.database,
            secret_id = %properties.secret_id,
            "Validated"
        );

        let payload = resolve_secret(self.secrets, &properties.secret_id, deadline).await?;
        let credentials = decode_credentials(&payload)?;
        let descriptor = ConnectionDescriptor::build(credentials, &properties.database);
        tracing::debug!(connection = %descriptor, "Secret resolved");

        execute_in_transaction(
            self.connections,
            &descriptor,
            &properties.sql_query,
            deadline,
        )
        .await?;

        Ok(ResourceIdentity::derive(
            &properties.database,
            &properties.sql_query,
            &properties.secret_id,
        ))
    }
}

fn log_event(event: &LifecycleEvent) {
    let property_names: Vec<&str> = event
        .resource_properties
        .keys()
        .map(String::as_str)
        .collect();
    tracing::info!(
        request_type = event.request_type.as_str(),
        request_id = %event.request_id,
        stack_id = %event.stack_id,
        logical_resource_id = %event.logical_resource_id,
        physical_resource_id = %event.physical_resource_id,
        resource_type = %event.resource_type,
        properties = ?property_names,
        "Received lifecycle event"
    );
}
