use std::sync::Arc;
use std::time::SystemTime;

use async_trait::async_trait;
use aws_sdk_secretsmanager::error::DisplayErrorContext;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use sql_resource_core::contract::LifecycleEvent;
use sql_resource_core::error::DriverError;
use sql_resource_lambda::adapters::mssql::MssqlConnectionFactory;
use sql_resource_lambda::adapters::responder::HttpResponseSender;
use sql_resource_lambda::adapters::secret_store::{CachingSecretStore, SecretStore};
use sql_resource_lambda::config::HandlerConfig;
use sql_resource_lambda::deadline::processing_deadline;
use sql_resource_lambda::handlers::custom_resource::CustomResourceHandler;
use sql_resource_lambda::handlers::invocation::process_invocation;
use tracing_subscriber::EnvFilter;

struct SecretsManagerStore {
    client: aws_sdk_secretsmanager::Client,
    version_stage: String,
}

#[async_trait]
impl SecretStore for SecretsManagerStore {
    async fn fetch_secret(&self, secret_id: &str) -> Result<Option<String>, DriverError> {
        let output = self
            .client
            .get_secret_value()
            .secret_id(secret_id)
            .version_stage(&self.version_stage)
            .send()
            .await
            .map_err(|error| DisplayErrorContext(error).to_string())?;
        Ok(output.secret_string().map(str::to_string))
    }
}

struct RuntimeDependencies {
    config: HandlerConfig,
    secrets: Box<dyn SecretStore>,
    connections: MssqlConnectionFactory,
    responder: HttpResponseSender,
}

async fn handle_request(
    event: LambdaEvent<LifecycleEvent>,
    deps: &RuntimeDependencies,
) -> Result<(), Error> {
    let deadline = processing_deadline(event.context.deadline, SystemTime::now());
    let handler =
        CustomResourceHandler::new(deps.secrets.as_ref(), &deps.connections, &deps.config);

    process_invocation(
        &handler,
        &deps.responder,
        &event.payload,
        deadline,
        &event.context.env_config.log_stream,
    )
    .await?;
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();

    let config = HandlerConfig::from_env()?;
    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let store = SecretsManagerStore {
        client: aws_sdk_secretsmanager::Client::new(&aws_config),
        version_stage: config.secret_version_stage.clone(),
    };
    let secrets: Box<dyn SecretStore> = match config.secret_cache_ttl {
        Some(ttl) => Box::new(CachingSecretStore::new(store, ttl)),
        None => Box::new(store),
    };
    tracing::info!(
        default_secret_id = config.default_secret_id.as_deref().unwrap_or(""),
        secret_cache_ttl_secs = config.secret_cache_ttl.map(|ttl| ttl.as_secs()),
        "SQL resource handler starting"
    );

    let deps = Arc::new(RuntimeDependencies {
        connections: MssqlConnectionFactory::new(config.trust_server_certificate),
        responder: HttpResponseSender::new()?,
        secrets,
        config,
    });

    lambda_runtime::run(service_fn(move |event: LambdaEvent<LifecycleEvent>| {
        let deps = Arc::clone(&deps);
        async move { handle_request(event, &deps).await }
    }))
    .await
}
