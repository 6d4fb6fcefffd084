use sql_resource_core::credentials::ConnectionDescriptor;
use sql_resource_core::error::ProvisionError;
use tokio::time::Instant;

use crate::adapters::connection::ConnectionFactory;
use crate::deadline::{bounded, cleanup_budget};

/// Runs `statement` inside a single transaction on a fresh connection.
///
/// A failed statement is rolled back and reported as
/// [`ProvisionError::Statement`]; a rollback failure is only logged. The
/// rollback gets the connect timeout, cut short so it ends within the cleanup
/// grace past `deadline`. Nothing is retried. The connection is dropped on every return path.
pub async fn execute_in_transaction(
    factory: &dyn ConnectionFactory,
    descriptor: &ConnectionDescriptor,
    statement: &str,
    deadline: Option<Instant>,
) -> Result<u64, ProvisionError> {
    let mut connection = bounded(deadline, "connect", factory.open(descriptor))
        .await
        .map_err(ProvisionError::Connection)?;

    tracing::info!("Begin Tx");
    bounded(deadline, "begin transaction", connection.begin())
        .await
        .map_err(ProvisionError::Transaction)?;

    let executed = bounded(deadline, "statement", connection.execute(statement)).await;
    let rows_affected = match executed {
        Ok(rows_affected) => rows_affected,
        Err(error) => {
            tracing::warn!(error = %error, "Fail Tx");
            let budget = cleanup_budget(deadline, descriptor.connect_timeout());
            let rollback = tokio::time::timeout(budget, connection.rollback());
            match rollback.await {
                Ok(Ok(())) => {}
                Ok(Err(rollback_error)) => {
                    tracing::warn!(error = %rollback_error, "Rollback failed");
                }
                Err(_) => tracing::warn!("Rollback timed out"),
            }
            return Err(ProvisionError::Statement(error));
        }
    };

    bounded(deadline, "commit", connection.commit())
        .await
        .map_err(ProvisionError::Commit)?;
    tracing::info!(rows_affected, "End Tx");

    Ok(rows_affected)
}
