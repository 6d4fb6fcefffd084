use async_trait::async_trait;
use sql_resource_core::credentials::ConnectionDescriptor;
use sql_resource_core::error::DriverError;

/// Produces live database handles. The only way the executor reaches a
/// database, so tests can substitute a scripted double.
#[async_trait]
pub trait ConnectionFactory: Send + Sync {
    async fn open(&self, descriptor: &ConnectionDescriptor)
        -> Result<Box<dyn Connection>, DriverError>;
}

/// A live handle. Dropping it releases the underlying connection.
#[async_trait]
pub trait Connection: Send {
    async fn begin(&mut self) -> Result<(), DriverError>;

    /// Runs one statement inside the open transaction and returns the number
    /// of affected rows.
    async fn execute(&mut self, statement: &str) -> Result<u64, DriverError>;

    async fn commit(&mut self) -> Result<(), DriverError>;

    async fn rollback(&mut self) -> Result<(), DriverError>;
}
