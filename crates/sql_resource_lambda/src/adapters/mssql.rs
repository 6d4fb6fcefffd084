//! SQL Server connection factory backed by `tiberius`.

use async_trait::async_trait;
use sql_resource_core::credentials::ConnectionDescriptor;
use sql_resource_core::error::DriverError;
use tiberius::{AuthMethod, Client, Config};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

use crate::adapters::connection::{Connection, ConnectionFactory};

const APPLICATION_NAME: &str = "sql-resource";

#[derive(Debug, Clone, Copy, Default)]
pub struct MssqlConnectionFactory {
    trust_server_certificate: bool,
}

impl MssqlConnectionFactory {
    pub fn new(trust_server_certificate: bool) -> Self {
        Self {
            trust_server_certificate,
        }
    }

    pub fn client_config(&self, descriptor: &ConnectionDescriptor) -> Config {
        let mut config = Config::new();
        config.host(descriptor.host());
        config.port(descriptor.port());
        config.database(descriptor.database());
        config.application_name(APPLICATION_NAME);
        config.authentication(AuthMethod::sql_server(
            descriptor.username(),
            descriptor.password(),
        ));
        if self.trust_server_certificate {
            config.trust_cert();
        }
        config
    }
}

#[async_trait]
impl ConnectionFactory for MssqlConnectionFactory {
    async fn open(
        &self,
        descriptor: &ConnectionDescriptor,
    ) -> Result<Box<dyn Connection>, DriverError> {
        let config = self.client_config(descriptor);
        let address = config.get_addr();
        let timeout = descriptor.connect_timeout();

        let connect = async {
            let tcp = TcpStream::connect(&address).await?;
            tcp.set_nodelay(true)?;
            let client = Client::connect(config, tcp.compat_write()).await?;
            Ok::<_, DriverError>(client)
        };

        let client = tokio::time::timeout(timeout, connect)
            .await
            .map_err(|_| {
                DriverError::from(format!(
                    "connection to {address} timed out after {}s",
                    timeout.as_secs()
                ))
            })??;

        tracing::debug!(address = %address, database = descriptor.database(), "Opened connection");
        Ok(Box::new(MssqlConnection { client }))
    }
}

struct MssqlConnection {
    client: Client<Compat<TcpStream>>,
}

impl MssqlConnection {
    async fn batch(&mut self, sql: &'static str) -> Result<(), DriverError> {
        self.client.simple_query(sql).await?.into_results().await?;
        Ok(())
    }
}

#[async_trait]
impl Connection for MssqlConnection {
    async fn begin(&mut self) -> Result<(), DriverError> {
        self.batch("BEGIN TRANSACTION").await
    }

    async fn execute(&mut self, statement: &str) -> Result<u64, DriverError> {
        let result = self.client.execute(statement, &[]).await?;
        Ok(result.total())
    }

    async fn commit(&mut self) -> Result<(), DriverError> {
        self.batch("COMMIT TRANSACTION").await
    }

    async fn rollback(&mut self) -> Result<(), DriverError> {
        self.batch("IF @@TRANCOUNT > 0 ROLLBACK TRANSACTION").await
    }
}
