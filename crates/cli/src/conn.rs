use crate::error::CliError;
use async_trait::async_trait;
use connectors::sql::postgres::utils::{ConnectionParams, connect_client, ping};
use tracing::{error, info};

/// Trait for "pinging" a data source
#[async_trait]
pub trait ConnectionPinger {
    /// Attempts to ping; returns Err if unreachable
    async fn ping(&self) -> Result<(), CliError>;
}

/// Postgres pinger
pub struct PostgresConnectionPinger {
    pub params: ConnectionParams,
}

#[async_trait]
impl ConnectionPinger for PostgresConnectionPinger {
    async fn ping(&self) -> Result<(), CliError> {
        info!("Pinging Postgres at '{}'", &self.params);

        let config = self.params.to_config()?;
        let client = connect_client(&config).await.map_err(|e| {
            error!("Postgres connection to '{}' failed: {}", &self.params, e);
            CliError::Connector(e)
        })?;

        ping(&client).await.map_err(|e| {
            error!("Postgres ping query on '{}' failed: {}", &self.params, e);
            CliError::Connector(e)
        })?;

        info!("Postgres ping to '{}' succeeded", &self.params);
        Ok(())
    }
}
