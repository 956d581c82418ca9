use crate::sql::base::error::ConnectorError;
use chrono_tz::Tz;
use model::core::encoding::TextDecoding;
use native_tls::TlsConnector;
use postgres_native_tls::MakeTlsConnector;
use std::fmt;
use tokio_postgres::{Client, Config, NoTls, config::SslMode};
use tracing::{debug, error, warn};

/// Connection settings for the source database.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionParams {
    pub host: String,
    pub port: u16,
    pub dbname: String,
    pub user: String,
    pub password: Option<String>,
    pub ssl_mode: SslMode,
    pub application_name: String,
}

impl ConnectionParams {
    pub fn to_config(&self) -> Result<Config, ConnectorError> {
        if self.host.trim().is_empty() {
            return Err(ConnectorError::InvalidConfig("host must not be empty".into()));
        }
        if self.port == 0 {
            return Err(ConnectorError::InvalidConfig("port must not be 0".into()));
        }

        let mut config = Config::new();
        config
            .host(self.host.trim())
            .port(self.port)
            .dbname(&self.dbname)
            .user(&self.user)
            .ssl_mode(self.ssl_mode)
            .application_name(&self.application_name);
        if let Some(password) = &self.password {
            config.password(password);
        }
        Ok(config)
    }
}

impl fmt::Debug for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionParams")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("dbname", &self.dbname)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("ssl_mode", &self.ssl_mode)
            .field("application_name", &self.application_name)
            .finish()
    }
}

impl fmt::Display for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}/{}", self.user, self.host, self.port, self.dbname)
    }
}

pub fn parse_ssl_mode(value: &str) -> Result<SslMode, String> {
    match value.to_lowercase().as_str() {
        "disable" => Ok(SslMode::Disable),
        "prefer" => Ok(SslMode::Prefer),
        "require" => Ok(SslMode::Require),
        other => Err(format!("Unknown sslmode: {other}")),
    }
}

pub async fn connect_client(config: &Config) -> Result<Client, ConnectorError> {
    match config.get_ssl_mode() {
        SslMode::Disable => connect_without_tls(config).await,
        SslMode::Prefer => match connect_with_tls(config).await {
            Ok(client) => Ok(client),
            Err(error) => {
                warn!(%error, "Postgres TLS handshake failed, retrying without TLS");
                connect_without_tls(config).await
            }
        },
        _ => connect_with_tls(config).await,
    }
}

pub(crate) async fn connect_with_tls(config: &Config) -> Result<Client, ConnectorError> {
    let connector = TlsConnector::builder().build()?;
    let tls = MakeTlsConnector::new(connector);
    let (client, connection) = config.connect(tls).await?;
    tokio::spawn(async move {
        if let Err(err) = connection.await {
            error!(%err, "Postgres connection error");
        }
    });
    Ok(client)
}

pub(crate) async fn connect_without_tls(config: &Config) -> Result<Client, ConnectorError> {
    let (client, connection) = config.connect(NoTls).await?;
    tokio::spawn(async move {
        if let Err(err) = connection.await {
            error!(%err, "Postgres connection error");
        }
    });
    Ok(client)
}

pub fn client_encoding_sql(decoding: TextDecoding) -> String {
    format!("SET client_encoding TO '{}'", decoding.client_encoding())
}

/// Switches the session's `client_encoding` so the server sends text in the
/// encoding `decoding` reads.
pub async fn set_client_encoding(
    client: &Client,
    decoding: TextDecoding,
) -> Result<(), ConnectorError> {
    let sql = client_encoding_sql(decoding);
    debug!(%sql, "Setting session encoding");
    client.batch_execute(&sql).await?;
    Ok(())
}

/// Resolves a `SHOW TimeZone` value. Names outside the IANA database, such as
/// POSIX offset strings, fall back to UTC.
pub fn parse_time_zone(name: &str) -> Tz {
    name.parse::<Tz>().unwrap_or_else(|_| {
        warn!(zone = name, "Unknown session time zone, rendering timestamptz in UTC");
        chrono_tz::UTC
    })
}

/// Runs `SELECT 1` to confirm the server answers queries.
pub async fn ping(client: &Client) -> Result<(), ConnectorError> {
    let row = client.query_one("SELECT 1", &[]).await?;
    let val: i32 = row.try_get(0)?;
    if val != 1 {
        return Err(ConnectorError::InvalidConfig(format!(
            "ping returned unexpected result: {val}"
        )));
    }
    Ok(())
}
