use connectors::sql::base::error::ConnectorError;
use engine_config::settings::SettingsError;
use engine_runtime::error::ExportError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    /// The env file is unreadable or malformed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A flag or environment variable could not be parsed.
    #[error("Invalid value for {name}: {reason}")]
    InvalidValue { name: &'static str, reason: String },

    #[error("Invalid settings: {0}")]
    Settings(#[from] SettingsError),

    #[error("Connection failed: {0}")]
    Connector(#[from] ConnectorError),

    #[error("Export failed: {0}")]
    Export(#[from] ExportError),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}
