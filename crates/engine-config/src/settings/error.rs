use connectors::sql::base::error::ConnectorError;
use model::core::window::WindowError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while assembling or validating export settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// A required setting was not provided.
    #[error("Missing setting: {0}")]
    Missing(&'static str),

    /// A setting was provided but is blank.
    #[error("Setting '{0}' must not be empty")]
    Empty(&'static str),

    /// A numeric setting is out of its allowed range.
    #[error("Invalid value for '{name}': {reason}")]
    OutOfRange { name: &'static str, reason: String },

    /// The output directory is missing or not a directory.
    #[error("Output directory {0} does not exist or is not a directory")]
    OutputDir(PathBuf),

    /// The export day could not be turned into a window.
    #[error("Invalid export day: {0}")]
    Window(#[from] WindowError),

    /// Connection parameters were rejected.
    #[error("Invalid connection settings: {0}")]
    Connection(#[from] ConnectorError),
}
