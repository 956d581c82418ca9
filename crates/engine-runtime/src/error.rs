use crate::execution::stage::ExportStage;
use connectors::{
    file::csv::error::FileError,
    sql::base::error::{ConnectorError, DbError},
};
use engine_config::settings::SettingsError;
use thiserror::Error;

/// Top-level errors for an export run.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Settings were rejected before anything was started.
    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    /// The database could not be reached.
    #[error("Connection error: {0}")]
    Connector(#[from] ConnectorError),

    /// Query or row decoding failed.
    #[error("Database error at stage {stage}: {source}")]
    Database {
        stage: ExportStage,
        #[source]
        source: DbError,
    },

    /// Writing the CSV, the archive or removing the CSV failed.
    #[error("File error at stage {stage}: {source}")]
    File {
        stage: ExportStage,
        #[source]
        source: FileError,
    },
}

impl ExportError {
    /// Stage the run had reached when it failed, if it got past setup.
    pub fn stage(&self) -> Option<ExportStage> {
        match self {
            ExportError::Database { stage, .. } | ExportError::File { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}
