use std::string::FromUtf8Error;
use thiserror::Error;

/// All errors coming from the database/query layer.
#[derive(Debug, Error)]
pub enum DbError {
    /// Any PostgreSQL driver error.
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    /// Strict UTF-8 decoding failed on some text column.
    #[error("UTF-8 conversion error in column '{column}': {source}")]
    Utf8 {
        column: String,
        #[source]
        source: FromUtf8Error,
    },

    /// A result column has a type the exporter cannot render as text.
    #[error("Unsupported type '{type_name}' for column '{column}'")]
    UnsupportedType { column: String, type_name: String },

    /// The header probe and the streaming statement disagree on the columns.
    #[error("Header has {header} columns but the data statement returns {data}")]
    HeaderMismatch { header: usize, data: usize },

    /// An error occurred while building a SQL query.
    #[error("Query build error: {0}")]
    QueryBuildError(String),

    /// The stream was used after it was finished.
    #[error("Stream already finished")]
    StreamFinished,
}

/// Errors happening during connection setup.
#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("Invalid connection settings: {0}")]
    InvalidConfig(String),

    #[error("TLS setup failed: {0}")]
    Tls(#[from] native_tls::Error),

    #[error("PostgreSQL connection failed: {0}")]
    Postgres(#[from] tokio_postgres::Error),
}
