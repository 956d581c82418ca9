use crate::settings::error::SettingsError;
use chrono::NaiveDate;
use connectors::sql::{base::query::RangeQuery, postgres::utils::ConnectionParams};
use model::core::{encoding::TextDecoding, window::ExportWindow};
use std::path::PathBuf;
use tokio_postgres::config::SslMode;
use tracing::debug;

pub const DEFAULT_PORT: u16 = 5432;
pub const DEFAULT_TABLE: &str = "public.orders";
pub const DEFAULT_TIMESTAMP_COLUMN: &str = "update_stamp";
pub const DEFAULT_OUTPUT_DIR: &str = "/var/tmp";
pub const DEFAULT_FILE_PREFIX: &str = "orders";
pub const DEFAULT_FETCH_SIZE: usize = 2000;
pub const DEFAULT_PROGRESS_EVERY: u64 = 10_000;
pub const DEFAULT_APPLICATION_NAME: &str = "orders-export";

/// Immutable, validated configuration for a single export run.
#[derive(Debug, Clone)]
pub struct ExportSettings {
    /// Source database connection
    pub connection: ConnectionParams,
    /// Day selecting the `[00:00, next-day 00:00)` export window
    pub day: NaiveDate,
    /// Table to export, optionally schema-qualified
    pub table: String,
    /// Column the window is applied to
    pub timestamp_column: String,
    /// Optional column for a stable row order
    pub order_by: Option<String>,
    /// Directory receiving the CSV and the archive
    pub output_dir: PathBuf,
    /// File name prefix of both artifacts
    pub file_prefix: String,
    /// Rows fetched from the server-side cursor per round trip
    pub fetch_size: usize,
    /// Emit a progress line every this many rows
    pub progress_every: u64,
    /// How text columns are decoded
    pub text_decoding: TextDecoding,
    /// Keep the CSV next to the archive instead of deleting it
    pub keep_csv: bool,
}

impl ExportSettings {
    pub fn builder() -> ExportSettingsBuilder {
        ExportSettingsBuilder::default()
    }

    pub fn from_builder(builder: ExportSettingsBuilder) -> Result<Self, SettingsError> {
        let connection = ConnectionParams {
            host: required("host", builder.host)?,
            port: builder.port.unwrap_or(DEFAULT_PORT),
            dbname: required("dbname", builder.dbname)?,
            user: required("user", builder.user)?,
            password: builder.password,
            ssl_mode: builder.ssl_mode.unwrap_or(SslMode::Prefer),
            application_name: builder
                .application_name
                .unwrap_or_else(|| DEFAULT_APPLICATION_NAME.to_string()),
        };

        let settings = ExportSettings {
            connection,
            day: builder.day.ok_or(SettingsError::Missing("day"))?,
            table: builder.table.unwrap_or_else(|| DEFAULT_TABLE.to_string()),
            timestamp_column: builder
                .timestamp_column
                .unwrap_or_else(|| DEFAULT_TIMESTAMP_COLUMN.to_string()),
            order_by: builder.order_by.filter(|c| !c.trim().is_empty()),
            output_dir: builder
                .output_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            file_prefix: builder
                .file_prefix
                .unwrap_or_else(|| DEFAULT_FILE_PREFIX.to_string()),
            fetch_size: builder.fetch_size.unwrap_or(DEFAULT_FETCH_SIZE),
            progress_every: builder.progress_every.unwrap_or(DEFAULT_PROGRESS_EVERY),
            text_decoding: builder.text_decoding.unwrap_or_default(),
            keep_csv: builder.keep_csv,
        };

        settings.validate()?;
        debug!(?settings, "Export settings validated");
        Ok(settings)
    }

    /// Checks every setting before any connection is opened or file created.
    pub fn validate(&self) -> Result<(), SettingsError> {
        self.connection.to_config()?;
        non_empty("dbname", &self.connection.dbname)?;
        non_empty("user", &self.connection.user)?;
        non_empty("table", &self.table)?;
        non_empty("timestamp_column", &self.timestamp_column)?;
        non_empty("file_prefix", &self.file_prefix)?;

        if self.file_prefix.contains(['/', '\\']) {
            return Err(SettingsError::OutOfRange {
                name: "file_prefix",
                reason: "must not contain path separators".into(),
            });
        }
        if self.fetch_size == 0 || self.fetch_size > i32::MAX as usize {
            return Err(SettingsError::OutOfRange {
                name: "fetch_size",
                reason: format!("{} is not in 1..={}", self.fetch_size, i32::MAX),
            });
        }
        if self.progress_every == 0 {
            return Err(SettingsError::OutOfRange {
                name: "progress_every",
                reason: "must be greater than 0".into(),
            });
        }
        if !self.output_dir.is_dir() {
            return Err(SettingsError::OutputDir(self.output_dir.clone()));
        }

        self.window()?;
        self.range_query()
            .stream_sql()
            .map_err(|e| SettingsError::OutOfRange {
                name: "table",
                reason: e.to_string(),
            })?;
        Ok(())
    }

    pub fn window(&self) -> Result<ExportWindow, SettingsError> {
        Ok(ExportWindow::for_day(self.day)?)
    }

    pub fn range_query(&self) -> RangeQuery {
        RangeQuery::new(&self.table, &self.timestamp_column).with_order_by(self.order_by.clone())
    }
}

fn required(name: &'static str, value: Option<String>) -> Result<String, SettingsError> {
    let value = value.ok_or(SettingsError::Missing(name))?;
    non_empty(name, &value)?;
    Ok(value)
}

fn non_empty(name: &'static str, value: &str) -> Result<(), SettingsError> {
    if value.trim().is_empty() {
        return Err(SettingsError::Empty(name));
    }
    Ok(())
}

/// Collects settings from the CLI, environment or tests before validation.
#[derive(Debug, Clone, Default)]
pub struct ExportSettingsBuilder {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub dbname: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub ssl_mode: Option<SslMode>,
    pub application_name: Option<String>,
    pub day: Option<NaiveDate>,
    pub table: Option<String>,
    pub timestamp_column: Option<String>,
    pub order_by: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub file_prefix: Option<String>,
    pub fetch_size: Option<usize>,
    pub progress_every: Option<u64>,
    pub text_decoding: Option<TextDecoding>,
    pub keep_csv: bool,
}

impl ExportSettingsBuilder {
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn dbname(mut self, dbname: impl Into<String>) -> Self {
        self.dbname = Some(dbname.into());
        self
    }

    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn ssl_mode(mut self, ssl_mode: SslMode) -> Self {
        self.ssl_mode = Some(ssl_mode);
        self
    }

    pub fn day(mut self, day: NaiveDate) -> Self {
        self.day = Some(day);
        self
    }

    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn timestamp_column(mut self, column: impl Into<String>) -> Self {
        self.timestamp_column = Some(column.into());
        self
    }

    pub fn order_by(mut self, column: impl Into<String>) -> Self {
        self.order_by = Some(column.into());
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn file_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.file_prefix = Some(prefix.into());
        self
    }

    pub fn fetch_size(mut self, fetch_size: usize) -> Self {
        self.fetch_size = Some(fetch_size);
        self
    }

    pub fn progress_every(mut self, rows: u64) -> Self {
        self.progress_every = Some(rows);
        self
    }

    pub fn text_decoding(mut self, decoding: TextDecoding) -> Self {
        self.text_decoding = Some(decoding);
        self
    }

    pub fn keep_csv(mut self, keep: bool) -> Self {
        self.keep_csv = keep;
        self
    }

    pub fn build(self) -> Result<ExportSettings, SettingsError> {
        ExportSettings::from_builder(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 12, 7).unwrap()
    }

    fn builder(dir: &std::path::Path) -> ExportSettingsBuilder {
        ExportSettings::builder()
            .host("localhost")
            .dbname("shop")
            .user("exporter")
            .day(day())
            .output_dir(dir)
    }

    #[test]
    fn test_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = builder(dir.path()).build().unwrap();

        assert_eq!(settings.connection.port, 5432);
        assert_eq!(settings.table, "public.orders");
        assert_eq!(settings.timestamp_column, "update_stamp");
        assert_eq!(settings.file_prefix, "orders");
        assert_eq!(settings.fetch_size, 2000);
        assert_eq!(settings.progress_every, 10_000);
        assert_eq!(settings.text_decoding, TextDecoding::Latin1);
        assert_eq!(settings.order_by, None);
        assert!(!settings.keep_csv);
    }

    #[test]
    fn test_window_from_day() {
        let dir = tempfile::tempdir().unwrap();
        let settings = builder(dir.path()).build().unwrap();
        assert_eq!(
            settings.window().unwrap().to_string(),
            "[2025-12-07 00:00:00, 2025-12-08 00:00:00)"
        );
    }

    #[test]
    fn test_missing_and_empty_host() {
        let dir = tempfile::tempdir().unwrap();

        let mut no_host = builder(dir.path());
        no_host.host = None;
        assert!(matches!(no_host.build(), Err(SettingsError::Missing("host"))));

        let blank = builder(dir.path()).host("   ");
        assert!(matches!(blank.build(), Err(SettingsError::Empty("host"))));
    }

    #[test]
    fn test_missing_day() {
        let dir = tempfile::tempdir().unwrap();
        let mut b = builder(dir.path());
        b.day = None;
        assert!(matches!(b.build(), Err(SettingsError::Missing("day"))));
    }

    #[test]
    fn test_rejects_zero_sizes() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            builder(dir.path()).fetch_size(0).build(),
            Err(SettingsError::OutOfRange { name: "fetch_size", .. })
        ));
        assert!(matches!(
            builder(dir.path()).progress_every(0).build(),
            Err(SettingsError::OutOfRange { name: "progress_every", .. })
        ));
        assert!(matches!(
            builder(dir.path()).port(0).build(),
            Err(SettingsError::Connection(_))
        ));
    }

    #[test]
    fn test_rejects_missing_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            builder(dir.path()).output_dir(&missing).build(),
            Err(SettingsError::OutputDir(_))
        ));
    }

    #[test]
    fn test_rejects_bad_identifiers() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            builder(dir.path()).table("public.").build(),
            Err(SettingsError::OutOfRange { name: "table", .. })
        ));
        assert!(matches!(
            builder(dir.path()).file_prefix("../orders").build(),
            Err(SettingsError::OutOfRange { name: "file_prefix", .. })
        ));
    }

    #[test]
    fn test_blank_order_by_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let settings = builder(dir.path()).order_by(" ").build().unwrap();
        assert_eq!(settings.order_by, None);

        let ordered = builder(dir.path()).order_by("id").build().unwrap();
        assert!(ordered.range_query().stream_sql().unwrap().ends_with(r#"ORDER BY "id""#));
    }
}
