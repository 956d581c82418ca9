use crate::{
    env::{
        EXPORT_DAY, EXPORT_OUTPUT_DIR, EnvManager, PGAPPNAME, PGDATABASE, PGHOST, PGPASSWORD,
        PGPORT, PGSSLMODE, PGUSER,
    },
    error::CliError,
};
use chrono::{Local, NaiveDate};
use clap::{Args, Subcommand};
use connectors::sql::postgres::utils::{ConnectionParams, parse_ssl_mode};
use engine_config::settings::{
    ExportSettingsBuilder, SettingsError,
    export::{DEFAULT_APPLICATION_NAME, DEFAULT_PORT},
};
use model::core::{encoding::TextDecoding, window::parse_day};
use std::path::PathBuf;
use tokio_postgres::config::SslMode;

#[derive(Subcommand)]
pub enum Commands {
    /// Export one day of orders to a CSV file and archive it as tar.gz
    Export(ExportArgs),

    /// Connect to the database and run `SELECT 1`
    TestConn {
        #[command(flatten)]
        conn: ConnArgs,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct ConnArgs {
    #[arg(long, help = "Database host [env: PGHOST]")]
    pub host: Option<String>,

    #[arg(long, help = "Database port [env: PGPORT] [default: 5432]")]
    pub port: Option<u16>,

    #[arg(long, help = "Database name [env: PGDATABASE]")]
    pub dbname: Option<String>,

    #[arg(long, help = "Database user [env: PGUSER]")]
    pub user: Option<String>,

    #[arg(long, help = "Database password [env: PGPASSWORD]")]
    pub password: Option<String>,

    #[arg(
        long,
        value_parser = parse_ssl_mode,
        help = "disable, prefer or require [env: PGSSLMODE] [default: prefer]"
    )]
    pub sslmode: Option<SslMode>,

    #[arg(long, help = "Application name reported to the server [env: PGAPPNAME]")]
    pub application_name: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ExportArgs {
    #[command(flatten)]
    pub conn: ConnArgs,

    #[arg(
        long,
        value_parser = parse_day,
        help = "Day to export as YYYY-MM-DD [env: EXPORT_DAY] [default: yesterday]"
    )]
    pub day: Option<NaiveDate>,

    #[arg(long, help = "Table to export [default: public.orders]")]
    pub table: Option<String>,

    #[arg(long, help = "Timestamp column the day window applies to [default: update_stamp]")]
    pub timestamp_column: Option<String>,

    #[arg(long, help = "Column to order rows by (unordered if omitted)")]
    pub order_by: Option<String>,

    #[arg(long, help = "Directory for the CSV and archive [env: EXPORT_OUTPUT_DIR] [default: /var/tmp]")]
    pub output_dir: Option<PathBuf>,

    #[arg(long, help = "File name prefix [default: orders]")]
    pub file_prefix: Option<String>,

    #[arg(long, help = "Rows fetched per cursor round trip [default: 2000]")]
    pub fetch_size: Option<usize>,

    #[arg(long, help = "Log progress every N rows [default: 10000]")]
    pub progress_every: Option<u64>,

    #[arg(long, help = "Text column decoding: latin1 or utf8 [default: latin1]")]
    pub text_decoding: Option<TextDecoding>,

    #[arg(long, help = "Keep the CSV next to the archive")]
    pub keep_csv: bool,
}

impl ConnArgs {
    /// Fills the connection part of `builder`, flags first, then environment.
    pub fn apply(
        &self,
        mut builder: ExportSettingsBuilder,
        env: &EnvManager,
    ) -> Result<ExportSettingsBuilder, CliError> {
        builder.host = pick(&self.host, env, PGHOST);
        builder.dbname = pick(&self.dbname, env, PGDATABASE);
        builder.user = pick(&self.user, env, PGUSER);
        builder.password = pick(&self.password, env, PGPASSWORD);
        builder.application_name = pick(&self.application_name, env, PGAPPNAME);
        builder.port = match self.port {
            Some(port) => Some(port),
            None => env.parse("port", PGPORT)?,
        };
        builder.ssl_mode = match self.sslmode {
            Some(mode) => Some(mode),
            None => env
                .get(PGSSLMODE)
                .map(|raw| {
                    parse_ssl_mode(raw).map_err(|reason| CliError::InvalidValue {
                        name: "sslmode",
                        reason,
                    })
                })
                .transpose()?,
        };
        Ok(builder)
    }

    pub fn to_params(&self, env: &EnvManager) -> Result<ConnectionParams, CliError> {
        let builder = self.apply(ExportSettingsBuilder::default(), env)?;
        let missing = |name| CliError::Settings(SettingsError::Missing(name));

        Ok(ConnectionParams {
            host: builder.host.ok_or_else(|| missing("host"))?,
            port: builder.port.unwrap_or(DEFAULT_PORT),
            dbname: builder.dbname.ok_or_else(|| missing("dbname"))?,
            user: builder.user.ok_or_else(|| missing("user"))?,
            password: builder.password,
            ssl_mode: builder.ssl_mode.unwrap_or(SslMode::Prefer),
            application_name: builder
                .application_name
                .unwrap_or_else(|| DEFAULT_APPLICATION_NAME.to_string()),
        })
    }
}

impl ExportArgs {
    /// Resolves flags and environment into an unvalidated settings builder.
    pub fn to_builder(&self, env: &EnvManager) -> Result<ExportSettingsBuilder, CliError> {
        let mut builder = self.conn.apply(ExportSettingsBuilder::default(), env)?;

        builder.day = match self.day {
            Some(day) => Some(day),
            None => match env.get(EXPORT_DAY) {
                Some(raw) => Some(parse_day(raw.trim()).map_err(|e| CliError::InvalidValue {
                    name: "day",
                    reason: format!("{EXPORT_DAY}={raw}: {e}"),
                })?),
                None => Some(yesterday()?),
            },
        };
        builder.output_dir = self
            .output_dir
            .clone()
            .or_else(|| env.get(EXPORT_OUTPUT_DIR).map(PathBuf::from));
        builder.table = self.table.clone();
        builder.timestamp_column = self.timestamp_column.clone();
        builder.order_by = self.order_by.clone();
        builder.file_prefix = self.file_prefix.clone();
        builder.fetch_size = self.fetch_size;
        builder.progress_every = self.progress_every;
        builder.text_decoding = self.text_decoding;
        builder.keep_csv = self.keep_csv;
        Ok(builder)
    }
}

fn pick(flag: &Option<String>, env: &EnvManager, key: &str) -> Option<String> {
    flag.clone().or_else(|| env.get(key).map(str::to_string))
}

fn yesterday() -> Result<NaiveDate, CliError> {
    Local::now()
        .date_naive()
        .pred_opt()
        .ok_or_else(|| CliError::Unexpected("cannot compute yesterday's date".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(subcommand)]
        command: Commands,
    }

    fn export_args(args: &[&str]) -> ExportArgs {
        let argv = ["orders-export", "export"].iter().chain(args);
        match TestCli::try_parse_from(argv).unwrap().command {
            Commands::Export(args) => args,
            _ => panic!("expected export command"),
        }
    }

    #[test]
    fn test_flags_win_over_environment() {
        let env = EnvManager::from_vars([
            (PGHOST, "env-host"),
            (PGPORT, "6432"),
            (PGDATABASE, "shop"),
            (PGUSER, "env-user"),
            (EXPORT_DAY, "2025-01-01"),
        ]);
        let args = export_args(&["--host", "flag-host", "--day", "2025-12-07"]);

        let builder = args.to_builder(&env).unwrap();

        assert_eq!(builder.host.as_deref(), Some("flag-host"));
        assert_eq!(builder.port, Some(6432));
        assert_eq!(builder.dbname.as_deref(), Some("shop"));
        assert_eq!(builder.user.as_deref(), Some("env-user"));
        assert_eq!(builder.day, NaiveDate::from_ymd_opt(2025, 12, 7));
    }

    #[test]
    fn test_day_from_environment_and_default() {
        let env = EnvManager::from_vars([(EXPORT_DAY, "2025-12-07")]);
        let builder = export_args(&[]).to_builder(&env).unwrap();
        assert_eq!(builder.day, NaiveDate::from_ymd_opt(2025, 12, 7));

        let env = EnvManager::default();
        let builder = export_args(&[]).to_builder(&env).unwrap();
        assert_eq!(builder.day, Local::now().date_naive().pred_opt());

        let env = EnvManager::from_vars([(EXPORT_DAY, "07.12.2025")]);
        assert!(matches!(
            export_args(&[]).to_builder(&env),
            Err(CliError::InvalidValue { name: "day", .. })
        ));
    }

    #[test]
    fn test_rejects_malformed_day_flag() {
        let argv = ["orders-export", "export", "--day", "2025-12-7"];
        assert!(TestCli::try_parse_from(argv).is_err());
    }

    #[test]
    fn test_builds_valid_settings() {
        let dir = tempfile::tempdir().unwrap();
        let env = EnvManager::from_vars([
            (PGHOST, "localhost"),
            (PGDATABASE, "shop"),
            (PGUSER, "exporter"),
            (PGSSLMODE, "disable"),
        ]);
        let output_dir = dir.path().to_string_lossy().into_owned();
        let args = export_args(&[
            "--day",
            "2025-12-07",
            "--output-dir",
            &output_dir,
            "--text-decoding",
            "utf8",
            "--fetch-size",
            "500",
            "--keep-csv",
        ]);

        let settings = args.to_builder(&env).unwrap().build().unwrap();

        assert_eq!(settings.connection.ssl_mode, SslMode::Disable);
        assert_eq!(settings.connection.port, 5432);
        assert_eq!(settings.text_decoding, TextDecoding::Utf8);
        assert_eq!(settings.fetch_size, 500);
        assert!(settings.keep_csv);
        assert_eq!(settings.output_dir, dir.path());
    }

    #[test]
    fn test_conn_params_require_host() {
        let env = EnvManager::from_vars([(PGDATABASE, "shop"), (PGUSER, "exporter")]);
        let conn = ConnArgs::default();
        assert!(matches!(
            conn.to_params(&env),
            Err(CliError::Settings(SettingsError::Missing("host")))
        ));

        let conn = ConnArgs {
            host: Some("localhost".into()),
            ..ConnArgs::default()
        };
        let params = conn.to_params(&env).unwrap();
        assert_eq!(params.to_string(), "exporter@localhost:5432/shop");
        assert_eq!(params.ssl_mode, SslMode::Prefer);
    }

    #[test]
    fn test_invalid_sslmode_in_environment() {
        let env = EnvManager::from_vars([(PGSSLMODE, "verify-full")]);
        assert!(matches!(
            ConnArgs::default().to_params(&env),
            Err(CliError::InvalidValue { name: "sslmode", .. })
        ));
    }
}
