use crate::test_pg_config;
use chrono::NaiveDate;
use chrono_tz::Tz;
use connectors::sql::postgres::utils::parse_time_zone;
use engine_config::settings::{ExportSettings, ExportSettingsBuilder};
use flate2::read::GzDecoder;
use std::{fs::File, io::Read, path::Path};
use tar::Archive;
use tokio_postgres::{Client, config::Host};

/// DDL for an `orders` table covering every column family the exporter renders.
pub const ORDERS_TABLE_DDL: &str = r#"
    CREATE TABLE {schema}.orders (
        id integer PRIMARY KEY,
        note varchar(64),
        amount numeric(12, 2),
        rate double precision,
        ratio real,
        paid boolean,
        customer_ref uuid,
        created_at timestamptz,
        update_stamp timestamp NOT NULL
    );
"#;

/// Rows around the 2025-12-07 window: ids 1 to 3 fall inside, 4 and 5 do not.
pub const ORDERS_SEED: &str = r#"
    INSERT INTO {schema}.orders VALUES
        (1, 'first, of the day', 12345.67, 0.5, 1.1, true,
         'a0eebc99-9c0b-4ef8-bb6d-6bb9bd380a11', '2025-12-07 00:00:00+00', '2025-12-07 00:00:00'),
        (2, 'He said "hi"', 10.00, 1.25, 1e16, false,
         NULL, NULL, '2025-12-07 10:00:00'),
        (3, NULL, NULL, NULL, NULL, NULL,
         NULL, NULL, '2025-12-07 23:59:59.999999'),
        (4, 'next day', 1.00, 2.0, 2.0, true,
         NULL, NULL, '2025-12-08 00:00:00'),
        (5, 'previous day', 1.00, 2.0, 2.0, true,
         NULL, NULL, '2025-12-06 23:59:59.999999');
"#;

pub fn export_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 12, 7).expect("valid day")
}

/// Create `{schema}.orders` and fill it with [`ORDERS_SEED`].
pub async fn create_orders(client: &Client, schema: &str) {
    execute(client, &ORDERS_TABLE_DDL.replace("{schema}", schema)).await;
    execute(client, &ORDERS_SEED.replace("{schema}", schema)).await;
}

/// Time zone new sessions on the test server start in.
pub async fn server_time_zone(client: &Client) -> Tz {
    let row = client
        .query_one("SHOW TimeZone", &[])
        .await
        .expect("show time zone");
    parse_time_zone(row.get::<_, &str>(0))
}

pub async fn execute(client: &Client, sql: &str) {
    client
        .batch_execute(sql)
        .await
        .unwrap_or_else(|e| panic!("failed to execute {sql}: {e}"));
}

/// Settings pointing at the test database, exporting `{schema}.orders` into `dir`.
pub fn settings_builder(schema: &str, dir: &Path) -> ExportSettingsBuilder {
    let config = test_pg_config().expect("EXPORT_TEST_PG_URL is set");
    let host = match config.get_hosts().first() {
        Some(Host::Tcp(host)) => host.clone(),
        _ => "localhost".to_string(),
    };
    let mut builder = ExportSettings::builder()
        .host(host)
        .port(config.get_ports().first().copied().unwrap_or(5432))
        .dbname(config.get_dbname().unwrap_or("postgres"))
        .user(config.get_user().unwrap_or("postgres"))
        .ssl_mode(config.get_ssl_mode())
        .day(export_day())
        .table(format!("{schema}.orders"))
        .order_by("id")
        .output_dir(dir);
    if let Some(password) = config.get_password() {
        builder = builder.password(String::from_utf8_lossy(password));
    }
    builder
}

/// Entries of a gzip tar archive as `(name, bytes)`.
pub fn unpack_archive(path: &Path) -> Vec<(String, Vec<u8>)> {
    let file = File::open(path).expect("open archive");
    let mut archive = Archive::new(GzDecoder::new(file));
    archive
        .entries()
        .expect("read archive entries")
        .map(|entry| {
            let mut entry = entry.expect("archive entry");
            let name = entry.path().expect("entry path").to_string_lossy().into_owned();
            let mut data = Vec::new();
            entry.read_to_end(&mut data).expect("read entry");
            (name, data)
        })
        .collect()
}

/// Header and records of CSV bytes.
pub fn parse_csv(data: &[u8]) -> (Vec<String>, Vec<Vec<String>>) {
    let mut reader = csv::Reader::from_reader(data);
    let header = reader
        .headers()
        .expect("csv header")
        .iter()
        .map(str::to_string)
        .collect();
    let rows = reader
        .records()
        .map(|r| r.expect("csv record").iter().map(str::to_string).collect())
        .collect();
    (header, rows)
}

pub fn file_count(dir: &Path) -> usize {
    std::fs::read_dir(dir).expect("read output dir").count()
}
