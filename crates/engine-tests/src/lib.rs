#![allow(dead_code)]

use connectors::sql::postgres::utils::connect_client;
use std::{env, str::FromStr};
use tokio_postgres::{Client, Config};

pub mod integration;
pub mod utils;

/// Connection URL of a scratch database; live tests are skipped without it.
pub const TEST_PG_URL_VAR: &str = "EXPORT_TEST_PG_URL";

fn test_pg_config() -> Option<Config> {
    let url = env::var(TEST_PG_URL_VAR).ok()?;
    Some(Config::from_str(&url).expect("parse EXPORT_TEST_PG_URL"))
}

async fn pg_client() -> Option<Client> {
    let Some(config) = test_pg_config() else {
        eprintln!("{TEST_PG_URL_VAR} not set, skipping live Postgres test");
        return None;
    };
    Some(connect_client(&config).await.expect("connect postgres"))
}

/// Drop & recreate `schema` so every test starts from an empty namespace.
async fn reset_schema(client: &Client, schema: &str) {
    client
        .batch_execute(&format!(
            r#"
            DROP SCHEMA IF EXISTS {schema} CASCADE;
            CREATE SCHEMA {schema};
        "#
        ))
        .await
        .expect("reset postgres schema");
}
