use crate::sql::{
    base::{
        error::DbError,
        query::RangeQuery,
        source::{RecordStream, RowSource},
    },
    postgres::{
        row::{RowDecoder, SessionFormat},
        utils::parse_time_zone,
    },
};
use async_trait::async_trait;
use model::{
    core::{encoding::TextDecoding, window::ExportWindow},
    records::row::{Header, Record},
};
use tokio_postgres::{Client, Portal, Transaction, types::ToSql};
use tracing::debug;

/// Day-range source backed by a PostgreSQL connection.
pub struct PgRangeSource {
    client: Client,
    query: RangeQuery,
    decoding: TextDecoding,
}

impl PgRangeSource {
    pub fn new(client: Client, query: RangeQuery, decoding: TextDecoding) -> Self {
        PgRangeSource {
            client,
            query,
            decoding,
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn into_client(self) -> Client {
        self.client
    }
}

#[async_trait]
impl RowSource for PgRangeSource {
    async fn probe_header(&mut self, window: &ExportWindow) -> Result<Header, DbError> {
        let sql = self.query.probe_sql()?;
        debug!(%sql, %window, "Probing header");

        let (start, end) = (window.start(), window.end());
        let params: [&(dyn ToSql + Sync); 2] = [&start, &end];

        let statement = self.client.prepare(&sql).await?;
        let rows = self.client.query(&statement, &params).await?;
        debug!(rows = rows.len(), "Header probe returned");

        Ok(statement
            .columns()
            .iter()
            .map(|col| col.name().to_string())
            .collect())
    }

    async fn open_stream<'a>(
        &'a mut self,
        window: &ExportWindow,
        fetch_size: usize,
    ) -> Result<Box<dyn RecordStream + 'a>, DbError> {
        let sql = self.query.stream_sql()?;
        let fetch_size = i32::try_from(fetch_size.max(1)).map_err(|_| {
            DbError::QueryBuildError(format!("fetch size {fetch_size} is too large"))
        })?;
        debug!(%sql, %window, fetch_size, "Opening server-side cursor");

        let tx = self
            .client
            .build_transaction()
            .read_only(true)
            .start()
            .await?;
        let zone: String = tx.query_one("SHOW TimeZone", &[]).await?.try_get(0)?;
        let session = SessionFormat::new(self.decoding, parse_time_zone(&zone));
        debug!(%zone, decoding = %self.decoding, "Session text format");

        let statement = tx.prepare(&sql).await?;
        let decoder = RowDecoder::new(statement.columns(), session)?;

        let (start, end) = (window.start(), window.end());
        let params: [&(dyn ToSql + Sync); 2] = [&start, &end];
        let portal = tx.bind(&statement, &params).await?;

        Ok(Box::new(PgRecordStream {
            tx: Some(tx),
            portal,
            decoder,
            fetch_size,
            exhausted: false,
        }))
    }
}

/// Rows pulled from a bound portal, `fetch_size` at a time.
pub struct PgRecordStream<'a> {
    tx: Option<Transaction<'a>>,
    portal: Portal,
    decoder: RowDecoder,
    fetch_size: i32,
    exhausted: bool,
}

#[async_trait]
impl RecordStream for PgRecordStream<'_> {
    fn arity(&self) -> usize {
        self.decoder.arity()
    }

    async fn next_batch(&mut self) -> Result<Option<Vec<Record>>, DbError> {
        if self.exhausted {
            return Ok(None);
        }
        let tx = self.tx.as_ref().ok_or(DbError::StreamFinished)?;

        let rows = tx.query_portal(&self.portal, self.fetch_size).await?;
        if rows.len() < self.fetch_size as usize {
            self.exhausted = true;
        }
        if rows.is_empty() {
            return Ok(None);
        }

        let records = rows
            .iter()
            .map(|row| self.decoder.decode(row))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Some(records))
    }

    async fn finish(&mut self) -> Result<(), DbError> {
        if let Some(tx) = self.tx.take() {
            tx.commit().await?;
        }
        self.exhausted = true;
        Ok(())
    }
}
