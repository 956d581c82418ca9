use crate::sql::base::error::DbError;
use async_trait::async_trait;
use model::{
    core::window::ExportWindow,
    records::row::{Header, Record},
};

/// Something that can answer the day-range query.
#[async_trait]
pub trait RowSource: Send {
    /// Column names of the range query, read without fetching rows.
    async fn probe_header(&mut self, window: &ExportWindow) -> Result<Header, DbError>;

    /// Opens an incremental stream over the rows of `window`.
    async fn open_stream<'a>(
        &'a mut self,
        window: &ExportWindow,
        fetch_size: usize,
    ) -> Result<Box<dyn RecordStream + 'a>, DbError>;
}

/// Rows delivered in server order, one batch per round trip.
#[async_trait]
pub trait RecordStream: Send {
    /// Number of columns every record carries.
    fn arity(&self) -> usize;

    /// Next batch, or `None` once the result set is exhausted.
    async fn next_batch(&mut self) -> Result<Option<Vec<Record>>, DbError>;

    /// Releases server-side resources.
    async fn finish(&mut self) -> Result<(), DbError>;
}
