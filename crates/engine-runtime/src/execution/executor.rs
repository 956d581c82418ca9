use crate::{
    error::ExportError,
    execution::{
        artifacts::ArtifactPaths,
        progress::{ProgressCounter, format_count},
        stage::ExportStage,
    },
};
use chrono::{Local, NaiveDateTime};
use connectors::{
    file::{
        archive::archive_file,
        csv::{error::FileError, writer::CsvSink},
    },
    sql::{
        base::{error::DbError, source::RowSource},
        postgres::{
            source::PgRangeSource,
            utils::{connect_client, set_client_encoding},
        },
    },
};
use engine_config::settings::ExportSettings;
use model::core::window::ExportWindow;
use std::{
    fs,
    path::PathBuf,
    time::{Duration, Instant},
};
use tracing::{debug, info};

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct ExportReport {
    pub window: ExportWindow,
    pub columns: usize,
    pub rows: u64,
    pub csv_path: PathBuf,
    /// Whether the CSV is still on disk next to the archive.
    pub csv_kept: bool,
    pub archive_path: PathBuf,
    pub archive_bytes: u64,
    pub elapsed: Duration,
}

/// Connects to the configured database and exports one day.
pub async fn run(settings: &ExportSettings) -> Result<ExportReport, ExportError> {
    let mut executor = ExportExecutor::new(settings, Local::now().naive_local())?;

    let config = settings.connection.to_config()?;
    info!(connection = %settings.connection, "Connecting to source database");
    let client = connect_client(&config).await?;
    set_client_encoding(&client, settings.text_decoding).await?;
    executor.advance(ExportStage::Connected);

    let mut source = PgRangeSource::new(client, settings.range_query(), settings.text_decoding);
    let rows = executor.export_csv(&mut source).await?;
    // the connection is closed before archival starts
    drop(source);

    executor.archive(rows)
}

/// Runs the export against an already connected source.
pub async fn run_with_source<S: RowSource + ?Sized>(
    settings: &ExportSettings,
    source: &mut S,
    generated_at: NaiveDateTime,
) -> Result<ExportReport, ExportError> {
    let mut executor = ExportExecutor::new(settings, generated_at)?;
    executor.advance(ExportStage::Connected);

    let rows = executor.export_csv(source).await?;
    executor.archive(rows)
}

struct ExportExecutor<'a> {
    settings: &'a ExportSettings,
    window: ExportWindow,
    paths: ArtifactPaths,
    stage: ExportStage,
    columns: usize,
    started: Instant,
}

impl<'a> ExportExecutor<'a> {
    fn new(settings: &'a ExportSettings, generated_at: NaiveDateTime) -> Result<Self, ExportError> {
        settings.validate()?;
        let window = settings.window()?;
        let paths = ArtifactPaths::new(
            &settings.output_dir,
            &settings.file_prefix,
            settings.day,
            generated_at,
        );

        info!(
            "Exporting {} where {} in {} to {}",
            settings.table,
            settings.timestamp_column,
            window,
            paths.csv.display()
        );

        Ok(ExportExecutor {
            settings,
            window,
            paths,
            stage: ExportStage::Init,
            columns: 0,
            started: Instant::now(),
        })
    }

    fn advance(&mut self, next: ExportStage) {
        debug_assert_eq!(self.stage.next(), Some(next));
        debug!(from = %self.stage, to = %next, "Export stage transition");
        self.stage = next;
    }

    fn db_error(&self, source: DbError) -> ExportError {
        ExportError::Database {
            stage: self.stage,
            source,
        }
    }

    fn file_error(&self, source: FileError) -> ExportError {
        ExportError::File {
            stage: self.stage,
            source,
        }
    }

    /// Header probe followed by the streamed CSV write. Returns the row count.
    async fn export_csv<S: RowSource + ?Sized>(&mut self, source: &mut S) -> Result<u64, ExportError> {
        let header = source
            .probe_header(&self.window)
            .await
            .map_err(|e| self.db_error(e))?;
        self.columns = header.len();
        info!(columns = header.len(), "Fetched column names");
        self.advance(ExportStage::HeaderFetched);

        info!("Running range query, please wait ...");
        let mut stream = source
            .open_stream(&self.window, self.settings.fetch_size)
            .await
            .map_err(|e| self.db_error(e))?;
        if stream.arity() != header.len() {
            return Err(self.db_error(DbError::HeaderMismatch {
                header: header.len(),
                data: stream.arity(),
            }));
        }
        self.advance(ExportStage::Streaming);

        let mut sink =
            CsvSink::create(&self.paths.csv, &header).map_err(|e| self.file_error(e))?;
        let mut progress = ProgressCounter::new(self.settings.progress_every);

        while let Some(batch) = stream.next_batch().await.map_err(|e| self.db_error(e))? {
            for record in &batch {
                sink.write_record(record).map_err(|e| self.file_error(e))?;
                if let Some(rows) = progress.tick() {
                    info!("Exported {} rows ...", format_count(rows));
                }
            }
        }
        stream.finish().await.map_err(|e| self.db_error(e))?;

        let rows = sink.finish().map_err(|e| self.file_error(e))?;
        self.advance(ExportStage::StreamDone);
        info!("Export complete, {} rows written", format_count(rows));
        Ok(rows)
    }

    /// Compresses the CSV and removes it once the archive is complete.
    fn archive(mut self, rows: u64) -> Result<ExportReport, ExportError> {
        info!("Compressing to {} ...", self.paths.archive.display());
        let archive_bytes =
            archive_file(&self.paths.csv, &self.paths.archive).map_err(|e| self.file_error(e))?;
        self.advance(ExportStage::Archived);

        let csv_kept = self.settings.keep_csv;
        if !csv_kept {
            fs::remove_file(&self.paths.csv)
                .map_err(|e| self.file_error(FileError::io(&self.paths.csv, e)))?;
        }
        self.advance(ExportStage::CleanedUp);

        let elapsed = self.started.elapsed();
        info!(
            rows,
            archive_bytes,
            elapsed_ms = elapsed.as_millis() as u64,
            "Archive ready: {}",
            self.paths.archive.display()
        );

        Ok(ExportReport {
            window: self.window,
            columns: self.columns,
            rows,
            csv_path: self.paths.csv,
            csv_kept,
            archive_path: self.paths.archive,
            archive_bytes,
            elapsed,
        })
    }
}
