use crate::file::csv::error::FileError;
use csv::{QuoteStyle, Terminator, Writer, WriterBuilder};
use model::records::row::{Header, Record};
use std::{
    fs::{File, OpenOptions},
    io::{BufWriter, ErrorKind},
    path::{Path, PathBuf},
};

/// Streaming CSV file writer: header first, then one line per record.
///
/// Quoting follows the usual rules (fields containing the delimiter, a quote
/// or a line break are quoted) and every line ends with `\r\n`. The file is
/// opened in create-new mode so an existing artifact is never overwritten.
pub struct CsvSink {
    path: PathBuf,
    writer: Writer<BufWriter<File>>,
    columns: usize,
    rows: u64,
}

impl CsvSink {
    pub fn create(path: &Path, header: &Header) -> Result<Self, FileError> {
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => FileError::AlreadyExists(path.to_path_buf()),
                _ => FileError::io(path, e),
            })?;

        let mut writer = WriterBuilder::new()
            .quote_style(QuoteStyle::Necessary)
            .terminator(Terminator::CRLF)
            .from_writer(BufWriter::new(file));
        writer.write_record(header.columns())?;

        Ok(CsvSink {
            path: path.to_path_buf(),
            writer,
            columns: header.len(),
            rows: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rows(&self) -> u64 {
        self.rows
    }

    pub fn write_record(&mut self, record: &Record) -> Result<(), FileError> {
        if record.len() != self.columns {
            return Err(FileError::ArityMismatch {
                expected: self.columns,
                got: record.len(),
            });
        }
        self.writer.write_record(record.to_fields())?;
        self.rows += 1;
        Ok(())
    }

    /// Flushes and fsyncs the file, returning the number of data rows written.
    pub fn finish(mut self) -> Result<u64, FileError> {
        self.writer
            .flush()
            .map_err(|e| FileError::io(&self.path, e))?;
        let buffered = self
            .writer
            .into_inner()
            .map_err(|e| FileError::io(&self.path, e.into_error()))?;
        let file = buffered
            .into_inner()
            .map_err(|e| FileError::io(&self.path, e.into_error()))?;
        file.sync_all().map_err(|e| FileError::io(&self.path, e))?;
        Ok(self.rows)
    }
}
