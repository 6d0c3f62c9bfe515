//! Append-only CSV archive files
//!
//! The header is written once, when the file is created, from the archive's
//! schema. From then on the file's own header is the locked column order:
//! every append is projected onto it, padding columns a row does not carry
//! and rejecting rows that carry columns the header lacks.

use super::schema::{ArchiveRow, ArchiveSchema};
use crate::error::ArchiveError;
use std::collections::BTreeSet;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// One append-only CSV archive
#[derive(Debug, Clone)]
pub struct CsvArchive {
    path: PathBuf,
    schema: ArchiveSchema,
}

impl CsvArchive {
    pub fn new(path: impl Into<PathBuf>, schema: ArchiveSchema) -> Self {
        Self {
            path: path.into(),
            schema,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append rows, creating the file with a header if needed.
    ///
    /// Nothing is written when any row is rejected. Returns the number of rows appended.
    pub fn append(&self, rows: &[ArchiveRow]) -> Result<usize, ArchiveError> {
        let existing = self.read_header()?;
        let is_new = existing.is_none();
        let header = match existing {
            Some(header) => {
                if header != self.schema.fields() {
                    warn!(
                        path = %self.path.display(),
                        header = ?header,
                        schema = ?self.schema.fields(),
                        "Archive header differs from configured columns, keeping existing header"
                    );
                }
                header
            }
            None => self.schema.fields().to_vec(),
        };

        self.check_rows(&header, rows)?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| self.io_error(source))?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if is_new {
            writer
                .write_record(&header)
                .map_err(|source| self.csv_error(source))?;
        }

        for row in rows {
            writer
                .write_record(header.iter().map(|field| row.cell(field)))
                .map_err(|source| self.csv_error(source))?;
        }

        writer.flush().map_err(|source| self.io_error(source))?;

        debug!(path = %self.path.display(), rows = rows.len(), created = is_new, "Appended archive rows");
        Ok(rows.len())
    }

    /// Header row of the existing file, `None` when absent or empty
    fn read_header(&self) -> Result<Option<Vec<String>>, ArchiveError> {
        match std::fs::metadata(&self.path) {
            Ok(meta) if meta.len() > 0 => {}
            Ok(_) => return Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(self.io_error(source)),
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&self.path)
            .map_err(|source| self.csv_error(source))?;

        match reader.records().next() {
            Some(record) => {
                let record = record.map_err(|source| self.csv_error(source))?;
                Ok(Some(record.iter().map(String::from).collect()))
            }
            None => Ok(None),
        }
    }

    fn check_rows(&self, header: &[String], rows: &[ArchiveRow]) -> Result<(), ArchiveError> {
        let unknown: BTreeSet<&str> = rows
            .iter()
            .flat_map(|row| row.fields())
            .filter(|field| !header.iter().any(|h| h == field))
            .collect();

        if unknown.is_empty() {
            Ok(())
        } else {
            Err(ArchiveError::SchemaDrift {
                path: self.path.clone(),
                fields: unknown.into_iter().map(String::from).collect(),
            })
        }
    }

    fn io_error(&self, source: std::io::Error) -> ArchiveError {
        ArchiveError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn csv_error(&self, source: csv::Error) -> ArchiveError {
        ArchiveError::Csv {
            path: self.path.clone(),
            source,
        }
    }
}
