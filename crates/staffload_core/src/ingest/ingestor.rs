//! CSV ingestion entry points.
//!
//! # Responsibility
//! - Validate header rows against expected column sets.
//! - Turn a file into validated records, skipping row-recoverable rows.
//!
//! # Side effects
//! - Emits `csv_headers`, `csv_ingest` and `csv_row_skipped` log events.

use super::entity_csv::{CsvRecord, CsvRow};
use super::table::{read_headers, read_table, same_column_set, TabularData};
use super::{IngestError, IngestResult};
use crate::model::department::Department;
use crate::model::employee::Employee;
use crate::model::job::Job;
use crate::model::{EntityId, EntityKind};
use log::{error, info, warn};
use std::path::Path;
use std::time::Instant;

/// Row dropped during ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    pub line: u64,
    pub id: EntityId,
    pub reason: String,
}

/// Result of ingesting one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestOutcome<E> {
    pub entity: EntityKind,
    /// Data rows read, header excluded.
    pub rows_read: usize,
    /// Accepted records in file order.
    pub records: Vec<E>,
    pub skipped: Vec<SkippedRow>,
}

/// Reads delimited files with a fixed field delimiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvIngestor {
    delimiter: u8,
}

impl Default for CsvIngestor {
    fn default() -> Self {
        Self::new(b',')
    }
}

impl CsvIngestor {
    pub fn new(delimiter: u8) -> Self {
        Self { delimiter }
    }

    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    /// Returns whether the header row of `path` has exactly the `expected`
    /// column set.
    ///
    /// Never fails: read problems are logged and reported as `false`.
    pub fn validate_headers(&self, path: &Path, expected: &[&str]) -> bool {
        match read_headers(path, self.delimiter) {
            Ok(headers) => {
                let matches = same_column_set(&headers, expected);
                info!(
                    "event=csv_headers module=ingest status=ok path={} matches={}",
                    path.display(),
                    matches
                );
                matches
            }
            Err(err) => {
                error!(
                    "event=csv_headers module=ingest status=error path={} error={}",
                    path.display(),
                    err
                );
                false
            }
        }
    }

    /// Reads the whole file into memory.
    pub fn load_table(&self, path: &Path) -> IngestResult<TabularData> {
        read_table(path, self.delimiter)
    }

    /// Ingests `path` as records of type `E`, keeping skip details.
    ///
    /// # Errors
    /// - `IngestError::Io` / `IngestError::Parse` when the file is unreadable.
    /// - `IngestError::MissingColumns` when required columns are absent.
    /// - `IngestError::InvalidValue` when a required field cannot be coerced.
    /// - `IngestError::Validation` for rule violations that are not
    ///   row-recoverable.
    pub fn ingest_entity_csv<E: CsvRecord>(&self, path: &Path) -> IngestResult<IngestOutcome<E>> {
        let started_at = Instant::now();
        let entity = E::KIND;
        let table = self.load_table(path)?;

        let missing = table.missing_columns(E::CSV_COLUMNS);
        if !missing.is_empty() {
            error!(
                "event=csv_ingest module=ingest status=error entity={} path={} error_code=missing_columns missing={}",
                entity,
                path.display(),
                missing.join("|")
            );
            return Err(IngestError::MissingColumns {
                entity,
                path: path.to_path_buf(),
                missing,
            });
        }

        let mut records = Vec::with_capacity(table.len());
        let mut skipped = Vec::new();
        for row in table.rows() {
            let view = CsvRow::new(&table, row);
            let record = E::from_csv_row(&view).map_err(|field| {
                error!(
                    "event=csv_ingest module=ingest status=error entity={} path={} line={} column={} error_code=invalid_value reason={}",
                    entity,
                    path.display(),
                    row.line(),
                    field.column,
                    field.reason
                );
                IngestError::InvalidValue {
                    entity,
                    path: path.to_path_buf(),
                    line: row.line(),
                    column: field.column,
                    value: field.value,
                    reason: field.reason,
                }
            })?;

            match record.validate() {
                Ok(()) => records.push(record),
                Err(err) if err.is_row_recoverable() => {
                    warn!(
                        "event=csv_row_skipped module=ingest status=skip entity={} path={} line={} id={} reason={}",
                        entity,
                        path.display(),
                        row.line(),
                        record.id(),
                        err
                    );
                    skipped.push(SkippedRow {
                        line: row.line(),
                        id: record.id(),
                        reason: err.to_string(),
                    });
                }
                Err(err) => {
                    error!(
                        "event=csv_ingest module=ingest status=error entity={} path={} line={} id={} error_code=invalid_record error={}",
                        entity,
                        path.display(),
                        row.line(),
                        record.id(),
                        err
                    );
                    return Err(IngestError::Validation {
                        path: path.to_path_buf(),
                        line: row.line(),
                        source: err,
                    });
                }
            }
        }

        info!(
            "event=csv_ingest module=ingest status=ok entity={} path={} rows={} accepted={} skipped={} duration_ms={}",
            entity,
            path.display(),
            table.len(),
            records.len(),
            skipped.len(),
            started_at.elapsed().as_millis()
        );

        Ok(IngestOutcome {
            entity,
            rows_read: table.len(),
            records,
            skipped,
        })
    }

    /// Ingests `path` and returns only the accepted records.
    pub fn process_entity_csv<E: CsvRecord>(&self, path: &Path) -> IngestResult<Vec<E>> {
        self.ingest_entity_csv(path).map(|outcome| outcome.records)
    }

    pub fn process_departments_csv(&self, path: &Path) -> IngestResult<Vec<Department>> {
        self.process_entity_csv(path)
    }

    pub fn process_jobs_csv(&self, path: &Path) -> IngestResult<Vec<Job>> {
        self.process_entity_csv(path)
    }

    pub fn process_employees_csv(&self, path: &Path) -> IngestResult<Vec<Employee>> {
        self.process_entity_csv(path)
    }
}
