//! Delimited-file ingestion for organizational records.
//!
//! # Responsibility
//! - Read CSV files into memory and check their column sets.
//! - Convert rows into validated records with a mixed fatal/skip policy.
//!
//! # Invariants
//! - Structural problems (missing columns, unparsable keys, empty required
//!   text) abort the whole file.
//! - Row-recoverable validation failures drop only the offending row and
//!   are reported through a `warn` event and `IngestOutcome::skipped`.
//! - Output order follows file row order.

use crate::model::{EntityKind, ValidationError};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub mod entity_csv;
mod ingestor;
pub mod table;

pub use entity_csv::{CsvRecord, CsvRow, FieldError};
pub use ingestor::{CsvIngestor, IngestOutcome, SkippedRow};
pub use table::{TableRow, TabularData};

pub type IngestResult<T> = Result<T, IngestError>;

/// File-level ingestion failures.
#[derive(Debug)]
pub enum IngestError {
    /// The file could not be opened or read.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The file is not well-formed delimited text.
    Parse { path: PathBuf, source: csv::Error },
    /// Required columns are absent from the header row.
    MissingColumns {
        entity: EntityKind,
        path: PathBuf,
        missing: Vec<String>,
    },
    /// A required field could not be coerced to its declared type.
    InvalidValue {
        entity: EntityKind,
        path: PathBuf,
        line: u64,
        column: &'static str,
        value: Option<String>,
        reason: &'static str,
    },
    /// A row failed a validation rule that is not row-recoverable.
    Validation {
        path: PathBuf,
        line: u64,
        source: ValidationError,
    },
}

impl Display for IngestError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "cannot read `{}`: {source}", path.display()),
            Self::Parse { path, source } => {
                write!(f, "cannot parse `{}`: {source}", path.display())
            }
            Self::MissingColumns {
                entity,
                path,
                missing,
            } => write!(
                f,
                "missing required columns in {entity} file `{}`: {}",
                path.display(),
                missing.join(", ")
            ),
            Self::InvalidValue {
                entity,
                path,
                line,
                column,
                value,
                reason,
            } => match value {
                Some(value) => write!(
                    f,
                    "{entity} file `{}` line {line}: column {column} value `{value}` {reason}",
                    path.display()
                ),
                None => write!(
                    f,
                    "{entity} file `{}` line {line}: column {column} {reason}",
                    path.display()
                ),
            },
            Self::Validation { path, line, source } => {
                write!(f, "`{}` line {line}: {source}", path.display())
            }
        }
    }
}

impl Error for IngestError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::Validation { source, .. } => Some(source),
            Self::MissingColumns { .. } | Self::InvalidValue { .. } => None,
        }
    }
}
