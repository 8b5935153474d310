//! File-to-storage import use-case.
//!
//! # Responsibility
//! - Chain ingestion, batching, batch upsert and archiving for one file.
//! - Import a whole inbound directory, parents before employees.
//!
//! # Invariants
//! - Each batch is its own transaction; earlier batches stay committed when
//!   a later one fails.
//! - A file is archived only after every batch committed.
//! - Archiving is post-processing: a failed move is reported on the
//!   `ImportReport` and never turns a committed import into an error.

use crate::archive::Archiver;
use crate::batch::batch;
use crate::config::{ConfigError, Settings};
use crate::ingest::{CsvIngestor, CsvRecord, IngestError};
use crate::model::department::Department;
use crate::model::employee::Employee;
use crate::model::job::Job;
use crate::model::EntityKind;
use crate::repo::{EntityRepository, RepoError, SqliteEntityRepository, TableMapping};
use log::{error, info, warn};
use rusqlite::Connection;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Per-run import settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSettings {
    pub delimiter: u8,
    pub max_batch_size: usize,
    /// Archive destination; `None` leaves imported files in place.
    pub processed_dir: Option<PathBuf>,
}

impl ImportSettings {
    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
        settings.validate()?;
        Ok(Self {
            delimiter: settings.delimiter_byte()?,
            max_batch_size: settings.max_batch_size,
            processed_dir: Some(settings.processed_dir.clone()),
        })
    }
}

/// Summary of one imported file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub entity: EntityKind,
    pub source: PathBuf,
    pub rows_read: usize,
    pub rows_skipped: usize,
    pub records_persisted: usize,
    pub batches_committed: usize,
    pub archived_to: Option<PathBuf>,
    /// Why the committed file could not be archived.
    pub archive_error: Option<String>,
}

#[derive(Debug)]
pub enum ImportError {
    Config(ConfigError),
    Ingest(IngestError),
    /// Repository could not be opened on the connection.
    Repo(RepoError),
    /// Batch `index` (0-based) failed; earlier batches stay committed.
    Batch {
        path: PathBuf,
        index: usize,
        source: RepoError,
    },
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl Display for ImportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Ingest(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Batch {
                path,
                index,
                source,
            } => write!(
                f,
                "import of `{}` failed in batch #{index}: {source}",
                path.display()
            ),
            Self::ReadDir { path, source } => {
                write!(f, "cannot list `{}`: {source}", path.display())
            }
        }
    }
}

impl Error for ImportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Ingest(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::Batch { source, .. } => Some(source),
            Self::ReadDir { source, .. } => Some(source),
        }
    }
}

impl From<ConfigError> for ImportError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<IngestError> for ImportError {
    fn from(value: IngestError) -> Self {
        Self::Ingest(value)
    }
}

impl From<RepoError> for ImportError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Import orchestration over one migrated connection.
pub struct ImportService<'conn> {
    conn: &'conn mut Connection,
    ingestor: CsvIngestor,
    max_batch_size: usize,
    archiver: Option<Archiver>,
}

impl<'conn> ImportService<'conn> {
    pub fn new(conn: &'conn mut Connection, settings: &ImportSettings) -> Result<Self, ConfigError> {
        if settings.max_batch_size == 0 {
            return Err(ConfigError::InvalidBatchSize(settings.max_batch_size));
        }
        Ok(Self {
            conn,
            ingestor: CsvIngestor::new(settings.delimiter),
            max_batch_size: settings.max_batch_size,
            archiver: settings.processed_dir.clone().map(Archiver::new),
        })
    }

    pub fn ingestor(&self) -> &CsvIngestor {
        &self.ingestor
    }

    /// Imports one file as records of type `E`.
    pub fn import_file<E>(&mut self, path: &Path) -> Result<ImportReport, ImportError>
    where
        E: CsvRecord + TableMapping,
    {
        let started_at = Instant::now();
        let outcome = self.ingestor.ingest_entity_csv::<E>(path)?;
        let rows_read = outcome.rows_read;
        let rows_skipped = outcome.skipped.len();
        let batches = batch(outcome.records, self.max_batch_size)?;

        let mut repo = SqliteEntityRepository::<E>::try_new(self.conn)?;
        let mut records_persisted = 0;
        let mut batches_committed = 0;
        for (index, records) in batches.iter().enumerate() {
            match repo.upsert_batch(records) {
                Ok(persisted) => {
                    records_persisted += persisted.len();
                    batches_committed += 1;
                }
                Err(source) => {
                    error!(
                        "event=file_import module=service status=error entity={} path={} batch_index={} committed_batches={} error={}",
                        E::KIND,
                        path.display(),
                        index,
                        batches_committed,
                        source
                    );
                    return Err(ImportError::Batch {
                        path: path.to_path_buf(),
                        index,
                        source,
                    });
                }
            }
        }

        let (archived_to, archive_error) = match &self.archiver {
            Some(archiver) => match archiver.archive(path) {
                Ok(destination) => (Some(destination), None),
                Err(err) => {
                    error!(
                        "event=file_import module=service status=error entity={} path={} stage=archive error={}",
                        E::KIND,
                        path.display(),
                        err
                    );
                    (None, Some(err.to_string()))
                }
            },
            None => (None, None),
        };

        info!(
            "event=file_import module=service status=ok entity={} path={} rows={} skipped={} persisted={} batches={} duration_ms={}",
            E::KIND,
            path.display(),
            rows_read,
            rows_skipped,
            records_persisted,
            batches_committed,
            started_at.elapsed().as_millis()
        );

        Ok(ImportReport {
            entity: E::KIND,
            source: path.to_path_buf(),
            rows_read,
            rows_skipped,
            records_persisted,
            batches_committed,
            archived_to,
            archive_error,
        })
    }

    /// Imports `path` as the given entity kind.
    pub fn import_kind(&mut self, kind: EntityKind, path: &Path) -> Result<ImportReport, ImportError> {
        match kind {
            EntityKind::Department => self.import_file::<Department>(path),
            EntityKind::Job => self.import_file::<Job>(path),
            EntityKind::Employee => self.import_file::<Employee>(path),
        }
    }

    /// Imports every recognizable CSV file in `dir`.
    ///
    /// Departments and jobs go first so employee foreign keys resolve.
    /// Stops at the first failing file.
    pub fn import_directory(&mut self, dir: &Path) -> Result<Vec<ImportReport>, ImportError> {
        let read_dir_error = |source| ImportError::ReadDir {
            path: dir.to_path_buf(),
            source,
        };

        let mut files = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(read_dir_error)? {
            let path = entry.map_err(read_dir_error)?.path();
            if !path.is_file() {
                continue;
            }
            match classify_file(&path) {
                Some(kind) => files.push((kind, path)),
                None => warn!(
                    "event=dir_import module=service status=skip path={} reason=unrecognized_file",
                    path.display()
                ),
            }
        }
        files.sort_by_key(|(kind, path)| (kind_order(*kind), path.clone()));

        let mut reports = Vec::with_capacity(files.len());
        for (kind, path) in files {
            reports.push(self.import_kind(kind, &path)?);
        }
        Ok(reports)
    }
}

/// Infers the entity kind of a `.csv` file from its name.
pub fn classify_file(path: &Path) -> Option<EntityKind> {
    let extension = path.extension()?.to_str()?;
    if !extension.eq_ignore_ascii_case("csv") {
        return None;
    }
    let stem = path.file_stem()?.to_str()?.to_ascii_lowercase();
    if stem.contains("employee") {
        Some(EntityKind::Employee)
    } else if stem.contains("department") {
        Some(EntityKind::Department)
    } else if stem.contains("job") {
        Some(EntityKind::Job)
    } else {
        None
    }
}

fn kind_order(kind: EntityKind) -> usize {
    EntityKind::all()
        .iter()
        .position(|candidate| *candidate == kind)
        .unwrap_or(usize::MAX)
}
