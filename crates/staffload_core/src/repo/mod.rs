//! Repository layer for organizational records.
//!
//! # Responsibility
//! - Provide get/list/delete and batch upsert over SQLite tables.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Write paths call `Record::validate()` before any SQL mutation.
//! - A batch is committed whole or not at all.
//! - Repositories refuse connections that are not fully migrated.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::{EntityId, EntityKind, Record, ValidationError};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod entity_repo;
pub mod mapping;

pub use entity_repo::{
    DepartmentRepository, EmployeeRepository, EntityRepository, JobRepository,
    SqliteEntityRepository,
};
pub use mapping::TableMapping;

const LIST_DEFAULT_LIMIT: u32 = 100;
const LIST_LIMIT_MAX: u32 = 1000;

pub type RepoResult<T> = Result<T, RepoError>;

/// Identifies one write batch in errors and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSpan {
    pub size: usize,
    pub first_id: EntityId,
    pub last_id: EntityId,
}

impl BatchSpan {
    /// Span of a non-empty batch; `None` for an empty one.
    pub fn of<E: Record>(records: &[E]) -> Option<Self> {
        let first = records.first()?;
        let last = records.last()?;
        Some(Self {
            size: records.len(),
            first_id: first.id(),
            last_id: last.id(),
        })
    }
}

impl Display for BatchSpan {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "batch of {} (ids {}..{})",
            self.size, self.first_id, self.last_id
        )
    }
}

/// Repository errors.
#[derive(Debug)]
pub enum RepoError {
    /// Record failed field validation before reaching storage.
    Validation(ValidationError),
    /// Underlying SQLite/bootstrap error outside a batch write.
    Db(DbError),
    /// A batch write failed and was rolled back.
    Persistence {
        entity: EntityKind,
        batch: BatchSpan,
        /// `None` when the failure was not tied to one record
        /// (transaction begin/commit).
        record_id: Option<EntityId>,
        source: rusqlite::Error,
    },
    NotFound {
        entity: EntityKind,
        id: EntityId,
    },
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Persistence {
                entity,
                batch,
                record_id,
                source,
            } => match record_id {
                Some(id) => write!(
                    f,
                    "{entity} {batch} rolled back at record {id}: {source}"
                ),
                None => write!(f, "{entity} {batch} rolled back: {source}"),
            },
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "repository requires column `{column}` in table `{table}`"
            ),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Persistence { source, .. } => Some(source),
            Self::NotFound { .. }
            | Self::UninitializedConnection { .. }
            | Self::MissingRequiredTable(_)
            | Self::MissingRequiredColumn { .. } => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Pagination options for list queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListQuery {
    /// Number of rows to skip.
    pub offset: u32,
    /// Maximum rows to return. Defaults to 100 and clamps to 1000.
    pub limit: Option<u32>,
}

/// Normalizes a list limit according to the pagination contract.
pub fn normalize_list_limit(limit: Option<u32>) -> u32 {
    match limit {
        Some(0) | None => LIST_DEFAULT_LIMIT,
        Some(value) if value > LIST_LIMIT_MAX => LIST_LIMIT_MAX,
        Some(value) => value,
    }
}

pub(crate) fn ensure_connection_ready<E: TableMapping>(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, E::TABLE)? {
        return Err(RepoError::MissingRequiredTable(E::TABLE));
    }

    for column in mapping::all_columns::<E>() {
        if !table_has_column(conn, E::TABLE, column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: E::TABLE,
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
