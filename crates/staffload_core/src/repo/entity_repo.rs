//! Generic SQLite repository with batch upsert semantics.
//!
//! # Responsibility
//! - Insert-or-update records keyed by caller-supplied ids.
//! - Apply each batch inside one IMMEDIATE transaction.
//!
//! # Invariants
//! - Upsert is a full replace of every non-key column.
//! - A failed batch leaves no partial writes behind; the transaction is
//!   rolled back when it is dropped without commit.
//! - Returned values are re-read after writing so storage defaults are
//!   visible.
//! - Concurrent writers to the same id: last committed write wins.

use super::mapping::{insert_sql, persisted_from_row, select_sql, update_sql, write_params};
use super::mapping::{TableMapping, KEY_COLUMN};
use super::{
    ensure_connection_ready, normalize_list_limit, BatchSpan, ListQuery, RepoError, RepoResult,
};
use crate::model::department::Department;
use crate::model::employee::Employee;
use crate::model::job::Job;
use crate::model::{EntityId, Persisted};
use log::{error, info};
use rusqlite::{params, params_from_iter, Connection, Transaction, TransactionBehavior};
use std::marker::PhantomData;
use std::time::Instant;

/// Repository interface for one entity type.
pub trait EntityRepository<E: TableMapping> {
    /// Inserts new ids and fully replaces existing ones, atomically.
    fn upsert_batch(&mut self, records: &[E]) -> RepoResult<Vec<Persisted<E>>>;
    /// Inserts one record; an existing id is a persistence error.
    fn create(&mut self, record: &E) -> RepoResult<Persisted<E>>;
    /// Inserts a batch atomically; any existing id fails the whole batch.
    fn create_batch(&mut self, records: &[E]) -> RepoResult<Vec<Persisted<E>>>;
    fn get(&self, id: EntityId) -> RepoResult<Option<Persisted<E>>>;
    /// Lists rows ordered by id.
    fn list(&self, query: &ListQuery) -> RepoResult<Vec<Persisted<E>>>;
    /// Deletes one row and returns its last stored state.
    fn delete(&mut self, id: EntityId) -> RepoResult<Persisted<E>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteMode {
    Upsert,
    InsertOnly,
}

impl WriteMode {
    fn as_str(self) -> &'static str {
        match self {
            Self::Upsert => "upsert",
            Self::InsertOnly => "insert",
        }
    }
}

/// SQLite-backed repository for entity type `E`.
pub struct SqliteEntityRepository<'conn, E> {
    conn: &'conn mut Connection,
    _entity: PhantomData<E>,
}

pub type DepartmentRepository<'conn> = SqliteEntityRepository<'conn, Department>;
pub type JobRepository<'conn> = SqliteEntityRepository<'conn, Job>;
pub type EmployeeRepository<'conn> = SqliteEntityRepository<'conn, Employee>;

impl<'conn, E: TableMapping> SqliteEntityRepository<'conn, E> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_connection_ready::<E>(conn)?;
        Ok(Self {
            conn,
            _entity: PhantomData,
        })
    }

    fn write_batch(&mut self, records: &[E], mode: WriteMode) -> RepoResult<Vec<Persisted<E>>> {
        let Some(span) = BatchSpan::of(records) else {
            return Ok(Vec::new());
        };
        for record in records {
            record.validate()?;
        }

        let started_at = Instant::now();
        match write_in_transaction(self.conn, records, span, mode) {
            Ok(persisted) => {
                info!(
                    "event=batch_write module=repo status=ok entity={} mode={} size={} first_id={} last_id={} duration_ms={}",
                    E::KIND,
                    mode.as_str(),
                    span.size,
                    span.first_id,
                    span.last_id,
                    started_at.elapsed().as_millis()
                );
                Ok(persisted)
            }
            Err(err) => {
                let record_id = match &err {
                    RepoError::Persistence {
                        record_id: Some(id),
                        ..
                    } => id.to_string(),
                    _ => "none".to_string(),
                };
                error!(
                    "event=batch_write module=repo status=error entity={} mode={} size={} first_id={} last_id={} record_id={} duration_ms={} error={}",
                    E::KIND,
                    mode.as_str(),
                    span.size,
                    span.first_id,
                    span.last_id,
                    record_id,
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }
}

impl<E: TableMapping> EntityRepository<E> for SqliteEntityRepository<'_, E> {
    fn upsert_batch(&mut self, records: &[E]) -> RepoResult<Vec<Persisted<E>>> {
        self.write_batch(records, WriteMode::Upsert)
    }

    fn create(&mut self, record: &E) -> RepoResult<Persisted<E>> {
        let mut persisted = self.write_batch(std::slice::from_ref(record), WriteMode::InsertOnly)?;
        persisted.pop().ok_or(RepoError::NotFound {
            entity: E::KIND,
            id: record.id(),
        })
    }

    fn create_batch(&mut self, records: &[E]) -> RepoResult<Vec<Persisted<E>>> {
        self.write_batch(records, WriteMode::InsertOnly)
    }

    fn get(&self, id: EntityId) -> RepoResult<Option<Persisted<E>>> {
        Ok(fetch_by_id::<E>(&*self.conn, id)?)
    }

    fn list(&self, query: &ListQuery) -> RepoResult<Vec<Persisted<E>>> {
        let sql = format!(
            "{} ORDER BY {KEY_COLUMN} ASC LIMIT ?1 OFFSET ?2;",
            select_sql::<E>()
        );
        let limit = normalize_list_limit(query.limit);
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params![i64::from(limit), i64::from(query.offset)])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(persisted_from_row(row)?);
        }
        Ok(items)
    }

    fn delete(&mut self, id: EntityId) -> RepoResult<Persisted<E>> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let Some(existing) = fetch_by_id::<E>(&tx, id)? else {
            return Err(RepoError::NotFound {
                entity: E::KIND,
                id,
            });
        };

        tx.execute(
            &format!("DELETE FROM {} WHERE {KEY_COLUMN} = ?1;", E::TABLE),
            [id],
        )?;
        tx.commit()?;

        info!(
            "event=record_delete module=repo status=ok entity={} id={}",
            E::KIND,
            id
        );
        Ok(existing)
    }
}

fn write_in_transaction<E: TableMapping>(
    conn: &mut Connection,
    records: &[E],
    span: BatchSpan,
    mode: WriteMode,
) -> RepoResult<Vec<Persisted<E>>> {
    let batch_error = |record_id: Option<EntityId>| {
        move |source: rusqlite::Error| RepoError::Persistence {
            entity: E::KIND,
            batch: span,
            record_id,
            source,
        }
    };

    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(batch_error(None))?;

    for record in records {
        write_one(&tx, record, mode).map_err(batch_error(Some(record.id())))?;
    }

    let mut persisted = Vec::with_capacity(records.len());
    for record in records {
        let stored = fetch_by_id::<E>(&tx, record.id())
            .map_err(batch_error(Some(record.id())))?
            .ok_or(RepoError::NotFound {
                entity: E::KIND,
                id: record.id(),
            })?;
        persisted.push(stored);
    }

    tx.commit().map_err(batch_error(None))?;
    Ok(persisted)
}

fn write_one<E: TableMapping>(
    tx: &Transaction<'_>,
    record: &E,
    mode: WriteMode,
) -> rusqlite::Result<()> {
    let exists = match mode {
        WriteMode::Upsert => row_exists::<E>(tx, record.id())?,
        WriteMode::InsertOnly => false,
    };
    let sql = if exists {
        update_sql::<E>()
    } else {
        insert_sql::<E>()
    };
    let mut stmt = tx.prepare_cached(&sql)?;
    stmt.execute(params_from_iter(write_params(record)))?;
    Ok(())
}

fn row_exists<E: TableMapping>(conn: &Connection, id: EntityId) -> rusqlite::Result<bool> {
    let exists: i64 = conn.query_row(
        &format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE {KEY_COLUMN} = ?1);",
            E::TABLE
        ),
        [id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn fetch_by_id<E: TableMapping>(
    conn: &Connection,
    id: EntityId,
) -> rusqlite::Result<Option<Persisted<E>>> {
    let mut stmt = conn.prepare_cached(&format!(
        "{} WHERE {KEY_COLUMN} = ?1;",
        select_sql::<E>()
    ))?;
    let mut rows = stmt.query([id])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(persisted_from_row(row)?));
    }
    Ok(None)
}
