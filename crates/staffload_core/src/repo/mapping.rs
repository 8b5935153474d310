//! Explicit entity ⇄ table mapping.
//!
//! # Invariants
//! - Every table has an integer `id` key plus storage-managed
//!   `created_at` / `updated_at` columns.
//! - `stored_values()` follows `STORED_COLUMNS` order exactly.

use crate::model::department::Department;
use crate::model::employee::Employee;
use crate::model::job::Job;
use crate::model::{Persisted, Record};
use rusqlite::types::Value;
use rusqlite::Row;

pub(crate) const KEY_COLUMN: &str = "id";
pub(crate) const CREATED_AT_COLUMN: &str = "created_at";
pub(crate) const UPDATED_AT_COLUMN: &str = "updated_at";
const NOW_MS_SQL: &str = "(strftime('%s', 'now') * 1000)";

/// Storage layout of one entity type.
pub trait TableMapping: Record {
    const TABLE: &'static str;
    /// Non-key columns written on insert and overwritten on update.
    const STORED_COLUMNS: &'static [&'static str];

    /// Values for `STORED_COLUMNS`, in the same order.
    fn stored_values(&self) -> Vec<Value>;

    /// Decodes the record part of a row selected with `select_sql`.
    fn from_stored_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}

impl TableMapping for Department {
    const TABLE: &'static str = "departments";
    const STORED_COLUMNS: &'static [&'static str] = &["department"];

    fn stored_values(&self) -> Vec<Value> {
        vec![Value::Text(self.department.clone())]
    }

    fn from_stored_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Department {
            id: row.get(KEY_COLUMN)?,
            department: row.get("department")?,
        })
    }
}

impl TableMapping for Job {
    const TABLE: &'static str = "jobs";
    const STORED_COLUMNS: &'static [&'static str] = &["job"];

    fn stored_values(&self) -> Vec<Value> {
        vec![Value::Text(self.job.clone())]
    }

    fn from_stored_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Job {
            id: row.get(KEY_COLUMN)?,
            job: row.get("job")?,
        })
    }
}

impl TableMapping for Employee {
    const TABLE: &'static str = "employees";
    const STORED_COLUMNS: &'static [&'static str] =
        &["name", "datetime", "department_id", "job_id"];

    fn stored_values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.name.clone()),
            Value::Text(self.datetime.clone()),
            Value::Integer(self.department_id),
            Value::Integer(self.job_id),
        ]
    }

    fn from_stored_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Employee {
            id: row.get(KEY_COLUMN)?,
            name: row.get("name")?,
            datetime: row.get("datetime")?,
            department_id: row.get("department_id")?,
            job_id: row.get("job_id")?,
        })
    }
}

/// Every column the repository reads, key first.
pub(crate) fn all_columns<E: TableMapping>() -> Vec<&'static str> {
    let mut columns = Vec::with_capacity(E::STORED_COLUMNS.len() + 3);
    columns.push(KEY_COLUMN);
    columns.extend_from_slice(E::STORED_COLUMNS);
    columns.push(CREATED_AT_COLUMN);
    columns.push(UPDATED_AT_COLUMN);
    columns
}

/// `SELECT <all columns> FROM <table>` without a trailing clause.
pub(crate) fn select_sql<E: TableMapping>() -> String {
    format!(
        "SELECT {} FROM {}",
        all_columns::<E>().join(", "),
        E::TABLE
    )
}

/// Insert statement binding `?1` to the key and `?2..` to stored columns.
pub(crate) fn insert_sql<E: TableMapping>() -> String {
    let mut columns = vec![KEY_COLUMN];
    columns.extend_from_slice(E::STORED_COLUMNS);
    let placeholders: Vec<String> = (1..=columns.len()).map(|n| format!("?{n}")).collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({});",
        E::TABLE,
        columns.join(", "),
        placeholders.join(", ")
    )
}

/// Full-replace update with the same bindings as `insert_sql`.
pub(crate) fn update_sql<E: TableMapping>() -> String {
    let assignments: Vec<String> = E::STORED_COLUMNS
        .iter()
        .enumerate()
        .map(|(index, column)| format!("{column} = ?{}", index + 2))
        .collect();
    format!(
        "UPDATE {} SET {}, {UPDATED_AT_COLUMN} = {NOW_MS_SQL} WHERE {KEY_COLUMN} = ?1;",
        E::TABLE,
        assignments.join(", ")
    )
}

/// Key first, then stored values; matches `insert_sql` and `update_sql`.
pub(crate) fn write_params<E: TableMapping>(record: &E) -> Vec<Value> {
    let mut values = Vec::with_capacity(E::STORED_COLUMNS.len() + 1);
    values.push(Value::Integer(record.id()));
    values.extend(record.stored_values());
    values
}

pub(crate) fn persisted_from_row<E: TableMapping>(
    row: &Row<'_>,
) -> rusqlite::Result<Persisted<E>> {
    Ok(Persisted {
        record: E::from_stored_row(row)?,
        created_at: row.get(CREATED_AT_COLUMN)?,
        updated_at: row.get(UPDATED_AT_COLUMN)?,
    })
}

#[cfg(test)]
mod tests {
    use super::{insert_sql, select_sql, update_sql, write_params};
    use crate::model::employee::Employee;
    use crate::model::job::Job;
    use rusqlite::types::Value;

    #[test]
    fn statements_follow_the_field_map() {
        assert_eq!(
            select_sql::<Job>(),
            "SELECT id, job, created_at, updated_at FROM jobs"
        );
        assert_eq!(
            insert_sql::<Employee>(),
            "INSERT INTO employees (id, name, datetime, department_id, job_id) VALUES (?1, ?2, ?3, ?4, ?5);"
        );
        assert_eq!(
            update_sql::<Job>(),
            "UPDATE jobs SET job = ?2, updated_at = (strftime('%s', 'now') * 1000) WHERE id = ?1;"
        );
    }

    #[test]
    fn write_params_put_key_first() {
        let employee = Employee::new(5, "Ada", "2024-01-01", 1, 2);
        assert_eq!(
            write_params(&employee),
            vec![
                Value::Integer(5),
                Value::Text("Ada".to_string()),
                Value::Text("2024-01-01".to_string()),
                Value::Integer(1),
                Value::Integer(2),
            ]
        );
    }
}
