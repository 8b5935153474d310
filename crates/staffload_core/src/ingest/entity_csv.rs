//! Row-to-record conversion for each entity type.
//!
//! # Invariants
//! - Column names are matched exactly (case-sensitive).
//! - Integer fields tolerate surrounding whitespace; text fields are kept
//!   as written.

use super::table::{TableRow, TabularData};
use crate::model::department::Department;
use crate::model::employee::Employee;
use crate::model::job::Job;
use crate::model::{EntityId, Record};

pub const DEPARTMENT_COLUMNS: &[&str] = &["ID", "DEPARTMENT"];
pub const JOB_COLUMNS: &[&str] = &["ID", "JOB"];
pub const EMPLOYEE_COLUMNS: &[&str] = &["ID", "NAME", "DATETIME", "DEPARTMENT_ID", "JOB_ID"];

/// A record type that can be built from one CSV row.
pub trait CsvRecord: Record {
    /// Exact header names this record type needs.
    const CSV_COLUMNS: &'static [&'static str];

    /// Coerces one row; any error is structural and aborts the file.
    fn from_csv_row(row: &CsvRow<'_>) -> Result<Self, FieldError>;
}

/// Coercion failure for one required field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub column: &'static str,
    pub value: Option<String>,
    pub reason: &'static str,
}

/// Column-name access into one data row.
pub struct CsvRow<'a> {
    table: &'a TabularData,
    row: &'a TableRow,
}

impl<'a> CsvRow<'a> {
    pub fn new(table: &'a TabularData, row: &'a TableRow) -> Self {
        Self { table, row }
    }

    pub fn line(&self) -> u64 {
        self.row.line()
    }

    /// Raw cell value, `None` when the column or cell is absent.
    pub fn raw(&self, column: &str) -> Option<&'a str> {
        self.table
            .column_index(column)
            .and_then(|index| self.row.get(index))
    }

    /// Integer cell; absent, empty or non-numeric values fail.
    pub fn integer(&self, column: &'static str) -> Result<EntityId, FieldError> {
        let raw = self.raw(column).ok_or(FieldError {
            column,
            value: None,
            reason: "is missing",
        })?;
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(FieldError {
                column,
                value: None,
                reason: "is empty",
            });
        }
        trimmed.parse::<EntityId>().map_err(|_| FieldError {
            column,
            value: Some(raw.to_string()),
            reason: "is not an integer",
        })
    }

    /// Non-empty text cell.
    pub fn text(&self, column: &'static str) -> Result<String, FieldError> {
        let value = self.raw(column).ok_or(FieldError {
            column,
            value: None,
            reason: "is missing",
        })?;
        if value.is_empty() {
            return Err(FieldError {
                column,
                value: None,
                reason: "is empty",
            });
        }
        Ok(value.to_string())
    }

    /// Text cell where an absent cell of a short row reads as empty.
    pub fn text_or_empty(&self, column: &str) -> String {
        self.raw(column).unwrap_or_default().to_string()
    }
}

impl CsvRecord for Department {
    const CSV_COLUMNS: &'static [&'static str] = DEPARTMENT_COLUMNS;

    fn from_csv_row(row: &CsvRow<'_>) -> Result<Self, FieldError> {
        Ok(Department::new(row.integer("ID")?, row.text("DEPARTMENT")?))
    }
}

impl CsvRecord for Job {
    const CSV_COLUMNS: &'static [&'static str] = JOB_COLUMNS;

    fn from_csv_row(row: &CsvRow<'_>) -> Result<Self, FieldError> {
        Ok(Job::new(row.integer("ID")?, row.text("JOB")?))
    }
}

impl CsvRecord for Employee {
    const CSV_COLUMNS: &'static [&'static str] = EMPLOYEE_COLUMNS;

    // Empty or absent DATETIME is left to `validate`, which skips the row.
    fn from_csv_row(row: &CsvRow<'_>) -> Result<Self, FieldError> {
        Ok(Employee::new(
            row.integer("ID")?,
            row.text("NAME")?,
            row.text_or_empty("DATETIME"),
            row.integer("DEPARTMENT_ID")?,
            row.integer("JOB_ID")?,
        ))
    }
}
