//! Organizational record model shared by ingestion and persistence.
//!
//! # Responsibility
//! - Define the canonical shapes for departments, jobs and employees.
//! - Provide field-level validation before any record reaches storage.
//!
//! # Invariants
//! - Primary keys are supplied by the caller and never generated in core.
//! - Validation is pure: no I/O, no logging.
//!
//! # See also
//! - docs/architecture/data-model.md

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

pub mod datetime;
pub mod department;
pub mod employee;
pub mod job;

/// Caller-supplied primary key shared by every entity type.
pub type EntityId = i64;

/// Entity types handled by the ingestion pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Department,
    Job,
    Employee,
}

impl EntityKind {
    /// Stable lowercase name used in logs, CLI arguments and reports.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Department => "department",
            Self::Job => "job",
            Self::Employee => "employee",
        }
    }

    /// All kinds in dependency order (referenced parents first).
    pub fn all() -> [EntityKind; 3] {
        [Self::Department, Self::Job, Self::Employee]
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "department" | "departments" => Ok(Self::Department),
            "job" | "jobs" => Ok(Self::Job),
            "employee" | "employees" => Ok(Self::Employee),
            other => Err(format!(
                "unsupported entity `{other}`; expected department|job|employee"
            )),
        }
    }
}

/// Capability set every persisted entity type provides.
pub trait Record: Clone + std::fmt::Debug {
    /// Entity type tag used for logging and error context.
    const KIND: EntityKind;

    /// Returns the caller-supplied primary key.
    fn id(&self) -> EntityId;

    /// Checks field-level rules.
    ///
    /// # Errors
    /// - Returns the first violated rule.
    fn validate(&self) -> Result<(), ValidationError>;
}

/// Field-level validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required text field is empty or whitespace-only.
    EmptyField {
        entity: EntityKind,
        id: EntityId,
        field: &'static str,
    },
    /// Employee hire timestamp is not ISO-8601.
    InvalidDatetime { id: EntityId, value: String },
}

impl ValidationError {
    /// Whether ingestion may drop the offending row and keep going.
    ///
    /// Only value-format problems are row-recoverable; missing required
    /// data aborts the file.
    pub fn is_row_recoverable(&self) -> bool {
        matches!(self, Self::InvalidDatetime { .. })
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyField { entity, id, field } => {
                write!(f, "{entity} {id}: field `{field}` must not be empty")
            }
            Self::InvalidDatetime { id, value } => {
                write!(f, "employee {id}: datetime `{value}` is not ISO-8601")
            }
        }
    }
}

impl Error for ValidationError {}

/// Stored entity together with storage-assigned metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Persisted<E> {
    #[serde(flatten)]
    pub record: E,
    /// Insert timestamp in epoch milliseconds, assigned by storage.
    pub created_at: i64,
    /// Last write timestamp in epoch milliseconds, assigned by storage.
    pub updated_at: i64,
}

impl<E: Record> Persisted<E> {
    pub fn id(&self) -> EntityId {
        self.record.id()
    }
}

pub(crate) fn require_text(
    entity: EntityKind,
    id: EntityId,
    field: &'static str,
    value: &str,
) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField { entity, id, field });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{EntityKind, ValidationError};

    #[test]
    fn entity_kind_parses_singular_and_plural_names() {
        assert_eq!("Department".parse::<EntityKind>(), Ok(EntityKind::Department));
        assert_eq!("jobs".parse::<EntityKind>(), Ok(EntityKind::Job));
        assert_eq!(" employee ".parse::<EntityKind>(), Ok(EntityKind::Employee));
        assert!("manager".parse::<EntityKind>().is_err());
    }

    #[test]
    fn only_datetime_errors_are_row_recoverable() {
        let datetime = ValidationError::InvalidDatetime {
            id: 2,
            value: "not-a-date".to_string(),
        };
        let empty = ValidationError::EmptyField {
            entity: EntityKind::Job,
            id: 1,
            field: "job",
        };
        assert!(datetime.is_row_recoverable());
        assert!(!empty.is_row_recoverable());
    }
}
