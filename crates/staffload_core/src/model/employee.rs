//! Employee record.
//!
//! # Invariants
//! - `datetime` is kept as the caller wrote it; it only has to parse as
//!   ISO-8601.
//! - `department_id` and `job_id` are checked by storage foreign keys,
//!   not here.

use super::datetime::is_iso8601;
use super::{require_text, EntityId, EntityKind, Record, ValidationError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EntityId,
    pub name: String,
    /// Hire timestamp, ISO-8601, stored verbatim.
    pub datetime: String,
    pub department_id: EntityId,
    pub job_id: EntityId,
}

impl Employee {
    pub fn new(
        id: EntityId,
        name: impl Into<String>,
        datetime: impl Into<String>,
        department_id: EntityId,
        job_id: EntityId,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            datetime: datetime.into(),
            department_id,
            job_id,
        }
    }
}

impl Record for Employee {
    const KIND: EntityKind = EntityKind::Employee;

    fn id(&self) -> EntityId {
        self.id
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_text(Self::KIND, self.id, "name", &self.name)?;
        if !is_iso8601(&self.datetime) {
            return Err(ValidationError::InvalidDatetime {
                id: self.id,
                value: self.datetime.clone(),
            });
        }
        Ok(())
    }
}
