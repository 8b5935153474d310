//! Department record.

use super::{require_text, EntityId, EntityKind, Record, ValidationError};
use serde::{Deserialize, Serialize};

/// Organizational unit referenced by employees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub id: EntityId,
    /// Unique display name.
    pub department: String,
}

impl Department {
    pub fn new(id: EntityId, department: impl Into<String>) -> Self {
        Self {
            id,
            department: department.into(),
        }
    }
}

impl Record for Department {
    const KIND: EntityKind = EntityKind::Department;

    fn id(&self) -> EntityId {
        self.id
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_text(Self::KIND, self.id, "department", &self.department)
    }
}
