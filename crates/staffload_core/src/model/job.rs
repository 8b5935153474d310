//! Job record.

use super::{require_text, EntityId, EntityKind, Record, ValidationError};
use serde::{Deserialize, Serialize};

/// Job title referenced by employees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: EntityId,
    /// Unique job title.
    pub job: String,
}

impl Job {
    pub fn new(id: EntityId, job: impl Into<String>) -> Self {
        Self {
            id,
            job: job.into(),
        }
    }
}

impl Record for Job {
    const KIND: EntityKind = EntityKind::Job;

    fn id(&self) -> EntityId {
        self.id
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_text(Self::KIND, self.id, "job", &self.job)
    }
}
