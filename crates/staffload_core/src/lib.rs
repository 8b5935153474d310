//! Core ingestion and persistence logic for staffload.
//! Turns department/job/employee CSV files into upserted SQLite rows.

pub mod archive;
pub mod batch;
pub mod config;
pub mod db;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use archive::{ArchiveError, Archiver};
pub use batch::batch;
pub use config::{ConfigError, Settings};
pub use ingest::{CsvIngestor, CsvRecord, IngestError, IngestOutcome, SkippedRow, TabularData};
pub use logging::{default_log_level, init_logging, logging_status, LogTarget};
pub use model::department::Department;
pub use model::employee::Employee;
pub use model::job::Job;
pub use model::{EntityId, EntityKind, Persisted, Record, ValidationError};
pub use repo::{
    BatchSpan, DepartmentRepository, EmployeeRepository, EntityRepository, JobRepository,
    ListQuery, RepoError, RepoResult, SqliteEntityRepository, TableMapping,
};
pub use service::import_service::{ImportError, ImportReport, ImportService, ImportSettings};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
