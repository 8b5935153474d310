//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate ingestion, repositories and archiving into use-case APIs.
//! - Keep CLI and scheduler front-ends decoupled from storage details.

pub mod import_service;
