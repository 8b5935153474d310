//! Command-line front-end for staffload core.
//!
//! # Responsibility
//! - Resolve settings, logging and the database connection for one run.
//! - Expose header checks, imports and row lookups as subcommands.
//!
//! Results are printed to stdout as JSON; logs never go to stdout.

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use rusqlite::Connection;
use serde::Serialize;
use staffload_core::db::open_db;
use staffload_core::{
    default_log_level, init_logging, CsvIngestor, CsvRecord, Department, Employee, EntityId,
    EntityKind, EntityRepository, ImportService, ImportSettings, Job, ListQuery, Settings,
    SqliteEntityRepository, TableMapping,
};
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Parser)]
#[command(name = "staffload")]
#[command(about = "Load department, job and employee CSV files into SQLite")]
#[command(version)]
struct Cli {
    /// TOML settings file; environment variables override its values
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Database file, overriding `database_path` and DB_PATH
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that a file carries exactly the entity's column set
    CheckHeaders {
        #[arg(value_parser = EntityKind::from_str)]
        entity: EntityKind,
        file: PathBuf,
    },
    /// Import one CSV file and archive it
    Import {
        #[arg(value_parser = EntityKind::from_str)]
        entity: EntityKind,
        file: PathBuf,

        /// Leave the file in place after a successful import
        #[arg(long)]
        no_archive: bool,
    },
    /// Import every recognizable CSV file in a directory
    ImportDir {
        /// Defaults to the configured input directory
        dir: Option<PathBuf>,
    },
    /// Print one stored row
    Get {
        #[arg(value_parser = EntityKind::from_str)]
        entity: EntityKind,
        id: EntityId,
    },
    /// Print stored rows ordered by id
    List {
        #[arg(value_parser = EntityKind::from_str)]
        entity: EntityKind,

        #[arg(long, default_value_t = 0)]
        offset: u32,

        /// Defaults to 100, capped at 1000
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Delete one stored row and print its last state
    Delete {
        #[arg(value_parser = EntityKind::from_str)]
        entity: EntityKind,
        id: EntityId,
    },
}

fn main() -> anyhow::Result<()> {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load(cli.config.as_deref()).context("Failed to load settings")?;
    if let Some(database) = cli.database {
        settings.database_path = database;
    }

    let level = settings
        .log_level
        .clone()
        .unwrap_or_else(|| default_log_level().to_string());
    init_logging(&level, settings.log_dir.as_deref())
        .map_err(|message| anyhow!(message))
        .context("Failed to initialize logging")?;

    match cli.command {
        Commands::CheckHeaders { entity, file } => {
            let settings = ImportSettings::from_settings(&settings)?;
            let ingestor = CsvIngestor::new(settings.delimiter);
            let valid = ingestor.validate_headers(&file, expected_columns(entity));
            println!("{valid}");
        }
        Commands::Import {
            entity,
            file,
            no_archive,
        } => {
            settings.ensure_directories()?;
            let mut import_settings = ImportSettings::from_settings(&settings)?;
            if no_archive {
                import_settings.processed_dir = None;
            }
            let mut conn = connect(&settings.database_path)?;
            let mut service = ImportService::new(&mut conn, &import_settings)?;
            let report = service
                .import_kind(entity, &file)
                .with_context(|| format!("Failed to import {}", file.display()))?;
            print_json(&report)?;
        }
        Commands::ImportDir { dir } => {
            settings.ensure_directories()?;
            let import_settings = ImportSettings::from_settings(&settings)?;
            let dir = dir.unwrap_or_else(|| settings.input_dir.clone());
            let mut conn = connect(&settings.database_path)?;
            let mut service = ImportService::new(&mut conn, &import_settings)?;
            let reports = service
                .import_directory(&dir)
                .with_context(|| format!("Failed to import directory {}", dir.display()))?;
            print_json(&reports)?;
        }
        Commands::Get { entity, id } => {
            let mut conn = connect(&settings.database_path)?;
            match entity {
                EntityKind::Department => get::<Department>(&mut conn, id)?,
                EntityKind::Job => get::<Job>(&mut conn, id)?,
                EntityKind::Employee => get::<Employee>(&mut conn, id)?,
            }
        }
        Commands::List {
            entity,
            offset,
            limit,
        } => {
            let mut conn = connect(&settings.database_path)?;
            let query = ListQuery { offset, limit };
            match entity {
                EntityKind::Department => list::<Department>(&mut conn, &query)?,
                EntityKind::Job => list::<Job>(&mut conn, &query)?,
                EntityKind::Employee => list::<Employee>(&mut conn, &query)?,
            }
        }
        Commands::Delete { entity, id } => {
            let mut conn = connect(&settings.database_path)?;
            match entity {
                EntityKind::Department => delete::<Department>(&mut conn, id)?,
                EntityKind::Job => delete::<Job>(&mut conn, id)?,
                EntityKind::Employee => delete::<Employee>(&mut conn, id)?,
            }
        }
    }

    Ok(())
}

fn expected_columns(kind: EntityKind) -> &'static [&'static str] {
    match kind {
        EntityKind::Department => Department::CSV_COLUMNS,
        EntityKind::Job => Job::CSV_COLUMNS,
        EntityKind::Employee => Employee::CSV_COLUMNS,
    }
}

fn connect(path: &Path) -> anyhow::Result<Connection> {
    if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    open_db(path).with_context(|| format!("Failed to open database {}", path.display()))
}

fn get<E>(conn: &mut Connection, id: EntityId) -> anyhow::Result<()>
where
    E: TableMapping + Serialize,
{
    let repo = SqliteEntityRepository::<E>::try_new(conn)?;
    match repo.get(id)? {
        Some(row) => print_json(&row),
        None => Err(anyhow!("{} {id} not found", E::KIND)),
    }
}

fn list<E>(conn: &mut Connection, query: &ListQuery) -> anyhow::Result<()>
where
    E: TableMapping + Serialize,
{
    let repo = SqliteEntityRepository::<E>::try_new(conn)?;
    print_json(&repo.list(query)?)
}

fn delete<E>(conn: &mut Connection, id: EntityId) -> anyhow::Result<()>
where
    E: TableMapping + Serialize,
{
    let mut repo = SqliteEntityRepository::<E>::try_new(conn)?;
    print_json(&repo.delete(id)?)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{Cli, Commands};
    use clap::Parser;
    use staffload_core::EntityKind;

    #[test]
    fn parses_import_with_global_options() {
        let cli = Cli::try_parse_from([
            "staffload",
            "import",
            "employees",
            "in/hired.csv",
            "--no-archive",
            "--database",
            "/tmp/x.db",
        ])
        .unwrap();
        assert_eq!(cli.database.unwrap().to_str(), Some("/tmp/x.db"));
        match cli.command {
            Commands::Import {
                entity, no_archive, ..
            } => {
                assert_eq!(entity, EntityKind::Employee);
                assert!(no_archive);
            }
            _ => panic!("expected import command"),
        }
    }

    #[test]
    fn rejects_unknown_entity() {
        assert!(Cli::try_parse_from(["staffload", "get", "manager", "1"]).is_err());
    }

    #[test]
    fn list_defaults_to_first_page() {
        let cli = Cli::try_parse_from(["staffload", "list", "job"]).unwrap();
        match cli.command {
            Commands::List { offset, limit, .. } => {
                assert_eq!(offset, 0);
                assert_eq!(limit, None);
            }
            _ => panic!("expected list command"),
        }
    }
}
