//! Post-ingestion file archiving.
//!
//! # Responsibility
//! - Move ingested files into the processed directory.
//! - Derive collision-free, timestamped destination names.
//!
//! # Invariants
//! - Destination names look like `<stem>_<YYYYMMDD_HHMMSS><.ext>`.
//! - An existing file in the processed directory is never overwritten.

use chrono::{Local, NaiveDateTime};
use log::{error, info};
use std::error::Error;
use std::ffi::OsString;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const MAX_COLLISION_SUFFIX: u32 = 1000;

#[derive(Debug)]
pub enum ArchiveError {
    SourceMissing(PathBuf),
    /// No free destination name was found.
    NameExhausted(PathBuf),
    Io {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },
}

impl Display for ArchiveError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SourceMissing(path) => {
                write!(f, "file to archive does not exist: {}", path.display())
            }
            Self::NameExhausted(path) => write!(
                f,
                "no free archive name for `{}` in the processed directory",
                path.display()
            ),
            Self::Io { from, to, source } => write!(
                f,
                "cannot move `{}` to `{}`: {source}",
                from.display(),
                to.display()
            ),
        }
    }
}

impl Error for ArchiveError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::SourceMissing(_) | Self::NameExhausted(_) => None,
        }
    }
}

/// Moves processed files into one directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Archiver {
    processed_dir: PathBuf,
}

impl Archiver {
    pub fn new(processed_dir: impl Into<PathBuf>) -> Self {
        Self {
            processed_dir: processed_dir.into(),
        }
    }

    pub fn processed_dir(&self) -> &Path {
        &self.processed_dir
    }

    /// Archives `path` using the local wall clock.
    pub fn archive(&self, path: &Path) -> Result<PathBuf, ArchiveError> {
        self.archive_at(path, Local::now().naive_local())
    }

    /// Archives `path` as if it happened at `timestamp`.
    ///
    /// # Errors
    /// - `ArchiveError::SourceMissing` when `path` is not a file.
    /// - `ArchiveError::Io` when the move cannot complete.
    pub fn archive_at(&self, path: &Path, timestamp: NaiveDateTime) -> Result<PathBuf, ArchiveError> {
        if !path.is_file() {
            return Err(ArchiveError::SourceMissing(path.to_path_buf()));
        }

        let destination = self.free_destination(path, timestamp)?;
        match move_file(path, &destination) {
            Ok(()) => {
                info!(
                    "event=file_archive module=archive status=ok from={} to={}",
                    path.display(),
                    destination.display()
                );
                Ok(destination)
            }
            Err(source) => {
                error!(
                    "event=file_archive module=archive status=error from={} to={} error={}",
                    path.display(),
                    destination.display(),
                    source
                );
                Err(ArchiveError::Io {
                    from: path.to_path_buf(),
                    to: destination,
                    source,
                })
            }
        }
    }

    fn free_destination(&self, path: &Path, timestamp: NaiveDateTime) -> Result<PathBuf, ArchiveError> {
        let first = self.processed_dir.join(archive_file_name(path, timestamp, None));
        if !first.exists() {
            return Ok(first);
        }
        for counter in 1..=MAX_COLLISION_SUFFIX {
            let candidate = self
                .processed_dir
                .join(archive_file_name(path, timestamp, Some(counter)));
            if !candidate.exists() {
                return Ok(candidate);
            }
        }
        Err(ArchiveError::NameExhausted(path.to_path_buf()))
    }
}

/// Builds `<stem>_<YYYYMMDD_HHMMSS>[_<counter>]<.ext>` for `path`.
pub fn archive_file_name(path: &Path, timestamp: NaiveDateTime, counter: Option<u32>) -> OsString {
    let mut name = path
        .file_stem()
        .map(OsString::from)
        .unwrap_or_default();
    name.push("_");
    name.push(timestamp.format(TIMESTAMP_FORMAT).to_string());
    if let Some(counter) = counter {
        name.push(format!("_{counter}"));
    }
    if let Some(extension) = path.extension() {
        name.push(".");
        name.push(extension);
    }
    name
}

fn move_file(from: &Path, to: &Path) -> std::io::Result<()> {
    if std::fs::rename(from, to).is_ok() {
        return Ok(());
    }
    // rename fails across filesystems; copy then remove.
    std::fs::copy(from, to)?;
    std::fs::remove_file(from)
}
