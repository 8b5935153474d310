//! In-memory row/column view of a delimited file.

use super::{IngestError, IngestResult};
use csv::{ReaderBuilder, StringRecord};
use std::collections::HashSet;
use std::fs::File;
use std::path::Path;

/// One data row with its 1-based line number in the source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    line: u64,
    fields: Vec<String>,
}

impl TableRow {
    pub fn line(&self) -> u64 {
        self.line
    }

    /// Field at column position `index`, if the row is long enough.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(String::as_str)
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }
}

/// Fully materialized delimited file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TabularData {
    headers: Vec<String>,
    rows: Vec<TableRow>,
}

impl TabularData {
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    /// Number of data rows (header excluded).
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of the first header named exactly `name`.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }

    /// Required columns absent from the header row, in `required` order.
    pub fn missing_columns(&self, required: &[&str]) -> Vec<String> {
        required
            .iter()
            .filter(|column| self.column_index(column).is_none())
            .map(|column| column.to_string())
            .collect()
    }
}

/// Reads only the header row of `path`.
pub fn read_headers(path: &Path, delimiter: u8) -> IngestResult<Vec<String>> {
    let mut reader = open_reader(path, delimiter)?;
    let headers = reader.headers().map_err(|source| IngestError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(record_to_strings(headers))
}

/// Reads the whole file at `path` into memory.
pub fn read_table(path: &Path, delimiter: u8) -> IngestResult<TabularData> {
    let mut reader = open_reader(path, delimiter)?;
    let headers = reader
        .headers()
        .map_err(|source| IngestError::Parse {
            path: path.to_path_buf(),
            source,
        })?
        .clone();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|source| IngestError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        let line = record.position().map_or(0, |position| position.line());
        rows.push(TableRow {
            line,
            fields: record_to_strings(&record),
        });
    }

    Ok(TabularData {
        headers: record_to_strings(&headers),
        rows,
    })
}

/// Order-independent, case-sensitive comparison of two column sets.
pub fn same_column_set(actual: &[String], expected: &[&str]) -> bool {
    let actual: HashSet<&str> = actual.iter().map(String::as_str).collect();
    let expected: HashSet<&str> = expected.iter().copied().collect();
    actual == expected
}

fn open_reader(path: &Path, delimiter: u8) -> IngestResult<csv::Reader<File>> {
    let file = File::open(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(file))
}

fn record_to_strings(record: &StringRecord) -> Vec<String> {
    record.iter().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::{read_headers, read_table, same_column_set};
    use crate::ingest::IngestError;
    use std::io::Write;

    fn write_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(contents.as_bytes()).expect("write temp file");
        file
    }

    #[test]
    fn read_table_keeps_rows_in_order_with_line_numbers() {
        let file = write_file("ID,DEPARTMENT\n1,Sales\n2,Legal\n");
        let table = read_table(file.path(), b',').unwrap();

        assert_eq!(table.headers(), ["ID", "DEPARTMENT"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[0].get(1), Some("Sales"));
        assert_eq!(table.rows()[0].line(), 2);
        assert_eq!(table.rows()[1].line(), 3);
    }

    #[test]
    fn read_table_honours_custom_delimiter() {
        let file = write_file("ID;JOB\n7;Analyst, Senior\n");
        let table = read_table(file.path(), b';').unwrap();
        assert_eq!(table.rows()[0].get(1), Some("Analyst, Senior"));
    }

    #[test]
    fn missing_columns_lists_every_absent_column() {
        let file = write_file("ID,NAME\n1,Ada\n");
        let table = read_table(file.path(), b',').unwrap();
        assert_eq!(
            table.missing_columns(&["ID", "NAME", "DATETIME", "JOB_ID"]),
            vec!["DATETIME".to_string(), "JOB_ID".to_string()]
        );
    }

    #[test]
    fn read_headers_reports_missing_file_as_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let error = read_headers(&dir.path().join("absent.csv"), b',').unwrap_err();
        assert!(matches!(error, IngestError::Io { .. }));
    }

    #[test]
    fn column_set_comparison_ignores_order_but_not_case() {
        let headers = vec!["DEPARTMENT".to_string(), "ID".to_string()];
        assert!(same_column_set(&headers, &["ID", "DEPARTMENT"]));
        assert!(!same_column_set(&headers, &["id", "DEPARTMENT"]));
        assert!(!same_column_set(&headers, &["ID"]));
    }
}
