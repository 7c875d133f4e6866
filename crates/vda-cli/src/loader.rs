//! CSV loading and explicit source caching.
//!
//! The loader is the boundary between "bytes on disk" and the core's raw
//! rows: it reads a CSV file, classifies each cell, and hands the rows to
//! normalization. It owns no interpretation beyond cell classification.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use csv::ReaderBuilder;
use thiserror::Error;
use vda_core::{CellValue, RawRow, SchemaError};

/// A loaded table: the header plus raw rows keyed by header name.
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<RawRow>,
}

/// Errors while materializing a CSV source.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The file could not be inspected or read.
    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file exists but is not parseable CSV.
    #[error("failed to parse CSV {path}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// The header lacks required columns.
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Reads a CSV file into raw rows.
///
/// Rows shorter than the header simply lack those columns (the normalizer
/// sees missing cells); extra fields beyond the header are dropped. The
/// reader is deliberately lenient — data quality is judged per row during
/// normalization, not here.
pub fn load_table(path: &Path) -> Result<Table, LoadError> {
    let csv_error = |source| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(csv_error)?;

    let header: Vec<String> = reader
        .headers()
        .map_err(csv_error)?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(csv_error)?;
        let row: RawRow = header
            .iter()
            .zip(record.iter())
            .map(|(column, field)| (column.clone(), CellValue::from_raw(field)))
            .collect();
        rows.push(row);
    }

    tracing::debug!(path = %path.display(), rows = rows.len(), "loaded table");
    Ok(Table { header, rows })
}

/// Identity of a source file's content, used to detect staleness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Fingerprint {
    len: u64,
    modified: Option<SystemTime>,
}

impl Fingerprint {
    fn of(path: &Path) -> Result<Self, LoadError> {
        let metadata = fs::metadata(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            len: metadata.len(),
            modified: metadata.modified().ok(),
        })
    }
}

/// An explicit cache for one CSV source.
///
/// The original dashboard cached its spreadsheet fetch process-wide; here
/// the cache is an object the caller owns, keyed by the file's fingerprint
/// (length + mtime). A fingerprint change always reloads, so a cached read
/// never differs from a fresh one.
#[derive(Debug)]
pub struct SourceCache {
    path: PathBuf,
    state: Option<(Fingerprint, Table)>,
}

impl SourceCache {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            state: None,
        }
    }

    /// The cached source's path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the table, rereading the file only when it changed.
    pub fn load(&mut self) -> Result<&Table, LoadError> {
        let fingerprint = Fingerprint::of(&self.path)?;
        let stale = self
            .state
            .as_ref()
            .is_none_or(|(cached, _)| *cached != fingerprint);
        if stale {
            let table = load_table(&self.path)?;
            self.state = Some((fingerprint, table));
        }
        // Populated just above whenever it was empty or stale.
        let (_, table) = self.state.as_ref().expect("cache populated");
        Ok(table)
    }

    /// Drops the cached table; the next load rereads the file.
    pub fn invalidate(&mut self) {
        self.state = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(path: &Path, content: &str) {
        let mut file = fs::File::create(path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
    }

    #[test]
    fn loads_rows_keyed_by_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("turni.csv");
        write_csv(&path, "Inizio,Fine,Categoria\n2024-01-01 08:00,14:00,[TS]\n");

        let table = load_table(&path).unwrap();
        assert_eq!(table.header, vec!["Inizio", "Fine", "Categoria"]);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(
            table.rows[0].get("Fine"),
            Some(&CellValue::Text("14:00".to_string()))
        );
    }

    #[test]
    fn short_rows_leave_cells_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("turni.csv");
        write_csv(&path, "Inizio,Fine,Categoria\n2024-01-01 08:00,14:00\n");

        let table = load_table(&path).unwrap();
        assert_eq!(table.rows[0].get("Categoria"), None);
    }

    #[test]
    fn blank_cells_are_classified_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("servizi.csv");
        write_csv(&path, "GG,Km effet.\n2024-01-01,\n");

        let table = load_table(&path).unwrap();
        assert_eq!(table.rows[0].get("Km effet."), Some(&CellValue::Missing));
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.csv");
        assert!(load_table(&path).is_err());
    }

    #[test]
    fn cache_reloads_when_file_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("turni.csv");
        write_csv(&path, "Inizio,Fine\n08:00,14:00\n");

        let mut cache = SourceCache::new(&path);
        assert_eq!(cache.load().unwrap().rows.len(), 1);

        // Different length guarantees a fingerprint change even with coarse
        // mtime granularity.
        write_csv(&path, "Inizio,Fine\n08:00,14:00\n09:00,15:00\n");
        assert_eq!(cache.load().unwrap().rows.len(), 2);
    }

    #[test]
    fn invalidate_forces_a_reread() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("turni.csv");
        write_csv(&path, "Inizio,Fine\n08:00,14:00\n");

        let mut cache = SourceCache::new(&path);
        cache.load().unwrap();
        cache.invalidate();
        assert_eq!(cache.load().unwrap().rows.len(), 1);
    }
}
