// Delimited table loader shared by the GDP and code-reference inputs

use crate::error::LoadError;
use csv::{ReaderBuilder, StringRecord};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One record of a table: field name to field value.
pub type Row = BTreeMap<String, String>;

/// Where a table lives and how its fields are delimited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSource {
    pub path: PathBuf,
    pub separator: u8,
    pub quote: u8,
}

impl TableSource {
    pub fn new(path: impl Into<PathBuf>, separator: u8, quote: u8) -> Self {
        Self {
            path: path.into(),
            separator,
            quote,
        }
    }

    /// Comma separated, double-quoted
    pub fn csv(path: impl Into<PathBuf>) -> Self {
        Self::new(path, b',', b'"')
    }
}

/// Read every row in source order.
pub fn read_rows(source: &TableSource) -> Result<Vec<Row>, LoadError> {
    let mut rows = Vec::new();
    read_with(source, |headers, record| {
        rows.push(to_row(headers, record));
        Ok(())
    })?;
    debug!(path = %source.path.display(), rows = rows.len(), "loaded table rows");
    Ok(rows)
}

/// Read every row, keyed by the value of `key_field`. Later rows replace
/// earlier rows with the same key.
pub fn read_keyed(source: &TableSource, key_field: &str) -> Result<BTreeMap<String, Row>, LoadError> {
    let mut table = BTreeMap::new();
    let mut key_index = None;
    read_with(source, |headers, record| {
        let idx = match key_index {
            Some(idx) => idx,
            None => {
                let idx = find_field(&source.path, headers, key_field)?;
                key_index = Some(idx);
                idx
            }
        };
        let key = record.get(idx).unwrap_or("").to_string();
        table.insert(key, to_row(headers, record));
        Ok(())
    })?;

    // Header-only tables still need the key field to exist
    if key_index.is_none() {
        let mut reader = open(source)?;
        let headers = reader
            .headers()
            .map_err(|e| LoadError::from_csv(source.path.clone(), e))?
            .clone();
        find_field(&source.path, &headers, key_field)?;
    }

    debug!(
        path = %source.path.display(),
        key = key_field,
        rows = table.len(),
        "loaded keyed table"
    );
    Ok(table)
}

/// Verify that every name in `fields` is a header of the table.
pub fn require_fields(source: &TableSource, fields: &[&str]) -> Result<(), LoadError> {
    let mut reader = open(source)?;
    let headers = reader
        .headers()
        .map_err(|e| LoadError::from_csv(source.path.clone(), e))?;
    for field in fields {
        find_field(&source.path, headers, field)?;
    }
    Ok(())
}

fn open(source: &TableSource) -> Result<csv::Reader<std::fs::File>, LoadError> {
    if !source.path.exists() {
        return Err(LoadError::SourceNotFound {
            path: source.path.clone(),
        });
    }

    ReaderBuilder::new()
        .has_headers(true)
        .delimiter(source.separator)
        .quote(source.quote)
        .flexible(false)
        .from_path(&source.path)
        .map_err(|e| LoadError::from_csv(source.path.clone(), e))
}

fn read_with<F>(source: &TableSource, mut on_record: F) -> Result<(), LoadError>
where
    F: FnMut(&StringRecord, &StringRecord) -> Result<(), LoadError>,
{
    let mut reader = open(source)?;
    let headers = reader
        .headers()
        .map_err(|e| LoadError::from_csv(source.path.clone(), e))?
        .clone();

    for record in reader.records() {
        let record = record.map_err(|e| LoadError::from_csv(source.path.clone(), e))?;
        on_record(&headers, &record)?;
    }

    Ok(())
}

fn find_field(path: &Path, headers: &StringRecord, field: &str) -> Result<usize, LoadError> {
    headers
        .iter()
        .position(|h| h.trim_start_matches('\u{feff}') == field)
        .ok_or_else(|| LoadError::MissingField {
            path: path.to_path_buf(),
            field: field.to_string(),
        })
}

fn to_row(headers: &StringRecord, record: &StringRecord) -> Row {
    headers
        .iter()
        .zip(record.iter())
        .map(|(h, v)| (h.trim_start_matches('\u{feff}').to_string(), v.to_string()))
        .collect()
}
