use std::path::PathBuf;
use thiserror::Error;

/// Failures raised while loading a delimited table from disk.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("source not found: {}", path.display())]
    SourceNotFound { path: PathBuf },
    #[error(
        "malformed row in {} at line {line}: expected {expected} fields, found {found}",
        path.display()
    )]
    MalformedRow {
        path: PathBuf,
        line: u64,
        expected: u64,
        found: u64,
    },
    #[error("field '{field}' not found in header of {}", path.display())]
    MissingField { path: PathBuf, field: String },
    #[error("failed to read {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

impl LoadError {
    pub(crate) fn from_csv(path: PathBuf, err: csv::Error) -> Self {
        match err.kind() {
            csv::ErrorKind::UnequalLengths {
                pos,
                expected_len,
                len,
            } => LoadError::MalformedRow {
                path,
                line: pos.as_ref().map(|p| p.line()).unwrap_or(0),
                expected: *expected_len,
                found: *len,
            },
            csv::ErrorKind::Io(io) if io.kind() == std::io::ErrorKind::NotFound => {
                LoadError::SourceNotFound { path }
            }
            _ => LoadError::Csv { path, source: err },
        }
    }
}
