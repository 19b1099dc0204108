// Plot code -> data code conversion built from a code reference table

use crate::config::CodeInfo;
use crate::table;
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use tracing::debug;

/// Maps plot codes to data codes. Lookups ignore case; the stored codes keep
/// the casing of the reference table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CodeConverter {
    entries: BTreeMap<String, String>,
    folded: BTreeMap<String, String>,
}

impl CodeConverter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a pair; a later insert replaces any earlier plot code that differs
    /// only in case.
    pub fn insert(&mut self, plot_code: impl Into<String>, data_code: impl Into<String>) {
        let plot_code = plot_code.into();
        let data_code = data_code.into();
        let key = plot_code.to_lowercase();
        if let Some(previous) = self.folded.get(&key) {
            if let Some(stale) = self
                .entries
                .keys()
                .find(|k| k.to_lowercase() == key && **k != plot_code)
                .cloned()
            {
                debug!(plot_code = %stale, replaced = %previous, "plot code redefined");
                self.entries.remove(&stale);
            }
        }
        self.folded.insert(key, data_code.clone());
        self.entries.insert(plot_code, data_code);
    }

    /// Case-insensitive lookup of the data code for `plot_code`.
    pub fn get(&self, plot_code: &str) -> Option<&str> {
        self.folded.get(&plot_code.to_lowercase()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pairs as they appear in the reference table's casing.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for CodeConverter {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut converter = CodeConverter::new();
        for (k, v) in iter {
            converter.insert(k, v);
        }
        converter
    }
}

/// Build the converter from the reference table described by `codeinfo`.
/// One entry per row; the last row wins when a plot code repeats.
pub fn build_code_converter(codeinfo: &CodeInfo) -> Result<CodeConverter> {
    let source = codeinfo.source()?;
    table::require_fields(
        &source,
        &[
            codeinfo.plot_code_field.as_str(),
            codeinfo.data_code_field.as_str(),
        ],
    )
    .context("Invalid code reference table")?;

    let rows = table::read_rows(&source)
        .with_context(|| format!("Failed to load code table {}", source.path.display()))?;

    let converter: CodeConverter = rows
        .into_iter()
        .filter_map(|mut row| {
            let plot = row.remove(&codeinfo.plot_code_field)?;
            let data = row.remove(&codeinfo.data_code_field)?;
            Some((plot, data))
        })
        .collect();

    debug!(entries = converter.len(), "built code converter");
    Ok(converter)
}
