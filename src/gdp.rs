// GDP table loading and per-year log-scale GDP maps

use crate::config::{CodeInfo, GdpInfo};
use crate::converter::build_code_converter;
use crate::countries::PlotCountries;
use crate::reconcile::{reconcile_by_code, reconcile_by_name, Reconciliation};
use crate::table::{self, Row};
use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::{debug, info};

/// Which GDP column identifies a country.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Unify {
    Name,
    Code,
}

impl fmt::Display for Unify {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unify::Name => write!(f, "name"),
            Unify::Code => write!(f, "code"),
        }
    }
}

/// GDP rows keyed by country name or country code.
#[derive(Debug, Clone, Default)]
pub struct GdpTable {
    rows: BTreeMap<String, Row>,
}

impl GdpTable {
    pub fn new(rows: BTreeMap<String, Row>) -> Self {
        Self { rows }
    }

    /// Load the table described by `gdpinfo`, keyed by the name or code field.
    pub fn load(gdpinfo: &GdpInfo, key: Unify) -> Result<Self> {
        let source = gdpinfo.source()?;
        let key_field = match key {
            Unify::Name => &gdpinfo.country_name_field,
            Unify::Code => &gdpinfo.country_code_field,
        };
        let rows = table::read_keyed(&source, key_field)
            .with_context(|| format!("Failed to load GDP table {}", source.path.display()))?;
        debug!(rows = rows.len(), key = %key, "loaded GDP table");
        Ok(Self { rows })
    }

    /// Identifiers in sorted order.
    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.rows.keys().map(String::as_str)
    }

    pub fn row(&self, id: &str) -> Option<&Row> {
        self.rows.get(id)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Log-scale GDP per plot country for one year. Every plot country lands in
/// exactly one of the three collections.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GdpMap {
    /// Plot code -> log10(GDP)
    pub values: BTreeMap<String, f64>,
    /// Plot codes the GDP source does not know
    pub missing_from_source: BTreeSet<String>,
    /// Plot codes known to the GDP source but without a usable value
    pub missing_data: BTreeSet<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GdpMapSummary {
    pub with_value: usize,
    pub missing_from_source: usize,
    pub missing_data: usize,
}

impl GdpMap {
    pub fn summary(&self) -> GdpMapSummary {
        GdpMapSummary {
            with_value: self.values.len(),
            missing_from_source: self.missing_from_source.len(),
            missing_data: self.missing_data.len(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len() + self.missing_from_source.len() + self.missing_data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Smallest and largest log GDP, if any value is present
    pub fn value_range(&self) -> Option<(f64, f64)> {
        let mut values = self.values.values().copied();
        let first = values.next()?;
        Some(values.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
    }
}

/// Parse a GDP cell into a strictly positive, finite figure.
pub fn parse_gdp(cell: &str) -> Option<f64> {
    let value = cell.trim().parse::<f64>().ok()?;
    if value.is_finite() && value > 0.0 {
        Some(value)
    } else {
        None
    }
}

/// Classify every plot country for `year` using an existing reconciliation.
///
/// `year` is matched exactly against the table's field names.
pub fn build_gdp_map(
    plot_countries: &PlotCountries,
    reconciliation: &Reconciliation,
    table: &GdpTable,
    year: &str,
) -> GdpMap {
    let mut map = GdpMap::default();

    for code in plot_countries.keys() {
        let Some(gdp_id) = reconciliation.gdp_id(code) else {
            map.missing_from_source.insert(code.clone());
            continue;
        };

        let value = table
            .row(gdp_id)
            .and_then(|row| row.get(year))
            .and_then(|cell| parse_gdp(cell));

        match value {
            Some(gdp) => {
                map.values.insert(code.clone(), gdp.log10());
            }
            None => {
                map.missing_data.insert(code.clone());
            }
        }
    }

    map
}

/// Build the GDP map for `year`, unifying countries by display name.
pub fn build_map_by_name(
    gdpinfo: &GdpInfo,
    plot_countries: &PlotCountries,
    year: &str,
) -> Result<GdpMap> {
    let table = GdpTable::load(gdpinfo, Unify::Name)?;
    let reconciliation = reconcile_by_name(plot_countries, table.identifiers());
    let map = build_gdp_map(plot_countries, &reconciliation, &table, year);
    log_summary(Unify::Name, year, &map);
    Ok(map)
}

/// Build the GDP map for `year`, unifying countries through the code table.
pub fn build_map_by_code(
    gdpinfo: &GdpInfo,
    codeinfo: &CodeInfo,
    plot_countries: &PlotCountries,
    year: &str,
) -> Result<GdpMap> {
    let converter = build_code_converter(codeinfo)?;
    let table = GdpTable::load(gdpinfo, Unify::Code)?;
    let reconciliation = reconcile_by_code(&converter, plot_countries, table.identifiers());
    let map = build_gdp_map(plot_countries, &reconciliation, &table, year);
    log_summary(Unify::Code, year, &map);
    Ok(map)
}

fn log_summary(unify: Unify, year: &str, map: &GdpMap) {
    let summary = map.summary();
    info!(
        unify = %unify,
        year,
        with_value = summary.with_value,
        missing_from_source = summary.missing_from_source,
        missing_data = summary.missing_data,
        "built GDP map"
    );
}
