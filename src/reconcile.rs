// Aligning plot country identifiers with GDP-source identifiers

use crate::converter::CodeConverter;
use crate::countries::PlotCountries;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

/// Outcome of reconciling plot countries against a GDP source. Every plot
/// code is either matched or unmatched, never both.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Reconciliation {
    /// Plot code -> GDP-source identifier, as spelled in the GDP source
    pub matched: BTreeMap<String, String>,
    pub unmatched: BTreeSet<String>,
}

impl Reconciliation {
    pub fn gdp_id(&self, plot_code: &str) -> Option<&str> {
        self.matched.get(plot_code).map(String::as_str)
    }
}

/// Match plot countries to GDP rows by exact display name.
///
/// No normalization is applied: "Korea, Rep." and "South Korea" stay
/// unmatched so that naming disagreements are visible in the output.
pub fn reconcile_by_name<'a, I>(plot_countries: &PlotCountries, gdp_countries: I) -> Reconciliation
where
    I: IntoIterator<Item = &'a str>,
{
    let names: BTreeSet<&str> = gdp_countries.into_iter().collect();
    let mut result = Reconciliation::default();

    for (code, name) in plot_countries {
        if names.contains(name.as_str()) {
            result.matched.insert(code.clone(), name.clone());
        } else {
            result.unmatched.insert(code.clone());
        }
    }

    debug!(
        matched = result.matched.len(),
        unmatched = result.unmatched.len(),
        "reconciled by name"
    );
    result
}

/// Match plot countries to GDP rows through a code converter.
///
/// Both the converter lookup and the GDP code lookup ignore case. The matched
/// value is the GDP code exactly as the GDP source spells it. If two GDP
/// codes differ only in case, the first one yielded by `gdp_countries` wins.
pub fn reconcile_by_code<'a, I>(
    converter: &CodeConverter,
    plot_countries: &PlotCountries,
    gdp_countries: I,
) -> Reconciliation
where
    I: IntoIterator<Item = &'a str>,
{
    let mut by_folded: HashMap<String, &str> = HashMap::new();
    for code in gdp_countries {
        by_folded.entry(code.to_lowercase()).or_insert(code);
    }

    let mut result = Reconciliation::default();

    if by_folded.is_empty() {
        debug!(plot_countries = plot_countries.len(), "no GDP codes to reconcile against");
        result.unmatched = plot_countries.keys().cloned().collect();
        return result;
    }

    for code in plot_countries.keys() {
        let gdp_code = converter
            .get(code)
            .and_then(|data_code| by_folded.get(&data_code.to_lowercase()));

        match gdp_code {
            Some(gdp_code) => {
                result.matched.insert(code.clone(), gdp_code.to_string());
            }
            None => {
                result.unmatched.insert(code.clone());
            }
        }
    }

    debug!(
        matched = result.matched.len(),
        unmatched = result.unmatched.len(),
        "reconciled by code"
    );
    result
}
