// Runtime executor: build a GDP map for one year and write it to disk

use crate::config::{CodeInfo, GdpInfo};
use crate::countries::PlotCountries;
use crate::gdp::{build_map_by_code, build_map_by_name, GdpMap, Unify};
use crate::graph::{LegendLabels, MapCanvas};
use crate::RenderOptions;
use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Build the GDP map for `year` with the requested unification.
pub fn build_map(
    unify: Unify,
    gdpinfo: &GdpInfo,
    codeinfo: Option<&CodeInfo>,
    plot_countries: &PlotCountries,
    year: &str,
) -> Result<GdpMap> {
    if !gdpinfo.contains_year(year) {
        warn!(
            year,
            min_year = gdpinfo.min_year,
            max_year = gdpinfo.max_year,
            "year outside configured range"
        );
    }

    match unify {
        Unify::Name => build_map_by_name(gdpinfo, plot_countries, year),
        Unify::Code => {
            let codeinfo = codeinfo
                .ok_or_else(|| anyhow!("Unifying by code requires a codeinfo section"))?;
            build_map_by_code(gdpinfo, codeinfo, plot_countries, year)
        }
    }
}

pub fn map_title(year: &str, unify: Unify) -> String {
    format!(
        "GDP by country for {} (log scale), unified by common country {}",
        year,
        unify.to_string().to_uppercase()
    )
}

/// Render an already built map to image bytes
pub fn render_map(map: &GdpMap, year: &str, unify: Unify, options: &RenderOptions) -> Result<Vec<u8>> {
    let palette = options.colors.resolve().context("Invalid map colors")?;
    let canvas = MapCanvas::new(
        options.width,
        options.height,
        map_title(year, unify),
        palette,
        LegendLabels::for_year(year),
    )?;
    canvas.render(map, &options.format)
}

/// Fail unless every requested unification has the inputs it needs.
pub fn check_inputs(unifications: &[Unify], codeinfo: Option<&CodeInfo>) -> Result<()> {
    if unifications.contains(&Unify::Code) && codeinfo.is_none() {
        anyhow::bail!("Unifying by code requires a codeinfo section (or use --by name)");
    }
    Ok(())
}

/// Build and render the world map for `year` in memory.
pub fn prepare_world_map(
    unify: Unify,
    gdpinfo: &GdpInfo,
    codeinfo: Option<&CodeInfo>,
    plot_countries: &PlotCountries,
    year: &str,
    options: &RenderOptions,
) -> Result<(GdpMap, Vec<u8>)> {
    let map = build_map(unify, gdpinfo, codeinfo, plot_countries, year)
        .with_context(|| format!("Failed to build GDP map by {} for {}", unify, year))?;

    let bytes = render_map(&map, year, unify, options)
        .with_context(|| format!("Failed to render map for {}", year))?;

    Ok((map, bytes))
}

/// Build, render and write the world map for `year` to `map_file`.
///
/// Nothing is written unless every step succeeds.
pub fn render_world_map(
    unify: Unify,
    gdpinfo: &GdpInfo,
    codeinfo: Option<&CodeInfo>,
    plot_countries: &PlotCountries,
    year: &str,
    options: &RenderOptions,
    map_file: &Path,
) -> Result<GdpMap> {
    let (map, bytes) = prepare_world_map(unify, gdpinfo, codeinfo, plot_countries, year, options)?;

    fs::write(map_file, bytes)
        .with_context(|| format!("Failed to write {}", map_file.display()))?;

    info!(path = %map_file.display(), unify = %unify, year, "wrote map");
    Ok(map)
}

/// `<dir>/gdp_world_<unify>_<year>.<ext>`
pub fn output_path(dir: &Path, unify: Unify, year: &str, options: &RenderOptions) -> PathBuf {
    dir.join(format!(
        "gdp_world_{}_{}.{}",
        unify,
        year,
        options.format.extension()
    ))
}
