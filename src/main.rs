use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use gdpmap::config::MapConfig;
use gdpmap::countries::load_plot_countries;
use gdpmap::gdp::{GdpMapSummary, Unify};
use gdpmap::runtime;
use gdpmap::years::parse_year_selection;
use gdpmap::{GdpMap, OutputFormat};
use serde::Serialize;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum By {
    Name,
    Code,
    Both,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Png,
    Svg,
}

#[derive(Parser, Debug)]
#[command(name = "gdpmap")]
#[command(about = "Render world GDP maps, reconciling country names and codes across sources", long_about = None)]
struct Args {
    /// JSON config with gdpinfo, codeinfo and render sections
    #[arg(short, long)]
    config: PathBuf,

    /// JSON object of plot country code to name (overrides the config)
    #[arg(long)]
    countries: Option<PathBuf>,

    /// Years to render, e.g. "1960,1980", "2000..2010" or "all"
    #[arg(short, long, default_value = "all")]
    years: String,

    /// Identify countries by name, by code, or render both
    #[arg(long, value_enum, default_value_t = By::Both)]
    by: By,

    /// Directory for the rendered maps
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,

    /// Output format (overrides the config)
    #[arg(short, long, value_enum)]
    format: Option<Format>,

    /// Print a JSON classification report to stdout
    #[arg(long)]
    report: bool,
}

#[derive(Serialize)]
struct ReportEntry<'a> {
    unify: Unify,
    year: &'a str,
    path: String,
    summary: GdpMapSummary,
    #[serde(flatten)]
    map: &'a GdpMap,
}

fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let mut config = MapConfig::from_file(&args.config)?;
    if let Some(format) = args.format {
        config.render.format = match format {
            Format::Png => OutputFormat::Png,
            Format::Svg => OutputFormat::Svg,
        };
    }

    let countries_path = args
        .countries
        .clone()
        .or_else(|| config.countries.clone())
        .context("No plot countries given (use --countries or set \"countries\" in the config)")?;
    let plot_countries = load_plot_countries(&countries_path)?;

    let years = parse_year_selection(&args.years)?.expand(&config.gdpinfo)?;

    let unifications: &[Unify] = match args.by {
        By::Name => &[Unify::Name],
        By::Code => &[Unify::Code],
        By::Both => &[Unify::Name, Unify::Code],
    };
    runtime::check_inputs(unifications, config.codeinfo.as_ref())?;

    // Render everything before writing anything
    let mut rendered = Vec::new();
    for &unify in unifications {
        for year in &years {
            let path = runtime::output_path(&args.out_dir, unify, year, &config.render);
            let (map, bytes) = runtime::prepare_world_map(
                unify,
                &config.gdpinfo,
                config.codeinfo.as_ref(),
                &plot_countries,
                year,
                &config.render,
            )?;
            rendered.push((unify, year.as_str(), path, map, bytes));
        }
    }

    fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("Failed to create {}", args.out_dir.display()))?;
    for (unify, year, path, _, bytes) in &rendered {
        fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))?;
        info!(path = %path.display(), unify = %unify, year, "wrote map");
    }

    if args.report {
        let entries: Vec<ReportEntry> = rendered
            .iter()
            .map(|(unify, year, path, map, _)| ReportEntry {
                unify: *unify,
                year: *year,
                path: path.display().to_string(),
                summary: map.summary(),
                map,
            })
            .collect();

        let stdout = io::stdout();
        let mut handle = stdout.lock();
        serde_json::to_writer_pretty(&mut handle, &entries).context("Failed to write report")?;
        writeln!(handle).context("Failed to write report")?;
        handle.flush().context("Failed to flush stdout")?;
    }

    Ok(())
}
