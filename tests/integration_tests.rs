use gdpmap::config::MapConfig;
use gdpmap::countries::load_plot_countries;
use gdpmap::{
    build_code_converter, build_gdp_map, build_map_by_code, build_map_by_name, reconcile_by_code,
    GdpMap, GdpTable, LoadError, PlotCountries, Unify,
};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

fn load_fixture() -> (MapConfig, PlotCountries) {
    let config = MapConfig::from_file(Path::new("test/config.json")).expect("Failed to read test config");
    let countries = load_plot_countries(config.countries.as_ref().expect("countries path")).expect("Failed to read countries");
    (config, countries)
}

fn set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn assert_partition(map: &GdpMap, plot: &PlotCountries) {
    assert_eq!(
        map.values.len() + map.missing_from_source.len() + map.missing_data.len(),
        plot.len()
    );
    for code in plot.keys() {
        let hits = [
            map.values.contains_key(code),
            map.missing_from_source.contains(code),
            map.missing_data.contains(code),
        ]
        .iter()
        .filter(|hit| **hit)
        .count();
        assert_eq!(hits, 1, "{} is in {} collections", code, hits);
    }
}

/// Run the gdpmap binary with the given arguments
fn run_gdpmap(args: &[&str]) -> Result<String, String> {
    let output = Command::new(env!("CARGO_BIN_EXE_gdpmap"))
        .args(args)
        .output()
        .map_err(|e| format!("Failed to spawn process: {}", e))?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    } else {
        Err(String::from_utf8_lossy(&output.stderr).to_string())
    }
}

#[test]
fn test_end_to_end_single_country() {
    let dir = TempDir::new().unwrap();
    let gdp = dir.path().join("gdp.csv");
    let codes = dir.path().join("codes.csv");
    fs::write(&gdp, "Country Name,Country Code,2000\nUnited States,USA,10000\n").unwrap();
    fs::write(&codes, "plot,data\nus,USA\n").unwrap();

    let config = format!(
        r#"{{
            "gdpinfo": {{
                "source_path": "{}",
                "min_year": 2000, "max_year": 2000,
                "country_name_field": "Country Name",
                "country_code_field": "Country Code"
            }},
            "codeinfo": {{
                "source_path": "{}",
                "plot_code_field": "plot",
                "data_code_field": "data"
            }}
        }}"#,
        gdp.display(),
        codes.display()
    );
    let config_path = dir.path().join("config.json");
    fs::write(&config_path, config).unwrap();
    let config = MapConfig::from_file(&config_path).unwrap();

    let plot: PlotCountries = [("us", "United States"), ("ca", "Canada")]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    let codeinfo = config.codeinfo.as_ref().unwrap();
    let map = build_map_by_code(&config.gdpinfo, codeinfo, &plot, "2000").unwrap();
    assert_eq!(map.values.len(), 1);
    assert_eq!(map.values["us"], 4.0);
    assert_eq!(map.missing_from_source, set(&["ca"]));
    assert!(map.missing_data.is_empty());
}

#[test]
fn test_by_name_classification() {
    let (config, plot) = load_fixture();
    let map = build_map_by_name(&config.gdpinfo, &plot, "2000").unwrap();

    assert_eq!(
        map.values.keys().cloned().collect::<BTreeSet<_>>(),
        set(&["us", "ca", "fr", "de"])
    );
    // "South Korea" vs "Korea, Rep." is not papered over
    assert_eq!(map.missing_from_source, set(&["kr", "mx", "aq"]));
    assert_eq!(map.missing_data, set(&["so"]));
    assert_partition(&map, &plot);
}

#[test]
fn test_by_code_classification() {
    let (config, plot) = load_fixture();
    let codeinfo = config.codeinfo.as_ref().unwrap();
    let map = build_map_by_code(&config.gdpinfo, codeinfo, &plot, "2000").unwrap();

    assert_eq!(
        map.values.keys().cloned().collect::<BTreeSet<_>>(),
        set(&["us", "ca", "fr", "kr", "de"])
    );
    assert_eq!(map.missing_from_source, set(&["mx", "aq"]));
    assert_eq!(map.missing_data, set(&["so"]));
    assert_partition(&map, &plot);
}

#[test]
fn test_partition_holds_for_every_year() {
    let (config, plot) = load_fixture();
    let codeinfo = config.codeinfo.as_ref().unwrap();

    for year in ["1960", "1980", "2000", "2010", "1970", "Indicator Name"] {
        let by_name = build_map_by_name(&config.gdpinfo, &plot, year).unwrap();
        let by_code = build_map_by_code(&config.gdpinfo, codeinfo, &plot, year).unwrap();
        assert_partition(&by_name, &plot);
        assert_partition(&by_code, &plot);
    }
}

#[test]
fn test_zero_and_empty_cells_are_missing_data() {
    let (config, plot) = load_fixture();
    let codeinfo = config.codeinfo.as_ref().unwrap();

    let map_1960 = build_map_by_code(&config.gdpinfo, codeinfo, &plot, "1960").unwrap();
    assert_eq!(map_1960.missing_data, set(&["de", "so"]));

    let map_1980 = build_map_by_code(&config.gdpinfo, codeinfo, &plot, "1980").unwrap();
    assert_eq!(map_1980.missing_data, set(&["de", "so"]));

    let map_2010 = build_map_by_code(&config.gdpinfo, codeinfo, &plot, "2010").unwrap();
    assert_eq!(map_2010.missing_data, set(&["so"]));
}

#[test]
fn test_reconciliation_shared_across_years() {
    let (config, plot) = load_fixture();
    let codeinfo = config.codeinfo.as_ref().unwrap();
    let converter = build_code_converter(codeinfo).unwrap();
    let table = GdpTable::load(&config.gdpinfo, Unify::Code).unwrap();
    let reconciliation = reconcile_by_code(&converter, &plot, table.identifiers());

    let a = build_gdp_map(&plot, &reconciliation, &table, "1960");
    let b = build_gdp_map(&plot, &reconciliation, &table, "2000");
    let a_again = build_gdp_map(&plot, &reconciliation, &table, "1960");

    assert!(a.missing_data.contains("de"));
    assert!(b.values.contains_key("de"));
    assert_eq!(a, a_again);
}

#[test]
fn test_lowercase_gdp_codes_keep_their_casing() {
    let dir = TempDir::new().unwrap();
    let gdp = dir.path().join("gdp.csv");
    fs::write(&gdp, "Country Name,Country Code,2000\nUnited States,usa,100\n").unwrap();

    let (mut config, plot) = load_fixture();
    config.gdpinfo.source_path = gdp;
    let codeinfo = config.codeinfo.as_ref().unwrap();

    let converter = build_code_converter(codeinfo).unwrap();
    let table = GdpTable::load(&config.gdpinfo, Unify::Code).unwrap();
    let reconciliation = reconcile_by_code(&converter, &plot, table.identifiers());

    assert_eq!(reconciliation.gdp_id("us"), Some("usa"));
    let map = build_gdp_map(&plot, &reconciliation, &table, "2000");
    assert_eq!(map.values["us"], 2.0);
}

#[test]
fn test_missing_gdp_source() {
    let (mut config, plot) = load_fixture();
    config.gdpinfo.source_path = "test/does_not_exist.csv".into();

    let err = build_map_by_name(&config.gdpinfo, &plot, "2000").unwrap_err();
    let load = err.downcast_ref::<LoadError>().expect("LoadError in chain");
    assert!(matches!(load, LoadError::SourceNotFound { .. }));
}

#[test]
fn test_malformed_gdp_source() {
    let dir = TempDir::new().unwrap();
    let gdp = dir.path().join("gdp.csv");
    fs::write(&gdp, "Country Name,Country Code,2000\nUnited States,USA\n").unwrap();

    let (mut config, plot) = load_fixture();
    config.gdpinfo.source_path = gdp;

    let err = build_map_by_name(&config.gdpinfo, &plot, "2000").unwrap_err();
    let load = err.downcast_ref::<LoadError>().expect("LoadError in chain");
    assert!(matches!(load, LoadError::MalformedRow { line: 2, .. }));
}

#[test]
fn test_cli_renders_both_variants() {
    let dir = TempDir::new().unwrap();
    let out_dir = dir.path().to_str().unwrap();

    let result = run_gdpmap(&[
        "--config", "test/config.json",
        "--years", "1960,2000",
        "--out-dir", out_dir,
        "--report",
    ]);
    assert!(result.is_ok(), "Failed: {:?}", result.err());

    for name in [
        "gdp_world_name_1960.svg",
        "gdp_world_name_2000.svg",
        "gdp_world_code_1960.svg",
        "gdp_world_code_2000.svg",
    ] {
        let svg = fs::read_to_string(dir.path().join(name)).unwrap();
        assert!(svg.contains("<svg"), "{} is not an SVG", name);
    }

    let report: serde_json::Value = serde_json::from_str(&result.unwrap()).unwrap();
    let entries = report.as_array().unwrap();
    assert_eq!(entries.len(), 4);
    assert_eq!(entries[0]["unify"], "name");
    assert_eq!(entries[0]["year"], "1960");
    assert_eq!(entries[3]["unify"], "code");
    assert_eq!(entries[3]["summary"]["with_value"], 5);
}

#[test]
fn test_cli_png_output() {
    let dir = TempDir::new().unwrap();
    let out_dir = dir.path().to_str().unwrap();

    let result = run_gdpmap(&[
        "--config", "test/config.json",
        "--years", "2010",
        "--by", "code",
        "--format", "png",
        "--out-dir", out_dir,
    ]);
    assert!(result.is_ok(), "Failed: {:?}", result.err());

    let bytes = fs::read(dir.path().join("gdp_world_code_2010.png")).unwrap();
    assert!(bytes.len() > 8 && bytes[0..8] == [137, 80, 78, 71, 13, 10, 26, 10]);
}

#[test]
fn test_cli_invalid_years() {
    let result = run_gdpmap(&["--config", "test/config.json", "--years", "2010..2000"]);
    assert!(result.is_err());
    assert!(result.unwrap_err().contains("Invalid year selection"));
}

#[test]
fn test_cli_missing_source_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.json");
    fs::write(
        &config_path,
        r#"{
            "gdpinfo": {
                "source_path": "nowhere.csv",
                "min_year": 2000, "max_year": 2000,
                "country_name_field": "Country Name",
                "country_code_field": "Country Code"
            }
        }"#,
    )
    .unwrap();
    let out_dir = dir.path().join("out");

    let result = run_gdpmap(&[
        "--config", config_path.to_str().unwrap(),
        "--countries", "test/countries.json",
        "--by", "name",
        "--out-dir", out_dir.to_str().unwrap(),
    ]);
    let err = result.unwrap_err();
    assert!(err.contains("source not found"), "unexpected error: {}", err);
    assert!(!out_dir.exists());
}

#[test]
fn test_cli_both_variants_without_codeinfo_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let gdp = fs::canonicalize("test/gdp.csv").unwrap();
    let config_path = dir.path().join("config.json");
    fs::write(
        &config_path,
        format!(
            r#"{{
                "gdpinfo": {{
                    "source_path": "{}",
                    "min_year": 1960, "max_year": 2010,
                    "country_name_field": "Country Name",
                    "country_code_field": "Country Code"
                }}
            }}"#,
            gdp.display()
        ),
    )
    .unwrap();
    let out_dir = dir.path().join("out");

    // Default --by renders both variants; the name maps alone would succeed
    let result = run_gdpmap(&[
        "--config", config_path.to_str().unwrap(),
        "--countries", "test/countries.json",
        "--years", "2000",
        "--out-dir", out_dir.to_str().unwrap(),
    ]);
    let err = result.unwrap_err();
    assert!(err.contains("codeinfo"), "unexpected error: {}", err);
    assert!(!out_dir.exists());

    let result = run_gdpmap(&[
        "--config", config_path.to_str().unwrap(),
        "--countries", "test/countries.json",
        "--years", "2000",
        "--by", "name",
        "--out-dir", out_dir.to_str().unwrap(),
    ]);
    assert!(result.is_ok(), "Failed: {:?}", result.err());
    assert!(out_dir.join("gdp_world_name_2000.svg").exists());
}

#[test]
fn test_cli_range_outside_configured_years() {
    let result = run_gdpmap(&["--config", "test/config.json", "--years", "0..4000000000"]);
    let err = result.unwrap_err();
    assert!(err.contains("outside the configured years"), "unexpected error: {}", err);
}
