use crate::gdp::GdpMap;
use crate::palette::ResolvedPalette;
use crate::OutputFormat;
use anyhow::{Context, Result};
use image::ImageEncoder;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

const LEGEND_HEIGHT: u32 = 70;
const TILE_GAP: i32 = 2;
const MAX_SIDE: u32 = 10_000;

/// Legend captions for the three map layers
#[derive(Debug, Clone)]
pub struct LegendLabels {
    pub values: String,
    pub missing_from_source: String,
    pub missing_data: String,
}

impl LegendLabels {
    pub fn for_year(year: &str) -> Self {
        Self {
            values: format!("GDP for {}", year),
            missing_from_source: "Missing from World Bank data".to_string(),
            missing_data: "No GDP data".to_string(),
        }
    }
}

/// Tile choropleth: one cell per plot country, in plot-code order.
pub struct MapCanvas {
    width: u32,
    height: u32,
    title: String,
    palette: ResolvedPalette,
    legend: LegendLabels,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum TileClass {
    Value(f64),
    MissingFromSource,
    MissingData,
}

impl MapCanvas {
    pub fn new(
        width: u32,
        height: u32,
        title: impl Into<String>,
        palette: ResolvedPalette,
        legend: LegendLabels,
    ) -> Result<Self> {
        if width < 200 || height < LEGEND_HEIGHT + 100 {
            anyhow::bail!(
                "Canvas {}x{} is too small (minimum 200x{})",
                width,
                height,
                LEGEND_HEIGHT + 100
            );
        }
        if width > MAX_SIDE || height > MAX_SIDE {
            anyhow::bail!(
                "Canvas {}x{} is too large (maximum {}x{})",
                width,
                height,
                MAX_SIDE,
                MAX_SIDE
            );
        }

        Ok(MapCanvas {
            width,
            height,
            title: title.into(),
            palette,
            legend,
        })
    }

    pub fn render(&self, map: &GdpMap, format: &OutputFormat) -> Result<Vec<u8>> {
        match format {
            OutputFormat::Png => self.render_png(map),
            OutputFormat::Svg => self.render_svg(map).map(String::into_bytes),
        }
    }

    /// Draw into an RGB buffer and encode it as PNG
    pub fn render_png(&self, map: &GdpMap) -> Result<Vec<u8>> {
        let len = (self.width as usize)
            .checked_mul(self.height as usize)
            .and_then(|n| n.checked_mul(3))
            .context("Canvas buffer size overflows")?;
        let mut buffer = vec![0u8; len];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, (self.width, self.height))
                .into_drawing_area();
            self.draw(&root, map)?;
            root.present().context("Failed to present drawing")?;
        }

        let mut png_bytes = Vec::new();
        {
            let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
            encoder
                .write_image(&buffer, self.width, self.height, image::ColorType::Rgb8)
                .context("Failed to encode PNG")?;
        }

        Ok(png_bytes)
    }

    pub fn render_svg(&self, map: &GdpMap) -> Result<String> {
        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, (self.width, self.height))
                .into_drawing_area();
            self.draw(&root, map)?;
            root.present().context("Failed to present drawing")?;
        }
        Ok(svg)
    }

    fn draw<DB: DrawingBackend>(&self, root: &DrawingArea<DB, Shift>, map: &GdpMap) -> Result<()>
    where
        DB::ErrorType: 'static,
    {
        root.fill(&self.palette.background)
            .context("Failed to fill background")?;

        let body = root
            .titled(&self.title, "sans-serif".into_font().resize(20.0).color(&BLACK))
            .context("Failed to draw title")?;

        let (_, body_height) = body.dim_in_pixel();
        let (tiles, legend) = body.split_vertically(body_height.saturating_sub(LEGEND_HEIGHT) as i32);

        self.draw_tiles(&tiles, map)?;
        self.draw_legend(&legend, map)?;

        Ok(())
    }

    fn draw_tiles<DB: DrawingBackend>(&self, area: &DrawingArea<DB, Shift>, map: &GdpMap) -> Result<()>
    where
        DB::ErrorType: 'static,
    {
        let tiles = classify(map);
        let (width, height) = area.dim_in_pixel();

        if tiles.is_empty() {
            let style = "sans-serif".into_font().resize(16.0).color(&BLACK);
            area.draw_text("No countries to plot", &style, (10, 10))
                .context("Failed to draw placeholder")?;
            return Ok(());
        }

        let (cols, rows) = grid_dimensions(tiles.len(), width, height);
        let tile_w = (width / cols) as i32;
        let tile_h = (height / rows) as i32;
        let range = map.value_range().unwrap_or((0.0, 1.0));
        let label_size = (tile_h.min(tile_w) as f64 * 0.4).clamp(6.0, 14.0);
        let show_labels = tile_w >= 16 && tile_h >= 10;
        let label_style = "sans-serif"
            .into_font()
            .resize(label_size)
            .color(&BLACK)
            .pos(Pos::new(HPos::Center, VPos::Center));

        for (idx, (code, class)) in tiles.iter().enumerate() {
            let col = (idx as u32 % cols) as i32;
            let row = (idx as u32 / cols) as i32;
            let x0 = col * tile_w;
            let y0 = row * tile_h;

            let color = match class {
                TileClass::Value(v) => self.palette.shade(*v, range),
                TileClass::MissingFromSource => self.palette.missing_from_source,
                TileClass::MissingData => self.palette.missing_data,
            };

            area.draw(&Rectangle::new(
                [(x0 + TILE_GAP, y0 + TILE_GAP), (x0 + tile_w - TILE_GAP, y0 + tile_h - TILE_GAP)],
                color.filled(),
            ))
            .with_context(|| format!("Failed to draw tile for '{}'", code))?;

            if show_labels {
                area.draw_text(code, &label_style, (x0 + tile_w / 2, y0 + tile_h / 2))
                    .with_context(|| format!("Failed to label tile '{}'", code))?;
            }
        }

        Ok(())
    }

    fn draw_legend<DB: DrawingBackend>(&self, area: &DrawingArea<DB, Shift>, map: &GdpMap) -> Result<()>
    where
        DB::ErrorType: 'static,
    {
        let (width, _) = area.dim_in_pixel();
        let column = (width / 3) as i32;
        let text = "sans-serif".into_font().resize(13.0).color(&BLACK);
        let swatch = 16;
        let top = 12;

        // Value layer: a short gradient strip
        let steps = 5;
        for step in 0..steps {
            let t = step as f64 / (steps - 1) as f64;
            let color = crate::palette::lerp(self.palette.low, self.palette.high, t);
            let x = 10 + step * (swatch / 2);
            area.draw(&Rectangle::new([(x, top), (x + swatch / 2, top + swatch)], color.filled()))
                .context("Failed to draw legend gradient")?;
        }
        let gradient_end = 10 + steps * (swatch / 2) + 6;
        area.draw_text(&self.legend.values, &text, (gradient_end, top))
            .context("Failed to draw legend label")?;
        if let Some((lo, hi)) = map.value_range() {
            let scale = format!("10^{:.1} .. 10^{:.1}", lo, hi);
            area.draw_text(&scale, &text, (gradient_end, top + 20))
                .context("Failed to draw legend scale")?;
        }

        let entries = [
            (self.palette.missing_from_source, &self.legend.missing_from_source),
            (self.palette.missing_data, &self.legend.missing_data),
        ];
        for (slot, (color, label)) in entries.iter().enumerate() {
            let x = column * (slot as i32 + 1) + 10;
            area.draw(&Rectangle::new([(x, top), (x + swatch, top + swatch)], color.filled()))
                .context("Failed to draw legend swatch")?;
            area.draw_text(label, &text, (x + swatch + 6, top))
                .context("Failed to draw legend label")?;
        }

        Ok(())
    }
}

/// Every plot code with its class, sorted by code
fn classify(map: &GdpMap) -> Vec<(&str, TileClass)> {
    let mut tiles: Vec<(&str, TileClass)> = map
        .values
        .iter()
        .map(|(code, v)| (code.as_str(), TileClass::Value(*v)))
        .chain(
            map.missing_from_source
                .iter()
                .map(|code| (code.as_str(), TileClass::MissingFromSource)),
        )
        .chain(
            map.missing_data
                .iter()
                .map(|code| (code.as_str(), TileClass::MissingData)),
        )
        .collect();
    tiles.sort_by(|a, b| a.0.cmp(b.0));
    tiles
}

/// Columns and rows for `n` tiles, keeping tiles roughly square
fn grid_dimensions(n: usize, width: u32, height: u32) -> (u32, u32) {
    let n = n.max(1) as f64;
    let aspect = width.max(1) as f64 / height.max(1) as f64;
    let cols = (n * aspect).sqrt().ceil().max(1.0) as u32;
    let rows = (n / cols as f64).ceil().max(1.0) as u32;
    (cols, rows)
}
