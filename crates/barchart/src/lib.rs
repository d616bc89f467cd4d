#![forbid(unsafe_code)]

//! `barchart` renders configurable dashboard bar charts headless.
//!
//! The engine lives in `barchart-render`; this crate re-exports it, adds the host panel glue
//! ([`panel`]) and optional raster output.
//!
//! # Features
//!
//! - `raster`: enable PNG/JPG/PDF output via pure-Rust SVG rasterization/conversion

pub use barchart_render::config::{ChartConfig, ColorRange, Orientation};
pub use barchart_render::format::round_value;
pub use barchart_render::model::{BarChartLayout, HitTarget, Point, Size};
pub use barchart_render::record::{Record, records_from_str, records_from_value};
pub use barchart_render::surface::{MemorySurface, Surface};
pub use barchart_render::svg::{SvgRenderOptions, render_bar_chart_svg};
pub use barchart_render::text::{DeterministicTextMeasurer, TextMeasurer};
pub use barchart_render::tooltip::Tooltip;
pub use barchart_render::{
    BarChart, Error, LayoutOptions, PointerEvent, RenderState, Result, layout_bar_chart,
};

pub mod panel;

#[cfg(feature = "raster")]
pub mod raster;

/// Converts an arbitrary string into a conservative SVG `id` token, so several charts can be
/// inlined into one page without their element ids colliding.
///
/// Unsupported characters become `-`, runs of `-` collapse, and ids not starting with an ASCII
/// letter get a `c-` prefix.
pub fn sanitize_svg_id(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return "c-untitled".to_string();
    }

    let mut out = String::with_capacity(raw.len() + 4);
    for ch in raw.chars() {
        let ok = ch.is_ascii_alphanumeric() || ch == '-' || ch == '_';
        out.push(if ok { ch } else { '-' });
    }

    let starts_ok = out.chars().next().is_some_and(|c| c.is_ascii_alphabetic());
    if !starts_ok {
        out.insert_str(0, "c-");
    }

    while out.contains("--") {
        out = out.replace("--", "-");
    }
    let out = out.trim_matches('-');
    if out.is_empty() || out == "c" {
        return "c-untitled".to_string();
    }
    out.to_string()
}

/// Bundles a chart configuration with layout and SVG options for one-shot rendering.
#[derive(Clone, Default)]
pub struct HeadlessRenderer {
    pub config: ChartConfig,
    pub layout: LayoutOptions,
    pub svg: SvgRenderOptions,
}

impl HeadlessRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges a partial JSON config into the renderer's chart config.
    pub fn with_config(mut self, partial: &serde_json::Value) -> Result<Self> {
        self.config.merge(partial)?;
        Ok(self)
    }

    pub fn with_diagram_id(mut self, id: &str) -> Self {
        self.svg.diagram_id = Some(sanitize_svg_id(id));
        self
    }

    pub fn layout_sync(&self, records: &[Record], size: Size) -> Result<BarChartLayout> {
        layout_bar_chart(records, &self.config, size, &self.layout)
    }

    pub fn render_svg_sync(&self, records: &[Record], size: Size) -> Result<String> {
        let layout = self.layout_sync(records, size)?;
        Ok(render_bar_chart_svg(&layout, &self.svg))
    }
}
