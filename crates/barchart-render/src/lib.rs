#![forbid(unsafe_code)]

//! Headless bar chart engine: configuration, scales, layout and SVG emission.
//!
//! [`layout_bar_chart`] turns records plus a [`ChartConfig`] into a serializable
//! [`BarChartLayout`] scene; [`svg::render_bar_chart_svg`] draws it. [`BarChart`] ties both to a
//! [`Surface`] and adds the interactive bits (hit-testing, tooltip, click callback).

pub mod chart;
pub mod config;
pub mod format;
pub mod geometry;
pub mod layout;
pub mod model;
pub mod record;
pub mod scale;
pub mod surface;
pub mod svg;
pub mod text;
pub mod tooltip;

use crate::text::{DeterministicTextMeasurer, TextMeasurer};
use std::sync::Arc;

pub use chart::{BarChart, PointerEvent, RenderState};
pub use config::{ChartConfig, ColorRange, Orientation};
pub use geometry::layout_bar_chart;
pub use model::{BarChartLayout, HitTarget, Point, Size};
pub use record::Record;
pub use surface::{MemorySurface, Surface};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid chart config: {message}")]
    InvalidConfig { message: String },
    #[error("invalid dataset: {message}")]
    InvalidDataset { message: String },
    #[error("invalid container size: {width}x{height}")]
    InvalidContainer { width: f64, height: f64 },
    #[error("dataset JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Clone)]
pub struct LayoutOptions {
    pub text_measurer: Arc<dyn TextMeasurer + Send + Sync>,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            text_measurer: Arc::new(DeterministicTextMeasurer::default()),
        }
    }
}

impl std::fmt::Debug for LayoutOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayoutOptions").finish_non_exhaustive()
    }
}
