use crate::config::Orientation;
use crate::layout::PlotArea;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RectData {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl RectData {
    /// Edges are inclusive; zero-sized rects never contain anything.
    pub fn contains(&self, p: Point) -> bool {
        self.width > 0.0
            && self.height > 0.0
            && p.x >= self.x
            && p.x <= self.x + self.width
            && p.y >= self.y
            && p.y <= self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// A caption. Captions never take pointer events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextData {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub class: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarLayout {
    /// Index of the source record in the dataset.
    pub record_index: usize,
    pub category: String,
    pub is_target: bool,
    pub value: Option<f64>,
    pub rect: RectData,
    pub fill: String,
    pub caption: TextData,
    pub tooltip: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serif_line: Option<SerifLineLayout>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffSign {
    Plus,
    Minus,
}

impl DiffSign {
    pub fn of(diff: f64) -> Self {
        if diff > 0.0 { Self::Plus } else { Self::Minus }
    }

    pub fn symbol(self) -> char {
        match self {
            Self::Plus => '+',
            Self::Minus => '-',
        }
    }

    pub fn class(self) -> &'static str {
        match self {
            Self::Plus => "plus",
            Self::Minus => "minus",
        }
    }
}

/// Overlay showing how far a bar is from the target bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffLayout {
    pub record_index: usize,
    pub category: String,
    pub diff: f64,
    pub sign: DiffSign,
    pub rect: RectData,
    pub fill: String,
    pub caption: TextData,
    pub tooltip: String,
}

/// Perpendicular marker drawn across a bar at its secondary value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerifLineLayout {
    pub value: f64,
    pub from: Point,
    pub to: Point,
    pub stroke: String,
    pub caption: TextData,
    pub tooltip: String,
}

impl SerifLineLayout {
    const HIT_TOLERANCE: f64 = 3.0;

    pub fn path(&self) -> String {
        format!(
            "M{},{}L{},{}",
            crate::svg::fmt(self.from.x),
            crate::svg::fmt(self.from.y),
            crate::svg::fmt(self.to.x),
            crate::svg::fmt(self.to.y)
        )
    }

    pub fn hit_region(&self) -> RectData {
        let t = Self::HIT_TOLERANCE;
        let x = self.from.x.min(self.to.x) - t;
        let y = self.from.y.min(self.to.y) - t;
        RectData {
            x,
            y,
            width: (self.from.x - self.to.x).abs() + 2.0 * t,
            height: (self.from.y - self.to.y).abs() + 2.0 * t,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisSide {
    Left,
    Bottom,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisTickLayout {
    pub label: String,
    /// Distance along the axis from its origin.
    pub offset: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisLayout {
    pub side: AxisSide,
    pub origin: Point,
    pub ticks: Vec<AxisTickLayout>,
    /// Length of the grid line drawn from every tick across the plot, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_length: Option<f64>,
    /// Length of the axis base line, if drawn.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain_length: Option<f64>,
    #[serde(default)]
    pub label_rotation: f64,
    pub font_size: f64,
}

impl AxisLayout {
    pub fn caption_class(&self) -> &'static str {
        match self.side {
            AxisSide::Left => "y-axis-tick-caption",
            AxisSide::Bottom => "x-axis-tick-caption",
        }
    }

    pub fn line_class(&self) -> &'static str {
        match self.side {
            AxisSide::Left => "y-axis-line",
            AxisSide::Bottom => "x-axis-line",
        }
    }
}

/// Interactive element under the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "index", rename_all = "camelCase")]
pub enum HitTarget {
    /// Serif line of `bars[index]`.
    SerifLine(usize),
    Bar(usize),
    Diff(usize),
}

/// Complete scene of one render.
///
/// Chart-area coordinates (bars, diffs, serif lines) are relative to
/// `(margin_x + plot.left_axis_width, margin_y)` in the container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarChartLayout {
    pub size: Size,
    pub margin_x: f64,
    pub margin_y: f64,
    pub orientation: Orientation,
    pub plot: PlotArea,
    pub value_domain: [f64; 2],
    pub band_step: f64,
    pub bandwidth: f64,
    pub diff_rect_width: f64,
    pub target_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_axis: Option<AxisLayout>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bottom_axis: Option<AxisLayout>,
    pub diffs: Vec<DiffLayout>,
    pub bars: Vec<BarLayout>,
}

impl BarChartLayout {
    /// Converts a container-relative point to chart-area coordinates.
    pub fn to_chart_area(&self, p: Point) -> Point {
        Point::new(
            p.x - self.margin_x - self.plot.left_axis_width,
            p.y - self.margin_y,
        )
    }

    /// Topmost interactive element at a container-relative point: serif lines are drawn over
    /// bars, which are drawn over diff overlays.
    pub fn hit_test(&self, p: Point) -> Option<HitTarget> {
        let local = self.to_chart_area(p);
        if let Some(idx) = self.bars.iter().rposition(|b| {
            b.serif_line
                .as_ref()
                .is_some_and(|s| s.hit_region().contains(local))
        }) {
            return Some(HitTarget::SerifLine(idx));
        }
        if let Some(idx) = self.bars.iter().rposition(|b| b.rect.contains(local)) {
            return Some(HitTarget::Bar(idx));
        }
        self.diffs
            .iter()
            .rposition(|d| d.rect.contains(local))
            .map(HitTarget::Diff)
    }

    pub fn tooltip_text(&self, target: HitTarget) -> Option<&str> {
        match target {
            HitTarget::SerifLine(i) => self
                .bars
                .get(i)
                .and_then(|b| b.serif_line.as_ref())
                .map(|s| s.tooltip.as_str()),
            HitTarget::Bar(i) => self.bars.get(i).map(|b| b.tooltip.as_str()),
            HitTarget::Diff(i) => self.diffs.get(i).map(|d| d.tooltip.as_str()),
        }
    }

    pub fn serif_lines(&self) -> impl Iterator<Item = &SerifLineLayout> {
        self.bars.iter().filter_map(|b| b.serif_line.as_ref())
    }
}
