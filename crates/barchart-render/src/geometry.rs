//! Scene construction: bars, diff overlays, serif lines and axes for one render.

use crate::config::{ChartConfig, Orientation};
use crate::format::{js_number_string, round_number, round_value};
use crate::layout::{
    CategoryTicks, DEFAULT_TICK_COUNT, PlotArea, category_ticks, plot_area, value_tick_count,
    value_tick_labels,
};
use crate::model::{
    AxisLayout, AxisSide, AxisTickLayout, BarChartLayout, BarLayout, DiffLayout, DiffSign, Point,
    RectData, SerifLineLayout, Size, TextData,
};
use crate::record::{Record, field_f64, field_text, value_text};
use crate::scale::{BandScale, LinearScale};
use crate::{Error, LayoutOptions, Result};
use rustc_hash::FxHashSet;

/// How far a serif line sticks out past each bar edge.
const SERIF_OVERHANG: f64 = 5.0;
/// Horizontal gap between a bar end (or serif line) and its caption in horizontal mode.
const HORIZONTAL_CAPTION_GAP: f64 = 10.0;
const SERIF_CAPTION_BELOW: f64 = 20.0;
const SERIF_CAPTION_ABOVE: f64 = -10.0;
/// Serif captions flip above the line when they would end up closer than this to the bottom.
const SERIF_CAPTION_CLEARANCE: f64 = 30.0;

/// Record indices in drawing order: the target first, then everything else in dataset order.
pub fn sorted_bars(records: &[Record], config: &ChartConfig) -> (Option<usize>, Vec<usize>) {
    let target = config
        .target()
        .and_then(|t| records.iter().position(|r| field_text(r, &config.x_axis) == t));
    let mut order = Vec::with_capacity(records.len());
    order.extend(target);
    order.extend((0..records.len()).filter(|i| Some(*i) != target));
    (target, order)
}

fn value_domain(records: &[Record], order: &[usize], config: &ChartConfig) -> (f64, f64) {
    let line_enabled = config.line_enabled();
    let max = order
        .iter()
        .flat_map(|&i| {
            let r = &records[i];
            let line = if line_enabled {
                field_f64(r, &config.col_line_value)
            } else {
                None
            };
            [field_f64(r, &config.col_value), line]
        })
        .flatten()
        .filter(|v| v.is_finite())
        .fold(f64::NEG_INFINITY, f64::max);

    let max = if max.is_finite() && max > 0.0 { max } else { 1.0 };
    let niced = LinearScale::new((0.0, max), (0.0, 1.0))
        .nice(DEFAULT_TICK_COUNT)
        .domain();
    // Rounding outward can overflow near f64::MAX.
    if niced.1.is_finite() { niced } else { (0.0, max) }
}

/// Lays out a bar chart for a container of `size`.
///
/// Never fails on data problems: missing or non-numeric values produce zero-sized geometry and
/// blank captions, and an empty dataset produces an empty chart.
pub fn layout_bar_chart(
    records: &[Record],
    config: &ChartConfig,
    size: Size,
    options: &LayoutOptions,
) -> Result<BarChartLayout> {
    if !size.width.is_finite() || !size.height.is_finite() {
        return Err(Error::InvalidContainer {
            width: size.width,
            height: size.height,
        });
    }

    let (target_index, order) = sorted_bars(records, config);
    let categories: Vec<String> = order
        .iter()
        .map(|&i| field_text(&records[i], &config.x_axis))
        .collect();
    let domain = value_domain(records, &order, config);
    let plot = plot_area(
        config,
        size,
        &categories,
        domain,
        options.text_measurer.as_ref(),
    );

    let orientation = config.orientation();
    let (value_range, band_range) = match orientation {
        Orientation::Vertical => ((plot.height, 0.0), (0.0, plot.width)),
        Orientation::Horizontal => ((0.0, plot.width), (plot.height, 0.0)),
    };
    let lin = LinearScale::new(domain, value_range).clamped(true);
    let band = BandScale::new(categories.iter().cloned(), band_range)
        .padding_inner(config.padding_inner)
        .padding_outer(config.padding_outer);

    let builder = SceneBuilder {
        records,
        config,
        plot,
        orientation,
        lin: &lin,
        band: &band,
        diff_rect_width: band.step() * band_padding_inner(config),
    };

    let bars: Vec<BarLayout> = order
        .iter()
        .zip(&categories)
        .map(|(&i, cat)| builder.bar(i, cat, Some(i) == target_index))
        .collect();

    let diffs = match target_index {
        Some(t) if config.show_risk_line => builder.diffs(t, &order, &categories),
        _ => Vec::new(),
    };

    let max_caption = round_number(domain.1, config.round_value_to);
    let (left_axis, bottom_axis) = builder.axes(&categories, &max_caption);

    tracing::debug!(
        bars = bars.len(),
        diffs = diffs.len(),
        target_index = ?target_index,
        ?orientation,
        plot_width = plot.width,
        plot_height = plot.height,
        "laid out bar chart"
    );

    Ok(BarChartLayout {
        size,
        margin_x: config.margin_x,
        margin_y: config.margin_y,
        orientation,
        plot,
        value_domain: [domain.0, domain.1],
        band_step: band.step(),
        bandwidth: band.bandwidth(),
        diff_rect_width: builder.diff_rect_width,
        target_index,
        left_axis,
        bottom_axis,
        diffs,
        bars,
    })
}

fn band_padding_inner(config: &ChartConfig) -> f64 {
    config.padding_inner.clamp(0.0, 1.0)
}

struct SceneBuilder<'a> {
    records: &'a [Record],
    config: &'a ChartConfig,
    plot: PlotArea,
    orientation: Orientation,
    lin: &'a LinearScale,
    band: &'a BandScale,
    diff_rect_width: f64,
}

impl SceneBuilder<'_> {
    fn band_pos(&self, category: &str) -> f64 {
        self.band.position(category).unwrap_or(0.0)
    }

    fn bar(&self, index: usize, category: &str, is_target: bool) -> BarLayout {
        let cfg = self.config;
        let record = &self.records[index];
        let value = field_f64(record, &cfg.col_value);
        let v = value.unwrap_or(0.0);
        let bw = self.band.bandwidth();
        let pos = self.band_pos(category);

        let (rect, caption_at, caption_class) = match self.orientation {
            Orientation::Vertical => {
                let y = self.lin.scale(v);
                let rect = RectData {
                    x: pos,
                    y,
                    width: bw,
                    height: self.plot.height - y,
                };
                let at = Point::new(pos + bw / 2.0, y - cfg.value_caption_offset);
                (rect, at, "bar-value-caption")
            }
            Orientation::Horizontal => {
                let w = self.lin.scale(v);
                let rect = RectData {
                    x: 0.0,
                    y: pos,
                    width: w,
                    height: bw,
                };
                let at = Point::new(
                    w + HORIZONTAL_CAPTION_GAP,
                    pos + bw / 2.0 + cfg.value_caption_offset,
                );
                (rect, at, "bar-value-caption hor")
            }
        };

        let raw = record.get(&cfg.col_value);
        let caption = TextData {
            text: raw
                .map(|v| round_value(v, cfg.round_value_to))
                .unwrap_or_default(),
            x: caption_at.x,
            y: caption_at.y,
            class: caption_class.to_string(),
        };
        let tooltip = format!(
            "{}: {}",
            cfg.col_value,
            raw.map(value_text).unwrap_or_default()
        );

        let serif_line = if cfg.line_enabled() {
            self.serif_line(record, pos)
        } else {
            None
        };

        BarLayout {
            record_index: index,
            category: category.to_string(),
            is_target,
            value,
            rect,
            fill: cfg.bar_fill(category, value).to_string(),
            caption,
            tooltip,
            serif_line,
        }
    }

    fn serif_line(&self, record: &Record, band_pos: f64) -> Option<SerifLineLayout> {
        let cfg = self.config;
        let raw = record.get(&cfg.col_line_value)?;
        let value = field_f64(record, &cfg.col_line_value)?;
        let bw = self.band.bandwidth();
        let at = self.lin.scale(value);

        let (from, to, caption_at, class) = match self.orientation {
            Orientation::Vertical => {
                let offset = if at + SERIF_CAPTION_CLEARANCE > self.plot.height {
                    SERIF_CAPTION_ABOVE
                } else {
                    SERIF_CAPTION_BELOW
                };
                (
                    Point::new(band_pos - SERIF_OVERHANG, at),
                    Point::new(band_pos + bw + SERIF_OVERHANG, at),
                    Point::new(band_pos + bw / 2.0, at + offset),
                    "risk-line-caption",
                )
            }
            Orientation::Horizontal => (
                Point::new(at, band_pos - SERIF_OVERHANG),
                Point::new(at, band_pos + bw + SERIF_OVERHANG),
                Point::new(
                    at + HORIZONTAL_CAPTION_GAP,
                    band_pos + bw / 2.0 + cfg.value_caption_offset,
                ),
                "risk-line-caption hor",
            ),
        };

        Some(SerifLineLayout {
            value,
            from,
            to,
            stroke: cfg.risk_line_color.clone(),
            caption: TextData {
                text: round_value(raw, cfg.round_value_to),
                x: caption_at.x,
                y: caption_at.y,
                class: class.to_string(),
            },
            tooltip: format!("line: {}", value_text(raw)),
        })
    }

    fn diffs(&self, target: usize, order: &[usize], categories: &[String]) -> Vec<DiffLayout> {
        let cfg = self.config;
        let Some(target_value) = field_f64(&self.records[target], &cfg.col_value) else {
            tracing::debug!("target bar has no numeric value; skipping diff overlays");
            return Vec::new();
        };
        let target_at = self.lin.scale(target_value);
        let bw = self.band.bandwidth();
        let drw = self.diff_rect_width;

        let mut out = Vec::new();
        for (&index, category) in order.iter().zip(categories) {
            if index == target {
                continue;
            }
            let Some(value) = field_f64(&self.records[index], &cfg.col_value) else {
                continue;
            };
            let diff = value - target_value;
            if diff == 0.0 {
                continue;
            }

            let pos = self.band_pos(category);
            let bar_at = self.lin.scale(value);
            let span = (bar_at - target_at).abs();
            let rect = match self.orientation {
                Orientation::Vertical => RectData {
                    x: pos - drw,
                    y: bar_at.min(target_at),
                    width: drw,
                    height: span,
                },
                Orientation::Horizontal => RectData {
                    x: bar_at.min(target_at),
                    y: pos + bw,
                    width: span,
                    height: drw,
                },
            };

            let sign = DiffSign::of(diff);
            let magnitude = diff.abs();
            let center = rect.center();
            let fill = match sign {
                DiffSign::Plus => &cfg.diff_positive_color,
                DiffSign::Minus => &cfg.diff_negative_color,
            };
            out.push(DiffLayout {
                record_index: index,
                category: category.clone(),
                diff,
                sign,
                rect,
                fill: fill.clone(),
                caption: TextData {
                    text: format!(
                        "{}{}",
                        sign.symbol(),
                        round_number(magnitude, cfg.round_value_to)
                    ),
                    x: center.x,
                    y: center.y,
                    class: format!("diff-rect-caption {}", sign.class()),
                },
                tooltip: format!("diff: {}{}", sign.symbol(), js_number_string(magnitude)),
            });
        }
        out
    }

    fn category_axis_ticks(
        &self,
        categories: &[String],
        keep: impl Fn(usize) -> bool,
    ) -> Vec<AxisTickLayout> {
        let half = self.band.bandwidth() / 2.0;
        let mut seen = FxHashSet::default();
        categories
            .iter()
            .filter(|c| seen.insert(c.as_str()))
            .enumerate()
            .filter(|(i, _)| keep(*i))
            .map(|(_, c)| AxisTickLayout {
                label: c.clone(),
                offset: self.band_pos(c) + half,
            })
            .collect()
    }

    fn value_axis_ticks(&self, count: usize) -> Vec<AxisTickLayout> {
        value_tick_labels(self.lin.domain(), count)
            .into_iter()
            .map(|(v, label)| AxisTickLayout {
                label,
                offset: self.lin.scale(v),
            })
            .collect()
    }

    fn axes(
        &self,
        categories: &[String],
        max_caption: &str,
    ) -> (Option<AxisLayout>, Option<AxisLayout>) {
        let cfg = self.config;
        let plot = self.plot;
        let font_size = cfg.axis_font_size;

        let left = cfg.show_axis_y.then(|| {
            let (ticks, grid_length) = match self.orientation {
                Orientation::Vertical => {
                    (self.value_axis_ticks(DEFAULT_TICK_COUNT), Some(plot.width))
                }
                Orientation::Horizontal => (self.category_axis_ticks(categories, |_| true), None),
            };
            AxisLayout {
                side: AxisSide::Left,
                origin: Point::new(plot.left_axis_width, 0.0),
                ticks,
                grid_length,
                domain_length: None,
                label_rotation: 0.0,
                font_size,
            }
        });

        let bottom = cfg.show_axis_x.then(|| {
            let origin = Point::new(plot.left_axis_width, plot.height);
            match self.orientation {
                Orientation::Vertical => {
                    let distinct: Vec<String> = self.band.domain().map(str::to_string).collect();
                    let density =
                        category_ticks(&distinct, max_caption, plot.width, cfg.label_char_width);
                    AxisLayout {
                        side: AxisSide::Bottom,
                        origin,
                        ticks: self.category_axis_ticks(categories, |i| density.shows(i)),
                        grid_length: None,
                        domain_length: Some(plot.width),
                        label_rotation: if density.rotate {
                            CategoryTicks::ROTATION
                        } else {
                            0.0
                        },
                        font_size,
                    }
                }
                Orientation::Horizontal => {
                    let count = value_tick_count(max_caption, plot.width, cfg.label_char_width);
                    AxisLayout {
                        side: AxisSide::Bottom,
                        origin,
                        ticks: self.value_axis_ticks(count),
                        grid_length: Some(-plot.height),
                        domain_length: None,
                        label_rotation: 0.0,
                        font_size,
                    }
                }
            }
        });

        (left, bottom)
    }
}
