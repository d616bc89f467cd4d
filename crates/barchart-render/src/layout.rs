//! Space reservation around the plot and axis label density.

use crate::config::ChartConfig;
use crate::format::tick_label;
use crate::model::Size;
use crate::scale::LinearScale;
use crate::text::{TextMeasurer, TextStyle};
use serde::{Deserialize, Serialize};

/// d3 axis tick length plus tick padding.
pub const AXIS_TICK_EXTENT: f64 = 9.0;
/// Number of ticks requested from the value scale when nothing narrower is needed.
pub const DEFAULT_TICK_COUNT: usize = 10;

/// Drawing area left after margins and axis reservations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PlotArea {
    /// Width available to bars, i.e. excluding the left axis.
    pub width: f64,
    pub height: f64,
    pub left_axis_width: f64,
    pub bottom_reserve: f64,
    pub right_reserve: f64,
}

pub(crate) fn axis_text_style(config: &ChartConfig) -> TextStyle {
    TextStyle {
        font_size: config.axis_font_size,
        ..Default::default()
    }
}

/// Value tick labels of a scale spanning `domain`.
pub fn value_tick_labels(domain: (f64, f64), count: usize) -> Vec<(f64, String)> {
    let scale = LinearScale::new(domain, (0.0, 1.0));
    let step = scale.tick_step(count);
    scale
        .ticks(count)
        .into_iter()
        .map(|v| (v, tick_label(v, step)))
        .collect()
}

/// Computes the plot area for `size`.
///
/// `categories` are the band-scale categories and `value_domain` the (niced) linear domain; the
/// left axis reservation is measured from the labels a left axis would carry.
pub fn plot_area(
    config: &ChartConfig,
    size: Size,
    categories: &[String],
    value_domain: (f64, f64),
    measurer: &dyn TextMeasurer,
) -> PlotArea {
    let mut width = (size.width - config.margin_x * 2.0).max(0.0);
    let mut height = (size.height - config.margin_y * 2.0).max(0.0);

    let mut bottom_reserve = 0.0;
    if config.show_axis_x || config.line_enabled() {
        if config.horizontal_mode {
            bottom_reserve = config.horizontal_axis_reserve;
        } else {
            let longest = categories
                .iter()
                .map(|c| c.chars().count())
                .max()
                .unwrap_or(0);
            bottom_reserve = longest as f64 * config.label_char_width;
            width -= bottom_reserve / 2.0;
        }
        height -= bottom_reserve;
    }

    let mut right_reserve = 0.0;
    if config.horizontal_mode {
        right_reserve = config.horizontal_overflow_reserve;
        width -= right_reserve;
    }

    let width = width.max(0.0);
    let height = height.max(0.0);

    let left_axis_width = if config.show_axis_y {
        let style = axis_text_style(config);
        let widest = if config.horizontal_mode {
            categories
                .iter()
                .map(|c| measurer.measure(c, &style).width)
                .fold(0.0, f64::max)
        } else {
            value_tick_labels(value_domain, DEFAULT_TICK_COUNT)
                .iter()
                .map(|(_, label)| measurer.measure(label, &style).width)
                .fold(0.0, f64::max)
        };
        widest + AXIS_TICK_EXTENT + config.left_axis_gap
    } else {
        0.0
    };

    PlotArea {
        width: (width - left_axis_width).max(0.0),
        height,
        left_axis_width,
        bottom_reserve,
        right_reserve,
    }
}

/// Which category labels the bottom axis shows, and whether they are slanted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryTicks {
    /// Every `every`-th category keeps its label, starting with the first.
    pub every: usize,
    pub rotate: bool,
}

impl CategoryTicks {
    pub const ROTATION: f64 = -45.0;

    pub fn shows(&self, index: usize) -> bool {
        index % self.every.max(1) == 0
    }
}

fn label_estimate(max_caption: &str, char_width: f64) -> f64 {
    max_caption.chars().count().max(1) as f64 * char_width
}

/// Thins category labels to what fits in `available` width, estimating one label per
/// `max_caption` worth of characters; rotates them when the survivors still overflow.
pub fn category_ticks(
    categories: &[String],
    max_caption: &str,
    available: f64,
    char_width: f64,
) -> CategoryTicks {
    let n = categories.len();
    if n == 0 {
        return CategoryTicks {
            every: 1,
            rotate: false,
        };
    }

    let estimate = label_estimate(max_caption, char_width);
    let max_labels = if estimate > 0.0 {
        ((available / estimate).floor() as usize).max(1)
    } else {
        n
    };
    let every = n.div_ceil(max_labels).max(1);

    let ticks = CategoryTicks {
        every,
        rotate: false,
    };
    let used: f64 = categories
        .iter()
        .enumerate()
        .filter(|(i, _)| ticks.shows(*i))
        .map(|(_, c)| c.chars().count() as f64 * char_width)
        .sum();
    CategoryTicks {
        every,
        rotate: used > available,
    }
}

/// Tick count for a value axis laid along `available` pixels.
pub fn value_tick_count(max_caption: &str, available: f64, char_width: f64) -> usize {
    let estimate = label_estimate(max_caption, char_width);
    if !(estimate > 0.0) || !available.is_finite() {
        return DEFAULT_TICK_COUNT;
    }
    ((available / estimate).floor() as usize).clamp(1, DEFAULT_TICK_COUNT)
}
