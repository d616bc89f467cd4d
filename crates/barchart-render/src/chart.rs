use crate::config::ChartConfig;
use crate::geometry::layout_bar_chart;
use crate::model::{BarChartLayout, HitTarget, Point};
use crate::record::Record;
use crate::surface::Surface;
use crate::svg::{SvgRenderOptions, render_bar_chart_svg};
use crate::tooltip::Tooltip;
use crate::{LayoutOptions, Result};
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderState {
    Empty,
    Built,
    Cleared,
}

/// Pointer position both relative to the container (`x`, `y`) and to the page.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointerEvent {
    pub x: f64,
    pub y: f64,
    pub page_x: f64,
    pub page_y: f64,
}

impl PointerEvent {
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            page_x: x,
            page_y: y,
        }
    }

    fn local(&self) -> Point {
        Point::new(self.x, self.y)
    }

    fn page(&self) -> Point {
        Point::new(self.page_x, self.page_y)
    }
}

type ClickCallback = Box<dyn FnMut(&Record)>;

/// A bar chart bound to one surface.
///
/// Configuration and data only take effect on the next [`BarChart::render`] or
/// [`BarChart::resize`]. Every render rebuilds the whole document.
pub struct BarChart<S: Surface> {
    surface: S,
    config: ChartConfig,
    data: Arc<[Record]>,
    options: LayoutOptions,
    svg_options: SvgRenderOptions,
    state: RenderState,
    layout: Option<BarChartLayout>,
    tooltip: Tooltip,
    on_click_barplot: Option<ClickCallback>,
}

impl<S: Surface> BarChart<S> {
    pub fn new(surface: S) -> Self {
        Self::with_options(surface, LayoutOptions::default(), SvgRenderOptions::default())
    }

    pub fn with_options(
        mut surface: S,
        options: LayoutOptions,
        svg_options: SvgRenderOptions,
    ) -> Self {
        let tooltip = Tooltip::new();
        surface.attach_tooltip(&tooltip);
        Self {
            surface,
            config: ChartConfig::default(),
            data: Arc::from(Vec::new()),
            options,
            svg_options,
            state: RenderState::Empty,
            layout: None,
            tooltip,
            on_click_barplot: None,
        }
    }

    /// Merges recognized options from `partial`. Does not render.
    pub fn set_config(&mut self, partial: &Value) -> Result<()> {
        self.config.merge(partial)
    }

    pub fn config(&self) -> &ChartConfig {
        &self.config
    }

    /// Replaces the dataset. Does not render.
    pub fn set_data(&mut self, records: impl Into<Arc<[Record]>>) {
        self.data = records.into();
    }

    pub fn data(&self) -> &[Record] {
        &self.data
    }

    /// Removes the current document, if one is built.
    pub fn clear(&mut self) {
        if self.state != RenderState::Built {
            return;
        }
        self.surface.unmount();
        self.layout = None;
        self.state = RenderState::Cleared;
        if self.tooltip.is_visible() {
            self.tooltip.hide();
            self.surface.update_tooltip(&self.tooltip);
        }
        tracing::debug!("cleared bar chart");
    }

    /// Rebuilds the chart from the current configuration and data.
    pub fn render(&mut self) -> Result<()> {
        self.clear();
        let size = self.surface.size();
        let layout = layout_bar_chart(&self.data, &self.config, size, &self.options)?;
        let svg = render_bar_chart_svg(&layout, &self.svg_options);
        tracing::debug!(
            width = size.width,
            height = size.height,
            records = self.data.len(),
            bytes = svg.len(),
            "rendered bar chart"
        );
        self.surface.mount(svg);
        self.layout = Some(layout);
        self.state = RenderState::Built;
        Ok(())
    }

    /// Re-renders for the surface's current size.
    pub fn resize(&mut self) -> Result<()> {
        self.clear();
        self.render()
    }

    pub fn set_on_click_barplot(&mut self, callback: impl FnMut(&Record) + 'static) {
        self.on_click_barplot = Some(Box::new(callback));
    }

    pub fn clear_on_click_barplot(&mut self) {
        self.on_click_barplot = None;
    }

    pub fn color_for_value(&self, value: f64) -> Option<&str> {
        self.config.color_for_value(value)
    }

    pub fn state(&self) -> RenderState {
        self.state
    }

    /// Scene of the last render, while built.
    pub fn layout(&self) -> Option<&BarChartLayout> {
        self.layout.as_ref()
    }

    pub fn tooltip(&self) -> &Tooltip {
        &self.tooltip
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn hit_test(&self, p: Point) -> Option<HitTarget> {
        self.layout.as_ref()?.hit_test(p)
    }

    /// Shows, moves or hides the tooltip for the element under the pointer.
    pub fn pointer_move(&mut self, event: PointerEvent) {
        let hit = self.hit_test(event.local());
        tracing::trace!(x = event.x, y = event.y, ?hit, "pointer move");

        let text = match (hit, self.layout.as_ref()) {
            (Some(target), Some(layout)) => layout.tooltip_text(target).map(str::to_string),
            _ => None,
        };
        match text {
            Some(text) => {
                let measurer = self.options.text_measurer.as_ref();
                self.tooltip.show(&text, event.page(), measurer);
            }
            None if self.tooltip.is_visible() => self.tooltip.hide(),
            None => return,
        }
        self.surface.update_tooltip(&self.tooltip);
    }

    pub fn pointer_leave(&mut self) {
        if self.tooltip.is_visible() {
            self.tooltip.hide();
            self.surface.update_tooltip(&self.tooltip);
        }
    }

    /// Invokes the click callback with the record of the bar under the pointer. Returns whether
    /// a bar was hit.
    pub fn click(&mut self, event: PointerEvent) -> bool {
        let Some(HitTarget::Bar(i)) = self.hit_test(event.local()) else {
            return false;
        };
        let Some(index) = self.layout.as_ref().and_then(|l| l.bars.get(i)).map(|b| b.record_index)
        else {
            return false;
        };
        tracing::trace!(record_index = index, "bar clicked");
        if let (Some(cb), Some(record)) = (self.on_click_barplot.as_mut(), self.data.get(index)) {
            cb(record);
        }
        true
    }
}

impl<S: Surface> Drop for BarChart<S> {
    fn drop(&mut self) {
        self.surface.detach_tooltip(self.tooltip.id());
    }
}
