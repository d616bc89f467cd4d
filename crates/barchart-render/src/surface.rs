//! Host container abstraction.

use crate::model::Size;
use crate::tooltip::Tooltip;
use indexmap::IndexMap;

/// The container a chart draws into, plus the page root its tooltip lives on.
///
/// A surface holds at most one mounted chart document at a time.
pub trait Surface {
    /// Current container size in pixels.
    fn size(&self) -> Size;
    /// Replaces the container contents with `svg`.
    fn mount(&mut self, svg: String);
    /// Removes the mounted document, if any.
    fn unmount(&mut self);
    /// Adds a tooltip element to the page root.
    fn attach_tooltip(&mut self, tooltip: &Tooltip);
    /// Re-renders an attached tooltip after its text, position or visibility changed.
    fn update_tooltip(&mut self, tooltip: &Tooltip);
    fn detach_tooltip(&mut self, id: &str);
}

/// In-memory surface used by the CLI and tests.
#[derive(Debug, Clone, Default)]
pub struct MemorySurface {
    size: Size,
    svg: Option<String>,
    tooltips: IndexMap<String, String>,
    mounts: usize,
}

impl MemorySurface {
    pub fn new(size: Size) -> Self {
        Self {
            size,
            ..Default::default()
        }
    }

    pub fn set_size(&mut self, size: Size) {
        self.size = size;
    }

    pub fn svg(&self) -> Option<&str> {
        self.svg.as_deref()
    }

    /// Tooltip markup keyed by element id, in attach order.
    pub fn tooltips(&self) -> &IndexMap<String, String> {
        &self.tooltips
    }

    /// How many documents were mounted over the surface's lifetime.
    pub fn mount_count(&self) -> usize {
        self.mounts
    }
}

impl Surface for MemorySurface {
    fn size(&self) -> Size {
        self.size
    }

    fn mount(&mut self, svg: String) {
        self.svg = Some(svg);
        self.mounts += 1;
    }

    fn unmount(&mut self) {
        self.svg = None;
    }

    fn attach_tooltip(&mut self, tooltip: &Tooltip) {
        self.tooltips
            .insert(tooltip.id().to_string(), tooltip.to_html());
    }

    fn update_tooltip(&mut self, tooltip: &Tooltip) {
        if let Some(html) = self.tooltips.get_mut(tooltip.id()) {
            *html = tooltip.to_html();
        }
    }

    fn detach_tooltip(&mut self, id: &str) {
        self.tooltips.shift_remove(id);
    }
}

impl<S: Surface + ?Sized> Surface for &mut S {
    fn size(&self) -> Size {
        (**self).size()
    }

    fn mount(&mut self, svg: String) {
        (**self).mount(svg)
    }

    fn unmount(&mut self) {
        (**self).unmount()
    }

    fn attach_tooltip(&mut self, tooltip: &Tooltip) {
        (**self).attach_tooltip(tooltip)
    }

    fn update_tooltip(&mut self, tooltip: &Tooltip) {
        (**self).update_tooltip(tooltip)
    }

    fn detach_tooltip(&mut self, id: &str) {
        (**self).detach_tooltip(id)
    }
}
