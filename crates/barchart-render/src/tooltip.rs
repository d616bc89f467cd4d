//! Floating tooltip shared by all interactive chart elements.

use crate::model::{Point, Size};
use crate::svg::{escape_xml, fmt};
use crate::text::{TextMeasurer, TextStyle};

const PADDING_X: f64 = 8.0;
const PADDING_Y: f64 = 4.0;
const BORDER: f64 = 1.0;
/// Gap between the tooltip's bottom edge and the pointer.
const POINTER_GAP: f64 = 16.0;
const FONT_SIZE: f64 = 12.0;

/// Tooltip element state. The chart owns one for its whole lifetime; the host page renders it
/// through [`Tooltip::to_html`].
#[derive(Debug, Clone, PartialEq)]
pub struct Tooltip {
    id: String,
    text: String,
    visible: bool,
    left: f64,
    top: f64,
}

impl Default for Tooltip {
    fn default() -> Self {
        Self::new()
    }
}

impl Tooltip {
    pub fn new() -> Self {
        Self {
            id: format!("barchart-tooltip-{}", uuid::Uuid::new_v4().simple()),
            text: String::new(),
            visible: false,
            left: 0.0,
            top: 0.0,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Page position of the top-left corner.
    pub fn position(&self) -> Point {
        Point::new(self.left, self.top)
    }

    pub fn style() -> TextStyle {
        TextStyle {
            font_family: Some("Proxima Nova".to_string()),
            font_size: FONT_SIZE,
            font_weight: None,
        }
    }

    /// Border box of the current text.
    pub fn box_size(&self, measurer: &dyn TextMeasurer) -> Size {
        let m = measurer.measure(&self.text, &Self::style());
        Size::new(
            m.width + 2.0 * (PADDING_X + BORDER),
            m.height + 2.0 * (PADDING_Y + BORDER),
        )
    }

    pub fn show(&mut self, text: &str, page: Point, measurer: &dyn TextMeasurer) {
        self.text = text.to_string();
        self.visible = true;
        self.move_to(page, measurer);
    }

    /// Centers the tooltip horizontally above the pointer.
    pub fn move_to(&mut self, page: Point, measurer: &dyn TextMeasurer) {
        let size = self.box_size(measurer);
        self.left = page.x - size.width / 2.0;
        self.top = page.y - size.height - POINTER_GAP;
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    pub fn css(&self) -> String {
        format!(
            "opacity: {}; position: absolute; left: {}px; top: {}px; padding: {}px {}px; border: {}px solid var(--border); border-radius: 3px; background: var(--background_main); color: var(--text_main); font-family: Proxima Nova; pointer-events: none",
            if self.visible { 1 } else { 0 },
            fmt(self.left),
            fmt(self.top),
            fmt(PADDING_Y),
            fmt(PADDING_X),
            fmt(BORDER),
        )
    }

    pub fn to_html(&self) -> String {
        format!(
            r#"<div id="{}" class="tooltip" style="{}">{}</div>"#,
            escape_xml(&self.id),
            escape_xml(&self.css()),
            escape_xml(&self.text)
        )
    }
}
