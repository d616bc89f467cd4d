use crate::model::{AxisLayout, AxisSide, BarChartLayout, TextData};
use std::collections::BTreeMap;
use std::fmt::Write as _;

#[derive(Debug, Clone)]
pub struct SvgRenderOptions {
    /// Root element id; also prefixes element ids and scopes the embedded stylesheet.
    pub diagram_id: Option<String>,
    /// When false, no `<style>` element is emitted and styling is left to the host page.
    pub include_style: bool,
    /// Optional background fill drawn behind everything.
    pub background: Option<String>,
}

impl Default for SvgRenderOptions {
    fn default() -> Self {
        Self {
            diagram_id: None,
            include_style: true,
            background: None,
        }
    }
}

/// Number formatting for SVG attributes: shortest round-trippable form, without `-0` and
/// without float noise from our own arithmetic.
pub fn fmt(v: f64) -> String {
    if !v.is_finite() {
        return "0".to_string();
    }

    let mut v = if v.abs() < 1e-9 { 0.0 } else { v };
    let nearest = v.round();
    if (v - nearest).abs() < 1e-6 {
        v = nearest;
    }
    let s = v.to_string();
    if s == "-0" { "0".to_string() } else { s }
}

pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn chart_css(id: &str) -> String {
    let id = escape_xml(id);
    format!(
        r#"#{id}{{font-family:"Proxima Nova",sans-serif;}}#{id} .barplot{{cursor:pointer;}}#{id} .diff-rect{{cursor:default;}}#{id} .bar-value-caption{{font-size:10px;text-anchor:middle;fill:#51515C;}}#{id} .bar-value-caption.hor{{text-anchor:start;}}#{id} .diff-rect-caption{{font-size:10px;text-anchor:middle;dominant-baseline:middle;}}#{id} .diff-rect-caption.plus{{fill:#2B9348;}}#{id} .diff-rect-caption.minus{{fill:#D62828;}}#{id} .risk-line{{stroke-width:2px;fill:none;}}#{id} .risk-line-caption{{font-size:10px;text-anchor:middle;fill:#F2545B;}}#{id} .risk-line-caption.hor{{text-anchor:start;}}#{id} .x-axis-line,#{id} .y-axis-line{{stroke:#E0E0E8;}}#{id} .x-axis-tick-caption,#{id} .y-axis-tick-caption{{fill:#51515C;}}"#
    )
}

#[derive(Debug, Clone)]
struct Node {
    tag: &'static str,
    attrs: BTreeMap<&'static str, String>,
    text: Option<String>,
    children: Vec<usize>,
}

fn node(tag: &'static str) -> Node {
    Node {
        tag,
        attrs: BTreeMap::new(),
        text: None,
        children: Vec::new(),
    }
}

fn push_child(arena: &mut Vec<Node>, parent: usize, child: Node) -> usize {
    let id = arena.len();
    arena.push(child);
    arena[parent].children.push(id);
    id
}

fn render_node(out: &mut String, arena: &[Node], id: usize) {
    let n = &arena[id];
    out.push('<');
    out.push_str(n.tag);
    for (k, v) in &n.attrs {
        let _ = write!(out, r#" {k}="{v}""#);
    }
    if n.children.is_empty() && n.text.as_deref().unwrap_or("").is_empty() {
        out.push_str("/>");
        return;
    }
    out.push('>');
    if let Some(t) = n.text.as_deref() {
        out.push_str(t);
    }
    for c in &n.children {
        render_node(out, arena, *c);
    }
    let _ = write!(out, "</{}>", n.tag);
}

fn caption(t: &TextData) -> Node {
    let mut n = node("text");
    n.attrs.insert("class", escape_xml(&t.class));
    n.attrs.insert("x", fmt(t.x));
    n.attrs.insert("y", fmt(t.y));
    n.attrs.insert("pointer-events", "none".to_string());
    n.text = Some(escape_xml(&t.text));
    n
}

fn render_axis(arena: &mut Vec<Node>, parent: usize, axis: &AxisLayout) {
    let (class, anchor) = match axis.side {
        AxisSide::Left => ("axis axis-left", "end"),
        AxisSide::Bottom => ("axis axis-bottom", "middle"),
    };
    let mut g = node("g");
    g.attrs.insert("class", class.to_string());
    g.attrs.insert(
        "transform",
        format!("translate({}, {})", fmt(axis.origin.x), fmt(axis.origin.y)),
    );
    g.attrs.insert("fill", "none".to_string());
    g.attrs.insert("font-size", fmt(axis.font_size));
    g.attrs.insert("font-family", "sans-serif".to_string());
    g.attrs.insert("text-anchor", anchor.to_string());
    let gid = push_child(arena, parent, g);

    if let Some(len) = axis.domain_length {
        let mut p = node("path");
        p.attrs.insert("class", axis.line_class().to_string());
        p.attrs.insert("stroke", "currentColor".to_string());
        p.attrs.insert(
            "d",
            match axis.side {
                AxisSide::Left => format!("M0,0L0,{}", fmt(len)),
                AxisSide::Bottom => format!("M0,0L{},0", fmt(len)),
            },
        );
        push_child(arena, gid, p);
    }

    for tick in &axis.ticks {
        let mut t = node("g");
        t.attrs.insert("class", "tick".to_string());
        t.attrs.insert("opacity", "1".to_string());
        t.attrs.insert(
            "transform",
            match axis.side {
                AxisSide::Left => format!("translate(0,{})", fmt(tick.offset)),
                AxisSide::Bottom => format!("translate({},0)", fmt(tick.offset)),
            },
        );
        let tid = push_child(arena, gid, t);

        if let Some(len) = axis.grid_length {
            let mut line = node("line");
            line.attrs.insert("class", axis.line_class().to_string());
            line.attrs.insert("stroke", "currentColor".to_string());
            match axis.side {
                AxisSide::Left => line.attrs.insert("x2", fmt(len)),
                AxisSide::Bottom => line.attrs.insert("y2", fmt(len)),
            };
            push_child(arena, tid, line);
        }

        let mut label = node("text");
        label.attrs.insert("class", axis.caption_class().to_string());
        label.attrs.insert("fill", "currentColor".to_string());
        match axis.side {
            AxisSide::Left => {
                label.attrs.insert("x", "-9".to_string());
                label.attrs.insert("dy", "0.32em".to_string());
            }
            AxisSide::Bottom if axis.label_rotation != 0.0 => {
                label.attrs.insert(
                    "transform",
                    format!("translate(0,9) rotate({})", fmt(axis.label_rotation)),
                );
                label.attrs.insert("text-anchor", "end".to_string());
                label.attrs.insert("dy", "0.71em".to_string());
            }
            AxisSide::Bottom => {
                label.attrs.insert("y", "9".to_string());
                label.attrs.insert("dy", "0.71em".to_string());
            }
        }
        label.text = Some(escape_xml(&tick.label));
        push_child(arena, tid, label);
    }
}

/// Renders a laid out chart as a standalone SVG document.
///
/// Element order: axes (left, then bottom), then the chart area holding diff overlays with
/// their captions, all bars, and per bar its serif line, serif caption and value caption.
pub fn render_bar_chart_svg(layout: &BarChartLayout, options: &SvgRenderOptions) -> String {
    let diagram_id = options.diagram_id.as_deref().unwrap_or("barchart");
    let id_esc = escape_xml(diagram_id);

    let mut out = String::new();
    let _ = write!(
        &mut out,
        r#"<svg id="{id_esc}" class="content" xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" role="graphics-document document" aria-roledescription="barchart">"#,
        w = fmt(layout.size.width.max(1.0)),
        h = fmt(layout.size.height.max(1.0)),
    );
    if options.include_style {
        let _ = write!(&mut out, "<style>{}</style>", chart_css(diagram_id));
    }
    if let Some(bg) = options.background.as_deref() {
        let _ = write!(
            &mut out,
            r#"<rect class="background" width="100%" height="100%" fill="{}"/>"#,
            escape_xml(bg)
        );
    }

    let mut arena: Vec<Node> = Vec::new();
    let mut root = node("g");
    root.attrs.insert(
        "transform",
        format!(
            "translate({}, {})",
            fmt(layout.margin_x),
            fmt(layout.margin_y)
        ),
    );
    arena.push(root);

    if let Some(axis) = &layout.left_axis {
        render_axis(&mut arena, 0, axis);
    }
    if let Some(axis) = &layout.bottom_axis {
        render_axis(&mut arena, 0, axis);
    }

    let mut area_group = node("g");
    area_group.attrs.insert("class", "chart-area".to_string());
    area_group.attrs.insert(
        "transform",
        format!("translate({}, 0)", fmt(layout.plot.left_axis_width)),
    );
    let area = push_child(&mut arena, 0, area_group);

    for (i, d) in layout.diffs.iter().enumerate() {
        let mut r = node("rect");
        r.attrs.insert("id", format!("{id_esc}-diff-{i}"));
        r.attrs.insert("class", "diff-rect".to_string());
        r.attrs.insert("x", fmt(d.rect.x));
        r.attrs.insert("y", fmt(d.rect.y));
        r.attrs.insert("width", fmt(d.rect.width));
        r.attrs.insert("height", fmt(d.rect.height));
        r.attrs.insert("fill", escape_xml(&d.fill));
        r.attrs.insert("data-tooltip", escape_xml(&d.tooltip));
        push_child(&mut arena, area, r);
        push_child(&mut arena, area, caption(&d.caption));
    }

    for (i, b) in layout.bars.iter().enumerate() {
        let mut r = node("rect");
        r.attrs.insert("id", format!("{id_esc}-bar-{i}"));
        r.attrs.insert("class", "barplot".to_string());
        r.attrs.insert("x", fmt(b.rect.x));
        r.attrs.insert("y", fmt(b.rect.y));
        r.attrs.insert("width", fmt(b.rect.width));
        r.attrs.insert("height", fmt(b.rect.height));
        r.attrs.insert("fill", escape_xml(&b.fill));
        r.attrs.insert("data-category", escape_xml(&b.category));
        r.attrs.insert("data-tooltip", escape_xml(&b.tooltip));
        push_child(&mut arena, area, r);
    }

    for (i, b) in layout.bars.iter().enumerate() {
        if let Some(s) = &b.serif_line {
            let mut p = node("path");
            p.attrs.insert("id", format!("{id_esc}-line-{i}"));
            p.attrs.insert("class", "risk-line".to_string());
            p.attrs.insert("d", s.path());
            p.attrs.insert("stroke", escape_xml(&s.stroke));
            p.attrs.insert("data-tooltip", escape_xml(&s.tooltip));
            push_child(&mut arena, area, p);
            push_child(&mut arena, area, caption(&s.caption));
        }
        push_child(&mut arena, area, caption(&b.caption));
    }

    render_node(&mut out, &arena, 0);
    out.push_str("</svg>\n");
    out
}
