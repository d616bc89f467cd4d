use barchart_render::record::records_from_str;
use barchart_render::svg::{SvgRenderOptions, render_bar_chart_svg};
use barchart_render::{BarChart, ChartConfig, LayoutOptions, MemorySurface, Size, layout_bar_chart};
use serde_json::json;
use std::path::PathBuf;

fn workspace_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
}

fn read_fixture(name: &str) -> String {
    let path = workspace_root().join("fixtures").join("barchart").join(name);
    std::fs::read_to_string(&path).expect("fixture")
}

fn render(config: serde_json::Value) -> String {
    let records = records_from_str(&read_fixture("basic.json")).expect("records");
    let config = ChartConfig::from_value(&config).expect("config");
    let layout = layout_bar_chart(
        &records,
        &config,
        Size::new(480.0, 320.0),
        &LayoutOptions::default(),
    )
    .expect("layout ok");
    render_bar_chart_svg(&layout, &SvgRenderOptions::default())
}

fn has_class(node: &roxmltree::Node<'_, '_>, class: &str) -> bool {
    node.attribute("class")
        .is_some_and(|c| c.split_whitespace().any(|c| c == class))
}

#[test]
fn svg_has_content_root_and_chart_area() {
    let svg = render(json!({"targetName": "Target", "roundValueTo": 1}));
    let doc = roxmltree::Document::parse(&svg).expect("valid svg");
    let root = doc.root_element();
    assert_eq!(root.tag_name().name(), "svg");
    assert_eq!(root.attribute("class"), Some("content"));

    let outer = root
        .children()
        .find(|n| n.is_element() && n.tag_name().name() == "g")
        .expect("outer group");
    assert_eq!(outer.attribute("transform"), Some("translate(16, 16)"));

    let area = outer
        .children()
        .find(|n| has_class(n, "chart-area"))
        .expect("chart area");
    assert_eq!(area.attribute("transform"), Some("translate(0, 0)"));

    let bars: Vec<_> = area.children().filter(|n| has_class(n, "barplot")).collect();
    assert_eq!(bars.len(), 3);
    assert_eq!(bars[0].attribute("data-category"), Some("Target"));
    assert_eq!(bars[0].attribute("fill"), Some("#C6C6D4"));
    assert_eq!(bars[1].attribute("fill"), Some("#4FB3E8"));
}

#[test]
fn diff_overlays_are_drawn_before_bars() {
    let svg = render(json!({"targetName": "Target", "roundValueTo": "1"}));
    let doc = roxmltree::Document::parse(&svg).expect("valid svg");
    let area = doc
        .descendants()
        .find(|n| has_class(n, "chart-area"))
        .expect("chart area");
    let kinds: Vec<String> = area
        .children()
        .filter(|n| n.is_element())
        .map(|n| {
            n.attribute("class")
                .unwrap_or(n.tag_name().name())
                .to_string()
        })
        .collect();
    assert_eq!(
        kinds,
        vec![
            "diff-rect",
            "diff-rect-caption plus",
            "diff-rect",
            "diff-rect-caption minus",
            "barplot",
            "barplot",
            "barplot",
            "bar-value-caption",
            "bar-value-caption",
            "bar-value-caption",
        ]
    );

    let captions: Vec<&str> = area
        .children()
        .filter(|n| has_class(n, "diff-rect-caption") || has_class(n, "bar-value-caption"))
        .filter_map(|n| n.text())
        .collect();
    assert_eq!(captions, vec!["+2.0", "-1.0", "8.0", "10.0", "7.0"]);
}

#[test]
fn no_serif_lines_without_a_line_field() {
    let svg = render(json!({"targetName": "Target", "colLineValue": ""}));
    let doc = roxmltree::Document::parse(&svg).expect("valid svg");
    assert!(!doc.descendants().any(|n| has_class(&n, "risk-line")));
    assert!(!doc.descendants().any(|n| has_class(&n, "risk-line-caption")));
}

#[test]
fn serif_line_precedes_its_bar_caption() {
    let svg = render(json!({"colLineValue": "lineValue"}));
    let doc = roxmltree::Document::parse(&svg).expect("valid svg");
    let area = doc
        .descendants()
        .find(|n| has_class(n, "chart-area"))
        .expect("chart area");
    let tail: Vec<&str> = area
        .children()
        .filter(|n| n.is_element() && !has_class(n, "barplot"))
        .filter_map(|n| n.attribute("class"))
        .take(3)
        .collect();
    assert_eq!(tail, vec!["risk-line", "risk-line-caption", "bar-value-caption"]);

    let line = area
        .children()
        .find(|n| has_class(n, "risk-line"))
        .expect("serif line");
    assert_eq!(line.attribute("stroke"), Some("#F2545B"));
    assert_eq!(line.attribute("data-tooltip"), Some("line: 9"));
}

#[test]
fn axes_are_emitted_when_enabled() {
    let svg = render(json!({"showAxisY": true}));
    let doc = roxmltree::Document::parse(&svg).expect("valid svg");

    let left = doc
        .descendants()
        .find(|n| has_class(n, "axis-left"))
        .expect("left axis");
    let grid = left
        .descendants()
        .filter(|n| has_class(n, "y-axis-line"))
        .count();
    let labels = left
        .descendants()
        .filter(|n| has_class(n, "y-axis-tick-caption"))
        .count();
    assert!(grid > 0);
    assert_eq!(grid, labels);

    let bottom = doc
        .descendants()
        .find(|n| has_class(n, "axis-bottom"))
        .expect("bottom axis");
    let categories: Vec<&str> = bottom
        .descendants()
        .filter(|n| has_class(n, "x-axis-tick-caption"))
        .filter_map(|n| n.text())
        .collect();
    assert_eq!(categories, vec!["A", "B", "Target"]);
    assert!(
        bottom
            .children()
            .any(|n| n.tag_name().name() == "path" && has_class(&n, "x-axis-line"))
    );
}

#[test]
fn render_is_idempotent() {
    let records = records_from_str(&read_fixture("basic.json")).expect("records");
    let mut chart = BarChart::new(MemorySurface::new(Size::new(480.0, 320.0)));
    chart
        .set_config(&json!({"targetName": "Target", "colLineValue": "lineValue"}))
        .expect("config");
    chart.set_data(records);

    chart.render().expect("render");
    let first = chart.surface().svg().expect("svg").to_string();
    let first_layout = chart.layout().cloned();
    chart.render().expect("render");
    assert_eq!(chart.surface().svg(), Some(first.as_str()));
    assert_eq!(chart.layout().cloned(), first_layout);

    chart.resize().expect("resize");
    assert_eq!(chart.surface().svg(), Some(first.as_str()));
}

#[test]
fn resize_follows_the_container() {
    let records = records_from_str(&read_fixture("basic.json")).expect("records");
    let mut chart = BarChart::new(MemorySurface::new(Size::new(480.0, 320.0)));
    chart.set_data(records);
    chart.render().expect("render");
    let small = chart.layout().expect("layout").plot;

    chart.surface_mut().set_size(Size::new(960.0, 640.0));
    chart.resize().expect("resize");
    let large = chart.layout().expect("layout").plot;
    assert!(large.width > small.width);
    assert!(large.height > small.height);
    assert!(
        chart
            .surface()
            .svg()
            .expect("svg")
            .contains(r#"viewBox="0 0 960 640""#)
    );
}

#[test]
fn markup_in_categories_is_escaped() {
    let records =
        records_from_str(r#"[{"name":"<b>&co</b>","value":3}]"#).expect("records");
    let config = ChartConfig::default();
    let layout = layout_bar_chart(
        &records,
        &config,
        Size::new(200.0, 200.0),
        &LayoutOptions::default(),
    )
    .expect("layout ok");
    let svg = render_bar_chart_svg(&layout, &SvgRenderOptions::default());
    let doc = roxmltree::Document::parse(&svg).expect("valid svg");
    let bar = doc
        .descendants()
        .find(|n| has_class(n, "barplot"))
        .expect("bar");
    assert_eq!(bar.attribute("data-category"), Some("<b>&co</b>"));
}
