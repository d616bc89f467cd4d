use barchart::panel::{
    BarChartPanel, DataSourceEvent, DataSourceLookup, DataSourceStatus, EventBus, EventFilter,
};
use barchart::{HitTarget, MemorySurface, Point, PointerEvent, Record, Size, records_from_str};
use serde_json::json;
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

fn workspace_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
}

fn basic_records() -> Vec<Record> {
    let path = workspace_root()
        .join("fixtures")
        .join("barchart")
        .join("basic.json");
    let text = std::fs::read_to_string(&path).expect("fixture");
    records_from_str(&text).expect("records")
}

#[derive(Clone, Default)]
struct SharedSources(Rc<RefCell<Option<Vec<Record>>>>);

impl DataSourceLookup for SharedSources {
    fn get_record(&self, name: &str) -> Option<Vec<Record>> {
        (name == "sales").then(|| self.0.borrow().clone()).flatten()
    }

    fn status(&self, name: &str) -> Option<DataSourceStatus> {
        if name != "sales" {
            return None;
        }
        Some(if self.0.borrow().is_some() {
            DataSourceStatus::Success
        } else {
            DataSourceStatus::Pending
        })
    }

    fn names(&self) -> Vec<String> {
        vec!["sales".to_string()]
    }
}

#[derive(Default)]
struct RecordingBus {
    subscriptions: Vec<EventFilter>,
}

impl EventBus for RecordingBus {
    fn subscribe(&mut self, _: &str, _: &str, _: &str, _: &str, filter: &EventFilter) {
        self.subscriptions.push(filter.clone());
    }

    fn unsubscribe(&mut self, _: &str, _: &str, _: &str, _: &str, filter: &EventFilter) {
        self.subscriptions.retain(|f| f != filter);
    }
}

#[test]
fn panel_renders_once_the_data_source_reports_success() {
    let sources = SharedSources::default();
    let mut panel = BarChartPanel::new(
        "panel#42",
        "data-source-system",
        MemorySurface::new(Size::new(480.0, 320.0)),
        sources.clone(),
        RecordingBus::default(),
    );
    panel
        .set_plugin_config(&json!({
            "dataSource": "sales",
            "targetName": "Target",
            "colLineValue": "lineValue"
        }))
        .expect("config");

    assert_eq!(
        panel.event_bus().subscriptions,
        vec![EventFilter {
            data_source: "sales".to_string(),
            status: DataSourceStatus::Success,
        }]
    );
    assert!(panel.chart().surface().svg().is_none());

    *sources.0.borrow_mut() = Some(basic_records());
    panel
        .process_data_source_event(&DataSourceEvent {
            data_source: "sales".to_string(),
            status: DataSourceStatus::Success,
        })
        .expect("event");

    let svg = panel.chart().surface().svg().expect("rendered");
    assert!(svg.starts_with(r#"<svg id="panel-42""#));
    assert!(svg.contains(r#"id="panel-42-bar-0""#));

    let layout = panel.chart().layout().expect("layout");
    assert_eq!(layout.bars[0].category, "Target");
    assert_eq!(layout.serif_lines().count(), 3);
}

#[test]
fn clicking_a_bar_reports_its_record() {
    let sources = SharedSources(Rc::new(RefCell::new(Some(basic_records()))));
    let mut panel = BarChartPanel::new(
        "p",
        "ds",
        MemorySurface::new(Size::new(480.0, 320.0)),
        sources,
        RecordingBus::default(),
    );
    panel
        .set_plugin_config(&json!({"dataSource": "sales", "targetName": "Target"}))
        .expect("config");

    let clicked = Rc::new(RefCell::new(None));
    let sink = Rc::clone(&clicked);
    panel
        .chart_mut()
        .set_on_click_barplot(move |r| *sink.borrow_mut() = r.get("name").cloned());

    let layout = panel.chart().layout().expect("layout").clone();
    let c = layout.bars[1].rect.center();
    let event = PointerEvent::at(
        c.x + layout.margin_x + layout.plot.left_axis_width,
        c.y + layout.margin_y,
    );
    assert_eq!(
        panel.chart().hit_test(Point::new(event.x, event.y)),
        Some(HitTarget::Bar(1))
    );
    assert!(panel.chart_mut().click(event));
    assert_eq!(*clicked.borrow(), Some(json!("A")));
}

#[test]
fn persisted_config_round_trips_through_the_form() {
    let mut panel = BarChartPanel::new(
        "p",
        "ds",
        MemorySurface::new(Size::new(200.0, 100.0)),
        SharedSources::default(),
        RecordingBus::default(),
    );
    panel
        .set_form_settings(&json!({"title": "Plan vs fact", "dataSource": "sales"}))
        .expect("form");
    let saved = panel.plugin_config();
    assert_eq!(saved, json!({"title": "Plan vs fact", "dataSource": "sales"}));
    assert_eq!(panel.form_settings().fields[1].options.len(), 1);
}
