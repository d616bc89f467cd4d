//! Dashboard panel glue: plugin configuration, data-source subscription and the settings form.
//!
//! The host platform is reached only through [`DataSourceLookup`] and [`EventBus`]; the panel
//! owns a [`BarChart`] and decides when it re-renders.

use crate::{BarChart, Record, Surface, sanitize_svg_id};
use barchart_render::svg::SvgRenderOptions;
use barchart_render::{LayoutOptions, config::RECOGNIZED_KEYS};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Event the data-source system publishes when a source changes state.
pub const DATA_SOURCE_STATUS_UPDATE: &str = "DataSourceStatusUpdate";
/// Handler name the panel registers for [`DATA_SOURCE_STATUS_UPDATE`].
pub const DATA_SOURCE_EVENT_HANDLER: &str = "processDataSourceEvent";

#[derive(Debug, thiserror::Error)]
pub enum PanelError {
    #[error("panel config must be a JSON object")]
    ConfigShape,
    #[error(transparent)]
    Chart(#[from] barchart_render::Error),
}

pub type Result<T> = std::result::Result<T, PanelError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSourceStatus {
    New,
    Pending,
    Success,
    Failed,
}

/// Read access to the host's data sources and their session storage.
pub trait DataSourceLookup {
    /// Records stored for `name`, if any.
    fn get_record(&self, name: &str) -> Option<Vec<Record>>;
    fn status(&self, name: &str) -> Option<DataSourceStatus>;
    /// Names of all known data sources, used to populate the settings form.
    fn names(&self) -> Vec<String>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventFilter {
    pub data_source: String,
    pub status: DataSourceStatus,
}

/// The host's publish/subscribe system.
pub trait EventBus {
    fn subscribe(
        &mut self,
        source_id: &str,
        event_name: &str,
        listener_id: &str,
        handler_name: &str,
        filter: &EventFilter,
    );
    fn unsubscribe(
        &mut self,
        source_id: &str,
        event_name: &str,
        listener_id: &str,
        handler_name: &str,
        filter: &EventFilter,
    );
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSourceEvent {
    pub data_source: String,
    pub status: DataSourceStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormComponent {
    Title,
    Datasource,
    Text,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldAttrs {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prop_value: Option<String>,
    #[serde(default)]
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldOption {
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormField {
    pub component: FormComponent,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prop_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prop_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attrs: Option<FieldAttrs>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<FieldOption>,
}

impl FormField {
    fn title(text: &str) -> Self {
        Self {
            component: FormComponent::Title,
            prop_name: None,
            prop_value: Some(text.to_string()),
            attrs: None,
            options: Vec::new(),
        }
    }

    fn text(prop: &str, label: &str, default: Option<&str>) -> Self {
        Self {
            component: FormComponent::Text,
            prop_name: Some(prop.to_string()),
            prop_value: None,
            attrs: Some(FieldAttrs {
                label: Some(label.to_string()),
                prop_value: default.map(str::to_string),
                required: true,
                ..Default::default()
            }),
            options: Vec::new(),
        }
    }
}

/// Declarative settings form the host renders for the panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormSettings {
    pub fields: Vec<FormField>,
}

/// Panel-level settings, each persisted only when non-empty. Chart options are persisted too.
const PANEL_KEYS: &[&str] = &["title", "dataSource", "targetName", "colValue", "colLineValue"];

/// A bar chart panel bound to a host dashboard.
pub struct BarChartPanel<S: Surface, D: DataSourceLookup, B: EventBus> {
    guid: String,
    data_source_system_id: String,
    chart: BarChart<S>,
    data_sources: D,
    bus: B,
    settings: Map<String, Value>,
}

impl<S: Surface, D: DataSourceLookup, B: EventBus> BarChartPanel<S, D, B> {
    /// `guid` identifies this panel instance on the event bus; `data_source_system_id` is the
    /// publisher of data-source status events.
    pub fn new(
        guid: &str,
        data_source_system_id: &str,
        surface: S,
        data_sources: D,
        bus: B,
    ) -> Self {
        let svg = SvgRenderOptions {
            diagram_id: Some(sanitize_svg_id(guid)),
            ..Default::default()
        };
        Self {
            guid: guid.to_string(),
            data_source_system_id: data_source_system_id.to_string(),
            chart: BarChart::with_options(surface, LayoutOptions::default(), svg),
            data_sources,
            bus,
            settings: Map::new(),
        }
    }

    pub fn guid(&self) -> &str {
        &self.guid
    }

    pub fn chart(&self) -> &BarChart<S> {
        &self.chart
    }

    pub fn chart_mut(&mut self) -> &mut BarChart<S> {
        &mut self.chart
    }

    pub fn event_bus(&self) -> &B {
        &self.bus
    }

    pub fn data_sources(&self) -> &D {
        &self.data_sources
    }

    pub fn title(&self) -> Option<&str> {
        self.settings.get("title").and_then(Value::as_str)
    }

    pub fn data_source(&self) -> Option<&str> {
        self.settings
            .get("dataSource")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    fn filter_for(data_source: &str) -> EventFilter {
        EventFilter {
            data_source: data_source.to_string(),
            status: DataSourceStatus::Success,
        }
    }

    /// Applies panel settings and any chart option.
    ///
    /// Changing `dataSource` moves the subscription to the new source and, when that source has
    /// already loaded, renders its records right away.
    pub fn set_plugin_config(&mut self, config: &Value) -> Result<()> {
        let Some(map) = config.as_object() else {
            return Err(PanelError::ConfigShape);
        };

        let chart_options: Map<String, Value> = map
            .iter()
            .filter(|(k, _)| RECOGNIZED_KEYS.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        if !chart_options.is_empty() {
            self.chart.set_config(&Value::Object(chart_options))?;
        }

        for (k, v) in map {
            let key = k.as_str();
            let persisted = PANEL_KEYS.contains(&key) || RECOGNIZED_KEYS.contains(&key);
            if persisted && k != "dataSource" {
                self.settings.insert(k.clone(), v.clone());
            }
        }

        if let Some(data_source) = map.get("dataSource") {
            let name = data_source.as_str().unwrap_or_default().to_string();
            self.switch_data_source(&name)?;
        }
        Ok(())
    }

    fn switch_data_source(&mut self, name: &str) -> Result<()> {
        if let Some(previous) = self.data_source().map(str::to_string) {
            tracing::debug!(data_source = previous.as_str(), "unsubscribing from data source");
            self.bus.unsubscribe(
                &self.data_source_system_id,
                DATA_SOURCE_STATUS_UPDATE,
                &self.guid,
                DATA_SOURCE_EVENT_HANDLER,
                &Self::filter_for(&previous),
            );
        }

        self.settings
            .insert("dataSource".to_string(), Value::String(name.to_string()));
        if name.is_empty() {
            return Ok(());
        }

        self.bus.subscribe(
            &self.data_source_system_id,
            DATA_SOURCE_STATUS_UPDATE,
            &self.guid,
            DATA_SOURCE_EVENT_HANDLER,
            &Self::filter_for(name),
        );

        if self.data_sources.status(name) == Some(DataSourceStatus::Success) {
            self.reload(name)?;
        }
        Ok(())
    }

    fn reload(&mut self, name: &str) -> Result<()> {
        match self.data_sources.get_record(name) {
            Some(records) => self.load_data(records),
            None => {
                tracing::warn!(data_source = name, "data source has no stored records");
                Ok(())
            }
        }
    }

    /// Persistable settings: non-empty panel values plus explicitly set chart options.
    pub fn plugin_config(&self) -> Value {
        let mut out = Map::new();
        for (k, v) in &self.settings {
            let empty = match v {
                Value::Null => true,
                Value::String(s) => s.is_empty(),
                _ => false,
            };
            if !empty {
                out.insert(k.clone(), v.clone());
            }
        }
        Value::Object(out)
    }

    /// Re-reads the event's data source and re-renders. Safe to call repeatedly for the same
    /// event.
    pub fn process_data_source_event(&mut self, event: &DataSourceEvent) -> Result<()> {
        tracing::debug!(
            data_source = event.data_source.as_str(),
            status = ?event.status,
            "data source event"
        );
        self.settings.insert(
            "dataSource".to_string(),
            Value::String(event.data_source.clone()),
        );
        self.reload(&event.data_source)
    }

    pub fn load_data(&mut self, records: Vec<Record>) -> Result<()> {
        self.chart.set_data(records);
        self.chart.render()?;
        Ok(())
    }

    pub fn set_form_settings(&mut self, config: &Value) -> Result<()> {
        self.set_plugin_config(config)
    }

    pub fn form_settings(&self) -> FormSettings {
        let mut datasource = FormField {
            component: FormComponent::Datasource,
            prop_name: Some("dataSource".to_string()),
            prop_value: None,
            attrs: Some(FieldAttrs {
                label: Some("Data source".to_string()),
                placeholder: Some("Select a value".to_string()),
                required: true,
                ..Default::default()
            }),
            options: Vec::new(),
        };
        datasource.options = self
            .data_sources
            .names()
            .into_iter()
            .map(|value| FieldOption { value })
            .collect();

        FormSettings {
            fields: vec![
                FormField::title("Data source"),
                datasource,
                FormField::title("General settings"),
                FormField::text("colValue", "Value column", Some("value")),
                FormField::text("title", "Title", None),
                FormField::text("colLineValue", "Line value column", Some("lineValue")),
                FormField::text(
                    "targetName",
                    "Name of the target record",
                    Some("targetName"),
                ),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MemorySurface, Size, records_from_value};
    use serde_json::json;
    use std::collections::BTreeMap;

    #[derive(Default)]
    struct Sources {
        records: BTreeMap<String, Vec<Record>>,
        status: BTreeMap<String, DataSourceStatus>,
    }

    impl DataSourceLookup for Sources {
        fn get_record(&self, name: &str) -> Option<Vec<Record>> {
            self.records.get(name).cloned()
        }

        fn status(&self, name: &str) -> Option<DataSourceStatus> {
            self.status.get(name).copied()
        }

        fn names(&self) -> Vec<String> {
            self.status.keys().cloned().collect()
        }
    }

    #[derive(Default)]
    struct Bus {
        log: Vec<(String, String)>,
    }

    impl EventBus for Bus {
        fn subscribe(&mut self, _: &str, event: &str, _: &str, _: &str, f: &EventFilter) {
            assert_eq!(event, DATA_SOURCE_STATUS_UPDATE);
            self.log.push(("subscribe".to_string(), f.data_source.clone()));
        }

        fn unsubscribe(&mut self, _: &str, event: &str, _: &str, _: &str, f: &EventFilter) {
            assert_eq!(event, DATA_SOURCE_STATUS_UPDATE);
            self.log
                .push(("unsubscribe".to_string(), f.data_source.clone()));
        }
    }

    fn sources() -> Sources {
        let mut s = Sources::default();
        s.records.insert(
            "sales".to_string(),
            records_from_value(json!([{"name": "A", "value": 3}])).unwrap(),
        );
        s.status
            .insert("sales".to_string(), DataSourceStatus::Success);
        s.status
            .insert("forecast".to_string(), DataSourceStatus::Pending);
        s
    }

    fn panel() -> BarChartPanel<MemorySurface, Sources, Bus> {
        BarChartPanel::new(
            "panel-1",
            "ds-system",
            MemorySurface::new(Size::new(300.0, 200.0)),
            sources(),
            Bus::default(),
        )
    }

    #[test]
    fn ready_data_source_renders_immediately() {
        let mut p = panel();
        p.set_plugin_config(&json!({"dataSource": "sales", "title": "Sales"}))
            .unwrap();
        assert_eq!(
            p.event_bus().log,
            vec![("subscribe".to_string(), "sales".to_string())]
        );
        assert!(p.chart().surface().svg().is_some());
        assert_eq!(p.chart().data().len(), 1);
        assert_eq!(p.title(), Some("Sales"));
    }

    #[test]
    fn switching_sources_moves_the_subscription() {
        let mut p = panel();
        p.set_plugin_config(&json!({"dataSource": "forecast"})).unwrap();
        assert!(p.chart().surface().svg().is_none());
        p.set_plugin_config(&json!({"dataSource": "sales"})).unwrap();
        assert_eq!(
            p.event_bus().log,
            vec![
                ("subscribe".to_string(), "forecast".to_string()),
                ("unsubscribe".to_string(), "forecast".to_string()),
                ("subscribe".to_string(), "sales".to_string()),
            ]
        );
    }

    #[test]
    fn plugin_config_keeps_only_non_empty_values() {
        let mut p = panel();
        p.set_plugin_config(&json!({
            "title": "",
            "targetName": "Plan",
            "colValue": "amount",
            "horizontalMode": true,
            "unknown": 1
        }))
        .unwrap();
        assert_eq!(
            p.plugin_config(),
            json!({"targetName": "Plan", "colValue": "amount", "horizontalMode": true})
        );
        assert_eq!(p.chart().config().col_value, "amount");
        assert_eq!(p.chart().config().target_name.as_deref(), Some("Plan"));
    }

    #[test]
    fn repeated_events_render_the_same_chart() {
        let mut p = panel();
        let event = DataSourceEvent {
            data_source: "sales".to_string(),
            status: DataSourceStatus::Success,
        };
        p.process_data_source_event(&event).unwrap();
        let first = p.chart().surface().svg().map(str::to_string);
        p.process_data_source_event(&event).unwrap();
        assert_eq!(p.chart().surface().svg().map(str::to_string), first);
        assert_eq!(p.data_source(), Some("sales"));
    }

    #[test]
    fn non_object_config_is_rejected() {
        let mut p = panel();
        assert!(matches!(
            p.set_plugin_config(&json!("sales")),
            Err(PanelError::ConfigShape)
        ));
    }

    #[test]
    fn form_lists_data_sources() {
        let p = panel();
        let form = p.form_settings();
        assert_eq!(form.fields.len(), 7);
        let ds = &form.fields[1];
        assert_eq!(ds.prop_name.as_deref(), Some("dataSource"));
        let names: Vec<&str> = ds.options.iter().map(|o| o.value.as_str()).collect();
        assert_eq!(names, vec!["forecast", "sales"]);

        let v = serde_json::to_value(&form).unwrap();
        assert_eq!(v["fields"][0]["component"], json!("title"));
        assert_eq!(v["fields"][3]["attrs"]["propValue"], json!("value"));
    }
}
