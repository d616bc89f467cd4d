use crate::format::js_number_string;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Bucket of values sharing one bar fill; both bounds are inclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorRange {
    pub range: [f64; 2],
    pub color: String,
}

impl ColorRange {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.range[0] && value <= self.range[1]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Vertical,
    Horizontal,
}

/// Rendering options of one chart.
///
/// Built from [`ChartConfig::default`] and updated through [`ChartConfig::merge`], which only
/// touches recognized keys. Serializes with the same camelCase keys it accepts.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartConfig {
    pub margin_x: f64,
    pub margin_y: f64,
    pub padding_inner: f64,
    pub padding_outer: f64,
    pub target_name: Option<String>,
    pub x_axis: String,
    pub col_value: String,
    pub col_line_value: String,
    pub show_serif_lines: bool,
    pub show_risk_line: bool,
    pub show_axis_x: bool,
    pub show_axis_y: bool,
    pub horizontal_mode: bool,
    pub round_value_to: Option<u32>,
    pub colors_by_range: Vec<ColorRange>,
    pub target_bar_color: String,
    pub second_bar_color: String,
    pub diff_positive_color: String,
    pub diff_negative_color: String,
    pub risk_line_color: String,
    pub label_char_width: f64,
    pub horizontal_axis_reserve: f64,
    pub horizontal_overflow_reserve: f64,
    pub left_axis_gap: f64,
    pub value_caption_offset: f64,
    pub axis_font_size: f64,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            margin_x: 16.0,
            margin_y: 16.0,
            padding_inner: 0.7,
            padding_outer: 0.35,
            target_name: None,
            x_axis: "name".to_string(),
            col_value: "value".to_string(),
            col_line_value: String::new(),
            show_serif_lines: true,
            show_risk_line: true,
            show_axis_x: true,
            show_axis_y: false,
            horizontal_mode: false,
            round_value_to: None,
            colors_by_range: Vec::new(),
            target_bar_color: "#C6C6D4".to_string(),
            second_bar_color: "#4FB3E8".to_string(),
            diff_positive_color: "#D3F2DC".to_string(),
            diff_negative_color: "#FBDADA".to_string(),
            risk_line_color: "#F2545B".to_string(),
            label_char_width: 10.0,
            horizontal_axis_reserve: 22.0,
            horizontal_overflow_reserve: 50.0,
            left_axis_gap: 8.0,
            value_caption_offset: 5.0,
            axis_font_size: 10.0,
        }
    }
}

/// Keys accepted by [`ChartConfig::merge`].
pub const RECOGNIZED_KEYS: &[&str] = &[
    "marginX",
    "marginY",
    "paddingInner",
    "paddingOuter",
    "targetName",
    "xAxis",
    "colValue",
    "colLineValue",
    "showSerifLines",
    "showRiskLine",
    "showAxisX",
    "showAxisY",
    "horizontalMode",
    "roundValueTo",
    "colorsByRange",
    "targetBarColor",
    "secondBarColor",
    "diffPositiveColor",
    "diffNegativeColor",
    "riskLineColor",
    "labelCharWidth",
    "horizontalAxisReserve",
    "horizontalOverflowReserve",
    "leftAxisGap",
    "valueCaptionOffset",
    "axisFontSize",
];

const MAX_ROUND_DIGITS: u32 = 100;

fn json_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|f| f.is_finite())
}

fn json_bool(v: &Value) -> Option<bool> {
    match v {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn json_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => n.as_f64().map(js_number_string),
        _ => None,
    }
}

/// `roundValueTo` arrives from settings forms as a string; null and blank disable rounding.
fn json_round_to(v: &Value) -> Option<Option<u32>> {
    let digits = match v {
        Value::Null => return Some(None),
        Value::String(s) if s.trim().is_empty() => return Some(None),
        other => json_f64(other)?,
    };
    if digits < 0.0 {
        return None;
    }
    Some(Some((digits.trunc() as u32).min(MAX_ROUND_DIGITS)))
}

impl ChartConfig {
    pub fn from_value(partial: &Value) -> Result<Self> {
        let mut cfg = Self::default();
        cfg.merge(partial)?;
        Ok(cfg)
    }

    /// Shallow merge of `partial` into `self`.
    ///
    /// Unknown keys are ignored. A recognized key whose value has the wrong shape keeps its
    /// previous value.
    pub fn merge(&mut self, partial: &Value) -> Result<()> {
        let Some(map) = partial.as_object() else {
            return Err(Error::InvalidConfig {
                message: "chart config must be a JSON object".to_string(),
            });
        };

        for (key, value) in map {
            if !RECOGNIZED_KEYS.contains(&key.as_str()) {
                tracing::debug!(key = key.as_str(), "ignoring unrecognized chart option");
                continue;
            }
            if !self.apply(key, value) {
                tracing::warn!(
                    key = key.as_str(),
                    value = %value,
                    "invalid value for chart option; keeping previous value"
                );
            }
        }
        Ok(())
    }

    fn apply(&mut self, key: &str, value: &Value) -> bool {
        fn set<T>(slot: &mut T, parsed: Option<T>) -> bool {
            match parsed {
                Some(v) => {
                    *slot = v;
                    true
                }
                None => false,
            }
        }

        match key {
            "marginX" => set(&mut self.margin_x, json_f64(value)),
            "marginY" => set(&mut self.margin_y, json_f64(value)),
            "paddingInner" => set(&mut self.padding_inner, json_f64(value)),
            "paddingOuter" => set(&mut self.padding_outer, json_f64(value)),
            "targetName" => set(
                &mut self.target_name,
                match value {
                    Value::Null => Some(None),
                    other => json_string(other).map(Some),
                },
            ),
            "xAxis" => set(&mut self.x_axis, json_string(value)),
            "colValue" => set(&mut self.col_value, json_string(value)),
            "colLineValue" => set(
                &mut self.col_line_value,
                match value {
                    Value::Null => Some(String::new()),
                    other => json_string(other),
                },
            ),
            "showSerifLines" => set(&mut self.show_serif_lines, json_bool(value)),
            "showRiskLine" => set(&mut self.show_risk_line, json_bool(value)),
            "showAxisX" => set(&mut self.show_axis_x, json_bool(value)),
            "showAxisY" => set(&mut self.show_axis_y, json_bool(value)),
            "horizontalMode" => set(&mut self.horizontal_mode, json_bool(value)),
            "roundValueTo" => set(&mut self.round_value_to, json_round_to(value)),
            "colorsByRange" => set(
                &mut self.colors_by_range,
                match value {
                    Value::Null => Some(Vec::new()),
                    other => serde_json::from_value::<Vec<ColorRange>>(other.clone()).ok(),
                },
            ),
            "targetBarColor" => set(&mut self.target_bar_color, json_string(value)),
            "secondBarColor" => set(&mut self.second_bar_color, json_string(value)),
            "diffPositiveColor" => set(&mut self.diff_positive_color, json_string(value)),
            "diffNegativeColor" => set(&mut self.diff_negative_color, json_string(value)),
            "riskLineColor" => set(&mut self.risk_line_color, json_string(value)),
            "labelCharWidth" => set(&mut self.label_char_width, json_f64(value)),
            "horizontalAxisReserve" => set(&mut self.horizontal_axis_reserve, json_f64(value)),
            "horizontalOverflowReserve" => {
                set(&mut self.horizontal_overflow_reserve, json_f64(value))
            }
            "leftAxisGap" => set(&mut self.left_axis_gap, json_f64(value)),
            "valueCaptionOffset" => set(&mut self.value_caption_offset, json_f64(value)),
            "axisFontSize" => set(&mut self.axis_font_size, json_f64(value)),
            _ => false,
        }
    }

    pub fn orientation(&self) -> Orientation {
        if self.horizontal_mode {
            Orientation::Horizontal
        } else {
            Orientation::Vertical
        }
    }

    /// Serif lines need both the toggle and a secondary field to read from.
    pub fn line_enabled(&self) -> bool {
        self.show_serif_lines && !self.col_line_value.is_empty()
    }

    /// A blank target name never matches, not even records with a blank category.
    pub fn target(&self) -> Option<&str> {
        self.target_name.as_deref().filter(|t| !t.is_empty())
    }

    /// Color of the first range containing `value`.
    pub fn color_for_value(&self, value: f64) -> Option<&str> {
        self.colors_by_range
            .iter()
            .find(|r| r.contains(value))
            .map(|r| r.color.as_str())
    }

    /// Bar fill: range colors win over target coloring when configured.
    pub fn bar_fill(&self, category: &str, value: Option<f64>) -> &str {
        if !self.colors_by_range.is_empty() {
            return value
                .and_then(|v| self.color_for_value(v))
                .unwrap_or(&self.second_bar_color);
        }
        if self.target() == Some(category) {
            &self.target_bar_color
        } else {
            &self.second_bar_color
        }
    }
}
