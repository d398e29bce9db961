//! Generative UI payloads embedded in model answers.
//!
//! The system prompt teaches the model to append a JSON document between
//! literal `<UI_COMPONENT>` markers when a chart or table would help. The
//! server never validates or rewrites that text; it only tries to parse the
//! block so downstream consumers can render it.

use serde::{Deserialize, Serialize};

/// Opening marker of an embedded UI block.
pub const UI_OPEN: &str = "<UI_COMPONENT>";

/// Closing marker of an embedded UI block.
pub const UI_CLOSE: &str = "</UI_COMPONENT>";

/// A renderable component the model asked the client to draw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UiComponent {
    BarChart { title: String, data: Vec<BarDatum> },
    Table { title: String, data: TableData },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarDatum {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableData {
    pub headers: Vec<String>,
    /// Cells are kept as raw JSON; models mix strings and numbers freely.
    pub rows: Vec<Vec<serde_json::Value>>,
}

impl UiComponent {
    /// Raw text between the first pair of UI markers, if any.
    pub fn raw_block(text: &str) -> Option<&str> {
        let start = text.find(UI_OPEN)? + UI_OPEN.len();
        let len = text[start..].find(UI_CLOSE)?;
        Some(&text[start..start + len])
    }

    /// Parse the first embedded UI block.
    ///
    /// Returns `None` when there is no complete block or its JSON does not
    /// describe a known component.
    pub fn extract(text: &str) -> Option<Self> {
        let raw = Self::raw_block(text)?;
        let json = strip_code_fence(raw.trim());
        match serde_json::from_str(json) {
            Ok(component) => Some(component),
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring malformed UI component block");
                None
            }
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Self::BarChart { title, .. } | Self::Table { title, .. } => title,
        }
    }
}

/// Models occasionally wrap the JSON in a markdown fence inside the markers.
fn strip_code_fence(s: &str) -> &str {
    let Some(rest) = s.strip_prefix("```") else {
        return s;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BAR_CHART: &str = r#"Battery comparison:
<UI_COMPONENT>
{
  "type": "bar_chart",
  "title": "Battery life (hours)",
  "data": [
    {"label": "iPhone 16", "value": 22},
    {"label": "Pixel 9", "value": 24.5}
  ]
}
</UI_COMPONENT>
Sources: ..."#;

    #[test]
    fn extracts_bar_chart() {
        let component = UiComponent::extract(BAR_CHART).unwrap();
        match component {
            UiComponent::BarChart { title, data } => {
                assert_eq!(title, "Battery life (hours)");
                assert_eq!(data.len(), 2);
                assert_eq!(data[1].label, "Pixel 9");
                assert!((data[1].value - 24.5).abs() < f64::EPSILON);
            }
            other => panic!("Expected bar chart, got {other:?}"),
        }
    }

    #[test]
    fn extracts_table() {
        let text = r#"<UI_COMPONENT>{"type":"table","title":"Specs","data":{"headers":["Phone","mAh"],"rows":[["iPhone 16",3561],["Pixel 9","4700"]]}}</UI_COMPONENT>"#;
        let component = UiComponent::extract(text).unwrap();
        assert_eq!(component.title(), "Specs");
        match component {
            UiComponent::Table { data, .. } => {
                assert_eq!(data.headers, vec!["Phone", "mAh"]);
                assert_eq!(data.rows.len(), 2);
                assert_eq!(data.rows[0][1], serde_json::json!(3561));
            }
            other => panic!("Expected table, got {other:?}"),
        }
    }

    #[test]
    fn tolerates_code_fence() {
        let text = "<UI_COMPONENT>```json\n{\"type\":\"bar_chart\",\"title\":\"t\",\"data\":[]}\n```</UI_COMPONENT>";
        assert!(UiComponent::extract(text).is_some());
    }

    #[test]
    fn no_block_yields_none() {
        assert!(UiComponent::extract("plain answer").is_none());
    }

    #[test]
    fn unterminated_block_yields_none() {
        assert!(UiComponent::raw_block("<UI_COMPONENT>{\"type\":").is_none());
    }

    #[test]
    fn malformed_json_yields_none_but_raw_block_is_kept() {
        let text = "<UI_COMPONENT>{ not json }</UI_COMPONENT>";
        assert_eq!(UiComponent::raw_block(text), Some("{ not json }"));
        assert!(UiComponent::extract(text).is_none());
    }

    #[test]
    fn unknown_component_type_yields_none() {
        let text = r#"<UI_COMPONENT>{"type":"pie_chart","title":"x","data":[]}</UI_COMPONENT>"#;
        assert!(UiComponent::extract(text).is_none());
    }
}
