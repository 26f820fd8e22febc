//! Read-only views of form controls.

use crate::dom::{self, Handle};
use serde::Serialize;

/// Tags reported by [`Form::fields`](super::Form::fields) and
/// [`Form::summary`](super::Form::summary).
pub(crate) const CONTROL_TAGS: &[&str] = &["input", "textarea", "select", "button"];

/// The state of one control at the time it was read.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct FieldSnapshot {
    pub tag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub control_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Checkbox and radio inputs only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checked: Option<bool>,
    /// Option values of a select, in document order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    /// Selected option values of a select.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub selected: Vec<String>,
}

impl FieldSnapshot {
    pub(crate) fn read(node: &Handle) -> Self {
        let tag = dom::tag_name(node).unwrap_or_default();
        let mut snapshot = FieldSnapshot {
            tag: tag.clone(),
            name: dom::attr(node, "name"),
            control_type: None,
            value: None,
            checked: None,
            options: Vec::new(),
            selected: Vec::new(),
        };

        match tag.as_str() {
            "input" => {
                let input_type = super::input_type(node);
                if input_type == "checkbox" || input_type == "radio" {
                    snapshot.checked = Some(dom::has_attr(node, "checked"));
                    snapshot.value = Some(super::choice_value(node));
                } else {
                    snapshot.value = Some(dom::attr(node, "value").unwrap_or_default());
                }
                snapshot.control_type = Some(input_type);
            }
            "textarea" => {
                snapshot.value = Some(dom::text_content(node));
            }
            "select" => {
                for option in dom::find_all(node, "option", &[]) {
                    let value = super::option_value(&option);
                    if dom::has_attr(&option, "selected") {
                        snapshot.selected.push(value.clone());
                    }
                    snapshot.options.push(value);
                }
            }
            "button" => {
                snapshot.control_type = dom::attr(node, "type");
                snapshot.value = dom::attr(node, "value");
            }
            _ => {}
        }

        snapshot
    }
}

/// One summary line per control: its tags and trimmed text.
pub(crate) fn summary_line(node: &Handle) -> String {
    let tag = dom::tag_name(node).unwrap_or_default();
    let mut line = start_tag(node);
    match tag.as_str() {
        "input" => {}
        "select" => {
            for option in dom::find_all(node, "option", &[]) {
                line.push_str(&start_tag(&option));
                line.push_str(dom::text_content(&option).trim());
                line.push_str("</option>");
            }
            line.push_str("</select>");
        }
        _ => {
            line.push_str(dom::text_content(node).trim());
            line.push_str(&format!("</{}>", tag));
        }
    }
    line
}

fn start_tag(node: &Handle) -> String {
    let mut out = format!("<{}", dom::tag_name(node).unwrap_or_default());
    for (name, value) in dom::attrs(node) {
        out.push_str(&format!(" {}=\"{}\"", name, escape_attr(&value)));
    }
    if dom::is_element(node, "input") {
        out.push_str("/>");
    } else {
        out.push('>');
    }
    out
}

fn escape_attr(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}
