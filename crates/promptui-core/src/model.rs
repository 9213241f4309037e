//! Renderer-agnostic UI description types
//!
//! A `UiDescription` is the intermediate form every interpreter produces and
//! every consumer reads. It doesn't depend on any rendering framework.
//! Component order is meaningful: when a consumer needs a single value for a
//! category, later components win.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// An ordered list of UI components
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiDescription {
    #[serde(default)]
    pub components: Vec<UiComponent>,
}

impl UiDescription {
    pub fn new(components: Vec<UiComponent>) -> Self {
        Self { components }
    }

    /// The "no change / reset" description.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }
}

/// A single UI component
///
/// `kind` is kept as the raw string so unrecognized types survive until the
/// projector drops them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiComponent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

impl UiComponent {
    pub fn new(kind: &str) -> Self {
        Self {
            kind: kind.to_string(),
            text: None,
            color: None,
            properties: BTreeMap::new(),
            action: None,
        }
    }

    pub fn background(color: &str) -> Self {
        Self::new("background").with_color(color)
    }

    pub fn title(text: &str) -> Self {
        Self::new("title").with_text(text)
    }

    pub fn button(text: &str, action: Option<&str>) -> Self {
        let button = Self::new("button").with_text(text);
        match action {
            Some(action) => button.with_action(action),
            None => button,
        }
    }

    pub fn card(title: Option<&str>, background: Option<&str>) -> Self {
        let mut card = Self::new("card");
        if let Some(title) = title {
            card = card.with_property("title", title);
        }
        if let Some(background) = background {
            card = card.with_property("backgroundColor", background);
        }
        card
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }

    pub fn with_color(mut self, color: &str) -> Self {
        self.color = Some(color.to_string());
        self
    }

    pub fn with_action(mut self, action: &str) -> Self {
        self.action = Some(action.to_string());
        self
    }

    pub fn with_property(mut self, key: &str, value: &str) -> Self {
        self.properties.insert(key.to_string(), value.to_string());
        self
    }

    /// Resolve the component type against the closed vocabulary.
    pub fn kind(&self) -> Option<ComponentKind> {
        ComponentKind::from_str(&self.kind)
    }
}

/// The component types consumers understand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    Background,
    Title,
    Card,
    Button,
}

impl ComponentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::Background => "background",
            ComponentKind::Title => "title",
            ComponentKind::Card => "card",
            ComponentKind::Button => "button",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "background" => Some(ComponentKind::Background),
            "title" => Some(ComponentKind::Title),
            "card" => Some(ComponentKind::Card),
            "button" => Some(ComponentKind::Button),
            _ => None,
        }
    }

    pub fn all() -> Vec<ComponentKind> {
        vec![
            ComponentKind::Title,
            ComponentKind::Background,
            ComponentKind::Card,
            ComponentKind::Button,
        ]
    }
}

/// Why a description object could not be read at all.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct MalformedDescription(pub String);

/// Parse `{ "components": [...] }` leniently.
///
/// A missing `components` key is an empty description; an explicit `null` is
/// malformed. Individual components that can't be read are skipped and
/// reported through `on_skip`.
pub fn parse_description(
    obj: &Map<String, Value>,
    mut on_skip: impl FnMut(&Value),
) -> Result<UiDescription, MalformedDescription> {
    let components = match obj.get("components") {
        None => return Ok(UiDescription::empty()),
        Some(Value::Array(items)) => items,
        Some(other) => {
            return Err(MalformedDescription(format!(
                "`components` must be an array, got {}",
                json_kind(other)
            )))
        }
    };

    let mut parsed = Vec::with_capacity(components.len());
    for item in components {
        match parse_component(item) {
            Some(component) => parsed.push(component),
            None => on_skip(item),
        }
    }
    Ok(UiDescription::new(parsed))
}

/// Parse one component, or `None` when it has no usable `type`.
pub fn parse_component(value: &Value) -> Option<UiComponent> {
    let obj = value.as_object()?;
    let kind = match obj.get("type") {
        Some(Value::String(kind)) if !kind.trim().is_empty() => kind.clone(),
        _ => return None,
    };

    Some(UiComponent {
        kind,
        text: scalar_field(obj, "text")?,
        color: scalar_field(obj, "color")?,
        properties: obj
            .get("properties")
            .and_then(Value::as_object)
            .map(properties_map)
            .unwrap_or_default(),
        action: scalar_field(obj, "action")?,
    })
}

// Outer None: the field holds an object/array and the component is malformed.
fn scalar_field(obj: &Map<String, Value>, key: &str) -> Option<Option<String>> {
    match obj.get(key) {
        None | Some(Value::Null) => Some(None),
        Some(Value::String(s)) => Some(Some(s.clone())),
        Some(Value::Number(n)) => Some(Some(n.to_string())),
        Some(Value::Bool(b)) => Some(Some(b.to_string())),
        Some(Value::Array(_)) | Some(Value::Object(_)) => None,
    }
}

fn properties_map(obj: &Map<String, Value>) -> BTreeMap<String, String> {
    obj.iter()
        .filter_map(|(key, value)| {
            let value = match value {
                Value::Null => return None,
                Value::String(s) => s.clone(),
                // nested structures are flattened to compact JSON text
                other => other.to_string(),
            };
            Some((key.clone(), value))
        })
        .collect()
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
