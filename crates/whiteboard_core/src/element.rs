use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::error::WhiteboardError;

/// Fields carried on an element that the schema does not know about.
///
/// They are stored as-is and written back on serialization so richer
/// external schemas survive a `set_data(get_data())` round trip.
pub type ExtraFields = Map<String, Value>;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// The kind of element that can be placed on a whiteboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementKind {
    #[serde(rename = "sticky")]
    Sticky,
    #[serde(rename = "flow-node")]
    FlowNode,
    #[serde(rename = "mermaid", alias = "diagram")]
    Mermaid,
    #[serde(rename = "embed")]
    Embed,
}

impl ElementKind {
    /// Wire tag used in the `type` field.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sticky => "sticky",
            Self::FlowNode => "flow-node",
            Self::Mermaid => "mermaid",
            Self::Embed => "embed",
        }
    }

    /// All variants in definition order.
    pub fn all() -> [Self; 4] {
        [Self::Sticky, Self::FlowNode, Self::Mermaid, Self::Embed]
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ElementKind {
    type Err = WhiteboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sticky" => Ok(Self::Sticky),
            "flow-node" => Ok(Self::FlowNode),
            "mermaid" | "diagram" => Ok(Self::Mermaid),
            "embed" => Ok(Self::Embed),
            other => Err(WhiteboardError::Structural(format!(
                "unknown element type: {other}"
            ))),
        }
    }
}

/// Sticky note background color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StickyColor {
    #[default]
    Yellow,
    Pink,
    Blue,
    Green,
    Purple,
    Orange,
}

impl StickyColor {
    pub fn all() -> [Self; 6] {
        [
            Self::Yellow,
            Self::Pink,
            Self::Blue,
            Self::Green,
            Self::Purple,
            Self::Orange,
        ]
    }
}

/// Outline drawn for a flow node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowShape {
    #[default]
    Rectangle,
    Diamond,
    Circle,
    Ellipse,
}

impl FlowShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rectangle => "rectangle",
            Self::Diamond => "diamond",
            Self::Circle => "circle",
            Self::Ellipse => "ellipse",
        }
    }
}

/// How an embedded link is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbedType {
    #[default]
    Iframe,
    Video,
}

// ---------------------------------------------------------------------------
// Element payloads
// ---------------------------------------------------------------------------

/// A freeform note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StickyNote {
    #[serde(default)]
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub text: String,
    #[serde(default)]
    pub color: StickyColor,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// A flow-chart node. The only kind that may originate connections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowNode {
    #[serde(default)]
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub label: String,
    #[serde(default)]
    pub shape: FlowShape,
    /// Target element ids, in insertion order, without duplicates.
    #[serde(default)]
    pub connections: Vec<String>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl FlowNode {
    /// Appends an edge to `target`. Returns `false` if it already exists.
    pub fn add_connection(&mut self, target: &str) -> bool {
        if self.is_connected_to(target) {
            return false;
        }
        self.connections.push(target.to_string());
        true
    }

    /// Removes every edge to `target`. Returns whether anything was removed.
    pub fn remove_connection(&mut self, target: &str) -> bool {
        let before = self.connections.len();
        self.connections.retain(|c| c != target);
        self.connections.len() < before
    }

    pub fn is_connected_to(&self, target: &str) -> bool {
        self.connections.iter().any(|c| c == target)
    }

    /// Drops repeated targets, keeping the first occurrence of each.
    pub(crate) fn dedup_connections(&mut self) {
        let mut seen = std::collections::HashSet::new();
        self.connections.retain(|c| seen.insert(c.clone()));
    }
}

/// A diagram whose markup is opaque to the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MermaidDiagram {
    #[serde(default)]
    pub id: String,
    pub x: f64,
    pub y: f64,
    #[serde(alias = "sourceCode")]
    pub mermaid_code: String,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// A reference to an external resource shown inline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddedLink {
    #[serde(default)]
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub url: String,
    #[serde(default)]
    pub embed_type: EmbedType,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

// ---------------------------------------------------------------------------
// Element
// ---------------------------------------------------------------------------

/// A single item on the whiteboard, tagged by its `type` field.
///
/// An empty `id` means "not yet assigned"; the store fills it in on insert.
///
/// Objects whose `type` is missing or not one of the known kinds are kept
/// verbatim as [`Element::Other`]. A known `type` is parsed strictly, so a
/// sticky note without `text` is an error rather than an opaque element.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Element {
    #[serde(rename = "sticky")]
    Sticky(StickyNote),
    #[serde(rename = "flow-node")]
    FlowNode(FlowNode),
    #[serde(rename = "mermaid")]
    Mermaid(MermaidDiagram),
    #[serde(rename = "embed")]
    Embed(EmbeddedLink),
    /// An element of a kind this crate does not model, `type` included.
    #[serde(untagged)]
    Other(ExtraFields),
}

impl<'de> Deserialize<'de> for Element {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Element::from_value(value).map_err(<D::Error as serde::de::Error>::custom)
    }
}

impl Element {
    /// Parses one element object. See the type docs for how `type` is handled.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        let Value::Object(mut fields) = value else {
            return Err(serde::de::Error::custom(format!(
                "element must be an object, got {}",
                json_type_name(&value)
            )));
        };
        let kind = fields
            .get("type")
            .and_then(Value::as_str)
            .and_then(|tag| tag.parse::<ElementKind>().ok());
        let Some(kind) = kind else {
            return Ok(Self::Other(fields));
        };
        fields.remove("type");
        let payload = Value::Object(fields);
        Ok(match kind {
            ElementKind::Sticky => Self::Sticky(serde_json::from_value(payload)?),
            ElementKind::FlowNode => Self::FlowNode(serde_json::from_value(payload)?),
            ElementKind::Mermaid => Self::Mermaid(serde_json::from_value(payload)?),
            ElementKind::Embed => Self::Embed(serde_json::from_value(payload)?),
        })
    }

    pub fn sticky(x: f64, y: f64, text: impl Into<String>, color: StickyColor) -> Self {
        Self::Sticky(StickyNote {
            id: String::new(),
            x,
            y,
            text: text.into(),
            color,
            extra: ExtraFields::new(),
        })
    }

    pub fn flow_node(x: f64, y: f64, label: impl Into<String>, shape: FlowShape) -> Self {
        Self::FlowNode(FlowNode {
            id: String::new(),
            x,
            y,
            label: label.into(),
            shape,
            connections: Vec::new(),
            extra: ExtraFields::new(),
        })
    }

    pub fn mermaid(x: f64, y: f64, mermaid_code: impl Into<String>) -> Self {
        Self::Mermaid(MermaidDiagram {
            id: String::new(),
            x,
            y,
            mermaid_code: mermaid_code.into(),
            extra: ExtraFields::new(),
        })
    }

    pub fn embed(x: f64, y: f64, url: impl Into<String>, embed_type: EmbedType) -> Self {
        Self::Embed(EmbeddedLink {
            id: String::new(),
            x,
            y,
            url: url.into(),
            embed_type,
            extra: ExtraFields::new(),
        })
    }

    /// Sets the id, builder style.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.set_id(id.into());
        self
    }

    /// The element id, or `""` when none is assigned.
    pub fn id(&self) -> &str {
        match self {
            Self::Sticky(e) => &e.id,
            Self::FlowNode(e) => &e.id,
            Self::Mermaid(e) => &e.id,
            Self::Embed(e) => &e.id,
            Self::Other(fields) => fields.get("id").and_then(Value::as_str).unwrap_or(""),
        }
    }

    pub(crate) fn set_id(&mut self, id: String) {
        match self {
            Self::Sticky(e) => e.id = id,
            Self::FlowNode(e) => e.id = id,
            Self::Mermaid(e) => e.id = id,
            Self::Embed(e) => e.id = id,
            Self::Other(fields) => {
                fields.insert("id".into(), Value::String(id));
            }
        }
    }

    /// `None` for elements of an unrecognized kind.
    pub fn kind(&self) -> Option<ElementKind> {
        match self {
            Self::Sticky(_) => Some(ElementKind::Sticky),
            Self::FlowNode(_) => Some(ElementKind::FlowNode),
            Self::Mermaid(_) => Some(ElementKind::Mermaid),
            Self::Embed(_) => Some(ElementKind::Embed),
            Self::Other(_) => None,
        }
    }

    /// The `type` tag as it appears on the wire.
    pub fn type_tag(&self) -> &str {
        match self.kind() {
            Some(kind) => kind.as_str(),
            None => self.extra().get("type").and_then(Value::as_str).unwrap_or("unknown"),
        }
    }

    /// Position as an `(x, y)` pair. Opaque elements without numeric
    /// coordinates report the origin.
    pub fn position(&self) -> (f64, f64) {
        match self {
            Self::Sticky(e) => (e.x, e.y),
            Self::FlowNode(e) => (e.x, e.y),
            Self::Mermaid(e) => (e.x, e.y),
            Self::Embed(e) => (e.x, e.y),
            Self::Other(fields) => {
                let coord = |key: &str| fields.get(key).and_then(Value::as_f64).unwrap_or(0.0);
                (coord("x"), coord("y"))
            }
        }
    }

    pub(crate) fn set_position(&mut self, x: f64, y: f64) {
        let (ex, ey) = match self {
            Self::Sticky(e) => (&mut e.x, &mut e.y),
            Self::FlowNode(e) => (&mut e.x, &mut e.y),
            Self::Mermaid(e) => (&mut e.x, &mut e.y),
            Self::Embed(e) => (&mut e.x, &mut e.y),
            Self::Other(fields) => {
                fields.insert("x".into(), Value::from(x));
                fields.insert("y".into(), Value::from(y));
                return;
            }
        };
        *ex = x;
        *ey = y;
    }

    /// The kind-specific text field that search runs against. Opaque
    /// elements have none.
    pub fn searchable_text(&self) -> Option<&str> {
        match self {
            Self::Sticky(e) => Some(&e.text),
            Self::FlowNode(e) => Some(&e.label),
            Self::Mermaid(e) => Some(&e.mermaid_code),
            Self::Embed(e) => Some(&e.url),
            Self::Other(_) => None,
        }
    }

    /// Fields outside the known schema. For an opaque element this is the
    /// whole object.
    pub fn extra(&self) -> &ExtraFields {
        match self {
            Self::Sticky(e) => &e.extra,
            Self::FlowNode(e) => &e.extra,
            Self::Mermaid(e) => &e.extra,
            Self::Embed(e) => &e.extra,
            Self::Other(fields) => fields,
        }
    }

    pub fn as_flow_node(&self) -> Option<&FlowNode> {
        match self {
            Self::FlowNode(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_flow_node_mut(&mut self) -> Option<&mut FlowNode> {
        match self {
            Self::FlowNode(node) => Some(node),
            _ => None,
        }
    }
}

/// Maps an accepted input alias onto the canonical wire name for `kind`.
pub(crate) fn canonical_field(kind: Option<ElementKind>, key: &str) -> &str {
    match (kind, key) {
        (Some(ElementKind::Mermaid), "sourceCode") => "mermaidCode",
        _ => key,
    }
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// Id of the note a fresh store starts with.
pub const WELCOME_NOTE_ID: &str = "welcome-note";

/// Default text of the welcome note.
pub const WELCOME_NOTE_TEXT: &str = "Welcome! This whiteboard is now connected to MCP 🎨";

/// The full ordered collection of elements on a whiteboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WhiteboardData {
    pub elements: Vec<Element>,
}

impl WhiteboardData {
    pub fn new(elements: Vec<Element>) -> Self {
        Self { elements }
    }

    /// A document holding only the welcome sticky note.
    pub fn welcome(text: impl Into<String>, x: f64, y: f64) -> Self {
        Self::new(vec![
            Element::sticky(x, y, text, StickyColor::Yellow).with_id(WELCOME_NOTE_ID),
        ])
    }

    /// Parses an untyped payload, rejecting anything that is not
    /// `{ "elements": [ <element>, ... ] }`.
    pub fn from_value(value: Value) -> Result<Self, WhiteboardError> {
        let Value::Object(mut root) = value else {
            return Err(WhiteboardError::Structural(
                "whiteboard data must be an object".into(),
            ));
        };
        let elements = match root.remove("elements") {
            Some(Value::Array(items)) => items,
            Some(other) => {
                return Err(WhiteboardError::Structural(format!(
                    "`elements` must be an array, got {}",
                    json_type_name(&other)
                )));
            }
            None => {
                return Err(WhiteboardError::Structural(
                    "missing `elements` array".into(),
                ));
            }
        };

        let elements = elements
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                Element::from_value(item).map_err(|e| {
                    WhiteboardError::Structural(format!("invalid element at index {index}: {e}"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { elements })
    }

    /// Serializes the document to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, WhiteboardError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn find(&self, id: &str) -> Option<&Element> {
        self.elements.iter().find(|e| e.id() == id)
    }

    pub(crate) fn find_mut(&mut self, id: &str) -> Option<&mut Element> {
        self.elements.iter_mut().find(|e| e.id() == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.find(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// First non-empty id that appears more than once, if any.
    pub(crate) fn first_duplicate_id(&self) -> Option<&str> {
        let mut seen = std::collections::HashSet::new();
        self.elements
            .iter()
            .map(Element::id)
            .filter(|id| !id.is_empty())
            .find(|id| !seen.insert(*id))
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ===========================================================================
// Tests
// ===========================================================================
