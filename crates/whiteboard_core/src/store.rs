use chrono::Utc;
use rand::Rng;
use serde_json::{Map, Value};
use tracing::debug;

use crate::config::WhiteboardConfig;
use crate::element::{
    EmbedType, Element, ElementKind, FlowShape, StickyColor, WELCOME_NOTE_TEXT, WhiteboardData,
    canonical_field,
};
use crate::error::WhiteboardError;
use crate::notifier::{Subscription, UpdateNotifier};

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_SUFFIX_LEN: usize = 9;

/// Generates `<kind>-<unix millis>-<random base36 suffix>`.
pub fn generate_id(kind: ElementKind) -> String {
    id_with_prefix(kind.as_str())
}

fn id_with_prefix(prefix: &str) -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..ID_SUFFIX_LEN)
        .map(|_| ID_ALPHABET[rng.random_range(0..ID_ALPHABET.len())] as char)
        .collect();
    format!("{}-{}-{}", prefix, Utc::now().timestamp_millis(), suffix)
}

/// A fresh id for an element tagged `prefix` that nothing in `data` uses.
fn unused_id(data: &WhiteboardData, prefix: &str) -> String {
    loop {
        let id = id_with_prefix(prefix);
        if !data.contains(&id) {
            return id;
        }
    }
}

// ---------------------------------------------------------------------------
// WhiteboardStore
// ---------------------------------------------------------------------------

/// Single source of truth for a whiteboard document.
///
/// All mutation goes through `&mut self` methods. Each one that changes the
/// document fires exactly one broadcast on the [`UpdateNotifier`] once the
/// change is complete. Reads hand out deep copies, never references into the
/// canonical state.
///
/// The store is not internally synchronized; see
/// [`SharedWhiteboard`](crate::shared::SharedWhiteboard) for multi-threaded
/// hosts.
#[derive(Debug)]
pub struct WhiteboardStore {
    pub(crate) data: WhiteboardData,
    notifier: UpdateNotifier,
    pub(crate) cascade_edges_on_remove: bool,
}

impl WhiteboardStore {
    /// Creates a store holding only the default welcome note.
    pub fn new() -> Self {
        Self::with_data(WhiteboardData::welcome(WELCOME_NOTE_TEXT, 100.0, 150.0))
    }

    /// Creates a store with caller-supplied initial content.
    pub fn with_data(data: WhiteboardData) -> Self {
        debug!("Created whiteboard store with {} elements", data.len());
        Self {
            data,
            notifier: UpdateNotifier::new(),
            cascade_edges_on_remove: false,
        }
    }

    /// Creates a store with the welcome note and edge policy from `config`.
    pub fn with_config(config: &WhiteboardConfig) -> Self {
        let mut store = Self::with_data(WhiteboardData::welcome(
            config.welcome_text.clone(),
            config.welcome_x,
            config.welcome_y,
        ));
        store.cascade_edges_on_remove = config.cascade_edges_on_remove;
        store
    }

    pub fn set_cascade_edges_on_remove(&mut self, enabled: bool) {
        self.cascade_edges_on_remove = enabled;
    }

    // -----------------------------------------------------------------------
    // Notification
    // -----------------------------------------------------------------------

    /// Registers a callback that receives a snapshot after every change.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&WhiteboardData) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.notifier.subscribe(callback)
    }

    pub fn notifier(&self) -> &UpdateNotifier {
        &self.notifier
    }

    /// Broadcasts the committed state.
    pub(crate) fn commit(&self) {
        let snapshot = self.data.clone();
        let delivered = self.notifier.notify(&snapshot);
        debug!(
            "Broadcast {} elements to {} subscribers",
            snapshot.len(),
            delivered
        );
    }

    // -----------------------------------------------------------------------
    // Whole-document operations
    // -----------------------------------------------------------------------

    /// Returns a deep copy of the canonical document.
    pub fn get_data(&self) -> WhiteboardData {
        self.data.clone()
    }

    /// Replaces the document wholesale. No merge with prior state.
    ///
    /// Elements without an id get a fresh one, as with [`add_element`].
    /// Fails without touching state if two elements share an id.
    ///
    /// [`add_element`]: Self::add_element
    pub fn set_data(&mut self, mut data: WhiteboardData) -> Result<(), WhiteboardError> {
        if let Some(id) = data.first_duplicate_id() {
            return Err(WhiteboardError::Structural(format!(
                "duplicate element id: {id}"
            )));
        }
        for index in 0..data.elements.len() {
            if data.elements[index].id().is_empty() {
                let id = unused_id(&data, data.elements[index].type_tag());
                debug!("Assigned id {id} to element at index {index}");
                data.elements[index].set_id(id);
            }
        }
        debug!("Replacing whiteboard with {} elements", data.len());
        self.data = data;
        self.commit();
        Ok(())
    }

    /// Replaces the document from an untyped JSON payload.
    pub fn set_data_json(&mut self, value: Value) -> Result<(), WhiteboardError> {
        let data = WhiteboardData::from_value(value)?;
        self.set_data(data)
    }

    /// Removes every element. Always notifies.
    pub fn clear_all(&mut self) {
        self.data.elements.clear();
        debug!("Cleared whiteboard");
        self.commit();
    }

    // -----------------------------------------------------------------------
    // Element CRUD
    // -----------------------------------------------------------------------

    /// Appends `element`, assigning an id when its id is empty, and returns
    /// the stored element.
    pub fn add_element(&mut self, element: Element) -> Result<Element, WhiteboardError> {
        if element.id().is_empty() {
            return Ok(self.insert_new(element));
        }
        if self.data.contains(element.id()) {
            return Err(WhiteboardError::DuplicateId(element.id().to_string()));
        }
        Ok(self.push(element))
    }

    fn insert_new(&mut self, mut element: Element) -> Element {
        let id = unused_id(&self.data, element.type_tag());
        element.set_id(id);
        self.push(element)
    }

    fn push(&mut self, mut element: Element) -> Element {
        if let Some(node) = element.as_flow_node_mut() {
            node.dedup_connections();
        }

        let (x, y) = element.position();
        debug!(
            "Added {} element {} at ({}, {})",
            element.type_tag(),
            element.id(),
            x,
            y
        );
        self.data.elements.push(element.clone());
        self.commit();
        element
    }

    pub fn create_sticky_note(
        &mut self,
        x: f64,
        y: f64,
        text: &str,
        color: StickyColor,
    ) -> Element {
        self.insert_new(Element::sticky(x, y, text, color))
    }

    pub fn create_flow_node(&mut self, x: f64, y: f64, label: &str, shape: FlowShape) -> Element {
        self.insert_new(Element::flow_node(x, y, label, shape))
    }

    pub fn create_mermaid_diagram(&mut self, x: f64, y: f64, mermaid_code: &str) -> Element {
        self.insert_new(Element::mermaid(x, y, mermaid_code))
    }

    pub fn create_embedded_link(
        &mut self,
        x: f64,
        y: f64,
        url: &str,
        embed_type: EmbedType,
    ) -> Element {
        self.insert_new(Element::embed(x, y, url, embed_type))
    }

    /// Shallow-merges `patch` into the element with `id`.
    ///
    /// `id` and `type` in the patch are ignored, so an element keeps both its
    /// identity and its kind. Keys the kind does not define are kept inertly
    /// alongside the element. Returns `Ok(None)` when nothing has `id`.
    pub fn update_element(
        &mut self,
        id: &str,
        patch: &Map<String, Value>,
    ) -> Result<Option<Element>, WhiteboardError> {
        let Some(index) = self.data.elements.iter().position(|e| e.id() == id) else {
            debug!("Update skipped, element not found: {id}");
            return Ok(None);
        };

        let current = &self.data.elements[index];
        let kind = current.kind();
        let Value::Object(mut fields) = serde_json::to_value(current)? else {
            return Err(WhiteboardError::InvalidPatch {
                id: id.to_string(),
                reason: "element did not serialize to an object".into(),
            });
        };

        for (key, value) in patch {
            if key == "id" || key == "type" {
                continue;
            }
            fields.insert(canonical_field(kind, key).to_string(), value.clone());
        }

        let mut updated = Element::from_value(Value::Object(fields)).map_err(|e| {
            WhiteboardError::InvalidPatch {
                id: id.to_string(),
                reason: e.to_string(),
            }
        })?;
        if let Some(node) = updated.as_flow_node_mut() {
            node.dedup_connections();
        }

        self.data.elements[index] = updated.clone();
        debug!("Updated element {id}");
        self.commit();
        Ok(Some(updated))
    }

    /// Moves an element. Returns `None` when nothing has `id`.
    pub fn move_element(&mut self, id: &str, x: f64, y: f64) -> Option<Element> {
        let element = self.data.find_mut(id)?;
        element.set_position(x, y);
        let moved = element.clone();
        debug!("Moved element {id} to ({x}, {y})");
        self.commit();
        Some(moved)
    }

    /// Removes an element by id. Returns whether anything was removed.
    ///
    /// Edges pointing at the removed element are left in place unless the
    /// store was configured to cascade.
    pub fn remove_element(&mut self, id: &str) -> bool {
        let before = self.data.len();
        self.data.elements.retain(|e| e.id() != id);
        if self.data.len() == before {
            return false;
        }

        if self.cascade_edges_on_remove {
            let stripped = self
                .data
                .elements
                .iter_mut()
                .filter_map(Element::as_flow_node_mut)
                .map(|node| node.remove_connection(id))
                .filter(|removed| *removed)
                .count();
            debug!("Removed element {id} and its edges from {stripped} nodes");
        } else {
            debug!("Removed element {id}");
        }

        self.commit();
        true
    }
}

impl Default for WhiteboardStore {
    fn default() -> Self {
        Self::new()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
