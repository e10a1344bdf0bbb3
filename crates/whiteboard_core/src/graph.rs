//! Directed connections between flow nodes.
//!
//! Edges live on the source node's `connections` list. Any element may be a
//! target. Once the target is removed the edge is "dangling" and stays until
//! something strips it.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::element::{Element, WhiteboardData};
use crate::store::WhiteboardStore;

/// A directed edge `from -> to`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub from: String,
    pub to: String,
}

impl WhiteboardData {
    /// Every edge in document order.
    pub fn edges(&self) -> Vec<Edge> {
        self.elements
            .iter()
            .filter_map(Element::as_flow_node)
            .flat_map(|node| {
                node.connections.iter().map(|to| Edge {
                    from: node.id.clone(),
                    to: to.clone(),
                })
            })
            .collect()
    }

    /// Edges whose target exists. These are the ones a renderer can draw.
    pub fn resolved_edges(&self) -> Vec<Edge> {
        self.edges()
            .into_iter()
            .filter(|edge| self.contains(&edge.to))
            .collect()
    }

    /// Edges whose target is gone.
    pub fn dangling_edges(&self) -> Vec<Edge> {
        self.edges()
            .into_iter()
            .filter(|edge| !self.contains(&edge.to))
            .collect()
    }
}

impl WhiteboardStore {
    /// Adds `to` to the connections of flow node `from`.
    ///
    /// Returns `false` without touching state when `from` is not a flow node,
    /// `to` does not exist, or the edge is already present.
    pub fn connect(&mut self, from: &str, to: &str) -> bool {
        if !self.data.contains(to) {
            debug!("Connect skipped, no element {to}");
            return false;
        }
        let Some(node) = self.data.find_mut(from).and_then(Element::as_flow_node_mut) else {
            debug!("Connect skipped, no flow node {from}");
            return false;
        };
        if !node.add_connection(to) {
            return false;
        }
        debug!("Connected {from} -> {to}");
        self.commit();
        true
    }

    /// Removes `to` from the connections of flow node `from`.
    ///
    /// Returns `true` only when an edge was actually removed.
    pub fn disconnect(&mut self, from: &str, to: &str) -> bool {
        let removed = self
            .data
            .find_mut(from)
            .and_then(Element::as_flow_node_mut)
            .is_some_and(|node| node.remove_connection(to));
        if removed {
            debug!("Disconnected {from} -> {to}");
            self.commit();
        }
        removed
    }

    /// Strips every dangling edge in one commit. Returns how many went.
    pub fn prune_dangling_edges(&mut self) -> usize {
        let dangling = self.data.dangling_edges();
        if dangling.is_empty() {
            return 0;
        }
        for edge in &dangling {
            if let Some(node) = self
                .data
                .find_mut(&edge.from)
                .and_then(Element::as_flow_node_mut)
            {
                node.remove_connection(&edge.to);
            }
        }
        debug!("Pruned {} dangling edges", dangling.len());
        self.commit();
        dangling.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{FlowShape, StickyColor};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn store_with_nodes() -> (WhiteboardStore, String, String) {
        let mut store = WhiteboardStore::with_data(WhiteboardData::default());
        let a = store.create_flow_node(0.0, 0.0, "Start", FlowShape::Circle);
        let b = store.create_flow_node(200.0, 0.0, "End", FlowShape::Circle);
        (store, a.id().to_string(), b.id().to_string())
    }

    #[test]
    fn connect_adds_edge_once() {
        let (mut store, a, b) = store_with_nodes();
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let _sub = store.subscribe(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        assert!(store.connect(&a, &b));
        assert!(!store.connect(&a, &b));
        assert_eq!(store.get_data().edges(), vec![Edge { from: a, to: b }]);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn connect_requires_flow_node_source() {
        let (mut store, _, b) = store_with_nodes();
        let note = store.create_sticky_note(0.0, 0.0, "x", StickyColor::Pink);
        assert!(!store.connect(note.id(), &b));
        assert!(!store.connect("ghost", &b));
        assert!(store.get_data().edges().is_empty());
    }

    #[test]
    fn connect_requires_existing_target() {
        let (mut store, a, _) = store_with_nodes();
        assert!(!store.connect(&a, "nowhere"));
        assert!(store.get_data().edges().is_empty());
    }

    #[test]
    fn any_element_can_be_a_target() {
        let (mut store, a, _) = store_with_nodes();
        let note = store.create_sticky_note(0.0, 0.0, "x", StickyColor::Green);
        assert!(store.connect(&a, note.id()));
        let data = store.get_data();
        assert_eq!(data.resolved_edges().len(), 1);
        assert!(data.dangling_edges().is_empty());
    }

    #[test]
    fn unknown_kind_cannot_originate_edges() {
        let (mut store, a, _) = store_with_nodes();
        let mut data = store.get_data();
        data.elements.push(
            serde_json::from_value(serde_json::json!({
                "type": "kanban", "id": "k", "x": 0, "y": 0, "connections": [a.clone()]
            }))
            .unwrap(),
        );
        store.set_data(data).unwrap();

        assert!(!store.connect("k", &a));
        assert!(store.get_data().edges().is_empty());
        assert!(store.connect(&a, "k"));
        assert_eq!(store.get_data().resolved_edges().len(), 1);
    }

    #[test]
    fn disconnect_reports_removal() {
        let (mut store, a, b) = store_with_nodes();
        store.connect(&a, &b);
        assert!(store.disconnect(&a, &b));
        assert!(!store.disconnect(&a, &b));
        assert!(!store.disconnect("ghost", &b));
    }

    #[test]
    fn remove_keeps_dangling_edges_by_default() {
        let (mut store, a, b) = store_with_nodes();
        store.connect(&a, &b);
        store.remove_element(&b);
        let data = store.get_data();
        assert_eq!(data.edges().len(), 1);
        assert_eq!(data.dangling_edges(), vec![Edge { from: a, to: b }]);
    }

    #[test]
    fn remove_cascades_when_enabled() {
        let (mut store, a, b) = store_with_nodes();
        store.set_cascade_edges_on_remove(true);
        store.connect(&a, &b);
        store.connect(&b, &a);
        store.remove_element(&b);
        assert!(store.get_data().edges().is_empty());
    }

    #[test]
    fn prune_removes_only_dangling() {
        let (mut store, a, b) = store_with_nodes();
        let c = store.create_flow_node(0.0, 100.0, "Gone", FlowShape::Ellipse);
        store.connect(&a, &b);
        store.connect(&a, c.id());
        store.connect(&b, c.id());
        store.remove_element(c.id());

        assert_eq!(store.prune_dangling_edges(), 2);
        assert_eq!(store.get_data().edges(), vec![Edge { from: a, to: b }]);
        assert_eq!(store.prune_dangling_edges(), 0);
    }

    #[test]
    fn self_loop_is_allowed() {
        let (mut store, a, _) = store_with_nodes();
        assert!(store.connect(&a, &a));
        assert_eq!(store.get_data().resolved_edges().len(), 1);
    }
}
