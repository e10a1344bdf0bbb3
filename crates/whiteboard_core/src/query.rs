use serde::{Deserialize, Serialize};

use crate::element::{Element, ElementKind, WhiteboardData};
use crate::store::WhiteboardStore;

/// Element counts by kind plus the total number of stored edges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhiteboardStats {
    pub total_elements: usize,
    pub sticky_notes: usize,
    pub flow_nodes: usize,
    pub mermaid_diagrams: usize,
    pub embedded_links: usize,
    /// Includes dangling edges.
    pub connections: usize,
}

impl WhiteboardStats {
    pub fn count(&self, kind: ElementKind) -> usize {
        match kind {
            ElementKind::Sticky => self.sticky_notes,
            ElementKind::FlowNode => self.flow_nodes,
            ElementKind::Mermaid => self.mermaid_diagrams,
            ElementKind::Embed => self.embedded_links,
        }
    }
}

impl WhiteboardData {
    pub fn elements_by_type(&self, kind: ElementKind) -> Vec<Element> {
        self.elements
            .iter()
            .filter(|e| e.kind() == Some(kind))
            .cloned()
            .collect()
    }

    /// Case-insensitive substring search over each element's primary text.
    /// Extra fields are not searched, and elements of an unrecognized kind
    /// never match.
    pub fn search(&self, query: &str) -> Vec<Element> {
        let needle = query.to_lowercase();
        self.elements
            .iter()
            .filter(|e| {
                e.searchable_text()
                    .is_some_and(|text| text.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect()
    }

    pub fn stats(&self) -> WhiteboardStats {
        let mut stats = WhiteboardStats {
            total_elements: self.elements.len(),
            ..Default::default()
        };
        for element in &self.elements {
            match element {
                Element::Sticky(_) => stats.sticky_notes += 1,
                Element::FlowNode(node) => {
                    stats.flow_nodes += 1;
                    stats.connections += node.connections.len();
                }
                Element::Mermaid(_) => stats.mermaid_diagrams += 1,
                Element::Embed(_) => stats.embedded_links += 1,
                Element::Other(_) => {}
            }
        }
        stats
    }
}

impl WhiteboardStore {
    pub fn get_element(&self, id: &str) -> Option<Element> {
        self.data.find(id).cloned()
    }

    pub fn get_elements_by_type(&self, kind: ElementKind) -> Vec<Element> {
        self.data.elements_by_type(kind)
    }

    pub fn search_elements(&self, query: &str) -> Vec<Element> {
        self.data.search(query)
    }

    pub fn get_stats(&self) -> WhiteboardStats {
        self.data.stats()
    }
}
