use serde::{Deserialize, Serialize};

/// The Static Analysis View of a compiled decision table.
///
/// `Schematic` is the graph representation extracted from the branch
/// compiler: one node per branch, linked in the order guards are tried.
/// It is used for inspection and documentation; it is never evaluated.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Schematic {
    pub name: String,
    pub description: Option<String>,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl Schematic {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Append a node, linking it from the previous one with `edge_label`.
    pub fn push(&mut self, node: Node, edge_label: Option<&str>) {
        if let Some(prev) = self.nodes.last() {
            self.edges.push(Edge {
                from: prev.id.clone(),
                to: node.id.clone(),
                label: edge_label.map(str::to_string),
            });
        }
        self.nodes.push(node);
    }

    pub fn node(&self, label: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.label == label)
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Node {
    pub id: String,
    pub kind: NodeKind,
    pub label: String,
    /// Number of expression nodes in the branch body.
    pub body_size: usize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum NodeKind {
    Ingress,   // Approval entry
    Lifecycle, // Invocation-metadata guard
    Action,    // Named action
    Fallback,  // Reject
    Clear,     // Clear-state program
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Edge {
    pub from: String,
    pub to: String,
    pub label: Option<String>, // e.g. "Guard", "Else"
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, kind: NodeKind) -> Node {
        Node {
            id: id.into(),
            kind,
            label: id.into(),
            body_size: 1,
        }
    }

    #[test]
    fn test_push_links_consecutive_nodes() {
        let mut schematic = Schematic::new("demo");
        schematic.push(node("a", NodeKind::Ingress), None);
        schematic.push(node("b", NodeKind::Action), Some("Else"));
        assert_eq!(schematic.edges.len(), 1);
        assert_eq!(schematic.edges[0].from, "a");
        assert_eq!(schematic.edges[0].label.as_deref(), Some("Else"));
        assert!(schematic.node("b").is_some());
    }
}
