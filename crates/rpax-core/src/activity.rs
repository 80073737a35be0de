use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Which branch of a container an activity lives under (4.C4,
/// "Container-branch attribution").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerBranch {
    Then,
    Else,
    Catch,
    Finally,
    Body,
    Default,
    Cases,
    Activities,
    Triggers,
    Actions,
}

impl ContainerBranch {
    pub fn from_wrapper_local_name(name: &str) -> Option<Self> {
        match name {
            "Then" => Some(Self::Then),
            "Else" => Some(Self::Else),
            "Catch" => Some(Self::Catch),
            "Finally" => Some(Self::Finally),
            "Body" => Some(Self::Body),
            "Default" => Some(Self::Default),
            "Cases" => Some(Self::Cases),
            "Activities" => Some(Self::Activities),
            "Triggers" => Some(Self::Triggers),
            "Actions" => Some(Self::Actions),
            _ => None,
        }
    }
}

/// A single node in a workflow's activity tree (4.C4). Only visual
/// activities are materialized as nodes; structural elements are traversed
/// but never emitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityNode {
    pub node_id: String,
    pub activity_type: String,
    pub display_name: Option<String>,
    pub annotation: Option<String>,
    pub depth: u32,
    pub parent_node_id: Option<String>,
    #[serde(default)]
    pub child_node_ids: Vec<String>,
    pub visible: bool,
    #[serde(default)]
    pub properties: HashMap<String, String>,
    #[serde(default)]
    pub is_expression: HashMap<String, bool>,
    pub invocation_target: Option<String>,
    #[serde(default)]
    pub selectors: HashMap<String, String>,
    #[serde(default)]
    pub referenced_variables: HashSet<String>,
    pub container_branch: Option<ContainerBranch>,
    pub xpath_location: String,
    /// First 8 hex characters of the SHA-256 over this node's own
    /// content (activity type, sorted properties, container branch) — the
    /// per-element hash half of the activity composite identifier (4.C6,
    /// §9 open question on hash serialization). Combined with a project
    /// slug and workflow ID via [`crate::identity::activity_composite_id`].
    #[serde(default)]
    pub content_hash8: String,
}

impl ActivityNode {
    /// `true` when this property's value has been flagged by the
    /// expression-detection heuristic (4.C4, testable property 10).
    pub fn property_is_expression(&self, property: &str) -> bool {
        self.is_expression.get(property).copied().unwrap_or(false)
    }

    /// Globally-unique composite identifier for this node within `project_slug`/`workflow_id`.
    pub fn composite_id(&self, project_slug: &str, workflow_id: &str) -> String {
        crate::identity::activity_composite_id(project_slug, workflow_id, &self.node_id, &self.content_hash8)
    }
}

/// The full activity tree extracted for one workflow. Node IDs are
/// required to be unique within the tree (testable property 4).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ActivityTree {
    pub root_node_id: Option<String>,
    pub nodes: Vec<ActivityNode>,
}

impl ActivityTree {
    pub fn node(&self, node_id: &str) -> Option<&ActivityNode> {
        self.nodes.iter().find(|n| n.node_id == node_id)
    }

    /// Depth-first pre-order traversal starting at the root.
    pub fn iter_preorder(&self) -> Vec<&ActivityNode> {
        let Some(root_id) = &self.root_node_id else {
            return Vec::new();
        };
        let mut out = Vec::with_capacity(self.nodes.len());
        self.visit(root_id, &mut out);
        out
    }

    fn visit<'a>(&'a self, node_id: &str, out: &mut Vec<&'a ActivityNode>) {
        let Some(node) = self.node(node_id) else {
            return;
        };
        out.push(node);
        for child in &node.child_node_ids {
            self.visit(child, out);
        }
    }

    /// Invariant 4 helper: every node-ID appears exactly once.
    pub fn has_unique_node_ids(&self) -> bool {
        let mut seen = HashSet::with_capacity(self.nodes.len());
        self.nodes.iter().all(|n| seen.insert(n.node_id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Location;

    fn node(id: &str, parent: Option<&str>, children: &[&str]) -> ActivityNode {
        ActivityNode {
            node_id: id.to_string(),
            activity_type: "Sequence".to_string(),
            display_name: Some(id.to_string()),
            annotation: None,
            depth: 0,
            parent_node_id: parent.map(|s| s.to_string()),
            child_node_ids: children.iter().map(|s| s.to_string()).collect(),
            visible: true,
            properties: HashMap::new(),
            is_expression: HashMap::new(),
            invocation_target: None,
            selectors: HashMap::new(),
            referenced_variables: HashSet::new(),
            container_branch: None,
            xpath_location: format!("/{id}"),
            content_hash8: "deadbeef".to_string(),
        }
    }

    #[test]
    fn preorder_visits_root_then_children() {
        let _ = Location {
            file_path: "x".into(),
            line: 0,
            column: 0,
            end_line: None,
            end_column: None,
        };
        let tree = ActivityTree {
            root_node_id: Some("Sequence".to_string()),
            nodes: vec![
                node("Sequence", None, &["If"]),
                node("If", Some("Sequence"), &[]),
            ],
        };
        let order: Vec<_> = tree.iter_preorder().iter().map(|n| n.node_id.clone()).collect();
        assert_eq!(order, vec!["Sequence".to_string(), "If".to_string()]);
    }

    #[test]
    fn detects_duplicate_node_ids() {
        let tree = ActivityTree {
            root_node_id: Some("Sequence".to_string()),
            nodes: vec![node("Sequence", None, &[]), node("Sequence", None, &[])],
        };
        assert!(!tree.has_unique_node_ids());
    }

    #[test]
    fn composite_id_embeds_project_workflow_node_and_content_hash() {
        let n = node("Sequence", None, &[]);
        let id = n.composite_id("demo-abc123abcd", "Main");
        assert_eq!(id, "demo-abc123abcd#Main#Sequence#deadbeef");
    }
}
