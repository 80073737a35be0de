use crate::types::{CycleClassification, InvocationKind};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallGraphDependency {
    pub source_workflow_id: String,
    pub target_workflow_id: Option<String>,
    pub target_path: String,
    pub invocation_kind: InvocationKind,
    #[serde(default)]
    pub call_sites: Vec<String>,
    #[serde(default)]
    pub arguments: std::collections::HashMap<String, String>,
}

impl CallGraphDependency {
    /// Invariant: every `static` dependency has a resolved target id;
    /// every non-static dependency has none (spec.md §3 invariant).
    pub fn is_consistent(&self) -> bool {
        match self.invocation_kind {
            InvocationKind::Static => self.target_workflow_id.is_some(),
            InvocationKind::Dynamic | InvocationKind::Missing | InvocationKind::Coded => {
                self.target_workflow_id.is_none()
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallGraphNode {
    pub workflow_composite_id: String,
    pub workflow_id: String,
    pub display_name: String,
    pub relative_path: String,
    pub is_entry_point: bool,
    pub call_depth: i64,
    #[serde(default)]
    pub dependencies: Vec<CallGraphDependency>,
    #[serde(default)]
    pub dependents: HashSet<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleRecord {
    pub cycle_id: String,
    pub workflow_ids: Vec<String>,
    pub classification: CycleClassification,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CallGraphMetrics {
    pub total_workflows: usize,
    pub total_dependencies: usize,
    pub entry_points: usize,
    pub orphaned_workflows: usize,
    pub max_depth: i64,
    pub cycles_detected: usize,
    pub static_invocations: usize,
    pub dynamic_invocations: usize,
    pub missing_invocations: usize,
    pub coded_invocations: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallGraph {
    pub project_slug: String,
    pub nodes: Vec<CallGraphNode>,
    pub cycles: Vec<CycleRecord>,
    pub metrics: CallGraphMetrics,
}

impl CallGraph {
    pub fn node(&self, workflow_id: &str) -> Option<&CallGraphNode> {
        self.nodes.iter().find(|n| n.workflow_id == workflow_id)
    }

    /// Sort nodes, their dependencies, and cycles per the C10 ordering
    /// invariant so that serialized output is deterministic.
    pub fn sorted(mut self) -> Self {
        self.nodes.sort_by(|a, b| a.workflow_id.cmp(&b.workflow_id));
        for node in &mut self.nodes {
            node.dependencies.sort_by(|a, b| {
                let a_key = a.target_workflow_id.as_deref().unwrap_or(&a.target_path);
                let b_key = b.target_workflow_id.as_deref().unwrap_or(&b.target_path);
                a_key
                    .cmp(b_key)
                    .then_with(|| a.call_sites.cmp(&b.call_sites))
            });
        }
        self.cycles.sort_by(|a, b| a.workflow_ids.cmp(&b.workflow_ids));
        self
    }
}
