use crate::activity::ActivityTree;
use crate::project::{Argument, VariableDecl};
use crate::types::WorkflowKind;
use serde::{Deserialize, Serialize};

/// One discovered and (if possible) parsed workflow file.
///
/// Produced by C3/C4, immutable thereafter (lifecycle, spec.md §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    pub file_path: String,
    pub relative_path: String,
    pub display_name: String,
    pub description: Option<String>,
    pub annotation: Option<String>,
    pub file_size: u64,
    pub last_modified: chrono::DateTime<chrono::Utc>,
    pub content_hash: String,
    pub short_hash: String,
    pub project_slug: String,
    pub workflow_id: String,
    pub composite_id: String,
    pub kind: WorkflowKind,
    pub parse_successful: bool,
    #[serde(default)]
    pub parse_errors: Vec<String>,
    pub discovered_at: chrono::DateTime<chrono::Utc>,

    #[serde(default)]
    pub arguments: Vec<Argument>,
    #[serde(default)]
    pub variables: Vec<VariableDecl>,
    #[serde(default)]
    pub namespaces: std::collections::HashMap<String, String>,
    #[serde(default)]
    pub packages_used: Vec<String>,
    #[serde(default)]
    pub activity_tree: ActivityTree,
}

impl Workflow {
    /// Short composite identifier for this workflow (4.C6).
    pub fn short_composite_id(&self) -> String {
        self.composite_id.clone()
    }
}

/// Index of all workflows discovered for one project (part of
/// `workflows.index.json`, C10).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WorkflowIndex {
    pub project_slug: String,
    pub total_workflows: usize,
    pub successful_parses: usize,
    pub failed_parses: usize,
    pub workflows: Vec<Workflow>,
    #[serde(default)]
    pub excluded_files: Vec<String>,
}

impl WorkflowIndex {
    /// Sort workflows by workflow-ID, the ordering invariant required by
    /// C10 for deterministic output.
    pub fn sorted(mut self) -> Self {
        self.workflows.sort_by(|a, b| a.workflow_id.cmp(&b.workflow_id));
        self
    }

    pub fn find_by_id(&self, workflow_id: &str) -> Option<&Workflow> {
        self.workflows.iter().find(|w| w.workflow_id == workflow_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wf(id: &str) -> Workflow {
        Workflow {
            file_path: format!("/proj/{id}.xaml"),
            relative_path: format!("{id}.xaml"),
            display_name: id.to_string(),
            description: None,
            annotation: None,
            file_size: 10,
            last_modified: chrono::Utc::now(),
            content_hash: "abc".into(),
            short_hash: "abc".into(),
            project_slug: "proj-abc".into(),
            workflow_id: id.to_string(),
            composite_id: format!("proj-abc#{id}#abc"),
            kind: WorkflowKind::Xaml,
            parse_successful: true,
            parse_errors: vec![],
            discovered_at: chrono::Utc::now(),
            arguments: vec![],
            variables: vec![],
            namespaces: Default::default(),
            packages_used: vec![],
            activity_tree: ActivityTree::default(),
        }
    }

    #[test]
    fn sorted_orders_by_workflow_id() {
        let idx = WorkflowIndex {
            project_slug: "proj-abc".into(),
            total_workflows: 2,
            successful_parses: 2,
            failed_parses: 0,
            workflows: vec![wf("Zebra"), wf("Alpha")],
            excluded_files: vec![],
        }
        .sorted();
        assert_eq!(idx.workflows[0].workflow_id, "Alpha");
        assert_eq!(idx.workflows[1].workflow_id, "Zebra");
    }
}
