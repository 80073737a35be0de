//! Invocation resolution: match each `InvokeWorkflowFile` activity's raw
//! `WorkflowFileName` value against the discovered workflow index and
//! classify it static/dynamic/missing/coded.

use crate::xaml::is_expression_value;
use rpax_core::activity::ActivityTree;
use rpax_core::callgraph::CallGraphDependency;
use rpax_core::diagnostics::{DiagnosticContext, DiagnosticsCollector, Severity};
use rpax_core::paths;
use rpax_core::types::InvocationKind;
use rpax_core::workflow::WorkflowIndex;
use std::collections::HashMap;

/// Resolve every invocation found in `tree` against `index`, recording
/// call-site node-IDs and a tie-break diagnostic when a basename match is
/// ambiguous.
pub fn resolve_invocations(
    source_workflow_id: &str,
    tree: &ActivityTree,
    index: &WorkflowIndex,
    diagnostics: &DiagnosticsCollector,
) -> Vec<CallGraphDependency> {
    // Group call sites by raw target so multiple call sites to the same
    // target collapse into one dependency record, per 4.C7.
    let mut by_target: HashMap<String, Vec<String>> = HashMap::new();
    for node in &tree.nodes {
        if let Some(target) = &node.invocation_target {
            by_target.entry(target.clone()).or_default().push(node.node_id.clone());
        }
    }

    let mut deps = Vec::with_capacity(by_target.len());
    for (raw_target, mut call_sites) in by_target {
        call_sites.sort();
        if is_expression_value(&raw_target) {
            deps.push(CallGraphDependency {
                source_workflow_id: source_workflow_id.to_string(),
                target_workflow_id: None,
                target_path: raw_target,
                invocation_kind: InvocationKind::Dynamic,
                call_sites,
                arguments: HashMap::new(),
            });
            continue;
        }

        if raw_target.to_lowercase().ends_with(".cs") {
            deps.push(CallGraphDependency {
                source_workflow_id: source_workflow_id.to_string(),
                target_workflow_id: None,
                target_path: raw_target,
                invocation_kind: InvocationKind::Coded,
                call_sites,
                arguments: HashMap::new(),
            });
            continue;
        }

        let resolved = resolve_static_target(&raw_target, index, source_workflow_id, diagnostics);
        match resolved {
            Some(workflow_id) => deps.push(CallGraphDependency {
                source_workflow_id: source_workflow_id.to_string(),
                target_workflow_id: Some(workflow_id),
                target_path: raw_target,
                invocation_kind: InvocationKind::Static,
                call_sites,
                arguments: HashMap::new(),
            }),
            None => deps.push(CallGraphDependency {
                source_workflow_id: source_workflow_id.to_string(),
                target_workflow_id: None,
                target_path: raw_target,
                invocation_kind: InvocationKind::Missing,
                call_sites,
                arguments: HashMap::new(),
            }),
        }
    }

    deps.sort_by(|a, b| {
        let a_key = a.target_workflow_id.as_deref().unwrap_or(&a.target_path);
        let b_key = b.target_workflow_id.as_deref().unwrap_or(&b.target_path);
        a_key.cmp(b_key)
    });
    deps
}

fn resolve_static_target(
    raw_target: &str,
    index: &WorkflowIndex,
    source_workflow_id: &str,
    diagnostics: &DiagnosticsCollector,
) -> Option<String> {
    let normalized_target = paths::normalize_workflow_id(raw_target);

    if let Some(exact) = index
        .workflows
        .iter()
        .find(|w| paths::normalize_workflow_id(&w.relative_path).eq_ignore_ascii_case(&normalized_target))
    {
        return Some(exact.workflow_id.clone());
    }

    let target_basename = paths::basename(&normalized_target).to_lowercase();
    let mut candidates: Vec<_> = index
        .workflows
        .iter()
        .filter(|w| {
            paths::basename(&paths::normalize_workflow_id(&w.relative_path)).to_lowercase() == target_basename
        })
        .collect();

    if candidates.is_empty() {
        return None;
    }
    if candidates.len() == 1 {
        return Some(candidates[0].workflow_id.clone());
    }

    candidates.sort_by(|a, b| {
        a.relative_path
            .len()
            .cmp(&b.relative_path.len())
            .then_with(|| a.relative_path.cmp(&b.relative_path))
    });
    diagnostics.record(
        Severity::Warning,
        "invocation-ambiguous-basename",
        format!(
            "invocation target '{raw_target}' matched {} workflows by basename; picked '{}'",
            candidates.len(),
            candidates[0].relative_path
        ),
        DiagnosticContext {
            operation: "resolve_invocations".to_string(),
            component: "rpax-parser".to_string(),
            project_slug: None,
            workflow_path: Some(source_workflow_id.to_string()),
        },
    );
    Some(candidates[0].workflow_id.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rpax_core::activity::ActivityNode;
    use std::collections::{HashMap as Map, HashSet};

    fn node(target: &str) -> ActivityNode {
        ActivityNode {
            node_id: "/Sequence/InvokeWorkflowFile".to_string(),
            activity_type: "InvokeWorkflowFile".to_string(),
            display_name: Some("Call".to_string()),
            annotation: None,
            depth: 1,
            parent_node_id: Some("/Sequence".to_string()),
            child_node_ids: vec![],
            visible: true,
            properties: Map::new(),
            is_expression: Map::new(),
            invocation_target: Some(target.to_string()),
            selectors: Map::new(),
            referenced_variables: HashSet::new(),
            container_branch: None,
            xpath_location: "/Sequence/InvokeWorkflowFile".to_string(),
            content_hash8: "deadbeef".to_string(),
        }
    }

    fn index_with(paths: &[(&str, &str)]) -> WorkflowIndex {
        use rpax_core::activity::ActivityTree;
        use rpax_core::types::WorkflowKind;
        use rpax_core::workflow::Workflow;

        let workflows = paths
            .iter()
            .map(|(id, rel)| Workflow {
                file_path: format!("/proj/{rel}"),
                relative_path: rel.to_string(),
                display_name: id.to_string(),
                description: None,
                annotation: None,
                file_size: 1,
                last_modified: chrono::Utc::now(),
                content_hash: "h".into(),
                short_hash: "h".into(),
                project_slug: "proj-h".into(),
                workflow_id: id.to_string(),
                composite_id: format!("proj-h#{id}#h"),
                kind: WorkflowKind::Xaml,
                parse_successful: true,
                parse_errors: vec![],
                discovered_at: chrono::Utc::now(),
                arguments: vec![],
                variables: vec![],
                namespaces: Default::default(),
                packages_used: vec![],
                activity_tree: ActivityTree::default(),
            })
            .collect();
        WorkflowIndex {
            project_slug: "proj-h".into(),
            total_workflows: paths.len(),
            successful_parses: paths.len(),
            failed_parses: 0,
            workflows,
            excluded_files: vec![],
        }
    }

    #[test]
    fn resolves_exact_relative_path_match() {
        let index = index_with(&[("Sub/Helper", "Sub/Helper.xaml"), ("Main", "Main.xaml")]);
        let tree = ActivityTree {
            root_node_id: Some("/Sequence/InvokeWorkflowFile".to_string()),
            nodes: vec![node("Sub\\Helper.xaml")],
        };
        let diags = DiagnosticsCollector::new("run-1".into());
        let deps = resolve_invocations("Main", &tree, &index, &diags);
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].invocation_kind, InvocationKind::Static);
        assert_eq!(deps[0].target_workflow_id.as_deref(), Some("Sub/Helper"));
        assert!(deps[0].is_consistent());
    }

    #[test]
    fn missing_target_is_flagged() {
        let index = index_with(&[("Main", "Main.xaml")]);
        let tree = ActivityTree {
            root_node_id: Some("/Sequence/InvokeWorkflowFile".to_string()),
            nodes: vec![node("Nope.xaml")],
        };
        let diags = DiagnosticsCollector::new("run-1".into());
        let deps = resolve_invocations("Main", &tree, &index, &diags);
        assert_eq!(deps[0].invocation_kind, InvocationKind::Missing);
        assert!(deps[0].target_workflow_id.is_none());
    }

    #[test]
    fn ambiguous_basename_records_diagnostic_and_picks_shortest() {
        let index = index_with(&[("A/Helper", "A/Helper.xaml"), ("B/Helper", "B/Helper.xaml")]);
        let tree = ActivityTree {
            root_node_id: Some("/Sequence/InvokeWorkflowFile".to_string()),
            nodes: vec![node("Helper.xaml")],
        };
        let diags = DiagnosticsCollector::new("run-1".into());
        let deps = resolve_invocations("Main", &tree, &index, &diags);
        assert_eq!(deps[0].invocation_kind, InvocationKind::Static);
        assert_eq!(deps[0].target_workflow_id.as_deref(), Some("A/Helper"));
        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn coded_target_is_classified_not_missing() {
        let index = index_with(&[("Main", "Main.xaml")]);
        let tree = ActivityTree {
            root_node_id: Some("/Sequence/InvokeWorkflowFile".to_string()),
            nodes: vec![node("Helpers/Validate.cs")],
        };
        let diags = DiagnosticsCollector::new("run-1".into());
        let deps = resolve_invocations("Main", &tree, &index, &diags);
        assert_eq!(deps[0].invocation_kind, InvocationKind::Coded);
        assert!(deps[0].target_workflow_id.is_none());
        assert!(deps[0].is_consistent());
    }

    #[test]
    fn dynamic_expression_target_is_not_resolved() {
        let index = index_with(&[("Main", "Main.xaml")]);
        let tree = ActivityTree {
            root_node_id: Some("/Sequence/InvokeWorkflowFile".to_string()),
            nodes: vec![node("[workflowPathVar]")],
        };
        let diags = DiagnosticsCollector::new("run-1".into());
        let deps = resolve_invocations("Main", &tree, &index, &diags);
        assert_eq!(deps[0].invocation_kind, InvocationKind::Dynamic);
        assert!(deps[0].target_workflow_id.is_none());
    }
}
