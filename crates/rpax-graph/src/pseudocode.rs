//! Pseudocode generation: a flat indented rendering of one workflow's
//! activity tree, plus a recursive expander that inlines invoked
//! workflows' pseudocode up to a bounded depth with configurable cycle
//! handling.

use rpax_core::activity::ActivityNode;
use rpax_core::callgraph::{CallGraph, CallGraphDependency};
use rpax_core::config::CycleHandling;
use rpax_core::types::InvocationKind;
use rpax_core::workflow::WorkflowIndex;
use std::collections::HashSet;

/// Render one activity node's line: `"  " * indent + "- [" + name + "] " + type + " (Path: " + xpath + ")"`.
fn render_line(node: &ActivityNode, indent: usize) -> String {
    let prefix = "  ".repeat(indent);
    let name = node.display_name.as_deref().unwrap_or(&node.activity_type);
    format!(
        "{prefix}- [{name}] {ty} (Path: {path})",
        prefix = prefix,
        name = name,
        ty = node.activity_type,
        path = node.xpath_location
    )
}

/// Base pseudocode for one workflow: every node in the activity tree's
/// pre-order traversal, indented by its depth.
pub fn generate_pseudocode(tree: &rpax_core::activity::ActivityTree) -> String {
    tree.iter_preorder()
        .into_iter()
        .map(|node| render_line(node, node.depth as usize))
        .collect::<Vec<_>>()
        .join("\n")
}

fn depth_limit_message(workflow_id: &str, max_depth: u32) -> String {
    format!("[DEPTH LIMIT REACHED: {workflow_id}] (max depth: {max_depth})")
}

fn missing_workflow_message(workflow_id: &str) -> String {
    format!("[MISSING WORKFLOW: {workflow_id}]")
}

fn cycle_message(workflow_id: &str, handling: CycleHandling) -> Option<String> {
    match handling {
        CycleHandling::Mark => Some(format!("[CYCLE DETECTED: {workflow_id}] (already expanded above)")),
        CycleHandling::Stop => Some(format!("[CYCLE DETECTED: {workflow_id}] (expansion stopped)")),
        CycleHandling::Ignore => None,
    }
}

/// Recursively expand a workflow's pseudocode, inlining invoked
/// workflows' own pseudocode at the invocation site's indent level.
///
/// `visited` tracks the ancestor chain for cycle detection only; it is
/// copied at each recursive call so sibling branches don't
/// cross-contaminate each other's view of what's "above" them.
pub fn generate_recursive_pseudocode(
    workflow_id: &str,
    index: &WorkflowIndex,
    graph: &CallGraph,
    max_depth: u32,
    cycle_handling: CycleHandling,
) -> String {
    expand(workflow_id, index, graph, 0, max_depth, cycle_handling, &mut HashSet::new())
}

fn expand(
    workflow_id: &str,
    index: &WorkflowIndex,
    graph: &CallGraph,
    depth: u32,
    max_depth: u32,
    cycle_handling: CycleHandling,
    visited: &mut HashSet<String>,
) -> String {
    if depth > max_depth {
        return depth_limit_message(workflow_id, max_depth);
    }

    if visited.contains(workflow_id) {
        return cycle_message(workflow_id, cycle_handling).unwrap_or_default();
    }

    let Some(workflow) = index.find_by_id(workflow_id) else {
        return missing_workflow_message(workflow_id);
    };

    visited.insert(workflow_id.to_string());

    let node = graph.node(workflow_id);
    let deps_by_source: Vec<&CallGraphDependency> = node.map(|n| n.dependencies.iter().collect()).unwrap_or_default();

    let mut lines = Vec::new();
    for activity in workflow.activity_tree.iter_preorder() {
        lines.push(render_line(activity, activity.depth as usize));

        let Some(invoked) = activity.invocation_target.as_deref() else {
            continue;
        };
        let dep = deps_by_source.iter().find(|d| {
            d.call_sites.iter().any(|site| site == &activity.node_id) || d.target_path == invoked
        });

        match dep {
            Some(d) if d.invocation_kind == InvocationKind::Static => {
                if let Some(target_id) = &d.target_workflow_id {
                    let mut branch_visited = visited.clone();
                    let expanded = expand(
                        target_id,
                        index,
                        graph,
                        depth + 1,
                        max_depth,
                        cycle_handling,
                        &mut branch_visited,
                    );
                    if !expanded.is_empty() {
                        lines.push(expanded);
                    }
                }
            }
            Some(d) if d.invocation_kind == InvocationKind::Missing => {
                lines.push(missing_workflow_message(&d.target_path));
            }
            _ => {}
        }
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rpax_core::activity::{ActivityNode, ActivityTree};
    use rpax_core::callgraph::{CallGraphMetrics, CallGraphNode};
    use rpax_core::types::WorkflowKind;
    use rpax_core::workflow::Workflow;
    use std::collections::HashMap;

    fn node(id: &str, depth: u32, invocation_target: Option<&str>) -> ActivityNode {
        ActivityNode {
            node_id: id.to_string(),
            activity_type: "InvokeWorkflowFile".to_string(),
            display_name: Some(id.to_string()),
            annotation: None,
            depth,
            parent_node_id: None,
            child_node_ids: vec![],
            visible: true,
            properties: HashMap::new(),
            is_expression: HashMap::new(),
            invocation_target: invocation_target.map(|s| s.to_string()),
            selectors: HashMap::new(),
            referenced_variables: Default::default(),
            container_branch: None,
            xpath_location: format!("/{id}"),
            content_hash8: "deadbeef".to_string(),
        }
    }

    fn tree(root_id: &str, nodes: Vec<ActivityNode>) -> ActivityTree {
        ActivityTree {
            root_node_id: Some(root_id.to_string()),
            nodes,
        }
    }

    #[test]
    fn base_pseudocode_matches_indent_format() {
        let mut root = node("Seq", 0, None);
        root.activity_type = "Sequence".to_string();
        root.child_node_ids = vec!["Write".to_string()];
        let mut child = node("Write", 1, None);
        child.activity_type = "WriteLine".to_string();
        child.display_name = Some("Log".to_string());
        let t = tree("Seq", vec![root, child]);
        let out = generate_pseudocode(&t);
        assert_eq!(out, "- [Seq] Sequence (Path: /Seq)\n  - [Log] WriteLine (Path: /Write)");
    }

    fn wf(id: &str, tree: ActivityTree) -> Workflow {
        Workflow {
            file_path: format!("/proj/{id}.xaml"),
            relative_path: format!("{id}.xaml"),
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
            activity_tree: tree,
        }
    }

    fn graph_node(id: &str, deps: Vec<CallGraphDependency>) -> CallGraphNode {
        CallGraphNode {
            workflow_composite_id: format!("proj-h#{id}#h"),
            workflow_id: id.to_string(),
            display_name: id.to_string(),
            relative_path: format!("{id}.xaml"),
            is_entry_point: id == "Main",
            call_depth: 0,
            dependencies: deps,
            dependents: Default::default(),
        }
    }

    #[test]
    fn recursive_expansion_inlines_invoked_workflow() {
        let main_root = node("Invoke", 0, Some("Helper.xaml"));
        let main_tree = tree("Invoke", vec![main_root]);

        let mut helper_root = node("Log", 0, None);
        helper_root.activity_type = "WriteLine".to_string();
        let helper_tree = tree("Log", vec![helper_root]);

        let index = WorkflowIndex {
            project_slug: "proj-h".into(),
            total_workflows: 2,
            successful_parses: 2,
            failed_parses: 0,
            workflows: vec![wf("Main", main_tree), wf("Helper", helper_tree)],
            excluded_files: vec![],
        };

        let dep = CallGraphDependency {
            source_workflow_id: "Main".into(),
            target_workflow_id: Some("Helper".into()),
            target_path: "Helper.xaml".into(),
            invocation_kind: InvocationKind::Static,
            call_sites: vec!["Invoke".into()],
            arguments: Default::default(),
        };
        let graph = CallGraph {
            project_slug: "proj-h".into(),
            nodes: vec![graph_node("Main", vec![dep]), graph_node("Helper", vec![])],
            cycles: vec![],
            metrics: CallGraphMetrics::default(),
        };

        let out = generate_recursive_pseudocode("Main", &index, &graph, 10, CycleHandling::Mark);
        assert!(out.contains("[Invoke] InvokeWorkflowFile"));
        assert!(out.contains("[Log] WriteLine"));
    }

    #[test]
    fn self_cycle_is_marked_not_infinite() {
        let root = node("Invoke", 0, Some("Main.xaml"));
        let main_tree = tree("Invoke", vec![root]);
        let index = WorkflowIndex {
            project_slug: "proj-h".into(),
            total_workflows: 1,
            successful_parses: 1,
            failed_parses: 0,
            workflows: vec![wf("Main", main_tree)],
            excluded_files: vec![],
        };
        let dep = CallGraphDependency {
            source_workflow_id: "Main".into(),
            target_workflow_id: Some("Main".into()),
            target_path: "Main.xaml".into(),
            invocation_kind: InvocationKind::Static,
            call_sites: vec!["Invoke".into()],
            arguments: Default::default(),
        };
        let graph = CallGraph {
            project_slug: "proj-h".into(),
            nodes: vec![graph_node("Main", vec![dep])],
            cycles: vec![],
            metrics: CallGraphMetrics::default(),
        };
        let out = generate_recursive_pseudocode("Main", &index, &graph, 10, CycleHandling::Mark);
        assert!(out.contains("[CYCLE DETECTED: Main] (already expanded above)"));
    }

    #[test]
    fn missing_target_is_reported() {
        let root = node("Invoke", 0, Some("Ghost.xaml"));
        let main_tree = tree("Invoke", vec![root]);
        let index = WorkflowIndex {
            project_slug: "proj-h".into(),
            total_workflows: 1,
            successful_parses: 1,
            failed_parses: 0,
            workflows: vec![wf("Main", main_tree)],
            excluded_files: vec![],
        };
        let dep = CallGraphDependency {
            source_workflow_id: "Main".into(),
            target_workflow_id: None,
            target_path: "Ghost.xaml".into(),
            invocation_kind: InvocationKind::Missing,
            call_sites: vec!["Invoke".into()],
            arguments: Default::default(),
        };
        let graph = CallGraph {
            project_slug: "proj-h".into(),
            nodes: vec![graph_node("Main", vec![dep])],
            cycles: vec![],
            metrics: CallGraphMetrics::default(),
        };
        let out = generate_recursive_pseudocode("Main", &index, &graph, 10, CycleHandling::Mark);
        assert!(out.contains("[MISSING WORKFLOW: Ghost.xaml]"));
    }
}
