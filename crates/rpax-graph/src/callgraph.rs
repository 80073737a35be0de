//! Call graph construction: node/edge assembly, BFS depth assignment
//! from entry points, and cycle detection, over an explicit arena of
//! [`CallGraphNode`]s addressed by workflow ID.

use rpax_core::callgraph::{CallGraph, CallGraphDependency, CallGraphMetrics, CallGraphNode, CycleRecord};
use rpax_core::project::EntryPoint;
use rpax_core::types::{CycleClassification, InvocationKind};
use rpax_core::workflow::WorkflowIndex;
use std::collections::{HashMap, HashSet, VecDeque};

fn normalize_lower(path: &str) -> String {
    rpax_core::paths::normalize_workflow_id(path).to_lowercase()
}

fn is_entry_point(workflow_id: &str, relative_path: &str, entry_points: &[EntryPoint]) -> bool {
    entry_points.iter().any(|ep| {
        let ep_norm = normalize_lower(&ep.file_path);
        let ep_basename = rpax_core::paths::basename(&ep_norm).to_string();
        let wf_id_norm = normalize_lower(workflow_id);
        let wf_path_norm = normalize_lower(relative_path);
        let wf_basename = rpax_core::paths::basename(&wf_path_norm).to_string();
        ep_norm == wf_id_norm || ep_norm == wf_path_norm || ep_basename == wf_basename
    })
}

/// Build the call graph for one project: one node per discovered
/// workflow, edges from the resolved dependencies, entry-point-rooted
/// BFS depths, DFS cycle detection, and aggregate metrics.
pub fn build_call_graph(
    project_slug: &str,
    index: &WorkflowIndex,
    dependencies_by_source: &HashMap<String, Vec<CallGraphDependency>>,
    entry_points: &[EntryPoint],
) -> CallGraph {
    let mut nodes: HashMap<String, CallGraphNode> = HashMap::new();

    for workflow in &index.workflows {
        let is_ep = is_entry_point(&workflow.workflow_id, &workflow.relative_path, entry_points);
        nodes.insert(
            workflow.workflow_id.clone(),
            CallGraphNode {
                workflow_composite_id: workflow.composite_id.clone(),
                workflow_id: workflow.workflow_id.clone(),
                display_name: workflow.display_name.clone(),
                relative_path: workflow.relative_path.clone(),
                is_entry_point: is_ep,
                call_depth: -1,
                dependencies: Vec::new(),
                dependents: HashSet::new(),
            },
        );
    }

    for (source_id, deps) in dependencies_by_source {
        if let Some(node) = nodes.get_mut(source_id) {
            node.dependencies = deps.clone();
        }
    }

    // Back-references: only static edges own a dependents relationship
    // (4.C8 "Edge construction").
    let static_edges: Vec<(String, String)> = nodes
        .values()
        .flat_map(|n| {
            n.dependencies
                .iter()
                .filter(|d| d.invocation_kind == InvocationKind::Static)
                .filter_map(|d| d.target_workflow_id.clone().map(|t| (n.workflow_id.clone(), t)))
        })
        .collect();
    for (source, target) in &static_edges {
        if let Some(target_node) = nodes.get_mut(target) {
            target_node.dependents.insert(source.clone());
        }
    }

    assign_depths(&mut nodes, &static_edges);
    let cycles = detect_cycles(&nodes, &static_edges);
    let metrics = compute_metrics(&nodes, &cycles);

    let mut graph_nodes: Vec<CallGraphNode> = nodes.into_values().collect();
    graph_nodes.sort_by(|a, b| a.workflow_id.cmp(&b.workflow_id));

    CallGraph {
        project_slug: project_slug.to_string(),
        nodes: graph_nodes,
        cycles,
        metrics,
    }
    .sorted()
}

fn assign_depths(nodes: &mut HashMap<String, CallGraphNode>, static_edges: &[(String, String)]) {
    let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
    for (source, target) in static_edges {
        adjacency.entry(source.as_str()).or_default().push(target.as_str());
    }

    let entry_ids: Vec<String> = nodes
        .values()
        .filter(|n| n.is_entry_point)
        .map(|n| n.workflow_id.clone())
        .collect();

    let mut queue: VecDeque<String> = VecDeque::new();
    for id in &entry_ids {
        if let Some(n) = nodes.get_mut(id) {
            n.call_depth = 0;
        }
        queue.push_back(id.clone());
    }

    while let Some(current_id) = queue.pop_front() {
        let current_depth = nodes.get(&current_id).map(|n| n.call_depth).unwrap_or(-1);
        let targets: Vec<String> = adjacency
            .get(current_id.as_str())
            .map(|v| v.iter().map(|s| s.to_string()).collect())
            .unwrap_or_default();
        for target in targets {
            if let Some(target_node) = nodes.get_mut(&target) {
                let candidate = current_depth + 1;
                if target_node.call_depth == -1 || candidate < target_node.call_depth {
                    target_node.call_depth = candidate;
                    queue.push_back(target.clone());
                }
            }
        }
    }
}

/// Iterative three-color DFS. Every distinct cycle (deduplicated by the
/// canonical rotation of its vertex sequence) is recorded, not just the
/// first one found.
fn detect_cycles(nodes: &HashMap<String, CallGraphNode>, static_edges: &[(String, String)]) -> Vec<CycleRecord> {
    let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
    for (source, target) in static_edges {
        adjacency.entry(source.as_str()).or_default().push(target.as_str());
    }
    for targets in adjacency.values_mut() {
        targets.sort();
    }

    #[derive(Clone, Copy, PartialEq, Eq)]
    enum Color {
        Unseen,
        OnStack,
        Done,
    }

    let mut color: HashMap<&str, Color> = nodes.keys().map(|k| (k.as_str(), Color::Unseen)).collect();
    let mut stack: Vec<&str> = Vec::new();
    let mut seen_cycles: HashSet<Vec<String>> = HashSet::new();
    let mut cycles: Vec<CycleRecord> = Vec::new();

    let mut ids: Vec<&str> = nodes.keys().map(|s| s.as_str()).collect();
    ids.sort();

    for start in ids {
        if color.get(start).copied() != Some(Color::Unseen) {
            continue;
        }
        dfs_visit(start, &adjacency, &mut color, &mut stack, &mut seen_cycles, &mut cycles);
    }

    cycles.sort_by(|a, b| a.workflow_ids.cmp(&b.workflow_ids));
    cycles
}

fn dfs_visit<'a>(
    node: &'a str,
    adjacency: &HashMap<&'a str, Vec<&'a str>>,
    color: &mut HashMap<&'a str, u8_color::Color>,
    stack: &mut Vec<&'a str>,
    seen_cycles: &mut HashSet<Vec<String>>,
    cycles: &mut Vec<CycleRecord>,
) {
    color.insert(node, u8_color::Color::OnStack);
    stack.push(node);

    if let Some(targets) = adjacency.get(node) {
        for &target in targets {
            match color.get(target).copied().unwrap_or(u8_color::Color::Unseen) {
                u8_color::Color::Unseen => {
                    dfs_visit(target, adjacency, color, stack, seen_cycles, cycles);
                }
                u8_color::Color::OnStack => {
                    let start_idx = stack.iter().position(|&n| n == target).unwrap_or(0);
                    let cycle_vertices: Vec<String> = stack[start_idx..].iter().map(|s| s.to_string()).collect();
                    let canonical = canonical_rotation(&cycle_vertices);
                    if seen_cycles.insert(canonical.clone()) {
                        cycles.push(CycleRecord {
                            cycle_id: format!("cycle-{}", cycles.len() + 1),
                            classification: CycleClassification::from_len(canonical.len()),
                            workflow_ids: canonical,
                        });
                    }
                }
                u8_color::Color::Done => {}
            }
        }
    }

    stack.pop();
    color.insert(node, u8_color::Color::Done);
}

/// Rotate `vertices` so the lexicographically smallest element is first,
/// per 4.C8's cycle-deduplication rule.
fn canonical_rotation(vertices: &[String]) -> Vec<String> {
    if vertices.is_empty() {
        return Vec::new();
    }
    let min_idx = vertices
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.cmp(b))
        .map(|(i, _)| i)
        .unwrap_or(0);
    vertices[min_idx..].iter().chain(vertices[..min_idx].iter()).cloned().collect()
}

/// Tiny private module so `Color` can be shared between this module's
/// functions without leaking a public type.
mod u8_color {
    #[derive(Clone, Copy, PartialEq, Eq)]
    pub enum Color {
        Unseen,
        OnStack,
        Done,
    }
}

fn compute_metrics(nodes: &HashMap<String, CallGraphNode>, cycles: &[CycleRecord]) -> CallGraphMetrics {
    let total_workflows = nodes.len();
    let entry_points = nodes.values().filter(|n| n.is_entry_point).count();
    let orphaned_workflows = nodes.values().filter(|n| n.call_depth == -1).count();
    let max_depth = nodes.values().map(|n| n.call_depth).max().unwrap_or(-1);

    let mut total_dependencies = 0;
    let mut static_invocations = 0;
    let mut dynamic_invocations = 0;
    let mut missing_invocations = 0;
    let mut coded_invocations = 0;
    for node in nodes.values() {
        for dep in &node.dependencies {
            total_dependencies += 1;
            match dep.invocation_kind {
                InvocationKind::Static => static_invocations += 1,
                InvocationKind::Dynamic => dynamic_invocations += 1,
                InvocationKind::Missing => missing_invocations += 1,
                InvocationKind::Coded => coded_invocations += 1,
            }
        }
    }

    CallGraphMetrics {
        total_workflows,
        total_dependencies,
        entry_points,
        orphaned_workflows,
        max_depth,
        cycles_detected: cycles.len(),
        static_invocations,
        dynamic_invocations,
        missing_invocations,
        coded_invocations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rpax_core::activity::ActivityTree;
    use rpax_core::types::WorkflowKind;
    use rpax_core::workflow::Workflow;
    use std::collections::HashMap as Map;

    fn wf(id: &str) -> Workflow {
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
            activity_tree: ActivityTree::default(),
        }
    }

    fn dep(source: &str, target: Option<&str>, kind: InvocationKind) -> CallGraphDependency {
        CallGraphDependency {
            source_workflow_id: source.to_string(),
            target_workflow_id: target.map(|s| s.to_string()),
            target_path: target.unwrap_or("?").to_string(),
            invocation_kind: kind,
            call_sites: vec![],
            arguments: Map::new(),
        }
    }

    fn index(ids: &[&str]) -> WorkflowIndex {
        let workflows: Vec<_> = ids.iter().map(|id| wf(id)).collect();
        WorkflowIndex {
            project_slug: "proj-h".into(),
            total_workflows: workflows.len(),
            successful_parses: workflows.len(),
            failed_parses: 0,
            workflows,
            excluded_files: vec![],
        }
    }

    fn entry(path: &str) -> EntryPoint {
        EntryPoint {
            file_path: path.to_string(),
            unique_id: path.to_string(),
            input_arguments: vec![],
            output_arguments: vec![],
        }
    }

    #[test]
    fn linear_chain_assigns_increasing_depths() {
        let idx = index(&["Main", "Helper", "Util"]);
        let mut deps = Map::new();
        deps.insert("Main".to_string(), vec![dep("Main", Some("Helper"), InvocationKind::Static)]);
        deps.insert("Helper".to_string(), vec![dep("Helper", Some("Util"), InvocationKind::Static)]);
        let graph = build_call_graph("proj-h", &idx, &deps, &[entry("Main.xaml")]);
        assert_eq!(graph.node("Main").unwrap().call_depth, 0);
        assert_eq!(graph.node("Helper").unwrap().call_depth, 1);
        assert_eq!(graph.node("Util").unwrap().call_depth, 2);
        assert!(graph.cycles.is_empty());
    }

    #[test]
    fn self_cycle_is_classified_correctly() {
        let idx = index(&["A"]);
        let mut deps = Map::new();
        deps.insert("A".to_string(), vec![dep("A", Some("A"), InvocationKind::Static)]);
        let graph = build_call_graph("proj-h", &idx, &deps, &[entry("A.xaml")]);
        assert_eq!(graph.cycles.len(), 1);
        assert_eq!(graph.cycles[0].classification, CycleClassification::SelfCycle);
        assert_eq!(graph.node("A").unwrap().call_depth, 0);
    }

    #[test]
    fn mutual_cycle_between_two_workflows() {
        let idx = index(&["A", "B"]);
        let mut deps = Map::new();
        deps.insert("A".to_string(), vec![dep("A", Some("B"), InvocationKind::Static)]);
        deps.insert("B".to_string(), vec![dep("B", Some("A"), InvocationKind::Static)]);
        let graph = build_call_graph("proj-h", &idx, &deps, &[entry("A.xaml")]);
        assert_eq!(graph.cycles.len(), 1);
        assert_eq!(graph.cycles[0].classification, CycleClassification::Mutual);
        assert_eq!(graph.node("A").unwrap().call_depth, 0);
        assert_eq!(graph.node("B").unwrap().call_depth, 1);
    }

    #[test]
    fn orphaned_workflow_has_depth_negative_one() {
        let idx = index(&["Main", "Unreachable"]);
        let deps = Map::new();
        let graph = build_call_graph("proj-h", &idx, &deps, &[entry("Main.xaml")]);
        assert_eq!(graph.node("Unreachable").unwrap().call_depth, -1);
        assert_eq!(graph.metrics.orphaned_workflows, 1);
    }

    #[test]
    fn dynamic_and_missing_dependencies_do_not_create_graph_edges() {
        let idx = index(&["Main", "Other"]);
        let mut deps = Map::new();
        deps.insert(
            "Main".to_string(),
            vec![
                dep("Main", None, InvocationKind::Dynamic),
                dep("Main", None, InvocationKind::Missing),
            ],
        );
        let graph = build_call_graph("proj-h", &idx, &deps, &[entry("Main.xaml")]);
        assert_eq!(graph.node("Other").unwrap().call_depth, -1);
        assert_eq!(graph.metrics.dynamic_invocations, 1);
        assert_eq!(graph.metrics.missing_invocations, 1);
    }
}
