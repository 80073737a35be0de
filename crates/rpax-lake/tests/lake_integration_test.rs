//! End-to-end coverage of the writer + validator working together against
//! a real temp-directory lake, as opposed to the in-module unit tests that
//! exercise each in isolation.

use rpax_core::activity::ActivityTree;
use rpax_core::callgraph::{CallGraph, CallGraphDependency, CallGraphMetrics, CallGraphNode};
use rpax_core::config::RpaxConfig;
use rpax_core::package::PackageAnalysis;
use rpax_core::project::ProjectDescriptor;
use rpax_core::types::{InvocationKind, WorkflowKind};
use rpax_core::workflow::{Workflow, WorkflowIndex};
use rpax_lake::manifest::{ProjectManifest, ProjectsIndex, CURRENT_SCHEMA_VERSION};
use rpax_lake::validate::{validate, LakeView, RuleStatus};
use rpax_lake::writer::{write_project_legacy, write_projects_index, ProjectArtifacts};
use std::collections::HashMap;

fn workflow(id: &str, deps: Vec<CallGraphDependency>) -> (Workflow, CallGraphNode) {
    let wf = Workflow {
        file_path: format!("/proj/{id}.xaml"),
        relative_path: format!("{id}.xaml"),
        display_name: id.into(),
        description: None,
        annotation: None,
        file_size: 10,
        last_modified: chrono::Utc::now(),
        content_hash: "hash".into(),
        short_hash: "hash".into(),
        project_slug: "demo-abc123abcd".into(),
        workflow_id: id.into(),
        composite_id: format!("demo-abc123abcd#{id}#hash"),
        kind: WorkflowKind::Xaml,
        parse_successful: true,
        parse_errors: vec![],
        discovered_at: chrono::Utc::now(),
        arguments: vec![],
        variables: vec![],
        namespaces: Default::default(),
        packages_used: vec![],
        activity_tree: ActivityTree::default(),
    };
    let node = CallGraphNode {
        workflow_composite_id: wf.composite_id.clone(),
        workflow_id: id.into(),
        display_name: id.into(),
        relative_path: wf.relative_path.clone(),
        is_entry_point: id == "Main",
        call_depth: if id == "Main" { 0 } else { 1 },
        dependencies: deps,
        dependents: Default::default(),
    };
    (wf, node)
}

#[test]
fn writer_output_passes_validation_for_a_clean_linear_project() {
    let lake_dir = tempfile::tempdir().unwrap();

    let dep = CallGraphDependency {
        source_workflow_id: "Main".into(),
        target_workflow_id: Some("Helper".into()),
        target_path: "Helper.xaml".into(),
        invocation_kind: InvocationKind::Static,
        call_sites: vec!["/Sequence/InvokeWorkflowFile".into()],
        arguments: HashMap::new(),
    };
    let (main_wf, main_node) = workflow("Main", vec![dep]);
    let (helper_wf, helper_node) = workflow("Helper", vec![]);

    let index = WorkflowIndex {
        project_slug: "demo-abc123abcd".into(),
        total_workflows: 2,
        successful_parses: 2,
        failed_parses: 0,
        workflows: vec![main_wf, helper_wf],
        excluded_files: vec![],
    }
    .sorted();

    let call_graph = CallGraph {
        project_slug: "demo-abc123abcd".into(),
        nodes: vec![main_node, helper_node],
        cycles: vec![],
        metrics: CallGraphMetrics::default(),
    }
    .sorted();

    let manifest = ProjectManifest {
        schema_version: CURRENT_SCHEMA_VERSION.into(),
        generator_version: "0.1.0".into(),
        generated_at: chrono::Utc::now(),
        project_slug: "demo-abc123abcd".into(),
        project_name: "Demo".into(),
        project_root: "/proj".into(),
        main_entry: "Main".into(),
        total_workflows: 2,
        successful_parses: 2,
        failed_parses: 0,
        entry_point_ids: vec!["Main".into()],
    };

    let packages = PackageAnalysis::default();
    let pseudocode: HashMap<String, String> = HashMap::new();

    let artifacts = ProjectArtifacts {
        manifest: manifest.clone(),
        index: &index,
        call_graph: &call_graph,
        packages: &packages,
        pseudocode: &pseudocode,
        expanded_pseudocode: None,
    };

    let project_dir = write_project_legacy(lake_dir.path(), &artifacts).unwrap();
    assert!(project_dir.join("manifest.json").exists());
    assert!(project_dir.join("call-graph.json").exists());
    assert!(project_dir.join("workflows.index.json").exists());

    write_projects_index(
        lake_dir.path(),
        rpax_lake::manifest::ProjectsIndexEntry {
            project_slug: manifest.project_slug.clone(),
            project_name: manifest.project_name.clone(),
            total_workflows: manifest.total_workflows,
            generated_at: manifest.generated_at,
        },
    )
    .unwrap();

    let raw = std::fs::read_to_string(lake_dir.path().join("projects.json")).unwrap();
    let projects_index: ProjectsIndex = serde_json::from_str(&raw).unwrap();
    assert_eq!(projects_index.projects.len(), 1);

    let project = ProjectDescriptor::parse(r#"{"name": "Demo", "main": "Main.xaml"}"#).unwrap();
    let view = LakeView {
        project: &project,
        index: &index,
        call_graph: &call_graph,
        manifest_has_provenance: true,
    };
    let result = validate(&view, &RpaxConfig::default());
    assert_eq!(result.overall_status(), RuleStatus::Pass);
    assert_eq!(result.exit_code(), 0);

    // The written call graph round-trips through JSON to the same shape
    // the validator just judged, confirming the writer and validator agree
    // on what "the lake" contains.
    let raw_graph = std::fs::read_to_string(project_dir.join("call-graph.json")).unwrap();
    let read_back: CallGraph = serde_json::from_str(&raw_graph).unwrap();
    assert_eq!(read_back.nodes.len(), call_graph.nodes.len());
}
