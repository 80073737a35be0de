//! Alternate "v0" output layout: `low`/`medium`/`high` detail-level
//! workflow projections and `non_test`/`test` entry-point categories.

use crate::manifest::ProjectManifest;
use crate::writer::atomic_write_json;
use rpax_core::callgraph::CallGraph;
use rpax_core::package::PackageAnalysis;
use rpax_core::workflow::{Workflow, WorkflowIndex};
use rpax_core::Result;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailLevel {
    Low,
    Medium,
    High,
}

impl DetailLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            DetailLevel::Low => "low",
            DetailLevel::Medium => "medium",
            DetailLevel::High => "high",
        }
    }

    pub const ALL: [DetailLevel; 3] = [DetailLevel::Low, DetailLevel::Medium, DetailLevel::High];
}

fn project_workflow(workflow: &Workflow, level: DetailLevel) -> Value {
    let mut value = json!({
        "workflow_id": workflow.workflow_id,
        "display_name": workflow.display_name,
        "relative_path": workflow.relative_path,
        "kind": workflow.kind,
        "parse_successful": workflow.parse_successful,
    });
    if level == DetailLevel::Low {
        return value;
    }
    let obj = value.as_object_mut().unwrap();
    obj.insert("arguments".into(), serde_json::to_value(&workflow.arguments).unwrap());
    obj.insert("variables".into(), serde_json::to_value(&workflow.variables).unwrap());
    obj.insert("packages_used".into(), serde_json::to_value(&workflow.packages_used).unwrap());
    if level == DetailLevel::Medium {
        return value;
    }
    obj.insert("activity_tree".into(), serde_json::to_value(&workflow.activity_tree).unwrap());
    obj.insert("annotation".into(), serde_json::to_value(&workflow.annotation).unwrap());
    value
}

/// Test-naming convention (4.C10): entry points whose basename contains
/// "test" (case-insensitive) partition into the `test` category.
fn entry_point_category(relative_path: &str) -> &'static str {
    if rpax_core::paths::basename(relative_path).to_lowercase().contains("test") {
        "test"
    } else {
        "non_test"
    }
}

fn project_call_graph(graph: &CallGraph, level: DetailLevel) -> Value {
    let relationships: Vec<Value> = graph
        .nodes
        .iter()
        .flat_map(|n| {
            n.dependencies.iter().map(move |d| {
                json!({
                    "source": d.source_workflow_id,
                    "target": d.target_workflow_id,
                    "kind": d.invocation_kind,
                })
            })
        })
        .collect();

    let mut value = json!({
        "detail_level": level.as_str(),
        "workflows": graph.nodes.iter().map(|n| &n.workflow_id).collect::<Vec<_>>(),
        "call_relationships": relationships,
    });
    if level != DetailLevel::Low {
        value.as_object_mut().unwrap().insert(
            "packages".into(),
            Value::Array(vec![]),
        );
    }
    value
}

/// Write the `v0` layout for one project: `<lake>/<slug>/v0/...`.
pub fn write_project_v0(
    lake_root: &Path,
    manifest: &ProjectManifest,
    index: &WorkflowIndex,
    call_graph: &CallGraph,
    packages: &PackageAnalysis,
) -> Result<PathBuf> {
    let v0_root = lake_root.join(&manifest.project_slug).join("v0");

    atomic_write_json(&v0_root.join("manifest.json"), manifest, true)?;

    let workflow_ids: Vec<&str> = index.workflows.iter().map(|w| w.workflow_id.as_str()).collect();
    atomic_write_json(&v0_root.join("workflows").join("index.json"), &workflow_ids, true)?;

    for workflow in &index.workflows {
        let workflow_dir = v0_root.join("workflows").join(&workflow.workflow_id);
        for level in DetailLevel::ALL {
            let path = workflow_dir.join(format!("{}.json", level.as_str()));
            atomic_write_json(&path, &project_workflow(workflow, level), true)?;
        }
    }

    for level in DetailLevel::ALL {
        let path = v0_root.join("call_graphs").join(format!("project_{}.json", level.as_str()));
        atomic_write_json(&path, &project_call_graph(call_graph, level), true)?;
    }

    let mut entry_points_by_category: std::collections::HashMap<&str, Vec<&Workflow>> = Default::default();
    for workflow in &index.workflows {
        if call_graph.node(&workflow.workflow_id).map(|n| n.is_entry_point).unwrap_or(false) {
            entry_points_by_category
                .entry(entry_point_category(&workflow.relative_path))
                .or_default()
                .push(workflow);
        }
    }
    for (category, workflows) in &entry_points_by_category {
        for level in DetailLevel::ALL {
            let all_path = v0_root
                .join("entry_points")
                .join(category)
                .join(format!("_all_{}.json", level.as_str()));
            let all_value: Vec<Value> = workflows.iter().map(|w| project_workflow(w, level)).collect();
            atomic_write_json(&all_path, &all_value, true)?;

            for workflow in workflows {
                let path = v0_root
                    .join("entry_points")
                    .join(category)
                    .join(format!("{}_{}.json", workflow.workflow_id, level.as_str()));
                atomic_write_json(&path, &project_workflow(workflow, level), true)?;
            }
        }
    }

    let dependencies_path = v0_root.join("dependencies.json");
    atomic_write_json(&dependencies_path, &packages.clone().sorted(), true)?;

    let resources_dir = v0_root.join("resources");
    atomic_write_json(&resources_dir.join("package_usage.json"), &packages.clone().sorted(), true)?;
    let static_invocations: Vec<_> = call_graph
        .nodes
        .iter()
        .flat_map(|n| n.dependencies.iter())
        .filter(|d| d.invocation_kind == rpax_core::types::InvocationKind::Static)
        .collect();
    atomic_write_json(&resources_dir.join("static_invocations.json"), &static_invocations, true)?;

    Ok(v0_root)
}
