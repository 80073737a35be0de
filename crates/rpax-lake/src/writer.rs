//! Artifact writer. Every JSON document is written atomically: serialize
//! to a temp file in the destination directory, then rename into place.

use crate::manifest::{ProjectManifest, ProjectsIndex, ProjectsIndexEntry};
use rpax_core::callgraph::CallGraph;
use rpax_core::package::PackageAnalysis;
use rpax_core::workflow::{Workflow, WorkflowIndex};
use rpax_core::{Result, RpaxError};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Serialize `value` to `path` via temp-file-then-rename. On any error
/// the partial temp file is removed and never observed at `path`.
pub fn atomic_write_json<T: Serialize>(path: &Path, value: &T, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    atomic_write_bytes(path, json.as_bytes())
}

/// Write JSON-lines: one serialized `T` per line (`invocations.jsonl`).
pub fn atomic_write_jsonl<T: Serialize>(path: &Path, items: &[T]) -> Result<()> {
    let mut buf = String::new();
    for item in items {
        buf.push_str(&serde_json::to_string(item)?);
        buf.push('\n');
    }
    atomic_write_bytes(path, buf.as_bytes())
}

fn atomic_write_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = path.parent().ok_or_else(|| RpaxError::Lake(format!("no parent directory for {}", path.display())))?;
    std::fs::create_dir_all(parent)?;
    let tmp_name = format!(".{}.tmp", path.file_name().and_then(|n| n.to_str()).unwrap_or("artifact"));
    let tmp_path = parent.join(tmp_name);

    let result = (|| -> Result<()> {
        std::fs::write(&tmp_path, bytes)?;
        std::fs::rename(&tmp_path, path)?;
        Ok(())
    })();

    if result.is_err() {
        let _ = std::fs::remove_file(&tmp_path);
    }
    result
}

/// Everything an artifact-writer caller has assembled for one project,
/// ready to persist under `<lake>/<project-slug>/`.
pub struct ProjectArtifacts<'a> {
    pub manifest: ProjectManifest,
    pub index: &'a WorkflowIndex,
    pub call_graph: &'a CallGraph,
    pub packages: &'a PackageAnalysis,
    pub pseudocode: &'a HashMap<String, String>,
    pub expanded_pseudocode: Option<&'a HashMap<String, String>>,
}

/// Write the legacy-layout artifact set for one project (4.C10's default
/// layout). Returns the project directory written into.
pub fn write_project_legacy(lake_root: &Path, artifacts: &ProjectArtifacts<'_>) -> Result<PathBuf> {
    let project_dir = lake_root.join(&artifacts.manifest.project_slug);

    atomic_write_json(&project_dir.join("manifest.json"), &artifacts.manifest, true)?;
    atomic_write_json(&project_dir.join("workflows.index.json"), &artifacts.index.clone().sorted(), true)?;

    let invocations: Vec<_> = artifacts
        .call_graph
        .nodes
        .iter()
        .flat_map(|n| n.dependencies.iter())
        .collect();
    atomic_write_jsonl(&project_dir.join("invocations.jsonl"), &invocations)?;

    atomic_write_json(&project_dir.join("call-graph.json"), artifacts.call_graph, true)?;
    atomic_write_json(&project_dir.join("packages.json"), &artifacts.packages.clone().sorted(), true)?;

    let mut pseudocode_index: Vec<&str> = artifacts.pseudocode.keys().map(|s| s.as_str()).collect();
    pseudocode_index.sort();
    atomic_write_json(&project_dir.join("pseudocode").join("index.json"), &pseudocode_index, true)?;

    for (workflow_id, code) in artifacts.pseudocode {
        let payload = serde_json::json!({
            "workflow_id": workflow_id,
            "pseudocode": code,
            "expanded": artifacts.expanded_pseudocode.and_then(|m| m.get(workflow_id)),
        });
        let path = project_dir.join("pseudocode").join(format!("{workflow_id}.json"));
        atomic_write_json(&path, &payload, true)?;
    }

    for workflow in &artifacts.index.workflows {
        let path = project_dir.join("activities").join(format!("{}.json", workflow.workflow_id));
        atomic_write_json(&path, &workflow.activity_tree, true)?;
    }

    Ok(project_dir)
}

/// Update (or insert) `<lake>/projects.json` with this project's row.
pub fn write_projects_index(lake_root: &Path, entry: ProjectsIndexEntry) -> Result<()> {
    let path = lake_root.join("projects.json");
    let mut index: ProjectsIndex = std::fs::read_to_string(&path)
        .ok()
        .and_then(|raw| serde_json::from_str(&raw).ok())
        .unwrap_or_default();
    index.upsert(entry);
    atomic_write_json(&path, &index.sorted(), true)
}

/// List every workflow's source `Workflow` alongside its pseudocode, in
/// the order the writer will persist them. Exposed so callers building
/// `pseudocode`/`expanded_pseudocode` maps can iterate deterministically.
pub fn workflows_in_order(index: &WorkflowIndex) -> Vec<&Workflow> {
    let mut workflows: Vec<&Workflow> = index.workflows.iter().collect();
    workflows.sort_by(|a, b| a.workflow_id.cmp(&b.workflow_id));
    workflows
}
