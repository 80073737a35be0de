//! Read-only lookups into an already-written lake, backing the `list`,
//! `pseudocode`, `validate`, and `projects` subcommands (spec.md §6).

use rpax_core::callgraph::CallGraph;
use rpax_core::package::PackageAnalysis;
use rpax_core::project::ProjectDescriptor;
use rpax_core::workflow::WorkflowIndex;
use rpax_core::{Result, RpaxError};
use rpax_lake::manifest::{ProjectManifest, ProjectsIndex};
use std::path::Path;

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| RpaxError::NotFound(format!("{}: {e}", path.display())))?;
    serde_json::from_str(&raw).map_err(RpaxError::from)
}

pub fn read_projects_index(lake_root: &Path) -> Result<ProjectsIndex> {
    read_json(&lake_root.join("projects.json"))
}

/// Resolve which project slug a command should operate on: the
/// explicitly requested one, or the sole project in the lake when there
/// is exactly one.
pub fn resolve_project_slug(lake_root: &Path, requested: Option<&str>) -> Result<String> {
    if let Some(slug) = requested {
        return Ok(slug.to_string());
    }
    let index = read_projects_index(lake_root)?;
    match index.projects.as_slice() {
        [] => Err(RpaxError::NotFound("lake has no projects".into())),
        [only] => Ok(only.project_slug.clone()),
        _ => Err(RpaxError::InvalidOperation(
            "multiple projects in lake; pass --project <slug>".into(),
        )),
    }
}

pub fn read_manifest(lake_root: &Path, slug: &str) -> Result<ProjectManifest> {
    read_json(&lake_root.join(slug).join("manifest.json"))
}

pub fn read_workflow_index(lake_root: &Path, slug: &str) -> Result<WorkflowIndex> {
    read_json(&lake_root.join(slug).join("workflows.index.json"))
}

pub fn read_call_graph(lake_root: &Path, slug: &str) -> Result<CallGraph> {
    read_json(&lake_root.join(slug).join("call-graph.json"))
}

pub fn read_packages(lake_root: &Path, slug: &str) -> Result<PackageAnalysis> {
    read_json(&lake_root.join(slug).join("packages.json"))
}

pub fn read_project_descriptor(manifest: &ProjectManifest) -> Result<ProjectDescriptor> {
    let path = Path::new(&manifest.project_root).join("project.json");
    let raw = std::fs::read_to_string(&path)
        .map_err(|e| RpaxError::NotFound(format!("{}: {e}", path.display())))?;
    ProjectDescriptor::parse(&raw)
}

pub fn read_pseudocode_index(lake_root: &Path, slug: &str) -> Result<Vec<String>> {
    read_json(&lake_root.join(slug).join("pseudocode").join("index.json"))
}

#[derive(serde::Deserialize)]
pub struct PseudocodeDocument {
    pub workflow_id: String,
    pub pseudocode: String,
    pub expanded: Option<String>,
}

pub fn read_pseudocode(lake_root: &Path, slug: &str, workflow_id: &str) -> Result<PseudocodeDocument> {
    read_json(&lake_root.join(slug).join("pseudocode").join(format!("{workflow_id}.json")))
}
