//! Whole-project orchestration: the glue that ties C2–C13 together for
//! the `parse` subcommand. This is CLI-driver logic (spec.md §6 names the
//! CLI as an external collaborator specified only at contract level), so
//! it lives here rather than in a library crate.

use rayon::prelude::*;
use rpax_core::config::{OutputSchema, RpaxConfig};
use rpax_core::diagnostics::{DiagnosticContext, DiagnosticsCollector, Severity};
use rpax_core::identity::project_slug;
use rpax_core::project::{EntryPoint, ProjectDescriptor};
use rpax_core::workflow::WorkflowIndex;
use rpax_core::{Result, RpaxError};
use rpax_lake::manifest::{ProjectManifest, ProjectsIndexEntry, CURRENT_SCHEMA_VERSION};
use rpax_lake::writer::{write_project_legacy, write_projects_index, ProjectArtifacts};
use rpax_parser::discover::{discover_workflows, DiscoveryConfig};
use rpax_parser::invocation::resolve_invocations;
use rpax_parser::packages::{analyze_packages, load_classification_cache};
use rpax_parser::pipeline::parse_workflow_file;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub struct ParseOutcome {
    pub project_slug: String,
    pub project_dir: PathBuf,
    pub index: WorkflowIndex,
    pub call_graph: rpax_core::callgraph::CallGraph,
    pub diagnostics_count: usize,
}

/// Project entry points as declared in `project.json`. When the
/// descriptor lists none explicitly (the common case for a single
/// process entry), `main` is synthesized into a sole entry point.
fn effective_entry_points(project: &ProjectDescriptor) -> Vec<EntryPoint> {
    if !project.entry_points.is_empty() {
        return project.entry_points.clone();
    }
    vec![EntryPoint {
        file_path: project.main.clone(),
        unique_id: project.main.clone(),
        input_arguments: Vec::new(),
        output_arguments: Vec::new(),
    }]
}

/// Top-level subdirectory names under `project_root`, used as candidates
/// for custom-local package classification (4.C5 rule 3).
fn local_directory_names(project_root: &Path) -> std::collections::HashSet<String> {
    let mut out = std::collections::HashSet::new();
    let Ok(entries) = std::fs::read_dir(project_root) else {
        return out;
    };
    for entry in entries.flatten() {
        if entry.path().is_dir() {
            if let Some(name) = entry.file_name().to_str() {
                out.insert(name.to_string());
            }
        }
    }
    out
}

/// Run the full pipeline for one project tree: discover, parse (C4),
/// resolve invocations (C7), build the call graph (C8), render
/// pseudocode (C9), and persist the lake (C10/C10-v0), per the
/// data-flow diagram in spec.md §2.
pub fn run_project(
    project_root: &Path,
    lake_root: &Path,
    config: &RpaxConfig,
    diagnostics: &DiagnosticsCollector,
) -> Result<ParseOutcome> {
    let descriptor_path = project_root.join("project.json");
    let raw = std::fs::read_to_string(&descriptor_path).map_err(|e| {
        RpaxError::Descriptor(format!("cannot read {}: {e}", descriptor_path.display()))
    })?;
    let project = ProjectDescriptor::parse(&raw)?;
    let canonical = project.canonical_json()?;
    let slug = project_slug(&project.name, &canonical);

    info!(project = %project.name, slug = %slug, "discovering workflows");

    let discovery_config = DiscoveryConfig {
        exclude_patterns: config.scan.exclude.clone(),
        include_coded_workflows: config.parser.include_coded_workflows,
    };
    let discovery = discover_workflows(project_root, &discovery_config)?;

    let parser_options = rpax_parser::xaml::ParserOptions {
        custom_blacklist: &config.parser.custom_blacklist,
        custom_whitelist: &config.parser.custom_whitelist,
    };

    let now = chrono::Utc::now();
    let parsed: Vec<_> = discovery
        .discovered
        .par_iter()
        .map(|record| parse_workflow_file(project_root, &slug, record, now, parser_options))
        .collect();

    let mut workflows = Vec::with_capacity(parsed.len());
    let mut failed = 0usize;
    for (record, result) in discovery.discovered.iter().zip(parsed) {
        match result {
            Ok(wf) => {
                if !wf.parse_successful {
                    failed += 1;
                    diagnostics.record(
                        Severity::Error,
                        "xaml-parse",
                        wf.parse_errors.join("; "),
                        DiagnosticContext {
                            operation: "parse_workflow_file".into(),
                            component: "rpax-parser".into(),
                            project_slug: Some(slug.clone()),
                            workflow_path: Some(wf.relative_path.clone()),
                        },
                    );
                }
                workflows.push(wf);
            }
            Err(e) => {
                warn!(path = %record.relative_path, error = %e, "failed to read workflow file");
                diagnostics.record(
                    Severity::Error,
                    "io",
                    e.to_string(),
                    DiagnosticContext {
                        operation: "parse_workflow_file".into(),
                        component: "rpax-parser".into(),
                        project_slug: Some(slug.clone()),
                        workflow_path: Some(record.relative_path.clone()),
                    },
                );
            }
        }
    }

    let index = WorkflowIndex {
        project_slug: slug.clone(),
        total_workflows: workflows.len(),
        successful_parses: workflows.len() - failed,
        failed_parses: failed,
        workflows,
        excluded_files: discovery.excluded,
    }
    .sorted();

    info!(total = index.total_workflows, failed, "resolving invocations");

    let mut dependencies_by_source: HashMap<String, Vec<rpax_core::callgraph::CallGraphDependency>> =
        HashMap::new();
    for workflow in &index.workflows {
        let deps = resolve_invocations(&workflow.workflow_id, &workflow.activity_tree, &index, diagnostics);
        if !deps.is_empty() {
            dependencies_by_source.insert(workflow.workflow_id.clone(), deps);
        }
    }

    let entry_points = effective_entry_points(&project);
    let call_graph = rpax_graph::build_call_graph(&slug, &index, &dependencies_by_source, &entry_points);

    info!(
        cycles = call_graph.metrics.cycles_detected,
        max_depth = call_graph.metrics.max_depth,
        "call graph built"
    );

    let cache_path = lake_root.join("_cache").join("package_classifications.json");
    let cache = load_classification_cache(&cache_path);
    let local_dirs = local_directory_names(project_root);
    let packages = analyze_packages(&slug, &index.workflows, &project.dependencies, &local_dirs, &cache);

    let mut pseudocode = HashMap::new();
    for workflow in &index.workflows {
        pseudocode.insert(
            workflow.workflow_id.clone(),
            rpax_graph::generate_pseudocode(&workflow.activity_tree),
        );
    }
    let expanded_pseudocode = if config.pseudocode.generate_expanded {
        let mut expanded = HashMap::new();
        for workflow in &index.workflows {
            expanded.insert(
                workflow.workflow_id.clone(),
                rpax_graph::generate_recursive_pseudocode(
                    &workflow.workflow_id,
                    &index,
                    &call_graph,
                    config.pseudocode.max_expansion_depth,
                    config.pseudocode.cycle_handling,
                ),
            );
        }
        Some(expanded)
    } else {
        None
    };

    let manifest = ProjectManifest {
        schema_version: CURRENT_SCHEMA_VERSION.to_string(),
        generator_version: env!("CARGO_PKG_VERSION").to_string(),
        generated_at: now,
        project_slug: slug.clone(),
        project_name: project.name.clone(),
        project_root: project_root.display().to_string(),
        main_entry: rpax_core::paths::normalize_workflow_id(&project.main),
        total_workflows: index.total_workflows,
        successful_parses: index.successful_parses,
        failed_parses: index.failed_parses,
        entry_point_ids: entry_points.iter().map(|e| e.unique_id.clone()).collect(),
    };

    let artifacts = ProjectArtifacts {
        manifest: manifest.clone(),
        index: &index,
        call_graph: &call_graph,
        packages: &packages,
        pseudocode: &pseudocode,
        expanded_pseudocode: expanded_pseudocode.as_ref(),
    };

    let project_dir = match config.output.schema {
        OutputSchema::Legacy => write_project_legacy(lake_root, &artifacts)?,
        OutputSchema::V0 => {
            rpax_lake::schema_v0::write_project_v0(lake_root, &manifest, &index, &call_graph, &packages)?
        }
    };

    write_projects_index(
        lake_root,
        ProjectsIndexEntry {
            project_slug: slug.clone(),
            project_name: project.name.clone(),
            total_workflows: index.total_workflows,
            generated_at: now,
        },
    )?;

    Ok(ParseOutcome {
        project_slug: slug,
        project_dir,
        index,
        call_graph,
        diagnostics_count: diagnostics.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_project(dir: &Path) {
        fs::write(
            dir.join("project.json"),
            r#"{"name": "Demo Process", "main": "Main.xaml"}"#,
        )
        .unwrap();
        fs::write(
            dir.join("Main.xaml"),
            r#"<Activity><Sequence DisplayName="Main"><InvokeWorkflowFile DisplayName="Call" WorkflowFileName="Helper.xaml"/></Sequence></Activity>"#,
        )
        .unwrap();
        fs::write(
            dir.join("Helper.xaml"),
            r#"<Sequence DisplayName="Helper"><WriteLine DisplayName="Hi"/></Sequence>"#,
        )
        .unwrap();
    }

    #[test]
    fn runs_end_to_end_on_a_linear_chain() {
        let project_dir = tempfile::tempdir().unwrap();
        let lake_dir = tempfile::tempdir().unwrap();
        write_project(project_dir.path());

        let config = RpaxConfig::default();
        let diagnostics = DiagnosticsCollector::new("run-test".into());
        let outcome = run_project(project_dir.path(), lake_dir.path(), &config, &diagnostics).unwrap();

        assert_eq!(outcome.index.total_workflows, 2);
        assert_eq!(outcome.call_graph.node("Main").unwrap().call_depth, 0);
        assert_eq!(outcome.call_graph.node("Helper").unwrap().call_depth, 1);
        assert!(outcome.project_dir.join("manifest.json").exists());
        assert!(lake_dir.path().join("projects.json").exists());
    }

    #[test]
    fn missing_descriptor_is_fatal() {
        let project_dir = tempfile::tempdir().unwrap();
        let lake_dir = tempfile::tempdir().unwrap();
        let config = RpaxConfig::default();
        let diagnostics = DiagnosticsCollector::new("run-test".into());
        let result = run_project(project_dir.path(), lake_dir.path(), &config, &diagnostics);
        assert!(result.is_err());
    }
}
