//! Per-workflow orchestration (C3+C4+C6 tied together): read one
//! discovered file, parse it, and produce the immutable [`Workflow`]
//! record the rest of the pipeline consumes.

use crate::discover::DiscoveryRecord;
use crate::xaml;
use crate::xml_tree;
use crate::{arguments, namespaces};
use rpax_core::activity::ActivityTree;
use rpax_core::identity::{sha256_hex, short_hash, workflow_composite_id};
use rpax_core::project::{Argument, VariableDecl};
use rpax_core::types::WorkflowKind;
use rpax_core::workflow::Workflow;
use std::path::Path;

/// A workflow plus the raw root element it was parsed from, so callers can
/// reach into attributes (e.g. the root's own `Annotation.AnnotationText`)
/// without re-reading the file.
pub struct ParsedWorkflow {
    pub workflow: Workflow,
}

fn annotation_of(root: &xml_tree::RawElement) -> Option<String> {
    root.attributes
        .iter()
        .find(|(k, _)| k.ends_with("Annotation.AnnotationText"))
        .map(|(_, v)| v.clone())
}

/// Parse one discovered file into a [`Workflow`]. Never fails: XAML parse
/// errors are recorded on the record itself (`parse_successful = false`),
/// per 4.C4 failure semantics.
pub fn parse_workflow_file(
    project_root: &Path,
    project_slug: &str,
    record: &DiscoveryRecord,
    now: chrono::DateTime<chrono::Utc>,
    parser_options: xaml::ParserOptions<'_>,
) -> std::io::Result<Workflow> {
    let metadata = std::fs::metadata(&record.absolute_path)?;
    let bytes = std::fs::read(&record.absolute_path)?;
    let last_modified = metadata
        .modified()
        .map(chrono::DateTime::<chrono::Utc>::from)
        .unwrap_or(now);

    let content_hash = sha256_hex(&bytes);
    let short = short_hash(&bytes, 16);
    let workflow_id = rpax_core::paths::normalize_workflow_id(&record.relative_path);
    let composite_id = workflow_composite_id(project_slug, &workflow_id, &short);

    let file_stem = Path::new(&record.relative_path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(&record.relative_path)
        .to_string();

    if record.is_coded {
        return Ok(Workflow {
            file_path: record.absolute_path.to_string_lossy().to_string(),
            relative_path: record.relative_path.clone(),
            display_name: file_stem,
            description: None,
            annotation: None,
            file_size: metadata.len(),
            last_modified,
            content_hash,
            short_hash: short,
            project_slug: project_slug.to_string(),
            workflow_id,
            composite_id,
            kind: WorkflowKind::Coded,
            parse_successful: true,
            parse_errors: Vec::new(),
            discovered_at: now,
            arguments: Vec::new(),
            variables: Vec::new(),
            namespaces: Default::default(),
            packages_used: Vec::new(),
            activity_tree: ActivityTree::default(),
        });
    }

    let text = String::from_utf8_lossy(&bytes).to_string();
    let _ = project_root;

    match xml_tree::parse(&text) {
        Ok(root) => {
            let activity_tree = xaml::build_activity_tree_with_options(&root, parser_options);
            let raw_namespaces = namespaces::extract_namespaces(&root.attributes);
            let packages_used = namespaces::packages_from_namespaces(&raw_namespaces);
            let args: Vec<Argument> = arguments::extract_arguments(&root);
            let variables: Vec<VariableDecl> = arguments::dedup_variables(arguments::extract_variables(&root));
            let display_name = activity_tree
                .root_node_id
                .as_ref()
                .and_then(|id| activity_tree.node(id))
                .and_then(|n| n.display_name.clone())
                .unwrap_or(file_stem);

            Ok(Workflow {
                file_path: record.absolute_path.to_string_lossy().to_string(),
                relative_path: record.relative_path.clone(),
                display_name,
                description: None,
                annotation: annotation_of(&root),
                file_size: metadata.len(),
                last_modified,
                content_hash,
                short_hash: short,
                project_slug: project_slug.to_string(),
                workflow_id,
                composite_id,
                kind: WorkflowKind::Xaml,
                parse_successful: true,
                parse_errors: Vec::new(),
                discovered_at: now,
                arguments: args,
                variables,
                namespaces: raw_namespaces,
                packages_used,
                activity_tree,
            })
        }
        Err(e) => Ok(Workflow {
            file_path: record.absolute_path.to_string_lossy().to_string(),
            relative_path: record.relative_path.clone(),
            display_name: file_stem,
            description: None,
            annotation: None,
            file_size: metadata.len(),
            last_modified,
            content_hash,
            short_hash: short,
            project_slug: project_slug.to_string(),
            workflow_id,
            composite_id,
            kind: WorkflowKind::Xaml,
            parse_successful: false,
            parse_errors: vec![e.to_string()],
            discovered_at: now,
            arguments: Vec::new(),
            variables: Vec::new(),
            namespaces: Default::default(),
            packages_used: Vec::new(),
            activity_tree: ActivityTree::default(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discover::DiscoveryRecord;
    use std::fs;

    #[test]
    fn parses_valid_xaml_into_workflow() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Main.xaml");
        fs::write(&path, r#"<Sequence DisplayName="Main"><WriteLine DisplayName="Hi"/></Sequence>"#).unwrap();

        let record = DiscoveryRecord {
            absolute_path: path.clone(),
            relative_path: "Main.xaml".to_string(),
            is_coded: false,
        };
        let wf = parse_workflow_file(dir.path(), "proj-abc", &record, chrono::Utc::now(), xaml::ParserOptions::default()).unwrap();
        assert!(wf.parse_successful);
        assert_eq!(wf.workflow_id, "Main");
        assert_eq!(wf.display_name, "Main");
        assert!(!wf.activity_tree.nodes.is_empty());
    }

    #[test]
    fn malformed_xaml_is_recorded_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Broken.xaml");
        fs::write(&path, "<Sequence><Unclosed></Sequence>").unwrap();

        let record = DiscoveryRecord {
            absolute_path: path.clone(),
            relative_path: "Broken.xaml".to_string(),
            is_coded: false,
        };
        let wf = parse_workflow_file(dir.path(), "proj-abc", &record, chrono::Utc::now(), xaml::ParserOptions::default()).unwrap();
        assert!(!wf.parse_successful);
        assert!(!wf.parse_errors.is_empty());
        assert!(wf.activity_tree.nodes.is_empty());
    }
}
