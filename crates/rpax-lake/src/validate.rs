//! Validation framework: a fixed pipeline of seven rules run over one
//! project's already-assembled artifacts, each yielding pass/warn/fail
//! issues.

use rpax_core::callgraph::CallGraph;
use rpax_core::config::{RpaxConfig, ValidationSection};
use rpax_core::project::ProjectDescriptor;
use rpax_core::types::InvocationKind;
use rpax_core::workflow::WorkflowIndex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleStatus {
    Pass,
    Warn,
    Fail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub rule_name: String,
    pub severity: RuleStatus,
    pub message: String,
    pub artifact_ref: String,
    pub json_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ValidationResult {
    pub status: Option<RuleStatus>,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationResult {
    pub fn overall_status(&self) -> RuleStatus {
        self.issues.iter().map(|i| i.severity).max().unwrap_or(RuleStatus::Pass)
    }

    /// Exit code mapping from 4.C12: pass/warn -> 0, fail -> 1.
    pub fn exit_code(&self) -> i32 {
        match self.overall_status() {
            RuleStatus::Pass | RuleStatus::Warn => 0,
            RuleStatus::Fail => 1,
        }
    }
}

/// What one project's validation pass needs: the already-parsed project
/// descriptor, the discovered/parsed workflows, the built call graph, and
/// whatever provenance fields the manifest would carry (passed
/// separately since the manifest itself is a writer concern).
pub struct LakeView<'a> {
    pub project: &'a ProjectDescriptor,
    pub index: &'a WorkflowIndex,
    pub call_graph: &'a CallGraph,
    pub manifest_has_provenance: bool,
}

type Rule = fn(&LakeView<'_>, &ValidationSection) -> Vec<ValidationIssue>;

const RULES: &[Rule] = &[
    artifacts_presence,
    provenance,
    roots_resolvable,
    referential_integrity,
    kinds_bounded,
    arguments_presence,
    cycle_detection,
];

/// Run every default rule and fold the issues into one [`ValidationResult`].
pub fn validate(view: &LakeView<'_>, config: &RpaxConfig) -> ValidationResult {
    let mut issues = Vec::new();
    for rule in RULES {
        issues.extend(rule(view, &config.validation));
    }
    ValidationResult {
        status: Some(issues.iter().map(|i| i.severity).max().unwrap_or(RuleStatus::Pass)),
        issues,
    }
}

fn artifacts_presence(view: &LakeView<'_>, _config: &ValidationSection) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    if view.index.workflows.is_empty() && view.index.total_workflows > 0 {
        issues.push(ValidationIssue {
            rule_name: "artifacts-presence".into(),
            severity: RuleStatus::Fail,
            message: "workflows index reports workflows but none are present".into(),
            artifact_ref: "workflows.index.json".into(),
            json_path: None,
        });
    }
    issues
}

fn provenance(view: &LakeView<'_>, _config: &ValidationSection) -> Vec<ValidationIssue> {
    if view.manifest_has_provenance {
        Vec::new()
    } else {
        vec![ValidationIssue {
            rule_name: "provenance".into(),
            severity: RuleStatus::Fail,
            message: "manifest is missing generator version, schema version, or generated-at timestamp".into(),
            artifact_ref: "manifest.json".into(),
            json_path: None,
        }]
    }
}

fn roots_resolvable(view: &LakeView<'_>, _config: &ValidationSection) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let discovered: HashSet<&str> = view.index.workflows.iter().map(|w| w.workflow_id.as_str()).collect();

    let main_id = rpax_core::paths::normalize_workflow_id(&view.project.main);
    if !discovered.contains(main_id.as_str()) {
        issues.push(ValidationIssue {
            rule_name: "roots-resolvable".into(),
            severity: RuleStatus::Fail,
            message: format!("default entry point '{}' was not discovered", view.project.main),
            artifact_ref: "workflows.index.json".into(),
            json_path: None,
        });
    }

    for ep in &view.project.entry_points {
        let ep_id = rpax_core::paths::normalize_workflow_id(&ep.file_path);
        if !discovered.contains(ep_id.as_str()) {
            issues.push(ValidationIssue {
                rule_name: "roots-resolvable".into(),
                severity: RuleStatus::Fail,
                message: format!("entry point '{}' was not discovered", ep.file_path),
                artifact_ref: "workflows.index.json".into(),
                json_path: None,
            });
        }
    }
    issues
}

fn referential_integrity(view: &LakeView<'_>, _config: &ValidationSection) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let known: HashSet<&str> = view.index.workflows.iter().map(|w| w.workflow_id.as_str()).collect();

    for node in &view.call_graph.nodes {
        for dep in &node.dependencies {
            if !known.contains(dep.source_workflow_id.as_str()) {
                issues.push(ValidationIssue {
                    rule_name: "referential-integrity".into(),
                    severity: RuleStatus::Fail,
                    message: format!("dependency source '{}' not present in workflow index", dep.source_workflow_id),
                    artifact_ref: "invocations.jsonl".into(),
                    json_path: None,
                });
            }
            match dep.invocation_kind {
                InvocationKind::Static => {
                    if let Some(target) = &dep.target_workflow_id {
                        if !known.contains(target.as_str()) {
                            issues.push(ValidationIssue {
                                rule_name: "referential-integrity".into(),
                                severity: RuleStatus::Warn,
                                message: format!("dependency target '{target}' not present in workflow index"),
                                artifact_ref: "invocations.jsonl".into(),
                                json_path: None,
                            });
                        }
                    }
                }
                InvocationKind::Missing => {
                    issues.push(ValidationIssue {
                        rule_name: "referential-integrity".into(),
                        severity: RuleStatus::Warn,
                        message: format!(
                            "invocation target '{}' from '{}' could not be resolved",
                            dep.target_path, dep.source_workflow_id
                        ),
                        artifact_ref: "invocations.jsonl".into(),
                        json_path: None,
                    });
                }
                InvocationKind::Dynamic | InvocationKind::Coded => {}
            }
        }
    }
    issues
}

fn kinds_bounded(view: &LakeView<'_>, _config: &ValidationSection) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    for node in &view.call_graph.nodes {
        for dep in &node.dependencies {
            if !dep.is_consistent() {
                issues.push(ValidationIssue {
                    rule_name: "kinds-bounded".into(),
                    severity: RuleStatus::Fail,
                    message: format!(
                        "dependency from '{}' has inconsistent kind/target pairing",
                        dep.source_workflow_id
                    ),
                    artifact_ref: "invocations.jsonl".into(),
                    json_path: None,
                });
            }
        }
    }
    issues
}

fn arguments_presence(view: &LakeView<'_>, _config: &ValidationSection) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    for ep in &view.project.entry_points {
        let ep_id = rpax_core::paths::normalize_workflow_id(&ep.file_path);
        let Some(workflow) = view.index.find_by_id(&ep_id) else {
            continue;
        };
        if workflow.arguments.is_empty() && workflow.parse_errors.is_empty() {
            issues.push(ValidationIssue {
                rule_name: "arguments-presence".into(),
                severity: RuleStatus::Warn,
                message: format!("entry point '{}' has no extracted arguments", workflow.workflow_id),
                artifact_ref: format!("activities/{}.json", workflow.workflow_id),
                json_path: None,
            });
        }
    }
    issues
}

fn cycle_detection(view: &LakeView<'_>, config: &ValidationSection) -> Vec<ValidationIssue> {
    if view.call_graph.cycles.is_empty() {
        return Vec::new();
    }
    let severity = if config.fail_on_cycles { RuleStatus::Fail } else { RuleStatus::Warn };
    view.call_graph
        .cycles
        .iter()
        .map(|c| ValidationIssue {
            rule_name: "cycle-detection".into(),
            severity,
            message: format!("cycle {} among workflows {:?}", c.cycle_id, c.workflow_ids),
            artifact_ref: "call-graph.json".into(),
            json_path: None,
        })
        .collect()
}
