//! Package usage aggregation and dependency classification.
//!
//! Classification precedence:
//! 1. vendor-official prefix (`UiPath.*`) → [`DependencyClassification::VendorOfficial`]
//! 2. a cached decision from a prior run → whatever that decision was
//! 3. a local project subdirectory whose sanitized name matches the
//!    package → [`DependencyClassification::CustomLocal`]
//! 4. declared in the project descriptor's dependency table →
//!    [`DependencyClassification::ThirdParty`]
//! 5. otherwise → [`DependencyClassification::Ambiguous`] (SUPPLEMENT:
//!    cached on first classification so later runs are stable and do not
//!    re-prompt a human reviewer for the same package).

use rpax_core::package::{PackageAnalysis, PackageUsage};
use rpax_core::types::DependencyClassification;
use rpax_core::workflow::Workflow;
use rpax_core::{Result, RpaxError};
use std::collections::{HashMap, HashSet};
use std::path::Path;

const VENDOR_OFFICIAL_PREFIX: &str = "UiPath.";

/// Cached package→classification decisions, persisted under
/// `<lake>/_cache/package_classifications.json` so that once a human (or
/// this resolver) settles an `Ambiguous` package, subsequent runs reuse
/// the decision instead of flip-flopping as local directories change.
pub fn load_classification_cache(path: &Path) -> HashMap<String, DependencyClassification> {
    match std::fs::read_to_string(path) {
        Ok(raw) => serde_json::from_str(&raw).unwrap_or_default(),
        Err(_) => HashMap::new(),
    }
}

pub fn save_classification_cache(path: &Path, cache: &HashMap<String, DependencyClassification>) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(cache)?;
    std::fs::write(path, json).map_err(RpaxError::from)
}

fn sanitized_candidates(package: &str) -> Vec<String> {
    let mut out = vec![package.to_string()];
    if package.contains('.') {
        out.push(package.replace('.', "_"));
        if let Some(last) = package.rsplit('.').next() {
            out.push(last.to_string());
        }
    }
    out
}

fn classify_one(
    name: &str,
    local_directories: &HashSet<String>,
    declared_dependencies: &HashMap<String, String>,
    cache: &HashMap<String, DependencyClassification>,
) -> (DependencyClassification, Option<String>) {
    if name.starts_with(VENDOR_OFFICIAL_PREFIX) {
        return (DependencyClassification::VendorOfficial, None);
    }
    if let Some(cached) = cache.get(name) {
        return (*cached, None);
    }
    for candidate in sanitized_candidates(name) {
        if let Some(matched) = local_directories
            .iter()
            .find(|dir| dir.eq_ignore_ascii_case(&candidate))
        {
            return (DependencyClassification::CustomLocal, Some(matched.clone()));
        }
    }
    if declared_dependencies.contains_key(name) {
        return (DependencyClassification::ThirdParty, None);
    }
    (DependencyClassification::Ambiguous, None)
}

/// Aggregate every package referenced across `workflows` plus every
/// package declared (but possibly unused) in the project descriptor into
/// one [`PackageAnalysis`].
pub fn analyze_packages(
    project_slug: &str,
    workflows: &[Workflow],
    declared_dependencies: &HashMap<String, String>,
    local_directories: &HashSet<String>,
    cache: &HashMap<String, DependencyClassification>,
) -> PackageAnalysis {
    let mut usages: HashMap<String, PackageUsage> = HashMap::new();

    for workflow in workflows {
        for package in &workflow.packages_used {
            let entry = usages.entry(package.clone()).or_insert_with(|| {
                let (classification, local_path) =
                    classify_one(package, local_directories, declared_dependencies, cache);
                PackageUsage {
                    name: package.clone(),
                    version: declared_dependencies.get(package).cloned(),
                    used_by_workflows: HashSet::new(),
                    declared: declared_dependencies.contains_key(package),
                    used: true,
                    classification,
                    local_path,
                }
            });
            entry.used_by_workflows.insert(workflow.workflow_id.clone());
        }
    }

    for (name, version) in declared_dependencies {
        usages.entry(name.clone()).or_insert_with(|| {
            let (classification, local_path) = classify_one(name, local_directories, declared_dependencies, cache);
            PackageUsage {
                name: name.clone(),
                version: Some(version.clone()),
                used_by_workflows: HashSet::new(),
                declared: true,
                used: false,
                classification,
                local_path,
            }
        });
    }

    PackageAnalysis {
        project_slug: project_slug.to_string(),
        packages: usages.into_values().collect(),
    }
    .sorted()
}
