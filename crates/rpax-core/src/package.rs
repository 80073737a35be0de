use crate::types::DependencyClassification;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageUsage {
    pub name: String,
    pub version: Option<String>,
    #[serde(default)]
    pub used_by_workflows: HashSet<String>,
    pub declared: bool,
    pub used: bool,
    pub classification: DependencyClassification,
    /// Filesystem path of the matched local directory, when
    /// `classification == CustomLocal`.
    pub local_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PackageAnalysis {
    pub project_slug: String,
    pub packages: Vec<PackageUsage>,
}

impl PackageAnalysis {
    pub fn sorted(mut self) -> Self {
        self.packages.sort_by(|a, b| a.name.cmp(&b.name));
        self
    }
}
