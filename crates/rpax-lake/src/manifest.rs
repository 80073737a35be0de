//! Lake and project manifests (4.C10 supplement — provenance fields
//! required by validation rule `provenance`, C12 rule 2).

use serde::{Deserialize, Serialize};

/// `<lake>/<project-slug>/manifest.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectManifest {
    pub schema_version: String,
    pub generator_version: String,
    pub generated_at: chrono::DateTime<chrono::Utc>,
    pub project_slug: String,
    pub project_name: String,
    pub project_root: String,
    pub main_entry: String,
    pub total_workflows: usize,
    pub successful_parses: usize,
    pub failed_parses: usize,
    pub entry_point_ids: Vec<String>,
}

/// One row of the lake-level `projects.json` index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectsIndexEntry {
    pub project_slug: String,
    pub project_name: String,
    pub total_workflows: usize,
    pub generated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProjectsIndex {
    pub projects: Vec<ProjectsIndexEntry>,
}

impl ProjectsIndex {
    /// Ordering invariant (C10): rows sorted by slug for determinism.
    pub fn sorted(mut self) -> Self {
        self.projects.sort_by(|a, b| a.project_slug.cmp(&b.project_slug));
        self
    }

    pub fn upsert(&mut self, entry: ProjectsIndexEntry) {
        if let Some(existing) = self.projects.iter_mut().find(|p| p.project_slug == entry.project_slug) {
            *existing = entry;
        } else {
            self.projects.push(entry);
        }
    }
}

pub const CURRENT_SCHEMA_VERSION: &str = "1.0.0";
