pub mod diagnostics_flush;
pub mod manifest;
pub mod schema_v0;
pub mod uri;
pub mod validate;
pub mod writer;

pub use diagnostics_flush::flush_diagnostics;
pub use manifest::{ProjectManifest, ProjectsIndex, ProjectsIndexEntry, CURRENT_SCHEMA_VERSION};
pub use uri::{LakeUri, UriResolver};
pub use validate::{validate, LakeView, RuleStatus, ValidationIssue, ValidationResult};
pub use writer::{atomic_write_json, atomic_write_jsonl, write_project_legacy, write_projects_index, ProjectArtifacts};
