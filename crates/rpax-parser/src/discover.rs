//! Workflow discoverer: an `ignore::WalkBuilder` walk filtered by a
//! `globset::GlobSet` of exclude patterns, collecting XAML workflow files
//! and (optionally) coded `.cs` workflow files.

use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use rpax_core::{Result, RpaxError};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const CODED_EXCLUDE_STEMS: &[&str] = &["assemblyinfo", "globalusings", "program", "startup"];

#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    pub exclude_patterns: Vec<String>,
    pub include_coded_workflows: bool,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            exclude_patterns: vec![],
            include_coded_workflows: false,
        }
    }
}

/// One discovered candidate file, before parsing.
#[derive(Debug, Clone)]
pub struct DiscoveryRecord {
    pub absolute_path: PathBuf,
    pub relative_path: String,
    pub is_coded: bool,
}

#[derive(Debug, Default)]
pub struct DiscoveryResult {
    pub discovered: Vec<DiscoveryRecord>,
    pub excluded: Vec<String>,
}

fn build_globset(patterns: &[String]) -> Option<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    let mut added = false;
    for pattern in patterns {
        match Glob::new(pattern) {
            Ok(glob) => {
                builder.add(glob);
                added = true;
            }
            Err(e) => warn!("invalid glob pattern '{}': {}", pattern, e),
        }
    }
    if added {
        builder.build().ok()
    } else {
        None
    }
}

fn is_excluded_coded_filename(path: &Path) -> bool {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(|stem| CODED_EXCLUDE_STEMS.contains(&stem.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Depth-first walk of `project_root`, enumerating `.xaml` files (always)
/// and `.cs` files (only when `include_coded_workflows` is set), applying
/// exclude globs against the POSIX-relative path.
pub fn discover_workflows(project_root: &Path, config: &DiscoveryConfig) -> Result<DiscoveryResult> {
    if !project_root.is_dir() {
        return Err(RpaxError::Descriptor(format!(
            "project root is not a directory: {}",
            project_root.display()
        )));
    }

    let exclude_set = build_globset(&config.exclude_patterns);

    let mut walker_builder = WalkBuilder::new(project_root);
    walker_builder.hidden(false).git_ignore(false).ignore(false);
    let walker = walker_builder.build();

    let mut result = DiscoveryResult::default();

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!("walker error: {}", e);
                continue;
            }
        };

        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        let is_xaml = ext == "xaml";
        let is_coded_candidate = config.include_coded_workflows
            && ext == "cs"
            && !is_excluded_coded_filename(path);

        if !is_xaml && !is_coded_candidate {
            continue;
        }

        let relative = path
            .strip_prefix(project_root)
            .unwrap_or(path)
            .to_string_lossy()
            .to_string();
        let relative_posix = rpax_core::paths::normalize(&relative);

        if let Some(set) = &exclude_set {
            if set.is_match(&relative_posix) {
                debug!("excluding {}", relative_posix);
                result.excluded.push(relative_posix);
                continue;
            }
        }

        result.discovered.push(DiscoveryRecord {
            absolute_path: path.to_path_buf(),
            relative_path: relative_posix,
            is_coded: is_coded_candidate,
        });
    }

    result.discovered.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn discovers_xaml_and_applies_excludes() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Main.xaml"), "<Activity/>").unwrap();
        fs::create_dir_all(dir.path().join("Tests")).unwrap();
        fs::write(dir.path().join("Tests/Skip.xaml"), "<Activity/>").unwrap();

        let config = DiscoveryConfig {
            exclude_patterns: vec!["Tests/**".to_string()],
            include_coded_workflows: false,
        };
        let result = discover_workflows(dir.path(), &config).unwrap();
        assert_eq!(result.discovered.len(), 1);
        assert_eq!(result.discovered[0].relative_path, "Main.xaml");
        assert_eq!(result.excluded, vec!["Tests/Skip.xaml".to_string()]);
    }

    #[test]
    fn coded_workflows_excluded_by_default() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Main.xaml"), "<Activity/>").unwrap();
        fs::write(dir.path().join("Helper.cs"), "class Helper {}").unwrap();

        let result = discover_workflows(dir.path(), &DiscoveryConfig::default()).unwrap();
        assert_eq!(result.discovered.len(), 1);
    }

    #[test]
    fn coded_workflows_skip_common_non_workflow_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Program.cs"), "class Program {}").unwrap();
        fs::write(dir.path().join("Worker.cs"), "class Worker {}").unwrap();

        let config = DiscoveryConfig {
            exclude_patterns: vec![],
            include_coded_workflows: true,
        };
        let result = discover_workflows(dir.path(), &config).unwrap();
        assert_eq!(result.discovered.len(), 1);
        assert_eq!(result.discovered[0].relative_path, "Worker.cs");
    }
}
