//! Flush a run's collected diagnostics to `<lake>/_errors/` (4.C13),
//! maintaining a ring-buffer index of the most recent 100 runs.

use crate::writer::atomic_write_json;
use rpax_core::diagnostics::DiagnosticEntry;
use rpax_core::{Result, RpaxError};
use serde::{Deserialize, Serialize};
use std::path::Path;

const MAX_RETAINED_RUNS: usize = 100;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ErrorsIndex {
    /// Most recent run first.
    pub runs: Vec<String>,
}

/// Write `<lake>/_errors/<run-id>.json` and update
/// `<lake>/_errors/index.json`, removing the oldest entry file when the
/// ring buffer rolls over past [`MAX_RETAINED_RUNS`].
pub fn flush_diagnostics(lake_root: &Path, run_id: &str, entries: &[DiagnosticEntry]) -> Result<()> {
    let errors_dir = lake_root.join("_errors");
    let run_path = errors_dir.join(format!("{run_id}.json"));
    atomic_write_json(&run_path, &entries, true)?;

    let index_path = errors_dir.join("index.json");
    let mut index: ErrorsIndex = std::fs::read_to_string(&index_path)
        .ok()
        .and_then(|raw| serde_json::from_str(&raw).ok())
        .unwrap_or_default();

    index.runs.retain(|r| r != run_id);
    index.runs.insert(0, run_id.to_string());

    while index.runs.len() > MAX_RETAINED_RUNS {
        if let Some(evicted) = index.runs.pop() {
            let evicted_path = errors_dir.join(format!("{evicted}.json"));
            if evicted_path.exists() {
                std::fs::remove_file(&evicted_path).map_err(RpaxError::from)?;
            }
        }
    }

    atomic_write_json(&index_path, &index, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rpax_core::diagnostics::{DiagnosticContext, Severity};

    fn entry(run_id: &str) -> DiagnosticEntry {
        DiagnosticEntry {
            error_id: "1".into(),
            run_id: run_id.into(),
            timestamp: chrono::Utc::now(),
            severity: Severity::Warning,
            error_kind: "test".into(),
            message: "m".into(),
            context: DiagnosticContext::default(),
            stack_trace: vec![],
        }
    }

    #[test]
    fn flush_writes_run_file_and_updates_index() {
        let dir = tempfile::tempdir().unwrap();
        flush_diagnostics(dir.path(), "run-1", &[entry("run-1")]).unwrap();
        assert!(dir.path().join("_errors").join("run-1.json").exists());
        let idx_raw = std::fs::read_to_string(dir.path().join("_errors").join("index.json")).unwrap();
        let idx: ErrorsIndex = serde_json::from_str(&idx_raw).unwrap();
        assert_eq!(idx.runs, vec!["run-1".to_string()]);
    }

    #[test]
    fn ring_buffer_evicts_oldest_past_limit() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..(MAX_RETAINED_RUNS + 5) {
            let run_id = format!("run-{i}");
            flush_diagnostics(dir.path(), &run_id, &[entry(&run_id)]).unwrap();
        }
        let idx_raw = std::fs::read_to_string(dir.path().join("_errors").join("index.json")).unwrap();
        let idx: ErrorsIndex = serde_json::from_str(&idx_raw).unwrap();
        assert_eq!(idx.runs.len(), MAX_RETAINED_RUNS);
        assert!(!dir.path().join("_errors").join("run-0.json").exists());
        assert!(dir.path().join("_errors").join(format!("run-{}.json", MAX_RETAINED_RUNS + 4)).exists());
    }
}
