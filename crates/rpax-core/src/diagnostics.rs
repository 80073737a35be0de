//! Run-scoped diagnostics collector (4.C13).
//!
//! The only mutable process-wide state in the pipeline. Guarded with
//! `parking_lot::Mutex` (teacher dependency) rather than `std::sync::Mutex`
//! so that collection from a rayon worker pool never poisons the lock.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
    Critical,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiagnosticContext {
    pub operation: String,
    pub component: String,
    pub project_slug: Option<String>,
    pub workflow_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticEntry {
    pub error_id: String,
    pub run_id: String,
    pub timestamp: DateTime<Utc>,
    pub severity: Severity,
    pub error_kind: String,
    pub message: String,
    pub context: DiagnosticContext,
    #[serde(default)]
    pub stack_trace: Vec<String>,
}

/// Generate a run ID of the form `run-YYYYMMDD-HHMMSS-<8hex>`.
///
/// `now` and `random_suffix` are injected so the function stays pure and
/// testable; callers wire up `chrono::Utc::now()` and a random hex string.
pub fn make_run_id(now: DateTime<Utc>, random_suffix: &str) -> String {
    format!("run-{}-{}", now.format("%Y%m%d-%H%M%S"), random_suffix)
}

pub struct DiagnosticsCollector {
    run_id: String,
    entries: Mutex<Vec<DiagnosticEntry>>,
}

impl DiagnosticsCollector {
    pub fn new(run_id: String) -> Self {
        Self {
            run_id,
            entries: Mutex::new(Vec::new()),
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn record(
        &self,
        severity: Severity,
        error_kind: impl Into<String>,
        message: impl Into<String>,
        context: DiagnosticContext,
    ) {
        let entry = DiagnosticEntry {
            error_id: Uuid::new_v4().to_string(),
            run_id: self.run_id.clone(),
            timestamp: Utc::now(),
            severity,
            error_kind: error_kind.into(),
            message: message.into(),
            context,
            stack_trace: Vec::new(),
        };
        self.entries.lock().push(entry);
    }

    pub fn has_critical(&self) -> bool {
        self.entries
            .lock()
            .iter()
            .any(|e| e.severity == Severity::Critical)
    }

    /// Snapshot entries for serialization at flush time.
    pub fn snapshot(&self) -> Vec<DiagnosticEntry> {
        self.entries.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_id_has_expected_shape() {
        let now = DateTime::parse_from_rfc3339("2026-01-02T03:04:05Z")
            .unwrap()
            .with_timezone(&Utc);
        let id = make_run_id(now, "deadbeef");
        assert_eq!(id, "run-20260102-030405-deadbeef");
    }

    #[test]
    fn collector_flags_critical() {
        let c = DiagnosticsCollector::new("run-1".into());
        assert!(!c.has_critical());
        c.record(
            Severity::Warning,
            "resolution",
            "missing target",
            DiagnosticContext::default(),
        );
        assert!(!c.has_critical());
        c.record(
            Severity::Critical,
            "io",
            "disk full",
            DiagnosticContext::default(),
        );
        assert!(c.has_critical());
        assert_eq!(c.len(), 2);
    }
}
