//! Visibility classification (4.C4 "Visibility classification").

use once_cell::sync::Lazy;
use std::collections::HashSet;

static STRUCTURAL_BLACKLIST: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "NamespacesForImplementation",
        "ReferencesForImplementation",
        "Variables",
        "ViewState",
        "AssemblyReference",
        "Collection",
        "Dictionary",
        "Boolean",
        "String",
    ]
    .into_iter()
    .collect()
});

static VISUAL_WHITELIST: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "Sequence",
        "If",
        "TryCatch",
        "Parallel",
        "Pick",
        "Switch",
        "ForEach",
        "While",
        "DoWhile",
        "Flowchart",
        "State",
        "StateMachine",
    ]
    .into_iter()
    .collect()
});

/// `true` for elements that never contain visual activities (view-state
/// noise, literal collections, namespace/reference declarations) and so
/// should be skipped without recursion.
pub fn is_structural_blacklisted(local_name: &str) -> bool {
    STRUCTURAL_BLACKLIST.contains(local_name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Visual,
    Structural,
}

/// Classify an element given its local name and whether it carries a
/// `DisplayName` attribute. Rules applied in order per 4.C4.
pub fn classify(
    local_name: &str,
    has_dot: bool,
    has_display_name: bool,
    extra_blacklist: &[String],
    extra_whitelist: &[String],
) -> Visibility {
    if has_dot {
        return Visibility::Structural;
    }
    if STRUCTURAL_BLACKLIST.contains(local_name) || extra_blacklist.iter().any(|s| s == local_name) {
        return Visibility::Structural;
    }
    if VISUAL_WHITELIST.contains(local_name) || extra_whitelist.iter().any(|s| s == local_name) {
        return Visibility::Visual;
    }
    if has_display_name {
        Visibility::Visual
    } else {
        Visibility::Structural
    }
}
