//! Namespace declaration extraction and namespace-URI-to-package mapping.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

const SYSTEM_NAMESPACE_PREFIXES: &[&str] = &[
    "http://schemas.microsoft.com/winfx/2006/xaml",
    "http://schemas.microsoft.com/netfx/2009/xaml/activities",
    "http://schemas.microsoft.com/winfx/2006/xaml/presentation",
    "http://schemas.openxmlformats.org/markup-compatibility/2006",
    "http://schemas.microsoft.com/netfx/2009/xaml/activities/presentation",
    "http://schemas.microsoft.com/netfx/2010/xaml/activities/presentation",
    "clr-namespace:System",
    "clr-namespace:Microsoft.VisualBasic",
];

static UIPATH_WORKFLOW_NS: &str = "http://schemas.uipath.com/workflow/activities";
static CLR_NAMESPACE_UIPATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^clr-namespace:UiPath\.([^;]+)(?:;assembly=([^;]+))?").unwrap());
static CLR_NAMESPACE_ASSEMBLY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"assembly=([^;]+)").unwrap());

/// Extract `xmlns`/`xmlns:*` declarations from the root element's raw
/// attributes. Text-level extraction is unnecessary here because the
/// non-namespace-aware `quick-xml` reader already preserves these as
/// ordinary attributes on the `Start` event.
pub fn extract_namespaces(root_attributes: &[(String, String)]) -> HashMap<String, String> {
    let mut namespaces = HashMap::new();
    for (key, value) in root_attributes {
        if key == "xmlns" {
            namespaces.insert(String::new(), value.clone());
        } else if let Some(prefix) = key.strip_prefix("xmlns:") {
            namespaces.insert(prefix.to_string(), value.clone());
        }
    }
    namespaces
}

fn is_system_namespace(uri: &str) -> bool {
    SYSTEM_NAMESPACE_PREFIXES
        .iter()
        .any(|sys| uri == *sys || uri.starts_with(sys))
}

/// Extract a canonical package name from a single namespace URI, or
/// `None` for system/unrecognized namespaces.
pub fn package_name_from_namespace(uri: &str) -> Option<String> {
    if is_system_namespace(uri) {
        return None;
    }
    if uri == UIPATH_WORKFLOW_NS || uri.starts_with(UIPATH_WORKFLOW_NS) {
        return Some("UiPath.System.Activities".to_string());
    }
    if let Some(caps) = CLR_NAMESPACE_UIPATH.captures(uri) {
        return Some(format!("UiPath.{}", &caps[1]));
    }
    if uri.starts_with("clr-namespace:") && uri.contains("UiPath") {
        if let Some(caps) = CLR_NAMESPACE_ASSEMBLY.captures(uri) {
            return Some(caps[1].to_string());
        }
    }
    None
}

/// Derive the set of package names used by a workflow from its namespace
/// declarations, sorted for deterministic output.
pub fn packages_from_namespaces(namespaces: &HashMap<String, String>) -> Vec<String> {
    let mut packages: Vec<String> = namespaces
        .values()
        .filter_map(|uri| package_name_from_namespace(uri))
        .collect();
    packages.sort();
    packages.dedup();
    packages
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_prefixed_and_default_namespaces() {
        let attrs = vec![
            ("xmlns".to_string(), "http://schemas.uipath.com/workflow/activities".to_string()),
            ("xmlns:x".to_string(), "http://schemas.microsoft.com/winfx/2006/xaml".to_string()),
        ];
        let ns = extract_namespaces(&attrs);
        assert_eq!(ns.get(""), Some(&"http://schemas.uipath.com/workflow/activities".to_string()));
        assert_eq!(ns.len(), 2);
    }

    #[test]
    fn system_namespaces_produce_no_package() {
        assert_eq!(
            package_name_from_namespace("http://schemas.microsoft.com/winfx/2006/xaml"),
            None
        );
    }

    #[test]
    fn uipath_workflow_namespace_maps_to_system_activities() {
        assert_eq!(
            package_name_from_namespace("http://schemas.uipath.com/workflow/activities"),
            Some("UiPath.System.Activities".to_string())
        );
    }

    #[test]
    fn clr_namespace_extracts_assembly() {
        let uri = "clr-namespace:UiPath.Excel.Activities;assembly=UiPath.Excel.Activities";
        assert_eq!(
            package_name_from_namespace(uri),
            Some("UiPath.Excel.Activities".to_string())
        );
    }
}
