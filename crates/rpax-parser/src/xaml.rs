//! Activity-tree extraction: turn a raw XML element tree
//! (`xml_tree::RawElement`) into the stable, content-addressed
//! `ActivityTree` the rest of rpax operates on.

use crate::visibility::{classify, is_structural_blacklisted, Visibility};
use crate::xml_tree::RawElement;
use once_cell::sync::Lazy;
use regex::Regex;
use rpax_core::activity::{ActivityNode, ActivityTree, ContainerBranch};
use rpax_core::identity::{short_hash, sort_json_keys};
use std::collections::{HashMap, HashSet};

static EXPRESSION_BRACKETS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\[.*\]$").unwrap());
static EXPRESSION_HEURISTIC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\w+\.\w+\(|\bnew\s+\w+|=|\bString\.Format\()").unwrap()
});
static IDENTIFIER: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z_][A-Za-z0-9_]*").unwrap());

const VARIABLE_REF_STOPWORDS: &[&str] = &[
    "New", "Nothing", "True", "False", "Is", "IsNot", "And", "Or", "Not", "If", "Then", "Else",
    "DirectCast", "CType", "String", "Format", "Of",
];

const SELECTOR_ACTIVITY_TYPES: &[&str] = &[
    "Click",
    "TypeInto",
    "GetText",
    "SetText",
    "HighlightElement",
    "ElementExists",
    "WaitElementVanish",
    "FindElement",
    "GetAttribute",
    "CheckApp",
    "HoverElement",
    "SelectItem",
];

/// Local-name-only aliases onto the core branch vocabulary, for wrapper
/// tags whose literal suffix does not match a `ContainerBranch` variant
/// name directly (e.g. `TryCatch.Try`).
fn branch_alias(dot_suffix: &str) -> Option<ContainerBranch> {
    match dot_suffix {
        "Try" => Some(ContainerBranch::Body),
        "Action" => Some(ContainerBranch::Actions),
        _ => ContainerBranch::from_wrapper_local_name(dot_suffix),
    }
}

/// Non-dot container tags that imply a branch for whatever is nested
/// beneath them, independent of the dot-wrapper alias table above (e.g.
/// `<Catch>` elements inside a `TryCatch.Catches` wrapper).
fn branch_hint_for_non_dot_tag(local: &str) -> Option<ContainerBranch> {
    match local {
        "Catch" => Some(ContainerBranch::Catch),
        _ => None,
    }
}

fn local_attr_name(key: &str) -> &str {
    match key.rfind(':') {
        Some(idx) => &key[idx + 1..],
        None => key,
    }
}

/// A value looks like an expression if it is VB-style bracketed
/// (`[someExpr]`) or matches a small set of call/assignment/constructor
/// shapes.
pub(crate) fn is_expression_value(value: &str) -> bool {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return false;
    }
    EXPRESSION_BRACKETS.is_match(trimmed) || EXPRESSION_HEURISTIC.is_match(trimmed)
}

fn collect_variable_refs(value: &str, out: &mut HashSet<String>) {
    for m in IDENTIFIER.find_iter(value) {
        let token = m.as_str();
        if token.chars().next().map(|c| c.is_ascii_uppercase()).unwrap_or(false)
            && VARIABLE_REF_STOPWORDS.contains(&token)
        {
            continue;
        }
        if token.len() > 1 {
            out.insert(token.to_string());
        }
    }
}

fn is_selector_activity(local: &str) -> bool {
    SELECTOR_ACTIVITY_TYPES.contains(&local)
}

/// Flatten a single-valued property wrapper element (e.g. `Assign.To`)
/// down to its scalar text content, or the `<complex-structure>` marker
/// when it holds more than a single literal/expression value.
fn flatten_property_wrapper(el: &RawElement) -> String {
    if let Some(text) = &el.text {
        if el.children.is_empty() {
            return text.clone();
        }
    }
    if el.children.len() == 1 {
        let only = &el.children[0];
        if only.children.is_empty() {
            if let Some(text) = &only.text {
                return text.clone();
            }
            return String::new();
        }
    }
    if el.children.is_empty() && el.text.is_none() {
        return String::new();
    }
    "<complex-structure>".to_string()
}

/// Per-(visual-parent, activity-type) sibling counters for node-ID
/// assignment (4.C4 "Stable node identity").
type SiblingCounts = HashMap<(String, String), u32>;

fn child_raw_paths(parent_path: &str, children: &[RawElement]) -> Vec<String> {
    let mut totals: HashMap<&str, u32> = HashMap::new();
    for c in children {
        *totals.entry(c.local_name()).or_insert(0) += 1;
    }
    let mut running: HashMap<&str, u32> = HashMap::new();
    children
        .iter()
        .map(|c| {
            let name = c.local_name();
            let total = totals[name];
            let idx = running.entry(name).or_insert(0);
            *idx += 1;
            if total <= 1 {
                format!("{parent_path}/{name}")
            } else {
                format!("{parent_path}/{name}[{idx}]")
            }
        })
        .collect()
}

/// Per-project overrides to the visibility rules (4.C4), sourced from
/// `.rpax.json`'s `parser.custom_blacklist`/`parser.custom_whitelist`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParserOptions<'a> {
    pub custom_blacklist: &'a [String],
    pub custom_whitelist: &'a [String],
}

/// Build the full activity tree from a parsed XAML document's root
/// element. The document root itself (an `<Activity>` serialization
/// wrapper) is transparently descended if it is not a visual activity.
pub fn build_activity_tree(root: &RawElement) -> ActivityTree {
    build_activity_tree_with_options(root, ParserOptions::default())
}

/// Same as [`build_activity_tree`], with the project's visibility
/// overrides applied at every classification decision.
pub fn build_activity_tree_with_options(root: &RawElement, options: ParserOptions<'_>) -> ActivityTree {
    let mut nodes = Vec::new();
    let mut sibling_counts: SiblingCounts = HashMap::new();
    let root_raw_path = format!("/{}", root.local_name());
    let ids = visit(root, 0, None, None, &root_raw_path, &mut sibling_counts, &mut nodes, &options);
    ActivityTree {
        root_node_id: ids.into_iter().next(),
        nodes,
    }
}

/// Visit an arbitrary element. Returns the node-IDs of the visual
/// activities found at or transparently beneath it, in document order.
#[allow(clippy::too_many_arguments)]
fn visit(
    el: &RawElement,
    next_depth: u32,
    parent_visual: Option<(&str, &str)>,
    pending_branch: Option<ContainerBranch>,
    raw_path: &str,
    sibling_counts: &mut SiblingCounts,
    nodes: &mut Vec<ActivityNode>,
    options: &ParserOptions<'_>,
) -> Vec<String> {
    let local = el.local_name();
    if local.contains('.') {
        // A property wrapper encountered with no visual node to flatten
        // into (e.g. nested generics under a transparent container).
        // Descend looking for visual content, carrying the branch along.
        let mut ids = Vec::new();
        let paths = child_raw_paths(raw_path, &el.children);
        for (child, child_path) in el.children.iter().zip(paths) {
            ids.extend(visit(
                child,
                next_depth,
                parent_visual,
                pending_branch,
                &child_path,
                sibling_counts,
                nodes,
                options,
            ));
        }
        return ids;
    }

    let has_display_name = el.attr("DisplayName").is_some();
    match classify(
        local,
        false,
        has_display_name,
        options.custom_blacklist,
        options.custom_whitelist,
    ) {
        Visibility::Visual => vec![make_node(
            el,
            next_depth,
            parent_visual,
            pending_branch,
            raw_path,
            sibling_counts,
            nodes,
            options,
        )],
        Visibility::Structural => {
            if is_structural_blacklisted(local) {
                Vec::new()
            } else {
                let branch = branch_hint_for_non_dot_tag(local).or(pending_branch);
                let mut ids = Vec::new();
                let paths = child_raw_paths(raw_path, &el.children);
                for (child, child_path) in el.children.iter().zip(paths) {
                    ids.extend(visit(
                        child,
                        next_depth,
                        parent_visual,
                        branch,
                        &child_path,
                        sibling_counts,
                        nodes,
                        options,
                    ));
                }
                ids
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn make_node(
    el: &RawElement,
    depth: u32,
    parent_visual: Option<(&str, &str)>,
    container_branch: Option<ContainerBranch>,
    raw_path: &str,
    sibling_counts: &mut SiblingCounts,
    nodes: &mut Vec<ActivityNode>,
    options: &ParserOptions<'_>,
) -> String {
    let local = el.local_name().to_string();
    let (parent_id, parent_path) = match parent_visual {
        Some((id, path)) => (id.to_string(), path.to_string()),
        None => (String::new(), String::new()),
    };

    let key = (parent_id.clone(), local.clone());
    let idx = *sibling_counts.get(&key).unwrap_or(&0);
    sibling_counts.insert(key, idx + 1);
    let suffix = if idx == 0 { local.clone() } else { format!("{local}[{idx}]") };
    let node_id = if parent_path.is_empty() {
        format!("/{suffix}")
    } else {
        format!("{parent_path}/{suffix}")
    };

    let mut display_name = None;
    let mut annotation = None;
    let mut properties = HashMap::new();
    let mut is_expression = HashMap::new();
    let mut selectors = HashMap::new();
    let mut invocation_target = None;
    let mut referenced_variables = HashSet::new();

    for (key, value) in &el.attributes {
        if key.starts_with("xmlns") {
            continue;
        }
        let attr_local = local_attr_name(key);
        if attr_local == "DisplayName" {
            display_name = Some(value.clone());
            continue;
        }
        if attr_local.ends_with("Annotation.AnnotationText") {
            annotation = Some(value.clone());
            continue;
        }
        if attr_local.contains("ViewState") || attr_local.contains("VirtualizedContainer") {
            continue;
        }
        if attr_local == "WorkflowFileName" {
            invocation_target = Some(value.clone());
        }
        if is_selector_activity(&local) && matches!(attr_local, "Selector" | "Target" | "TargetAnchorable") {
            selectors.insert(attr_local.to_string(), value.clone());
        }
        if is_expression_value(value) {
            is_expression.insert(attr_local.to_string(), true);
            collect_variable_refs(value, &mut referenced_variables);
        }
        properties.insert(attr_local.to_string(), value.clone());
    }

    let mut child_node_ids = Vec::new();
    let child_paths = child_raw_paths(raw_path, &el.children);
    for (child, child_path) in el.children.iter().zip(child_paths) {
        let child_local = child.local_name();
        if child_local.contains('.') {
            let dot_suffix = child_local.rsplit('.').next().unwrap_or(child_local);
            if let Some(branch) = branch_alias(dot_suffix) {
                let grandchild_paths = child_raw_paths(&child_path, &child.children);
                for (grandchild, grandchild_path) in child.children.iter().zip(grandchild_paths) {
                    child_node_ids.extend(visit(
                        grandchild,
                        depth + 1,
                        Some((node_id.as_str(), node_id.as_str())),
                        Some(branch),
                        &grandchild_path,
                        sibling_counts,
                        nodes,
                        options,
                    ));
                }
            } else {
                let value = flatten_property_wrapper(child);
                if is_expression_value(&value) {
                    is_expression.insert(dot_suffix.to_string(), true);
                    collect_variable_refs(&value, &mut referenced_variables);
                }
                properties.insert(dot_suffix.to_string(), value);
            }
        } else {
            child_node_ids.extend(visit(
                child,
                depth + 1,
                Some((node_id.as_str(), node_id.as_str())),
                None,
                &child_path,
                sibling_counts,
                nodes,
                options,
            ));
        }
    }

    let content_hash8 = element_content_hash8(&local, &properties, container_branch);

    nodes.push(ActivityNode {
        node_id: node_id.clone(),
        activity_type: local,
        display_name,
        annotation,
        depth,
        parent_node_id: if parent_id.is_empty() { None } else { Some(parent_id) },
        child_node_ids,
        visible: true,
        properties,
        is_expression,
        invocation_target,
        selectors,
        referenced_variables,
        container_branch,
        xpath_location: raw_path.to_string(),
        content_hash8,
    });

    node_id
}

/// Per-element content hash (4.C6, §9 open question): SHA-256 over a
/// canonical JSON object of the activity type, its sorted properties, and
/// its container branch, truncated to 8 hex characters. Deliberately
/// excludes `node_id`/`xpath_location`, which encode *position* rather
/// than content, so two structurally identical activities in different
/// places hash the same.
fn element_content_hash8(
    activity_type: &str,
    properties: &HashMap<String, String>,
    container_branch: Option<ContainerBranch>,
) -> String {
    let value = serde_json::json!({
        "activity_type": activity_type,
        "properties": properties,
        "container_branch": container_branch,
    });
    let canonical = sort_json_keys(value).to_string();
    short_hash(canonical.as_bytes(), 8)
}
