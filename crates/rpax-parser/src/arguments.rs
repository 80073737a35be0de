//! Workflow-level argument and variable extraction (spec.md §3 "Workflow",
//! SUPPLEMENT per SPEC_FULL.md §3: variables are extracted alongside
//! arguments since the source's `Sequence.Variables` traversal already
//! visits the wrapper to reach nested visual descendants).
//!
//! `x:Members`/`x:Property` is the standard Windows Workflow Foundation
//! XAML convention for declaring a workflow's `Argument`s; no dedicated
//! extractor for it survived the source's filtering, so this is grounded
//! on that well-known wire format rather than a specific source file.

use crate::xml_tree::RawElement;
use once_cell::sync::Lazy;
use regex::Regex;
use rpax_core::project::{Argument, ArgumentDirection, VariableDecl};
use std::collections::HashSet;

static ARG_TYPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(In|Out|InOut)Argument\((.*)\)$").unwrap()
});

fn find_child<'a>(el: &'a RawElement, local: &str) -> Option<&'a RawElement> {
    el.children.iter().find(|c| c.local_name() == local)
}

fn find_descendant<'a>(el: &'a RawElement, local: &str) -> Vec<&'a RawElement> {
    let mut out = Vec::new();
    collect_descendants(el, local, &mut out);
    out
}

fn collect_descendants<'a>(el: &'a RawElement, local: &str, out: &mut Vec<&'a RawElement>) {
    for child in &el.children {
        if child.local_name() == local {
            out.push(child);
        }
        collect_descendants(child, local, out);
    }
}

fn parse_argument_type(raw: &str) -> (ArgumentDirection, String) {
    if let Some(caps) = ARG_TYPE.captures(raw) {
        let direction = match caps[1].to_lowercase().as_str() {
            "in" => ArgumentDirection::In,
            "out" => ArgumentDirection::Out,
            _ => ArgumentDirection::InOut,
        };
        (direction, caps[2].to_string())
    } else {
        (ArgumentDirection::In, raw.to_string())
    }
}

/// Extract the workflow's declared `Argument`s from its `<x:Members>`
/// block, if present at the document root.
pub fn extract_arguments(root: &RawElement) -> Vec<Argument> {
    let Some(members) = find_child(root, "Members") else {
        return Vec::new();
    };
    members
        .children
        .iter()
        .filter(|c| c.local_name() == "Property")
        .filter_map(|prop| {
            let name = prop.attr("Name")?.to_string();
            let raw_type = prop.attr("Type").unwrap_or("InArgument(x:Object)");
            let (direction, argument_type) = parse_argument_type(raw_type);
            Some(Argument {
                name,
                argument_type,
                direction,
                required: true,
                default: None,
                annotation: None,
            })
        })
        .collect()
}

/// Extract every `Variable` declared under any `*.Variables` wrapper in
/// the document, recording the node-ID of its nearest visual ancestor as
/// `scope_node_id` when that ancestor is resolvable (left `None` here;
/// the activity-tree builder attaches scope separately since this pass
/// runs over the raw XML tree, not the classified activity tree).
pub fn extract_variables(root: &RawElement) -> Vec<VariableDecl> {
    find_descendant(root, "Variable")
        .into_iter()
        .filter_map(|var| {
            let name = var.attr("Name")?.to_string();
            let variable_type = var
                .attr("x:TypeArguments")
                .or_else(|| var.attr("TypeArguments"))
                .unwrap_or("Object")
                .to_string();
            let default_value = var.text.clone().filter(|t| !t.trim().is_empty());
            Some(VariableDecl {
                name,
                variable_type,
                default_value,
                scope_node_id: None,
            })
        })
        .collect()
}

/// Deduplicate variable declarations by name, keeping the first
/// occurrence (outermost scope wins for display purposes).
pub fn dedup_variables(variables: Vec<VariableDecl>) -> Vec<VariableDecl> {
    let mut seen = HashSet::new();
    variables
        .into_iter()
        .filter(|v| seen.insert(v.name.clone()))
        .collect()
}
