//! Content hashing and identifier derivation (4.C6).

use sha2::{Digest, Sha256};

/// SHA-256 over raw bytes, returned as a lowercase hex string.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// First `n` hex characters of a SHA-256 digest.
pub fn short_hash(bytes: &[u8], n: usize) -> String {
    let full = sha256_hex(bytes);
    full.chars().take(n).collect()
}

/// Lowercase, hyphenate, collapse, trim, truncate-to-20-codepoints slug.
/// Falls back to "unnamed" when the result would be empty.
pub fn slugify(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut prev_was_dash = false;
    for ch in name.chars() {
        let lower: Vec<char> = ch.to_lowercase().collect();
        for lc in lower {
            if lc.is_ascii_alphanumeric() {
                out.push(lc);
                prev_was_dash = false;
            } else if !prev_was_dash {
                out.push('-');
                prev_was_dash = true;
            }
        }
    }
    let trimmed = out.trim_matches('-');
    let truncated: String = trimmed.chars().take(20).collect();
    let truncated = truncated.trim_matches('-');
    if truncated.is_empty() {
        "unnamed".to_string()
    } else {
        truncated.to_string()
    }
}

/// Project slug: `slug-of(name) + "-" + short-hash-of(canonical-descriptor)` (4.C6).
pub fn project_slug(name: &str, canonical_descriptor_json: &str) -> String {
    let slug = slugify(name);
    let hash = short_hash(canonical_descriptor_json.as_bytes(), 10);
    format!("{slug}-{hash}")
}

/// Recursively sort a JSON value's object keys so that the serialized form
/// is deterministic (used for canonical descriptor hashing).
pub fn sort_json_keys(value: serde_json::Value) -> serde_json::Value {
    use serde_json::Value;
    match value {
        Value::Object(map) => {
            let mut sorted = serde_json::Map::new();
            let mut keys: Vec<_> = map.keys().cloned().collect();
            keys.sort();
            for k in keys {
                sorted.insert(k.clone(), sort_json_keys(map[&k].clone()));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_json_keys).collect()),
        other => other,
    }
}

/// Workflow composite identifier: `{project-slug}#{workflow-id}#{short-hash}`.
pub fn workflow_composite_id(project_slug: &str, workflow_id: &str, short_hash: &str) -> String {
    format!("{project_slug}#{workflow_id}#{short_hash}")
}

/// Activity composite identifier:
/// `{project-slug}#{workflow-id}#{node-id}#{8-hex-content-hash}`.
pub fn activity_composite_id(
    project_slug: &str,
    workflow_id: &str,
    node_id: &str,
    element_hash8: &str,
) -> String {
    format!("{project_slug}#{workflow_id}#{node_id}#{element_hash8}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_is_bounded_and_safe() {
        let s = slugify("My Super Cool RPA Project!!");
        assert!(s.chars().all(|c| c.is_ascii_alphanumeric() || c == '-'));
        assert!(s.len() <= 20);
        assert!(!s.contains("--"));
        assert!(!s.starts_with('-') && !s.ends_with('-'));
    }

    #[test]
    fn empty_name_falls_back_to_unnamed() {
        assert_eq!(slugify("***"), "unnamed");
        assert_eq!(slugify(""), "unnamed");
    }

    #[test]
    fn project_slug_matches_invariant_pattern() {
        let slug = project_slug("Invoice Bot", r#"{"name":"Invoice Bot"}"#);
        let re_ok = slug
            .chars()
            .enumerate()
            .all(|(i, c)| if i == 0 { c.is_ascii_alphanumeric() } else { c.is_ascii_alphanumeric() || c == '-' });
        assert!(re_ok, "slug {slug} violates safety invariant");
        assert!(!slug.contains(','));
    }

    #[test]
    fn short_hash_is_prefix_of_full_hash() {
        let full = sha256_hex(b"hello");
        let short = short_hash(b"hello", 16);
        assert_eq!(&full[..16], short);
    }
}
