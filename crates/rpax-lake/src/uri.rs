//! URI resolver (4.C11): bidirectional map between abstract lake URIs and
//! filesystem paths, scoped to the `v0` schema layout.

use rpax_core::{Result, RpaxError};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LakeUri {
    Projects,
    Project { slug: String, sub_path: Option<String> },
    Workflows { slug: String },
    Workflow { slug: String, workflow_id: String },
    EntryPoint { slug: String, category: String, name: String },
    CallGraph { slug: String, file: String },
}

pub struct UriResolver {
    scheme: String,
    lake_name: String,
}

impl UriResolver {
    pub fn new(scheme: impl Into<String>, lake_name: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            lake_name: lake_name.into(),
        }
    }

    fn prefix(&self) -> String {
        format!("{}://{}/", self.scheme, self.lake_name)
    }

    /// Parse a URI of shape `<scheme>://<lake-name>/<resource-type>/<tail...>`.
    pub fn parse(&self, uri: &str) -> Result<LakeUri> {
        let prefix = self.prefix();
        let rest = uri
            .strip_prefix(&prefix)
            .ok_or_else(|| RpaxError::Uri(format!("uri '{uri}' does not match scheme/lake '{prefix}'")))?;

        let parts: Vec<&str> = rest.split('/').filter(|p| !p.is_empty()).collect();
        match parts.as_slice() {
            ["projects"] => Ok(LakeUri::Projects),
            ["projects", slug] => Ok(LakeUri::Project {
                slug: slug.to_string(),
                sub_path: None,
            }),
            ["projects", slug, tail @ ..] if !tail.is_empty() => Ok(LakeUri::Project {
                slug: slug.to_string(),
                sub_path: Some(tail.join("/")),
            }),
            ["workflows", slug] => Ok(LakeUri::Workflows { slug: slug.to_string() }),
            ["workflows", slug, wf] => Ok(LakeUri::Workflow {
                slug: slug.to_string(),
                workflow_id: wf.to_string(),
            }),
            ["entry_points", slug, category, name] => Ok(LakeUri::EntryPoint {
                slug: slug.to_string(),
                category: category.to_string(),
                name: name.to_string(),
            }),
            ["call_graphs", slug, file] => Ok(LakeUri::CallGraph {
                slug: slug.to_string(),
                file: file.to_string(),
            }),
            _ => Err(RpaxError::Uri(format!("unrecognized resource type in uri '{uri}'"))),
        }
    }

    /// Map a parsed URI to its filesystem tail (relative to the lake root).
    pub fn to_path(&self, uri: &LakeUri) -> PathBuf {
        match uri {
            LakeUri::Projects => PathBuf::from("projects.json"),
            LakeUri::Project { slug, sub_path: None } => {
                Path::new(slug).join("v0").join("manifest.json")
            }
            LakeUri::Project { slug, sub_path: Some(sub) } => Path::new(slug).join("v0").join(sub),
            LakeUri::Workflows { slug } => Path::new(slug).join("v0").join("workflows").join("index.json"),
            LakeUri::Workflow { slug, workflow_id } => Path::new(slug)
                .join("v0")
                .join("workflows")
                .join(format!("{workflow_id}.json")),
            LakeUri::EntryPoint { slug, category, name } => Path::new(slug)
                .join("v0")
                .join("entry_points")
                .join(category)
                .join(name),
            LakeUri::CallGraph { slug, file } => Path::new(slug).join("v0").join("call_graphs").join(file),
        }
    }

    /// Render a parsed URI back to its canonical string form.
    pub fn to_uri(&self, uri: &LakeUri) -> String {
        let prefix = self.prefix();
        match uri {
            LakeUri::Projects => format!("{prefix}projects"),
            LakeUri::Project { slug, sub_path: None } => format!("{prefix}projects/{slug}"),
            LakeUri::Project { slug, sub_path: Some(sub) } => format!("{prefix}projects/{slug}/{sub}"),
            LakeUri::Workflows { slug } => format!("{prefix}workflows/{slug}"),
            LakeUri::Workflow { slug, workflow_id } => format!("{prefix}workflows/{slug}/{workflow_id}"),
            LakeUri::EntryPoint { slug, category, name } => {
                format!("{prefix}entry_points/{slug}/{category}/{name}")
            }
            LakeUri::CallGraph { slug, file } => format!("{prefix}call_graphs/{slug}/{file}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_project_uri() {
        let resolver = UriResolver::new("rpax", "dev");
        let uri = "rpax://dev/projects/demo-abc";
        let parsed = resolver.parse(uri).unwrap();
        assert_eq!(resolver.to_uri(&parsed), uri);
    }

    #[test]
    fn round_trips_workflow_uri() {
        let resolver = UriResolver::new("rpax", "dev");
        let uri = "rpax://dev/workflows/demo-abc/Main";
        let parsed = resolver.parse(uri).unwrap();
        assert_eq!(resolver.to_uri(&parsed), uri);
        assert_eq!(resolver.to_path(&parsed), PathBuf::from("demo-abc/v0/workflows/Main.json"));
    }

    #[test]
    fn rejects_unknown_scheme() {
        let resolver = UriResolver::new("rpax", "dev");
        assert!(resolver.parse("other://dev/projects").is_err());
    }

    #[test]
    fn rejects_unknown_resource_type() {
        let resolver = UriResolver::new("rpax", "dev");
        assert!(resolver.parse("rpax://dev/bogus/thing").is_err());
    }

    #[test]
    fn path_to_uri_round_trips_for_call_graph() {
        let resolver = UriResolver::new("rpax", "dev");
        let uri = "rpax://dev/call_graphs/demo-abc/project_medium.json";
        let parsed = resolver.parse(uri).unwrap();
        let path = resolver.to_path(&parsed);
        assert_eq!(path, PathBuf::from("demo-abc/v0/call_graphs/project_medium.json"));
        assert_eq!(resolver.to_uri(&parsed), uri);
    }
}
