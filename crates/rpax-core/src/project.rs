use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Kind of RPA project, derived from the descriptor's `outputType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectKind {
    Process,
    Library,
}

impl Default for ProjectKind {
    fn default() -> Self {
        ProjectKind::Process
    }
}

/// Expression language declared by the project descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpressionLanguage {
    VisualBasic,
    CSharp,
}

impl Default for ExpressionLanguage {
    fn default() -> Self {
        ExpressionLanguage::VisualBasic
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgumentDirection {
    In,
    Out,
    InOut,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Argument {
    pub name: String,
    #[serde(rename = "type")]
    pub argument_type: String,
    pub direction: ArgumentDirection,
    #[serde(default)]
    pub required: bool,
    pub default: Option<String>,
    pub annotation: Option<String>,
}

/// A workflow-scoped variable declaration, extracted from `*.Variables` wrappers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub variable_type: String,
    pub default_value: Option<String>,
    pub scope_node_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryPoint {
    pub file_path: String,
    pub unique_id: String,
    #[serde(default)]
    pub input_arguments: Vec<Argument>,
    #[serde(default)]
    pub output_arguments: Vec<Argument>,
}

/// The project descriptor (`project.json`). Immutable after parse.
///
/// Unknown fields are retained verbatim in `extra` for forward
/// compatibility (4.C2 failure modes: unknown field -> retain).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectDescriptor {
    pub name: String,
    pub main: String,
    pub project_id: Option<String>,
    #[serde(default)]
    pub dependencies: HashMap<String, String>,
    #[serde(default)]
    pub entry_points: Vec<EntryPoint>,
    #[serde(default)]
    pub kind: ProjectKind,
    #[serde(default)]
    pub expression_language: ExpressionLanguage,
    pub schema_version: Option<String>,
    pub target_framework: Option<String>,
    /// Fields present in the JSON document that this struct does not
    /// model explicitly. Preserved verbatim, never interpreted.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ProjectDescriptor {
    /// Parse a `project.json` document.
    ///
    /// Fatal per 4.C2: malformed JSON or a missing required field
    /// (`name`, `main`) bubbles up as `RpaxError::Descriptor`.
    pub fn parse(raw: &str) -> crate::Result<Self> {
        let value: serde_json::Value = serde_json::from_str(raw)
            .map_err(|e| crate::RpaxError::Descriptor(format!("malformed JSON: {e}")))?;

        let obj = value
            .as_object()
            .ok_or_else(|| crate::RpaxError::Descriptor("descriptor is not a JSON object".into()))?;

        if !obj.contains_key("name") {
            return Err(crate::RpaxError::Descriptor(
                "missing required field 'name'".into(),
            ));
        }
        if !obj.contains_key("main") {
            return Err(crate::RpaxError::Descriptor(
                "missing required field 'main'".into(),
            ));
        }

        serde_json::from_value(value)
            .map_err(|e| crate::RpaxError::Descriptor(format!("invalid descriptor shape: {e}")))
    }

    /// Canonical form used for project-slug hashing: sorted keys, compact
    /// separators (4.C6).
    pub fn canonical_json(&self) -> crate::Result<String> {
        let value = serde_json::to_value(self)?;
        let sorted = crate::identity::sort_json_keys(value);
        serde_json::to_string(&sorted).map_err(Into::into)
    }
}
