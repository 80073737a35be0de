//! `.rpax.json` tool configuration (spec.md §6).
//!
//! Unlike the project descriptor, this schema is closed: unknown keys are
//! rejected at parse time.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ProjectSection {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub root: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScanSection {
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl Default for ScanSection {
    fn default() -> Self {
        Self { exclude: vec![] }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputSchema {
    Legacy,
    V0,
}

impl Default for OutputSchema {
    fn default() -> Self {
        OutputSchema::Legacy
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputSection {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
    #[serde(default)]
    pub formats: Vec<String>,
    #[serde(default)]
    pub summaries: bool,
    #[serde(default)]
    pub generate_activities: bool,
    #[serde(default)]
    pub schema: OutputSchema,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".rpax-lake")
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            formats: vec!["json".to_string()],
            summaries: false,
            generate_activities: true,
            schema: OutputSchema::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValidationSection {
    #[serde(default)]
    pub fail_on_missing: bool,
    #[serde(default)]
    pub fail_on_cycles: bool,
}

impl Default for ValidationSection {
    fn default() -> Self {
        Self {
            fail_on_missing: false,
            fail_on_cycles: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParserSection {
    #[serde(default = "default_true")]
    pub use_enhanced: bool,
    #[serde(default)]
    pub include_coded_workflows: bool,
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,
    #[serde(default)]
    pub include_structural: bool,
    #[serde(default)]
    pub custom_blacklist: Vec<String>,
    #[serde(default)]
    pub custom_whitelist: Vec<String>,
}

fn default_true() -> bool {
    true
}

fn default_max_depth() -> u32 {
    64
}

impl Default for ParserSection {
    fn default() -> Self {
        Self {
            use_enhanced: true,
            include_coded_workflows: false,
            max_depth: default_max_depth(),
            include_structural: false,
            custom_blacklist: vec![],
            custom_whitelist: vec![],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CycleHandling {
    Mark,
    Stop,
    Ignore,
}

impl Default for CycleHandling {
    fn default() -> Self {
        CycleHandling::Mark
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PseudocodeSection {
    #[serde(default)]
    pub generate_expanded: bool,
    #[serde(default = "default_expansion_depth")]
    pub max_expansion_depth: u32,
    #[serde(default)]
    pub cycle_handling: CycleHandling,
}

fn default_expansion_depth() -> u32 {
    10
}

impl Default for PseudocodeSection {
    fn default() -> Self {
        Self {
            generate_expanded: false,
            max_expansion_depth: default_expansion_depth(),
            cycle_handling: CycleHandling::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct RpaxConfig {
    #[serde(default)]
    pub project: ProjectSection,
    #[serde(default)]
    pub scan: ScanSection,
    #[serde(default)]
    pub output: OutputSection,
    #[serde(default)]
    pub validation: ValidationSection,
    #[serde(default)]
    pub parser: ParserSection,
    #[serde(default)]
    pub pseudocode: PseudocodeSection,
}

impl RpaxConfig {
    pub fn parse(raw: &str) -> crate::Result<Self> {
        serde_json::from_str(raw)
            .map_err(|e| crate::RpaxError::Configuration(format!("invalid .rpax.json: {e}")))
    }

    /// Search upward from `start` for a file named `.rpax.json`, the
    /// teacher's project-root discovery convention (config manager walks
    /// upward until a marker file is found).
    pub fn discover(start: &Path) -> crate::Result<Option<(PathBuf, Self)>> {
        let mut dir = Some(start.to_path_buf());
        while let Some(candidate_dir) = dir {
            let candidate = candidate_dir.join(".rpax.json");
            if candidate.is_file() {
                let raw = std::fs::read_to_string(&candidate)?;
                let config = Self::parse(&raw)?;
                return Ok(Some((candidate, config)));
            }
            dir = candidate_dir.parent().map(Path::to_path_buf);
        }
        Ok(None)
    }
}
