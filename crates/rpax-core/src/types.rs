use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub file_path: String,
    pub line: u32,
    pub column: u32,
    pub end_line: Option<u32>,
    pub end_column: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowKind {
    Xaml,
    Coded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvocationKind {
    Static,
    Dynamic,
    Missing,
    Coded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CycleClassification {
    #[serde(rename = "self")]
    SelfCycle,
    Mutual,
    Complex,
}

impl CycleClassification {
    pub fn from_len(len: usize) -> Self {
        match len {
            1 => CycleClassification::SelfCycle,
            2 => CycleClassification::Mutual,
            _ => CycleClassification::Complex,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DependencyClassification {
    VendorOfficial,
    CustomLocal,
    ThirdParty,
    Ambiguous,
}
