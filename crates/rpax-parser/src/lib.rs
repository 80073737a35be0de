pub mod arguments;
pub mod discover;
pub mod invocation;
pub mod namespaces;
pub mod packages;
pub mod pipeline;
pub mod visibility;
pub mod xaml;
pub mod xml_tree;

pub use discover::{discover_workflows, DiscoveryConfig, DiscoveryRecord, DiscoveryResult};
pub use pipeline::{parse_workflow_file, ParsedWorkflow};
