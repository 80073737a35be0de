pub mod activity;
pub mod callgraph;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod identity;
pub mod package;
pub mod paths;
pub mod project;
pub mod types;
pub mod workflow;

pub use activity::{ActivityNode, ActivityTree, ContainerBranch};
pub use callgraph::{CallGraph, CallGraphDependency, CallGraphMetrics, CallGraphNode, CycleRecord};
pub use config::RpaxConfig;
pub use diagnostics::{DiagnosticContext, DiagnosticEntry, DiagnosticsCollector, Severity};
pub use error::{Result, RpaxError};
pub use package::{PackageAnalysis, PackageUsage};
pub use project::{Argument, ArgumentDirection, EntryPoint, ExpressionLanguage, ProjectDescriptor, ProjectKind, VariableDecl};
pub use types::{CycleClassification, DependencyClassification, InvocationKind, Location, WorkflowKind};
pub use workflow::{Workflow, WorkflowIndex};
