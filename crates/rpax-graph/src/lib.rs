pub mod callgraph;
pub mod pseudocode;

pub use callgraph::build_call_graph;
pub use pseudocode::{generate_pseudocode, generate_recursive_pseudocode};
