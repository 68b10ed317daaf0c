// Dependency analysis for declarative flow graphs: levels, ancestors,
// child ordering and static router outcome discovery

pub mod analysis;
pub mod definition;
pub mod error;
pub mod graph;
pub mod outcomes;
pub mod types;

pub use analysis::{
    build_parent_children, child_index, compute_ancestors, compute_levels, count_outgoing_edges,
    is_ancestor, AncestorMap, FlowAnalysis, LevelMap, ParentChildren,
};
pub use definition::DefinitionFormat;
pub use error::{FlowGraphError, FlowResult};
pub use graph::{FlowGraph, RouterPaths, TriggerEdge};
pub use outcomes::extract_possible_outcomes;
pub use types::*;
