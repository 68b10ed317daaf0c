// Dependency analyses over a flow graph

pub mod ancestors;
pub mod children;
pub mod levels;

pub use ancestors::{compute_ancestors, is_ancestor, AncestorMap};
pub use children::{build_parent_children, child_index, count_outgoing_edges, ParentChildren};
pub use levels::{compute_levels, LevelMap};

use crate::graph::FlowGraph;
use serde::Serialize;
use std::collections::BTreeMap;

/// All graph analyses of one flow, ready to hand to a visualization layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowAnalysis {
    pub levels: LevelMap,
    pub ancestors: AncestorMap,
    pub children: ParentChildren,
    pub outgoing_edges: BTreeMap<String, usize>,
    /// Steps no entry point can reach, in registration order
    pub unreachable: Vec<String>,
}

impl FlowAnalysis {
    pub fn compute(graph: &FlowGraph) -> Self {
        let levels = compute_levels(graph);
        let unreachable: Vec<String> = graph
            .steps()
            .iter()
            .filter(|step| !levels.contains_key(&step.name))
            .map(|step| step.name.clone())
            .collect();

        if !unreachable.is_empty() {
            tracing::debug!("Unreachable steps: {}", unreachable.join(", "));
        }

        let analysis = Self {
            ancestors: compute_ancestors(graph),
            children: build_parent_children(graph),
            outgoing_edges: count_outgoing_edges(graph),
            levels,
            unreachable,
        };

        tracing::debug!(
            "Analyzed flow: {} steps, {} levelled, {} parents",
            graph.steps().len(),
            analysis.levels.len(),
            analysis.children.len()
        );

        analysis
    }

    /// Highest level assigned to any step
    pub fn depth(&self) -> Option<usize> {
        self.levels.values().copied().max()
    }
}
