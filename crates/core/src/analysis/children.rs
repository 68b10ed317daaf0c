// Parent -> children index for deterministic ordering

use crate::graph::FlowGraph;
use serde::Serialize;
use std::collections::BTreeMap;

/// Parent name -> children, sorted by name and free of duplicates.
///
/// Parents are trigger names (steps or router path labels) and routers.
/// Lists are sorted when the map is built, so what `children` returns is
/// already the order `child_index` uses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ParentChildren {
    children: BTreeMap<String, Vec<String>>,
}

impl ParentChildren {
    /// Children of `parent`, empty when it has none
    pub fn children(&self, parent: &str) -> &[String] {
        self.children
            .get(parent)
            .map(|c| c.as_slice())
            .unwrap_or(&[])
    }

    /// Zero-based position of `child` among the children of `parent`
    pub fn child_index(&self, parent: &str, child: &str) -> Option<usize> {
        self.children(parent)
            .binary_search_by(|c| c.as_str().cmp(child))
            .ok()
    }

    pub fn parents(&self) -> impl Iterator<Item = &str> {
        self.children.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    fn add(&mut self, parent: &str, child: &str) {
        let list = self.children.entry(parent.to_string()).or_default();
        if !list.iter().any(|c| c == child) {
            list.push(child.to_string());
        }
    }
}

/// Build the parent -> children map of a flow.
///
/// Every listener is a child of each of its triggers, and of every router
/// that can emit one of the labels it waits on.
pub fn build_parent_children(graph: &FlowGraph) -> ParentChildren {
    let mut map = ParentChildren::default();

    for listener in graph.listeners() {
        for trigger in &listener.triggers {
            map.add(trigger, &listener.name);
        }
    }

    for router in graph.routers() {
        for (_, listener) in graph.path_listeners(&router.name) {
            map.add(&router.name, &listener.name);
        }
    }

    for list in map.children.values_mut() {
        list.sort();
    }

    map
}

/// Position of `child` under `parent`, or `None` if it is not a child
pub fn child_index(parent: &str, child: &str, map: &ParentChildren) -> Option<usize> {
    map.child_index(parent, child)
}

/// Number of listeners naming each step directly as a trigger.
///
/// Every step has an entry. Path labels are not steps and are not counted.
pub fn count_outgoing_edges(graph: &FlowGraph) -> BTreeMap<String, usize> {
    let mut counts: BTreeMap<String, usize> = graph
        .steps()
        .iter()
        .map(|step| (step.name.clone(), 0))
        .collect();

    for listener in graph.listeners() {
        for trigger in &listener.triggers {
            if let Some(count) = counts.get_mut(trigger) {
                *count += 1;
            }
        }
    }

    counts
}
