// Transitive ancestor sets with router pass-through

use crate::graph::FlowGraph;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Step name -> every step transitively upstream of it
pub type AncestorMap = BTreeMap<String, BTreeSet<String>>;

/// Compute the ancestor set of every step.
///
/// A listener inherits each trigger plus the trigger's own ancestors. A
/// listener bound to a router path label inherits only the router's
/// ancestors; the router itself is a dispatch point, not a dependency.
///
/// Runs depth-first on an explicit stack. A step is expanded again only when
/// its own set grew, so the result is transitively closed regardless of
/// registration order.
pub fn compute_ancestors(graph: &FlowGraph) -> AncestorMap {
    let mut ancestors: HashMap<&str, BTreeSet<&str>> = graph
        .steps()
        .iter()
        .map(|step| (step.name.as_str(), BTreeSet::new()))
        .collect();

    let mut stack: Vec<&str> = graph
        .steps()
        .iter()
        .rev()
        .map(|step| step.name.as_str())
        .collect();

    while let Some(node) = stack.pop() {
        let inherited = ancestors.get(node).cloned().unwrap_or_default();

        for listener in graph.listeners_of(node) {
            let incoming = inherited.iter().copied().chain(std::iter::once(node));
            if merge(&mut ancestors, &listener.name, incoming) {
                stack.push(&listener.name);
            }
        }

        if graph.is_router(node) {
            for (_, listener) in graph.path_listeners(node) {
                if merge(&mut ancestors, &listener.name, inherited.iter().copied()) {
                    stack.push(&listener.name);
                }
            }
        }
    }

    ancestors
        .into_iter()
        .map(|(node, set)| {
            (
                node.to_string(),
                set.into_iter().map(str::to_string).collect(),
            )
        })
        .collect()
}

/// Add `incoming` to the ancestors of `node`, reporting whether anything was new
fn merge<'g>(
    ancestors: &mut HashMap<&'g str, BTreeSet<&'g str>>,
    node: &'g str,
    incoming: impl IntoIterator<Item = &'g str>,
) -> bool {
    let set = ancestors.entry(node).or_default();
    let before = set.len();
    set.extend(incoming);
    set.len() > before
}

/// Whether `candidate` is upstream of `node`
pub fn is_ancestor(node: &str, candidate: &str, ancestors: &AncestorMap) -> bool {
    ancestors
        .get(node)
        .is_some_and(|set| set.contains(candidate))
}
