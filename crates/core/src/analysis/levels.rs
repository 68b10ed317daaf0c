// Breadth-first level assignment with AND-join gating

use crate::graph::FlowGraph;
use crate::types::JoinMode;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

/// Step name -> minimum level. Steps missing from the map are unreachable.
pub type LevelMap = BTreeMap<String, usize>;

/// Compute the level of every step reachable from an entry point.
///
/// Entry points sit at level 0. An OR-listener takes one more than the
/// lowest level among the triggers that fired; an AND-listener is only
/// levelled once its last trigger is dequeued, one above that trigger's
/// level. Listeners bound to a router's path labels are levelled as OR
/// listeners of the router.
pub fn compute_levels(graph: &FlowGraph) -> LevelMap {
    let mut levels = LevelMap::new();
    let mut queue: VecDeque<&str> = VecDeque::new();
    let mut visited: HashSet<&str> = HashSet::new();
    let mut pending_and: HashMap<&str, HashSet<&str>> = HashMap::new();

    for step in graph.entry_points() {
        levels.insert(step.name.clone(), 0);
        queue.push_back(step.name.as_str());
    }

    while let Some(current) = queue.pop_front() {
        let Some(&level) = levels.get(current) else {
            continue;
        };
        visited.insert(current);

        for listener in graph.listeners_of(current) {
            match listener.join_mode {
                JoinMode::Or => {
                    propose(&mut levels, &mut queue, &visited, &listener.name, level + 1);
                }
                JoinMode::And => {
                    let satisfied = pending_and.entry(listener.name.as_str()).or_default();
                    satisfied.insert(current);
                    // Triggers are de-duplicated, so equal sizes mean equal sets
                    if satisfied.len() == listener.triggers.len() {
                        propose(&mut levels, &mut queue, &visited, &listener.name, level + 1);
                    }
                }
            }
        }

        for (_, listener) in graph.path_listeners(current) {
            propose(&mut levels, &mut queue, &visited, &listener.name, level + 1);
        }
    }

    levels
}

/// Lower `name` to `level` if that improves it, queueing it unless it has
/// already been expanded.
fn propose<'g>(
    levels: &mut LevelMap,
    queue: &mut VecDeque<&'g str>,
    visited: &HashSet<&'g str>,
    name: &'g str,
    level: usize,
) {
    let improves = levels.get(name).map_or(true, |&current| current > level);
    if improves {
        levels.insert(name.to_string(), level);
        if !visited.contains(name) {
            queue.push_back(name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FlowDefinition, ListenerSpec, RouterSpec, StepSpec};

    fn levels_of(def: FlowDefinition) -> LevelMap {
        let graph = FlowGraph::from_definition(&def).unwrap();
        compute_levels(&graph)
    }

    #[test]
    fn test_end_to_end_levels() {
        let levels = levels_of(
            FlowDefinition::new()
                .step(StepSpec::entry("A"))
                .step(StepSpec::entry("C"))
                .listener(ListenerSpec::or("B", ["A"]))
                .listener(ListenerSpec::and("D", ["B", "C"])),
        );

        assert_eq!(levels.get("A"), Some(&0));
        assert_eq!(levels.get("C"), Some(&0));
        assert_eq!(levels.get("B"), Some(&1));
        assert_eq!(levels.get("D"), Some(&2));
    }

    #[test]
    fn test_and_listener_waits_for_last_trigger() {
        let levels = levels_of(
            FlowDefinition::new()
                .step(StepSpec::entry("a"))
                .listener(ListenerSpec::or("b", ["a"]))
                .listener(ListenerSpec::or("c", ["b"]))
                .listener(ListenerSpec::and("join", ["b", "c"])),
        );

        assert_eq!(levels["b"], 1);
        assert_eq!(levels["c"], 2);
        assert_eq!(levels["join"], 3);
    }

    #[test]
    fn test_and_listener_partially_satisfied_is_unreached() {
        let levels = levels_of(
            FlowDefinition::new()
                .step(StepSpec::entry("a"))
                .step(StepSpec::new("orphan"))
                .listener(ListenerSpec::and("join", ["a", "orphan"])),
        );

        assert_eq!(levels.get("a"), Some(&0));
        assert!(!levels.contains_key("orphan"));
        assert!(!levels.contains_key("join"));
    }

    #[test]
    fn test_or_listener_takes_minimum() {
        let levels = levels_of(
            FlowDefinition::new()
                .step(StepSpec::entry("a"))
                .listener(ListenerSpec::or("b", ["a"]))
                .listener(ListenerSpec::or("c", ["b"]))
                .listener(ListenerSpec::or("any", ["c", "a"])),
        );

        assert_eq!(levels["any"], 1);
        assert_eq!(levels["c"], 2);
    }

    #[test]
    fn test_router_paths_propagate_levels() {
        let levels = levels_of(
            FlowDefinition::new()
                .step(StepSpec::entry("start"))
                .listener(ListenerSpec::or("route", ["start"]))
                .listener(ListenerSpec::or("ship", ["approved"]))
                .listener(ListenerSpec::or("refund", ["rejected"]))
                .listener(ListenerSpec::or("audit", ["ship"]))
                .router(RouterSpec::new("route", ["approved", "rejected"])),
        );

        assert_eq!(levels["route"], 1);
        assert_eq!(levels["ship"], 2);
        assert_eq!(levels["refund"], 2);
        assert_eq!(levels["audit"], 3);
    }

    #[test]
    fn test_no_entry_points_yields_empty_map() {
        let levels = levels_of(
            FlowDefinition::new()
                .step(StepSpec::new("a"))
                .listener(ListenerSpec::or("b", ["a"])),
        );
        assert!(levels.is_empty());
    }

    #[test]
    fn test_dangling_trigger_tolerated() {
        let levels = levels_of(
            FlowDefinition::new()
                .step(StepSpec::entry("a"))
                .listener(ListenerSpec::or("b", ["a", "ghost"]))
                .listener(ListenerSpec::and("c", ["a", "ghost"])),
        );

        assert_eq!(levels.get("a"), Some(&0));
        assert_eq!(levels.get("b"), Some(&1));
        assert!(!levels.contains_key("c"));
        assert!(!levels.contains_key("ghost"));
        assert_eq!(levels.len(), 2);
    }

    #[test]
    fn test_levels_idempotent() {
        let def = FlowDefinition::new()
            .step(StepSpec::entry("a"))
            .listener(ListenerSpec::and("b", ["a", "x"]))
            .listener(ListenerSpec::or("c", ["x"]))
            .router(RouterSpec::new("a", ["x"]));
        let graph = FlowGraph::from_definition(&def).unwrap();

        let first = compute_levels(&graph);
        assert_eq!(first, compute_levels(&graph));
        assert_eq!(first["c"], 1);
        // Path labels never get dequeued, only the router fan-out levels `b`
        assert_eq!(first["b"], 1);
    }
}
