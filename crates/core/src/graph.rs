// Read-only graph model over a registered flow definition

use crate::error::{FlowGraphError, FlowResult};
use crate::outcomes::extract_possible_outcomes;
use crate::types::{FlowDefinition, ListenerSpec, StepSpec};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::{HashMap, HashSet};

/// Edge kinds in the trigger index
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerEdge {
    /// The source name appears in the listener's trigger list
    Trigger,
    /// The source router can emit this label, which the listener waits on
    Path(String),
}

/// A router with its effective path labels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterPaths {
    pub name: String,
    pub paths: Vec<String>,
}

/// Immutable snapshot of a flow: steps, listeners, routers and the
/// bindings between router path labels and listeners.
///
/// Listeners and routers are steps too; any that were not registered as a
/// step get an implicit non-entry step.
#[derive(Debug, Clone)]
pub struct FlowGraph {
    steps: Vec<StepSpec>,
    step_indices: HashMap<String, usize>,
    listeners: Vec<ListenerSpec>,
    listener_indices: HashMap<String, usize>,
    routers: Vec<RouterPaths>,
    router_indices: HashMap<String, usize>,
    index: DiGraph<String, TriggerEdge>,
    node_indices: HashMap<String, NodeIndex>,
}

impl FlowGraph {
    /// Build a graph snapshot from a flow definition
    pub fn from_definition(definition: &FlowDefinition) -> FlowResult<Self> {
        let mut steps = Vec::new();
        let mut step_indices = HashMap::new();

        for step in &definition.steps {
            check_name(&step.name, "step")?;
            if step_indices.insert(step.name.clone(), steps.len()).is_some() {
                return Err(FlowGraphError::DuplicateStep(step.name.clone()));
            }
            steps.push(step.clone());
        }

        let mut listeners = Vec::new();
        let mut listener_indices = HashMap::new();

        for listener in &definition.listeners {
            check_name(&listener.name, "listener")?;
            if listener.triggers.is_empty() {
                return Err(FlowGraphError::EmptyTriggers(listener.name.clone()));
            }
            if listener_indices
                .insert(listener.name.clone(), listeners.len())
                .is_some()
            {
                return Err(FlowGraphError::DuplicateListener(listener.name.clone()));
            }

            let mut triggers = Vec::with_capacity(listener.triggers.len());
            for trigger in &listener.triggers {
                if !triggers.contains(trigger) {
                    triggers.push(trigger.clone());
                }
            }

            listeners.push(ListenerSpec {
                name: listener.name.clone(),
                join_mode: listener.join_mode,
                triggers,
            });
        }

        let mut routers = Vec::new();
        let mut router_indices = HashMap::new();

        for router in &definition.routers {
            check_name(&router.name, "router")?;
            if router_indices
                .insert(router.name.clone(), routers.len())
                .is_some()
            {
                return Err(FlowGraphError::DuplicateRouter(router.name.clone()));
            }

            let mut paths: Vec<String> = Vec::new();
            for path in &router.paths {
                if !paths.contains(path) {
                    paths.push(path.clone());
                }
            }

            if let Some(source) = &router.source {
                match extract_possible_outcomes(source) {
                    Some(outcomes) => {
                        for outcome in outcomes {
                            if !paths.contains(&outcome) {
                                paths.push(outcome);
                            }
                        }
                    }
                    None => tracing::debug!(
                        "No statically known outcomes for router {}",
                        router.name
                    ),
                }
            }

            routers.push(RouterPaths {
                name: router.name.clone(),
                paths,
            });
        }

        // Listeners and routers are steps even when not registered as such
        let implicit: Vec<String> = listeners
            .iter()
            .map(|l| l.name.clone())
            .chain(routers.iter().map(|r| r.name.clone()))
            .collect();
        for name in implicit {
            if !step_indices.contains_key(&name) {
                step_indices.insert(name.clone(), steps.len());
                steps.push(StepSpec::new(name));
            }
        }

        let mut graph = Self {
            steps,
            step_indices,
            listeners,
            listener_indices,
            routers,
            router_indices,
            index: DiGraph::new(),
            node_indices: HashMap::new(),
        };
        graph.build_index();

        Ok(graph)
    }

    fn build_index(&mut self) {
        let known_labels: HashSet<&str> = self
            .routers
            .iter()
            .flat_map(|r| r.paths.iter().map(String::as_str))
            .collect();

        let mut edges: Vec<(String, String, TriggerEdge)> = Vec::new();

        for listener in &self.listeners {
            for trigger in &listener.triggers {
                if !self.step_indices.contains_key(trigger)
                    && !known_labels.contains(trigger.as_str())
                {
                    tracing::debug!(
                        "Listener {} waits on unknown trigger {}",
                        listener.name,
                        trigger
                    );
                }
                edges.push((trigger.clone(), listener.name.clone(), TriggerEdge::Trigger));
            }
        }

        for router in &self.routers {
            for path in &router.paths {
                for listener in &self.listeners {
                    if listener.triggers.contains(path) {
                        edges.push((
                            router.name.clone(),
                            listener.name.clone(),
                            TriggerEdge::Path(path.clone()),
                        ));
                    }
                }
            }
        }

        for (from, to, edge) in edges {
            let from = self.node(&from);
            let to = self.node(&to);
            self.index.add_edge(from, to, edge);
        }
    }

    fn node(&mut self, name: &str) -> NodeIndex {
        if let Some(idx) = self.node_indices.get(name) {
            return *idx;
        }
        let idx = self.index.add_node(name.to_string());
        self.node_indices.insert(name.to_string(), idx);
        idx
    }

    /// Outgoing edges of a name in the order they were indexed
    fn outgoing(&self, name: &str) -> Vec<(&ListenerSpec, &TriggerEdge)> {
        let Some(node) = self.node_indices.get(name) else {
            return Vec::new();
        };

        let mut edges: Vec<_> = self
            .index
            .edges_directed(*node, Direction::Outgoing)
            .collect();
        edges.sort_by_key(|e| e.id());

        edges
            .into_iter()
            .filter_map(|e| {
                let target = &self.index[e.target()];
                self.listener(target).map(|l| (l, e.weight()))
            })
            .collect()
    }

    /// Listeners that name `trigger` directly in their trigger list
    pub fn listeners_of(&self, trigger: &str) -> Vec<&ListenerSpec> {
        self.outgoing(trigger)
            .into_iter()
            .filter(|(_, edge)| **edge == TriggerEdge::Trigger)
            .map(|(listener, _)| listener)
            .collect()
    }

    /// Listeners reached through the path labels of `router`, with the label
    /// that binds them. Empty when `router` is not a router.
    pub fn path_listeners(&self, router: &str) -> Vec<(&str, &ListenerSpec)> {
        self.outgoing(router)
            .into_iter()
            .filter_map(|(listener, edge)| match edge {
                TriggerEdge::Path(label) => Some((label.as_str(), listener)),
                TriggerEdge::Trigger => None,
            })
            .collect()
    }

    /// All steps in registration order, implicit ones last
    pub fn steps(&self) -> &[StepSpec] {
        &self.steps
    }

    pub fn step(&self, name: &str) -> Option<&StepSpec> {
        self.step_indices.get(name).map(|&i| &self.steps[i])
    }

    /// Steps marked as entry points
    pub fn entry_points(&self) -> impl Iterator<Item = &StepSpec> {
        self.steps.iter().filter(|s| s.entry_point)
    }

    pub fn listeners(&self) -> &[ListenerSpec] {
        &self.listeners
    }

    pub fn listener(&self, name: &str) -> Option<&ListenerSpec> {
        self.listener_indices.get(name).map(|&i| &self.listeners[i])
    }

    pub fn routers(&self) -> &[RouterPaths] {
        &self.routers
    }

    pub fn is_router(&self, name: &str) -> bool {
        self.router_indices.contains_key(name)
    }

    /// Effective path labels of a router, declared ones first
    pub fn router_paths(&self, name: &str) -> &[String] {
        self.router_indices
            .get(name)
            .map(|&i| self.routers[i].paths.as_slice())
            .unwrap_or(&[])
    }
}

fn check_name(name: &str, kind: &'static str) -> FlowResult<()> {
    if name.trim().is_empty() {
        return Err(FlowGraphError::EmptyName { kind });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{JoinMode, RouterSpec};

    fn routed_flow() -> FlowDefinition {
        FlowDefinition::new()
            .step(StepSpec::entry("start"))
            .listener(ListenerSpec::or("decide", ["start"]))
            .listener(ListenerSpec::or("approve", ["approved"]))
            .listener(ListenerSpec::or("reject", ["rejected", "decide"]))
            .router(RouterSpec::new("decide", ["approved", "rejected"]))
    }

    #[test]
    fn test_implicit_steps() {
        let graph = FlowGraph::from_definition(&routed_flow()).unwrap();

        let names: Vec<&str> = graph.steps().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["start", "decide", "approve", "reject"]);
        assert!(graph.step("start").unwrap().entry_point);
        assert!(!graph.step("decide").unwrap().entry_point);
        assert_eq!(graph.entry_points().count(), 1);
    }

    #[test]
    fn test_listener_and_path_lookups() {
        let graph = FlowGraph::from_definition(&routed_flow()).unwrap();

        let direct: Vec<&str> = graph
            .listeners_of("decide")
            .iter()
            .map(|l| l.name.as_str())
            .collect();
        assert_eq!(direct, vec!["reject"]);

        let routed: Vec<(&str, &str)> = graph
            .path_listeners("decide")
            .into_iter()
            .map(|(label, l)| (label, l.name.as_str()))
            .collect();
        assert_eq!(routed, vec![("approved", "approve"), ("rejected", "reject")]);

        assert!(graph.is_router("decide"));
        assert!(!graph.is_router("start"));
        assert!(graph.path_listeners("start").is_empty());
        assert!(graph.listeners_of("missing").is_empty());
    }

    #[test]
    fn test_triggers_deduplicated() {
        let def = FlowDefinition::new()
            .step(StepSpec::entry("a"))
            .listener(ListenerSpec::and("b", ["a", "a"]));
        let graph = FlowGraph::from_definition(&def).unwrap();

        assert_eq!(graph.listener("b").unwrap().triggers, vec!["a".to_string()]);
        assert_eq!(graph.listener("b").unwrap().join_mode, JoinMode::And);
        assert_eq!(graph.listeners_of("a").len(), 1);
    }

    #[test]
    fn test_router_paths_merge_extracted_outcomes() {
        let source = r#"
            fn route(score: u32) -> &'static str {
                if score > 10 {
                    return "high";
                }
                "low"
            }
        "#;
        let def = FlowDefinition::new()
            .step(StepSpec::entry("score"))
            .router(RouterSpec::new("score", ["low", "manual"]).with_source(source));
        let graph = FlowGraph::from_definition(&def).unwrap();

        assert_eq!(graph.router_paths("score"), ["low", "manual", "high"]);
    }

    #[test]
    fn test_unparseable_router_source_keeps_declared_paths() {
        let def = FlowDefinition::new()
            .router(RouterSpec::new("r", ["x"]).with_source("fn route( {"));
        let graph = FlowGraph::from_definition(&def).unwrap();

        assert_eq!(graph.router_paths("r"), ["x"]);
        assert!(graph.router_paths("unknown").is_empty());
    }

    #[test]
    fn test_dangling_trigger_tolerated() {
        let def = FlowDefinition::new().listener(ListenerSpec::or("b", ["ghost"]));
        let graph = FlowGraph::from_definition(&def).unwrap();

        assert_eq!(graph.listeners_of("ghost").len(), 1);
        assert!(graph.step("ghost").is_none());
    }

    #[test]
    fn test_invalid_definitions_rejected() {
        let dup = FlowDefinition::new()
            .step(StepSpec::entry("a"))
            .step(StepSpec::new("a"));
        assert_eq!(
            FlowGraph::from_definition(&dup).unwrap_err(),
            FlowGraphError::DuplicateStep("a".to_string())
        );

        let empty = FlowDefinition::new().listener(ListenerSpec::or("b", Vec::<String>::new()));
        assert_eq!(
            FlowGraph::from_definition(&empty).unwrap_err(),
            FlowGraphError::EmptyTriggers("b".to_string())
        );

        let unnamed = FlowDefinition::new().step(StepSpec::entry(" "));
        assert!(FlowGraph::from_definition(&unnamed)
            .unwrap_err()
            .to_string()
            .contains("Empty step name"));

        let routers = FlowDefinition::new()
            .router(RouterSpec::new("r", ["x"]))
            .router(RouterSpec::new("r", ["y"]));
        assert_eq!(
            FlowGraph::from_definition(&routers).unwrap_err(),
            FlowGraphError::DuplicateRouter("r".to_string())
        );
    }
}
