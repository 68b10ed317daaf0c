use serde::{Deserialize, Serialize};

/// How a listener combines its triggers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JoinMode {
    /// Fires when any trigger completes
    #[default]
    Or,
    /// Fires once every trigger has completed
    And,
}

impl std::fmt::Display for JoinMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JoinMode::Or => write!(f, "OR"),
            JoinMode::And => write!(f, "AND"),
        }
    }
}

/// A named unit of work in a flow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepSpec {
    pub name: String,
    #[serde(default)]
    pub entry_point: bool,
}

impl StepSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entry_point: false,
        }
    }

    pub fn entry(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entry_point: true,
        }
    }
}

/// A step gated on other steps or router path labels
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListenerSpec {
    pub name: String,
    #[serde(default)]
    pub join_mode: JoinMode,
    /// Step names or router path labels
    pub triggers: Vec<String>,
}

impl ListenerSpec {
    pub fn new<I, S>(name: impl Into<String>, join_mode: JoinMode, triggers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            join_mode,
            triggers: triggers.into_iter().map(Into::into).collect(),
        }
    }

    pub fn or<I, S>(name: impl Into<String>, triggers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(name, JoinMode::Or, triggers)
    }

    pub fn and<I, S>(name: impl Into<String>, triggers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(name, JoinMode::And, triggers)
    }
}

/// A step that selects one named path at runtime
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterSpec {
    pub name: String,
    /// Explicitly declared path labels
    #[serde(default)]
    pub paths: Vec<String>,
    /// Rust source of the router function, used to discover further paths
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl RouterSpec {
    pub fn new<I, S>(name: impl Into<String>, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            paths: paths.into_iter().map(Into::into).collect(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Declarative definition of a flow, as registered by the workflow engine
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowDefinition {
    #[serde(default)]
    pub steps: Vec<StepSpec>,
    #[serde(default)]
    pub listeners: Vec<ListenerSpec>,
    #[serde(default)]
    pub routers: Vec<RouterSpec>,
}

impl FlowDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(mut self, step: StepSpec) -> Self {
        self.steps.push(step);
        self
    }

    pub fn listener(mut self, listener: ListenerSpec) -> Self {
        self.listeners.push(listener);
        self
    }

    pub fn router(mut self, router: RouterSpec) -> Self {
        self.routers.push(router);
        self
    }
}
