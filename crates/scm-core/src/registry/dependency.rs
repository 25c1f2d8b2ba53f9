use std::collections::{HashMap, HashSet};

use thiserror::Error;

/// Error that can occur when building or ordering a dependency graph
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DependencyError {
    /// An edge points at a component that is not a node of the graph
    #[error("'{dependent}' cannot find dependency '{dependency}'")]
    MissingDependency { dependent: String, dependency: String },

    /// Dependency cycle; the path starts and ends with the same node
    #[error("Dependency cycle detected: {}", .0.join(" -> "))]
    Cycle(Vec<String>),

    /// An edge was added from a node the graph does not know
    #[error("Node does not exist: {0}")]
    UnknownNode(String),
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

/// Directed "depends-on" graph over component names.
///
/// Nodes keep their insertion order, and each node's dependencies keep their
/// declaration order, so every traversal is deterministic.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// Nodes in insertion order
    nodes: Vec<String>,
    /// Fast membership lookup for `nodes`
    index: HashSet<String>,
    /// Edges in the graph (component -> dependencies)
    edges: HashMap<String, Vec<String>>,
}

impl DependencyGraph {
    /// Create a new dependency graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node to the graph. Adding an existing node is a no-op.
    pub fn add_node(&mut self, name: &str) {
        if self.index.insert(name.to_string()) {
            self.nodes.push(name.to_string());
        }
    }

    /// Add an edge to the graph (`dependent` depends on `dependency`).
    /// Both ends must already be nodes.
    pub fn add_dependency(&mut self, dependent: &str, dependency: &str) -> Result<(), DependencyError> {
        if !self.contains(dependent) {
            return Err(DependencyError::UnknownNode(dependent.to_string()));
        }
        if !self.contains(dependency) {
            return Err(DependencyError::MissingDependency {
                dependent: dependent.to_string(),
                dependency: dependency.to_string(),
            });
        }

        let deps = self.edges.entry(dependent.to_string()).or_default();
        if !deps.iter().any(|d| d == dependency) {
            deps.push(dependency.to_string());
        }
        Ok(())
    }

    /// Check if the graph contains a node
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains(name)
    }

    /// Nodes in insertion order
    pub fn nodes(&self) -> &[String] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Direct dependencies of a node, in declaration order
    pub fn dependencies_of(&self, name: &str) -> &[String] {
        self.edges.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Check if the graph contains cycles
    pub fn has_cycles(&self) -> bool {
        self.find_cycle().is_some()
    }

    /// First cycle found, as a path that repeats its starting node at the end
    pub fn find_cycle(&self) -> Option<Vec<String>> {
        match self.overall_order() {
            Err(DependencyError::Cycle(path)) => Some(path),
            _ => None,
        }
    }

    /// Every node, ordered so that each one comes after all of its dependencies.
    ///
    /// Depth-first post-order over nodes in insertion order; ties between
    /// independent nodes therefore resolve to insertion order.
    pub fn overall_order(&self) -> Result<Vec<String>, DependencyError> {
        let mut marks: HashMap<&str, Mark> = HashMap::with_capacity(self.nodes.len());
        let mut stack: Vec<&str> = Vec::new();
        let mut order = Vec::with_capacity(self.nodes.len());

        for node in &self.nodes {
            self.visit(node, &mut marks, &mut stack, &mut order)?;
        }
        Ok(order)
    }

    /// DFS for topological sort with cycle detection
    fn visit<'a>(
        &'a self,
        node: &'a str,
        marks: &mut HashMap<&'a str, Mark>,
        stack: &mut Vec<&'a str>,
        order: &mut Vec<String>,
    ) -> Result<(), DependencyError> {
        match marks.get(node) {
            Some(Mark::Done) => return Ok(()),
            Some(Mark::Visiting) => {
                let start = stack.iter().position(|n| *n == node).unwrap_or(0);
                let mut path: Vec<String> = stack[start..].iter().map(|n| n.to_string()).collect();
                path.push(node.to_string());
                return Err(DependencyError::Cycle(path));
            }
            None => {}
        }

        marks.insert(node, Mark::Visiting);
        stack.push(node);
        for dep in self.dependencies_of(node) {
            self.visit(dep, marks, stack, order)?;
        }
        stack.pop();
        marks.insert(node, Mark::Done);
        order.push(node.to_string());
        Ok(())
    }
}

/// Builder that collects nodes and edges, then validates the edges at once.
///
/// Edges may be declared before their target node has been added; `build()`
/// reports the first edge (in declaration order) whose target never appeared.
#[derive(Debug, Default)]
pub struct DependencyGraphBuilder {
    graph: DependencyGraph,
    pending: Vec<(String, String)>,
}

impl DependencyGraphBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, name: &str) -> &mut Self {
        self.graph.add_node(name);
        self
    }

    /// Add a dependency between nodes
    pub fn add_dependency(&mut self, dependent: &str, dependency: &str) -> &mut Self {
        self.pending.push((dependent.to_string(), dependency.to_string()));
        self
    }

    /// Add a node together with its declared dependencies
    pub fn add_component<I, S>(&mut self, name: &str, dependencies: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.add_node(name);
        for dep in dependencies {
            self.add_dependency(name, dep.as_ref());
        }
        self
    }

    /// Build the dependency graph
    pub fn build(self) -> Result<DependencyGraph, DependencyError> {
        let mut graph = self.graph;
        for (dependent, dependency) in &self.pending {
            log::trace!("adding dependency: {} -> {}", dependent, dependency);
            graph.add_dependency(dependent, dependency)?;
        }
        Ok(graph)
    }
}
