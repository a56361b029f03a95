//! Validated target graph.
//!
//! [`TargetGraph`] wraps a [`TargetRegistry`] in a petgraph `DiGraph` with an edge from
//! every prerequisite to its dependent. Construction fails on unknown prerequisites and
//! on cycles, so a graph that exists can always be executed.

use std::collections::{HashMap, HashSet};

use petgraph::Direction;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Dfs;

use super::types::GraphError;
use super::{Target, TargetRegistry};

/// A target registry whose dependency structure has been checked.
#[derive(Debug)]
pub struct TargetGraph {
  registry: TargetRegistry,

  /// Edges run from prerequisite to dependent.
  graph: DiGraph<String, ()>,

  nodes: HashMap<String, NodeIndex>,
}

impl TargetGraph {
  /// Validate `registry` and build its graph.
  ///
  /// # Errors
  ///
  /// [`GraphError::UnknownPrerequisite`] if a target names an unregistered
  /// prerequisite, [`GraphError::Cycle`] if the prerequisites form a cycle.
  pub fn new(registry: TargetRegistry) -> Result<Self, GraphError> {
    let mut graph = DiGraph::new();
    let mut nodes = HashMap::new();

    for target in registry.iter() {
      let idx = graph.add_node(target.name().to_string());
      nodes.insert(target.name().to_string(), idx);
    }

    for target in registry.iter() {
      let dependent_idx = nodes[target.name()];

      for prerequisite in target.prerequisites() {
        let Some(&prerequisite_idx) = nodes.get(prerequisite) else {
          return Err(GraphError::UnknownPrerequisite {
            target: target.name().to_string(),
            prerequisite: prerequisite.clone(),
          });
        };
        graph.add_edge(prerequisite_idx, dependent_idx, ());
      }
    }

    let dag = Self { registry, graph, nodes };
    dag.verify_acyclic()?;

    Ok(dag)
  }

  fn verify_acyclic(&self) -> Result<(), GraphError> {
    toposort(&self.graph, None).map_err(|cycle| {
      let start = &self.graph[cycle.node_id()];
      GraphError::Cycle(self.cycle_through(start))
    })?;
    Ok(())
  }

  /// Walk prerequisites from `start` until a target repeats and return that loop.
  fn cycle_through(&self, start: &str) -> Vec<String> {
    let mut path = Vec::new();
    let mut done = HashSet::new();
    let mut order = Vec::new();

    match self.walk(start, &mut path, &mut done, &mut order) {
      Err(GraphError::Cycle(cycle)) => cycle,
      _ => vec![start.to_string(), start.to_string()],
    }
  }

  /// Look up a target by name.
  pub fn target(&self, name: &str) -> Option<&Target> {
    self.registry.get(name)
  }

  /// All targets in registration order.
  pub fn targets(&self) -> impl Iterator<Item = &Target> {
    self.registry.iter()
  }

  pub fn len(&self) -> usize {
    self.registry.len()
  }

  pub fn is_empty(&self) -> bool {
    self.registry.is_empty()
  }

  /// The order in which [`Runner`](super::Runner) executes `root` and its
  /// prerequisites: depth-first, prerequisites in declaration order, each target once.
  pub fn execution_order(&self, root: &str) -> Result<Vec<&str>, GraphError> {
    let root = self
      .registry
      .get(root)
      .ok_or_else(|| GraphError::UnknownTarget(root.to_string()))?;

    let mut path = Vec::new();
    let mut done = HashSet::new();
    let mut order = Vec::new();
    self.walk(root.name(), &mut path, &mut done, &mut order)?;

    Ok(order)
  }

  fn walk<'a>(
    &'a self,
    name: &str,
    path: &mut Vec<&'a str>,
    done: &mut HashSet<&'a str>,
    order: &mut Vec<&'a str>,
  ) -> Result<(), GraphError> {
    let target = self
      .registry
      .get(name)
      .ok_or_else(|| GraphError::UnknownTarget(name.to_string()))?;
    let name = target.name();

    if done.contains(name) {
      return Ok(());
    }

    if let Some(pos) = path.iter().position(|n| *n == name) {
      let mut cycle: Vec<String> = path[pos..].iter().map(|n| n.to_string()).collect();
      cycle.push(name.to_string());
      return Err(GraphError::Cycle(cycle));
    }

    path.push(name);
    for prerequisite in target.prerequisites() {
      self.walk(prerequisite, path, done, order)?;
    }
    path.pop();

    done.insert(name);
    order.push(name);
    Ok(())
  }

  /// Direct prerequisites of a target, in declaration order.
  pub fn prerequisites(&self, name: &str) -> Vec<&str> {
    self
      .registry
      .get(name)
      .map(|t| t.prerequisites().iter().map(String::as_str).collect())
      .unwrap_or_default()
  }

  /// Targets that depend on `name` directly.
  pub fn direct_dependents(&self, name: &str) -> Vec<&str> {
    let Some(&idx) = self.nodes.get(name) else {
      return Vec::new();
    };

    let mut dependents: Vec<&str> = self
      .graph
      .neighbors_directed(idx, Direction::Outgoing)
      .map(|dep_idx| self.graph[dep_idx].as_str())
      .collect();
    dependents.sort_unstable();
    dependents.dedup();
    dependents
  }

  /// Targets that depend on `name` directly or transitively, in registration order.
  pub fn dependents(&self, name: &str) -> Vec<&str> {
    let Some(&idx) = self.nodes.get(name) else {
      return Vec::new();
    };

    let mut reachable = HashSet::new();
    let mut dfs = Dfs::new(&self.graph, idx);
    while let Some(node) = dfs.next(&self.graph) {
      if node != idx {
        reachable.insert(self.graph[node].as_str());
      }
    }

    self
      .registry
      .iter()
      .map(Target::name)
      .filter(|n| reachable.contains(n))
      .collect()
  }
}
