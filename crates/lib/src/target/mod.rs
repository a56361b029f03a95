//! Named build targets and their execution.
//!
//! A [`Target`] is an explicit record: a name, the names of its prerequisites and an
//! optional body. Targets are collected in a [`TargetRegistry`] at startup, checked
//! once by [`TargetGraph`] (no unknown prerequisites, no cycles) and then executed by
//! the [`Runner`].

pub mod dag;
pub mod runner;
pub mod types;

use std::collections::HashMap;
use std::fmt;

use crate::context::BuildContext;

pub use dag::TargetGraph;
pub use runner::Runner;
pub use types::{BuildError, ExecutedTarget, GraphError, RunError, RunReport};

/// Body of a target: reads and writes the shared context, reports success or failure.
pub type TargetBody = Box<dyn Fn(&mut BuildContext) -> Result<(), BuildError>>;

/// A named unit of build work.
pub struct Target {
  name: String,
  prerequisites: Vec<String>,
  body: Option<TargetBody>,
}

impl Target {
  /// A target with no prerequisites and no body.
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      prerequisites: Vec::new(),
      body: None,
    }
  }

  /// Append prerequisites. They run in the order given.
  pub fn depends_on<I, S>(mut self, prerequisites: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.prerequisites.extend(prerequisites.into_iter().map(Into::into));
    self
  }

  pub fn with_body<F>(mut self, body: F) -> Self
  where
    F: Fn(&mut BuildContext) -> Result<(), BuildError> + 'static,
  {
    self.body = Some(Box::new(body));
    self
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn prerequisites(&self) -> &[String] {
    &self.prerequisites
  }

  pub fn has_body(&self) -> bool {
    self.body.is_some()
  }

  /// Run the body, if any. A target without a body always succeeds.
  pub(crate) fn execute(&self, ctx: &mut BuildContext) -> Result<(), BuildError> {
    match &self.body {
      Some(body) => body(ctx),
      None => Ok(()),
    }
  }
}

impl fmt::Debug for Target {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Target")
      .field("name", &self.name)
      .field("prerequisites", &self.prerequisites)
      .field("has_body", &self.has_body())
      .finish()
  }
}

/// Targets in registration order, addressable by name.
#[derive(Debug, Default)]
pub struct TargetRegistry {
  targets: Vec<Target>,
  index: HashMap<String, usize>,
}

impl TargetRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Add a target.
  ///
  /// # Errors
  ///
  /// [`GraphError::DuplicateTarget`] if the name is already registered.
  pub fn register(&mut self, target: Target) -> Result<(), GraphError> {
    if self.index.contains_key(target.name()) {
      return Err(GraphError::DuplicateTarget(target.name().to_string()));
    }
    self.index.insert(target.name().to_string(), self.targets.len());
    self.targets.push(target);
    Ok(())
  }

  pub fn get(&self, name: &str) -> Option<&Target> {
    self.index.get(name).map(|&i| &self.targets[i])
  }

  pub fn contains(&self, name: &str) -> bool {
    self.index.contains_key(name)
  }

  /// Targets in registration order.
  pub fn iter(&self) -> impl Iterator<Item = &Target> {
    self.targets.iter()
  }

  pub fn len(&self) -> usize {
    self.targets.len()
  }

  pub fn is_empty(&self) -> bool {
    self.targets.is_empty()
  }
}
