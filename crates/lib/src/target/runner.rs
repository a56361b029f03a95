//! Sequential execution of a target and its prerequisites.
//!
//! The runner walks the graph depth-first from the requested root. Prerequisites run
//! in declaration order and each target runs at most once per run. The first body
//! failure stops the run; nothing scheduled after it executes.

use std::collections::HashSet;
use std::time::Instant;

use tracing::{debug, error, info, warn};

use super::types::{ExecutedTarget, GraphError, RunError, RunReport};
use super::{Target, TargetGraph};
use crate::context::BuildContext;

/// Executes targets of a validated [`TargetGraph`].
#[derive(Debug, Clone, Copy)]
pub struct Runner<'g> {
  graph: &'g TargetGraph,
}

#[derive(Default)]
struct RunState {
  completed: HashSet<String>,
  in_progress: Vec<String>,
  report: RunReport,
}

impl<'g> Runner<'g> {
  pub fn new(graph: &'g TargetGraph) -> Self {
    Self { graph }
  }

  pub fn graph(&self) -> &'g TargetGraph {
    self.graph
  }

  /// Run `root` and, transitively, every prerequisite.
  ///
  /// # Errors
  ///
  /// [`GraphError::UnknownTarget`] if `root` is not registered, or
  /// [`RunError::TargetFailed`] for the first target body that fails. Targets that had
  /// not run yet at that point are listed in `skipped`.
  pub fn run(&self, root: &str, ctx: &mut BuildContext) -> Result<RunReport, RunError> {
    let root_target = self
      .graph
      .target(root)
      .ok_or_else(|| GraphError::UnknownTarget(root.to_string()))?;

    info!(root = %root, "starting build");
    let started = Instant::now();

    let mut state = RunState::default();
    match self.visit(root_target, ctx, &mut state) {
      Ok(()) => {
        info!(
          root = %root,
          executed = state.report.len(),
          elapsed_ms = started.elapsed().as_millis() as u64,
          "build complete"
        );
        Ok(state.report)
      }
      Err(RunError::TargetFailed { target, source, .. }) => {
        let skipped = self.skipped(root, &target, &state.completed);
        let dependents = self.graph.dependents(&target);
        for name in &skipped {
          warn!(
            target = %name,
            failed = %target,
            depends_on_failed = dependents.contains(&name.as_str()),
            "target skipped"
          );
        }
        Err(RunError::TargetFailed {
          target,
          source,
          skipped,
          report: state.report,
        })
      }
      Err(err) => Err(err),
    }
  }

  fn visit(&self, target: &'g Target, ctx: &mut BuildContext, state: &mut RunState) -> Result<(), RunError> {
    let name = target.name();

    if state.completed.contains(name) {
      debug!(target = %name, "already completed");
      return Ok(());
    }

    if let Some(pos) = state.in_progress.iter().position(|n| n == name) {
      let mut cycle = state.in_progress[pos..].to_vec();
      cycle.push(name.to_string());
      return Err(GraphError::Cycle(cycle).into());
    }

    state.in_progress.push(name.to_string());
    for prerequisite in target.prerequisites() {
      let dep = self
        .graph
        .target(prerequisite)
        .ok_or_else(|| GraphError::UnknownPrerequisite {
          target: name.to_string(),
          prerequisite: prerequisite.clone(),
        })?;
      self.visit(dep, ctx, state)?;
    }
    state.in_progress.pop();

    info!(target = %name, "running target");
    let started = Instant::now();

    if let Err(source) = target.execute(ctx) {
      error!(target = %name, error = %source, "target failed");
      return Err(RunError::TargetFailed {
        target: name.to_string(),
        source,
        skipped: Vec::new(),
        report: RunReport::default(),
      });
    }

    let elapsed = started.elapsed();
    debug!(target = %name, elapsed_ms = elapsed.as_millis() as u64, "target succeeded");

    state.completed.insert(name.to_string());
    state.report.executed.push(ExecutedTarget {
      name: name.to_string(),
      elapsed,
      had_body: target.has_body(),
    });
    Ok(())
  }

  /// Targets in the root's execution order that never ran because `failed` failed.
  fn skipped(&self, root: &str, failed: &str, completed: &HashSet<String>) -> Vec<String> {
    self
      .graph
      .execution_order(root)
      .unwrap_or_default()
      .into_iter()
      .filter(|name| *name != failed && !completed.contains(*name))
      .map(str::to_string)
      .collect()
  }
}
