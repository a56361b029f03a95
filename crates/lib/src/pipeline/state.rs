//! Progress of the packaging pipeline.
//!
//! The state lives in the build context under [`keys::PIPELINE_STATE`]. Each pipeline
//! step opens a [`Transition`] before its first side effect and commits it once the
//! step has succeeded, so no step runs unless its predecessor has completed.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::context::{BuildContext, ContextError, keys};
use crate::target::BuildError;

/// `NotStarted -> MetadataEmitted -> Packaged -> Collected -> Validated | Failed`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineState {
  #[default]
  NotStarted,
  MetadataEmitted,
  Packaged,
  Collected,
  Validated,
  Failed(String),
}

impl PipelineState {
  /// The state a step must find before it may enter `self`.
  ///
  /// `NotStarted` has no predecessor and `Failed` can be entered from any state.
  pub fn predecessor(&self) -> Option<PipelineState> {
    match self {
      PipelineState::NotStarted | PipelineState::Failed(_) => None,
      PipelineState::MetadataEmitted => Some(PipelineState::NotStarted),
      PipelineState::Packaged => Some(PipelineState::MetadataEmitted),
      PipelineState::Collected => Some(PipelineState::Packaged),
      PipelineState::Validated => Some(PipelineState::Collected),
    }
  }

  pub fn is_terminal(&self) -> bool {
    matches!(self, PipelineState::Validated | PipelineState::Failed(_))
  }

  pub fn is_failed(&self) -> bool {
    matches!(self, PipelineState::Failed(_))
  }

  /// The state recorded in `ctx`; `NotStarted` when none is recorded yet.
  pub fn current(ctx: &BuildContext) -> Result<PipelineState, ContextError> {
    Ok(ctx.get_opt::<PipelineState>(keys::PIPELINE_STATE)?.cloned().unwrap_or_default())
  }

  /// Record `Failed(reason)` in `ctx`.
  pub fn fail(ctx: &mut BuildContext, reason: impl Into<String>) -> Result<(), ContextError> {
    ctx.set(keys::PIPELINE_STATE, PipelineState::Failed(reason.into()))
  }

  /// Put the pipeline back to `NotStarted`.
  pub fn reset(ctx: &mut BuildContext) -> Result<(), ContextError> {
    ctx.set(keys::PIPELINE_STATE, PipelineState::NotStarted)
  }
}

impl fmt::Display for PipelineState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      PipelineState::NotStarted => write!(f, "not started"),
      PipelineState::MetadataEmitted => write!(f, "metadata emitted"),
      PipelineState::Packaged => write!(f, "packaged"),
      PipelineState::Collected => write!(f, "collected"),
      PipelineState::Validated => write!(f, "validated"),
      PipelineState::Failed(reason) => write!(f, "failed: {}", reason),
    }
  }
}

/// A pending move to the next pipeline state.
#[derive(Debug)]
#[must_use = "a transition does nothing until committed"]
pub struct Transition {
  next: PipelineState,
}

impl Transition {
  /// Check that the pipeline sits in the predecessor of `next`.
  ///
  /// # Errors
  ///
  /// [`BuildError::InvalidTransition`] when a step would skip its predecessor.
  pub fn begin(ctx: &BuildContext, next: PipelineState) -> Result<Self, BuildError> {
    let actual = PipelineState::current(ctx)?;

    if let Some(expected) = next.predecessor()
      && expected != actual
    {
      return Err(BuildError::InvalidTransition { next, expected, actual });
    }

    Ok(Self { next })
  }

  pub fn next(&self) -> &PipelineState {
    &self.next
  }

  /// Record the new state.
  pub fn commit(self, ctx: &mut BuildContext) -> Result<(), BuildError> {
    debug!(state = %self.next, "pipeline state");
    ctx.set(keys::PIPELINE_STATE, self.next)?;
    Ok(())
  }
}
