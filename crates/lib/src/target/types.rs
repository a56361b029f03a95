//! Error and result types for target execution.

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::context::ContextError;
use crate::pipeline::PipelineState;
use crate::platform::DetectError;
use crate::process::ProcessError;
use crate::version::{UnsupportedPlatformError, VersionError};

/// Errors in the definition of the target set.
///
/// These are definition-time bugs and are reported before any target body runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
  /// Two targets were registered under one name.
  #[error("target '{0}' is registered more than once")]
  DuplicateTarget(String),

  /// A target names a prerequisite that is not registered.
  #[error("target '{target}' depends on unknown target '{prerequisite}'")]
  UnknownPrerequisite { target: String, prerequisite: String },

  /// The requested target is not registered.
  #[error("unknown target '{0}'")]
  UnknownTarget(String),

  /// The prerequisites form a cycle. The path starts and ends with the same target.
  #[error("dependency cycle detected: {}", .0.join(" -> "))]
  Cycle(Vec<String>),
}

/// Failure of a single target body.
#[derive(Debug, Error)]
pub enum BuildError {
  /// A context key was missing or held the wrong type.
  #[error("configuration error: {0}")]
  Configuration(#[from] ContextError),

  #[error(transparent)]
  UnsupportedPlatform(#[from] UnsupportedPlatformError),

  #[error("version model error: {0}")]
  Version(#[from] VersionError),

  #[error("platform detection failed: {0}")]
  Detect(#[from] DetectError),

  /// An external process failed, timed out or could not start.
  #[error("external process failed: {0}")]
  Process(#[from] ProcessError),

  /// Packaging did not produce a package the version model promises.
  #[error("Nupkg for {file} was not created.")]
  MissingArtifact { file: String },

  /// A pipeline step ran out of order.
  #[error("pipeline cannot enter {next} from {actual}: expected {expected}")]
  InvalidTransition {
    next: PipelineState,
    expected: PipelineState,
    actual: PipelineState,
  },

  #[error("io error at {path}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to serialize {what}: {source}")]
  Serialize {
    what: &'static str,
    #[source]
    source: serde_json::Error,
  },

  /// Any other failure reported by a target body.
  #[error("{0}")]
  Failed(String),
}

impl BuildError {
  /// Wrap an I/O error with the path it concerns.
  pub fn io(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Self {
    let path = path.into();
    move |source| BuildError::Io { path, source }
  }
}

/// Errors returned by [`Runner::run`](super::Runner::run).
#[derive(Debug, Error)]
pub enum RunError {
  #[error(transparent)]
  Graph(#[from] GraphError),

  /// A target body failed. Its dependents were not executed.
  #[error("target '{target}' failed: {source}")]
  TargetFailed {
    target: String,
    #[source]
    source: BuildError,
    /// Targets that would have run after `target` but were skipped.
    skipped: Vec<String>,
    /// Targets that completed before `target` failed.
    report: RunReport,
  },
}

impl RunError {
  /// Name of the failing target, if a body failed.
  pub fn failed_target(&self) -> Option<&str> {
    match self {
      RunError::TargetFailed { target, .. } => Some(target),
      RunError::Graph(_) => None,
    }
  }
}

/// A target that ran to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutedTarget {
  pub name: String,
  pub elapsed: Duration,
  /// Whether the target had a body (aggregate targets only order their prerequisites).
  pub had_body: bool,
}

/// Result of a successful run: every executed target in execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
  pub executed: Vec<ExecutedTarget>,
}

impl RunReport {
  /// Names of executed targets, in order.
  pub fn names(&self) -> Vec<&str> {
    self.executed.iter().map(|t| t.name.as_str()).collect()
  }

  /// Total time spent inside target bodies.
  pub fn elapsed(&self) -> Duration {
    self.executed.iter().map(|t| t.elapsed).sum()
  }

  pub fn len(&self) -> usize {
    self.executed.len()
  }

  pub fn is_empty(&self) -> bool {
    self.executed.is_empty()
  }
}

impl fmt::Display for RunReport {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.names().join(", "))
  }
}
