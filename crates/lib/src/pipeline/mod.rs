//! The host packaging pipeline and the standard target set.
//!
//! `write-version-metadata -> invoke-packaging -> collect-packages -> validate-packages`
//! each advance the [`PipelineState`]; `package-pkg-projects` is the aggregate the CLI
//! runs by default. The remaining targets prepare inputs for the native build and
//! the shared framework.

pub mod metadata;
pub mod package;
pub mod prepare;
pub mod publish;
pub mod state;
pub mod validate;

use tracing::{info, warn};

use crate::context::{BuildContext, keys};
use crate::target::{BuildError, GraphError, RunError, RunReport, Runner, Target, TargetGraph, TargetRegistry};
use crate::version::RidMap;

pub use state::{PipelineState, Transition};
pub use validate::PackageArtifact;

/// Names of the standard targets.
pub mod names {
  pub const INIT: &str = "init";
  pub const GENERATE_VERSION_RESOURCE: &str = "generate-version-resource";
  pub const GENERATE_MSBUILD_PROPS: &str = "generate-msbuild-props";
  pub const WRITE_VERSION_METADATA: &str = "write-version-metadata";
  pub const INVOKE_PACKAGING: &str = "invoke-packaging";
  pub const COLLECT_PACKAGES: &str = "collect-packages";
  pub const VALIDATE_PACKAGES: &str = "validate-packages";
  pub const PACKAGE_PKG_PROJECTS: &str = "package-pkg-projects";
  pub const RESTORE_LOCKED_HOST: &str = "restore-locked-host";
  pub const PUBLISH_SHARED_FRAMEWORK: &str = "publish-shared-framework";
  pub const COMPILE: &str = "compile";
}

/// Target run when none is named.
pub const DEFAULT_TARGET: &str = names::PACKAGE_PKG_PROJECTS;

/// Canonical RID for the context's `TargetRID`.
///
/// # Errors
///
/// A configuration error when `TargetRID` is unset, [`BuildError::UnsupportedPlatform`]
/// when the RID has no mapping.
pub fn canonical_rid(ctx: &BuildContext) -> Result<&'static str, BuildError> {
  let rid = ctx.get_str(keys::TARGET_RID)?;
  Ok(RidMap::standard().resolve(rid)?)
}

/// Register the standard target set.
pub fn standard_targets() -> Result<TargetRegistry, GraphError> {
  use names::*;

  let mut registry = TargetRegistry::new();
  for target in [
    Target::new(INIT).with_body(prepare::init),
    Target::new(GENERATE_VERSION_RESOURCE)
      .depends_on([INIT])
      .with_body(metadata::generate_version_resource),
    Target::new(GENERATE_MSBUILD_PROPS)
      .depends_on([INIT])
      .with_body(metadata::generate_msbuild_props),
    Target::new(WRITE_VERSION_METADATA)
      .depends_on([GENERATE_MSBUILD_PROPS])
      .with_body(metadata::write_version_metadata),
    Target::new(INVOKE_PACKAGING)
      .depends_on([WRITE_VERSION_METADATA])
      .with_body(package::invoke_packaging),
    Target::new(COLLECT_PACKAGES)
      .depends_on([INVOKE_PACKAGING])
      .with_body(package::collect_packages),
    Target::new(VALIDATE_PACKAGES)
      .depends_on([COLLECT_PACKAGES])
      .with_body(validate::validate_packages),
    Target::new(PACKAGE_PKG_PROJECTS).depends_on([VALIDATE_PACKAGES]),
    Target::new(RESTORE_LOCKED_HOST)
      .depends_on([INIT])
      .with_body(publish::restore_locked_host),
    Target::new(PUBLISH_SHARED_FRAMEWORK)
      .depends_on([INIT])
      .with_body(publish::publish_shared_framework),
    Target::new(COMPILE).depends_on([INIT, GENERATE_VERSION_RESOURCE, PUBLISH_SHARED_FRAMEWORK]),
  ] {
    registry.register(target)?;
  }
  Ok(registry)
}

/// The standard target set, validated.
pub fn standard_graph() -> Result<TargetGraph, GraphError> {
  TargetGraph::new(standard_targets()?)
}

/// Result of [`run_pipeline`].
#[derive(Debug)]
pub struct PipelineOutcome {
  /// Pipeline state after the run.
  pub state: PipelineState,
  pub result: Result<RunReport, RunError>,
}

impl PipelineOutcome {
  pub fn is_success(&self) -> bool {
    self.result.is_ok()
  }
}

/// Run `root` from a fresh pipeline state and record `Failed(reason)` if the run fails.
pub fn run_pipeline(runner: &Runner<'_>, root: &str, ctx: &mut BuildContext) -> PipelineOutcome {
  if let Err(e) = PipelineState::reset(ctx) {
    return PipelineOutcome {
      state: PipelineState::Failed(e.to_string()),
      result: Err(RunError::TargetFailed {
        target: root.to_string(),
        source: e.into(),
        skipped: Vec::new(),
        report: RunReport::default(),
      }),
    };
  }

  let result = runner.run(root, ctx);

  if let Err(err) = &result {
    let reason = match err {
      RunError::TargetFailed { source, .. } => source.to_string(),
      RunError::Graph(e) => e.to_string(),
    };
    if let Err(e) = PipelineState::fail(ctx, reason) {
      warn!(error = %e, "could not record pipeline failure");
    }
  }

  let state = PipelineState::current(ctx).unwrap_or_else(|e| PipelineState::Failed(e.to_string()));
  info!(root = %root, state = %state, "pipeline finished");

  PipelineOutcome { state, result }
}
