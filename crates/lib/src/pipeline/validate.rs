//! Checking that packaging produced every package the version model promises.

use std::fmt;
use std::path::Path;

use semver::Version;
use serde::Serialize;
use tracing::{error, info};

use super::state::{PipelineState, Transition};
use crate::consts::PACKAGE_EXTENSION;
use crate::context::{BuildContext, keys};
use crate::paths::Dirs;
use crate::target::BuildError;
use crate::version::HostVersion;

/// A host package expected after packaging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageArtifact {
  pub rid: String,
  pub package_id: String,
  pub version: Version,
}

impl PackageArtifact {
  /// `runtime.<rid>.<package-id>.<version>.nupkg`
  pub fn file_name(&self) -> String {
    format!(
      "runtime.{}.{}.{}.{}",
      self.rid, self.package_id, self.version, PACKAGE_EXTENSION
    )
  }

  pub fn exists_in(&self, dir: &Path) -> bool {
    dir.join(self.file_name()).is_file()
  }
}

impl fmt::Display for PackageArtifact {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.file_name())
  }
}

/// One artifact per binary of `host_version`, at its latest version, for `canonical_rid`.
pub fn expected_artifacts(host_version: &HostVersion, canonical_rid: &str) -> Vec<PackageArtifact> {
  host_version
    .latest_packages()
    .map(|(package_id, version)| PackageArtifact {
      rid: canonical_rid.to_string(),
      package_id: package_id.to_string(),
      version: version.clone(),
    })
    .collect()
}

/// The artifacts of `expected` that are not in `dir`, in model order.
pub fn missing_artifacts<'a>(dir: &Path, expected: &'a [PackageArtifact]) -> Vec<&'a PackageArtifact> {
  expected.iter().filter(|artifact| !artifact.exists_in(dir)).collect()
}

/// Require every artifact of `expected` in `dir`.
///
/// # Errors
///
/// [`BuildError::MissingArtifact`] naming the first missing file.
pub fn validate_artifacts(dir: &Path, expected: &[PackageArtifact]) -> Result<(), BuildError> {
  let missing = missing_artifacts(dir, expected);
  for artifact in &missing {
    error!(file = %artifact, dir = %dir.display(), "package was not created");
  }

  match missing.first() {
    Some(artifact) => Err(BuildError::MissingArtifact {
      file: artifact.file_name(),
    }),
    None => Ok(()),
  }
}

/// Target body: validate the collected host packages when validation is enabled.
pub fn validate_packages(ctx: &mut BuildContext) -> Result<(), BuildError> {
  let transition = Transition::begin(ctx, PipelineState::Validated)?;

  if ctx.get_bool(keys::VALIDATE_HOST_PACKAGES)? {
    let rid = super::canonical_rid(ctx)?;
    let host_version = ctx.get::<HostVersion>(keys::HOST_VERSION)?;
    let dirs = ctx.get::<Dirs>(keys::DIRS)?;

    let expected = expected_artifacts(host_version, rid);
    validate_artifacts(&dirs.local_packages, &expected)?;
    info!(rid = %rid, count = expected.len(), "host packages validated");
  } else {
    info!("host package validation skipped");
  }

  transition.commit(ctx)
}
