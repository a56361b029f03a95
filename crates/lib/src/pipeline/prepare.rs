//! The `init` target: facts every other target relies on.

use tracing::info;

use crate::context::{BuildContext, keys};
use crate::paths::Dirs;
use crate::platform::Platform;
use crate::target::BuildError;
use crate::version::{HostVersion, RidMap};

/// Target body: settle the target RID and platform, check the version model and
/// create the build directories.
///
/// A configured `TargetRID` wins over detection. The RID is mapped to its canonical
/// RID before any directory is created, so an unsupported machine fails without
/// touching the filesystem.
pub fn init(ctx: &mut BuildContext) -> Result<(), BuildError> {
  if !ctx.contains(keys::TARGET_RID) {
    let rid = Platform::current()?.detect_rid()?;
    info!(rid = %rid, "detected target rid");
    ctx.set_str(keys::TARGET_RID, rid)?;
  }

  let canonical = RidMap::standard().resolve(ctx.get_str(keys::TARGET_RID)?)?;
  ctx.set_str(keys::CANONICAL_RID, canonical)?;

  if !ctx.contains(keys::PLATFORM) {
    let arch = Platform::current()?.arch;
    ctx.set_str(keys::PLATFORM, arch.as_str())?;
  }

  ctx.get::<HostVersion>(keys::HOST_VERSION)?.validate()?;

  let dirs = ctx.get::<Dirs>(keys::DIRS)?;
  dirs.create_all().map_err(BuildError::io(&dirs.output))?;

  info!(
    rid = %ctx.get_str(keys::TARGET_RID)?,
    canonical_rid = %canonical,
    output = %dirs.output.display(),
    "build initialized"
  );
  Ok(())
}

#[cfg(test)]
mod tests {
  use semver::Version;
  use tempfile::TempDir;

  use super::*;
  use crate::context::ContextError;
  use crate::version::{HOSTFXR, HostBinary, VersionError};

  fn ctx_for(dirs: &Dirs) -> BuildContext {
    let mut ctx = BuildContext::new();
    ctx.set(keys::HOST_VERSION, HostVersion::standard()).unwrap();
    ctx.set(keys::DIRS, dirs.clone()).unwrap();
    ctx.set_str(keys::PLATFORM, "x64").unwrap();
    ctx
  }

  #[test]
  fn configured_rid_is_kept_and_mapped() {
    let temp = TempDir::new().unwrap();
    let dirs = Dirs::new(temp.path(), temp.path().join("out"));
    let mut ctx = ctx_for(&dirs);
    ctx.set_str(keys::TARGET_RID, "rhel.7.2-x64").unwrap();

    init(&mut ctx).unwrap();

    assert_eq!(ctx.get_str(keys::TARGET_RID).unwrap(), "rhel.7.2-x64");
    assert_eq!(ctx.get_str(keys::CANONICAL_RID).unwrap(), "rhel.7-x64");
    assert!(dirs.local_packages.is_dir());
  }

  #[test]
  fn unsupported_rid_creates_nothing() {
    let temp = TempDir::new().unwrap();
    let dirs = Dirs::new(temp.path(), temp.path().join("out"));
    let mut ctx = ctx_for(&dirs);
    ctx.set_str(keys::TARGET_RID, "alpine.3.6-x64").unwrap();

    let err = init(&mut ctx).unwrap_err();

    assert!(matches!(err, BuildError::UnsupportedPlatform(ref e) if e.rid == "alpine.3.6-x64"));
    assert!(!dirs.output.exists());
    assert!(!ctx.contains(keys::CANONICAL_RID));
  }

  #[test]
  fn invalid_version_model_is_rejected() {
    let temp = TempDir::new().unwrap();
    let dirs = Dirs::new(temp.path(), temp.path().join("out"));
    let mut ctx = ctx_for(&dirs);
    ctx.set_str(keys::TARGET_RID, "win7-x64").unwrap();
    let broken = HostVersion {
      binaries: vec![
        HostBinary::new(HOSTFXR, "hostfxr", Version::new(2, 0, 0)).with_locked(Version::new(3, 0, 0)),
      ],
      release_suffix: String::new(),
      ensure_stable_version: false,
    };
    ctx.set(keys::HOST_VERSION, broken).unwrap();

    let err = init(&mut ctx).unwrap_err();

    assert!(matches!(err, BuildError::Version(VersionError::LockedAheadOfLatest { .. })));
  }

  #[test]
  fn missing_dirs_is_a_configuration_error() {
    let mut ctx = BuildContext::new();
    ctx.set_str(keys::TARGET_RID, "win7-x64").unwrap();
    ctx.set_str(keys::PLATFORM, "x64").unwrap();
    ctx.set(keys::HOST_VERSION, HostVersion::standard()).unwrap();

    let err = init(&mut ctx).unwrap_err();

    assert!(matches!(
      err,
      BuildError::Configuration(ContextError::Missing { ref key }) if key == "Dirs"
    ));
  }
}
