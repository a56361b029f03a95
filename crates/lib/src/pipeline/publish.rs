//! Toolchain-driven targets: restoring the locked host and publishing the shared framework.

use std::fs;
use std::path::{Path, PathBuf};

use semver::Version;
use serde_json::json;
use tracing::info;

use crate::context::{BuildContext, keys};
use crate::paths::{Dirs, recreate_dir};
use crate::process::Invocation;
use crate::target::BuildError;
use crate::version::{HOSTFXR, HostVersion};

/// Scratch project directory under the intermediate directory.
pub const LOCKED_HOST_PROJECT_DIR: &str = "lockedHostTemp";

fn path_arg(path: &Path) -> String {
  path.to_string_lossy().into_owned()
}

/// Project file that restores `package_id` at its locked version for one RID.
pub fn locked_host_project(package_id: &str, locked: &Version, framework: &str, rid: &str) -> serde_json::Value {
  json!({
    "dependencies": { package_id: locked.to_string() },
    "frameworks": { framework: {} },
    "runtimes": { rid: {} },
  })
}

/// Target body: restore and publish the host resolver at its locked version.
pub fn restore_locked_host(ctx: &mut BuildContext) -> Result<(), BuildError> {
  let rid = super::canonical_rid(ctx)?;
  let host_version = ctx.get::<HostVersion>(keys::HOST_VERSION)?;
  let framework = ctx.get_str(keys::TARGET_FRAMEWORK)?;
  let dirs = ctx.get::<Dirs>(keys::DIRS)?;
  let toolchain = ctx.get::<PathBuf>(keys::TOOLCHAIN)?;

  let hostfxr = host_version.require(HOSTFXR)?;
  let project = locked_host_project(&hostfxr.package_id, &hostfxr.locked, framework, rid);
  let content = serde_json::to_string_pretty(&project).map_err(|source| BuildError::Serialize {
    what: "locked host project",
    source,
  })?;

  let project_dir = dirs.intermediate.join(LOCKED_HOST_PROJECT_DIR);
  recreate_dir(&project_dir).map_err(BuildError::io(&project_dir))?;
  let project_file = project_dir.join("project.json");
  fs::write(&project_file, content).map_err(BuildError::io(&project_file))?;

  info!(version = %hostfxr.locked, rid = %rid, "restoring locked host");
  ctx.processes().run(
    &Invocation::new(toolchain)
      .args(["restore", "--verbosity", "verbose"])
      .current_dir(&project_dir),
  )?;

  recreate_dir(&dirs.corehost_locked).map_err(BuildError::io(&dirs.corehost_locked))?;
  ctx.processes().run(
    &Invocation::new(toolchain)
      .args(["publish", "--output"])
      .arg(path_arg(&dirs.corehost_locked))
      .args(["--no-build", "-r", rid])
      .current_dir(&project_dir),
  )?;

  Ok(())
}

/// Target body: publish the shared framework into a clean output directory.
pub fn publish_shared_framework(ctx: &mut BuildContext) -> Result<(), BuildError> {
  let dirs = ctx.get::<Dirs>(keys::DIRS)?;
  let toolchain = ctx.get::<PathBuf>(keys::TOOLCHAIN)?;
  let host_version = ctx.get::<HostVersion>(keys::HOST_VERSION)?;
  let nuget_version = ctx.get_str(keys::SHARED_FRAMEWORK_NUGET_VERSION)?;
  let rid = ctx.get_str(keys::TARGET_RID)?;
  let framework = ctx.get_str(keys::TARGET_FRAMEWORK)?;
  let commit_hash = ctx.get_str(keys::COMMIT_HASH)?;
  let hostfxr = host_version.require(HOSTFXR)?;

  let output = &dirs.shared_framework_publish;
  recreate_dir(output).map_err(BuildError::io(output))?;

  let project = dirs.repo_root.join("src").join("sharedframework").join("framework");
  info!(version = %nuget_version, rid = %rid, output = %output.display(), "publishing shared framework");
  ctx.processes().run(
    &Invocation::new(toolchain)
      .arg("publish")
      .arg(path_arg(&project))
      .arg("--output")
      .arg(path_arg(output))
      .args(["--framework", framework, "-r", rid])
      .arg(format!("/p:SharedFrameworkNugetVersion={}", nuget_version))
      .arg(format!("/p:HostFxrVersion={}", hostfxr.locked))
      .arg(format!("/p:CommitHash={}", commit_hash))
      .current_dir(&dirs.repo_root),
  )?;

  Ok(())
}
