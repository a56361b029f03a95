//! Running the pack script and collecting what it produced.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info};
use walkdir::WalkDir;

use super::state::{PipelineState, Transition};
use crate::consts::PACKAGE_EXTENSION;
use crate::context::{BuildContext, keys};
use crate::paths::Dirs;
use crate::platform::DetectError;
use crate::platform::os::Os;
use crate::process::Invocation;
use crate::target::BuildError;
use crate::version::BuildVersion;

/// The pack script invocation for `os`: one positional argument, the production version.
pub fn pack_invocation(dirs: &Dirs, os: Os, build_version: &BuildVersion, timeout: Option<Duration>) -> Invocation {
  Invocation::new(dirs.pkg.join(os.pack_script()))
    .arg(build_version.production_version())
    .current_dir(&dirs.pkg)
    .timeout(timeout)
}

/// Target body: run the pack script.
pub fn invoke_packaging(ctx: &mut BuildContext) -> Result<(), BuildError> {
  let transition = Transition::begin(ctx, PipelineState::Packaged)?;

  let os = Os::current().ok_or(DetectError::UnsupportedOs(std::env::consts::OS))?;
  let dirs = ctx.get::<Dirs>(keys::DIRS)?;
  let build_version = ctx.get::<BuildVersion>(keys::BUILD_VERSION)?;
  let timeout = ctx.get_opt::<Option<Duration>>(keys::PACK_TIMEOUT)?.copied().flatten();

  let invocation = pack_invocation(dirs, os, build_version, timeout);
  info!(script = %invocation.program.display(), version = %build_version.production_version(), "packaging");
  ctx.processes().run(&invocation)?;

  transition.commit(ctx)
}

/// Copy every package in `source` into `dest`, replacing files of the same name.
///
/// Returns the destination paths in file-name order. Running it again with the same
/// source leaves `dest` unchanged.
pub fn collect_into(source: &Path, dest: &Path) -> Result<Vec<PathBuf>, BuildError> {
  fs::create_dir_all(dest).map_err(BuildError::io(dest))?;

  let mut copied = Vec::new();
  for entry in WalkDir::new(source).min_depth(1).max_depth(1).sort_by_file_name() {
    let entry = entry.map_err(|e| BuildError::Io {
      path: source.to_path_buf(),
      source: e.into(),
    })?;

    let path = entry.path();
    if !entry.file_type().is_file() || path.extension().is_none_or(|ext| ext != PACKAGE_EXTENSION) {
      continue;
    }

    let target = dest.join(entry.file_name());
    fs::copy(path, &target).map_err(BuildError::io(&target))?;
    info!(package = %entry.file_name().to_string_lossy(), dest = %dest.display(), "collected package");
    copied.push(target);
  }

  debug!(count = copied.len(), "packages collected");
  Ok(copied)
}

/// Target body: move the packages produced by the pack script into the local packages dir.
pub fn collect_packages(ctx: &mut BuildContext) -> Result<(), BuildError> {
  let transition = Transition::begin(ctx, PipelineState::Collected)?;

  let dirs = ctx.get::<Dirs>(keys::DIRS)?;
  collect_into(&dirs.pack_output(), &dirs.local_packages)?;

  transition.commit(ctx)
}
