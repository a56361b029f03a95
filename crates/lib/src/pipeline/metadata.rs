//! Version metadata handed to the packaging step and the native build.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use semver::Version;
use tracing::{debug, info};

use super::state::{PipelineState, Transition};
use crate::context::{BuildContext, keys};
use crate::paths::{Dirs, recreate_dir};
use crate::platform::os::Os;
use crate::target::BuildError;
use crate::version::{HOST, HOSTFXR, HOSTPOLICY, HostBinary, HostVersion, VersionExt};

/// Metadata file read by the pack script.
pub const VERSION_FILE: &str = "version.txt";

/// MSBuild property file read by the package projects.
pub const PROPS_FILE: &str = "version.props";

/// Header written per binary for native version resources.
pub const VERSION_RESOURCE_HEADER: &str = "version_info.h";

/// Content of `version.txt`: the commit hash, then the primary binary's version.
pub fn version_file_content(commit_hash: &str, version: &Version) -> String {
  format!("{}\n{}\n", commit_hash, version)
}

/// Target body: write `version.txt` into the pkg directory.
pub fn write_version_metadata(ctx: &mut BuildContext) -> Result<(), BuildError> {
  let transition = Transition::begin(ctx, PipelineState::MetadataEmitted)?;

  // Packages are named after the canonical RID; refuse to write anything for a
  // machine that has none.
  let rid = super::canonical_rid(ctx)?;

  let host_version = ctx.get::<HostVersion>(keys::HOST_VERSION)?;
  let commit_hash = ctx.get_str(keys::COMMIT_HASH)?;
  let dirs = ctx.get::<Dirs>(keys::DIRS)?;

  let primary = host_version.primary()?;
  let path = dirs.pkg.join(VERSION_FILE);
  fs::create_dir_all(&dirs.pkg).map_err(BuildError::io(&dirs.pkg))?;
  fs::write(&path, version_file_content(commit_hash, &primary.latest)).map_err(BuildError::io(&path))?;

  info!(path = %path.display(), version = %primary.latest, rid = %rid, "wrote version metadata");

  transition.commit(ctx)
}

fn version_without_suffix(host_version: &HostVersion, name: &str) -> String {
  host_version
    .binary(name)
    .map(|b| b.latest.without_suffix())
    .unwrap_or_default()
}

/// MSBuild property group describing the host versions.
///
/// Binaries missing from the model yield empty properties.
pub fn msbuild_props(platform: &str, host_bin_dir: &Path, host_version: &HostVersion) -> Result<String, BuildError> {
  let build_number = host_version.primary()?.build_number;

  let properties = [
    ("Platform", platform.to_string()),
    ("DotNetHostBinDir", host_bin_dir.display().to_string()),
    ("HostVersion", version_without_suffix(host_version, HOST)),
    ("HostResolverVersion", version_without_suffix(host_version, HOSTFXR)),
    ("HostPolicyVersion", version_without_suffix(host_version, HOSTPOLICY)),
    ("BuildNumberMajor", build_number.major.to_string()),
    ("BuildNumberMinor", build_number.minor.to_string()),
    ("PreReleaseLabel", host_version.release_suffix.clone()),
    ("EnsureStableVersion", host_version.ensure_stable_version.to_string()),
  ];

  let mut props = String::from("<Project xmlns=\"http://schemas.microsoft.com/developer/msbuild/2003\">\n");
  props.push_str("  <PropertyGroup>\n");
  for (name, value) in properties {
    props.push_str(&format!("    <{name}>{value}</{name}>\n"));
  }
  props.push_str("  </PropertyGroup>\n");
  props.push_str("</Project>\n");
  Ok(props)
}

/// Target body: write `version.props` into the pkg directory.
pub fn generate_msbuild_props(ctx: &mut BuildContext) -> Result<(), BuildError> {
  let host_version = ctx.get::<HostVersion>(keys::HOST_VERSION)?;
  let platform = ctx.get_str(keys::PLATFORM)?;
  let dirs = ctx.get::<Dirs>(keys::DIRS)?;

  let content = msbuild_props(platform, &dirs.corehost_latest, host_version)?;
  let path = dirs.pkg.join(PROPS_FILE);
  fs::create_dir_all(&dirs.pkg).map_err(BuildError::io(&dirs.pkg))?;
  fs::write(&path, content).map_err(BuildError::io(&path))?;

  info!(path = %path.display(), "wrote msbuild props");
  Ok(())
}

/// Native version resource header for one binary.
pub fn version_resource(binary: &HostBinary, commit_hash: &str, machine: &str, built_at: SystemTime) -> String {
  let v = &binary.latest;
  let build = binary.build_number;
  let details = format!(
    "{}, {} built by: {}, UTC: {}",
    v,
    commit_hash,
    machine,
    humantime::format_rfc3339_seconds(built_at)
  );

  format!(
    r#"
#include <Windows.h>

#ifndef VER_COMPANYNAME_STR
#define VER_COMPANYNAME_STR         "Microsoft Corporation"
#endif
#ifndef VER_FILEDESCRIPTION_STR
#define VER_FILEDESCRIPTION_STR     "{name}"
#endif
#ifndef VER_INTERNALNAME_STR
#define VER_INTERNALNAME_STR        VER_FILEDESCRIPTION_STR
#endif
#ifndef VER_ORIGINALFILENAME_STR
#define VER_ORIGINALFILENAME_STR    VER_FILEDESCRIPTION_STR
#endif
#ifndef VER_PRODUCTNAME_STR
#define VER_PRODUCTNAME_STR         "Microsoft\xae .NET Core Framework";
#endif
#undef VER_PRODUCTVERSION
#define VER_PRODUCTVERSION          {major},{minor},{patch},{build_major}
#undef VER_PRODUCTVERSION_STR
#define VER_PRODUCTVERSION_STR      "{details}"
#undef VER_FILEVERSION
#define VER_FILEVERSION             {major},{minor},{patch},{build_major}
#undef VER_FILEVERSION_STR
#define VER_FILEVERSION_STR         "{major},{minor},{build_major},{build_minor},{details}";
#ifndef VER_LEGALCOPYRIGHT_STR
#define VER_LEGALCOPYRIGHT_STR      "\xa9 Microsoft Corporation.  All rights reserved.";
#endif
#ifndef VER_DEBUG
#ifdef DEBUG
#define VER_DEBUG                   VS_FF_DEBUG
#else
#define VER_DEBUG                   0
#endif
#endif
"#,
    name = binary.name,
    major = v.major,
    minor = v.minor,
    patch = v.patch,
    build_major = build.major,
    build_minor = build.minor,
    details = details,
  )
}

/// Write `<dir>/<binary>/version_info.h` for every binary, replacing `dir`.
pub fn write_version_resources(
  dir: &Path,
  host_version: &HostVersion,
  commit_hash: &str,
  machine: &str,
) -> Result<Vec<PathBuf>, BuildError> {
  recreate_dir(dir).map_err(BuildError::io(dir))?;

  let built_at = SystemTime::now();
  let mut written = Vec::with_capacity(host_version.binaries.len());
  for binary in &host_version.binaries {
    let header_dir = dir.join(&binary.name);
    fs::create_dir_all(&header_dir).map_err(BuildError::io(&header_dir))?;

    let path = header_dir.join(VERSION_RESOURCE_HEADER);
    fs::write(&path, version_resource(binary, commit_hash, machine, built_at)).map_err(BuildError::io(&path))?;
    debug!(path = %path.display(), "wrote version resource");
    written.push(path);
  }
  Ok(written)
}

fn machine_name() -> String {
  ["COMPUTERNAME", "HOSTNAME"]
    .iter()
    .find_map(|var| std::env::var(var).ok().filter(|v| !v.is_empty()))
    .unwrap_or_else(|| "unknown".to_string())
}

/// Target body: generate version resource headers. Only Windows binaries carry them.
pub fn generate_version_resource(ctx: &mut BuildContext) -> Result<(), BuildError> {
  if Os::current() != Some(Os::Windows) {
    debug!("version resources are only generated on windows");
    return Ok(());
  }

  let dir = ctx.get::<Dirs>(keys::DIRS)?.intermediate.join("hostResourceFiles");
  let host_version = ctx.get::<HostVersion>(keys::HOST_VERSION)?;
  let commit_hash = ctx.get_str(keys::COMMIT_HASH)?;

  let written = write_version_resources(&dir, host_version, commit_hash, &machine_name())?;
  info!(dir = %dir.display(), count = written.len(), "generated version resources");

  ctx.set(keys::VERSION_RESOURCE_DIR, dir)?;
  Ok(())
}
