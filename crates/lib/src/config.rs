//! Build configuration.
//!
//! A build is described by a JSON file (`hostpack.json` by default). Every field has a
//! default, so an empty object or no file at all describes a build of the standard
//! host version from the current directory. [`BuildConfig::seed`] turns the
//! configuration into the initial build context.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::consts::{CONFIG_ENV, CONFIG_FILENAME};
use crate::context::{BuildContext, ContextError, keys};
use crate::paths::Dirs;
use crate::version::{BuildVersion, HostVersion};

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read config {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("invalid config {path}: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },

  #[error("failed to resolve working directory: {0}")]
  WorkingDir(#[source] io::Error),
}

/// Everything a build needs to know up front.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
  /// Machine RID. Detected from the running system when unset.
  pub target_rid: Option<String>,
  pub commit_hash: String,
  pub repo_root: PathBuf,
  /// Build output root. `<repo_root>/artifacts` when unset.
  pub output_dir: Option<PathBuf>,
  pub host_version: HostVersion,
  pub build_version: BuildVersion,
  pub validate_host_packages: bool,
  /// MSBuild platform name. Derived from the architecture when unset.
  pub platform: Option<String>,
  pub target_framework: String,
  /// Shared framework package version. The build's package version when unset.
  pub shared_framework_nuget_version: Option<String>,
  pub toolchain: PathBuf,
  pub pack_timeout_secs: Option<u64>,
}

impl Default for BuildConfig {
  fn default() -> Self {
    Self {
      target_rid: None,
      commit_hash: "unknown".to_string(),
      repo_root: PathBuf::from("."),
      output_dir: None,
      host_version: HostVersion::standard(),
      build_version: BuildVersion::default(),
      validate_host_packages: true,
      platform: None,
      target_framework: "netcoreapp2.0".to_string(),
      shared_framework_nuget_version: None,
      toolchain: PathBuf::from("dotnet"),
      pack_timeout_secs: None,
    }
  }
}

/// Find the configuration file to load.
///
/// Lookup order: `explicit`, then `$HOSTPACK_CONFIG`, then `hostpack.json` in the
/// current directory. Returns `None` when none applies.
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
  if let Some(path) = explicit {
    return Some(path.to_path_buf());
  }

  if let Ok(path) = std::env::var(CONFIG_ENV)
    && !path.is_empty()
  {
    return Some(PathBuf::from(path));
  }

  let local = PathBuf::from(CONFIG_FILENAME);
  local.is_file().then_some(local)
}

/// `base` joined with `path`, without a leading `.` component.
fn join_relative(base: &Path, path: &Path) -> PathBuf {
  let rest = path.strip_prefix(".").unwrap_or(path);
  if rest.as_os_str().is_empty() {
    base.to_path_buf()
  } else {
    base.join(rest)
  }
}

impl BuildConfig {
  /// Parse configuration from JSON text. Relative paths are left as written.
  pub fn from_json(content: &str, origin: &Path) -> Result<Self, ConfigError> {
    serde_json::from_str(content).map_err(|source| ConfigError::Parse {
      path: origin.to_path_buf(),
      source,
    })
  }

  /// Load a configuration file. Relative paths in it resolve against its directory.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
      path: path.to_path_buf(),
      source,
    })?;

    let mut config = Self::from_json(&content, path)?;

    let parent = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
    let base = dunce::canonicalize(parent).map_err(|source| ConfigError::Read {
      path: parent.to_path_buf(),
      source,
    })?;
    config.resolve_relative(&base);

    debug!(path = %path.display(), "loaded build config");
    Ok(config)
  }

  /// Load the file found by [`resolve_config_path`], or the defaults if there is none.
  ///
  /// Defaults resolve against the current directory, so every path is absolute either way.
  pub fn discover(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>), ConfigError> {
    match resolve_config_path(explicit) {
      Some(path) => Ok((Self::load(&path)?, Some(path))),
      None => {
        let cwd = std::env::current_dir()
          .and_then(dunce::canonicalize)
          .map_err(ConfigError::WorkingDir)?;
        debug!(cwd = %cwd.display(), "no build config found, using defaults");

        let mut config = Self::default();
        config.resolve_relative(&cwd);
        Ok((config, None))
      }
    }
  }

  fn resolve_relative(&mut self, base: &Path) {
    if self.repo_root.is_relative() {
      self.repo_root = join_relative(base, &self.repo_root);
    }
    if let Some(output) = &self.output_dir
      && output.is_relative()
    {
      self.output_dir = Some(join_relative(base, output));
    }
  }

  pub fn dirs(&self) -> Dirs {
    let output = self
      .output_dir
      .clone()
      .unwrap_or_else(|| self.repo_root.join("artifacts"));
    Dirs::new(self.repo_root.clone(), output)
  }

  pub fn pack_timeout(&self) -> Option<Duration> {
    self.pack_timeout_secs.map(Duration::from_secs)
  }

  /// Write every configured fact into `ctx`.
  ///
  /// Unset optional facts (`TargetRID`, `Platform`) are left for the `init` target.
  pub fn seed(&self, ctx: &mut BuildContext) -> Result<(), ContextError> {
    if let Some(rid) = &self.target_rid {
      ctx.set_str(keys::TARGET_RID, rid.as_str())?;
    }
    if let Some(platform) = &self.platform {
      ctx.set_str(keys::PLATFORM, platform.as_str())?;
    }

    let nuget_version = self
      .shared_framework_nuget_version
      .clone()
      .unwrap_or_else(|| self.build_version.nuget_version());

    ctx.set_str(keys::COMMIT_HASH, self.commit_hash.as_str())?;
    ctx.set(keys::HOST_VERSION, self.host_version.clone())?;
    ctx.set(keys::BUILD_VERSION, self.build_version.clone())?;
    ctx.set(keys::VALIDATE_HOST_PACKAGES, self.validate_host_packages)?;
    ctx.set(keys::DIRS, self.dirs())?;
    ctx.set_str(keys::TARGET_FRAMEWORK, self.target_framework.as_str())?;
    ctx.set_str(keys::SHARED_FRAMEWORK_NUGET_VERSION, nuget_version)?;
    ctx.set(keys::TOOLCHAIN, self.toolchain.clone())?;
    ctx.set(keys::PACK_TIMEOUT, self.pack_timeout())?;
    Ok(())
  }
}
