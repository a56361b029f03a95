//! Shared build context.
//!
//! A [`BuildContext`] is the single store of build-wide facts (paths, the target RID,
//! version records, flags) that every target reads and writes. Values are stored by
//! string key with their concrete type recorded on first write; reads must ask for
//! exactly that type.
//!
//! The context is owned by one runner on one thread and handed to target bodies as
//! `&mut BuildContext`, so it needs no locking.

use std::any::{Any, type_name};
use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

use crate::process::{ProcessRunner, TokioProcessRunner};

/// Well-known context keys.
pub mod keys {
  /// `String`: build-machine runtime identifier, e.g. `centos.7-x64`.
  pub const TARGET_RID: &str = "TargetRID";
  /// `String`: publishable RID that `TargetRID` maps to.
  pub const CANONICAL_RID: &str = "CanonicalRID";
  /// `String`: source commit identifier written into version metadata.
  pub const COMMIT_HASH: &str = "CommitHash";
  /// `HostVersion`: versions of every produced host binary.
  pub const HOST_VERSION: &str = "HostVersion";
  /// `BuildVersion`: product version of the build.
  pub const BUILD_VERSION: &str = "BuildVersion";
  /// `bool`: whether produced host packages are validated after packaging.
  pub const VALIDATE_HOST_PACKAGES: &str = "ValidateHostPackages";
  /// `String`: MSBuild platform name, e.g. `x64`.
  pub const PLATFORM: &str = "Platform";
  /// `Dirs`: build directory layout.
  pub const DIRS: &str = "Dirs";
  /// `String`: target framework moniker used for restore and publish.
  pub const TARGET_FRAMEWORK: &str = "TargetFramework";
  /// `String`: package version of the shared framework.
  pub const SHARED_FRAMEWORK_NUGET_VERSION: &str = "SharedFrameworkNugetVersion";
  /// `PathBuf`: toolchain executable used for restore and publish.
  pub const TOOLCHAIN: &str = "Toolchain";
  /// `Option<Duration>`: limit on how long the packaging step may run.
  pub const PACK_TIMEOUT: &str = "PackTimeout";
  /// `PipelineState`: progress of the packaging pipeline.
  pub const PIPELINE_STATE: &str = "PipelineState";
  /// `PathBuf`: directory holding generated version resource headers.
  pub const VERSION_RESOURCE_DIR: &str = "VersionResourceDir";
}

/// Errors raised when reading or writing the build context.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextError {
  /// The key was never set.
  #[error("build context key '{key}' is not set")]
  Missing { key: String },

  /// The key holds a value of another type.
  #[error("build context key '{key}' holds {actual}, expected {expected}")]
  TypeMismatch {
    key: String,
    expected: &'static str,
    actual: &'static str,
  },
}

struct Entry {
  value: Box<dyn Any>,
  type_name: &'static str,
}

/// Typed key/value store shared by all targets of one build invocation.
pub struct BuildContext {
  values: HashMap<String, Entry>,
  processes: Box<dyn ProcessRunner>,
}

impl BuildContext {
  /// Create an empty context that runs external processes with [`TokioProcessRunner`].
  pub fn new() -> Self {
    Self::with_process_runner(Box::new(TokioProcessRunner))
  }

  /// Create an empty context with a custom process runner.
  pub fn with_process_runner(processes: Box<dyn ProcessRunner>) -> Self {
    Self {
      values: HashMap::new(),
      processes,
    }
  }

  /// Read the value stored under `key` as `T`.
  ///
  /// # Errors
  ///
  /// [`ContextError::Missing`] if the key was never set,
  /// [`ContextError::TypeMismatch`] if it holds a value of another type.
  pub fn get<T: Any>(&self, key: &str) -> Result<&T, ContextError> {
    let entry = self.values.get(key).ok_or_else(|| ContextError::Missing { key: key.to_string() })?;

    entry.value.downcast_ref::<T>().ok_or_else(|| ContextError::TypeMismatch {
      key: key.to_string(),
      expected: type_name::<T>(),
      actual: entry.type_name,
    })
  }

  /// Like [`get`](Self::get), but an unset key reads as `None`.
  ///
  /// A key holding another type is still an error.
  pub fn get_opt<T: Any>(&self, key: &str) -> Result<Option<&T>, ContextError> {
    if !self.contains(key) {
      return Ok(None);
    }
    self.get(key).map(Some)
  }

  /// Read a string value.
  pub fn get_str(&self, key: &str) -> Result<&str, ContextError> {
    self.get::<String>(key).map(String::as_str)
  }

  /// Read a boolean value.
  pub fn get_bool(&self, key: &str) -> Result<bool, ContextError> {
    self.get::<bool>(key).copied()
  }

  /// Store `value` under `key`, overwriting any previous value of the same type.
  ///
  /// # Errors
  ///
  /// [`ContextError::TypeMismatch`] if the key already holds a value of another type.
  pub fn set<T: Any>(&mut self, key: impl Into<String>, value: T) -> Result<(), ContextError> {
    let key = key.into();

    if let Some(existing) = self.values.get(&key)
      && !existing.value.is::<T>()
    {
      return Err(ContextError::TypeMismatch {
        key,
        expected: existing.type_name,
        actual: type_name::<T>(),
      });
    }

    self.values.insert(
      key,
      Entry {
        value: Box::new(value),
        type_name: type_name::<T>(),
      },
    );
    Ok(())
  }

  /// Store a string value.
  pub fn set_str(&mut self, key: impl Into<String>, value: impl Into<String>) -> Result<(), ContextError> {
    self.set(key, value.into())
  }

  /// Returns true if `key` has been set.
  pub fn contains(&self, key: &str) -> bool {
    self.values.contains_key(key)
  }

  /// Keys currently set, sorted.
  pub fn keys(&self) -> Vec<&str> {
    let mut keys: Vec<&str> = self.values.keys().map(String::as_str).collect();
    keys.sort_unstable();
    keys
  }

  /// The runner used for every external process of this build.
  pub fn processes(&self) -> &dyn ProcessRunner {
    self.processes.as_ref()
  }
}

impl Default for BuildContext {
  fn default() -> Self {
    Self::new()
  }
}

impl fmt::Debug for BuildContext {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut entries: Vec<(&str, &str)> = self.values.iter().map(|(k, e)| (k.as_str(), e.type_name)).collect();
    entries.sort_unstable();
    f.debug_struct("BuildContext").field("values", &entries).finish_non_exhaustive()
  }
}
