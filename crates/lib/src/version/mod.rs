//! Version model of the produced host binaries.
//!
//! Each host binary carries two semantic versions: the latest one being built and a
//! locked one that older frameworks resolve against. The build-number pair is
//! independent of both and feeds native file-version resources.

pub mod rid;

use std::collections::HashSet;
use std::fmt;

use semver::{BuildMetadata, Prerelease, Version};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use rid::{RidMap, UnsupportedPlatformError};

/// Logical name of the muxer binary.
pub const HOST: &str = "host";
/// Logical name of the host resolver binary.
pub const HOSTFXR: &str = "hostfxr";
/// Logical name of the host policy binary.
pub const HOSTPOLICY: &str = "hostpolicy";

/// Errors in the version model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionError {
  /// A binary's locked version is newer than its latest version.
  #[error("locked version {locked} of {binary} is newer than latest version {latest}")]
  LockedAheadOfLatest {
    binary: String,
    locked: Version,
    latest: Version,
  },

  #[error("host binary {0} is described more than once")]
  DuplicateBinary(String),

  #[error("version model describes no host binaries")]
  NoBinaries,

  #[error("version model does not describe host binary {0}")]
  MissingBinary(String),

  #[error("invalid prerelease label '{label}': {message}")]
  InvalidLabel { label: String, message: String },
}

/// Formatting helpers for semantic versions.
pub trait VersionExt {
  /// `major.minor.patch` without prerelease label or build metadata.
  fn without_suffix(&self) -> String;
}

impl VersionExt for Version {
  fn without_suffix(&self) -> String {
    format!("{}.{}.{}", self.major, self.minor, self.patch)
  }
}

/// Build a version from parts and an optional prerelease label.
pub fn version_with_label(major: u64, minor: u64, patch: u64, label: &str) -> Result<Version, VersionError> {
  let pre = Prerelease::new(label).map_err(|e| VersionError::InvalidLabel {
    label: label.to_string(),
    message: e.to_string(),
  })?;
  Ok(Version {
    major,
    minor,
    patch,
    pre,
    build: BuildMetadata::EMPTY,
  })
}

/// Build-number pair stamped into native version resources.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildNumber {
  pub major: u32,
  pub minor: u32,
}

/// One produced host binary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostBinary {
  /// Logical binary name (`host`, `hostfxr`, `hostpolicy`).
  pub name: String,
  /// Package id the binary ships in.
  pub package_id: String,
  /// Version being built.
  pub latest: Version,
  /// Version used for backward-compatible resolution.
  pub locked: Version,
  #[serde(default)]
  pub build_number: BuildNumber,
}

impl HostBinary {
  /// A binary whose locked version equals its latest version.
  pub fn new(name: impl Into<String>, package_id: impl Into<String>, latest: Version) -> Self {
    Self {
      name: name.into(),
      package_id: package_id.into(),
      locked: latest.clone(),
      latest,
      build_number: BuildNumber::default(),
    }
  }

  pub fn with_locked(mut self, locked: Version) -> Self {
    self.locked = locked;
    self
  }

  pub fn with_build_number(mut self, major: u32, minor: u32) -> Self {
    self.build_number = BuildNumber { major, minor };
    self
  }
}

/// Versions of every produced host binary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostVersion {
  pub binaries: Vec<HostBinary>,
  #[serde(default)]
  pub release_suffix: String,
  #[serde(default)]
  pub ensure_stable_version: bool,
}

impl HostVersion {
  /// Create a validated version model.
  pub fn new(binaries: Vec<HostBinary>) -> Result<Self, VersionError> {
    let host = Self {
      binaries,
      release_suffix: String::new(),
      ensure_stable_version: false,
    };
    host.validate()?;
    Ok(host)
  }

  /// The versions shipped by default: every binary at 2.0.0 with a `preview1` label,
  /// locked to the 1.1.0 release.
  pub fn standard() -> Self {
    let latest = Version {
      pre: Prerelease::new("preview1").unwrap_or(Prerelease::EMPTY),
      ..Version::new(2, 0, 0)
    };
    let locked = Version::new(1, 1, 0);

    let binary = |name: &str, package_id: &str| {
      HostBinary::new(name, package_id, latest.clone()).with_locked(locked.clone())
    };

    Self {
      binaries: vec![
        binary(HOST, "Microsoft.NETCore.DotNetHost"),
        binary(HOSTFXR, "Microsoft.NETCore.DotNetHostResolver"),
        binary(HOSTPOLICY, "Microsoft.NETCore.DotNetHostPolicy"),
      ],
      release_suffix: "preview1".to_string(),
      ensure_stable_version: false,
    }
  }

  /// Check model invariants: at least one binary, unique names, `locked <= latest`.
  pub fn validate(&self) -> Result<(), VersionError> {
    if self.binaries.is_empty() {
      return Err(VersionError::NoBinaries);
    }

    let mut seen = HashSet::new();
    for binary in &self.binaries {
      if !seen.insert(binary.name.as_str()) {
        return Err(VersionError::DuplicateBinary(binary.name.clone()));
      }
      if binary.locked > binary.latest {
        return Err(VersionError::LockedAheadOfLatest {
          binary: binary.name.clone(),
          locked: binary.locked.clone(),
          latest: binary.latest.clone(),
        });
      }
    }
    Ok(())
  }

  /// Look up a binary by logical name.
  pub fn binary(&self, name: &str) -> Option<&HostBinary> {
    self.binaries.iter().find(|b| b.name == name)
  }

  /// Like [`binary`](Self::binary), but a missing binary is an error.
  pub fn require(&self, name: &str) -> Result<&HostBinary, VersionError> {
    self.binary(name).ok_or_else(|| VersionError::MissingBinary(name.to_string()))
  }

  /// The binary whose version labels the whole host build: `host` if described,
  /// otherwise the first binary.
  pub fn primary(&self) -> Result<&HostBinary, VersionError> {
    self
      .binary(HOST)
      .or_else(|| self.binaries.first())
      .ok_or(VersionError::NoBinaries)
  }

  /// (package id, latest version) for every binary, in model order.
  pub fn latest_packages(&self) -> impl Iterator<Item = (&str, &Version)> {
    self.binaries.iter().map(|b| (b.package_id.as_str(), &b.latest))
  }
}

impl Default for HostVersion {
  fn default() -> Self {
    Self::standard()
  }
}

/// Product version of the build as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildVersion {
  pub major: u64,
  pub minor: u64,
  pub patch: u64,
  #[serde(default)]
  pub release_label: String,
  #[serde(default)]
  pub commit_count: u32,
}

impl BuildVersion {
  /// `major.minor.patch`, passed to the packaging step.
  pub fn production_version(&self) -> String {
    format!("{}.{}.{}", self.major, self.minor, self.patch)
  }

  /// Package version: production version plus label and zero-padded commit count.
  pub fn nuget_version(&self) -> String {
    if self.release_label.is_empty() {
      self.production_version()
    } else {
      format!(
        "{}-{}-{:06}",
        self.production_version(),
        self.release_label,
        self.commit_count
      )
    }
  }
}

impl Default for BuildVersion {
  fn default() -> Self {
    Self {
      major: 2,
      minor: 0,
      patch: 0,
      release_label: "preview1".to_string(),
      commit_count: 0,
    }
  }
}

impl fmt::Display for BuildVersion {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.nuget_version())
  }
}
