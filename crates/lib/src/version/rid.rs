//! Mapping from build-machine RIDs to publishable package RIDs.

use std::collections::BTreeMap;

use thiserror::Error;

/// Machine RID -> canonical RID of the package produced on that machine.
///
/// Several machine RIDs share one package (e.g. every RHEL-compatible 7.x
/// distribution publishes `rhel.7-x64`).
const STANDARD_RIDS: &[(&str, &str)] = &[
  ("win7-x64", "win7-x64"),
  ("win7-x86", "win7-x86"),
  ("win10-arm64", "win10-arm64"),
  ("osx.10.10-x64", "osx.10.10-x64"),
  ("osx.10.11-x64", "osx.10.10-x64"),
  ("ubuntu.14.04-x64", "ubuntu.14.04-x64"),
  ("ubuntu.16.04-x64", "ubuntu.16.04-x64"),
  ("ubuntu.16.10-x64", "ubuntu.16.10-x64"),
  ("centos.7-x64", "rhel.7-x64"),
  ("rhel.7-x64", "rhel.7-x64"),
  ("rhel.7.2-x64", "rhel.7-x64"),
  ("debian.8-x64", "debian.8-x64"),
  ("fedora.23-x64", "fedora.23-x64"),
  ("opensuse.13.2-x64", "opensuse.13.2-x64"),
  ("opensuse.42.1-x64", "opensuse.42.1-x64"),
];

/// The RID has no publishable package.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported platform '{rid}': no host package RID is mapped for it")]
pub struct UnsupportedPlatformError {
  pub rid: String,
}

/// Fixed lookup from machine RID to canonical RID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RidMap {
  entries: BTreeMap<&'static str, &'static str>,
}

impl RidMap {
  /// The table shipped with the build.
  pub fn standard() -> Self {
    Self {
      entries: STANDARD_RIDS.iter().copied().collect(),
    }
  }

  /// Resolve a machine RID to its canonical RID.
  ///
  /// An unmapped RID is an error; there is no fallback.
  pub fn resolve(&self, rid: &str) -> Result<&'static str, UnsupportedPlatformError> {
    self
      .entries
      .get(rid)
      .copied()
      .ok_or_else(|| UnsupportedPlatformError { rid: rid.to_string() })
  }

  /// Returns true if `rid` is a supported machine RID.
  pub fn supports(&self, rid: &str) -> bool {
    self.entries.contains_key(rid)
  }

  /// All (machine RID, canonical RID) pairs, ordered by machine RID.
  pub fn entries(&self) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
    self.entries.iter().map(|(k, v)| (*k, *v))
  }

  /// Distinct canonical RIDs, sorted.
  pub fn canonical_rids(&self) -> Vec<&'static str> {
    let mut rids: Vec<&'static str> = self.entries.values().copied().collect();
    rids.sort_unstable();
    rids.dedup();
    rids
  }
}

impl Default for RidMap {
  fn default() -> Self {
    Self::standard()
  }
}
