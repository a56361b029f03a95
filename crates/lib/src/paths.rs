//! Build directory layout.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Directories a build reads from and writes to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dirs {
  pub repo_root: PathBuf,
  /// Holds the pack script, `version.txt` and `version.props`.
  pub pkg: PathBuf,
  pub output: PathBuf,
  pub intermediate: PathBuf,
  /// Freshly built host binaries.
  pub corehost_latest: PathBuf,
  /// Host binaries restored at their locked versions.
  pub corehost_locked: PathBuf,
  /// Collected host packages.
  pub local_packages: PathBuf,
  pub shared_framework_publish: PathBuf,
}

impl Dirs {
  /// The standard layout under `repo_root` with build outputs under `output`.
  pub fn new(repo_root: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
    let repo_root = repo_root.into();
    let output = output.into();
    let intermediate = output.join("intermediate");

    Self {
      pkg: repo_root.join("pkg"),
      corehost_latest: output.join("corehost"),
      corehost_locked: output.join("corehost_locked"),
      local_packages: output.join("packages"),
      shared_framework_publish: intermediate.join("sharedFrameworkPublish"),
      intermediate,
      output,
      repo_root,
    }
  }

  /// Where the pack script leaves the packages it produced.
  pub fn pack_output(&self) -> PathBuf {
    self.pkg.join("bin").join("packages")
  }

  /// Create the directories every build writes into.
  pub fn create_all(&self) -> io::Result<()> {
    for dir in [&self.output, &self.intermediate, &self.corehost_latest, &self.local_packages] {
      fs::create_dir_all(dir)?;
    }
    Ok(())
  }
}

/// Remove `dir` and everything under it, then create it empty.
pub fn recreate_dir(dir: &Path) -> io::Result<()> {
  match fs::remove_dir_all(dir) {
    Ok(()) => {}
    Err(e) if e.kind() == io::ErrorKind::NotFound => {}
    Err(e) => return Err(e),
  }
  fs::create_dir_all(dir)
}

#[cfg(test)]
mod tests {
  use tempfile::TempDir;

  use super::*;

  #[test]
  fn layout_is_derived_from_roots() {
    let dirs = Dirs::new("/src/host", "/src/host/artifacts/rhel.7-x64");

    assert_eq!(dirs.pkg, PathBuf::from("/src/host/pkg"));
    assert_eq!(dirs.pack_output(), PathBuf::from("/src/host/pkg/bin/packages"));
    assert_eq!(dirs.local_packages, PathBuf::from("/src/host/artifacts/rhel.7-x64/packages"));
    assert_eq!(
      dirs.shared_framework_publish,
      PathBuf::from("/src/host/artifacts/rhel.7-x64/intermediate/sharedFrameworkPublish")
    );
  }

  #[test]
  fn create_all_is_repeatable() {
    let temp = TempDir::new().unwrap();
    let dirs = Dirs::new(temp.path(), temp.path().join("out"));

    dirs.create_all().unwrap();
    dirs.create_all().unwrap();

    assert!(dirs.local_packages.is_dir());
    assert!(dirs.intermediate.is_dir());
    assert!(!dirs.corehost_locked.exists());
  }

  #[test]
  fn recreate_dir_empties_existing_contents() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("publish");
    fs::create_dir_all(dir.join("nested")).unwrap();
    fs::write(dir.join("nested/stale.dll"), "old").unwrap();

    recreate_dir(&dir).unwrap();

    assert!(dir.is_dir());
    assert_eq!(fs::read_dir(&dir).unwrap().count(), 0);
  }

  #[test]
  fn recreate_dir_creates_missing_directory() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("a/b");

    recreate_dir(&dir).unwrap();

    assert!(dir.is_dir());
  }
}
