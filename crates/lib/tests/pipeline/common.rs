//! Shared fixtures: a temporary build tree and a pack step that writes chosen packages.

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use hostpack_lib::config::BuildConfig;
use hostpack_lib::context::BuildContext;
use hostpack_lib::process::{Invocation, ProcessError, ProcessOutput, ProcessRunner};
use hostpack_lib::version::{HostBinary, HostVersion};
use semver::Version;
use tempfile::TempDir;

/// Stands in for `pack.sh`: writes the configured package files into `bin/packages`
/// under the working directory it is started in.
pub struct FakePack {
  packages: Vec<String>,
  exit_code: Option<i32>,
  calls: Rc<RefCell<Vec<Invocation>>>,
}

impl FakePack {
  pub fn producing(packages: &[&str]) -> (Self, Rc<RefCell<Vec<Invocation>>>) {
    let calls = Rc::new(RefCell::new(Vec::new()));
    let pack = Self {
      packages: packages.iter().map(|p| p.to_string()).collect(),
      exit_code: None,
      calls: Rc::clone(&calls),
    };
    (pack, calls)
  }

  pub fn failing(code: i32) -> (Self, Rc<RefCell<Vec<Invocation>>>) {
    let (mut pack, calls) = Self::producing(&[]);
    pack.exit_code = Some(code);
    (pack, calls)
  }
}

impl ProcessRunner for FakePack {
  fn run(&self, invocation: &Invocation) -> Result<ProcessOutput, ProcessError> {
    self.calls.borrow_mut().push(invocation.clone());

    if let Some(code) = self.exit_code {
      return Err(ProcessError::Failed {
        program: invocation.program_name(),
        code: Some(code),
        stderr: "pack failed".to_string(),
      });
    }

    let cwd = invocation.cwd.clone().unwrap_or_default();
    let out = cwd.join("bin").join("packages");
    fs::create_dir_all(&out).unwrap();
    for package in &self.packages {
      fs::write(out.join(package), format!("contents of {package}")).unwrap();
    }
    Ok(ProcessOutput::default())
  }
}

/// A build rooted in a temporary directory.
pub struct Fixture {
  pub temp: TempDir,
  pub config: BuildConfig,
}

impl Fixture {
  pub fn new(rid: &str, host_version: HostVersion) -> Self {
    let temp = TempDir::new().unwrap();
    let config = BuildConfig {
      target_rid: Some(rid.to_string()),
      commit_hash: "4f1e2d3c".to_string(),
      repo_root: temp.path().to_path_buf(),
      output_dir: Some(temp.path().join("artifacts")),
      platform: Some("x64".to_string()),
      host_version,
      ..BuildConfig::default()
    };
    Self { temp, config }
  }

  pub fn context(&self, runner: impl ProcessRunner + 'static) -> BuildContext {
    let mut ctx = BuildContext::with_process_runner(Box::new(runner));
    self.config.seed(&mut ctx).unwrap();
    ctx
  }

  pub fn local_packages(&self) -> PathBuf {
    self.config.dirs().local_packages
  }

  pub fn pkg_dir(&self) -> PathBuf {
    self.config.dirs().pkg
  }

  pub fn root(&self) -> &Path {
    self.temp.path()
  }
}

pub fn binary(name: &str, version: &str) -> HostBinary {
  HostBinary::new(name, name, Version::parse(version).unwrap())
}

pub fn model(binaries: Vec<HostBinary>) -> HostVersion {
  HostVersion::new(binaries).unwrap()
}

/// File names in `dir`, sorted, with their contents.
pub fn snapshot(dir: &Path) -> Vec<(String, String)> {
  let mut files: Vec<(String, String)> = fs::read_dir(dir)
    .unwrap()
    .map(|entry| {
      let entry = entry.unwrap();
      (
        entry.file_name().to_string_lossy().into_owned(),
        fs::read_to_string(entry.path()).unwrap(),
      )
    })
    .collect();
  files.sort();
  files
}
