pub mod arch;
pub mod os;

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use arch::Arch;
use os::Os;
use thiserror::Error;

/// Files describing the Linux distribution, in lookup order.
const OS_RELEASE_PATHS: &[&str] = &["/etc/os-release", "/usr/lib/os-release"];

/// Property list holding the macOS product version.
const MACOS_VERSION_PLIST: &str = "/System/Library/CoreServices/SystemVersion.plist";

/// Errors from detecting the build machine's runtime identifier.
#[derive(Debug, Error)]
pub enum DetectError {
  #[error("unsupported operating system: {0}")]
  UnsupportedOs(&'static str),

  #[error("unsupported architecture: {0}")]
  UnsupportedArch(&'static str),

  #[error("failed to read {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("could not determine OS version from {0}")]
  UnknownVersion(PathBuf),
}

/// Platform identifier combining OS and architecture (e.g., "linux-x64")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Platform {
  pub os: Os,
  pub arch: Arch,
}

impl Platform {
  /// Create a new platform identifier
  pub fn new(os: Os, arch: Arch) -> Self {
    Self { os, arch }
  }

  /// Detect the current platform at runtime
  pub fn current() -> Result<Self, DetectError> {
    Ok(Self {
      os: Os::current().ok_or(DetectError::UnsupportedOs(std::env::consts::OS))?,
      arch: Arch::current().ok_or(DetectError::UnsupportedArch(std::env::consts::ARCH))?,
    })
  }

  /// Detect the runtime identifier of this machine (OS, OS version, architecture).
  ///
  /// The result is the machine RID (e.g. `centos.7-x64`), not the canonical
  /// publishable RID; map it through [`RidMap`](crate::version::RidMap).
  pub fn detect_rid(&self) -> Result<String, DetectError> {
    match self.os {
      Os::Linux => {
        let (path, content) = read_first(OS_RELEASE_PATHS)?;
        linux_rid(&content, self.arch).ok_or(DetectError::UnknownVersion(path))
      }
      Os::MacOs => {
        let path = Path::new(MACOS_VERSION_PLIST);
        let content = fs::read_to_string(path).map_err(|source| DetectError::Read {
          path: path.to_path_buf(),
          source,
        })?;
        macos_rid(&content, self.arch).ok_or_else(|| DetectError::UnknownVersion(path.to_path_buf()))
      }
      Os::Windows => Ok(windows_rid(self.arch)),
    }
  }
}

impl fmt::Display for Platform {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}-{}", self.os, self.arch)
  }
}

/// Detect the runtime identifier of the current machine.
pub fn detect_rid() -> Result<String, DetectError> {
  Platform::current()?.detect_rid()
}

fn read_first(paths: &[&str]) -> Result<(PathBuf, String), DetectError> {
  let mut last_err = None;
  for path in paths {
    match fs::read_to_string(path) {
      Ok(content) => return Ok((PathBuf::from(path), content)),
      Err(e) => last_err = Some((PathBuf::from(path), e)),
    }
  }
  let (path, source) = last_err.unwrap_or_else(|| (PathBuf::new(), io::Error::from(io::ErrorKind::NotFound)));
  Err(DetectError::Read { path, source })
}

/// Parse `ID` and `VERSION_ID` out of os-release content.
pub fn parse_os_release(content: &str) -> Option<(String, String)> {
  let mut id = None;
  let mut version_id = None;

  for line in content.lines() {
    let Some((key, value)) = line.trim().split_once('=') else {
      continue;
    };
    let value = value.trim().trim_matches('"').trim_matches('\'');
    match key {
      "ID" => id = Some(value.to_string()),
      "VERSION_ID" => version_id = Some(value.to_string()),
      _ => {}
    }
  }

  Some((id?, version_id?))
}

/// Build a Linux RID such as `ubuntu.16.04-x64` from os-release content.
pub fn linux_rid(os_release: &str, arch: Arch) -> Option<String> {
  let (id, version) = parse_os_release(os_release)?;
  if id.is_empty() || version.is_empty() {
    return None;
  }
  Some(format!("{}.{}-{}", id, version, arch))
}

/// Build a macOS RID such as `osx.10.11-x64` from SystemVersion.plist content.
pub fn macos_rid(plist: &str, arch: Arch) -> Option<String> {
  let after_key = plist.split("<key>ProductVersion</key>").nth(1)?;
  let start = after_key.find("<string>")? + "<string>".len();
  let end = after_key[start..].find("</string>")? + start;
  let version = after_key[start..end].trim();

  let mut parts = version.split('.');
  let major = parts.next().filter(|p| !p.is_empty())?;
  let minor = parts.next().unwrap_or("0");
  Some(format!("osx.{}.{}-{}", major, minor, arch))
}

/// Windows RIDs are pinned to the oldest supported release per architecture.
pub fn windows_rid(arch: Arch) -> String {
  match arch {
    Arch::Arm64 | Arch::Arm => format!("win10-{}", arch),
    Arch::X64 | Arch::X86 => format!("win7-{}", arch),
  }
}
