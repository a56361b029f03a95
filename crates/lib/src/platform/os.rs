use std::fmt;

/// Operating system families a host build can run on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Os {
  Linux,
  MacOs,
  Windows,
}

impl Os {
  /// Detect the current operating system at runtime
  pub fn current() -> Option<Self> {
    match std::env::consts::OS {
      "linux" => Some(Self::Linux),
      "macos" => Some(Self::MacOs),
      "windows" => Some(Self::Windows),
      _ => None,
    }
  }

  /// Returns the lowercase string identifier for this OS
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Linux => "linux",
      Self::MacOs => "osx",
      Self::Windows => "win",
    }
  }

  /// File name of the packaging script for this OS
  pub fn pack_script(&self) -> &'static str {
    match self {
      Self::Windows => "pack.cmd",
      Self::Linux | Self::MacOs => "pack.sh",
    }
  }
}

impl fmt::Display for Os {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn current_returns_supported_os() {
    assert!(Os::current().is_some(), "Current OS should be supported");
  }

  #[test]
  fn windows_packs_with_cmd_script() {
    assert_eq!(Os::Windows.pack_script(), "pack.cmd");
    assert_eq!(Os::Linux.pack_script(), "pack.sh");
    assert_eq!(Os::MacOs.pack_script(), "pack.sh");
  }
}
