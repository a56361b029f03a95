use std::fmt;

/// CPU architectures as they appear in runtime identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
  X64,
  X86,
  Arm64,
  Arm,
}

impl Arch {
  /// Detect the current CPU architecture at runtime
  pub fn current() -> Option<Self> {
    match std::env::consts::ARCH {
      "x86_64" => Some(Self::X64),
      "x86" => Some(Self::X86),
      "aarch64" => Some(Self::Arm64),
      "arm" => Some(Self::Arm),
      _ => None,
    }
  }

  /// Returns the RID suffix for this architecture (e.g. "x64")
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::X64 => "x64",
      Self::X86 => "x86",
      Self::Arm64 => "arm64",
      Self::Arm => "arm",
    }
  }
}

impl fmt::Display for Arch {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}
