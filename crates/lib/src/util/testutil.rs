//! Test utilities for hostpack-lib.
//!
//! Cross-platform shell helpers and a scripted [`ProcessRunner`] that lets tests stand
//! in for the packaging script and the toolchain.

use std::cell::RefCell;
use std::rc::Rc;

use crate::process::{Invocation, ProcessError, ProcessOutput, ProcessRunner};

/// Returns the shell command and args to execute a shell script.
#[cfg(unix)]
pub fn shell_cmd(script: &str) -> (&'static str, Vec<String>) {
  ("/bin/sh", vec!["-c".to_string(), script.to_string()])
}

#[cfg(windows)]
pub fn shell_cmd(script: &str) -> (&'static str, Vec<String>) {
  ("cmd.exe", vec!["/C".to_string(), script.to_string()])
}

/// Returns the command and args to create a marker file in the current directory.
#[cfg(unix)]
pub fn touch_file(filename: &str) -> (&'static str, Vec<String>) {
  ("/usr/bin/touch", vec![filename.to_string()])
}

#[cfg(windows)]
pub fn touch_file(filename: &str) -> (&'static str, Vec<String>) {
  (
    "powershell.exe",
    vec![
      "-NoProfile".to_string(),
      "-Command".to_string(),
      format!("New-Item -ItemType File -Path '{}' -Force | Out-Null", filename),
    ],
  )
}

type Script = Box<dyn Fn(&Invocation) -> Result<ProcessOutput, ProcessError>>;

/// A [`ProcessRunner`] that records every invocation and answers with a script.
pub struct ScriptedRunner {
  calls: Rc<RefCell<Vec<Invocation>>>,
  script: Script,
}

impl ScriptedRunner {
  /// Create a runner and a handle to the invocations it receives.
  pub fn new<F>(script: F) -> (Self, Rc<RefCell<Vec<Invocation>>>)
  where
    F: Fn(&Invocation) -> Result<ProcessOutput, ProcessError> + 'static,
  {
    let calls = Rc::new(RefCell::new(Vec::new()));
    let runner = Self {
      calls: Rc::clone(&calls),
      script: Box::new(script),
    };
    (runner, calls)
  }

  /// A runner where every process succeeds without output.
  pub fn succeeding() -> (Self, Rc<RefCell<Vec<Invocation>>>) {
    Self::new(|_| Ok(ProcessOutput::default()))
  }
}

impl ProcessRunner for ScriptedRunner {
  fn run(&self, invocation: &Invocation) -> Result<ProcessOutput, ProcessError> {
    self.calls.borrow_mut().push(invocation.clone());
    (self.script)(invocation)
  }
}
