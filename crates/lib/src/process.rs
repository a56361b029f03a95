//! External process invocation.
//!
//! Targets never spawn processes directly. They describe an [`Invocation`] and hand it
//! to the build's [`ProcessRunner`], which waits for the child to exit and turns a
//! nonzero exit status into [`ProcessError::Failed`].

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

/// Errors from running an external process.
#[derive(Debug, Error)]
pub enum ProcessError {
  /// The process could not be started.
  #[error("failed to start {program}: {source}")]
  Spawn {
    program: String,
    #[source]
    source: io::Error,
  },

  /// The process exited unsuccessfully.
  #[error("{program} {}{}", exit_status(.code), stderr_suffix(.stderr))]
  Failed {
    program: String,
    code: Option<i32>,
    stderr: String,
  },

  /// The process ran longer than its configured timeout and was killed.
  #[error("{program} did not finish within {timeout:?}")]
  Timeout { program: String, timeout: Duration },

  /// The runtime driving the child could not be created.
  #[error("failed to create process runtime: {0}")]
  Runtime(#[source] io::Error),
}

fn exit_status(code: &Option<i32>) -> String {
  match code {
    Some(code) => format!("failed with exit code {}", code),
    None => "was terminated by signal".to_string(),
  }
}

fn stderr_suffix(stderr: &str) -> String {
  let trimmed = stderr.trim();
  if trimmed.is_empty() {
    String::new()
  } else {
    format!(": {}", trimmed)
  }
}

/// A single external process call: program, arguments, working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
  pub program: PathBuf,
  pub args: Vec<String>,
  pub cwd: Option<PathBuf>,
  pub timeout: Option<Duration>,
}

impl Invocation {
  pub fn new(program: impl Into<PathBuf>) -> Self {
    Self {
      program: program.into(),
      args: Vec::new(),
      cwd: None,
      timeout: None,
    }
  }

  pub fn arg(mut self, arg: impl Into<String>) -> Self {
    self.args.push(arg.into());
    self
  }

  pub fn args<I, S>(mut self, args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.args.extend(args.into_iter().map(Into::into));
    self
  }

  pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
    self.cwd = Some(dir.into());
    self
  }

  pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
    self.timeout = timeout;
    self
  }

  /// File name of the program, for logs and error messages.
  pub fn program_name(&self) -> String {
    self
      .program
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_else(|| self.program.display().to_string())
  }
}

impl fmt::Display for Invocation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.program.display())?;
    for arg in &self.args {
      write!(f, " {}", arg)?;
    }
    Ok(())
  }
}

/// Captured output of a successful process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
  pub code: Option<i32>,
  pub stdout: String,
  pub stderr: String,
}

/// Runs external processes on behalf of targets.
pub trait ProcessRunner {
  /// Run `invocation` to completion.
  ///
  /// Returns the captured output when the process exits with status zero.
  fn run(&self, invocation: &Invocation) -> Result<ProcessOutput, ProcessError>;
}

/// Runs processes with `tokio::process`, blocking the calling thread until exit.
///
/// Each call drives the child on a current-thread runtime so the optional timeout can
/// kill it; without a timeout a hung child blocks the build.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioProcessRunner;

impl ProcessRunner for TokioProcessRunner {
  fn run(&self, invocation: &Invocation) -> Result<ProcessOutput, ProcessError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
      .enable_all()
      .build()
      .map_err(ProcessError::Runtime)?;

    runtime.block_on(run_async(invocation))
  }
}

async fn run_async(invocation: &Invocation) -> Result<ProcessOutput, ProcessError> {
  info!(cmd = %invocation, "executing command");

  let program = invocation.program_name();

  let mut command = Command::new(&invocation.program);
  command.args(&invocation.args).kill_on_drop(true);
  if let Some(cwd) = &invocation.cwd {
    command.current_dir(cwd);
  }

  debug!(cwd = ?invocation.cwd.as_deref().map(Path::display), "spawning process");

  let output = match invocation.timeout {
    Some(limit) => tokio::time::timeout(limit, command.output())
      .await
      .map_err(|_| ProcessError::Timeout {
        program: program.clone(),
        timeout: limit,
      })?,
    None => command.output().await,
  }
  .map_err(|source| ProcessError::Spawn {
    program: program.clone(),
    source,
  })?;

  let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
  let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

  if !output.status.success() {
    if !stderr.is_empty() {
      debug!(stderr = %stderr, "command stderr");
    }
    if !stdout.is_empty() {
      debug!(stdout = %stdout, "command stdout");
    }

    return Err(ProcessError::Failed {
      program,
      code: output.status.code(),
      stderr,
    });
  }

  if !stdout.is_empty() {
    debug!(stdout = %stdout, "command output");
  }

  Ok(ProcessOutput {
    code: output.status.code(),
    stdout,
    stderr,
  })
}
