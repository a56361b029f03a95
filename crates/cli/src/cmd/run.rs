//! Implementation of the `hostpack run` command.
//!
//! Loads the build configuration, seeds a build context from it and runs the
//! requested target through the standard target graph.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde_json::json;
use tracing::debug;

use hostpack_lib::config::BuildConfig;
use hostpack_lib::context::BuildContext;
use hostpack_lib::pipeline::{self, PipelineState};
use hostpack_lib::target::{RunError, RunReport, Runner};

use crate::output::{OutputFormat, format_duration, print_info, print_json, print_stat, print_success, print_warning};

pub struct RunOptions {
  pub target: String,
  pub config: Option<PathBuf>,
  pub rid: Option<String>,
  pub no_validate: bool,
  pub pack_timeout: Option<Duration>,
  pub format: OutputFormat,
}

fn apply_overrides(config: &mut BuildConfig, opts: &RunOptions) {
  if let Some(rid) = &opts.rid {
    config.target_rid = Some(rid.clone());
  }
  if opts.no_validate {
    config.validate_host_packages = false;
  }
  if let Some(timeout) = opts.pack_timeout {
    config.pack_timeout_secs = Some(timeout.as_secs().max(1));
  }
}

pub fn cmd_run(opts: RunOptions) -> Result<()> {
  let (mut config, config_path) = BuildConfig::discover(opts.config.as_deref()).context("Failed to load build config")?;
  apply_overrides(&mut config, &opts);
  debug!(config = ?config_path, rid = ?config.target_rid, "build config resolved");

  let graph = pipeline::standard_graph().context("Invalid target definitions")?;
  let mut ctx = BuildContext::new();
  config.seed(&mut ctx).context("Failed to seed build context")?;

  if !opts.format.is_json() {
    match &config_path {
      Some(path) => print_info(&format!("Using config {}", path.display())),
      None => print_info("No config file found, using defaults"),
    }
  }

  let outcome = pipeline::run_pipeline(&Runner::new(&graph), &opts.target, &mut ctx);

  if opts.format.is_json() {
    let (executed, skipped, error): (Vec<String>, Vec<String>, Option<String>) = match &outcome.result {
      Ok(report) => (report.names().iter().map(|n| n.to_string()).collect(), Vec::new(), None),
      Err(RunError::TargetFailed { skipped, source, report, .. }) => (
        report.names().iter().map(|n| n.to_string()).collect(),
        skipped.clone(),
        Some(source.to_string()),
      ),
      Err(e) => (Vec::new(), Vec::new(), Some(e.to_string())),
    };
    print_json(&json!({
      "target": opts.target,
      "state": outcome.state,
      "executed": executed,
      "skipped": skipped,
      "failed_target": outcome.result.as_ref().err().and_then(RunError::failed_target),
      "error": error,
    }))?;
  } else {
    print_summary(&opts.target, &outcome.state, &outcome.result);
  }

  outcome
    .result
    .map(|_| ())
    .with_context(|| format!("Target '{}' failed", opts.target))
}

fn print_summary(target: &str, state: &PipelineState, result: &Result<RunReport, RunError>) {
  match result {
    Ok(report) => {
      print_success(&format!("{} completed", target));
      print_stat("Targets", &report.to_string());
      print_stat("Elapsed", &format_duration(report.elapsed()));
      print_stat("Pipeline", &state.to_string());
    }
    Err(RunError::TargetFailed { skipped, .. }) => {
      if !skipped.is_empty() {
        print_warning(&format!("Skipped: {}", skipped.join(", ")));
      }
      print_stat("Pipeline", &state.to_string());
    }
    Err(RunError::Graph(_)) => {}
  }
}
