//! Implementation of the `hostpack targets` command.

use anyhow::{Context, Result};
use serde_json::json;

use hostpack_lib::pipeline;

use crate::output::{OutputFormat, print_json, symbols};

pub fn cmd_targets(root: Option<&str>, format: OutputFormat) -> Result<()> {
  let graph = pipeline::standard_graph().context("Invalid target definitions")?;

  if let Some(root) = root {
    let order = graph
      .execution_order(root)
      .with_context(|| format!("Cannot order target '{}'", root))?;

    if format.is_json() {
      print_json(&json!({ "root": root, "order": order }))?;
    } else {
      for (i, name) in order.iter().enumerate() {
        println!("{:>3}. {}", i + 1, name);
      }
    }
    return Ok(());
  }

  if format.is_json() {
    let targets: Vec<_> = graph
      .targets()
      .map(|t| json!({ "name": t.name(), "prerequisites": t.prerequisites(), "has_body": t.has_body() }))
      .collect();
    print_json(&targets)?;
  } else {
    for target in graph.targets() {
      if target.prerequisites().is_empty() {
        println!("{}", target.name());
      } else {
        println!(
          "{} {} {}",
          target.name(),
          symbols::ARROW,
          target.prerequisites().join(", ")
        );
      }
    }
  }

  Ok(())
}
