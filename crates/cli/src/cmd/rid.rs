//! Implementation of the `hostpack rid` command.

use anyhow::{Context, Result};
use serde_json::json;

use hostpack_lib::platform::detect_rid;
use hostpack_lib::version::RidMap;

use crate::output::{OutputFormat, print_json, print_stat};

pub fn cmd_rid(rid: Option<&str>, format: OutputFormat) -> Result<()> {
  let rid = match rid {
    Some(rid) => rid.to_string(),
    None => detect_rid().context("Failed to detect the machine RID")?,
  };

  let canonical = RidMap::standard().resolve(&rid)?;

  if format.is_json() {
    print_json(&json!({ "rid": rid, "canonical_rid": canonical }))?;
  } else {
    print_stat("Machine RID", &rid);
    print_stat("Package RID", canonical);
  }

  Ok(())
}
