//! Implementation of the `hostpack info` command.

use anyhow::Result;
use serde_json::json;

use hostpack_lib::config::resolve_config_path;
use hostpack_lib::consts::APP_NAME;
use hostpack_lib::platform::Platform;
use hostpack_lib::version::RidMap;

use crate::output::{OutputFormat, print_json, print_stat};

pub fn cmd_info(format: OutputFormat) -> Result<()> {
  let platform = Platform::current()?;
  let rid = platform.detect_rid().ok();
  let canonical = rid.as_deref().and_then(|r| RidMap::standard().resolve(r).ok());
  let config = resolve_config_path(None);

  if format.is_json() {
    print_json(&json!({
      "version": env!("CARGO_PKG_VERSION"),
      "os": platform.os.as_str(),
      "arch": platform.arch.as_str(),
      "rid": rid,
      "canonical_rid": canonical,
      "config": config,
    }))?;
    return Ok(());
  }

  println!("{} v{}", APP_NAME, env!("CARGO_PKG_VERSION"));
  print_stat("Platform", &platform.to_string());
  print_stat("OS", platform.os.as_str());
  print_stat("Arch", platform.arch.as_str());
  print_stat("RID", rid.as_deref().unwrap_or("unknown"));
  print_stat("Package RID", canonical.unwrap_or("unsupported"));
  print_stat(
    "Config",
    &config
      .map(|p| p.display().to_string())
      .unwrap_or_else(|| "none".to_string()),
  );

  Ok(())
}
