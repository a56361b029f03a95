//! hostpack-lib: Core types and logic for hostpack
//!
//! This crate provides the pieces of a host package build:
//! - `BuildContext`: typed store of build-wide facts shared by every target
//! - `Target`, `TargetGraph`, `Runner`: named build steps and their ordered execution
//! - `HostVersion`, `RidMap`: the versions being built and where their packages publish
//! - `pipeline`: the standard targets that write metadata, package, collect and validate

pub mod config;
pub mod consts;
pub mod context;
pub mod paths;
pub mod pipeline;
pub mod platform;
pub mod process;
pub mod target;
pub mod util;
pub mod version;
