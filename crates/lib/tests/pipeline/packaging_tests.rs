//! The packaging pipeline from `init` to validation.

use std::fs;

use hostpack_lib::context::keys;
use hostpack_lib::pipeline::{self, DEFAULT_TARGET, PipelineState, names};
use hostpack_lib::process::Invocation;
use hostpack_lib::target::{BuildError, RunError, Runner};
use hostpack_lib::version::{HOSTFXR, HOSTPOLICY};

use super::common::{FakePack, Fixture, binary, model, snapshot};

const RHEL_POLICY: &str = "runtime.rhel.7-x64.hostpolicy.2.1.0.nupkg";
const RHEL_FXR: &str = "runtime.rhel.7-x64.hostfxr.2.1.0.nupkg";

fn policy_only(rid: &str) -> Fixture {
  Fixture::new(rid, model(vec![binary(HOSTPOLICY, "2.1.0")]))
}

fn pack_calls(calls: &[Invocation]) -> usize {
  calls
    .iter()
    .filter(|c| c.program.file_stem().is_some_and(|s| s == "pack"))
    .count()
}

#[test]
fn centos_build_validates_rhel_package() {
  let fixture = policy_only("centos.7-x64");
  let (pack, calls) = FakePack::producing(&[RHEL_POLICY]);
  let mut ctx = fixture.context(pack);
  let graph = pipeline::standard_graph().unwrap();

  let outcome = pipeline::run_pipeline(&Runner::new(&graph), DEFAULT_TARGET, &mut ctx);

  assert!(outcome.is_success(), "{:?}", outcome.result);
  assert_eq!(outcome.state, PipelineState::Validated);
  assert_eq!(ctx.get_str(keys::CANONICAL_RID).unwrap(), "rhel.7-x64");
  assert!(fixture.local_packages().join(RHEL_POLICY).is_file());

  let calls = calls.borrow();
  assert_eq!(pack_calls(&calls), 1);
  assert_eq!(calls[0].args, vec!["2.0.0"]);

  let metadata = fs::read_to_string(fixture.pkg_dir().join("version.txt")).unwrap();
  assert_eq!(metadata, "4f1e2d3c\n2.1.0\n");
  assert!(fixture.pkg_dir().join("version.props").is_file());
}

#[test]
fn missing_package_fails_naming_it() {
  let fixture = policy_only("centos.7-x64");
  let (pack, _) = FakePack::producing(&[]);
  let mut ctx = fixture.context(pack);
  let graph = pipeline::standard_graph().unwrap();

  let outcome = pipeline::run_pipeline(&Runner::new(&graph), DEFAULT_TARGET, &mut ctx);

  let PipelineState::Failed(reason) = &outcome.state else {
    panic!("expected failure, got {}", outcome.state);
  };
  assert!(reason.contains("hostpolicy"));
  assert!(reason.contains("not created"));
  assert!(matches!(
    outcome.result,
    Err(RunError::TargetFailed { ref target, source: BuildError::MissingArtifact { .. }, .. })
      if target == names::VALIDATE_PACKAGES
  ));
}

#[test]
fn validation_names_exactly_the_missing_binary() {
  let fixture = Fixture::new(
    "rhel.7.2-x64",
    model(vec![binary(HOSTFXR, "2.1.0"), binary(HOSTPOLICY, "2.1.0")]),
  );
  let (pack, _) = FakePack::producing(&[RHEL_FXR]);
  let mut ctx = fixture.context(pack);
  let graph = pipeline::standard_graph().unwrap();

  let outcome = pipeline::run_pipeline(&Runner::new(&graph), DEFAULT_TARGET, &mut ctx);

  let PipelineState::Failed(reason) = outcome.state else {
    panic!("expected failure");
  };
  assert_eq!(reason, format!("Nupkg for {RHEL_POLICY} was not created."));
}

#[test]
fn package_for_machine_rid_is_not_enough() {
  let fixture = policy_only("centos.7-x64");
  let (pack, _) = FakePack::producing(&["runtime.centos.7-x64.hostpolicy.2.1.0.nupkg"]);
  let mut ctx = fixture.context(pack);
  let graph = pipeline::standard_graph().unwrap();

  let outcome = pipeline::run_pipeline(&Runner::new(&graph), DEFAULT_TARGET, &mut ctx);

  assert!(outcome.state.is_failed());
}

#[test]
fn disabled_validation_accepts_missing_packages() {
  let mut fixture = policy_only("centos.7-x64");
  fixture.config.validate_host_packages = false;
  let (pack, _) = FakePack::producing(&[]);
  let mut ctx = fixture.context(pack);
  let graph = pipeline::standard_graph().unwrap();

  let outcome = pipeline::run_pipeline(&Runner::new(&graph), DEFAULT_TARGET, &mut ctx);

  assert_eq!(outcome.state, PipelineState::Validated);
}

#[test]
fn unsupported_rid_has_no_side_effects() {
  let fixture = policy_only("alpine.3.6-x64");
  let (pack, calls) = FakePack::producing(&[RHEL_POLICY]);
  let mut ctx = fixture.context(pack);
  let graph = pipeline::standard_graph().unwrap();

  let outcome = pipeline::run_pipeline(&Runner::new(&graph), DEFAULT_TARGET, &mut ctx);

  assert!(matches!(
    outcome.result,
    Err(RunError::TargetFailed { source: BuildError::UnsupportedPlatform(_), .. })
  ));
  assert!(calls.borrow().is_empty());
  assert_eq!(fs::read_dir(fixture.root()).unwrap().count(), 0);
}

#[test]
fn pack_failure_stops_collection_and_validation() {
  let fixture = policy_only("win7-x64");
  let (pack, calls) = FakePack::failing(2);
  let mut ctx = fixture.context(pack);
  let graph = pipeline::standard_graph().unwrap();

  let outcome = pipeline::run_pipeline(&Runner::new(&graph), DEFAULT_TARGET, &mut ctx);

  let Err(RunError::TargetFailed {
    target, skipped, report, ..
  }) = &outcome.result
  else {
    panic!("expected target failure");
  };
  assert_eq!(target, names::INVOKE_PACKAGING);
  assert_eq!(
    report.names(),
    vec![
      names::INIT,
      names::GENERATE_MSBUILD_PROPS,
      names::WRITE_VERSION_METADATA
    ]
  );
  assert_eq!(
    skipped,
    &vec![
      names::COLLECT_PACKAGES.to_string(),
      names::VALIDATE_PACKAGES.to_string(),
      names::PACKAGE_PKG_PROJECTS.to_string(),
    ]
  );
  assert_eq!(calls.borrow().len(), 1);
  assert!(!fixture.local_packages().exists() || snapshot(&fixture.local_packages()).is_empty());
  assert!(outcome.state.is_failed());
}

#[test]
fn rerunning_the_pipeline_is_idempotent() {
  let fixture = Fixture::new(
    "centos.7-x64",
    model(vec![binary(HOSTFXR, "2.1.0"), binary(HOSTPOLICY, "2.1.0")]),
  );
  let graph = pipeline::standard_graph().unwrap();
  let runner = Runner::new(&graph);

  let (pack, _) = FakePack::producing(&[RHEL_FXR, RHEL_POLICY]);
  let mut ctx = fixture.context(pack);
  assert!(pipeline::run_pipeline(&runner, DEFAULT_TARGET, &mut ctx).is_success());
  let first = snapshot(&fixture.local_packages());

  let outcome = pipeline::run_pipeline(&runner, DEFAULT_TARGET, &mut ctx);

  assert_eq!(outcome.state, PipelineState::Validated);
  assert_eq!(snapshot(&fixture.local_packages()), first);
  assert_eq!(first.len(), 2);
}
