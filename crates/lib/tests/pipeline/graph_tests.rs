//! Definition-time checks and run ordering through the public API.

use std::cell::RefCell;
use std::rc::Rc;

use hostpack_lib::context::BuildContext;
use hostpack_lib::pipeline::{self, names};
use hostpack_lib::target::{GraphError, RunError, Runner, Target, TargetGraph, TargetRegistry};

fn recording(name: &str, log: &Rc<RefCell<Vec<String>>>) -> Target {
  let log = Rc::clone(log);
  let label = name.to_string();
  Target::new(name).with_body(move |_| {
    log.borrow_mut().push(label.clone());
    Ok(())
  })
}

#[test]
fn cycle_is_rejected_before_any_body_runs() {
  let log = Rc::new(RefCell::new(Vec::new()));
  let mut registry = TargetRegistry::new();
  registry.register(recording("a", &log).depends_on(["b"])).unwrap();
  registry.register(recording("b", &log).depends_on(["a"])).unwrap();

  let err = TargetGraph::new(registry).unwrap_err();

  assert!(matches!(err, GraphError::Cycle(_)));
  assert!(err.to_string().starts_with("dependency cycle detected: "));
  assert!(log.borrow().is_empty());
}

#[test]
fn every_transitive_prerequisite_runs_once_and_first() {
  let log = Rc::new(RefCell::new(Vec::new()));
  let mut registry = TargetRegistry::new();
  for target in [
    recording("init", &log),
    recording("props", &log).depends_on(["init"]),
    recording("metadata", &log).depends_on(["props", "init"]),
    recording("pack", &log).depends_on(["metadata", "props"]),
    recording("unrelated", &log),
  ] {
    registry.register(target).unwrap();
  }
  let graph = TargetGraph::new(registry).unwrap();
  let mut ctx = BuildContext::new();

  let report = Runner::new(&graph).run("pack", &mut ctx).unwrap();

  let ran = log.borrow().clone();
  assert_eq!(ran, vec!["init", "props", "metadata", "pack"]);
  assert_eq!(report.names(), ran);
  assert_eq!(graph.execution_order("pack").unwrap(), ran);
}

#[test]
fn standard_targets_cover_every_name() {
  let graph = pipeline::standard_graph().unwrap();

  for name in [
    names::INIT,
    names::GENERATE_VERSION_RESOURCE,
    names::GENERATE_MSBUILD_PROPS,
    names::WRITE_VERSION_METADATA,
    names::INVOKE_PACKAGING,
    names::COLLECT_PACKAGES,
    names::VALIDATE_PACKAGES,
    names::PACKAGE_PKG_PROJECTS,
    names::RESTORE_LOCKED_HOST,
    names::PUBLISH_SHARED_FRAMEWORK,
    names::COMPILE,
  ] {
    assert!(graph.target(name).is_some(), "missing target {name}");
  }
}

#[test]
fn unknown_root_runs_nothing() {
  let graph = pipeline::standard_graph().unwrap();
  let mut ctx = BuildContext::new();

  let err = Runner::new(&graph).run("deploy", &mut ctx).unwrap_err();

  assert!(matches!(err, RunError::Graph(GraphError::UnknownTarget(_))));
  assert!(ctx.keys().is_empty());
}
