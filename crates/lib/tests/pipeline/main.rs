//! End-to-end tests of the standard target set with a scripted pack step.

mod common;
mod graph_tests;
mod packaging_tests;
