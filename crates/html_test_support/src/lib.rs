//! Test-only helpers for the round-trip and scenario suites.

pub mod model;
pub mod scenario;

pub use crate::model::{describe_model, diff_lines, render_forest};
pub use crate::scenario::{Expect, NearestCase, Scenario, Step, load_scenario, load_scenarios};
