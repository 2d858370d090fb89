//! Variable Propagation
//!
//! This module implements the evaluator on top of the dependency graph.
//!
//! # Concepts
//!
//! ## Free Variables
//!
//! A free variable holds a value supplied from outside. It has no compute
//! function and is the only kind of variable that can be updated.
//!
//! ## Dependent Variables
//!
//! A dependent variable is produced by exactly one compute function from one
//! or more other variables. Compute functions talk to the propagator through
//! an [`Accessor`], first to declare what they read and write, later to do the
//! actual work.
//!
//! ## Values
//!
//! Every variable holds a [`Value`]. Reads name the Rust type they expect and
//! fail on a mismatch.
//!
//! # Implementation Notes
//!
//! Evaluation is single-threaded and runs to completion inside each call.
//! The propagator owns its graph, values and cache outright; callers that
//! need concurrent access must serialize it themselves.

mod accessor;
mod cache;
mod config;
mod propagator;
mod value;

pub use accessor::Accessor;
pub use cache::CacheStats;
pub use config::PropagatorConfig;
pub use propagator::{ChangeSet, Propagator, PropagatorState};
pub use value::{FromValue, Value, ValueError, ValueKind};
