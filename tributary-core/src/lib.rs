//! Tributary Core
//!
//! This crate provides an incremental evaluator for graphs of variables.
//! It implements:
//!
//! - A generic directed graph with topological ordering and reachability
//! - A registry of free (externally supplied) and dependent (computed) variables
//! - One-shot validation and initial evaluation in dependency order
//! - Incremental recomputation of only the variables an update can reach
//!
//! # Architecture
//!
//! The crate is organized into two modules:
//!
//! - `graph`: Directed graph storage and traversal
//! - `propagate`: Values, compute functions, and the `Propagator` itself
//!
//! # Strict Defaults
//!
//! A default `PropagatorConfig` rejects an update whose value kind differs
//! from the variable's current one, so `add_update(id, "text")` on an `Int`
//! variable fails with a type mismatch. Use
//! `PropagatorConfig::allow_kind_changes` to let a free variable change kind.
//!
//! # Example
//!
//! ```rust
//! use tributary_core::Propagator;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
//! enum Var {
//!     Width,
//!     Height,
//!     Area,
//! }
//!
//! let mut propagator = Propagator::new();
//! propagator.add_free_var(Var::Width, 3i64)?;
//! propagator.add_free_var(Var::Height, 4i64)?;
//! propagator.add_dependent_var(|acc| {
//!     acc.input(Var::Width).input(Var::Height).output(Var::Area);
//!     if !acc.do_compute() {
//!         return Ok(());
//!     }
//!     let width: i64 = acc.get(Var::Width)?;
//!     let height: i64 = acc.get(Var::Height)?;
//!     acc.set(Var::Area, width * height)
//! })?;
//! propagator.initialize()?;
//! assert_eq!(propagator.value::<i64>(Var::Area)?, 12);
//!
//! propagator.add_update(Var::Width, 5i64)?;
//! let changes = propagator.compute()?;
//! assert_eq!(changes.len(), 2);
//! assert_eq!(propagator.value::<i64>(Var::Area)?, 20);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod error;
pub mod graph;
pub mod propagate;

pub use error::PropagatorError;
pub use graph::Graph;
pub use propagate::{
    Accessor, CacheStats, ChangeSet, FromValue, Propagator, PropagatorConfig, PropagatorState,
    Value, ValueError, ValueKind,
};
