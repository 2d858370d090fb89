//! Dependency Graph
//!
//! A generic directed graph plus the two algorithms the propagator needs:
//! topological ordering and forward reachability.
//!
//! # Overview
//!
//! The graph knows nothing about variables. In the propagator:
//!
//! - Vertices are variable identifiers (free and dependent alike)
//! - An edge `a -> b` means `b` reads `a`, so `b` is recomputed when `a` changes
//!
//! # Design Decisions
//!
//! 1. Vertices are interned into an arena on insertion. Each vertex gets a
//!    dense index, and the algorithms run on indices only.
//!
//! 2. Only forward edges are stored. Both algorithms walk edges in their
//!    natural direction, and in-degrees are cheap to recount.
//!
//! 3. A cyclic graph has no topological order. This is reported as an empty
//!    order (or `None` from the `try_` variant), never as a partial one.

mod digraph;
mod traversal;

pub use digraph::Graph;
