//! Graph Storage
//!
//! Vertices live in an `IndexSet`, which doubles as an arena: every vertex
//! gets a stable, dense index on first insertion. Edges are stored as forward
//! adjacency lists over those indices, so the algorithms in `traversal` never
//! touch the vertex type itself.

use std::hash::Hash;

use indexmap::IndexSet;
use smallvec::SmallVec;

/// Successor list for one vertex. Most variables feed only a handful of others.
pub(crate) type Successors = SmallVec<[usize; 4]>;

/// A directed graph over an arbitrary finite vertex domain.
///
/// Parallel edges are never stored. Self-loops are accepted here; rejecting
/// them is left to whoever gives the edges a meaning.
#[derive(Debug, Clone)]
pub struct Graph<V>
where
    V: Copy + Eq + Hash,
{
    /// Vertex arena. A vertex's position is its index.
    vertices: IndexSet<V>,

    /// `successors[i]` holds the targets of every edge leaving vertex `i`.
    successors: Vec<Successors>,

    /// Total number of distinct edges.
    edge_count: usize,
}

impl<V> Graph<V>
where
    V: Copy + Eq + Hash,
{
    /// Create a new empty graph.
    pub fn new() -> Self {
        Self {
            vertices: IndexSet::new(),
            successors: Vec::new(),
            edge_count: 0,
        }
    }

    /// Insert a vertex if it is absent. Returns its index either way.
    pub fn add_vertex(&mut self, vertex: V) -> usize {
        let (index, inserted) = self.vertices.insert_full(vertex);
        if inserted {
            self.successors.push(Successors::new());
        }
        index
    }

    /// Add the edge `from -> to`, inserting either endpoint if needed.
    ///
    /// Returns `false` if the edge was already present.
    pub fn add_edge(&mut self, from: V, to: V) -> bool {
        let from = self.add_vertex(from);
        let to = self.add_vertex(to);

        let targets = &mut self.successors[from];
        if targets.contains(&to) {
            return false;
        }
        targets.push(to);
        self.edge_count += 1;
        true
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of distinct edges.
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Whether the graph has no vertices.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn contains_vertex(&self, vertex: V) -> bool {
        self.vertices.contains(&vertex)
    }

    /// Whether the edge `from -> to` exists.
    pub fn contains_edge(&self, from: V, to: V) -> bool {
        match (self.index_of(from), self.index_of(to)) {
            (Some(from), Some(to)) => self.successors[from].contains(&to),
            _ => false,
        }
    }

    /// Arena index of a vertex, if present.
    pub fn index_of(&self, vertex: V) -> Option<usize> {
        self.vertices.get_index_of(&vertex)
    }

    /// Vertices in insertion order.
    pub fn vertices(&self) -> impl Iterator<Item = V> + '_ {
        self.vertices.iter().copied()
    }

    /// Direct successors of a vertex, in edge insertion order.
    pub fn successors(&self, vertex: V) -> Vec<V> {
        self.index_of(vertex)
            .map(|index| {
                self.successors[index]
                    .iter()
                    .map(|&target| self.vertex_at(target))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// All edges as `(from, to)` pairs, grouped by source in insertion order.
    pub fn edges(&self) -> Vec<(V, V)> {
        self.successors
            .iter()
            .enumerate()
            .flat_map(|(from, targets)| {
                targets
                    .iter()
                    .map(move |&to| (self.vertex_at(from), self.vertex_at(to)))
            })
            .collect()
    }

    // Index-level accessors for the traversal algorithms.

    pub(crate) fn vertex_at(&self, index: usize) -> V {
        self.vertices[index]
    }

    pub(crate) fn successor_indices(&self, index: usize) -> &[usize] {
        &self.successors[index]
    }
}

impl<V> Default for Graph<V>
where
    V: Copy + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}
