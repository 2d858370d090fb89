//! Graph Traversal
//!
//! Topological ordering and reachability over a [`Graph`].
//!
//! # Topological Order
//!
//! Kahn's algorithm: compute in-degrees, seed a FIFO queue with every vertex
//! of in-degree zero (in index order), then repeatedly emit the queue head and
//! release its successors. If a cycle exists, the vertices on it (and anything
//! downstream of it) never reach in-degree zero, so the emitted order comes up
//! short. That shortfall is the cycle signal.
//!
//! Ties between independent vertices are broken by insertion order, so the
//! same graph always yields the same order.
//!
//! # Reachability
//!
//! Breadth-first search following edges forward. The start vertex is part of
//! its own reachable set.

use std::collections::VecDeque;
use std::hash::Hash;

use indexmap::IndexSet;

use super::digraph::Graph;

impl<V> Graph<V>
where
    V: Copy + Eq + Hash,
{
    /// Order every vertex so that each edge points forward.
    ///
    /// Returns an empty vector if the graph is cyclic. An empty graph also
    /// yields an empty vector; use [`Graph::try_topological_order`] when the
    /// two cases must be told apart.
    pub fn topological_order(&self) -> Vec<V> {
        self.try_topological_order().unwrap_or_default()
    }

    /// Like [`Graph::topological_order`], but `None` signals a cycle.
    pub fn try_topological_order(&self) -> Option<Vec<V>> {
        let order = self.kahn_order();
        if order.len() != self.vertex_count() {
            return None;
        }
        Some(order.into_iter().map(|index| self.vertex_at(index)).collect())
    }

    /// Vertices that cannot be ordered: those on a cycle or downstream of one.
    ///
    /// Empty for an acyclic graph.
    pub fn cyclic_remainder(&self) -> Vec<V> {
        let mut ordered = vec![false; self.vertex_count()];
        for index in self.kahn_order() {
            ordered[index] = true;
        }
        ordered
            .iter()
            .enumerate()
            .filter(|&(_, &done)| !done)
            .map(|(index, _)| self.vertex_at(index))
            .collect()
    }

    /// Every vertex reachable from `start`, including `start` itself.
    ///
    /// Returns an empty set if `start` is not in the graph. The set iterates
    /// in discovery order.
    pub fn reachable_from(&self, start: V) -> IndexSet<V> {
        self.reachable_from_all([start])
    }

    /// Union of [`Graph::reachable_from`] over several start vertices.
    pub fn reachable_from_all<I>(&self, starts: I) -> IndexSet<V>
    where
        I: IntoIterator<Item = V>,
    {
        let mut visited = vec![false; self.vertex_count()];
        let mut queue: VecDeque<usize> = starts
            .into_iter()
            .filter_map(|vertex| self.index_of(vertex))
            .collect();
        let mut reached = IndexSet::new();

        while let Some(index) = queue.pop_front() {
            if visited[index] {
                continue;
            }
            visited[index] = true;
            reached.insert(self.vertex_at(index));

            for &next in self.successor_indices(index) {
                if !visited[next] {
                    queue.push_back(next);
                }
            }
        }

        reached
    }

    /// Kahn's algorithm over vertex indices. Shorter than the vertex count
    /// when the graph has a cycle.
    fn kahn_order(&self) -> Vec<usize> {
        let count = self.vertex_count();
        let mut in_degree = vec![0usize; count];
        for index in 0..count {
            for &next in self.successor_indices(index) {
                in_degree[next] += 1;
            }
        }

        let mut queue: VecDeque<usize> = (0..count).filter(|&i| in_degree[i] == 0).collect();
        let mut order = Vec::with_capacity(count);

        while let Some(index) = queue.pop_front() {
            order.push(index);

            for &next in self.successor_indices(index) {
                in_degree[next] -= 1;
                if in_degree[next] == 0 {
                    queue.push_back(next);
                }
            }
        }

        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn position<V: PartialEq>(order: &[V], vertex: V) -> usize {
        order
            .iter()
            .position(|v| *v == vertex)
            .expect("vertex missing from order")
    }

    #[test]
    fn orders_a_dag() {
        let mut graph = Graph::new();
        graph.add_edge(0, 1);
        graph.add_edge(0, 2);
        graph.add_edge(2, 3);
        graph.add_edge(2, 5);
        graph.add_edge(4, 5);
        graph.add_vertex(6);

        let order = graph.topological_order();

        assert_eq!(order.len(), 7);
        for vertex in 0..7 {
            assert!(order.contains(&vertex));
        }
        assert!(position(&order, 0) < position(&order, 1));
        assert!(position(&order, 0) < position(&order, 2));
        assert!(position(&order, 2) < position(&order, 3));
        assert!(position(&order, 2) < position(&order, 5));
        assert!(position(&order, 4) < position(&order, 5));
    }

    #[test]
    fn cycle_yields_empty_order() {
        let mut graph = Graph::new();
        graph.add_edge(0, 1);
        graph.add_edge(1, 2);
        graph.add_edge(2, 0);

        assert!(graph.topological_order().is_empty());
        assert!(graph.try_topological_order().is_none());
    }

    #[test]
    fn self_loop_is_a_cycle() {
        let mut graph = Graph::new();
        graph.add_edge('a', 'b');
        graph.add_edge('b', 'b');

        assert!(graph.try_topological_order().is_none());
        assert_eq!(graph.cyclic_remainder(), vec!['b']);
    }

    #[test]
    fn empty_graph_is_sortable() {
        let graph: Graph<u32> = Graph::new();

        assert!(graph.topological_order().is_empty());
        assert_eq!(graph.try_topological_order(), Some(Vec::new()));
    }

    #[test]
    fn cyclic_remainder_includes_downstream_vertices() {
        let mut graph = Graph::new();
        graph.add_edge(0, 1);
        graph.add_edge(1, 2);
        graph.add_edge(2, 1);
        graph.add_edge(2, 3);

        assert_eq!(graph.cyclic_remainder(), vec![1, 2, 3]);
    }

    #[test]
    fn order_is_deterministic() {
        let mut graph = Graph::new();
        graph.add_vertex(3);
        graph.add_vertex(1);
        graph.add_vertex(2);

        assert_eq!(graph.topological_order(), vec![3, 1, 2]);
        assert_eq!(graph.topological_order(), graph.topological_order());
    }

    #[test]
    fn reachable_includes_start() {
        let mut graph = Graph::new();
        graph.add_edge(0, 1);
        graph.add_edge(1, 2);
        graph.add_edge(3, 2);

        let reached = graph.reachable_from(0);

        assert_eq!(reached.len(), 3);
        assert!(reached.contains(&0));
        assert!(reached.contains(&1));
        assert!(reached.contains(&2));
        assert!(!reached.contains(&3));
    }

    #[test]
    fn reachable_terminates_on_cycles() {
        let mut graph = Graph::new();
        graph.add_edge(0, 1);
        graph.add_edge(1, 0);

        assert_eq!(graph.reachable_from(1).len(), 2);
    }

    #[test]
    fn reachable_from_unknown_vertex_is_empty() {
        let mut graph = Graph::new();
        graph.add_edge(0, 1);

        assert!(graph.reachable_from(9).is_empty());
    }

    #[test]
    fn reachable_from_all_unions_starts() {
        let mut graph = Graph::new();
        graph.add_edge(0, 1);
        graph.add_edge(2, 3);
        graph.add_vertex(4);

        let reached = graph.reachable_from_all([0, 2]);

        assert_eq!(reached.len(), 4);
        assert!(!reached.contains(&4));
    }

    // ── Property tests ──────────────────────────────────────────

    fn arb_forward_edges() -> impl Strategy<Value = Vec<(u8, u8)>> {
        // Edges only from a lower to a higher label, so the graph is a DAG.
        prop::collection::vec((0u8..20, 0u8..20), 0..60).prop_map(|pairs| {
            pairs
                .into_iter()
                .filter(|(a, b)| a != b)
                .map(|(a, b)| (a.min(b), a.max(b)))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn dag_order_respects_every_edge(edges in arb_forward_edges()) {
            let mut graph = Graph::new();
            for &(a, b) in &edges {
                graph.add_edge(a, b);
            }

            let order = graph.topological_order();
            prop_assert_eq!(order.len(), graph.vertex_count());
            for (a, b) in graph.edges() {
                prop_assert!(position(&order, a) < position(&order, b));
            }
        }

        #[test]
        fn back_edge_breaks_ordering(edges in arb_forward_edges()) {
            prop_assume!(!edges.is_empty());
            let mut graph = Graph::new();
            for &(a, b) in &edges {
                graph.add_edge(a, b);
            }
            let (a, b) = edges[0];
            graph.add_edge(b, a);

            prop_assert!(graph.topological_order().is_empty());
            prop_assert!(!graph.cyclic_remainder().is_empty());
        }

        #[test]
        fn reachable_set_is_closed_under_successors(
            edges in arb_forward_edges(),
            start in 0u8..20,
        ) {
            let mut graph = Graph::new();
            for &(a, b) in &edges {
                graph.add_edge(a, b);
            }

            let reached = graph.reachable_from(start);
            for &vertex in &reached {
                for next in graph.successors(vertex) {
                    prop_assert!(reached.contains(&next));
                }
            }
        }
    }
}
