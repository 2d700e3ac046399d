//! Breadth-first machinery over the adjacency tables.

use crate::order::error::TypeOrderError;
use crate::order::graph::TypeOrder;
use crate::order::store::{Index, OrderStore, Target};
use crate::types::Type;
use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use std::collections::VecDeque;

type Frontier = SmallVec<[Index; 8]>;

/// Which adjacency table a walk follows.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Direction {
    Successors,
    Predecessors,
}

impl<S: OrderStore> TypeOrder<S> {
    pub(crate) fn adjacent(&self, index: Index, direction: Direction) -> Vec<Target> {
        match direction {
            Direction::Successors => self.edges_of(index),
            Direction::Predecessors => self.backedges_of(index),
        }
    }

    /// True when `goal` can be reached from `start` along forward edges.
    pub(crate) fn reachable(&self, start: Index, goal: Index) -> bool {
        if start == goal {
            return true;
        }
        let mut visited = FxHashSet::default();
        visited.insert(start);
        let mut queue = VecDeque::from([start]);
        while let Some(index) = queue.pop_front() {
            for edge in self.edges_of(index) {
                if edge.target == goal {
                    return true;
                }
                if visited.insert(edge.target) {
                    queue.push_back(edge.target);
                }
            }
        }
        false
    }

    /// Vertices in breadth-first visit order, starting from (and including)
    /// `start`.
    pub(crate) fn breadth_first(&self, start: Index, direction: Direction) -> Vec<Index> {
        let mut visited = FxHashSet::default();
        visited.insert(start);
        let mut order = vec![start];
        let mut queue = VecDeque::from([start]);
        while let Some(index) = queue.pop_front() {
            for edge in self.adjacent(index, direction) {
                if visited.insert(edge.target) {
                    order.push(edge.target);
                    queue.push_back(edge.target);
                }
            }
        }
        order
    }

    /// Level-synchronized search from both operands for the nearest shared
    /// vertices: upward over forward edges this is the least upper bound
    /// set, downward over backedges the greatest lower bound set. Results
    /// are sorted by index for determinism.
    pub(crate) fn least_common_reachable(
        &self,
        left: &Type,
        right: &Type,
        direction: Direction,
    ) -> Result<Vec<Type>, TypeOrderError> {
        let left_start = self.index_of(left)?;
        let right_start = self.index_of(right)?;

        let mut left_seen = FxHashSet::default();
        left_seen.insert(left_start);
        let mut right_seen = FxHashSet::default();
        right_seen.insert(right_start);
        let mut left_frontier: Frontier = SmallVec::from_slice(&[left_start]);
        let mut right_frontier: Frontier = SmallVec::from_slice(&[right_start]);

        loop {
            let mut shared: Vec<Index> = left_seen.intersection(&right_seen).copied().collect();
            if !shared.is_empty() {
                shared.sort();
                return shared
                    .into_iter()
                    .map(|index| self.annotation_of(index))
                    .collect();
            }
            if left_frontier.is_empty() && right_frontier.is_empty() {
                return Ok(Vec::new());
            }
            left_frontier = self.advance(&left_frontier, &mut left_seen, direction);
            right_frontier = self.advance(&right_frontier, &mut right_seen, direction);
        }
    }

    fn advance(
        &self,
        frontier: &[Index],
        seen: &mut FxHashSet<Index>,
        direction: Direction,
    ) -> Frontier {
        let mut next = Frontier::new();
        for &index in frontier {
            for edge in self.adjacent(index, direction) {
                if seen.insert(edge.target) {
                    next.push(edge.target);
                }
            }
        }
        next
    }
}
