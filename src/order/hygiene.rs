//! Graph hygiene: normalization, deduplication, integrity checking and the
//! debug dump.
//!
//! Hosts run these between the build phase and the query phase; none of
//! them are needed for correctness of a well-formed graph, but builders
//! routinely produce duplicate or redundant edges.

use crate::order::error::TypeOrderError;
use crate::order::graph::TypeOrder;
use crate::order::store::{Index, OrderStore, Target};
use crate::types::Type;
use rustc_hash::{FxHashMap, FxHashSet};
use std::fmt::Write as _;

#[derive(Copy, Clone, PartialEq, Eq)]
enum Color {
    Visiting,
    Done,
}

impl<S: OrderStore> TypeOrder<S> {
    /// Sort and deduplicate every backedge list and the successor list of
    /// `Bottom`.
    pub fn normalize(&mut self) {
        for index in self.store.keys() {
            if let Some(mut backedges) = self.store.find_backedges(index) {
                backedges.sort();
                backedges.dedup();
                self.store.set_backedges(index, backedges);
            }
        }
        if let Some(bottom) = self.store.find_index(&Type::Bottom) {
            if let Some(mut edges) = self.store.find_edges(bottom) {
                edges.sort();
                edges.dedup();
                self.store.set_edges(bottom, edges);
            }
        }
    }

    /// Compress the adjacency of the listed types, keeping the first entry
    /// per neighbouring vertex.
    pub fn deduplicate(&mut self, annotations: &[Type]) {
        for annotation in annotations {
            let Some(index) = self.store.find_index(annotation) else {
                continue;
            };
            let mut seen = FxHashSet::default();
            let edges: Vec<Target> = self
                .edges_of(index)
                .into_iter()
                .filter(|edge| seen.insert(edge.target))
                .collect();
            self.store.set_edges(index, edges);

            let mut seen = FxHashSet::default();
            let backedges: Vec<Target> = self
                .backedges_of(index)
                .into_iter()
                .filter(|backedge| seen.insert(backedge.target))
                .collect();
            self.store.set_backedges(index, backedges);
        }
    }

    /// Drop redundant edges to `top` (and, mirrored, from `bottom`) for the
    /// listed types: an edge to `top` is redundant as soon as the vertex has
    /// any other successor, and an edge from `bottom` as soon as it has any
    /// other predecessor.
    pub fn remove_extra_edges(&mut self, bottom: &Type, top: &Type, annotations: &[Type]) {
        let (Some(bottom_index), Some(top_index)) = (
            self.store.find_index(bottom),
            self.store.find_index(top),
        ) else {
            return;
        };
        for annotation in annotations {
            let Some(index) = self.store.find_index(annotation) else {
                continue;
            };

            let edges = self.edges_of(index);
            let connects_top = edges.iter().any(|edge| edge.target == top_index);
            let has_other_successor = edges.iter().any(|edge| edge.target != top_index);
            if connects_top && has_other_successor {
                self.store.set_edges(
                    index,
                    edges
                        .into_iter()
                        .filter(|edge| edge.target != top_index)
                        .collect(),
                );
                let mirrored: Vec<Target> = self
                    .backedges_of(top_index)
                    .into_iter()
                    .filter(|backedge| backedge.target != index)
                    .collect();
                self.store.set_backedges(top_index, mirrored);
            }

            let backedges = self.backedges_of(index);
            let connects_bottom = backedges.iter().any(|backedge| backedge.target == bottom_index);
            let has_other_predecessor = backedges.iter().any(|backedge| backedge.target != bottom_index);
            if connects_bottom && has_other_predecessor {
                self.store.set_backedges(
                    index,
                    backedges
                        .into_iter()
                        .filter(|backedge| backedge.target != bottom_index)
                        .collect(),
                );
                let mirrored: Vec<Target> = self
                    .edges_of(bottom_index)
                    .into_iter()
                    .filter(|edge| edge.target != index)
                    .collect();
                self.store.set_edges(bottom_index, mirrored);
            }
        }
    }

    /// Connect every listed vertex that does not already reach `top` and
    /// has no successors of its own to `top`. Subtyping against `top` is
    /// the nominal reachability check; the full relation would accept
    /// everything against the universal top.
    pub fn connect_annotations_to_top(&mut self, top: &Type, annotations: &[Type]) {
        let Some(top_index) = self.store.find_index(top) else {
            return;
        };
        for annotation in annotations {
            let Some(index) = self.store.find_index(annotation) else {
                continue;
            };
            let below_top = self.reachable(index, top_index);
            let has_successors = !self.edges_of(index).is_empty();
            if !below_top && !has_successors {
                self.connect(annotation, top, vec![]);
            }
        }
    }

    /// Verify the four tables agree, `Bottom`/`Top` are present, the graph
    /// is acyclic and every edge has its mirror.
    pub fn check_integrity(&self) -> Result<(), TypeOrderError> {
        for required in [&Type::Bottom, &Type::Top] {
            if !self.contains(required) {
                return Err(TypeOrderError::Incomplete(format!(
                    "`{}` is not tracked",
                    required
                )));
            }
        }

        let keys = self.store.keys();
        for &index in &keys {
            let annotation = self.annotation_of(index)?;
            match self.store.find_index(&annotation) {
                Some(found) if found == index => {}
                _ => {
                    return Err(TypeOrderError::Incomplete(format!(
                        "index table does not map `{}` back to its vertex",
                        annotation
                    )))
                }
            }
            if self.store.find_edges(index).is_none() {
                return Err(TypeOrderError::Incomplete(format!(
                    "`{}` has no edge table entry",
                    annotation
                )));
            }
            if self.store.find_backedges(index).is_none() {
                return Err(TypeOrderError::Incomplete(format!(
                    "`{}` has no backedge table entry",
                    annotation
                )));
            }
        }

        self.check_acyclic(&keys)?;

        for &index in &keys {
            for edge in self.edges_of(index) {
                let mirrored = self.backedges_of(edge.target).into_iter().any(|backedge| {
                    backedge.target == index && backedge.parameters == edge.parameters
                });
                if !mirrored {
                    return Err(TypeOrderError::Incomplete(format!(
                        "edge {} -> {} has no mirroring backedge",
                        index.0, edge.target.0
                    )));
                }
            }
            for backedge in self.backedges_of(index) {
                let mirrored = self.edges_of(backedge.target).into_iter().any(|edge| {
                    edge.target == index && edge.parameters == backedge.parameters
                });
                if !mirrored {
                    return Err(TypeOrderError::Incomplete(format!(
                        "backedge {} -> {} has no mirroring edge",
                        index.0, backedge.target.0
                    )));
                }
            }
        }
        Ok(())
    }

    fn check_acyclic(&self, keys: &[Index]) -> Result<(), TypeOrderError> {
        let mut colors: FxHashMap<Index, Color> = FxHashMap::default();
        for &root in keys {
            if colors.contains_key(&root) {
                continue;
            }
            colors.insert(root, Color::Visiting);
            let mut stack: Vec<(Index, usize)> = vec![(root, 0)];
            while let Some(&(node, cursor)) = stack.last() {
                let successors = self.edges_of(node);
                if cursor < successors.len() {
                    stack.last_mut().expect("stack is nonempty").1 += 1;
                    let next = successors[cursor].target;
                    match colors.get(&next) {
                        Some(Color::Visiting) => {
                            tracing::debug!(vertex = next.0, "cycle detected");
                            return Err(TypeOrderError::Cyclic);
                        }
                        Some(Color::Done) => {}
                        None => {
                            colors.insert(next, Color::Visiting);
                            stack.push((next, 0));
                        }
                    }
                } else {
                    colors.insert(node, Color::Done);
                    stack.pop();
                }
            }
        }
        Ok(())
    }

    /// A deterministic Graphviz rendering for debugging.
    pub fn to_dot(&self) -> String {
        let mut keys = self.store.keys();
        keys.sort();
        let mut output = String::from("digraph {\n");
        for &index in &keys {
            if let Some(annotation) = self.store.find_annotation(index) {
                let _ = writeln!(output, "  {}[label=\"{}\"]", index.0, annotation);
            }
        }
        for &index in &keys {
            let mut edges = self.edges_of(index);
            edges.sort();
            for edge in edges {
                if edge.parameters.is_empty() {
                    let _ = writeln!(output, "  {} -> {}", index.0, edge.target.0);
                } else {
                    let labels: Vec<String> =
                        edge.parameters.iter().map(|p| p.to_string()).collect();
                    let _ = writeln!(
                        output,
                        "  {} -> {}[label=\"({})\"]",
                        index.0,
                        edge.target.0,
                        labels.join(", ")
                    );
                }
            }
        }
        output.push_str("}\n");
        output
    }
}

#[cfg(test)]
#[path = "tests/hygiene_tests.rs"]
mod tests;
