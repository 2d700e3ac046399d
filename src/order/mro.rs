//! Method resolution order via the C3 merge.

use crate::order::error::TypeOrderError;
use crate::order::graph::TypeOrder;
use crate::order::store::OrderStore;
use crate::order::traversal::Direction;
use crate::types::{names, Type};
use rustc_hash::FxHashMap;
use std::collections::VecDeque;

impl<S: OrderStore> TypeOrder<S> {
    /// The C3 linearization of `annotation`, headed by the type itself.
    pub fn method_resolution_order(
        &self,
        annotation: &Type,
    ) -> Result<Vec<Type>, TypeOrderError> {
        self.linearize(annotation)
    }

    /// The linearization with the type itself stripped.
    pub fn successors(&self, annotation: &Type) -> Result<Vec<Type>, TypeOrderError> {
        let mut linearization = self.linearize(annotation)?;
        linearization.remove(0);
        Ok(linearization)
    }

    /// Tracked predecessors of `annotation` in breadth-first order.
    pub fn predecessors(&self, annotation: &Type) -> Result<Vec<Type>, TypeOrderError> {
        let (primitive, _) = annotation.split();
        let start = self.index_of(&primitive)?;
        self.breadth_first(start, Direction::Predecessors)
            .into_iter()
            .skip(1)
            .map(|index| self.annotation_of(index))
            .collect()
    }

    /// The maximal tracked types satisfying `matches`: walking down from
    /// `Top` over backedges, a matching vertex is collected and its own
    /// predecessors are not explored.
    pub fn greatest(&self, matches: impl Fn(&Type) -> bool) -> Vec<Type> {
        let Some(top) = self.store.find_index(&Type::Top) else {
            return Vec::new();
        };
        let mut visited = rustc_hash::FxHashSet::default();
        visited.insert(top);
        let mut queue = VecDeque::from([top]);
        let mut found = Vec::new();
        while let Some(index) = queue.pop_front() {
            let Ok(annotation) = self.annotation_of(index) else {
                continue;
            };
            if !annotation.is_top() && matches(&annotation) {
                found.push(annotation);
                continue;
            }
            for backedge in self.backedges_of(index) {
                if visited.insert(backedge.target) {
                    queue.push_back(backedge.target);
                }
            }
        }
        found
    }

    fn linearize(&self, annotation: &Type) -> Result<Vec<Type>, TypeOrderError> {
        let (primitive, parameters) = annotation.split();
        let index = self.index_of(&primitive)?;
        // The edge to typing.Generic records the declared variables, not an
        // ancestor; `variables` reads it and the linearization skips it.
        let generic_index = self.store.find_index(&Type::primitive(names::GENERIC));

        let declared = self.variables(annotation)?.unwrap_or_default();
        let substitutions: FxHashMap<Type, Type> = if declared.len() == parameters.len() {
            declared
                .iter()
                .cloned()
                .zip(parameters.iter().cloned())
                .collect()
        } else {
            FxHashMap::default()
        };
        let arities_agree = declared.len() == parameters.len();

        let mut immediate = Vec::new();
        for edge in self.edges_of(index) {
            if Some(edge.target) == generic_index {
                continue;
            }
            let rewritten = if !edge.parameters.is_empty() && arities_agree {
                edge.parameters
                    .iter()
                    .map(|parameter| parameter.instantiate(&substitutions))
                    .collect()
            } else {
                // Unparameterized edge, or a declaration/application arity
                // mismatch: the successor stays bare.
                Vec::new()
            };
            let successor = match self.annotation_of(edge.target)? {
                // The linearization stays in the class world; the synthetic
                // universal vertex is not an ancestor class.
                Type::Top => continue,
                Type::Primitive(name) => {
                    if rewritten.is_empty() {
                        Type::Primitive(name)
                    } else {
                        Type::Parametric {
                            name,
                            parameters: rewritten,
                        }
                    }
                }
                other => other,
            };
            immediate.push(successor);
        }

        let mut sequences: Vec<VecDeque<Type>> = Vec::new();
        for successor in &immediate {
            sequences.push(self.linearize(successor)?.into());
        }
        sequences.push(immediate.into());

        let mut linearization = vec![annotation.clone()];
        linearization.extend(
            c3_merge(sequences).ok_or_else(|| {
                tracing::debug!(annotation = %annotation, "no valid C3 head");
                TypeOrderError::InconsistentMethodResolutionOrder(annotation.clone())
            })?,
        );
        Ok(linearization)
    }
}

/// Repeatedly emit a head that appears in no tail; fail when none exists.
fn c3_merge(mut sequences: Vec<VecDeque<Type>>) -> Option<Vec<Type>> {
    let mut merged = Vec::new();
    loop {
        sequences.retain(|sequence| !sequence.is_empty());
        if sequences.is_empty() {
            return Some(merged);
        }
        let mut head = None;
        'candidates: for sequence in &sequences {
            let candidate = &sequence[0];
            for other in &sequences {
                if other.iter().skip(1).any(|element| element == candidate) {
                    continue 'candidates;
                }
            }
            head = Some(candidate.clone());
            break;
        }
        let head = head?;
        merged.push(head.clone());
        for sequence in &mut sequences {
            if sequence.front() == Some(&head) {
                sequence.pop_front();
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/mro_tests.rs"]
mod tests;
