//! Parameter propagation along the hierarchy.
//!
//! An edge records the parameters a class hands to its superclass in terms
//! of its own generic variables. Walking up, those variables are replaced
//! with the concrete parameters in hand; walking down, the concrete
//! parameters are pattern-matched back against the abstract shape to
//! recover what the subclass must have been instantiated with.

use crate::order::error::TypeOrderError;
use crate::order::graph::TypeOrder;
use crate::order::store::{Index, OrderStore, Target};
use crate::order::{Host, Order};
use crate::types::{names, Tuple, Type};
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;

/// Record, for every variable in `left`, the subterm of `right` found in
/// the same position. Identical outer constructors recurse componentwise;
/// anything else leaves the map unchanged.
pub(crate) fn diff_variables(
    substitutions: &mut FxHashMap<Type, Type>,
    left: &Type,
    right: &Type,
) {
    match (left, right) {
        (Type::Variable(_), _) => {
            substitutions.insert(left.clone(), right.clone());
        }
        (
            Type::Parametric {
                name: left_name,
                parameters: left_parameters,
            },
            Type::Parametric {
                name: right_name,
                parameters: right_parameters,
            },
        ) if left_name == right_name => {
            diff_variables_list(substitutions, left_parameters, right_parameters);
        }
        (Type::Optional(left_inner), Type::Optional(right_inner))
        | (Type::Meta(left_inner), Type::Meta(right_inner)) => {
            diff_variables(substitutions, left_inner, right_inner);
        }
        (Type::Union(left_members), Type::Union(right_members)) => {
            diff_variables_list(substitutions, left_members, right_members);
        }
        (Type::Tuple(Tuple::Bounded(left_elements)), Type::Tuple(Tuple::Bounded(right_elements))) => {
            diff_variables_list(substitutions, left_elements, right_elements);
        }
        (Type::Tuple(Tuple::Unbounded(left_element)), Type::Tuple(Tuple::Unbounded(right_element))) => {
            diff_variables(substitutions, left_element, right_element);
        }
        (Type::Callable(left_callable), Type::Callable(right_callable)) => {
            diff_variables(
                substitutions,
                &left_callable.implementation.annotation,
                &right_callable.implementation.annotation,
            );
            if let (
                crate::types::Parameters::Defined(left_parameters),
                crate::types::Parameters::Defined(right_parameters),
            ) = (
                &left_callable.implementation.parameters,
                &right_callable.implementation.parameters,
            ) {
                for (left_parameter, right_parameter) in
                    left_parameters.iter().zip(right_parameters.iter())
                {
                    diff_variables(
                        substitutions,
                        left_parameter.annotation(),
                        right_parameter.annotation(),
                    );
                }
            }
        }
        _ => {}
    }
}

/// Zip two lists, tolerating a length mismatch.
pub(crate) fn diff_variables_list(
    substitutions: &mut FxHashMap<Type, Type>,
    lefts: &[Type],
    rights: &[Type],
) {
    for (left, right) in lefts.iter().zip(rights.iter()) {
        diff_variables(substitutions, left, right);
    }
}

impl<S: OrderStore> TypeOrder<S> {
    /// The successors of a vertex with their edge parameters instantiated
    /// for the given concrete `parameters`. An arity mismatch against the
    /// declaration substitutes `Any`.
    pub(crate) fn get_instantiated_successors(
        &self,
        index: Index,
        parameters: &[Type],
    ) -> Result<Vec<Target>, TypeOrderError> {
        let annotation = self.annotation_of(index)?;
        let declared = self.variables(&annotation)?.unwrap_or_default();
        let substitutions: FxHashMap<Type, Type> = if declared.len() == parameters.len() {
            declared
                .iter()
                .cloned()
                .zip(parameters.iter().cloned())
                .collect()
        } else {
            declared
                .iter()
                .cloned()
                .map(|variable| (variable, Type::Any))
                .collect()
        };
        Ok(self
            .edges_of(index)
            .into_iter()
            .map(|edge| Target {
                target: edge.target,
                parameters: edge
                    .parameters
                    .iter()
                    .map(|parameter| parameter.instantiate(&substitutions))
                    .collect(),
            })
            .collect())
    }

    /// The predecessors of a vertex with their own generic variables
    /// resolved by pattern-matching the edge shape against the concrete
    /// `parameters`; variables the predecessor does not propagate fall back
    /// to `Bottom`.
    pub(crate) fn get_instantiated_predecessors(
        &self,
        index: Index,
        parameters: &[Type],
    ) -> Result<Vec<Target>, TypeOrderError> {
        let mut instantiated = Vec::new();
        for backedge in self.backedges_of(index) {
            let mut substitutions = FxHashMap::default();
            diff_variables_list(&mut substitutions, &backedge.parameters, parameters);
            let predecessor = self.annotation_of(backedge.target)?;
            let declared = self.variables(&predecessor)?.unwrap_or_default();
            instantiated.push(Target {
                target: backedge.target,
                parameters: declared
                    .iter()
                    .map(|variable| {
                        substitutions
                            .get(variable)
                            .cloned()
                            .unwrap_or(Type::Bottom)
                    })
                    .collect(),
            });
        }
        Ok(instantiated)
    }
}

impl<'a, S: OrderStore, H: Host> Order<'a, S, H> {
    /// The parameters `source` hands to `target` (a tracked primitive above
    /// it), or `None` when `target` is not an ancestor.
    pub fn instantiate_successors_parameters(
        &self,
        source: &Type,
        target: &Type,
    ) -> Result<Option<Vec<Type>>, TypeOrderError> {
        // Everything sits above Bottom; its parameters resolve to Bottom.
        if source.is_bottom() {
            let declared = self.handler.variables(target)?.unwrap_or_default();
            return Ok(Some(declared.iter().map(|_| Type::Bottom).collect()));
        }
        if let Type::Callable(callable) = source {
            if target == &Type::primitive(names::CALLABLE) {
                return Ok(Some(vec![callable.implementation.annotation.clone()]));
            }
        }
        let (primitive, parameters) = match source {
            Type::Tuple(tuple) => {
                let element = match tuple {
                    Tuple::Bounded(elements) => self.join_all(elements)?,
                    Tuple::Unbounded(element) => (**element).clone(),
                };
                (
                    Type::primitive(names::TUPLE),
                    vec![element.weaken_literals()],
                )
            }
            _ => source.split(),
        };
        let start = self.handler.index_of(&primitive)?;
        let goal = self.handler.index_of(target)?;
        if start == goal {
            return Ok(Some(parameters));
        }

        let mut visited = FxHashSet::default();
        visited.insert(start);
        let mut queue = VecDeque::from([(start, parameters)]);
        while let Some((index, current)) = queue.pop_front() {
            for successor in self.handler.get_instantiated_successors(index, &current)? {
                if successor.target == goal {
                    return Ok(Some(successor.parameters));
                }
                if visited.insert(successor.target) {
                    queue.push_back((successor.target, successor.parameters));
                }
            }
        }
        Ok(None)
    }

    /// The dual walk: the parameters `target` (a tracked primitive below
    /// `source`) must have been instantiated with.
    pub fn instantiate_predecessors_parameters(
        &self,
        source: &Type,
        target: &Type,
    ) -> Result<Option<Vec<Type>>, TypeOrderError> {
        let (primitive, parameters) = source.split();
        let start = self.handler.index_of(&primitive)?;
        let goal = self.handler.index_of(target)?;
        if start == goal {
            return Ok(Some(parameters));
        }

        let mut visited = FxHashSet::default();
        visited.insert(start);
        let mut queue = VecDeque::from([(start, parameters)]);
        while let Some((index, current)) = queue.pop_front() {
            for predecessor in self
                .handler
                .get_instantiated_predecessors(index, &current)?
            {
                if predecessor.target == goal {
                    return Ok(Some(predecessor.parameters));
                }
                if visited.insert(predecessor.target) {
                    queue.push_back((predecessor.target, predecessor.parameters));
                }
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
#[path = "tests/propagate_tests.rs"]
mod tests;
