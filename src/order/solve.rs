//! The constraint solver: binding type variables so a source type becomes a
//! subtype of a target type.

use crate::order::error::TypeOrderError;
use crate::order::store::OrderStore;
use crate::order::{Host, ImplementsResult, Order};
use crate::types::{Constraints, Parameters, Tuple, Type, TypeVar};
use rustc_hash::FxHashMap;

/// Accumulated bindings, keyed by `Variable` terms.
pub type ConstraintMap = FxHashMap<Type, Type>;

impl<'a, S: OrderStore, H: Host> Order<'a, S, H> {
    /// Extend `constraints` so that `source` is a subtype of `target`, or
    /// answer `None`. Engine errors (untracked classes above all) count as
    /// "no solution".
    pub fn solve_constraints(
        &self,
        constraints: &ConstraintMap,
        source: &Type,
        target: &Type,
    ) -> Option<ConstraintMap> {
        self.solve_constraints_impl(constraints, source, target)
            .unwrap_or(None)
    }

    pub(crate) fn solve_constraints_impl(
        &self,
        constraints: &ConstraintMap,
        source: &Type,
        target: &Type,
    ) -> Result<Option<ConstraintMap>, TypeOrderError> {
        if source.is_bottom() {
            return Ok(Some(constraints.clone()));
        }

        // Every branch of a source union must fit the same target.
        if let Type::Union(members) = source {
            let mut current = constraints.clone();
            for member in members {
                match self.solve_constraints_impl(&current, member, target)? {
                    Some(updated) => current = updated,
                    None => return Ok(None),
                }
            }
            return Ok(Some(current));
        }

        if !target.is_resolved() {
            match target {
                Type::Variable(variable) => {
                    return self.solve_against_variable(constraints, source, target, variable);
                }
                Type::Parametric {
                    name,
                    parameters: target_parameters,
                } => {
                    if matches!(source, Type::Callable(_)) {
                        return match self.host.implements(target, source) {
                            ImplementsResult::Implements { parameters } => self
                                .solve_constraints_impl(
                                    constraints,
                                    &Type::Parametric {
                                        name: name.clone(),
                                        parameters,
                                    },
                                    target,
                                ),
                            ImplementsResult::DoesNotImplement => Ok(None),
                        };
                    }
                    let Some(source_parameters) = self.instantiate_successors_parameters(
                        source,
                        &Type::Primitive(name.clone()),
                    )?
                    else {
                        return Ok(None);
                    };
                    if source_parameters.len() != target_parameters.len() {
                        return Ok(None);
                    }
                    let mut current = constraints.clone();
                    for (source_parameter, target_parameter) in
                        source_parameters.iter().zip(target_parameters.iter())
                    {
                        match self.solve_constraints_impl(
                            &current,
                            source_parameter,
                            target_parameter,
                        )? {
                            Some(updated) => current = updated,
                            None => return Ok(None),
                        }
                    }
                    // The bindings must actually make the target a
                    // supertype.
                    let instantiated = target.instantiate(&current);
                    return Ok(if self.less_or_equal(source, &instantiated)? {
                        Some(current)
                    } else {
                        None
                    });
                }
                Type::Optional(target_inner) => {
                    return match source {
                        Type::Optional(source_inner) => {
                            self.solve_constraints_impl(constraints, source_inner, target_inner)
                        }
                        _ => self.solve_constraints_impl(constraints, source, target_inner),
                    };
                }
                Type::Tuple(target_tuple) => {
                    return self.solve_against_tuple(constraints, source, target_tuple);
                }
                Type::Union(members) => {
                    for member in members {
                        if let Some(updated) =
                            self.solve_constraints_impl(constraints, source, member)?
                        {
                            return Ok(Some(updated));
                        }
                    }
                    return Ok(None);
                }
                Type::Callable(target_callable) => match source {
                    Type::Callable(source_callable) => {
                        let marked = target.mark_free_variables();
                        if let Type::Callable(marked_callable) = &marked {
                            if let Some(selected) = self.simulate_signature_select(
                                source_callable,
                                &marked_callable.implementation,
                            )? {
                                let annotation = selected.annotation.free_marked_variables();
                                return self.solve_constraints_impl(
                                    constraints,
                                    &annotation,
                                    &target_callable.implementation.annotation,
                                );
                            }
                        }
                        // Selection failed: pair the annotations
                        // positionally, tolerating a length mismatch, then
                        // solve the returns on the original source.
                        let mut current = constraints.clone();
                        if let (
                            Parameters::Defined(source_parameters),
                            Parameters::Defined(target_parameters),
                        ) = (
                            &source_callable.implementation.parameters,
                            &target_callable.implementation.parameters,
                        ) {
                            for (source_parameter, target_parameter) in
                                source_parameters.iter().zip(target_parameters.iter())
                            {
                                match self.solve_constraints_impl(
                                    &current,
                                    source_parameter.annotation(),
                                    target_parameter.annotation(),
                                )? {
                                    Some(updated) => current = updated,
                                    None => return Ok(None),
                                }
                            }
                        }
                        return self.solve_constraints_impl(
                            &current,
                            &source_callable.implementation.annotation,
                            &target_callable.implementation.annotation,
                        );
                    }
                    Type::Meta(inner) => {
                        return match self.host.constructor(inner) {
                            Some(constructed) => {
                                self.solve_constraints_impl(constraints, &constructed, target)
                            }
                            None => Ok(None),
                        };
                    }
                    _ => {}
                },
                _ => {}
            }
        }

        // Fully-resolved target: plain subtype acceptance, tolerating the
        // gradual corner.
        if source.is_any() || target.is_top() {
            return Ok(Some(constraints.clone()));
        }
        Ok(if self.less_or_equal(source, target)? {
            Some(constraints.clone())
        } else {
            None
        })
    }

    fn solve_against_variable(
        &self,
        constraints: &ConstraintMap,
        source: &Type,
        target: &Type,
        variable: &TypeVar,
    ) -> Result<Option<ConstraintMap>, TypeOrderError> {
        if source == target {
            return Ok(Some(constraints.clone()));
        }
        let joined = match constraints.get(target) {
            Some(existing) => self.join_impl(existing, source)?,
            None => source.clone(),
        };
        let value = match (source, &variable.constraints) {
            // Explicitly-constrained variables on both sides: the source's
            // choices must all be admissible for the target.
            (
                Type::Variable(TypeVar {
                    constraints: Constraints::Explicit(source_constraints),
                    ..
                }),
                Constraints::Explicit(target_constraints),
            ) => {
                if source_constraints
                    .iter()
                    .all(|constraint| target_constraints.contains(constraint))
                {
                    Some(source.clone())
                } else {
                    None
                }
            }
            // Pick the first admissible choice.
            (_, Constraints::Explicit(target_constraints)) => {
                let mut chosen = None;
                for candidate in target_constraints {
                    if self.less_or_equal(&joined, candidate)? {
                        chosen = Some(candidate.clone());
                        break;
                    }
                }
                chosen
            }
            (_, Constraints::Bound(bound)) => {
                if self.less_or_equal(&joined, bound)? {
                    Some(joined)
                } else {
                    None
                }
            }
            (_, Constraints::Unconstrained) => Some(joined),
        };
        Ok(value.map(|value| {
            let mut updated = constraints.clone();
            updated.insert(target.clone(), value);
            updated
        }))
    }

    fn solve_against_tuple(
        &self,
        constraints: &ConstraintMap,
        source: &Type,
        target_tuple: &Tuple,
    ) -> Result<Option<ConstraintMap>, TypeOrderError> {
        match (source, target_tuple) {
            (Type::Tuple(Tuple::Bounded(source_elements)), Tuple::Bounded(target_elements))
                if source_elements.len() == target_elements.len() =>
            {
                let mut current = constraints.clone();
                for (source_element, target_element) in
                    source_elements.iter().zip(target_elements.iter())
                {
                    match self.solve_constraints_impl(&current, source_element, target_element)? {
                        Some(updated) => current = updated,
                        None => return Ok(None),
                    }
                }
                Ok(Some(current))
            }
            (Type::Tuple(Tuple::Unbounded(source_element)), Tuple::Unbounded(target_element)) => {
                self.solve_constraints_impl(constraints, source_element, target_element)
            }
            // A fixed shape against an unbounded pattern: union the
            // elements.
            (Type::Tuple(Tuple::Bounded(source_elements)), Tuple::Unbounded(target_element)) => {
                self.solve_constraints_impl(
                    constraints,
                    &Type::union(source_elements.clone()),
                    target_element,
                )
            }
            // An unbounded source expands to fill the fixed pattern.
            (Type::Tuple(Tuple::Unbounded(source_element)), Tuple::Bounded(target_elements)) => {
                let mut current = constraints.clone();
                for target_element in target_elements {
                    match self.solve_constraints_impl(&current, source_element, target_element)? {
                        Some(updated) => current = updated,
                        None => return Ok(None),
                    }
                }
                Ok(Some(current))
            }
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
#[path = "tests/solve_tests.rs"]
mod tests;
