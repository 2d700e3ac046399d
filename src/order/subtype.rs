//! The subtype relation.
//!
//! `less_or_equal` tries its cases in a fixed sequence: sentinels first,
//! then the nominal/parametric rules, unions and optionals, the structural
//! forms (tuples, callables, typed dictionaries, literals), and finally raw
//! reachability through the graph. The order of the cases is part of the
//! semantics; several pairs are claimed by whichever rule fires first.

use crate::order::error::TypeOrderError;
use crate::order::store::OrderStore;
use crate::order::{Host, ImplementsResult, Order};
use crate::types::{names, CallableKind, Constraints, Tuple, Type, Variance};

/// Parametric-like terms: applied classes and type objects.
fn is_nominal(annotation: &Type) -> bool {
    matches!(annotation, Type::Parametric { .. } | Type::Meta(_))
}

impl<'a, S: OrderStore, H: Host> Order<'a, S, H> {
    /// Is `left` a subtype of `right`?
    ///
    /// Raises `Untracked` when a nominal lookup reaches a class the graph
    /// does not know; the lattice operations and the constraint solver
    /// catch that and degrade, direct callers should not.
    pub fn less_or_equal(&self, left: &Type, right: &Type) -> Result<bool, TypeOrderError> {
        if left == right {
            return Ok(true);
        }

        // Sentinels.
        if right.is_top() {
            return Ok(!left.contains_undeclared());
        }
        if left.is_top() {
            return Ok(false);
        }
        if right.is_any() {
            return Ok(true);
        }
        if left.is_any() {
            return Ok(false);
        }
        if left.is_bottom() {
            return Ok(true);
        }
        if right.is_bottom() {
            return Ok(false);
        }

        // object is the top of the nominal world.
        if matches!(right, Type::Primitive(name) if name == names::OBJECT) {
            return Ok(true);
        }

        // A bare variable on the right only admits itself.
        if matches!(right, Type::Variable(_)) {
            return Ok(false);
        }

        // Applied classes compare through declared variance.
        if is_nominal(left) && is_nominal(right) {
            return self.parametric_less_or_equal(left, right);
        }

        // A union on the left must hold memberwise.
        if let Type::Union(members) = left {
            for member in members {
                if !self.less_or_equal(member, right)? {
                    return Ok(false);
                }
            }
            return Ok(true);
        }

        // A constrained variable against a union: either some member admits
        // the variable, or the union of its constraints does.
        if let (Type::Variable(variable), Type::Union(members)) = (left, right) {
            for member in members {
                if self.less_or_equal(left, member)? {
                    return Ok(true);
                }
            }
            let ground = match &variable.constraints {
                Constraints::Explicit(constraints) => Type::union(constraints.clone()),
                Constraints::Bound(bound) => (**bound).clone(),
                Constraints::Unconstrained => return Ok(false),
            };
            return self.less_or_equal(&ground, right);
        }

        // A union on the right needs one member.
        if let Type::Union(members) = right {
            for member in members {
                if self.less_or_equal(left, member)? {
                    return Ok(true);
                }
            }
            return Ok(false);
        }

        // Optionals.
        match (left, right) {
            (Type::Optional(left_inner), Type::Optional(right_inner)) => {
                return self.less_or_equal(left_inner, right_inner);
            }
            (Type::Optional(_), _) => return Ok(false),
            (_, Type::Optional(right_inner)) => return self.less_or_equal(left, right_inner),
            _ => {}
        }

        // Constrained variables on the left reduce to their ground form.
        if let Type::Variable(variable) = left {
            return match &variable.constraints {
                Constraints::Explicit(constraints) => {
                    self.less_or_equal(&Type::union(constraints.clone()), right)
                }
                Constraints::Bound(bound) => self.less_or_equal(bound, right),
                Constraints::Unconstrained => Ok(false),
            };
        }

        // Tuples.
        match (left, right) {
            (Type::Tuple(left_tuple), Type::Tuple(right_tuple)) => {
                return self.tuple_less_or_equal(left_tuple, right_tuple);
            }
            (Type::Tuple(tuple), Type::Primitive(_) | Type::Parametric { .. }) => {
                if matches!(right, Type::Primitive(name) if name == names::TUPLE) {
                    return Ok(true);
                }
                let element = match tuple {
                    Tuple::Bounded(elements) => self.join_all(elements)?,
                    Tuple::Unbounded(element) => (**element).clone(),
                };
                return self
                    .less_or_equal(&Type::parametric(names::TUPLE, vec![element]), right);
            }
            _ => {}
        }

        // Callables against callables, and type objects called as
        // constructors.
        match (left, right) {
            (Type::Callable(left_callable), Type::Callable(right_callable)) => {
                if let (CallableKind::Named(left_name), CallableKind::Named(right_name)) =
                    (&left_callable.kind, &right_callable.kind)
                {
                    if left_name == right_name {
                        return Ok(true);
                    }
                }
                return match self.simulate_signature_select(
                    left_callable,
                    &right_callable.implementation,
                )? {
                    Some(selected) => self.less_or_equal(
                        &selected.annotation,
                        &right_callable.implementation.annotation,
                    ),
                    None => Ok(false),
                };
            }
            (Type::Meta(inner), Type::Callable(_)) => {
                return match self.host.constructor(inner) {
                    Some(constructed) => self.less_or_equal(&constructed, right),
                    None => Ok(false),
                };
            }
            _ => {}
        }

        // Applied classes against bare primitives, and back.
        match (left, right) {
            (Type::Parametric { .. } | Type::Meta(_), Type::Primitive(_)) => {
                let (primitive, _) = left.split();
                return self.less_or_equal(&primitive, right);
            }
            (Type::Primitive(name), Type::Parametric { .. } | Type::Meta(_)) => {
                return self.less_or_equal(
                    &Type::Parametric {
                        name: name.clone(),
                        parameters: vec![],
                    },
                    right,
                );
            }
            _ => {}
        }

        // Anything else against a callable goes through the Callable
        // ancestor: if joining with `typing.Callable[Bottom]` recovers a
        // callable parameter, compare that.
        if matches!(right, Type::Callable(_)) {
            let callable_bottom = Type::parametric(names::CALLABLE, vec![Type::Bottom]);
            let joined = self.join_impl(left, &callable_bottom)?;
            if let Type::Parametric { name, parameters } = &joined {
                if name == names::CALLABLE && parameters.len() == 1 {
                    return self.less_or_equal(&parameters[0], right);
                }
            }
            return Ok(false);
        }

        // A callable against a nominal type needs the protocol witness.
        match (left, right) {
            (Type::Callable(_), Type::Parametric { name, .. }) => {
                return match self.host.implements(right, left) {
                    ImplementsResult::Implements { parameters } => self.less_or_equal(
                        &Type::Parametric {
                            name: name.clone(),
                            parameters,
                        },
                        right,
                    ),
                    ImplementsResult::DoesNotImplement => Ok(false),
                };
            }
            (Type::Callable(_), Type::Primitive(_)) => {
                return match self.host.implements(right, left) {
                    ImplementsResult::Implements { parameters } => Ok(parameters.is_empty()),
                    ImplementsResult::DoesNotImplement => Ok(false),
                };
            }
            _ => {}
        }

        // Typed dictionaries: totality must agree and every field of the
        // supertype must appear identically; against anything else they act
        // as their nominal carrier.
        match (left, right) {
            (Type::TypedDictionary(left_dictionary), Type::TypedDictionary(right_dictionary)) => {
                if left_dictionary.total != right_dictionary.total {
                    return Ok(false);
                }
                return Ok(right_dictionary
                    .fields
                    .iter()
                    .all(|field| left_dictionary.fields.contains(field)));
            }
            (Type::TypedDictionary(_), _) => {
                let (primitive, _) = left.split();
                return self.less_or_equal(&primitive, right);
            }
            (_, Type::TypedDictionary(_)) => {
                let (primitive, _) = right.split();
                return self.less_or_equal(left, &primitive);
            }
            _ => {}
        }

        // Literals weaken to their carriers; a bare literal is never a
        // supertype of a non-literal.
        if matches!(left, Type::Literal(_)) {
            return self.less_or_equal(&left.weaken_literals(), right);
        }
        if matches!(right, Type::Literal(_)) {
            return Ok(false);
        }

        // Fallback: nominal reachability.
        let (left_primitive, _) = left.split();
        let (right_primitive, _) = right.split();
        let start = self.handler.index_of(&left_primitive)?;
        let goal = self.handler.index_of(&right_primitive)?;
        Ok(self.handler.reachable(start, goal))
    }

    fn parametric_less_or_equal(
        &self,
        left: &Type,
        right: &Type,
    ) -> Result<bool, TypeOrderError> {
        let (left_primitive, left_parameters) = left.split();
        let (right_primitive, right_parameters) = right.split();

        if left_primitive == right_primitive {
            return self.parameters_less_or_equal(
                &right_primitive,
                &left_parameters,
                &right_parameters,
            );
        }

        // Climb into the instantiated immediate superclasses.
        let index = self.handler.index_of(&left_primitive)?;
        for successor in self
            .handler
            .get_instantiated_successors(index, &left_parameters)?
        {
            let successor_type = match self.handler.annotation_of(successor.target)? {
                Type::Primitive(name) => {
                    if successor.parameters.is_empty() {
                        Type::Primitive(name)
                    } else {
                        Type::Parametric {
                            name,
                            parameters: successor.parameters,
                        }
                    }
                }
                other => other,
            };
            if self.less_or_equal(&successor_type, right)? {
                return Ok(true);
            }
        }

        // Step sideways: rewrite the parameters along the hierarchy into
        // the right-hand class and compare under its variance.
        if let Some(propagated) = self.instantiate_successors_parameters(left, &right_primitive)? {
            return self.parameters_less_or_equal(
                &right_primitive,
                &propagated,
                &right_parameters,
            );
        }
        Ok(false)
    }

    /// Componentwise comparison under the declared variance of the
    /// superclass. A declaration/application arity mismatch compares
    /// invariantly.
    pub(crate) fn parameters_less_or_equal(
        &self,
        primitive: &Type,
        left_parameters: &[Type],
        right_parameters: &[Type],
    ) -> Result<bool, TypeOrderError> {
        if left_parameters.len() != right_parameters.len() {
            return Ok(false);
        }
        if left_parameters.is_empty() {
            return Ok(true);
        }
        let declared = self.handler.variables(primitive)?.unwrap_or_default();
        let declaration_matches = declared.len() == left_parameters.len();
        for (position, (left, right)) in left_parameters
            .iter()
            .zip(right_parameters.iter())
            .enumerate()
        {
            let variance = if declaration_matches {
                match declared.get(position) {
                    Some(Type::Variable(variable)) => variable.variance,
                    _ => Variance::Invariant,
                }
            } else {
                Variance::Invariant
            };
            let holds = match variance {
                Variance::Covariant => self.less_or_equal(left, right)?,
                Variance::Contravariant => self.less_or_equal(right, left)?,
                Variance::Invariant => {
                    self.less_or_equal(left, right)? && self.less_or_equal(right, left)?
                }
            };
            if !holds {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn tuple_less_or_equal(
        &self,
        left: &Tuple,
        right: &Tuple,
    ) -> Result<bool, TypeOrderError> {
        match (left, right) {
            (Tuple::Bounded(left_elements), Tuple::Bounded(right_elements)) => {
                if left_elements.len() != right_elements.len() {
                    return Ok(false);
                }
                for (left_element, right_element) in
                    left_elements.iter().zip(right_elements.iter())
                {
                    if !self.less_or_equal(left_element, right_element)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            (Tuple::Unbounded(left_element), Tuple::Unbounded(right_element)) => {
                self.less_or_equal(left_element, right_element)
            }
            (Tuple::Bounded(left_elements), Tuple::Unbounded(right_element)) => {
                if left_elements.is_empty() {
                    return Ok(true);
                }
                let joined = self.join_all(left_elements)?;
                self.less_or_equal(&joined, right_element)
            }
            (Tuple::Unbounded(_), Tuple::Bounded(_)) => Ok(false),
        }
    }
}

#[cfg(test)]
#[path = "tests/subtype_tests.rs"]
mod tests;
