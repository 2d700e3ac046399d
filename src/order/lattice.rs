//! Join and meet over the order.

use crate::order::error::TypeOrderError;
use crate::order::signature::names_compatible;
use crate::order::store::OrderStore;
use crate::order::traversal::Direction;
use crate::order::{Host, Order};
use crate::types::{
    names, Callable, CallableKind, Constraints, Overload, Parameter, Parameters, Tuple, Type,
    TypedDictionary, Variance,
};

/// Which lattice operation `join_implementations` serves: joining callables
/// meets their parameters, meeting callables joins them.
#[derive(Copy, Clone, PartialEq, Eq)]
enum LatticeDirection {
    Join,
    Meet,
}

fn nominal_or_primitive(annotation: &Type) -> bool {
    matches!(
        annotation,
        Type::Primitive(_) | Type::Parametric { .. } | Type::Meta(_)
    )
}

fn variance_of(declared: &Type) -> Variance {
    match declared {
        Type::Variable(variable) => variable.variance,
        _ => Variance::Invariant,
    }
}

impl<'a, S: OrderStore, H: Host> Order<'a, S, H> {
    /// Least upper bound. An untracked class anywhere degrades to `Any`.
    pub fn join(&self, left: &Type, right: &Type) -> Result<Type, TypeOrderError> {
        match self.join_impl(left, right) {
            Err(TypeOrderError::Untracked(_)) => Ok(Type::Any),
            other => other,
        }
    }

    /// Greatest lower bound. An untracked class anywhere degrades to
    /// `Bottom`.
    pub fn meet(&self, left: &Type, right: &Type) -> Result<Type, TypeOrderError> {
        match self.meet_impl(left, right) {
            Err(TypeOrderError::Untracked(_)) => Ok(Type::Bottom),
            other => other,
        }
    }

    /// Fixed-point widening: past the threshold, give up and answer `Top`.
    pub fn widen(
        &self,
        previous: &Type,
        next: &Type,
        iteration: u64,
        threshold: u64,
    ) -> Result<Type, TypeOrderError> {
        if iteration > threshold {
            Ok(Type::Top)
        } else {
            self.join(previous, next)
        }
    }

    /// Fold `join` over a list, starting from `Bottom`.
    pub(crate) fn join_all(&self, elements: &[Type]) -> Result<Type, TypeOrderError> {
        let mut joined = Type::Bottom;
        for element in elements {
            joined = self.join_impl(&joined, element)?;
        }
        Ok(joined)
    }

    pub(crate) fn join_impl(&self, left: &Type, right: &Type) -> Result<Type, TypeOrderError> {
        if left == right {
            return Ok(left.clone());
        }

        // Sentinels.
        match (left, right) {
            (Type::Top, _) | (_, Type::Top) => return Ok(Type::Top),
            (Type::Any, _) | (_, Type::Any) => return Ok(Type::Any),
            (Type::Bottom, other) | (other, Type::Bottom) => return Ok(other.clone()),
            (Type::Undeclared, other) | (other, Type::Undeclared) => {
                return Ok(Type::union(vec![Type::Undeclared, other.clone()]));
            }
            _ => {}
        }

        // Unions, including the optional-of-union shapes.
        match (left, right) {
            (Type::Union(left_members), Type::Union(right_members)) => {
                return Ok(Type::union(
                    left_members.iter().chain(right_members).cloned().collect(),
                ));
            }
            (Type::Optional(inner), Type::Union(members))
            | (Type::Union(members), Type::Optional(inner)) => {
                return Ok(Type::optional(Type::union(
                    std::iter::once((**inner).clone())
                        .chain(members.iter().cloned())
                        .collect(),
                )));
            }
            (other, Type::Union(members)) | (Type::Union(members), other) => {
                let union = Type::Union(members.clone());
                return Ok(if self.less_or_equal(other, &union)? {
                    union
                } else {
                    Type::union(
                        std::iter::once(other.clone())
                            .chain(members.iter().cloned())
                            .collect(),
                    )
                });
            }
            _ => {}
        }

        // Type variables reduce to their ground forms.
        match (left, right) {
            (Type::Variable(variable), other) | (other, Type::Variable(variable)) => {
                return match &variable.constraints {
                    Constraints::Bound(bound) => self.join_impl(bound, other),
                    Constraints::Explicit(constraints) => {
                        self.join_impl(&Type::union(constraints.clone()), other)
                    }
                    Constraints::Unconstrained => Ok(Type::union(vec![
                        Type::Variable(variable.clone()),
                        other.clone(),
                    ])),
                };
            }
            _ => {}
        }

        // Optionals absorb.
        match (left, right) {
            (Type::Optional(left_inner), Type::Optional(right_inner)) => {
                return Ok(Type::optional(self.join_impl(left_inner, right_inner)?));
            }
            (Type::Optional(inner), other) | (other, Type::Optional(inner)) => {
                return Ok(Type::optional(self.join_impl(inner, other)?));
            }
            _ => {}
        }

        // Tuples.
        if let (Type::Tuple(left_tuple), Type::Tuple(right_tuple)) = (left, right) {
            return self.join_tuples(left, right, left_tuple, right_tuple);
        }
        match (left, right) {
            (Type::Tuple(tuple), other) | (other, Type::Tuple(tuple))
                if matches!(other, Type::Primitive(_) | Type::Parametric { .. }) =>
            {
                let element = match tuple {
                    Tuple::Bounded(elements) => self.join_all(elements)?,
                    Tuple::Unbounded(element) => (**element).clone(),
                };
                return self.join_impl(&Type::parametric(names::TUPLE, vec![element]), other);
            }
            _ => {}
        }

        // Callables.
        if let (Type::Callable(left_callable), Type::Callable(right_callable)) = (left, right) {
            if let (CallableKind::Named(left_name), CallableKind::Named(right_name)) =
                (&left_callable.kind, &right_callable.kind)
            {
                if left_name == right_name {
                    return Ok(left.clone());
                }
            }
            if left_callable.kind == CallableKind::Anonymous
                && right_callable.kind == CallableKind::Anonymous
                && left_callable.overloads.is_empty()
                && right_callable.overloads.is_empty()
            {
                if let Some(implementation) = self.join_implementations(
                    &left_callable.implementation,
                    &right_callable.implementation,
                    LatticeDirection::Join,
                )? {
                    return Ok(Type::Callable(Box::new(Callable {
                        kind: CallableKind::Anonymous,
                        implementation,
                        overloads: vec![],
                    })));
                }
            }
            return Ok(Type::union(vec![left.clone(), right.clone()]));
        }

        // Typed dictionaries.
        match (left, right) {
            (Type::TypedDictionary(left_dictionary), Type::TypedDictionary(right_dictionary)) => {
                return Ok(self.join_typed_dictionaries(left_dictionary, right_dictionary));
            }
            (Type::TypedDictionary(_), _) => {
                let (primitive, _) = left.split();
                return self.join_impl(&primitive, right);
            }
            (_, Type::TypedDictionary(_)) => {
                let (primitive, _) = right.split();
                return self.join_impl(left, &primitive);
            }
            _ => {}
        }

        // Literals weaken.
        if matches!(left, Type::Literal(_)) || matches!(right, Type::Literal(_)) {
            return self.join_impl(&left.weaken_literals(), &right.weaken_literals());
        }

        // Nominal classes through the hierarchy.
        if nominal_or_primitive(left) && nominal_or_primitive(right) {
            return self.join_nominal(left, right);
        }

        // Anything else: accept the least common ancestor only when it is
        // one of the operands, otherwise answer the plain union.
        let ancestors =
            self.handler
                .least_common_reachable(left, right, Direction::Successors)?;
        match ancestors.first() {
            Some(ancestor) if ancestor == left || ancestor == right => Ok(ancestor.clone()),
            _ => Ok(Type::union(vec![left.clone(), right.clone()])),
        }
    }

    fn join_nominal(&self, left: &Type, right: &Type) -> Result<Type, TypeOrderError> {
        if self.less_or_equal(left, right)? {
            return Ok(right.clone());
        }
        if self.less_or_equal(right, left)? {
            return Ok(left.clone());
        }
        let (left_primitive, _) = left.split();
        let (right_primitive, _) = right.split();
        let ancestors = self.handler.least_common_reachable(
            &left_primitive,
            &right_primitive,
            Direction::Successors,
        )?;
        let Some(target) = ancestors.first() else {
            return Ok(Type::union(vec![left.clone(), right.clone()]));
        };
        if target.is_top() {
            return Ok(Type::Top);
        }
        let declared = self.handler.variables(target)?.unwrap_or_default();
        if declared.is_empty() {
            return Ok(target.clone());
        }
        let left_parameters = self.instantiate_successors_parameters(left, target)?;
        let right_parameters = self.instantiate_successors_parameters(right, target)?;
        match (left_parameters, right_parameters, target) {
            (Some(left_parameters), Some(right_parameters), Type::Primitive(name))
                if left_parameters.len() == declared.len()
                    && right_parameters.len() == declared.len() =>
            {
                let mut parameters = Vec::with_capacity(declared.len());
                for ((declared_variable, left_parameter), right_parameter) in declared
                    .iter()
                    .zip(left_parameters.iter())
                    .zip(right_parameters.iter())
                {
                    parameters.push(match variance_of(declared_variable) {
                        Variance::Covariant => self.join_impl(left_parameter, right_parameter)?,
                        Variance::Contravariant => {
                            self.meet_impl(left_parameter, right_parameter)?
                        }
                        Variance::Invariant => {
                            if left_parameter == right_parameter {
                                left_parameter.clone()
                            } else {
                                Type::Any
                            }
                        }
                    });
                }
                Ok(Type::Parametric {
                    name: name.clone(),
                    parameters,
                })
            }
            _ => Ok(Type::union(vec![left.clone(), right.clone()])),
        }
    }

    fn join_tuples(
        &self,
        left: &Type,
        right: &Type,
        left_tuple: &Tuple,
        right_tuple: &Tuple,
    ) -> Result<Type, TypeOrderError> {
        match (left_tuple, right_tuple) {
            (Tuple::Bounded(left_elements), Tuple::Bounded(right_elements))
                if left_elements.len() == right_elements.len() =>
            {
                let mut joined = Vec::with_capacity(left_elements.len());
                for (left_element, right_element) in
                    left_elements.iter().zip(right_elements.iter())
                {
                    joined.push(self.join_impl(left_element, right_element)?);
                }
                Ok(Type::Tuple(Tuple::Bounded(joined)))
            }
            (Tuple::Unbounded(left_element), Tuple::Unbounded(right_element)) => Ok(Type::Tuple(
                Tuple::Unbounded(Box::new(self.join_impl(left_element, right_element)?)),
            )),
            (Tuple::Bounded(elements), Tuple::Unbounded(element))
            | (Tuple::Unbounded(element), Tuple::Bounded(elements)) => {
                let bounded = self.join_all(elements)?;
                Ok(Type::Tuple(Tuple::Unbounded(Box::new(
                    self.join_impl(&bounded, element)?,
                ))))
            }
            _ => Ok(Type::union(vec![left.clone(), right.clone()])),
        }
    }

    fn join_typed_dictionaries(
        &self,
        left: &TypedDictionary,
        right: &TypedDictionary,
    ) -> Type {
        let mapping_fallback = Type::parametric(
            names::MAPPING,
            vec![Type::primitive("str"), Type::Any],
        );
        if left.total != right.total {
            return mapping_fallback;
        }
        let colliding = left.fields.iter().any(|left_field| {
            right.fields.iter().any(|right_field| {
                right_field.name == left_field.name
                    && right_field.annotation != left_field.annotation
            })
        });
        if colliding {
            return mapping_fallback;
        }
        Type::TypedDictionary(TypedDictionary {
            fields: left
                .fields
                .iter()
                .filter(|field| right.fields.contains(field))
                .cloned()
                .collect(),
            total: left.total,
        })
    }

    pub(crate) fn meet_impl(&self, left: &Type, right: &Type) -> Result<Type, TypeOrderError> {
        if left == right {
            return Ok(left.clone());
        }

        // Sentinels.
        match (left, right) {
            (Type::Top, other) | (other, Type::Top) => return Ok(other.clone()),
            (Type::Any, other) | (other, Type::Any) => return Ok(other.clone()),
            (Type::Bottom, _) | (_, Type::Bottom) => return Ok(Type::Bottom),
            (Type::Undeclared, _) | (_, Type::Undeclared) => return Ok(Type::Bottom),
            _ => {}
        }

        // Unions distribute.
        match (left, right) {
            (Type::Union(members), other) | (other, Type::Union(members)) => {
                let mut met = Vec::with_capacity(members.len());
                for member in members {
                    met.push(self.meet_impl(member, other)?);
                }
                return Ok(Type::union(met));
            }
            _ => {}
        }

        // Optionals.
        match (left, right) {
            (Type::Optional(left_inner), Type::Optional(right_inner)) => {
                return Ok(Type::optional(self.meet_impl(left_inner, right_inner)?));
            }
            (Type::Optional(inner), other) | (other, Type::Optional(inner)) => {
                return self.meet_impl(inner, other);
            }
            _ => {}
        }

        // Variables collapse.
        if matches!(left, Type::Variable(_)) || matches!(right, Type::Variable(_)) {
            return Ok(Type::Bottom);
        }

        // Tuples.
        if let (Type::Tuple(left_tuple), Type::Tuple(right_tuple)) = (left, right) {
            return match (left_tuple, right_tuple) {
                (Tuple::Bounded(left_elements), Tuple::Bounded(right_elements))
                    if left_elements.len() == right_elements.len() =>
                {
                    let mut met = Vec::with_capacity(left_elements.len());
                    for (left_element, right_element) in
                        left_elements.iter().zip(right_elements.iter())
                    {
                        met.push(self.meet_impl(left_element, right_element)?);
                    }
                    Ok(Type::Tuple(Tuple::Bounded(met)))
                }
                (Tuple::Unbounded(left_element), Tuple::Unbounded(right_element)) => {
                    Ok(Type::Tuple(Tuple::Unbounded(Box::new(
                        self.meet_impl(left_element, right_element)?,
                    ))))
                }
                (Tuple::Bounded(elements), Tuple::Unbounded(element))
                | (Tuple::Unbounded(element), Tuple::Bounded(elements)) => {
                    let mut met = Vec::with_capacity(elements.len());
                    for bounded_element in elements {
                        met.push(self.meet_impl(bounded_element, element)?);
                    }
                    Ok(Type::Tuple(Tuple::Bounded(met)))
                }
                _ => Ok(Type::Bottom),
            };
        }

        // Callables.
        match (left, right) {
            (Type::Callable(left_callable), Type::Callable(right_callable)) => {
                if let (CallableKind::Named(left_name), CallableKind::Named(right_name)) =
                    (&left_callable.kind, &right_callable.kind)
                {
                    if left_name == right_name {
                        return Ok(left.clone());
                    }
                }
                if left_callable.kind == CallableKind::Anonymous
                    && right_callable.kind == CallableKind::Anonymous
                    && left_callable.overloads.is_empty()
                    && right_callable.overloads.is_empty()
                {
                    if let Some(implementation) = self.join_implementations(
                        &left_callable.implementation,
                        &right_callable.implementation,
                        LatticeDirection::Meet,
                    )? {
                        return Ok(Type::Callable(Box::new(Callable {
                            kind: CallableKind::Anonymous,
                            implementation,
                            overloads: vec![],
                        })));
                    }
                }
                return Ok(Type::Bottom);
            }
            (Type::Callable(_), _) | (_, Type::Callable(_)) => return Ok(Type::Bottom),
            _ => {}
        }

        // Typed dictionaries.
        match (left, right) {
            (Type::TypedDictionary(left_dictionary), Type::TypedDictionary(right_dictionary)) => {
                return Ok(meet_typed_dictionaries(left_dictionary, right_dictionary));
            }
            (Type::TypedDictionary(_), _) => {
                let (primitive, _) = left.split();
                return self.meet_impl(&primitive, right);
            }
            (_, Type::TypedDictionary(_)) => {
                let (primitive, _) = right.split();
                return self.meet_impl(left, &primitive);
            }
            _ => {}
        }

        // Ordered operands answer themselves; otherwise the unique greatest
        // lower bound from the graph, or Bottom.
        if self.less_or_equal(left, right)? {
            return Ok(left.clone());
        }
        if self.less_or_equal(right, left)? {
            return Ok(right.clone());
        }
        let descendants =
            self.handler
                .least_common_reachable(left, right, Direction::Predecessors)?;
        if descendants.len() == 1 {
            Ok(descendants[0].clone())
        } else {
            Ok(Type::Bottom)
        }
    }

    /// Merge two aligned implementations: parameter lists must agree in
    /// kind, compatible names and defaults; the result keeps the left
    /// operand's structure apart from annotations.
    fn join_implementations(
        &self,
        left: &Overload,
        right: &Overload,
        direction: LatticeDirection,
    ) -> Result<Option<Overload>, TypeOrderError> {
        let parameters = match (&left.parameters, &right.parameters) {
            (Parameters::Undefined, Parameters::Undefined) => Some(Parameters::Undefined),
            (Parameters::Defined(left_parameters), Parameters::Defined(right_parameters))
                if left_parameters.len() == right_parameters.len() =>
            {
                let mut combined = Vec::with_capacity(left_parameters.len());
                let mut aligned = true;
                for (left_parameter, right_parameter) in
                    left_parameters.iter().zip(right_parameters.iter())
                {
                    let compatible = match (left_parameter, right_parameter) {
                        (
                            Parameter::Named {
                                name: left_name,
                                default: left_default,
                                ..
                            },
                            Parameter::Named {
                                name: right_name,
                                default: right_default,
                                ..
                            },
                        ) => names_compatible(left_name, right_name) && left_default == right_default,
                        (
                            Parameter::Variable { name: left_name, .. },
                            Parameter::Variable { name: right_name, .. },
                        )
                        | (
                            Parameter::Keywords { name: left_name, .. },
                            Parameter::Keywords { name: right_name, .. },
                        ) => names_compatible(left_name, right_name),
                        _ => false,
                    };
                    if !compatible {
                        aligned = false;
                        break;
                    }
                    // Parameters are contravariant: meet them when joining.
                    let annotation = match direction {
                        LatticeDirection::Join => self.meet_impl(
                            left_parameter.annotation(),
                            right_parameter.annotation(),
                        )?,
                        LatticeDirection::Meet => self.join_impl(
                            left_parameter.annotation(),
                            right_parameter.annotation(),
                        )?,
                    };
                    combined.push(left_parameter.with_annotation(annotation));
                }
                if aligned {
                    Some(Parameters::Defined(combined))
                } else {
                    None
                }
            }
            _ => None,
        };
        let Some(parameters) = parameters else {
            return Ok(None);
        };
        let annotation = match direction {
            LatticeDirection::Join => self.join_impl(&left.annotation, &right.annotation)?,
            LatticeDirection::Meet => self.meet_impl(&left.annotation, &right.annotation)?,
        };
        Ok(Some(Overload {
            annotation,
            parameters,
        }))
    }
}

fn meet_typed_dictionaries(left: &TypedDictionary, right: &TypedDictionary) -> Type {
    if left.total != right.total {
        return Type::Bottom;
    }
    let colliding = left.fields.iter().any(|left_field| {
        right.fields.iter().any(|right_field| {
            right_field.name == left_field.name && right_field.annotation != left_field.annotation
        })
    });
    if colliding {
        return Type::Bottom;
    }
    let mut fields = left.fields.clone();
    for field in &right.fields {
        if !fields.contains(field) {
            fields.push(field.clone());
        }
    }
    Type::TypedDictionary(TypedDictionary {
        fields,
        total: left.total,
    })
}

#[cfg(test)]
#[path = "tests/lattice_tests.rs"]
mod tests;
