//! Signature simulation: matching a callable against a call shape.

use crate::order::error::TypeOrderError;
use crate::order::solve::ConstraintMap;
use crate::order::store::OrderStore;
use crate::order::{Host, Order};
use crate::types::{Callable, Overload, Parameter, Parameters, Type};

/// Parameter names match when equal, when either side is an anonymous
/// positional (`$`-prefixed), or when they differ only in leading
/// underscores.
pub(crate) fn names_compatible(left: &str, right: &str) -> bool {
    if left == right {
        return true;
    }
    if left.starts_with('$') || right.starts_with('$') {
        return true;
    }
    left.trim_start_matches('_') == right.trim_start_matches('_')
}

fn is_anonymous(name: &str) -> bool {
    name.starts_with('$')
}

fn overload_free_variables(overload: &Overload) -> Vec<Type> {
    let mut variables = overload.annotation.free_variables();
    if let Parameters::Defined(parameters) = &overload.parameters {
        for parameter in parameters {
            for variable in parameter.annotation().free_variables() {
                if !variables.contains(&variable) {
                    variables.push(variable);
                }
            }
        }
    }
    variables
}

fn instantiate_overload(overload: &Overload, constraints: &ConstraintMap) -> Overload {
    Overload {
        annotation: overload.annotation.instantiate(constraints),
        parameters: match &overload.parameters {
            Parameters::Undefined => Parameters::Undefined,
            Parameters::Defined(parameters) => Parameters::Defined(
                parameters
                    .iter()
                    .map(|parameter| {
                        parameter.with_annotation(parameter.annotation().instantiate(constraints))
                    })
                    .collect(),
            ),
        },
    }
}

impl<'a, S: OrderStore, H: Host> Order<'a, S, H> {
    /// Match `callable` against a call site shaped like `called_as` and
    /// produce the selected signature with its variables bound.
    ///
    /// Overloads are tried in order, followed by the implementation when it
    /// declares parameters; with no overloads the implementation stands
    /// alone. Every free variable starts at `Bottom` so repeated bindings
    /// accumulate through `join`.
    pub fn simulate_signature_select(
        &self,
        callable: &Callable,
        called_as: &Overload,
    ) -> Result<Option<Overload>, TypeOrderError> {
        let mut candidates: Vec<&Overload> = Vec::new();
        if callable.overloads.is_empty() {
            candidates.push(&callable.implementation);
        } else {
            candidates.extend(callable.overloads.iter());
            if matches!(callable.implementation.parameters, Parameters::Defined(_)) {
                candidates.push(&callable.implementation);
            }
        }

        for overload in candidates {
            let mut constraints = ConstraintMap::default();
            for variable in overload_free_variables(overload) {
                constraints.insert(variable, Type::Bottom);
            }
            let solved = match (&overload.parameters, &called_as.parameters) {
                (Parameters::Defined(lefts), Parameters::Defined(rights)) => {
                    self.solve_parameters(lefts, rights, constraints)?
                }
                // An undefined side constrains nothing.
                _ => Some(constraints),
            };
            if let Some(constraints) = solved {
                return Ok(Some(instantiate_overload(overload, &constraints)));
            }
        }
        Ok(None)
    }

    /// Walk the implementation parameters (left) against the call-site
    /// parameters (right) positionally, accumulating constraints.
    fn solve_parameters(
        &self,
        lefts: &[Parameter],
        rights: &[Parameter],
        constraints: ConstraintMap,
    ) -> Result<Option<ConstraintMap>, TypeOrderError> {
        match (lefts.first(), rights.first()) {
            (None, None) => Ok(Some(constraints)),
            (
                Some(Parameter::Named {
                    name: left_name,
                    annotation: left_annotation,
                    ..
                }),
                Some(Parameter::Named {
                    name: right_name,
                    annotation: right_annotation,
                    ..
                }),
            ) if names_compatible(left_name, right_name) => {
                match self.solve_constraints_impl(&constraints, right_annotation, left_annotation)? {
                    Some(updated) => self.solve_parameters(&lefts[1..], &rights[1..], updated),
                    None => Ok(None),
                }
            }
            (
                Some(Parameter::Variable {
                    annotation: left_annotation,
                    ..
                }),
                Some(Parameter::Variable {
                    annotation: right_annotation,
                    ..
                }),
            )
            | (
                Some(Parameter::Keywords {
                    annotation: left_annotation,
                    ..
                }),
                Some(Parameter::Keywords {
                    annotation: right_annotation,
                    ..
                }),
            ) => match self.solve_constraints_impl(&constraints, right_annotation, left_annotation)? {
                Some(updated) => self.solve_parameters(&lefts[1..], &rights[1..], updated),
                None => Ok(None),
            },
            // An anonymous positional argument is swallowed by *args; the
            // starred parameter stays available for the rest.
            (
                Some(Parameter::Variable {
                    annotation: left_annotation,
                    ..
                }),
                Some(Parameter::Named {
                    name,
                    annotation: right_annotation,
                    ..
                }),
            ) if is_anonymous(name) => {
                match self.solve_constraints_impl(&constraints, right_annotation, left_annotation)? {
                    Some(updated) => self.solve_parameters(lefts, &rights[1..], updated),
                    None => Ok(None),
                }
            }
            // Trailing *args/**kwargs with nothing left to consume.
            (Some(Parameter::Variable { .. }), None) | (Some(Parameter::Keywords { .. }), None) => {
                self.solve_parameters(&lefts[1..], rights, constraints)
            }
            // Trailing defaulted parameters are satisfied implicitly.
            (Some(Parameter::Named { default: true, .. }), None) => {
                self.solve_parameters(&lefts[1..], rights, constraints)
            }
            _ => self.solve_parameters_compound(lefts, rights, constraints),
        }
    }

    /// The `*args`/`**kwargs` pair absorbing a run of named arguments: when
    /// both carry the same annotation and every remaining argument is a
    /// named subtype of it, both sides are consumed at once. Implementation
    /// parameters after the pair are not revisited.
    fn solve_parameters_compound(
        &self,
        lefts: &[Parameter],
        rights: &[Parameter],
        constraints: ConstraintMap,
    ) -> Result<Option<ConstraintMap>, TypeOrderError> {
        let (
            Some(Parameter::Variable {
                annotation: variable_annotation,
                ..
            }),
            Some(Parameter::Keywords {
                annotation: keywords_annotation,
                ..
            }),
        ) = (lefts.first(), lefts.get(1))
        else {
            return Ok(None);
        };
        if rights.is_empty()
            || variable_annotation != keywords_annotation
            || !rights
                .iter()
                .all(|right| matches!(right, Parameter::Named { .. }))
        {
            return Ok(None);
        }
        for right in rights {
            if !self.less_or_equal(right.annotation(), keywords_annotation)? {
                return Ok(None);
            }
        }
        Ok(Some(constraints))
    }
}

#[cfg(test)]
#[path = "tests/signature_tests.rs"]
mod tests;
