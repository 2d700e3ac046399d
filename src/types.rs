//! Type terms for the order engine.
//!
//! Types are immutable tree values compared structurally. The engine's graph
//! keys its vertices by whole terms, so everything here derives `Eq`, `Ord`
//! and `Hash`; `Ord` additionally gives hygiene passes and union
//! canonicalization a deterministic sort.

use rustc_hash::FxHashMap;
use serde::Serialize;
use smol_str::SmolStr;
use std::fmt;

/// Canonical dotted name of a class or type variable.
pub type Identifier = SmolStr;

/// Well-known primitive names the engine treats specially.
pub mod names {
    pub const OBJECT: &str = "object";
    pub const TYPE: &str = "type";
    pub const TUPLE: &str = "tuple";
    pub const CALLABLE: &str = "typing.Callable";
    pub const GENERIC: &str = "typing.Generic";
    pub const OPTIONAL: &str = "typing.Optional";
    pub const UNION: &str = "typing.Union";
    pub const MAPPING: &str = "typing.Mapping";
    pub const TYPED_DICTIONARY: &str = "TypedDictionary";
    pub const NON_TOTAL_TYPED_DICTIONARY: &str = "NonTotalTypedDictionary";
}

/// Prefix given to type variables that are provisionally bound during
/// signature simulation. Marked variables are not collected as free.
const BOUND_MARKER: &str = "$bound$";

/// Declared variance of a type variable.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Variance {
    Invariant,
    Covariant,
    Contravariant,
}

/// Constraints attached to a type variable declaration.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Constraints {
    Unconstrained,
    Bound(Box<Type>),
    Explicit(Vec<Type>),
}

/// A type variable with its declaration-site constraints and variance.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct TypeVar {
    pub name: Identifier,
    pub constraints: Constraints,
    pub variance: Variance,
}

impl TypeVar {
    pub fn new(name: impl Into<Identifier>) -> Self {
        TypeVar {
            name: name.into(),
            constraints: Constraints::Unconstrained,
            variance: Variance::Invariant,
        }
    }

    pub fn is_marked(&self) -> bool {
        self.name.starts_with(BOUND_MARKER)
    }

    pub(crate) fn marked(&self) -> Self {
        TypeVar {
            name: SmolStr::new(format!("{}{}", BOUND_MARKER, self.name)),
            constraints: self.constraints.clone(),
            variance: self.variance,
        }
    }

    pub(crate) fn unmarked(&self) -> Self {
        let name = self
            .name
            .strip_prefix(BOUND_MARKER)
            .map(SmolStr::new)
            .unwrap_or_else(|| self.name.clone());
        TypeVar {
            name,
            constraints: self.constraints.clone(),
            variance: self.variance,
        }
    }
}

/// Tuple forms: a fixed shape or a homogeneous unbounded sequence.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Tuple {
    Bounded(Vec<Type>),
    Unbounded(Box<Type>),
}

/// Identity of a callable: a known qualified name or an anonymous lambda.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum CallableKind {
    Anonymous,
    Named(Identifier),
}

/// A single parameter of a callable signature.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Parameter {
    Named {
        name: Identifier,
        annotation: Type,
        default: bool,
    },
    /// Starred parameter collecting excess positionals.
    Variable { name: Identifier, annotation: Type },
    /// Double-starred parameter collecting excess keywords.
    Keywords { name: Identifier, annotation: Type },
}

impl Parameter {
    pub fn annotation(&self) -> &Type {
        match self {
            Parameter::Named { annotation, .. }
            | Parameter::Variable { annotation, .. }
            | Parameter::Keywords { annotation, .. } => annotation,
        }
    }

    pub(crate) fn with_annotation(&self, annotation: Type) -> Parameter {
        match self {
            Parameter::Named { name, default, .. } => Parameter::Named {
                name: name.clone(),
                annotation,
                default: *default,
            },
            Parameter::Variable { name, .. } => Parameter::Variable {
                name: name.clone(),
                annotation,
            },
            Parameter::Keywords { name, .. } => Parameter::Keywords {
                name: name.clone(),
                annotation,
            },
        }
    }
}

/// Parameter list of an overload; `Undefined` means the signature does not
/// constrain its parameters at all.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Parameters {
    Undefined,
    Defined(Vec<Parameter>),
}

/// One signature of a callable: parameters and return annotation.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Overload {
    pub annotation: Type,
    pub parameters: Parameters,
}

/// A callable with an implementation signature and optional overloads.
/// Overload order matters for selection.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Callable {
    pub kind: CallableKind,
    pub implementation: Overload,
    pub overloads: Vec<Overload>,
}

/// A single field of a typed dictionary.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Field {
    pub name: Identifier,
    pub annotation: Type,
}

/// A typed dictionary: named fields, total or not.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct TypedDictionary {
    pub fields: Vec<Field>,
    pub total: bool,
}

/// Literal types and their carrier primitives.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Literal {
    Boolean(bool),
    Integer(i64),
    String(Identifier),
}

impl Literal {
    /// The nominal class a literal weakens to.
    pub fn carrier(&self) -> &'static str {
        match self {
            Literal::Boolean(_) => "bool",
            Literal::Integer(_) => "int",
            Literal::String(_) => "str",
        }
    }
}

/// A type term.
///
/// `Bottom`/`Top`/`Any`/`Undeclared` are sentinels with fixed lattice
/// positions. `Primitive` is a nominal class; `Parametric` a class applied
/// to parameters. `Meta(T)` is the type object of `T` and splits as
/// `type[T]` so it participates in the parametric rules.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Type {
    Bottom,
    Top,
    Any,
    Undeclared,
    Primitive(Identifier),
    Parametric {
        name: Identifier,
        parameters: Vec<Type>,
    },
    Variable(TypeVar),
    Optional(Box<Type>),
    Union(Vec<Type>),
    Tuple(Tuple),
    Callable(Box<Callable>),
    TypedDictionary(TypedDictionary),
    Literal(Literal),
    Meta(Box<Type>),
}

impl Type {
    // =========================================================================
    // Constructors
    // =========================================================================

    pub fn primitive(name: impl Into<Identifier>) -> Type {
        Type::Primitive(name.into())
    }

    pub fn parametric(name: impl Into<Identifier>, parameters: Vec<Type>) -> Type {
        Type::Parametric {
            name: name.into(),
            parameters,
        }
    }

    /// An unconstrained invariant type variable.
    pub fn variable(name: impl Into<Identifier>) -> Type {
        Type::Variable(TypeVar::new(name))
    }

    pub fn optional(inner: Type) -> Type {
        Type::Optional(Box::new(inner))
    }

    pub fn meta(inner: Type) -> Type {
        Type::Meta(Box::new(inner))
    }

    pub fn bounded_tuple(elements: Vec<Type>) -> Type {
        Type::Tuple(Tuple::Bounded(elements))
    }

    pub fn unbounded_tuple(element: Type) -> Type {
        Type::Tuple(Tuple::Unbounded(Box::new(element)))
    }

    pub fn literal_integer(value: i64) -> Type {
        Type::Literal(Literal::Integer(value))
    }

    pub fn literal_string(value: impl Into<Identifier>) -> Type {
        Type::Literal(Literal::String(value.into()))
    }

    pub fn literal_boolean(value: bool) -> Type {
        Type::Literal(Literal::Boolean(value))
    }

    /// An anonymous callable with a single defined signature.
    pub fn lambda(parameters: Vec<Parameter>, annotation: Type) -> Type {
        Type::Callable(Box::new(Callable {
            kind: CallableKind::Anonymous,
            implementation: Overload {
                annotation,
                parameters: Parameters::Defined(parameters),
            },
            overloads: Vec::new(),
        }))
    }

    /// A named callable with a single defined signature.
    pub fn named_callable(
        name: impl Into<Identifier>,
        parameters: Vec<Parameter>,
        annotation: Type,
    ) -> Type {
        Type::Callable(Box::new(Callable {
            kind: CallableKind::Named(name.into()),
            implementation: Overload {
                annotation,
                parameters: Parameters::Defined(parameters),
            },
            overloads: Vec::new(),
        }))
    }

    /// Canonical union: flattens nested unions, drops `Bottom` members,
    /// sorts and deduplicates, and collapses trivial shapes. Sorting is what
    /// keeps union-producing operations commutative up to structural
    /// equality.
    pub fn union(members: Vec<Type>) -> Type {
        fn flatten(members: Vec<Type>, into: &mut Vec<Type>) {
            for member in members {
                match member {
                    Type::Union(nested) => flatten(nested, into),
                    Type::Bottom => {}
                    other => into.push(other),
                }
            }
        }

        let mut flat = Vec::new();
        flatten(members, &mut flat);
        flat.sort();
        flat.dedup();
        match flat.len() {
            0 => Type::Bottom,
            1 => flat.into_iter().next().expect("length checked"),
            _ => Type::Union(flat),
        }
    }

    // =========================================================================
    // Predicates and accessors
    // =========================================================================

    pub fn is_any(&self) -> bool {
        matches!(self, Type::Any)
    }

    pub fn is_top(&self) -> bool {
        matches!(self, Type::Top)
    }

    pub fn is_bottom(&self) -> bool {
        matches!(self, Type::Bottom)
    }

    pub fn is_meta(&self) -> bool {
        matches!(self, Type::Meta(_))
    }

    /// The nominal name of a primitive or parametric term.
    pub fn primitive_name(&self) -> Option<&str> {
        match self {
            Type::Primitive(name) | Type::Parametric { name, .. } => Some(name.as_str()),
            Type::Meta(_) => Some(names::TYPE),
            _ => None,
        }
    }

    /// The sole parameter of a meta type or one-parameter parametric.
    pub fn single_parameter(&self) -> Option<&Type> {
        match self {
            Type::Meta(inner) => Some(inner),
            Type::Parametric { parameters, .. } if parameters.len() == 1 => Some(&parameters[0]),
            _ => None,
        }
    }

    /// Decompose a term into its nominal primitive and parameter list.
    /// Scalars split as themselves with no parameters.
    pub fn split(&self) -> (Type, Vec<Type>) {
        match self {
            Type::Parametric { name, parameters } => {
                (Type::Primitive(name.clone()), parameters.clone())
            }
            Type::Meta(inner) => (Type::primitive(names::TYPE), vec![(**inner).clone()]),
            Type::Tuple(Tuple::Bounded(elements)) => {
                (Type::primitive(names::TUPLE), elements.clone())
            }
            Type::Tuple(Tuple::Unbounded(element)) => {
                (Type::primitive(names::TUPLE), vec![(**element).clone()])
            }
            Type::Optional(inner) => (Type::primitive(names::OPTIONAL), vec![(**inner).clone()]),
            Type::Union(members) => (Type::primitive(names::UNION), members.clone()),
            Type::Callable(callable) => (
                Type::primitive(names::CALLABLE),
                vec![callable.implementation.annotation.clone()],
            ),
            Type::TypedDictionary(dictionary) => {
                let name = if dictionary.total {
                    names::TYPED_DICTIONARY
                } else {
                    names::NON_TOTAL_TYPED_DICTIONARY
                };
                (Type::primitive(name), vec![])
            }
            Type::Literal(literal) => (Type::primitive(literal.carrier()), vec![]),
            _ => (self.clone(), vec![]),
        }
    }

    // =========================================================================
    // Structural traversal
    // =========================================================================

    /// True if `predicate` holds for this term or any subterm. Does not
    /// descend into type-variable constraint declarations.
    pub fn exists(&self, predicate: &mut dyn FnMut(&Type) -> bool) -> bool {
        if predicate(self) {
            return true;
        }
        match self {
            Type::Bottom
            | Type::Top
            | Type::Any
            | Type::Undeclared
            | Type::Primitive(_)
            | Type::Variable(_)
            | Type::Literal(_) => false,
            Type::Parametric { parameters, .. } => {
                for parameter in parameters {
                    if parameter.exists(&mut *predicate) {
                        return true;
                    }
                }
                false
            }
            Type::Optional(inner) | Type::Meta(inner) => inner.exists(predicate),
            Type::Union(members) => {
                for member in members {
                    if member.exists(&mut *predicate) {
                        return true;
                    }
                }
                false
            }
            Type::Tuple(Tuple::Bounded(elements)) => {
                for element in elements {
                    if element.exists(&mut *predicate) {
                        return true;
                    }
                }
                false
            }
            Type::Tuple(Tuple::Unbounded(element)) => element.exists(predicate),
            Type::Callable(callable) => {
                if overload_exists(&callable.implementation, predicate) {
                    return true;
                }
                for overload in &callable.overloads {
                    if overload_exists(overload, &mut *predicate) {
                        return true;
                    }
                }
                false
            }
            Type::TypedDictionary(dictionary) => {
                for field in &dictionary.fields {
                    if field.annotation.exists(&mut *predicate) {
                        return true;
                    }
                }
                false
            }
        }
    }

    /// Rebuild the term, replacing every subterm for which `f` produces a
    /// replacement; replaced subterms are not descended into. Unions are
    /// re-canonicalized on the way out.
    pub fn transform(&self, f: &mut dyn FnMut(&Type) -> Option<Type>) -> Type {
        if let Some(replacement) = f(self) {
            return replacement;
        }
        match self {
            Type::Bottom
            | Type::Top
            | Type::Any
            | Type::Undeclared
            | Type::Primitive(_)
            | Type::Variable(_)
            | Type::Literal(_) => self.clone(),
            Type::Parametric { name, parameters } => Type::Parametric {
                name: name.clone(),
                parameters: parameters.iter().map(|p| p.transform(&mut *f)).collect(),
            },
            Type::Optional(inner) => Type::Optional(Box::new(inner.transform(f))),
            Type::Meta(inner) => Type::Meta(Box::new(inner.transform(f))),
            Type::Union(members) => {
                Type::union(members.iter().map(|m| m.transform(&mut *f)).collect())
            }
            Type::Tuple(Tuple::Bounded(elements)) => Type::Tuple(Tuple::Bounded(
                elements.iter().map(|e| e.transform(&mut *f)).collect(),
            )),
            Type::Tuple(Tuple::Unbounded(element)) => {
                Type::Tuple(Tuple::Unbounded(Box::new(element.transform(f))))
            }
            Type::Callable(callable) => Type::Callable(Box::new(Callable {
                kind: callable.kind.clone(),
                implementation: transform_overload(&callable.implementation, f),
                overloads: callable
                    .overloads
                    .iter()
                    .map(|overload| transform_overload(overload, &mut *f))
                    .collect(),
            })),
            Type::TypedDictionary(dictionary) => Type::TypedDictionary(TypedDictionary {
                fields: dictionary
                    .fields
                    .iter()
                    .map(|field| Field {
                        name: field.name.clone(),
                        annotation: field.annotation.transform(&mut *f),
                    })
                    .collect(),
                total: dictionary.total,
            }),
        }
    }

    /// Substitute whole subterms according to `substitutions`.
    pub fn instantiate(&self, substitutions: &FxHashMap<Type, Type>) -> Type {
        self.transform(&mut |term| substitutions.get(term).cloned())
    }

    /// Replace every literal with its carrier primitive.
    pub fn weaken_literals(&self) -> Type {
        self.transform(&mut |term| match term {
            Type::Literal(literal) => Some(Type::primitive(literal.carrier())),
            _ => None,
        })
    }

    /// Free type variables in first-occurrence order, marked ones excluded.
    pub fn free_variables(&self) -> Vec<Type> {
        let mut collected: Vec<Type> = Vec::new();
        self.exists(&mut |term| {
            if let Type::Variable(variable) = term {
                if !variable.is_marked() && !collected.contains(term) {
                    collected.push(term.clone());
                }
            }
            false
        });
        collected
    }

    /// True when the term has no free type variables.
    pub fn is_resolved(&self) -> bool {
        !self.exists(&mut |term| matches!(term, Type::Variable(v) if !v.is_marked()))
    }

    pub fn contains_undeclared(&self) -> bool {
        self.exists(&mut |term| matches!(term, Type::Undeclared))
    }

    /// Mark every free variable as provisionally bound.
    pub fn mark_free_variables(&self) -> Type {
        self.transform(&mut |term| match term {
            Type::Variable(variable) if !variable.is_marked() => {
                Some(Type::Variable(variable.marked()))
            }
            _ => None,
        })
    }

    /// Undo `mark_free_variables`.
    pub fn free_marked_variables(&self) -> Type {
        self.transform(&mut |term| match term {
            Type::Variable(variable) if variable.is_marked() => {
                Some(Type::Variable(variable.unmarked()))
            }
            _ => None,
        })
    }
}

fn overload_exists(overload: &Overload, predicate: &mut dyn FnMut(&Type) -> bool) -> bool {
    if overload.annotation.exists(&mut *predicate) {
        return true;
    }
    if let Parameters::Defined(parameters) = &overload.parameters {
        for parameter in parameters {
            if parameter.annotation().exists(&mut *predicate) {
                return true;
            }
        }
    }
    false
}

fn transform_overload(overload: &Overload, f: &mut dyn FnMut(&Type) -> Option<Type>) -> Overload {
    Overload {
        annotation: overload.annotation.transform(&mut *f),
        parameters: match &overload.parameters {
            Parameters::Undefined => Parameters::Undefined,
            Parameters::Defined(parameters) => Parameters::Defined(
                parameters
                    .iter()
                    .map(|parameter| {
                        parameter.with_annotation(parameter.annotation().transform(&mut *f))
                    })
                    .collect(),
            ),
        },
    }
}

// =============================================================================
// Rendering
// =============================================================================

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Bottom => write!(f, "$bottom"),
            Type::Top => write!(f, "$unknown"),
            Type::Any => write!(f, "typing.Any"),
            Type::Undeclared => write!(f, "typing.Undeclared"),
            Type::Primitive(name) => write!(f, "{}", name),
            Type::Parametric { name, parameters } => {
                write!(f, "{}[", name)?;
                write_separated(f, parameters)?;
                write!(f, "]")
            }
            Type::Variable(variable) => write!(f, "{}", variable.name),
            Type::Optional(inner) => write!(f, "typing.Optional[{}]", inner),
            Type::Union(members) => {
                write!(f, "typing.Union[")?;
                write_separated(f, members)?;
                write!(f, "]")
            }
            Type::Tuple(Tuple::Bounded(elements)) => {
                write!(f, "typing.Tuple[")?;
                write_separated(f, elements)?;
                write!(f, "]")
            }
            Type::Tuple(Tuple::Unbounded(element)) => {
                write!(f, "typing.Tuple[{}, ...]", element)
            }
            Type::Callable(callable) => {
                match &callable.kind {
                    CallableKind::Anonymous => write!(f, "typing.Callable[")?,
                    CallableKind::Named(name) => write!(f, "typing.Callable({})[", name)?,
                }
                match &callable.implementation.parameters {
                    Parameters::Undefined => write!(f, "...")?,
                    Parameters::Defined(parameters) => {
                        write!(f, "[")?;
                        for (position, parameter) in parameters.iter().enumerate() {
                            if position > 0 {
                                write!(f, ", ")?;
                            }
                            match parameter {
                                Parameter::Named { annotation, .. } => {
                                    write!(f, "{}", annotation)?
                                }
                                Parameter::Variable { annotation, .. } => {
                                    write!(f, "*({})", annotation)?
                                }
                                Parameter::Keywords { annotation, .. } => {
                                    write!(f, "**({})", annotation)?
                                }
                            }
                        }
                        write!(f, "]")?;
                    }
                }
                write!(f, ", {}]", callable.implementation.annotation)
            }
            Type::TypedDictionary(dictionary) => {
                if dictionary.total {
                    write!(f, "TypedDict {{")?;
                } else {
                    write!(f, "NonTotalTypedDict {{")?;
                }
                for (position, field) in dictionary.fields.iter().enumerate() {
                    if position > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", field.name, field.annotation)?;
                }
                write!(f, "}}")
            }
            Type::Literal(Literal::Boolean(true)) => write!(f, "Literal[True]"),
            Type::Literal(Literal::Boolean(false)) => write!(f, "Literal[False]"),
            Type::Literal(Literal::Integer(value)) => write!(f, "Literal[{}]", value),
            Type::Literal(Literal::String(value)) => write!(f, "Literal['{}']", value),
            Type::Meta(inner) => write!(f, "type[{}]", inner),
        }
    }
}

fn write_separated(f: &mut fmt::Formatter<'_>, terms: &[Type]) -> fmt::Result {
    for (position, term) in terms.iter().enumerate() {
        if position > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", term)?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/types_tests.rs"]
mod tests;
