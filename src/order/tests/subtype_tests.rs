use crate::order::{Builder, Host, ImplementsResult, InMemoryStore, Order, TypeOrder};
use crate::types::{Constraints, Parameter, Type, TypeVar, Variance};

fn int() -> Type {
    Type::primitive("int")
}

fn float() -> Type {
    Type::primitive("float")
}

fn str_type() -> Type {
    Type::primitive("str")
}

fn object() -> Type {
    Type::primitive("object")
}

fn assert_le(order: &TypeOrder<InMemoryStore>, left: &Type, right: &Type, expected: bool) {
    let queries = Order::without_host(order);
    assert_eq!(
        queries.less_or_equal(left, right).unwrap(),
        expected,
        "{} <= {} should be {}",
        left,
        right,
        expected
    );
}

fn generic_box(variance: Variance) -> TypeOrder<InMemoryStore> {
    let mut order = Builder::default();
    order.insert(Type::primitive("Box"));
    order.connect(&Type::primitive("Box"), &object(), vec![]);
    order.connect(
        &Type::primitive("Box"),
        &Type::primitive("typing.Generic"),
        vec![Type::Variable(TypeVar {
            name: "_T".into(),
            constraints: Constraints::Unconstrained,
            variance,
        })],
    );
    order
}

#[test]
fn test_numeric_tower() {
    let order = Builder::default();
    assert_le(&order, &int(), &float(), true);
    assert_le(&order, &float(), &int(), false);
    assert_le(&order, &int(), &Type::primitive("numbers.Number"), true);
    assert_le(&order, &Type::primitive("bool"), &Type::primitive("complex"), true);
}

#[test]
fn test_reflexivity_over_all_tracked_types() {
    let order = Builder::default();
    for annotation in order.keys() {
        assert_le(&order, &annotation, &annotation, true);
    }
}

#[test]
fn test_bottom_and_top_bound_everything() {
    let order = Builder::default();
    for annotation in order.keys() {
        assert_le(&order, &Type::Bottom, &annotation, true);
        assert_le(&order, &annotation, &Type::Top, true);
    }
}

#[test]
fn test_any_saturation() {
    let order = Builder::default();
    for annotation in order.keys() {
        if annotation.is_top() {
            continue;
        }
        assert_le(&order, &annotation, &Type::Any, true);
        if !annotation.is_any() {
            assert_le(&order, &Type::Any, &annotation, false);
        }
    }
}

#[test]
fn test_top_is_not_below_any() {
    let order = Builder::default();
    assert_le(&order, &Type::Top, &Type::Any, false);
    assert_le(&order, &Type::Any, &Type::Top, true);
}

#[test]
fn test_undeclared_never_reaches_top() {
    let order = Builder::default();
    assert_le(&order, &Type::Undeclared, &Type::Top, false);
    assert_le(
        &order,
        &Type::parametric("list", vec![Type::Undeclared]),
        &Type::Top,
        false,
    );
}

#[test]
fn test_everything_is_below_object() {
    let order = Builder::default();
    assert_le(&order, &str_type(), &object(), true);
    assert_le(&order, &Type::optional(int()), &object(), true);
    assert_le(&order, &Type::bounded_tuple(vec![int()]), &object(), true);
}

#[test]
fn test_bare_variable_only_admits_itself() {
    let order = Builder::default();
    let variable = Type::variable("_T");
    assert_le(&order, &variable, &variable, true);
    assert_le(&order, &int(), &variable, false);
    assert_le(&order, &variable, &int(), false);
}

#[test]
fn test_invariant_parameters_require_equality() {
    let order = generic_box(Variance::Invariant);
    let box_int = Type::parametric("Box", vec![int()]);
    let box_float = Type::parametric("Box", vec![float()]);
    assert_le(&order, &box_int, &box_int, true);
    assert_le(&order, &box_int, &box_float, false);
    assert_le(&order, &box_float, &box_int, false);
}

#[test]
fn test_covariant_parameters_follow_the_element() {
    let order = generic_box(Variance::Covariant);
    let box_int = Type::parametric("Box", vec![int()]);
    let box_float = Type::parametric("Box", vec![float()]);
    assert_le(&order, &box_int, &box_float, true);
    assert_le(&order, &box_float, &box_int, false);
}

#[test]
fn test_contravariant_parameters_reverse_the_element() {
    let order = generic_box(Variance::Contravariant);
    let box_int = Type::parametric("Box", vec![int()]);
    let box_float = Type::parametric("Box", vec![float()]);
    assert_le(&order, &box_int, &box_float, false);
    assert_le(&order, &box_float, &box_int, true);
}

#[test]
fn test_parametric_subclassing_rewrites_parameters() {
    // IntBox(Box[int]) with a covariant element.
    let mut order = generic_box(Variance::Covariant);
    order.insert(Type::primitive("IntBox"));
    order.connect(&Type::primitive("IntBox"), &Type::primitive("Box"), vec![int()]);
    assert_le(
        &order,
        &Type::parametric("IntBox", vec![]),
        &Type::parametric("Box", vec![float()]),
        true,
    );
    assert_le(
        &order,
        &Type::primitive("IntBox"),
        &Type::parametric("Box", vec![float()]),
        true,
    );
}

#[test]
fn test_optionals() {
    let order = Builder::default();
    assert_le(&order, &Type::optional(int()), &Type::optional(float()), true);
    assert_le(&order, &int(), &Type::optional(int()), true);
    assert_le(&order, &Type::optional(int()), &int(), false);
    assert_le(&order, &Type::optional(float()), &Type::optional(int()), false);
}

#[test]
fn test_unions() {
    let order = Builder::default();
    let int_or_str = Type::union(vec![int(), str_type()]);
    assert_le(&order, &int(), &int_or_str, true);
    assert_le(&order, &int_or_str, &int(), false);
    assert_le(&order, &int_or_str, &object(), true);
    assert_le(
        &order,
        &int_or_str,
        &Type::union(vec![int(), str_type(), Type::primitive("None")]),
        true,
    );
}

#[test]
fn test_constrained_variables_reduce_to_their_ground_form() {
    let order = Builder::default();
    let bounded = Type::Variable(TypeVar {
        name: "_T".into(),
        constraints: Constraints::Bound(Box::new(int())),
        variance: Variance::Invariant,
    });
    assert_le(&order, &bounded, &float(), true);
    assert_le(&order, &bounded, &str_type(), false);

    let explicit = Type::Variable(TypeVar {
        name: "_U".into(),
        constraints: Constraints::Explicit(vec![int(), str_type()]),
        variance: Variance::Invariant,
    });
    assert_le(&order, &explicit, &object(), true);
    assert_le(&order, &explicit, &int(), false);
    assert_le(
        &order,
        &explicit,
        &Type::union(vec![int(), str_type()]),
        true,
    );
}

#[test]
fn test_tuples() {
    let order = Builder::default();
    let int_pair = Type::bounded_tuple(vec![int(), int()]);
    let float_pair = Type::bounded_tuple(vec![float(), float()]);
    assert_le(&order, &int_pair, &float_pair, true);
    assert_le(&order, &float_pair, &int_pair, false);
    assert_le(&order, &int_pair, &Type::unbounded_tuple(int()), true);
    assert_le(&order, &int_pair, &Type::unbounded_tuple(float()), true);
    assert_le(
        &order,
        &Type::unbounded_tuple(int()),
        &Type::unbounded_tuple(float()),
        true,
    );
    assert_le(&order, &Type::unbounded_tuple(int()), &int_pair, false);
    assert_le(
        &order,
        &Type::bounded_tuple(vec![]),
        &Type::unbounded_tuple(int()),
        true,
    );
    assert_le(
        &order,
        &Type::bounded_tuple(vec![int()]),
        &Type::bounded_tuple(vec![int(), int()]),
        false,
    );
}

#[test]
fn test_tuple_against_the_tuple_class() {
    let mut order = Builder::default();
    order.insert(Type::primitive("tuple"));
    order.connect(&Type::primitive("tuple"), &object(), vec![]);
    assert_le(
        &order,
        &Type::bounded_tuple(vec![int()]),
        &Type::primitive("tuple"),
        true,
    );
}

#[test]
fn test_literals_weaken_to_their_carriers() {
    let order = Builder::default();
    assert_le(&order, &Type::literal_integer(3), &int(), true);
    assert_le(&order, &Type::literal_integer(3), &float(), true);
    assert_le(&order, &int(), &Type::literal_integer(3), false);
    assert_le(&order, &Type::literal_boolean(true), &int(), true);
    assert_le(&order, &Type::literal_string("a"), &str_type(), true);
    assert_le(&order, &Type::literal_string("a"), &int(), false);
}

#[test]
fn test_callable_subtyping_simulates_the_signature() {
    let order = Builder::default();
    let takes_float = Type::lambda(
        vec![Parameter::Named {
            name: "x".into(),
            annotation: float(),
            default: false,
        }],
        int(),
    );
    let takes_int = Type::lambda(
        vec![Parameter::Named {
            name: "x".into(),
            annotation: int(),
            default: false,
        }],
        int(),
    );
    // Parameters are contravariant under simulation.
    assert_le(&order, &takes_float, &takes_int, true);
    assert_le(&order, &takes_int, &takes_float, false);
}

#[test]
fn test_named_callables_match_on_their_names() {
    let order = Builder::default();
    let named = Type::named_callable("foo", vec![], int());
    let same = Type::named_callable("foo", vec![], str_type());
    let other = Type::named_callable("bar", vec![], int());
    assert_le(&order, &named, &same, true);
    assert_le(&order, &named, &other, false);
}

struct ConstructorHost;

impl Host for ConstructorHost {
    fn constructor(&self, metaclass: &Type) -> Option<Type> {
        Some(Type::lambda(vec![], metaclass.clone()))
    }

    fn implements(&self, _protocol: &Type, _candidate: &Type) -> ImplementsResult {
        ImplementsResult::DoesNotImplement
    }
}

#[test]
fn test_meta_against_callable_uses_the_constructor() {
    let order = Builder::default();
    let host = ConstructorHost;
    let queries = Order::new(&order, &host);
    let returns_int = Type::lambda(vec![], int());
    let returns_str = Type::lambda(vec![], str_type());
    assert!(queries
        .less_or_equal(&Type::meta(int()), &returns_int)
        .unwrap());
    assert!(!queries
        .less_or_equal(&Type::meta(int()), &returns_str)
        .unwrap());
}

struct WitnessHost {
    parameters: Vec<Type>,
}

impl Host for WitnessHost {
    fn constructor(&self, _metaclass: &Type) -> Option<Type> {
        None
    }

    fn implements(&self, _protocol: &Type, _candidate: &Type) -> ImplementsResult {
        ImplementsResult::Implements {
            parameters: self.parameters.clone(),
        }
    }
}

#[test]
fn test_callable_against_protocol_uses_the_witness() {
    let order = Builder::default();
    let callable = Type::lambda(vec![], int());

    let empty = WitnessHost { parameters: vec![] };
    let queries = Order::new(&order, &empty);
    assert!(queries
        .less_or_equal(&callable, &Type::primitive("CanCall"))
        .unwrap());

    let nonempty = WitnessHost {
        parameters: vec![int()],
    };
    let queries = Order::new(&order, &nonempty);
    assert!(!queries
        .less_or_equal(&callable, &Type::primitive("CanCall"))
        .unwrap());
    assert!(queries
        .less_or_equal(&callable, &Type::parametric("CanCall", vec![int()]))
        .unwrap());
}

#[test]
fn test_class_below_callable_goes_through_the_callable_ancestor() {
    let mut order = Builder::default();
    let implementation = Type::lambda(vec![], int());
    order.insert(Type::primitive("Factory"));
    order.connect(
        &Type::primitive("Factory"),
        &Type::primitive("typing.Callable"),
        vec![implementation],
    );
    let compatible = Type::lambda(vec![], int());
    let incompatible = Type::lambda(vec![], str_type());
    assert_le(&order, &Type::primitive("Factory"), &compatible, true);
    assert_le(&order, &Type::primitive("Factory"), &incompatible, false);
}

#[test]
fn test_typed_dictionaries_are_width_subtypes() {
    use crate::types::{Field, TypedDictionary};
    let order = Builder::default();
    let movie = Type::TypedDictionary(TypedDictionary {
        fields: vec![
            Field {
                name: "name".into(),
                annotation: str_type(),
            },
            Field {
                name: "year".into(),
                annotation: int(),
            },
        ],
        total: true,
    });
    let named = Type::TypedDictionary(TypedDictionary {
        fields: vec![Field {
            name: "name".into(),
            annotation: str_type(),
        }],
        total: true,
    });
    let non_total = Type::TypedDictionary(TypedDictionary {
        fields: vec![Field {
            name: "name".into(),
            annotation: str_type(),
        }],
        total: false,
    });
    assert_le(&order, &movie, &named, true);
    assert_le(&order, &named, &movie, false);
    assert_le(&order, &movie, &non_total, false);
    // Total typed dictionaries weaken to their nominal carrier.
    assert_le(
        &order,
        &movie,
        &Type::parametric("typing.Mapping", vec![str_type(), Type::Any]),
        true,
    );
}

#[test]
fn test_untracked_primitive_raises() {
    let order = Builder::default();
    let queries = Order::without_host(&order);
    assert!(queries
        .less_or_equal(&Type::primitive("missing.Class"), &int())
        .is_err());
}
