use crate::order::{Builder, InMemoryStore, Order, TypeOrder};
use crate::types::{
    Constraints, Field, Parameter, Type, TypeVar, TypedDictionary, Variance,
};

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

fn join(order: &TypeOrder<InMemoryStore>, left: &Type, right: &Type) -> Type {
    Order::without_host(order).join(left, right).unwrap()
}

fn meet(order: &TypeOrder<InMemoryStore>, left: &Type, right: &Type) -> Type {
    Order::without_host(order).meet(left, right).unwrap()
}

#[test]
fn test_join_and_meet_of_unrelated_classes() {
    let order = Builder::default();
    assert_eq!(join(&order, &int(), &str_type()), object());
    assert_eq!(meet(&order, &int(), &str_type()), Type::Bottom);
}

#[test]
fn test_ordered_operands_answer_the_larger_or_smaller() {
    let order = Builder::default();
    assert_eq!(join(&order, &int(), &float()), float());
    assert_eq!(join(&order, &float(), &int()), float());
    assert_eq!(meet(&order, &int(), &float()), int());
    assert_eq!(meet(&order, &Type::primitive("bool"), &float()), Type::primitive("bool"));
}

#[test]
fn test_sentinels() {
    let order = Builder::default();
    assert_eq!(join(&order, &Type::Bottom, &int()), int());
    assert_eq!(join(&order, &Type::Top, &int()), Type::Top);
    assert_eq!(join(&order, &Type::Any, &int()), Type::Any);
    assert_eq!(
        join(&order, &Type::Undeclared, &int()),
        Type::union(vec![Type::Undeclared, int()])
    );
    assert_eq!(meet(&order, &Type::Bottom, &int()), Type::Bottom);
    assert_eq!(meet(&order, &Type::Top, &int()), int());
    assert_eq!(meet(&order, &Type::Any, &int()), int());
    assert_eq!(meet(&order, &Type::Undeclared, &int()), Type::Bottom);
}

#[test]
fn test_join_bounds_its_operands() {
    let order = Builder::default();
    let queries = Order::without_host(&order);
    let pairs = [
        (int(), str_type()),
        (int(), float()),
        (Type::primitive("bool"), Type::primitive("complex")),
        (Type::primitive("None"), str_type()),
        (Type::primitive("dict"), str_type()),
    ];
    for (left, right) in pairs {
        let joined = queries.join(&left, &right).unwrap();
        assert!(queries.less_or_equal(&left, &joined).unwrap());
        assert!(queries.less_or_equal(&right, &joined).unwrap());
        let met = queries.meet(&left, &right).unwrap();
        assert!(queries.less_or_equal(&met, &left).unwrap());
        assert!(queries.less_or_equal(&met, &right).unwrap());
    }
}

#[test]
fn test_join_and_meet_commute() {
    let order = Builder::default();
    let samples = [
        Type::Bottom,
        Type::Top,
        Type::Any,
        int(),
        float(),
        str_type(),
        object(),
        Type::primitive("bool"),
        Type::optional(int()),
        Type::union(vec![int(), str_type()]),
        Type::bounded_tuple(vec![int(), str_type()]),
        Type::literal_integer(3),
    ];
    for left in &samples {
        for right in &samples {
            assert_eq!(
                join(&order, left, right),
                join(&order, right, left),
                "join of {} and {}",
                left,
                right
            );
            assert_eq!(
                meet(&order, left, right),
                meet(&order, right, left),
                "meet of {} and {}",
                left,
                right
            );
        }
    }
}

#[test]
fn test_union_joins_concatenate() {
    let order = Builder::default();
    assert_eq!(
        join(
            &order,
            &Type::union(vec![int(), str_type()]),
            &Type::union(vec![float(), str_type()])
        ),
        Type::union(vec![int(), str_type(), float()])
    );
    // A member below the union is absorbed.
    assert_eq!(
        join(&order, &int(), &Type::union(vec![int(), str_type()])),
        Type::union(vec![int(), str_type()])
    );
    // Anything else widens the union.
    assert_eq!(
        join(&order, &float(), &Type::union(vec![int(), str_type()])),
        Type::union(vec![float(), int(), str_type()])
    );
}

#[test]
fn test_optional_joins_absorb() {
    let order = Builder::default();
    assert_eq!(
        join(&order, &Type::optional(int()), &Type::optional(float())),
        Type::optional(float())
    );
    assert_eq!(
        join(&order, &Type::optional(int()), &float()),
        Type::optional(float())
    );
    assert_eq!(
        join(
            &order,
            &Type::optional(int()),
            &Type::union(vec![str_type(), float()])
        ),
        Type::optional(Type::union(vec![int(), str_type(), float()]))
    );
    assert_eq!(
        meet(&order, &Type::optional(int()), &Type::optional(float())),
        Type::optional(int())
    );
    assert_eq!(meet(&order, &Type::optional(int()), &float()), int());
}

#[test]
fn test_variables_ground_in_joins_and_collapse_in_meets() {
    let order = Builder::default();
    let bounded = Type::Variable(TypeVar {
        name: "_T".into(),
        constraints: Constraints::Bound(Box::new(int())),
        variance: Variance::Invariant,
    });
    assert_eq!(join(&order, &bounded, &float()), float());
    let explicit = Type::Variable(TypeVar {
        name: "_U".into(),
        constraints: Constraints::Explicit(vec![int(), str_type()]),
        variance: Variance::Invariant,
    });
    // The explicit constraints ground to a union first; joining with a type
    // not below that union widens it.
    assert_eq!(
        join(&order, &explicit, &object()),
        Type::union(vec![object(), int(), str_type()])
    );
    let unconstrained = Type::variable("_V");
    assert_eq!(
        join(&order, &unconstrained, &int()),
        Type::union(vec![unconstrained.clone(), int()])
    );
    assert_eq!(meet(&order, &unconstrained, &int()), Type::Bottom);
}

#[test]
fn test_parametric_join_combines_by_variance() {
    let mut order = Builder::default();
    order.insert(Type::primitive("Box"));
    order.insert(Type::primitive("IntBox"));
    order.insert(Type::primitive("FloatBox"));
    order.connect(&Type::primitive("Box"), &object(), vec![]);
    order.connect(
        &Type::primitive("Box"),
        &Type::primitive("typing.Generic"),
        vec![Type::Variable(TypeVar {
            name: "_T".into(),
            constraints: Constraints::Unconstrained,
            variance: Variance::Covariant,
        })],
    );
    order.connect(&Type::primitive("IntBox"), &Type::primitive("Box"), vec![int()]);
    order.connect(
        &Type::primitive("FloatBox"),
        &Type::primitive("Box"),
        vec![float()],
    );

    // Covariant parameters join at the common ancestor.
    assert_eq!(
        join(
            &order,
            &Type::parametric("IntBox", vec![]),
            &Type::parametric("FloatBox", vec![])
        ),
        Type::parametric("Box", vec![float()])
    );
}

#[test]
fn test_invariant_parametric_join_gives_any_parameters() {
    let mut order = Builder::default();
    order.insert(Type::primitive("Box"));
    order.insert(Type::primitive("IntBox"));
    order.insert(Type::primitive("StrBox"));
    order.connect(&Type::primitive("Box"), &object(), vec![]);
    order.connect(
        &Type::primitive("Box"),
        &Type::primitive("typing.Generic"),
        vec![Type::variable("_T")],
    );
    order.connect(&Type::primitive("IntBox"), &Type::primitive("Box"), vec![int()]);
    order.connect(&Type::primitive("StrBox"), &Type::primitive("Box"), vec![str_type()]);
    assert_eq!(
        join(
            &order,
            &Type::parametric("IntBox", vec![]),
            &Type::parametric("StrBox", vec![])
        ),
        Type::parametric("Box", vec![Type::Any])
    );
}

#[test]
fn test_tuple_joins() {
    let order = Builder::default();
    assert_eq!(
        join(
            &order,
            &Type::bounded_tuple(vec![int(), int()]),
            &Type::bounded_tuple(vec![float(), float()])
        ),
        Type::bounded_tuple(vec![float(), float()])
    );
    assert_eq!(
        join(
            &order,
            &Type::unbounded_tuple(int()),
            &Type::unbounded_tuple(float())
        ),
        Type::unbounded_tuple(float())
    );
    assert_eq!(
        join(
            &order,
            &Type::bounded_tuple(vec![int(), float()]),
            &Type::unbounded_tuple(int())
        ),
        Type::unbounded_tuple(float())
    );
    // Length mismatch keeps the plain union.
    assert_eq!(
        join(
            &order,
            &Type::bounded_tuple(vec![int()]),
            &Type::bounded_tuple(vec![int(), int()])
        ),
        Type::union(vec![
            Type::bounded_tuple(vec![int()]),
            Type::bounded_tuple(vec![int(), int()]),
        ])
    );
}

#[test]
fn test_anonymous_callable_join_meets_parameters_and_joins_returns() {
    let order = Builder::default();
    let left = Type::lambda(
        vec![Parameter::Named {
            name: "x".into(),
            annotation: int(),
            default: false,
        }],
        int(),
    );
    let right = Type::lambda(
        vec![Parameter::Named {
            name: "x".into(),
            annotation: float(),
            default: false,
        }],
        float(),
    );
    let joined = join(&order, &left, &right);
    assert_eq!(
        joined,
        Type::lambda(
            vec![Parameter::Named {
                name: "x".into(),
                annotation: int(),
                default: false,
            }],
            float(),
        )
    );
    let met = meet(&order, &left, &right);
    assert_eq!(
        met,
        Type::lambda(
            vec![Parameter::Named {
                name: "x".into(),
                annotation: float(),
                default: false,
            }],
            int(),
        )
    );
}

#[test]
fn test_misaligned_callables_fall_back() {
    let order = Builder::default();
    let unary = Type::lambda(
        vec![Parameter::Named {
            name: "x".into(),
            annotation: int(),
            default: false,
        }],
        int(),
    );
    let nullary = Type::lambda(vec![], int());
    assert_eq!(
        join(&order, &unary, &nullary),
        Type::union(vec![unary.clone(), nullary.clone()])
    );
    assert_eq!(meet(&order, &unary, &nullary), Type::Bottom);
}

#[test]
fn test_named_callable_joins_unify_on_the_name() {
    let order = Builder::default();
    let named = Type::named_callable("foo", vec![], int());
    let same = Type::named_callable("foo", vec![], int());
    assert_eq!(join(&order, &named, &same), named);
}

#[test]
fn test_typed_dictionary_join_intersects_fields() {
    let order = Builder::default();
    let name_field = Field {
        name: "name".into(),
        annotation: str_type(),
    };
    let year_field = Field {
        name: "year".into(),
        annotation: int(),
    };
    let movie = Type::TypedDictionary(TypedDictionary {
        fields: vec![name_field.clone(), year_field.clone()],
        total: true,
    });
    let named = Type::TypedDictionary(TypedDictionary {
        fields: vec![name_field.clone()],
        total: true,
    });
    assert_eq!(
        join(&order, &movie, &named),
        Type::TypedDictionary(TypedDictionary {
            fields: vec![name_field.clone()],
            total: true,
        })
    );
    // A colliding annotation falls back to the mapping.
    let renamed = Type::TypedDictionary(TypedDictionary {
        fields: vec![Field {
            name: "name".into(),
            annotation: int(),
        }],
        total: true,
    });
    assert_eq!(
        join(&order, &movie, &renamed),
        Type::parametric("typing.Mapping", vec![str_type(), Type::Any])
    );
    // Meets union the fields.
    assert_eq!(
        meet(&order, &movie, &named),
        Type::TypedDictionary(TypedDictionary {
            fields: vec![name_field, year_field],
            total: true,
        })
    );
}

#[test]
fn test_literals_weaken_in_joins() {
    let order = Builder::default();
    assert_eq!(join(&order, &Type::literal_integer(1), &Type::literal_integer(2)), int());
    assert_eq!(join(&order, &Type::literal_integer(1), &str_type()), object());
    assert_eq!(meet(&order, &Type::literal_integer(3), &int()), Type::literal_integer(3));
}

#[test]
fn test_join_degrades_to_any_on_untracked_classes() {
    let order = Builder::default();
    assert_eq!(
        join(&order, &Type::primitive("missing.Class"), &int()),
        Type::Any
    );
    assert_eq!(
        meet(&order, &Type::primitive("missing.Class"), &int()),
        Type::Bottom
    );
}

#[test]
fn test_widen_gives_up_past_the_threshold() {
    let order = Builder::default();
    let queries = Order::without_host(&order);
    assert_eq!(queries.widen(&int(), &str_type(), 1, 3).unwrap(), object());
    assert_eq!(queries.widen(&int(), &str_type(), 4, 3).unwrap(), Type::Top);
}
