use super::*;

fn int() -> Type {
    Type::primitive("int")
}

fn str_type() -> Type {
    Type::primitive("str")
}

#[test]
fn test_union_flattens_and_sorts() {
    let left = Type::union(vec![str_type(), int()]);
    let right = Type::union(vec![int(), str_type()]);
    assert_eq!(left, right);

    let nested = Type::union(vec![int(), Type::union(vec![str_type(), int()])]);
    assert_eq!(nested, left);
}

#[test]
fn test_union_drops_bottom_and_collapses() {
    assert_eq!(Type::union(vec![]), Type::Bottom);
    assert_eq!(Type::union(vec![Type::Bottom]), Type::Bottom);
    assert_eq!(Type::union(vec![int(), Type::Bottom]), int());
    assert_eq!(Type::union(vec![int(), int()]), int());
}

#[test]
fn test_split_parametric() {
    let list_of_int = Type::parametric("list", vec![int()]);
    let (primitive, parameters) = list_of_int.split();
    assert_eq!(primitive, Type::primitive("list"));
    assert_eq!(parameters, vec![int()]);
}

#[test]
fn test_split_meta_and_tuple() {
    let (primitive, parameters) = Type::meta(int()).split();
    assert_eq!(primitive, Type::primitive("type"));
    assert_eq!(parameters, vec![int()]);

    let (primitive, parameters) = Type::bounded_tuple(vec![int(), str_type()]).split();
    assert_eq!(primitive, Type::primitive("tuple"));
    assert_eq!(parameters, vec![int(), str_type()]);

    let (primitive, parameters) = Type::unbounded_tuple(int()).split();
    assert_eq!(primitive, Type::primitive("tuple"));
    assert_eq!(parameters, vec![int()]);
}

#[test]
fn test_split_callable_exposes_return() {
    let callable = Type::lambda(vec![], int());
    let (primitive, parameters) = callable.split();
    assert_eq!(primitive, Type::primitive("typing.Callable"));
    assert_eq!(parameters, vec![int()]);
}

#[test]
fn test_split_scalars_are_fixed_points() {
    for term in [Type::Bottom, Type::Top, Type::Any, Type::Undeclared, int()] {
        let (primitive, parameters) = term.split();
        assert_eq!(primitive, term);
        assert!(parameters.is_empty());
    }
}

#[test]
fn test_weaken_literals() {
    assert_eq!(Type::literal_integer(7).weaken_literals(), int());
    assert_eq!(Type::literal_string("a").weaken_literals(), str_type());
    assert_eq!(
        Type::literal_boolean(true).weaken_literals(),
        Type::primitive("bool")
    );

    let nested = Type::parametric("list", vec![Type::literal_integer(1)]);
    assert_eq!(
        nested.weaken_literals(),
        Type::parametric("list", vec![int()])
    );
}

#[test]
fn test_free_variables_and_resolution() {
    let variable = Type::variable("_T");
    let term = Type::parametric("dict", vec![variable.clone(), int()]);
    assert_eq!(term.free_variables(), vec![variable.clone()]);
    assert!(!term.is_resolved());
    assert!(int().is_resolved());

    // Repeated occurrences are collected once.
    let twice = Type::parametric("dict", vec![variable.clone(), variable.clone()]);
    assert_eq!(twice.free_variables().len(), 1);
}

#[test]
fn test_free_variables_inside_callable() {
    let variable = Type::variable("_T");
    let callable = Type::lambda(
        vec![Parameter::Named {
            name: "x".into(),
            annotation: variable.clone(),
            default: false,
        }],
        variable.clone(),
    );
    assert_eq!(callable.free_variables(), vec![variable]);
}

#[test]
fn test_marking_hides_variables() {
    let variable = Type::variable("_T");
    let marked = variable.mark_free_variables();
    assert!(marked.is_resolved());
    assert!(marked.free_variables().is_empty());
    assert_eq!(marked.free_marked_variables(), variable);
}

#[test]
fn test_instantiate_substitutes_whole_subterms() {
    let variable = Type::variable("_T");
    let mut substitutions = rustc_hash::FxHashMap::default();
    substitutions.insert(variable.clone(), int());

    let term = Type::parametric("list", vec![variable.clone()]);
    assert_eq!(
        term.instantiate(&substitutions),
        Type::parametric("list", vec![int()])
    );

    // Lookup matches whole subterms, so an unrelated variable is untouched.
    let other = Type::parametric("list", vec![Type::variable("_U")]);
    assert_eq!(other.instantiate(&substitutions), other);
}

#[test]
fn test_contains_undeclared() {
    assert!(Type::Undeclared.contains_undeclared());
    assert!(Type::parametric("list", vec![Type::Undeclared]).contains_undeclared());
    assert!(!int().contains_undeclared());
}

#[test]
fn test_single_parameter() {
    assert_eq!(Type::meta(int()).single_parameter(), Some(&int()));
    assert_eq!(
        Type::parametric("list", vec![int()]).single_parameter(),
        Some(&int())
    );
    assert_eq!(int().single_parameter(), None);
    assert_eq!(
        Type::parametric("dict", vec![int(), str_type()]).single_parameter(),
        None
    );
}

#[test]
fn test_display() {
    assert_eq!(Type::parametric("list", vec![int()]).to_string(), "list[int]");
    assert_eq!(
        Type::optional(int()).to_string(),
        "typing.Optional[int]"
    );
    assert_eq!(
        Type::union(vec![int(), str_type()]).to_string(),
        "typing.Union[int, str]"
    );
    assert_eq!(
        Type::bounded_tuple(vec![int(), str_type()]).to_string(),
        "typing.Tuple[int, str]"
    );
    assert_eq!(
        Type::unbounded_tuple(int()).to_string(),
        "typing.Tuple[int, ...]"
    );
    assert_eq!(Type::literal_integer(3).to_string(), "Literal[3]");
    assert_eq!(Type::meta(int()).to_string(), "type[int]");
    let callable = Type::lambda(
        vec![Parameter::Named {
            name: "x".into(),
            annotation: int(),
            default: false,
        }],
        str_type(),
    );
    assert_eq!(callable.to_string(), "typing.Callable[[int], str]");
}

#[test]
fn test_terms_serialize() {
    let term = Type::parametric("list", vec![Type::optional(int())]);
    let encoded = serde_json::to_string(&term).expect("serializable");
    assert!(encoded.contains("list"));
}
