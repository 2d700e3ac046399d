//! Construction and seeding of orders.

use crate::order::graph::TypeOrder;
use crate::order::store::{InMemoryStore, OrderStore};
use crate::types::{names, Constraints, Type, TypeVar, Variance};

/// The typing-module special forms every order tracks. Each is connected
/// straight to `Top`; they are placeholders, not classes.
const SPECIAL_FORMS: &[&str] = &[
    "typing.Tuple",
    "typing.Callable",
    "typing.Protocol",
    "typing.Generic",
    "typing.FrozenSet",
    "typing.Optional",
    "typing.TypeVar",
    "typing.Undeclared",
    "typing.Union",
    "typing.NoReturn",
    "typing.ClassVar",
];

/// Creates engines: empty, seeded with the universal vocabulary, or copied.
pub struct Builder;

impl Builder {
    /// An empty engine over the in-memory store.
    pub fn create() -> TypeOrder<InMemoryStore> {
        TypeOrder::new(InMemoryStore::new())
    }

    /// An engine pre-populated with the universal scalars, the typing
    /// special forms, the numeric tower, the typed-dictionary chain and the
    /// mock classes. The fresh seed is acyclic, fully mirrored, reachable
    /// from `Bottom` and connected to `Top`.
    pub fn default() -> TypeOrder<InMemoryStore> {
        let mut order = Builder::create();

        let bottom = Type::Bottom;
        let top = Type::Top;
        let object = Type::primitive(names::OBJECT);

        // Universal scalars.
        for annotation in [
            Type::Bottom,
            Type::Top,
            Type::Any,
            object.clone(),
            Type::primitive("str"),
            Type::primitive("bool"),
            Type::primitive("None"),
        ] {
            order.insert(annotation);
        }
        order.connect(&bottom, &Type::Any, vec![]);
        order.connect(&Type::Any, &top, vec![]);
        order.connect(&object, &top, vec![]);
        order.connect(&bottom, &Type::primitive("str"), vec![]);
        order.connect(&Type::primitive("str"), &object, vec![]);
        order.connect(&bottom, &Type::primitive("None"), vec![]);
        order.connect(&Type::primitive("None"), &object, vec![]);

        // Numeric tower, starting at bool.
        for name in ["int", "float", "complex", "numbers.Complex", "numbers.Number"] {
            order.insert(Type::primitive(name));
        }
        order.connect(&bottom, &Type::primitive("bool"), vec![]);
        order.connect(&Type::primitive("bool"), &Type::primitive("int"), vec![]);
        order.connect(&Type::primitive("int"), &Type::primitive("float"), vec![]);
        order.connect(&Type::primitive("float"), &Type::primitive("complex"), vec![]);
        order.connect(
            &Type::primitive("complex"),
            &Type::primitive("numbers.Complex"),
            vec![],
        );
        order.connect(
            &Type::primitive("numbers.Complex"),
            &Type::primitive("numbers.Number"),
            vec![],
        );
        order.connect(&Type::primitive("numbers.Number"), &object, vec![]);

        // Typing special forms.
        for name in SPECIAL_FORMS {
            let form = Type::primitive(*name);
            order.insert(form.clone());
            order.connect(&bottom, &form, vec![]);
            order.connect(&form, &top, vec![]);
        }
        order.insert(Type::primitive("typing.NamedTuple"));
        order.connect(&bottom, &Type::primitive("typing.NamedTuple"), vec![]);
        order.connect(&Type::primitive("typing.NamedTuple"), &top, vec![]);

        // dict and its typing alias.
        order.insert(Type::primitive("dict"));
        order.insert(Type::primitive("typing.Dict"));
        order.connect(&bottom, &Type::primitive("dict"), vec![]);
        order.connect(&Type::primitive("dict"), &Type::primitive("typing.Dict"), vec![]);
        order.connect(&Type::primitive("typing.Dict"), &object, vec![]);

        // type[_T_meta] is generic in its single covariant parameter.
        let generic = Type::primitive(names::GENERIC);
        order.insert(Type::primitive(names::TYPE));
        order.connect(&bottom, &Type::primitive(names::TYPE), vec![]);
        order.connect(
            &Type::primitive(names::TYPE),
            &generic,
            vec![Type::Variable(TypeVar {
                name: "_T_meta".into(),
                constraints: Constraints::Unconstrained,
                variance: Variance::Covariant,
            })],
        );

        // Typed dictionaries behave as mappings from str to Any.
        let typed_dictionary = Type::primitive(names::TYPED_DICTIONARY);
        let non_total = Type::primitive(names::NON_TOTAL_TYPED_DICTIONARY);
        let mapping = Type::primitive(names::MAPPING);
        order.insert(typed_dictionary.clone());
        order.insert(non_total.clone());
        order.insert(mapping.clone());
        order.connect(&bottom, &non_total, vec![]);
        order.connect(&non_total, &typed_dictionary, vec![]);
        order.connect(
            &typed_dictionary,
            &mapping,
            vec![Type::primitive("str"), Type::Any],
        );
        order.connect(
            &mapping,
            &generic,
            vec![Type::variable("_T"), Type::variable("_T2")],
        );

        // Mock classes used pervasively by test suites of hosted code.
        let mock_base = Type::primitive("unittest.mock.Base");
        let non_callable_mock = Type::primitive("unittest.mock.NonCallableMock");
        order.insert(mock_base.clone());
        order.insert(non_callable_mock.clone());
        order.connect(&bottom, &non_callable_mock, vec![]);
        order.connect(&non_callable_mock, &mock_base, vec![]);
        order.connect(&mock_base, &object, vec![]);

        order
    }

    /// An independent engine holding deep copies of the four tables.
    pub fn copy<S: OrderStore>(order: &TypeOrder<S>) -> TypeOrder<InMemoryStore> {
        let mut store = InMemoryStore::new();
        for index in order.store.keys() {
            let Some(annotation) = order.store.find_annotation(index) else {
                continue;
            };
            store.add_key(index);
            store.set_index(annotation.clone(), index);
            store.set_annotation(index, annotation);
            store.set_edges(index, order.store.find_edges(index).unwrap_or_default());
            store.set_backedges(index, order.store.find_backedges(index).unwrap_or_default());
        }
        TypeOrder::new(store)
    }
}

#[cfg(test)]
#[path = "tests/builder_tests.rs"]
mod tests;
