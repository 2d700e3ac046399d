//! pyorder: the class-hierarchy and type-order engine of a gradual type
//! checker.
//!
//! The engine maintains a directed graph of nominal types ordered by the
//! subclass relation and answers the queries the surrounding checker needs:
//! subtyping (`less_or_equal`), the join/meet lattice, C3 method resolution
//! order, constraint solving over type variables, signature simulation for
//! callables, parameter propagation along the hierarchy, and graph hygiene.
//!
//! The usual lifecycle is build, freeze, query:
//!
//! ```
//! use pyorder::{Builder, Order, Type};
//!
//! let mut order = Builder::default();
//! order.insert(Type::primitive("A"));
//! order.connect(&Type::primitive("A"), &Type::primitive("object"), vec![]);
//! order.check_integrity().unwrap();
//!
//! let queries = Order::without_host(&order);
//! assert!(queries
//!     .less_or_equal(&Type::primitive("int"), &Type::primitive("float"))
//!     .unwrap());
//! ```
//!
//! Structural cases (protocol membership, metaclass construction) are
//! delegated to the host through the [`Host`] callbacks bundled into an
//! [`Order`].

pub mod order;
pub mod types;

pub use order::{
    Builder, ConstraintMap, Host, ImplementsResult, InMemoryStore, Index, NoHost, Order,
    OrderStore, Target, TypeOrder, TypeOrderError,
};
pub use types::{
    Callable, CallableKind, Constraints, Field, Identifier, Literal, Overload, Parameter,
    Parameters, Tuple, Type, TypeVar, TypedDictionary, Variance,
};
