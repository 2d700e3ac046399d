//! The type-order engine.
//!
//! `TypeOrder` owns the directed graph of nominal types ordered by the
//! subclass relation; `Order` bundles a reference to an engine with the two
//! host callbacks needed by the structural cases of the subtype relation
//! and the constraint solver. Passing the bundle to each recursion point
//! keeps the mutual recursion between subtyping, the lattice operations,
//! signature simulation and constraint solving acyclic at module level.

mod builder;
mod error;
mod graph;
mod hygiene;
mod lattice;
mod mro;
mod propagate;
mod signature;
mod solve;
mod store;
mod subtype;
mod traversal;

pub use builder::Builder;
pub use error::TypeOrderError;
pub use graph::TypeOrder;
pub use solve::ConstraintMap;
pub use store::{InMemoryStore, Index, OrderStore, Target};

use crate::types::Type;

/// Answer of the structural-protocol witness.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImplementsResult {
    DoesNotImplement,
    Implements { parameters: Vec<Type> },
}

/// Host callbacks the engine cannot compute itself: mapping a metaclass to
/// the type constructing its instances, and witnessing structural protocol
/// membership.
pub trait Host {
    fn constructor(&self, metaclass: &Type) -> Option<Type>;
    fn implements(&self, protocol: &Type, candidate: &Type) -> ImplementsResult;
}

/// A host that resolves nothing. Useful for tests and for purely nominal
/// queries.
pub struct NoHost;

impl Host for NoHost {
    fn constructor(&self, _metaclass: &Type) -> Option<Type> {
        None
    }

    fn implements(&self, _protocol: &Type, _candidate: &Type) -> ImplementsResult {
        ImplementsResult::DoesNotImplement
    }
}

/// An engine handle paired with its host callbacks; the receiver of every
/// query that may recurse into structural cases.
pub struct Order<'a, S: OrderStore = InMemoryStore, H: Host = NoHost> {
    pub(crate) handler: &'a TypeOrder<S>,
    pub(crate) host: &'a H,
}

impl<'a, S: OrderStore> Order<'a, S, NoHost> {
    /// An order whose host resolves nothing.
    pub fn without_host(handler: &'a TypeOrder<S>) -> Self {
        static NO_HOST: NoHost = NoHost;
        Order {
            handler,
            host: &NO_HOST,
        }
    }
}

impl<'a, S: OrderStore, H: Host> Order<'a, S, H> {
    pub fn new(handler: &'a TypeOrder<S>, host: &'a H) -> Self {
        Order { handler, host }
    }

    /// The engine this order queries.
    pub fn handler(&self) -> &'a TypeOrder<S> {
        self.handler
    }
}
