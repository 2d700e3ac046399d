//! The mutable graph of tracked types.

use crate::order::error::TypeOrderError;
use crate::order::store::{Index, InMemoryStore, OrderStore, Target};
use crate::types::{names, Constraints, Type, TypeVar, Variance};
use once_cell::sync::Lazy;
use rustc_hash::FxHasher;
use std::hash::{Hash, Hasher};

/// Indices stay within this range so linear probing can wrap without
/// overflow.
const INDEX_MASK: u32 = 0x3FFF_FFFF;

/// The declared parameter list of the hard-coded generic special forms
/// `type` and `typing.Callable`.
static META_VARIABLES: Lazy<Vec<Type>> = Lazy::new(|| {
    vec![Type::Variable(TypeVar {
        name: "_T_meta".into(),
        constraints: Constraints::Unconstrained,
        variance: Variance::Covariant,
    })]
});

/// The type-order engine: a directed graph of nominal types ordered by the
/// subclass relation, with forward and backward adjacency kept in lockstep.
///
/// Mutators take `&mut self`; everything else reads the graph only, so the
/// usual lifecycle is "build, freeze, query".
pub struct TypeOrder<S: OrderStore = InMemoryStore> {
    pub(crate) store: S,
}

impl<S: OrderStore> TypeOrder<S> {
    pub fn new(store: S) -> Self {
        TypeOrder { store }
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    pub fn contains(&self, annotation: &Type) -> bool {
        self.store.find_index(annotation).is_some()
    }

    /// Tracked annotations in insertion order.
    pub fn keys(&self) -> Vec<Type> {
        self.store
            .keys()
            .into_iter()
            .filter_map(|index| self.store.find_annotation(index))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.store.length()
    }

    pub fn is_empty(&self) -> bool {
        self.store.length() == 0
    }

    pub(crate) fn index_of(&self, annotation: &Type) -> Result<Index, TypeOrderError> {
        self.store
            .find_index(annotation)
            .ok_or_else(|| TypeOrderError::Untracked(annotation.clone()))
    }

    pub(crate) fn annotation_of(&self, index: Index) -> Result<Type, TypeOrderError> {
        self.store
            .find_annotation(index)
            .ok_or_else(|| TypeOrderError::Incomplete(format!("no annotation for index {}", index.0)))
    }

    pub(crate) fn edges_of(&self, index: Index) -> Vec<Target> {
        self.store.find_edges(index).unwrap_or_default()
    }

    pub(crate) fn backedges_of(&self, index: Index) -> Vec<Target> {
        self.store.find_backedges(index).unwrap_or_default()
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Track a type. Idempotent: a second insert of an equal term keeps the
    /// original vertex. New vertices hash the term and probe linearly for a
    /// free slot, so indices never move once allocated.
    pub fn insert(&mut self, annotation: Type) {
        if self.store.find_index(&annotation).is_some() {
            return;
        }
        let mut hasher = FxHasher::default();
        annotation.hash(&mut hasher);
        let mut index = Index(hasher.finish() as u32 & INDEX_MASK);
        while self.store.find_annotation(index).is_some() {
            index = Index((index.0 + 1) & INDEX_MASK);
        }
        self.store.add_key(index);
        self.store.set_index(annotation.clone(), index);
        self.store.set_annotation(index, annotation);
        self.store.set_edges(index, Vec::new());
        self.store.set_backedges(index, Vec::new());
    }

    /// Record that `predecessor` derives from `successor`, with `parameters`
    /// substituted for the successor's generic variables (empty list: plain
    /// subclassing). Connecting untracked endpoints is a reported no-op so
    /// hosts can feed partial class information.
    pub fn connect(&mut self, predecessor: &Type, successor: &Type, parameters: Vec<Type>) {
        let (Some(predecessor_index), Some(successor_index)) = (
            self.store.find_index(predecessor),
            self.store.find_index(successor),
        ) else {
            tracing::warn!(
                predecessor = %predecessor,
                successor = %successor,
                "dropping connection between untracked types"
            );
            return;
        };
        let mut edges = self.edges_of(predecessor_index);
        edges.push(Target {
            target: successor_index,
            parameters: parameters.clone(),
        });
        self.store.set_edges(predecessor_index, edges);

        let mut backedges = self.backedges_of(successor_index);
        backedges.push(Target {
            target: predecessor_index,
            parameters,
        });
        self.store.set_backedges(successor_index, backedges);
    }

    /// Clear the forward adjacency of `annotation` and drop the mirrored
    /// entries from its former successors.
    pub fn disconnect_successors(&mut self, annotation: &Type) {
        let Some(index) = self.store.find_index(annotation) else {
            tracing::warn!(annotation = %annotation, "dropping disconnect of untracked type");
            return;
        };
        for edge in self.edges_of(index) {
            let remaining: Vec<Target> = self
                .backedges_of(edge.target)
                .into_iter()
                .filter(|backedge| backedge.target != index)
                .collect();
            self.store.set_backedges(edge.target, remaining);
        }
        self.store.set_edges(index, Vec::new());
    }

    // =========================================================================
    // Declarations
    // =========================================================================

    /// The declared type variables of `annotation`'s primitive, read off its
    /// edge to the `typing.Generic` vertex. `type` and `typing.Callable` are
    /// hard-coded to a single covariant variable.
    pub fn variables(&self, annotation: &Type) -> Result<Option<Vec<Type>>, TypeOrderError> {
        let (primitive, _) = annotation.split();
        if let Some(name) = primitive.primitive_name() {
            if name == names::TYPE || name == names::CALLABLE {
                return Ok(Some(META_VARIABLES.clone()));
            }
        }
        let index = self.index_of(&primitive)?;
        let Some(generic_index) = self.store.find_index(&Type::primitive(names::GENERIC)) else {
            return Ok(None);
        };
        for edge in self.edges_of(index) {
            if edge.target == generic_index {
                return Ok(if edge.parameters.is_empty() {
                    None
                } else {
                    Some(edge.parameters)
                });
            }
        }
        Ok(None)
    }

    /// True when the term mentions no unconstrained variables and every
    /// nominal class it names is tracked.
    pub fn is_instantiated(&self, annotation: &Type) -> bool {
        !annotation.exists(&mut |term| match term {
            Type::Variable(variable) => {
                matches!(variable.constraints, Constraints::Unconstrained)
            }
            Type::Primitive(_) => self.store.find_index(term).is_none(),
            Type::Parametric { name, .. } => self
                .store
                .find_index(&Type::Primitive(name.clone()))
                .is_none(),
            _ => false,
        })
    }
}

#[cfg(test)]
#[path = "tests/graph_tests.rs"]
mod tests;
