// Copyright (c) 2021 Google LLC
//
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

/*!
Comparators built by composing small combinators. Useful for sorting by properties different from
the natural ordering provided by ordering traits e.g. [`Ord`], and for assembling an ordering at run
time without writing bespoke comparison code per type.

# Composition

Every combinator returns a new, immutable [`Comparator`]. Instead of blindly nesting the comparator
being extended, combinators inspect it and decide whether to wrap it, replace it or merge into it:

1. The identity comparator is absorbed by every composition.
1. Compound comparators are flattened so that a chain of tie-breakers is a single flat list.
1. Null placement layers coordinate with later requests so that whole-value null handling always
   runs before per-key null handling, and so that tie-breakers never run ahead of a null check.

# Representation

The set of comparator shapes is closed, so they are modelled as the variants of a private enum and
composition decisions are made by pattern matching on it rather than through trait objects.
*/

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use crate::errors::ComparatorResult;
use crate::null_filter::{MaybeNull, NullFilterRegistry};
use crate::untyped::TypedBridge;

mod compound;
mod key;
mod null_placement;

use compound::CompoundComparator;
use key::KeyComparator;
use null_placement::{
    KeyNullFilter, PerKeyNullPlacement, PrecedenceCoordinator, WholeValueNullPlacement,
};

/// A comparison closure that may fail with a type mismatch.
pub(crate) type FallibleComparison<T> =
    Arc<dyn Fn(&T, &T) -> ComparatorResult<Ordering> + Send + Sync>;

/**
A three-way ordering over values of type `T`.

A comparator is a cheap handle that can be cloned and shared across threads freely. Once built it
never changes.

Invariants of [`Comparator::compare`]:

1. Returns [`Ordering::Greater`] if `a` > `b`
1. Returns [`Ordering::Equal`] if `a` == `b`
1. Returns [`Ordering::Less`] if `a` < `b`
*/
pub struct Comparator<T: ?Sized> {
    node: Arc<Node<T>>,
}

/// The closed set of comparator shapes.
pub(crate) enum Node<T: ?Sized> {
    /// Considers every pair of values equal. This is the identity element of composition.
    Identity,

    /// Compares projected keys.
    KeyBased(KeyComparator<T>),

    /// Tries a flat list of comparators in order until one breaks the tie.
    Compound(CompoundComparator<T>),

    /// Places absent values before handing present ones to an inner comparator.
    WholeValueNulls(WholeValueNullPlacement<T>),

    /// Places values with an absent key before handing the rest to an inner comparator.
    PerKeyNulls(PerKeyNullPlacement<T>),

    /// Inverts the ordering of the inner comparator.
    Reversed(Comparator<T>),

    /// An arbitrary comparison function.
    Opaque(FallibleComparison<T>),

    /// A typed view of a type-erased comparator.
    Untyped(TypedBridge<T>),
}

/// Crate-only methods
impl<T: ?Sized> Comparator<T> {
    /// Create a comparator from one of the comparator shapes.
    pub(crate) fn from_node(node: Node<T>) -> Self {
        Self {
            node: Arc::new(node),
        }
    }

    /// Get the shape of this comparator.
    pub(crate) fn node(&self) -> &Node<T> {
        &self.node
    }
}

/// Crate-only methods
impl<T: ?Sized + 'static> Comparator<T> {
    /**
    Create a comparator that tries each of `comparators` in order until one breaks the tie.

    Unlike chaining with [`Comparator::then_by`], null placement layers in the sequence stay
    elements of the resulting compound and never take over the comparators that follow them.
    */
    pub(crate) fn lexicographic<I>(comparators: I) -> Self
    where
        I: IntoIterator<Item = Comparator<T>>,
    {
        let mut compound = CompoundComparator::new();
        for comparator in comparators {
            compound.append(&comparator);
        }

        compound.normalize()
    }
}

/// Public methods
impl<T: ?Sized + 'static> Comparator<T> {
    /**
    Create the identity (a.k.a. null) comparator which considers all values equal.

    Composing the identity comparator with any other comparator yields the other comparator.
    */
    pub fn identity() -> Self {
        Self::from_node(Node::Identity)
    }

    /// Create a comparator using the natural ordering of `T`.
    pub fn natural() -> Self
    where
        T: Ord,
    {
        Self::from_fn(|a: &T, b: &T| a.cmp(b))
    }

    /// Create a comparator from a comparison function.
    pub fn from_fn<F>(comparison: F) -> Self
    where
        F: Fn(&T, &T) -> Ordering + Send + Sync + 'static,
    {
        Self::from_node(Node::Opaque(Arc::new(move |a: &T, b: &T| {
            Ok(comparison(a, b))
        })))
    }

    /**
    Create a comparator from a [`ComparisonFn`].

    If the function was obtained from an existing comparator via [`Comparator::to_fn`], that
    comparator is returned instead of being wrapped again.
    */
    pub fn from_comparison(comparison: ComparisonFn<T>) -> Self {
        match comparison.source {
            ComparisonSource::Comparator(comparator) => comparator,
            ComparisonSource::Function(function) => Self::from_node(Node::Opaque(Arc::new(
                move |a: &T, b: &T| Ok(function(a, b)),
            ))),
        }
    }

    /// Create a comparator that orders values by the natural ordering of a projected key.
    pub fn by_key<K, F>(selector: F) -> Self
    where
        K: Ord + 'static,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        Self::by_key_with(selector, Comparator::<K>::natural())
    }

    /// Create a comparator that orders values by the reverse natural ordering of a projected key.
    pub fn by_key_descending<K, F>(selector: F) -> Self
    where
        K: Ord + 'static,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        Self::by_key_descending_with(selector, Comparator::<K>::natural())
    }

    /// Create a comparator that orders values by comparing projected keys with `key_comparator`.
    pub fn by_key_with<K, F, C>(selector: F, key_comparator: C) -> Self
    where
        K: 'static,
        F: Fn(&T) -> K + Send + Sync + 'static,
        C: IntoComparator<K>,
    {
        KeyComparator::new(selector, key_comparator.into_comparator(), false).into()
    }

    /// Like [`Comparator::by_key_with`] but with the key ordering reversed.
    pub fn by_key_descending_with<K, F, C>(selector: F, key_comparator: C) -> Self
    where
        K: 'static,
        F: Fn(&T) -> K + Send + Sync + 'static,
        C: IntoComparator<K>,
    {
        KeyComparator::new(selector, key_comparator.into_comparator(), true).into()
    }

    /**
    Create a comparator that uses `next` to break ties left by this comparator.

    Any null placement declared on this comparator keeps running before `next`.
    */
    pub fn then_by<C: IntoComparator<T>>(&self, next: C) -> Self {
        let next = next.into_comparator();
        if next.is_identity() {
            return self.clone();
        }

        match self.as_coordinator() {
            Some(coordinator) => {
                log::trace!("Merging a tie-breaker underneath an existing null placement");
                coordinator.create_compound(&next)
            }
            None => CompoundComparator::of(self, &next),
        }
    }

    /// Like [`Comparator::then_by`] but with the ordering of `next` reversed.
    pub fn then_by_descending<C: IntoComparator<T>>(&self, next: C) -> Self {
        self.then_by(next.into_comparator().reversed())
    }

    /// Break ties with the natural ordering of a projected key.
    pub fn then_by_key<K, F>(&self, selector: F) -> Self
    where
        K: Ord + 'static,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        self.then_by(Self::by_key(selector))
    }

    /// Break ties with the reverse natural ordering of a projected key.
    pub fn then_by_key_descending<K, F>(&self, selector: F) -> Self
    where
        K: Ord + 'static,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        self.then_by(Self::by_key_descending(selector))
    }

    /// Break ties by comparing projected keys with `key_comparator`.
    pub fn then_by_key_with<K, F, C>(&self, selector: F, key_comparator: C) -> Self
    where
        K: 'static,
        F: Fn(&T) -> K + Send + Sync + 'static,
        C: IntoComparator<K>,
    {
        self.then_by(Self::by_key_with(selector, key_comparator))
    }

    /// Break ties by comparing projected keys with `key_comparator` in reverse.
    pub fn then_by_key_descending_with<K, F, C>(&self, selector: F, key_comparator: C) -> Self
    where
        K: 'static,
        F: Fn(&T) -> K + Send + Sync + 'static,
        C: IntoComparator<K>,
    {
        self.then_by(Self::by_key_descending_with(selector, key_comparator))
    }

    /**
    Create a comparator with the opposite ordering.

    Reversing twice yields the original comparator. Reversing a key comparator flips its direction
    instead of adding a layer.
    */
    pub fn reversed(&self) -> Self {
        match self.node() {
            Node::Identity => self.clone(),
            Node::Reversed(inner) => inner.clone(),
            Node::KeyBased(key) => key.reversed().into(),
            _ => Self::from_node(Node::Reversed(self.clone())),
        }
    }

    /**
    Place absent values before all present values.

    This is a no-op for types that can never be absent. A later placement request on the same
    comparator overrides this one.
    */
    pub fn nulls_first(&self) -> Self
    where
        T: MaybeNull,
    {
        self.nulls_first_in(NullFilterRegistry::global())
    }

    /// Place absent values after all present values. See [`Comparator::nulls_first`].
    pub fn nulls_last(&self) -> Self
    where
        T: MaybeNull,
    {
        self.nulls_last_in(NullFilterRegistry::global())
    }

    /// Like [`Comparator::nulls_first`] but resolving the null filter from `registry`.
    pub fn nulls_first_in(&self, registry: &NullFilterRegistry) -> Self
    where
        T: MaybeNull,
    {
        self.place_nulls(registry, true)
    }

    /// Like [`Comparator::nulls_last`] but resolving the null filter from `registry`.
    pub fn nulls_last_in(&self, registry: &NullFilterRegistry) -> Self
    where
        T: MaybeNull,
    {
        self.place_nulls(registry, false)
    }

    /**
    Place values whose projected key is absent before all other values.

    Whole-value null placement always outranks this, regardless of the order the two were declared
    in. This is a no-op if the key type can never be absent.
    */
    pub fn nulls_first_by<K, F>(&self, selector: F) -> Self
    where
        K: MaybeNull + 'static,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        self.nulls_first_by_in(selector, NullFilterRegistry::global())
    }

    /// Place values whose projected key is absent after all other values.
    pub fn nulls_last_by<K, F>(&self, selector: F) -> Self
    where
        K: MaybeNull + 'static,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        self.nulls_last_by_in(selector, NullFilterRegistry::global())
    }

    /// Like [`Comparator::nulls_first_by`] but resolving the null filter from `registry`.
    pub fn nulls_first_by_in<K, F>(&self, selector: F, registry: &NullFilterRegistry) -> Self
    where
        K: MaybeNull + 'static,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        self.place_key_nulls(selector, registry, true)
    }

    /// Like [`Comparator::nulls_last_by`] but resolving the null filter from `registry`.
    pub fn nulls_last_by_in<K, F>(&self, selector: F, registry: &NullFilterRegistry) -> Self
    where
        K: MaybeNull + 'static,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        self.place_key_nulls(selector, registry, false)
    }

    /**
    Lift this comparator to optional values, placing `None` first.

    Placement requests made on the result afterwards compose with this one, so calling
    [`Comparator::nulls_last`] on the result moves `None` to the end.
    */
    pub fn to_nullable(&self) -> Comparator<Option<T>>
    where
        T: Sized,
    {
        let base = self.clone();
        let lifted = move |a: &Option<T>, b: &Option<T>| match (a, b) {
            (Some(a), Some(b)) => base.try_compare(a, b),
            _ => Ok(a.is_some().cmp(&b.is_some())),
        };

        Comparator::from_node(Node::Opaque(Arc::new(lifted))).nulls_first()
    }

    /// Returns true if this is the identity comparator.
    pub fn is_identity(&self) -> bool {
        matches!(self.node(), Node::Identity)
    }

    /**
    Compare two values.

    # Panics

    Panics if the comparator contains a type-erased comparator that rejects the operands. Use
    [`Comparator::try_compare`] to handle that case.
    */
    pub fn compare(&self, a: &T, b: &T) -> Ordering {
        match self.try_compare(a, b) {
            Ok(ordering) => ordering,
            Err(error) => panic!("{}", error),
        }
    }

    /**
    Compare two values, reporting type mismatches raised by type-erased comparators.

    Comparators built without [`UntypedComparator`](crate::UntypedComparator) never fail.
    */
    pub fn try_compare(&self, a: &T, b: &T) -> ComparatorResult<Ordering> {
        match self.node() {
            Node::Identity => Ok(Ordering::Equal),
            Node::KeyBased(key) => key.try_compare(a, b),
            Node::Compound(compound) => compound.try_compare(a, b),
            Node::WholeValueNulls(placement) => placement.try_compare(a, b),
            Node::PerKeyNulls(placement) => placement.try_compare(a, b),
            Node::Reversed(inner) => inner.try_compare(a, b).map(Ordering::reverse),
            Node::Opaque(comparison) => comparison(a, b),
            Node::Untyped(bridge) => bridge.try_compare(a, b),
        }
    }

    /// Borrow this comparator as a closure e.g. for [`slice::sort_by`].
    pub fn as_fn(&self) -> impl Fn(&T, &T) -> Ordering + '_ {
        move |a: &T, b: &T| self.compare(a, b)
    }

    /// Get a comparison function backed by this comparator.
    pub fn to_fn(&self) -> ComparisonFn<T> {
        ComparisonFn {
            source: ComparisonSource::Comparator(self.clone()),
        }
    }
}

/// Private methods
impl<T: ?Sized + 'static> Comparator<T> {
    /// Get the precedence coordinator of this comparator if it is a null placement layer.
    fn as_coordinator(&self) -> Option<&dyn PrecedenceCoordinator<T>> {
        match self.node() {
            Node::WholeValueNulls(placement) => Some(placement as &dyn PrecedenceCoordinator<T>),
            Node::PerKeyNulls(placement) => Some(placement as &dyn PrecedenceCoordinator<T>),
            _ => None,
        }
    }

    fn place_nulls(&self, registry: &NullFilterRegistry, nulls_first: bool) -> Self
    where
        T: MaybeNull,
    {
        match registry.get_filter::<T>(nulls_first) {
            Some(filter) => null_placement::whole_value(self, filter),
            None => {
                log::trace!(
                    "Ignoring null placement for non-nullable type {}",
                    std::any::type_name::<T>()
                );
                self.clone()
            }
        }
    }

    fn place_key_nulls<K, F>(
        &self,
        selector: F,
        registry: &NullFilterRegistry,
        nulls_first: bool,
    ) -> Self
    where
        K: MaybeNull + 'static,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        match registry.get_filter::<K>(nulls_first) {
            Some(filter) => null_placement::per_key(self, KeyNullFilter::new(selector, filter)),
            None => {
                log::trace!(
                    "Ignoring null placement for non-nullable key type {}",
                    std::any::type_name::<K>()
                );
                self.clone()
            }
        }
    }
}

impl<T: ?Sized> Clone for Comparator<T> {
    fn clone(&self) -> Self {
        Self {
            node: Arc::clone(&self.node),
        }
    }
}

impl<T: ?Sized + 'static> Default for Comparator<T> {
    fn default() -> Self {
        Self::identity()
    }
}

impl<T: ?Sized> fmt::Debug for Comparator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.node() {
            Node::Identity => f.write_str("Identity"),
            Node::KeyBased(key) => fmt::Debug::fmt(key, f),
            Node::Compound(compound) => fmt::Debug::fmt(compound, f),
            Node::WholeValueNulls(placement) => fmt::Debug::fmt(placement, f),
            Node::PerKeyNulls(placement) => fmt::Debug::fmt(placement, f),
            Node::Reversed(inner) => f.debug_tuple("Reversed").field(inner).finish(),
            Node::Opaque(_) => f.write_str("Opaque"),
            Node::Untyped(_) => f.write_str("Untyped"),
        }
    }
}

/**
A plain comparison function.

A `ComparisonFn` obtained from [`Comparator::to_fn`] remembers the comparator backing it so that
converting it back with [`Comparator::from_comparison`] does not add a layer.
*/
pub struct ComparisonFn<T: ?Sized> {
    source: ComparisonSource<T>,
}

enum ComparisonSource<T: ?Sized> {
    Comparator(Comparator<T>),
    Function(Arc<dyn Fn(&T, &T) -> Ordering + Send + Sync>),
}

/// Public methods
impl<T: ?Sized + 'static> ComparisonFn<T> {
    /// Create a new [`ComparisonFn`] from a closure.
    pub fn new<F>(function: F) -> Self
    where
        F: Fn(&T, &T) -> Ordering + Send + Sync + 'static,
    {
        Self {
            source: ComparisonSource::Function(Arc::new(function)),
        }
    }

    /// Call the function.
    pub fn call(&self, a: &T, b: &T) -> Ordering {
        match &self.source {
            ComparisonSource::Comparator(comparator) => comparator.compare(a, b),
            ComparisonSource::Function(function) => function(a, b),
        }
    }

    /// Returns true if the function is backed by a [`Comparator`].
    pub fn is_comparator_backed(&self) -> bool {
        matches!(self.source, ComparisonSource::Comparator(_))
    }
}

impl<T: ?Sized> Clone for ComparisonFn<T> {
    fn clone(&self) -> Self {
        let source = match &self.source {
            ComparisonSource::Comparator(comparator) => {
                ComparisonSource::Comparator(comparator.clone())
            }
            ComparisonSource::Function(function) => {
                ComparisonSource::Function(Arc::clone(function))
            }
        };

        Self { source }
    }
}

impl<T: ?Sized> fmt::Debug for ComparisonFn<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            ComparisonSource::Comparator(comparator) => {
                f.debug_tuple("ComparisonFn").field(comparator).finish()
            }
            ComparisonSource::Function(_) => f.write_str("ComparisonFn(<function>)"),
        }
    }
}

/// Conversion into a [`Comparator`], accepted wherever a combinator takes another comparator.
pub trait IntoComparator<T: ?Sized> {
    /// Convert `self` into a comparator.
    fn into_comparator(self) -> Comparator<T>;
}

impl<T: ?Sized> IntoComparator<T> for Comparator<T> {
    fn into_comparator(self) -> Comparator<T> {
        self
    }
}

impl<T: ?Sized> IntoComparator<T> for &Comparator<T> {
    fn into_comparator(self) -> Comparator<T> {
        self.clone()
    }
}

impl<T: ?Sized + 'static> IntoComparator<T> for ComparisonFn<T> {
    fn into_comparator(self) -> Comparator<T> {
        Comparator::from_comparison(self)
    }
}

impl<T, F> IntoComparator<T> for F
where
    T: ?Sized + 'static,
    F: Fn(&T, &T) -> Ordering + Send + Sync + 'static,
{
    fn into_comparator(self) -> Comparator<T> {
        Comparator::from_fn(self)
    }
}
