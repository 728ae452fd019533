/*!
Null placement layers and the rules that govern how later composition requests are merged into
them.

There are two kinds of layer. A whole-value layer checks the compared values themselves for absence.
A per-key layer checks a key projected out of the compared values. Both run their null filter first
and only defer to the inner comparator when the filter has no verdict.

# Precedence

Whole-value null handling must always run before per-key null handling, and a null check must
always run before the tie-breakers that were appended after it, no matter the order in which the
combinators were called. Layers enforce this by acting as a [`PrecedenceCoordinator`]: when a new
placement or tie-breaker is requested on top of a layer, the layer decides whether to keep itself,
replace itself, wrap itself or push the request underneath its own filter.
*/

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use super::Comparator;
use super::Node;
use crate::errors::ComparatorResult;
use crate::null_filter::NullFilter;

/**
The capability of a null placement layer to control how new composition requests are merged into
it.

This is only consulted while comparators are being composed and never while comparing.
*/
pub(crate) trait PrecedenceCoordinator<T: ?Sized> {
    /// Apply a whole-value null placement on top of this layer.
    fn create_whole_value_nulls(&self, filter: NullFilter<T>) -> Comparator<T>;

    /// Apply a per-key null placement on top of this layer.
    fn create_per_key_nulls(&self, filter: KeyNullFilter<T>) -> Comparator<T>;

    /// Append a tie-breaker without letting it run before this layer's null check.
    fn create_compound(&self, next: &Comparator<T>) -> Comparator<T>;
}

/// Apply a whole-value null placement to `base`.
pub(crate) fn whole_value<T: ?Sized + 'static>(
    base: &Comparator<T>,
    filter: NullFilter<T>,
) -> Comparator<T> {
    match base.as_coordinator() {
        Some(coordinator) => coordinator.create_whole_value_nulls(filter),
        None => WholeValueNullPlacement::new(filter, base.clone()).into(),
    }
}

/// Apply a per-key null placement to `base`.
pub(crate) fn per_key<T: ?Sized + 'static>(
    base: &Comparator<T>,
    filter: KeyNullFilter<T>,
) -> Comparator<T> {
    match base.as_coordinator() {
        Some(coordinator) => coordinator.create_per_key_nulls(filter),
        None => PerKeyNullPlacement::new(filter, base.clone()).into(),
    }
}

/**
A null filter applied to a key projected out of the compared values.

The key type is erased when the filter is built.
*/
pub(crate) struct KeyNullFilter<T: ?Sized> {
    /// Projects both operands and produces the key filter's verdict.
    verdict: Arc<dyn Fn(&T, &T) -> Option<Ordering> + Send + Sync>,

    /// Whether values with an absent key sort first.
    nulls_first: bool,
}

/// Crate-only methods
impl<T: ?Sized + 'static> KeyNullFilter<T> {
    /// Create a new instance of [`KeyNullFilter`].
    pub(crate) fn new<K, F>(selector: F, filter: NullFilter<K>) -> Self
    where
        K: 'static,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        let verdict = move |a: &T, b: &T| filter.verdict(&selector(a), &selector(b));

        Self {
            verdict: Arc::new(verdict),
            nulls_first: filter.nulls_first(),
        }
    }

    fn verdict(&self, a: &T, b: &T) -> Option<Ordering> {
        (self.verdict)(a, b)
    }
}

impl<T: ?Sized> Clone for KeyNullFilter<T> {
    fn clone(&self) -> Self {
        Self {
            verdict: Arc::clone(&self.verdict),
            nulls_first: self.nulls_first,
        }
    }
}

/// Places absent values first or last, then defers to the inner comparator.
pub(crate) struct WholeValueNullPlacement<T: ?Sized> {
    filter: NullFilter<T>,
    inner: Comparator<T>,
}

/// Crate-only methods
impl<T: ?Sized + 'static> WholeValueNullPlacement<T> {
    /// Create a new instance of [`WholeValueNullPlacement`].
    pub(crate) fn new(filter: NullFilter<T>, inner: Comparator<T>) -> Self {
        Self { filter, inner }
    }

    pub(crate) fn try_compare(&self, a: &T, b: &T) -> ComparatorResult<Ordering> {
        match self.filter.verdict(a, b) {
            Some(ordering) => Ok(ordering),
            None => self.inner.try_compare(a, b),
        }
    }
}

impl<T: ?Sized + 'static> PrecedenceCoordinator<T> for WholeValueNullPlacement<T> {
    fn create_whole_value_nulls(&self, filter: NullFilter<T>) -> Comparator<T> {
        if filter.nulls_first() == self.filter.nulls_first() {
            log::trace!("Keeping the existing whole-value null placement");
            return self.clone().into();
        }

        log::trace!(
            "Replacing the whole-value null placement (nulls first: {})",
            filter.nulls_first()
        );
        Self::new(filter, self.inner.clone()).into()
    }

    fn create_per_key_nulls(&self, filter: KeyNullFilter<T>) -> Comparator<T> {
        // The whole-value check has to stay outermost
        log::trace!("Placing a per-key null check underneath the whole-value null check");
        Self::new(self.filter, per_key(&self.inner, filter)).into()
    }

    fn create_compound(&self, next: &Comparator<T>) -> Comparator<T> {
        Self::new(self.filter, self.inner.then_by(next.clone())).into()
    }
}

impl<T: ?Sized> Clone for WholeValueNullPlacement<T> {
    fn clone(&self) -> Self {
        Self {
            filter: self.filter,
            inner: self.inner.clone(),
        }
    }
}

impl<T: ?Sized> From<WholeValueNullPlacement<T>> for Comparator<T> {
    fn from(placement: WholeValueNullPlacement<T>) -> Self {
        Comparator::from_node(Node::WholeValueNulls(placement))
    }
}

impl<T: ?Sized> fmt::Debug for WholeValueNullPlacement<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WholeValueNulls")
            .field("nulls_first", &self.filter.nulls_first())
            .field("inner", &self.inner)
            .finish()
    }
}

/// Places values with an absent key first or last, then defers to the inner comparator.
pub(crate) struct PerKeyNullPlacement<T: ?Sized> {
    filter: KeyNullFilter<T>,
    inner: Comparator<T>,
}

/// Crate-only methods
impl<T: ?Sized + 'static> PerKeyNullPlacement<T> {
    /// Create a new instance of [`PerKeyNullPlacement`].
    pub(crate) fn new(filter: KeyNullFilter<T>, inner: Comparator<T>) -> Self {
        Self { filter, inner }
    }

    pub(crate) fn try_compare(&self, a: &T, b: &T) -> ComparatorResult<Ordering> {
        match self.filter.verdict(a, b) {
            Some(ordering) => Ok(ordering),
            None => self.inner.try_compare(a, b),
        }
    }
}

impl<T: ?Sized + 'static> PrecedenceCoordinator<T> for PerKeyNullPlacement<T> {
    fn create_whole_value_nulls(&self, filter: NullFilter<T>) -> Comparator<T> {
        log::trace!("Wrapping a per-key null placement in a whole-value null placement");
        WholeValueNullPlacement::new(filter, self.clone().into()).into()
    }

    fn create_per_key_nulls(&self, filter: KeyNullFilter<T>) -> Comparator<T> {
        // Keys cannot be compared for sameness so an existing per-key layer is never replaced
        log::trace!("Wrapping a per-key null placement in another per-key null placement");
        Self::new(filter, self.clone().into()).into()
    }

    fn create_compound(&self, next: &Comparator<T>) -> Comparator<T> {
        Self::new(self.filter.clone(), self.inner.then_by(next.clone())).into()
    }
}

impl<T: ?Sized> Clone for PerKeyNullPlacement<T> {
    fn clone(&self) -> Self {
        Self {
            filter: self.filter.clone(),
            inner: self.inner.clone(),
        }
    }
}

impl<T: ?Sized> From<PerKeyNullPlacement<T>> for Comparator<T> {
    fn from(placement: PerKeyNullPlacement<T>) -> Self {
        Comparator::from_node(Node::PerKeyNulls(placement))
    }
}

impl<T: ?Sized> fmt::Debug for PerKeyNullPlacement<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PerKeyNulls")
            .field("nulls_first", &self.filter.nulls_first)
            .field("inner", &self.inner)
            .finish()
    }
}
