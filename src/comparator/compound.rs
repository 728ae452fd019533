//! Lexicographic tie-breaking over a flat list of comparators.

use std::cmp::Ordering;
use std::fmt;

use super::{Comparator, Node};
use crate::errors::ComparatorResult;

/**
An ordered list of comparators evaluated left-to-right until one of them returns a non-equal
ordering.

# Invariants

1. No element is the identity comparator. Identity comparators are dropped when appended.
1. No element is itself a compound comparator. Nested compounds are spliced into the parent list.
*/
pub(crate) struct CompoundComparator<T: ?Sized> {
    comparators: Vec<Comparator<T>>,
}

/// Crate-only methods
impl<T: ?Sized + 'static> CompoundComparator<T> {
    /// Create a new, empty [`CompoundComparator`].
    pub(crate) fn new() -> Self {
        Self {
            comparators: vec![],
        }
    }

    /// Build the normalized composition of `first` followed by `second`.
    pub(crate) fn of(first: &Comparator<T>, second: &Comparator<T>) -> Comparator<T> {
        let mut compound = Self::new();
        compound.append(first);
        compound.append(second);
        compound.normalize()
    }

    /// Append a comparator, dropping identities and flattening nested compounds.
    pub(crate) fn append(&mut self, comparator: &Comparator<T>) {
        match comparator.node() {
            Node::Identity => {}
            Node::Compound(nested) => self.comparators.extend(nested.comparators.iter().cloned()),
            _ => self.comparators.push(comparator.clone()),
        }
    }

    pub(crate) fn try_compare(&self, a: &T, b: &T) -> ComparatorResult<Ordering> {
        for comparator in self.comparators.iter() {
            let ordering = comparator.try_compare(a, b)?;
            if ordering != Ordering::Equal {
                return Ok(ordering);
            }
        }

        Ok(Ordering::Equal)
    }

    /**
    Reduce the compound to the simplest equivalent comparator.

    An empty compound is the identity comparator and a compound with a single element is that
    element. Only compounds with two or more elements stay wrapped.
    */
    pub(crate) fn normalize(mut self) -> Comparator<T> {
        if self.comparators.len() > 1 {
            return Comparator::from_node(Node::Compound(self));
        }

        self.comparators.pop().unwrap_or_else(Comparator::identity)
    }
}

impl<T: ?Sized> fmt::Debug for CompoundComparator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Compound").field(&self.comparators).finish()
    }
}
