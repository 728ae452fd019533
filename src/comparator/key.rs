//! Comparators that order values by a key projected out of them.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use super::{Comparator, FallibleComparison, Node};
use crate::errors::ComparatorResult;

/**
Compares two values by projecting both through a selector and comparing the resulting keys.

The key type is erased once the comparator is built so that key comparators over different key
types can sit side by side in a compound comparator.
*/
pub(crate) struct KeyComparator<T: ?Sized> {
    /// Projects both operands and compares the keys in ascending order.
    compare_keys: FallibleComparison<T>,

    /// Whether the key ordering is inverted.
    descending: bool,
}

/// Crate-only methods
impl<T: ?Sized + 'static> KeyComparator<T> {
    /// Create a new instance of [`KeyComparator`].
    pub(crate) fn new<K, F>(selector: F, key_comparator: Comparator<K>, descending: bool) -> Self
    where
        K: 'static,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        let compare_keys = move |a: &T, b: &T| {
            let (key_a, key_b) = (selector(a), selector(b));
            key_comparator.try_compare(&key_a, &key_b)
        };

        Self {
            compare_keys: Arc::new(compare_keys),
            descending,
        }
    }

    /// Get a key comparator over the same key with the opposite direction.
    pub(crate) fn reversed(&self) -> Self {
        Self {
            compare_keys: Arc::clone(&self.compare_keys),
            descending: !self.descending,
        }
    }

    pub(crate) fn try_compare(&self, a: &T, b: &T) -> ComparatorResult<Ordering> {
        let ordering = (self.compare_keys)(a, b)?;
        if self.descending {
            return Ok(ordering.reverse());
        }

        Ok(ordering)
    }
}

impl<T: ?Sized> From<KeyComparator<T>> for Comparator<T> {
    fn from(key: KeyComparator<T>) -> Self {
        Comparator::from_node(Node::KeyBased(key))
    }
}

impl<T: ?Sized> fmt::Debug for KeyComparator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyBased")
            .field("descending", &self.descending)
            .finish()
    }
}
