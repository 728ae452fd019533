/*!
This module decides how absent values are detected for a compared type and caches the resulting
filters.

A null filter produces an early verdict when at least one of the operands being compared is absent.
When both operands are present the filter has no opinion and comparison falls through to the
wrapped comparator.

# Null categories

Whether a type can be absent at all is a compile-time property expressed through [`MaybeNull`]:

1. Reference-like types (e.g. raw pointers) carry their own null value.
1. Non-nullable value types (e.g. integers and strings) can never be absent, so no filter exists for
   them and null placement requests on them are silently ignored.
1. Nullable wrappers (i.e. [`Option`]) are absent when they hold no value.
*/

use parking_lot::RwLock;
use std::any::{type_name, Any, TypeId};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::Lazy;

use crate::config::NULL_FILTER_REGISTRY_INITIAL_CAPACITY;

/// The registry shared by every comparator that does not specify its own.
static GLOBAL_REGISTRY: Lazy<NullFilterRegistry> = Lazy::new(NullFilterRegistry::new);

/// The ways a type can represent an absent value.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NullCategory {
    /// The type has a built-in null value e.g. a null pointer.
    Reference,
    /// The type can never be absent.
    Value,
    /// The type wraps a value that may or may not be present e.g. [`Option`].
    NullableValue,
}

/**
Trait for types that can be checked for absence.

Implement this for custom types to make them usable with null placement combinators. Types that
are never absent should use [`NullCategory::Value`] so that null placement is skipped for them
entirely.
*/
pub trait MaybeNull {
    /// The null category of the type.
    const CATEGORY: NullCategory;

    /// Returns true if the value is absent.
    fn is_null(&self) -> bool;
}

impl<T> MaybeNull for Option<T> {
    const CATEGORY: NullCategory = NullCategory::NullableValue;

    fn is_null(&self) -> bool {
        self.is_none()
    }
}

impl<T: ?Sized> MaybeNull for *const T {
    const CATEGORY: NullCategory = NullCategory::Reference;

    fn is_null(&self) -> bool {
        <*const T>::is_null(*self)
    }
}

impl<T: ?Sized> MaybeNull for *mut T {
    const CATEGORY: NullCategory = NullCategory::Reference;

    fn is_null(&self) -> bool {
        <*mut T>::is_null(*self)
    }
}

/// Implements [`MaybeNull`] for types that can never be absent.
macro_rules! impl_non_nullable {
    ($($ty:ty),* $(,)?) => {
        $(
            impl MaybeNull for $ty {
                const CATEGORY: NullCategory = NullCategory::Value;

                fn is_null(&self) -> bool {
                    false
                }
            }
        )*
    };
}

impl_non_nullable!(
    (),
    bool,
    char,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    f32,
    f64,
    str,
    String,
    Duration,
    Ordering,
);

/// Implements [`MaybeNull`] for generic containers that are never absent themselves.
macro_rules! impl_non_nullable_container {
    ($($container:ident),* $(,)?) => {
        $(
            impl<T: ?Sized> MaybeNull for $container<T> {
                const CATEGORY: NullCategory = NullCategory::Value;

                fn is_null(&self) -> bool {
                    false
                }
            }
        )*
    };
}

impl_non_nullable_container!(Box, Arc, Rc);

impl<T: ?Sized> MaybeNull for &T {
    const CATEGORY: NullCategory = NullCategory::Value;

    fn is_null(&self) -> bool {
        false
    }
}

impl<T> MaybeNull for Vec<T> {
    const CATEGORY: NullCategory = NullCategory::Value;

    fn is_null(&self) -> bool {
        false
    }
}

/// Implements [`MaybeNull`] for tuples. A tuple is a value even when its elements are nullable.
macro_rules! impl_non_nullable_tuple {
    ($(($($name:ident),+)),* $(,)?) => {
        $(
            impl<$($name),+> MaybeNull for ($($name,)+) {
                const CATEGORY: NullCategory = NullCategory::Value;

                fn is_null(&self) -> bool {
                    false
                }
            }
        )*
    };
}

impl_non_nullable_tuple!((A), (A, B), (A, B, C), (A, B, C, D));

/**
A policy object that produces an early verdict when one or both operands are absent.

Filters are tiny and [`Copy`]. They are obtained from a [`NullFilterRegistry`].
*/
pub struct NullFilter<T: ?Sized> {
    /// Whether absent values sort before present values.
    nulls_first: bool,

    /// Probe used to detect absent values.
    is_null: fn(&T) -> bool,
}

/// Public methods
impl<T: ?Sized> NullFilter<T> {
    /// Returns true if this filter places absent values first.
    pub fn nulls_first(&self) -> bool {
        self.nulls_first
    }

    /**
    Get the early verdict for the pair of values.

    Returns:

    1. `None` if both values are present
    1. [`Ordering::Equal`] if both values are absent
    1. An ordering that puts the absent value first or last per the filter's placement when
       exactly one value is absent
    */
    pub fn verdict(&self, a: &T, b: &T) -> Option<Ordering> {
        match ((self.is_null)(a), (self.is_null)(b)) {
            (false, false) => None,
            (true, true) => Some(Ordering::Equal),
            (true, false) => Some(self.null_ordering()),
            (false, true) => Some(self.null_ordering().reverse()),
        }
    }
}

/// Private methods
impl<T: ?Sized> NullFilter<T> {
    /// Create a new filter for a type that has a null representation.
    fn new(nulls_first: bool) -> Self
    where
        T: MaybeNull,
    {
        Self {
            nulls_first,
            is_null: <T as MaybeNull>::is_null,
        }
    }

    /// The ordering of an absent left operand against a present right operand.
    fn null_ordering(&self) -> Ordering {
        if self.nulls_first {
            Ordering::Less
        } else {
            Ordering::Greater
        }
    }
}

impl<T: ?Sized> Clone for NullFilter<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ?Sized> Copy for NullFilter<T> {}

impl<T: ?Sized> fmt::Debug for NullFilter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NullFilter")
            .field("type", &type_name::<T>())
            .field("nulls_first", &self.nulls_first)
            .finish()
    }
}

/// The two filters kept for every nullable type.
struct FilterPair<T: ?Sized> {
    nulls_first: NullFilter<T>,
    nulls_last: NullFilter<T>,
}

impl<T: ?Sized + MaybeNull> FilterPair<T> {
    fn new() -> Self {
        Self {
            nulls_first: NullFilter::new(true),
            nulls_last: NullFilter::new(false),
        }
    }

    fn select(&self, nulls_first: bool) -> NullFilter<T> {
        if nulls_first {
            self.nulls_first
        } else {
            self.nulls_last
        }
    }
}

/**
A cache mapping a compared type to its pair of null filters.

The registry starts out empty. Both filters for a type are created together the first time the
type is looked up. Entries are never evicted because the set of compared types in a program is
small and fixed.

# Concurrency

Lookups only take a read lock. A miss upgrades to a write lock and inserts the filter pair only if
no other thread got there first, so racing threads always observe a complete entry.
*/
pub struct NullFilterRegistry {
    /// Filter pairs keyed by the identity of the compared type.
    filters: RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
}

/// Public methods
impl NullFilterRegistry {
    /// Create a new, empty [`NullFilterRegistry`].
    pub fn new() -> Self {
        Self {
            filters: RwLock::new(HashMap::with_capacity(
                NULL_FILTER_REGISTRY_INITIAL_CAPACITY,
            )),
        }
    }

    /**
    Get the process-wide registry.

    The registry is created empty on first use and lives for the rest of the process.
    */
    pub fn global() -> &'static NullFilterRegistry {
        &GLOBAL_REGISTRY
    }

    /**
    Get the null filter for `T` with the requested placement.

    Returns `None` if `T` can never be absent. Callers must treat that as "nothing to do" rather
    than as an error.
    */
    pub fn get_filter<T>(&self, nulls_first: bool) -> Option<NullFilter<T>>
    where
        T: MaybeNull + ?Sized + 'static,
    {
        if T::CATEGORY == NullCategory::Value {
            return None;
        }

        let type_id = TypeId::of::<T>();
        if let Some(pair) = self.filters.read().get(&type_id) {
            return (**pair)
                .downcast_ref::<FilterPair<T>>()
                .map(|pair| pair.select(nulls_first));
        }

        let mut filters = self.filters.write();
        let pair = filters.entry(type_id).or_insert_with(|| {
            log::debug!(
                "Creating null filters for type {} ({:?})",
                type_name::<T>(),
                T::CATEGORY
            );
            Arc::new(FilterPair::<T>::new()) as Arc<dyn Any + Send + Sync>
        });

        (**pair)
            .downcast_ref::<FilterPair<T>>()
            .map(|pair| pair.select(nulls_first))
    }

    /// Get the number of types with cached filters.
    pub fn len(&self) -> usize {
        self.filters.read().len()
    }

    /// Returns `true` if no filters have been cached yet, otherwise `false`.
    pub fn is_empty(&self) -> bool {
        self.filters.read().is_empty()
    }
}

impl Default for NullFilterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for NullFilterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NullFilterRegistry")
            .field("cached_types", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn option_filter_orders_absent_values_by_placement() {
        let registry = NullFilterRegistry::new();
        let first = registry.get_filter::<Option<u32>>(true).unwrap();
        let last = registry.get_filter::<Option<u32>>(false).unwrap();

        assert_eq!(first.verdict(&None, &Some(1)), Some(Ordering::Less));
        assert_eq!(first.verdict(&Some(1), &None), Some(Ordering::Greater));
        assert_eq!(last.verdict(&None, &Some(1)), Some(Ordering::Greater));
        assert_eq!(last.verdict(&Some(1), &None), Some(Ordering::Less));
    }

    #[test]
    fn filter_treats_two_absent_values_as_equal() {
        let registry = NullFilterRegistry::new();
        let filter = registry.get_filter::<Option<String>>(false).unwrap();

        assert_eq!(filter.verdict(&None, &None), Some(Ordering::Equal));
    }

    #[test]
    fn filter_has_no_verdict_when_both_values_are_present() {
        let registry = NullFilterRegistry::new();
        let filter = registry.get_filter::<Option<u32>>(true).unwrap();

        assert_eq!(filter.verdict(&Some(9), &Some(1)), None);
    }

    #[test]
    fn non_nullable_types_have_no_filter() {
        let registry = NullFilterRegistry::new();

        assert!(registry.get_filter::<u32>(true).is_none());
        assert!(registry.get_filter::<String>(false).is_none());
        assert!(registry.get_filter::<str>(false).is_none());
        assert!(registry.get_filter::<(u8, Option<u8>)>(false).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn raw_pointers_are_filtered_as_references() {
        let registry = NullFilterRegistry::new();
        let filter = registry.get_filter::<*const u8>(true).unwrap();
        let value = 7_u8;
        let present: *const u8 = &value;

        assert_eq!(
            filter.verdict(&std::ptr::null(), &present),
            Some(Ordering::Less)
        );
        assert_eq!(filter.verdict(&present, &present), None);
    }

    #[test]
    fn registry_populates_both_placements_once_per_type() {
        let registry = NullFilterRegistry::new();

        let first = registry.get_filter::<Option<u32>>(true).unwrap();
        assert_eq!(registry.len(), 1);
        let last = registry.get_filter::<Option<u32>>(false).unwrap();
        assert_eq!(registry.len(), 1);
        assert!(first.nulls_first());
        assert!(!last.nulls_first());

        registry.get_filter::<Option<i64>>(true).unwrap();
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn global_registry_is_shared() {
        let registry = NullFilterRegistry::global();
        registry.get_filter::<Option<char>>(true).unwrap();

        assert!(std::ptr::eq(registry, NullFilterRegistry::global()));
        assert!(!NullFilterRegistry::global().is_empty());
    }
}
