/*!
Equality comparers built from projected keys.

An [`EqualityComparator`] pairs an equality test with a hash function that is consistent with it, so
it can drive an external hash table. Compound comparers are built with [`EqualityComparator::and`]
and follow the same flattening rules as compound comparators.

Unlike ordering comparators there is no null placement layer here. Key selectors are expected to
deal with absent values themselves, e.g. by projecting to an [`Option`].
*/

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::config::{COMPOUND_HASH_SEED, COMPOUND_HASH_SHIFT};

/// An equality test paired with a consistent hash function over values of type `T`.
pub struct EqualityComparator<T: ?Sized> {
    node: Arc<EqualityNode<T>>,
}

enum EqualityNode<T: ?Sized> {
    /// Compares a single projected key.
    Key(KeyEquality<T>),

    /**
    All components must agree for two values to be equal.

    Holds at least two components and none of them is itself a compound.
    */
    Compound(Vec<EqualityComparator<T>>),
}

struct KeyEquality<T: ?Sized> {
    equals: Arc<dyn Fn(&T, &T) -> bool + Send + Sync>,
    hash: Arc<dyn Fn(&T) -> u64 + Send + Sync>,
}

/// Public methods
impl<T: ?Sized + 'static> EqualityComparator<T> {
    /// Create an equality comparer using the [`Eq`] and [`Hash`] implementations of `T`.
    pub fn natural() -> Self
    where
        T: Eq + Hash,
    {
        Self::from_fns(|a: &T, b: &T| a == b, |value: &T| hash_of(value))
    }

    /**
    Create an equality comparer from an equality test and a hash function.

    Values that are equal must hash to the same value.
    */
    pub fn from_fns<E, H>(equals: E, hash: H) -> Self
    where
        E: Fn(&T, &T) -> bool + Send + Sync + 'static,
        H: Fn(&T) -> u64 + Send + Sync + 'static,
    {
        Self::from_node(EqualityNode::Key(KeyEquality {
            equals: Arc::new(equals),
            hash: Arc::new(hash),
        }))
    }

    /// Create an equality comparer that compares a projected key with its natural equality.
    pub fn using<K, F>(selector: F) -> Self
    where
        K: Eq + Hash + 'static,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        Self::using_with(selector, EqualityComparator::<K>::natural())
    }

    /// Create an equality comparer that compares a projected key with `key_comparer`.
    pub fn using_with<K, F>(selector: F, key_comparer: EqualityComparator<K>) -> Self
    where
        K: 'static,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        let selector = Arc::new(selector);
        let hash_selector = Arc::clone(&selector);
        let hash_comparer = key_comparer.clone();

        Self::from_fns(
            move |a: &T, b: &T| key_comparer.equals(&(*selector)(a), &(*selector)(b)),
            move |value: &T| hash_comparer.hash(&(*hash_selector)(value)),
        )
    }

    /**
    Create an equality comparer that requires both this comparer and `other` to consider values
    equal.

    Nested compounds are flattened, so `a.and(b.and(c))` has three components just like
    `a.and(b).and(c)`.
    */
    pub fn and(&self, other: &EqualityComparator<T>) -> Self {
        let mut components = vec![];
        for comparer in [self, other] {
            match &*comparer.node {
                EqualityNode::Compound(nested) => components.extend(nested.iter().cloned()),
                EqualityNode::Key(_) => components.push(comparer.clone()),
            }
        }

        Self::from_node(EqualityNode::Compound(components))
    }

    /// Extend this comparer with the natural equality of a projected key.
    pub fn and_using<K, F>(&self, selector: F) -> Self
    where
        K: Eq + Hash + 'static,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        self.and(&Self::using(selector))
    }

    /// Extend this comparer with a projected key compared by `key_comparer`.
    pub fn and_using_with<K, F>(&self, selector: F, key_comparer: EqualityComparator<K>) -> Self
    where
        K: 'static,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        self.and(&Self::using_with(selector, key_comparer))
    }

    /// Returns true if the comparer considers `a` and `b` equal.
    pub fn equals(&self, a: &T, b: &T) -> bool {
        match &*self.node {
            EqualityNode::Key(key) => (key.equals)(a, b),
            EqualityNode::Compound(components) => {
                components.iter().all(|component| component.equals(a, b))
            }
        }
    }

    /**
    Get the hash code of `value`.

    Compound comparers fold the hashes of their components in declaration order, so swapping two
    components keeps [`EqualityComparator::equals`] intact but may change the hash.
    */
    pub fn hash(&self, value: &T) -> u64 {
        match &*self.node {
            EqualityNode::Key(key) => (key.hash)(value),
            EqualityNode::Compound(components) => {
                components
                    .iter()
                    .fold(COMPOUND_HASH_SEED, |hash, component| {
                        mix(hash, component.hash(value))
                    })
            }
        }
    }

    /// Get the number of keys compared by this comparer.
    pub fn len(&self) -> usize {
        match &*self.node {
            EqualityNode::Key(_) => 1,
            EqualityNode::Compound(components) => components.len(),
        }
    }

    /// Always false. An equality comparer compares at least one key.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Pair `value` with this comparer so that it can be stored in a hash table.
    pub fn keyed(&self, value: T) -> Keyed<T>
    where
        T: Sized,
    {
        Keyed {
            value,
            comparer: self.clone(),
        }
    }
}

/// Private methods
impl<T: ?Sized> EqualityComparator<T> {
    fn from_node(node: EqualityNode<T>) -> Self {
        Self {
            node: Arc::new(node),
        }
    }
}

impl<T: ?Sized> Clone for EqualityComparator<T> {
    fn clone(&self) -> Self {
        Self {
            node: Arc::clone(&self.node),
        }
    }
}

impl<T: ?Sized> fmt::Debug for EqualityComparator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.node {
            EqualityNode::Key(_) => f.write_str("KeyEquality"),
            EqualityNode::Compound(components) => {
                f.debug_tuple("CompoundEquality").field(components).finish()
            }
        }
    }
}

/// Mix the next component hash into the running hash.
fn mix(hash: u64, next: u64) -> u64 {
    (hash << COMPOUND_HASH_SHIFT).wrapping_add(hash) ^ next
}

/// Hash a value with the standard library's default hasher.
fn hash_of<T: Hash + ?Sized>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/**
A value paired with the equality comparer that decides its identity.

This implements [`Eq`] and [`Hash`] through the comparer, so values can be used as keys of a
[`HashMap`](std::collections::HashMap) or members of a [`HashSet`](std::collections::HashSet) under
a custom notion of equality. All keys in one table should share the same comparer.
*/
#[derive(Clone)]
pub struct Keyed<T> {
    value: T,
    comparer: EqualityComparator<T>,
}

/// Public methods
impl<T: 'static> Keyed<T> {
    /// Get a reference to the wrapped value.
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Unwrap the value.
    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T: 'static> PartialEq for Keyed<T> {
    fn eq(&self, other: &Self) -> bool {
        self.comparer.equals(&self.value, &other.value)
    }
}

impl<T: 'static> Eq for Keyed<T> {}

impl<T: 'static> Hash for Keyed<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.comparer.hash(&self.value));
    }
}

impl<T: fmt::Debug> fmt::Debug for Keyed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Keyed").field(&self.value).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Clone, Debug, PartialEq)]
    struct Person {
        first_name: String,
        last_name: String,
        age: u32,
    }

    fn person(first_name: &str, last_name: &str, age: u32) -> Person {
        Person {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            age,
        }
    }

    fn by_first_name() -> EqualityComparator<Person> {
        EqualityComparator::using(|p: &Person| p.first_name.clone())
    }

    fn by_last_name() -> EqualityComparator<Person> {
        EqualityComparator::using(|p: &Person| p.last_name.clone())
    }

    #[test]
    fn key_equality_only_looks_at_the_key() {
        let comparer = by_last_name();
        let a = person("Ada", "Lovelace", 36);
        let b = person("Augusta", "Lovelace", 12);

        assert!(comparer.equals(&a, &b));
        assert_eq!(comparer.hash(&a), comparer.hash(&b));
        assert!(!comparer.equals(&a, &person("Ada", "Byron", 36)));
    }

    #[test]
    fn key_hash_matches_the_natural_hash_of_the_key() {
        let comparer = by_last_name();
        let natural = EqualityComparator::<String>::natural();
        let ada = person("Ada", "Lovelace", 36);

        assert_eq!(comparer.hash(&ada), natural.hash(&"Lovelace".to_string()));
    }

    #[test]
    fn compound_equality_requires_every_component() {
        let comparer = by_last_name().and(&by_first_name());

        assert!(comparer.equals(&person("Ada", "Lovelace", 36), &person("Ada", "Lovelace", 99)));
        assert!(!comparer.equals(
            &person("Ada", "Lovelace", 36),
            &person("Augusta", "Lovelace", 36)
        ));
    }

    #[test]
    fn compound_hash_folds_components_in_declaration_order() {
        let ada = person("Ada", "Lovelace", 36);
        let last_then_first = by_last_name().and(&by_first_name());
        let first_then_last = by_first_name().and(&by_last_name());

        let expected = mix(mix(0, by_last_name().hash(&ada)), by_first_name().hash(&ada));
        assert_eq!(last_then_first.hash(&ada), expected);
        assert_ne!(last_then_first.hash(&ada), first_then_last.hash(&ada));
        assert_eq!(
            last_then_first.equals(&ada, &ada),
            first_then_last.equals(&ada, &ada)
        );
    }

    #[test]
    fn first_component_enters_the_compound_hash_unchanged() {
        let ada = person("Ada", "Lovelace", 36);
        let natural = EqualityComparator::<String>::natural();
        let comparer = by_last_name().and(&by_first_name());

        let last_name_hash = natural.hash(&"Lovelace".to_string());
        let first_name_hash = natural.hash(&"Ada".to_string());
        assert_eq!(comparer.hash(&ada), mix(last_name_hash, first_name_hash));
    }

    #[test]
    fn nested_compounds_are_flattened() {
        let by_age = EqualityComparator::using(|p: &Person| p.age);
        let nested = by_last_name().and(&by_first_name().and(&by_age));
        let chained = by_last_name().and_using(|p: &Person| p.first_name.clone()).and(&by_age);
        let ada = person("Ada", "Lovelace", 36);

        assert_eq!(nested.len(), 3);
        assert_eq!(chained.len(), 3);
        assert_eq!(nested.hash(&ada), chained.hash(&ada));
    }

    #[test]
    fn using_with_delegates_to_the_key_comparer() {
        let case_insensitive = EqualityComparator::from_fns(
            |a: &String, b: &String| a.eq_ignore_ascii_case(b),
            |value: &String| hash_of(&value.to_ascii_lowercase()),
        );
        let comparer =
            EqualityComparator::using_with(|p: &Person| p.last_name.clone(), case_insensitive);

        assert!(comparer.equals(&person("Ada", "LOVELACE", 1), &person("Ada", "lovelace", 2)));
        assert_eq!(
            comparer.hash(&person("Ada", "LOVELACE", 1)),
            comparer.hash(&person("Ada", "lovelace", 2))
        );
    }

    #[test]
    fn keyed_values_deduplicate_in_a_hash_set() {
        let comparer = by_last_name().and(&by_first_name());
        let people = vec![
            person("Ada", "Lovelace", 36),
            person("Ada", "Lovelace", 12),
            person("Grace", "Hopper", 85),
        ];

        let unique: HashSet<Keyed<Person>> = people
            .into_iter()
            .map(|p| comparer.keyed(p))
            .collect();

        assert_eq!(unique.len(), 2);
    }
}
