/*!
This module contains global configuration constants for keyorder.

These are fixed values rather than options because changing them changes observable results (e.g.
the hash codes produced by compound equality comparators).
*/

/**
The starting value of the hash fold performed by compound equality comparators.

A seed of zero means that the hash of a compound with a single component is exactly the hash of
that component.
*/
pub(crate) const COMPOUND_HASH_SEED: u64 = 0;

/**
The left shift used when mixing component hashes.

Each step computes `((hash << 5) + hash) ^ next`. The mix is not commutative, so components must be
folded in declaration order.
*/
pub(crate) const COMPOUND_HASH_SHIFT: u32 = 5;

/// The character separating the clauses of an order-by string e.g. `"name, age desc"`.
pub(crate) const ORDER_BY_CLAUSE_SEPARATOR: char = ',';

/**
The number of types a freshly created null filter registry has room for before it reallocates.

Most programs only ever place nulls for a handful of types.
*/
pub(crate) const NULL_FILTER_REGISTRY_INITIAL_CAPACITY: usize = 16;
