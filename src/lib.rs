/*!
keyorder builds ordering and equality predicates over arbitrary values by composing small
combinators: compare by a projected key, break ties with further comparators, reverse an ordering and
decide where absent values go.

```
use keyorder::Comparator;

let mut names = vec!["Bob", "George", "Mary", "Jessica", "David"];
let by_length = Comparator::by_key(|name: &&'static str| name.len()).then_by_key(|name| *name);
names.sort_by(by_length.as_fn());

assert_eq!(names, vec!["Bob", "Mary", "David", "George", "Jessica"]);
```

The crate never sorts or hashes collections itself. It only produces comparison functions
([`Comparator`]) and equality/hash pairs ([`EqualityComparator`]) for use with the standard library's
sorting routines and hash tables or any other consumer.

# Null placement

Absent values (e.g. `None`) can be moved to the front or back of an ordering, either by checking the
compared value itself ([`Comparator::nulls_first`]) or a key projected out of it
([`Comparator::nulls_first_by`]). Whole-value placement always takes precedence over per-key
placement regardless of the order they were declared in, and a later placement at the same level
overrides an earlier one.
*/

#![warn(missing_debug_implementations, missing_docs)]

mod comparator;
pub use comparator::{Comparator, ComparisonFn, IntoComparator};

mod config;

mod equality;
pub use equality::{EqualityComparator, Keyed};

mod errors;
pub use errors::{ComparatorError, ComparatorResult};

pub mod null_filter;
pub use null_filter::{MaybeNull, NullCategory, NullFilter, NullFilterRegistry};

mod order_by;
pub use order_by::ColumnRegistry;

pub mod options;
pub use options::{NullPlacement, SortColumn, SortDirection};

mod untyped;
pub use untyped::UntypedComparator;
