/*!
Run-time construction of comparators from user-chosen sort columns.

Applications register the columns a record type can be sorted by in a [`ColumnRegistry`] and later
turn a list of [`SortColumn`]s, or an order-by string such as `"last_name asc nulls last, age desc"`,
into a [`Comparator`].

# Order-by grammar

Clauses are separated by commas. Each clause has the form

```text
<column> [asc | ascending | desc | descending] [nulls first | nulls last]
```

Keywords are case-insensitive. Column names start with a letter or an underscore and may contain
letters, digits, underscores and dots.
*/

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::ORDER_BY_CLAUSE_SEPARATOR;
use crate::errors::{ComparatorError, ComparatorResult};
use crate::null_filter::MaybeNull;
use crate::options::{NullPlacement, SortColumn, SortDirection};
use crate::Comparator;

/// Matches a single order-by clause.
static CLAUSE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^\s*(?P<column>[a-z_][a-z0-9_.]*)(?:\s+(?P<direction>asc|ascending|desc|descending))?(?:\s+nulls\s+(?P<nulls>first|last))?\s*$",
    )
    .expect("the order-by clause pattern is a valid regex")
});

/// Public methods
impl SortColumn {
    /**
    Parse a single order-by clause e.g. `"age desc nulls last"`.

    Returns [`ComparatorError::InvalidArgument`] if the clause does not follow the order-by grammar.
    */
    pub fn parse(clause: &str) -> ComparatorResult<SortColumn> {
        let captures = CLAUSE_PATTERN.captures(clause).ok_or_else(|| {
            ComparatorError::InvalidArgument(format!(
                "could not parse the sort clause `{}`",
                clause.trim()
            ))
        })?;

        let mut column = SortColumn::new(&captures["column"]);
        if let Some(direction) = captures.name("direction") {
            if direction.as_str().to_ascii_lowercase().starts_with("desc") {
                column = column.with_direction(SortDirection::Descending);
            }
        }

        if let Some(nulls) = captures.name("nulls") {
            let placement = if nulls.as_str().eq_ignore_ascii_case("first") {
                NullPlacement::First
            } else {
                NullPlacement::Last
            };
            column = column.with_nulls(placement);
        }

        Ok(column)
    }

    /**
    Parse a comma separated list of order-by clauses.

    Returns [`ComparatorError::InvalidArgument`] if the list is empty or if any clause is malformed.
    */
    pub fn parse_list(order_by: &str) -> ComparatorResult<Vec<SortColumn>> {
        if order_by.trim().is_empty() {
            return Err(ComparatorError::InvalidArgument(
                "the sort order is empty".to_string(),
            ));
        }

        order_by
            .split(ORDER_BY_CLAUSE_SEPARATOR)
            .map(SortColumn::parse)
            .collect()
    }
}

/// Applies a per-key null placement for a column to a comparator.
type PlaceNulls<T> = Arc<dyn Fn(&Comparator<T>, bool) -> Comparator<T> + Send + Sync>;

/// A column that records can be sorted by.
struct ColumnDefinition<T> {
    /// Orders records by the column in ascending order.
    ascending: Comparator<T>,

    /// Applies a null placement on the column's key.
    place_nulls: PlaceNulls<T>,
}

impl<T> Clone for ColumnDefinition<T> {
    fn clone(&self) -> Self {
        Self {
            ascending: self.ascending.clone(),
            place_nulls: Arc::clone(&self.place_nulls),
        }
    }
}

/**
A set of named columns that records of type `T` can be sorted by.

# Null handling

A column's null placement is applied to that column only. Two records whose key is absent for a
column with an explicit null placement tie on that column and are ordered by the columns that
follow it, wherever the column appears in the list.
*/
pub struct ColumnRegistry<T> {
    columns: HashMap<String, ColumnDefinition<T>>,
}

/// Public methods
impl<T: 'static> ColumnRegistry<T> {
    /// Create a new, empty [`ColumnRegistry`].
    pub fn new() -> Self {
        Self {
            columns: HashMap::new(),
        }
    }

    /**
    Register a column.

    Returns [`ComparatorError::InvalidArgument`] if the name is empty or already registered.
    */
    pub fn column<K, F>(mut self, name: &str, selector: F) -> ComparatorResult<Self>
    where
        K: Ord + MaybeNull + 'static,
        F: Fn(&T) -> K + Clone + Send + Sync + 'static,
    {
        if name.trim().is_empty() {
            return Err(ComparatorError::InvalidArgument(
                "sort column names cannot be empty".to_string(),
            ));
        }

        if self.columns.contains_key(name) {
            return Err(ComparatorError::InvalidArgument(format!(
                "the sort column `{}` is already registered",
                name
            )));
        }

        let ascending = Comparator::by_key(selector.clone());
        let place_nulls = move |base: &Comparator<T>, nulls_first: bool| {
            if nulls_first {
                base.nulls_first_by(selector.clone())
            } else {
                base.nulls_last_by(selector.clone())
            }
        };

        log::debug!("Registering sort column `{}`", name);
        self.columns.insert(
            name.to_string(),
            ColumnDefinition {
                ascending,
                place_nulls: Arc::new(place_nulls),
            },
        );

        Ok(self)
    }

    /// Returns true if a column with the given name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /**
    Build a comparator that sorts by the given columns in order.

    An empty list of columns yields the identity comparator. Returns
    [`ComparatorError::InvalidArgument`] if a column is not registered.
    */
    pub fn comparator(&self, columns: &[SortColumn]) -> ComparatorResult<Comparator<T>> {
        let comparators = columns
            .iter()
            .map(|column| self.column_comparator(column))
            .collect::<ComparatorResult<Vec<_>>>()?;

        Ok(Comparator::lexicographic(comparators))
    }

    /// Parse an order-by string and build the comparator it describes.
    pub fn parse(&self, order_by: &str) -> ComparatorResult<Comparator<T>> {
        let columns = SortColumn::parse_list(order_by)?;
        self.comparator(&columns)
    }
}

/// Private methods
impl<T: 'static> ColumnRegistry<T> {
    /// Build the comparator for a single column.
    fn column_comparator(&self, column: &SortColumn) -> ComparatorResult<Comparator<T>> {
        let definition = self.columns.get(column.name()).ok_or_else(|| {
            ComparatorError::InvalidArgument(format!("unknown sort column `{}`", column.name()))
        })?;

        let mut comparator = definition.ascending.clone();
        if column.direction() == SortDirection::Descending {
            comparator = comparator.reversed();
        }

        // Placement comes after reversal so that e.g. nulls last stays last for descending columns
        if let Some(nulls) = column.nulls() {
            comparator = (definition.place_nulls)(&comparator, nulls.is_first());
        }

        Ok(comparator)
    }
}

impl<T: 'static> Default for ColumnRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for ColumnRegistry<T> {
    fn clone(&self) -> Self {
        Self {
            columns: self.columns.clone(),
        }
    }
}

impl<T> fmt::Debug for ColumnRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.columns.keys().collect();
        names.sort();

        f.debug_struct("ColumnRegistry")
            .field("columns", &names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Clone, Debug, PartialEq)]
    struct Track {
        title: &'static str,
        artist: Option<&'static str>,
        plays: u32,
    }

    fn track(title: &'static str, artist: Option<&'static str>, plays: u32) -> Track {
        Track {
            title,
            artist,
            plays,
        }
    }

    fn registry() -> ColumnRegistry<Track> {
        ColumnRegistry::new()
            .column("title", |t: &Track| t.title)
            .and_then(|registry| registry.column("artist", |t: &Track| t.artist))
            .and_then(|registry| registry.column("plays", |t: &Track| t.plays))
            .unwrap()
    }

    fn tracks() -> Vec<Track> {
        vec![
            track("Intro", None, 10),
            track("Blue", Some("Joni"), 300),
            track("Anthem", Some("Leonard"), 300),
            track("Outro", None, 50),
            track("Case", Some("Joni"), 20),
        ]
    }

    fn titles(tracks: &[Track], comparator: &Comparator<Track>) -> Vec<&'static str> {
        let mut tracks = tracks.to_vec();
        tracks.sort_by(comparator.as_fn());
        tracks.into_iter().map(|t| t.title).collect()
    }

    #[test]
    fn parses_clauses_with_every_modifier() {
        let columns = SortColumn::parse_list("artist DESC NULLS LAST, plays, title asc nulls first")
            .unwrap();

        assert_eq!(
            columns,
            vec![
                SortColumn::new("artist")
                    .with_direction(SortDirection::Descending)
                    .with_nulls(NullPlacement::Last),
                SortColumn::new("plays"),
                SortColumn::new("title").with_nulls(NullPlacement::First),
            ]
        );
    }

    #[test]
    fn rejects_malformed_order_by_strings() {
        assert!(matches!(
            SortColumn::parse_list(""),
            Err(ComparatorError::InvalidArgument(_))
        ));
        assert!(matches!(
            SortColumn::parse_list("title,,plays"),
            Err(ComparatorError::InvalidArgument(_))
        ));
        assert_eq!(
            SortColumn::parse("plays sideways"),
            Err(ComparatorError::InvalidArgument(
                "could not parse the sort clause `plays sideways`".to_string()
            ))
        );
    }

    #[test]
    fn rejects_duplicate_and_empty_column_names() {
        let duplicate = registry().column("plays", |t: &Track| t.plays);
        assert!(matches!(duplicate, Err(ComparatorError::InvalidArgument(_))));

        let empty = ColumnRegistry::<Track>::new().column(" ", |t: &Track| t.plays);
        assert!(matches!(empty, Err(ComparatorError::InvalidArgument(_))));
    }

    #[test]
    fn rejects_unknown_columns() {
        assert_eq!(
            registry().parse("genre").unwrap_err(),
            ComparatorError::InvalidArgument("unknown sort column `genre`".to_string())
        );
    }

    #[test]
    fn empty_column_list_is_the_identity() {
        assert!(registry().comparator(&[]).unwrap().is_identity());
    }

    #[test]
    fn sorts_by_columns_in_order() {
        let comparator = registry().parse("plays desc, title").unwrap();

        assert_eq!(
            titles(&tracks(), &comparator),
            vec!["Anthem", "Blue", "Outro", "Case", "Intro"]
        );
    }

    #[test]
    fn null_placement_survives_a_descending_column() {
        let comparator = registry().parse("artist desc nulls last, title").unwrap();

        assert_eq!(
            titles(&tracks(), &comparator),
            vec!["Anthem", "Blue", "Case", "Intro", "Outro"]
        );
    }

    #[test]
    fn later_columns_break_ties_between_absent_keys() {
        let comparator = registry().parse("artist nulls first, plays desc").unwrap();

        assert_eq!(
            titles(&tracks(), &comparator),
            vec!["Outro", "Intro", "Blue", "Case", "Anthem"]
        );
    }

    #[test]
    fn null_placed_column_position_does_not_change_tie_breaking() {
        let artistless = vec![track("Intro", None, 10), track("Outro", None, 50)];
        let by_plays = registry().parse("plays desc").unwrap();

        for order_by in [
            "artist nulls first, plays desc",
            "artist nulls last, plays desc",
            "title desc, artist nulls first, plays desc",
        ] {
            let comparator = registry().parse(order_by).unwrap();
            assert_eq!(
                titles(&artistless, &comparator),
                titles(&artistless, &by_plays),
                "ordering for `{}`",
                order_by
            );
        }
    }
}
