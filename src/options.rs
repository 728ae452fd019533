/*!
This module holds the option structures used to describe a sort order at run time.
*/

/// The direction a sort column is ordered in.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum SortDirection {
    /// Smallest keys first.
    Ascending,
    /// Largest keys first.
    Descending,
}

impl Default for SortDirection {
    fn default() -> Self {
        SortDirection::Ascending
    }
}

/// Where absent values are placed relative to present ones.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum NullPlacement {
    /// Absent values sort before every present value.
    First,
    /// Absent values sort after every present value.
    Last,
}

impl NullPlacement {
    /// Returns true if absent values are placed first.
    pub fn is_first(&self) -> bool {
        matches!(self, NullPlacement::First)
    }
}

/**
A single clause of a run-time sort order.

The column is referenced by name and resolved against a
[`ColumnRegistry`](crate::ColumnRegistry) when a comparator is built.
*/
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SortColumn {
    /// The name of the column to sort by.
    name: String,

    /**
    The direction to sort the column in.

    **This defaults to [`SortDirection::Ascending`].**
    */
    direction: SortDirection,

    /**
    Where to place rows whose column value is absent.

    When this is `None`, absent values are ordered by the column's natural ordering.
    */
    nulls: Option<NullPlacement>,
}

/// Public methods
impl SortColumn {
    /// Create a new ascending [`SortColumn`] with no explicit null placement.
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            direction: SortDirection::default(),
            nulls: None,
        }
    }

    /// Set the direction of the column.
    pub fn with_direction(mut self, direction: SortDirection) -> Self {
        self.direction = direction;
        self
    }

    /// Set the null placement of the column.
    pub fn with_nulls(mut self, nulls: NullPlacement) -> Self {
        self.nulls = Some(nulls);
        self
    }

    /// Get the column name.
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Get the column direction.
    pub fn direction(&self) -> SortDirection {
        self.direction
    }

    /// Get the column null placement.
    pub fn nulls(&self) -> Option<NullPlacement> {
        self.nulls
    }
}
