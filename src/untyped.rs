/*!
A bridge between typed comparators and a type-erased comparison interface.

Some collection APIs only know how to compare `&dyn Any` operands. An [`UntypedComparator`] adapts a
[`Comparator<T>`] to that interface by checking the runtime type of every operand, and
[`UntypedComparator::typed`] adapts it back. Converting in one direction and then the other returns
the original object instead of stacking adapters.
*/

use std::any::{type_name, Any};
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use crate::comparator::{Comparator, FallibleComparison, Node};
use crate::errors::{ComparatorError, ComparatorResult};

/// A type-erased comparison.
type ErasedComparison =
    Arc<dyn Fn(&dyn Any, &dyn Any) -> ComparatorResult<Ordering> + Send + Sync>;

/**
A comparator over dynamically typed operands.

Comparing operands of a type the comparator was not built for fails with
[`ComparatorError::TypeMismatch`].
*/
#[derive(Clone)]
pub struct UntypedComparator {
    /// The erased comparison.
    compare: ErasedComparison,

    /**
    The typed comparator this was created from, if any.

    This is a `Comparator<T>` for the `T` named by `typed_name`.
    */
    typed: Option<Arc<dyn Any + Send + Sync>>,

    /// The name of the operand type of `typed`.
    typed_name: Option<&'static str>,
}

/// Public methods
impl UntypedComparator {
    /// Create a new [`UntypedComparator`] from a type-erased comparison function.
    pub fn from_fn<F>(comparison: F) -> Self
    where
        F: Fn(&dyn Any, &dyn Any) -> ComparatorResult<Ordering> + Send + Sync + 'static,
    {
        Self {
            compare: Arc::new(comparison),
            typed: None,
            typed_name: None,
        }
    }

    /// Compare two dynamically typed values.
    pub fn compare(&self, a: &dyn Any, b: &dyn Any) -> ComparatorResult<Ordering> {
        (self.compare)(a, b)
    }

    /**
    Get a typed view of this comparator.

    If this comparator was created from a `Comparator<T>`, that comparator is returned as is.
    Otherwise the returned comparator forwards to this one and any type mismatch surfaces when
    comparing.
    */
    pub fn typed<T: 'static>(&self) -> Comparator<T> {
        let original = self
            .typed
            .as_ref()
            .and_then(|typed| (**typed).downcast_ref::<Comparator<T>>());
        if let Some(comparator) = original {
            return comparator.clone();
        }

        let untyped = self.clone();
        let call = move |a: &T, b: &T| untyped.compare(a, b);
        Comparator::from_node(Node::Untyped(TypedBridge {
            untyped: self.clone(),
            call: Arc::new(call),
        }))
    }
}

impl fmt::Debug for UntypedComparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UntypedComparator")
            .field("typed", &self.typed_name)
            .finish()
    }
}

/// Public methods
impl<T: 'static> Comparator<T> {
    /**
    Get a type-erased view of this comparator.

    If this comparator was itself created by [`UntypedComparator::typed`], the original untyped
    comparator is returned.
    */
    pub fn untyped(&self) -> UntypedComparator {
        if let Node::Untyped(bridge) = self.node() {
            return bridge.untyped.clone();
        }

        let typed = self.clone();
        let compare = move |a: &dyn Any, b: &dyn Any| {
            let a = downcast::<T>(a)?;
            let b = downcast::<T>(b)?;
            typed.try_compare(a, b)
        };

        UntypedComparator {
            compare: Arc::new(compare),
            typed: Some(Arc::new(self.clone())),
            typed_name: Some(type_name::<T>()),
        }
    }
}

/// Downcast an operand, reporting a type mismatch on failure.
fn downcast<T: 'static>(value: &dyn Any) -> ComparatorResult<&T> {
    value
        .downcast_ref::<T>()
        .ok_or(ComparatorError::TypeMismatch {
            expected: type_name::<T>(),
        })
}

/// A typed comparator node forwarding to an [`UntypedComparator`].
pub(crate) struct TypedBridge<T: ?Sized> {
    /// The comparator being bridged.
    untyped: UntypedComparator,

    /// Erases the operands and forwards them to `untyped`.
    call: FallibleComparison<T>,
}

/// Crate-only methods
impl<T: ?Sized> TypedBridge<T> {
    pub(crate) fn try_compare(&self, a: &T, b: &T) -> ComparatorResult<Ordering> {
        (self.call)(a, b)
    }
}
