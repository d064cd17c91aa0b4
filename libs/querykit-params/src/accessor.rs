//! Per-invocation view over a positional argument list.
//!
//! Construction pairs a shared [`Parameters`] shape with the erased argument
//! values of one call. The special parameters are extracted up front; the
//! bindable remainder is exposed lazily, in bindable order.

use std::any::Any;
use std::sync::Arc;

use crate::{Error, PageRequest, Parameters, Sort};

/// Erased argument value. Null arguments are `None` at the slot level.
pub type AnyValue = Arc<dyn Any + Send + Sync>;

/// Erase a concrete value into an [`AnyValue`].
pub fn any_value<T: Send + Sync + 'static>(value: T) -> AnyValue {
    Arc::new(value)
}

/// Accessor classifying one invocation's arguments by their declared roles.
///
/// Owns its value snapshot; constructing one moves the argument vector in,
/// so nothing can mutate the view afterwards. Instances are cheap, live for
/// a single invocation, and are never shared across threads.
pub struct ParameterAccessor {
    parameters: Arc<Parameters>,
    values: Vec<Option<AnyValue>>,
    pageable: Option<PageRequest>,
    sort: Option<Sort>,
}

impl ParameterAccessor {
    /// Bind a value snapshot to a shape.
    ///
    /// # Errors
    /// Returns `Error::ParameterCountMismatch` when the shape and value
    /// lengths differ, and `Error::TypeMismatch` when a non-null special
    /// slot does not hold the declared type.
    pub fn new(parameters: Arc<Parameters>, values: Vec<Option<AnyValue>>) -> Result<Self, Error> {
        if parameters.len() != values.len() {
            return Err(Error::ParameterCountMismatch {
                expected: parameters.len(),
                actual: values.len(),
            });
        }

        let pageable = extract::<PageRequest>(&values, parameters.pageable_index(), "PageRequest")?;
        let sort = extract::<Sort>(&values, parameters.sort_index(), "Sort")?;

        Ok(Self {
            parameters,
            values,
            pageable,
            sort,
        })
    }

    /// The shape backing this accessor.
    #[must_use]
    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// The page request, unless the shape declares none or the argument was
    /// null.
    #[must_use]
    pub fn pageable(&self) -> Option<&PageRequest> {
        self.pageable.as_ref()
    }

    /// The effective sort order.
    ///
    /// An explicit sort parameter always wins, including when its value is
    /// null. Only shapes without a sort parameter fall back to the page
    /// request's embedded sort; an empty embedded sort counts as unsorted.
    #[must_use]
    pub fn sort(&self) -> Option<&Sort> {
        if self.parameters.sort_index().is_some() {
            return self.sort.as_ref();
        }
        self.pageable
            .as_ref()
            .map(PageRequest::sort)
            .filter(|sort| !sort.is_empty())
    }

    /// The raw value of the bindable parameter with the given bindable-only
    /// index. `Ok(None)` is a null argument.
    ///
    /// # Errors
    /// Returns `Error::BindableIndexOutOfBounds` past the bindable count.
    pub fn bindable_value(&self, bindable_index: usize) -> Result<Option<&AnyValue>, Error> {
        let parameter = self
            .parameters
            .bindable_parameter(bindable_index)
            .ok_or(Error::BindableIndexOutOfBounds(bindable_index))?;
        Ok(self.values[parameter.position()].as_ref())
    }

    /// True if any bindable argument is null.
    #[must_use]
    pub fn has_bindable_null(&self) -> bool {
        self.bindable_values().any(|value| value.is_none())
    }

    /// Lazy traversal of the bindable values in ascending bindable order.
    ///
    /// Yields exactly [`Parameters::bindable_len`] items; call again for a
    /// fresh traversal.
    pub fn bindable_values(&self) -> BindableValues<'_> {
        BindableValues {
            accessor: self,
            next: 0,
        }
    }
}

fn extract<T: Clone + 'static>(
    values: &[Option<AnyValue>],
    index: Option<usize>,
    expected: &'static str,
) -> Result<Option<T>, Error> {
    let Some(position) = index else {
        return Ok(None);
    };
    match &values[position] {
        None => Ok(None),
        Some(value) => value
            .downcast_ref::<T>()
            .map(|typed| Some(typed.clone()))
            .ok_or(Error::TypeMismatch { position, expected }),
    }
}

/// Read-only iterator over bindable argument values.
pub struct BindableValues<'a> {
    accessor: &'a ParameterAccessor,
    next: usize,
}

impl<'a> Iterator for BindableValues<'a> {
    type Item = Option<&'a AnyValue>;

    fn next(&mut self) -> Option<Self::Item> {
        let parameter = self.accessor.parameters.bindable_parameter(self.next)?;
        self.next += 1;
        Some(self.accessor.values[parameter.position()].as_ref())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self
            .accessor
            .parameters
            .bindable_len()
            .saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for BindableValues<'_> {}

impl<'a> IntoIterator for &'a ParameterAccessor {
    type Item = Option<&'a AnyValue>;
    type IntoIter = BindableValues<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.bindable_values()
    }
}
