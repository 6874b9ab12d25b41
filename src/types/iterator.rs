use crate::err::{PyErr, PyResult};
use crate::ffi;
use crate::instance::DerefToPyAny;
use crate::type_object::PyTypeCheck;
use crate::types::PyAny;
use crate::{AsPyPointer, Handle, Object, Owned};

/// A Python iterator object.
///
/// Obtained from [`AnyMethods::try_iter`](crate::types::AnyMethods::try_iter). An owned
/// iterator handle is a Rust [`Iterator`] yielding `PyResult`s, so an error raised while
/// advancing ends up in the loop body rather than being lost.
///
/// ```ignore
/// let list = py.eval("[1, 2, 3]")?;
/// let mut total = 0;
/// for item in list.try_iter()? {
///     total += item?.extract::<i64>()?;
/// }
/// ```
pub enum PyIterator {}

unsafe impl PyTypeCheck for PyIterator {
    const NAME: &'static str = "Iterator";

    #[inline]
    fn type_check(object: Object<'_, PyAny>) -> bool {
        unsafe { ffi::PyIter_Check(object.as_ptr()) != 0 }
    }
}

unsafe impl DerefToPyAny for PyIterator {}

impl<'py> Iterator for Owned<'py, PyIterator> {
    type Item = PyResult<Owned<'py, PyAny>>;

    /// Retrieves the next item from an iterator.
    ///
    /// Returns `None` when the iterator is exhausted, or when the handle is null.
    /// If an exception occurs, returns `Some(Err(..))`.
    /// Further `next()` calls after an exception occurs are likely
    /// to repeatedly result in the same exception.
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.is_null() {
            return None;
        }
        let py = self.py();
        let item = unsafe { Owned::<PyAny>::from_owned_ptr(py, ffi::PyIter_Next(self.as_ptr())) };
        if !item.is_null() {
            Some(Ok(item))
        } else {
            PyErr::take(py).map(Err)
        }
    }

    #[cfg(not(Py_LIMITED_API))]
    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.is_null() {
            return (0, Some(0));
        }
        let hint = unsafe { ffi::PyObject_LengthHint(self.as_ptr(), 0) };
        if hint < 0 {
            // the hint is advisory, drop the error
            let _ = PyErr::take(self.py());
            (0, None)
        } else {
            (hint as usize, None)
        }
    }
}
