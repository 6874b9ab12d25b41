use std::iter::FusedIterator;

use crate::conversion::{IntoArgs, IntoObject};
use crate::err::{PyErr, PyResult};
use crate::exceptions::PyIndexError;
use crate::ffi::{self, Py_ssize_t};
use crate::internal_tricks::{get_ssize_index, len_from_ssize};
use crate::pyutils::checked_ptr;
use crate::types::{PyAny, PyList};
use crate::{AsPyPointer, Handle, NonNullObject, Object, Owned, Python};

/// Represents a Python `tuple` object.
///
/// Tuples are immutable once shared. A tuple built with [`PyTuple::with_len`] starts out with
/// empty slots which are filled exactly once with [`TupleMethods::set_item`] while the creator
/// holds the only reference.
pub enum PyTuple {}

pyobject_native_type!(PyTuple, PyTuple_Type, "tuple", #checkfunction=ffi::PyTuple_Check);

impl PyTuple {
    /// Constructs a new tuple with the given elements.
    ///
    /// # Panics
    ///
    /// This function will panic if `elements`' `ExactSizeIterator` implementation is incorrect.
    /// All standard library structures implement this trait correctly, if they do, so calling this
    /// function with (for example) [`Vec`]`<T>` or `&[T]` will always succeed.
    pub fn new<'py, T, U>(
        py: Python<'py>,
        elements: impl IntoIterator<Item = T, IntoIter = U>,
    ) -> PyResult<Owned<'py, PyTuple>>
    where
        T: IntoObject<'py>,
        U: ExactSizeIterator<Item = T>,
    {
        let mut elements = elements.into_iter();
        let len = elements.len();
        let tuple = unsafe { PyTuple::with_len(py, len)? };

        let mut counter = 0;
        for obj in (&mut elements).take(len) {
            let obj = obj.into_object(py)?;
            unsafe { tuple.set_item_unchecked(counter, obj) };
            counter += 1;
        }

        assert!(elements.next().is_none(), "Attempted to create PyTuple but `elements` was larger than reported by its `ExactSizeIterator` implementation.");
        assert_eq!(len, counter, "Attempted to create PyTuple but `elements` was smaller than reported by its `ExactSizeIterator` implementation.");

        Ok(tuple)
    }

    /// Allocates a tuple of `len` empty slots, to be filled with [`TupleMethods::set_item`].
    ///
    /// # Safety
    ///
    /// The slots start out NULL. Every slot must be filled before the tuple is used in any
    /// other way: reading, comparing, printing or sharing a partly filled tuple dereferences NULL.
    pub unsafe fn with_len(py: Python<'_>, len: usize) -> PyResult<Owned<'_, PyTuple>> {
        unsafe {
            Owned::<PyAny>::from_owned_ptr_or_err(py, ffi::PyTuple_New(get_ssize_index(len)))
                .map(|tuple| tuple.cast_into_unchecked())
        }
    }

    /// Constructs an empty tuple (on the Python side, a singleton object).
    pub fn empty(py: Python<'_>) -> PyResult<Owned<'_, PyTuple>> {
        unsafe { PyTuple::with_len(py, 0) }
    }

    /// Packs a Rust tuple of convertible values into a Python tuple.
    ///
    /// ```ignore
    /// let packed = PyTuple::pack(py, (1, "two", 3.0))?;
    /// assert_eq!(packed.len()?, 3);
    /// ```
    pub fn pack<'py, A>(py: Python<'py>, elements: A) -> PyResult<Owned<'py, PyTuple>>
    where
        A: IntoArgs<'py>,
    {
        elements.into_args(py)
    }
}

/// Operations on tuple handles.
pub trait TupleMethods<'py>: Handle<'py, Kind = PyTuple> {
    /// Gets the length of the tuple.
    fn len(&self) -> PyResult<usize> {
        let slf = checked_ptr(self)?;
        Ok(unsafe { tuple_len(slf) })
    }

    /// Checks if the tuple is empty.
    fn is_empty(&self) -> PyResult<bool> {
        self.len().map(|len| len == 0)
    }

    /// Gets the tuple item at the specified index, borrowed from the tuple.
    ///
    /// An index past the end is an `IndexError`. The slot of a tuple that is still being filled
    /// may be a null handle.
    fn get_item(&self, index: usize) -> PyResult<Object<'_, PyAny>> {
        let slf = checked_ptr(self)?;
        if index < unsafe { tuple_len(slf) } {
            Ok(unsafe { self.get_item_unchecked(index) })
        } else {
            Err(PyIndexError::new_err("tuple index out of range"))
        }
    }

    /// Like [`get_item`](TupleMethods::get_item), but returns a new reference.
    fn get_owned_item(&self, index: usize) -> PyResult<Owned<'py, PyAny>> {
        let item = self.get_item(index)?;
        let item = unsafe { Object::<PyAny>::from_borrowed_ptr(self.py(), item.as_ptr()) };
        Ok(Owned::retain(&item))
    }

    /// Gets the tuple item at the specified index. Undefined behavior on bad index, or on a
    /// null handle. Use with caution.
    ///
    /// # Safety
    ///
    /// Caller must verify that the handle is non-null and the index is within the bounds of the
    /// tuple.
    unsafe fn get_item_unchecked(&self, index: usize) -> Object<'_, PyAny> {
        #[cfg(any(Py_LIMITED_API, PyPy))]
        let item = unsafe { ffi::PyTuple_GetItem(self.as_ptr(), index as Py_ssize_t) };
        #[cfg(not(any(Py_LIMITED_API, PyPy)))]
        let item = unsafe { ffi::PyTuple_GET_ITEM(self.as_ptr(), index as Py_ssize_t) };
        unsafe { Object::from_borrowed_ptr(self.as_object().py(), item) }
    }

    /// Fills the slot at `index` with `value`.
    ///
    /// The tuple takes over the reference to `value` instead of retaining a new one. This is only
    /// valid while the tuple is freshly allocated and unshared: the interpreter rejects the call
    /// with a `SystemError` once anyone else holds a reference, and an index past the end is an
    /// `IndexError`.
    fn set_item<V>(&self, index: usize, value: V) -> PyResult<()>
    where
        V: IntoObject<'py>,
    {
        let py = self.py();
        let slf = checked_ptr(self)?;
        let value = value.into_object(py)?;
        crate::err::error_on_minusone(py, unsafe {
            ffi::PyTuple_SetItem(slf, get_ssize_index(index), value.into_ptr())
        })
    }

    /// Fills the slot at `index` with `value` without any checks. Any previous occupant of the
    /// slot is leaked, not released.
    ///
    /// # Safety
    ///
    /// The handle must be a non-null, unshared tuple and `index` must be in bounds.
    unsafe fn set_item_unchecked(&self, index: usize, value: Owned<'py, PyAny>) {
        #[cfg(not(Py_LIMITED_API))]
        unsafe {
            ffi::PyTuple_SET_ITEM(self.as_ptr(), index as Py_ssize_t, value.into_ptr());
        }
        #[cfg(Py_LIMITED_API)]
        unsafe {
            ffi::PyTuple_SetItem(self.as_ptr(), index as Py_ssize_t, value.into_ptr());
        }
    }

    /// Returns `self` as a slice of objects.
    #[cfg(not(any(Py_LIMITED_API, PyPy)))]
    fn as_slice(&self) -> PyResult<&[Object<'_, PyAny>]> {
        let slf = checked_ptr(self)?;
        unsafe {
            let len = tuple_len(slf);
            let items = std::ptr::addr_of!((*slf.cast::<ffi::PyTupleObject>()).ob_item);
            // `Object` is a transparent wrapper over the item pointers
            Ok(std::slice::from_raw_parts(items.cast::<Object<'_, PyAny>>(), len))
        }
    }

    /// Takes the slice `self[low:high]` and returns it as a new tuple.
    ///
    /// Indices must be nonnegative, and out-of-range indices are clipped to
    /// `self.len()`.
    fn get_slice(&self, low: usize, high: usize) -> PyResult<Owned<'py, PyTuple>> {
        let slf = checked_ptr(self)?;
        unsafe {
            Owned::<PyAny>::from_owned_ptr_or_err(
                self.py(),
                ffi::PyTuple_GetSlice(slf, get_ssize_index(low), get_ssize_index(high)),
            )
            .map(|slice| slice.cast_into_unchecked())
        }
    }

    /// Determines if self contains `value`.
    ///
    /// This is equivalent to the Python expression `value in self`.
    fn contains<V>(&self, value: V) -> PyResult<bool>
    where
        V: IntoObject<'py>,
    {
        let py = self.py();
        let slf = checked_ptr(self)?;
        let value = value.into_object(py)?;
        match unsafe { ffi::PySequence_Contains(slf, value.as_ptr()) } {
            -1 => Err(PyErr::fetch(py)),
            found => Ok(found == 1),
        }
    }

    /// Returns an iterator over the tuple items.
    fn iter(&self) -> PyResult<BorrowedTupleIterator<'_>> {
        checked_ptr(self)?;
        Ok(BorrowedTupleIterator::new(self.as_object()))
    }

    /// Return a new list containing the contents of this tuple; equivalent to the Python
    /// expression `list(tuple)`.
    fn to_list(&self) -> PyResult<Owned<'py, PyList>> {
        let slf = checked_ptr(self)?;
        unsafe {
            Owned::<PyAny>::from_owned_ptr_or_err(self.py(), ffi::PySequence_List(slf))
                .map(|list| list.cast_into_unchecked())
        }
    }
}

impl<'py, H> TupleMethods<'py> for H where H: Handle<'py, Kind = PyTuple> + ?Sized {}

#[inline]
unsafe fn tuple_len(tuple: *mut ffi::PyObject) -> usize {
    #[cfg(any(Py_LIMITED_API, PyPy))]
    let size = unsafe { ffi::PyTuple_Size(tuple) };
    #[cfg(not(any(Py_LIMITED_API, PyPy)))]
    let size = unsafe { ffi::PyTuple_GET_SIZE(tuple) };
    len_from_ssize(size)
}

impl<'py> NonNullObject<'py, PyTuple> {
    /// Gets the length of the tuple. The handle is known to be non-null, so this cannot fail.
    #[inline]
    pub fn len(&self) -> usize {
        unsafe { tuple_len(self.as_ptr()) }
    }

    /// Checks if the tuple is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bounds-checked element access without the null check.
    pub fn get_item(&self, index: usize) -> PyResult<Object<'_, PyAny>> {
        if index < self.len() {
            Ok(unsafe { self.get_item_unchecked(index) })
        } else {
            Err(PyIndexError::new_err("tuple index out of range"))
        }
    }
}

/// Used by `TupleMethods::iter()`.
pub struct BorrowedTupleIterator<'a> {
    tuple: Object<'a, PyTuple>,
    index: usize,
    length: usize,
}

impl<'a> BorrowedTupleIterator<'a> {
    fn new(tuple: Object<'a, PyTuple>) -> Self {
        let length = unsafe { tuple_len(tuple.as_ptr()) };
        BorrowedTupleIterator {
            tuple,
            index: 0,
            length,
        }
    }
}

impl<'a> Iterator for BorrowedTupleIterator<'a> {
    type Item = Object<'a, PyAny>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.index < self.length {
            let item = unsafe { self.tuple.get_item_unchecked(self.index) };
            // re-tag with the tuple's lifetime rather than the `&self.tuple` borrow
            let item = unsafe { Object::from_borrowed_ptr(self.tuple.py(), item.as_ptr()) };
            self.index += 1;
            Some(item)
        } else {
            None
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.len();
        (len, Some(len))
    }
}

impl DoubleEndedIterator for BorrowedTupleIterator<'_> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.index < self.length {
            let item = unsafe { self.tuple.get_item_unchecked(self.length - 1) };
            let item = unsafe { Object::from_borrowed_ptr(self.tuple.py(), item.as_ptr()) };
            self.length -= 1;
            Some(item)
        } else {
            None
        }
    }
}

impl ExactSizeIterator for BorrowedTupleIterator<'_> {
    fn len(&self) -> usize {
        self.length.saturating_sub(self.index)
    }
}

impl FusedIterator for BorrowedTupleIterator<'_> {}
