use std::iter::FusedIterator;

use crate::conversion::IntoObject;
use crate::err::{self, PyErr, PyResult};
use crate::exceptions::PyIndexError;
use crate::ffi::{self, Py_ssize_t};
use crate::internal_tricks::{get_ssize_index, len_from_ssize};
use crate::pyutils::checked_ptr;
use crate::types::{PyAny, PyTuple};
use crate::{AsPyPointer, Handle, NonNullObject, Object, Owned, Python};

/// Represents a Python `list`.
pub enum PyList {}

pyobject_native_type!(PyList, PyList_Type, "list", #checkfunction=ffi::PyList_Check);

impl PyList {
    /// Constructs a new list with the given elements.
    ///
    /// # Panics
    ///
    /// This function will panic if `elements`' `ExactSizeIterator` implementation is incorrect.
    pub fn new<'py, T, U>(
        py: Python<'py>,
        elements: impl IntoIterator<Item = T, IntoIter = U>,
    ) -> PyResult<Owned<'py, PyList>>
    where
        T: IntoObject<'py>,
        U: ExactSizeIterator<Item = T>,
    {
        let mut elements = elements.into_iter();
        let len = elements.len();
        let list = unsafe { PyList::with_len(py, len)? };

        let mut counter = 0;
        for obj in (&mut elements).take(len) {
            let obj = obj.into_object(py)?;
            unsafe { fill_slot(list.as_ptr(), counter, obj) };
            counter += 1;
        }

        assert!(elements.next().is_none(), "Attempted to create PyList but `elements` was larger than reported by its `ExactSizeIterator` implementation.");
        assert_eq!(len, counter, "Attempted to create PyList but `elements` was smaller than reported by its `ExactSizeIterator` implementation.");

        Ok(list)
    }

    /// Allocates a list of `len` empty slots, to be filled with [`ListMethods::set_item`].
    ///
    /// # Safety
    ///
    /// The slots start out NULL. Every slot must be filled before the list is used in any other
    /// way: `contains`, `to_string`, sorting or handing the list to Python all read the slots.
    pub unsafe fn with_len(py: Python<'_>, len: usize) -> PyResult<Owned<'_, PyList>> {
        unsafe {
            Owned::<PyAny>::from_owned_ptr_or_err(py, ffi::PyList_New(get_ssize_index(len)))
                .map(|list| list.cast_into_unchecked())
        }
    }

    /// Constructs a new empty list.
    pub fn empty(py: Python<'_>) -> PyResult<Owned<'_, PyList>> {
        unsafe { PyList::with_len(py, 0) }
    }
}

/// Moves `value` into slot `index` of a list under construction.
unsafe fn fill_slot(list: *mut ffi::PyObject, index: usize, value: Owned<'_, PyAny>) {
    #[cfg(not(Py_LIMITED_API))]
    unsafe {
        ffi::PyList_SET_ITEM(list, index as Py_ssize_t, value.into_ptr());
    }
    #[cfg(Py_LIMITED_API)]
    unsafe {
        ffi::PyList_SetItem(list, index as Py_ssize_t, value.into_ptr());
    }
}

#[inline]
unsafe fn list_len(list: *mut ffi::PyObject) -> usize {
    #[cfg(not(Py_LIMITED_API))]
    let size = unsafe { ffi::PyList_GET_SIZE(list) };
    #[cfg(Py_LIMITED_API)]
    let size = unsafe { ffi::PyList_Size(list) };
    len_from_ssize(size)
}

/// Operations on list handles.
pub trait ListMethods<'py>: Handle<'py, Kind = PyList> {
    /// Returns the length of the list.
    fn len(&self) -> PyResult<usize> {
        let slf = checked_ptr(self)?;
        Ok(unsafe { list_len(slf) })
    }

    /// Checks if the list is empty.
    fn is_empty(&self) -> PyResult<bool> {
        self.len().map(|len| len == 0)
    }

    /// Gets the list item at the specified index.
    ///
    /// Items of a list can be replaced at any time, so this hands out a new reference. An index
    /// past the end is an `IndexError`.
    fn get_item(&self, index: usize) -> PyResult<Owned<'py, PyAny>> {
        let slf = checked_ptr(self)?;
        if index < unsafe { list_len(slf) } {
            Ok(unsafe { self.get_item_unchecked(index) })
        } else {
            Err(PyIndexError::new_err("list index out of range"))
        }
    }

    /// Gets the list item at the specified index. Undefined behavior on bad index, or on a null
    /// handle. Use with caution.
    ///
    /// # Safety
    ///
    /// Caller must verify that the handle is non-null and the index is within the bounds of the
    /// list.
    unsafe fn get_item_unchecked(&self, index: usize) -> Owned<'py, PyAny> {
        #[cfg(not(Py_LIMITED_API))]
        let item = unsafe { ffi::PyList_GET_ITEM(self.as_ptr(), index as Py_ssize_t) };
        #[cfg(Py_LIMITED_API)]
        let item = unsafe { ffi::PyList_GetItem(self.as_ptr(), index as Py_ssize_t) };
        let item = unsafe { Object::<PyAny>::from_borrowed_ptr(self.py(), item) };
        Owned::retain(&item)
    }

    /// Sets the item at the specified index.
    ///
    /// The list takes over the reference to `value` and releases the item previously stored in
    /// the slot. An index past the end is an `IndexError`.
    fn set_item<V>(&self, index: usize, value: V) -> PyResult<()>
    where
        V: IntoObject<'py>,
    {
        let py = self.py();
        let slf = checked_ptr(self)?;
        let value = value.into_object(py)?;
        err::error_on_minusone(py, unsafe {
            ffi::PyList_SetItem(slf, get_ssize_index(index), value.into_ptr())
        })
    }

    /// Deletes the `index`th element of self.
    ///
    /// This is equivalent to the Python statement `del self[i]`.
    fn del_item(&self, index: usize) -> PyResult<()> {
        let py = self.py();
        let slf = checked_ptr(self)?;
        err::error_on_minusone(py, unsafe {
            ffi::PySequence_DelItem(slf, get_ssize_index(index))
        })
    }

    /// Appends an item to the list.
    fn append<V>(&self, value: V) -> PyResult<()>
    where
        V: IntoObject<'py>,
    {
        let py = self.py();
        let slf = checked_ptr(self)?;
        let value = value.into_object(py)?;
        err::error_on_minusone(py, unsafe { ffi::PyList_Append(slf, value.as_ptr()) })
    }

    /// Inserts an item at the specified index.
    ///
    /// If `index >= self.len()`, inserts at the end.
    fn insert<V>(&self, index: usize, value: V) -> PyResult<()>
    where
        V: IntoObject<'py>,
    {
        let py = self.py();
        let slf = checked_ptr(self)?;
        let value = value.into_object(py)?;
        err::error_on_minusone(py, unsafe {
            ffi::PyList_Insert(slf, get_ssize_index(index), value.as_ptr())
        })
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

    /// Takes the slice `self[low:high]` and returns it as a new list.
    ///
    /// Indices must be nonnegative, and out-of-range indices are clipped to
    /// `self.len()`.
    fn get_slice(&self, low: usize, high: usize) -> PyResult<Owned<'py, PyList>> {
        let slf = checked_ptr(self)?;
        unsafe {
            Owned::<PyAny>::from_owned_ptr_or_err(
                self.py(),
                ffi::PyList_GetSlice(slf, get_ssize_index(low), get_ssize_index(high)),
            )
            .map(|slice| slice.cast_into_unchecked())
        }
    }

    /// Returns an iterator over this list's items.
    fn iter(&self) -> PyResult<BoundListIterator<'py>> {
        checked_ptr(self)?;
        let list = unsafe { Object::<PyList>::from_borrowed_ptr(self.py(), self.as_ptr()) };
        Ok(BoundListIterator::new(Owned::retain(&list)))
    }

    /// Sorts the list in-place. Equivalent to the Python expression `l.sort()`.
    fn sort(&self) -> PyResult<()> {
        let slf = checked_ptr(self)?;
        err::error_on_minusone(self.py(), unsafe { ffi::PyList_Sort(slf) })
    }

    /// Reverses the list in-place. Equivalent to the Python expression `l.reverse()`.
    fn reverse(&self) -> PyResult<()> {
        let slf = checked_ptr(self)?;
        err::error_on_minusone(self.py(), unsafe { ffi::PyList_Reverse(slf) })
    }

    /// Return a new tuple containing the contents of the list; equivalent to the Python
    /// expression `tuple(list)`.
    fn to_tuple(&self) -> PyResult<Owned<'py, PyTuple>> {
        let slf = checked_ptr(self)?;
        unsafe {
            Owned::<PyAny>::from_owned_ptr_or_err(self.py(), ffi::PyList_AsTuple(slf))
                .map(|tuple| tuple.cast_into_unchecked())
        }
    }
}

impl<'py, H> ListMethods<'py> for H where H: Handle<'py, Kind = PyList> + ?Sized {}

impl<'py> NonNullObject<'py, PyList> {
    /// Returns the length of the list. The handle is known to be non-null, so this cannot fail.
    #[inline]
    pub fn len(&self) -> usize {
        unsafe { list_len(self.as_ptr()) }
    }

    /// Checks if the list is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bounds-checked element access without the null check.
    pub fn get_item(&self, index: usize) -> PyResult<Owned<'py, PyAny>> {
        if index < self.len() {
            Ok(unsafe { self.get_item_unchecked(index) })
        } else {
            Err(PyIndexError::new_err("list index out of range"))
        }
    }
}

/// Used by `ListMethods::iter()`.
///
/// The list may change size while it is iterated; the iterator re-reads the length on every
/// step and stops early if the list shrank.
pub struct BoundListIterator<'py> {
    list: Owned<'py, PyList>,
    index: usize,
    length: usize,
}

impl<'py> BoundListIterator<'py> {
    fn new(list: Owned<'py, PyList>) -> Self {
        let length = unsafe { list_len(list.as_ptr()) };
        BoundListIterator {
            list,
            index: 0,
            length,
        }
    }

    fn current_len(&self) -> usize {
        self.length.min(unsafe { list_len(self.list.as_ptr()) })
    }
}

impl<'py> Iterator for BoundListIterator<'py> {
    type Item = Owned<'py, PyAny>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let length = self.current_len();
        if self.index < length {
            let item = unsafe { self.list.get_item_unchecked(self.index) };
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

impl DoubleEndedIterator for BoundListIterator<'_> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        let length = self.current_len();
        if self.index < length {
            let item = unsafe { self.list.get_item_unchecked(length - 1) };
            self.length = length - 1;
            Some(item)
        } else {
            None
        }
    }
}

impl ExactSizeIterator for BoundListIterator<'_> {
    fn len(&self) -> usize {
        self.length.saturating_sub(self.index)
    }
}

impl FusedIterator for BoundListIterator<'_> {}
