use crate::automethod::FromArg;
use crate::conversion::{IntoArgs, IntoObject};
use crate::err::{error_on_minusone, PyErr, PyResult};
use crate::exceptions::{PyAttributeError, PyTypeError};
use crate::pyutils::checked_ptr;
use crate::type_object::{PyTypeCheck, PyTypeInfo};
use crate::types::{PyIterator, PyList, PyString, PyType, StringMethods, TypeMethods};
use crate::{ffi, AsPyPointer, Handle, Object, Owned, Python};
use std::cmp::Ordering;
use std::os::raw::c_int;

/// Represents any Python object.
///
/// All handles can be narrowed from `PyAny` with [`Object::cast`], and every handle of a more
/// specific kind dereferences to the `PyAny` handle of the same shape, so the generic object
/// protocol in [`AnyMethods`] is available everywhere.
pub enum PyAny {}

unsafe impl PyTypeInfo for PyAny {
    const NAME: &'static str = "object";

    #[inline]
    fn type_object_raw(_py: Python<'_>) -> *mut ffi::PyTypeObject {
        unsafe { std::ptr::addr_of_mut!(ffi::PyBaseObject_Type) }
    }

    #[inline]
    fn is_type_of(_object: Object<'_, PyAny>) -> bool {
        true
    }
}

/// The operators of a rich comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    /// The *less than* operator.
    Lt = ffi::Py_LT as isize,
    /// The *less than or equal to* operator.
    Le = ffi::Py_LE as isize,
    /// The equality operator.
    Eq = ffi::Py_EQ as isize,
    /// The *not equal to* operator.
    Ne = ffi::Py_NE as isize,
    /// The *greater than* operator.
    Gt = ffi::Py_GT as isize,
    /// The *greater than or equal to* operator.
    Ge = ffi::Py_GE as isize,
}

impl CompareOp {
    /// Conversion from the C enum.
    pub fn from_raw(op: c_int) -> Option<Self> {
        match op {
            ffi::Py_LT => Some(CompareOp::Lt),
            ffi::Py_LE => Some(CompareOp::Le),
            ffi::Py_EQ => Some(CompareOp::Eq),
            ffi::Py_NE => Some(CompareOp::Ne),
            ffi::Py_GT => Some(CompareOp::Gt),
            ffi::Py_GE => Some(CompareOp::Ge),
            _ => None,
        }
    }
}

macro_rules! unary_op {
    ($(#[$meta:meta])* $name:ident, $ffi_fn:ident) => {
        $(#[$meta])*
        fn $name(&self) -> PyResult<Owned<'py, PyAny>> {
            let slf = checked_ptr(self)?;
            unsafe { Owned::from_owned_ptr_or_err(self.py(), ffi::$ffi_fn(slf)) }
        }
    };
}

macro_rules! binary_op {
    ($(#[$meta:meta])* $name:ident, $ffi_fn:ident) => {
        $(#[$meta])*
        fn $name<O>(&self, other: O) -> PyResult<Owned<'py, PyAny>>
        where
            O: IntoObject<'py>,
        {
            let py = self.py();
            let slf = checked_ptr(self)?;
            let other = other.into_object(py)?;
            unsafe { Owned::from_owned_ptr_or_err(py, ffi::$ffi_fn(slf, other.as_ptr())) }
        }
    };
}

macro_rules! comparison_op {
    ($(#[$meta:meta])* $name:ident, $op:expr) => {
        $(#[$meta])*
        fn $name<O>(&self, other: O) -> PyResult<bool>
        where
            O: IntoObject<'py>,
        {
            self.rich_compare(other, $op)?.is_true()
        }
    };
}

/// The generic Python object protocol.
///
/// Implemented for every [`PyAny`] handle; handles of other kinds reach it through `Deref`.
/// Every operation first checks that the receiver (and any handle operand) is non-null and
/// fails with [`failed_null_check`](crate::pyutils::failed_null_check) otherwise.
pub trait AnyMethods<'py>: Handle<'py, Kind = PyAny> {
    /// Determines whether this object has the given attribute.
    ///
    /// This is equivalent to the Python expression `hasattr(self, attr_name)`.
    fn hasattr<N>(&self, attr_name: N) -> PyResult<bool>
    where
        N: IntoObject<'py>,
    {
        let py = self.py();
        match self.getattr(attr_name) {
            Ok(_) => Ok(true),
            Err(err) if err.is_instance_of::<PyAttributeError>(py) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Retrieves an attribute value.
    ///
    /// This is equivalent to the Python expression `self.attr_name`.
    fn getattr<N>(&self, attr_name: N) -> PyResult<Owned<'py, PyAny>>
    where
        N: IntoObject<'py>,
    {
        let py = self.py();
        let slf = checked_ptr(self)?;
        let attr_name = attr_name.into_object(py)?;
        unsafe { Owned::from_owned_ptr_or_err(py, ffi::PyObject_GetAttr(slf, attr_name.as_ptr())) }
    }

    /// Sets an attribute value.
    ///
    /// This is equivalent to the Python expression `self.attr_name = value`.
    fn setattr<N, V>(&self, attr_name: N, value: V) -> PyResult<()>
    where
        N: IntoObject<'py>,
        V: IntoObject<'py>,
    {
        let py = self.py();
        let slf = checked_ptr(self)?;
        let attr_name = attr_name.into_object(py)?;
        let value = value.into_object(py)?;
        error_on_minusone(py, unsafe {
            ffi::PyObject_SetAttr(slf, attr_name.as_ptr(), value.as_ptr())
        })
    }

    /// Deletes an attribute.
    ///
    /// This is equivalent to the Python statement `del self.attr_name`.
    fn delattr<N>(&self, attr_name: N) -> PyResult<()>
    where
        N: IntoObject<'py>,
    {
        let py = self.py();
        let slf = checked_ptr(self)?;
        let attr_name = attr_name.into_object(py)?;
        error_on_minusone(py, unsafe {
            ffi::PyObject_SetAttr(slf, attr_name.as_ptr(), std::ptr::null_mut())
        })
    }

    /// Computes the "repr" representation of self.
    ///
    /// This is equivalent to the Python expression `repr(self)`.
    fn repr(&self) -> PyResult<Owned<'py, PyString>> {
        let slf = checked_ptr(self)?;
        unsafe {
            Owned::<PyAny>::from_owned_ptr_or_err(self.py(), ffi::PyObject_Repr(slf))
                .map(|repr| repr.cast_into_unchecked())
        }
    }

    /// Like [`repr`](AnyMethods::repr), but escapes non-ASCII characters.
    ///
    /// This is equivalent to the Python expression `ascii(self)`.
    fn ascii(&self) -> PyResult<Owned<'py, PyString>> {
        let slf = checked_ptr(self)?;
        unsafe {
            Owned::<PyAny>::from_owned_ptr_or_err(self.py(), ffi::PyObject_ASCII(slf))
                .map(|ascii| ascii.cast_into_unchecked())
        }
    }

    /// Computes the "str" representation of self.
    ///
    /// This is equivalent to the Python expression `str(self)`.
    fn str(&self) -> PyResult<Owned<'py, PyString>> {
        let slf = checked_ptr(self)?;
        unsafe {
            Owned::<PyAny>::from_owned_ptr_or_err(self.py(), ffi::PyObject_Str(slf))
                .map(|s| s.cast_into_unchecked())
        }
    }

    /// This is equivalent to the Python expression `bytes(self)`.
    fn bytes(&self) -> PyResult<Owned<'py, PyAny>> {
        let slf = checked_ptr(self)?;
        unsafe { Owned::from_owned_ptr_or_err(self.py(), ffi::PyObject_Bytes(slf)) }
    }

    /// Checks whether this object, which must be a class, is a subclass of `cls`.
    ///
    /// This is equivalent to the Python expression `issubclass(self, cls)`.
    fn is_subclass<C>(&self, cls: C) -> PyResult<bool>
    where
        C: AsPyPointer,
    {
        let py = self.py();
        let slf = checked_ptr(self)?;
        crate::pyutils::ensure_nonnull(py, &[&cls])?;
        match unsafe { ffi::PyObject_IsSubclass(slf, cls.as_ptr()) } {
            -1 => Err(PyErr::fetch(py)),
            result => Ok(result == 1),
        }
    }

    /// Checks whether this object is an instance of `cls`, which is a class or a tuple of
    /// classes.
    ///
    /// This is equivalent to the Python expression `isinstance(self, cls)`.
    fn is_instance<C>(&self, cls: C) -> PyResult<bool>
    where
        C: AsPyPointer,
    {
        let py = self.py();
        let slf = checked_ptr(self)?;
        crate::pyutils::ensure_nonnull(py, &[&cls])?;
        match unsafe { ffi::PyObject_IsInstance(slf, cls.as_ptr()) } {
            -1 => Err(PyErr::fetch(py)),
            result => Ok(result == 1),
        }
    }

    /// Checks whether this object is of kind `T`. A null handle is of no kind.
    #[inline]
    fn is_instance_of<T: PyTypeCheck>(&self) -> bool {
        self.is_nonnull() && T::type_check(self.as_object())
    }

    /// Determines whether this object appears callable.
    ///
    /// This is equivalent to Python's [`callable()`][1] function.
    ///
    /// [1]: https://docs.python.org/3/library/functions.html#callable
    fn is_callable(&self) -> PyResult<bool> {
        let slf = checked_ptr(self)?;
        Ok(unsafe { ffi::PyCallable_Check(slf) } != 0)
    }

    /// Retrieves the hash code of self.
    ///
    /// This is equivalent to the Python expression `hash(self)`.
    fn hash(&self) -> PyResult<isize> {
        let slf = checked_ptr(self)?;
        match unsafe { ffi::PyObject_Hash(slf) } {
            -1 => Err(PyErr::fetch(self.py())),
            hash => Ok(hash),
        }
    }

    /// Returns whether the object is considered to be true.
    ///
    /// This is equivalent to the Python expression `bool(self)`.
    fn is_true(&self) -> PyResult<bool> {
        let slf = checked_ptr(self)?;
        match unsafe { ffi::PyObject_IsTrue(slf) } {
            -1 => Err(PyErr::fetch(self.py())),
            v => Ok(v != 0),
        }
    }

    /// Returns whether the object is the `None` singleton.
    #[inline]
    fn is_none(&self) -> bool {
        self.as_ptr() == unsafe { ffi::Py_None() }
    }

    /// Returns the Python type object for this object's type.
    fn get_type(&self) -> PyResult<Owned<'py, PyType>> {
        let slf = checked_ptr(self)?;
        unsafe {
            let ty = ffi::Py_TYPE(slf).cast::<ffi::PyObject>();
            ffi::Py_INCREF(ty);
            Ok(Owned::from_owned_ptr(self.py(), ty))
        }
    }

    /// Returns the length of the sequence or mapping.
    ///
    /// This is equivalent to the Python expression `len(self)`.
    fn len(&self) -> PyResult<usize> {
        let slf = checked_ptr(self)?;
        match unsafe { ffi::PyObject_Size(slf) } {
            -1 => Err(PyErr::fetch(self.py())),
            len => Ok(crate::internal_tricks::len_from_ssize(len)),
        }
    }

    /// Returns true if the sequence or mapping has a length of 0.
    ///
    /// This is equivalent to the Python expression `len(self) == 0`.
    fn is_empty(&self) -> PyResult<bool> {
        self.len().map(|l| l == 0)
    }

    /// Returns an estimate of the number of items the object will yield, or `default` when it
    /// cannot tell.
    ///
    /// This is equivalent to `operator.length_hint(self, default)`.
    #[cfg(not(Py_LIMITED_API))]
    fn length_hint(&self, default: usize) -> PyResult<usize> {
        let slf = checked_ptr(self)?;
        let default = crate::internal_tricks::get_ssize_index(default);
        match unsafe { ffi::PyObject_LengthHint(slf, default) } {
            -1 => Err(PyErr::fetch(self.py())),
            len => Ok(crate::internal_tricks::len_from_ssize(len)),
        }
    }

    /// Returns the list of attributes of this object.
    ///
    /// This is equivalent to the Python expression `dir(self)`.
    fn dir(&self) -> PyResult<Owned<'py, PyList>> {
        let slf = checked_ptr(self)?;
        unsafe {
            Owned::<PyAny>::from_owned_ptr_or_err(self.py(), ffi::PyObject_Dir(slf))
                .map(|dir| dir.cast_into_unchecked())
        }
    }

    /// Takes an object and returns an iterator for it.
    ///
    /// This is typically a new iterator but if the argument is an iterator, this returns itself.
    fn try_iter(&self) -> PyResult<Owned<'py, PyIterator>> {
        let slf = checked_ptr(self)?;
        unsafe {
            Owned::<PyAny>::from_owned_ptr_or_err(self.py(), ffi::PyObject_GetIter(slf))
                .map(|iter| iter.cast_into_unchecked())
        }
    }

    /// Advances this object, which must be an iterator.
    ///
    /// Returns `Ok(None)` once the iterator is exhausted; the end of iteration is not an error.
    /// Anything other than an iterator is a `TypeError`, as for Python's `next()`.
    fn next_item(&self) -> PyResult<Option<Owned<'py, PyAny>>> {
        let py = self.py();
        let slf = checked_ptr(self)?;
        if !<PyIterator as PyTypeCheck>::type_check(self.as_object()) {
            let type_name = self.get_type()?.name()?;
            return Err(PyTypeError::new_err(format!(
                "'{}' object is not an iterator",
                type_name.to_string_lossy()
            )));
        }
        let item = unsafe { Owned::from_owned_ptr(py, ffi::PyIter_Next(slf)) };
        if !item.is_null() {
            Ok(Some(item))
        } else {
            PyErr::take(py).map_or(Ok(None), Err)
        }
    }

    /// Compares two Python objects.
    ///
    /// Depending on the value of `compare_op`, this is equivalent to one of the
    /// following Python expressions:
    ///   * CompareOp::Eq: `self == other`
    ///   * CompareOp::Ne: `self != other`
    ///   * CompareOp::Lt: `self < other`
    ///   * CompareOp::Le: `self <= other`
    ///   * CompareOp::Gt: `self > other`
    ///   * CompareOp::Ge: `self >= other`
    fn rich_compare<O>(&self, other: O, compare_op: CompareOp) -> PyResult<Owned<'py, PyAny>>
    where
        O: IntoObject<'py>,
    {
        let py = self.py();
        let slf = checked_ptr(self)?;
        let other = other.into_object(py)?;
        unsafe {
            Owned::from_owned_ptr_or_err(
                py,
                ffi::PyObject_RichCompare(slf, other.as_ptr(), compare_op as c_int),
            )
        }
    }

    /// Compares two Python objects.
    ///
    /// This is equivalent to:
    /// ```python
    /// if self == other:
    ///     return Equal
    /// elif a < b:
    ///     return Less
    /// elif a > b:
    ///     return Greater
    /// else:
    ///     raise TypeError("AnyMethods::compare(): All comparisons returned false")
    /// ```
    fn compare<O>(&self, other: O) -> PyResult<Ordering>
    where
        O: IntoObject<'py>,
    {
        let other = other.into_object(self.py())?;
        if self.eq(&other)? {
            Ok(Ordering::Equal)
        } else if self.lt(&other)? {
            Ok(Ordering::Less)
        } else if self.gt(&other)? {
            Ok(Ordering::Greater)
        } else {
            Err(PyTypeError::new_err(
                "AnyMethods::compare(): All comparisons returned false",
            ))
        }
    }

    comparison_op!(
        /// Tests whether this object is less than another.
        ///
        /// This is equivalent to the Python expression `self < other`.
        lt,
        CompareOp::Lt
    );
    comparison_op!(
        /// Tests whether this object is less than or equal to another.
        le,
        CompareOp::Le
    );
    comparison_op!(
        /// Tests whether this object is equal to another.
        ///
        /// This is equivalent to the Python expression `self == other`.
        eq,
        CompareOp::Eq
    );
    comparison_op!(
        /// Tests whether this object is not equal to another.
        ne,
        CompareOp::Ne
    );
    comparison_op!(
        /// Tests whether this object is greater than another.
        gt,
        CompareOp::Gt
    );
    comparison_op!(
        /// Tests whether this object is greater than or equal to another.
        ge,
        CompareOp::Ge
    );

    /// Returns whether `self` and `other` point to the same object. To compare
    /// the equality of two objects (the `==` operator), use [`eq`](AnyMethods::eq).
    ///
    /// This is equivalent to the Python expression `self is other`.
    #[inline]
    fn is<T: AsPyPointer>(&self, other: T) -> bool {
        self.as_ptr() == other.as_ptr()
    }

    unary_op!(
        /// Computes `-self`.
        neg,
        PyNumber_Negative
    );
    unary_op!(
        /// Computes `+self`.
        pos,
        PyNumber_Positive
    );
    unary_op!(
        /// Computes `abs(self)`.
        abs,
        PyNumber_Absolute
    );
    unary_op!(
        /// Computes `~self`.
        invert,
        PyNumber_Invert
    );

    binary_op!(
        /// Computes `self + other`.
        add,
        PyNumber_Add
    );
    binary_op!(
        /// Computes `self - other`.
        sub,
        PyNumber_Subtract
    );
    binary_op!(
        /// Computes `self * other`.
        mul,
        PyNumber_Multiply
    );
    binary_op!(
        /// Computes `self @ other`.
        matmul,
        PyNumber_MatrixMultiply
    );
    binary_op!(
        /// Computes `self / other`.
        truediv,
        PyNumber_TrueDivide
    );
    binary_op!(
        /// Computes `self // other`.
        floordiv,
        PyNumber_FloorDivide
    );
    binary_op!(
        /// Computes `self % other`.
        rem,
        PyNumber_Remainder
    );
    binary_op!(
        /// Computes `divmod(self, other)`.
        divmod,
        PyNumber_Divmod
    );
    binary_op!(
        /// Computes `self << other`.
        lshift,
        PyNumber_Lshift
    );
    binary_op!(
        /// Computes `self >> other`.
        rshift,
        PyNumber_Rshift
    );
    binary_op!(
        /// Computes `self & other`.
        bitand,
        PyNumber_And
    );
    binary_op!(
        /// Computes `self ^ other`.
        bitxor,
        PyNumber_Xor
    );
    binary_op!(
        /// Computes `self | other`.
        bitor,
        PyNumber_Or
    );

    /// Computes `pow(self, other, modulus)`. Pass `None::<()>`-like values (anything converting
    /// to `None`) to leave out the modulus.
    fn pow<O1, O2>(&self, other: O1, modulus: O2) -> PyResult<Owned<'py, PyAny>>
    where
        O1: IntoObject<'py>,
        O2: IntoObject<'py>,
    {
        let py = self.py();
        let slf = checked_ptr(self)?;
        let other = other.into_object(py)?;
        let modulus = modulus.into_object(py)?;
        unsafe {
            Owned::from_owned_ptr_or_err(
                py,
                ffi::PyNumber_Power(slf, other.as_ptr(), modulus.as_ptr()),
            )
        }
    }

    /// Gets an item from the collection.
    ///
    /// This is equivalent to the Python expression `self[key]`.
    fn get_item<K>(&self, key: K) -> PyResult<Owned<'py, PyAny>>
    where
        K: IntoObject<'py>,
    {
        let py = self.py();
        let slf = checked_ptr(self)?;
        let key = key.into_object(py)?;
        unsafe { Owned::from_owned_ptr_or_err(py, ffi::PyObject_GetItem(slf, key.as_ptr())) }
    }

    /// Sets a collection item value.
    ///
    /// This is equivalent to the Python expression `self[key] = value`.
    fn set_item<K, V>(&self, key: K, value: V) -> PyResult<()>
    where
        K: IntoObject<'py>,
        V: IntoObject<'py>,
    {
        let py = self.py();
        let slf = checked_ptr(self)?;
        let key = key.into_object(py)?;
        let value = value.into_object(py)?;
        error_on_minusone(py, unsafe {
            ffi::PyObject_SetItem(slf, key.as_ptr(), value.as_ptr())
        })
    }

    /// Deletes an item from the collection.
    ///
    /// This is equivalent to the Python expression `del self[key]`.
    fn del_item<K>(&self, key: K) -> PyResult<()>
    where
        K: IntoObject<'py>,
    {
        let py = self.py();
        let slf = checked_ptr(self)?;
        let key = key.into_object(py)?;
        error_on_minusone(py, unsafe { ffi::PyObject_DelItem(slf, key.as_ptr()) })
    }

    /// Calls the object.
    ///
    /// This is equivalent to the Python expression `self(*args, **kwargs)`. `kwargs` must be a
    /// `dict` when given.
    fn call<A>(&self, args: A, kwargs: Option<Object<'_, PyAny>>) -> PyResult<Owned<'py, PyAny>>
    where
        A: IntoArgs<'py>,
    {
        let py = self.py();
        let slf = checked_ptr(self)?;
        let args = args.into_args(py)?;
        let kwargs = match kwargs {
            Some(kwargs) => {
                let ptr = checked_ptr(&kwargs)?;
                if unsafe { ffi::PyDict_Check(ptr) } == 0 {
                    return Err(PyTypeError::new_err("keyword arguments must be a dict"));
                }
                ptr
            }
            None => std::ptr::null_mut(),
        };
        unsafe { Owned::from_owned_ptr_or_err(py, ffi::PyObject_Call(slf, args.as_ptr(), kwargs)) }
    }

    /// Calls the object without arguments.
    ///
    /// This is equivalent to the Python expression `self()`.
    fn call0(&self) -> PyResult<Owned<'py, PyAny>> {
        self.call((), None)
    }

    /// Calls the object with only positional arguments.
    ///
    /// This is equivalent to the Python expression `self(*args)`.
    fn call1<A>(&self, args: A) -> PyResult<Owned<'py, PyAny>>
    where
        A: IntoArgs<'py>,
    {
        self.call(args, None)
    }

    /// Calls a method on the object with positional arguments.
    ///
    /// This is equivalent to the Python expression `self.name(*args)`.
    fn call_method<N, A>(&self, name: N, args: A) -> PyResult<Owned<'py, PyAny>>
    where
        N: IntoObject<'py>,
        A: IntoArgs<'py>,
    {
        self.getattr(name)?.call1(args)
    }

    /// Extracts a Rust value out of this object.
    ///
    /// Borrowed results such as `Object` live no longer than `self`.
    fn extract<'a, T>(&'a self) -> PyResult<T>
    where
        T: FromArg<'a>,
        'py: 'a,
    {
        checked_ptr(self)?;
        T::from_arg(self.as_object())
    }

    /// Writes the object to a C `FILE`, using `repr()` unless `flags` is
    /// `Py_PRINT_RAW`, in which case `str()` is written.
    ///
    /// # Safety
    ///
    /// `fp` must be a valid, open `FILE` stream.
    #[cfg(not(any(Py_LIMITED_API, PyPy)))]
    unsafe fn print(&self, fp: *mut libc::FILE, flags: c_int) -> PyResult<()> {
        let slf = checked_ptr(self)?;
        error_on_minusone(self.py(), unsafe { ffi::PyObject_Print(slf, fp, flags) })
    }
}

impl<'py, H> AnyMethods<'py> for H where H: Handle<'py, Kind = PyAny> + ?Sized {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exceptions::{PyAssertionError, PyKeyError, PyZeroDivisionError};
    use crate::types::{PyLong, PyTuple};

    #[test]
    fn test_attribute_protocol() {
        Python::with_gil(|py| {
            let ns = py.eval("type('Ns', (), {})()").unwrap();
            assert!(!ns.hasattr("spam").unwrap());
            ns.setattr("spam", 5).unwrap();
            assert!(ns.hasattr("spam").unwrap());
            assert_eq!(ns.getattr("spam").unwrap().extract::<i64>().unwrap(), 5);
            ns.delattr("spam").unwrap();
            assert!(!ns.hasattr("spam").unwrap());
            assert!(ns.delattr("spam").is_err());
        });
    }

    #[test]
    fn test_call_for_non_existing_method() {
        Python::with_gil(|py| {
            let a = py.eval("42").unwrap();
            a.call_method("__str__", ()).unwrap(); // ok
            assert!(a.call_method("nonexistent_method", (1,)).is_err());
            assert!(a.call_method("nonexistent_method", ()).is_err());
        });
    }

    #[test]
    fn test_call_with_kwargs() {
        Python::with_gil(|py| {
            let list = py.eval("[3, 6, 5, 4, 7]").unwrap();
            let kwargs = py.eval("{'reverse': True}").unwrap();
            list.getattr("sort")
                .unwrap()
                .call((), Some(kwargs.as_object()))
                .unwrap();
            assert_eq!(list.to_string(), "[7, 6, 5, 4, 3]");

            let not_a_dict = py.eval("[1]").unwrap();
            let err = list
                .getattr("sort")
                .unwrap()
                .call((), Some(not_a_dict.as_object()))
                .unwrap_err();
            assert!(err.is_instance_of::<PyTypeError>(py));
        });
    }

    #[test]
    fn test_find_and_add() {
        Python::with_gil(|py| {
            let s = PyString::new(py, "ayy.lmao").unwrap();
            let idx = s.call_method("find", (".",)).unwrap();
            let total = idx.add(1).unwrap().add(2).unwrap().add(2.5).unwrap();
            assert!(total.eq(8.5).unwrap());
            assert_eq!(total.to_string(), "8.5");
            assert_eq!(total.refcnt(), 1);
        });
    }

    #[test]
    fn test_str_repr_ascii_bytes() {
        Python::with_gil(|py| {
            let s = PyString::new(py, "é").unwrap();
            assert_eq!(s.str().unwrap().to_string(), "é");
            assert_eq!(s.repr().unwrap().to_string(), "'é'");
            assert_eq!(s.ascii().unwrap().to_string(), "'\\xe9'");
            let b = py.eval("[104, 105]").unwrap().bytes().unwrap();
            assert_eq!(b.to_string(), "b'hi'");
        });
    }

    #[test]
    fn test_type_and_instance_checks() {
        Python::with_gil(|py| {
            let x = py.eval("5").unwrap();
            let int_type = x.get_type().unwrap();
            assert!(x.is_instance(&int_type).unwrap());
            assert!(x.is_instance_of::<PyLong>());
            assert!(!x.is_instance_of::<PyTuple>());
            let bool_type = py.True().get_type().unwrap();
            assert!(bool_type.is_subclass(&int_type).unwrap());
            assert!(!int_type.is_subclass(&bool_type).unwrap());
            assert!(int_type.is_callable().unwrap());
            assert!(!x.is_callable().unwrap());
        });
    }

    #[test]
    fn test_hash_truth_len() {
        Python::with_gil(|py| {
            let x = py.eval("5").unwrap();
            assert_eq!(x.hash().unwrap(), 5);
            assert!(x.is_true().unwrap());
            assert!(!py.eval("0").unwrap().is_true().unwrap());
            assert!(py.eval("[]").unwrap().hash().is_err());
            assert_eq!(py.eval("[1, 2, 3]").unwrap().len().unwrap(), 3);
            assert!(py.eval("[]").unwrap().is_empty().unwrap());
            assert!(x.len().is_err());
            assert!(py.None().is_none());
            assert!(!x.is_none());
        });
    }

    #[cfg(not(Py_LIMITED_API))]
    #[test]
    fn test_length_hint() {
        Python::with_gil(|py| {
            let it = py.eval("iter([1, 2, 3])").unwrap();
            assert_eq!(it.length_hint(0).unwrap(), 3);
            let gen = py.eval("(i for i in range(3))").unwrap();
            assert_eq!(gen.length_hint(7).unwrap(), 7);
        });
    }

    #[test]
    fn test_dir() {
        Python::with_gil(|py| {
            let obj = py.eval("42").unwrap();
            let dir = obj.dir().unwrap();
            let expected = py.eval("dir(42)").unwrap();
            assert!(dir.eq(&expected).unwrap());
        });
    }

    #[test]
    fn test_iteration() {
        Python::with_gil(|py| {
            let list = py.eval("[1, 2]").unwrap();
            let iter = list.try_iter().unwrap();
            assert_eq!(iter.next_item().unwrap().unwrap().extract::<i64>().unwrap(), 1);
            assert_eq!(iter.next_item().unwrap().unwrap().extract::<i64>().unwrap(), 2);
            assert!(iter.next_item().unwrap().is_none());
            assert!(py.eval("5").unwrap().try_iter().is_err());
        });
    }

    #[test]
    fn test_extract_borrowed_handle() {
        Python::with_gil(|py| {
            let tuple = py.eval("(1, 'a')").unwrap();
            let narrowed = tuple.extract::<Object<'_, PyTuple>>().unwrap();
            assert!(narrowed.is(&tuple));
            assert!(tuple.extract::<Object<'_, PyList>>().is_err());
            assert!(tuple.extract::<Owned<'_, PyTuple>>().unwrap().is(&tuple));
        });
    }

    #[test]
    fn test_next_item_needs_an_iterator() {
        Python::with_gil(|py| {
            let list = py.eval("[1, 2]").unwrap();
            let err = list.next_item().unwrap_err();
            assert!(err.is_instance_of::<PyTypeError>(py));
            assert_eq!(err.to_string(), "TypeError: 'list' object is not an iterator");
            assert!(!PyErr::occurred(py));

            let generator = py.eval("(x for x in 'a')").unwrap();
            assert_eq!(generator.next_item().unwrap().unwrap().to_string(), "a");
        });
    }

    #[test]
    fn test_comparisons() {
        Python::with_gil(|py| {
            let one = py.eval("1").unwrap();
            assert!(one.lt(2).unwrap());
            assert!(one.le(1).unwrap());
            assert!(one.eq(1.0).unwrap());
            assert!(one.ne(2).unwrap());
            assert!(one.gt(0).unwrap());
            assert!(one.ge(1).unwrap());
            assert_eq!(one.compare(2).unwrap(), Ordering::Less);
            assert_eq!(one.compare(1).unwrap(), Ordering::Equal);
            assert_eq!(one.compare(0).unwrap(), Ordering::Greater);
            assert!(one.lt("a").is_err());

            let nan = py.eval("float('nan')").unwrap();
            assert!(nan.compare(&nan).is_err());
            assert_eq!(
                one.rich_compare(1, CompareOp::Eq).unwrap().as_ptr(),
                py.True().as_ptr()
            );
        });
    }

    #[test]
    fn test_number_protocol() {
        Python::with_gil(|py| {
            let seven = py.eval("7").unwrap();
            fn check(value: PyResult<Owned<'_, PyAny>>, expected: &str) {
                assert_eq!(value.unwrap().to_string(), expected);
            }
            check(seven.neg(), "-7");
            check(seven.pos(), "7");
            check(seven.neg().unwrap().abs(), "7");
            check(seven.invert(), "-8");
            check(seven.add(1), "8");
            check(seven.sub(1), "6");
            check(seven.mul(2), "14");
            check(seven.truediv(2), "3.5");
            check(seven.floordiv(2), "3");
            check(seven.rem(4), "3");
            check(seven.divmod(2), "(3, 1)");
            check(seven.pow(2, ()), "49");
            check(seven.pow(2, 5), "4");
            check(seven.lshift(1), "14");
            check(seven.rshift(1), "3");
            check(seven.bitand(3), "3");
            check(seven.bitxor(1), "6");
            check(seven.bitor(8), "15");

            let err = seven.truediv(0).unwrap_err();
            assert!(err.is_instance_of::<PyZeroDivisionError>(py));
            assert!(seven.matmul(seven.as_object()).is_err());
        });
    }

    #[test]
    fn test_item_protocol() {
        Python::with_gil(|py| {
            let d = py.eval("{}").unwrap();
            d.set_item("a", 1).unwrap();
            assert_eq!(d.get_item("a").unwrap().extract::<i64>().unwrap(), 1);
            d.del_item("a").unwrap();
            let err = d.get_item("a").unwrap_err();
            assert!(err.is_instance_of::<PyKeyError>(py));
        });
    }

    #[test]
    fn test_is() {
        Python::with_gil(|py| {
            let a = py.eval("object()").unwrap();
            let b = Owned::retain(&a);
            assert!(a.is(&b));
            assert!(!a.is(py.None()));
        });
    }

    #[test]
    fn test_null_receiver_fails_null_check() {
        Python::with_gil(|py| {
            let null = Object::<PyAny>::null(py);
            let err = null.getattr("spam").unwrap_err();
            assert!(err.is_instance_of::<PyAssertionError>(py));
            assert!(null.next_item().is_err());
            assert!(null.is_true().is_err());
            assert!(null.eq(1).is_err());
            assert!(py.eval("1").unwrap().add(null).is_err());
            assert!(!null.is_instance_of::<PyAny>());
            assert!(!PyErr::occurred(py));
        });
    }

    #[cfg(not(any(Py_LIMITED_API, PyPy)))]
    #[test]
    fn test_print() {
        Python::with_gil(|py| {
            let obj = PyString::new(py, "printed").unwrap();
            unsafe {
                let fp = libc::tmpfile();
                assert!(!fp.is_null());
                obj.print(fp, ffi::Py_PRINT_RAW).unwrap();
                libc::fflush(fp);
                let len = libc::ftell(fp);
                assert_eq!(len, "printed".len() as libc::c_long);
                libc::fclose(fp);

                let null = Object::<PyAny>::null(py);
                assert!(null.print(std::ptr::null_mut(), 0).is_err());
            }
        });
    }
}
