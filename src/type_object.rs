// Copyright (c) 2017-present PyO3 Project and Contributors
//! Python type object information

use crate::types::{PyAny, PyType};
use crate::{ffi, AsPyPointer, Object, Python};

/// Runtime check that an object is of a given kind.
///
/// This is what [`Object::cast`] consults when narrowing a handle.
///
/// # Safety
///
/// `type_check` must only return `true` for objects whose layout matches the kind.
pub unsafe trait PyTypeCheck {
    /// Name of the kind, used in error messages.
    const NAME: &'static str;

    /// Checks if `object` is an instance of this kind or a subclass. `object` is non-null.
    fn type_check(object: Object<'_, PyAny>) -> bool;
}

/// Python type information for kinds backed by a single, static type object.
///
/// # Safety
///
/// The return value of `type_object_raw` must always point to the same `PyTypeObject` instance.
pub unsafe trait PyTypeInfo: Sized {
    /// Class name.
    const NAME: &'static str;

    /// Returns the `PyTypeObject` instance for this type.
    fn type_object_raw(py: Python<'_>) -> *mut ffi::PyTypeObject;

    /// Returns a borrowed handle to the type object.
    #[inline]
    fn type_object(py: Python<'_>) -> Object<'_, PyType<Self>> {
        unsafe { Object::from_borrowed_ptr(py, Self::type_object_raw(py).cast()) }
    }

    /// Checks if `object` is an instance of this type or a subclass of this type.
    #[inline]
    fn is_type_of(object: Object<'_, PyAny>) -> bool {
        unsafe { ffi::PyObject_TypeCheck(object.as_ptr(), Self::type_object_raw(object_py(&object))) != 0 }
    }

    /// Checks if `object` is an instance of this type exactly.
    #[inline]
    fn is_exact_type_of(object: Object<'_, PyAny>) -> bool {
        unsafe { ffi::Py_TYPE(object.as_ptr()) == Self::type_object_raw(object_py(&object)) }
    }
}

unsafe impl<T: PyTypeInfo> PyTypeCheck for T {
    const NAME: &'static str = <T as PyTypeInfo>::NAME;

    #[inline]
    fn type_check(object: Object<'_, PyAny>) -> bool {
        T::is_type_of(object)
    }
}

#[inline]
fn object_py<'py>(object: &Object<'py, PyAny>) -> Python<'py> {
    crate::Handle::py(object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PyList, PyLong, PyTuple};
    use crate::Handle;

    #[test]
    fn test_type_checks() {
        Python::with_gil(|py| {
            let five = py.eval("5").unwrap();
            let tup = py.eval("(1, 2)").unwrap();
            let named = py.eval("__import__('collections').namedtuple('P', 'x y')(1, 2)").unwrap();

            assert!(PyLong::is_type_of(five.as_object()));
            assert!(!PyTuple::is_type_of(five.as_object()));
            assert!(PyAny::is_type_of(five.as_object()));

            assert!(PyTuple::is_type_of(named.as_object()));
            assert!(!PyTuple::is_exact_type_of(named.as_object()));
            assert!(PyTuple::is_exact_type_of(tup.as_object()));
            assert!(!PyList::is_type_of(tup.as_object()));
        });
    }

    #[test]
    fn test_type_object_identity() {
        Python::with_gil(|py| {
            let ty = PyTuple::type_object(py);
            assert_eq!(ty.as_ptr(), unsafe {
                std::ptr::addr_of_mut!(ffi::PyTuple_Type).cast::<ffi::PyObject>()
            });
            assert_eq!(<PyTuple as PyTypeCheck>::NAME, "tuple");
        });
    }
}
