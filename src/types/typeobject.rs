// Copyright (c) 2017-present PyO3 Project and Contributors

use crate::conversion::IntoArgs;
use crate::err::PyResult;
use crate::instance::DerefToPyAny;
use crate::pyutils::checked_ptr;
use crate::type_object::{PyTypeCheck, PyTypeInfo};
use crate::types::{AnyMethods, PyAny, PyString};
use crate::{ffi, AsPyPointer, Handle, Object, Owned, Python};
use std::convert::Infallible;
use std::marker::PhantomData;

/// Represents a Python `type` object.
///
/// The parameter records the kind of the instances the type creates, so that
/// [`TypeMethods::construct`] hands back a handle of the right kind. `PyType` alone means a type
/// about which nothing more is known.
pub struct PyType<I = PyAny>(Infallible, PhantomData<I>);

unsafe impl<I> PyTypeInfo for PyType<I> {
    const NAME: &'static str = "type";

    #[inline]
    fn type_object_raw(_py: Python<'_>) -> *mut ffi::PyTypeObject {
        unsafe { std::ptr::addr_of_mut!(ffi::PyType_Type) }
    }

    #[inline]
    fn is_type_of(object: Object<'_, PyAny>) -> bool {
        unsafe { ffi::PyType_Check(object.as_ptr()) != 0 }
    }
}

unsafe impl<I> DerefToPyAny for PyType<I> {}

/// Operations on type objects.
pub trait TypeMethods<'py, I>: Handle<'py, Kind = PyType<I>> {
    /// Retrieves the underlying FFI pointer as a type object pointer.
    #[inline]
    fn as_type_ptr(&self) -> *mut ffi::PyTypeObject {
        self.as_ptr().cast()
    }

    /// Gets the name of the type, e.g. `int`.
    fn name(&self) -> PyResult<Owned<'py, PyString>> {
        any_view(self)?.getattr("__name__")?.cast_into()
    }

    /// Gets the qualified name of the type, e.g. `Outer.Inner`.
    fn qualname(&self) -> PyResult<Owned<'py, PyString>> {
        any_view(self)?.getattr("__qualname__")?.cast_into()
    }

    /// Checks whether `self` is a subclass of the type `T` describes.
    ///
    /// Equivalent to Python's `issubclass` function.
    fn is_subclass_of<T: PyTypeInfo>(&self) -> PyResult<bool> {
        any_view(self)?.is_subclass(T::type_object(self.py()))
    }

    /// Calls the type with positional arguments and narrows the new instance to `I`.
    ///
    /// This is equivalent to the Python expression `self(*args)` followed by a kind check; an
    /// instance of an unexpected kind is a `TypeError`.
    fn construct<A>(&self, args: A) -> PyResult<Owned<'py, I>>
    where
        A: IntoArgs<'py>,
        I: PyTypeCheck,
    {
        any_view(self)?.call1(args)?.cast_into::<I>()
    }
}

impl<'py, I, H> TypeMethods<'py, I> for H where H: Handle<'py, Kind = PyType<I>> + ?Sized {}

/// Borrowed `PyAny` view of `handle` carrying the interpreter lifetime.
fn any_view<'py, H>(handle: &H) -> PyResult<Object<'py, PyAny>>
where
    H: Handle<'py> + ?Sized,
{
    let ptr = checked_ptr(handle)?;
    // `handle` holds the reference for as long as the caller uses the view
    Ok(unsafe { Object::from_borrowed_ptr(handle.py(), ptr) })
}

impl<'py> Object<'py, PyType> {
    /// Narrows a type handle to one whose instances are `I`, after checking that the type
    /// really is `I`'s type object or a subclass of it.
    pub fn cast_type<I: PyTypeInfo>(self) -> PyResult<Object<'py, PyType<I>>> {
        if self.is_subclass_of::<I>()? {
            Ok(unsafe { self.cast_unchecked() })
        } else {
            let name = self.name()?;
            Err(crate::exceptions::PyTypeError::new_err(format!(
                "'{}' is not a subclass of '{}'",
                crate::types::StringMethods::to_string_lossy(&name),
                I::NAME
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PyLong, PyTuple, StringMethods, TupleMethods};

    #[test]
    fn test_type_names() {
        Python::with_gil(|py| {
            let ty = py.get_type::<PyLong>();
            assert_eq!(ty.name().unwrap().to_cow().unwrap(), "int");
            assert_eq!(ty.qualname().unwrap().to_cow().unwrap(), "int");
            let nested = py
                .eval("type('Outer', (), {'Inner': type('Inner', (), {'__qualname__': 'Outer.Inner'})}).Inner")
                .unwrap()
                .cast_into::<PyType>()
                .unwrap();
            assert_eq!(nested.name().unwrap().to_cow().unwrap(), "Inner");
            assert_eq!(nested.qualname().unwrap().to_cow().unwrap(), "Outer.Inner");
        });
    }

    #[test]
    fn test_is_subclass_of() {
        Python::with_gil(|py| {
            let bool_type = py.True().get_type().unwrap();
            assert!(bool_type.is_subclass_of::<PyLong>().unwrap());
            assert!(!bool_type.is_subclass_of::<PyTuple>().unwrap());
        });
    }

    #[test]
    fn test_construct() {
        Python::with_gil(|py| {
            let list = py.eval("[1, 2]").unwrap();
            let tuple = py.get_type::<PyTuple>().construct((&list,)).unwrap();
            assert_eq!(tuple.len().unwrap(), 2);

            let err = py.get_type::<PyLong>().construct(("nope",)).unwrap_err();
            assert!(err.is_instance_of::<crate::exceptions::PyValueError>(py));
        });
    }

    #[test]
    fn test_cast_type() {
        Python::with_gil(|py| {
            let ty = py.True().get_type().unwrap();
            let long_type = ty.as_object().cast_type::<PyLong>().unwrap();
            let value = long_type.construct((1,)).unwrap();
            assert_eq!(value.to_string(), "True");

            let err = ty.as_object().cast_type::<PyTuple>().unwrap_err();
            assert_eq!(
                err.value(py).to_string(),
                "'bool' is not a subclass of 'tuple'"
            );
        });
    }
}
