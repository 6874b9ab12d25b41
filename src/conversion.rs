// Copyright (c) 2017-present PyO3 Project and Contributors

//! Conversions from Rust values into owned Python objects and argument tuples.

use crate::err::PyResult;
use crate::pyutils::failed_null_check;
use crate::types::{PyAny, PyTuple};
use crate::{ffi, AsPyPointer, Handle, NonNullObject, Object, Owned, Py, Python};
use std::os::raw::c_long;

/// Conversion of a value into an owned Python object.
///
/// Handles convert by retaining a new reference (or moving theirs, for an `Owned` passed by
/// value). Converting a null handle fails with the "failed null check" error, so a null never
/// ends up stored inside a container.
pub trait IntoObject<'py> {
    /// Performs the conversion.
    fn into_object(self, py: Python<'py>) -> PyResult<Owned<'py, PyAny>>;
}

impl<'py, K> IntoObject<'py> for Owned<'_, K> {
    #[inline]
    fn into_object(self, py: Python<'py>) -> PyResult<Owned<'py, PyAny>> {
        if self.is_null() {
            return Err(failed_null_check(py));
        }
        Ok(unsafe { Owned::from_owned_ptr(py, self.into_ptr()) })
    }
}

impl<'py, K> IntoObject<'py> for &Owned<'_, K> {
    #[inline]
    fn into_object(self, py: Python<'py>) -> PyResult<Owned<'py, PyAny>> {
        self.as_object().into_object(py)
    }
}

impl<'py, K> IntoObject<'py> for Object<'_, K> {
    #[inline]
    fn into_object(self, py: Python<'py>) -> PyResult<Owned<'py, PyAny>> {
        if self.is_null() {
            return Err(failed_null_check(py));
        }
        let any = unsafe { Object::<PyAny>::from_borrowed_ptr(py, self.as_ptr()) };
        Ok(Owned::retain(&any))
    }
}

impl<'py, K> IntoObject<'py> for &Object<'_, K> {
    #[inline]
    fn into_object(self, py: Python<'py>) -> PyResult<Owned<'py, PyAny>> {
        (*self).into_object(py)
    }
}

impl<'py, K> IntoObject<'py> for NonNullObject<'_, K> {
    #[inline]
    fn into_object(self, py: Python<'py>) -> PyResult<Owned<'py, PyAny>> {
        self.as_object().into_object(py)
    }
}

impl<'py, K> IntoObject<'py> for &Py<K> {
    #[inline]
    fn into_object(self, py: Python<'py>) -> PyResult<Owned<'py, PyAny>> {
        self.bind(py).into_object(py)
    }
}

impl<'py, T: IntoObject<'py>> IntoObject<'py> for Option<T> {
    #[inline]
    fn into_object(self, py: Python<'py>) -> PyResult<Owned<'py, PyAny>> {
        match self {
            Some(value) => value.into_object(py),
            None => py.None().into_object(py),
        }
    }
}

impl<'py> IntoObject<'py> for () {
    #[inline]
    fn into_object(self, py: Python<'py>) -> PyResult<Owned<'py, PyAny>> {
        py.None().into_object(py)
    }
}

impl<'py> IntoObject<'py> for bool {
    #[inline]
    fn into_object(self, py: Python<'py>) -> PyResult<Owned<'py, PyAny>> {
        let value = if self { py.True() } else { py.False() };
        value.into_object(py)
    }
}

macro_rules! int_into_object {
    ($($rust_type:ty => $ffi_type:ty, $ffi_fn:ident;)*) => {$(
        impl<'py> IntoObject<'py> for $rust_type {
            #[inline]
            fn into_object(self, py: Python<'py>) -> PyResult<Owned<'py, PyAny>> {
                unsafe { Owned::from_owned_ptr_or_err(py, ffi::$ffi_fn(self as $ffi_type)) }
            }
        }
    )*};
}

int_into_object! {
    i8 => c_long, PyLong_FromLong;
    i16 => c_long, PyLong_FromLong;
    i32 => c_long, PyLong_FromLong;
    i64 => i64, PyLong_FromLongLong;
    isize => ffi::Py_ssize_t, PyLong_FromSsize_t;
    u8 => c_long, PyLong_FromLong;
    u16 => c_long, PyLong_FromLong;
    u32 => u64, PyLong_FromUnsignedLongLong;
    u64 => u64, PyLong_FromUnsignedLongLong;
    usize => usize, PyLong_FromSize_t;
    f32 => f64, PyFloat_FromDouble;
    f64 => f64, PyFloat_FromDouble;
}

impl<'py> IntoObject<'py> for &str {
    #[inline]
    fn into_object(self, py: Python<'py>) -> PyResult<Owned<'py, PyAny>> {
        crate::types::PyString::new(py, self).map(Owned::into_any)
    }
}

impl<'py> IntoObject<'py> for &String {
    #[inline]
    fn into_object(self, py: Python<'py>) -> PyResult<Owned<'py, PyAny>> {
        self.as_str().into_object(py)
    }
}

impl<'py> IntoObject<'py> for String {
    #[inline]
    fn into_object(self, py: Python<'py>) -> PyResult<Owned<'py, PyAny>> {
        self.as_str().into_object(py)
    }
}

impl<'py> IntoObject<'py> for char {
    #[inline]
    fn into_object(self, py: Python<'py>) -> PyResult<Owned<'py, PyAny>> {
        let mut bytes = [0u8; 4];
        (&*self.encode_utf8(&mut bytes)).into_object(py)
    }
}

/// Conversion of a value into the positional-argument tuple of a call.
///
/// Implemented for tuples of up to 12 [`IntoObject`] elements, for `()` and for tuple handles.
pub trait IntoArgs<'py> {
    /// Builds the argument tuple.
    fn into_args(self, py: Python<'py>) -> PyResult<Owned<'py, PyTuple>>;
}

impl<'py> IntoArgs<'py> for () {
    #[inline]
    fn into_args(self, py: Python<'py>) -> PyResult<Owned<'py, PyTuple>> {
        PyTuple::empty(py)
    }
}

impl<'py> IntoArgs<'py> for Owned<'py, PyTuple> {
    #[inline]
    fn into_args(self, py: Python<'py>) -> PyResult<Owned<'py, PyTuple>> {
        if self.is_null() {
            return Err(failed_null_check(py));
        }
        Ok(self)
    }
}

impl<'py> IntoArgs<'py> for &Owned<'py, PyTuple> {
    #[inline]
    fn into_args(self, py: Python<'py>) -> PyResult<Owned<'py, PyTuple>> {
        self.as_object().into_args(py)
    }
}

impl<'py> IntoArgs<'py> for Object<'_, PyTuple> {
    #[inline]
    fn into_args(self, py: Python<'py>) -> PyResult<Owned<'py, PyTuple>> {
        if self.is_null() {
            return Err(failed_null_check(py));
        }
        let tuple = unsafe { Object::<PyTuple>::from_borrowed_ptr(py, self.as_ptr()) };
        Ok(Owned::retain(&tuple))
    }
}

macro_rules! tuple_conversion ({$length:expr, $(($n:tt, $T:ident)),+} => {
    impl<'py, $($T: IntoObject<'py>),+> IntoArgs<'py> for ($($T,)+) {
        fn into_args(self, py: Python<'py>) -> PyResult<Owned<'py, PyTuple>> {
            let elements = [$(self.$n.into_object(py)?),+];
            PyTuple::new(py, elements)
        }
    }

    impl<'py, $($T: IntoObject<'py>),+> IntoObject<'py> for ($($T,)+) {
        #[inline]
        fn into_object(self, py: Python<'py>) -> PyResult<Owned<'py, PyAny>> {
            self.into_args(py).map(Owned::into_any)
        }
    }
});

tuple_conversion!(1, (0, T0));
tuple_conversion!(2, (0, T0), (1, T1));
tuple_conversion!(3, (0, T0), (1, T1), (2, T2));
tuple_conversion!(4, (0, T0), (1, T1), (2, T2), (3, T3));
tuple_conversion!(5, (0, T0), (1, T1), (2, T2), (3, T3), (4, T4));
tuple_conversion!(6, (0, T0), (1, T1), (2, T2), (3, T3), (4, T4), (5, T5));
tuple_conversion!(7, (0, T0), (1, T1), (2, T2), (3, T3), (4, T4), (5, T5), (6, T6));
tuple_conversion!(8, (0, T0), (1, T1), (2, T2), (3, T3), (4, T4), (5, T5), (6, T6), (7, T7));
tuple_conversion!(
    9,
    (0, T0),
    (1, T1),
    (2, T2),
    (3, T3),
    (4, T4),
    (5, T5),
    (6, T6),
    (7, T7),
    (8, T8)
);
tuple_conversion!(
    10,
    (0, T0),
    (1, T1),
    (2, T2),
    (3, T3),
    (4, T4),
    (5, T5),
    (6, T6),
    (7, T7),
    (8, T8),
    (9, T9)
);
tuple_conversion!(
    11,
    (0, T0),
    (1, T1),
    (2, T2),
    (3, T3),
    (4, T4),
    (5, T5),
    (6, T6),
    (7, T7),
    (8, T8),
    (9, T9),
    (10, T10)
);
tuple_conversion!(
    12,
    (0, T0),
    (1, T1),
    (2, T2),
    (3, T3),
    (4, T4),
    (5, T5),
    (6, T6),
    (7, T7),
    (8, T8),
    (9, T9),
    (10, T10),
    (11, T11)
);
