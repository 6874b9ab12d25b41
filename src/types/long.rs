use std::ffi::CString;
use std::os::raw::{c_int, c_long, c_longlong, c_ulong, c_ulonglong};

use crate::err::{PyErr, PyResult};
use crate::pyutils::checked_ptr;
use crate::{ffi, Handle, Owned, PyAny, Python};

/// Represents a Python `int` object.
///
/// Values of Python `int` are arbitrary precision; the `as_*` accessors fail with
/// `OverflowError` when the value does not fit the requested C type, while the
/// `*_and_overflow` variants report the direction of the overflow instead.
pub enum PyLong {}

pyobject_native_type!(PyLong, PyLong_Type, "int", #checkfunction=ffi::PyLong_Check);

/// Direction in which a value overflowed a C integer type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Overflow {
    /// The value was smaller than the type's minimum.
    Negative,
    /// The value fit.
    None,
    /// The value was larger than the type's maximum.
    Positive,
}

impl Overflow {
    fn from_raw(overflow: c_int) -> Self {
        match overflow {
            o if o < 0 => Overflow::Negative,
            0 => Overflow::None,
            _ => Overflow::Positive,
        }
    }
}

macro_rules! long_constructor {
    ($($(#[$meta:meta])* $name:ident($rust_type:ty) => $ffi_fn:ident;)*) => {$(
        $(#[$meta])*
        pub fn $name(py: Python<'_>, value: $rust_type) -> PyResult<Owned<'_, PyLong>> {
            unsafe {
                Owned::<PyAny>::from_owned_ptr_or_err(py, ffi::$ffi_fn(value as _))
                    .map(|long| long.cast_into_unchecked())
            }
        }
    )*};
}

impl PyLong {
    long_constructor! {
        /// Creates a new `int` from a signed 64-bit integer.
        from_i64(i64) => PyLong_FromLongLong;
        /// Creates a new `int` from an unsigned 64-bit integer.
        from_u64(u64) => PyLong_FromUnsignedLongLong;
        /// Creates a new `int` from a pointer-sized signed integer.
        from_isize(isize) => PyLong_FromSsize_t;
        /// Creates a new `int` from a pointer-sized unsigned integer.
        from_usize(usize) => PyLong_FromSize_t;
        /// Creates a new `int` from the integral part of `value`.
        ///
        /// Infinities are an `OverflowError` and NaN is a `ValueError`.
        from_f64(f64) => PyLong_FromDouble;
    }

    /// Parses an `int` from its textual representation in the given base (2 to 36, or 0 to
    /// infer the base from a prefix the way Python literals do).
    pub fn from_str_radix<'py>(py: Python<'py>, s: &str, base: u32) -> PyResult<Owned<'py, PyLong>> {
        let s = CString::new(s)?;
        unsafe {
            Owned::<PyAny>::from_owned_ptr_or_err(
                py,
                ffi::PyLong_FromString(s.as_ptr(), std::ptr::null_mut(), base as c_int),
            )
            .map(|long| long.cast_into_unchecked())
        }
    }
}

/// Returns `value` unless it is the C API's error sentinel and an error is set.
#[inline]
fn err_if_invalid_value<T: PartialEq>(py: Python<'_>, invalid_value: T, actual_value: T) -> PyResult<T> {
    if actual_value == invalid_value {
        if let Some(err) = PyErr::take(py) {
            return Err(err);
        }
    }
    Ok(actual_value)
}

macro_rules! long_accessor {
    ($($(#[$meta:meta])* $name:ident -> $rust_type:ty = $ffi_fn:ident, $invalid:expr;)*) => {$(
        $(#[$meta])*
        fn $name(&self) -> PyResult<$rust_type> {
            let slf = checked_ptr(self)?;
            let value = unsafe { ffi::$ffi_fn(slf) };
            err_if_invalid_value(self.py(), $invalid, value)
        }
    )*};
}

macro_rules! long_accessor_and_overflow {
    ($($(#[$meta:meta])* $name:ident -> $rust_type:ty = $ffi_fn:ident;)*) => {$(
        $(#[$meta])*
        fn $name(&self) -> PyResult<($rust_type, Overflow)> {
            let slf = checked_ptr(self)?;
            let mut overflow: c_int = 0;
            let value = unsafe { ffi::$ffi_fn(slf, &mut overflow) };
            err_if_invalid_value(self.py(), -1, value).map(|value| (value, Overflow::from_raw(overflow)))
        }
    )*};
}

macro_rules! long_unary_op {
    ($($(#[$meta:meta])* $name:ident => $ffi_fn:ident;)*) => {$(
        $(#[$meta])*
        fn $name(&self) -> PyResult<Owned<'py, PyLong>> {
            let slf = checked_ptr(self)?;
            unsafe { Owned::<PyAny>::from_owned_ptr_or_err(self.py(), ffi::$ffi_fn(slf)) }?
                .cast_into()
        }
    )*};
}

/// Operations on `int` handles.
pub trait LongMethods<'py>: Handle<'py, Kind = PyLong> {
    long_accessor! {
        /// Converts to a C `long`.
        as_long -> c_long = PyLong_AsLong, -1;
        /// Converts to a C `long long`.
        as_long_long -> c_longlong = PyLong_AsLongLong, -1;
        /// Converts to a `Py_ssize_t`.
        as_ssize_t -> ffi::Py_ssize_t = PyLong_AsSsize_t, -1;
        /// Converts to a C `unsigned long`. Negative values are an `OverflowError`.
        as_unsigned_long -> c_ulong = PyLong_AsUnsignedLong, c_ulong::MAX;
        /// Converts to a `size_t`. Negative values are an `OverflowError`.
        as_size_t -> usize = PyLong_AsSize_t, usize::MAX;
        /// Converts to a C `unsigned long long`. Negative values are an `OverflowError`.
        as_unsigned_long_long -> c_ulonglong = PyLong_AsUnsignedLongLong, c_ulonglong::MAX;
        /// Converts to the nearest `f64`; values beyond its range are an `OverflowError`.
        as_double -> f64 = PyLong_AsDouble, -1.0;
    }

    long_accessor_and_overflow! {
        /// Converts to a C `long`. On overflow the value is `-1` and the direction is reported
        /// instead of raising.
        as_long_and_overflow -> c_long = PyLong_AsLongAndOverflow;
        /// Converts to a C `long long`, reporting overflow like
        /// [`as_long_and_overflow`](LongMethods::as_long_and_overflow).
        as_long_long_and_overflow -> c_longlong = PyLong_AsLongLongAndOverflow;
    }

    long_unary_op! {
        /// Computes `-self`.
        neg => PyNumber_Negative;
        /// Computes `+self`.
        pos => PyNumber_Positive;
        /// Computes `abs(self)`.
        abs => PyNumber_Absolute;
        /// Computes `~self`.
        invert => PyNumber_Invert;
    }
}

impl<'py, H> LongMethods<'py> for H where H: Handle<'py, Kind = PyLong> + ?Sized {}
