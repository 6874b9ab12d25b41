// Copyright (c) 2017-present PyO3 Project and Contributors

//! Wrapping Rust functions as native Python callables.
//!
//! A function taking a `self` handle followed by typed positional arguments can be turned
//! into a method definition with [`automethod!`](crate::automethod!):
//!
//! ```ignore
//! use libpy::automethod::StaticMethodDef;
//! use libpy::prelude::*;
//!
//! fn add(_slf: Object<'_, PyAny>, a: i64, b: i64) -> i64 {
//!     a + b
//! }
//!
//! static ADD: StaticMethodDef = libpy::automethod!(add, "Adds two integers.");
//!
//! Python::with_gil(|py| -> PyResult<()> {
//!     let add = ADD.to_function(py, None)?;
//!     assert_eq!(add.call1((1, 2))?.extract::<i64>()?, 3);
//!     Ok(())
//! })
//! ```
//!
//! Every argument type has a single-character format tag, the same tag the interpreter's
//! `PyArg_ParseTuple` understands. The tags of all arguments form the format string the
//! incoming argument tuple is parsed with, so wrong arity or wrong argument types are
//! reported by the interpreter itself and the function is never entered. A type without a
//! [`FromArg`] implementation cannot be used as an argument at all.
//!
//! | Rust type                | tag |
//! |--------------------------|-----|
//! | `u8`                     | `b` |
//! | `i16`                    | `h` |
//! | `u16`                    | `H` |
//! | `i32`                    | `i` |
//! | `u32`                    | `I` |
//! | `i64`                    | `L` |
//! | `u64`                    | `K` |
//! | `isize`                  | `n` |
//! | `f32`                    | `f` |
//! | `f64`                    | `d` |
//! | `bool`                   | `p` |
//! | `char`                   | `C` |
//! | `String`                 | `s` |
//! | `Option<String>`         | `z` |
//! | `Object<K>`, `Owned<K>`  | `O` |
//!
//! Functions without arguments are registered as `METH_NOARGS` and skip parsing entirely.

use crate::conversion::{IntoArgs, IntoObject};
use crate::err::{PyErr, PyResult};
use crate::exceptions::PyValueError;
use crate::type_object::PyTypeCheck;
use crate::types::PyAny;
use crate::{ffi, AsPyPointer, Handle, Object, Owned, Python};
use std::ffi::CStr;
use std::os::raw::{c_char, c_int, c_longlong, c_uint, c_ulonglong};
use std::ptr::{self, addr_of_mut};

/// A Rust type which can be parsed from one positional argument.
///
/// # Safety
///
/// `Raw` must be the C type `PyArg_ParseTuple` writes for the tag `FORMAT`.
pub unsafe trait FromArg<'py>: Sized {
    /// The `PyArg_ParseTuple` format tag.
    const FORMAT: u8;

    /// The C value the parser stores.
    type Raw: Copy;

    /// Initial value of the parser's output slot.
    const INIT: Self::Raw;

    /// Converts the value written by the parser.
    ///
    /// # Safety
    ///
    /// `raw` must have been written by `PyArg_ParseTuple` for the tag `FORMAT`, from an
    /// argument tuple which is still alive.
    unsafe fn from_raw(py: Python<'py>, raw: Self::Raw) -> PyResult<Self>;

    /// Parses a single object the way it would be parsed as an argument.
    fn from_arg(arg: Object<'py, PyAny>) -> PyResult<Self> {
        let py = arg.py();
        let args = (arg,).into_args(py)?;
        let format = [Self::FORMAT, 0];
        let mut raw = Self::INIT;
        let parsed = unsafe {
            ffi::PyArg_ParseTuple(args.as_ptr(), format.as_ptr().cast::<c_char>(), addr_of_mut!(raw))
        };
        if parsed == 0 {
            return Err(PyErr::fetch(py));
        }
        unsafe { Self::from_raw(py, raw) }
    }
}

macro_rules! primitive_arg {
    ($($rust_type:ty => $tag:literal, $raw:ty;)*) => {$(
        unsafe impl<'py> FromArg<'py> for $rust_type {
            const FORMAT: u8 = $tag;
            type Raw = $raw;
            const INIT: $raw = 0 as $raw;

            #[inline]
            unsafe fn from_raw(_py: Python<'py>, raw: $raw) -> PyResult<Self> {
                Ok(raw as $rust_type)
            }
        }
    )*};
}

primitive_arg! {
    u8 => b'b', u8;
    i16 => b'h', i16;
    u16 => b'H', u16;
    i32 => b'i', c_int;
    u32 => b'I', c_uint;
    i64 => b'L', c_longlong;
    u64 => b'K', c_ulonglong;
    isize => b'n', ffi::Py_ssize_t;
    f32 => b'f', f32;
    f64 => b'd', f64;
}

unsafe impl<'py> FromArg<'py> for bool {
    const FORMAT: u8 = b'p';
    type Raw = c_int;
    const INIT: c_int = 0;

    #[inline]
    unsafe fn from_raw(_py: Python<'py>, raw: c_int) -> PyResult<Self> {
        Ok(raw != 0)
    }
}

unsafe impl<'py> FromArg<'py> for char {
    const FORMAT: u8 = b'C';
    type Raw = c_int;
    const INIT: c_int = 0;

    unsafe fn from_raw(_py: Python<'py>, raw: c_int) -> PyResult<Self> {
        u32::try_from(raw)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| PyValueError::new_err(format!("{:#x} is not a Unicode scalar value", raw)))
    }
}

unsafe impl<'py> FromArg<'py> for String {
    const FORMAT: u8 = b's';
    type Raw = *const c_char;
    const INIT: *const c_char = ptr::null();

    unsafe fn from_raw(py: Python<'py>, raw: *const c_char) -> PyResult<Self> {
        if raw.is_null() {
            return Err(crate::pyutils::failed_null_check(py));
        }
        Ok(unsafe { CStr::from_ptr(raw) }.to_str()?.to_owned())
    }
}

unsafe impl<'py> FromArg<'py> for Option<String> {
    const FORMAT: u8 = b'z';
    type Raw = *const c_char;
    const INIT: *const c_char = ptr::null();

    unsafe fn from_raw(_py: Python<'py>, raw: *const c_char) -> PyResult<Self> {
        if raw.is_null() {
            return Ok(None);
        }
        Ok(Some(unsafe { CStr::from_ptr(raw) }.to_str()?.to_owned()))
    }
}

unsafe impl<'py, K: PyTypeCheck> FromArg<'py> for Object<'py, K> {
    const FORMAT: u8 = b'O';
    type Raw = *mut ffi::PyObject;
    const INIT: *mut ffi::PyObject = ptr::null_mut();

    #[inline]
    unsafe fn from_raw(py: Python<'py>, raw: *mut ffi::PyObject) -> PyResult<Self> {
        unsafe { Object::<PyAny>::from_borrowed_ptr(py, raw) }.cast::<K>()
    }
}

unsafe impl<'py, K: PyTypeCheck> FromArg<'py> for Owned<'py, K> {
    const FORMAT: u8 = b'O';
    type Raw = *mut ffi::PyObject;
    const INIT: *mut ffi::PyObject = ptr::null_mut();

    #[inline]
    unsafe fn from_raw(py: Python<'py>, raw: *mut ffi::PyObject) -> PyResult<Self> {
        let object = unsafe { Object::<K>::from_raw(py, raw)? };
        Ok(Owned::retain(&object))
    }
}

/// Conversion of a wrapped function's return value into the pointer handed back to Python.
pub trait IntoCallResult<'py> {
    /// Returns a new reference, or the error to raise.
    fn into_call_result(self, py: Python<'py>) -> PyResult<*mut ffi::PyObject>;
}

impl<'py, T> IntoCallResult<'py> for T
where
    T: IntoObject<'py>,
{
    #[inline]
    fn into_call_result(self, py: Python<'py>) -> PyResult<*mut ffi::PyObject> {
        self.into_object(py).map(Owned::into_ptr)
    }
}

impl<'py, T> IntoCallResult<'py> for PyResult<T>
where
    T: IntoObject<'py>,
{
    #[inline]
    fn into_call_result(self, py: Python<'py>) -> PyResult<*mut ffi::PyObject> {
        self?.into_call_result(py)
    }
}

/// A Rust function callable from Python with the positional argument types `Args`.
///
/// Implemented for every `Fn(Object<'py, PyAny>, A0, .., An) -> R` with up to eight
/// [`FromArg`] arguments and an [`IntoCallResult`] return type. The first parameter receives
/// the `self` object of the call (the module, or null for a free function).
pub trait NativeMethod<'py, Args> {
    /// Number of positional arguments.
    const ARITY: usize;

    /// Parses `args` and calls the function.
    ///
    /// `name` is used in the parser's error messages.
    ///
    /// # Safety
    ///
    /// `slf` and `args` must be the pointers the interpreter passed to the native function.
    unsafe fn invoke(
        &self,
        py: Python<'py>,
        name: &str,
        slf: *mut ffi::PyObject,
        args: *mut ffi::PyObject,
    ) -> PyResult<*mut ffi::PyObject>;
}

impl<'py, F, R> NativeMethod<'py, ()> for F
where
    F: Fn(Object<'py, PyAny>) -> R,
    R: IntoCallResult<'py>,
{
    const ARITY: usize = 0;

    #[inline]
    unsafe fn invoke(
        &self,
        py: Python<'py>,
        _name: &str,
        slf: *mut ffi::PyObject,
        _args: *mut ffi::PyObject,
    ) -> PyResult<*mut ffi::PyObject> {
        let slf = unsafe { Object::from_borrowed_ptr(py, slf) };
        self(slf).into_call_result(py)
    }
}

macro_rules! native_method {
    ($arity:literal; $($A:ident $raw:ident),+) => {
        impl<'py, F, R, $($A),+> NativeMethod<'py, ($($A,)+)> for F
        where
            F: Fn(Object<'py, PyAny>, $($A),+) -> R,
            R: IntoCallResult<'py>,
            $($A: FromArg<'py>,)+
        {
            const ARITY: usize = $arity;

            unsafe fn invoke(
                &self,
                py: Python<'py>,
                name: &str,
                slf: *mut ffi::PyObject,
                args: *mut ffi::PyObject,
            ) -> PyResult<*mut ffi::PyObject> {
                let format = format_string(&[$($A::FORMAT),+], name);
                $(let mut $raw = $A::INIT;)+
                let parsed = unsafe {
                    ffi::PyArg_ParseTuple(args, format.as_ptr().cast::<c_char>(), $(addr_of_mut!($raw)),+)
                };
                if parsed == 0 {
                    return Err(PyErr::fetch(py));
                }
                let slf = unsafe { Object::from_borrowed_ptr(py, slf) };
                self(slf, $(unsafe { $A::from_raw(py, $raw)? }),+).into_call_result(py)
            }
        }
    };
}

native_method!(1; A0 raw0);
native_method!(2; A0 raw0, A1 raw1);
native_method!(3; A0 raw0, A1 raw1, A2 raw2);
native_method!(4; A0 raw0, A1 raw1, A2 raw2, A3 raw3);
native_method!(5; A0 raw0, A1 raw1, A2 raw2, A3 raw3, A4 raw4);
native_method!(6; A0 raw0, A1 raw1, A2 raw2, A3 raw3, A4 raw4, A5 raw5);
native_method!(7; A0 raw0, A1 raw1, A2 raw2, A3 raw3, A4 raw4, A5 raw5, A6 raw6);
native_method!(8; A0 raw0, A1 raw1, A2 raw2, A3 raw3, A4 raw4, A5 raw5, A6 raw6, A7 raw7);

/// Builds `"<tags>:<name>\0"`. The part after the colon names the function in parser errors.
fn format_string(tags: &[u8], name: &str) -> Vec<u8> {
    let mut format = Vec::with_capacity(tags.len() + name.len() + 2);
    format.extend_from_slice(tags);
    format.push(b':');
    format.extend(name.bytes().take_while(|&byte| byte != 0));
    format.push(0);
    format
}

/// The number of positional arguments of `f`.
#[inline]
pub const fn arity_of<'py, F, Args>(_f: &F) -> usize
where
    F: NativeMethod<'py, Args>,
{
    F::ARITY
}

/// The calling convention flags for a function taking `arity` positional arguments.
#[inline]
pub const fn flags_of(arity: usize) -> c_int {
    if arity == 0 {
        ffi::METH_NOARGS
    } else {
        ffi::METH_VARARGS
    }
}

/// A method table entry which can live in a `static`.
///
/// Created by [`automethod!`](crate::automethod!) and
/// [`named_automethod!`](crate::named_automethod!). A contiguous array of entries ending with
/// [`StaticMethodDef::SENTINEL`] has the layout of a C method table.
#[repr(transparent)]
pub struct StaticMethodDef(ffi::PyMethodDef);

// The definition only holds pointers to static data.
unsafe impl Sync for StaticMethodDef {}

impl StaticMethodDef {
    /// The all-null entry terminating a method table.
    pub const SENTINEL: StaticMethodDef = StaticMethodDef(ffi::PyMethodDef::zeroed());

    /// Creates an entry. `name` and `doc` must be nul-terminated.
    pub const fn new(
        name: &'static str,
        meth: ffi::PyCFunction,
        flags: c_int,
        doc: Option<&'static str>,
    ) -> Self {
        assert!(is_nul_terminated(name), "method name must be nul-terminated");
        let doc = match doc {
            Some(doc) => {
                assert!(is_nul_terminated(doc), "docstring must be nul-terminated");
                doc.as_ptr().cast::<c_char>()
            }
            None => ptr::null(),
        };
        StaticMethodDef(ffi::PyMethodDef {
            ml_name: name.as_ptr().cast::<c_char>(),
            ml_meth: ffi::PyMethodDefPointer { PyCFunction: meth },
            ml_flags: flags,
            ml_doc: doc,
        })
    }

    /// The Python-visible name, empty for the sentinel.
    pub fn name(&self) -> &str {
        if self.0.ml_name.is_null() {
            return "";
        }
        unsafe { CStr::from_ptr(self.0.ml_name) }.to_str().unwrap_or("")
    }

    /// The calling convention flags.
    #[inline]
    pub fn flags(&self) -> c_int {
        self.0.ml_flags
    }

    /// Pointer to the C definition, for method tables and `PyCFunction_NewEx`.
    #[inline]
    pub fn as_ptr(&self) -> *mut ffi::PyMethodDef {
        ptr::addr_of!(self.0).cast_mut()
    }

    /// Creates a builtin function object for this definition, bound to `slf`.
    ///
    /// With `None` the wrapped function receives a null `self` handle.
    pub fn to_function<'py>(
        &'static self,
        py: Python<'py>,
        slf: Option<Object<'py, PyAny>>,
    ) -> PyResult<Owned<'py, PyAny>> {
        let slf = slf.map_or(ptr::null_mut(), |slf| slf.as_ptr());
        unsafe {
            Owned::from_owned_ptr_or_err(
                py,
                ffi::PyCFunction_NewEx(self.as_ptr(), slf, ptr::null_mut()),
            )
        }
    }
}

const fn is_nul_terminated(text: &str) -> bool {
    let bytes = text.as_bytes();
    !bytes.is_empty() && bytes[bytes.len() - 1] == 0
}

/// Wraps a function as a [`StaticMethodDef`] named after the function.
///
/// ```ignore
/// static SCALE: StaticMethodDef = libpy::automethod!(scale);
/// static SCALE_DOCUMENTED: StaticMethodDef = libpy::automethod!(scale, "Scales a value.");
/// ```
#[macro_export]
macro_rules! automethod {
    ($func:ident) => {
        $crate::named_automethod!(@def ::std::stringify!($func), $func, ::std::option::Option::None)
    };
    ($func:ident, $doc:expr) => {
        $crate::named_automethod!(
            @def ::std::stringify!($func),
            $func,
            ::std::option::Option::Some($crate::const_concat!($doc, "\0"))
        )
    };
}

/// Wraps a function as a [`StaticMethodDef`] with an explicit Python name.
///
/// Useful for functions reached through a path, whose name alone would not do.
#[macro_export]
macro_rules! named_automethod {
    (@def $name:expr, $func:path, $doc:expr) => {{
        unsafe extern "C" fn __libpy_wrap(
            slf: *mut $crate::ffi::PyObject,
            args: *mut $crate::ffi::PyObject,
        ) -> *mut $crate::ffi::PyObject {
            unsafe fn __libpy_body(
                py: $crate::Python<'_>,
                slf: *mut $crate::ffi::PyObject,
                args: *mut $crate::ffi::PyObject,
            ) -> $crate::PyResult<*mut $crate::ffi::PyObject> {
                unsafe { $crate::automethod::NativeMethod::invoke(&$func, py, $name, slf, args) }
            }
            unsafe { $crate::impl_::trampoline::cfunction(slf, args, __libpy_body) }
        }
        $crate::automethod::StaticMethodDef::new(
            $crate::const_concat!($name, "\0"),
            __libpy_wrap,
            $crate::automethod::flags_of($crate::automethod::arity_of(&$func)),
            $doc,
        )
    }};
    ($name:expr, $func:path) => {
        $crate::named_automethod!(@def $name, $func, ::std::option::Option::None)
    };
    ($name:expr, $func:path, $doc:expr) => {
        $crate::named_automethod!(
            @def $name,
            $func,
            ::std::option::Option::Some($crate::const_concat!($doc, "\0"))
        )
    };
}
