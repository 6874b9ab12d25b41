use crate::err::{PyErr, PyResult};
use crate::pyutils::checked_ptr;
use crate::{ffi, AsPyPointer, Handle, Owned, PyAny, Python};
use std::borrow::Cow;

/// Represents a Python `str` (a Unicode string object).
pub enum PyString {}

pyobject_native_type!(PyString, PyUnicode_Type, "str", #checkfunction=ffi::PyUnicode_Check);

impl PyString {
    /// Creates a new Python string object.
    pub fn new<'py>(py: Python<'py>, s: &str) -> PyResult<Owned<'py, PyString>> {
        let ptr = s.as_ptr().cast();
        let len = s.len() as ffi::Py_ssize_t;
        unsafe {
            Owned::<PyAny>::from_owned_ptr_or_err(py, ffi::PyUnicode_FromStringAndSize(ptr, len))
                .map(|s| s.cast_into_unchecked())
        }
    }

    /// Intern the given string
    ///
    /// This will return a reference to the same Python string object if called repeatedly with
    /// the same string.
    pub fn intern<'py>(py: Python<'py>, s: &str) -> PyResult<Owned<'py, PyString>> {
        let ptr = s.as_ptr().cast();
        let len = s.len() as ffi::Py_ssize_t;
        unsafe {
            let mut ob = ffi::PyUnicode_FromStringAndSize(ptr, len);
            if !ob.is_null() {
                ffi::PyUnicode_InternInPlace(&mut ob);
            }
            Owned::<PyAny>::from_owned_ptr_or_err(py, ob).map(|s| s.cast_into_unchecked())
        }
    }
}

/// Operations on `str` handles.
pub trait StringMethods<'py>: Handle<'py, Kind = PyString> {
    /// Gets the Python string as a Rust UTF-8 string slice.
    ///
    /// Returns a `UnicodeEncodeError` if the input is not valid unicode
    /// (containing unpaired surrogates).
    #[cfg(any(Py_3_10, not(Py_LIMITED_API)))]
    fn to_str(&self) -> PyResult<&str> {
        let slf = checked_ptr(self)?;
        let mut size: ffi::Py_ssize_t = 0;
        let data: *const u8 = unsafe { ffi::PyUnicode_AsUTF8AndSize(slf, &mut size).cast() };
        if data.is_null() {
            Err(PyErr::fetch(self.py()))
        } else {
            // the UTF-8 buffer is cached on the string object, which `self` keeps alive
            Ok(unsafe {
                std::str::from_utf8_unchecked(std::slice::from_raw_parts(data, size as usize))
            })
        }
    }

    /// Converts the `PyString` into a Rust string, avoiding copying when possible.
    ///
    /// Returns a `UnicodeEncodeError` if the input is not valid unicode
    /// (containing unpaired surrogates).
    fn to_cow(&self) -> PyResult<Cow<'_, str>> {
        #[cfg(any(Py_3_10, not(Py_LIMITED_API)))]
        {
            self.to_str().map(Cow::Borrowed)
        }

        #[cfg(not(any(Py_3_10, not(Py_LIMITED_API))))]
        {
            let slf = checked_ptr(self)?;
            let bytes = unsafe {
                Owned::<PyAny>::from_owned_ptr_or_err(self.py(), ffi::PyUnicode_AsUTF8String(slf))?
            };
            Ok(Cow::Owned(
                unsafe { std::str::from_utf8_unchecked(bytes_data(&bytes)) }.to_owned(),
            ))
        }
    }

    /// Converts the `PyString` into a Rust string.
    ///
    /// Unpaired surrogates and invalid UTF-8 sequences are
    /// replaced with `U+FFFD REPLACEMENT CHARACTER`. A null handle reads as `<NULL>`.
    fn to_string_lossy(&self) -> Cow<'_, str> {
        let py = self.py();
        if self.as_ptr().is_null() {
            return Cow::Borrowed("<NULL>");
        }

        #[cfg(any(Py_3_10, not(Py_LIMITED_API)))]
        match self.to_str() {
            Ok(s) => return Cow::Borrowed(s),
            Err(_surrogates) => {}
        }

        let bytes = unsafe {
            Owned::<PyAny>::from_owned_ptr_or_err(
                py,
                ffi::PyUnicode_AsEncodedString(
                    self.as_ptr(),
                    c"utf-8".as_ptr(),
                    c"surrogatepass".as_ptr(),
                ),
            )
        };
        match bytes {
            Ok(bytes) => Cow::Owned(String::from_utf8_lossy(bytes_data(&bytes)).into_owned()),
            Err(_) => Cow::Borrowed("<unencodable str>"),
        }
    }
}

impl<'py, H> StringMethods<'py> for H where H: Handle<'py, Kind = PyString> + ?Sized {}

/// The contents of a `bytes` object. `bytes` must be a non-null `bytes` instance.
fn bytes_data<'a>(bytes: &'a Owned<'_, crate::PyAny>) -> &'a [u8] {
    unsafe {
        let buffer = ffi::PyBytes_AsString(bytes.as_ptr()).cast::<u8>();
        let length = ffi::PyBytes_Size(bytes.as_ptr()) as usize;
        std::slice::from_raw_parts(buffer, length)
    }
}
