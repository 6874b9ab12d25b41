//! Per-call-site caches of literal `str` and `int` objects.

use crate::err::PyResult;
use crate::pyutils::failed_null_check;
use crate::types::{PyLong, PyString};
use crate::{Object, Owned, Py, Python};
use once_cell::sync::OnceCell;

/// Interns `text` as a Python string and stores a reference to it in static storage.
///
/// A borrowed handle to the same Python string is returned on each invocation.
///
/// ```ignore
/// use libpy::intern;
///
/// Python::with_gil(|py| -> PyResult<()> {
///     let list = py.eval("[1, 2]")?;
///     //               A `str` is created once and reused
///     //               for the lifetime of the program.
///     list.call_method(intern!(py, "append"), (3,))?;
///     Ok(())
/// })
/// ```
///
/// If the string cannot be created, the handle is null and the interpreter's error is set.
#[macro_export]
macro_rules! intern {
    ($py: expr, $text: expr) => {{
        static INTERNED: $crate::intern::Interned = $crate::intern::Interned::new($text);
        INTERNED.get($py)
    }};
}

/// Like [`intern!`], for an `int` literal.
///
/// ```ignore
/// let answer = libpy::intern_int!(py, 42);
/// assert_eq!(answer.as_long_long()?, 42);
/// ```
#[macro_export]
macro_rules! intern_int {
    ($py: expr, $value: expr) => {{
        static CACHED: $crate::intern::CachedInt = $crate::intern::CachedInt::new($value);
        CACHED.get($py)
    }};
}

/// Implementation detail for `intern!` macro.
#[doc(hidden)]
pub struct Interned(&'static str, OnceCell<Py<PyString>>);

impl Interned {
    /// Creates an empty holder for an interned `str`.
    pub const fn new(value: &'static str) -> Self {
        Interned(value, OnceCell::new())
    }

    /// Gets or creates the interned `str` value.
    #[inline]
    pub fn get<'py>(&'py self, py: Python<'py>) -> Object<'py, PyString> {
        get_or_create(&self.1, py, || PyString::intern(py, self.0))
    }
}

/// Implementation detail for `intern_int!` macro.
#[doc(hidden)]
pub struct CachedInt(i64, OnceCell<Py<PyLong>>);

impl CachedInt {
    /// Creates an empty holder for an `int`.
    pub const fn new(value: i64) -> Self {
        CachedInt(value, OnceCell::new())
    }

    /// Gets or creates the `int` value.
    #[inline]
    pub fn get<'py>(&'py self, py: Python<'py>) -> Object<'py, PyLong> {
        get_or_create(&self.1, py, || PyLong::from_i64(py, self.0))
    }
}

fn get_or_create<'py, K>(
    cell: &'py OnceCell<Py<K>>,
    py: Python<'py>,
    create: impl FnOnce() -> PyResult<Owned<'py, K>>,
) -> Object<'py, K> {
    if let Some(value) = cell.get() {
        return value.bind(py);
    }
    let created = create().and_then(|value| value.unbind().ok_or_else(|| failed_null_check(py)));
    match created {
        Ok(value) => {
            // A racing thread may have filled the cell first; either object will do.
            let _ = cell.set(value);
            match cell.get() {
                Some(value) => value.bind(py),
                None => Object::null(py),
            }
        }
        Err(err) => {
            err.restore(py);
            Object::null(py)
        }
    }
}
