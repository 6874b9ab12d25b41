// Copyright (c) 2017-present PyO3 Project and Contributors

//! The [`Python`] token which proves the GIL is held.

use crate::err::{PyErr, PyResult};
use crate::gil::GILGuard;
use crate::internal_tricks::Unsendable;
use crate::type_object::PyTypeInfo;
use crate::types::PyType;
use crate::{ffi, AsPyPointer, Object, Owned, PyAny};
use std::borrow::Cow;
use std::ffi::{CStr, CString};
use std::marker::PhantomData;
use std::os::raw::c_int;

/// A marker token that represents holding the GIL.
///
/// It serves three main purposes:
/// - It provides a global API for the Python interpreter, such as [`Python::eval`].
/// - It can be passed to functions that require a proof of holding the GIL, such as
///   [`Owned::from_owned_ptr`].
/// - Its lifetime represents the scope of holding the GIL which can be used to create handles
///   that are bound to the GIL, such as [`Object<'py, K>`](Object).
///
/// The token is `!Send`: handles created under it cannot leave the thread that holds the GIL.
#[derive(Copy, Clone)]
pub struct Python<'py>(PhantomData<(&'py GILGuard, Unsendable)>);

impl Python<'_> {
    /// Acquires the global interpreter lock, allowing access to the Python interpreter. The
    /// provided closure `F` will be executed with the acquired `Python` marker token.
    ///
    /// If the `auto-initialize` feature is enabled and the Python runtime is not already
    /// initialized, this function will initialize it.
    ///
    /// # Panics
    ///
    /// - If the `auto-initialize` feature is not enabled and the Python interpreter is not
    ///   initialized.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// use libpy::prelude::*;
    ///
    /// Python::with_gil(|py| -> PyResult<()> {
    ///     let x: i32 = py.eval("5")?.extract()?;
    ///     assert_eq!(x, 5);
    ///     Ok(())
    /// })
    /// ```
    #[inline]
    pub fn with_gil<F, R>(f: F) -> R
    where
        F: for<'py> FnOnce(Python<'py>) -> R,
    {
        let guard = GILGuard::acquire();
        f(guard.python())
    }
}

impl<'py> Python<'py> {
    /// Gets the running Python interpreter version as a string.
    pub fn version(self) -> Cow<'py, str> {
        unsafe { CStr::from_ptr(ffi::Py_GetVersion()) }.to_string_lossy()
    }

    /// Imports the Python module with the specified name.
    pub fn import(self, name: &str) -> PyResult<Owned<'py, PyAny>> {
        let name = CString::new(name)?;
        unsafe { Owned::from_owned_ptr_or_err(self, ffi::PyImport_ImportModule(name.as_ptr())) }
    }

    /// Evaluates a Python expression in the namespace of `__main__` and returns the result.
    ///
    /// # Examples
    /// ```ignore
    /// # use libpy::prelude::*;
    /// # Python::with_gil(|py| {
    /// let result = py.eval("[i * 10 for i in range(5)]").unwrap();
    /// assert_eq!(result.len().unwrap(), 5);
    /// # });
    /// ```
    pub fn eval(self, code: &str) -> PyResult<Owned<'py, PyAny>> {
        self.run_code(code, ffi::Py_eval_input)
    }

    /// Executes one or more Python statements in the namespace of `__main__`.
    pub fn run(self, code: &str) -> PyResult<()> {
        self.run_code(code, ffi::Py_file_input).map(drop)
    }

    /// Runs code in the namespace of `__main__`.
    ///
    /// `start` indicates the type of input expected: one of `Py_single_input`,
    /// `Py_file_input`, or `Py_eval_input`.
    fn run_code(self, code: &str, start: c_int) -> PyResult<Owned<'py, PyAny>> {
        let code = CString::new(code)?;
        unsafe {
            let mptr = ffi::PyImport_AddModule(c"__main__".as_ptr());
            if mptr.is_null() {
                return Err(PyErr::fetch(self));
            }
            let globals = ffi::PyModule_GetDict(mptr);

            let code_obj = Owned::<PyAny>::from_owned_ptr_or_err(
                self,
                ffi::Py_CompileString(code.as_ptr(), c"<string>".as_ptr(), start),
            )?;
            let res_ptr = ffi::PyEval_EvalCode(code_obj.as_ptr(), globals, globals);
            Owned::from_owned_ptr_or_err(self, res_ptr)
        }
    }

    /// Gets the Python type object for type `T`.
    #[inline]
    pub fn get_type<T>(self) -> Object<'py, PyType<T>>
    where
        T: PyTypeInfo,
    {
        T::type_object(self)
    }

    /// Gets the Python builtin value `None`.
    #[allow(non_snake_case)] // the Python keyword starts with uppercase
    #[inline]
    pub fn None(self) -> Object<'py, PyAny> {
        unsafe { Object::from_borrowed_ptr(self, ffi::Py_None()) }
    }

    /// Gets the Python builtin value `NotImplemented`.
    #[allow(non_snake_case)] // the Python keyword starts with uppercase
    #[inline]
    pub fn NotImplemented(self) -> Object<'py, PyAny> {
        unsafe { Object::from_borrowed_ptr(self, ffi::Py_NotImplemented()) }
    }

    /// Gets the Python builtin value `Ellipsis`, or `...`.
    #[allow(non_snake_case)] // the Python keyword starts with uppercase
    #[inline]
    pub fn Ellipsis(self) -> Object<'py, PyAny> {
        unsafe { Object::from_borrowed_ptr(self, ffi::Py_Ellipsis()) }
    }

    /// Gets the Python builtin value `True`.
    #[allow(non_snake_case)] // the Python keyword starts with uppercase
    #[inline]
    pub fn True(self) -> Object<'py, PyAny> {
        unsafe { Object::from_borrowed_ptr(self, ffi::Py_True()) }
    }

    /// Gets the Python builtin value `False`.
    #[allow(non_snake_case)] // the Python keyword starts with uppercase
    #[inline]
    pub fn False(self) -> Object<'py, PyAny> {
        unsafe { Object::from_borrowed_ptr(self, ffi::Py_False()) }
    }
}

impl<'unbound> Python<'unbound> {
    /// Unsafely creates a Python token with an unbounded lifetime.
    ///
    /// Many of libpy's APIs use `Python<'py>` as proof that the calling thread holds the GIL, but
    /// this function can be used to call them unsafely.
    ///
    /// # Safety
    ///
    /// - This token and any borrowed Python references derived from it can only be safely used
    ///   whilst the currently executing thread is actually holding the GIL.
    /// - This function creates a token with an *unbounded* lifetime. Safe code can assume that
    ///   holding a `Python<'py>` token means the GIL is and stays acquired for the lifetime `'py`.
    ///   If you let it or borrowed Python references escape to safe code you are
    ///   responsible for bounding the lifetime `'unbound` appropriately.
    #[inline]
    pub unsafe fn assume_gil_acquired() -> Python<'unbound> {
        Python(PhantomData)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exceptions::{PyNameError, PySyntaxError};
    use crate::types::{AnyMethods, PyLong};
    use crate::AsPyPointer;

    #[test]
    fn test_eval() {
        Python::with_gil(|py| {
            let v: i64 = py.eval("min(1, 2)").unwrap().extract().unwrap();
            assert_eq!(v, 1);

            let err = py.eval("undefined_name").unwrap_err();
            assert!(err.is_instance_of::<PyNameError>(py));

            let err = py.eval("1 +").unwrap_err();
            assert!(err.is_instance_of::<PySyntaxError>(py));
        });
    }

    #[test]
    fn test_run_shares_main_namespace() {
        Python::with_gil(|py| {
            py.run("libpy_marker_test = 40 + 2").unwrap();
            let v: i64 = py.eval("libpy_marker_test").unwrap().extract().unwrap();
            assert_eq!(v, 42);
        });
    }

    #[test]
    fn test_import() {
        Python::with_gil(|py| {
            let sys = py.import("sys").unwrap();
            assert!(sys.hasattr("version").unwrap());
            assert!(py.import("definitely_not_a_module_name").is_err());
            assert!(py.import("nul\0byte").is_err());
        });
    }

    #[test]
    fn test_singletons() {
        Python::with_gil(|py| {
            assert_eq!(py.None().as_ptr(), unsafe { ffi::Py_None() });
            assert!(py.True().is_true().unwrap());
            assert!(!py.False().is_true().unwrap());
            assert_eq!(py.Ellipsis().to_string(), "Ellipsis");
            assert_eq!(py.NotImplemented().to_string(), "NotImplemented");
            assert!(py.None().is(py.None()));
        });
    }

    #[test]
    fn test_version_and_get_type() {
        Python::with_gil(|py| {
            assert!(py.version().starts_with('3'));
            let long_type = py.get_type::<PyLong>();
            assert!(py.eval("5").unwrap().is_instance(long_type).unwrap());
        });
    }
}
