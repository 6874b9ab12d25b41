//! The native entry points wrapped functions are called through.
//!
//! They exist to monomorphise `std::panic::catch_unwind` once into libpy, rather than inline
//! in every generated wrapper.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use crate::gil::GILGuard;
use crate::impl_::panic::PanicTrap;
use crate::panic::PanicException;
use crate::{ffi, PyResult, Python};

/// Entry point of a `METH_VARARGS` or `METH_NOARGS` function.
///
/// # Safety
///
/// The GIL must be held. `slf` and `args` are the pointers received from the interpreter.
#[inline]
pub unsafe fn cfunction(
    slf: *mut ffi::PyObject,
    args: *mut ffi::PyObject,
    f: for<'py> unsafe fn(Python<'py>, *mut ffi::PyObject, *mut ffi::PyObject) -> PyResult<*mut ffi::PyObject>,
) -> *mut ffi::PyObject {
    unsafe { trampoline(|py| unsafe { f(py, slf, args) }) }
}

/// Runs `body` with a token for the already held GIL.
///
/// An `Err` is restored as the interpreter's current error and a panic is converted into a
/// `PanicException`; both make the function return null.
#[inline]
pub(crate) unsafe fn trampoline<F>(body: F) -> *mut ffi::PyObject
where
    F: for<'py> FnOnce(Python<'py>) -> PyResult<*mut ffi::PyObject>,
{
    let trap = PanicTrap::new("uncaught panic at ffi boundary");

    let guard = unsafe { GILGuard::assume() };
    let py = guard.python();
    let out = panic_result_into_callback_output(
        py,
        panic::catch_unwind(AssertUnwindSafe(move || body(py))),
    );
    trap.disarm();
    out
}

fn panic_result_into_callback_output(
    py: Python<'_>,
    panic_result: Result<PyResult<*mut ffi::PyObject>, Box<dyn Any + Send + 'static>>,
) -> *mut ffi::PyObject {
    let py_err = match panic_result {
        Ok(Ok(value)) => return value,
        Ok(Err(py_err)) => py_err,
        Err(payload) => {
            let err = PanicException::from_panic_payload(payload);
            tracing::error!(error = %err, "panic in wrapped function converted to PanicException");
            err
        }
    };
    py_err.restore(py);
    std::ptr::null_mut()
}
