use crate::exceptions::{
    PyBlockingIOError, PyBrokenPipeError, PyConnectionAbortedError, PyConnectionRefusedError,
    PyConnectionResetError, PyFileExistsError, PyFileNotFoundError, PyInterruptedError,
    PyMemoryError, PyOSError, PyPermissionError, PySystemError, PyTimeoutError,
};
use crate::type_object::PyTypeInfo;
use crate::{exceptions, PyErr, Python};
use std::io;

type NewErr = fn(String) -> PyErr;

/// `io::ErrorKind`s with a dedicated Python exception class, most specific first.
const IO_KINDS: [(io::ErrorKind, fn(&PyErr, Python<'_>) -> bool, NewErr); 11] = [
    (io::ErrorKind::BrokenPipe, matches::<PyBrokenPipeError>, PyBrokenPipeError::new_err),
    (io::ErrorKind::ConnectionRefused, matches::<PyConnectionRefusedError>, PyConnectionRefusedError::new_err),
    (io::ErrorKind::ConnectionAborted, matches::<PyConnectionAbortedError>, PyConnectionAbortedError::new_err),
    (io::ErrorKind::ConnectionReset, matches::<PyConnectionResetError>, PyConnectionResetError::new_err),
    (io::ErrorKind::Interrupted, matches::<PyInterruptedError>, PyInterruptedError::new_err),
    (io::ErrorKind::NotFound, matches::<PyFileNotFoundError>, PyFileNotFoundError::new_err),
    (io::ErrorKind::PermissionDenied, matches::<PyPermissionError>, PyPermissionError::new_err),
    (io::ErrorKind::AlreadyExists, matches::<PyFileExistsError>, PyFileExistsError::new_err),
    (io::ErrorKind::WouldBlock, matches::<PyBlockingIOError>, PyBlockingIOError::new_err),
    (io::ErrorKind::TimedOut, matches::<PyTimeoutError>, PyTimeoutError::new_err),
    (io::ErrorKind::OutOfMemory, matches::<PyMemoryError>, PyMemoryError::new_err),
];

fn matches<T: PyTypeInfo>(err: &PyErr, py: Python<'_>) -> bool {
    err.is_instance_of::<T>(py)
}

/// Wraps the exception in an `io::Error` whose kind follows the exception class.
impl From<PyErr> for io::Error {
    fn from(err: PyErr) -> Self {
        let kind = Python::with_gil(|py| {
            IO_KINDS
                .iter()
                .find(|(_, is_instance, _)| is_instance(&err, py))
                .map_or(io::ErrorKind::Other, |(kind, _, _)| *kind)
        });
        io::Error::new(kind, err)
    }
}

/// Unwraps an `io::Error` created from a `PyErr`; otherwise builds the `OSError` subclass
/// matching the OS error code or the error kind.
impl From<io::Error> for PyErr {
    fn from(err: io::Error) -> PyErr {
        if err.get_ref().is_some_and(|inner| inner.is::<PyErr>()) {
            return match err.into_inner().map(|inner| inner.downcast::<PyErr>()) {
                Some(Ok(py_err)) => *py_err,
                _ => PySystemError::new_err("lost the wrapped Python exception"),
            };
        }

        // `OSError(errno, strerror)` picks the subclass for the errno itself, and keeps the
        // errno on the instance.
        if let Some(errno) = err.raw_os_error() {
            let message = io::Error::from_raw_os_error(errno).to_string();
            return PyOSError::new_err((errno, message));
        }

        let new_err = IO_KINDS
            .iter()
            .find(|(kind, _, _)| *kind == err.kind())
            .map_or(PyOSError::new_err as NewErr, |(_, _, new_err)| *new_err);
        new_err(err.to_string())
    }
}

impl<W> From<io::IntoInnerError<W>> for PyErr {
    fn from(err: io::IntoInnerError<W>) -> PyErr {
        err.into_error().into()
    }
}

impl From<std::convert::Infallible> for PyErr {
    fn from(err: std::convert::Infallible) -> PyErr {
        match err {}
    }
}

macro_rules! impl_to_pyerr {
    ($err: ty, $pyexc: ty) => {
        impl std::convert::From<$err> for PyErr {
            fn from(err: $err) -> PyErr {
                <$pyexc>::new_err(err.to_string())
            }
        }
    };
}

impl_to_pyerr!(std::array::TryFromSliceError, exceptions::PyValueError);
impl_to_pyerr!(std::num::ParseIntError, exceptions::PyValueError);
impl_to_pyerr!(std::num::ParseFloatError, exceptions::PyValueError);
impl_to_pyerr!(std::num::TryFromIntError, exceptions::PyOverflowError);
impl_to_pyerr!(std::str::ParseBoolError, exceptions::PyValueError);
impl_to_pyerr!(std::ffi::IntoStringError, exceptions::PyValueError);
impl_to_pyerr!(std::ffi::NulError, exceptions::PyValueError);
impl_to_pyerr!(std::str::Utf8Error, exceptions::PyValueError);
impl_to_pyerr!(std::string::FromUtf8Error, exceptions::PyValueError);
impl_to_pyerr!(std::char::DecodeUtf16Error, exceptions::PyValueError);
impl_to_pyerr!(std::net::AddrParseError, exceptions::PyValueError);
impl_to_pyerr!(crate::NullViewError, exceptions::PyAssertionError);
