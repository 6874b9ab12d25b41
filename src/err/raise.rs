//! Setting the interpreter's current error directly: the message builder and the errno raisers.

use super::PyErr;
use crate::conversion::IntoObject;
use crate::type_object::PyTypeInfo;
use crate::types::{PyAny, PyType};
use crate::{ffi, AsPyPointer, Handle, Object, Owned, Python};
use std::ffi::CString;
use std::fmt::{self, Write};
use std::ops::Shl;

/// Builds an exception message piece by piece and raises it when dropped.
///
/// Usually obtained from an exception type's `raise` function. Every `<<` appends the
/// `Display` form of its right-hand side to the message; when the builder goes out of scope the
/// interpreter's current error is set to an instance of the exception type carrying the message.
///
/// ```ignore
/// use libpy::exceptions::PyValueError;
///
/// let _ = PyValueError::raise(py) << "expected at most " << 3 << " items";
/// assert_eq!(PyErr::fetch(py).to_string(), "ValueError: expected at most 3 items");
/// ```
///
/// A builder turned into a [`PyErr`] with [`into_err`](Raise::into_err), or dropped after
/// [`disarm`](Raise::disarm), raises nothing.
pub struct Raise<'py> {
    ptype: Owned<'py, PyType>,
    message: String,
    armed: bool,
}

impl<'py> Raise<'py> {
    /// Starts a message for the exception type `ty`.
    ///
    /// A null `ty` raises the null-check error on drop instead.
    pub fn new<I>(ty: Object<'py, PyType<I>>) -> Self {
        let ty = unsafe { ty.cast_unchecked::<PyType>() };
        Raise {
            ptype: Owned::retain(&ty),
            message: String::new(),
            armed: true,
        }
    }

    /// The message collected so far.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Stops the builder from raising when dropped.
    #[inline]
    pub fn disarm(mut self) {
        self.armed = false;
    }

    /// Converts the builder into an error value instead of setting the interpreter's error.
    pub fn into_err(mut self) -> PyErr {
        self.armed = false;
        let message = std::mem::take(&mut self.message);
        PyErr::from_type(self.ptype.as_object(), message)
    }
}

impl<T: fmt::Display> Shl<T> for Raise<'_> {
    type Output = Self;

    fn shl(mut self, rhs: T) -> Self {
        // Writing into a `String` cannot fail.
        let _ = write!(self.message, "{}", rhs);
        self
    }
}

impl Write for Raise<'_> {
    #[inline]
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.message.push_str(s);
        Ok(())
    }
}

impl Drop for Raise<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let py = self.ptype.py();
        let message = std::mem::take(&mut self.message);
        tracing::trace!(%message, "raising from message builder");
        PyErr::from_type(self.ptype.as_object(), message).restore(py);
    }
}

impl fmt::Debug for Raise<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Raise")
            .field("type", &self.ptype)
            .field("message", &self.message)
            .field("armed", &self.armed)
            .finish()
    }
}

/// Sets the interpreter's current error to an already constructed exception.
///
/// `value` may be an exception instance or an exception class. Anything else raises
/// `TypeError: exceptions must derive from BaseException`.
pub fn raise_value<'py, V>(py: Python<'py>, value: V)
where
    V: IntoObject<'py>,
{
    match value.into_object(py) {
        Ok(value) => PyErr::from_value(value).restore(py),
        Err(err) => err.restore(py),
    }
}

/// Raises the exception type `T` for the current value of the C `errno`.
///
/// `T` is normally `OSError`; like Python's own `OSError(errno, strerror)`, an errno with a
/// dedicated subclass (`ENOENT`, `EACCES`, ...) produces that subclass.
pub fn set_from_errno<T: PyTypeInfo>(py: Python<'_>) {
    unsafe { ffi::PyErr_SetFromErrno(T::type_object_raw(py).cast()) };
}

/// Like [`set_from_errno`], additionally recording `filename` on the exception.
///
/// A `filename` with an interior nul byte raises `ValueError` instead.
pub fn set_from_errno_with_filename<T: PyTypeInfo>(py: Python<'_>, filename: &str) {
    match CString::new(filename) {
        Ok(filename) => unsafe {
            ffi::PyErr_SetFromErrnoWithFilename(T::type_object_raw(py).cast(), filename.as_ptr());
        },
        Err(err) => PyErr::from(err).restore(py),
    }
}

/// Like [`set_from_errno`], additionally recording the object `filename` on the exception.
///
/// A null `filename` records nothing, as in [`set_from_errno`].
pub fn set_from_errno_with_filename_object<T: PyTypeInfo>(
    py: Python<'_>,
    filename: Object<'_, PyAny>,
) {
    unsafe {
        ffi::PyErr_SetFromErrnoWithFilenameObject(T::type_object_raw(py).cast(), filename.as_ptr())
    };
}

/// Raises `MemoryError`.
pub fn no_memory(_py: Python<'_>) {
    unsafe { ffi::PyErr_NoMemory() };
}

impl PyErr {
    /// Creates an error of type `T` for the current value of the C `errno`.
    ///
    /// This is [`set_from_errno`] followed by [`PyErr::fetch`].
    pub fn from_errno<T: PyTypeInfo>(py: Python<'_>) -> PyErr {
        set_from_errno::<T>(py);
        PyErr::fetch(py)
    }

    /// Creates an `OSError` (or the matching subclass) for the last operating system error.
    pub fn last_os_error(py: Python<'_>) -> PyErr {
        PyErr::from_errno::<crate::exceptions::PyOSError>(py)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exceptions::{
        PyAssertionError, PyFileNotFoundError, PyIndexError, PyOSError, PyTypeError, PyValueError,
    };
    use crate::types::{AnyMethods, PyString, StringMethods};

    #[test]
    fn builder_concatenates_on_drop() {
        Python::with_gil(|py| {
            let _ = PyTypeError::raise(py) << "x" << 1;
            let err = PyErr::fetch(py);
            assert!(err.is_instance_of::<PyTypeError>(py));
            assert_eq!(err.value(py).to_string(), "x1");
        });
    }

    #[test]
    fn builder_accepts_write_macro() {
        Python::with_gil(|py| {
            let mut builder = PyValueError::raise(py) << "expected ";
            write!(builder, "{} items, got {:.1}", 3, 2.5).unwrap();
            assert_eq!(builder.message(), "expected 3 items, got 2.5");
            drop(builder);
            assert_eq!(
                PyErr::fetch(py).to_string(),
                "ValueError: expected 3 items, got 2.5"
            );
        });
    }

    #[test]
    fn disarmed_builder_raises_nothing() {
        Python::with_gil(|py| {
            (PyTypeError::raise(py) << "never").disarm();
            assert!(!PyErr::occurred(py));

            let err = (PyIndexError::raise(py) << "index " << 7).into_err();
            assert!(!PyErr::occurred(py));
            assert!(err.is_instance_of::<PyIndexError>(py));
            assert_eq!(err.to_string(), "IndexError: index 7");
        });
    }

    #[test]
    fn builder_with_null_type_raises_null_check() {
        Python::with_gil(|py| {
            drop(Raise::new(Object::<PyType>::null(py)) << "lost");
            let err = PyErr::fetch(py);
            assert!(err.is_instance_of::<PyAssertionError>(py));
        });
    }

    #[test]
    fn raise_value_installs_instance() {
        Python::with_gil(|py| {
            let value = PyValueError::new_err("prebuilt").into_value(py);
            let ptr = value.as_ptr();
            raise_value(py, value);
            let err = PyErr::fetch(py);
            assert_eq!(err.value(py).as_ptr(), ptr);

            raise_value(py, "not an exception");
            let err = PyErr::fetch(py);
            assert!(err.is_instance_of::<PyTypeError>(py));
        });
    }

    #[cfg(unix)]
    #[test]
    fn errno_raisers() {
        Python::with_gil(|py| {
            assert_eq!(unsafe { libc::close(-1) }, -1);
            set_from_errno::<PyOSError>(py);
            let err = PyErr::fetch(py);
            let value = err.value(py);
            assert_eq!(
                value.getattr("errno").unwrap().extract::<i32>().unwrap(),
                libc::EBADF
            );

            assert_eq!(unsafe { libc::close(-1) }, -1);
            set_from_errno_with_filename::<PyOSError>(py, "spam.txt");
            let value = PyErr::fetch(py).value(py);
            assert_eq!(
                value.getattr("errno").unwrap().extract::<i32>().unwrap(),
                libc::EBADF
            );
            assert_eq!(
                value
                    .getattr("filename")
                    .unwrap()
                    .str()
                    .unwrap()
                    .to_string_lossy(),
                "spam.txt"
            );

            assert_eq!(
                value.getattr("strerror").unwrap().str().unwrap().to_string_lossy(),
                "Bad file descriptor"
            );

            let fd = unsafe { libc::open(c"/nonexistent/libpy-errno-test".as_ptr(), libc::O_RDONLY) };
            assert_eq!(fd, -1);
            let err = PyErr::from_errno::<PyOSError>(py);
            assert!(err.is_instance_of::<PyFileNotFoundError>(py));

            no_memory(py);
            assert!(PyErr::fetch(py).is_instance_of::<crate::exceptions::PyMemoryError>(py));
        });
    }

    #[test]
    fn errno_with_nul_in_filename() {
        Python::with_gil(|py| {
            set_from_errno_with_filename::<PyOSError>(py, "spam\0eggs");
            let err = PyErr::fetch(py);
            assert!(err.is_instance_of::<PyValueError>(py));
        });
    }

    #[cfg(unix)]
    #[test]
    fn errno_with_filename_object() {
        Python::with_gil(|py| {
            let name = PyString::new(py, "eggs.txt").unwrap();
            assert_eq!(unsafe { libc::close(-1) }, -1);
            set_from_errno_with_filename_object::<PyOSError>(py, name.as_object().as_any());
            let value = PyErr::fetch(py).value(py);
            assert_eq!(
                value.getattr("filename").unwrap().as_ptr(),
                name.as_ptr()
            );
        });
    }
}
