//! The exception raised when Rust code called from Python panics.

use crate::err::{PyErr, PyErrArguments, Raise};
use crate::exceptions::{ExceptionKind, PyBaseException};
use crate::impl_::exceptions::ExceptionTypeCell;
use crate::impl_::DerefToPyAny;
use crate::type_object::PyTypeInfo;
use crate::types::PyAny;
use crate::{ffi, AsPyPointer, Object, Python};
use std::any::Any;

/// The exception raised when Rust code called from Python panics.
///
/// Like SystemExit, this exception is derived from BaseException so that
/// it will typically propagate all the way through the stack and cause the
/// Python interpreter to exit.
///
/// Fetching a `PanicException` back with [`PyErr::take`] resumes the panic on the Rust side.
pub enum PanicException {}

static TYPE_OBJECT: ExceptionTypeCell = ExceptionTypeCell::new();

unsafe impl PyTypeInfo for PanicException {
    const NAME: &'static str = "PanicException";

    fn type_object_raw(py: Python<'_>) -> *mut ffi::PyTypeObject {
        TYPE_OBJECT.get_or_create(
            py,
            "libpy_runtime.PanicException\0",
            Some("The exception raised when Rust code called from Python panics.\n\nLike SystemExit, this exception is derived from BaseException so that\nit will typically propagate all the way through the stack and cause the\nPython interpreter to exit.\0"),
            PyBaseException::type_object_raw,
        )
    }
}

unsafe impl DerefToPyAny for PanicException {}

impl ExceptionKind for PanicException {}

impl PanicException {
    /// Creates a new lazy `PanicException`.
    #[inline]
    pub fn new_err<A>(args: A) -> PyErr
    where
        A: PyErrArguments + 'static,
    {
        PyErr::new::<PanicException, A>(args)
    }

    /// Starts a message builder which raises a `PanicException` when dropped.
    #[inline]
    pub fn raise(py: Python<'_>) -> Raise<'_> {
        Raise::new(py.get_type::<PanicException>())
    }

    /// Creates a new PanicException from a panic payload.
    ///
    /// Attempts to format the error in the same way panic does.
    #[cold]
    pub(crate) fn from_panic_payload(payload: Box<dyn Any + Send + 'static>) -> PyErr {
        if let Some(string) = payload.downcast_ref::<String>() {
            Self::new_err((string.clone(),))
        } else if let Some(s) = payload.downcast_ref::<&str>() {
            Self::new_err((s.to_string(),))
        } else {
            Self::new_err(("panic from Rust code",))
        }
    }

    /// Whether `object` is an instance of exactly this class.
    ///
    /// Never creates the class: before it exists nothing can be an instance of it.
    pub(crate) fn is_exact_instance(object: Object<'_, PyAny>) -> bool {
        if object.is_null() {
            return false;
        }
        TYPE_OBJECT
            .get()
            .is_some_and(|ty| unsafe { ffi::Py_TYPE(object.as_ptr()) } == ty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exceptions::PyException;
    use crate::types::AnyMethods;
    use crate::Handle;

    #[test]
    fn derives_from_base_exception_only() {
        Python::with_gil(|py| {
            let ty = py.get_type::<PanicException>();
            assert_eq!(
                ty.as_any().repr().unwrap().to_string(),
                "<class 'libpy_runtime.PanicException'>"
            );
            assert_eq!(
                unsafe { ffi::PyType_IsSubtype(ty.as_ptr().cast(), PyBaseException::type_object_raw(py)) },
                1
            );
            assert_eq!(
                unsafe { ffi::PyType_IsSubtype(ty.as_ptr().cast(), PyException::type_object_raw(py)) },
                0
            );
        });
    }

    #[test]
    fn payload_messages() {
        Python::with_gil(|py| {
            let err = PanicException::from_panic_payload(Box::new("static message"));
            assert_eq!(err.value(py).to_string(), "static message");

            let err = PanicException::from_panic_payload(Box::new(format!("formatted {}", 1)));
            assert_eq!(err.value(py).to_string(), "formatted 1");

            let err = PanicException::from_panic_payload(Box::new(42_u8));
            assert_eq!(err.value(py).to_string(), "panic from Rust code");
        });
    }

    #[test]
    fn exact_instance_check() {
        Python::with_gil(|py| {
            let value = PanicException::new_err("boom").into_value(py);
            assert!(PanicException::is_exact_instance(value.as_object().as_any()));

            let other = crate::exceptions::PyValueError::new_err("boom").into_value(py);
            assert!(!PanicException::is_exact_instance(other.as_object().as_any()));
            assert!(!PanicException::is_exact_instance(Object::null(py)));
        });
    }
}
