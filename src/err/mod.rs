// Copyright (c) 2017-present PyO3 Project and Contributors

//! Raised Python exceptions on the Rust side, and the bridge to the interpreter's
//! "current error" slot.
//!
//! A failing operation hands its exception back as the `Err` of a [`PyResult`]. The slot
//! itself is still reachable: [`PyErr::take`] and [`PyErr::restore`] move an exception out of
//! and into it, [`occurred`] peeks at it, [`clear`] drops whatever it holds, and the
//! [`Raise`] builder sets it directly.

use crate::conversion::IntoObject;
use crate::exceptions::{PyBaseException, PySystemError, PyTypeError};
use crate::panic::PanicException;
use crate::pyutils::failed_null_check;
use crate::type_object::PyTypeInfo;
use crate::types::{AnyMethods, PyAny, PyType, StringMethods, TypeMethods};
use crate::{ffi, AsPyPointer, Handle, Object, Owned, Py, Python};
use std::cell::UnsafeCell;
use std::fmt;
use std::os::raw::c_int;

mod impls;
mod raise;

pub use raise::{
    no_memory, raise_value, set_from_errno, set_from_errno_with_filename,
    set_from_errno_with_filename_object, Raise,
};

/// Represents a Python exception.
///
/// An error created on the Rust side (for example with
/// [`PyTypeError::new_err`](crate::exceptions::PyTypeError::new_err)) stays lazy: the
/// exception instance is only built when something looks at it, or when it is restored into
/// the interpreter.
pub struct PyErr {
    // Safety: can only hand out references when in the "normalized" state. Will never change
    // after normalization.
    //
    // The state is temporarily removed from the PyErr during normalization, to avoid
    // concurrent modifications.
    state: UnsafeCell<Option<PyErrState>>,
}

// The state is only read or written with the GIL held; the lazy arguments are `Send + Sync`
// and a `Py` defers its release when dropped without the GIL.
unsafe impl Send for PyErr {}
unsafe impl Sync for PyErr {}

/// Represents the result of a Python call.
pub type PyResult<T> = Result<T, PyErr>;

enum PyErrState {
    Lazy {
        ptype: LazyType,
        args: Box<dyn PyErrArguments>,
    },
    Normalized(Py<PyBaseException>),
}

enum LazyType {
    Static(fn(Python<'_>) -> *mut ffi::PyTypeObject),
    Object(Py<PyAny>),
}

impl LazyType {
    fn as_ptr(&self, py: Python<'_>) -> *mut ffi::PyObject {
        match self {
            LazyType::Static(type_object) => type_object(py).cast(),
            LazyType::Object(ptype) => ptype.as_ptr(),
        }
    }
}

/// Helper conversion trait that allows to use custom arguments for lazy exception construction.
///
/// Implemented for every value which converts with [`IntoObject`] independently of the GIL
/// lifetime, such as string slices, `String`s, integers and tuples of them. A tuple is
/// unpacked into the positional arguments of the exception constructor.
pub trait PyErrArguments: Send + Sync {
    /// Arguments for exception
    fn arguments<'py>(self: Box<Self>, py: Python<'py>) -> PyResult<Owned<'py, PyAny>>;
}

impl<T> PyErrArguments for T
where
    T: for<'py> IntoObject<'py> + Send + Sync + 'static,
{
    fn arguments<'py>(self: Box<Self>, py: Python<'py>) -> PyResult<Owned<'py, PyAny>> {
        (*self).into_object(py)
    }
}

impl PyErr {
    /// Creates a new PyErr of type `T`.
    ///
    /// `args` can be:
    /// * a tuple: the exception instance will be created using Python `T(*tuple)`
    /// * any other value: the exception instance will be created using Python `T(value)`
    ///
    /// If `T` turns out not to be an exception class, the error becomes a `TypeError` once it
    /// is normalized.
    ///
    /// In most cases, you can use a concrete exception's constructor instead, which is equivalent:
    /// ```ignore
    /// return Err(exceptions::PyTypeError::new_err("Error message"));
    /// ```
    pub fn new<T, A>(args: A) -> PyErr
    where
        T: PyTypeInfo,
        A: PyErrArguments + 'static,
    {
        PyErr::from_state(PyErrState::Lazy {
            ptype: LazyType::Static(T::type_object_raw),
            args: Box::new(args),
        })
    }

    /// Constructs a new error of the exception type `ty`, instantiated lazily with `args`.
    ///
    /// A null `ty` gives the null-check error instead.
    pub fn from_type<I, A>(ty: Object<'_, PyType<I>>, args: A) -> PyErr
    where
        A: PyErrArguments + 'static,
    {
        let py = ty.py();
        match Owned::retain(&ty.as_any()).unbind() {
            Some(ptype) => PyErr::from_state(PyErrState::Lazy {
                ptype: LazyType::Object(ptype),
                args: Box::new(args),
            }),
            None => failed_null_check(py),
        }
    }

    /// Creates a new PyErr from an object.
    ///
    /// If `obj` is an exception instance, the PyErr will use that instance. If `obj` is an
    /// exception type object, the PyErr will (lazily) create a new instance of that type.
    /// Otherwise, a `TypeError` is created instead.
    pub fn from_value(obj: Owned<'_, PyAny>) -> PyErr {
        let py = obj.py();
        let ptr = obj.as_ptr();
        if ptr.is_null() {
            return failed_null_check(py);
        }

        if unsafe { ffi::PyExceptionInstance_Check(ptr) } != 0 {
            let value = unsafe { obj.cast_into_unchecked::<PyBaseException>() };
            match value.unbind() {
                Some(pvalue) => PyErr::from_state(PyErrState::Normalized(pvalue)),
                None => failed_null_check(py),
            }
        } else if unsafe { ffi::PyExceptionClass_Check(ptr) } != 0 {
            match obj.unbind() {
                Some(ptype) => PyErr::from_state(PyErrState::Lazy {
                    ptype: LazyType::Object(ptype),
                    args: Box::new(()),
                }),
                None => failed_null_check(py),
            }
        } else {
            exceptions_must_derive_from_base_exception()
        }
    }

    /// Returns the type of this exception.
    ///
    /// The object will be normalized first if needed.
    pub fn get_type<'py>(&self, py: Python<'py>) -> Owned<'py, PyType> {
        let ptype = unsafe { ffi::Py_TYPE(self.normalized(py).as_ptr()) };
        Owned::retain(&unsafe { Object::<PyType>::from_borrowed_ptr(py, ptype.cast()) })
    }

    /// Returns the exception instance.
    ///
    /// The object will be normalized first if needed.
    ///
    /// ```ignore
    /// Python::with_gil(|py| {
    ///     let err = PyTypeError::new_err("some type error");
    ///     assert_eq!(err.value(py).to_string(), "some type error");
    /// });
    /// ```
    pub fn value<'py>(&self, py: Python<'py>) -> Owned<'py, PyBaseException> {
        self.normalized(py).bind_owned(py)
    }

    /// Consumes self to take ownership of the exception instance.
    pub fn into_value(self, py: Python<'_>) -> Owned<'_, PyBaseException> {
        self.normalized(py);
        match self.state.into_inner() {
            Some(PyErrState::Normalized(pvalue)) => pvalue.into_bound(py),
            _ => unreachable!("normalized error lost its value"),
        }
    }

    /// Returns the traceback of this exception, if it has one.
    pub fn traceback<'py>(&self, py: Python<'py>) -> Option<Owned<'py, PyAny>> {
        let tb = unsafe { ffi::PyException_GetTraceback(self.normalized(py).as_ptr()) };
        let tb = unsafe { Owned::from_owned_ptr(py, tb) };
        (!tb.is_null()).then_some(tb)
    }

    /// Returns the cause (either an exception instance, or None, set by `raise ... from ...`)
    /// associated with the exception, as accessible from Python through `__cause__`.
    pub fn cause(&self, py: Python<'_>) -> Option<PyErr> {
        let cause = unsafe { ffi::PyException_GetCause(self.normalized(py).as_ptr()) };
        let cause = unsafe { Owned::<PyAny>::from_owned_ptr(py, cause) };
        (!cause.is_null()).then(|| PyErr::from_value(cause))
    }

    /// Sets the cause associated with the exception, pass `None` to clear it.
    pub fn set_cause(&self, py: Python<'_>, cause: Option<PyErr>) {
        let value = self.normalized(py);
        let cause = cause.map_or(std::ptr::null_mut(), |cause| cause.into_value(py).into_ptr());
        // PyException_SetCause steals the reference to the cause.
        unsafe { ffi::PyException_SetCause(value.as_ptr(), cause) }
    }

    /// Gets whether an error is present in the Python interpreter's global state.
    #[inline]
    pub fn occurred(_: Python<'_>) -> bool {
        unsafe { !ffi::PyErr_Occurred().is_null() }
    }

    /// Takes the current error from the Python interpreter's global state and clears the global
    /// state. If no error is set, returns `None`.
    ///
    /// If the error is a `PanicException` (which would have originated from a panic in a
    /// wrapped callback) then this function will resume the panic.
    ///
    /// Use this function when it is not known if an error should be present. If the error is
    /// expected to have been set, for example by an error return value from a C FFI function,
    /// use [`PyErr::fetch`].
    pub fn take(py: Python<'_>) -> Option<PyErr> {
        let pvalue = raised_value(py)?;

        if PanicException::is_exact_instance(pvalue.as_object().as_any()) {
            let msg = pvalue
                .str()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|_| String::from("Unwrapped panic from Python code"));

            eprintln!("--- libpy is resuming a panic after fetching a PanicException from Python. ---");
            eprintln!("Python stack trace below:");

            PyErr::from_value(pvalue.into_any()).restore(py);
            unsafe { ffi::PyErr_PrintEx(0) };

            std::panic::resume_unwind(Box::new(msg))
        }

        Some(PyErr::from_value(pvalue.into_any()))
    }

    /// Equivalent to [`PyErr::take`], but when no error is set returns a `SystemError`.
    ///
    /// This behavior is consistent with Python's internal handling of what happens when a C
    /// return value indicates an error occurred but the global error state is empty.
    #[inline]
    pub fn fetch(py: Python<'_>) -> PyErr {
        match PyErr::take(py) {
            Some(err) => err,
            None => PySystemError::new_err("error return without exception set"),
        }
    }

    /// Writes the error back to the Python interpreter's global state.
    /// This is the opposite of [`PyErr::fetch`].
    pub fn restore(self, py: Python<'_>) {
        match self.state.into_inner() {
            Some(PyErrState::Lazy { ptype, args }) => raise_lazy(py, ptype, args),
            Some(PyErrState::Normalized(pvalue)) => restore_normalized(pvalue.into_bound(py)),
            None => {}
        }
    }

    /// Returns true if this exception is an instance of `T` or a subclass of it.
    pub fn is_instance_of<T>(&self, py: Python<'_>) -> bool
    where
        T: PyTypeInfo,
    {
        self.matches(py, T::type_object(py))
    }

    /// Returns true if the exception matches `exc`.
    ///
    /// If `exc` is a class object, this also returns `true` when `self` is an instance of a
    /// subclass. If `exc` is a tuple, all exceptions in the tuple (and recursively in
    /// subtuples) are searched for a match.
    pub fn matches<E: AsPyPointer>(&self, py: Python<'_>, exc: E) -> bool {
        if exc.as_ptr().is_null() {
            return false;
        }
        let ptype = unsafe { ffi::Py_TYPE(self.normalized(py).as_ptr()) };
        unsafe { ffi::PyErr_GivenExceptionMatches(ptype.cast(), exc.as_ptr()) != 0 }
    }

    /// Prints a standard traceback to `sys.stderr`.
    pub fn print(&self, py: Python<'_>) {
        self.clone_ref(py).restore(py);
        unsafe { ffi::PyErr_PrintEx(0) }
    }

    /// Reports the error as unraisable, for use where it cannot be propagated (for example
    /// inside a destructor). `obj` gives the context the report names.
    pub fn write_unraisable(self, py: Python<'_>, obj: Option<Object<'_, PyAny>>) {
        self.restore(py);
        unsafe { ffi::PyErr_WriteUnraisable(obj.as_ptr()) }
    }

    /// Clones the PyErr. This requires the GIL, which is why PyErr does not implement Clone.
    pub fn clone_ref(&self, py: Python<'_>) -> PyErr {
        PyErr::from_state(PyErrState::Normalized(self.normalized(py).clone_ref(py)))
    }

    fn from_state(state: PyErrState) -> PyErr {
        PyErr {
            state: UnsafeCell::new(Some(state)),
        }
    }

    fn normalized(&self, py: Python<'_>) -> &Py<PyBaseException> {
        if let Some(PyErrState::Normalized(pvalue)) = unsafe { &*self.state.get() } {
            return pvalue;
        }
        self.make_normalized(py)
    }

    #[cold]
    fn make_normalized(&self, py: Python<'_>) -> &Py<PyBaseException> {
        // This process is safe because:
        // - Access is guaranteed not to be concurrent thanks to `Python` GIL token
        // - Write happens only once, and then never will change again.
        // - State is set to None during the normalization process, so that a second
        //   concurrent normalization attempt will panic before changing anything.
        let state = unsafe { (*self.state.get()).take() };
        let pvalue = match state {
            Some(PyErrState::Lazy { ptype, args }) => {
                raise_lazy(py, ptype, args);
                match raised_value(py).and_then(Owned::unbind) {
                    Some(pvalue) => pvalue,
                    None => panic!("exception missing after normalization"),
                }
            }
            Some(PyErrState::Normalized(pvalue)) => pvalue,
            None => panic!("Cannot normalize a PyErr while already normalizing it."),
        };

        let slot = unsafe { &mut *self.state.get() };
        match slot.insert(PyErrState::Normalized(pvalue)) {
            PyErrState::Normalized(pvalue) => pvalue,
            PyErrState::Lazy { .. } => unreachable!(),
        }
    }
}

/// Sets the interpreter's error from a lazy type and arguments.
fn raise_lazy(py: Python<'_>, ptype: LazyType, args: Box<dyn PyErrArguments>) {
    let ptype = ptype.as_ptr(py);
    if unsafe { ffi::PyExceptionClass_Check(ptype) } == 0 {
        return exceptions_must_derive_from_base_exception().restore(py);
    }
    match args.arguments(py) {
        Ok(value) => unsafe { ffi::PyErr_SetObject(ptype, value.as_ptr()) },
        // building the arguments raised in turn; that error replaces this one
        Err(err) => err.restore(py),
    }
}

#[cfg(Py_3_12)]
fn restore_normalized(pvalue: Owned<'_, PyBaseException>) {
    unsafe { ffi::PyErr_SetRaisedException(pvalue.into_ptr()) }
}

#[cfg(not(Py_3_12))]
fn restore_normalized(pvalue: Owned<'_, PyBaseException>) {
    unsafe {
        let ptype = ffi::Py_TYPE(pvalue.as_ptr()).cast::<ffi::PyObject>();
        ffi::Py_INCREF(ptype);
        let ptraceback = ffi::PyException_GetTraceback(pvalue.as_ptr());
        ffi::PyErr_Restore(ptype, pvalue.into_ptr(), ptraceback);
    }
}

/// Takes the exception instance out of the interpreter's error slot.
#[cfg(Py_3_12)]
fn raised_value(py: Python<'_>) -> Option<Owned<'_, PyBaseException>> {
    let pvalue = unsafe { Owned::from_owned_ptr(py, ffi::PyErr_GetRaisedException()) };
    (!pvalue.is_null()).then_some(pvalue)
}

/// Takes the exception instance out of the interpreter's error slot.
#[cfg(not(Py_3_12))]
fn raised_value(py: Python<'_>) -> Option<Owned<'_, PyBaseException>> {
    let mut ptype = std::ptr::null_mut();
    let mut pvalue = std::ptr::null_mut();
    let mut ptraceback = std::ptr::null_mut();
    unsafe {
        ffi::PyErr_Fetch(&mut ptype, &mut pvalue, &mut ptraceback);
        if ptype.is_null() {
            return None;
        }
        ffi::PyErr_NormalizeException(&mut ptype, &mut pvalue, &mut ptraceback);

        // Convert immediately so that the references are released on every path.
        let _ptype = Owned::<PyAny>::from_owned_ptr(py, ptype);
        let ptraceback = Owned::<PyAny>::from_owned_ptr(py, ptraceback);
        let pvalue = Owned::<PyBaseException>::from_owned_ptr(py, pvalue);
        if !ptraceback.is_null() && !pvalue.is_null() {
            ffi::PyException_SetTraceback(pvalue.as_ptr(), ptraceback.as_ptr());
        }
        (!pvalue.is_null()).then_some(pvalue)
    }
}

#[inline]
fn exceptions_must_derive_from_base_exception() -> PyErr {
    PyTypeError::new_err("exceptions must derive from BaseException")
}

impl fmt::Debug for PyErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Python::with_gil(|py| {
            f.debug_struct("PyErr")
                .field("type", &self.get_type(py))
                .field("value", &self.value(py))
                .field("traceback", &self.traceback(py))
                .finish()
        })
    }
}

impl fmt::Display for PyErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Python::with_gil(|py| {
            let value = self.value(py);
            let type_name = self.get_type(py).qualname().map_err(|_| fmt::Error)?;
            write!(f, "{}", type_name.to_string_lossy())?;
            match value.str() {
                Ok(s) => write!(f, ": {}", s.to_string_lossy()),
                Err(_) => f.write_str(": <exception str() failed>"),
            }
        })
    }
}

impl std::error::Error for PyErr {}

impl<'py> IntoObject<'py> for PyErr {
    fn into_object(self, py: Python<'py>) -> PyResult<Owned<'py, PyAny>> {
        Ok(self.into_value(py).into_any())
    }
}

impl<'py> IntoObject<'py> for &PyErr {
    fn into_object(self, py: Python<'py>) -> PyResult<Owned<'py, PyAny>> {
        Ok(self.value(py).into_any())
    }
}

/// Gets the type of the error currently set in the interpreter, without clearing it.
#[inline]
pub fn occurred(py: Python<'_>) -> Option<Object<'_, PyType<PyBaseException>>> {
    let ptype = unsafe { Object::from_borrowed_ptr(py, ffi::PyErr_Occurred()) };
    (!ptype.is_null()).then_some(ptype)
}

/// Clears the interpreter's current error, if any.
#[inline]
pub fn clear(_py: Python<'_>) {
    unsafe { ffi::PyErr_Clear() }
}

/// Returns Ok if the error code is not -1.
#[inline]
pub fn error_on_minusone(py: Python<'_>, result: c_int) -> PyResult<()> {
    if result != -1 {
        Ok(())
    } else {
        Err(PyErr::fetch(py))
    }
}

#[cfg(test)]
mod tests {
    use super::{PyErr, PyErrState};
    use crate::exceptions::{self, PyBaseException};
    use crate::types::{AnyMethods, PyString};
    use crate::{err, AsPyPointer, Handle, Python};
    use static_assertions::assert_impl_all;

    assert_impl_all!(PyErr: Send, Sync, std::error::Error);

    #[test]
    fn no_error() {
        assert!(Python::with_gil(PyErr::take).is_none());
    }

    #[test]
    fn set_valueerror() {
        Python::with_gil(|py| {
            let err: PyErr = exceptions::PyValueError::new_err("some exception message");
            assert!(err.is_instance_of::<exceptions::PyValueError>(py));
            err.restore(py);
            assert!(PyErr::occurred(py));
            let err = PyErr::fetch(py);
            assert!(err.is_instance_of::<exceptions::PyValueError>(py));
            assert_eq!(err.to_string(), "ValueError: some exception message");
        })
    }

    #[test]
    fn invalid_error_type() {
        Python::with_gil(|py| {
            let err: PyErr = PyErr::new::<PyString, _>(());
            assert!(err.is_instance_of::<exceptions::PyTypeError>(py));
            err.restore(py);
            let err = PyErr::fetch(py);
            assert!(err.is_instance_of::<exceptions::PyTypeError>(py));
            assert_eq!(
                err.to_string(),
                "TypeError: exceptions must derive from BaseException"
            );
        })
    }

    #[test]
    fn fetch_without_error_is_system_error() {
        Python::with_gil(|py| {
            let err = PyErr::fetch(py);
            assert!(err.is_instance_of::<exceptions::PySystemError>(py));
            assert_eq!(
                err.to_string(),
                "SystemError: error return without exception set"
            );
        })
    }

    #[test]
    fn tuple_arguments_are_unpacked() {
        Python::with_gil(|py| {
            let err = exceptions::PyOSError::new_err((2, "No such file or directory"));
            assert!(err.is_instance_of::<exceptions::PyFileNotFoundError>(py));
            let value = err.value(py);
            assert_eq!(value.getattr("errno").unwrap().extract::<i32>().unwrap(), 2);
        })
    }

    #[test]
    fn occurred_peeks_and_clear_drops() {
        Python::with_gil(|py| {
            assert!(err::occurred(py).is_none());
            exceptions::PyKeyError::new_err("k").restore(py);
            let ptype = err::occurred(py).unwrap();
            assert_eq!(ptype.as_ptr(), py.get_type::<exceptions::PyKeyError>().as_ptr());
            assert!(PyErr::occurred(py));
            err::clear(py);
            assert!(!PyErr::occurred(py));
            assert!(err::occurred(py).is_none());
        })
    }

    #[test]
    fn from_value_variants() {
        Python::with_gil(|py| {
            let instance = exceptions::PyTypeError::new_err("some type error").into_value(py);
            let err = PyErr::from_value(instance.into_any());
            assert_eq!(err.to_string(), "TypeError: some type error");

            let ty = py.get_type::<exceptions::PyTypeError>();
            let err = PyErr::from_value(crate::Owned::retain(&ty.as_any()));
            assert_eq!(err.to_string(), "TypeError: ");

            let err = PyErr::from_value(PyString::new(py, "foo").unwrap().into_any());
            assert_eq!(
                err.to_string(),
                "TypeError: exceptions must derive from BaseException"
            );
        })
    }

    #[test]
    fn from_type_is_lazy_until_inspected() {
        Python::with_gil(|py| {
            let ty = py.get_type::<exceptions::PyIndexError>();
            let err = PyErr::from_type(ty, "out of range");
            assert!(matches!(
                unsafe { &*err.state.get() },
                Some(PyErrState::Lazy { .. })
            ));
            assert!(err.is_instance_of::<exceptions::PyLookupError>(py));
            assert!(matches!(
                unsafe { &*err.state.get() },
                Some(PyErrState::Normalized(_))
            ));
            assert_eq!(err.to_string(), "IndexError: out of range");
        })
    }

    #[test]
    #[should_panic(expected = "new panic")]
    fn fetching_panic_exception_resumes_unwind() {
        use crate::panic::PanicException;

        Python::with_gil(|py| {
            let err: PyErr = PanicException::new_err("new panic");
            err.restore(py);
            assert!(PyErr::occurred(py));

            // should resume unwind
            let _ = PyErr::fetch(py);
        });
    }

    #[test]
    fn err_debug() {
        // Debug representation should be like the following (without the newlines):
        // PyErr {
        //     type: <class 'Exception'>,
        //     value: Exception('banana'),
        //     traceback: Some(<traceback object at 0x..)"
        // }
        Python::with_gil(|py| {
            let err = py
                .run("raise Exception('banana')")
                .expect_err("raising should have given us an error");

            let debug_str = format!("{:?}", err);
            assert!(debug_str.starts_with("PyErr { "));
            assert!(debug_str.ends_with(" }"));

            // strip "PyErr { " and " }"
            let mut fields = debug_str["PyErr { ".len()..debug_str.len() - 2].split(", ");

            assert_eq!(fields.next().unwrap(), "type: <class 'Exception'>");
            assert_eq!(fields.next().unwrap(), "value: Exception('banana')");

            let traceback = fields.next().unwrap();
            assert!(traceback.starts_with("traceback: Some(<traceback object at 0x"));
            assert!(traceback.ends_with(">)"));

            assert!(fields.next().is_none());
        });
    }

    #[test]
    fn err_display() {
        Python::with_gil(|py| {
            let err = py
                .run("raise Exception('banana')")
                .expect_err("raising should have given us an error");
            assert_eq!(err.to_string(), "Exception: banana");
        });
    }

    #[test]
    fn test_pyerr_cause() {
        Python::with_gil(|py| {
            let err = py
                .run("raise Exception('banana')")
                .expect_err("raising should have given us an error");
            assert!(err.cause(py).is_none());

            let err = py
                .run("raise Exception('banana') from Exception('apple')")
                .expect_err("raising should have given us an error");
            let cause = err
                .cause(py)
                .expect("raising from should have given us a cause");
            assert_eq!(cause.to_string(), "Exception: apple");

            err.set_cause(py, None);
            assert!(err.cause(py).is_none());

            let new_cause = exceptions::PyValueError::new_err("orange");
            err.set_cause(py, Some(new_cause));
            let cause = err
                .cause(py)
                .expect("set_cause should have given us a cause");
            assert_eq!(cause.to_string(), "ValueError: orange");
        });
    }

    #[test]
    fn clone_ref_shares_the_instance() {
        Python::with_gil(|py| {
            let err = exceptions::PyRuntimeError::new_err("shared");
            let clone = err.clone_ref(py);
            assert_eq!(err.value(py).as_ptr(), clone.value(py).as_ptr());
            assert!(clone.matches(py, py.get_type::<PyBaseException>()));
        });
    }

    #[test]
    fn restore_keeps_traceback() {
        Python::with_gil(|py| {
            let err = py.run("raise ValueError('tb')").unwrap_err();
            assert!(err.traceback(py).is_some());
            let value = err.value(py).as_ptr();
            err.restore(py);
            let err = PyErr::fetch(py);
            assert_eq!(err.value(py).as_ptr(), value);
            assert!(err.traceback(py).is_some());
        });
    }

    #[test]
    fn error_on_minusone_fetches() {
        Python::with_gil(|py| {
            assert!(err::error_on_minusone(py, 0).is_ok());
            exceptions::PyKeyError::new_err("k").restore(py);
            let err = err::error_on_minusone(py, -1).unwrap_err();
            assert!(err.is_instance_of::<exceptions::PyKeyError>(py));
        });
    }
}
