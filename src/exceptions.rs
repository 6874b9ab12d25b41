// Copyright (c) 2017-present PyO3 Project and Contributors

//! Exception types defined by Python.
//!
//! Each built-in exception class is a zero-sized marker type. The marker names the kind of an
//! exception handle (`Owned<'py, PyValueError>`) and offers two ways to raise it:
//!
//! * `new_err(args)` creates a lazy [`PyErr`] to return from a Rust function,
//! * `raise(py)` starts a [`Raise`] message builder which sets the interpreter's current error
//!   when dropped.
//!
//! Handles of any exception kind carry the traceback and chaining accessors of
//! [`ExceptionMethods`].

use crate::conversion::IntoObject;
use crate::err::{error_on_minusone, PyErr, PyErrArguments, PyResult, Raise};
use crate::instance::DerefToPyAny;
use crate::pyutils::checked_ptr;
use crate::type_object::PyTypeInfo;
use crate::types::{AnyMethods, PyAny};
use crate::{ffi, AsPyPointer, Handle, Owned, Python};

/// Marker for kinds whose objects are exception instances.
///
/// Implemented by every exception marker of this module and by the types declared with
/// [`create_exception!`](crate::create_exception).
pub trait ExceptionKind: PyTypeInfo {}

/// Declares a new exception class, created on first use.
///
/// # Syntax
///
/// `create_exception!(module, MyError, BaseException, "optional docstring")`
///
/// * `module` is the name of the module the class claims to live in.
/// * `MyError` is the name of the new exception type.
/// * `BaseException` is the marker of the superclass, usually
///   [`PyException`](crate::exceptions::PyException).
///
/// ```ignore
/// use libpy::create_exception;
/// use libpy::exceptions::PyException;
///
/// create_exception!(mymodule, CustomError, PyException);
///
/// Python::with_gil(|py| {
///     let _ = CustomError::raise(py) << "something went wrong";
/// });
/// ```
#[macro_export]
macro_rules! create_exception {
    ($module: ident, $name: ident, $base: ty) => {
        $crate::create_exception!(@impl $module, $name, $base, ::std::option::Option::None);
    };
    ($module: ident, $name: ident, $base: ty, $doc: literal) => {
        $crate::create_exception!(
            @impl $module,
            $name,
            $base,
            ::std::option::Option::Some(::std::concat!($doc, "\0"))
        );
    };
    (@impl $module: ident, $name: ident, $base: ty, $doc: expr) => {
        #[allow(non_camel_case_types)] // E.g. `socket.herror`
        pub enum $name {}

        unsafe impl $crate::type_object::PyTypeInfo for $name {
            const NAME: &'static str = ::std::stringify!($name);

            fn type_object_raw(py: $crate::Python<'_>) -> *mut $crate::ffi::PyTypeObject {
                static TYPE_OBJECT: $crate::impl_::exceptions::ExceptionTypeCell =
                    $crate::impl_::exceptions::ExceptionTypeCell::new();
                TYPE_OBJECT.get_or_create(
                    py,
                    ::std::concat!(::std::stringify!($module), ".", ::std::stringify!($name), "\0"),
                    $doc,
                    <$base as $crate::type_object::PyTypeInfo>::type_object_raw,
                )
            }
        }

        unsafe impl $crate::impl_::DerefToPyAny for $name {}

        impl $crate::exceptions::ExceptionKind for $name {}

        impl $name {
            /// Creates a new lazy error of this type.
            #[inline]
            pub fn new_err<A>(args: A) -> $crate::PyErr
            where
                A: $crate::err::PyErrArguments + 'static,
            {
                $crate::PyErr::new::<$name, A>(args)
            }

            /// Starts a message builder raising this type when dropped.
            #[inline]
            pub fn raise(py: $crate::Python<'_>) -> $crate::err::Raise<'_> {
                $crate::err::Raise::new(py.get_type::<$name>())
            }
        }
    };
}

macro_rules! impl_native_exception (
    ($name:ident, $exc_name:ident, $python_name:literal, $doc:expr $(, #[$cfg:meta])?) => (
        #[doc = $doc]
        $(#[$cfg])?
        pub enum $name {}

        $(#[$cfg])?
        unsafe impl PyTypeInfo for $name {
            const NAME: &'static str = $python_name;

            #[inline]
            fn type_object_raw(_py: Python<'_>) -> *mut ffi::PyTypeObject {
                unsafe { ffi::$exc_name as *mut ffi::PyTypeObject }
            }
        }

        $(#[$cfg])?
        unsafe impl DerefToPyAny for $name {}

        $(#[$cfg])?
        impl ExceptionKind for $name {}

        $(#[$cfg])?
        impl $name {
            /// Creates a new lazy error of this type. `args` becomes the exception's arguments;
            /// a tuple is unpacked into several.
            #[inline]
            pub fn new_err<A>(args: A) -> PyErr
            where
                A: PyErrArguments + 'static,
            {
                PyErr::new::<$name, A>(args)
            }

            /// Starts a message builder which raises this type when dropped.
            #[inline]
            pub fn raise(py: Python<'_>) -> Raise<'_> {
                Raise::new(py.get_type::<$name>())
            }
        }
    );
);

macro_rules! native_doc(
    ($name: literal) => (
        concat!("Represents Python's [`", $name, "`](https://docs.python.org/3/library/exceptions.html#", $name, ") exception.")
    );
);

impl_native_exception!(PyBaseException, PyExc_BaseException, "BaseException", native_doc!("BaseException"));
impl_native_exception!(PyException, PyExc_Exception, "Exception", native_doc!("Exception"));
impl_native_exception!(PyArithmeticError, PyExc_ArithmeticError, "ArithmeticError", native_doc!("ArithmeticError"));
impl_native_exception!(PyLookupError, PyExc_LookupError, "LookupError", native_doc!("LookupError"));
impl_native_exception!(PyAssertionError, PyExc_AssertionError, "AssertionError", native_doc!("AssertionError"));
impl_native_exception!(PyAttributeError, PyExc_AttributeError, "AttributeError", native_doc!("AttributeError"));
impl_native_exception!(PyBlockingIOError, PyExc_BlockingIOError, "BlockingIOError", native_doc!("BlockingIOError"));
impl_native_exception!(PyBrokenPipeError, PyExc_BrokenPipeError, "BrokenPipeError", native_doc!("BrokenPipeError"));
impl_native_exception!(PyChildProcessError, PyExc_ChildProcessError, "ChildProcessError", native_doc!("ChildProcessError"));
impl_native_exception!(PyConnectionError, PyExc_ConnectionError, "ConnectionError", native_doc!("ConnectionError"));
impl_native_exception!(PyConnectionAbortedError, PyExc_ConnectionAbortedError, "ConnectionAbortedError", native_doc!("ConnectionAbortedError"));
impl_native_exception!(PyConnectionRefusedError, PyExc_ConnectionRefusedError, "ConnectionRefusedError", native_doc!("ConnectionRefusedError"));
impl_native_exception!(PyConnectionResetError, PyExc_ConnectionResetError, "ConnectionResetError", native_doc!("ConnectionResetError"));
impl_native_exception!(PyFileExistsError, PyExc_FileExistsError, "FileExistsError", native_doc!("FileExistsError"));
impl_native_exception!(PyFileNotFoundError, PyExc_FileNotFoundError, "FileNotFoundError", native_doc!("FileNotFoundError"));
impl_native_exception!(PyEOFError, PyExc_EOFError, "EOFError", native_doc!("EOFError"));
impl_native_exception!(PyFloatingPointError, PyExc_FloatingPointError, "FloatingPointError", native_doc!("FloatingPointError"));
impl_native_exception!(PyImportError, PyExc_ImportError, "ImportError", native_doc!("ImportError"));
impl_native_exception!(PyModuleNotFoundError, PyExc_ModuleNotFoundError, "ModuleNotFoundError", native_doc!("ModuleNotFoundError"));
impl_native_exception!(PyIndexError, PyExc_IndexError, "IndexError", native_doc!("IndexError"));
impl_native_exception!(PyInterruptedError, PyExc_InterruptedError, "InterruptedError", native_doc!("InterruptedError"));
impl_native_exception!(PyIsADirectoryError, PyExc_IsADirectoryError, "IsADirectoryError", native_doc!("IsADirectoryError"));
impl_native_exception!(PyKeyError, PyExc_KeyError, "KeyError", native_doc!("KeyError"));
impl_native_exception!(PyKeyboardInterrupt, PyExc_KeyboardInterrupt, "KeyboardInterrupt", native_doc!("KeyboardInterrupt"));
impl_native_exception!(PyMemoryError, PyExc_MemoryError, "MemoryError", native_doc!("MemoryError"));
impl_native_exception!(PyNameError, PyExc_NameError, "NameError", native_doc!("NameError"));
impl_native_exception!(PyNotADirectoryError, PyExc_NotADirectoryError, "NotADirectoryError", native_doc!("NotADirectoryError"));
impl_native_exception!(PyNotImplementedError, PyExc_NotImplementedError, "NotImplementedError", native_doc!("NotImplementedError"));
impl_native_exception!(PyOSError, PyExc_OSError, "OSError", native_doc!("OSError"));
impl_native_exception!(PyOverflowError, PyExc_OverflowError, "OverflowError", native_doc!("OverflowError"));
impl_native_exception!(PyPermissionError, PyExc_PermissionError, "PermissionError", native_doc!("PermissionError"));
impl_native_exception!(PyProcessLookupError, PyExc_ProcessLookupError, "ProcessLookupError", native_doc!("ProcessLookupError"));
impl_native_exception!(PyRecursionError, PyExc_RecursionError, "RecursionError", native_doc!("RecursionError"));
impl_native_exception!(PyReferenceError, PyExc_ReferenceError, "ReferenceError", native_doc!("ReferenceError"));
impl_native_exception!(PyRuntimeError, PyExc_RuntimeError, "RuntimeError", native_doc!("RuntimeError"));
impl_native_exception!(PySyntaxError, PyExc_SyntaxError, "SyntaxError", native_doc!("SyntaxError"));
impl_native_exception!(PySystemError, PyExc_SystemError, "SystemError", native_doc!("SystemError"));
impl_native_exception!(PyTimeoutError, PyExc_TimeoutError, "TimeoutError", native_doc!("TimeoutError"));
impl_native_exception!(PySystemExit, PyExc_SystemExit, "SystemExit", native_doc!("SystemExit"));
impl_native_exception!(PyTypeError, PyExc_TypeError, "TypeError", native_doc!("TypeError"));
impl_native_exception!(PyValueError, PyExc_ValueError, "ValueError", native_doc!("ValueError"));
impl_native_exception!(PyZeroDivisionError, PyExc_ZeroDivisionError, "ZeroDivisionError", native_doc!("ZeroDivisionError"));

impl_native_exception!(
    PyBaseExceptionGroup,
    PyExc_BaseExceptionGroup,
    "BaseExceptionGroup",
    native_doc!("BaseExceptionGroup"),
    #[cfg(all(Py_3_11, not(PyPy)))]
);

impl_native_exception!(PyEnvironmentError, PyExc_EnvironmentError, "OSError", native_doc!("EnvironmentError"));
impl_native_exception!(PyIOError, PyExc_IOError, "OSError", native_doc!("IOError"));
impl_native_exception!(
    PyWindowsError,
    PyExc_WindowsError,
    "OSError",
    native_doc!("WindowsError"),
    #[cfg(windows)]
);

/// Accessors for the traceback and the chained exceptions of an exception instance.
///
/// Implemented for every handle whose kind is an exception class. The setters need a non-null
/// receiver and fail with the null-check error otherwise.
pub trait ExceptionMethods<'py>: Handle<'py> {
    /// Returns the traceback attached to the exception, as accessible from Python through
    /// `__traceback__`. A cleared traceback (`None` on the Python side) is `Ok(None)`.
    fn traceback(&self) -> PyResult<Option<Owned<'py, PyAny>>> {
        let slf = checked_ptr(self)?;
        let tb = unsafe { Owned::<PyAny>::from_owned_ptr(self.py(), ffi::PyException_GetTraceback(slf)) };
        Ok((!tb.is_null() && !tb.is_none()).then_some(tb))
    }

    /// Replaces the traceback. Passing `None` clears it; anything other than a traceback object
    /// or `None` is a `TypeError`.
    fn set_traceback<T>(&self, traceback: T) -> PyResult<()>
    where
        T: IntoObject<'py>,
    {
        let py = self.py();
        let slf = checked_ptr(self)?;
        let traceback = traceback.into_object(py)?;
        error_on_minusone(py, unsafe { ffi::PyException_SetTraceback(slf, traceback.as_ptr()) })
    }

    /// Returns the context (the exception being handled when this one was raised), as
    /// accessible from Python through `__context__`.
    fn context(&self) -> PyResult<Option<Owned<'py, PyBaseException>>> {
        let slf = checked_ptr(self)?;
        let context = unsafe { Owned::from_owned_ptr(self.py(), ffi::PyException_GetContext(slf)) };
        Ok((!context.is_null()).then_some(context))
    }

    /// Sets the context, taking ownership of the new value. `None` clears it.
    fn set_context(&self, context: Option<Owned<'py, PyAny>>) -> PyResult<()> {
        let slf = checked_ptr(self)?;
        let context = exception_or_none(context, "context")?;
        // PyException_SetContext steals the reference to the context.
        unsafe { ffi::PyException_SetContext(slf, context) };
        Ok(())
    }

    /// Returns the cause (set by `raise ... from ...`), as accessible from Python through
    /// `__cause__`.
    fn cause(&self) -> PyResult<Option<Owned<'py, PyBaseException>>> {
        let slf = checked_ptr(self)?;
        let cause = unsafe { Owned::from_owned_ptr(self.py(), ffi::PyException_GetCause(slf)) };
        Ok((!cause.is_null()).then_some(cause))
    }

    /// Sets the cause, taking ownership of the new value. `None` clears it.
    fn set_cause(&self, cause: Option<Owned<'py, PyAny>>) -> PyResult<()> {
        let slf = checked_ptr(self)?;
        let cause = exception_or_none(cause, "cause")?;
        // PyException_SetCause steals the reference to the cause.
        unsafe { ffi::PyException_SetCause(slf, cause) };
        Ok(())
    }
}

impl<'py, H> ExceptionMethods<'py> for H
where
    H: Handle<'py> + ?Sized,
    H::Kind: ExceptionKind,
{
}

/// Releases `value` as a raw owned pointer after checking that it is an exception instance.
fn exception_or_none(value: Option<Owned<'_, PyAny>>, what: &str) -> PyResult<*mut ffi::PyObject> {
    let Some(value) = value else {
        return Ok(std::ptr::null_mut());
    };
    let ptr = checked_ptr(&value)?;
    if unsafe { ffi::PyExceptionInstance_Check(ptr) } == 0 {
        return Err(PyTypeError::new_err(format!(
            "exception {} must be None or derive from BaseException",
            what
        )));
    }
    Ok(value.into_ptr())
}
