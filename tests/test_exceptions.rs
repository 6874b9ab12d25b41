use libpy::err::{self, raise_value};
use libpy::exceptions::{PyAssertionError, PyException, PyKeyError, PyOSError, PyValueError};
use libpy::prelude::*;
use libpy::{create_exception, intern};
use std::io;

mod common;

create_exception!(test_module, ParseError, PyValueError, "Raised when parsing fails.");

#[test]
fn test_raise_message() {
    Python::with_gil(|py| {
        let _ = PyException::raise(py) << "ayy lmao: " << 1;

        let ptype = err::occurred(py).expect("an error was raised");
        assert_eq!(ptype.as_ptr(), py.get_type::<PyException>().as_ptr());

        let err = PyErr::fetch(py);
        assert_eq!(err.value(py).to_string(), "ayy lmao: 1");
        assert!(err::occurred(py).is_none());
    });
}

#[test]
fn test_raise_value() {
    Python::with_gil(|py| {
        let value = PyValueError::new_err("ayy lmao").into_value(py);
        let ptr = value.as_ptr();
        raise_value(py, &value);

        let ptype = err::occurred(py).unwrap();
        assert_eq!(ptype.as_ptr(), py.get_type::<PyValueError>().as_ptr());
        let err = PyErr::take(py).unwrap();
        assert_eq!(err.value(py).as_ptr(), ptr);
    });
}

#[test]
fn test_raise_type_instantiates_it() {
    Python::with_gil(|py| {
        raise_value(py, py.get_type::<PyKeyError>());
        let err = PyErr::fetch(py);
        assert!(err.is_instance_of::<PyKeyError>(py));
        assert_eq!(err.value(py).to_string(), "");
    });
}

#[test]
fn test_python_catches_restored_error() {
    Python::with_gil(|py| {
        let err = (ParseError::raise(py) << "line " << 3 << ": unexpected token").into_err();
        let value = err.into_value(py);
        py_run!(py, value; r#"
            try:
                raise value
            except ValueError as e:
                assert str(e) == "line 3: unexpected token"
                assert type(e).__name__ == "ParseError"
            else:
                assert False, "not raised"
        "#);
    });
}

#[test]
fn test_custom_exception_type() {
    Python::with_gil(|py| {
        let ty = py.get_type::<ParseError>();
        assert_eq!(ty.qualname().unwrap().to_str().unwrap(), "ParseError");
        assert_eq!(
            ty.getattr(intern!(py, "__module__")).unwrap().to_string(),
            "test_module"
        );
        assert_eq!(ty.getattr("__doc__").unwrap().to_string(), "Raised when parsing fails.");
        assert!(ty.is_subclass_of::<PyValueError>().unwrap());
        py_assert!(py, ty; "issubclass(ty, ValueError)");
    });
}

#[test]
fn test_question_mark_propagation() {
    fn lookup<'py>(py: Python<'py>, key: &str) -> PyResult<Owned<'py, PyAny>> {
        let table = py.eval("{'a': 1}")?;
        table.get_item(key)
    }

    Python::with_gil(|py| {
        assert_eq!(lookup(py, "a").unwrap().extract::<i64>().unwrap(), 1);
        let err = lookup(py, "b").unwrap_err();
        assert!(err.is_instance_of::<PyKeyError>(py));
        assert!(!PyErr::occurred(py));
    });
}

#[test]
fn test_null_check_error() {
    Python::with_gil(|py| {
        let missing = Object::<PyAny>::null(py);
        let err = missing.repr().unwrap_err();
        assert!(err.is_instance_of::<PyAssertionError>(py));
        assert_eq!(err.to_string(), "AssertionError: failed null check");
    });
}

#[test]
fn test_context_and_cause_from_python() {
    Python::with_gil(|py| {
        let err = py
            .run("try:\n    {}['k']\nexcept KeyError as e:\n    raise ValueError('bad') from e\n")
            .unwrap_err();
        let cause = err.cause(py).unwrap();
        assert!(cause.is_instance_of::<PyKeyError>(py));

        let value = err.value(py);
        assert!(value.traceback().unwrap().is_some());
        assert!(value.context().unwrap().unwrap().is(&cause.value(py)));
    });
}

#[test]
fn test_io_error_round_trip() {
    Python::with_gil(|py| {
        let err: PyErr = io::Error::new(io::ErrorKind::NotFound, "gone").into();
        assert_eq!(err.to_string(), "FileNotFoundError: gone");
        assert!(err.is_instance_of::<PyOSError>(py));

        let back: io::Error = err.into();
        assert_eq!(back.kind(), io::ErrorKind::NotFound);
    });
}

#[cfg(unix)]
#[test]
fn test_last_os_error() {
    Python::with_gil(|py| {
        assert_eq!(unsafe { libc::close(-1) }, -1);
        let err = PyErr::last_os_error(py);
        assert!(err.is_instance_of::<PyOSError>(py));
        let errno = err.value(py).getattr("errno").unwrap();
        assert_eq!(errno.extract::<i32>().unwrap(), libc::EBADF);
    });
}
