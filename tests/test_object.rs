use libpy::prelude::*;
use libpy::exceptions::{PyAssertionError, PyTypeError};

mod common;

#[test]
fn test_readme_example() {
    Python::with_gil(|py| {
        let s = PyString::new(py, "ayy.lmao").unwrap();
        let ob = s
            .getattr("find")
            .unwrap()
            .call1((".",))
            .unwrap()
            .add(1)
            .unwrap()
            .add(2.5)
            .unwrap();
        assert!(ob.eq(6.5).unwrap());
        assert_eq!(ob.refcnt(), 1);
    });
}

#[test]
fn test_display_nonnull() {
    Python::with_gil(|py| {
        let one = py.eval("1").unwrap();
        assert_eq!(one.to_string(), "1");
        let text = PyString::new(py, "test").unwrap();
        assert_eq!(text.to_string(), "test");
        assert_eq!(one.as_nonnull().unwrap().to_string(), "1");
        assert_eq!(text.as_nonnull().unwrap().to_string(), "test");
    });
}

#[test]
fn test_display_null() {
    Python::with_gil(|py| {
        assert_eq!(Object::<PyAny>::null(py).to_string(), "<NULL>");
        assert_eq!(format!("{:?}", Owned::<PyAny>::empty(py)), "<NULL>");
    });
}

#[test]
fn test_debug_is_repr() {
    Python::with_gil(|py| {
        let text = PyString::new(py, "quoted").unwrap();
        assert_eq!(format!("{:?}", text), "'quoted'");
    });
}

#[test]
fn test_null_propagates_through_chains() {
    Python::with_gil(|py| {
        let missing = py.eval("1").unwrap().getattr("no_such_attribute");
        let err = missing.unwrap_err();
        assert_eq!(
            err.to_string(),
            "AttributeError: 'int' object has no attribute 'no_such_attribute'"
        );

        let null = Object::<PyAny>::null(py);
        let err = null.add(1).unwrap_err();
        assert!(err.is_instance_of::<PyAssertionError>(py));
        assert_eq!(err.to_string(), "AssertionError: failed null check");
        assert!(libpy::err::occurred(py).is_none());
    });
}

#[test]
fn test_operand_null_check_prefers_pending_error() {
    Python::with_gil(|py| {
        let one = py.eval("1").unwrap();
        let _ = libpy::exceptions::PyKeyError::raise(py) << "pending";
        let err = one.add(Object::<PyAny>::null(py)).unwrap_err();
        assert_eq!(err.to_string(), "KeyError: 'pending'");
    });
}

#[test]
fn test_type_errors_from_operators() {
    Python::with_gil(|py| {
        let one = py.eval("1").unwrap();
        let err = one.add("a").unwrap_err();
        assert!(err.is_instance_of::<PyTypeError>(py));
        assert!(!PyErr::occurred(py));
    });
}

#[test]
fn test_python_sees_rust_objects() {
    Python::with_gil(|py| {
        let values = PyList::new(py, [1, 2, 3]).unwrap();
        let label = PyString::new(py, "numbers").unwrap();
        py_assert!(py, values, label; "sum(values) == 6 and label == 'numbers'");
        py_expect_exception!(py, values; "values[10]", PyIndexError);
    });
}

#[test]
fn test_cast_keeps_identity() {
    Python::with_gil(|py| {
        let any = py.eval("(1, 2)").unwrap();
        let tuple = any.as_object().cast::<PyTuple>().unwrap();
        assert_eq!(tuple.as_ptr(), any.as_ptr());

        let err = any.as_object().cast::<PyList>().unwrap_err();
        assert!(err.is_instance_of::<PyTypeError>(py));
    });
}
