use libpy::exceptions::{PyAssertionError, PyIndexError};
use libpy::prelude::*;

mod common;

#[test]
fn test_type() {
    Python::with_gil(|py| {
        let tuple = PyTuple::new(py, 0..5).unwrap();
        assert!(tuple.is_instance_of::<PyTuple>());
        assert!(tuple.is_instance(py.get_type::<PyTuple>()).unwrap());
        assert_eq!(tuple.get_type().unwrap().name().unwrap().to_str().unwrap(), "tuple");
        assert_eq!(tuple.len().unwrap(), 5);
    });
}

#[test]
fn test_pack() {
    Python::with_gil(|py| {
        let items = [
            PyLong::from_i64(py, 0).unwrap(),
            PyLong::from_i64(py, 1).unwrap(),
            PyLong::from_i64(py, 2).unwrap(),
        ];
        let tuple = PyTuple::pack(py, (&items[0], &items[1], &items[2])).unwrap();
        assert_eq!(tuple.len().unwrap(), items.len());
        for (n, item) in items.iter().enumerate() {
            assert!(tuple.get_item(n).unwrap().is(item));
        }
    });
}

#[test]
fn test_iter_matches_python() {
    Python::with_gil(|py| {
        let tuple = PyTuple::pack(py, ("a", 2, 3.5)).unwrap();
        let reprs: Vec<String> = tuple
            .iter()
            .unwrap()
            .map(|item| format!("{:?}", item))
            .collect();
        assert_eq!(reprs, ["'a'", "2", "3.5"]);
        py_assert!(py, tuple; "tuple == ('a', 2, 3.5)");
    });
}

#[test]
fn test_python_errors_on_bad_index() {
    Python::with_gil(|py| {
        let tuple = PyTuple::pack(py, (1,)).unwrap();
        py_expect_exception!(py, tuple; "tuple[1]", PyIndexError);
        assert!(tuple.get_item(1).unwrap_err().is_instance_of::<PyIndexError>(py));
    });
}

#[test]
fn test_pack_with_null_element_fails() {
    Python::with_gil(|py| {
        let missing = Object::<PyAny>::null(py);
        let err = PyTuple::pack(py, (1, missing)).unwrap_err();
        assert!(err.is_instance_of::<PyAssertionError>(py));
    });
}

#[test]
fn test_tuple_from_python() {
    Python::with_gil(|py| {
        let tuple = py.eval("tuple(range(4))").unwrap().cast_into::<PyTuple>().unwrap();
        assert_eq!(tuple.get_slice(1, 3).unwrap().to_string(), "(1, 2)");
        let total: i64 = tuple
            .iter()
            .unwrap()
            .map(|item| item.extract::<i64>().unwrap())
            .sum();
        assert_eq!(total, 6);
    });
}
