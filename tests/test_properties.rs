use libpy::exceptions::{PyIndexError, PyValueError};
use libpy::prelude::*;
use proptest::prelude::*;

proptest! {
    #[test]
    fn tuple_holds_each_element_once(values in prop::collection::vec(1_000i64..i64::MAX, 0..16)) {
        Python::with_gil(|py| {
            let objects: Vec<_> = values
                .iter()
                .map(|&value| PyLong::from_i64(py, value).unwrap())
                .collect();

            let tuple = PyTuple::new(py, objects.iter()).unwrap();
            prop_assert_eq!(tuple.len().unwrap(), values.len());
            for (n, object) in objects.iter().enumerate() {
                prop_assert!(tuple.get_item(n).unwrap().is(object));
            }
            drop(tuple);

            prop_assert!(objects.iter().all(|object| object.refcnt() == 1));
            Ok(())
        })?;
    }

    #[test]
    fn list_index_is_bounds_checked(len in 0usize..8, index in 0usize..16) {
        Python::with_gil(|py| {
            let list = PyList::new(py, 0..len).unwrap();
            match list.get_item(index) {
                Ok(item) => {
                    prop_assert!(index < len);
                    prop_assert_eq!(item.extract::<i64>().unwrap(), index as i64);
                }
                Err(err) => {
                    prop_assert!(index >= len);
                    prop_assert!(err.is_instance_of::<PyIndexError>(py));
                }
            }
            prop_assert!(!PyErr::occurred(py));
            Ok(())
        })?;
    }

    #[test]
    fn builder_concatenates_display_forms(
        words in prop::collection::vec("[a-z]{0,6}", 0..5),
        number in any::<i32>(),
    ) {
        Python::with_gil(|py| {
            let mut builder = PyValueError::raise(py);
            for word in &words {
                builder = builder << word;
            }
            drop(builder << number);

            let err = PyErr::fetch(py);
            prop_assert!(err.is_instance_of::<PyValueError>(py));
            let expected = format!("{}{}", words.concat(), number);
            prop_assert_eq!(err.value(py).to_string(), expected);
            Ok(())
        })?;
    }

    #[test]
    fn string_round_trip(text in "\\PC*") {
        Python::with_gil(|py| {
            let string = PyString::new(py, &text).unwrap();
            prop_assert_eq!(string.to_str().unwrap(), text.as_str());
            prop_assert_eq!(string.len().unwrap(), text.chars().count());
            Ok(())
        })?;
    }
}
