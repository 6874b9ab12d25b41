use std::marker::PhantomData;
use std::rc::Rc;

use crate::ffi::{Py_ssize_t, PY_SSIZE_T_MAX};

/// A marker type that makes the type !Send.
pub(crate) type Unsendable = PhantomData<Rc<()>>;

/// Clamps an index to the range a `Py_ssize_t` can carry.
///
/// Indices above `PY_SSIZE_T_MAX` are out of range for any real container, so the
/// interpreter's own bounds checks still report them as such.
#[inline]
pub(crate) fn get_ssize_index(index: usize) -> Py_ssize_t {
    index.min(PY_SSIZE_T_MAX as usize) as Py_ssize_t
}

/// Converts a length reported by the interpreter, which is never negative on success.
#[inline]
pub(crate) fn len_from_ssize(len: Py_ssize_t) -> usize {
    debug_assert!(len >= 0);
    len as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ssize_index_is_clamped() {
        assert_eq!(get_ssize_index(0), 0);
        assert_eq!(get_ssize_index(42), 42);
        assert_eq!(get_ssize_index(usize::MAX), PY_SSIZE_T_MAX);
    }
}
