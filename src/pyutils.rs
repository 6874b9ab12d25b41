//! Small helpers shared by the handle operations: null-check aggregation and compile-time
//! string concatenation.

use crate::err::{PyErr, PyResult};
use crate::exceptions::PyAssertionError;
use crate::{AsPyPointer, Handle, Python};

/// Whether every one of `objects` is non-null.
///
/// Handles statically known to be non-null answer without reading their pointer.
#[inline]
pub fn all_nonnull(objects: &[&dyn AsPyPointer]) -> bool {
    objects.iter().all(|object| object.is_nonnull())
}

/// The error reported when an operation receives a null operand.
///
/// A null operand is usually the leftover of an earlier failure, so if the interpreter already
/// has an error set that error is taken and returned. Otherwise this is an `AssertionError`
/// with the message `failed null check`.
#[cold]
pub fn failed_null_check(py: Python<'_>) -> PyErr {
    tracing::trace!("failed null check");
    PyErr::take(py).unwrap_or_else(|| PyAssertionError::new_err("failed null check"))
}

/// Fails with [`failed_null_check`] unless every one of `objects` is non-null.
#[inline]
pub fn ensure_nonnull(py: Python<'_>, objects: &[&dyn AsPyPointer]) -> PyResult<()> {
    if all_nonnull(objects) {
        Ok(())
    } else {
        Err(failed_null_check(py))
    }
}

/// Returns the pointer behind `handle`, or the null-check error.
#[inline]
pub(crate) fn checked_ptr<'py, H>(handle: &H) -> PyResult<*mut crate::ffi::PyObject>
where
    H: Handle<'py> + ?Sized,
{
    if handle.is_nonnull() {
        Ok(handle.as_ptr())
    } else {
        Err(failed_null_check(handle.py()))
    }
}

/// `concat!` for `&str` constants, used to build the nul-terminated names and docstrings of
/// native methods at compile time.
#[doc(hidden)]
#[macro_export]
macro_rules! const_concat {
    ($e:expr) => {{
        $e
    }};
    ($l:expr, $($r:expr),+ $(,)?) => {{
        const PIECES: &[&str] = &[$l, $($r),+];
        const JOINED: [u8; $crate::pyutils::joined_len(PIECES)] =
            $crate::pyutils::join_pieces(PIECES);
        // Safety: every piece is a `&str` and they are copied back to back.
        unsafe { ::std::str::from_utf8_unchecked(&JOINED) }
    }};
}

/// Total byte length of `pieces`, the array size [`join_pieces`] needs.
#[doc(hidden)]
pub const fn joined_len(pieces: &[&str]) -> usize {
    let mut len = 0;
    let mut i = 0;
    while i < pieces.len() {
        len += pieces[i].len();
        i += 1;
    }
    len
}

/// Copies `pieces` back to back into one array.
///
/// Panics (at compile time, when used in a constant) unless `LEN` is `joined_len(pieces)`.
#[doc(hidden)]
pub const fn join_pieces<const LEN: usize>(pieces: &[&str]) -> [u8; LEN] {
    let mut joined = [0u8; LEN];
    let mut at = 0;
    let mut i = 0;
    while i < pieces.len() {
        let bytes = pieces[i].as_bytes();
        assert!(at + bytes.len() <= LEN, "pieces are longer than `LEN`");
        let mut j = 0;
        while j < bytes.len() {
            joined[at + j] = bytes[j];
            j += 1;
        }
        at += bytes.len();
        i += 1;
    }
    assert!(at == LEN, "pieces are shorter than `LEN`");
    joined
}
