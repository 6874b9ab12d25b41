use crate::err::{PyErr, PyResult};
use crate::exceptions::PyValueError;
use crate::types::PyType;
use crate::{ffi, AsPyPointer, Owned, Py, Python};
use once_cell::sync::OnceCell;
use std::ffi::CStr;

/// Lazily created type object of an exception class declared with `create_exception!`.
///
/// The class is created the first time its type object is requested and then kept for the
/// lifetime of the process.
pub struct ExceptionTypeCell(OnceCell<Py<PyType>>);

impl ExceptionTypeCell {
    pub const fn new() -> Self {
        ExceptionTypeCell(OnceCell::new())
    }

    /// The type object, if it has been created already.
    #[inline]
    pub fn get(&self) -> Option<*mut ffi::PyTypeObject> {
        self.0.get().map(|ty| ty.as_ptr().cast())
    }

    /// Returns the type object, creating it on first use.
    ///
    /// `name` is the dotted `module.Class` name and `doc` the docstring, both nul-terminated.
    /// If the class cannot be created the error is reported through `sys.unraisablehook` and
    /// the base type is returned in its place.
    pub fn get_or_create(
        &self,
        py: Python<'_>,
        name: &'static str,
        doc: Option<&'static str>,
        base: fn(Python<'_>) -> *mut ffi::PyTypeObject,
    ) -> *mut ffi::PyTypeObject {
        if let Some(ty) = self.get() {
            return ty;
        }
        let base = base(py);
        match new_exception_type(py, name, doc, base) {
            Ok(ty) => {
                tracing::debug!(name = name.trim_end_matches('\0'), "created exception type");
                // Creating the class can run Python code, so another thread may have won.
                let _ = self.0.set(ty);
                self.get().unwrap_or(base)
            }
            Err(err) => {
                tracing::error!(name = name.trim_end_matches('\0'), error = %err, "failed to create exception type");
                err.write_unraisable(py, None);
                base
            }
        }
    }
}

impl Default for ExceptionTypeCell {
    fn default() -> Self {
        Self::new()
    }
}

fn new_exception_type(
    py: Python<'_>,
    name: &'static str,
    doc: Option<&'static str>,
    base: *mut ffi::PyTypeObject,
) -> PyResult<Py<PyType>> {
    let name = nul_terminated(name)?;
    let doc = doc.map(nul_terminated).transpose()?;
    let ptr = unsafe {
        ffi::PyErr_NewExceptionWithDoc(
            name.as_ptr(),
            doc.map_or(std::ptr::null(), CStr::as_ptr),
            base.cast(),
            std::ptr::null_mut(),
        )
    };
    let ty = unsafe { Owned::<PyType>::from_owned_ptr_or_err(py, ptr)? };
    ty.unbind()
        .ok_or_else(|| crate::pyutils::failed_null_check(py))
}

fn nul_terminated(text: &'static str) -> PyResult<&'static CStr> {
    CStr::from_bytes_with_nul(text.as_bytes()).map_err(|err| -> PyErr {
        PyValueError::new_err(format!("invalid exception name or docstring: {}", err))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exceptions::{PyException, PyTypeError};
    use crate::type_object::PyTypeInfo;

    #[test]
    fn creates_once() {
        static CELL: ExceptionTypeCell = ExceptionTypeCell::new();
        Python::with_gil(|py| {
            assert!(CELL.get().is_none());
            let first = CELL.get_or_create(
                py,
                "libpy_tests.OnceError\0",
                Some("created once\0"),
                PyException::type_object_raw,
            );
            let second = CELL.get_or_create(py, "libpy_tests.OnceError\0", None, PyTypeError::type_object_raw);
            assert_eq!(first, second);
            assert_eq!(CELL.get(), Some(first));
            assert_eq!(
                unsafe { ffi::PyType_IsSubtype(first, PyException::type_object_raw(py)) },
                1
            );
        });
    }

    #[test]
    fn bad_name_falls_back_to_base() {
        static CELL: ExceptionTypeCell = ExceptionTypeCell::new();
        Python::with_gil(|py| {
            // PyErr_NewException requires a dotted name.
            let ty = CELL.get_or_create(py, "NoModule\0", None, PyException::type_object_raw);
            assert_eq!(ty, PyException::type_object_raw(py));
            assert!(CELL.get().is_none());
            assert!(!PyErr::occurred(py));
        });
    }
}
