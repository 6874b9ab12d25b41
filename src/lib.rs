// Copyright (c) 2017-present PyO3 Project and Contributors

//! RAII handles over the CPython C API.
//!
//! # Ownership and Lifetimes
//!
//! In Python, all objects are implicitly reference counted. This crate models the
//! three ways native code can hold such a reference as three wrapper types, all of
//! them exactly one pointer wide:
//!
//! * [`Object`] is a borrowed handle. Copying it is a pointer copy and it never
//!   touches the reference count. It may be null.
//! * [`NonNullObject`] is a borrowed handle which has been checked to be non-null,
//!   so operations on it skip the null branch.
//! * [`Owned`] holds one reference unit. It is released exactly once when the
//!   handle is dropped, cloned by retaining, and can hand its reference off with
//!   [`Owned::into_ptr`].
//!
//! The kind of object a handle points at is a type parameter (`Object<'py, PyTuple>`),
//! checked at runtime by [`Object::cast`].
//!
//! The Python interpreter uses a global interpreter lock (GIL). A zero-sized
//! [`Python<'py>`] token proves that it is held, and every handle is bound to the
//! lifetime of such a token.
//!
//! # Error Handling
//!
//! Operations which can fail return [`PyResult`], a `Result<T, PyErr>`. A [`PyErr`] owns
//! one raised Python exception. The interpreter's own "current error" slot stays
//! reachable for code which needs it: [`PyErr::take`] and [`PyErr::restore`] move an
//! error out of and into it, [`err::occurred`] peeks, and [`exceptions::PyTypeError::raise`]
//! builds a message and sets it when the builder is dropped.
//!
//! # Example
//!
//! ```ignore
//! use libpy::prelude::*;
//!
//! Python::with_gil(|py| -> PyResult<()> {
//!     let s = PyString::new(py, "ayy.lmao")?;
//!     let idx = s.getattr("find")?.call1((".",))?;
//!     let total = idx.add(1)?.add(2)?.add(2.5)?;
//!     assert_eq!(total.to_string(), "8.5");
//!     Ok(())
//! })
//! ```

pub use crate::conversion::{IntoArgs, IntoObject};
pub use crate::err::{PyErr, PyResult};
#[cfg(not(PyPy))]
pub use crate::gil::prepare_freethreaded_python;
pub use crate::gil::GILGuard;
pub use crate::instance::{AsPyPointer, Handle, NonNullObject, NullViewError, Object, Owned, Py};
pub use crate::marker::Python;
pub use crate::type_object::{PyTypeCheck, PyTypeInfo};
pub use crate::types::PyAny;

/// The raw C API, re-exported so that generated method tables can name it.
pub use pyo3_ffi as ffi;

mod internal_tricks;

pub mod automethod;
pub mod conversion;
pub mod err;
pub mod exceptions;
mod gil;
#[doc(hidden)]
pub mod impl_;
mod instance;
pub mod intern;
mod marker;
pub mod panic;
pub mod prelude;
pub mod pyutils;
pub mod type_object;
pub mod types;
